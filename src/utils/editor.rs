use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use tracing::debug;

use super::errors::AskError;

/// Resolve an editor name (or path) to an executable
pub fn resolve_editor(editor: &str) -> Result<PathBuf, AskError> {
    which::which(editor)
        .map_err(|e| AskError::EditorError(format!("cannot find editor '{}': {}", editor, e)))
}

/// Open `editor` on a temporary file pre-filled with `initial` and return the trimmed text.
pub fn compose_in_editor(editor: &str, initial: &str) -> Result<String> {
    let editor_bin = resolve_editor(editor)?;

    let mut temp_file = tempfile::Builder::new()
        .prefix("askgpt-")
        .suffix(".md")
        .tempfile()
        .context("Failed to create prompt file")?;
    if !initial.is_empty() {
        temp_file.write_all(initial.as_bytes())?;
        temp_file.flush()?;
    }

    debug!("Opening {} on {}", editor_bin.display(), temp_file.path().display());

    // Reattach the editor to the terminal even when our stdin is a pipe
    let stdin = File::open("/dev/tty")
        .map(Stdio::from)
        .unwrap_or_else(|_| Stdio::inherit());

    let status = Command::new(&editor_bin)
        .arg(temp_file.path())
        .stdin(stdin)
        .status()
        .with_context(|| format!("Failed to launch {}", editor_bin.display()))?;

    if !status.success() {
        return Err(AskError::EditorError(format!(
            "{} exited with {}",
            editor_bin.display(),
            status
        ))
        .into());
    }

    let prompt = fs::read_to_string(temp_file.path())
        .context("Failed to read back the composed prompt")?
        .trim()
        .to_string();

    if prompt.is_empty() {
        return Err(AskError::EmptyPrompt.into());
    }

    Ok(prompt)
}
