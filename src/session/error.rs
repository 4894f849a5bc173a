use std::path::PathBuf;
use thiserror::Error;

/// Failures of the session record store
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("failed {action} {}: {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid session index {}: {source}", path.display())]
    Index {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("session index {} is inconsistent: {reason}", path.display())]
    CorruptIndex { path: PathBuf, reason: String },

    #[error("invalid session record {}: {source}", path.display())]
    Record {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode dialog: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("failed to summarize session: {0:#}")]
    Summarize(#[source] anyhow::Error),
}

impl SessionError {
    pub(crate) fn io(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }
}
