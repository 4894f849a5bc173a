use anyhow::Result;
use colored::Colorize;
use std::path::Path;

use crate::{
    app::{init_config, load_config},
    models::{Dialog, MessageRole},
    session::{open_store, select_session, SessionStore},
};

use super::Commands;

/// Handle CLI subcommands
pub async fn handle_command(command: &Commands, config_path: Option<&Path>) -> Result<()> {
    if let Commands::Init = command {
        let (path, created) = init_config(config_path)?;
        if created {
            println!("Created default configuration at: {}", path.display());
        } else {
            println!("Configuration already exists at: {}", path.display());
        }
        return Ok(());
    }

    let config = load_config(config_path)?;
    let mut store = open_store(&config)?;

    match command {
        Commands::Init => Ok(()),
        Commands::List => {
            list_sessions(&store);
            Ok(())
        }
        Commands::Show { index } => show_session(&store, index.unwrap_or(0)),
        Commands::Pick { index } => pick_session(&mut store, *index),
        Commands::Remove { index, all } => remove_sessions(&mut store, *index, *all),
    }
}

fn display_summary(summary: &str) -> String {
    if summary.is_empty() {
        "(new session)".dimmed().to_string()
    } else {
        summary.to_string()
    }
}

/// List saved sessions, most recent first
pub fn list_sessions(store: &SessionStore) {
    if store.is_empty() {
        println!("No saved sessions.");
        return;
    }

    for (i, summary) in store.list_iter().enumerate() {
        println!("  {}  {}", format!("{:>2}", i).cyan(), display_summary(summary));
    }
}

fn show_session(store: &SessionStore, index: usize) -> Result<()> {
    match store.dialog_at(index)? {
        Some(dialog) => {
            print_dialog(&dialog);
            Ok(())
        }
        None => {
            println!("No saved session at position {}.", index);
            Ok(())
        }
    }
}

fn print_dialog(dialog: &Dialog) {
    for turn in dialog.turns() {
        let role = match turn.role {
            MessageRole::System => turn.role.as_str().dimmed(),
            MessageRole::User => turn.role.as_str().green().bold(),
            MessageRole::Assistant => turn.role.as_str().cyan().bold(),
        };
        println!("[{}]", role);
        println!("{}\n", turn.content);
    }
}

fn choose(store: &SessionStore, title: &str, index: Option<usize>) -> Result<Option<usize>> {
    match index {
        Some(i) if i < store.len() => Ok(Some(i)),
        Some(i) => {
            println!("No saved session at position {}.", i);
            Ok(None)
        }
        None => select_session(title, store.list_iter().map(str::to_string).collect()),
    }
}

fn pick_session(store: &mut SessionStore, index: Option<usize>) -> Result<()> {
    let Some(index) = choose(store, "Select a session to continue", index)? else {
        return Ok(());
    };

    store.pick(index)?;
    let summary = store.list_iter().next().unwrap_or_default();
    println!("Continuing: {}", display_summary(summary).as_str().green());
    Ok(())
}

fn remove_sessions(store: &mut SessionStore, index: Option<usize>, all: bool) -> Result<()> {
    if all {
        let count = store.len();
        store.remove_all()?;
        println!("Removed {} sessions.", count);
        return Ok(());
    }

    let Some(index) = choose(store, "Select a session to delete", index)? else {
        return Ok(());
    };

    let summary = display_summary(store.list_iter().nth(index).unwrap_or_default());
    store.remove(index)?;
    println!("Removed: {}", summary);
    Ok(())
}
