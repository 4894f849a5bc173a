use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "askgpt")]
#[command(version)]
#[command(about = "Ask a chat model from the terminal and keep the conversation", long_about = None)]
pub struct Cli {
    /// Prompt to send; opens the editor when empty
    pub prompt: Vec<String>,

    /// Continue the most recent session instead of starting a new one
    #[arg(short = 'c', long = "continue")]
    pub continue_session: bool,

    /// Compose the prompt in the configured editor (pre-filled with PROMPT)
    #[arg(short, long)]
    pub editor: bool,

    /// Model to use for this run
    #[arg(short, long)]
    pub model: Option<String>,

    /// Sampling temperature for this run
    #[arg(short, long)]
    pub temperature: Option<f32>,

    /// Path to configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Create a default configuration file
    Init,
    /// List saved sessions, most recent first
    List,
    /// Print a saved session (the most recent by default)
    Show {
        /// Position in `list`
        index: Option<usize>,
    },
    /// Move a saved session to the front so `--continue` resumes it
    Pick {
        /// Position in `list`; choose interactively when omitted
        index: Option<usize>,
    },
    /// Delete saved sessions
    Remove {
        /// Position in `list`; choose interactively when omitted
        index: Option<usize>,

        /// Delete every saved session
        #[arg(long, conflicts_with = "index")]
        all: bool,
    },
}
