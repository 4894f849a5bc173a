use thiserror::Error;

/// Main error type for askgpt
#[derive(Error, Debug)]
pub enum AskError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Editor error: {0}")]
    EditorError(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Empty prompt, nothing to ask")]
    EmptyPrompt,

    #[error("Interrupted")]
    Interrupted,
}
