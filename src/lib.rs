pub mod app;
pub mod cli;
pub mod constants;
pub mod models;
pub mod runtime;
pub mod session;
pub mod utils;

pub use app::{load_config, Config};
pub use models::{Assistant, ChatMessage, Dialog, MessageRole, Model, ModelFactory};
pub use session::{open_new, open_resume, SessionError, SessionRecord, SessionStore, Summarizer};
pub use utils::AskError;
