/// Session management module - Gateway

mod error;
mod lifecycle;
mod record;
mod selector;
mod store;
mod summarizer;

pub use error::SessionError;
pub use lifecycle::{
    open_new, open_new_with_config, open_resume, open_resume_with_config, open_store,
};
pub use record::SessionRecord;
pub use selector::select_session;
pub use store::{candidate_identifier, SessionStore, StoreConfig};
pub use summarizer::{summary_input, ModelSummarizer, Summarizer};
