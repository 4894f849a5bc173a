use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

use crate::constants::{SUMMARY_INSTRUCTIONS, SUMMARY_MAX_TURNS};
use crate::models::{Assistant, ChatMessage, Dialog};

/// Produces the short title stored next to a session
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Summarizer: Send {
    async fn summarize(&mut self, dialog: &Dialog) -> Result<String>;
}

/// Text handed to the model: the first conversational turns, system prompts dropped
pub fn summary_input(dialog: &Dialog) -> Result<String> {
    let kept: Vec<&ChatMessage> = dialog.conversation().take(SUMMARY_MAX_TURNS).collect();
    Ok(serde_json::to_string(&kept)?)
}

/// Titles sessions with a deterministic (temperature 0) assistant
pub struct ModelSummarizer {
    assistant: Assistant,
}

impl ModelSummarizer {
    pub fn new(assistant: Assistant) -> Self {
        Self { assistant }
    }
}

#[async_trait]
impl Summarizer for ModelSummarizer {
    async fn summarize(&mut self, dialog: &Dialog) -> Result<String> {
        let input = summary_input(dialog)?;

        self.assistant.clear();
        for instruction in SUMMARY_INSTRUCTIONS {
            self.assistant.add_system_prompt(*instruction);
        }

        let summary = self.assistant.talk(input, None).await?;
        debug!("Summarized session as {:?}", summary.trim());
        Ok(summary.trim().to_string())
    }
}
