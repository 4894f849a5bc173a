use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Who authored a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

/// A single turn of a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }
}

/// An ordered conversation. Order is significant and survives persistence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dialog {
    turns: Vec<ChatMessage>,
}

impl Dialog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.turns.push(message);
    }

    pub fn turns(&self) -> &[ChatMessage] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Turns other than system prompts
    pub fn conversation(&self) -> impl Iterator<Item = &ChatMessage> {
        self.turns.iter().filter(|m| m.role != MessageRole::System)
    }

    /// Whether anything beyond system prompts has been said
    pub fn has_conversation(&self) -> bool {
        self.conversation().next().is_some()
    }
}

impl From<Vec<ChatMessage>> for Dialog {
    fn from(turns: Vec<ChatMessage>) -> Self {
        Self { turns }
    }
}

/// Configuration for model parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub model: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<usize>,
}

/// Response from a model
#[derive(Debug, Clone)]
pub struct ModelResponse {
    /// The full response text
    pub content: String,
    /// Usage statistics if available
    pub usage: Option<TokenUsage>,
    /// Model that generated the response
    pub model_name: String,
}

/// Token usage statistics
#[derive(Debug, Clone)]
pub struct TokenUsage {
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
    pub total_tokens: usize,
}

/// Stream callback type for real-time response streaming
pub type StreamCallback = Arc<dyn Fn(&str) + Send + Sync>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_dialog_serializes_as_plain_turn_list() {
        let dialog = Dialog::from(vec![
            ChatMessage::system("be brief"),
            ChatMessage::user("hi"),
        ]);

        let json = serde_json::to_value(&dialog).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                {"role": "system", "content": "be brief"},
                {"role": "user", "content": "hi"},
            ])
        );
    }

    #[test]
    fn test_conversation_skips_system_turns() {
        let mut dialog = Dialog::from(vec![ChatMessage::system("rules")]);
        assert!(!dialog.has_conversation());

        dialog.push(ChatMessage::user("question"));
        dialog.push(ChatMessage::system("late rule"));
        dialog.push(ChatMessage::assistant("answer"));

        let kept: Vec<&str> = dialog.conversation().map(|m| m.content.as_str()).collect();
        assert_eq!(kept, vec!["question", "answer"]);
        assert!(dialog.has_conversation());
    }
}
