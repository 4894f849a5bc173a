use anyhow::Result;

use super::traits::Model;
use super::types::{ChatMessage, Dialog, ModelConfig, StreamCallback};

/// A conversational engine instance: a model plus the dialog it is building
pub struct Assistant {
    model: Box<dyn Model>,
    config: ModelConfig,
    dialog: Dialog,
}

impl Assistant {
    pub fn new(model: Box<dyn Model>, config: ModelConfig) -> Self {
        Self {
            model,
            config,
            dialog: Dialog::new(),
        }
    }

    /// Seed a fresh dialog with system prompts
    pub fn with_system_prompts<I, S>(mut self, prompts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for prompt in prompts {
            self.add_system_prompt(prompt);
        }
        self
    }

    pub fn add_system_prompt(&mut self, prompt: impl Into<String>) {
        self.dialog.push(ChatMessage::system(prompt));
    }

    /// Send `message` as a user turn and record the reply.
    ///
    /// The user turn stays in the dialog even if the model call fails.
    pub async fn talk(
        &mut self,
        message: impl Into<String>,
        stream_callback: Option<StreamCallback>,
    ) -> Result<String> {
        self.dialog.push(ChatMessage::user(message));

        let response = self
            .model
            .chat(self.dialog.turns(), &self.config, stream_callback)
            .await?;

        self.dialog.push(ChatMessage::assistant(response.content.clone()));
        Ok(response.content)
    }

    /// Record a reply that was cut short; an empty one leaves the dialog unchanged
    pub fn push_partial_reply(&mut self, content: impl Into<String>) {
        let content = content.into();
        if !content.is_empty() {
            self.dialog.push(ChatMessage::assistant(content));
        }
    }

    /// Export a copy of the current dialog
    pub fn dump(&self) -> Dialog {
        self.dialog.clone()
    }

    /// Replace the current dialog with a prior one
    pub fn load(&mut self, dialog: Dialog) {
        self.dialog = dialog;
    }

    pub fn clear(&mut self) {
        self.dialog = Dialog::new();
    }

    pub fn dialog(&self) -> &Dialog {
        &self.dialog
    }

    pub fn model_name(&self) -> &str {
        &self.config.model
    }

    pub fn set_model(&mut self, model: impl Into<String>) {
        self.config.model = model.into();
    }

    pub fn set_temperature(&mut self, temperature: f32) {
        self.config.temperature = Some(temperature);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MessageRole, ModelResponse};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::{Arc, Mutex};

    /// Replies with the uppercased last user turn and records what it saw
    struct ShoutModel {
        seen: Arc<Mutex<Vec<(usize, Option<f32>)>>>,
    }

    #[async_trait]
    impl Model for ShoutModel {
        async fn chat(
            &mut self,
            messages: &[ChatMessage],
            config: &ModelConfig,
            stream_callback: Option<StreamCallback>,
        ) -> Result<ModelResponse> {
            self.seen
                .lock()
                .unwrap()
                .push((messages.len(), config.temperature));
            let reply = messages
                .last()
                .map(|m| m.content.to_uppercase())
                .unwrap_or_default();
            if let Some(callback) = stream_callback {
                callback(&reply);
            }
            Ok(ModelResponse {
                content: reply,
                usage: None,
                model_name: config.model.clone(),
            })
        }

        fn name(&self) -> &str {
            "shout"
        }
    }

    fn assistant() -> (Assistant, Arc<Mutex<Vec<(usize, Option<f32>)>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let model = ShoutModel { seen: seen.clone() };
        let config = ModelConfig {
            model: "test".to_string(),
            temperature: Some(0.8),
            max_tokens: None,
        };
        (Assistant::new(Box::new(model), config), seen)
    }

    #[tokio::test]
    async fn test_talk_appends_both_turns() {
        let (assistant, seen) = assistant();
        let mut assistant = assistant.with_system_prompts(["be loud"]);

        let reply = assistant.talk("hello", None).await.unwrap();
        assert_eq!(reply, "HELLO");

        let roles: Vec<MessageRole> = assistant.dialog().turns().iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![MessageRole::System, MessageRole::User, MessageRole::Assistant]
        );
        assert_eq!(seen.lock().unwrap().as_slice(), &[(2, Some(0.8))]);
    }

    #[tokio::test]
    async fn test_stream_callback_receives_reply() {
        let (mut assistant, _) = assistant();
        let streamed = Arc::new(Mutex::new(String::new()));
        let sink = streamed.clone();

        assistant
            .talk("abc", Some(Arc::new(move |s: &str| sink.lock().unwrap().push_str(s))))
            .await
            .unwrap();

        assert_eq!(streamed.lock().unwrap().as_str(), "ABC");
    }

    #[test]
    fn test_partial_reply_is_kept_unless_empty() {
        let (mut assistant, _) = assistant();
        assistant.push_partial_reply("");
        assert!(assistant.dump().is_empty());

        assistant.push_partial_reply("half an ans");
        assert_eq!(
            assistant.dump(),
            Dialog::from(vec![ChatMessage::assistant("half an ans")])
        );
    }

    #[tokio::test]
    async fn test_load_replaces_and_dump_copies() {
        let (mut assistant, seen) = assistant();
        assistant.add_system_prompt("discarded");

        let prior = Dialog::from(vec![ChatMessage::user("q"), ChatMessage::assistant("a")]);
        assistant.load(prior.clone());
        assert_eq!(assistant.dump(), prior);

        assistant.set_temperature(0.0);
        assistant.talk("next", None).await.unwrap();
        assert_eq!(assistant.dump().len(), 4);
        assert_eq!(seen.lock().unwrap().as_slice(), &[(3, Some(0.0))]);

        assistant.clear();
        assert!(assistant.dump().is_empty());
    }
}
