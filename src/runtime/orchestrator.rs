use anyhow::Result;
use futures::FutureExt;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

use super::printer::Printer;
use crate::{
    app::{load_config, Config},
    cli::{handle_command, Cli},
    models::Assistant,
    session::{open_new_with_config, open_resume_with_config},
    utils::{compose_in_editor, AskError},
};

/// Main runtime orchestrator
pub struct Orchestrator {
    cli: Cli,
}

impl Orchestrator {
    /// Create a new orchestrator from CLI args
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the orchestrator
    pub async fn run(self) -> Result<()> {
        if let Some(command) = &self.cli.command {
            return handle_command(command, self.cli.config.as_deref()).await;
        }

        let mut config = load_config(self.cli.config.as_deref())?;
        self.apply_overrides(&mut config);

        let prompt = self.resolve_prompt(&config)?;
        let printer = Arc::new(Printer::new());

        if self.cli.continue_session {
            debug!("Continuing the most recent session");
            open_resume_with_config(&config, |assistant| {
                ask(assistant, prompt, printer).boxed()
            })
            .await?;
        } else {
            open_new_with_config(&config, |assistant| ask(assistant, prompt, printer).boxed())
                .await?;
        }

        Ok(())
    }

    /// CLI flags win over the configuration file for this run
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(model) = &self.cli.model {
            config.model.name = model.clone();
        }
        if let Some(temperature) = self.cli.temperature {
            config.model.temperature = temperature;
        }
    }

    fn resolve_prompt(&self, config: &Config) -> Result<String> {
        let words = self.cli.prompt.join(" ");

        if self.cli.editor || words.trim().is_empty() {
            return compose_in_editor(&config.interface.editor, &words);
        }

        Ok(words.trim().to_string())
    }
}

async fn ask(assistant: &mut Assistant, prompt: String, printer: Arc<Printer>) -> Result<String> {
    ask_until(assistant, prompt, printer, tokio::signal::ctrl_c()).await
}

/// Ask `prompt`, giving up when `interrupt` resolves first.
///
/// An interrupted answer keeps the user turn and whatever was streamed so far, and
/// comes back as [`AskError::Interrupted`] so the session is still flushed.
async fn ask_until<I>(
    assistant: &mut Assistant,
    prompt: String,
    printer: Arc<Printer>,
    interrupt: I,
) -> Result<String>
where
    I: Future + Send,
{
    printer.prompt(assistant.model_name(), &prompt);

    let reply = tokio::select! {
        biased;
        reply = assistant.talk(prompt, Some(printer.stream_callback())) => reply,
        _ = interrupt => {
            warn!("Interrupted, saving the partial answer");
            assistant.push_partial_reply(printer.take_reply());
            Err(AskError::Interrupted.into())
        }
    };

    printer.finish();
    reply
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        ChatMessage, Dialog, Model, ModelConfig, ModelResponse, StreamCallback,
    };
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    /// Streams a fragment, then never finishes
    struct StalledModel;

    #[async_trait]
    impl Model for StalledModel {
        async fn chat(
            &mut self,
            _messages: &[ChatMessage],
            _config: &ModelConfig,
            stream_callback: Option<StreamCallback>,
        ) -> Result<ModelResponse> {
            if let Some(callback) = stream_callback {
                callback("Lifetimes are");
            }
            futures::future::pending().await
        }

        fn name(&self) -> &str {
            "stalled"
        }
    }

    fn stalled_assistant() -> Assistant {
        let config = ModelConfig {
            model: "test".to_string(),
            temperature: None,
            max_tokens: None,
        };
        Assistant::new(Box::new(StalledModel), config)
    }

    #[tokio::test]
    async fn test_interrupt_keeps_question_and_partial_answer() {
        let mut assistant = stalled_assistant();
        let printer = Arc::new(Printer::with_width(80));

        let err = ask_until(
            &mut assistant,
            "explain lifetimes".to_string(),
            printer,
            futures::future::ready(()),
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<AskError>(),
            Some(AskError::Interrupted)
        ));
        assert_eq!(
            assistant.dump(),
            Dialog::from(vec![
                ChatMessage::user("explain lifetimes"),
                ChatMessage::assistant("Lifetimes are"),
            ])
        );
    }
}
