use anyhow::{Context, Result};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::num::NonZeroUsize;
use std::panic::AssertUnwindSafe;
use tracing::error;

use super::store::{SessionStore, StoreConfig};
use super::summarizer::ModelSummarizer;
use crate::app::Config;
use crate::models::{Assistant, ModelFactory};
use crate::utils::AskError;

/// Open the session store described by `config`, titling sessions with the summary model
pub fn open_store(config: &Config) -> Result<SessionStore> {
    let max_records = NonZeroUsize::new(config.record.max).ok_or_else(|| {
        AskError::ConfigError("record.max must be a positive integer".to_string())
    })?;
    let store_config = StoreConfig {
        data_dir: config.record.data_dir()?,
        max_records,
    };

    let summarizer = ModelSummarizer::new(ModelFactory::create_summary_assistant(config)?);
    let store = SessionStore::open(store_config.clone(), Box::new(summarizer)).with_context(|| {
        format!(
            "Failed to open session records in {}",
            store_config.data_dir.display()
        )
    })?;
    Ok(store)
}

/// Start a new session, run `body` on it, and flush it however `body` ends.
///
/// `assistant` should hold a fresh dialog (system prompts at most).
pub async fn open_new<T, F>(store: &mut SessionStore, assistant: &mut Assistant, body: F) -> Result<T>
where
    F: for<'a> FnOnce(&'a mut Assistant) -> BoxFuture<'a, Result<T>>,
{
    store.push_blank()?;
    run_and_flush(store, assistant, body).await
}

/// Continue the front session (or start fresh if there is none), run `body`, and
/// flush it however `body` ends.
pub async fn open_resume<T, F>(
    store: &mut SessionStore,
    assistant: &mut Assistant,
    body: F,
) -> Result<T>
where
    F: for<'a> FnOnce(&'a mut Assistant) -> BoxFuture<'a, Result<T>>,
{
    if let Some(dialog) = store.top()? {
        assistant.load(dialog);
    }
    run_and_flush(store, assistant, body).await
}

/// [`open_new`] with the store and assistant built from `config`
pub async fn open_new_with_config<T, F>(config: &Config, body: F) -> Result<T>
where
    F: for<'a> FnOnce(&'a mut Assistant) -> BoxFuture<'a, Result<T>>,
{
    let mut store = open_store(config)?;
    let mut assistant = ModelFactory::create_assistant(config)?;
    open_new(&mut store, &mut assistant, body).await
}

/// [`open_resume`] with the store and assistant built from `config`
pub async fn open_resume_with_config<T, F>(config: &Config, body: F) -> Result<T>
where
    F: for<'a> FnOnce(&'a mut Assistant) -> BoxFuture<'a, Result<T>>,
{
    let mut store = open_store(config)?;
    let mut assistant = ModelFactory::create_assistant(config)?;
    open_resume(&mut store, &mut assistant, body).await
}

async fn run_and_flush<T, F>(store: &mut SessionStore, assistant: &mut Assistant, body: F) -> Result<T>
where
    F: for<'a> FnOnce(&'a mut Assistant) -> BoxFuture<'a, Result<T>>,
{
    let outcome = AssertUnwindSafe(body(assistant)).catch_unwind().await;
    let flushed = store.update_top(&assistant.dump()).await;

    match outcome {
        Ok(Ok(value)) => {
            flushed?;
            Ok(value)
        }
        Ok(Err(err)) => {
            if let Err(flush_err) = flushed {
                error!("Failed to save session after error: {}", flush_err);
            }
            Err(err)
        }
        Err(panic) => {
            if let Err(flush_err) = flushed {
                error!("Failed to save session after panic: {}", flush_err);
            }
            std::panic::resume_unwind(panic)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ChatMessage, Dialog, Model, ModelConfig, ModelResponse, StreamCallback};
    use crate::session::Summarizer;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::path::Path;
    use tempfile::TempDir;

    /// Answers every question with "ok: <question>"
    struct EchoModel;

    #[async_trait]
    impl Model for EchoModel {
        async fn chat(
            &mut self,
            messages: &[ChatMessage],
            config: &ModelConfig,
            _stream_callback: Option<StreamCallback>,
        ) -> Result<ModelResponse> {
            let question = messages.last().map(|m| m.content.as_str()).unwrap_or("");
            Ok(ModelResponse {
                content: format!("ok: {}", question),
                usage: None,
                model_name: config.model.clone(),
            })
        }

        fn name(&self) -> &str {
            "echo"
        }
    }

    struct FirstUserTurn;

    #[async_trait]
    impl Summarizer for FirstUserTurn {
        async fn summarize(&mut self, dialog: &Dialog) -> Result<String> {
            Ok(dialog
                .conversation()
                .next()
                .map(|m| m.content.clone())
                .unwrap_or_default())
        }
    }

    fn store(dir: &Path, max: usize) -> SessionStore {
        let config = StoreConfig {
            data_dir: dir.to_path_buf(),
            max_records: NonZeroUsize::new(max).unwrap(),
        };
        SessionStore::open(config, Box::new(FirstUserTurn)).unwrap()
    }

    fn assistant() -> Assistant {
        let config = ModelConfig {
            model: "echo".to_string(),
            temperature: Some(0.8),
            max_tokens: None,
        };
        Assistant::new(Box::new(EchoModel), config).with_system_prompts(["be brief"])
    }

    async fn ask_new(store: &mut SessionStore, question: &'static str) -> String {
        open_new(store, &mut assistant(), |a| {
            async move { a.talk(question, None).await }.boxed()
        })
        .await
        .unwrap()
    }

    fn summaries(store: &SessionStore) -> Vec<String> {
        store.list_iter().map(str::to_string).collect()
    }

    #[tokio::test]
    async fn test_open_new_flushes_on_success() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = store(temp_dir.path(), 10);

        let reply = ask_new(&mut store, "hi").await;
        assert_eq!(reply, "ok: hi");

        assert_eq!(summaries(&store), vec!["hi"]);
        assert_eq!(
            store.top().unwrap(),
            Some(Dialog::from(vec![
                ChatMessage::system("be brief"),
                ChatMessage::user("hi"),
                ChatMessage::assistant("ok: hi"),
            ]))
        );
    }

    #[tokio::test]
    async fn test_open_new_flushes_when_body_fails() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = store(temp_dir.path(), 10);

        let result: Result<()> = open_new(&mut store, &mut assistant(), |a| {
            async move {
                a.talk("partial", None).await?;
                Err::<(), _>(anyhow::anyhow!("user aborted"))
            }
            .boxed()
        })
        .await;

        assert_eq!(result.unwrap_err().to_string(), "user aborted");
        assert_eq!(summaries(&store), vec!["partial"]);
        assert_eq!(store.top().unwrap().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_open_new_flushes_when_body_panics() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = store(temp_dir.path(), 10);

        let outcome = AssertUnwindSafe(open_new(&mut store, &mut assistant(), |a| {
            async move {
                a.talk("before the crash", None).await?;
                if a.dialog().len() > 1 {
                    panic!("renderer exploded");
                }
                Ok::<(), anyhow::Error>(())
            }
            .boxed()
        }))
        .catch_unwind()
        .await;

        assert!(outcome.is_err());
        assert_eq!(summaries(&store), vec!["before the crash"]);
    }

    #[tokio::test]
    async fn test_open_new_without_conversation_keeps_draft() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = store(temp_dir.path(), 10);

        open_new(&mut store, &mut assistant(), |_| async { Ok::<(), anyhow::Error>(()) }.boxed())
            .await
            .unwrap();

        assert_eq!(summaries(&store), vec![""]);
        assert_eq!(store.top().unwrap(), None);
    }

    #[tokio::test]
    async fn test_open_resume_continues_top_session() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = store(temp_dir.path(), 10);
        ask_new(&mut store, "first").await;
        ask_new(&mut store, "second").await;

        let mut assistant = assistant();
        open_resume(&mut store, &mut assistant, |a| {
            async move { a.talk("follow up", None).await }.boxed()
        })
        .await
        .unwrap();

        // Still two sessions; the front one grew and kept its title
        assert_eq!(summaries(&store), vec!["second", "first"]);
        let top = store.top().unwrap().unwrap();
        let contents: Vec<&str> = top.turns().iter().map(|m| m.content.as_str()).collect();
        assert_eq!(
            contents,
            vec!["be brief", "second", "ok: second", "follow up", "ok: follow up"]
        );
    }

    #[tokio::test]
    async fn test_open_resume_on_empty_store_starts_fresh() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = store(temp_dir.path(), 10);

        open_resume(&mut store, &mut assistant(), |a| {
            async move { a.talk("hello", None).await }.boxed()
        })
        .await
        .unwrap();

        assert_eq!(summaries(&store), vec!["hello"]);
        assert_eq!(store.top().unwrap().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_only_most_recent_sessions_survive() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = store(temp_dir.path(), 2);

        for question in ["hi", "bye", "third"] {
            ask_new(&mut store, question).await;
        }

        assert_eq!(summaries(&store), vec!["third", "bye"]);
        let files = std::fs::read_dir(temp_dir.path().join("records")).unwrap().count();
        assert_eq!(files, 2);
    }
}
