use anyhow::{Context as _, Result};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, Proxy};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::traits::Model;
use super::types::{ChatMessage, ModelConfig, ModelResponse, StreamCallback, TokenUsage};
use crate::constants::HTTP_REQUEST_TIMEOUT_SECS;
use crate::utils::AskError;

/// Chat backend speaking the OpenAI chat-completions protocol
pub struct OpenAiModel {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl OpenAiModel {
    /// Create a client for `base_url`, routing through `proxy` when given.
    ///
    /// A missing API key is only reported when a request is made.
    pub fn new(base_url: &str, api_key: Option<String>, proxy: Option<&str>) -> Result<Self> {
        let mut builder =
            Client::builder().timeout(std::time::Duration::from_secs(HTTP_REQUEST_TIMEOUT_SECS));

        if let Some(proxy_url) = proxy.filter(|p| !p.is_empty()) {
            builder = builder.proxy(
                Proxy::all(proxy_url).with_context(|| format!("Invalid proxy URL: {}", proxy_url))?,
            );
        }

        Ok(Self {
            client: builder.build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn request_body(messages: &[ChatMessage], config: &ModelConfig, stream: bool) -> serde_json::Value {
        let mut body = json!({
            "model": config.model,
            "messages": messages,
            "stream": stream,
        });

        if let Some(temp) = config.temperature {
            body["temperature"] = json!(temp);
        }
        if let Some(max_tokens) = config.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }

        body
    }

    async fn send(&self, body: &serde_json::Value) -> Result<reqwest::Response> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            AskError::ConfigError(
                "no API key: set model.api_key or the configured environment variable".to_string(),
            )
        })?;

        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(body)
            .send()
            .await
            .with_context(|| format!("Failed to reach {}", url))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AskError::ApiError(format!("{}: {}", status, error_text)).into());
        }

        Ok(response)
    }
}

#[async_trait]
impl Model for OpenAiModel {
    async fn chat(
        &mut self,
        messages: &[ChatMessage],
        config: &ModelConfig,
        stream_callback: Option<StreamCallback>,
    ) -> Result<ModelResponse> {
        let body = Self::request_body(messages, config, stream_callback.is_some());
        debug!("Sending {} messages to {}", messages.len(), config.model);

        let response = self.send(&body).await?;

        let Some(callback) = stream_callback else {
            let response_json: ChatCompletionResponse = response.json().await?;
            let content = response_json
                .choices
                .into_iter()
                .next()
                .map(|c| c.message.content)
                .ok_or_else(|| AskError::ApiError("response contained no choices".to_string()))?;

            return Ok(ModelResponse {
                content,
                usage: response_json.usage.map(|u| TokenUsage {
                    prompt_tokens: u.prompt_tokens,
                    completion_tokens: u.completion_tokens,
                    total_tokens: u.total_tokens,
                }),
                model_name: config.model.clone(),
            });
        };

        let mut stream = response.bytes_stream();
        let mut events = SseBuffer::default();
        let mut full_response = String::new();

        'outer: while let Some(chunk) = stream.next().await {
            let chunk = chunk.context("Stream interrupted")?;
            for data in events.push(&chunk) {
                if data == "[DONE]" {
                    break 'outer;
                }
                if let Some(delta) = parse_delta(&data) {
                    full_response.push_str(&delta);
                    callback(&delta);
                }
            }
        }

        Ok(ModelResponse {
            content: full_response,
            usage: None, // Not reported in streaming mode
            model_name: config.model.clone(),
        })
    }

    fn name(&self) -> &str {
        "openai"
    }
}

/// Splits a byte stream of server-sent events into `data:` payloads.
///
/// Chunks may end mid-line (or mid-character); incomplete tails are kept
/// until the next push.
#[derive(Debug, Default)]
struct SseBuffer {
    pending: Vec<u8>,
}

impl SseBuffer {
    fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);

        let mut payloads = Vec::new();
        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            let line = line.trim_end_matches(['\r', '\n']);
            if let Some(data) = line.strip_prefix("data:") {
                payloads.push(data.trim_start().to_string());
            }
        }
        payloads
    }
}

fn parse_delta(data: &str) -> Option<String> {
    serde_json::from_str::<StreamChunk>(data)
        .ok()?
        .choices
        .into_iter()
        .next()?
        .delta
        .content
}

// Response structures (OpenAI format)

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Message {
    content: String,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: usize,
    completion_tokens: usize,
    total_tokens: usize,
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: Delta,
}

#[derive(Debug, Deserialize)]
struct Delta {
    content: Option<String>,
}
