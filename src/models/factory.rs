use anyhow::Result;

use super::assistant::Assistant;
use super::openai::OpenAiModel;
use super::traits::Model;
use super::types::ModelConfig;
use crate::app::Config;
use crate::constants::SUMMARY_TEMPERATURE;

/// Factory for creating model and assistant instances from configuration
pub struct ModelFactory;

impl ModelFactory {
    /// Create the chat backend described by `config`
    pub fn create(config: &Config) -> Result<Box<dyn Model>> {
        let model = OpenAiModel::new(
            &config.model.base_url,
            config.model.resolve_api_key(),
            config.net.proxy.as_deref(),
        )?;
        Ok(Box::new(model))
    }

    /// Create the interactive assistant, seeded with the configured system prompts
    pub fn create_assistant(config: &Config) -> Result<Assistant> {
        let model_config = ModelConfig {
            model: config.model.name.clone(),
            temperature: Some(config.model.temperature),
            max_tokens: None,
        };

        Ok(Assistant::new(Self::create(config)?, model_config)
            .with_system_prompts(config.model.system_prompt.iter().cloned()))
    }

    /// Create the deterministic assistant used to title sessions
    pub fn create_summary_assistant(config: &Config) -> Result<Assistant> {
        let model_config = ModelConfig {
            model: config.record.summary_model.clone(),
            temperature: Some(SUMMARY_TEMPERATURE),
            max_tokens: None,
        };

        Ok(Assistant::new(Self::create(config)?, model_config))
    }
}
