use anyhow::{Context, Result};
use directories::ProjectDirs;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::constants::{
    APP_NAME, CONFIG_FILE_NAME, DEFAULT_API_KEY_ENV, DEFAULT_BASE_URL, DEFAULT_EDITOR,
    DEFAULT_MAX_RECORDS, DEFAULT_MODEL, DEFAULT_TEMPERATURE, ENV_PREFIX,
};
use crate::utils::AskError;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Chat model configuration
    #[serde(default)]
    pub model: ModelSettings,

    /// Network configuration
    #[serde(default)]
    pub net: NetConfig,

    /// Interface configuration
    #[serde(default)]
    pub interface: InterfaceConfig,

    /// Session record configuration
    #[serde(default)]
    pub record: RecordConfig,
}

/// Chat model settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    /// API key; when empty the key is read from `api_key_env`
    pub api_key: String,
    /// Environment variable consulted when `api_key` is empty
    pub api_key_env: String,
    /// Model name sent with every request
    pub name: String,
    /// Temperature for generation
    pub temperature: f32,
    /// Base URL of the OpenAI-compatible endpoint
    pub base_url: String,
    /// System prompts prepended to every fresh dialog
    pub system_prompt: Vec<String>,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            name: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            base_url: DEFAULT_BASE_URL.to_string(),
            system_prompt: Vec::new(),
        }
    }
}

impl ModelSettings {
    /// Resolve the API key, falling back to the configured environment variable
    pub fn resolve_api_key(&self) -> Option<String> {
        if !self.api_key.is_empty() {
            return Some(self.api_key.clone());
        }
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.is_empty())
    }
}

/// Network configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NetConfig {
    /// Proxy URL applied to all API traffic
    pub proxy: Option<String>,
}

/// Interface configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InterfaceConfig {
    /// Editor used to compose prompts
    pub editor: String,
}

impl Default for InterfaceConfig {
    fn default() -> Self {
        Self {
            editor: DEFAULT_EDITOR.to_string(),
        }
    }
}

/// Session record configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordConfig {
    /// Maximum number of sessions kept on disk
    pub max: usize,
    /// Data directory holding the index and the records; platform default when unset
    pub dir: Option<PathBuf>,
    /// Model used to title new sessions
    pub summary_model: String,
}

impl Default for RecordConfig {
    fn default() -> Self {
        Self {
            max: DEFAULT_MAX_RECORDS,
            dir: None,
            summary_model: DEFAULT_MODEL.to_string(),
        }
    }
}

impl RecordConfig {
    /// Directory where the index file and the `records/` folder live
    pub fn data_dir(&self) -> Result<PathBuf> {
        match &self.dir {
            Some(dir) => Ok(dir.clone()),
            None => get_data_dir(),
        }
    }
}

/// Load configuration from `path`, or from the default location when `None`.
///
/// A missing file is a configuration error: the API credentials live there.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => default_config_path()?,
    };

    if !path.exists() {
        return Err(AskError::ConfigError(format!(
            "{} not found, run `{} init` to create one",
            path.display(),
            APP_NAME
        ))
        .into());
    }

    let config: Config = Figment::from(Serialized::defaults(Config::default()))
        .merge(Toml::file(&path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;

    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<(), AskError> {
    if config.record.max == 0 {
        return Err(AskError::ConfigError(
            "record.max must be a positive integer".to_string(),
        ));
    }
    Ok(())
}

/// Default path of the configuration file
pub fn default_config_path() -> Result<PathBuf> {
    Ok(get_config_dir()?.join(CONFIG_FILE_NAME))
}

/// Get the configuration directory
pub fn get_config_dir() -> Result<PathBuf> {
    if let Some(proj_dirs) = ProjectDirs::from("", "", APP_NAME) {
        Ok(proj_dirs.config_dir().to_path_buf())
    } else {
        Ok(home_dir()?.join(".config").join(APP_NAME))
    }
}

/// Get the data directory used for session records
pub fn get_data_dir() -> Result<PathBuf> {
    if let Some(proj_dirs) = ProjectDirs::from("", "", APP_NAME) {
        Ok(proj_dirs.data_dir().to_path_buf())
    } else {
        Ok(home_dir()?.join(".local").join("share").join(APP_NAME))
    }
}

fn home_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .context("Could not determine home directory")?;
    Ok(PathBuf::from(home))
}

/// Save configuration to file
pub fn save_config(config: &Config, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let toml_string = toml::to_string_pretty(config)?;
    std::fs::write(path, toml_string)
        .with_context(|| format!("Failed to write config to {}", path.display()))?;

    Ok(())
}

/// Create a default configuration file if it doesn't exist.
///
/// Returns the path of the configuration file and whether it was created.
pub fn init_config(path: Option<&Path>) -> Result<(PathBuf, bool)> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => default_config_path()?,
    };

    if path.exists() {
        return Ok((path, false));
    }

    save_config(&Config::default(), &path)?;
    Ok((path, true))
}
