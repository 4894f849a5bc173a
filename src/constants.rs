/// Constants module to avoid magic numbers in the codebase

// Application identity
pub const APP_NAME: &str = "askgpt";
pub const ENV_PREFIX: &str = "ASKGPT_";
pub const CONFIG_FILE_NAME: &str = "config.toml";

// Network Configuration
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const HTTP_REQUEST_TIMEOUT_SECS: u64 = 600; // 10 minutes for long completions

// Default Model Configuration
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_TEMPERATURE: f32 = 0.8;

// Session records
pub const DEFAULT_MAX_RECORDS: usize = 10;
pub const INDEX_FILE_NAME: &str = "dialog_list.json";
pub const RECORDS_DIR_NAME: &str = "records";
pub const IDENTIFIER_HEX_LEN: usize = 10;
pub const IDENTIFIER_SUFFIX: char = '_';

// Summaries
pub const SUMMARY_TEMPERATURE: f32 = 0.0;
pub const SUMMARY_MAX_TURNS: usize = 2;
pub const SUMMARY_INSTRUCTIONS: &[&str] = &[
    "Summarize the theme of the text.",
    "The shorter, the better.",
    "Within 10 words.",
    "Avoid using any punctuation as much as possible while ensuring fluency.",
];

// UI Configuration
pub const DEFAULT_EDITOR: &str = "nano";
pub const UI_MAX_WIDTH: u16 = 120;
pub const UI_FALLBACK_WIDTH: u16 = 80;
