// src/infra/config.rs — Configuration loading (TOML)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::infra::paths;
use crate::provider::retry::RetryOn;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub model: ModelConfig,

    #[serde(default)]
    pub reflection: ReflectionSection,

    #[serde(default)]
    pub retry: RetrySection,

    #[serde(default)]
    pub transcript: TranscriptConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub name: String,
    /// Talk to the local OpenAI-compatible endpoint instead of the hosted one.
    pub local: bool,
    pub hosted_base_url: String,
    pub local_base_url: String,
    /// Placeholder credential sent to the local endpoint.
    pub local_api_key: String,
    /// Omitted from requests when unset; the endpoint's default applies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: "gpt-4o-mini".into(),
            local: false,
            hosted_base_url: "https://api.openai.com/v1".into(),
            local_base_url: "http://localhost:11434/v1".into(),
            local_api_key: "ollama".into(),
            max_tokens: None,
            temperature: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReflectionSection {
    pub steps: usize,
    pub history_capacity: usize,
    pub eviction_index: usize,
    pub stop_marker: String,
}

impl Default for ReflectionSection {
    fn default() -> Self {
        Self {
            steps: 5,
            history_capacity: 3,
            eviction_index: 1,
            stop_marker: "<OK>".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySection {
    pub max_attempts: u32,
    pub min_delay_secs: f64,
    pub max_delay_secs: f64,
    pub multiplier_secs: f64,
    pub retry_on: RetryOn,
}

impl Default for RetrySection {
    fn default() -> Self {
        Self {
            max_attempts: 6,
            min_delay_secs: 1.0,
            max_delay_secs: 60.0,
            multiplier_secs: 1.0,
            retry_on: RetryOn::AnyError,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptConfig {
    /// Buffer completions and write them to a file instead of the console.
    pub save: bool,
    /// Transcript directory (defaults to the data dir's `logs/`).
    pub dir: Option<String>,
}

impl TranscriptConfig {
    pub fn resolved_dir(&self) -> PathBuf {
        self.dir
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(paths::logs_dir)
    }
}

impl Config {
    /// Load config from file, falling back to defaults.
    pub fn load() -> anyhow::Result<Self> {
        let path = paths::config_file_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}
