use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{AppError, Result};
use crate::ingest::DEFAULT_COMMIT_BATCH;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_db_path")]
    pub db_path: String,

    pub openai_api_key: Option<String>,

    #[serde(default = "default_model")]
    pub openai_model: String,

    /// Which summarizer variant to use: "enriched" or "basic". Chosen once
    /// at startup; unknown values fall back to basic with a warning.
    #[serde(default = "default_summarizer")]
    pub summarizer: String,

    #[serde(default = "default_summary_max_chars")]
    pub summary_max_chars: usize,

    #[serde(default = "default_comment_max_chars")]
    pub comment_max_chars: usize,

    #[serde(default = "default_commit_batch_size")]
    pub commit_batch_size: usize,
}

fn default_db_path() -> String {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("newswire");
    std::fs::create_dir_all(&data_dir).ok();
    data_dir.join("headlines.db").to_string_lossy().to_string()
}

fn default_model() -> String {
    "gpt-4.1-mini".to_string()
}

fn default_summarizer() -> String {
    "enriched".to_string()
}

fn default_summary_max_chars() -> usize {
    60
}

fn default_comment_max_chars() -> usize {
    80
}

fn default_commit_batch_size() -> usize {
    DEFAULT_COMMIT_BATCH
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            openai_api_key: None,
            openai_model: default_model(),
            summarizer: default_summarizer(),
            summary_max_chars: default_summary_max_chars(),
            comment_max_chars: default_comment_max_chars(),
            commit_batch_size: default_commit_batch_size(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save()?;
            Ok(config)
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("newswire")
            .join("config.toml")
    }
}
