use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Settings for an evaluation session
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Completion API endpoint
    pub api_endpoint: String,
    /// Environment variable name containing the completion API key
    pub env_var_api_key: String,
    /// Model used to generate responses
    pub model: String,
    /// Judge API endpoint used by the scorers
    pub judge_api_endpoint: String,
    /// Environment variable name containing the judge API key
    pub judge_env_var_api_key: String,
    /// Model used to score responses
    pub judge_model: String,
    /// Pass threshold for the faithfulness metric
    pub faithfulness_threshold: f64,
    /// Pass threshold for the relevancy metric
    pub relevancy_threshold: f64,
    /// Pass threshold for the hallucination metric
    pub hallucination_threshold: f64,
    /// Directory where per-iteration snapshots are written
    pub output_dir: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_endpoint: "https://api.mistral.ai/v1".to_string(),
            env_var_api_key: "MISTRAL_API_KEY".to_string(),
            model: "mistral-small-latest".to_string(),
            judge_api_endpoint: "https://api.openai.com/v1".to_string(),
            judge_env_var_api_key: "OPENAI_API_KEY".to_string(),
            judge_model: "gpt-3.5-turbo".to_string(),
            faithfulness_threshold: 0.7,
            relevancy_threshold: 0.7,
            hallucination_threshold: 0.5,
            output_dir: ".".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from a TOML file; absent fields fall back to defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML settings: {}", path.display()))
    }
}

/// API keys resolved from the environment at startup
#[derive(Debug, Clone)]
pub struct Credentials {
    pub api_key: String,
    pub judge_api_key: String,
}

impl Credentials {
    /// Resolve both API keys; a missing variable is fatal before the loop starts
    pub fn from_env(settings: &Settings) -> Result<Self> {
        let api_key = std::env::var(&settings.env_var_api_key).with_context(|| {
            format!("Environment variable {} not found", settings.env_var_api_key)
        })?;
        let judge_api_key = std::env::var(&settings.judge_env_var_api_key).with_context(|| {
            format!(
                "Environment variable {} not found",
                settings.judge_env_var_api_key
            )
        })?;

        Ok(Self {
            api_key,
            judge_api_key,
        })
    }
}
