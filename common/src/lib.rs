/*!
common/src/lib.rs

Shared configuration types for Pitchside.

This file provides:
- Config data structures (deserialized from TOML)
- An async loader that merges a default file with an override file
*/

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// HTTP server section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

/// Subscription store section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Path to the JSON document holding the subscriptions (e.g. "data/subscriptions.json")
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: "data/subscriptions.json".to_string(),
        }
    }
}

/// Remote chat-completion endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmConfig {
    pub api_url: Option<String>,
    pub api_key_env: Option<String>,
    pub model: Option<String>,
    /// Unset means no timeout beyond the HTTP client default.
    pub timeout_seconds: Option<u64>,
    pub temperature: Option<f32>,
}

impl LlmConfig {
    pub const DEFAULT_API_URL: &'static str = "https://api.openai.com/v1/chat/completions";
    pub const DEFAULT_API_KEY_ENV: &'static str = "OPENAI_API_KEY";
    pub const DEFAULT_MODEL: &'static str = "gpt-4o-mini";

    pub fn api_url(&self) -> &str {
        self.api_url.as_deref().unwrap_or(Self::DEFAULT_API_URL)
    }

    pub fn api_key_env(&self) -> &str {
        self.api_key_env.as_deref().unwrap_or(Self::DEFAULT_API_KEY_ENV)
    }

    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(Self::DEFAULT_MODEL)
    }
}

/// Top-level application configuration (deserialized from config.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub llm: LlmConfig,
}

impl Config {
    /// Load configuration with an optional default file and an optional override file.
    /// If both are present, they are merged (override takes precedence).
    /// Missing files are skipped; with neither present the built-in defaults apply.
    pub async fn load_with_defaults(
        default_path: Option<&Path>,
        override_path: Option<&Path>,
    ) -> Result<Self> {
        let mut config_value = toml::Value::Table(toml::map::Map::new());

        for (label, path) in [("default", default_path), ("override", override_path)] {
            let Some(path) = path else { continue };
            if !path.exists() {
                continue;
            }
            let data = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read {} config: {}", label, path.display()))?;
            let val: toml::Value = toml::from_str(&data)
                .with_context(|| format!("Failed to parse {} configuration", label))?;
            merge_toml(&mut config_value, val);
        }

        let cfg: Config = config_value
            .try_into()
            .context("Failed to parse merged configuration")?;
        Ok(cfg)
    }
}

fn merge_toml(a: &mut toml::Value, b: toml::Value) {
    match (a, b) {
        (toml::Value::Table(a_map), toml::Value::Table(b_map)) => {
            for (k, v) in b_map {
                if let Some(a_val) = a_map.get_mut(&k) {
                    merge_toml(a_val, v);
                } else {
                    a_map.insert(k, v);
                }
            }
        }
        (a_val, b_val) => *a_val = b_val,
    }
}
