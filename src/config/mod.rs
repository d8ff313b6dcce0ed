//! Configuration management for Compass
//!
//! Handles loading, validation, and defaulting of the TOML configuration that
//! wires the recommendation pipeline together.

use crate::error::{CompassError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

mod validator;

pub use validator::ConfigValidator;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(rename = "_meta")]
    pub meta: MetaConfig,
    pub storage: StorageConfig,
    pub knowledge_base: KnowledgeBaseConfig,
    pub profiles: ProfilesConfig,
    pub embedding: EmbeddingConfig,
    pub llm: LlmConfig,
    pub retrieval: RetrievalConfig,
}

/// Metadata about the configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaConfig {
    pub schema_version: String,
    #[serde(default = "current_timestamp")]
    pub created_at: String,
    #[serde(default = "current_timestamp")]
    pub last_modified: String,
}

fn current_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Storage configuration for persisted artifacts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the persisted vector index
    pub data_dir: PathBuf,
    /// File name of the binary index artifact inside `data_dir`
    pub index_file: String,
}

/// Knowledge base configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeBaseConfig {
    /// Path to the plain-text product corpus
    pub path: PathBuf,
    /// Literal delimiter separating product entries
    pub delimiter: String,
}

/// Customer profile table configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfilesConfig {
    /// Path to the processed customer CSV produced by the feature pipeline
    pub path: PathBuf,
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    pub model: String,
    pub batch_size: usize,
}

/// LLM configuration for the generation service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub provider: String,
    pub api_key_env: String,
    pub model: String,
    pub temperature: f32,
    /// Upper bound on a single generation call, in seconds
    pub request_timeout_secs: u64,
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Number of nearest documents to retrieve for each query
    pub top_k: usize,
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CompassError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CompassError::Io {
            source: e,
            context: format!("Failed to read config file: {:?}", path),
        })?;
        let mut config: Config = toml::from_str(&content)?;

        // Apply environment variable overrides
        config.apply_env_overrides();

        // Validate configuration
        ConfigValidator::validate(&config)?;

        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| CompassError::Io {
            source: e,
            context: format!("Failed to write config file: {:?}", path),
        })?;
        Ok(())
    }

    /// Apply environment variable overrides
    /// Environment variables in format: COMPASS_SECTION__KEY=value
    pub fn apply_env_overrides(&mut self) {
        for (key, value) in std::env::vars() {
            if let Some(config_key) = key.strip_prefix("COMPASS_") {
                if let Err(e) = self.set_value_from_env(config_key, &value) {
                    tracing::warn!("Failed to apply env override {}: {}", key, e);
                }
            }
        }
    }

    fn set_value_from_env(&mut self, path: &str, value: &str) -> Result<()> {
        match path {
            "LLM__MODEL" => {
                self.llm.model = value.to_string();
            }
            "LLM__TEMPERATURE" => {
                self.llm.temperature =
                    value.parse().map_err(|_| CompassError::InvalidConfigValue {
                        path: path.to_string(),
                        message: format!("Cannot parse '{}' as float", value),
                    })?;
            }
            "EMBEDDING__MODEL" => {
                self.embedding.model = value.to_string();
            }
            "RETRIEVAL__TOP_K" => {
                self.retrieval.top_k =
                    value.parse().map_err(|_| CompassError::InvalidConfigValue {
                        path: path.to_string(),
                        message: format!("Cannot parse '{}' as integer", value),
                    })?;
            }
            "KNOWLEDGE_BASE__PATH" => {
                self.knowledge_base.path = PathBuf::from(value);
            }
            "PROFILES__PATH" => {
                self.profiles.path = PathBuf::from(value);
            }
            _ => {
                tracing::debug!("Unknown env config key: {}", path);
            }
        }
        Ok(())
    }

    /// Absolute path of the persisted index artifact
    pub fn index_path(&self) -> PathBuf {
        self.storage.data_dir.join(&self.storage.index_file)
    }

    /// Get the default configuration file path
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| CompassError::Config("Cannot determine config directory".to_string()))?;

        Ok(config_dir.join("compass").join("config.toml"))
    }

    /// Get the default data directory
    pub fn default_data_dir() -> Result<PathBuf> {
        let home_dir = dirs::home_dir()
            .ok_or_else(|| CompassError::Config("Cannot determine home directory".to_string()))?;

        Ok(home_dir.join(".compass"))
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = PathBuf::from("~/.compass");

        Self {
            meta: MetaConfig {
                schema_version: "1.0.0".to_string(),
                created_at: current_timestamp(),
                last_modified: current_timestamp(),
            },
            storage: StorageConfig {
                data_dir,
                index_file: "index.bin".to_string(),
            },
            knowledge_base: KnowledgeBaseConfig {
                path: PathBuf::from("products.txt"),
                delimiter: "-".repeat(32),
            },
            profiles: ProfilesConfig {
                path: PathBuf::from("processed_customer_data.csv"),
            },
            embedding: EmbeddingConfig {
                model: "all-MiniLM-L6-v2".to_string(),
                batch_size: 32,
            },
            llm: LlmConfig {
                provider: "groq".to_string(),
                api_key_env: "GROQ_API_KEY".to_string(),
                model: "llama3-8b-8192".to_string(),
                temperature: 0.5,
                request_timeout_secs: 60,
            },
            retrieval: RetrievalConfig { top_k: 3 },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = Config::default();
        let content = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&content).unwrap();

        assert_eq!(parsed.retrieval.top_k, 3);
        assert_eq!(parsed.embedding.model, "all-MiniLM-L6-v2");
        assert_eq!(parsed.llm.model, "llama3-8b-8192");
        assert_eq!(parsed.knowledge_base.delimiter.len(), 32);
    }

    #[test]
    fn load_missing_file_is_config_not_found() {
        let result = Config::load(Path::new("/nonexistent/compass.toml"));
        assert!(matches!(
            result,
            Err(crate::CompassError::ConfigNotFound { .. })
        ));
    }
}
