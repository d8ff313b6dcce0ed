use std::path::PathBuf;
use thiserror::Error;

use crate::embedding::{EmbeddingError, IndexError};
use crate::llm::GenerationError;

/// Main error type for the Compass application
#[derive(Error, Debug)]
pub enum CompassError {
    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration validation errors
    #[error("Configuration validation failed: {errors:?}")]
    ConfigValidation { errors: Vec<ValidationError> },

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Invalid configuration value
    #[error("Invalid configuration value at {path}: {message}")]
    InvalidConfigValue { path: String, message: String },

    /// Knowledge base file missing, unreadable, or empty after filtering
    #[error("Knowledge base error: {path}: {message}")]
    KnowledgeBase { path: PathBuf, message: String },

    /// Profile table missing or unreadable
    #[error("Profile table error: {path}: {message}")]
    Profiles { path: PathBuf, message: String },

    /// Unknown customer identifier
    #[error("Customer not found: {id}")]
    CustomerNotFound { id: u64 },

    /// Generation service credentials are not configured
    #[error("Missing credentials: environment variable {env_var} is not set")]
    MissingCredentials { env_var: String },

    /// Embedding model errors (initialization failures are fatal)
    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    /// Vector index errors
    #[error("Index error: {0}")]
    Index(#[from] IndexError),

    /// External generation call failed or returned an unusable response
    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    /// IO errors
    #[error("IO error: {context}: {source}")]
    Io {
        source: std::io::Error,
        context: String,
    },

    /// TOML deserialization errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization errors
    #[error("TOML serialization error: {0}")]
    TomlSerialization(#[from] toml::ser::Error),

    /// JSON errors
    #[error("JSON error: {context}: {source}")]
    Json {
        source: serde_json::Error,
        context: String,
    },

    /// CSV errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Generic errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Configuration validation error
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Path to the configuration key that failed validation
    pub path: String,
    /// Error message describing the validation failure
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result type for Compass operations
pub type Result<T> = std::result::Result<T, CompassError>;
