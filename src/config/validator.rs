use crate::config::Config;
use crate::error::{CompassError, Result, ValidationError};

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration
    pub fn validate(config: &Config) -> Result<()> {
        let mut errors = Vec::new();

        Self::validate_schema_version(config, &mut errors);
        Self::validate_storage(config, &mut errors);
        Self::validate_knowledge_base(config, &mut errors);
        Self::validate_profiles(config, &mut errors);
        Self::validate_embedding(config, &mut errors);
        Self::validate_llm(config, &mut errors);
        Self::validate_retrieval(config, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(CompassError::ConfigValidation { errors })
        }
    }

    fn validate_schema_version(config: &Config, errors: &mut Vec<ValidationError>) {
        let version = &config.meta.schema_version;
        if version != "1.0.0" {
            errors.push(ValidationError::new(
                "_meta.schema_version",
                format!("Unsupported schema version: {}", version),
            ));
        }
    }

    fn validate_storage(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.storage.data_dir.as_os_str().is_empty() {
            errors.push(ValidationError::new(
                "storage.data_dir",
                "Data directory path cannot be empty",
            ));
        }

        if config.storage.index_file.is_empty() {
            errors.push(ValidationError::new(
                "storage.index_file",
                "Index file name cannot be empty",
            ));
        }
    }

    fn validate_knowledge_base(config: &Config, errors: &mut Vec<ValidationError>) {
        // File existence is not checked here: paths may contain ~ which needs
        // expansion, and the loader reports missing files with full context.
        if config.knowledge_base.path.as_os_str().is_empty() {
            errors.push(ValidationError::new(
                "knowledge_base.path",
                "Knowledge base path cannot be empty",
            ));
        }

        if config.knowledge_base.delimiter.is_empty() {
            errors.push(ValidationError::new(
                "knowledge_base.delimiter",
                "Delimiter cannot be empty",
            ));
        }
    }

    fn validate_profiles(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.profiles.path.as_os_str().is_empty() {
            errors.push(ValidationError::new(
                "profiles.path",
                "Profile table path cannot be empty",
            ));
        }
    }

    fn validate_embedding(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.embedding.batch_size == 0 {
            errors.push(ValidationError::new(
                "embedding.batch_size",
                "Batch size must be greater than 0",
            ));
        }

        if config.embedding.model.is_empty() {
            errors.push(ValidationError::new(
                "embedding.model",
                "Model name cannot be empty",
            ));
        }
    }

    fn validate_llm(config: &Config, errors: &mut Vec<ValidationError>) {
        // The API key itself is resolved when the generation client is
        // constructed; retrieval-only commands must not require it.
        if config.llm.api_key_env.is_empty() {
            errors.push(ValidationError::new(
                "llm.api_key_env",
                "API key environment variable name cannot be empty",
            ));
        }

        if config.llm.model.is_empty() {
            errors.push(ValidationError::new("llm.model", "Model cannot be empty"));
        }

        let temp = config.llm.temperature;
        if !(0.0..=2.0).contains(&temp) {
            errors.push(ValidationError::new(
                "llm.temperature",
                format!("Temperature must be between 0.0 and 2.0, got {}", temp),
            ));
        }

        let provider = &config.llm.provider;
        let valid_providers = ["groq", "openai"];
        if !valid_providers.contains(&provider.as_str()) {
            errors.push(ValidationError::new(
                "llm.provider",
                format!(
                    "Provider must be one of {:?}, got '{}'",
                    valid_providers, provider
                ),
            ));
        }

        if config.llm.request_timeout_secs == 0 {
            errors.push(ValidationError::new(
                "llm.request_timeout_secs",
                "Request timeout must be greater than 0",
            ));
        }
    }

    fn validate_retrieval(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.retrieval.top_k == 0 {
            errors.push(ValidationError::new(
                "retrieval.top_k",
                "top_k must be greater than 0",
            ));
        }
    }
}
