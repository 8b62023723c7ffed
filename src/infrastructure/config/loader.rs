use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::adapters::providers::ProviderKind;
use crate::domain::models::config::Config;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Unknown AI provider: {0}. Must be one of: openai, gemini, anthropic")]
    UnknownProvider(String),

    #[error("Unknown embedding provider: {0}. Must be one of: openai, gemini, none")]
    UnknownEmbeddingProvider(String),

    #[error("Invalid similarity threshold: {0}. Must be in (0, 1]")]
    InvalidSimilarityThreshold(f32),

    #[error("Invalid {0}: must be positive")]
    NonPositive(&'static str),

    #[error("Invalid rate limit: {0}. Must be positive")]
    InvalidRateLimit(u32),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Database path cannot be empty")]
    EmptyDatabasePath,

    #[error("Invalid max_connections: {0}. Must be at least 1")]
    InvalidMaxConnections(u32),

    #[error("Invalid burst_size: {0}. Must be at least 1")]
    InvalidBurstSize(u32),

    #[error(
        "Invalid backoff configuration: initial_backoff_ms ({0}) must be less than max_backoff_ms ({1})"
    )]
    InvalidBackoff(u64, u64),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .storelens/config.yaml (project config)
    /// 3. .storelens/local.yaml (local overrides, optional)
    /// 4. Environment variables (STORELENS_* prefix, `__` for nesting)
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(".storelens/config.yaml"))
            .merge(Yaml::file(".storelens/local.yaml"))
            .merge(Env::prefixed("STORELENS_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .merge(Env::prefixed("STORELENS_").split("__"))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if ProviderKind::from_str(&config.ai.provider).is_none() {
            return Err(ConfigError::UnknownProvider(config.ai.provider.clone()));
        }
        if config.ai.request_timeout_secs == 0 {
            return Err(ConfigError::NonPositive("ai.request_timeout_secs"));
        }

        let valid_embedding_providers = ["openai", "gemini", "none"];
        let embedding_provider = config.embeddings.provider.trim().to_lowercase();
        if !valid_embedding_providers.contains(&embedding_provider.as_str()) {
            return Err(ConfigError::UnknownEmbeddingProvider(
                config.embeddings.provider.clone(),
            ));
        }

        let pipeline = &config.pipeline;
        if !(pipeline.similarity_threshold > 0.0 && pipeline.similarity_threshold <= 1.0) {
            return Err(ConfigError::InvalidSimilarityThreshold(
                pipeline.similarity_threshold,
            ));
        }
        if pipeline.stage_timeout_secs == 0 {
            return Err(ConfigError::NonPositive("pipeline.stage_timeout_secs"));
        }
        if pipeline.max_suggestions == 0 {
            return Err(ConfigError::NonPositive("pipeline.max_suggestions"));
        }
        if pipeline.lite_max_suggestions == 0 {
            return Err(ConfigError::NonPositive("pipeline.lite_max_suggestions"));
        }
        if pipeline.full_lookback_days <= 0 || pipeline.lite_lookback_days <= 0 {
            return Err(ConfigError::NonPositive("pipeline lookback days"));
        }

        if config.database.path.is_empty() {
            return Err(ConfigError::EmptyDatabasePath);
        }
        if config.database.max_connections == 0 {
            return Err(ConfigError::InvalidMaxConnections(
                config.database.max_connections,
            ));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        if config.rate_limit.requests_per_second == 0 {
            return Err(ConfigError::InvalidRateLimit(
                config.rate_limit.requests_per_second,
            ));
        }
        if config.rate_limit.burst_size == 0 {
            return Err(ConfigError::InvalidBurstSize(config.rate_limit.burst_size));
        }

        if config.retry.initial_backoff_ms >= config.retry.max_backoff_ms {
            return Err(ConfigError::InvalidBackoff(
                config.retry.initial_backoff_ms,
                config.retry.max_backoff_ms,
            ));
        }

        Ok(())
    }
}
