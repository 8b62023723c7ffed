use serde::{Deserialize, Serialize};

/// Main configuration structure for StoreLens
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Chat-completion provider configuration
    #[serde(default)]
    pub ai: AiConfig,

    /// Embedding provider configuration
    #[serde(default)]
    pub embeddings: EmbeddingsConfig,

    /// Pipeline tuning
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Static knowledge data
    #[serde(default)]
    pub knowledge: KnowledgeConfig,

    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Retry policy configuration
    #[serde(default)]
    pub retry: RetryConfig,
}

/// Chat-completion provider selection and per-provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AiConfig {
    /// Active provider: openai, gemini or anthropic
    #[serde(default = "default_ai_provider")]
    pub provider: String,

    /// HTTP timeout for a single generation call
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "ProviderSettings::openai")]
    pub openai: ProviderSettings,

    #[serde(default = "ProviderSettings::gemini")]
    pub gemini: ProviderSettings,

    #[serde(default = "ProviderSettings::anthropic")]
    pub anthropic: ProviderSettings,
}

fn default_ai_provider() -> String {
    "openai".to_string()
}

const fn default_request_timeout_secs() -> u64 {
    120
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            provider: default_ai_provider(),
            request_timeout_secs: default_request_timeout_secs(),
            openai: ProviderSettings::openai(),
            gemini: ProviderSettings::gemini(),
            anthropic: ProviderSettings::anthropic(),
        }
    }
}

/// Settings for one chat-completion backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ProviderSettings {
    /// API key (falls back to the provider's conventional env var)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    pub base_url: String,

    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

const fn default_temperature() -> f32 {
    0.7
}

const fn default_max_tokens() -> u32 {
    4096
}

impl ProviderSettings {
    pub fn openai() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }

    pub fn gemini() -> Self {
        Self {
            api_key: None,
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-2.0-flash".to_string(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }

    pub fn anthropic() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.anthropic.com".to_string(),
            model: "claude-sonnet-4-5-20250929".to_string(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

/// Embedding provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EmbeddingsConfig {
    /// openai, gemini or none
    #[serde(default = "default_embedding_provider")]
    pub provider: String,

    #[serde(default = "default_embedding_model")]
    pub model: String,

    #[serde(default = "default_embedding_dimension")]
    pub dimension: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL override (for testing/proxies)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(default = "default_embedding_timeout")]
    pub timeout_secs: u64,
}

fn default_embedding_provider() -> String {
    "openai".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

const fn default_embedding_dimension() -> usize {
    1536
}

const fn default_embedding_timeout() -> u64 {
    30
}

impl Default for EmbeddingsConfig {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            model: default_embedding_model(),
            dimension: default_embedding_dimension(),
            api_key: None,
            base_url: None,
            timeout_secs: default_embedding_timeout(),
        }
    }
}

/// Pipeline tuning knobs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PipelineConfig {
    /// Upper bound on a single stage, independent of HTTP timeouts
    #[serde(default = "default_stage_timeout_secs")]
    pub stage_timeout_secs: u64,

    /// Suggestions above this cosine similarity to a stored one are dropped
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f32,

    #[serde(default = "default_max_suggestions")]
    pub max_suggestions: usize,

    #[serde(default = "default_lite_max_suggestions")]
    pub lite_max_suggestions: usize,

    #[serde(default = "default_full_lookback_days")]
    pub full_lookback_days: i64,

    #[serde(default = "default_lite_lookback_days")]
    pub lite_lookback_days: i64,

    /// Previous suggestions/analyses loaded as history
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Knowledge documents retrieved per category
    #[serde(default = "default_knowledge_results")]
    pub knowledge_results: usize,

    #[serde(default = "default_synthesize_profile")]
    pub synthesize_profile: bool,
}

const fn default_stage_timeout_secs() -> u64 {
    180
}

const fn default_similarity_threshold() -> f32 {
    0.85
}

const fn default_max_suggestions() -> usize {
    9
}

const fn default_lite_max_suggestions() -> usize {
    5
}

const fn default_full_lookback_days() -> i64 {
    90
}

const fn default_lite_lookback_days() -> i64 {
    30
}

const fn default_history_limit() -> usize {
    30
}

const fn default_knowledge_results() -> usize {
    3
}

const fn default_synthesize_profile() -> bool {
    true
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            stage_timeout_secs: default_stage_timeout_secs(),
            similarity_threshold: default_similarity_threshold(),
            max_suggestions: default_max_suggestions(),
            lite_max_suggestions: default_lite_max_suggestions(),
            full_lookback_days: default_full_lookback_days(),
            lite_lookback_days: default_lite_lookback_days(),
            history_limit: default_history_limit(),
            knowledge_results: default_knowledge_results(),
            synthesize_profile: default_synthesize_profile(),
        }
    }
}

/// Static knowledge data locations
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct KnowledgeConfig {
    /// YAML niche catalog replacing the built-in one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub niches_file: Option<String>,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseConfig {
    /// Path to `SQLite` database file
    #[serde(default = "default_database_path")]
    pub path: String,

    /// Maximum number of database connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_path() -> String {
    ".storelens/storelens.db".to_string()
}

const fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: default_max_connections(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for daily-rolling JSON log files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
        }
    }
}

/// Rate limiting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RateLimitConfig {
    /// Requests per second allowed
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,

    /// Burst size for token bucket
    #[serde(default = "default_burst_size")]
    pub burst_size: u32,
}

const fn default_requests_per_second() -> u32 {
    2
}

const fn default_burst_size() -> u32 {
    4
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: default_requests_per_second(),
            burst_size: default_burst_size(),
        }
    }
}

/// Retry policy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RetryConfig {
    /// Maximum number of retry attempts
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Initial backoff delay in milliseconds
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Maximum backoff delay in milliseconds
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

const fn default_max_retries() -> u32 {
    3
}

const fn default_initial_backoff_ms() -> u64 {
    1000
}

const fn default_max_backoff_ms() -> u64 {
    30_000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}
