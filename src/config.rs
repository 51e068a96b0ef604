use crate::ingestion::VectorizePolicy;
use crate::vector::DistanceMetric;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Embedding provider configuration
    pub embedding: EmbeddingConfig,

    /// Vector index configuration
    pub vector_index: VectorIndexConfig,

    /// External ticket source and import configuration
    pub ingestion: IngestionConfig,

    /// Hybrid search tuning
    #[serde(default)]
    pub search: SearchConfig,

    /// Durable state configuration
    pub state: StateConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path =
            std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config/default.toml".to_string());

        config::Config::builder()
            // Start with default values
            .add_source(config::File::from_str(
                include_str!("../config/default.toml"),
                config::FileFormat::Toml,
            ))
            // Override with config file if it exists
            .add_source(config::File::with_name(&config_path).required(false))
            // Override with environment variables (prefix: INCIDENT_RETRIEVAL_)
            .add_source(
                config::Environment::with_prefix("INCIDENT_RETRIEVAL")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Embedding model name; must be one of the known providers
    #[serde(default = "default_embedding_provider")]
    pub provider: String,

    /// Base URL of the embedding server
    #[serde(default = "default_embedding_endpoint")]
    pub endpoint: String,

    /// Per-request timeout (seconds)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorIndexConfig {
    /// Base URL of the vector index server
    #[serde(default = "default_index_url")]
    pub url: String,

    /// API key, if the index requires one
    pub api_key: Option<String>,

    /// Per-request timeout (seconds)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Collection name for ticket vectors
    #[serde(default = "default_ticket_collection")]
    pub ticket_collection: String,

    /// Collection name for playbook vectors
    #[serde(default = "default_playbook_collection")]
    pub playbook_collection: String,

    /// Distance metric used when creating collections
    #[serde(default)]
    pub metric: DistanceMetric,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionConfig {
    /// Base URL of the external ticket system
    pub source_url: String,

    /// Name recorded as the origin of imported tickets
    #[serde(default = "default_source_name")]
    pub source_name: String,

    /// Query restricting which tickets the source returns
    #[serde(default)]
    pub filter_query: String,

    /// Bearer token for the source, if it requires one
    pub api_token: Option<String>,

    /// Page size for bulk fetches
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Which imported tickets get a vector twin
    #[serde(default)]
    pub policy: VectorizePolicy,

    /// Per-request timeout (seconds)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Weight applied to vector similarity in fused scores
    #[serde(default = "default_vector_weight")]
    pub vector_weight: f32,

    /// Weight contributed by a lexical match in fused scores
    #[serde(default = "default_text_weight")]
    pub text_weight: f32,

    /// Maximum fused results returned
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            vector_weight: default_vector_weight(),
            text_weight: default_text_weight(),
            max_results: default_max_results(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateConfig {
    /// Path for the embedded database holding sync state
    #[serde(default = "default_state_path")]
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logs: false,
        }
    }
}

fn default_embedding_provider() -> String {
    "nomic-embed-text".to_string()
}

fn default_embedding_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_index_url() -> String {
    "http://localhost:6333".to_string()
}

fn default_ticket_collection() -> String {
    "tickets".to_string()
}

fn default_playbook_collection() -> String {
    "playbooks".to_string()
}

fn default_source_name() -> String {
    "jira".to_string()
}

fn default_batch_size() -> usize {
    50
}

fn default_vector_weight() -> f32 {
    0.7
}

fn default_text_weight() -> f32 {
    0.3
}

fn default_max_results() -> usize {
    10
}

fn default_timeout() -> u64 {
    30
}

fn default_state_path() -> PathBuf {
    PathBuf::from("data/state")
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_defaults_parse() {
        let config: Config = config::Config::builder()
            .add_source(config::File::from_str(
                include_str!("../config/default.toml"),
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.embedding.provider, "nomic-embed-text");
        assert_eq!(config.vector_index.ticket_collection, "tickets");
        assert_eq!(config.ingestion.policy, VectorizePolicy::NewOnly);
        assert!((config.search.vector_weight - 0.7).abs() < f32::EPSILON);
    }
}
