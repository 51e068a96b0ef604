//! Embedding provider client.
//!
//! Wraps a configured embedding model behind an HTTP endpoint. Providers are
//! selected by name from a fixed registry so callers can learn the output
//! dimension without ever calling the model.

use crate::vector::error::{VectorError, VectorResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Known providers and their fixed output dimensions
const PROVIDERS: &[(&str, usize)] = &[
    ("nomic-embed-text", 768),
    ("mxbai-embed-large", 1024),
    ("all-minilm", 384),
    ("snowflake-arctic-embed", 1024),
];

/// Output dimension for a provider name, without a model call.
///
/// Unknown names fail with `VectorError::Configuration` so a bad deployment
/// surfaces at startup of the affected operation, not deep inside a request.
pub fn dimension(provider: &str) -> VectorResult<usize> {
    PROVIDERS
        .iter()
        .find(|(name, _)| *name == provider)
        .map(|(_, dim)| *dim)
        .ok_or_else(|| {
            VectorError::Configuration(format!("Unknown embedding provider: {}", provider))
        })
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

/// HTTP client for the embedding model endpoint
#[derive(Clone)]
pub struct EmbeddingClient {
    client: reqwest::Client,
    base_url: String,
    provider: String,
    dimension: usize,
}

impl EmbeddingClient {
    /// Create a client for the named provider. Fails with a configuration
    /// error if the provider is unknown.
    pub fn new(base_url: &str, provider: &str, timeout: Duration) -> VectorResult<Self> {
        let dimension = dimension(provider)?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                VectorError::Configuration(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            provider: provider.to_string(),
            dimension,
        })
    }

    /// Configured provider name
    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// Fixed output dimension of the configured provider
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Embed a single text. Timeouts surface as `VectorError::Embedding` like
    /// any other model failure.
    pub async fn embed(&self, text: &str) -> VectorResult<Vec<f32>> {
        let url = format!("{}/api/embeddings", self.base_url);
        let body = EmbeddingRequest {
            model: &self.provider,
            prompt: text,
        };

        let resp = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| VectorError::Embedding(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let detail = resp.text().await.unwrap_or_default();
            return Err(VectorError::Embedding(format!(
                "Model endpoint returned {}: {}",
                status, detail
            )));
        }

        let parsed: EmbeddingResponse = resp
            .json()
            .await
            .map_err(|e| VectorError::Serialization(e.to_string()))?;

        if parsed.embedding.len() != self.dimension {
            return Err(VectorError::Embedding(format!(
                "Provider {} returned {} dimensions, expected {}",
                self.provider,
                parsed.embedding.len(),
                self.dimension
            )));
        }

        Ok(parsed.embedding)
    }

    /// Embed a batch, preserving input order and length.
    ///
    /// One failed text fails the whole call; callers needing partial
    /// tolerance must embed individually.
    pub async fn embed_many(&self, texts: &[&str]) -> VectorResult<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed(text).await?);
        }
        Ok(vectors)
    }

    /// Reachability probe against the endpoint root
    pub async fn ping(&self) -> bool {
        self.client
            .get(&self.base_url)
            .send()
            .await
            .map(|resp| resp.status().is_success())
            .unwrap_or(false)
    }
}
