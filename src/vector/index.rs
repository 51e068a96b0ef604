//! Thin client for the remote similarity-search service (Qdrant-style HTTP API).
//!
//! The index is a derived store: nothing here is authoritative, and every
//! operation is a network call. Remote failures surface as
//! `IndexWrite`/`IndexRead` so callers can distinguish them from local
//! precondition errors and decide retry vs. abort.

use crate::vector::error::{VectorError, VectorResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use uuid::Uuid;

/// Distance metric for a collection
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    #[default]
    Cosine,
    Dot,
    Euclid,
}

impl DistanceMetric {
    fn wire_name(&self) -> &'static str {
        match self {
            DistanceMetric::Cosine => "Cosine",
            DistanceMetric::Dot => "Dot",
            DistanceMetric::Euclid => "Euclid",
        }
    }
}

/// Conjunction of equality/membership predicates on payload fields
#[derive(Debug, Clone, Default, Serialize)]
pub struct Filter {
    must: Vec<FilterCondition>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `field == value`
    pub fn must_equal(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.must.push(FilterCondition {
            key: key.to_string(),
            condition: FilterMatch::Match {
                value: value.into(),
            },
        });
        self
    }

    /// Require `field` to equal one of `values`
    pub fn must_be_any(mut self, key: &str, values: Vec<String>) -> Self {
        self.must.push(FilterCondition {
            key: key.to_string(),
            condition: FilterMatch::MatchAny { any: values },
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.must.is_empty()
    }
}

#[derive(Debug, Clone, Serialize)]
struct FilterCondition {
    key: String,
    #[serde(rename = "match")]
    condition: FilterMatch,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
enum FilterMatch {
    Match { value: Value },
    MatchAny { any: Vec<String> },
}

/// A scored point returned by vector search
#[derive(Debug, Clone)]
pub struct ScoredPoint {
    pub id: String,
    /// Similarity under the collection's metric; higher is better for cosine
    pub score: f32,
    pub payload: HashMap<String, Value>,
}

// Wire types

#[derive(Serialize)]
struct CreateCollectionRequest {
    vectors: VectorParams,
}

#[derive(Serialize, Deserialize)]
struct VectorParams {
    size: usize,
    distance: String,
}

#[derive(Deserialize)]
struct CollectionInfoResponse {
    result: CollectionInfo,
}

#[derive(Deserialize)]
struct CollectionInfo {
    config: CollectionConfig,
}

#[derive(Deserialize)]
struct CollectionConfig {
    params: CollectionParams,
}

#[derive(Deserialize)]
struct CollectionParams {
    vectors: VectorParams,
}

#[derive(Serialize)]
struct UpsertPointsRequest {
    points: Vec<PointStruct>,
}

#[derive(Serialize)]
struct PointStruct {
    id: String,
    vector: Vec<f32>,
    payload: HashMap<String, Value>,
}

#[derive(Serialize)]
struct DeleteByFilterRequest {
    filter: Filter,
}

#[derive(Serialize)]
struct SearchRequest {
    vector: Vec<f32>,
    limit: usize,
    with_payload: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<Filter>,
}

#[derive(Deserialize)]
struct SearchResponse {
    result: Vec<SearchResultEntry>,
}

#[derive(Deserialize)]
struct SearchResultEntry {
    id: Value,
    score: f32,
    payload: Option<HashMap<String, Value>>,
}

/// HTTP client for the vector index service
#[derive(Clone)]
pub struct VectorIndexClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl VectorIndexClient {
    pub fn new(base_url: &str, api_key: Option<String>, timeout: Duration) -> VectorResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                VectorError::Configuration(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.client.request(method, &url);
        if let Some(key) = &self.api_key {
            req = req.header("api-key", key);
        }
        req
    }

    /// Idempotent create-if-absent.
    ///
    /// Succeeds silently when the collection already exists with a matching
    /// dimension; an existing collection with a different dimension is a
    /// deployment defect and fails with `DimensionMismatch`.
    pub async fn ensure_collection(
        &self,
        name: &str,
        dimension: usize,
        metric: DistanceMetric,
    ) -> VectorResult<()> {
        let resp = self
            .request(reqwest::Method::GET, &format!("/collections/{}", name))
            .send()
            .await
            .map_err(|e| VectorError::IndexWrite(e.to_string()))?;

        if resp.status().is_success() {
            let info: CollectionInfoResponse = resp
                .json()
                .await
                .map_err(|e| VectorError::Serialization(e.to_string()))?;

            let existing = info.result.config.params.vectors.size;
            if existing != dimension {
                return Err(VectorError::DimensionMismatch {
                    expected: existing,
                    actual: dimension,
                });
            }

            tracing::debug!(collection = %name, dimension, "Collection already provisioned");
            return Ok(());
        }

        // Only a definitive 404 means absent; a struggling index must not be
        // misread as a missing collection
        if resp.status() != reqwest::StatusCode::NOT_FOUND {
            let status = resp.status();
            let detail = resp.text().await.unwrap_or_default();
            return Err(VectorError::IndexWrite(format!(
                "Failed to inspect collection {}: {}: {}",
                name, status, detail
            )));
        }

        let body = CreateCollectionRequest {
            vectors: VectorParams {
                size: dimension,
                distance: metric.wire_name().to_string(),
            },
        };

        let resp = self
            .request(reqwest::Method::PUT, &format!("/collections/{}", name))
            .json(&body)
            .send()
            .await
            .map_err(|e| VectorError::IndexWrite(e.to_string()))?;

        if !resp.status().is_success() {
            let detail = resp.text().await.unwrap_or_default();
            return Err(VectorError::IndexWrite(format!(
                "Failed to create collection {}: {}",
                name, detail
            )));
        }

        tracing::info!(collection = %name, dimension, metric = ?metric, "Collection created");
        Ok(())
    }

    /// Insert-or-replace a point. Repeated calls with the same id replace the
    /// point rather than duplicating it. Returns the id used; a fresh UUID is
    /// generated only when the caller omits one.
    pub async fn upsert(
        &self,
        collection: &str,
        id: Option<String>,
        vector: Vec<f32>,
        payload: HashMap<String, Value>,
    ) -> VectorResult<String> {
        let point_id = id.unwrap_or_else(|| Uuid::new_v4().to_string());

        let body = UpsertPointsRequest {
            points: vec![PointStruct {
                id: point_id.clone(),
                vector,
                payload,
            }],
        };

        let resp = self
            .request(
                reqwest::Method::PUT,
                &format!("/collections/{}/points", collection),
            )
            .query(&[("wait", "true")])
            .json(&body)
            .send()
            .await
            .map_err(|e| VectorError::IndexWrite(e.to_string()))?;

        if !resp.status().is_success() {
            let detail = resp.text().await.unwrap_or_default();
            return Err(VectorError::IndexWrite(format!(
                "Failed to upsert point: {}",
                detail
            )));
        }

        tracing::debug!(collection = %collection, point_id = %point_id, "Point upserted");
        Ok(point_id)
    }

    /// Remove all points matching a payload filter.
    ///
    /// Used instead of delete-by-id: the only key reliably known to callers is
    /// the originating record's store id, which lives in the payload.
    pub async fn delete_by_filter(&self, collection: &str, filter: Filter) -> VectorResult<()> {
        let body = DeleteByFilterRequest { filter };

        let resp = self
            .request(
                reqwest::Method::POST,
                &format!("/collections/{}/points/delete", collection),
            )
            .query(&[("wait", "true")])
            .json(&body)
            .send()
            .await
            .map_err(|e| VectorError::IndexWrite(e.to_string()))?;

        if !resp.status().is_success() {
            let detail = resp.text().await.unwrap_or_default();
            return Err(VectorError::IndexWrite(format!(
                "Failed to delete points: {}",
                detail
            )));
        }

        tracing::debug!(collection = %collection, "Points deleted by filter");
        Ok(())
    }

    /// Nearest-neighbor search. Returns at most `top_k` scored points; no
    /// implicit minimum-score floor is applied (callers filter post-hoc).
    pub async fn search(
        &self,
        collection: &str,
        vector: Vec<f32>,
        top_k: usize,
        filter: Option<Filter>,
    ) -> VectorResult<Vec<ScoredPoint>> {
        let body = SearchRequest {
            vector,
            limit: top_k,
            with_payload: true,
            filter: filter.filter(|f| !f.is_empty()),
        };

        let resp = self
            .request(
                reqwest::Method::POST,
                &format!("/collections/{}/points/search", collection),
            )
            .json(&body)
            .send()
            .await
            .map_err(|e| VectorError::IndexRead(e.to_string()))?;

        if !resp.status().is_success() {
            let detail = resp.text().await.unwrap_or_default();
            return Err(VectorError::IndexRead(format!(
                "Search failed: {}",
                detail
            )));
        }

        let parsed: SearchResponse = resp
            .json()
            .await
            .map_err(|e| VectorError::Serialization(e.to_string()))?;

        let points = parsed
            .result
            .into_iter()
            .map(|entry| ScoredPoint {
                id: match entry.id {
                    Value::String(s) => s,
                    other => other.to_string(),
                },
                score: entry.score,
                payload: entry.payload.unwrap_or_default(),
            })
            .collect();

        Ok(points)
    }

    /// Reachability probe for health reporting
    pub async fn ping(&self) -> bool {
        self.request(reqwest::Method::GET, "/collections")
            .send()
            .await
            .map(|resp| resp.status().is_success())
            .unwrap_or(false)
    }
}
