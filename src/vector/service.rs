//! Vectorization service: owns the store/update/delete/search contract for
//! one record type's collection.
//!
//! Initialization is lazy and race-free: the first caller provisions the
//! collection through a single-flight guard, concurrent first callers wait
//! for that attempt instead of re-running it, and a failed attempt leaves the
//! guard empty so the next call retries. Once initialized the service stays
//! ready for the process lifetime; later remote failures are per-call errors,
//! never a state regression.

use crate::models::{Playbook, Ticket};
use crate::vector::document::{prepare, FieldWeights, WeightedField};
use crate::vector::embedding::EmbeddingClient;
use crate::vector::error::{VectorError, VectorResult};
use crate::vector::index::{DistanceMetric, Filter, VectorIndexClient};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use tokio::sync::OnceCell;

/// A record type that can be mirrored into the vector index
pub trait VectorRecord: Send + Sync {
    /// Record-store id; doubles as the point id and is mirrored into the
    /// payload so deletion can filter on it
    fn record_id(&self) -> String;

    /// Text fields in stable order for document preparation
    fn weighted_fields(&self) -> Vec<WeightedField>;

    /// Payload subset needed for result rendering and filtering. Never
    /// authoritative: on conflict the record store wins.
    fn payload(&self) -> HashMap<String, Value>;
}

impl VectorRecord for Ticket {
    fn record_id(&self) -> String {
        self.id.to_string()
    }

    fn weighted_fields(&self) -> Vec<WeightedField> {
        vec![
            WeightedField::new("title", self.title.clone()),
            WeightedField::new("description", self.description.clone()),
            WeightedField::new("tags", self.tags.join(" ")),
            WeightedField::new(
                "analysis",
                self.analysis
                    .as_ref()
                    .map(|a| a.to_text())
                    .unwrap_or_default(),
            ),
        ]
    }

    fn payload(&self) -> HashMap<String, Value> {
        HashMap::from([
            ("external_id".to_string(), json!(self.external_id)),
            ("source".to_string(), json!(self.source)),
            ("title".to_string(), json!(self.title)),
            ("status".to_string(), json!(self.status.to_string())),
            ("priority".to_string(), json!(self.priority.to_string())),
            ("tags".to_string(), json!(self.tags)),
            ("is_active".to_string(), json!(self.is_active())),
        ])
    }
}

impl VectorRecord for Playbook {
    fn record_id(&self) -> String {
        self.id.to_string()
    }

    fn weighted_fields(&self) -> Vec<WeightedField> {
        vec![
            WeightedField::new("title", self.title.clone()),
            WeightedField::new("description", self.description.clone()),
            WeightedField::new("triggers", self.triggers_text()),
            WeightedField::new("steps", self.steps_text()),
            WeightedField::new("tags", self.tags.join(" ")),
        ]
    }

    fn payload(&self) -> HashMap<String, Value> {
        let steps: Vec<String> = self.steps.iter().map(|s| s.title.clone()).collect();
        let triggers: Vec<String> = self.triggers.iter().map(|t| t.title.clone()).collect();
        HashMap::from([
            ("title".to_string(), json!(self.title)),
            ("tags".to_string(), json!(self.tags)),
            ("triggers".to_string(), json!(triggers)),
            ("steps".to_string(), json!(steps)),
            ("is_active".to_string(), json!(self.is_active)),
        ])
    }
}

/// Collection layout and weighting for one record type
#[derive(Debug, Clone)]
pub struct CollectionSpec {
    pub collection: String,
    pub weights: FieldWeights,
    pub metric: DistanceMetric,
    pub default_min_score: f32,
}

impl CollectionSpec {
    /// Default layout for the ticket collection
    pub fn tickets(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            weights: FieldWeights::new(&[
                ("title", 0.4),
                ("description", 0.3),
                ("tags", 0.1),
                ("analysis", 0.2),
            ]),
            metric: DistanceMetric::Cosine,
            default_min_score: 0.35,
        }
    }

    /// Default layout for the playbook collection
    pub fn playbooks(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            weights: FieldWeights::new(&[
                ("title", 0.3),
                ("description", 0.25),
                ("triggers", 0.2),
                ("steps", 0.15),
                ("tags", 0.1),
            ]),
            metric: DistanceMetric::Cosine,
            default_min_score: 0.35,
        }
    }
}

/// Per-call search options
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    pub top_k: usize,
    /// Overrides the collection's configured cutoff when set
    pub min_score: Option<f32>,
    pub filter: Option<Filter>,
}

impl SearchOptions {
    pub fn with_top_k(top_k: usize) -> Self {
        Self {
            top_k,
            ..Default::default()
        }
    }
}

/// A similarity hit mapped back to record-store terms
#[derive(Debug, Clone)]
pub struct VectorHit {
    pub record_id: String,
    pub score: f32,
    pub payload: HashMap<String, Value>,
}

/// Operational diagnostics; never gates writes
#[derive(Debug, Clone, Serialize)]
pub struct VectorHealth {
    pub initialized: bool,
    pub index_reachable: bool,
    pub embedding_reachable: bool,
}

/// Seam used by the hybrid searcher and the ingestion synchronizer
#[async_trait]
pub trait RecordVectorizer: Send + Sync {
    async fn store_or_update(&self, record: &dyn VectorRecord) -> VectorResult<String>;
    async fn delete(&self, record_id: &str) -> VectorResult<()>;
    async fn search(&self, query: &str, options: SearchOptions) -> VectorResult<Vec<VectorHit>>;
}

/// Orchestrates document preparation, embedding, and index maintenance for
/// one collection
pub struct VectorizationService {
    index: VectorIndexClient,
    embeddings: EmbeddingClient,
    spec: CollectionSpec,
    init: OnceCell<()>,
}

impl VectorizationService {
    pub fn new(
        index: VectorIndexClient,
        embeddings: EmbeddingClient,
        spec: CollectionSpec,
    ) -> Self {
        Self {
            index,
            embeddings,
            spec,
            init: OnceCell::new(),
        }
    }

    /// Single-flight lazy initialization: provisions the collection on first
    /// use, sized to the embedding provider's dimension.
    async fn ensure_ready(&self) -> VectorResult<()> {
        self.init
            .get_or_try_init(|| async {
                tracing::info!(
                    collection = %self.spec.collection,
                    provider = %self.embeddings.provider(),
                    dimension = self.embeddings.dimension(),
                    "Initializing vector collection"
                );
                self.index
                    .ensure_collection(
                        &self.spec.collection,
                        self.embeddings.dimension(),
                        self.spec.metric,
                    )
                    .await
            })
            .await
            .copied()
    }

    /// Health of the two remote collaborators plus the init flag
    pub async fn health(&self) -> VectorHealth {
        let (index_reachable, embedding_reachable) =
            tokio::join!(self.index.ping(), self.embeddings.ping());
        VectorHealth {
            initialized: self.init.initialized(),
            index_reachable,
            embedding_reachable,
        }
    }
}

#[async_trait]
impl RecordVectorizer for VectorizationService {
    /// Prepare, embed, and upsert the record's vector twin.
    ///
    /// Callers must treat `EmptyContent`, `Embedding`, and `IndexWrite`
    /// failures as "twin missing/stale", never as fatal to the record write
    /// that preceded this call.
    async fn store_or_update(&self, record: &dyn VectorRecord) -> VectorResult<String> {
        // Precondition check before any remote call, including init
        let text = prepare(&record.weighted_fields(), &self.spec.weights);
        if text.is_empty() {
            return Err(VectorError::EmptyContent);
        }

        self.ensure_ready().await?;

        let record_id = record.record_id();
        let vector = self.embeddings.embed(&text).await?;

        let mut payload = record.payload();
        payload.insert("record_id".to_string(), json!(record_id));

        let point_id = self
            .index
            .upsert(&self.spec.collection, Some(record_id.clone()), vector, payload)
            .await?;

        tracing::debug!(
            collection = %self.spec.collection,
            record_id = %record_id,
            "Vector twin upserted"
        );
        Ok(point_id)
    }

    /// Remove the twin by filtering on the embedded record id; the point id
    /// is not assumed stable.
    async fn delete(&self, record_id: &str) -> VectorResult<()> {
        self.ensure_ready().await?;
        self.index
            .delete_by_filter(
                &self.spec.collection,
                Filter::new().must_equal("record_id", record_id),
            )
            .await
    }

    /// Embed the query, search, then apply the client-side min-score cutoff
    /// the index itself does not enforce.
    async fn search(&self, query: &str, options: SearchOptions) -> VectorResult<Vec<VectorHit>> {
        if query.trim().is_empty() {
            return Err(VectorError::EmptyContent);
        }

        self.ensure_ready().await?;

        let vector = self.embeddings.embed(query).await?;
        let top_k = if options.top_k == 0 { 10 } else { options.top_k };
        let min_score = options.min_score.unwrap_or(self.spec.default_min_score);

        let points = self
            .index
            .search(&self.spec.collection, vector, top_k, options.filter)
            .await?;

        let hits = points
            .into_iter()
            .filter(|point| point.score >= min_score)
            .map(|point| {
                let record_id = point
                    .payload
                    .get("record_id")
                    .and_then(|v| v.as_str())
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| point.id.clone());
                VectorHit {
                    record_id,
                    score: point.score,
                    payload: point.payload,
                }
            })
            .collect();

        Ok(hits)
    }
}
