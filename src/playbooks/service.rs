//! Playbook catalog: authoring operations plus hybrid retrieval.
//!
//! Every write commits to the playbook store first; the vector twin is
//! maintained best-effort afterwards. A playbook whose vector write failed is
//! still fully usable through the catalog and still findable lexically, and
//! the next successful write (or a repair pass) restores the twin.

use crate::error::{AppError, Result};
use crate::models::Playbook;
use crate::search::{FusionWeights, HybridSearcher, LexicalSearch, SearchType};
use crate::store::PlaybookStore;
use crate::vector::RecordVectorizer;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

/// A resolved hybrid search hit
#[derive(Debug, Clone, Serialize)]
pub struct PlaybookSearchResult {
    pub playbook: Playbook,
    pub score: f32,
    pub search_type: SearchType,
}

/// Result set with the degradation flag surfaced to callers
#[derive(Debug, Clone, Serialize)]
pub struct PlaybookSearchResponse {
    pub results: Vec<PlaybookSearchResult>,
    pub degraded: bool,
}

/// Lexical path for playbook hybrid search, backed by the record store
struct PlaybookLexical {
    store: Arc<dyn PlaybookStore>,
}

#[async_trait]
impl LexicalSearch for PlaybookLexical {
    async fn search_ids(&self, query: &str, limit: usize) -> Result<Vec<String>> {
        let playbooks = self.store.search_text(query, limit).await?;
        Ok(playbooks.into_iter().map(|p| p.id.to_string()).collect())
    }
}

/// Catalog of incident playbooks
pub struct PlaybookCatalog {
    store: Arc<dyn PlaybookStore>,
    vectorizer: Arc<dyn RecordVectorizer>,
    searcher: HybridSearcher,
}

impl PlaybookCatalog {
    pub fn new(
        store: Arc<dyn PlaybookStore>,
        vectorizer: Arc<dyn RecordVectorizer>,
        weights: FusionWeights,
        max_results: usize,
    ) -> Self {
        let lexical = Arc::new(PlaybookLexical {
            store: store.clone(),
        });
        let searcher = HybridSearcher::new(vectorizer.clone(), lexical, weights, max_results);
        Self {
            store,
            vectorizer,
            searcher,
        }
    }

    /// Create a playbook. The store write is the commit point; the vector
    /// twin write may fail without failing the call.
    pub async fn create(&self, playbook: Playbook) -> Result<Playbook> {
        playbook.validate()?;
        self.store.save(&playbook).await?;
        info!(playbook_id = %playbook.id, title = %playbook.title, "Playbook created");
        self.sync_vector(&playbook).await;
        Ok(playbook)
    }

    /// Update an existing playbook and refresh its vector twin
    pub async fn update(&self, playbook: Playbook) -> Result<Playbook> {
        playbook.validate()?;
        self.store.update(&playbook).await?;
        info!(playbook_id = %playbook.id, "Playbook updated");
        self.sync_vector(&playbook).await;
        Ok(playbook)
    }

    /// Soft-delete a playbook and remove its vector twin so it stops
    /// surfacing in semantic results
    pub async fn deactivate(&self, id: &Uuid) -> Result<Playbook> {
        let playbook = self.store.deactivate(id).await?;
        info!(playbook_id = %id, "Playbook deactivated");
        if let Err(e) = self.vectorizer.delete(&id.to_string()).await {
            warn!(playbook_id = %id, error = %e, "Failed to remove playbook vector");
        }
        Ok(playbook)
    }

    pub async fn get(&self, id: &Uuid) -> Result<Playbook> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Playbook {} not found", id)))
    }

    pub async fn list_active(&self) -> Result<Vec<Playbook>> {
        self.store.list_active().await
    }

    /// Hybrid search over the catalog. Hits whose record id no longer
    /// resolves in the store (stale vector twins) are dropped.
    pub async fn search(&self, query: &str) -> Result<PlaybookSearchResponse> {
        let response = self.searcher.search(query).await?;

        let mut results = Vec::with_capacity(response.hits.len());
        for hit in response.hits {
            let id = match Uuid::parse_str(&hit.record_id) {
                Ok(id) => id,
                Err(_) => {
                    warn!(record_id = %hit.record_id, "Dropping hit with malformed record id");
                    continue;
                }
            };
            match self.store.get(&id).await? {
                Some(playbook) if playbook.is_active => results.push(PlaybookSearchResult {
                    playbook,
                    score: hit.score,
                    search_type: hit.search_type,
                }),
                Some(_) | None => {
                    warn!(playbook_id = %id, "Dropping hit that no longer resolves to an active playbook");
                }
            }
        }

        Ok(PlaybookSearchResponse {
            results,
            degraded: response.degraded,
        })
    }

    async fn sync_vector(&self, playbook: &Playbook) {
        match self.vectorizer.store_or_update(playbook).await {
            Ok(point_id) => {
                tracing::debug!(playbook_id = %playbook.id, point_id = %point_id, "Playbook vector stored");
            }
            Err(e) => {
                warn!(playbook_id = %playbook.id, error = %e, "Playbook vector write failed; record remains searchable lexically");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PlaybookStep, PlaybookTrigger};
    use crate::store::InMemoryPlaybookStore;
    use crate::vector::{SearchOptions, VectorError, VectorHit, VectorRecord, VectorResult};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct RecordingVectorizer {
        stores: AtomicUsize,
        deletes: AtomicUsize,
        fail_writes: bool,
        search_hits: std::sync::Mutex<Vec<(String, f32)>>,
    }

    #[async_trait]
    impl RecordVectorizer for RecordingVectorizer {
        async fn store_or_update(&self, record: &dyn VectorRecord) -> VectorResult<String> {
            if self.fail_writes {
                return Err(VectorError::IndexWrite("index offline".to_string()));
            }
            self.stores.fetch_add(1, Ordering::SeqCst);
            Ok(record.record_id())
        }

        async fn delete(&self, _record_id: &str) -> VectorResult<()> {
            self.deletes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn search(
            &self,
            _query: &str,
            _options: SearchOptions,
        ) -> VectorResult<Vec<VectorHit>> {
            Ok(self
                .search_hits
                .lock()
                .unwrap()
                .iter()
                .map(|(id, score)| VectorHit {
                    record_id: id.clone(),
                    score: *score,
                    payload: Default::default(),
                })
                .collect())
        }
    }

    fn sample_playbook(title: &str) -> Playbook {
        Playbook::new(
            title.to_string(),
            "Steps to restore service after a database failover".to_string(),
        )
        .with_trigger(PlaybookTrigger {
            title: "Replica lag".to_string(),
            condition: "lag above five minutes".to_string(),
            outcome: "promote standby".to_string(),
        })
        .with_step(PlaybookStep {
            title: "Promote".to_string(),
            action: "run the promotion script".to_string(),
            outcome: "standby becomes primary".to_string(),
        })
        .with_tags(vec!["database".to_string()])
    }

    fn catalog(
        store: Arc<InMemoryPlaybookStore>,
        vectorizer: Arc<RecordingVectorizer>,
    ) -> PlaybookCatalog {
        PlaybookCatalog::new(store, vectorizer, FusionWeights::default(), 10)
    }

    #[tokio::test]
    async fn test_create_commits_store_and_vector() {
        let store = Arc::new(InMemoryPlaybookStore::new());
        let vectorizer = Arc::new(RecordingVectorizer::default());
        let catalog = catalog(store.clone(), vectorizer.clone());

        let created = catalog.create(sample_playbook("Database failover")).await.unwrap();

        assert!(store.get(&created.id).await.unwrap().is_some());
        assert_eq!(vectorizer.stores.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_create_survives_vector_write_failure() {
        let store = Arc::new(InMemoryPlaybookStore::new());
        let vectorizer = Arc::new(RecordingVectorizer {
            fail_writes: true,
            ..Default::default()
        });
        let catalog = catalog(store.clone(), vectorizer);

        let created = catalog.create(sample_playbook("Database failover")).await.unwrap();

        // The record is committed even though the vector twin is missing
        assert!(store.get(&created.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_playbook() {
        let store = Arc::new(InMemoryPlaybookStore::new());
        let vectorizer = Arc::new(RecordingVectorizer::default());
        let catalog = catalog(store, vectorizer.clone());

        let invalid = Playbook::new(String::new(), "description".to_string());
        assert!(catalog.create(invalid).await.is_err());
        assert_eq!(vectorizer.stores.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_deactivate_removes_vector_twin() {
        let store = Arc::new(InMemoryPlaybookStore::new());
        let vectorizer = Arc::new(RecordingVectorizer::default());
        let catalog = catalog(store, vectorizer.clone());

        let created = catalog.create(sample_playbook("Database failover")).await.unwrap();
        let deactivated = catalog.deactivate(&created.id).await.unwrap();

        assert!(!deactivated.is_active);
        assert_eq!(vectorizer.deletes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_search_resolves_hits_and_drops_stale_ids() {
        let store = Arc::new(InMemoryPlaybookStore::new());
        let vectorizer = Arc::new(RecordingVectorizer::default());
        let catalog = catalog(store, vectorizer.clone());

        let created = catalog.create(sample_playbook("Database failover")).await.unwrap();

        // One live hit plus one id whose record never existed
        *vectorizer.search_hits.lock().unwrap() = vec![
            (created.id.to_string(), 0.9),
            (Uuid::new_v4().to_string(), 0.8),
        ];

        let response = catalog.search("failover").await.unwrap();
        assert_eq!(response.results.len(), 1);
        assert_eq!(response.results[0].playbook.id, created.id);
        assert!(!response.degraded);
    }

    #[tokio::test]
    async fn test_search_drops_deactivated_playbooks() {
        let store = Arc::new(InMemoryPlaybookStore::new());
        let vectorizer = Arc::new(RecordingVectorizer::default());
        let catalog = catalog(store, vectorizer.clone());

        let created = catalog.create(sample_playbook("Database failover")).await.unwrap();
        catalog.deactivate(&created.id).await.unwrap();

        // Simulate a stale vector twin that outlived the deactivation
        *vectorizer.search_hits.lock().unwrap() = vec![(created.id.to_string(), 0.9)];

        let response = catalog.search("failover").await.unwrap();
        assert!(response.results.is_empty());
    }
}
