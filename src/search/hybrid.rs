//! Score fusion across the lexical and vector retrieval paths.
//!
//! Lexical hits carry no numeric relevance signal (presence is binary), so a
//! text-only match contributes exactly the text weight; a vector match
//! contributes its similarity scaled by the vector weight; a record found by
//! both paths gets the sum. Fusion itself is a pure function over the two
//! sub-result sets, which keeps ranking reproducible in tests.

use crate::error::{AppError, Result};
use crate::vector::{RecordVectorizer, SearchOptions};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Which retrieval path(s) produced a hit
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SearchType {
    Vector,
    Text,
    Hybrid,
}

/// Relative weights for the two paths. Not required to sum to 1.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FusionWeights {
    pub vector: f32,
    pub text: f32,
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self {
            vector: 0.7,
            text: 0.3,
        }
    }
}

/// A fused, ranked hit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HybridHit {
    pub record_id: String,
    pub score: f32,
    pub search_type: SearchType,
}

/// Fused result set plus degradation flag
#[derive(Debug, Clone)]
pub struct HybridResponse {
    pub hits: Vec<HybridHit>,
    /// True when one sub-search failed and the results come from the
    /// surviving path alone
    pub degraded: bool,
}

/// Record-id ranking from the record store's lexical search.
///
/// Implementations return ids in store rank order; no scores, by contract.
#[async_trait]
pub trait LexicalSearch: Send + Sync {
    async fn search_ids(&self, query: &str, limit: usize) -> Result<Vec<String>>;
}

/// Fuse the two sub-result sets into one ranked list.
///
/// Ordering is a pure function of scores; ties break by original vector rank,
/// then lexical rank, so a fixed pair of inputs always yields the same output.
pub fn fuse(
    vector_hits: &[(String, f32)],
    text_ids: &[String],
    weights: FusionWeights,
    max_results: usize,
) -> Vec<HybridHit> {
    struct Entry {
        score: f32,
        search_type: SearchType,
        vector_rank: usize,
        text_rank: usize,
    }

    let mut combined: HashMap<&str, Entry> = HashMap::new();

    for (rank, (id, similarity)) in vector_hits.iter().enumerate() {
        combined.insert(
            id.as_str(),
            Entry {
                score: similarity * weights.vector,
                search_type: SearchType::Vector,
                vector_rank: rank,
                text_rank: usize::MAX,
            },
        );
    }

    for (rank, id) in text_ids.iter().enumerate() {
        combined
            .entry(id.as_str())
            .and_modify(|entry| {
                entry.score += weights.text;
                entry.search_type = SearchType::Hybrid;
                entry.text_rank = rank;
            })
            .or_insert(Entry {
                score: weights.text,
                search_type: SearchType::Text,
                vector_rank: usize::MAX,
                text_rank: rank,
            });
    }

    let mut entries: Vec<(&str, Entry)> = combined.into_iter().collect();
    entries.sort_by(|(_, a), (_, b)| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.vector_rank.cmp(&b.vector_rank))
            .then(a.text_rank.cmp(&b.text_rank))
    });

    entries
        .into_iter()
        .take(max_results)
        .map(|(id, entry)| HybridHit {
            record_id: id.to_string(),
            score: entry.score,
            search_type: entry.search_type,
        })
        .collect()
}

/// Runs the two sub-searches concurrently and fuses their results
pub struct HybridSearcher {
    vectorizer: Arc<dyn RecordVectorizer>,
    lexical: Arc<dyn LexicalSearch>,
    weights: FusionWeights,
    max_results: usize,
}

impl HybridSearcher {
    pub fn new(
        vectorizer: Arc<dyn RecordVectorizer>,
        lexical: Arc<dyn LexicalSearch>,
        weights: FusionWeights,
        max_results: usize,
    ) -> Self {
        Self {
            vectorizer,
            lexical,
            weights,
            max_results,
        }
    }

    /// Hybrid search. A single failed sub-search degrades the response to
    /// the surviving path; only both failing is a hard error.
    pub async fn search(&self, query: &str) -> Result<HybridResponse> {
        let (vector_result, text_result) = tokio::join!(
            self.vectorizer
                .search(query, SearchOptions::with_top_k(self.max_results)),
            self.lexical.search_ids(query, self.max_results),
        );

        let mut degraded = false;

        let vector_hits: Vec<(String, f32)> = match vector_result {
            Ok(hits) => hits
                .into_iter()
                .map(|hit| (hit.record_id, hit.score))
                .collect(),
            Err(e) => {
                tracing::warn!(error = %e, "Vector sub-search failed; degrading to text-only");
                degraded = true;
                Vec::new()
            }
        };

        let text_ids: Vec<String> = match text_result {
            Ok(ids) => ids,
            Err(e) => {
                if degraded {
                    return Err(AppError::Internal(format!(
                        "Both hybrid sub-searches failed; last error: {}",
                        e
                    )));
                }
                tracing::warn!(error = %e, "Lexical sub-search failed; degrading to vector-only");
                degraded = true;
                Vec::new()
            }
        };

        let hits = fuse(&vector_hits, &text_ids, self.weights, self.max_results);

        tracing::debug!(
            query = %query,
            hit_count = hits.len(),
            degraded,
            "Hybrid search completed"
        );

        Ok(HybridResponse { hits, degraded })
    }
}
