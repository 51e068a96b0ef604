use crate::error::Result;
use crate::ingestion::TicketSource;
use crate::models::Ticket;
use crate::store::{SyncStateStore, TicketStore};
use crate::vector::RecordVectorizer;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Tally of a synchronization run. A run's outcome is this structure, not a
/// single pass/fail: per-record failures are counted here and the run goes on.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SyncOutcome {
    /// Records newly inserted into the record store
    pub saved: u64,
    /// Records that already existed and were updated in place
    pub updated: u64,
    /// Records whose vector twin was written
    pub vectorized: u64,
    /// Per-record failures (store writes and vectorization)
    pub errors: u64,
}

/// Durable guardrail state, one per external source.
///
/// While `completed` is true, a full re-pull short-circuits unless explicitly
/// forced. This is the only mechanism preventing unbounded repeated full
/// scans of the external source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkImportState {
    pub source: String,
    pub completed: bool,
    pub last_run_at: Option<DateTime<Utc>>,
    pub total_imported: u64,
    pub last_outcome: Option<SyncOutcome>,
}

impl BulkImportState {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            completed: false,
            last_run_at: None,
            total_imported: 0,
            last_outcome: None,
        }
    }
}

/// Which record dispositions trigger a vector-twin write during sync.
///
/// `NewOnly` is the cost-conscious default: re-importing an unchanged record
/// never re-embeds it, at the price of stale twins for updated records.
/// `NewAndUpdated` closes that gap. The `revectorize_all` repair path covers
/// either choice after the fact.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum VectorizePolicy {
    #[default]
    NewOnly,
    NewAndUpdated,
}

/// Pulls paginated batches from an external source and keeps the record
/// store (authoritative) and vector index (derived) in sync
pub struct IngestionSynchronizer {
    source: Arc<dyn TicketSource>,
    store: Arc<dyn TicketStore>,
    vectorizer: Arc<dyn RecordVectorizer>,
    state_store: Arc<dyn SyncStateStore>,
    batch_size: usize,
    policy: VectorizePolicy,
}

impl IngestionSynchronizer {
    pub fn new(
        source: Arc<dyn TicketSource>,
        store: Arc<dyn TicketStore>,
        vectorizer: Arc<dyn RecordVectorizer>,
        state_store: Arc<dyn SyncStateStore>,
        batch_size: usize,
        policy: VectorizePolicy,
    ) -> Self {
        Self {
            source,
            store,
            vectorizer,
            state_store,
            batch_size: batch_size.max(1),
            policy,
        }
    }

    /// Full paginated pull of the external source.
    ///
    /// Short-circuits to the last recorded tally when a completed import is
    /// on record and `force` is not set; in that case zero external requests
    /// are issued. Only failing to reach the external source (or to persist
    /// guardrail state) fails the whole run; everything per-record is
    /// tallied and skipped.
    pub async fn full_import(&self, force: bool) -> Result<SyncOutcome> {
        let source_name = self.source.name().to_string();

        if !force {
            if let Some(state) = self.state_store.get(&source_name).await? {
                if state.completed {
                    tracing::info!(
                        source = %source_name,
                        total_imported = state.total_imported,
                        "Bulk import already completed; skipping (pass force to re-run)"
                    );
                    return Ok(state.last_outcome.unwrap_or_default());
                }
            }
        }

        tracing::info!(source = %source_name, batch_size = self.batch_size, force, "Starting full import");

        let mut outcome = SyncOutcome::default();
        let mut offset = 0usize;

        loop {
            // A fetch failure anywhere is "source unreachable": hard failure
            let page = self.source.fetch_page(offset, self.batch_size).await?;
            let fetched = page.len();

            for ticket in page {
                self.sync_one(ticket, &mut outcome).await;
            }

            offset += fetched;

            // Heuristic continuation: a short batch means the source is drained
            if fetched < self.batch_size {
                break;
            }
        }

        let state = BulkImportState {
            source: source_name.clone(),
            completed: true,
            last_run_at: Some(Utc::now()),
            total_imported: outcome.saved + outcome.updated,
            last_outcome: Some(outcome),
        };
        self.state_store.put(&state).await?;

        tracing::info!(
            source = %source_name,
            saved = outcome.saved,
            updated = outcome.updated,
            vectorized = outcome.vectorized,
            errors = outcome.errors,
            "Full import completed"
        );

        Ok(outcome)
    }

    /// Upsert one pulled ticket and, per policy, refresh its vector twin.
    /// Never fails: every failure mode is tallied.
    async fn sync_one(&self, incoming: Ticket, outcome: &mut SyncOutcome) {
        let existing = match self
            .store
            .find_by_external_id(&incoming.external_id, &incoming.source)
            .await
        {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(
                    external_id = %incoming.external_id,
                    error = %e,
                    "Lookup failed; skipping record"
                );
                outcome.errors += 1;
                return;
            }
        };

        match existing {
            None => {
                if let Err(e) = self.store.save(&incoming).await {
                    tracing::warn!(
                        external_id = %incoming.external_id,
                        error = %e,
                        "Store write failed; skipping record"
                    );
                    outcome.errors += 1;
                    return;
                }
                outcome.saved += 1;
                self.vectorize(&incoming, outcome).await;
            }
            Some(mut current) => {
                current.apply_update(&incoming);
                if let Err(e) = self.store.update(&current).await {
                    tracing::warn!(
                        external_id = %incoming.external_id,
                        error = %e,
                        "Store update failed; skipping record"
                    );
                    outcome.errors += 1;
                    return;
                }
                outcome.updated += 1;
                // Updated records keep their existing (possibly stale) twin
                // under NewOnly; see VectorizePolicy
                if self.policy == VectorizePolicy::NewAndUpdated {
                    self.vectorize(&current, outcome).await;
                }
            }
        }
    }

    /// Best-effort twin write; a failure degrades the derived index only
    async fn vectorize(&self, ticket: &Ticket, outcome: &mut SyncOutcome) {
        match self.vectorizer.store_or_update(ticket).await {
            Ok(_) => outcome.vectorized += 1,
            Err(e) => {
                tracing::warn!(
                    ticket_id = %ticket.id,
                    external_id = %ticket.external_id,
                    error = %e,
                    "Vectorization failed; record kept, twin stale"
                );
                outcome.errors += 1;
            }
        }
    }

    /// Operator-invokable repair path: re-run `store_or_update` for every
    /// stored ticket, regardless of policy or import state.
    pub async fn revectorize_all(&self) -> Result<SyncOutcome> {
        let tickets = self.store.list_all().await?;
        let mut outcome = SyncOutcome::default();

        tracing::info!(count = tickets.len(), "Revectorizing all stored tickets");

        for ticket in &tickets {
            self.vectorize(ticket, &mut outcome).await;
        }

        tracing::info!(
            vectorized = outcome.vectorized,
            errors = outcome.errors,
            "Revectorization completed"
        );
        Ok(outcome)
    }
}
