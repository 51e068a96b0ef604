//! Record store contracts and implementations.
//!
//! The record store is the single writer of truth: tickets and playbooks are
//! committed here before any vector twin exists. Lexical search is a regex
//! match over named text fields returning unscored hits; relevance scoring is
//! the vector side's job.

pub mod memory;
pub mod sled_store;

pub use memory::{InMemoryPlaybookStore, InMemorySyncStateStore, InMemoryTicketStore};
pub use sled_store::SledSyncStateStore;

use crate::error::Result;
use crate::ingestion::BulkImportState;
use crate::models::{Playbook, Ticket};
use async_trait::async_trait;
use uuid::Uuid;

/// Storage operations for tickets
#[async_trait]
pub trait TicketStore: Send + Sync {
    /// Persist a new ticket
    async fn save(&self, ticket: &Ticket) -> Result<()>;

    /// Get a ticket by store id
    async fn get(&self, id: &Uuid) -> Result<Option<Ticket>>;

    /// Look up a ticket by its external identity
    async fn find_by_external_id(
        &self,
        external_id: &str,
        source: &str,
    ) -> Result<Option<Ticket>>;

    /// Update an existing ticket in place
    async fn update(&self, ticket: &Ticket) -> Result<()>;

    /// List every stored ticket (repair/reconciliation path)
    async fn list_all(&self) -> Result<Vec<Ticket>>;

    /// Unscored lexical search over title, description, tags, and analysis
    async fn search_text(&self, query: &str, limit: usize) -> Result<Vec<Ticket>>;
}

/// Storage operations for playbooks
#[async_trait]
pub trait PlaybookStore: Send + Sync {
    /// Persist a new playbook
    async fn save(&self, playbook: &Playbook) -> Result<()>;

    /// Get a playbook by id
    async fn get(&self, id: &Uuid) -> Result<Option<Playbook>>;

    /// Update an existing playbook in place
    async fn update(&self, playbook: &Playbook) -> Result<()>;

    /// Soft-delete: clear `is_active`, keep the record
    async fn deactivate(&self, id: &Uuid) -> Result<Playbook>;

    /// List active playbooks
    async fn list_active(&self) -> Result<Vec<Playbook>>;

    /// Unscored lexical search over active playbooks (title, description,
    /// triggers, steps, tags)
    async fn search_text(&self, query: &str, limit: usize) -> Result<Vec<Playbook>>;
}

/// Persistence for the per-source bulk-import guardrail state.
///
/// This is the only durable artifact owned by the retrieval core besides the
/// two stores themselves.
#[async_trait]
pub trait SyncStateStore: Send + Sync {
    /// Load the state for an external source
    async fn get(&self, source: &str) -> Result<Option<BulkImportState>>;

    /// Persist the state for an external source
    async fn put(&self, state: &BulkImportState) -> Result<()>;
}
