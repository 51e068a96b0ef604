//! Paginated, idempotent pull of tickets from an external ticketing system.
//!
//! The flow is pull, not push: batches are fetched with an offset/limit
//! cursor, upserted into the record store by `(external_id, source)`, and
//! newly created records are forwarded to the vectorization service. A
//! durable per-source guardrail prevents accidental re-scans of the whole
//! external source.

pub mod source;
pub mod synchronizer;

pub use source::{HttpTicketSource, TicketSource};
pub use synchronizer::{BulkImportState, IngestionSynchronizer, SyncOutcome, VectorizePolicy};
