//! Incident Retrieval
//!
//! Dual-store synchronization and hybrid retrieval core for incident tickets
//! and remediation playbooks. Records live authoritatively in a record store;
//! each record may have a vector twin in an external similarity index, built
//! from a weighted flattening of its text fields and an embedding model.
//! Retrieval fuses semantic similarity with lexical matching and degrades to
//! whichever path survives when the other fails.

pub mod config;
pub mod error;
pub mod ingestion;
pub mod models;
pub mod playbooks;
pub mod search;
pub mod store;
pub mod vector;

pub use config::Config;
pub use error::{AppError, Result};
