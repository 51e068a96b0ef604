//! Playbook authoring and retrieval.

pub mod service;

pub use service::{PlaybookCatalog, PlaybookSearchResponse, PlaybookSearchResult};
