//! Derived vector index maintenance and similarity search.
//!
//! The record store stays authoritative; this module keeps an eventually
//! consistent vector twin of each record and answers similarity queries:
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │           Vectorization Service                  │
//! ├─────────────────────────────────────────────────┤
//! │  - store_or_update()   - delete()               │
//! │  - search()            - health()               │
//! └─────────────────────────────────────────────────┘
//!        │                  │                 │
//!        ▼                  ▼                 ▼
//! ┌─────────────┐   ┌──────────────┐   ┌─────────────┐
//! │  Document   │   │  Embedding   │   │ Vector Index│
//! │  Preparer   │   │  Client      │   │ Client      │
//! ├─────────────┤   ├──────────────┤   ├─────────────┤
//! │ weighted    │   │ text → float │   │ ensure /    │
//! │ text blob   │   │ vector (HTTP)│   │ upsert /    │
//! │ (pure)      │   │              │   │ delete /    │
//! └─────────────┘   └──────────────┘   │ search      │
//!                                      └─────────────┘
//! ```
//!
//! A failed embedding or index call degrades the twin only; it must never
//! block or roll back the record-store write that triggered it.

pub mod document;
pub mod embedding;
pub mod error;
pub mod index;
pub mod service;

pub use document::{prepare, FieldWeights, WeightedField};
pub use embedding::{dimension, EmbeddingClient};
pub use error::{VectorError, VectorResult};
pub use index::{DistanceMetric, Filter, ScoredPoint, VectorIndexClient};
pub use service::{
    CollectionSpec, RecordVectorizer, SearchOptions, VectorHealth, VectorHit, VectorRecord,
    VectorizationService,
};
