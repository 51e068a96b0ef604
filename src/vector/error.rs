//! Error types for vectorization operations

use crate::error::AppError;

/// Result type for vectorization operations
pub type VectorResult<T> = std::result::Result<T, VectorError>;

/// Errors that can occur while maintaining or querying the vector twin.
///
/// `Embedding`, `IndexWrite`, and `IndexRead` degrade the derived index only;
/// callers must never let them block or roll back a record-store write.
/// `Configuration` and `DimensionMismatch` indicate a deployment defect and
/// propagate as hard failures.
#[derive(Debug, thiserror::Error)]
pub enum VectorError {
    /// Unknown embedding provider or otherwise invalid vector configuration
    #[error("Vector configuration error: {0}")]
    Configuration(String),

    /// Nothing to embed; rejected before any remote call
    #[error("Empty content: record has no weighted text to embed")]
    EmptyContent,

    /// Embedding model call failed or timed out
    #[error("Embedding failed: {0}")]
    Embedding(String),

    /// Vector index write (ensure/upsert/delete) failed or timed out
    #[error("Index write failed: {0}")]
    IndexWrite(String),

    /// Vector index read (search) failed or timed out
    #[error("Index read failed: {0}")]
    IndexRead(String),

    /// Collection exists with a different vector size
    #[error("Dimension mismatch: collection expects {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Malformed response from a remote collaborator
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl VectorError {
    /// Whether the vector twin can be repaired later by re-running
    /// `store_or_update` (see the synchronizer's repair path).
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            VectorError::Embedding(_)
                | VectorError::IndexWrite(_)
                | VectorError::IndexRead(_)
                | VectorError::Serialization(_)
        )
    }
}

impl From<VectorError> for AppError {
    fn from(err: VectorError) -> Self {
        match err {
            VectorError::Configuration(msg) => AppError::Configuration(msg),
            VectorError::DimensionMismatch { .. } => AppError::Configuration(err.to_string()),
            VectorError::Serialization(msg) => AppError::Serialization(msg),
            _ => AppError::Internal(err.to_string()),
        }
    }
}
