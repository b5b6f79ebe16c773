//! Engine error types.
//!
//! The retrieval pipeline recovers at its boundary: a probe that cannot be
//! embedded degrades to base-level ranking, and a candidate missing its
//! prerequisites is skipped rather than poisoning the batch. The variants
//! here are the failures that remain after that policy is applied.

use thiserror::Error;

/// Errors surfaced by the memoria engine.
#[derive(Error, Debug)]
pub enum MemoriaError {
    /// Vector operation over incompatible dimensions. Fatal to the call.
    #[error("dimension mismatch: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },

    /// No embedding is available where one is required.
    #[error("missing embedding for {0}")]
    MissingEmbedding(String),

    /// The external embedding provider failed or timed out.
    #[error("embedding provider failure: {0}")]
    ProviderFailure(String),

    /// A referenced entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Internal inconsistency (negative counters, non-unit vectors in
    /// strict mode). Fatal; carries enough context to diagnose.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias used throughout the engine modules.
pub type Result<T> = std::result::Result<T, MemoriaError>;

impl MemoriaError {
    /// `true` for the failures the retrieval pipeline recovers from by
    /// falling back to base-level ranking.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::MissingEmbedding(_) | Self::ProviderFailure(_)
        )
    }
}
