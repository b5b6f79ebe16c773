//! The external embedding-provider contract.
//!
//! The engine never produces vectors itself; hosts plug in a provider
//! (ONNX runtime, remote API, test stub). Vectors arrive L2-normalized and
//! carry the tag of the model that produced them — the lifecycle manager
//! uses the tag to detect stale rows after a model migration.

use crate::error::Result;

/// A vector plus the identity of the model that produced it.
#[derive(Debug, Clone)]
pub struct EmbeddedText {
    /// L2-normalized vector.
    pub vector: Vec<f32>,
    /// Producing model tag, e.g. `"bge-base-en-v1.5"`.
    pub model: String,
}

/// Trait for embedding text into vectors.
///
/// All methods are synchronous — callers in async contexts should use
/// `tokio::task::spawn_blocking`. Implementations own their timeouts;
/// a timed-out call surfaces as [`crate::MemoriaError::ProviderFailure`]
/// and the retrieval pipeline degrades to base-level ranking.
pub trait Embedder: Send + Sync {
    /// Embed a single text string.
    fn embed(&self, text: &str) -> Result<EmbeddedText>;

    /// Embed a batch of text strings. Implementations may override for
    /// batched inference.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<EmbeddedText>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    /// Model tag this provider reports for new vectors.
    fn model(&self) -> &str;
}
