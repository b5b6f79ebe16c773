//! One-hop spreading activation with fan-effect normalization.
//!
//! Activating a memory spreads activation to it from its associates:
//!
//! ```text
//! S(m) = (1/|E|) · Σ_{e ∈ E} e.strength · max(0, cosine(probe, emb(other(e))))
//! ```
//!
//! `E` is every edge incident to `m`, counting both directions — the
//! fan-effect normalization means a well-connected node gains less per
//! edge. Spreading is deliberately one hop: neighbors-of-neighbors
//! contribute nothing.

use std::collections::HashMap;

use crate::cognition::vector::cosine;

/// An association edge as seen from one memory: the opposite endpoint and
/// the edge strength.
#[derive(Debug, Clone)]
pub struct IncidentEdge {
    pub other_id: String,
    pub strength: f64,
}

/// Spreading activation toward the probe for one memory.
///
/// Edges whose opposite endpoint has no embedding contribute 0 but still
/// count toward the fan. Embeddings from a stale model with a different
/// dimensionality likewise contribute 0 rather than failing the call.
pub fn spread(
    probe: &[f32],
    incident: &[IncidentEdge],
    embeddings: &HashMap<String, Vec<f32>>,
) -> f64 {
    if incident.is_empty() {
        return 0.0;
    }

    let total: f64 = incident
        .iter()
        .map(|edge| {
            let Some(vector) = embeddings.get(&edge.other_id) else {
                return 0.0;
            };
            match cosine(probe, vector) {
                Ok(sim) => edge.strength * sim.max(0.0),
                Err(_) => 0.0,
            }
        })
        .sum();

    total / incident.len() as f64
}
