//! ACT-R base-level activation and the logistic retrieval probability.
//!
//! Base-level activation summarizes how frequently and recently a memory
//! has been accessed:
//!
//! ```text
//! B(m, now) = ln( Σ_k max(1, (now − t_k)/1000)^(−d) )
//! ```
//!
//! The 1-second floor on elapsed time avoids singularities when a memory
//! was accessed at (or after) `now`, and caps B for just-accessed items.

/// Base-level activation from an access-time series.
///
/// `accesses_ms` are epoch-millisecond timestamps, `decay` is the forgetting
/// exponent `d` (0.5 by default). An empty history yields 0.0 rather than
/// negative infinity so that never-accessed candidates stay rankable.
pub fn base_level(accesses_ms: &[i64], now_ms: i64, decay: f64) -> f64 {
    if accesses_ms.is_empty() {
        return 0.0;
    }

    let sum: f64 = accesses_ms
        .iter()
        .map(|&t| {
            let elapsed_s = ((now_ms - t) as f64 / 1000.0).max(1.0);
            elapsed_s.powf(-decay)
        })
        .sum();

    sum.ln()
}

/// Probability of successful retrieval.
///
/// ```text
/// P = 1 / (1 + e^((τ − A) / s))
/// ```
///
/// A logistic centered on the threshold `τ` with noise `s`. Used for
/// filtering candidates, never for re-ranking them.
pub fn retrieval_probability(activation: f64, threshold: f64, noise: f64) -> f64 {
    let exponent = (threshold - activation) / noise;
    1.0 / (1.0 + exponent.exp())
}
