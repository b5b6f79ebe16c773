//! Cosine similarity and the MINERVA 2 nonlinear emphasis.
//!
//! Stored embeddings arrive L2-normalized, but every entry point still
//! guards against zero-norm vectors (similarity 0) and clamps results to
//! `[-1, 1]` against accumulated rounding. Inputs are `f32` (the storage
//! format); all accumulation is `f64`.

use crate::error::{MemoriaError, Result};

/// Cosine similarity between two vectors, clamped to `[-1, 1]`.
///
/// Returns 0.0 when either vector has zero norm. Fails with
/// [`MemoriaError::DimensionMismatch`] when the lengths differ.
pub fn cosine(a: &[f32], b: &[f32]) -> Result<f64> {
    if a.len() != b.len() {
        return Err(MemoriaError::DimensionMismatch {
            left: a.len(),
            right: b.len(),
        });
    }

    let (dot, norm_a, norm_b) = a
        .iter()
        .zip(b.iter())
        .fold((0.0f64, 0.0f64, 0.0f64), |(d, na, nb), (&ai, &bi)| {
            let (ai, bi) = (f64::from(ai), f64::from(bi));
            (ai.mul_add(bi, d), ai.mul_add(ai, na), bi.mul_add(bi, nb))
        });

    let magnitude = norm_a.sqrt() * norm_b.sqrt();
    if magnitude == 0.0 {
        Ok(0.0)
    } else {
        Ok((dot / magnitude).clamp(-1.0, 1.0))
    }
}

/// Cosine similarity of one probe against many vectors, order preserved.
///
/// Numerically equivalent to independent [`cosine`] calls; the probe norm
/// is computed once.
pub fn cosine_batch(probe: &[f32], vectors: &[Vec<f32>]) -> Result<Vec<f64>> {
    let probe_norm: f64 = probe
        .iter()
        .map(|&x| {
            let x = f64::from(x);
            x * x
        })
        .sum::<f64>()
        .sqrt();

    if probe_norm == 0.0 {
        return Ok(vec![0.0; vectors.len()]);
    }

    vectors
        .iter()
        .map(|v| {
            if v.len() != probe.len() {
                return Err(MemoriaError::DimensionMismatch {
                    left: probe.len(),
                    right: v.len(),
                });
            }

            let (dot, norm_sq) = probe
                .iter()
                .zip(v.iter())
                .fold((0.0f64, 0.0f64), |(d, n), (&pi, &vi)| {
                    let (pi, vi) = (f64::from(pi), f64::from(vi));
                    (pi.mul_add(vi, d), vi.mul_add(vi, n))
                });

            let norm = norm_sq.sqrt();
            if norm == 0.0 {
                Ok(0.0)
            } else {
                Ok((dot / (probe_norm * norm)).clamp(-1.0, 1.0))
            }
        })
        .collect()
}

/// Dot product of two equal-length vectors.
pub fn dot(a: &[f32], b: &[f32]) -> Result<f64> {
    if a.len() != b.len() {
        return Err(MemoriaError::DimensionMismatch {
            left: a.len(),
            right: b.len(),
        });
    }
    Ok(a.iter()
        .zip(b.iter())
        .fold(0.0f64, |acc, (&ai, &bi)| {
            f64::from(ai).mul_add(f64::from(bi), acc)
        }))
}

/// MINERVA 2 nonlinear emphasis: `sim³`, sign-preserving.
///
/// Cubing suppresses weak matches while strong matches dominate.
pub fn cube(similarity: f64) -> f64 {
    similarity.powi(3)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_identical_is_one() {
        let a = vec![1.0f32, 0.0, 0.0];
        assert!((cosine(&a, &a).unwrap() - 1.0).abs() < 1e-10);
    }

    #[test]
    fn cosine_orthogonal_is_zero() {
        let a = vec![1.0f32, 0.0, 0.0];
        let b = vec![0.0f32, 1.0, 0.0];
        assert!(cosine(&a, &b).unwrap().abs() < 1e-10);
    }

    #[test]
    fn cosine_opposite_is_minus_one() {
        let a = vec![1.0f32, 0.0];
        let b = vec![-1.0f32, 0.0];
        assert!((cosine(&a, &b).unwrap() + 1.0).abs() < 1e-10);
    }

    #[test]
    fn cosine_zero_norm_is_zero() {
        let a = vec![0.0f32, 0.0, 0.0];
        let b = vec![1.0f32, 0.0, 0.0];
        assert_eq!(cosine(&a, &b).unwrap(), 0.0);
    }

    #[test]
    fn cosine_dimension_mismatch_fails() {
        let a = vec![1.0f32, 0.0];
        let b = vec![1.0f32, 0.0, 0.0];
        assert!(matches!(
            cosine(&a, &b),
            Err(MemoriaError::DimensionMismatch { left: 2, right: 3 })
        ));
    }

    #[test]
    fn cosine_handles_unnormalized_inputs() {
        let a = vec![3.0f32, 0.0];
        let b = vec![7.0f32, 0.0];
        assert!((cosine(&a, &b).unwrap() - 1.0).abs() < 1e-10);
    }

    #[test]
    fn cosine_result_stays_clamped() {
        // Near-parallel vectors can round to just above 1.0 in f64
        let a = vec![0.70710677f32, 0.70710677];
        assert!(cosine(&a, &a).unwrap() <= 1.0);
    }

    #[test]
    fn batch_matches_single_calls() {
        let probe = vec![0.6f32, 0.8, 0.0];
        let vectors = vec![
            vec![1.0f32, 0.0, 0.0],
            vec![0.0f32, 1.0, 0.0],
            vec![0.6f32, 0.8, 0.0],
        ];

        let batch = cosine_batch(&probe, &vectors).unwrap();
        for (v, &got) in vectors.iter().zip(batch.iter()) {
            let single = cosine(&probe, v).unwrap();
            assert!((single - got).abs() < 1e-12);
        }
    }

    #[test]
    fn batch_dimension_mismatch_fails() {
        let probe = vec![1.0f32, 0.0];
        let vectors = vec![vec![1.0f32, 0.0], vec![1.0f32, 0.0, 0.0]];
        assert!(cosine_batch(&probe, &vectors).is_err());
    }

    #[test]
    fn batch_zero_probe_returns_zeros() {
        let probe = vec![0.0f32, 0.0];
        let vectors = vec![vec![1.0f32, 0.0], vec![0.0f32, 1.0]];
        assert_eq!(cosine_batch(&probe, &vectors).unwrap(), vec![0.0, 0.0]);
    }

    #[test]
    fn cube_emphasizes_strong_matches() {
        assert!((cube(1.0) - 1.0).abs() < 1e-12);
        assert!((cube(0.5) - 0.125).abs() < 1e-12);
        assert!((cube(-0.5) + 0.125).abs() < 1e-12);
        // weak match suppressed far below its linear value
        assert!(cube(0.2) < 0.2 / 10.0);
    }

    #[test]
    fn dot_product() {
        let a = vec![1.0f32, 2.0, 3.0];
        let b = vec![4.0f32, 5.0, 6.0];
        assert!((dot(&a, &b).unwrap() - 32.0).abs() < 1e-10);
    }
}
