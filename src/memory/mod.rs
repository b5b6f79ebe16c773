//! Core memory engine — storage, associations, retrieval, and statistics.
//!
//! This module contains the write path ([`store`]), deletion ([`forget`]),
//! the association graph ([`associate`]), the cognitive retrieval pipeline
//! ([`retrieval`]), and statistics ([`stats`]). Type definitions live in
//! [`types`].

pub mod associate;
pub mod forget;
pub mod retrieval;
pub mod stats;
pub mod store;
pub mod types;

/// Convert an f32 vector to little-endian bytes for BLOB storage.
pub fn vector_to_bytes(vector: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(vector.len() * 4);
    for v in vector {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes
}

/// Convert a stored BLOB back to an f32 vector.
pub fn bytes_to_vector(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes(chunk.try_into().expect("4-byte chunk")))
        .collect()
}

/// Current time as epoch milliseconds.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
