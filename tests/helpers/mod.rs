#![allow(dead_code)]

use memoria::db;
use memoria::embedding::EmbeddedText;
use memoria::memory::store::{store_memory, StoreOptions};
use memoria::memory::types::MemoryKind;
use rusqlite::Connection;

pub const DAY_MS: i64 = 86_400_000;
pub const HOUR_MS: i64 = 3_600_000;

/// Open a fresh in-memory database with schema and migrations applied.
pub fn test_db() -> Connection {
    db::open_memory_database().unwrap()
}

/// Deterministic 32-dim embedding with a spike at position `seed`.
/// Distinct seeds produce orthogonal vectors.
pub fn spike(seed: usize) -> Vec<f32> {
    let mut v = vec![0.0f32; 32];
    v[seed % 32] = 1.0;
    v
}

/// A unit vector between `spike(a)` and `spike(b)`, weighted toward `a`.
/// Useful for intermediate similarities: `blend(0, 1, 0.9)` has cosine 0.9
/// against `spike(0)`.
pub fn blend(a: usize, b: usize, weight_a: f32) -> Vec<f32> {
    let mut v = vec![0.0f32; 32];
    v[a % 32] = weight_a;
    v[b % 32] = (1.0 - weight_a * weight_a).sqrt();
    v
}

/// Insert a memory with the given embedding. Returns its id.
pub fn insert_memory(conn: &mut Connection, content: &str, vector: Vec<f32>) -> String {
    store_memory(
        conn,
        content,
        MemoryKind::Context,
        StoreOptions {
            embedding: Some(EmbeddedText {
                vector,
                model: "test-model".into(),
            }),
            ..Default::default()
        },
    )
    .unwrap()
    .id
}

/// Replace a memory's entire access history with the given timestamps.
pub fn set_access_history(conn: &Connection, memory_id: &str, accesses_ms: &[i64]) {
    conn.execute(
        "DELETE FROM memory_accesses WHERE memory_id = ?1",
        rusqlite::params![memory_id],
    )
    .unwrap();
    for &at in accesses_ms {
        conn.execute(
            "INSERT INTO memory_accesses (memory_id, accessed_at_ms) VALUES (?1, ?2)",
            rusqlite::params![memory_id, at],
        )
        .unwrap();
    }
    conn.execute(
        "UPDATE memories SET access_count = ?2 WHERE id = ?1",
        rusqlite::params![memory_id, accesses_ms.len() as i64],
    )
    .unwrap();
}
