use rusqlite::{params, Connection};
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;

use crate::error::Result;
use crate::memory::types::MemoryKind;

/// Response from memory_stats.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub total_memories: u64,
    pub by_kind: HashMap<String, u64>,
    pub embedded: u64,
    pub pending_embeddings: u64,
    pub associations: u64,
    pub total_accesses: u64,
    pub db_size_bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oldest_memory: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub newest_memory: Option<String>,
}

/// Compute memory store statistics.
///
/// If `project_id` is provided, counts are filtered to that project.
/// `db_path` is used for file size; pass None for in-memory databases.
pub fn memory_stats(
    conn: &Connection,
    project_id: Option<&str>,
    db_path: Option<&Path>,
) -> Result<StatsResponse> {
    let total: i64 = conn.query_row(
        "SELECT COUNT(*) FROM memories WHERE (?1 IS NULL OR project_id = ?1)",
        params![project_id],
        |row| row.get(0),
    )?;

    let mut by_kind = HashMap::new();
    for kind in [
        MemoryKind::Learning,
        MemoryKind::Decision,
        MemoryKind::Context,
        MemoryKind::Bug,
        MemoryKind::Solution,
        MemoryKind::Conversation,
    ] {
        by_kind.insert(kind.as_str().to_string(), 0);
    }
    {
        let mut stmt = conn.prepare(
            "SELECT kind, COUNT(*) FROM memories \
             WHERE (?1 IS NULL OR project_id = ?1) GROUP BY kind",
        )?;
        let rows = stmt.query_map(params![project_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;
        for row in rows {
            let (kind, count) = row?;
            by_kind.insert(kind, count as u64);
        }
    }

    let embedded: i64 = conn.query_row(
        "SELECT COUNT(*) FROM memories m \
         JOIN embeddings e ON m.id = e.memory_id \
         WHERE (?1 IS NULL OR m.project_id = ?1)",
        params![project_id],
        |row| row.get(0),
    )?;

    let associations: i64 =
        conn.query_row("SELECT COUNT(*) FROM associations", [], |row| row.get(0))?;

    let total_accesses: i64 = conn.query_row(
        "SELECT COUNT(*) FROM memory_accesses a \
         JOIN memories m ON a.memory_id = m.id \
         WHERE (?1 IS NULL OR m.project_id = ?1)",
        params![project_id],
        |row| row.get(0),
    )?;

    let (oldest, newest): (Option<String>, Option<String>) = conn.query_row(
        "SELECT MIN(created_at), MAX(created_at) FROM memories \
         WHERE (?1 IS NULL OR project_id = ?1)",
        params![project_id],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;

    let db_size_bytes = db_path
        .and_then(|p| std::fs::metadata(p).ok())
        .map(|m| m.len())
        .unwrap_or(0);

    Ok(StatsResponse {
        total_memories: total as u64,
        by_kind,
        embedded: embedded as u64,
        pending_embeddings: (total - embedded).max(0) as u64,
        associations: associations as u64,
        total_accesses: total_accesses as u64,
        db_size_bytes,
        oldest_memory: oldest,
        newest_memory: newest,
    })
}
