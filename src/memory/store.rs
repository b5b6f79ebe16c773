//! Write path — gist derivation, storage, and the creation access record.
//!
//! [`store_memory`] is the single entry point. It runs the full pipeline
//! inside a transaction: validate salience, derive the gist when absent,
//! insert the memory row, record the creating access (a memory always has
//! at least one access), and attach the embedding when one was supplied.

use rusqlite::{params, Connection, OptionalExtension};

use crate::embedding::EmbeddedText;
use crate::error::{MemoriaError, Result};
use crate::memory::types::{Memory, MemoryKind, Project};
use crate::memory::{now_ms, vector_to_bytes};

/// Maximum gist length in characters.
const GIST_MAX_CHARS: usize = 150;

/// Optional attributes for a new memory.
#[derive(Default)]
pub struct StoreOptions {
    /// Short summary; derived from content when `None`.
    pub gist: Option<String>,
    /// Salience in `[0.0, 1.0]`; defaults to 0.5.
    pub emotional_weight: Option<f64>,
    pub tags: Vec<String>,
    pub project_id: Option<String>,
    /// Pre-computed embedding for the content. Memories stored without one
    /// are picked up by the background regeneration sweep.
    pub embedding: Option<EmbeddedText>,
}

/// Store a new memory. The creation itself counts as the first access.
pub fn store_memory(
    conn: &mut Connection,
    content: &str,
    kind: MemoryKind,
    options: StoreOptions,
) -> Result<Memory> {
    let emotional_weight = options.emotional_weight.unwrap_or(0.5);
    if !(0.0..=1.0).contains(&emotional_weight) {
        return Err(MemoriaError::InvariantViolation(format!(
            "emotional_weight out of range: {emotional_weight}"
        )));
    }

    let id = uuid::Uuid::now_v7().to_string();
    let gist = options
        .gist
        .map(|g| clip_gist(&g))
        .unwrap_or_else(|| derive_gist(content));
    let tags_json = serde_json::to_string(&options.tags)?;
    let created_at = chrono::Utc::now().to_rfc3339();
    let accessed_at = now_ms();

    let tx = conn.transaction()?;

    tx.execute(
        "INSERT INTO memories (id, kind, content, gist, emotional_weight, tags, project_id, access_count, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 1, ?8)",
        params![
            id,
            kind.as_str(),
            content,
            gist,
            emotional_weight,
            tags_json,
            options.project_id,
            created_at,
        ],
    )?;

    tx.execute(
        "INSERT INTO memory_accesses (memory_id, accessed_at_ms) VALUES (?1, ?2)",
        params![id, accessed_at],
    )?;

    if let Some(embedded) = &options.embedding {
        tx.execute(
            "INSERT INTO embeddings (memory_id, vector, dims, model, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                id,
                vector_to_bytes(&embedded.vector),
                embedded.vector.len() as i64,
                embedded.model,
                created_at,
            ],
        )?;
    }

    tx.commit()?;
    tracing::debug!(memory_id = %id, kind = %kind, "memory stored");

    Ok(Memory {
        id,
        kind,
        content: content.to_string(),
        gist,
        emotional_weight,
        tags: options.tags,
        project_id: options.project_id,
        access_count: 1,
        created_at,
    })
}

/// Fetch a memory by id.
pub fn get_memory(conn: &Connection, memory_id: &str) -> Result<Memory> {
    conn.query_row(
        "SELECT id, kind, content, gist, emotional_weight, tags, project_id, access_count, created_at \
         FROM memories WHERE id = ?1",
        params![memory_id],
        row_to_memory,
    )
    .optional()?
    .ok_or_else(|| MemoriaError::NotFound(format!("memory {memory_id}")))
}

/// Access timestamps (ms) for a memory, oldest first.
pub fn access_history(conn: &Connection, memory_id: &str) -> Result<Vec<i64>> {
    let mut stmt = conn.prepare(
        "SELECT accessed_at_ms FROM memory_accesses WHERE memory_id = ?1 ORDER BY accessed_at_ms",
    )?;
    let times = stmt
        .query_map(params![memory_id], |row| row.get(0))?
        .collect::<std::result::Result<Vec<i64>, _>>()?;
    Ok(times)
}

/// Find the project for a path, creating it when missing. Paths are unique.
pub fn ensure_project(conn: &Connection, name: &str, path: &str) -> Result<Project> {
    let existing = conn
        .query_row(
            "SELECT id, name, path, created_at FROM projects WHERE path = ?1",
            params![path],
            |row| {
                Ok(Project {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    path: row.get(2)?,
                    created_at: row.get(3)?,
                })
            },
        )
        .optional()?;

    if let Some(project) = existing {
        return Ok(project);
    }

    let id = uuid::Uuid::now_v7().to_string();
    let created_at = chrono::Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO projects (id, name, path, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![id, name, path, created_at],
    )?;

    Ok(Project {
        id,
        name: name.to_string(),
        path: path.to_string(),
        created_at,
    })
}

/// Delete a project scope. Memories and locations keep their data; their
/// project reference is cleared, never cascaded.
pub fn delete_project(conn: &Connection, project_id: &str) -> Result<bool> {
    let rows = conn.execute("DELETE FROM projects WHERE id = ?1", params![project_id])?;
    Ok(rows > 0)
}

pub(crate) fn row_to_memory(row: &rusqlite::Row<'_>) -> rusqlite::Result<Memory> {
    let kind_str: String = row.get(1)?;
    let tags_json: String = row.get(5)?;
    Ok(Memory {
        id: row.get(0)?,
        kind: kind_str.parse().unwrap_or(MemoryKind::Context),
        content: row.get(2)?,
        gist: row.get(3)?,
        emotional_weight: row.get(4)?,
        tags: serde_json::from_str(&tags_json).unwrap_or_default(),
        project_id: row.get(6)?,
        access_count: row.get(7)?,
        created_at: row.get(8)?,
    })
}

/// Derive a gist from content: first line, clipped to the gist budget at a
/// char boundary.
fn derive_gist(content: &str) -> String {
    let first_line = content.lines().next().unwrap_or("").trim();
    clip_gist(first_line)
}

fn clip_gist(text: &str) -> String {
    if text.chars().count() <= GIST_MAX_CHARS {
        return text.to_string();
    }
    let clipped: String = text.chars().take(GIST_MAX_CHARS - 3).collect();
    format!("{}...", clipped.trim_end())
}
