//! Embedding lifecycle — keeping the vector store consistent with the
//! active model.
//!
//! The embedding model changes over a deployment's lifetime. When it does,
//! stored vectors from the old model are bulk-invalidated (their owners
//! become *pending*) and regenerated lazily in background batches. The text
//! and visual spaces share these contracts but live in independent tables:
//! migrating one never touches the other.
//!
//! All queries here key on the indexed `(model)` column, so a migration
//! over a large store never degrades to a full scan.

use rusqlite::{params, Connection};

use crate::db::migrations::{set_active_model, TEXT_MODEL_KEY, VISUAL_MODEL_KEY};
use crate::embedding::Embedder;
use crate::error::{MemoriaError, Result};
use crate::memory::vector_to_bytes;

/// Which embedding space an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Space {
    Text,
    Visual,
}

impl Space {
    fn embedding_table(self) -> &'static str {
        match self {
            Self::Text => "embeddings",
            Self::Visual => "visual_embeddings",
        }
    }

    fn owner_table(self) -> &'static str {
        match self {
            Self::Text => "memories",
            Self::Visual => "visual_memories",
        }
    }

    fn owner_column(self) -> &'static str {
        match self {
            Self::Text => "memory_id",
            Self::Visual => "visual_id",
        }
    }

    fn model_key(self) -> &'static str {
        match self {
            Self::Text => TEXT_MODEL_KEY,
            Self::Visual => VISUAL_MODEL_KEY,
        }
    }
}

/// An owner awaiting (re)embedding.
#[derive(Debug, Clone)]
pub struct PendingOwner {
    pub id: String,
    /// The text to embed — memory content, or a visual memory's caption
    /// (falling back to its source path).
    pub text: String,
}

/// Number of stored embeddings whose model tag differs from `model`.
pub fn count_embeddings_not_matching(
    conn: &Connection,
    space: Space,
    model: &str,
) -> Result<u64> {
    let count: i64 = conn.query_row(
        &format!(
            "SELECT COUNT(*) FROM {} WHERE model != ?1",
            space.embedding_table()
        ),
        params![model],
        |row| row.get(0),
    )?;
    Ok(count as u64)
}

/// Delete embeddings whose model tag differs from `model`, returning how
/// many were removed. Their owners become pending.
pub fn delete_embeddings_not_matching(
    conn: &Connection,
    space: Space,
    model: &str,
) -> Result<u64> {
    let deleted = conn.execute(
        &format!("DELETE FROM {} WHERE model != ?1", space.embedding_table()),
        params![model],
    )?;
    if deleted > 0 {
        tracing::info!(space = ?space, deleted, model, "stale embeddings invalidated");
    }
    Ok(deleted as u64)
}

/// Number of owners with no embedding row.
pub fn pending_embedding_count(conn: &Connection, space: Space) -> Result<u64> {
    let count: i64 = conn.query_row(
        &format!(
            "SELECT COUNT(*) FROM {owners} o \
             LEFT JOIN {embeddings} e ON o.id = e.{owner_col} \
             WHERE e.{owner_col} IS NULL",
            owners = space.owner_table(),
            embeddings = space.embedding_table(),
            owner_col = space.owner_column(),
        ),
        [],
        |row| row.get(0),
    )?;
    Ok(count as u64)
}

/// Paginated fetch of owners awaiting embedding, oldest first.
pub fn owners_without_embeddings(
    conn: &Connection,
    space: Space,
    limit: usize,
) -> Result<Vec<PendingOwner>> {
    let sql = match space {
        Space::Text => {
            "SELECT o.id, o.content FROM memories o \
             LEFT JOIN embeddings e ON o.id = e.memory_id \
             WHERE e.memory_id IS NULL \
             ORDER BY o.created_at LIMIT ?1"
        }
        Space::Visual => {
            "SELECT o.id, COALESCE(o.caption, o.source_path) FROM visual_memories o \
             LEFT JOIN visual_embeddings e ON o.id = e.visual_id \
             WHERE e.visual_id IS NULL \
             ORDER BY o.created_at LIMIT ?1"
        }
    };
    let mut stmt = conn.prepare(sql)?;
    let owners = stmt
        .query_map(params![limit as i64], |row| {
            Ok(PendingOwner {
                id: row.get(0)?,
                text: row.get(1)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(owners)
}

/// Insert or replace an owner's embedding. The dimensionality may differ
/// from the previous vector — replacements are whole-row.
pub fn store_embedding(
    conn: &Connection,
    space: Space,
    owner_id: &str,
    vector: &[f32],
    model: &str,
) -> Result<()> {
    if vector.is_empty() {
        return Err(MemoriaError::InvariantViolation(
            "embedding vector must not be empty".into(),
        ));
    }
    let owner_exists: bool = conn.query_row(
        &format!(
            "SELECT COUNT(*) > 0 FROM {} WHERE id = ?1",
            space.owner_table()
        ),
        params![owner_id],
        |row| row.get(0),
    )?;
    if !owner_exists {
        let label = match space {
            Space::Text => "memory",
            Space::Visual => "visual memory",
        };
        return Err(MemoriaError::NotFound(format!("{label} {owner_id}")));
    }

    conn.execute(
        &format!(
            "INSERT OR REPLACE INTO {} ({}, vector, dims, model, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            space.embedding_table(),
            space.owner_column(),
        ),
        params![
            owner_id,
            vector_to_bytes(vector),
            vector.len() as i64,
            model,
            chrono::Utc::now().to_rfc3339(),
        ],
    )?;
    Ok(())
}

/// Embed one batch of pending owners with the provider and store the
/// results under the provider's model tag. Returns how many were embedded;
/// 0 means the space is fully regenerated.
pub fn regenerate_batch(
    conn: &Connection,
    embedder: &dyn Embedder,
    space: Space,
    batch_size: usize,
) -> Result<usize> {
    let pending = owners_without_embeddings(conn, space, batch_size)?;
    if pending.is_empty() {
        return Ok(0);
    }

    let texts: Vec<&str> = pending.iter().map(|p| p.text.as_str()).collect();
    let embedded = embedder.embed_batch(&texts)?;

    for (owner, embedding) in pending.iter().zip(embedded.iter()) {
        store_embedding(conn, space, &owner.id, &embedding.vector, &embedding.model)?;
    }

    set_active_model(conn, space.model_key(), embedder.model())?;
    tracing::debug!(space = ?space, count = pending.len(), "embeddings regenerated");
    Ok(pending.len())
}

/// Store a visual memory (a frame or screenshot reference). Its embedding
/// arrives later via [`store_embedding`] or the regeneration sweep.
pub fn store_visual_memory(
    conn: &Connection,
    source_path: &str,
    caption: Option<&str>,
) -> Result<String> {
    let id = uuid::Uuid::now_v7().to_string();
    conn.execute(
        "INSERT INTO visual_memories (id, source_path, caption, created_at) \
         VALUES (?1, ?2, ?3, ?4)",
        params![id, source_path, caption, chrono::Utc::now().to_rfc3339()],
    )?;
    Ok(id)
}
