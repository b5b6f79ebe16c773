//! Memory deletion.
//!
//! A forgotten memory is removed permanently; its access history, embedding,
//! and association edges go with it via foreign-key cascade.

use rusqlite::{params, Connection};

use crate::error::{MemoriaError, Result};

/// Delete a memory by id. Cascades to accesses, embedding, and associations.
pub fn forget_memory(conn: &Connection, memory_id: &str) -> Result<()> {
    let rows = conn.execute("DELETE FROM memories WHERE id = ?1", params![memory_id])?;
    if rows == 0 {
        return Err(MemoriaError::NotFound(format!("memory {memory_id}")));
    }
    tracing::debug!(memory_id, "memory forgotten");
    Ok(())
}
