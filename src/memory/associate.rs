//! The association graph — weighted edges between memories.
//!
//! Edges are stored directed and upserted by ordered pair; retrieval reads
//! them symmetrically (an edge a → b spreads activation for both a and b).
//! Deleting either endpoint removes the edge via foreign-key cascade.

use rusqlite::{params, Connection};

use crate::error::{MemoriaError, Result};
use crate::memory::types::Association;

/// Create or overwrite the edge (source → target) with the given strength.
///
/// Repeated calls with the same ordered pair replace the strength — they
/// never accumulate.
pub fn associate(
    conn: &Connection,
    source_id: &str,
    target_id: &str,
    strength: f64,
    kind: &str,
) -> Result<()> {
    if !(0.0..=1.0).contains(&strength) {
        return Err(MemoriaError::InvariantViolation(format!(
            "association strength out of range: {strength}"
        )));
    }
    if source_id == target_id {
        return Err(MemoriaError::InvariantViolation(
            "self-association is not allowed".into(),
        ));
    }
    ensure_exists(conn, source_id)?;
    ensure_exists(conn, target_id)?;

    let now = chrono::Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO associations (source_id, target_id, strength, kind, reinforced_at) \
         VALUES (?1, ?2, ?3, ?4, ?5) \
         ON CONFLICT(source_id, target_id) \
         DO UPDATE SET strength = excluded.strength, kind = excluded.kind, \
                       reinforced_at = excluded.reinforced_at",
        params![source_id, target_id, strength, kind, now],
    )?;
    Ok(())
}

/// All edges touching a memory, in either direction.
pub fn get_associations(conn: &Connection, memory_id: &str) -> Result<Vec<Association>> {
    let mut stmt = conn.prepare(
        "SELECT source_id, target_id, strength, kind, reinforced_at FROM associations \
         WHERE source_id = ?1 OR target_id = ?1 \
         ORDER BY strength DESC",
    )?;
    let edges = stmt
        .query_map(params![memory_id], |row| {
            Ok(Association {
                source_id: row.get(0)?,
                target_id: row.get(1)?,
                strength: row.get(2)?,
                kind: row.get(3)?,
                reinforced_at: row.get(4)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(edges)
}

fn ensure_exists(conn: &Connection, memory_id: &str) -> Result<()> {
    let exists: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM memories WHERE id = ?1",
        params![memory_id],
        |row| row.get(0),
    )?;
    if !exists {
        return Err(MemoriaError::NotFound(format!("memory {memory_id}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::memory::store::{store_memory, StoreOptions};
    use crate::memory::types::MemoryKind;

    fn insert(conn: &mut Connection, content: &str) -> String {
        store_memory(conn, content, MemoryKind::Context, StoreOptions::default())
            .unwrap()
            .id
    }

    #[test]
    fn associate_and_read_back() {
        let mut conn = db::open_memory_database().unwrap();
        let a = insert(&mut conn, "alpha");
        let b = insert(&mut conn, "beta");

        associate(&conn, &a, &b, 0.7, "semantic").unwrap();

        let edges = get_associations(&conn, &a).unwrap();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].target_id, b);
        assert!((edges[0].strength - 0.7).abs() < 1e-12);

        // Visible from the other endpoint too
        let edges_b = get_associations(&conn, &b).unwrap();
        assert_eq!(edges_b.len(), 1);
        assert_eq!(edges_b[0].source_id, a);
    }

    #[test]
    fn upsert_overwrites_strength() {
        let mut conn = db::open_memory_database().unwrap();
        let a = insert(&mut conn, "alpha");
        let b = insert(&mut conn, "beta");

        associate(&conn, &a, &b, 0.3, "semantic").unwrap();
        associate(&conn, &a, &b, 0.9, "semantic").unwrap();

        let edges = get_associations(&conn, &a).unwrap();
        assert_eq!(edges.len(), 1);
        assert!((edges[0].strength - 0.9).abs() < 1e-12);
    }

    #[test]
    fn invalid_strength_rejected() {
        let mut conn = db::open_memory_database().unwrap();
        let a = insert(&mut conn, "alpha");
        let b = insert(&mut conn, "beta");
        assert!(associate(&conn, &a, &b, 1.2, "semantic").is_err());
        assert!(associate(&conn, &a, &b, -0.1, "semantic").is_err());
    }

    #[test]
    fn missing_endpoint_is_not_found() {
        let mut conn = db::open_memory_database().unwrap();
        let a = insert(&mut conn, "alpha");
        assert!(matches!(
            associate(&conn, &a, "ghost", 0.5, "semantic"),
            Err(MemoriaError::NotFound(_))
        ));
    }

    #[test]
    fn deleting_endpoint_cascades_edge() {
        let mut conn = db::open_memory_database().unwrap();
        let a = insert(&mut conn, "alpha");
        let b = insert(&mut conn, "beta");
        associate(&conn, &a, &b, 0.5, "semantic").unwrap();

        conn.execute("DELETE FROM memories WHERE id = ?1", params![b])
            .unwrap();

        assert!(get_associations(&conn, &a).unwrap().is_empty());
    }
}
