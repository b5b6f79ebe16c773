//! Rename merging.
//!
//! When a file moves, its learned familiarity should follow. If only the
//! old path is known, the location is renamed in place. If both paths are
//! known, the records combine: counters sum, familiarity takes the max,
//! association edges union with strengths summed (capped at 1.0), access
//! contexts move over, and the old row is deleted.

use rusqlite::{params, Connection};

use crate::error::Result;
use crate::location::query::{find_by_path, get_location};
use crate::location::types::Location;

/// Merge `old_path` into `new_path`. Returns the resulting location, or
/// `None` when neither path is known.
pub fn merge_locations(
    conn: &mut Connection,
    old_path: &str,
    new_path: &str,
    project_id: Option<&str>,
) -> Result<Option<Location>> {
    let old = find_by_path(conn, old_path, project_id)?;
    let new = find_by_path(conn, new_path, project_id)?;

    match (old, new) {
        (None, None) => Ok(None),
        (None, Some(new)) => Ok(Some(new)),
        (Some(old), None) => {
            conn.execute(
                "UPDATE locations SET path = ?2 WHERE id = ?1",
                params![old.id, new_path],
            )?;
            tracing::debug!(from = old_path, to = new_path, "location renamed");
            Ok(Some(get_location(conn, new_path, project_id)?))
        }
        (Some(old), Some(new)) => {
            combine(conn, &old, &new)?;
            tracing::debug!(from = old_path, to = new_path, "locations merged");
            Ok(Some(get_location(conn, new_path, project_id)?))
        }
    }
}

/// Fold `old` into `new` and delete `old`.
fn combine(conn: &mut Connection, old: &Location, new: &Location) -> Result<()> {
    let tx = conn.transaction()?;

    tx.execute(
        "UPDATE locations SET \
             access_count = access_count + ?2, \
             direct_access_count = direct_access_count + ?3, \
             searches_saved = searches_saved + ?4, \
             familiarity = MAX(familiarity, ?5), \
             peak_familiarity = MAX(peak_familiarity, ?6), \
             pinned = MAX(pinned, ?7), \
             last_accessed_ms = MAX(COALESCE(last_accessed_ms, 0), COALESCE(?8, 0)) \
         WHERE id = ?1",
        params![
            new.id,
            old.access_count,
            old.direct_access_count,
            old.searches_saved,
            old.familiarity,
            old.peak_familiarity,
            old.pinned,
            old.last_accessed_ms,
        ],
    )?;

    // Move access contexts
    tx.execute(
        "UPDATE location_accesses SET location_id = ?2 WHERE location_id = ?1",
        params![old.id, new.id],
    )?;

    // Union association edges: re-point each of old's edges at new, summing
    // strengths (capped) where new already has the same partner.
    let old_edges: Vec<(String, f64, u32)> = {
        let mut stmt = tx.prepare(
            "SELECT CASE WHEN source_id = ?1 THEN target_id ELSE source_id END, \
                    strength, co_access_count \
             FROM location_associations \
             WHERE source_id = ?1 OR target_id = ?1",
        )?;
        let edges = stmt
            .query_map(params![old.id], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        edges
    };

    let now = chrono::Utc::now().to_rfc3339();
    for (partner, strength, co_count) in old_edges {
        // The old↔new edge itself dissolves in the merge
        if partner == new.id {
            continue;
        }
        let (a, b) = if new.id < partner {
            (new.id.as_str(), partner.as_str())
        } else {
            (partner.as_str(), new.id.as_str())
        };
        tx.execute(
            "INSERT INTO location_associations (source_id, target_id, strength, co_access_count, reinforced_at) \
             VALUES (?1, ?2, ?3, ?4, ?5) \
             ON CONFLICT(source_id, target_id) \
             DO UPDATE SET strength = MIN(1.0, strength + ?3), \
                           co_access_count = co_access_count + ?4, \
                           reinforced_at = ?5",
            params![a, b, strength, co_count, now],
        )?;
    }

    // Deleting the old row cascades its remaining edges and accesses
    tx.execute("DELETE FROM locations WHERE id = ?1", params![old.id])?;

    tx.commit()?;
    Ok(())
}
