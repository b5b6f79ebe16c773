//! Location lookups, statistics, pinning, and orphan detection.

use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;

use crate::config::LocationConfig;
use crate::error::{MemoriaError, Result};
use crate::location::types::{ActivityType, Location, LocationAccess};

const LOCATION_COLUMNS: &str = "id, path, project_id, description, access_count, \
     direct_access_count, searches_saved, familiarity, peak_familiarity, pinned, \
     last_accessed_ms, last_decayed_ms, created_at";

/// An associated location with its edge strength.
#[derive(Debug, Serialize)]
pub struct AssociatedLocation {
    pub path: String,
    pub strength: f64,
    pub familiarity: f64,
    pub co_access_count: u32,
}

/// Summary statistics over the location store.
#[derive(Debug, Serialize)]
pub struct LocationStats {
    pub total_locations: u64,
    /// Locations at or above the well-known familiarity threshold.
    pub well_known: u64,
    pub pinned: u64,
    pub total_accesses: u64,
    pub associations: u64,
    pub average_familiarity: f64,
}

/// Fetch a location by path, or NotFound.
pub fn get_location(
    conn: &Connection,
    path: &str,
    project_id: Option<&str>,
) -> Result<Location> {
    find_by_path(conn, path, project_id)?
        .ok_or_else(|| MemoriaError::NotFound(format!("location {path}")))
}

/// Fetch a location by path if it exists.
pub fn find_by_path(
    conn: &Connection,
    path: &str,
    project_id: Option<&str>,
) -> Result<Option<Location>> {
    let location = conn
        .query_row(
            &format!(
                "SELECT {LOCATION_COLUMNS} FROM locations \
                 WHERE path = ?1 AND project_id IS ?2"
            ),
            params![path, project_id],
            row_to_location,
        )
        .optional()?;
    Ok(location)
}

/// Locations whose path contains the pattern, best known first.
pub fn find_locations(conn: &Connection, pattern: &str) -> Result<Vec<Location>> {
    let like = format!("%{}%", pattern.replace('%', "\\%").replace('_', "\\_"));
    let mut stmt = conn.prepare(&format!(
        "SELECT {LOCATION_COLUMNS} FROM locations \
         WHERE path LIKE ?1 ESCAPE '\\' ORDER BY familiarity DESC, path"
    ))?;
    collect_locations(&mut stmt, params![like])
}

/// Every known location, best known first.
pub fn all_locations(conn: &Connection) -> Result<Vec<Location>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {LOCATION_COLUMNS} FROM locations ORDER BY familiarity DESC, path"
    ))?;
    collect_locations(&mut stmt, params![])
}

/// Most recently accessed locations.
pub fn recent_locations(conn: &Connection, limit: usize) -> Result<Vec<Location>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {LOCATION_COLUMNS} FROM locations \
         WHERE last_accessed_ms IS NOT NULL \
         ORDER BY last_accessed_ms DESC LIMIT ?1"
    ))?;
    collect_locations(&mut stmt, params![limit as i64])
}

/// Access history for a location, newest first.
pub fn location_contexts(
    conn: &Connection,
    path: &str,
    project_id: Option<&str>,
    limit: usize,
) -> Result<Vec<LocationAccess>> {
    let location = get_location(conn, path, project_id)?;
    let mut stmt = conn.prepare(
        "SELECT location_id, context, activity, direct, task, accessed_at_ms \
         FROM location_accesses WHERE location_id = ?1 \
         ORDER BY accessed_at_ms DESC LIMIT ?2",
    )?;
    let accesses = stmt
        .query_map(params![location.id, limit as i64], |row| {
            let activity: String = row.get(2)?;
            Ok(LocationAccess {
                location_id: row.get(0)?,
                context: row.get(1)?,
                activity: activity.parse().unwrap_or(ActivityType::Unknown),
                direct: row.get(3)?,
                task: row.get(4)?,
                accessed_at_ms: row.get(5)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(accesses)
}

/// Locations associated with the given path, strongest edge first, with
/// their current familiarity.
pub fn associated_locations(
    conn: &Connection,
    path: &str,
    project_id: Option<&str>,
) -> Result<Vec<AssociatedLocation>> {
    let seed = get_location(conn, path, project_id)?;
    let mut stmt = conn.prepare(
        "SELECT l.path, a.strength, l.familiarity, a.co_access_count \
         FROM location_associations a \
         JOIN locations l ON l.id = CASE WHEN a.source_id = ?1 THEN a.target_id ELSE a.source_id END \
         WHERE a.source_id = ?1 OR a.target_id = ?1 \
         ORDER BY a.strength DESC",
    )?;
    let results = stmt
        .query_map(params![seed.id], |row| {
            Ok(AssociatedLocation {
                path: row.get(0)?,
                strength: row.get(1)?,
                familiarity: row.get(2)?,
                co_access_count: row.get(3)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(results)
}

/// Locations whose access history includes the given activity, ordered by
/// how often it occurred there.
pub fn locations_by_activity(
    conn: &Connection,
    activity: ActivityType,
) -> Result<Vec<(Location, u32)>> {
    let mut stmt = conn.prepare(
        "SELECT l.id, l.path, l.project_id, l.description, l.access_count, \
                l.direct_access_count, l.searches_saved, l.familiarity, l.peak_familiarity, \
                l.pinned, l.last_accessed_ms, l.last_decayed_ms, l.created_at, \
                COUNT(a.id) AS occurrences \
         FROM locations l \
         JOIN location_accesses a ON a.location_id = l.id \
         WHERE a.activity = ?1 \
         GROUP BY l.id \
         ORDER BY occurrences DESC, l.path",
    )?;
    let results = stmt
        .query_map(params![activity.as_str()], |row| {
            let location = row_to_location(row)?;
            let occurrences: u32 = row.get(13)?;
            Ok((location, occurrences))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(results)
}

/// Pin or unpin a location. Pinned locations neither decay nor show up as
/// orphans.
pub fn set_pinned(
    conn: &Connection,
    path: &str,
    project_id: Option<&str>,
    pinned: bool,
) -> Result<Location> {
    let location = get_location(conn, path, project_id)?;
    conn.execute(
        "UPDATE locations SET pinned = ?2 WHERE id = ?1",
        params![location.id, pinned],
    )?;
    get_location(conn, path, project_id)
}

/// Familiar locations that have gone stale: familiarity at or above the
/// configured minimum, untouched longer than the orphan threshold, unpinned.
pub fn orphaned_locations(
    conn: &Connection,
    config: &LocationConfig,
    now_ms: i64,
) -> Result<Vec<Location>> {
    let cutoff = now_ms - i64::from(config.orphan_stale_days) * 86_400_000;
    let mut stmt = conn.prepare(&format!(
        "SELECT {LOCATION_COLUMNS} FROM locations \
         WHERE pinned = 0 \
           AND familiarity >= ?1 \
           AND last_accessed_ms IS NOT NULL \
           AND last_accessed_ms < ?2 \
         ORDER BY familiarity DESC"
    ))?;
    collect_locations(&mut stmt, params![config.orphan_min_familiarity, cutoff])
}

/// Summary statistics.
pub fn location_stats(conn: &Connection, config: &LocationConfig) -> Result<LocationStats> {
    let (total, well_known, pinned, avg): (i64, i64, i64, Option<f64>) = conn.query_row(
        "SELECT COUNT(*), \
                SUM(CASE WHEN familiarity >= ?1 THEN 1 ELSE 0 END), \
                SUM(CASE WHEN pinned != 0 THEN 1 ELSE 0 END), \
                AVG(familiarity) \
         FROM locations",
        params![config.well_known_threshold],
        |row| {
            Ok((
                row.get(0)?,
                row.get::<_, Option<i64>>(1)?.unwrap_or(0),
                row.get::<_, Option<i64>>(2)?.unwrap_or(0),
                row.get(3)?,
            ))
        },
    )?;

    let total_accesses: i64 =
        conn.query_row("SELECT COUNT(*) FROM location_accesses", [], |row| row.get(0))?;
    let associations: i64 =
        conn.query_row("SELECT COUNT(*) FROM location_associations", [], |row| row.get(0))?;

    Ok(LocationStats {
        total_locations: total as u64,
        well_known: well_known as u64,
        pinned: pinned as u64,
        total_accesses: total_accesses as u64,
        associations: associations as u64,
        average_familiarity: avg.unwrap_or(0.0),
    })
}

pub(crate) fn row_to_location(row: &rusqlite::Row<'_>) -> rusqlite::Result<Location> {
    Ok(Location {
        id: row.get(0)?,
        path: row.get(1)?,
        project_id: row.get(2)?,
        description: row.get(3)?,
        access_count: row.get(4)?,
        direct_access_count: row.get(5)?,
        searches_saved: row.get(6)?,
        familiarity: row.get(7)?,
        peak_familiarity: row.get(8)?,
        pinned: row.get(9)?,
        last_accessed_ms: row.get(10)?,
        last_decayed_ms: row.get(11)?,
        created_at: row.get(12)?,
    })
}

fn collect_locations<P: rusqlite::Params>(
    stmt: &mut rusqlite::Statement<'_>,
    params: P,
) -> Result<Vec<Location>> {
    let locations = stmt
        .query_map(params, row_to_location)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(locations)
}
