//! Write path for a single location access.
//!
//! Runs inside one transaction: find or create the location, infer the
//! activity type, advance the familiarity curve, append the access record,
//! and reinforce co-access associations with every other location touched
//! in the same task or within the co-access window.

use rusqlite::{params, Connection};

use crate::config::LocationConfig;
use crate::error::Result;
use crate::location::familiarity;
use crate::location::query::{find_by_path, row_to_location};
use crate::location::types::{infer_activity, ActivityInference, ActivityType, Location};
use crate::memory::now_ms;

/// Optional attributes for a recorded access.
#[derive(Default)]
pub struct RecordOptions<'a> {
    /// What was happening, in the caller's words.
    pub context: &'a str,
    /// Explicit activity type; outranks inference.
    pub activity: Option<ActivityType>,
    /// Tool name (e.g. `"Read"`, `"Edit"`), used as an inference fallback.
    pub tool: Option<&'a str>,
    /// Task descriptor shared across related accesses.
    pub task: Option<&'a str>,
    /// The path was navigated to directly, without searching.
    pub direct: bool,
    pub project_id: Option<&'a str>,
    /// Human description for the location; set on first sight, updated when
    /// provided again.
    pub description: Option<&'a str>,
}

/// Result of recording an access.
#[derive(Debug)]
pub struct RecordOutcome {
    pub location: Location,
    pub inference: ActivityInference,
    /// Number of co-access associations reinforced by this access.
    pub associations_reinforced: usize,
}

/// Record an access to a path, creating the location if it is new.
pub fn record_access(
    conn: &mut Connection,
    path: &str,
    options: &RecordOptions<'_>,
    config: &LocationConfig,
) -> Result<RecordOutcome> {
    record_access_at(conn, path, options, config, now_ms())
}

/// Record an access at an explicit timestamp.
pub fn record_access_at(
    conn: &mut Connection,
    path: &str,
    options: &RecordOptions<'_>,
    config: &LocationConfig,
    now_ms: i64,
) -> Result<RecordOutcome> {
    let inference = infer_activity(options.context, options.tool, options.activity);

    let tx = conn.transaction()?;

    let existing = find_by_path(&tx, path, options.project_id)?;
    let location_id = match &existing {
        Some(location) => location.id.clone(),
        None => {
            let id = uuid::Uuid::now_v7().to_string();
            tx.execute(
                "INSERT INTO locations (id, path, project_id, description, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    id,
                    path,
                    options.project_id,
                    options.description,
                    chrono::Utc::now().to_rfc3339(),
                ],
            )?;
            id
        }
    };

    // Advance the curve at the new count; decay only shapes the value
    // between accesses.
    let new_count = existing.as_ref().map_or(0, |l| l.access_count) + 1;
    let new_familiarity = familiarity(new_count, config.familiarity_alpha);
    let direct_delta = i64::from(options.direct);

    tx.execute(
        "UPDATE locations SET \
             access_count = ?2, \
             direct_access_count = direct_access_count + ?3, \
             searches_saved = searches_saved + ?3, \
             familiarity = ?4, \
             peak_familiarity = MAX(peak_familiarity, ?4), \
             last_accessed_ms = ?5, \
             description = COALESCE(?6, description) \
         WHERE id = ?1",
        params![
            location_id,
            new_count,
            direct_delta,
            new_familiarity,
            now_ms,
            options.description,
        ],
    )?;

    // Reinforce co-access edges before inserting this access, so the query
    // below never matches the access being recorded.
    let associations_reinforced =
        reinforce_co_access(&tx, &location_id, &inference.activity, options.task, config, now_ms)?;

    tx.execute(
        "INSERT INTO location_accesses (location_id, context, activity, direct, task, accessed_at_ms) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            location_id,
            options.context,
            inference.activity.as_str(),
            options.direct,
            options.task,
            now_ms,
        ],
    )?;

    let location = tx
        .query_row(
            "SELECT id, path, project_id, description, access_count, direct_access_count, \
                    searches_saved, familiarity, peak_familiarity, pinned, last_accessed_ms, \
                    last_decayed_ms, created_at \
             FROM locations WHERE id = ?1",
            params![location_id],
            row_to_location,
        )?;

    tx.commit()?;
    tracing::debug!(
        path,
        activity = %inference.activity,
        familiarity = location.familiarity,
        "location access recorded"
    );

    Ok(RecordOutcome {
        location,
        inference,
        associations_reinforced,
    })
}

/// Strengthen the edge to every other location co-accessed with this one.
///
/// Co-access means: an access within the configured window, or any access
/// sharing this access's task descriptor. The increment depends on how much
/// context is shared; strengths accumulate and cap at 1.0.
fn reinforce_co_access(
    conn: &Connection,
    location_id: &str,
    activity: &ActivityType,
    task: Option<&str>,
    config: &LocationConfig,
    now_ms: i64,
) -> Result<usize> {
    let window_start = now_ms - i64::from(config.co_access_window_minutes) * 60_000;

    // Latest qualifying access per other location. Bare columns resolve to
    // the MAX row in SQLite.
    let mut stmt = conn.prepare(
        "SELECT location_id, task, activity, MAX(accessed_at_ms) \
         FROM location_accesses \
         WHERE location_id != ?1 \
           AND (accessed_at_ms >= ?2 OR (?3 IS NOT NULL AND task = ?3)) \
         GROUP BY location_id",
    )?;
    let partners = stmt
        .query_map(params![location_id, window_start, task], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let now = chrono::Utc::now().to_rfc3339();
    let mut reinforced = 0;
    for (other_id, other_task, other_activity) in partners {
        let same_task = matches!((task, other_task.as_deref()), (Some(a), Some(b)) if a == b);
        // Two unknowns are no evidence of a shared activity
        let same_activity =
            *activity != ActivityType::Unknown && other_activity == activity.as_str();
        let increment = match (same_task, same_activity) {
            (true, true) => config.strength_same_task_same_activity,
            (true, false) => config.strength_same_task,
            (false, true) => config.strength_same_activity,
            (false, false) => config.strength_baseline,
        };

        // One row per unordered pair
        let (a, b) = if location_id < other_id.as_str() {
            (location_id, other_id.as_str())
        } else {
            (other_id.as_str(), location_id)
        };
        conn.execute(
            "INSERT INTO location_associations (source_id, target_id, strength, co_access_count, reinforced_at) \
             VALUES (?1, ?2, ?3, 1, ?4) \
             ON CONFLICT(source_id, target_id) \
             DO UPDATE SET strength = MIN(1.0, strength + ?3), \
                           co_access_count = co_access_count + 1, \
                           reinforced_at = ?4",
            params![a, b, increment, now],
        )?;
        reinforced += 1;
    }

    Ok(reinforced)
}
