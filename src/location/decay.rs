//! Passive familiarity decay.
//!
//! Locations that go untouched fade. A sweep multiplies each stale
//! location's familiarity by `1 − decay_factor`, bounded below by a floor —
//! an elevated one for locations whose peak familiarity ever crossed the
//! sticky threshold (procedural memory is sticky). Pinned locations never
//! decay.
//!
//! The sweep is idempotent within a stale window: each decayed row records
//! `last_decayed_ms`, and a location is only eligible again once both its
//! last access and its last decay are older than the stale threshold.

use rusqlite::{params, Connection};

use crate::config::LocationConfig;
use crate::error::Result;
use crate::memory::now_ms;

/// Apply one decay pass. Returns the number of locations changed.
pub fn apply_familiarity_decay(conn: &Connection, config: &LocationConfig) -> Result<usize> {
    apply_familiarity_decay_at(conn, config, now_ms())
}

/// Apply one decay pass at an explicit `now`.
pub fn apply_familiarity_decay_at(
    conn: &Connection,
    config: &LocationConfig,
    now_ms: i64,
) -> Result<usize> {
    let stale_ms = i64::from(config.stale_threshold_days) * 86_400_000;
    let keep = 1.0 - config.decay_factor;

    let changed = conn.execute(
        "UPDATE locations SET \
             familiarity = MAX( \
                 CASE WHEN peak_familiarity >= ?1 THEN ?2 ELSE ?3 END, \
                 familiarity * ?4), \
             last_decayed_ms = ?5 \
         WHERE pinned = 0 \
           AND last_accessed_ms IS NOT NULL \
           AND ?5 - MAX(COALESCE(last_decayed_ms, 0), last_accessed_ms) >= ?6 \
           AND familiarity > MAX( \
                 CASE WHEN peak_familiarity >= ?1 THEN ?2 ELSE ?3 END, \
                 familiarity * ?4)",
        params![
            config.sticky_threshold,
            config.well_known_floor,
            config.floor,
            keep,
            now_ms,
            stale_ms,
        ],
    )?;

    if changed > 0 {
        tracing::info!(changed, "familiarity decay applied");
    }
    Ok(changed)
}
