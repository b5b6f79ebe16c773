pub mod migrations;
pub mod schema;

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::Path;

/// Open (or create) the memoria database at the given path, with schema
/// initialized and migrations applied.
pub fn open_database(path: impl AsRef<Path>) -> Result<Connection> {
    let path = path.as_ref();

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }

    let conn = Connection::open(path).with_context(|| {
        format!(
            "failed to open database at {}. If the file is corrupt, \
             restore from a backup.",
            path.display()
        )
    })?;

    // Enable WAL mode for better concurrent read performance
    conn.pragma_update(None, "journal_mode", "WAL")?;
    // Enable foreign keys
    conn.pragma_update(None, "foreign_keys", "ON")?;
    // Wait up to 5 seconds for locks instead of failing immediately
    conn.pragma_update(None, "busy_timeout", "5000")?;

    schema::init_schema(&conn).context("failed to initialize schema")?;
    migrations::run_migrations(&conn).context("failed to run migrations")?;

    // Quick integrity check after schema init
    let integrity: String = conn.pragma_query_value(None, "quick_check", |row| row.get(0))?;
    if integrity != "ok" {
        anyhow::bail!("database integrity check failed: {integrity}");
    }

    tracing::info!(path = %path.display(), "database initialized");
    Ok(conn)
}

/// Open an in-memory database with schema and migrations applied.
///
/// Used by tests and by hosts that want an ephemeral store.
pub fn open_memory_database() -> Result<Connection> {
    let conn = Connection::open_in_memory().context("failed to open in-memory database")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    schema::init_schema(&conn).context("failed to initialize schema")?;
    migrations::run_migrations(&conn).context("failed to run migrations")?;
    Ok(conn)
}

/// Result of a full database health check.
pub struct HealthReport {
    pub schema_version: u32,
    pub embedding_model: Option<String>,
    pub visual_model: Option<String>,
    pub integrity_ok: bool,
    pub integrity_details: String,
    pub memory_count: i64,
    pub location_count: i64,
    pub association_count: i64,
    pub pending_embeddings: i64,
}

/// Run a comprehensive health check on the database.
pub fn check_database_health(conn: &Connection) -> Result<HealthReport> {
    let schema_version =
        migrations::get_schema_version(conn).context("failed to read schema version")?;

    let embedding_model = migrations::get_active_model(conn, migrations::TEXT_MODEL_KEY)
        .context("failed to read embedding model")?;
    let visual_model = migrations::get_active_model(conn, migrations::VISUAL_MODEL_KEY)
        .context("failed to read visual model")?;

    let integrity_details: String = conn
        .pragma_query_value(None, "integrity_check", |row| row.get(0))
        .context("failed to run integrity check")?;
    let integrity_ok = integrity_details == "ok";

    let memory_count: i64 = conn
        .query_row("SELECT COUNT(*) FROM memories", [], |row| row.get(0))
        .unwrap_or(0);

    let location_count: i64 = conn
        .query_row("SELECT COUNT(*) FROM locations", [], |row| row.get(0))
        .unwrap_or(0);

    let association_count: i64 = conn
        .query_row("SELECT COUNT(*) FROM associations", [], |row| row.get(0))
        .unwrap_or(0);

    let pending_embeddings: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM memories m \
             LEFT JOIN embeddings e ON m.id = e.memory_id \
             WHERE e.memory_id IS NULL",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    Ok(HealthReport {
        schema_version,
        embedding_model,
        visual_model,
        integrity_ok,
        integrity_details,
        memory_count,
        location_count,
        association_count,
        pending_embeddings,
    })
}
