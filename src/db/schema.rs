//! SQL DDL for all memoria tables.
//!
//! Defines the `projects`, `memories`, `memory_accesses`, `embeddings`,
//! `associations`, `locations`, `location_accesses`, `location_associations`,
//! `visual_memories`, `visual_embeddings`, and `schema_meta` tables. All DDL
//! uses `IF NOT EXISTS` for idempotent initialization.
//!
//! Embedding vectors are stored as little-endian f32 BLOBs with an explicit
//! `dims` column so that a model migration may change dimensionality row by
//! row. The `(model)` indexes keep lifecycle migration queries off full
//! table scans.

use rusqlite::Connection;

/// All schema DDL statements for memoria's core tables.
const SCHEMA_SQL: &str = r#"
-- Project scopes
CREATE TABLE IF NOT EXISTS projects (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    path TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL
);

-- Core memory storage
CREATE TABLE IF NOT EXISTS memories (
    id TEXT PRIMARY KEY,
    kind TEXT NOT NULL CHECK(kind IN ('learning','decision','context','bug','solution','conversation')),
    content TEXT NOT NULL,
    gist TEXT NOT NULL,
    emotional_weight REAL NOT NULL DEFAULT 0.5 CHECK(emotional_weight >= 0.0 AND emotional_weight <= 1.0),
    tags TEXT NOT NULL DEFAULT '[]',
    project_id TEXT REFERENCES projects(id) ON DELETE SET NULL,
    access_count INTEGER NOT NULL DEFAULT 0 CHECK(access_count >= 0),
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_memories_kind ON memories(kind);
CREATE INDEX IF NOT EXISTS idx_memories_project ON memories(project_id);

-- Access history: one row per retrieval, reference, or store
CREATE TABLE IF NOT EXISTS memory_accesses (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    memory_id TEXT NOT NULL REFERENCES memories(id) ON DELETE CASCADE,
    accessed_at_ms INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_accesses_memory ON memory_accesses(memory_id, accessed_at_ms);

-- Embedding vectors, one per memory, tagged with the producing model
CREATE TABLE IF NOT EXISTS embeddings (
    memory_id TEXT PRIMARY KEY REFERENCES memories(id) ON DELETE CASCADE,
    vector BLOB NOT NULL,
    dims INTEGER NOT NULL CHECK(dims > 0),
    model TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_embeddings_model ON embeddings(model);

-- Weighted directed edges between memories, treated symmetrically on read
CREATE TABLE IF NOT EXISTS associations (
    source_id TEXT NOT NULL REFERENCES memories(id) ON DELETE CASCADE,
    target_id TEXT NOT NULL REFERENCES memories(id) ON DELETE CASCADE,
    strength REAL NOT NULL CHECK(strength >= 0.0 AND strength <= 1.0),
    kind TEXT NOT NULL DEFAULT 'semantic',
    reinforced_at TEXT NOT NULL,
    PRIMARY KEY (source_id, target_id)
);

CREATE INDEX IF NOT EXISTS idx_associations_source ON associations(source_id);
CREATE INDEX IF NOT EXISTS idx_associations_target ON associations(target_id);

-- Known file paths with learned familiarity
CREATE TABLE IF NOT EXISTS locations (
    id TEXT PRIMARY KEY,
    path TEXT NOT NULL,
    project_id TEXT REFERENCES projects(id) ON DELETE SET NULL,
    description TEXT,
    access_count INTEGER NOT NULL DEFAULT 0 CHECK(access_count >= 0),
    direct_access_count INTEGER NOT NULL DEFAULT 0,
    searches_saved INTEGER NOT NULL DEFAULT 0,
    familiarity REAL NOT NULL DEFAULT 0.0 CHECK(familiarity >= 0.0 AND familiarity <= 1.0),
    peak_familiarity REAL NOT NULL DEFAULT 0.0,
    pinned INTEGER NOT NULL DEFAULT 0,
    last_accessed_ms INTEGER,
    last_decayed_ms INTEGER,
    created_at TEXT NOT NULL,
    UNIQUE(path, project_id)
);

-- Per-access context bound to a location
CREATE TABLE IF NOT EXISTS location_accesses (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    location_id TEXT NOT NULL REFERENCES locations(id) ON DELETE CASCADE,
    context TEXT NOT NULL,
    activity TEXT NOT NULL CHECK(activity IN ('reading','writing','debugging','refactoring','reviewing','unknown')),
    direct INTEGER NOT NULL DEFAULT 0,
    task TEXT,
    accessed_at_ms INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_location_accesses ON location_accesses(location_id, accessed_at_ms);

-- Co-access edges between locations; one row per unordered pair
CREATE TABLE IF NOT EXISTS location_associations (
    source_id TEXT NOT NULL REFERENCES locations(id) ON DELETE CASCADE,
    target_id TEXT NOT NULL REFERENCES locations(id) ON DELETE CASCADE,
    strength REAL NOT NULL CHECK(strength >= 0.0 AND strength <= 1.0),
    co_access_count INTEGER NOT NULL DEFAULT 1,
    reinforced_at TEXT NOT NULL,
    PRIMARY KEY (source_id, target_id)
);

CREATE INDEX IF NOT EXISTS idx_loc_assoc_source ON location_associations(source_id);
CREATE INDEX IF NOT EXISTS idx_loc_assoc_target ON location_associations(target_id);

-- Visual memory space (frames, screenshots); embeddings tracked separately
CREATE TABLE IF NOT EXISTS visual_memories (
    id TEXT PRIMARY KEY,
    source_path TEXT NOT NULL,
    caption TEXT,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS visual_embeddings (
    visual_id TEXT PRIMARY KEY REFERENCES visual_memories(id) ON DELETE CASCADE,
    vector BLOB NOT NULL,
    dims INTEGER NOT NULL CHECK(dims > 0),
    model TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_visual_embeddings_model ON visual_embeddings(model);

-- Schema metadata
CREATE TABLE IF NOT EXISTS schema_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// Initialize all schema tables. Idempotent (uses IF NOT EXISTS).
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;

    // Set initial schema version if not already present
    conn.execute(
        "INSERT OR IGNORE INTO schema_meta (key, value) VALUES ('schema_version', '1')",
        [],
    )?;

    Ok(())
}
