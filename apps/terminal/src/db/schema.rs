//! SQLite schema definitions.

/// Stored in `PRAGMA user_version`.
pub const SCHEMA_VERSION: i32 = 1;

/// Key-value table standing in for browser local storage.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS kv_store (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
"#;
