//! SQLite schema definitions.

/// Single table holding every persisted value as serialized JSON.
///
/// Removed keys stay as `deleted` rows so their revision keeps counting.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS kv_store (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    revision INTEGER NOT NULL DEFAULT 1,
    deleted INTEGER NOT NULL DEFAULT 0,
    updated_at TEXT NOT NULL
);
"#;
