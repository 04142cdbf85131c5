//! Database schema for the SQLite catalog store.
//!
//! Two tables:
//! - paintings: one row per artwork, id assigned by the engine
//! - ratings: one row per (painting, rater) pair, upserted on conflict

/// SQL schema for the gallery catalog database.
pub const GALLERY_SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS paintings (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    price TEXT NOT NULL,
    image TEXT NOT NULL DEFAULT '',
    category TEXT NOT NULL,
    featured INTEGER NOT NULL DEFAULT 0,
    rating REAL NOT NULL DEFAULT 4.0,

    -- Unix milliseconds
    created_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS ratings (
    painting_id INTEGER NOT NULL REFERENCES paintings(id) ON DELETE CASCADE,
    rater_id TEXT NOT NULL,
    rating REAL NOT NULL,
    created_at INTEGER NOT NULL,

    PRIMARY KEY (painting_id, rater_id)
);

CREATE INDEX IF NOT EXISTS idx_ratings_painting ON ratings(painting_id);
"#;
