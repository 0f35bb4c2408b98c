//! Schema version management using `PRAGMA user_version`.

use anyhow::{Context, Result};
use rusqlite::Connection;

/// Current schema version.
const CURRENT_VERSION: u32 = 2;

/// Runs database migrations up to `CURRENT_VERSION`.
///
/// # Errors
///
/// Returns an error if any SQL statement fails.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    let version: u32 = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .context("failed to read user_version")?;

    if version < 1 {
        migrate_v1(conn).context("migration to v1 failed")?;
    }
    if version < 2 {
        migrate_v2(conn).context("migration to v2 failed")?;
    }

    conn.pragma_update(None, "user_version", CURRENT_VERSION)
        .context("failed to update user_version")?;

    Ok(())
}

/// Migration to v1: create `profiles`, `watchlists`, and `reviews`.
fn migrate_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS profiles (
            id          TEXT PRIMARY KEY,
            username    TEXT,
            avatar_url  TEXT
        );

        CREATE TABLE IF NOT EXISTS watchlists (
            id            INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id       TEXT NOT NULL,
            movie_id      INTEGER NOT NULL,
            title         TEXT NOT NULL,
            poster_path   TEXT,
            vote_average  REAL,
            release_date  TEXT,
            created_at    TEXT NOT NULL,
            UNIQUE (user_id, movie_id)
        );

        CREATE TABLE IF NOT EXISTS reviews (
            id            INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id       TEXT NOT NULL,
            movie_id      INTEGER NOT NULL,
            rating        INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 10),
            comment       TEXT NOT NULL DEFAULT '',
            movie_title   TEXT,
            movie_poster  TEXT,
            created_at    TEXT NOT NULL,
            updated_at    TEXT NOT NULL,
            UNIQUE (user_id, movie_id)
        );",
    )
    .context("failed to create tables")?;

    Ok(())
}

/// Migration to v2: indexes for newest-first listings.
fn migrate_v2(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE INDEX IF NOT EXISTS idx_watchlists_user_created ON watchlists(user_id, created_at);
         CREATE INDEX IF NOT EXISTS idx_reviews_movie_created ON reviews(movie_id, created_at);
         CREATE INDEX IF NOT EXISTS idx_reviews_user_created ON reviews(user_id, created_at);",
    )
    .context("failed to create listing indexes")?;

    Ok(())
}
