//! Watchlist CRUD operations.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use cinescope_api::supabase::{MovieSnapshot, WatchlistEntry};
use rusqlite::{Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::columns::{format_timestamp, timestamp_at, uuid_at};

const SELECT_COLUMNS: &str = "SELECT id, user_id, movie_id, title, poster_path, vote_average, release_date, created_at FROM watchlists";

fn map_entry(row: &Row<'_>) -> rusqlite::Result<WatchlistEntry> {
    Ok(WatchlistEntry {
        id: row.get(0)?,
        user_id: uuid_at(row, 1)?,
        movie_id: row.get(2)?,
        title: row.get(3)?,
        poster_path: row.get(4)?,
        vote_average: row.get(5)?,
        release_date: row.get(6)?,
        created_at: timestamp_at(row, 7)?,
    })
}

/// Inserts a watchlist row.
///
/// # Errors
///
/// Returns an error if the insert fails, including a unique-constraint
/// violation when the movie is already listed for the user.
pub fn insert_entry(
    conn: &Connection,
    user_id: Uuid,
    movie_id: u64,
    snapshot: &MovieSnapshot,
    now: DateTime<Utc>,
) -> Result<WatchlistEntry> {
    conn.execute(
        "INSERT INTO watchlists (user_id, movie_id, title, poster_path, vote_average, release_date, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        rusqlite::params![
            user_id.to_string(),
            movie_id,
            snapshot.title,
            snapshot.poster_path,
            snapshot.vote_average,
            snapshot.release_date,
            format_timestamp(now),
        ],
    )
    .with_context(|| format!("failed to insert watchlist entry for movie {movie_id}"))?;

    let id = conn.last_insert_rowid();
    conn.query_row(&format!("{SELECT_COLUMNS} WHERE id = ?1"), [id], map_entry)
        .with_context(|| format!("failed to read back watchlist entry {id}"))
}

/// Deletes a watchlist row. Returns the number of rows removed.
///
/// # Errors
///
/// Returns an error if the delete fails.
pub fn delete_entry(conn: &Connection, user_id: Uuid, movie_id: u64) -> Result<usize> {
    conn.execute(
        "DELETE FROM watchlists WHERE user_id = ?1 AND movie_id = ?2",
        rusqlite::params![user_id.to_string(), movie_id],
    )
    .with_context(|| format!("failed to delete watchlist entry for movie {movie_id}"))
}

/// Returns whether the movie is on the user's watchlist.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn contains(conn: &Connection, user_id: Uuid, movie_id: u64) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT id FROM watchlists WHERE user_id = ?1 AND movie_id = ?2",
            rusqlite::params![user_id.to_string(), movie_id],
            |row| row.get(0),
        )
        .optional()
        .context("failed to query watchlist membership")?;
    Ok(found.is_some())
}

/// Loads the user's watchlist, newest first.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn load_entries(conn: &Connection, user_id: Uuid) -> Result<Vec<WatchlistEntry>> {
    let mut stmt = conn
        .prepare(&format!(
            "{SELECT_COLUMNS} WHERE user_id = ?1 ORDER BY created_at DESC, id DESC"
        ))
        .context("failed to prepare watchlist query")?;

    let rows = stmt
        .query_map([user_id.to_string()], map_entry)
        .context("failed to query watchlist")?;

    rows.collect::<std::result::Result<Vec<_>, _>>()
        .context("failed to read watchlist rows")
}

/// Counts the user's watchlist rows.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn count_entries(conn: &Connection, user_id: Uuid) -> Result<u64> {
    conn.query_row(
        "SELECT COUNT(*) FROM watchlists WHERE user_id = ?1",
        [user_id.to_string()],
        |row| row.get(0),
    )
    .context("failed to count watchlist rows")
}
