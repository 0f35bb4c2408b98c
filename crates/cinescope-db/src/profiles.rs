//! Profile CRUD operations.

use anyhow::{Context, Result};
use cinescope_api::supabase::Profile;
use rusqlite::{Connection, OptionalExtension};
use uuid::Uuid;

use crate::columns::uuid_at;

/// Loads a profile by user ID.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn load_profile(conn: &Connection, user_id: Uuid) -> Result<Option<Profile>> {
    conn.query_row(
        "SELECT id, username, avatar_url FROM profiles WHERE id = ?1",
        [user_id.to_string()],
        |row| {
            Ok(Profile {
                id: uuid_at(row, 0)?,
                username: row.get(1)?,
                avatar_url: row.get(2)?,
            })
        },
    )
    .optional()
    .context("failed to query profile")
}

/// Sets the username, creating the profile row if needed.
///
/// # Errors
///
/// Returns an error if the upsert fails.
pub fn save_username(conn: &Connection, user_id: Uuid, username: &str) -> Result<Profile> {
    conn.execute(
        "INSERT INTO profiles (id, username) VALUES (?1, ?2)
         ON CONFLICT (id) DO UPDATE SET username = excluded.username",
        rusqlite::params![user_id.to_string(), username],
    )
    .context("failed to save username")?;

    load_profile(conn, user_id)?.context("profile missing after upsert")
}
