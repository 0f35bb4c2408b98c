//! Review CRUD operations.

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use cinescope_api::supabase::{ANONYMOUS, MovieSnapshot, Rating, ReviewEntry, ReviewWithAuthor};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::columns::{format_timestamp, timestamp_at, uuid_at};

const REVIEW_COLUMNS: &str =
    "r.id, r.user_id, r.movie_id, r.rating, r.comment, r.movie_title, r.movie_poster, r.created_at, r.updated_at";

fn map_review(row: &Row<'_>) -> rusqlite::Result<ReviewEntry> {
    let raw_rating: u8 = row.get(3)?;
    let rating = Rating::new(raw_rating)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Integer, Box::new(e)))?;
    Ok(ReviewEntry {
        id: row.get(0)?,
        user_id: uuid_at(row, 1)?,
        movie_id: row.get(2)?,
        rating,
        content: row.get(4)?,
        movie_title: row.get(5)?,
        movie_poster: row.get(6)?,
        created_at: timestamp_at(row, 7)?,
        updated_at: timestamp_at(row, 8)?,
    })
}

/// Inserts or replaces the user's review of a movie.
///
/// `created_at` is kept from the first insert; everything else is replaced.
///
/// # Errors
///
/// Returns an error if the upsert fails.
pub fn upsert_review(
    conn: &Connection,
    user_id: Uuid,
    movie_id: u64,
    rating: Rating,
    content: &str,
    snapshot: &MovieSnapshot,
    now: DateTime<Utc>,
) -> Result<ReviewEntry> {
    let tx = conn
        .unchecked_transaction()
        .context("failed to begin transaction")?;

    tx.execute(
        "INSERT INTO reviews (user_id, movie_id, rating, comment, movie_title, movie_poster, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
         ON CONFLICT (user_id, movie_id) DO UPDATE SET
            rating = excluded.rating,
            comment = excluded.comment,
            movie_title = excluded.movie_title,
            movie_poster = excluded.movie_poster,
            updated_at = excluded.updated_at",
        rusqlite::params![
            user_id.to_string(),
            movie_id,
            rating.get(),
            content,
            snapshot.title,
            snapshot.poster_path,
            format_timestamp(now),
        ],
    )
    .with_context(|| format!("failed to upsert review for movie {movie_id}"))?;

    let review = tx
        .query_row(
            &format!("SELECT {REVIEW_COLUMNS} FROM reviews r WHERE r.user_id = ?1 AND r.movie_id = ?2"),
            rusqlite::params![user_id.to_string(), movie_id],
            map_review,
        )
        .context("failed to read back review")?;

    tx.commit().context("failed to commit review")?;
    Ok(review)
}

/// Edits rating and content of a review by ID.
///
/// # Errors
///
/// Returns an error if the review does not exist or the update fails.
pub fn update_review(
    conn: &Connection,
    review_id: i64,
    rating: Rating,
    content: &str,
    now: DateTime<Utc>,
) -> Result<ReviewEntry> {
    let changed = conn
        .execute(
            "UPDATE reviews SET rating = ?1, comment = ?2, updated_at = ?3 WHERE id = ?4",
            rusqlite::params![rating.get(), content, format_timestamp(now), review_id],
        )
        .with_context(|| format!("failed to update review {review_id}"))?;
    if changed == 0 {
        bail!("review {review_id} not found");
    }

    conn.query_row(
        &format!("SELECT {REVIEW_COLUMNS} FROM reviews r WHERE r.id = ?1"),
        [review_id],
        map_review,
    )
    .with_context(|| format!("failed to read back review {review_id}"))
}

/// Loads the user's review of a movie.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn load_user_review(
    conn: &Connection,
    user_id: Uuid,
    movie_id: u64,
) -> Result<Option<ReviewEntry>> {
    conn.query_row(
        &format!("SELECT {REVIEW_COLUMNS} FROM reviews r WHERE r.user_id = ?1 AND r.movie_id = ?2"),
        rusqlite::params![user_id.to_string(), movie_id],
        map_review,
    )
    .optional()
    .context("failed to query user review")
}

/// Deletes a review by ID. Returns the number of rows removed.
///
/// # Errors
///
/// Returns an error if the delete fails.
pub fn delete_review(conn: &Connection, review_id: i64) -> Result<usize> {
    conn.execute("DELETE FROM reviews WHERE id = ?1", [review_id])
        .with_context(|| format!("failed to delete review {review_id}"))
}

/// Loads a movie's reviews, newest first, with author usernames.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn load_movie_reviews(conn: &Connection, movie_id: u64) -> Result<Vec<ReviewWithAuthor>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {REVIEW_COLUMNS}, p.username FROM reviews r
             LEFT JOIN profiles p ON p.id = r.user_id
             WHERE r.movie_id = ?1
             ORDER BY r.created_at DESC, r.id DESC"
        ))
        .context("failed to prepare movie reviews query")?;

    let rows = stmt
        .query_map([movie_id], |row| {
            let username: Option<String> = row.get(9)?;
            Ok(ReviewWithAuthor {
                review: map_review(row)?,
                username: username.unwrap_or_else(|| String::from(ANONYMOUS)),
            })
        })
        .context("failed to query movie reviews")?;

    rows.collect::<std::result::Result<Vec<_>, _>>()
        .context("failed to read movie review rows")
}

/// Loads the user's reviews, newest first.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn load_user_reviews(conn: &Connection, user_id: Uuid) -> Result<Vec<ReviewEntry>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews r
             WHERE r.user_id = ?1
             ORDER BY r.created_at DESC, r.id DESC"
        ))
        .context("failed to prepare user reviews query")?;

    let rows = stmt
        .query_map([user_id.to_string()], map_review)
        .context("failed to query user reviews")?;

    rows.collect::<std::result::Result<Vec<_>, _>>()
        .context("failed to read user review rows")
}

/// Counts the user's reviews.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn count_reviews(conn: &Connection, user_id: Uuid) -> Result<u64> {
    conn.query_row(
        "SELECT COUNT(*) FROM reviews WHERE user_id = ?1",
        [user_id.to_string()],
        |row| row.get(0),
    )
    .context("failed to count reviews")
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::indexing_slicing)]

    use chrono::TimeZone;

    use super::*;
    use crate::connection::open_memory_db;
    use crate::profiles::save_username;

    fn snapshot() -> MovieSnapshot {
        MovieSnapshot {
            title: String::from("Fight Club"),
            poster_path: Some(String::from("/p.jpg")),
            ..MovieSnapshot::default()
        }
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn rating(value: u8) -> Rating {
        Rating::new(value).unwrap()
    }

    #[test]
    fn test_double_upsert_keeps_one_row_with_second_content() {
        // Arrange
        let conn = open_memory_db().unwrap();
        let user = Uuid::new_v4();

        // Act
        let first = upsert_review(&conn, user, 550, rating(6), "First", &snapshot(), at(0)).unwrap();
        let second =
            upsert_review(&conn, user, 550, rating(9), "Second", &snapshot(), at(60)).unwrap();

        // Assert
        assert_eq!(first.id, second.id);
        assert_eq!(count_reviews(&conn, user).unwrap(), 1);
        let stored = load_user_review(&conn, user, 550).unwrap().unwrap();
        assert_eq!(stored.content, "Second");
        assert_eq!(stored.rating.get(), 9);
        assert_eq!(stored.created_at, at(0));
        assert_eq!(stored.updated_at, at(60));
    }

    #[test]
    fn test_load_user_review_missing_is_none() {
        // Arrange
        let conn = open_memory_db().unwrap();

        // Act
        let review = load_user_review(&conn, Uuid::new_v4(), 550).unwrap();

        // Assert
        assert!(review.is_none());
    }

    #[test]
    fn test_update_review_by_id() {
        // Arrange
        let conn = open_memory_db().unwrap();
        let user = Uuid::new_v4();
        let review = upsert_review(&conn, user, 13, rating(4), "Meh", &snapshot(), at(0)).unwrap();

        // Act
        let updated = update_review(&conn, review.id, rating(7), "Grew on me", at(5)).unwrap();

        // Assert
        assert_eq!(updated.content, "Grew on me");
        assert_eq!(updated.rating.get(), 7);
        assert!(update_review(&conn, 999, rating(7), "x", at(5)).is_err());
    }

    #[test]
    fn test_movie_reviews_join_usernames() {
        // Arrange
        let conn = open_memory_db().unwrap();
        let named = Uuid::new_v4();
        let unnamed = Uuid::new_v4();
        save_username(&conn, named, "cinephile").unwrap();
        upsert_review(&conn, named, 550, rating(8), "Loved it", &snapshot(), at(0)).unwrap();
        upsert_review(&conn, unnamed, 550, rating(5), "Fine", &snapshot(), at(10)).unwrap();
        upsert_review(&conn, named, 13, rating(3), "Other movie", &snapshot(), at(20)).unwrap();

        // Act
        let reviews = load_movie_reviews(&conn, 550).unwrap();

        // Assert
        assert_eq!(reviews.len(), 2);
        assert_eq!(reviews[0].username, ANONYMOUS);
        assert_eq!(reviews[0].review.content, "Fine");
        assert_eq!(reviews[1].username, "cinephile");
    }

    #[test]
    fn test_delete_review() {
        // Arrange
        let conn = open_memory_db().unwrap();
        let user = Uuid::new_v4();
        let review = upsert_review(&conn, user, 550, rating(8), "x", &snapshot(), at(0)).unwrap();

        // Act
        let removed = delete_review(&conn, review.id).unwrap();

        // Assert
        assert_eq!(removed, 1);
        assert!(load_user_reviews(&conn, user).unwrap().is_empty());
    }
}
