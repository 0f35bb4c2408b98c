//! `SqliteUserStore` - `LocalUserDataApi` over a local database.

use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use anyhow::Result;
use chrono::Utc;
use cinescope_api::supabase::{
    LocalUserDataApi, MovieSnapshot, Profile, Rating, ReviewEntry, ReviewWithAuthor, UserStats,
    WatchlistEntry,
};
use cinescope_api::{ApiError, ApiResult};
use rusqlite::Connection;
use uuid::Uuid;

use crate::columns::is_constraint_violation;
use crate::{profiles, reviews, watchlists};

/// Self-hosted user-data store.
///
/// Same collections and uniqueness rules as the hosted tables; the
/// connection is serialised behind a mutex.
#[derive(Debug)]
pub struct SqliteUserStore {
    conn: Mutex<Connection>,
}

/// Converts store plumbing errors to the client taxonomy.
fn to_api_error(err: &anyhow::Error) -> ApiError {
    if is_constraint_violation(err) {
        ApiError::Conflict(format!("{err:#}"))
    } else {
        ApiError::Store(format!("{err:#}"))
    }
}

impl SqliteUserStore {
    /// Wraps an already migrated connection.
    #[must_use]
    pub const fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Opens the store under `dir` (or the default data directory).
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open(dir: Option<&PathBuf>) -> Result<Self> {
        crate::open_db(dir).map(Self::new)
    }

    /// Opens an in-memory store.
    ///
    /// # Errors
    ///
    /// Returns an error if migrations fail.
    pub fn in_memory() -> Result<Self> {
        crate::open_memory_db().map(Self::new)
    }

    fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> ApiResult<T> {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        f(&conn).map_err(|e| to_api_error(&e))
    }
}

impl LocalUserDataApi for SqliteUserStore {
    async fn add_to_watchlist(
        &self,
        user_id: Uuid,
        movie_id: u64,
        snapshot: &MovieSnapshot,
    ) -> ApiResult<WatchlistEntry> {
        self.with_conn(|conn| watchlists::insert_entry(conn, user_id, movie_id, snapshot, Utc::now()))
    }

    async fn remove_from_watchlist(&self, user_id: Uuid, movie_id: u64) -> ApiResult<()> {
        self.with_conn(|conn| watchlists::delete_entry(conn, user_id, movie_id))
            .map(|_| ())
    }

    async fn is_in_watchlist(&self, user_id: Uuid, movie_id: u64) -> ApiResult<bool> {
        self.with_conn(|conn| watchlists::contains(conn, user_id, movie_id))
    }

    async fn list_watchlist(&self, user_id: Uuid) -> ApiResult<Vec<WatchlistEntry>> {
        self.with_conn(|conn| watchlists::load_entries(conn, user_id))
    }

    async fn upsert_review(
        &self,
        user_id: Uuid,
        movie_id: u64,
        rating: Rating,
        content: &str,
        snapshot: &MovieSnapshot,
    ) -> ApiResult<ReviewEntry> {
        self.with_conn(|conn| {
            reviews::upsert_review(conn, user_id, movie_id, rating, content, snapshot, Utc::now())
        })
    }

    async fn update_review(
        &self,
        review_id: i64,
        rating: Rating,
        content: &str,
    ) -> ApiResult<ReviewEntry> {
        self.with_conn(|conn| reviews::update_review(conn, review_id, rating, content, Utc::now()))
    }

    async fn get_user_review(
        &self,
        user_id: Uuid,
        movie_id: u64,
    ) -> ApiResult<Option<ReviewEntry>> {
        self.with_conn(|conn| reviews::load_user_review(conn, user_id, movie_id))
    }

    async fn delete_review(&self, review_id: i64) -> ApiResult<()> {
        self.with_conn(|conn| reviews::delete_review(conn, review_id))
            .map(|_| ())
    }

    async fn list_reviews_for_movie(&self, movie_id: u64) -> ApiResult<Vec<ReviewWithAuthor>> {
        self.with_conn(|conn| reviews::load_movie_reviews(conn, movie_id))
    }

    async fn list_user_reviews(&self, user_id: Uuid) -> ApiResult<Vec<ReviewEntry>> {
        self.with_conn(|conn| reviews::load_user_reviews(conn, user_id))
    }

    async fn get_profile(&self, user_id: Uuid) -> ApiResult<Option<Profile>> {
        self.with_conn(|conn| profiles::load_profile(conn, user_id))
    }

    async fn update_username(&self, user_id: Uuid, username: &str) -> ApiResult<Profile> {
        self.with_conn(|conn| profiles::save_username(conn, user_id, username))
    }

    async fn user_stats(&self, user_id: Uuid) -> ApiResult<UserStats> {
        self.with_conn(|conn| {
            Ok(UserStats {
                watchlist_count: watchlists::count_entries(conn, user_id)?,
                reviews_count: reviews::count_reviews(conn, user_id)?,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::indexing_slicing)]

    use super::*;

    fn snapshot() -> MovieSnapshot {
        MovieSnapshot {
            title: String::from("Fight Club"),
            poster_path: Some(String::from("/p.jpg")),
            vote_average: Some(8.4),
            release_date: Some(String::from("1999-10-15")),
        }
    }

    #[tokio::test]
    async fn test_add_then_is_in_then_remove() {
        // Arrange
        let store = SqliteUserStore::in_memory().unwrap();
        let user = Uuid::new_v4();

        // Act
        store.add_to_watchlist(user, 550, &snapshot()).await.unwrap();
        let listed = store.is_in_watchlist(user, 550).await.unwrap();
        store.remove_from_watchlist(user, 550).await.unwrap();
        let listed_after = store.is_in_watchlist(user, 550).await.unwrap();

        // Assert
        assert!(listed);
        assert!(!listed_after);
    }

    #[tokio::test]
    async fn test_duplicate_add_is_conflict() {
        // Arrange
        let store = SqliteUserStore::in_memory().unwrap();
        let user = Uuid::new_v4();
        store.add_to_watchlist(user, 550, &snapshot()).await.unwrap();

        // Act
        let err = store
            .add_to_watchlist(user, 550, &snapshot())
            .await
            .unwrap_err();

        // Assert
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_double_upsert_review_keeps_second_content() {
        // Arrange
        let store = SqliteUserStore::in_memory().unwrap();
        let user = Uuid::new_v4();
        let rating = Rating::new(7).unwrap();

        // Act
        store
            .upsert_review(user, 550, rating, "first", &snapshot())
            .await
            .unwrap();
        store
            .upsert_review(user, 550, rating, "second", &snapshot())
            .await
            .unwrap();

        // Assert
        let reviews = store.list_user_reviews(user).await.unwrap();
        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].content, "second");
    }

    #[tokio::test]
    async fn test_update_missing_review_is_store_error() {
        // Arrange
        let store = SqliteUserStore::in_memory().unwrap();

        // Act
        let err = store
            .update_review(42, Rating::new(3).unwrap(), "x")
            .await
            .unwrap_err();

        // Assert
        assert!(matches!(err, ApiError::Store(ref m) if m.contains("review 42 not found")));
    }

    #[tokio::test]
    async fn test_user_stats_counts_rows() {
        // Arrange
        let store = SqliteUserStore::in_memory().unwrap();
        let user = Uuid::new_v4();
        store.add_to_watchlist(user, 1, &snapshot()).await.unwrap();
        store.add_to_watchlist(user, 2, &snapshot()).await.unwrap();
        store
            .upsert_review(user, 1, Rating::new(9).unwrap(), "x", &snapshot())
            .await
            .unwrap();

        // Act
        let stats = store.user_stats(user).await.unwrap();

        // Assert
        assert_eq!(
            stats,
            UserStats {
                watchlist_count: 2,
                reviews_count: 1
            }
        );
    }

    #[tokio::test]
    async fn test_profile_roundtrip() {
        // Arrange
        let store = SqliteUserStore::in_memory().unwrap();
        let user = Uuid::new_v4();

        // Act
        let before = store.get_profile(user).await.unwrap();
        store.update_username(user, "cinephile").await.unwrap();
        let after = store.get_profile(user).await.unwrap().unwrap();

        // Assert
        assert!(before.is_none());
        assert_eq!(after.username.as_deref(), Some("cinephile"));
    }
}
