//! `AuthApi` and `UserDataApi` trait definitions.
#![allow(clippy::future_not_send)]

use uuid::Uuid;

use super::types::{
    MovieSnapshot, Profile, Rating, ReviewEntry, ReviewWithAuthor, Session, UserStats,
    WatchlistEntry,
};
use crate::error::ApiResult;

/// Auth service trait.
///
/// Implementations keep the current session; data calls made through the
/// same client are authorised with it.
#[allow(clippy::module_name_repetitions)]
#[trait_variant::make(AuthApi: Send)]
pub trait LocalAuthApi {
    /// Registers a new account with `username` in the user metadata.
    ///
    /// Returns `None` when the account awaits email confirmation.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Auth` if the service rejects the registration.
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        username: &str,
    ) -> ApiResult<Option<Session>>;

    /// Signs in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Auth` on invalid credentials.
    async fn sign_in(&self, email: &str, password: &str) -> ApiResult<Session>;

    /// Signs out and forgets the current session.
    ///
    /// # Errors
    ///
    /// Returns an error if the service rejects the logout.
    async fn sign_out(&self) -> ApiResult<()>;

    /// Returns the current session, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store cannot be read.
    async fn get_session(&self) -> ApiResult<Option<Session>>;
}

/// Watchlist, review, and profile storage trait.
///
/// Mutations only change durable state; callers re-query to observe them.
#[allow(clippy::module_name_repetitions)]
#[trait_variant::make(UserDataApi: Send)]
pub trait LocalUserDataApi {
    /// Adds a movie to the user's watchlist.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Conflict` if the movie is already listed.
    async fn add_to_watchlist(
        &self,
        user_id: Uuid,
        movie_id: u64,
        snapshot: &MovieSnapshot,
    ) -> ApiResult<WatchlistEntry>;

    /// Removes a movie from the user's watchlist. Absent rows are a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects the request.
    async fn remove_from_watchlist(&self, user_id: Uuid, movie_id: u64) -> ApiResult<()>;

    /// Returns whether the movie is on the user's watchlist.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects the request. Not-found is `false`.
    async fn is_in_watchlist(&self, user_id: Uuid, movie_id: u64) -> ApiResult<bool>;

    /// Lists the user's watchlist, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects the request.
    async fn list_watchlist(&self, user_id: Uuid) -> ApiResult<Vec<WatchlistEntry>>;

    /// Creates or replaces the user's review of a movie.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects the request.
    async fn upsert_review(
        &self,
        user_id: Uuid,
        movie_id: u64,
        rating: Rating,
        content: &str,
        snapshot: &MovieSnapshot,
    ) -> ApiResult<ReviewEntry>;

    /// Edits an existing review by ID.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Store` if no review has that ID.
    async fn update_review(
        &self,
        review_id: i64,
        rating: Rating,
        content: &str,
    ) -> ApiResult<ReviewEntry>;

    /// Returns the user's review of a movie.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects the request. Not-found is `None`.
    async fn get_user_review(&self, user_id: Uuid, movie_id: u64)
    -> ApiResult<Option<ReviewEntry>>;

    /// Deletes a review by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects the request.
    async fn delete_review(&self, review_id: i64) -> ApiResult<()>;

    /// Lists a movie's reviews, newest first, with author usernames.
    ///
    /// # Errors
    ///
    /// Returns an error if the reviews cannot be read. A failed username
    /// lookup is not an error.
    async fn list_reviews_for_movie(&self, movie_id: u64) -> ApiResult<Vec<ReviewWithAuthor>>;

    /// Lists the user's reviews, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects the request.
    async fn list_user_reviews(&self, user_id: Uuid) -> ApiResult<Vec<ReviewEntry>>;

    /// Returns the user's profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects the request. Not-found is `None`.
    async fn get_profile(&self, user_id: Uuid) -> ApiResult<Option<Profile>>;

    /// Sets the user's display name.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects the request.
    async fn update_username(&self, user_id: Uuid, username: &str) -> ApiResult<Profile>;

    /// Counts the user's watchlist entries and reviews.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects the request.
    async fn user_stats(&self, user_id: Uuid) -> ApiResult<UserStats>;
}
