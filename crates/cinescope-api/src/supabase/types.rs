//! Hosted user-data record types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;

// --- Auth ---

/// Signed-in user as returned by the auth service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    /// User ID (primary key of `profiles`).
    pub id: Uuid,
    /// Email address.
    #[serde(default)]
    pub email: Option<String>,
    /// Free-form metadata supplied at sign-up (`username`).
    #[serde(default)]
    pub user_metadata: serde_json::Value,
}

impl AuthUser {
    /// Username from sign-up metadata, if any.
    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.user_metadata.get("username")?.as_str()
    }
}

/// An authenticated session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Bearer token for data requests.
    pub access_token: String,
    /// Token used to mint a new access token.
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Lifetime in seconds.
    #[serde(default)]
    pub expires_in: Option<u64>,
    /// Token type (always "bearer").
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Signed-in user.
    pub user: AuthUser,
}

fn default_token_type() -> String {
    String::from("bearer")
}

// --- Rows ---

/// A 1-10 star rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
    /// Lowest accepted rating.
    pub const MIN: u8 = 1;
    /// Highest accepted rating.
    pub const MAX: u8 = 10;

    /// Validates a rating.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidInput` when the value is outside 1..=10.
    pub fn new(value: u8) -> Result<Self, ApiError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ApiError::InvalidInput(format!(
                "rating must be between {} and {}, got {value}",
                Self::MIN,
                Self::MAX
            )))
        }
    }

    /// Raw value.
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Rating {
    type Error = ApiError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

/// Denormalised movie fields stored alongside watchlist and review rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MovieSnapshot {
    /// Title at the time of saving.
    pub title: String,
    /// Poster path.
    #[serde(default)]
    pub poster_path: Option<String>,
    /// Vote average.
    #[serde(default)]
    pub vote_average: Option<f64>,
    /// Release date (YYYY-MM-DD).
    #[serde(default)]
    pub release_date: Option<String>,
}

/// A `watchlists` row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchlistEntry {
    /// Row ID.
    pub id: i64,
    /// Owner.
    pub user_id: Uuid,
    /// TMDB movie ID.
    pub movie_id: u64,
    /// Title snapshot.
    #[serde(default)]
    pub title: String,
    /// Poster snapshot.
    #[serde(default)]
    pub poster_path: Option<String>,
    /// Vote average snapshot.
    #[serde(default)]
    pub vote_average: Option<f64>,
    /// Release date snapshot.
    #[serde(default)]
    pub release_date: Option<String>,
    /// Insertion time.
    pub created_at: DateTime<Utc>,
}

/// A `reviews` row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewEntry {
    /// Row ID.
    pub id: i64,
    /// Author.
    pub user_id: Uuid,
    /// TMDB movie ID.
    pub movie_id: u64,
    /// Rating.
    pub rating: Rating,
    /// Review text (`comment` column).
    #[serde(rename = "comment", default)]
    pub content: String,
    /// Title snapshot.
    #[serde(default)]
    pub movie_title: Option<String>,
    /// Poster snapshot.
    #[serde(default)]
    pub movie_poster: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last upsert time.
    pub updated_at: DateTime<Utc>,
}

/// A review joined with its author's username.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewWithAuthor {
    /// Stored review.
    pub review: ReviewEntry,
    /// Author username, `Anonymous` when unknown.
    pub username: String,
}

/// Username shown when a review author has no profile.
pub const ANONYMOUS: &str = "Anonymous";

/// A `profiles` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// User ID.
    pub id: Uuid,
    /// Display name.
    #[serde(default)]
    pub username: Option<String>,
    /// Avatar URL.
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// Row counts for a user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserStats {
    /// Watchlist rows.
    pub watchlist_count: u64,
    /// Review rows.
    pub reviews_count: u64,
}
