//! `ApiError` - failure classes surfaced by the metadata and user-data clients.

/// Result alias used by every client operation.
#[allow(clippy::module_name_repetitions)]
pub type ApiResult<T> = Result<T, ApiError>;

/// Client-level errors.
///
/// Not-found is deliberately absent: membership checks and single-row
/// reads return `false` / `None` instead.
#[derive(Debug, thiserror::Error)]
#[allow(clippy::module_name_repetitions)]
pub enum ApiError {
    /// Metadata fetch failed (network, non-2xx, or malformed JSON).
    #[error("TMDB API error: {0}")]
    Provider(String),

    /// Sign-in, sign-up, or token rejected by the auth service.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Operation requires a signed-in user.
    #[error("no active session")]
    NoSession,

    /// Unique `(user_id, movie_id)` pair already exists.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Any other user-data store failure.
    #[error("user data store error: {0}")]
    Store(String),

    /// Argument rejected before any request was made.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl ApiError {
    /// Returns `true` for authentication and session failures.
    #[must_use]
    pub const fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_) | Self::NoSession)
    }

    /// Wraps a `reqwest` failure as a provider error with request context.
    pub(crate) fn provider(context: &str, err: &reqwest::Error) -> Self {
        Self::Provider(format!("{context}: {err}"))
    }

    /// Wraps a `reqwest` failure as a store error with request context.
    pub(crate) fn store(context: &str, err: &reqwest::Error) -> Self {
        Self::Store(format!("{context}: {err}"))
    }
}
