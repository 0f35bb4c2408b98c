//! Hosted user-data client module.
//!
//! Email/password auth against the auth service and watchlist, review,
//! and profile rows in the `PostgREST` tables.

mod api;
mod client;
mod types;

#[allow(clippy::module_name_repetitions)]
pub use api::{AuthApi, LocalAuthApi, LocalUserDataApi, UserDataApi};
#[allow(clippy::module_name_repetitions)]
pub use client::{SupabaseClient, SupabaseClientBuilder};
pub use types::{
    ANONYMOUS, AuthUser, MovieSnapshot, Profile, Rating, ReviewEntry, ReviewWithAuthor, Session,
    UserStats, WatchlistEntry,
};
