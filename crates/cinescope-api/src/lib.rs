//! API client library for cinescope.
//!
//! Provides clients for the TMDB metadata API and the hosted
//! user-data store (Supabase auth + `PostgREST` tables).

/// Error taxonomy shared by all clients.
pub mod error;

/// Hosted user-data store client.
pub mod supabase;

/// TMDB API client.
pub mod tmdb;

pub use error::{ApiError, ApiResult};
