//! TMDB API client module.
//!
//! Read-only access to listings, details, credits, search, discovery,
//! and watch providers for movies, TV series, and people.

mod api;
mod client;
mod image;
mod params;
mod types;

#[allow(clippy::module_name_repetitions)]
pub use api::{LocalTmdbApi, TmdbApi};
#[allow(clippy::module_name_repetitions)]
pub use client::{TmdbClient, TmdbClientBuilder};
pub use image::{IMAGE_BASE_URL, ImageSize, PLACEHOLDER_IMAGE, image_url};
pub use params::{DiscoverParams, ListingCategory, SearchParams};
#[allow(clippy::module_name_repetitions)]
pub use types::{
    MediaType, TmdbAuthorDetails, TmdbCastMember, TmdbCountryProviders, TmdbCredits, TmdbDetails,
    TmdbGenre, TmdbGenreList, TmdbMediaResult, TmdbPage, TmdbPerson, TmdbPersonCredits,
    TmdbPersonDetails, TmdbProvider, TmdbReview, TmdbVideo, TmdbVideoList, TmdbWatchProviders,
};
