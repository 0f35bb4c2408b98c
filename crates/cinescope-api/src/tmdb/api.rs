//! `TmdbApi` trait definition.
#![allow(clippy::future_not_send)]

use super::params::{DiscoverParams, ListingCategory, SearchParams};
use super::types::{
    MediaType, TmdbCredits, TmdbDetails, TmdbGenreList, TmdbMediaResult, TmdbPage, TmdbPerson,
    TmdbPersonCredits, TmdbPersonDetails, TmdbReview, TmdbVideoList, TmdbWatchProviders,
};
use crate::error::ApiResult;

/// TMDB API trait.
///
/// Abstracts API operations for mock substitution in tests.
/// Uses `trait_variant::make` to generate a `Send`-bound async trait.
/// Every operation is a read-only GET; failures are `ApiError::Provider`.
#[allow(clippy::module_name_repetitions)]
#[trait_variant::make(TmdbApi: Send)]
pub trait LocalTmdbApi {
    /// Fetches one page of a curated listing (popular, top rated, trending...).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request or JSON parsing fails.
    async fn listing(
        &self,
        media: MediaType,
        category: ListingCategory,
        page: u32,
    ) -> ApiResult<TmdbPage<TmdbMediaResult>>;

    /// Fetches movie or TV details including genres.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request or JSON parsing fails.
    async fn details(&self, media: MediaType, id: u64) -> ApiResult<TmdbDetails>;

    /// Fetches the cast of a title.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request or JSON parsing fails.
    async fn credits(&self, media: MediaType, id: u64) -> ApiResult<TmdbCredits>;

    /// Fetches trailers and clips of a title.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request or JSON parsing fails.
    async fn videos(&self, media: MediaType, id: u64) -> ApiResult<TmdbVideoList>;

    /// Fetches provider-hosted reviews of a title.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request or JSON parsing fails.
    async fn provider_reviews(
        &self,
        media: MediaType,
        id: u64,
        page: u32,
    ) -> ApiResult<TmdbPage<TmdbReview>>;

    /// Fetches titles similar to the given one.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request or JSON parsing fails.
    async fn similar(&self, media: MediaType, id: u64) -> ApiResult<TmdbPage<TmdbMediaResult>>;

    /// Fetches the provider's native recommendations for a title.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request or JSON parsing fails.
    async fn recommendations(
        &self,
        media: MediaType,
        id: u64,
    ) -> ApiResult<TmdbPage<TmdbMediaResult>>;

    /// Fetches streaming/rent/buy providers per country.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request or JSON parsing fails.
    async fn watch_providers(&self, media: MediaType, id: u64) -> ApiResult<TmdbWatchProviders>;

    /// Discovers titles by genre and vote thresholds.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request or JSON parsing fails.
    async fn discover(
        &self,
        media: MediaType,
        params: &DiscoverParams,
    ) -> ApiResult<TmdbPage<TmdbMediaResult>>;

    /// Lists the official genres for a media type.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request or JSON parsing fails.
    async fn genres(&self, media: MediaType) -> ApiResult<TmdbGenreList>;

    /// Searches movies or TV series.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request or JSON parsing fails.
    async fn search(
        &self,
        media: MediaType,
        params: &SearchParams,
    ) -> ApiResult<TmdbPage<TmdbMediaResult>>;

    /// Searches people.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request or JSON parsing fails.
    async fn search_people(&self, params: &SearchParams) -> ApiResult<TmdbPage<TmdbPerson>>;

    /// Fetches one page of popular people.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request or JSON parsing fails.
    async fn popular_people(&self, page: u32) -> ApiResult<TmdbPage<TmdbPerson>>;

    /// Fetches person details.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request or JSON parsing fails.
    async fn person_details(&self, id: u64) -> ApiResult<TmdbPersonDetails>;

    /// Fetches the movies a person appeared in.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request or JSON parsing fails.
    async fn person_movie_credits(&self, id: u64) -> ApiResult<TmdbPersonCredits>;
}
