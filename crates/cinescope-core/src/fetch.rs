//! Page fetchers that feed a [`Listing`](crate::listing::Listing).

use cinescope_api::ApiResult;
use cinescope_api::tmdb::{
    DiscoverParams, ListingCategory, LocalTmdbApi, MediaType, SearchParams,
};

use crate::media::{MediaItem, PaginatedResult, PersonItem, media_page, person_page};

/// Fetches one page of a named category listing.
///
/// # Errors
///
/// Returns the provider error unchanged.
pub async fn listing_page(
    api: &impl LocalTmdbApi,
    media: MediaType,
    category: ListingCategory,
    page: u32,
) -> ApiResult<PaginatedResult<MediaItem>> {
    let raw = api.listing(media, category, page).await?;
    Ok(media_page(raw, media))
}

/// Fetches one page of titles in a single genre, most popular first.
///
/// # Errors
///
/// Returns the provider error unchanged.
pub async fn genre_page(
    api: &impl LocalTmdbApi,
    media: MediaType,
    genre_id: u32,
    page: u32,
) -> ApiResult<PaginatedResult<MediaItem>> {
    let params = DiscoverParams::genre(genre_id).page(page);
    let raw = api.discover(media, &params).await?;
    Ok(media_page(raw, media))
}

/// Fetches one page of popular people.
///
/// # Errors
///
/// Returns the provider error unchanged.
pub async fn people_page(
    api: &impl LocalTmdbApi,
    page: u32,
) -> ApiResult<PaginatedResult<PersonItem>> {
    let raw = api.popular_people(page).await?;
    Ok(person_page(raw))
}

/// Fetches one page of title search results.
///
/// # Errors
///
/// Returns the provider error unchanged.
pub async fn search_page(
    api: &impl LocalTmdbApi,
    media: MediaType,
    query: &str,
    page: u32,
) -> ApiResult<PaginatedResult<MediaItem>> {
    let raw = api.search(media, &SearchParams::new(query).page(page)).await?;
    Ok(media_page(raw, media))
}
