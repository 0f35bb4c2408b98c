//! Multi-page merges for ranked listings.

use std::future::Future;

use cinescope_api::ApiResult;
use cinescope_api::tmdb::{ListingCategory, LocalTmdbApi, MediaType};
use futures::future::try_join_all;
use tokio_util::sync::CancellationToken;

use crate::cancel::try_cancellable;
use crate::fetch::listing_page;
use crate::media::{MediaItem, PaginatedResult};

/// An item with its 1-based position in a merged list.
#[derive(Debug, Clone, PartialEq)]
pub struct Ranked<T> {
    /// Position, starting at 1.
    pub rank: usize,
    /// The item.
    pub item: T,
}

/// Fetches pages `1..=pages` concurrently, flattens them in page order and
/// truncates to `limit`.
///
/// # Errors
///
/// Any failing page fails the whole merge.
pub async fn merge_pages<T, F, Fut>(pages: u32, limit: usize, fetch: F) -> ApiResult<Vec<Ranked<T>>>
where
    F: Fn(u32) -> Fut,
    Fut: Future<Output = ApiResult<PaginatedResult<T>>>,
{
    let fetched = try_join_all((1..=pages).map(&fetch)).await?;
    let merged: Vec<Ranked<T>> = fetched
        .into_iter()
        .flat_map(|page| page.items)
        .take(limit)
        .enumerate()
        .map(|(idx, item)| Ranked {
            rank: idx.saturating_add(1),
            item,
        })
        .collect();

    tracing::debug!(pages, limit, merged = merged.len(), "pages merged");
    Ok(merged)
}

/// Which listing to merge and how far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergePreset {
    /// Movie or TV.
    pub media: MediaType,
    /// Source category.
    pub category: ListingCategory,
    /// Number of pages fetched.
    pub pages: u32,
    /// Maximum merged length.
    pub limit: usize,
}

impl MergePreset {
    /// Most popular movies.
    pub const FAN_FAVOURITES: Self = Self {
        media: MediaType::Movie,
        category: ListingCategory::Popular,
        pages: 5,
        limit: 100,
    };

    /// Top-rated TV series.
    pub const TOP_RATED_TV: Self = Self {
        media: MediaType::Tv,
        category: ListingCategory::TopRated,
        pages: 5,
        limit: 100,
    };

    /// Top-rated movies.
    pub const TOP_RATED_MOVIES: Self = Self {
        media: MediaType::Movie,
        category: ListingCategory::TopRated,
        pages: 1,
        limit: 100,
    };
}

/// Builds a ranked listing from a preset.
///
/// Ranks follow merge order only; items are not re-sorted and poster-less
/// entries keep their rank slot. `Ok(None)` when `token` fires before
/// every page arrives.
///
/// # Errors
///
/// Any failing page fails the listing.
pub async fn ranked_listing(
    api: &impl LocalTmdbApi,
    preset: MergePreset,
    token: &CancellationToken,
) -> ApiResult<Option<Vec<Ranked<MediaItem>>>> {
    let merged = merge_pages(preset.pages, preset.limit, |page| {
        listing_page(api, preset.media, preset.category, page)
    });
    try_cancellable(token, merged).await
}
