//! Recommendations for title detail views.
//!
//! Movies try a genre-affinity discover built from the signed-in user's
//! watchlist first, then the provider's own recommendations. Neither path
//! surfaces an error to the caller.

use std::collections::HashSet;

use cinescope_api::ApiResult;
use cinescope_api::supabase::LocalUserDataApi;
use cinescope_api::tmdb::{DiscoverParams, LocalTmdbApi, MediaType};
use futures::future::join_all;
use tokio_util::sync::CancellationToken;
use tracing::instrument;
use uuid::Uuid;

use crate::cancel::run_cancellable;
use crate::media::{MediaItem, media_page};

/// Most recent watchlist entries inspected for genres.
pub const WATCHLIST_SAMPLE: usize = 5;
/// Genres passed to discover.
pub const GENRE_LIMIT: usize = 3;
/// Minimum vote count for discovered titles.
pub const MIN_VOTE_COUNT: u32 = 100;
/// Minimum vote average for discovered titles.
pub const MIN_VOTE_AVERAGE: f64 = 6.5;
/// Maximum recommendations shown.
pub const RECOMMENDATION_LIMIT: usize = 12;

/// Where a recommendation list came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecommendationSource {
    /// Discover query over the user's favourite genres.
    GenreAffinity {
        /// Genre IDs used, in first-seen order.
        genres: Vec<u32>,
    },
    /// Provider's per-title recommendations.
    Provider,
    /// Every source failed; the list is empty.
    Unavailable,
}

/// Recommendations plus their provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationSet {
    /// At most [`RECOMMENDATION_LIMIT`] titles.
    pub items: Vec<MediaItem>,
    /// Which path produced `items`.
    pub source: RecommendationSource,
}

impl RecommendationSet {
    const fn unavailable() -> Self {
        Self {
            items: Vec::new(),
            source: RecommendationSource::Unavailable,
        }
    }
}

/// Collects up to [`GENRE_LIMIT`] genre IDs from the given titles.
///
/// Detail fetches run concurrently and fail independently; failures are
/// logged and skipped.
async fn collect_genres(tmdb: &impl LocalTmdbApi, movie_ids: &[u64]) -> Vec<u32> {
    let details = join_all(
        movie_ids
            .iter()
            .map(|&id| async move { (id, tmdb.details(MediaType::Movie, id).await) }),
    )
    .await;

    let mut genres = Vec::new();
    for (id, result) in details {
        match result {
            Ok(detail) => {
                for genre in detail.genres {
                    if !genres.contains(&genre.id) {
                        genres.push(genre.id);
                    }
                }
            }
            Err(e) => {
                tracing::warn!(movie_id = id, error = %e, "skipping watchlist title");
            }
        }
    }
    genres.truncate(GENRE_LIMIT);
    genres
}

async fn genre_affinity(
    tmdb: &impl LocalTmdbApi,
    store: &impl LocalUserDataApi,
    user_id: Uuid,
    movie_id: u64,
) -> ApiResult<Option<RecommendationSet>> {
    let watchlist = store.list_watchlist(user_id).await?;
    if watchlist.is_empty() {
        return Ok(None);
    }

    let sample: Vec<u64> = watchlist
        .iter()
        .take(WATCHLIST_SAMPLE)
        .map(|entry| entry.movie_id)
        .collect();
    let genres = collect_genres(tmdb, &sample).await;
    if genres.is_empty() {
        return Ok(None);
    }

    let params = DiscoverParams::default()
        .with_genres(&genres)
        .min_vote_count(MIN_VOTE_COUNT)
        .min_vote_average(MIN_VOTE_AVERAGE);
    let page = media_page(tmdb.discover(MediaType::Movie, &params).await?, MediaType::Movie);

    let mut excluded: HashSet<u64> = watchlist.iter().map(|entry| entry.movie_id).collect();
    excluded.insert(movie_id);
    let items: Vec<MediaItem> = page
        .items
        .into_iter()
        .filter(|item| !excluded.contains(&item.id))
        .take(RECOMMENDATION_LIMIT)
        .collect();

    if items.is_empty() {
        return Ok(None);
    }
    Ok(Some(RecommendationSet {
        items,
        source: RecommendationSource::GenreAffinity { genres },
    }))
}

/// The provider's own recommendations, truncated; `Unavailable` on failure.
///
/// Used directly for guests and TV, and as the fallback for movies.
/// `None` when `token` fires first.
pub async fn provider_recommendations(
    tmdb: &impl LocalTmdbApi,
    media: MediaType,
    id: u64,
    token: &CancellationToken,
) -> Option<RecommendationSet> {
    run_cancellable(token, provider_set(tmdb, media, id)).await
}

async fn provider_set(tmdb: &impl LocalTmdbApi, media: MediaType, id: u64) -> RecommendationSet {
    match tmdb.recommendations(media, id).await {
        Ok(page) => {
            let mut items = media_page(page, media).items;
            items.truncate(RECOMMENDATION_LIMIT);
            RecommendationSet {
                items,
                source: RecommendationSource::Provider,
            }
        }
        Err(e) => {
            tracing::warn!(%media, id, error = %e, "provider recommendations unavailable");
            RecommendationSet::unavailable()
        }
    }
}

/// Recommendations for a movie detail view; `None` when `token` fires
/// before either path settles.
#[instrument(skip(tmdb, store, token))]
pub async fn recommend_movies(
    tmdb: &impl LocalTmdbApi,
    store: &impl LocalUserDataApi,
    user_id: Option<Uuid>,
    movie_id: u64,
    token: &CancellationToken,
) -> Option<RecommendationSet> {
    run_cancellable(token, movie_set(tmdb, store, user_id, movie_id)).await
}

async fn movie_set(
    tmdb: &impl LocalTmdbApi,
    store: &impl LocalUserDataApi,
    user_id: Option<Uuid>,
    movie_id: u64,
) -> RecommendationSet {
    if let Some(user_id) = user_id {
        match genre_affinity(tmdb, store, user_id, movie_id).await {
            Ok(Some(set)) => {
                tracing::debug!(count = set.items.len(), "genre-affinity recommendations");
                return set;
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(error = %e, "genre-affinity recommendations failed");
            }
        }
    }
    provider_set(tmdb, MediaType::Movie, movie_id).await
}

/// Recommendations for a TV detail view.
pub async fn recommend_tv(
    tmdb: &impl LocalTmdbApi,
    series_id: u64,
    token: &CancellationToken,
) -> Option<RecommendationSet> {
    provider_recommendations(tmdb, MediaType::Tv, series_id, token).await
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use cinescope_api::supabase::MovieSnapshot;
    use cinescope_db::SqliteUserStore;

    use super::*;
    use crate::test_support::{MockTmdb, cancel_mid_fetch, media};

    async fn store_with(user: Uuid, movies: &[u64]) -> SqliteUserStore {
        let store = SqliteUserStore::in_memory().unwrap();
        for &id in movies {
            let snapshot = MovieSnapshot {
                title: format!("Movie {id}"),
                ..MovieSnapshot::default()
            };
            store.add_to_watchlist(user, id, &snapshot).await.unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_empty_watchlist_uses_provider_without_discover() {
        // Arrange
        let user = Uuid::new_v4();
        let store = store_with(user, &[]).await;
        let tmdb = MockTmdb {
            recommendation_results: vec![media(1, "A", true), media(2, "B", true)],
            ..MockTmdb::default()
        };

        // Act
        let set = recommend_movies(&tmdb, &store, Some(user), 550, &CancellationToken::new())
            .await
            .unwrap();

        // Assert
        assert_eq!(set.source, RecommendationSource::Provider);
        assert_eq!(set.items.len(), 2);
        assert_eq!(MockTmdb::count(&tmdb.discover_calls), 0);
    }

    #[tokio::test]
    async fn test_genre_affinity_excludes_current_and_watchlist() {
        // Arrange
        let user = Uuid::new_v4();
        let store = store_with(user, &[10, 20]).await;
        let tmdb = MockTmdb {
            detail_genres: [(10, vec![18, 28]), (20, vec![28, 35, 53])].into(),
            discover_results: vec![
                media(10, "In watchlist", true),
                media(550, "Current", true),
                media(99, "Fresh", true),
            ],
            ..MockTmdb::default()
        };

        // Act
        let set = recommend_movies(&tmdb, &store, Some(user), 550, &CancellationToken::new())
            .await
            .unwrap();

        // Assert
        let ids: Vec<u64> = set.items.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![99]);
        assert_eq!(
            set.source,
            RecommendationSource::GenreAffinity {
                genres: vec![28, 35, 53]
            }
        );
        assert_eq!(MockTmdb::count(&tmdb.recommendation_calls), 0);
    }

    #[tokio::test]
    async fn test_all_detail_failures_fall_back_to_provider() {
        // Arrange
        let user = Uuid::new_v4();
        let store = store_with(user, &[1, 2, 3]).await;
        let tmdb = MockTmdb {
            failing_details: [1, 2, 3].into(),
            recommendation_results: vec![media(7, "Rec", true)],
            ..MockTmdb::default()
        };

        // Act
        let set = recommend_movies(&tmdb, &store, Some(user), 550, &CancellationToken::new())
            .await
            .unwrap();

        // Assert
        assert_eq!(set.source, RecommendationSource::Provider);
        assert_eq!(MockTmdb::count(&tmdb.details_calls), 3);
        assert_eq!(MockTmdb::count(&tmdb.discover_calls), 0);
    }

    #[tokio::test]
    async fn test_only_recent_sample_is_inspected() {
        // Arrange
        let user = Uuid::new_v4();
        let store = store_with(user, &[1, 2, 3, 4, 5, 6, 7]).await;
        let tmdb = MockTmdb::default();

        // Act
        recommend_movies(&tmdb, &store, Some(user), 550, &CancellationToken::new())
            .await
            .unwrap();

        // Assert
        assert_eq!(
            MockTmdb::count(&tmdb.details_calls),
            u32::try_from(WATCHLIST_SAMPLE).unwrap()
        );
    }

    #[tokio::test]
    async fn test_every_source_failing_is_unavailable() {
        // Arrange
        let user = Uuid::new_v4();
        let store = store_with(user, &[1]).await;
        let tmdb = MockTmdb {
            detail_genres: [(1, vec![18])].into(),
            fail_discover: true,
            fail_recommendations: true,
            ..MockTmdb::default()
        };

        // Act
        let set = recommend_movies(&tmdb, &store, Some(user), 550, &CancellationToken::new())
            .await
            .unwrap();

        // Assert
        assert_eq!(set.source, RecommendationSource::Unavailable);
        assert!(set.items.is_empty());
    }

    #[tokio::test]
    async fn test_tv_truncates_provider_results() {
        // Arrange
        let tmdb = MockTmdb {
            recommendation_results: (1..=20).map(|i| media(i, "T", true)).collect(),
            ..MockTmdb::default()
        };

        // Act
        let set = recommend_tv(&tmdb, 1399, &CancellationToken::new())
            .await
            .unwrap();

        // Assert
        assert_eq!(set.items.len(), RECOMMENDATION_LIMIT);
    }

    #[tokio::test]
    async fn test_movie_recommendations_cancelled_mid_fetch() {
        // Arrange
        let user = Uuid::new_v4();
        let store = store_with(user, &[1]).await;
        let tmdb = MockTmdb::stalled();
        let token = CancellationToken::new();

        // Act
        let (set, ()) = tokio::join!(
            recommend_movies(&tmdb, &store, Some(user), 550, &token),
            cancel_mid_fetch(&token)
        );

        // Assert
        assert!(set.is_none());
        assert_eq!(MockTmdb::count(&tmdb.recommendation_calls), 0);
    }

    #[tokio::test]
    async fn test_tv_recommendations_cancelled_mid_fetch() {
        // Arrange
        let tmdb = MockTmdb::stalled();
        let token = CancellationToken::new();

        // Act
        let (set, ()) = tokio::join!(recommend_tv(&tmdb, 1399, &token), cancel_mid_fetch(&token));

        // Assert
        assert!(set.is_none());
        assert_eq!(MockTmdb::count(&tmdb.recommendation_calls), 1);
    }
}
