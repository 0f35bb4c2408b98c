//! In-memory `LocalTmdbApi` for engine tests.
#![allow(clippy::future_not_send)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use cinescope_api::tmdb::{
    DiscoverParams, ListingCategory, LocalTmdbApi, MediaType, SearchParams, TmdbCredits,
    TmdbDetails, TmdbGenre, TmdbGenreList, TmdbMediaResult, TmdbPage, TmdbPerson,
    TmdbPersonCredits, TmdbPersonDetails, TmdbReview, TmdbVideoList, TmdbWatchProviders,
};
use cinescope_api::{ApiError, ApiResult};
use tokio_util::sync::CancellationToken;

/// Builds a movie result.
pub fn media(id: u64, title: &str, poster: bool) -> TmdbMediaResult {
    TmdbMediaResult {
        id,
        title: Some(title.to_owned()),
        poster_path: poster.then(|| format!("/poster{id}.jpg")),
        backdrop_path: Some(format!("/backdrop{id}.jpg")),
        vote_average: 7.5,
        popularity: 10.0,
        ..TmdbMediaResult::default()
    }
}

/// Builds a person.
pub fn person(id: u64, name: &str, photo: bool) -> TmdbPerson {
    TmdbPerson {
        id,
        name: name.to_owned(),
        profile_path: photo.then(|| format!("/face{id}.jpg")),
        popularity: 5.0,
        known_for_department: Some(String::from("Acting")),
    }
}

/// Wraps results in a provider page.
pub fn tmdb_page<T>(page: u32, total_pages: u32, results: Vec<T>) -> TmdbPage<T> {
    let total_results = u32::try_from(results.len()).unwrap_or(u32::MAX);
    TmdbPage {
        page,
        results,
        total_pages,
        total_results,
    }
}

fn offline(what: &str) -> ApiError {
    ApiError::Provider(format!("{what}: connection refused"))
}

/// Scripted provider with per-operation call counters.
#[derive(Debug, Default)]
pub struct MockTmdb {
    /// Listing pages served in order; missing pages come back empty.
    pub listing_pages: Vec<Vec<TmdbMediaResult>>,
    /// `total_pages` reported by every listing page.
    pub listing_total_pages: u32,
    /// Genre IDs returned by `details`, keyed by title ID.
    pub detail_genres: HashMap<u64, Vec<u32>>,
    /// Title IDs whose `details` fail.
    pub failing_details: HashSet<u64>,
    /// Results of every successful `discover`.
    pub discover_results: Vec<TmdbMediaResult>,
    /// Genre IDs whose `discover` fails.
    pub failing_genres: HashSet<u32>,
    /// Makes every `discover` fail.
    pub fail_discover: bool,
    /// Results of `recommendations` and `similar`.
    pub recommendation_results: Vec<TmdbMediaResult>,
    /// Makes `recommendations` fail.
    pub fail_recommendations: bool,
    /// Results of title searches.
    pub search_results: Vec<TmdbMediaResult>,
    /// Results of people searches and the popular-people listing.
    pub people_results: Vec<TmdbPerson>,
    /// Filmography served by `person_movie_credits`.
    pub person_credits: Vec<TmdbMediaResult>,
    /// Availability served by `watch_providers`.
    pub providers: TmdbWatchProviders,
    /// Reviews served by `provider_reviews`.
    pub reviews: Vec<TmdbReview>,
    /// Delay before every response.
    pub stall: Option<Duration>,
    /// Number of `listing` calls.
    pub listing_calls: AtomicU32,
    /// Number of `details` calls.
    pub details_calls: AtomicU32,
    /// Number of `discover` calls.
    pub discover_calls: AtomicU32,
    /// Number of `recommendations` calls.
    pub recommendation_calls: AtomicU32,
    /// Number of title `search` calls.
    pub search_calls: AtomicU32,
    /// Number of `search_people` calls.
    pub people_calls: AtomicU32,
}

impl MockTmdb {
    /// A provider that takes five seconds to answer anything.
    pub fn stalled() -> Self {
        Self {
            stall: Some(Duration::from_secs(5)),
            ..Self::default()
        }
    }

    /// Reads a counter.
    pub fn count(counter: &AtomicU32) -> u32 {
        counter.load(Ordering::SeqCst)
    }

    async fn pause(&self) {
        if let Some(delay) = self.stall {
            tokio::time::sleep(delay).await;
        }
    }
}

/// Fires `token` once the fetches it guards are in flight.
pub async fn cancel_mid_fetch(token: &CancellationToken) {
    tokio::time::sleep(Duration::from_millis(10)).await;
    token.cancel();
}

impl LocalTmdbApi for MockTmdb {
    async fn listing(
        &self,
        _media: MediaType,
        _category: ListingCategory,
        page: u32,
    ) -> ApiResult<TmdbPage<TmdbMediaResult>> {
        self.listing_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        let index = usize::try_from(page.saturating_sub(1)).unwrap_or(usize::MAX);
        let results = self.listing_pages.get(index).cloned().unwrap_or_default();
        Ok(tmdb_page(page, self.listing_total_pages, results))
    }

    async fn details(&self, _media: MediaType, id: u64) -> ApiResult<TmdbDetails> {
        self.details_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if self.failing_details.contains(&id) {
            return Err(offline("details"));
        }
        let genres = self
            .detail_genres
            .get(&id)
            .map(|ids| {
                ids.iter()
                    .map(|&genre_id| TmdbGenre {
                        id: genre_id,
                        name: format!("Genre {genre_id}"),
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(TmdbDetails {
            id,
            title: Some(format!("Title {id}")),
            poster_path: Some(format!("/poster{id}.jpg")),
            vote_average: 7.0,
            release_date: Some(String::from("2001-01-01")),
            genres,
            ..TmdbDetails::default()
        })
    }

    async fn credits(&self, _media: MediaType, _id: u64) -> ApiResult<TmdbCredits> {
        self.pause().await;
        Ok(TmdbCredits::default())
    }

    async fn videos(&self, _media: MediaType, _id: u64) -> ApiResult<TmdbVideoList> {
        self.pause().await;
        Ok(TmdbVideoList::default())
    }

    async fn provider_reviews(
        &self,
        _media: MediaType,
        _id: u64,
        page: u32,
    ) -> ApiResult<TmdbPage<TmdbReview>> {
        self.pause().await;
        Ok(tmdb_page(page, 1, self.reviews.clone()))
    }

    async fn similar(&self, _media: MediaType, _id: u64) -> ApiResult<TmdbPage<TmdbMediaResult>> {
        self.pause().await;
        Ok(tmdb_page(1, 1, self.recommendation_results.clone()))
    }

    async fn recommendations(
        &self,
        _media: MediaType,
        _id: u64,
    ) -> ApiResult<TmdbPage<TmdbMediaResult>> {
        self.recommendation_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if self.fail_recommendations {
            return Err(offline("recommendations"));
        }
        Ok(tmdb_page(1, 1, self.recommendation_results.clone()))
    }

    async fn watch_providers(&self, _media: MediaType, _id: u64) -> ApiResult<TmdbWatchProviders> {
        self.pause().await;
        Ok(self.providers.clone())
    }

    async fn discover(
        &self,
        _media: MediaType,
        params: &DiscoverParams,
    ) -> ApiResult<TmdbPage<TmdbMediaResult>> {
        self.discover_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if self.fail_discover
            || params
                .with_genres
                .iter()
                .any(|g| self.failing_genres.contains(g))
        {
            return Err(offline("discover"));
        }
        Ok(tmdb_page(params.page, 1, self.discover_results.clone()))
    }

    async fn genres(&self, _media: MediaType) -> ApiResult<TmdbGenreList> {
        self.pause().await;
        Ok(TmdbGenreList { genres: Vec::new() })
    }

    async fn search(
        &self,
        _media: MediaType,
        params: &SearchParams,
    ) -> ApiResult<TmdbPage<TmdbMediaResult>> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        Ok(tmdb_page(params.page, 1, self.search_results.clone()))
    }

    async fn search_people(&self, params: &SearchParams) -> ApiResult<TmdbPage<TmdbPerson>> {
        self.people_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        Ok(tmdb_page(params.page, 1, self.people_results.clone()))
    }

    async fn popular_people(&self, page: u32) -> ApiResult<TmdbPage<TmdbPerson>> {
        self.pause().await;
        Ok(tmdb_page(page, 1, self.people_results.clone()))
    }

    async fn person_details(&self, id: u64) -> ApiResult<TmdbPersonDetails> {
        self.pause().await;
        Ok(TmdbPersonDetails {
            id,
            name: format!("Person {id}"),
            ..TmdbPersonDetails::default()
        })
    }

    async fn person_movie_credits(&self, _id: u64) -> ApiResult<TmdbPersonCredits> {
        self.pause().await;
        Ok(TmdbPersonCredits {
            cast: self.person_credits.clone(),
        })
    }
}
