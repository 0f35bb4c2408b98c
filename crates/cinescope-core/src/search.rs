//! Scoped multi-type search.

use std::fmt;
use std::str::FromStr;

use cinescope_api::tmdb::{LocalTmdbApi, MediaType, SearchParams};
use cinescope_api::{ApiError, ApiResult};
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use crate::cancel::try_cancellable;
use crate::media::{ListItem, MediaItem, PersonItem, media_page, person_page};

/// Which result types a search covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchScope {
    /// Movies, TV and people.
    #[default]
    All,
    /// Movies and TV.
    Titles,
    /// People only.
    Celebs,
    /// Movies and TV, matched as free keywords.
    Keywords,
}

impl SearchScope {
    /// Whether movie and TV results are fetched.
    #[must_use]
    pub const fn includes_titles(self) -> bool {
        !matches!(self, Self::Celebs)
    }

    /// Whether people results are fetched.
    #[must_use]
    pub const fn includes_people(self) -> bool {
        matches!(self, Self::All | Self::Celebs)
    }
}

impl fmt::Display for SearchScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::All => "all",
            Self::Titles => "titles",
            Self::Celebs => "celebs",
            Self::Keywords => "keywords",
        })
    }
}

impl FromStr for SearchScope {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Self::All),
            "titles" => Ok(Self::Titles),
            "celebs" | "people" => Ok(Self::Celebs),
            "keywords" => Ok(Self::Keywords),
            other => Err(ApiError::InvalidInput(format!(
                "unknown search scope: {other}"
            ))),
        }
    }
}

/// Per-type search results, image-less entries already removed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResults {
    /// Matching movies.
    pub movies: Vec<MediaItem>,
    /// Matching TV series.
    pub tv: Vec<MediaItem>,
    /// Matching people.
    pub people: Vec<PersonItem>,
}

impl SearchResults {
    /// Combined count across all types.
    #[must_use]
    pub fn total(&self) -> usize {
        self.movies
            .len()
            .saturating_add(self.tv.len())
            .saturating_add(self.people.len())
    }
}

async fn search_titles(
    api: &impl LocalTmdbApi,
    media: MediaType,
    params: &SearchParams,
) -> ApiResult<Vec<MediaItem>> {
    let page = media_page(api.search(media, params).await?, media);
    Ok(page.items.into_iter().filter(ListItem::has_image).collect())
}

async fn search_people(
    api: &impl LocalTmdbApi,
    params: &SearchParams,
) -> ApiResult<Vec<PersonItem>> {
    let page = person_page(api.search_people(params).await?);
    Ok(page.items.into_iter().filter(ListItem::has_image).collect())
}

/// Searches the selected types in parallel.
///
/// A blank query returns empty results without any request. `Ok(None)`
/// when `token` fires before every type has answered.
///
/// # Errors
///
/// Any failing fetch fails the combined search.
#[instrument(skip(api, token))]
pub async fn search(
    api: &impl LocalTmdbApi,
    query: &str,
    scope: SearchScope,
    token: &CancellationToken,
) -> ApiResult<Option<SearchResults>> {
    let query = query.trim();
    if query.is_empty() {
        return Ok(Some(SearchResults::default()));
    }
    try_cancellable(token, search_scoped(api, &SearchParams::new(query), scope)).await
}

async fn search_scoped(
    api: &impl LocalTmdbApi,
    params: &SearchParams,
    scope: SearchScope,
) -> ApiResult<SearchResults> {

    let movies = async {
        if scope.includes_titles() {
            search_titles(api, MediaType::Movie, params).await
        } else {
            Ok(Vec::new())
        }
    };
    let tv = async {
        if scope.includes_titles() {
            search_titles(api, MediaType::Tv, params).await
        } else {
            Ok(Vec::new())
        }
    };
    let people = async {
        if scope.includes_people() {
            search_people(api, params).await
        } else {
            Ok(Vec::new())
        }
    };

    let (movies, tv, people) = tokio::try_join!(movies, tv, people)?;
    let results = SearchResults { movies, tv, people };
    tracing::debug!(total = results.total(), "search completed");
    Ok(results)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::test_support::{MockTmdb, cancel_mid_fetch, media, person};

    #[tokio::test]
    async fn test_celebs_scope_only_fetches_people() {
        // Arrange
        let api = MockTmdb {
            people_results: vec![person(1, "Keanu Reeves", true)],
            search_results: vec![media(603, "The Matrix", true)],
            ..MockTmdb::default()
        };

        // Act
        let results = search(&api, "keanu", SearchScope::Celebs, &CancellationToken::new())
            .await
            .unwrap()
            .unwrap();

        // Assert
        assert_eq!(MockTmdb::count(&api.people_calls), 1);
        assert_eq!(MockTmdb::count(&api.search_calls), 0);
        assert_eq!(results.people.len(), 1);
        assert!(results.movies.is_empty());
    }

    #[tokio::test]
    async fn test_all_scope_filters_image_less_items() {
        // Arrange
        let api = MockTmdb {
            people_results: vec![person(1, "A", true), person(2, "B", false)],
            search_results: vec![media(10, "X", true), media(11, "Y", false)],
            ..MockTmdb::default()
        };

        // Act
        let results = search(&api, "x", SearchScope::All, &CancellationToken::new())
            .await
            .unwrap()
            .unwrap();

        // Assert
        assert_eq!(MockTmdb::count(&api.search_calls), 2);
        assert_eq!(results.movies.len(), 1);
        assert_eq!(results.tv.len(), 1);
        assert_eq!(results.people.len(), 1);
        assert_eq!(results.total(), 3);
    }

    #[tokio::test]
    async fn test_blank_query_issues_no_fetch() {
        // Arrange
        let api = MockTmdb::default();

        // Act
        let results = search(&api, "   ", SearchScope::All, &CancellationToken::new())
            .await
            .unwrap()
            .unwrap();

        // Assert
        assert_eq!(results.total(), 0);
        assert_eq!(MockTmdb::count(&api.search_calls), 0);
        assert_eq!(MockTmdb::count(&api.people_calls), 0);
    }

    #[tokio::test]
    async fn test_search_cancelled_mid_fetch() {
        // Arrange
        let api = MockTmdb::stalled();
        let token = CancellationToken::new();

        // Act
        let (results, ()) = tokio::join!(
            search(&api, "keanu", SearchScope::All, &token),
            cancel_mid_fetch(&token)
        );

        // Assert
        assert!(results.unwrap().is_none());
        assert_eq!(MockTmdb::count(&api.search_calls), 2);
        assert_eq!(MockTmdb::count(&api.people_calls), 1);
    }

    #[test]
    fn test_scope_parse() {
        // Arrange & Act & Assert
        assert_eq!("keywords".parse::<SearchScope>().unwrap(), SearchScope::Keywords);
        assert!(SearchScope::Keywords.includes_titles());
        assert!(!SearchScope::Titles.includes_people());
        assert!("films".parse::<SearchScope>().is_err());
    }
}
