//! TMDB request parameters.

use std::fmt;
use std::str::FromStr;

use super::types::MediaType;
use crate::error::ApiError;

/// Curated listing endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListingCategory {
    /// Weekly trending titles.
    Trending,
    /// Popular titles.
    Popular,
    /// Top rated titles.
    TopRated,
    /// Upcoming movies / TV on the air.
    Upcoming,
    /// Movies now playing / TV airing today.
    NowPlaying,
}

impl ListingCategory {
    /// Endpoint path for the given media type.
    #[must_use]
    pub const fn path(self, media: MediaType) -> &'static str {
        match (self, media) {
            (Self::Trending, MediaType::Movie) => "trending/movie/week",
            (Self::Trending, MediaType::Tv) => "trending/tv/week",
            (Self::Popular, MediaType::Movie) => "movie/popular",
            (Self::Popular, MediaType::Tv) => "tv/popular",
            (Self::TopRated, MediaType::Movie) => "movie/top_rated",
            (Self::TopRated, MediaType::Tv) => "tv/top_rated",
            (Self::Upcoming, MediaType::Movie) => "movie/upcoming",
            (Self::Upcoming, MediaType::Tv) => "tv/on_the_air",
            (Self::NowPlaying, MediaType::Movie) => "movie/now_playing",
            (Self::NowPlaying, MediaType::Tv) => "tv/airing_today",
        }
    }
}

impl fmt::Display for ListingCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Trending => "trending",
            Self::Popular => "popular",
            Self::TopRated => "top-rated",
            Self::Upcoming => "upcoming",
            Self::NowPlaying => "now-playing",
        };
        f.write_str(name)
    }
}

impl FromStr for ListingCategory {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "trending" => Ok(Self::Trending),
            "popular" => Ok(Self::Popular),
            "top-rated" | "top_rated" => Ok(Self::TopRated),
            "upcoming" | "on-the-air" => Ok(Self::Upcoming),
            "now-playing" | "now_playing" | "airing-today" => Ok(Self::NowPlaying),
            other => Err(ApiError::InvalidInput(format!(
                "unknown listing category: {other}"
            ))),
        }
    }
}

/// Parameters for `discover/{media}`.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoverParams {
    /// Genre filter (joined with `,` = AND).
    pub with_genres: Vec<u32>,
    /// Sort order (default: "popularity.desc").
    pub sort_by: String,
    /// `vote_count.gte` filter.
    pub min_vote_count: Option<u32>,
    /// `vote_average.gte` filter.
    pub min_vote_average: Option<f64>,
    /// Result page (default: 1).
    pub page: u32,
}

impl Default for DiscoverParams {
    fn default() -> Self {
        Self {
            with_genres: Vec::new(),
            sort_by: String::from("popularity.desc"),
            min_vote_count: None,
            min_vote_average: None,
            page: 1,
        }
    }
}

impl DiscoverParams {
    /// Discover titles in a single genre.
    #[must_use]
    pub fn genre(genre_id: u32) -> Self {
        Self {
            with_genres: vec![genre_id],
            ..Self::default()
        }
    }

    /// Replaces the genre filter.
    #[must_use]
    pub fn with_genres(mut self, genres: &[u32]) -> Self {
        self.with_genres = genres.to_vec();
        self
    }

    /// Sets the minimum vote count.
    #[must_use]
    pub const fn min_vote_count(mut self, count: u32) -> Self {
        self.min_vote_count = Some(count);
        self
    }

    /// Sets the minimum vote average.
    #[must_use]
    pub const fn min_vote_average(mut self, average: f64) -> Self {
        self.min_vote_average = Some(average);
        self
    }

    /// Sets the result page.
    #[must_use]
    pub const fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    /// Builds the query string pairs.
    pub(crate) fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query: Vec<(&'static str, String)> = vec![
            ("sort_by", self.sort_by.clone()),
            ("page", self.page.to_string()),
        ];
        if !self.with_genres.is_empty() {
            let genres: Vec<String> = self.with_genres.iter().map(ToString::to_string).collect();
            query.push(("with_genres", genres.join(",")));
        }
        if let Some(count) = self.min_vote_count {
            query.push(("vote_count.gte", count.to_string()));
        }
        if let Some(average) = self.min_vote_average {
            query.push(("vote_average.gte", average.to_string()));
        }
        query
    }
}

/// Parameters for `search/{movie,tv,person}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchParams {
    /// Search query (required).
    pub query: String,
    /// Result page (1-500, default: 1).
    pub page: u32,
    /// Include adult content.
    pub include_adult: bool,
}

impl SearchParams {
    /// Creates new search params with the given query.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            page: 1,
            include_adult: false,
        }
    }

    /// Sets the result page.
    #[must_use]
    pub const fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    /// Builds the query string pairs.
    pub(crate) fn to_query(&self) -> Vec<(&'static str, String)> {
        vec![
            ("query", self.query.clone()),
            ("page", self.page.to_string()),
            ("include_adult", self.include_adult.to_string()),
        ]
    }
}
