//! TMDB API response types.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::ApiError;

// --- Media type ---

/// Kind of title a request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MediaType {
    /// Feature film.
    Movie,
    /// TV series.
    Tv,
}

impl MediaType {
    /// Path segment used by TMDB (`movie` / `tv`).
    #[must_use]
    pub const fn as_path(self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Tv => "tv",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_path())
    }
}

impl FromStr for MediaType {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "movie" | "movies" => Ok(Self::Movie),
            "tv" | "show" | "shows" => Ok(Self::Tv),
            other => Err(ApiError::InvalidInput(format!("unknown media type: {other}"))),
        }
    }
}

// --- Paginated results ---

/// Generic paginated response (`results`, `page`, `total_pages`).
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbPage<T> {
    /// Current page number.
    #[serde(default)]
    pub page: u32,
    /// Items on this page.
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
    /// Total number of pages.
    #[serde(default)]
    pub total_pages: u32,
    /// Total number of results.
    #[serde(default)]
    pub total_results: u32,
}

/// A movie or TV entry from a listing, discover, search, or similar endpoint.
///
/// Movies carry `title`/`release_date`, TV shows carry `name`/`first_air_date`.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TmdbMediaResult {
    /// TMDB ID.
    pub id: u64,
    /// Movie title.
    #[serde(default)]
    pub title: Option<String>,
    /// TV series name.
    #[serde(default)]
    pub name: Option<String>,
    /// Overview text.
    #[serde(default)]
    pub overview: Option<String>,
    /// Poster image path.
    #[serde(default)]
    pub poster_path: Option<String>,
    /// Backdrop image path.
    #[serde(default)]
    pub backdrop_path: Option<String>,
    /// Vote average.
    #[serde(default)]
    pub vote_average: f64,
    /// Vote count.
    #[serde(default)]
    pub vote_count: u32,
    /// Movie release date (YYYY-MM-DD).
    #[serde(default)]
    pub release_date: Option<String>,
    /// TV first air date (YYYY-MM-DD).
    #[serde(default)]
    pub first_air_date: Option<String>,
    /// Popularity score.
    #[serde(default)]
    pub popularity: f64,
    /// Genre IDs.
    #[serde(default)]
    pub genre_ids: Vec<u32>,
    /// Present on trending results.
    #[serde(default)]
    pub media_type: Option<String>,
}

impl TmdbMediaResult {
    /// Display title, whichever of `title` / `name` the endpoint returned.
    #[must_use]
    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .or(self.name.as_deref())
            .unwrap_or_default()
    }

    /// Release or first air date.
    #[must_use]
    pub fn date(&self) -> Option<&str> {
        self.release_date
            .as_deref()
            .or(self.first_air_date.as_deref())
            .filter(|d| !d.is_empty())
    }
}

/// A person from `person/popular` or `search/person`.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TmdbPerson {
    /// TMDB person ID.
    pub id: u64,
    /// Name.
    #[serde(default)]
    pub name: String,
    /// Profile image path.
    #[serde(default)]
    pub profile_path: Option<String>,
    /// Popularity score.
    #[serde(default)]
    pub popularity: f64,
    /// Department (e.g., "Acting").
    #[serde(default)]
    pub known_for_department: Option<String>,
}

// --- Details ---

/// Genre entry.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct TmdbGenre {
    /// Genre ID.
    pub id: u32,
    /// Genre name.
    pub name: String,
}

/// Response from `genre/{media}/list`.
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbGenreList {
    /// Genres.
    #[serde(default)]
    pub genres: Vec<TmdbGenre>,
}

/// Response from `movie/{id}` or `tv/{id}`.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TmdbDetails {
    /// TMDB ID.
    pub id: u64,
    /// Movie title.
    #[serde(default)]
    pub title: Option<String>,
    /// TV series name.
    #[serde(default)]
    pub name: Option<String>,
    /// Tagline.
    #[serde(default)]
    pub tagline: Option<String>,
    /// Overview text.
    #[serde(default)]
    pub overview: Option<String>,
    /// Poster image path.
    #[serde(default)]
    pub poster_path: Option<String>,
    /// Backdrop image path.
    #[serde(default)]
    pub backdrop_path: Option<String>,
    /// Vote average.
    #[serde(default)]
    pub vote_average: f64,
    /// Vote count.
    #[serde(default)]
    pub vote_count: u32,
    /// Movie release date.
    #[serde(default)]
    pub release_date: Option<String>,
    /// TV first air date.
    #[serde(default)]
    pub first_air_date: Option<String>,
    /// Runtime in minutes (movies).
    #[serde(default)]
    pub runtime: Option<u32>,
    /// Number of seasons (TV).
    #[serde(default)]
    pub number_of_seasons: Option<u32>,
    /// Number of episodes (TV).
    #[serde(default)]
    pub number_of_episodes: Option<u32>,
    /// Status (e.g., "Released", "Returning Series").
    #[serde(default)]
    pub status: Option<String>,
    /// Popularity score.
    #[serde(default)]
    pub popularity: f64,
    /// Genres.
    #[serde(default)]
    pub genres: Vec<TmdbGenre>,
}

impl TmdbDetails {
    /// Display title, whichever of `title` / `name` the endpoint returned.
    #[must_use]
    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .or(self.name.as_deref())
            .unwrap_or_default()
    }
}

/// Response from `person/{id}`.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TmdbPersonDetails {
    /// TMDB person ID.
    pub id: u64,
    /// Name.
    #[serde(default)]
    pub name: String,
    /// Biography.
    #[serde(default)]
    pub biography: Option<String>,
    /// Birthday (YYYY-MM-DD).
    #[serde(default)]
    pub birthday: Option<String>,
    /// Place of birth.
    #[serde(default)]
    pub place_of_birth: Option<String>,
    /// Profile image path.
    #[serde(default)]
    pub profile_path: Option<String>,
    /// Department.
    #[serde(default)]
    pub known_for_department: Option<String>,
    /// Popularity score.
    #[serde(default)]
    pub popularity: f64,
}

/// Response from `person/{id}/movie_credits`.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TmdbPersonCredits {
    /// Movies the person appeared in.
    #[serde(default)]
    pub cast: Vec<TmdbMediaResult>,
}

/// Response from `{media}/{id}/credits`.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TmdbCredits {
    /// Cast members in billing order.
    #[serde(default)]
    pub cast: Vec<TmdbCastMember>,
}

/// A single cast member.
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbCastMember {
    /// TMDB person ID.
    pub id: u64,
    /// Name.
    #[serde(default)]
    pub name: String,
    /// Character played.
    #[serde(default)]
    pub character: Option<String>,
    /// Profile image path.
    #[serde(default)]
    pub profile_path: Option<String>,
}

/// Response from `{media}/{id}/videos`.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TmdbVideoList {
    /// Videos.
    #[serde(default)]
    pub results: Vec<TmdbVideo>,
}

/// A trailer, teaser, or clip.
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbVideo {
    /// Site-specific video key.
    pub key: String,
    /// Hosting site (e.g., "YouTube").
    #[serde(default)]
    pub site: String,
    /// Video name.
    #[serde(default)]
    pub name: String,
    /// Video type (e.g., "Trailer", "Teaser").
    #[serde(rename = "type", default)]
    pub video_type: String,
}

/// A review from `{media}/{id}/reviews`.
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbReview {
    /// Review ID.
    pub id: String,
    /// Author display name.
    #[serde(default)]
    pub author: String,
    /// Author rating details.
    #[serde(default)]
    pub author_details: TmdbAuthorDetails,
    /// Review body.
    #[serde(default)]
    pub content: String,
    /// Creation timestamp (ISO 8601).
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Author block within a review.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TmdbAuthorDetails {
    /// Author username.
    #[serde(default)]
    pub username: Option<String>,
    /// Rating given (0-10), if any.
    #[serde(default)]
    pub rating: Option<f64>,
}

// --- Watch providers ---

/// Response from `{media}/{id}/watch/providers`, keyed by ISO 3166-1 country code.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TmdbWatchProviders {
    /// Providers per country.
    #[serde(default)]
    pub results: BTreeMap<String, TmdbCountryProviders>,
}

/// Providers available in one country.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TmdbCountryProviders {
    /// JustWatch landing page.
    #[serde(default)]
    pub link: Option<String>,
    /// Subscription streaming.
    #[serde(default)]
    pub flatrate: Vec<TmdbProvider>,
    /// Rental.
    #[serde(default)]
    pub rent: Vec<TmdbProvider>,
    /// Purchase.
    #[serde(default)]
    pub buy: Vec<TmdbProvider>,
}

/// A single streaming/rental provider.
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbProvider {
    /// Provider ID.
    pub provider_id: u64,
    /// Provider name.
    #[serde(default)]
    pub provider_name: String,
    /// Logo image path.
    #[serde(default)]
    pub logo_path: Option<String>,
}

// --- Error Response ---

/// TMDB API error response body.
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbErrorResponse {
    /// TMDB error code.
    pub status_code: u32,
    /// Error message.
    pub status_message: String,
    /// Success flag (always false for errors).
    #[allow(dead_code)]
    #[serde(default)]
    pub success: bool,
}
