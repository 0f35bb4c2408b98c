//! Normalised catalog records.

use cinescope_api::tmdb::{
    ImageSize, MediaType, TmdbMediaResult, TmdbPage, TmdbPerson, image_url,
};

/// Identity of a listed item across pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKey {
    /// `(media_type, id)` of a title.
    Media(MediaType, u64),
    /// Person ID.
    Person(u64),
}

/// Items a listing can accumulate.
pub trait ListItem {
    /// Whether the item has the image it is displayed with.
    fn has_image(&self) -> bool;

    /// Identity used to detect duplicates.
    fn key(&self) -> ItemKey;
}

/// A movie or TV series normalised from either provider shape.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaItem {
    /// TMDB ID.
    pub id: u64,
    /// Movie or TV.
    pub media_type: MediaType,
    /// Title (movies) or name (TV).
    pub title: String,
    /// Poster image path.
    pub poster_path: Option<String>,
    /// Backdrop image path.
    pub backdrop_path: Option<String>,
    /// Vote average.
    pub vote_average: f64,
    /// Release date (movies) or first air date (TV).
    pub release_date: Option<String>,
    /// Popularity score.
    pub popularity: f64,
    /// Genre IDs.
    pub genre_ids: Vec<u32>,
}

impl MediaItem {
    /// Normalises a provider result.
    ///
    /// Trending results carry their own `media_type`; everything else
    /// takes the type of the endpoint it came from.
    #[must_use]
    pub fn from_result(result: TmdbMediaResult, endpoint: MediaType) -> Self {
        let media_type = result
            .media_type
            .as_deref()
            .and_then(|t| t.parse().ok())
            .unwrap_or(endpoint);
        let title = result.display_title().to_owned();
        let release_date = result.date().map(ToOwned::to_owned);
        Self {
            id: result.id,
            media_type,
            title,
            poster_path: result.poster_path.filter(|p| !p.is_empty()),
            backdrop_path: result.backdrop_path.filter(|p| !p.is_empty()),
            vote_average: result.vote_average,
            release_date,
            popularity: result.popularity,
            genre_ids: result.genre_ids,
        }
    }

    /// Poster URL, or the placeholder.
    #[must_use]
    pub fn poster_url(&self, size: ImageSize) -> String {
        image_url(self.poster_path.as_deref(), size)
    }

    /// Release year, if the date is known.
    #[must_use]
    pub fn year(&self) -> Option<&str> {
        self.release_date.as_deref().and_then(|d| d.get(..4))
    }
}

impl ListItem for MediaItem {
    fn has_image(&self) -> bool {
        self.poster_path.is_some()
    }

    fn key(&self) -> ItemKey {
        ItemKey::Media(self.media_type, self.id)
    }
}

/// A person in the actors listing or a search.
#[derive(Debug, Clone, PartialEq)]
pub struct PersonItem {
    /// TMDB person ID.
    pub id: u64,
    /// Name.
    pub name: String,
    /// Profile image path.
    pub profile_path: Option<String>,
    /// Popularity score.
    pub popularity: f64,
    /// Department (e.g., "Acting").
    pub known_for_department: Option<String>,
}

impl From<TmdbPerson> for PersonItem {
    fn from(person: TmdbPerson) -> Self {
        Self {
            id: person.id,
            name: person.name,
            profile_path: person.profile_path.filter(|p| !p.is_empty()),
            popularity: person.popularity,
            known_for_department: person.known_for_department,
        }
    }
}

impl ListItem for PersonItem {
    fn has_image(&self) -> bool {
        self.profile_path.is_some()
    }

    fn key(&self) -> ItemKey {
        ItemKey::Person(self.id)
    }
}

/// One fetched page with the provider's pagination metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct PaginatedResult<T> {
    /// Items exactly as returned (unfiltered).
    pub items: Vec<T>,
    /// Page number.
    pub page: u32,
    /// Total pages reported by the provider.
    pub total_pages: u32,
}

impl<T> PaginatedResult<T> {
    /// Converts a provider page item by item.
    pub fn from_page<U>(page: TmdbPage<U>, convert: impl FnMut(U) -> T) -> Self {
        Self {
            items: page.results.into_iter().map(convert).collect(),
            page: page.page,
            total_pages: page.total_pages,
        }
    }

    /// Whether a following page exists, judged on unfiltered metadata.
    #[must_use]
    pub fn has_more(&self) -> bool {
        !self.items.is_empty() && self.page < self.total_pages
    }
}

/// Normalises a page of movie/TV results.
#[must_use]
pub fn media_page(page: TmdbPage<TmdbMediaResult>, media: MediaType) -> PaginatedResult<MediaItem> {
    PaginatedResult::from_page(page, |r| MediaItem::from_result(r, media))
}

/// Normalises a page of people.
#[must_use]
pub fn person_page(page: TmdbPage<TmdbPerson>) -> PaginatedResult<PersonItem> {
    PaginatedResult::from_page(page, PersonItem::from)
}
