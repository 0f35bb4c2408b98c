//! Fixed genre tables.

use cinescope_api::tmdb::MediaType;

/// Movie genre IDs and names.
pub const MOVIE_GENRES: &[(u32, &str)] = &[
    (28, "Action"),
    (12, "Adventure"),
    (16, "Animation"),
    (35, "Comedy"),
    (80, "Crime"),
    (99, "Documentary"),
    (18, "Drama"),
    (10751, "Family"),
    (14, "Fantasy"),
    (36, "History"),
    (27, "Horror"),
    (10402, "Music"),
    (9648, "Mystery"),
    (10749, "Romance"),
    (878, "Science Fiction"),
    (10770, "TV Movie"),
    (53, "Thriller"),
    (10752, "War"),
    (37, "Western"),
];

/// TV genre IDs and names.
pub const TV_GENRES: &[(u32, &str)] = &[
    (10759, "Action & Adventure"),
    (16, "Animation"),
    (35, "Comedy"),
    (80, "Crime"),
    (99, "Documentary"),
    (18, "Drama"),
    (10751, "Family"),
    (10762, "Kids"),
    (9648, "Mystery"),
    (10763, "News"),
    (10764, "Reality"),
    (10765, "Sci-Fi & Fantasy"),
    (10766, "Soap"),
    (10767, "Talk"),
    (10768, "War & Politics"),
    (37, "Western"),
];

const TV_MOVIE: u32 = 10770;

/// Genre table for a media type.
#[must_use]
pub const fn genre_table(media: MediaType) -> &'static [(u32, &'static str)] {
    match media {
        MediaType::Movie => MOVIE_GENRES,
        MediaType::Tv => TV_GENRES,
    }
}

/// Display name for a genre, or `Movies` / `TV Shows` when unknown.
#[must_use]
pub fn genre_name(media: MediaType, id: u32) -> &'static str {
    genre_table(media)
        .iter()
        .find(|(genre_id, _)| *genre_id == id)
        .map_or(
            match media {
                MediaType::Movie => "Movies",
                MediaType::Tv => "TV Shows",
            },
            |(_, name)| name,
        )
}

/// Genres shown on the genre overview (TV movies are not showcased).
pub fn showcase_genres(media: MediaType) -> impl Iterator<Item = (u32, &'static str)> {
    genre_table(media)
        .iter()
        .copied()
        .filter(move |(id, _)| media == MediaType::Tv || *id != TV_MOVIE)
}
