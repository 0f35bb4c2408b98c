//! TMDB image URL resolution.

/// CDN base for TMDB images.
pub const IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p";

/// Local asset used when a title or person has no image.
pub const PLACEHOLDER_IMAGE: &str = "/placeholder.jpg";

/// Image size tokens accepted by the CDN.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageSize {
    /// Provider logos.
    W92,
    /// Cast thumbnails.
    W185,
    /// Posters (default).
    #[default]
    W500,
    /// Genre tiles.
    W780,
    /// Backdrops.
    W1280,
    /// Actor profile pages.
    H632,
    /// Full resolution.
    Original,
}

impl ImageSize {
    /// The size token used in the URL path.
    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::W92 => "w92",
            Self::W185 => "w185",
            Self::W500 => "w500",
            Self::W780 => "w780",
            Self::W1280 => "w1280",
            Self::H632 => "h632",
            Self::Original => "original",
        }
    }
}

/// Resolves an image path to a full CDN URL.
///
/// A missing or empty path resolves to [`PLACEHOLDER_IMAGE`].
#[must_use]
pub fn image_url(path: Option<&str>, size: ImageSize) -> String {
    match path {
        Some(p) if !p.is_empty() => format!("{IMAGE_BASE_URL}/{}{p}", size.token()),
        _ => String::from(PLACEHOLDER_IMAGE),
    }
}
