//! Aggregations behind each screen.

use std::collections::HashSet;

use cinescope_api::ApiResult;
use cinescope_api::tmdb::{
    DiscoverParams, ImageSize, ListingCategory, LocalTmdbApi, MediaType, TmdbCastMember,
    TmdbCountryProviders, TmdbDetails, TmdbPersonDetails, TmdbProvider, TmdbReview, TmdbVideo,
    TmdbWatchProviders, image_url,
};
use futures::future::join_all;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use crate::cancel::{run_cancellable, try_cancellable};
use crate::genres::showcase_genres;
use crate::media::{ListItem, MediaItem, media_page};

const TRENDING_LIMIT: usize = 6;
const POPULAR_LIMIT: usize = 12;
const REVIEW_LIMIT: usize = 5;
const CAST_LIMIT: usize = 10;
const SIMILAR_LIMIT: usize = 6;
const FILMOGRAPHY_LIMIT: usize = 20;
const DEFAULT_COUNTRY: &str = "US";

/// Landing page rows.
#[derive(Debug, Clone, PartialEq)]
pub struct HomeFeed {
    /// Trending this week.
    pub trending: Vec<MediaItem>,
    /// Popular titles.
    pub popular: Vec<MediaItem>,
}

fn first_n(mut items: Vec<MediaItem>, n: usize) -> Vec<MediaItem> {
    items.truncate(n);
    items
}

/// Movie landing page: 6 trending and 12 popular movies.
///
/// `Ok(None)` when `token` fires before both rows arrive.
///
/// # Errors
///
/// Either fetch failing fails the feed.
#[instrument(skip_all)]
pub async fn home_feed(
    api: &impl LocalTmdbApi,
    token: &CancellationToken,
) -> ApiResult<Option<HomeFeed>> {
    try_cancellable(token, collect_home_feed(api)).await
}

async fn collect_home_feed(api: &impl LocalTmdbApi) -> ApiResult<HomeFeed> {
    let (trending, popular) = tokio::try_join!(
        api.listing(MediaType::Movie, ListingCategory::Trending, 1),
        api.listing(MediaType::Movie, ListingCategory::Popular, 1),
    )?;
    Ok(HomeFeed {
        trending: first_n(media_page(trending, MediaType::Movie).items, TRENDING_LIMIT),
        popular: first_n(media_page(popular, MediaType::Movie).items, POPULAR_LIMIT),
    })
}

/// TV landing page: 6 trending series and the first two popular pages.
///
/// Unlike [`home_feed`], the popular row is not cut to 12: the TV screen
/// lists both pages in full (up to 40 series).
///
/// `Ok(None)` when `token` fires before all three pages arrive.
///
/// # Errors
///
/// Any fetch failing fails the feed.
#[instrument(skip_all)]
pub async fn tv_home_feed(
    api: &impl LocalTmdbApi,
    token: &CancellationToken,
) -> ApiResult<Option<HomeFeed>> {
    try_cancellable(token, collect_tv_home_feed(api)).await
}

async fn collect_tv_home_feed(api: &impl LocalTmdbApi) -> ApiResult<HomeFeed> {
    let (trending, first, second) = tokio::try_join!(
        api.listing(MediaType::Tv, ListingCategory::Trending, 1),
        api.listing(MediaType::Tv, ListingCategory::Popular, 1),
        api.listing(MediaType::Tv, ListingCategory::Popular, 2),
    )?;
    let mut popular = media_page(first, MediaType::Tv).items;
    popular.extend(media_page(second, MediaType::Tv).items);
    Ok(HomeFeed {
        trending: first_n(media_page(trending, MediaType::Tv).items, TRENDING_LIMIT),
        popular,
    })
}

/// Everything a title detail page shows from the provider.
#[derive(Debug, Clone)]
pub struct TitlePage {
    /// Full details.
    pub details: TmdbDetails,
    /// First provider reviews.
    pub reviews: Vec<TmdbReview>,
    /// Top-billed cast.
    pub cast: Vec<TmdbCastMember>,
    /// Similar titles.
    pub similar: Vec<MediaItem>,
    /// Trailer to embed, if any.
    pub trailer: Option<TmdbVideo>,
}

/// First YouTube trailer, else the first YouTube video of any kind.
#[must_use]
pub fn pick_trailer(videos: &[TmdbVideo]) -> Option<&TmdbVideo> {
    let youtube = |v: &&TmdbVideo| v.site == "YouTube";
    videos
        .iter()
        .filter(youtube)
        .find(|v| v.video_type == "Trailer")
        .or_else(|| videos.iter().find(youtube))
}

/// Fetches a title page's five sections concurrently.
///
/// `Ok(None)` when `token` fires first; partial sections are discarded.
///
/// # Errors
///
/// Any section failing fails the page.
#[instrument(skip(api, token))]
pub async fn title_page(
    api: &impl LocalTmdbApi,
    media: MediaType,
    id: u64,
    token: &CancellationToken,
) -> ApiResult<Option<TitlePage>> {
    try_cancellable(token, collect_title_page(api, media, id)).await
}

async fn collect_title_page(
    api: &impl LocalTmdbApi,
    media: MediaType,
    id: u64,
) -> ApiResult<TitlePage> {
    let (details, reviews, credits, similar, videos) = tokio::try_join!(
        api.details(media, id),
        api.provider_reviews(media, id, 1),
        api.credits(media, id),
        api.similar(media, id),
        api.videos(media, id),
    )?;

    let mut reviews = reviews.results;
    reviews.truncate(REVIEW_LIMIT);
    let mut cast = credits.cast;
    cast.truncate(CAST_LIMIT);
    let trailer = pick_trailer(&videos.results).cloned();

    Ok(TitlePage {
        details,
        reviews,
        cast,
        similar: first_n(media_page(similar, media).items, SIMILAR_LIMIT),
        trailer,
    })
}

/// A person and their best-known films.
#[derive(Debug, Clone)]
pub struct ActorPage {
    /// Biography and profile.
    pub person: TmdbPersonDetails,
    /// Up to 20 credits with posters, most popular first.
    pub credits: Vec<MediaItem>,
}

/// Fetches a person and their movie credits concurrently.
///
/// `Ok(None)` when `token` fires first.
///
/// # Errors
///
/// Either fetch failing fails the page.
#[instrument(skip(api, token))]
pub async fn actor_page(
    api: &impl LocalTmdbApi,
    person_id: u64,
    token: &CancellationToken,
) -> ApiResult<Option<ActorPage>> {
    try_cancellable(token, collect_actor_page(api, person_id)).await
}

async fn collect_actor_page(api: &impl LocalTmdbApi, person_id: u64) -> ApiResult<ActorPage> {
    let (person, credits) = tokio::try_join!(
        api.person_details(person_id),
        api.person_movie_credits(person_id),
    )?;

    let mut credits: Vec<MediaItem> = credits
        .cast
        .into_iter()
        .map(|r| MediaItem::from_result(r, MediaType::Movie))
        .collect();
    credits.sort_by(|a, b| b.popularity.total_cmp(&a.popularity));
    let credits = credits
        .into_iter()
        .filter(ListItem::has_image)
        .take(FILMOGRAPHY_LIMIT)
        .collect();

    Ok(ActorPage { person, credits })
}

/// One tile of the genre overview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenreTile {
    /// Genre ID.
    pub id: u32,
    /// Display name.
    pub name: &'static str,
    /// Backdrop of the genre's most popular title (`w780`).
    pub backdrop_url: Option<String>,
}

/// Builds the genre overview.
///
/// Each genre is fetched independently; a failing genre keeps its tile
/// without an image. `None` when `token` fires before every tile resolves.
#[instrument(skip(api, token))]
pub async fn genre_showcase(
    api: &impl LocalTmdbApi,
    media: MediaType,
    token: &CancellationToken,
) -> Option<Vec<GenreTile>> {
    run_cancellable(token, genre_tiles(api, media)).await
}

async fn genre_tiles(api: &impl LocalTmdbApi, media: MediaType) -> Vec<GenreTile> {
    join_all(showcase_genres(media).map(|(id, name)| async move {
        let backdrop_url = match api.discover(media, &DiscoverParams::genre(id)).await {
            Ok(page) => page
                .results
                .into_iter()
                .next()
                .and_then(|first| first.backdrop_path)
                .filter(|path| !path.is_empty())
                .map(|path| image_url(Some(&path), ImageSize::W780)),
            Err(e) => {
                tracing::warn!(genre_id = id, genre = name, error = %e, "genre image unavailable");
                None
            }
        };
        GenreTile {
            id,
            name,
            backdrop_url,
        }
    }))
    .await
}

/// Providers in one country, grouped by offer type.
#[derive(Debug, Clone)]
pub struct CountryOffers {
    /// Provider landing page for the title.
    pub link: Option<String>,
    /// Subscription services.
    pub flatrate: Vec<TmdbProvider>,
    /// Rentals.
    pub rent: Vec<TmdbProvider>,
    /// Purchases.
    pub buy: Vec<TmdbProvider>,
}

/// Where a title can be watched.
#[derive(Debug, Clone)]
pub struct WatchOptions {
    /// Country codes with availability, sorted.
    pub countries: Vec<String>,
    /// Country the offers are for.
    pub country: String,
    /// Offers in `country`.
    pub offers: CountryOffers,
}

/// Drops providers whose first word was already seen
/// ("Netflix" and "Netflix Standard with Ads" collapse to one).
#[must_use]
pub fn unique_providers(providers: Vec<TmdbProvider>) -> Vec<TmdbProvider> {
    let mut seen = HashSet::new();
    providers
        .into_iter()
        .filter(|p| {
            let base = p.provider_name.split(' ').next().unwrap_or_default().to_owned();
            seen.insert(base)
        })
        .collect()
}

/// Selects a country's offers: `requested` when available, else `US`,
/// else the first country alphabetically. `None` when nothing is offered.
#[must_use]
pub fn select_offers(providers: TmdbWatchProviders, requested: Option<&str>) -> Option<WatchOptions> {
    let mut results = providers.results;
    let countries: Vec<String> = results.keys().cloned().collect();
    let available = |code: &str| countries.iter().any(|c| c == code);

    let country = requested
        .filter(|&code| available(code))
        .or_else(|| available(DEFAULT_COUNTRY).then_some(DEFAULT_COUNTRY))
        .or_else(|| countries.first().map(String::as_str))?
        .to_owned();

    let TmdbCountryProviders {
        link,
        flatrate,
        rent,
        buy,
    } = results.remove(&country)?;

    Some(WatchOptions {
        countries,
        country,
        offers: CountryOffers {
            link,
            flatrate: unique_providers(flatrate),
            rent: unique_providers(rent),
            buy: unique_providers(buy),
        },
    })
}

/// Fetches and selects watch options for a title.
///
/// # Errors
///
/// Returns the provider error unchanged.
pub async fn watch_options(
    api: &impl LocalTmdbApi,
    media: MediaType,
    id: u64,
    country: Option<&str>,
) -> ApiResult<Option<WatchOptions>> {
    let providers = api.watch_providers(media, id).await?;
    Ok(select_offers(providers, country))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::indexing_slicing)]

    use super::*;
    use crate::test_support::{MockTmdb, cancel_mid_fetch, media};

    fn video(site: &str, kind: &str, key: &str) -> TmdbVideo {
        TmdbVideo {
            key: key.to_owned(),
            site: site.to_owned(),
            name: key.to_owned(),
            video_type: kind.to_owned(),
        }
    }

    fn provider(id: u64, name: &str) -> TmdbProvider {
        TmdbProvider {
            provider_id: id,
            provider_name: name.to_owned(),
            logo_path: None,
        }
    }

    fn country(flatrate: Vec<TmdbProvider>) -> TmdbCountryProviders {
        TmdbCountryProviders {
            flatrate,
            ..TmdbCountryProviders::default()
        }
    }

    #[test]
    fn test_trailer_prefers_youtube_trailer() {
        // Arrange
        let videos = vec![
            video("Vimeo", "Trailer", "v1"),
            video("YouTube", "Teaser", "y1"),
            video("YouTube", "Trailer", "y2"),
        ];

        // Act
        let trailer = pick_trailer(&videos).unwrap();

        // Assert
        assert_eq!(trailer.key, "y2");
    }

    #[test]
    fn test_trailer_falls_back_to_any_youtube_video() {
        // Arrange
        let videos = vec![video("Vimeo", "Trailer", "v1"), video("YouTube", "Clip", "y1")];

        // Act & Assert
        assert_eq!(pick_trailer(&videos).unwrap().key, "y1");
        assert!(pick_trailer(&videos[..1]).is_none());
    }

    #[test]
    fn test_providers_deduplicated_by_first_word() {
        // Arrange
        let providers = vec![
            provider(8, "Netflix"),
            provider(1796, "Netflix Standard with Ads"),
            provider(9, "Amazon Prime Video"),
        ];

        // Act
        let unique = unique_providers(providers);

        // Assert
        let ids: Vec<u64> = unique.iter().map(|p| p.provider_id).collect();
        assert_eq!(ids, vec![8, 9]);
    }

    #[test]
    fn test_country_defaults_to_us_then_first() {
        // Arrange
        let with_us = TmdbWatchProviders {
            results: [
                (String::from("DE"), country(vec![provider(1, "A")])),
                (String::from("US"), country(vec![provider(2, "B")])),
            ]
            .into(),
        };
        let without_us = TmdbWatchProviders {
            results: [
                (String::from("FR"), country(Vec::new())),
                (String::from("BR"), country(Vec::new())),
            ]
            .into(),
        };

        // Act
        let us = select_offers(with_us.clone(), None).unwrap();
        let requested = select_offers(with_us, Some("DE")).unwrap();
        let first = select_offers(without_us, Some("JP")).unwrap();

        // Assert
        assert_eq!(us.country, "US");
        assert_eq!(us.countries, vec!["DE", "US"]);
        assert_eq!(requested.offers.flatrate[0].provider_id, 1);
        assert_eq!(first.country, "BR");
    }

    #[test]
    fn test_no_countries_is_none() {
        // Arrange & Act & Assert
        assert!(select_offers(TmdbWatchProviders::default(), None).is_none());
    }

    #[tokio::test]
    async fn test_actor_credits_sorted_and_filtered() {
        // Arrange
        let mut low = media(1, "Low", true);
        low.popularity = 1.0;
        let mut high = media(2, "High", true);
        high.popularity = 50.0;
        let mut no_poster = media(3, "Hidden", false);
        no_poster.popularity = 99.0;
        let api = MockTmdb {
            person_credits: vec![low, high, no_poster],
            ..MockTmdb::default()
        };

        // Act
        let page = actor_page(&api, 6384, &CancellationToken::new())
            .await
            .unwrap()
            .unwrap();

        // Assert
        let ids: Vec<u64> = page.credits.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![2, 1]);
        assert_eq!(page.person.id, 6384);
    }

    #[tokio::test]
    async fn test_genre_showcase_isolates_failures() {
        // Arrange
        let api = MockTmdb {
            discover_results: vec![media(1, "Any", true)],
            failing_genres: [28].into(),
            ..MockTmdb::default()
        };

        // Act
        let tiles = genre_showcase(&api, MediaType::Movie, &CancellationToken::new())
            .await
            .unwrap();

        // Assert
        assert_eq!(tiles.len(), 18);
        assert_eq!(tiles[0].id, 28);
        assert!(tiles[0].backdrop_url.is_none());
        assert_eq!(
            tiles[1].backdrop_url.as_deref(),
            Some("https://image.tmdb.org/t/p/w780/backdrop1.jpg")
        );
    }

    #[tokio::test]
    async fn test_home_feed_truncates_rows() {
        // Arrange
        let api = MockTmdb {
            listing_pages: vec![(1..=20).map(|i| media(i, "M", true)).collect()],
            listing_total_pages: 1,
            ..MockTmdb::default()
        };

        // Act
        let feed = home_feed(&api, &CancellationToken::new())
            .await
            .unwrap()
            .unwrap();

        // Assert
        assert_eq!(feed.trending.len(), TRENDING_LIMIT);
        assert_eq!(feed.popular.len(), POPULAR_LIMIT);
    }

    #[tokio::test]
    async fn test_tv_home_feed_keeps_both_popular_pages_whole() {
        // Arrange
        let api = MockTmdb {
            listing_pages: vec![
                (1..=20).map(|i| media(i, "T", true)).collect(),
                (21..=40).map(|i| media(i, "T", true)).collect(),
            ],
            listing_total_pages: 2,
            ..MockTmdb::default()
        };

        // Act
        let feed = tv_home_feed(&api, &CancellationToken::new())
            .await
            .unwrap()
            .unwrap();

        // Assert
        assert_eq!(feed.trending.len(), TRENDING_LIMIT);
        assert_eq!(feed.popular.len(), 40);
        assert_eq!(feed.popular[39].id, 40);
        assert_eq!(MockTmdb::count(&api.listing_calls), 3);
    }

    #[tokio::test]
    async fn test_home_feed_cancelled_mid_fetch() {
        // Arrange
        let api = MockTmdb::stalled();
        let token = CancellationToken::new();

        // Act
        let (feed, ()) = tokio::join!(home_feed(&api, &token), cancel_mid_fetch(&token));

        // Assert
        assert!(feed.unwrap().is_none());
        assert_eq!(MockTmdb::count(&api.listing_calls), 2);
    }

    #[tokio::test]
    async fn test_tv_home_feed_cancelled_mid_fetch() {
        // Arrange
        let api = MockTmdb::stalled();
        let token = CancellationToken::new();

        // Act
        let (feed, ()) = tokio::join!(tv_home_feed(&api, &token), cancel_mid_fetch(&token));

        // Assert
        assert!(feed.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_title_page_cancelled_mid_fetch() {
        // Arrange
        let api = MockTmdb::stalled();
        let token = CancellationToken::new();

        // Act
        let (page, ()) = tokio::join!(
            title_page(&api, MediaType::Movie, 550, &token),
            cancel_mid_fetch(&token)
        );

        // Assert
        assert!(page.unwrap().is_none());
        assert_eq!(MockTmdb::count(&api.details_calls), 1);
    }

    #[tokio::test]
    async fn test_actor_page_cancelled_mid_fetch() {
        // Arrange
        let api = MockTmdb::stalled();
        let token = CancellationToken::new();

        // Act
        let (page, ()) = tokio::join!(actor_page(&api, 6384, &token), cancel_mid_fetch(&token));

        // Assert
        assert!(page.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_genre_showcase_cancelled_mid_fetch() {
        // Arrange
        let api = MockTmdb::stalled();
        let token = CancellationToken::new();

        // Act
        let (tiles, ()) = tokio::join!(
            genre_showcase(&api, MediaType::Movie, &token),
            cancel_mid_fetch(&token)
        );

        // Assert
        assert!(tiles.is_none());
        assert_eq!(MockTmdb::count(&api.discover_calls), 18);
    }
}
