//! Catalog commands: feeds, listings, search, and detail pages.

use std::future::Future;

use anyhow::{Context, Result};
use cinescope_api::ApiResult;
use cinescope_api::supabase::{LocalUserDataApi, ReviewWithAuthor};
use cinescope_api::tmdb::{ImageSize, ListingCategory, MediaType, TmdbClient, image_url};
use cinescope_core::cancel::run_cancellable;
use cinescope_core::fetch::{genre_page, listing_page, people_page};
use cinescope_core::genres::genre_name;
use cinescope_core::merge::{MergePreset, ranked_listing};
use cinescope_core::pages::{
    actor_page, genre_showcase, home_feed, title_page, tv_home_feed, watch_options,
};
use cinescope_core::recommend::{
    RecommendationSet, provider_recommendations, recommend_movies, recommend_tv,
};
use cinescope_core::reviews::merge_reviews;
use cinescope_core::search::{SearchScope, search};
use cinescope_core::{
    ListItem, Listing, ListingMode, LoadOutcome, MediaItem, PaginatedResult, ScrollSignal,
};
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use crate::backend::{AppContext, Backend};

/// Arguments for `home`.
#[derive(clap::Args)]
pub struct HomeArgs {
    /// Show the TV landing page instead of movies.
    #[arg(long)]
    tv: bool,
}

/// Arguments for `browse`.
#[derive(clap::Args)]
pub struct BrowseArgs {
    /// `movie` or `tv`.
    #[arg(long, default_value = "movie")]
    media: MediaType,
    /// trending, popular, top-rated, upcoming, now-playing.
    #[arg(long, default_value = "popular")]
    category: ListingCategory,
    /// Browse a single genre (most popular first) instead of a category.
    #[arg(long)]
    genre: Option<u32>,
    /// Number of pages to scroll through.
    #[arg(long, default_value_t = 1)]
    pages: u32,
}

/// Ranked list presets.
#[derive(Clone, Copy, clap::ValueEnum)]
pub enum RankedList {
    /// Most popular movies (top 100).
    FanFavourites,
    /// Top-rated TV (top 100).
    TopRatedTv,
    /// Top-rated movies.
    TopRatedMovies,
}

/// Arguments for `ranked`.
#[derive(clap::Args)]
pub struct RankedArgs {
    /// Which list.
    #[arg(value_enum)]
    list: RankedList,
}

/// Arguments for `search`.
#[derive(clap::Args)]
pub struct SearchArgs {
    /// Search text.
    query: String,
    /// all, titles, celebs, keywords.
    #[arg(long, default_value = "all")]
    scope: SearchScope,
}

/// Arguments for `title`.
#[derive(clap::Args)]
pub struct TitleArgs {
    /// TMDB ID.
    id: u64,
    /// The ID is a TV series.
    #[arg(long)]
    tv: bool,
    /// Country for watch providers (default: US, else the first available).
    #[arg(long)]
    country: Option<String>,
}

/// Arguments for `actor`.
#[derive(clap::Args)]
pub struct ActorArgs {
    /// TMDB person ID.
    id: u64,
}

/// Arguments for `people`.
#[derive(clap::Args)]
pub struct PeopleArgs {
    /// Number of pages to scroll through.
    #[arg(long, default_value_t = 1)]
    pages: u32,
}

/// Arguments for `genres`.
#[derive(clap::Args)]
pub struct GenresArgs {
    /// Show TV genres instead of movie genres.
    #[arg(long)]
    tv: bool,
}

const fn media_of(tv: bool) -> MediaType {
    if tv { MediaType::Tv } else { MediaType::Movie }
}

/// Unwraps an aggregation that was not cut short by Ctrl-C.
fn completed<T>(outcome: Option<T>) -> Result<T> {
    outcome.context("interrupted")
}

fn print_media_rows(items: &[MediaItem]) {
    tracing::info!("ID\tYear\tRating\tTitle");
    for item in items {
        tracing::info!(
            "{}\t{}\t{:.1}\t{}",
            item.id,
            item.year().unwrap_or("-"),
            item.vote_average,
            item.title,
        );
    }
}

/// Loads `pages` pages into `listing`, one scroll signal per extra page.
async fn scroll_pages<T, F, Fut>(listing: &Listing<T>, pages: u32, fetch: F)
where
    T: ListItem + Clone,
    F: Fn(u32) -> Fut + Copy,
    Fut: Future<Output = ApiResult<PaginatedResult<T>>>,
{
    let mut outcome = listing.load_initial(fetch).await;
    for _ in 1..pages {
        if !matches!(outcome, LoadOutcome::Loaded { .. }) {
            break;
        }
        outcome = listing.load_more(&ScrollSignal::at_bottom(), fetch).await;
    }
    if let LoadOutcome::Failed(e) = outcome {
        tracing::warn!("Stopped early: {e}");
    }
}

/// Runs `home`.
///
/// # Errors
///
/// Returns an error if the client cannot be built or the feed fails.
#[instrument(skip_all)]
pub async fn run_home(ctx: &AppContext, args: &HomeArgs) -> Result<()> {
    let tmdb = ctx.tmdb_client()?;
    let feed = if args.tv {
        tv_home_feed(&tmdb, &ctx.shutdown).await
    } else {
        home_feed(&tmdb, &ctx.shutdown).await
    }
    .context("failed to load home feed")?;
    let feed = completed(feed)?;

    tracing::info!("== Trending ==");
    print_media_rows(&feed.trending);
    tracing::info!("== Popular ==");
    print_media_rows(&feed.popular);
    Ok(())
}

/// Runs `browse`.
///
/// # Errors
///
/// Returns an error if the client cannot be built.
#[instrument(skip_all)]
pub async fn run_browse(ctx: &AppContext, args: &BrowseArgs) -> Result<()> {
    let client = ctx.tmdb_client()?;
    let tmdb = &client;
    let (media, category, genre) = (args.media, args.category, args.genre);
    let listing = Listing::new(ListingMode::Browse, ctx.shutdown.child_token());

    scroll_pages(&listing, args.pages, |page| async move {
        match genre {
            Some(id) => genre_page(tmdb, media, id, page).await,
            None => listing_page(tmdb, media, category, page).await,
        }
    })
    .await;

    match genre {
        Some(id) => tracing::info!("== {} ==", genre_name(media, id)),
        None => tracing::info!("== {media} / {category} =="),
    }
    if let Some(error) = listing.error() {
        tracing::warn!("{error}");
    }
    print_media_rows(&listing.items());
    tracing::info!(
        "Pages: {}  More: {}  Total: {} titles",
        listing.current_page(),
        listing.has_more(),
        listing.items().len()
    );
    Ok(())
}

/// Runs `ranked`.
///
/// # Errors
///
/// Returns an error if the client cannot be built or any page fails.
#[instrument(skip_all)]
pub async fn run_ranked(ctx: &AppContext, args: &RankedArgs) -> Result<()> {
    let tmdb = ctx.tmdb_client()?;
    let preset = match args.list {
        RankedList::FanFavourites => MergePreset::FAN_FAVOURITES,
        RankedList::TopRatedTv => MergePreset::TOP_RATED_TV,
        RankedList::TopRatedMovies => MergePreset::TOP_RATED_MOVIES,
    };
    let ranked = ranked_listing(&tmdb, preset, &ctx.shutdown)
        .await
        .context("failed to load ranked list")?;
    let ranked = completed(ranked)?;

    tracing::info!("Rank\tID\tRating\tTitle");
    for entry in &ranked {
        tracing::info!(
            "#{}\t{}\t{:.1}\t{}",
            entry.rank,
            entry.item.id,
            entry.item.vote_average,
            entry.item.title,
        );
    }
    Ok(())
}

/// Runs `search`.
///
/// # Errors
///
/// Returns an error if the client cannot be built or any search fails.
#[instrument(skip_all)]
pub async fn run_search(ctx: &AppContext, args: &SearchArgs) -> Result<()> {
    let tmdb = ctx.tmdb_client()?;
    let results = search(&tmdb, &args.query, args.scope, &ctx.shutdown)
        .await
        .context("search failed")?;
    let results = completed(results)?;

    if args.scope.includes_titles() {
        tracing::info!("== Movies ({}) ==", results.movies.len());
        print_media_rows(&results.movies);
        tracing::info!("== TV ({}) ==", results.tv.len());
        print_media_rows(&results.tv);
    }
    if args.scope.includes_people() {
        tracing::info!("== People ({}) ==", results.people.len());
        for person in &results.people {
            tracing::info!(
                "{}\t{}\t{}",
                person.id,
                person.name,
                person.known_for_department.as_deref().unwrap_or("-"),
            );
        }
    }
    tracing::info!("Total: {} results", results.total());
    Ok(())
}

async fn recommendations_for(
    tmdb: &TmdbClient,
    backend: Option<&Backend>,
    media: MediaType,
    id: u64,
    token: &CancellationToken,
) -> Option<RecommendationSet> {
    match (media, backend) {
        (MediaType::Tv, _) => recommend_tv(tmdb, id, token).await,
        (MediaType::Movie, Some(Backend::Remote(session))) => {
            recommend_movies(tmdb, session.auth(), session.user_id(), id, token).await
        }
        (MediaType::Movie, Some(Backend::Local { store, user_id })) => {
            recommend_movies(tmdb, store, Some(*user_id), id, token).await
        }
        (MediaType::Movie, None) => provider_recommendations(tmdb, media, id, token).await,
    }
}

async fn member_reviews_from(
    store: &impl LocalUserDataApi,
    movie_id: u64,
) -> Vec<ReviewWithAuthor> {
    store
        .list_reviews_for_movie(movie_id)
        .await
        .unwrap_or_else(|e| {
            tracing::warn!("Member reviews unavailable: {e}");
            Vec::new()
        })
}

/// Runs `title`.
///
/// Member reviews and personalised recommendations are included when a
/// user-data backend is configured.
///
/// # Errors
///
/// Returns an error if the client cannot be built or the title page fails.
#[instrument(skip_all)]
pub async fn run_title(ctx: &mut AppContext, args: &TitleArgs) -> Result<()> {
    let tmdb = ctx.tmdb_client()?;
    let token = ctx.shutdown.clone();
    let media = media_of(args.tv);
    let backend = match ctx.open_backend().await {
        Ok(backend) => Some(backend),
        Err(e) => {
            tracing::debug!(error = %e, "continuing without user data");
            None
        }
    };

    let (page, watch, recommendations) = tokio::join!(
        title_page(&tmdb, media, args.id, &token),
        run_cancellable(
            &token,
            watch_options(&tmdb, media, args.id, args.country.as_deref())
        ),
        recommendations_for(&tmdb, backend.as_ref(), media, args.id, &token),
    );
    let page = completed(page.context("failed to load title")?)?;
    let watch = completed(watch)?;
    let recommendations = completed(recommendations)?;

    let members = match (&backend, media) {
        (Some(Backend::Remote(session)), MediaType::Movie) => {
            member_reviews_from(session.auth(), args.id).await
        }
        (Some(Backend::Local { store, .. }), MediaType::Movie) => {
            member_reviews_from(store, args.id).await
        }
        _ => Vec::new(),
    };

    let details = &page.details;
    tracing::info!("{} ({})", details.display_title(), details.id);
    if let Some(tagline) = details.tagline.as_deref().filter(|t| !t.is_empty()) {
        tracing::info!("\"{tagline}\"");
    }
    let genres: Vec<&str> = details.genres.iter().map(|g| g.name.as_str()).collect();
    tracing::info!(
        "Rating: {:.1} ({} votes)  Runtime: {}  Genres: {}",
        details.vote_average,
        details.vote_count,
        details
            .runtime
            .map_or_else(|| String::from("-"), |m| format!("{m} min")),
        genres.join(", "),
    );
    tracing::info!(
        "Poster: {}",
        image_url(details.poster_path.as_deref(), ImageSize::W500)
    );
    if let Some(overview) = details.overview.as_deref() {
        tracing::info!("{overview}");
    }
    if let Some(trailer) = &page.trailer {
        tracing::info!("Trailer: https://www.youtube.com/watch?v={}", trailer.key);
    }

    tracing::info!("== Cast ==");
    for member in &page.cast {
        tracing::info!(
            "{}\t{}\t{}",
            member.id,
            member.name,
            member.character.as_deref().unwrap_or("-")
        );
    }

    match watch {
        Ok(Some(options)) => {
            tracing::info!(
                "== Where to watch ({} of {}) ==",
                options.country,
                options.countries.join(",")
            );
            for (label, providers) in [
                ("Stream", &options.offers.flatrate),
                ("Rent", &options.offers.rent),
                ("Buy", &options.offers.buy),
            ] {
                if !providers.is_empty() {
                    let names: Vec<&str> =
                        providers.iter().map(|p| p.provider_name.as_str()).collect();
                    tracing::info!("{label}: {}", names.join(", "));
                }
            }
        }
        Ok(None) => tracing::info!("== Where to watch: no providers =="),
        Err(e) => tracing::warn!("Watch providers unavailable: {e}"),
    }

    let reviews = merge_reviews(page.reviews, members);
    tracing::info!("== Reviews ({}) ==", reviews.len());
    for review in &reviews {
        tracing::info!(
            "{}{}\t{}\t{}",
            review.author,
            if review.is_member { " (member)" } else { "" },
            review
                .rating
                .map_or_else(|| String::from("-"), |r| format!("{r:.0}/10")),
            review.content.lines().next().unwrap_or_default(),
        );
    }

    tracing::info!("== Similar ==");
    print_media_rows(&page.similar);
    tracing::info!("== Recommended ({:?}) ==", recommendations.source);
    print_media_rows(&recommendations.items);
    Ok(())
}

/// Runs `actor`.
///
/// # Errors
///
/// Returns an error if the client cannot be built or the page fails.
#[instrument(skip_all)]
pub async fn run_actor(ctx: &AppContext, args: &ActorArgs) -> Result<()> {
    let tmdb = ctx.tmdb_client()?;
    let page = actor_page(&tmdb, args.id, &ctx.shutdown)
        .await
        .context("failed to load person")?;
    let page = completed(page)?;

    let person = &page.person;
    tracing::info!("{} ({})", person.name, person.id);
    tracing::info!(
        "Born: {}  in {}",
        person.birthday.as_deref().unwrap_or("-"),
        person.place_of_birth.as_deref().unwrap_or("-"),
    );
    if let Some(bio) = person.biography.as_deref().filter(|b| !b.is_empty()) {
        tracing::info!("{bio}");
    }
    tracing::info!("== Known for ==");
    print_media_rows(&page.credits);
    Ok(())
}

/// Runs `people`.
///
/// # Errors
///
/// Returns an error if the client cannot be built.
#[instrument(skip_all)]
pub async fn run_people(ctx: &AppContext, args: &PeopleArgs) -> Result<()> {
    let client = ctx.tmdb_client()?;
    let tmdb = &client;
    let listing = Listing::new(ListingMode::Browse, ctx.shutdown.child_token());

    scroll_pages(&listing, args.pages, |page| people_page(tmdb, page)).await;

    tracing::info!("ID\tPopularity\tName");
    let people = listing.items();
    for person in &people {
        tracing::info!("{}\t{:.1}\t{}", person.id, person.popularity, person.name);
    }
    tracing::info!("Total: {} people", people.len());
    Ok(())
}

/// Runs `genres`.
///
/// # Errors
///
/// Returns an error if the client cannot be built or the run is interrupted.
#[instrument(skip_all)]
pub async fn run_genres(ctx: &AppContext, args: &GenresArgs) -> Result<()> {
    let tmdb = ctx.tmdb_client()?;
    let tiles = completed(genre_showcase(&tmdb, media_of(args.tv), &ctx.shutdown).await)?;

    tracing::info!("ID\tGenre\tImage");
    for tile in &tiles {
        tracing::info!(
            "{}\t{}\t{}",
            tile.id,
            tile.name,
            tile.backdrop_url.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}
