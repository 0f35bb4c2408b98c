//! Account commands: auth, watchlist, reviews, and profile.

use std::path::Path;

use anyhow::{Context, Result, bail};
use cinescope_api::ApiError;
use cinescope_api::supabase::{LocalAuthApi, LocalUserDataApi, MovieSnapshot, Rating};
use cinescope_api::tmdb::{LocalTmdbApi, MediaType};
use cinescope_core::watchlist::{snapshot_from_details, toggle_watchlist};
use cinescope_core::{AuthEvent, SessionContext};
use clap::Subcommand;
use tracing::instrument;
use uuid::Uuid;

use crate::backend::{AppContext, Backend};
use crate::config::{StoreBackend, clear_session, save_session};

/// Auth subcommands.
#[derive(Subcommand)]
pub enum AuthCommands {
    /// Sign in with email and password.
    SignIn {
        /// Account email.
        #[arg(long)]
        email: String,
        /// Password (falls back to `CINESCOPE_PASSWORD`).
        #[arg(long)]
        password: Option<String>,
    },
    /// Create an account.
    SignUp {
        /// Account email.
        #[arg(long)]
        email: String,
        /// Display name.
        #[arg(long)]
        username: String,
        /// Password (falls back to `CINESCOPE_PASSWORD`).
        #[arg(long)]
        password: Option<String>,
    },
    /// Sign out and forget the saved session.
    SignOut,
    /// Show the signed-in user.
    Status,
}

/// Watchlist subcommands.
#[derive(Subcommand)]
pub enum WatchlistCommands {
    /// List the watchlist, newest first.
    List,
    /// Add a movie.
    Add {
        /// TMDB movie ID.
        movie_id: u64,
    },
    /// Remove a movie.
    Remove {
        /// TMDB movie ID.
        movie_id: u64,
    },
    /// Add the movie if absent, remove it if present.
    Toggle {
        /// TMDB movie ID.
        movie_id: u64,
    },
}

/// Review subcommands.
#[derive(Subcommand)]
pub enum ReviewCommands {
    /// List member reviews of a movie.
    List {
        /// TMDB movie ID.
        movie_id: u64,
    },
    /// List your own reviews.
    Mine,
    /// Write (or replace) your review of a movie.
    Write {
        /// TMDB movie ID.
        movie_id: u64,
        /// Rating from 1 to 10.
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=10))]
        rating: u8,
        /// Review text.
        #[arg(long, default_value = "")]
        text: String,
    },
    /// Edit an existing review by its ID.
    Edit {
        /// Review ID.
        review_id: i64,
        /// Rating from 1 to 10.
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=10))]
        rating: u8,
        /// Review text.
        #[arg(long, default_value = "")]
        text: String,
    },
    /// Delete a review by its ID.
    Delete {
        /// Review ID.
        review_id: i64,
    },
}

/// Profile subcommands.
#[derive(Subcommand)]
pub enum ProfileCommands {
    /// Show the profile and activity counts.
    Show,
    /// Change the display name.
    SetUsername {
        /// New display name.
        username: String,
    },
}

fn password_or_env(password: Option<&str>) -> Result<String> {
    if let Some(p) = password.filter(|p| !p.is_empty()) {
        return Ok(p.to_owned());
    }
    std::env::var("CINESCOPE_PASSWORD")
        .ok()
        .filter(|p| !p.is_empty())
        .context("password is required (use --password or set CINESCOPE_PASSWORD)")
}

/// Runs `auth` subcommands.
///
/// # Errors
///
/// Returns an error if the local backend is selected or the auth call fails.
#[instrument(skip_all)]
pub async fn run_auth(ctx: &AppContext, command: &AuthCommands) -> Result<()> {
    if ctx.config.store.backend == StoreBackend::Local {
        bail!("the local store has no accounts; set [store].backend = \"supabase\" to sign in");
    }
    let session = ctx.session_context().await?;
    auth_with(&session, &ctx.session_path(), command).await
}

/// Mirrors a session change onto the session file.
fn persist_auth_event(session_file: &Path, event: &AuthEvent) -> Result<()> {
    match event {
        AuthEvent::SignedIn(session) => save_session(session_file, session),
        AuthEvent::SignedOut => clear_session(session_file),
    }
}

/// Runs an auth command; the session file follows whatever change
/// `session` publishes.
async fn auth_with<A: LocalAuthApi>(
    session: &SessionContext<A>,
    session_file: &Path,
    command: &AuthCommands,
) -> Result<()> {
    let mut changes = session.subscribe();

    match command {
        AuthCommands::SignIn { email, password } => {
            let password = password_or_env(password.as_deref())?;
            let signed_in = session
                .sign_in(email, &password)
                .await
                .context("sign-in failed")?;
            tracing::info!(
                "Signed in as {}",
                signed_in.user.email.as_deref().unwrap_or(email)
            );
        }
        AuthCommands::SignUp {
            email,
            username,
            password,
        } => {
            let password = password_or_env(password.as_deref())?;
            match session
                .sign_up(email, &password, username)
                .await
                .context("sign-up failed")?
            {
                Some(_) => tracing::info!("Signed up and signed in as {username}"),
                None => tracing::info!("Check your email to confirm the account"),
            }
        }
        AuthCommands::SignOut => {
            if let Err(e) = session.sign_out().await {
                tracing::warn!("Remote sign-out failed, cleared local session anyway: {e}");
            }
            tracing::info!("Signed out");
        }
        AuthCommands::Status => match session.current() {
            Some(current) => {
                tracing::info!(
                    "Signed in as {} ({})",
                    current
                        .user
                        .username()
                        .or(current.user.email.as_deref())
                        .unwrap_or("-"),
                    current.user.id
                );
            }
            None => tracing::info!("Not signed in"),
        },
    }

    // Signing out while already signed out publishes nothing; a stale file
    // must still go.
    let event = changes.try_next().or_else(|| {
        matches!(command, AuthCommands::SignOut).then_some(AuthEvent::SignedOut)
    });
    changes.unsubscribe();
    if let Some(event) = event {
        persist_auth_event(session_file, &event)?;
    }
    Ok(())
}

async fn movie_snapshot(tmdb: &impl LocalTmdbApi, movie_id: u64) -> Result<MovieSnapshot> {
    let details = tmdb
        .details(MediaType::Movie, movie_id)
        .await
        .with_context(|| format!("failed to load movie {movie_id}"))?;
    Ok(snapshot_from_details(&details))
}

async fn watchlist_with(
    ctx: &AppContext,
    store: &impl LocalUserDataApi,
    user_id: Uuid,
    command: &WatchlistCommands,
) -> Result<()> {
    match command {
        WatchlistCommands::List => {
            let entries = store
                .list_watchlist(user_id)
                .await
                .context("failed to load watchlist")?;
            tracing::info!("ID\tYear\tRating\tTitle");
            for entry in &entries {
                tracing::info!(
                    "{}\t{}\t{}\t{}",
                    entry.movie_id,
                    entry
                        .release_date
                        .as_deref()
                        .and_then(|d| d.get(..4))
                        .unwrap_or("-"),
                    entry
                        .vote_average
                        .map_or_else(|| String::from("-"), |v| format!("{v:.1}")),
                    entry.title,
                );
            }
            tracing::info!("Total: {} titles", entries.len());
        }
        WatchlistCommands::Add { movie_id } => {
            let snapshot = movie_snapshot(&ctx.tmdb_client()?, *movie_id).await?;
            match store.add_to_watchlist(user_id, *movie_id, &snapshot).await {
                Ok(_) => tracing::info!("Added \"{}\" to watchlist", snapshot.title),
                Err(ApiError::Conflict(_)) => {
                    tracing::info!("\"{}\" is already in watchlist", snapshot.title);
                }
                Err(e) => return Err(e).context("failed to add to watchlist"),
            }
        }
        WatchlistCommands::Remove { movie_id } => {
            store
                .remove_from_watchlist(user_id, *movie_id)
                .await
                .context("failed to remove from watchlist")?;
            tracing::info!("Removed {movie_id} from watchlist");
        }
        WatchlistCommands::Toggle { movie_id } => {
            let snapshot = movie_snapshot(&ctx.tmdb_client()?, *movie_id).await?;
            let listed = toggle_watchlist(store, user_id, *movie_id, &snapshot)
                .await
                .context("failed to toggle watchlist")?;
            if listed {
                tracing::info!("\"{}\" is now in watchlist", snapshot.title);
            } else {
                tracing::info!("\"{}\" is no longer in watchlist", snapshot.title);
            }
        }
    }
    Ok(())
}

/// Runs `watchlist` subcommands.
///
/// # Errors
///
/// Returns an error if no user is available or the store call fails.
#[instrument(skip_all)]
pub async fn run_watchlist(ctx: &mut AppContext, command: &WatchlistCommands) -> Result<()> {
    let backend = ctx.open_backend().await?;
    let user_id = backend.user_id()?;
    match &backend {
        Backend::Remote(session) => watchlist_with(ctx, session.auth(), user_id, command).await,
        Backend::Local { store, .. } => watchlist_with(ctx, store, user_id, command).await,
    }
}

fn rating_label(rating: Rating) -> String {
    format!("{}/10", rating.get())
}

async fn reviews_with(
    ctx: &AppContext,
    store: &impl LocalUserDataApi,
    backend: &Backend,
    command: &ReviewCommands,
) -> Result<()> {
    match command {
        ReviewCommands::List { movie_id } => {
            let reviews = store
                .list_reviews_for_movie(*movie_id)
                .await
                .context("failed to load reviews")?;
            tracing::info!("ID\tRating\tAuthor\tReview");
            for entry in &reviews {
                tracing::info!(
                    "{}\t{}\t{}\t{}",
                    entry.review.id,
                    rating_label(entry.review.rating),
                    entry.username,
                    entry.review.content,
                );
            }
            tracing::info!("Total: {} reviews", reviews.len());
        }
        ReviewCommands::Mine => {
            let reviews = store
                .list_user_reviews(backend.user_id()?)
                .await
                .context("failed to load reviews")?;
            tracing::info!("ID\tMovie\tRating\tTitle");
            for review in &reviews {
                tracing::info!(
                    "{}\t{}\t{}\t{}",
                    review.id,
                    review.movie_id,
                    rating_label(review.rating),
                    review.movie_title.as_deref().unwrap_or("-"),
                );
            }
            tracing::info!("Total: {} reviews", reviews.len());
        }
        ReviewCommands::Write {
            movie_id,
            rating,
            text,
        } => {
            let rating = Rating::new(*rating)?;
            let user_id = backend.user_id()?;
            let snapshot = movie_snapshot(&ctx.tmdb_client()?, *movie_id).await?;
            let review = store
                .upsert_review(user_id, *movie_id, rating, text, &snapshot)
                .await
                .context("failed to save review")?;
            tracing::info!(
                "Saved review {} of \"{}\" ({})",
                review.id,
                snapshot.title,
                rating_label(review.rating)
            );
        }
        ReviewCommands::Edit {
            review_id,
            rating,
            text,
        } => {
            let rating = Rating::new(*rating)?;
            backend.user_id()?;
            let review = store
                .update_review(*review_id, rating, text)
                .await
                .context("failed to update review")?;
            tracing::info!(
                "Updated review {} ({})",
                review.id,
                rating_label(review.rating)
            );
        }
        ReviewCommands::Delete { review_id } => {
            backend.user_id()?;
            store
                .delete_review(*review_id)
                .await
                .context("failed to delete review")?;
            tracing::info!("Deleted review {review_id}");
        }
    }
    Ok(())
}

/// Runs `review` subcommands.
///
/// Listing a movie's reviews works signed out; writing requires a user.
///
/// # Errors
///
/// Returns an error if the backend cannot be opened or the store call fails.
#[instrument(skip_all)]
pub async fn run_review(ctx: &mut AppContext, command: &ReviewCommands) -> Result<()> {
    let backend = ctx.open_backend().await?;
    match &backend {
        Backend::Remote(session) => reviews_with(ctx, session.auth(), &backend, command).await,
        Backend::Local { store, .. } => reviews_with(ctx, store, &backend, command).await,
    }
}

async fn profile_with(
    store: &impl LocalUserDataApi,
    user_id: Uuid,
    command: &ProfileCommands,
) -> Result<()> {
    match command {
        ProfileCommands::Show => {
            let (profile, stats) = tokio::try_join!(
                store.get_profile(user_id),
                store.user_stats(user_id)
            )
            .context("failed to load profile")?;
            let username = profile
                .as_ref()
                .and_then(|p| p.username.as_deref())
                .unwrap_or("(no username)");
            tracing::info!("User: {username} ({user_id})");
            tracing::info!(
                "Watchlist: {}  Reviews: {}",
                stats.watchlist_count,
                stats.reviews_count
            );
        }
        ProfileCommands::SetUsername { username } => {
            let username = username.trim();
            if username.is_empty() {
                bail!("username must not be empty");
            }
            let profile = store
                .update_username(user_id, username)
                .await
                .context("failed to update username")?;
            tracing::info!(
                "Username set to {}",
                profile.username.as_deref().unwrap_or(username)
            );
        }
    }
    Ok(())
}

/// Runs `profile` subcommands.
///
/// # Errors
///
/// Returns an error if no user is available or the store call fails.
#[instrument(skip_all)]
pub async fn run_profile(ctx: &mut AppContext, command: &ProfileCommands) -> Result<()> {
    let backend = ctx.open_backend().await?;
    let user_id = backend.user_id()?;
    match &backend {
        Backend::Remote(session) => profile_with(session.auth(), user_id, command).await,
        Backend::Local { store, .. } => profile_with(store, user_id, command).await,
    }
}
