//! cinescope - movie and TV discovery CLI.

/// Client construction and backend selection.
mod backend;
/// Subcommand handlers.
mod commands;
/// Application configuration (TOML) and session persistence.
mod config;

use std::path::PathBuf;

use anyhow::{Result, bail};
use cinescope_core::cancel::run_cancellable;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::filter::EnvFilter;
#[cfg(not(feature = "otel"))]
use tracing_subscriber::fmt;
#[cfg(feature = "otel")]
use tracing_subscriber::layer::SubscriberExt;
#[cfg(feature = "otel")]
use tracing_subscriber::util::SubscriberInitExt;

use crate::backend::AppContext;
use crate::commands::account::{
    AuthCommands, ProfileCommands, ReviewCommands, WatchlistCommands, run_auth, run_profile,
    run_review, run_watchlist,
};
use crate::commands::catalog::{
    ActorArgs, BrowseArgs, GenresArgs, HomeArgs, PeopleArgs, RankedArgs, SearchArgs, TitleArgs,
    run_actor, run_browse, run_genres, run_home, run_people, run_ranked, run_search, run_title,
};

/// CLI argument parser.
#[derive(Parser)]
#[command(about, version)]
struct Cli {
    /// Override config/data directory.
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Trending and popular titles.
    Home(HomeArgs),
    /// Page through a listing category or genre.
    Browse(BrowseArgs),
    /// Ranked top lists merged from several pages.
    Ranked(RankedArgs),
    /// Search movies, TV, and people.
    Search(SearchArgs),
    /// Title detail page.
    Title(TitleArgs),
    /// Person detail page.
    Actor(ActorArgs),
    /// Popular people.
    People(PeopleArgs),
    /// Genre showcase.
    Genres(GenresArgs),
    /// Sign in, sign up, sign out.
    Auth {
        /// Auth subcommand to run.
        #[command(subcommand)]
        command: AuthCommands,
    },
    /// Manage your watchlist.
    Watchlist {
        /// Watchlist subcommand to run.
        #[command(subcommand)]
        command: WatchlistCommands,
    },
    /// Read and write member reviews.
    Review {
        /// Review subcommand to run.
        #[command(subcommand)]
        command: ReviewCommands,
    },
    /// Show or edit your profile.
    Profile {
        /// Profile subcommand to run.
        #[command(subcommand)]
        command: ProfileCommands,
    },
}

/// Cancels `token` on Ctrl-C.
async fn cancel_on_interrupt(token: CancellationToken) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::warn!("Interrupted, abandoning pending requests");
            token.cancel();
        }
        Err(e) => tracing::debug!(error = %e, "Ctrl-C handler unavailable"),
    }
}

async fn dispatch(command: &Commands, ctx: &mut AppContext) -> Result<()> {
    match command {
        Commands::Home(args) => run_home(ctx, args).await,
        Commands::Browse(args) => run_browse(ctx, args).await,
        Commands::Ranked(args) => run_ranked(ctx, args).await,
        Commands::Search(args) => run_search(ctx, args).await,
        Commands::Title(args) => run_title(ctx, args).await,
        Commands::Actor(args) => run_actor(ctx, args).await,
        Commands::People(args) => run_people(ctx, args).await,
        Commands::Genres(args) => run_genres(ctx, args).await,
        Commands::Auth { command } => run_auth(ctx, command).await,
        Commands::Watchlist { command } => run_watchlist(ctx, command).await,
        Commands::Review { command } => run_review(ctx, command).await,
        Commands::Profile { command } => run_profile(ctx, command).await,
    }
}

/// Entry point.
///
/// # Errors
///
/// Returns an error if subcommand execution fails.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    #[cfg(not(feature = "otel"))]
    {
        fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_target(false)
            .init();
    }

    #[cfg(feature = "otel")]
    {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);
        let endpoint = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT").ok();

        let otel_layer = endpoint.as_ref().and_then(|_| {
            let exporter = opentelemetry_otlp::SpanExporter::builder()
                .with_http()
                .build()
                .ok()?;

            let tracer_provider = opentelemetry_sdk::trace::SdkTracerProvider::builder()
                .with_simple_exporter(exporter)
                .build();

            let tracer = opentelemetry::trace::TracerProvider::tracer(
                &tracer_provider,
                env!("CARGO_PKG_NAME"),
            );
            opentelemetry::global::set_tracer_provider(tracer_provider);

            Some(tracing_opentelemetry::layer().with_tracer(tracer))
        });

        // Forwards log events to the same collector as spans.
        let log_layer = endpoint.as_ref().and_then(|_| {
            let exporter = opentelemetry_otlp::LogExporter::builder()
                .with_http()
                .build()
                .ok()?;

            let logger_provider = opentelemetry_sdk::logs::SdkLoggerProvider::builder()
                .with_simple_exporter(exporter)
                .build();

            Some(
                opentelemetry_appender_tracing::layer::OpenTelemetryTracingBridge::new(
                    &logger_provider,
                ),
            )
        });

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .with(otel_layer)
            .with(log_layer)
            .init();
    }

    let cli = Cli::parse();
    let mut ctx = AppContext::load(cli.dir.as_ref())?;
    let shutdown = ctx.shutdown.clone();
    tokio::spawn(cancel_on_interrupt(shutdown.clone()));
    match run_cancellable(&shutdown, dispatch(&cli.command, &mut ctx)).await {
        Some(result) => result,
        None => bail!("interrupted"),
    }
}
