//! Subcommand handlers.

/// Auth, watchlist, review, and profile commands.
pub mod account;
/// Browsing, search, and detail-page commands.
pub mod catalog;
