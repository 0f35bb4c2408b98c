//! Local user-data store.
//!
//! Uses `rusqlite` (bundled `SQLite`) to keep watchlists, reviews, and
//! profiles with the same uniqueness rules as the hosted tables.

mod columns;
mod connection;
mod migrations;
/// Profile CRUD operations.
pub mod profiles;
/// Review CRUD operations.
pub mod reviews;
mod store;
/// Watchlist CRUD operations.
pub mod watchlists;

#[allow(clippy::module_name_repetitions)]
pub use connection::{open_db, open_memory_db};
pub use store::SqliteUserStore;
