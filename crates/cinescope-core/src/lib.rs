//! Engine behind cinescope's screens.
//!
//! Pagination, multi-page merges, scoped search, recommendations, and the
//! per-screen aggregations, generic over the metadata and user-data traits
//! from `cinescope-api`.

pub mod cancel;
pub mod fetch;
pub mod genres;
pub mod listing;
pub mod media;
pub mod merge;
pub mod pages;
pub mod recommend;
pub mod reviews;
pub mod search;
pub mod session;
pub mod watchlist;

#[cfg(test)]
mod test_support;

pub use listing::{Listing, ListingMode, ListingPhase, ListingState, LoadOutcome, ScrollSignal};
pub use media::{ItemKey, ListItem, MediaItem, PaginatedResult, PersonItem};
pub use session::{AuthEvent, SessionContext, SessionSubscription};
