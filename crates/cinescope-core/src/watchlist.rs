//! Watchlist membership toggling.

use cinescope_api::ApiResult;
use cinescope_api::supabase::{LocalUserDataApi, MovieSnapshot};
use cinescope_api::tmdb::TmdbDetails;
use uuid::Uuid;

/// Snapshot of the display fields stored alongside a watchlist row.
#[must_use]
pub fn snapshot_from_details(details: &TmdbDetails) -> MovieSnapshot {
    MovieSnapshot {
        title: details.display_title().to_owned(),
        poster_path: details.poster_path.clone(),
        vote_average: Some(details.vote_average),
        release_date: details
            .release_date
            .clone()
            .or_else(|| details.first_air_date.clone()),
    }
}

/// Adds the movie if absent, removes it if present, then re-reads
/// membership. Returns the membership after the change.
///
/// # Errors
///
/// Any store failure is returned; a failed mutation leaves membership
/// as it was.
pub async fn toggle_watchlist(
    store: &impl LocalUserDataApi,
    user_id: Uuid,
    movie_id: u64,
    snapshot: &MovieSnapshot,
) -> ApiResult<bool> {
    if store.is_in_watchlist(user_id, movie_id).await? {
        store.remove_from_watchlist(user_id, movie_id).await?;
        tracing::info!(movie_id, "removed from watchlist");
    } else {
        store.add_to_watchlist(user_id, movie_id, snapshot).await?;
        tracing::info!(movie_id, "added to watchlist");
    }
    store.is_in_watchlist(user_id, movie_id).await
}
