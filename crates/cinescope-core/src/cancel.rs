//! Cancellation helpers.

use std::future::Future;

use tokio_util::sync::CancellationToken;

/// Races `fut` against `token`.
///
/// Returns `None` if the token fires first; the future is dropped and its
/// result never observed.
pub async fn run_cancellable<F: Future>(token: &CancellationToken, fut: F) -> Option<F::Output> {
    tokio::select! {
        biased;
        () = token.cancelled() => None,
        out = fut => Some(out),
    }
}

/// [`run_cancellable`] for fallible futures: `Ok(None)` when cancelled.
///
/// # Errors
///
/// Returns the future's error if it completes first with one.
pub async fn try_cancellable<T, E, F>(token: &CancellationToken, fut: F) -> Result<Option<T>, E>
where
    F: Future<Output = Result<T, E>>,
{
    run_cancellable(token, fut).await.transpose()
}
