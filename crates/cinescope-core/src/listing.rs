//! Infinite-scroll pagination.
//!
//! [`ListingState`] is the pure state machine; [`Listing`] drives it with
//! async fetches raced against a cancellation token.
//!
//! ```text
//! Idle -> Loading -> Ready -> LoadingMore -> Ready -> ... -> Exhausted
//! ```

use std::collections::HashSet;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

use cinescope_api::{ApiError, ApiResult};
use tokio_util::sync::CancellationToken;

use crate::cancel::run_cancellable;
use crate::media::{ItemKey, ListItem, PaginatedResult};

/// Distance from the bottom (in pixels) that counts as "near the bottom".
pub const SCROLL_THRESHOLD: f64 = 200.0;

/// Lifecycle of a listing session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingPhase {
    /// Nothing fetched yet.
    Idle,
    /// First page in flight.
    Loading,
    /// Items shown, more may follow.
    Ready,
    /// Next page in flight.
    LoadingMore,
    /// No more pages. Terminal.
    Exhausted,
}

/// Browse listings paginate; search listings are a single fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListingMode {
    /// Infinite scroll.
    #[default]
    Browse,
    /// One page, then exhausted.
    Search,
}

/// Viewport geometry reported by the front end.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollSignal {
    /// Scroll offset from the top.
    pub scroll_top: f64,
    /// Visible height.
    pub client_height: f64,
    /// Total content height.
    pub scroll_height: f64,
}

impl ScrollSignal {
    /// Creates a signal.
    #[must_use]
    pub const fn new(scroll_top: f64, client_height: f64, scroll_height: f64) -> Self {
        Self {
            scroll_top,
            client_height,
            scroll_height,
        }
    }

    /// A viewport scrolled all the way down.
    #[must_use]
    pub const fn at_bottom() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// `scroll_top + client_height >= scroll_height - 200`.
    #[must_use]
    pub fn near_bottom(&self) -> bool {
        self.scroll_top + self.client_height >= self.scroll_height - SCROLL_THRESHOLD
    }
}

/// Accumulated listing state.
#[derive(Debug, Clone)]
#[allow(clippy::module_name_repetitions)]
pub struct ListingState<T> {
    items: Vec<T>,
    current_page: u32,
    pending_page: u32,
    has_more: bool,
    phase: ListingPhase,
    mode: ListingMode,
    error: Option<String>,
}

impl<T: ListItem> ListingState<T> {
    /// Creates an idle session.
    #[must_use]
    pub const fn new(mode: ListingMode) -> Self {
        Self {
            items: Vec::new(),
            current_page: 0,
            pending_page: 0,
            has_more: true,
            phase: ListingPhase::Idle,
            mode,
            error: None,
        }
    }

    /// Accumulated items in arrival order.
    #[must_use]
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Last committed page (0 before the first).
    #[must_use]
    pub const fn current_page(&self) -> u32 {
        self.current_page
    }

    /// Whether another page may be requested.
    #[must_use]
    pub const fn has_more(&self) -> bool {
        self.has_more
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> ListingPhase {
        self.phase
    }

    /// Browse or search.
    #[must_use]
    pub const fn mode(&self) -> ListingMode {
        self.mode
    }

    /// Error of a failed initial load.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// `Idle -> Loading`. Returns the page to fetch.
    pub fn begin_initial(&mut self) -> Option<u32> {
        if self.phase != ListingPhase::Idle {
            return None;
        }
        self.phase = ListingPhase::Loading;
        self.pending_page = 1;
        Some(1)
    }

    /// `Ready -> LoadingMore` when near the bottom, more pages exist, and
    /// nothing is in flight. Returns the page to fetch.
    pub fn begin_more(&mut self, signal: &ScrollSignal) -> Option<u32> {
        if self.phase != ListingPhase::Ready
            || self.mode == ListingMode::Search
            || !self.has_more
            || !signal.near_bottom()
        {
            return None;
        }
        let next = self.current_page.saturating_add(1);
        self.phase = ListingPhase::LoadingMore;
        self.pending_page = next;
        Some(next)
    }

    /// Commits a fetched page. Returns the number of items appended.
    ///
    /// Items without an image are dropped; `has_more` follows the
    /// provider's unfiltered metadata and never becomes `true` again.
    pub fn apply_page(&mut self, page: PaginatedResult<T>) -> usize {
        if !matches!(self.phase, ListingPhase::Loading | ListingPhase::LoadingMore) {
            return 0;
        }

        let page_has_more = page.has_more();
        let raw_count = page.items.len();
        let fresh: Vec<T> = page.items.into_iter().filter(ListItem::has_image).collect();

        let mut seen: HashSet<ItemKey> = self.items.iter().map(ListItem::key).collect();
        let duplicates = fresh.iter().filter(|item| !seen.insert(item.key())).count();
        if duplicates > 0 {
            tracing::warn!(
                page = self.pending_page,
                duplicates,
                "page repeats items already listed"
            );
        }

        let appended = fresh.len();
        self.items.extend(fresh);
        self.current_page = self.pending_page;
        self.has_more = self.has_more && page_has_more && self.mode == ListingMode::Browse;
        self.phase = if self.has_more {
            ListingPhase::Ready
        } else {
            ListingPhase::Exhausted
        };

        tracing::debug!(
            page = self.current_page,
            raw_count,
            appended,
            total = self.items.len(),
            has_more = self.has_more,
            "listing page applied"
        );
        appended
    }

    /// Records a failed fetch.
    ///
    /// A failed first page leaves an empty exhausted session carrying the
    /// message; a failed later page returns to `Ready` untouched.
    pub fn fail(&mut self, message: String) {
        match self.phase {
            ListingPhase::Loading => {
                self.phase = ListingPhase::Exhausted;
                self.has_more = false;
                self.error = Some(message);
            }
            ListingPhase::LoadingMore => self.phase = ListingPhase::Ready,
            ListingPhase::Idle | ListingPhase::Ready | ListingPhase::Exhausted => {}
        }
    }

    /// Abandons an in-flight fetch without committing anything.
    pub fn cancel(&mut self) {
        match self.phase {
            ListingPhase::Loading => self.phase = ListingPhase::Idle,
            ListingPhase::LoadingMore => self.phase = ListingPhase::Ready,
            ListingPhase::Idle | ListingPhase::Ready | ListingPhase::Exhausted => {}
        }
    }
}

/// Result of one load attempt.
#[derive(Debug)]
pub enum LoadOutcome {
    /// Page committed, more may follow.
    Loaded {
        /// Items appended after filtering.
        appended: usize,
    },
    /// Page committed, session is now exhausted.
    Exhausted {
        /// Items appended after filtering.
        appended: usize,
    },
    /// Guard rejected the load; no fetch was issued.
    Skipped,
    /// Token fired; nothing committed.
    Cancelled,
    /// Fetch failed.
    Failed(ApiError),
}

/// A listing session shared between the view and its scroll handler.
#[derive(Debug)]
pub struct Listing<T> {
    state: Mutex<ListingState<T>>,
    token: CancellationToken,
}

impl<T: ListItem + Clone> Listing<T> {
    /// Creates an idle session bound to `token`.
    #[must_use]
    pub const fn new(mode: ListingMode, token: CancellationToken) -> Self {
        Self {
            state: Mutex::new(ListingState::new(mode)),
            token,
        }
    }

    fn lock(&self) -> MutexGuard<'_, ListingState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Loads page 1.
    pub async fn load_initial<F, Fut>(&self, fetch: F) -> LoadOutcome
    where
        F: FnOnce(u32) -> Fut,
        Fut: Future<Output = ApiResult<PaginatedResult<T>>>,
    {
        let Some(page) = self.lock().begin_initial() else {
            return LoadOutcome::Skipped;
        };
        self.run(page, fetch).await
    }

    /// Loads the next page if the scroll guard allows it.
    pub async fn load_more<F, Fut>(&self, signal: &ScrollSignal, fetch: F) -> LoadOutcome
    where
        F: FnOnce(u32) -> Fut,
        Fut: Future<Output = ApiResult<PaginatedResult<T>>>,
    {
        let Some(page) = self.lock().begin_more(signal) else {
            return LoadOutcome::Skipped;
        };
        self.run(page, fetch).await
    }

    async fn run<F, Fut>(&self, page: u32, fetch: F) -> LoadOutcome
    where
        F: FnOnce(u32) -> Fut,
        Fut: Future<Output = ApiResult<PaginatedResult<T>>>,
    {
        tracing::debug!(page, "listing fetch started");
        match run_cancellable(&self.token, fetch(page)).await {
            None => {
                self.lock().cancel();
                tracing::debug!(page, "listing fetch cancelled");
                LoadOutcome::Cancelled
            }
            Some(Err(err)) => {
                tracing::warn!(page, error = %err, "listing fetch failed");
                self.lock().fail(err.to_string());
                LoadOutcome::Failed(err)
            }
            Some(Ok(result)) => {
                let mut state = self.lock();
                if self.token.is_cancelled() {
                    state.cancel();
                    return LoadOutcome::Cancelled;
                }
                let appended = state.apply_page(result);
                if state.phase() == ListingPhase::Exhausted {
                    LoadOutcome::Exhausted { appended }
                } else {
                    LoadOutcome::Loaded { appended }
                }
            }
        }
    }

    /// Snapshot of the accumulated items.
    #[must_use]
    pub fn items(&self) -> Vec<T> {
        self.lock().items().to_vec()
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> ListingPhase {
        self.lock().phase()
    }

    /// Whether another page may be requested.
    #[must_use]
    pub fn has_more(&self) -> bool {
        self.lock().has_more()
    }

    /// Last committed page.
    #[must_use]
    pub fn current_page(&self) -> u32 {
        self.lock().current_page()
    }

    /// Error of a failed initial load.
    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.lock().error().map(ToOwned::to_owned)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::indexing_slicing)]

    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use cinescope_api::tmdb::MediaType;
    use tracing::subscriber::with_default;
    use tracing_mock::{expect, subscriber};

    use super::*;
    use crate::media::MediaItem;

    fn item(id: u64, poster: bool) -> MediaItem {
        MediaItem {
            id,
            media_type: MediaType::Movie,
            title: format!("Movie {id}"),
            poster_path: poster.then(|| format!("/{id}.jpg")),
            backdrop_path: None,
            vote_average: 7.0,
            release_date: None,
            popularity: 1.0,
            genre_ids: Vec::new(),
        }
    }

    fn page(page: u32, total_pages: u32, items: Vec<MediaItem>) -> PaginatedResult<MediaItem> {
        PaginatedResult {
            items,
            page,
            total_pages,
        }
    }

    #[test]
    fn test_scroll_threshold() {
        // Arrange & Act & Assert
        assert!(ScrollSignal::new(600.0, 200.0, 1000.0).near_bottom());
        assert!(!ScrollSignal::new(599.0, 200.0, 1000.0).near_bottom());
        assert!(ScrollSignal::at_bottom().near_bottom());
    }

    #[test]
    fn test_accumulated_length_is_sum_of_filtered_pages() {
        // Arrange
        let mut state = ListingState::new(ListingMode::Browse);
        let pages = [
            page(1, 3, vec![item(1, true), item(2, false), item(3, true)]),
            page(2, 3, vec![item(4, false), item(5, true)]),
            page(3, 3, vec![item(6, true)]),
        ];
        let signal = ScrollSignal::at_bottom();
        let mut lengths = Vec::new();

        // Act
        state.begin_initial().unwrap();
        for (idx, p) in pages.into_iter().enumerate() {
            if idx > 0 {
                state.begin_more(&signal).unwrap();
            }
            state.apply_page(p);
            lengths.push(state.items().len());
        }

        // Assert
        assert_eq!(lengths, vec![2, 3, 4]);
        assert_eq!(state.phase(), ListingPhase::Exhausted);
    }

    #[test]
    fn test_has_more_follows_unfiltered_metadata() {
        // Arrange
        let mut state = ListingState::new(ListingMode::Browse);
        state.begin_initial().unwrap();

        // Act: every item filtered, but the provider reports more pages
        let appended = state.apply_page(page(1, 2, vec![item(1, false)]));

        // Assert
        assert_eq!(appended, 0);
        assert!(state.has_more());
        assert_eq!(state.phase(), ListingPhase::Ready);
    }

    #[test]
    fn test_has_more_flips_false_once() {
        // Arrange
        let mut state = ListingState::new(ListingMode::Browse);
        let signal = ScrollSignal::at_bottom();
        state.begin_initial().unwrap();
        state.apply_page(page(1, 5, vec![item(1, true)]));

        // Act: empty page ends the session
        state.begin_more(&signal).unwrap();
        state.apply_page(page(2, 5, Vec::new()));

        // Assert
        assert!(!state.has_more());
        assert_eq!(state.phase(), ListingPhase::Exhausted);
        assert!(state.begin_more(&signal).is_none());
        assert_eq!(state.apply_page(page(3, 5, vec![item(9, true)])), 0);
        assert!(!state.has_more());
    }

    #[test]
    fn test_begin_more_requires_scroll_proximity() {
        // Arrange
        let mut state = ListingState::new(ListingMode::Browse);
        state.begin_initial().unwrap();
        state.apply_page(page(1, 5, vec![item(1, true)]));

        // Act
        let far = state.begin_more(&ScrollSignal::new(0.0, 100.0, 5000.0));
        let near = state.begin_more(&ScrollSignal::new(4750.0, 100.0, 5000.0));

        // Assert
        assert_eq!(far, None);
        assert_eq!(near, Some(2));
    }

    #[test]
    fn test_duplicate_items_are_kept_and_warned() {
        // Arrange
        let mut state = ListingState::new(ListingMode::Browse);
        state.begin_initial().unwrap();
        state.apply_page(page(1, 3, vec![item(1, true), item(2, true)]));
        state.begin_more(&ScrollSignal::at_bottom()).unwrap();

        let (subscriber, handle) = subscriber::mock()
            .event(expect::event().at_level(tracing::Level::WARN))
            .run_with_handle();

        // Act
        with_default(subscriber, || {
            state.apply_page(page(2, 3, vec![item(2, true), item(3, true)]));
        });

        // Assert
        handle.assert_finished();
        assert_eq!(state.items().len(), 4);
    }

    #[test]
    fn test_search_mode_exhausts_after_one_page() {
        // Arrange
        let mut state = ListingState::new(ListingMode::Search);
        state.begin_initial().unwrap();

        // Act
        state.apply_page(page(1, 10, vec![item(1, true)]));

        // Assert
        assert_eq!(state.phase(), ListingPhase::Exhausted);
        assert!(state.begin_more(&ScrollSignal::at_bottom()).is_none());
    }

    #[tokio::test]
    async fn test_overlapping_scroll_signals_issue_one_fetch() {
        // Arrange
        let listing = Listing::new(ListingMode::Browse, CancellationToken::new());
        listing
            .load_initial(|p| async move { Ok(page(p, 5, vec![item(1, true)])) })
            .await;
        let calls = AtomicU32::new(0);
        let slow_fetch = |p: u32| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                Ok(page(p, 5, vec![item(u64::from(p).saturating_add(100), true)]))
            }
        };
        let signal = ScrollSignal::at_bottom();

        // Act
        let (first, second) = tokio::join!(
            listing.load_more(&signal, slow_fetch),
            listing.load_more(&signal, slow_fetch)
        );

        // Assert
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(first, LoadOutcome::Loaded { appended: 1 }));
        assert!(matches!(second, LoadOutcome::Skipped));
        assert_eq!(listing.current_page(), 2);
    }

    #[tokio::test]
    async fn test_failed_load_more_returns_to_ready() {
        // Arrange
        let listing = Listing::new(ListingMode::Browse, CancellationToken::new());
        listing
            .load_initial(|p| async move { Ok(page(p, 5, vec![item(1, true), item(2, true)])) })
            .await;

        // Act
        let outcome = listing
            .load_more(&ScrollSignal::at_bottom(), |_| async {
                Err(ApiError::Provider(String::from("HTTP 500")))
            })
            .await;

        // Assert
        assert!(matches!(outcome, LoadOutcome::Failed(ApiError::Provider(_))));
        assert_eq!(listing.phase(), ListingPhase::Ready);
        assert_eq!(listing.items().len(), 2);
        assert_eq!(listing.current_page(), 1);
        assert!(listing.error().is_none());
    }

    #[tokio::test]
    async fn test_failed_initial_load_is_empty_exhausted() {
        // Arrange
        let listing: Listing<MediaItem> =
            Listing::new(ListingMode::Browse, CancellationToken::new());

        // Act
        let outcome = listing
            .load_initial(|_| async { Err(ApiError::Provider(String::from("offline"))) })
            .await;

        // Assert
        assert!(matches!(outcome, LoadOutcome::Failed(_)));
        assert_eq!(listing.phase(), ListingPhase::Exhausted);
        assert!(listing.items().is_empty());
        assert!(listing.error().unwrap().contains("offline"));
    }

    #[tokio::test]
    async fn test_cancelled_fetch_never_commits() {
        // Arrange
        let token = CancellationToken::new();
        let listing = Listing::new(ListingMode::Browse, token.clone());

        // Act
        let (outcome, ()) = tokio::join!(
            listing.load_initial(|p| async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok(page(p, 2, vec![item(1, true)]))
            }),
            async {
                tokio::time::sleep(Duration::from_millis(5)).await;
                token.cancel();
            }
        );

        // Assert
        assert!(matches!(outcome, LoadOutcome::Cancelled));
        assert!(listing.items().is_empty());
        assert_eq!(listing.phase(), ListingPhase::Idle);
    }

    #[tokio::test]
    async fn test_parent_token_tears_down_child_listing() {
        // Arrange
        let shutdown = CancellationToken::new();
        let listing = Listing::new(ListingMode::Browse, shutdown.child_token());
        listing
            .load_initial(|p| async move { Ok(page(p, 3, vec![item(1, true)])) })
            .await;

        let signal = ScrollSignal::at_bottom();

        // Act
        let (outcome, ()) = tokio::join!(
            listing.load_more(&signal, |p| async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok(page(p, 3, vec![item(2, true)]))
            }),
            async {
                tokio::time::sleep(Duration::from_millis(5)).await;
                shutdown.cancel();
            }
        );

        // Assert
        assert!(matches!(outcome, LoadOutcome::Cancelled));
        assert_eq!(listing.items().len(), 1);
        assert_eq!(listing.phase(), ListingPhase::Ready);
        assert_eq!(listing.current_page(), 1);
    }
}
