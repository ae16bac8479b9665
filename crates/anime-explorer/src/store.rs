//! Anime list and favourites state.
//!
//! `AnimeListStore` owns the fetched records, the favourite ids and the
//! filter selection. Fetches merge pages into the list (page 1 replaces,
//! later pages append), favourites are written through to a key-value store
//! after every change, and the displayed list is derived on demand.
//!
//! The store is meant to be shared behind an `Arc`. State sits behind a
//! mutex that is never held across an await; overlapping fetches are
//! resolved by sequence number so only the newest issued request applies.

use crate::api::client::MAX_PAGE_LIMIT;
use crate::api::{AnimeApi, ApiFailure};
use crate::details::AnimeDetails;
use crate::favourites::FavouriteSet;
use crate::filter::{GenreFilter, ListFilter};
use crate::models::AnimeRecord;
use crate::subscription::{Registry, StoreEvent, Subscription};
use shared::KeyValueStore;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Page size used when none is configured
pub const DEFAULT_PAGE_LIMIT: u32 = 25;

/// Result of a fetch request. Failures are values, never panics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The page was merged into the list
    Applied { page: u32, count: usize },
    /// A newer request was issued while this one was in flight; its result was dropped
    Stale { page: u32 },
    /// The last applied page said there is nothing after it; no request was made
    Exhausted { page: u32 },
    /// The API could not deliver the page; the list is unchanged
    Failed(ApiFailure),
}

impl FetchOutcome {
    /// Whether the caller should show an error state
    pub fn is_error(&self) -> bool {
        matches!(self, FetchOutcome::Failed(_))
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, FetchOutcome::Applied { .. })
    }
}

/// Errors from store mutations
#[derive(Debug, Error)]
pub enum StoreError {
    /// The favourites write failed; the in-memory change was rolled back
    #[error("failed to persist favourites: {0:#}")]
    Persist(anyhow::Error),
}

struct StoreState {
    records: Vec<AnimeRecord>,
    favourites: FavouriteSet,
    favourites_loaded: bool,
    genre_filter: GenreFilter,
    favourites_only: bool,
    /// Last applied page
    page: u32,
    /// From the last applied page; `None` until known
    has_next_page: Option<bool>,
    /// Genres of the last applied page 1; `None` before any page 1 applied
    listed_genres: Option<Vec<u32>>,
}

impl Default for StoreState {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            favourites: FavouriteSet::new(),
            favourites_loaded: false,
            genre_filter: GenreFilter::new(),
            favourites_only: false,
            page: 1,
            has_next_page: None,
            listed_genres: None,
        }
    }
}

/// Client-side state for browsing anime and keeping favourites
pub struct AnimeListStore<C> {
    client: C,
    storage: Arc<dyn KeyValueStore>,
    page_limit: u32,
    state: Mutex<StoreState>,
    /// Sequence number of the most recently issued fetch
    issued: AtomicU64,
    listeners: Arc<Registry>,
}

impl<C: AnimeApi> AnimeListStore<C> {
    /// Create a store. Call [`initialize`](Self::initialize) before use.
    pub fn new(client: C, storage: Arc<dyn KeyValueStore>) -> Self {
        Self {
            client,
            storage,
            page_limit: DEFAULT_PAGE_LIMIT,
            state: Mutex::new(StoreState::default()),
            issued: AtomicU64::new(0),
            listeners: Arc::new(Registry::default()),
        }
    }

    /// Page size used by `refresh` and `load_more`
    pub fn with_page_limit(mut self, limit: u32) -> Self {
        self.page_limit = limit.clamp(1, MAX_PAGE_LIMIT);
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    fn state(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Load favourites from storage. Until this has run the store is not ready
    /// and favourite changes are not persisted.
    pub fn initialize(&self) {
        let count = {
            let mut state = self.state();
            if state.favourites_loaded {
                debug!("Store already initialized");
                return;
            }

            state.favourites = FavouriteSet::load(self.storage.as_ref());
            state.favourites_loaded = true;
            state.favourites.len()
        };

        info!(favourites = count, "Anime store initialized");
        self.listeners.notify(&StoreEvent::FavouritesLoaded { count });
    }

    pub fn is_ready(&self) -> bool {
        self.state().favourites_loaded
    }

    /// Fetch one page and merge it into the list.
    ///
    /// Page 1 replaces the list, later pages append in arrival order.
    /// Duplicate ids across pages are kept as sent. `page` is raised to at
    /// least 1 and `limit` clamped to what the API accepts.
    pub async fn fetch_page(&self, page: u32, limit: u32, genres: Option<&GenreFilter>) -> FetchOutcome {
        let page = page.max(1);
        let limit = limit.clamp(1, MAX_PAGE_LIMIT);
        let seq = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let genre_ids = genres.map(GenreFilter::ids);

        debug!(seq = seq, page = page, limit = limit, "Fetch issued");
        let result = self
            .client
            .fetch_anime_list(page, limit, genre_ids.as_deref())
            .await;

        let (event, count) = {
            let mut state = self.state();

            if seq != self.issued.load(Ordering::SeqCst) {
                debug!(seq = seq, page = page, "Discarding stale fetch result");
                return FetchOutcome::Stale { page };
            }

            let fetched = match result {
                Ok(fetched) => fetched,
                Err(failure) => {
                    drop(state);
                    error!(
                        page = page,
                        kind = failure.kind(),
                        retriable = failure.is_retriable(),
                        error = %failure,
                        "Error fetching anime"
                    );
                    return FetchOutcome::Failed(failure);
                }
            };

            let count = fetched.records.len();
            if page == 1 {
                state.records = fetched.records;
                state.listed_genres = Some(genre_ids.unwrap_or_default());
            } else {
                state.records.extend(fetched.records);
            }
            state.page = page;
            state.has_next_page = fetched.has_next_page;

            debug!(page = page, count = count, total = state.records.len(), "Fetch applied");
            let event = if page == 1 {
                StoreEvent::RecordsReplaced { page, count }
            } else {
                StoreEvent::RecordsAppended { page, count }
            };
            (event, count)
        };

        self.listeners.notify(&event);
        FetchOutcome::Applied { page, count }
    }

    /// Reload from page 1 with the current genre filter
    pub async fn refresh(&self) -> FetchOutcome {
        let genres = self.state().genre_filter.clone();
        self.fetch_page(1, self.page_limit, Some(&genres)).await
    }

    /// Fetch the page after the last applied one with the current genre filter.
    ///
    /// If page 1 for the current filter has not been applied yet (no fetch so
    /// far, or the filter changed and its reload failed), page 1 is fetched
    /// instead so no page of the listing is skipped.
    pub async fn load_more(&self) -> FetchOutcome {
        let (page, has_next_page, genres, listed) = {
            let state = self.state();
            let listed = state.listed_genres.as_deref() == Some(state.genre_filter.ids().as_slice());
            (state.page, state.has_next_page, state.genre_filter.clone(), listed)
        };

        if !listed {
            debug!(genres = ?genres.ids(), "First page for current filter not loaded, starting over");
            return self.fetch_page(1, self.page_limit, Some(&genres)).await;
        }

        if has_next_page == Some(false) {
            debug!(page = page, "No more pages to load");
            return FetchOutcome::Exhausted { page };
        }

        self.fetch_page(page + 1, self.page_limit, Some(&genres)).await
    }

    /// Replace the genre filter and reload page 1.
    ///
    /// The cursor only moves once that page is applied; after a failed
    /// reload `load_more` starts the new listing from page 1.
    pub async fn set_genre_filter(&self, filter: GenreFilter) -> FetchOutcome {
        let genres = {
            let mut state = self.state();
            state.genre_filter = filter;
            state.genre_filter.ids()
        };

        info!(genres = ?genres, "Genre filter changed");
        self.listeners.notify(&StoreEvent::GenreFilterChanged { genres });
        self.refresh().await
    }

    /// Select or deselect one genre, then reload page 1
    pub async fn toggle_genre(&self, genre_id: u32) -> FetchOutcome {
        let mut filter = self.genre_filter();
        filter.toggle(genre_id);
        self.set_genre_filter(filter).await
    }

    pub fn genre_filter(&self) -> GenreFilter {
        self.state().genre_filter.clone()
    }

    /// Show only favourites (or everything) in the derived list
    pub fn set_favourites_only(&self, favourites_only: bool) {
        {
            let mut state = self.state();
            if state.favourites_only == favourites_only {
                return;
            }
            state.favourites_only = favourites_only;
        }

        self.listeners
            .notify(&StoreEvent::DisplayModeChanged { favourites_only });
    }

    pub fn toggle_favourites_only(&self) -> bool {
        let next = !self.favourites_only();
        self.set_favourites_only(next);
        next
    }

    pub fn favourites_only(&self) -> bool {
        self.state().favourites_only
    }

    /// Flip the favourite status of `id` and write the full set through to
    /// storage. Returns whether `id` is a favourite afterwards.
    ///
    /// Before `initialize` has run nothing is written. If the write fails the
    /// change is undone, so memory and storage stay in step.
    pub fn toggle_favourite(&self, id: u32) -> Result<bool, StoreError> {
        let is_favourite = {
            let mut state = self.state();
            let is_favourite = state.favourites.toggle(id);

            if state.favourites_loaded {
                if let Err(e) = state.favourites.persist(self.storage.as_ref()) {
                    state.favourites.toggle(id);
                    error!(id = id, error = %e, "Failed to persist favourites, change rolled back");
                    return Err(StoreError::Persist(e));
                }
            } else {
                warn!(id = id, "Favourites not loaded yet, change kept in memory only");
            }

            is_favourite
        };

        debug!(id = id, is_favourite = is_favourite, "Favourite toggled");
        self.listeners
            .notify(&StoreEvent::FavouriteToggled { id, is_favourite });
        Ok(is_favourite)
    }

    pub fn has_favourite(&self, id: u32) -> bool {
        self.state().favourites.contains(id)
    }

    /// Favourite ids in ascending order
    pub fn favourites(&self) -> Vec<u32> {
        self.state().favourites.sorted()
    }

    /// All fetched records, unfiltered
    pub fn records(&self) -> Vec<AnimeRecord> {
        self.state().records.clone()
    }

    /// The list to display: records narrowed by favourites-only mode and the
    /// genre filter. Never modifies the underlying state.
    pub fn derived_list(&self) -> Vec<AnimeRecord> {
        let state = self.state();
        let filter = ListFilter {
            favourites_only: state.favourites_only,
            genres: &state.genre_filter,
        };
        filter.apply(&state.records, &state.favourites)
    }

    /// First loaded record with the given id
    pub fn record(&self, id: u32) -> Option<AnimeRecord> {
        self.state().records.iter().find(|r| r.id == id).cloned()
    }

    /// Display-ready details for a loaded record
    pub fn details(&self, id: u32) -> Option<AnimeDetails> {
        let state = self.state();
        let record = state.records.iter().find(|r| r.id == id)?;
        Some(AnimeDetails::new(record, state.favourites.contains(id)))
    }

    /// Last applied page
    pub fn current_page(&self) -> u32 {
        self.state().page
    }

    pub fn has_next_page(&self) -> Option<bool> {
        self.state().has_next_page
    }

    /// Register a listener called after every state change
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&StoreEvent) + Send + Sync + 'static,
    {
        self.listeners.add(Arc::new(listener))
    }
}
