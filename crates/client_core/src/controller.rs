//! Keeps one page of remote listings in sync with the user's filters.
//!
//! Every fetch is tagged with a sequence number. Only the response to the most
//! recently issued fetch is applied; earlier responses that arrive late are
//! dropped so the visible state never regresses to stale data.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use shared::filters::FilterCriteria;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, error};

use crate::{
    error::ClientResult,
    listings::ListingSource,
    normalize::RawFilterForm,
    pagination::{self, PageItem},
};

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The response (or failure) was applied to the controller state.
    Applied,
    /// A newer fetch was issued while this one was in flight.
    Superseded,
}

#[derive(Debug, Clone)]
pub struct ListingSnapshot<T> {
    pub filters: FilterCriteria,
    pub page: u32,
    pub page_size: u32,
    pub items: Vec<T>,
    pub total_count: u64,
    pub is_loading: bool,
}

impl<T> ListingSnapshot<T> {
    pub fn total_pages(&self) -> u32 {
        pagination::total_pages(self.total_count, self.page_size)
    }

    pub fn pagination(&self) -> Vec<PageItem> {
        pagination::pagination_range(self.page, self.total_pages())
    }

    pub fn has_prev_page(&self) -> bool {
        pagination::has_prev_page(self.page)
    }

    pub fn has_next_page(&self) -> bool {
        pagination::has_next_page(self.page, self.total_pages())
    }
}

struct ListingState<T> {
    filters: FilterCriteria,
    page: u32,
    items: Vec<T>,
    total_count: u64,
    issued_seq: u64,
}

/// Marks a fetch as settled when it finishes or when its future is dropped.
///
/// Loading is derived from `issued_seq > settled_seq`; `fetch_max` keeps a
/// late, superseded fetch from lowering the mark.
struct SettleOnDrop<'a> {
    settled_seq: &'a AtomicU64,
    seq: u64,
}

impl Drop for SettleOnDrop<'_> {
    fn drop(&mut self) {
        self.settled_seq.fetch_max(self.seq, Ordering::AcqRel);
    }
}

pub struct ListingController<S: ListingSource> {
    source: Arc<S>,
    page_size: u32,
    state: Mutex<ListingState<S::Item>>,
    settled_seq: AtomicU64,
    events: broadcast::Sender<ListingSnapshot<S::Item>>,
}

impl<S: ListingSource> ListingController<S> {
    pub fn new(source: Arc<S>, page_size: u32) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            source,
            page_size: page_size.max(1),
            state: Mutex::new(ListingState {
                filters: FilterCriteria::default(),
                page: 1,
                items: Vec::new(),
                total_count: 0,
                issued_seq: 0,
            }),
            settled_seq: AtomicU64::new(0),
            events,
        }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Receives a snapshot after every applied fetch.
    pub fn subscribe(&self) -> broadcast::Receiver<ListingSnapshot<S::Item>> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> ListingSnapshot<S::Item> {
        let state = self.state.lock().await;
        self.snapshot_of(&state)
    }

    /// Replaces the filters, returns to page 1 and fetches.
    pub async fn apply_filters(&self, filters: FilterCriteria) -> FetchOutcome {
        {
            let mut state = self.state.lock().await;
            state.filters = filters;
            state.page = 1;
        }
        self.fetch().await
    }

    pub async fn apply_form(&self, form: &RawFilterForm) -> FetchOutcome {
        self.apply_filters(form.normalize()).await
    }

    pub async fn reset_filters(&self) -> FetchOutcome {
        self.apply_filters(FilterCriteria::default()).await
    }

    /// Moves to `page`, keeping the filters.
    ///
    /// The page is clamped to the known page range. Returns `None` without
    /// fetching when the page does not change.
    pub async fn set_page(&self, page: u32) -> Option<FetchOutcome> {
        {
            let mut state = self.state.lock().await;
            let total_pages = pagination::total_pages(state.total_count, self.page_size);
            let target = if total_pages > 0 {
                page.clamp(1, total_pages)
            } else {
                page.max(1)
            };
            if target == state.page {
                return None;
            }
            state.page = target;
        }
        Some(self.fetch().await)
    }

    pub async fn next_page(&self) -> Option<FetchOutcome> {
        let target = {
            let state = self.state.lock().await;
            let total_pages = pagination::total_pages(state.total_count, self.page_size);
            if !pagination::has_next_page(state.page, total_pages) {
                return None;
            }
            state.page + 1
        };
        self.set_page(target).await
    }

    pub async fn prev_page(&self) -> Option<FetchOutcome> {
        let target = {
            let state = self.state.lock().await;
            if !pagination::has_prev_page(state.page) {
                return None;
            }
            state.page - 1
        };
        self.set_page(target).await
    }

    /// Fetches the current page again with the current filters.
    pub async fn refresh(&self) -> FetchOutcome {
        self.fetch().await
    }

    pub async fn load_detail(&self, id: S::Id) -> ClientResult<S::Detail> {
        debug!(%id, "loading listing detail");
        self.source.detail(id).await
    }

    async fn fetch(&self) -> FetchOutcome {
        let (seq, filters, view) = {
            let mut state = self.state.lock().await;
            state.issued_seq += 1;
            (
                state.issued_seq,
                state.filters.clone(),
                pagination::page_view(state.page, self.page_size),
            )
        };
        let settle = SettleOnDrop {
            settled_seq: &self.settled_seq,
            seq,
        };

        let result = self.source.search(&filters, view).await;

        let snapshot = {
            let mut state = self.state.lock().await;
            if seq != state.issued_seq {
                debug!(
                    seq,
                    latest = state.issued_seq,
                    "discarding superseded listing response"
                );
                return FetchOutcome::Superseded;
            }
            match result {
                Ok(page) => {
                    state.items = page.items;
                    state.total_count = page.total_count;
                    let total_pages = pagination::total_pages(state.total_count, self.page_size);
                    state.page = state.page.min(total_pages.max(1));
                }
                Err(err) => {
                    error!(offset = view.offset, "failed to load listings: {err}");
                    state.items.clear();
                    state.total_count = 0;
                }
            }
            drop(settle);
            self.snapshot_of(&state)
        };

        let _ = self.events.send(snapshot);
        FetchOutcome::Applied
    }

    fn snapshot_of(&self, state: &ListingState<S::Item>) -> ListingSnapshot<S::Item> {
        ListingSnapshot {
            filters: state.filters.clone(),
            page: state.page,
            page_size: self.page_size,
            items: state.items.clone(),
            total_count: state.total_count,
            is_loading: state.issued_seq > self.settled_seq.load(Ordering::Acquire),
        }
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
