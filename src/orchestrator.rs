//! Search state machine: turns user actions into feed fetches and slices the
//! fetched collection into pages.
//!
//! Actions run synchronously and return a [`FetchRequest`] when a fetch is
//! due; [`SearchOrchestrator::execute`] performs it. Each request carries a
//! generation number, and completions for anything but the latest request
//! are dropped, so a slow fetch cannot overwrite a newer search.

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::clock::Clock;
use crate::error::UpstreamError;
use crate::feed::FeedGateway;
use crate::history::HistoryManager;
use crate::rate_limiter::RateLimiter;
use crate::types::{Item, DEFAULT_QUERY, PER_PAGE};

/// Shown when a fetch fails for any reason.
pub const LOAD_FAILED_MESSAGE: &str = "Failed to load photos. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPhase {
    Idle,
    Loading,
    Ready,
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchState {
    pub input_text: String,
    pub active_query: String,
    pub current_page: usize,
    /// The current page's slice of the last successful fetch.
    pub result_items: Vec<Item>,
    pub total_result_count: usize,
    pub is_loading: bool,
    /// Empty when there is nothing to report.
    pub error_message: String,
}

impl Default for SearchState {
    fn default() -> Self {
        Self {
            input_text: DEFAULT_QUERY.to_string(),
            active_query: DEFAULT_QUERY.to_string(),
            current_page: 1,
            result_items: Vec::new(),
            total_result_count: 0,
            is_loading: false,
            error_message: String::new(),
        }
    }
}

/// A fetch the orchestrator wants issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub generation: u64,
    pub query: String,
    pub page: usize,
}

/// `max(ceil(total / per_page), 1)`.
pub fn total_pages(total: usize, per_page: usize) -> usize {
    total.div_ceil(per_page.max(1)).max(1)
}

/// Items of `page` (1-based) within `all`.
pub fn page_window(all: &[Item], page: usize, per_page: usize) -> Vec<Item> {
    let start = page.saturating_sub(1).saturating_mul(per_page);
    all.iter().skip(start).take(per_page).cloned().collect()
}

pub struct SearchOrchestrator {
    state: SearchState,
    phase: SearchPhase,
    limiter: RateLimiter,
    history: HistoryManager,
    gateway: Arc<dyn FeedGateway>,
    clock: Arc<dyn Clock>,
    per_page: usize,
    gate_pagination: bool,
    generation: u64,
}

impl std::fmt::Debug for SearchOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchOrchestrator")
            .field("state", &self.state)
            .field("phase", &self.phase)
            .field("generation", &self.generation)
            .finish()
    }
}

impl SearchOrchestrator {
    pub fn new(
        gateway: Arc<dyn FeedGateway>,
        history: HistoryManager,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            state: SearchState::default(),
            phase: SearchPhase::Idle,
            limiter: RateLimiter::default(),
            history,
            gateway,
            clock,
            per_page: PER_PAGE,
            gate_pagination: false,
            generation: 0,
        }
    }

    pub fn with_rate_limiter(mut self, limiter: RateLimiter) -> Self {
        self.limiter = limiter;
        self
    }

    /// Subject page changes to the rate limiter as well.
    pub fn with_gated_pagination(mut self, gate: bool) -> Self {
        self.gate_pagination = gate;
        self
    }

    pub fn state(&self) -> &SearchState {
        &self.state
    }

    pub fn phase(&self) -> SearchPhase {
        self.phase
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut HistoryManager {
        &mut self.history
    }

    pub fn total_pages(&self) -> usize {
        total_pages(self.state.total_result_count, self.per_page)
    }

    pub fn can_prev(&self) -> bool {
        self.state.current_page > 1
    }

    pub fn can_next(&self) -> bool {
        self.state.current_page < self.total_pages()
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.state.input_text = text.into();
    }

    /// Searches for the trimmed input. Empty input is ignored.
    pub fn submit(&mut self, raw_term: &str) -> Option<FetchRequest> {
        self.state.input_text = raw_term.to_string();
        let term = raw_term.trim();
        if term.is_empty() {
            return None;
        }
        if !self.admit() {
            return None;
        }

        self.history.record(term);
        self.state.current_page = 1;
        self.state.active_query = term.to_string();
        Some(self.begin_fetch())
    }

    /// Re-runs a remembered search without reordering history.
    pub fn select_history_term(&mut self, term: &str) -> Option<FetchRequest> {
        if !self.admit() {
            return None;
        }

        self.state.input_text = term.to_string();
        self.state.current_page = 1;
        self.state.active_query = term.to_string();
        Some(self.begin_fetch())
    }

    /// Moves `delta` pages, clamped to the known page range. Returns `None`
    /// when the clamped page equals the current one.
    pub fn go_to_page(&mut self, delta: i64) -> Option<FetchRequest> {
        let last = self.total_pages() as i64;
        let target = (self.state.current_page as i64)
            .saturating_add(delta)
            .clamp(1, last) as usize;
        if target == self.state.current_page {
            return None;
        }
        if self.gate_pagination && !self.admit() {
            return None;
        }

        debug!("Page {} -> {}", self.state.current_page, target);
        self.state.current_page = target;
        Some(self.begin_fetch())
    }

    /// Starts a fetch for the active query and page, superseding any fetch
    /// still in flight.
    pub fn begin_fetch(&mut self) -> FetchRequest {
        self.generation += 1;
        self.state.is_loading = true;
        self.state.error_message.clear();
        self.phase = SearchPhase::Loading;
        FetchRequest {
            generation: self.generation,
            query: self.state.active_query.clone(),
            page: self.state.current_page,
        }
    }

    /// Applies a fetch outcome. Returns `false` if `request` was superseded
    /// and the outcome was dropped.
    pub fn complete_fetch(
        &mut self,
        request: &FetchRequest,
        outcome: Result<Vec<Item>, UpstreamError>,
    ) -> bool {
        if request.generation != self.generation {
            debug!(
                "Dropping stale fetch for '{}' (generation {} < {})",
                request.query, request.generation, self.generation
            );
            return false;
        }

        match outcome {
            Ok(all) => {
                self.state.total_result_count = all.len();
                self.state.result_items = page_window(&all, request.page, self.per_page);
                self.phase = SearchPhase::Ready;
                info!(
                    "Loaded '{}' page {}: {} of {} photos",
                    request.query,
                    request.page,
                    self.state.result_items.len(),
                    all.len()
                );
            }
            Err(e) => {
                error!("Failed to load '{}': {}", request.query, e);
                self.state.result_items.clear();
                self.state.total_result_count = 0;
                self.state.error_message = LOAD_FAILED_MESSAGE.to_string();
                self.phase = SearchPhase::Failed;
            }
        }
        self.state.is_loading = false;
        true
    }

    /// Issues `request` against the feed and applies the result.
    pub async fn execute(&mut self, request: FetchRequest) -> bool {
        let gateway = Arc::clone(&self.gateway);
        let outcome = gateway.fetch(&request.query).await;
        self.complete_fetch(&request, outcome)
    }

    pub async fn fetch_current_page(&mut self) -> bool {
        let request = self.begin_fetch();
        self.execute(request).await
    }

    fn admit(&mut self) -> bool {
        match self.limiter.admit(self.clock.now_ms()) {
            Ok(()) => true,
            Err(throttle) => {
                info!("Search throttled for {}s", throttle.wait_seconds);
                self.state.error_message = throttle.to_string();
                false
            }
        }
    }
}
