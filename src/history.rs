use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::PersistenceError;
use crate::store::KeyValueStore;

/// Store key holding the JSON-encoded list of past terms.
pub const HISTORY_KEY: &str = "flickr_search_history_v1";

/// Maximum number of remembered search terms.
pub const MAX_HISTORY: usize = 8;

/// Past search terms, most recent first, written through to the store.
pub struct HistoryManager {
    store: Arc<dyn KeyValueStore>,
    terms: Vec<String>,
}

impl std::fmt::Debug for HistoryManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryManager")
            .field("terms", &self.terms)
            .finish()
    }
}

impl HistoryManager {
    /// Starts empty; call [`HistoryManager::load`] to pick up saved terms.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            terms: Vec::new(),
        }
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Replaces the in-memory list with the stored one, or with nothing if
    /// the stored value is missing or unreadable.
    pub fn load(&mut self) {
        self.terms = self.read_persisted().unwrap_or_else(|e| {
            debug!("Search history unavailable, starting empty: {}", e);
            Vec::new()
        });
    }

    fn read_persisted(&self) -> Result<Vec<String>, PersistenceError> {
        let Some(raw) = self.store.get(HISTORY_KEY)? else {
            return Ok(Vec::new());
        };
        let parsed: Vec<String> = serde_json::from_str(&raw)?;

        let mut terms: Vec<String> = Vec::with_capacity(MAX_HISTORY);
        for term in parsed {
            if !terms.contains(&term) {
                terms.push(term);
            }
        }
        terms.truncate(MAX_HISTORY);
        Ok(terms)
    }

    /// Moves `term` to the front, evicting the oldest entry past the limit.
    /// Matching is exact: no case folding or trimming.
    pub fn record(&mut self, term: &str) {
        self.terms.retain(|t| t != term);
        self.terms.insert(0, term.to_string());
        self.terms.truncate(MAX_HISTORY);
        self.persist();
    }

    pub fn clear(&mut self) {
        self.terms.clear();
        if let Err(e) = self.store.remove(HISTORY_KEY) {
            warn!("Failed to remove stored search history: {}", e);
        }
    }

    fn persist(&self) {
        let result = serde_json::to_string(&self.terms)
            .map_err(PersistenceError::from)
            .and_then(|body| self.store.set(HISTORY_KEY, &body));
        if let Err(e) = result {
            warn!("Failed to save search history: {}", e);
        }
    }
}
