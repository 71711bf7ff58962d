use std::sync::Arc;

use tracing::info;

use crate::clock::{Clock, SystemClock};
use crate::feed::FeedGateway;
use crate::history::HistoryManager;
use crate::orchestrator::{FetchRequest, SearchOrchestrator};
use crate::store::KeyValueStore;
use crate::theme::ThemeManager;

/// Root state container handed to the presentation layer.
#[derive(Debug)]
pub struct App {
    pub search: SearchOrchestrator,
    pub theme: ThemeManager,
}

impl App {
    pub fn new(gateway: Arc<dyn FeedGateway>, store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_clock(gateway, store, Arc::new(SystemClock))
    }

    pub fn with_clock(
        gateway: Arc<dyn FeedGateway>,
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let history = HistoryManager::new(Arc::clone(&store));
        Self {
            search: SearchOrchestrator::new(gateway, history, clock),
            theme: ThemeManager::new(store),
        }
    }

    /// Loads saved history and theme, and returns the fetch for the default
    /// query. The startup fetch does not count against the rate limit.
    pub fn start(&mut self) -> FetchRequest {
        self.search.history_mut().load();
        self.theme.load();
        info!(
            "Loaded {} history terms, theme {}",
            self.search.history().terms().len(),
            self.theme.theme()
        );
        self.search.begin_fetch()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::HISTORY_KEY;
    use crate::store::MemoryStore;
    use crate::theme::{Theme, THEME_KEY};
    use crate::types::{Item, DEFAULT_QUERY};
    use futures::future::BoxFuture;

    struct EmptyFeed;

    impl FeedGateway for EmptyFeed {
        fn fetch<'a>(
            &'a self,
            _tags: &'a str,
        ) -> BoxFuture<'a, Result<Vec<Item>, crate::error::UpstreamError>> {
            Box::pin(async { Ok(Vec::new()) })
        }
    }

    #[test]
    fn test_start_loads_persisted_state() {
        let store = Arc::new(MemoryStore::new());
        store.set(HISTORY_KEY, r#"["cats","dogs"]"#).unwrap();
        store.set(THEME_KEY, "dark").unwrap();

        let mut app = App::new(Arc::new(EmptyFeed), store);
        let request = app.start();

        assert_eq!(request.query, DEFAULT_QUERY);
        assert_eq!(request.page, 1);
        assert_eq!(app.search.history().terms(), ["cats", "dogs"]);
        assert_eq!(app.theme.theme(), Theme::Dark);
        assert!(app.search.state().is_loading);
    }

    #[test]
    fn test_managers_share_one_store() {
        let store = Arc::new(MemoryStore::new());
        let mut app = App::new(Arc::new(EmptyFeed), store.clone());
        app.start();

        app.search.submit("sunset").unwrap();
        app.theme.toggle();

        assert_eq!(store.get(HISTORY_KEY).unwrap().as_deref(), Some(r#"["sunset"]"#));
        assert_eq!(store.get(THEME_KEY).unwrap().as_deref(), Some("dark"));
    }
}
