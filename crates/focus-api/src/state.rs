use std::sync::Arc;

use focus_core::ports::{DurableStore, FastStore};
use focus_core::ConversationHistoryCache;

/// History cache with backends chosen at startup.
pub type HistoryCache = ConversationHistoryCache<dyn DurableStore, dyn FastStore>;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub history: Arc<HistoryCache>,
}

impl AppState {
    pub fn new(history: Arc<HistoryCache>) -> Self {
        Self { history }
    }
}
