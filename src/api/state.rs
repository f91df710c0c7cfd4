//! Shared handler state

use std::sync::Arc;
use tokio::sync::OnceCell;

use crate::error::ApiError;
use crate::service::ProcessService;
use crate::store::ProcessStore;

/// State shared by every handler.
///
/// The store is attached once the database connection is established;
/// until then data endpoints answer 503.
#[derive(Clone, Default)]
pub struct AppState {
    store: Arc<OnceCell<Arc<dyn ProcessStore>>>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// State with the store already connected
    pub fn with_store(store: Arc<dyn ProcessStore>) -> Self {
        Self {
            store: Arc::new(OnceCell::new_with(Some(store))),
        }
    }

    /// Attach the connected store. Returns false if one was already attached.
    pub fn attach(&self, store: Arc<dyn ProcessStore>) -> bool {
        self.store.set(store).is_ok()
    }

    pub fn is_connected(&self) -> bool {
        self.store.initialized()
    }

    pub fn store(&self) -> Option<Arc<dyn ProcessStore>> {
        self.store.get().cloned()
    }

    /// Service bound to the connected store, or 503 while disconnected
    pub fn service(&self) -> Result<ProcessService, ApiError> {
        self.store()
            .map(ProcessService::new)
            .ok_or_else(ApiError::unavailable)
    }
}
