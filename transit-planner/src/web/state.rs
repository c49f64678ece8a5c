//! Application state for the web layer.

use std::sync::Arc;

use crate::repository::TransportRepository;
use crate::source::ConfiguredSource;
use crate::store::JsonFileStore;

/// The repository the server runs against.
pub type AppRepository = TransportRepository<ConfiguredSource, JsonFileStore>;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<AppRepository>,
}

impl AppState {
    pub fn new(repository: Arc<AppRepository>) -> Self {
        Self { repository }
    }
}
