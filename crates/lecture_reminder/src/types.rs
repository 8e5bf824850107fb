use std::sync::Arc;

use crate::config::ServerConfig;
use crate::db::JsonStore;

/// State shared by every request handler.
pub struct AppState {
    pub store: JsonStore,
    pub config: ServerConfig,
}

impl AppState {
    pub fn new(store: JsonStore, config: ServerConfig) -> Arc<Self> {
        Arc::new(Self { store, config })
    }
}
