use std::sync::Arc;

use crate::config::{AppConfig, SecurityConfig};
use crate::database::Store;

/// Shared handler state: the repositories plus the config they run under
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(store: Store, config: AppConfig) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }

    pub fn security(&self) -> &SecurityConfig {
        &self.config.security
    }
}
