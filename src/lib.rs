pub mod auth;
pub mod config;
pub mod docs;
pub mod error;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod ws;

use std::sync::Arc;

use config::Config;
use ws::SessionRegistry;

/// Shared state handed to every handler.
pub struct AppState {
    pub config: Config,
    pub registry: Arc<SessionRegistry>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let registry = Arc::new(SessionRegistry::new(&config));
        Self { config, registry }
    }
}
