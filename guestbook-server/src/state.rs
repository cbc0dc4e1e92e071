//! Application state module
//!
//! Defines shared state accessible across all request handlers.

use std::sync::Arc;

use crate::config::Config;
use crate::hub::EventHub;
use crate::store::PhotoStore;

/// Application state containing shared resources.
#[derive(Clone)]
pub struct AppState {
    /// Photo entries and their images
    pub store: Arc<PhotoStore>,
    /// Push event fan-out
    pub hub: EventHub,
    /// Server configuration
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        Self {
            store: Arc::new(PhotoStore::new()),
            hub: EventHub::new(config.event_buffer),
            config: Arc::new(config.clone()),
        }
    }
}
