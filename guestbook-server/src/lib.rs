//! Guestbook Server Library - HTTP store and push stream for the shared guestbook
//!
//! This library exposes the server components for use in integration tests.
//! The main binary uses these same components.

pub mod config;
pub mod error;
pub mod handlers;
pub mod hub;
pub mod routes;
pub mod state;
pub mod store;
pub mod validation;

pub use config::Config;
pub use error::ApiError;
pub use hub::EventHub;
pub use routes::{create_router, create_router_with_config, create_router_with_state};
pub use state::AppState;
pub use store::{PhotoStore, RemoveError};
