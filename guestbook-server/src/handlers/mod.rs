//! HTTP request handlers
//!
//! This module contains all the request handlers for the API endpoints.

pub mod delete;
pub mod health;
pub mod images;
pub mod photos;
pub mod stream;
pub mod upload;

pub use crate::state::AppState;
pub use delete::delete_handler;
pub use health::{health, ready, HealthResponse, ReadyResponse};
pub use images::image_handler;
pub use photos::list_photos_handler;
pub use stream::{stream_handler, StreamFormat, StreamQuery};
pub use upload::upload_handler;
