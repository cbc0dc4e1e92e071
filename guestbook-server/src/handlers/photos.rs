//! Guestbook listing handler

use axum::{extract::State, Json};
use guestbook_core::entry::PhotoList;

use crate::state::AppState;

/// GET /api/guestbook/photos - All entries, newest first
pub async fn list_photos_handler(State(state): State<AppState>) -> Json<PhotoList> {
    Json(PhotoList::new(state.store.list()))
}
