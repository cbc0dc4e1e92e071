//! Stored image bytes

use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
};
use guestbook_core::EntryId;

use crate::error::ApiError;
use crate::state::AppState;

/// GET /api/guestbook/images/{id}
///
/// Images never change once stored, so clients may cache them indefinitely.
pub async fn image_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let (mime, bytes) = state
        .store
        .image(&EntryId::new(id))
        .ok_or_else(|| ApiError::not_found("Photo not found"))?;

    Ok((
        [
            (header::CONTENT_TYPE, mime),
            (header::CACHE_CONTROL, "public, max-age=31536000, immutable"),
        ],
        bytes,
    ))
}
