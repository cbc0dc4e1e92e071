//! Photo upload handler
//!
//! Handles POST /api/guestbook/upload. The body carries an already-compressed
//! JPEG as a data URL together with the visitor's name and id. A stored
//! entry is echoed back in the response and pushed to every open stream
//! in the same order the list endpoint reports it.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use guestbook_core::entry::{CreateEntryRequest, StoreResponse};
use guestbook_core::PushEvent;
use tracing::{info, instrument};

use crate::error::ApiError;
use crate::state::AppState;
use crate::validation::{normalize_name, validate_image, validate_visitor_id};

#[instrument(skip_all)]
pub async fn upload_handler(
    State(state): State<AppState>,
    body: Result<Json<CreateEntryRequest>, JsonRejection>,
) -> Result<Json<StoreResponse>, ApiError> {
    let Json(request) = body.map_err(|e| ApiError::bad_request(e.body_text()))?;

    validate_visitor_id(&request.visitor_id)?;
    let image = validate_image(
        &request.image,
        state.config.max_image_bytes(),
        state.config.max_image_dimension,
    )?;
    let name = normalize_name(&request.name, state.config.max_name_chars);

    let entry = state.store.insert(
        request.visitor_id,
        name,
        image.mime,
        image.bytes,
        |entry| {
            state.hub.publish(PushEvent::NewEntry(entry.clone()));
        },
    );

    info!(
        entry_id = %entry.id,
        visitor_id = %entry.visitor_id,
        width = image.width,
        height = image.height,
        "Photo stored"
    );

    Ok(Json(StoreResponse::created(entry)))
}
