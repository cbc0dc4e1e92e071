//! Photo deletion handler
//!
//! Handles DELETE /api/guestbook/delete/{id}. Only the visitor who
//! contributed a photo may delete it.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use guestbook_core::entry::{DeleteEntryRequest, StoreResponse};
use guestbook_core::{EntryId, PushEvent};
use tracing::{info, instrument};

use crate::error::ApiError;
use crate::state::AppState;
use crate::store::RemoveError;
use crate::validation::validate_visitor_id;

#[instrument(skip(state, body))]
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<DeleteEntryRequest>, JsonRejection>,
) -> Result<Json<StoreResponse>, ApiError> {
    let Json(request) = body.map_err(|e| ApiError::bad_request(e.body_text()))?;
    validate_visitor_id(&request.visitor_id)?;

    let id = EntryId::new(id);
    let removed = state
        .store
        .remove(&id, &request.visitor_id, |entry| {
            state.hub.publish(PushEvent::DeleteEntry(entry.id.clone()));
        })
        .map_err(|e| match e {
            RemoveError::NotFound => ApiError::not_found(e.to_string()),
            RemoveError::NotOwner => ApiError::forbidden(e.to_string()),
        })?;

    info!(entry_id = %removed.id, "Photo deleted");

    Ok(Json(StoreResponse::ok()))
}
