//! Vivotek event endpoint
//!
//! POST /event and POST /events accept canonical JSON events.

use axum::{body::Bytes, extract::State, Json};

use super::{ApiError, AppState, IngestResponse};

/// Decode and process one canonical JSON event
pub async fn receive_event(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<IngestResponse>, ApiError> {
    let ingested = state.pipeline.ingest_vivotek(&body).await?;

    Ok(Json(IngestResponse::success(
        "Event processed successfully",
        ingested.event_id,
    )))
}

pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed("Only POST method is supported")
}
