//! HIKVision alarm endpoint
//!
//! Devices push `EventNotificationAlert` documents with POST; some firmware
//! uses GET with a body, so both are accepted.

use axum::{body::Bytes, extract::State, Json};

use super::{ApiError, AppState, IngestResponse};

/// Decode and process one XML alarm
pub async fn receive_alarm(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<IngestResponse>, ApiError> {
    let ingested = state.pipeline.ingest_hikvision(&body).await?;

    Ok(Json(IngestResponse::success(
        "HIKVision alarm processed successfully",
        ingested.event_id,
    )))
}

pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed("Only POST and GET methods are supported")
}
