//! GET /health

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::counter::format_uptime;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub event_count: u64,
    pub uptime: String,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let counter = state.pipeline.counter();

    Json(HealthResponse {
        status: "ok".to_string(),
        event_count: counter.current(),
        uptime: format_uptime(counter.uptime()),
    })
}
