//! HTTP API
//!
//! - POST /event, /events - Vivotek canonical JSON events
//! - POST|GET /hikvision/alarm - HIKVision XML alarms
//! - GET /health - counter and uptime
//!
//! Global Basic auth wraps the ingest routes including their 405 fallbacks;
//! HIKVision auth runs only once the method has been accepted.

mod events;
mod health;
mod hikvision;

pub use health::HealthResponse;

use std::sync::Arc;

use axum::{
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use nvr_events_core::{DecodeError, Dispatcher};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

use crate::auth::{require_basic_auth, require_hikvision_auth};
use crate::config::Config;
use crate::pipeline::EventPipeline;
use crate::sink::{FanOut, SinkError};

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub pipeline: Arc<EventPipeline>,
}

impl AppState {
    /// State with the default handler table and the sinks enabled by `config`
    pub fn new(config: Config) -> Result<Self, SinkError> {
        let fan_out = FanOut::from_config(&config)?;
        Ok(Self::with_parts(config, Dispatcher::with_default_handlers(), fan_out))
    }

    pub fn with_parts(config: Config, dispatcher: Dispatcher, fan_out: FanOut) -> Self {
        Self {
            config: Arc::new(config),
            pipeline: Arc::new(EventPipeline::new(dispatcher, fan_out)),
        }
    }
}

/// Build the gateway router
pub fn build_router(state: AppState) -> Router {
    let hikvision_route = post(hikvision::receive_alarm)
        .get(hikvision::receive_alarm)
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_hikvision_auth,
        ))
        // GET would otherwise answer HEAD too
        .head(hikvision::method_not_allowed)
        .fallback(hikvision::method_not_allowed);

    let ingest = Router::new()
        .route(
            "/event",
            post(events::receive_event).fallback(events::method_not_allowed),
        )
        .route(
            "/events",
            post(events::receive_event).fallback(events::method_not_allowed),
        )
        .route("/hikvision/alarm", hikvision_route)
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_basic_auth,
        ));

    Router::new()
        .route("/health", get(health::health))
        .merge(ingest)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Body of a successful ingest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestResponse {
    pub status: String,
    pub message: String,
    pub event_id: u64,
}

impl IngestResponse {
    pub fn success(message: &str, event_id: u64) -> Self {
        Self {
            status: "success".to_string(),
            message: message.to_string(),
            event_id,
        }
    }
}

/// Body of a rejected payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub message: String,
}

/// Request-level failures
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Decode(#[from] DecodeError),

    #[error("{0}")]
    MethodNotAllowed(&'static str),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Decode(e) => (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    status: "error".to_string(),
                    message: e.to_string(),
                }),
            )
                .into_response(),
            ApiError::MethodNotAllowed(message) => {
                (StatusCode::METHOD_NOT_ALLOWED, message).into_response()
            }
        }
    }
}
