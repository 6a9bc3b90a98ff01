//! Health check HTTP route handlers
//!
//! - `GET /health` - Simple liveness check (returns 200 OK)
//! - `GET /health/live` - Kubernetes-style liveness check
//! - `GET /health/ready` - Readiness check (pings the store)

use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};
use std::sync::Arc;

use crate::error::{ApiError, ApiResult};
use crate::store::{Store, StoreError};

/// Shared application state for health check handlers
#[derive(Clone)]
pub struct HealthState {
    pub store: Arc<dyn Store>,
}

impl HealthState {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }
}

/// Create health check router
pub fn health_router(state: HealthState) -> Router {
    Router::new()
        .route("/", get(simple_health))
        .route("/live", get(liveness))
        .route("/ready", get(readiness))
        .with_state(state)
}

/// Simple health check - always returns OK if the server is running
async fn simple_health() -> &'static str {
    "OK"
}

/// Liveness; does not touch the store
async fn liveness() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "alive",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Readiness check
///
/// # Response
/// - 200 OK when the store answers a ping
/// - 503 Service Unavailable otherwise
async fn readiness(State(state): State<HealthState>) -> ApiResult<Json<serde_json::Value>> {
    state.store.ping().await.map_err(|err| match err {
        StoreError::Unavailable(reason) => ApiError::StoreUnavailable(reason),
        other => ApiError::StoreUnavailable(other.to_string()),
    })?;

    Ok(Json(serde_json::json!({
        "status": "ready",
        "store": "ok",
    })))
}
