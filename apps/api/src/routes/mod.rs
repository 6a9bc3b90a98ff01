//! HTTP route handlers for the social graph API
//!
//! - `POST /graphql` and, when enabled, `GET /graphql/playground`
//! - `GET /health`, `/health/live`, `/health/ready`

pub mod graphql;
pub mod health;

pub use graphql::graphql_router;
pub use health::{health_router, HealthState};

use axum::Router;
use std::sync::Arc;

use crate::graphql::GraphqlExecutor;
use crate::store::Store;

/// Everything the router needs
#[derive(Clone)]
pub struct AppState {
    pub executor: GraphqlExecutor,
    pub store: Arc<dyn Store>,
    pub playground: bool,
}

impl AppState {
    /// Build the executor and state over `store`
    pub fn new(store: Arc<dyn Store>, max_depth: usize, playground: bool) -> Self {
        Self {
            executor: GraphqlExecutor::new(store.clone(), max_depth),
            store,
            playground,
        }
    }
}

/// Application routes without transport layers (CORS, tracing)
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .merge(graphql_router(state.executor, state.playground))
        .nest("/health", health_router(HealthState::new(state.store)))
}
