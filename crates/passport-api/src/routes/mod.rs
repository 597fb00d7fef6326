//! API routes

mod auth;
mod health;
pub mod metrics;
pub mod types;

use axum::Router;

use crate::state::{AppState, MetricsHandle};

/// Create the main router
pub fn create_router(state: AppState, metrics_handle: Option<MetricsHandle>) -> Router {
    let router = Router::new()
        .merge(health::routes())
        .merge(auth::routes())
        .with_state(state);

    match metrics_handle {
        Some(handle) => router.merge(metrics::routes(handle)),
        None => router,
    }
}
