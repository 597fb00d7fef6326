//! Application state

use passport_auth::AuthService;
use std::sync::Arc;
use std::time::Duration;

/// Prometheus handle used to render the `/metrics` endpoint
pub type MetricsHandle = metrics_exporter_prometheus::PrometheusHandle;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    /// Upper bound on the time one request may spend in the service
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(auth: Arc<AuthService>, request_timeout: Duration) -> Self {
        Self {
            auth,
            request_timeout,
        }
    }
}
