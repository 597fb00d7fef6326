//! Passport RPC API
//!
//! This crate exposes the authentication service over HTTP with axum: one
//! JSON endpoint per unary operation, plus health and metrics endpoints.

pub mod error;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::{AppState, MetricsHandle};
