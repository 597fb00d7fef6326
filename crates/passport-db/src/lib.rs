//! Passport Credential Store
//!
//! This crate provides the persistence layer for Passport: the user and
//! application models, the [`CredentialStore`] contract consumed by the
//! authentication service, a SQLite implementation via sqlx and an
//! in-memory implementation for tests and local development.

pub mod error;
pub mod memory;
pub mod models;
pub mod repository;
pub mod store;

pub use error::DbError;
pub use memory::MemoryStore;
pub use models::*;
pub use repository::Database;
pub use store::CredentialStore;
