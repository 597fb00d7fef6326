//! Credential store contract

use async_trait::async_trait;

use crate::error::DbError;
use crate::models::{Application, User};

/// Storage capabilities the authentication service depends on.
///
/// Implementations must report the three distinguished failures with their
/// dedicated variants so callers can tell them apart from I/O errors:
///
/// - a missing user as [`DbError::NotFound`]
/// - a missing application as [`DbError::AppNotFound`]
/// - an email collision as [`DbError::Duplicate`]
///
/// Every other failure is opaque to the caller.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Look up a user by exact (case-sensitive) email
    async fn user_by_email(&self, email: &str) -> Result<User, DbError>;

    /// Look up an application by id
    async fn application_by_id(&self, id: i32) -> Result<Application, DbError>;

    /// Read the admin flag of a user
    async fn is_admin(&self, user_id: i64) -> Result<bool, DbError>;

    /// Insert a new non-admin user and return its id
    async fn insert_user(&self, email: &str, password_hash: &str) -> Result<i64, DbError>;
}
