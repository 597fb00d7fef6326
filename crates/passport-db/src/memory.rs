//! In-memory credential store

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use tracing::debug;

use crate::error::DbError;
use crate::models::{Application, NewApplication, User};
use crate::store::CredentialStore;

#[derive(Default)]
struct Inner {
    users: Vec<User>,
    by_email: HashMap<String, usize>,
    apps: HashMap<i32, Application>,
}

/// Credential store backed by process memory.
///
/// Suitable for tests and single-process development setups. Cloning yields
/// another handle to the same data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provision an application, replacing any existing one with the same id
    pub fn add_application(&self, app: NewApplication) {
        let mut inner = self.inner.lock();
        inner.apps.insert(
            app.id,
            Application {
                id: app.id,
                name: app.name,
                secret: app.secret,
            },
        );
    }

    /// Set the admin flag for a user, returns false if the email is unknown
    pub fn set_admin(&self, email: &str, is_admin: bool) -> bool {
        let mut inner = self.inner.lock();
        let Some(&idx) = inner.by_email.get(email) else {
            return false;
        };
        inner.users[idx].is_admin = is_admin;
        true
    }

    /// Number of stored users
    pub fn user_count(&self) -> usize {
        self.inner.lock().users.len()
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn user_by_email(&self, email: &str) -> Result<User, DbError> {
        let inner = self.inner.lock();
        inner
            .by_email
            .get(email)
            .map(|&idx| inner.users[idx].clone())
            .ok_or_else(|| DbError::NotFound(email.to_string()))
    }

    async fn application_by_id(&self, id: i32) -> Result<Application, DbError> {
        self.inner
            .lock()
            .apps
            .get(&id)
            .cloned()
            .ok_or(DbError::AppNotFound(id))
    }

    async fn is_admin(&self, user_id: i64) -> Result<bool, DbError> {
        let inner = self.inner.lock();
        user_id
            .checked_sub(1)
            .and_then(|idx| usize::try_from(idx).ok())
            .and_then(|idx| inner.users.get(idx))
            .map(|u| u.is_admin)
            .ok_or_else(|| DbError::NotFound(format!("id {}", user_id)))
    }

    async fn insert_user(&self, email: &str, password_hash: &str) -> Result<i64, DbError> {
        let mut inner = self.inner.lock();
        if inner.by_email.contains_key(email) {
            return Err(DbError::Duplicate(format!("User '{}' already exists", email)));
        }

        let idx = inner.users.len();
        let id = idx as i64 + 1;
        inner.users.push(User {
            id,
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            is_admin: false,
            created_at: Utc::now(),
        });
        inner.by_email.insert(email.to_string(), idx);

        debug!(user_id = id, "Stored user in memory");
        Ok(id)
    }
}
