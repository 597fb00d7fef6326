//! Authentication service
//!
//! Orchestrates the credential store and the token signer for the three
//! public operations. The service holds no mutable state and is shared across
//! concurrent requests behind an `Arc`.

use std::sync::Arc;
use std::time::Duration;

use passport_db::{CredentialStore, DbError};
use tracing::{Instrument, Span, error, info, info_span, warn};

use crate::context::RequestContext;
use crate::error::AuthError;
use crate::jwt::TokenSigner;
use crate::password::{hash_password, verify_dummy, verify_password};

pub struct AuthService {
    span: Span,
    store: Arc<dyn CredentialStore>,
    signer: Arc<dyn TokenSigner>,
    token_ttl: Duration,
}

impl AuthService {
    /// Create a service. `span` is the parent of every per-operation span.
    pub fn new(
        span: Span,
        store: Arc<dyn CredentialStore>,
        signer: Arc<dyn TokenSigner>,
        token_ttl: Duration,
    ) -> Self {
        Self {
            span,
            store,
            signer,
            token_ttl,
        }
    }

    /// Authenticate `email`/`password` and issue a token scoped to `app_id`.
    ///
    /// The user is looked up before the application, so an unknown application
    /// id never reveals whether an email is registered. An unknown email and a
    /// wrong password both yield [`AuthError::InvalidCredentials`].
    pub async fn login(
        &self,
        ctx: &RequestContext,
        password: &str,
        email: &str,
        app_id: i32,
    ) -> Result<String, AuthError> {
        let span = info_span!(parent: &self.span, "auth.login", email = %email, app_id);
        self.login_inner(ctx, password, email, app_id)
            .instrument(span)
            .await
    }

    async fn login_inner(
        &self,
        ctx: &RequestContext,
        password: &str,
        email: &str,
        app_id: i32,
    ) -> Result<String, AuthError> {
        info!("Attempting to login user");

        let user = match ctx.run(self.store.user_by_email(email)).await? {
            Ok(user) => user,
            Err(DbError::NotFound(_)) => {
                warn!("User not found");
                let password = password.to_owned();
                ctx.run(blocking(move || {
                    verify_dummy(&password);
                    Ok(())
                }))
                .await??;
                return Err(AuthError::InvalidCredentials);
            }
            Err(e) => {
                error!(error = %e, "Failed to get user by email");
                return Err(AuthError::Store(e));
            }
        };

        let app = match ctx.run(self.store.application_by_id(app_id)).await? {
            Ok(app) => app,
            Err(DbError::AppNotFound(_)) => {
                warn!("Application not found");
                return Err(AuthError::InvalidApplication);
            }
            Err(e) => {
                error!(error = %e, "Failed to get application by id");
                return Err(AuthError::Store(e));
            }
        };

        let password = password.to_owned();
        let hash = user.password_hash.clone();
        let valid = ctx
            .run(blocking(move || verify_password(&password, &hash)))
            .await??;
        if !valid {
            warn!("Invalid password");
            return Err(AuthError::InvalidCredentials);
        }

        let token = ctx
            .run(async { self.signer.issue(&user, &app, self.token_ttl) })
            .await?
            .map_err(|e| {
                error!(error = %e, "Failed to generate token");
                AuthError::Token(e)
            })?;

        info!(user_id = user.id, "User logged in successfully");
        Ok(token)
    }

    /// Register a new non-admin user and return its id.
    pub async fn register(
        &self,
        ctx: &RequestContext,
        password: &str,
        email: &str,
    ) -> Result<i64, AuthError> {
        let span = info_span!(parent: &self.span, "auth.register", email = %email);
        self.register_inner(ctx, password, email)
            .instrument(span)
            .await
    }

    async fn register_inner(
        &self,
        ctx: &RequestContext,
        password: &str,
        email: &str,
    ) -> Result<i64, AuthError> {
        info!("Registering user");

        let password = password.to_owned();
        let hash = ctx
            .run(blocking(move || hash_password(&password)))
            .await?
            .inspect_err(|e| error!(error = %e, "Failed to hash password"))?;

        let id = match ctx.run(self.store.insert_user(email, &hash)).await? {
            Ok(id) => id,
            Err(DbError::Duplicate(_)) => {
                warn!("User already exists");
                return Err(AuthError::UserExists);
            }
            Err(e) => {
                error!(error = %e, "Failed to save user");
                return Err(AuthError::Store(e));
            }
        };

        info!(user_id = id, "User registered");
        Ok(id)
    }

    /// Report whether the user with `user_id` is an administrator.
    ///
    /// An unknown id is a credential failure, not a generic miss.
    pub async fn is_admin(&self, ctx: &RequestContext, user_id: i64) -> Result<bool, AuthError> {
        let span = info_span!(parent: &self.span, "auth.is_admin", user_id);
        self.is_admin_inner(ctx, user_id).instrument(span).await
    }

    async fn is_admin_inner(&self, ctx: &RequestContext, user_id: i64) -> Result<bool, AuthError> {
        match ctx.run(self.store.is_admin(user_id)).await? {
            Ok(is_admin) => Ok(is_admin),
            Err(DbError::NotFound(_)) => {
                warn!("User not found");
                Err(AuthError::InvalidCredentials)
            }
            Err(e) => {
                error!(error = %e, "Failed to check admin status");
                Err(AuthError::Store(e))
            }
        }
    }
}

/// Run CPU-heavy password work off the async workers
async fn blocking<T, F>(f: F) -> Result<T, AuthError>
where
    F: FnOnce() -> Result<T, AuthError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AuthError::Task(e.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::jwt::{self, JwtIssuer};
    use async_trait::async_trait;
    use chrono::Utc;
    use passport_db::{Application, MemoryStore, NewApplication, User};

    const APP_ID: i32 = 1;
    const APP_SECRET: &[u8] = b"test-secret";
    const TTL: Duration = Duration::from_secs(3600);

    fn store() -> MemoryStore {
        let store = MemoryStore::new();
        store.add_application(NewApplication {
            id: APP_ID,
            name: "test".to_string(),
            secret: APP_SECRET.to_vec(),
        });
        store.add_application(NewApplication {
            id: 2,
            name: "other".to_string(),
            secret: b"other-secret".to_vec(),
        });
        store
    }

    fn service_with(store: Arc<dyn CredentialStore>) -> AuthService {
        AuthService::new(Span::none(), store, Arc::new(JwtIssuer::new()), TTL)
    }

    fn service() -> (MemoryStore, AuthService) {
        let store = store();
        let service = service_with(Arc::new(store.clone()));
        (store, service)
    }

    /// Store whose every call fails with an I/O-style error
    struct BrokenStore;

    #[async_trait]
    impl CredentialStore for BrokenStore {
        async fn user_by_email(&self, _email: &str) -> Result<User, DbError> {
            Err(DbError::Connection(sqlx::Error::PoolTimedOut))
        }

        async fn application_by_id(&self, _id: i32) -> Result<Application, DbError> {
            Err(DbError::Connection(sqlx::Error::PoolTimedOut))
        }

        async fn is_admin(&self, _user_id: i64) -> Result<bool, DbError> {
            Err(DbError::Connection(sqlx::Error::PoolTimedOut))
        }

        async fn insert_user(&self, _email: &str, _hash: &str) -> Result<i64, DbError> {
            Err(DbError::Connection(sqlx::Error::PoolTimedOut))
        }
    }

    /// Store that never answers user lookups in time
    struct SlowStore(MemoryStore);

    #[async_trait]
    impl CredentialStore for SlowStore {
        async fn user_by_email(&self, email: &str) -> Result<User, DbError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            self.0.user_by_email(email).await
        }

        async fn application_by_id(&self, id: i32) -> Result<Application, DbError> {
            self.0.application_by_id(id).await
        }

        async fn is_admin(&self, user_id: i64) -> Result<bool, DbError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            self.0.is_admin(user_id).await
        }

        async fn insert_user(&self, email: &str, hash: &str) -> Result<i64, DbError> {
            self.0.insert_user(email, hash).await
        }
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let (_store, service) = service();
        let ctx = RequestContext::new();

        let id = service
            .register(&ctx, "hunter22", "alice@example.com")
            .await
            .unwrap();
        assert!(id > 0);

        let token = service
            .login(&ctx, "hunter22", "alice@example.com", APP_ID)
            .await
            .unwrap();
        let login_time = Utc::now().timestamp();

        let claims = jwt::verify(&token, APP_SECRET).unwrap();
        assert_eq!(claims.uid, id);
        assert_eq!(claims.email, "alice@example.com");
        assert_eq!(claims.app, APP_ID);
        assert!((claims.exp - (login_time + TTL.as_secs() as i64)).abs() <= 1);
    }

    #[tokio::test]
    async fn test_token_scoped_to_application() {
        let (_store, service) = service();
        let ctx = RequestContext::new();
        service.register(&ctx, "pw", "bob@example.com").await.unwrap();

        let token = service
            .login(&ctx, "pw", "bob@example.com", 2)
            .await
            .unwrap();

        assert_eq!(jwt::verify(&token, b"other-secret").unwrap().app, 2);
        assert!(jwt::verify(&token, APP_SECRET).is_err());
    }

    #[tokio::test]
    async fn test_register_twice() {
        let (store, service) = service();
        let ctx = RequestContext::new();

        service.register(&ctx, "pw", "dup@example.com").await.unwrap();
        let err = service
            .register(&ctx, "other", "dup@example.com")
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::UserExists);
        assert_eq!(store.user_count(), 1);
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_email_look_alike() {
        let (_store, service) = service();
        let ctx = RequestContext::new();
        service.register(&ctx, "right", "carol@example.com").await.unwrap();

        let wrong_password = service
            .login(&ctx, "wrong", "carol@example.com", APP_ID)
            .await
            .unwrap_err();
        let unknown_email = service
            .login(&ctx, "right", "nobody@example.com", APP_ID)
            .await
            .unwrap_err();

        assert_eq!(wrong_password.kind(), ErrorKind::InvalidCredentials);
        assert_eq!(unknown_email.kind(), ErrorKind::InvalidCredentials);
        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
    }

    #[tokio::test]
    async fn test_unknown_application() {
        let (_store, service) = service();
        let ctx = RequestContext::new();
        service.register(&ctx, "pw", "dave@example.com").await.unwrap();

        let err = service
            .login(&ctx, "pw", "dave@example.com", 99)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidApplication);
    }

    #[tokio::test]
    async fn test_user_checked_before_application() {
        let (_store, service) = service();
        let ctx = RequestContext::new();

        let err = service
            .login(&ctx, "pw", "nobody@example.com", 99)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidCredentials);
    }

    #[tokio::test]
    async fn test_is_admin() {
        let (store, service) = service();
        let ctx = RequestContext::new();
        let id = service.register(&ctx, "pw", "erin@example.com").await.unwrap();

        assert!(!service.is_admin(&ctx, id).await.unwrap());

        store.set_admin("erin@example.com", true);
        assert!(service.is_admin(&ctx, id).await.unwrap());

        let err = service.is_admin(&ctx, id + 100).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidCredentials);
    }

    #[tokio::test]
    async fn test_store_failures_are_internal() {
        let service = service_with(Arc::new(BrokenStore));
        let ctx = RequestContext::new();

        let login = service
            .login(&ctx, "pw", "x@example.com", APP_ID)
            .await
            .unwrap_err();
        let register = service.register(&ctx, "pw", "x@example.com").await.unwrap_err();
        let is_admin = service.is_admin(&ctx, 1).await.unwrap_err();

        assert_eq!(login.kind(), ErrorKind::Internal);
        assert_eq!(register.kind(), ErrorKind::Internal);
        assert_eq!(is_admin.kind(), ErrorKind::Internal);
    }

    #[tokio::test]
    async fn test_signing_failure_is_internal() {
        let store = store();
        store.add_application(NewApplication {
            id: 5,
            name: "misconfigured".to_string(),
            secret: Vec::new(),
        });
        let service = service_with(Arc::new(store));
        let ctx = RequestContext::new();
        service.register(&ctx, "pw", "frank@example.com").await.unwrap();

        let err = service
            .login(&ctx, "pw", "frank@example.com", 5)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Token(_)));
        assert_eq!(err.kind(), ErrorKind::Internal);
    }

    #[tokio::test]
    async fn test_cancelled_context() {
        let (store, service) = service();
        let ctx = RequestContext::new();
        ctx.cancel();

        let register = service.register(&ctx, "pw", "gina@example.com").await.unwrap_err();
        let login = service
            .login(&ctx, "pw", "gina@example.com", APP_ID)
            .await
            .unwrap_err();

        assert_eq!(register.kind(), ErrorKind::Cancelled);
        assert_eq!(login.kind(), ErrorKind::Cancelled);
        assert_eq!(store.user_count(), 0);
    }

    #[tokio::test]
    async fn test_deadline_is_not_a_credential_error() {
        let service = service_with(Arc::new(SlowStore(store())));
        let ctx = RequestContext::with_timeout(Duration::from_millis(50));

        let login = service
            .login(&ctx, "pw", "hank@example.com", APP_ID)
            .await
            .unwrap_err();
        assert_eq!(login.kind(), ErrorKind::DeadlineExceeded);

        let ctx = RequestContext::with_timeout(Duration::from_millis(50));
        let is_admin = service.is_admin(&ctx, 1).await.unwrap_err();
        assert_eq!(is_admin.kind(), ErrorKind::DeadlineExceeded);
    }

    #[tokio::test]
    async fn test_concurrent_registrations() {
        let (store, service) = service();
        let service = Arc::new(service);

        let distinct = (0..6).map(|i| {
            let service = service.clone();
            async move {
                service
                    .register(&RequestContext::new(), "pw", &format!("user{}@example.com", i))
                    .await
            }
        });
        let results = futures::future::join_all(distinct).await;
        assert!(results.iter().all(|r| r.is_ok()));

        let same = (0..6).map(|_| {
            let service = service.clone();
            async move {
                service
                    .register(&RequestContext::new(), "pw", "same@example.com")
                    .await
            }
        });
        let results = futures::future::join_all(same).await;
        let ok = results.iter().filter(|r| r.is_ok()).count();
        let exists = results
            .iter()
            .filter(|r| matches!(r, Err(AuthError::UserExists)))
            .count();

        assert_eq!(ok, 1);
        assert_eq!(exists, 5);
        assert_eq!(store.user_count(), 7);
    }
}
