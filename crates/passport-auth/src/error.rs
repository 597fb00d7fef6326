//! Authentication error types

use passport_db::DbError;
use thiserror::Error;

use crate::context::Interrupted;
use crate::jwt::TokenError;

/// Stable failure category exposed to callers of the service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidCredentials,
    InvalidApplication,
    UserExists,
    Cancelled,
    DeadlineExceeded,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidCredentials => "invalid_credentials",
            ErrorKind::InvalidApplication => "invalid_application",
            ErrorKind::UserExists => "user_exists",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::DeadlineExceeded => "deadline_exceeded",
            ErrorKind::Internal => "internal",
        }
    }
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid application")]
    InvalidApplication,

    #[error("User already exists")]
    UserExists,

    #[error("Request cancelled")]
    Cancelled,

    #[error("Deadline exceeded")]
    DeadlineExceeded,

    #[error("Store error: {0}")]
    Store(#[source] DbError),

    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("Background task failed: {0}")]
    Task(String),
}

impl AuthError {
    /// Collapse the error into its stable kind
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::InvalidCredentials => ErrorKind::InvalidCredentials,
            AuthError::InvalidApplication => ErrorKind::InvalidApplication,
            AuthError::UserExists => ErrorKind::UserExists,
            AuthError::Cancelled => ErrorKind::Cancelled,
            AuthError::DeadlineExceeded => ErrorKind::DeadlineExceeded,
            AuthError::Store(_)
            | AuthError::Token(_)
            | AuthError::PasswordHash(_)
            | AuthError::Task(_) => ErrorKind::Internal,
        }
    }
}

impl From<Interrupted> for AuthError {
    fn from(value: Interrupted) -> Self {
        match value {
            Interrupted::Cancelled => AuthError::Cancelled,
            Interrupted::DeadlineExceeded => AuthError::DeadlineExceeded,
        }
    }
}
