//! Passport Authentication
//!
//! This crate provides the authentication service (login, registration and
//! admin lookup), per-application JWT issuance and Argon2 password hashing.

pub mod context;
pub mod error;
pub mod jwt;
pub mod password;
pub mod service;

pub use context::{Interrupted, RequestContext};
pub use error::{AuthError, ErrorKind};
pub use jwt::{Claims, JwtIssuer, TokenError, TokenSigner};
pub use password::{hash_password, verify_password};
pub use service::AuthService;
