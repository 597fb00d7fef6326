//! Request/Response DTOs
//!
//! Absent fields deserialize to their zero value so that presence checks
//! happen in one place, in the handlers.

use serde::{Deserialize, Serialize};

/// Register request
#[derive(Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

/// Register response
#[derive(Serialize, Deserialize)]
pub struct RegisterResponse {
    pub id: i64,
}

/// Login request
#[derive(Deserialize, Serialize, Default)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    pub app_id: i32,
}

/// Login response
#[derive(Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

/// Admin check request
#[derive(Deserialize, Serialize, Default)]
#[serde(default)]
pub struct IsAdminRequest {
    pub user_id: i64,
}

/// Admin check response
#[derive(Serialize, Deserialize)]
pub struct IsAdminResponse {
    pub is_admin: bool,
}
