//! Authentication RPC routes

use axum::extract::{FromRequest, State};
use axum::{Json, Router, http::StatusCode, routing::post};
use passport_auth::{AuthError, RequestContext};
use tracing::debug;

use crate::error::ApiError;
use crate::state::AppState;

use super::types::{
    IsAdminRequest, IsAdminResponse, LoginRequest, LoginResponse, RegisterRequest,
    RegisterResponse,
};

/// JSON body extractor whose rejections are reported as `ApiError`
#[derive(FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
struct RpcJson<T>(T);

// ==================== Input Validation ====================

fn validate_register(request: &RegisterRequest) -> Result<(), ApiError> {
    if request.email.is_empty() {
        return Err(ApiError::InvalidArgument("empty email"));
    }
    if request.password.is_empty() {
        return Err(ApiError::InvalidArgument("empty password"));
    }
    Ok(())
}

fn validate_login(request: &LoginRequest) -> Result<(), ApiError> {
    if request.email.is_empty() {
        return Err(ApiError::InvalidArgument("empty email"));
    }
    if request.app_id == 0 {
        return Err(ApiError::InvalidArgument("empty app_id"));
    }
    if request.password.is_empty() {
        return Err(ApiError::InvalidArgument("empty password"));
    }
    Ok(())
}

fn validate_is_admin(request: &IsAdminRequest) -> Result<(), ApiError> {
    if request.user_id == 0 {
        return Err(ApiError::InvalidArgument("empty user_id"));
    }
    Ok(())
}

/// Count the outcome of one service call
fn record<T>(op: &'static str, result: Result<T, AuthError>) -> Result<T, ApiError> {
    let outcome = match &result {
        Ok(_) => "ok",
        Err(e) => e.kind().as_str(),
    };
    metrics::counter!("passport_auth_requests_total", "op" => op, "outcome" => outcome)
        .increment(1);

    result.map_err(ApiError::from)
}

// ==================== Auth Routes ====================

/// POST /api/v1/auth/register
async fn register(
    State(state): State<AppState>,
    RpcJson(request): RpcJson<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    validate_register(&request)?;
    debug!("Register request for {}", request.email);

    let ctx = RequestContext::with_timeout(state.request_timeout);
    let id = record(
        "register",
        state
            .auth
            .register(&ctx, &request.password, &request.email)
            .await,
    )?;

    Ok((StatusCode::CREATED, Json(RegisterResponse { id })))
}

/// POST /api/v1/auth/login
async fn login(
    State(state): State<AppState>,
    RpcJson(request): RpcJson<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    validate_login(&request)?;
    debug!("Login request for {} (app {})", request.email, request.app_id);

    let ctx = RequestContext::with_timeout(state.request_timeout);
    let token = record(
        "login",
        state
            .auth
            .login(&ctx, &request.password, &request.email, request.app_id)
            .await,
    )?;

    Ok(Json(LoginResponse { token }))
}

/// POST /api/v1/auth/is-admin
async fn is_admin(
    State(state): State<AppState>,
    RpcJson(request): RpcJson<IsAdminRequest>,
) -> Result<Json<IsAdminResponse>, ApiError> {
    validate_is_admin(&request)?;

    let ctx = RequestContext::with_timeout(state.request_timeout);
    let is_admin = record("is_admin", state.auth.is_admin(&ctx, request.user_id).await)?;

    Ok(Json(IsAdminResponse { is_admin }))
}

/// Create auth routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/auth/register", post(register))
        .route("/api/v1/auth/login", post(login))
        .route("/api/v1/auth/is-admin", post(is_admin))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_login_reports_first_missing_field() {
        let request = LoginRequest::default();
        assert!(matches!(
            validate_login(&request),
            Err(ApiError::InvalidArgument("empty email"))
        ));

        let request = LoginRequest {
            email: "a@example.com".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            validate_login(&request),
            Err(ApiError::InvalidArgument("empty app_id"))
        ));

        let request = LoginRequest {
            email: "a@example.com".to_string(),
            app_id: 1,
            ..Default::default()
        };
        assert!(matches!(
            validate_login(&request),
            Err(ApiError::InvalidArgument("empty password"))
        ));
    }

    #[test]
    fn test_validate_register_and_is_admin() {
        let request = RegisterRequest {
            email: "a@example.com".to_string(),
            password: String::new(),
        };
        assert!(matches!(
            validate_register(&request),
            Err(ApiError::InvalidArgument("empty password"))
        ));
        assert!(validate_is_admin(&IsAdminRequest { user_id: 0 }).is_err());
        assert!(validate_is_admin(&IsAdminRequest { user_id: 3 }).is_ok());
    }
}
