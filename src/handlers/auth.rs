use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::auth::{sign_token, Claims};
use crate::database::models::{NewUser, User};
use crate::database::DatabaseManager;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthState};

use super::reject_body;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Self-registration payload. Unlike admin user creation, the admin flag is
/// not accepted here.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// POST /auth/token - exchange credentials for a bearer token
pub async fn token(
    State(auth): State<AuthState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<TokenResponse> {
    let Json(req) = payload.map_err(reject_body)?;

    let pool = DatabaseManager::pool().await?;
    let user = User::authenticate(&pool, &req.username, &req.password).await?;

    let token = issue_token(&auth, &user)?;
    Ok(ApiResponse::success(TokenResponse { token }))
}

/// POST /auth/register - create an account and log it in
pub async fn register(
    State(auth): State<AuthState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<TokenResponse> {
    let Json(req) = payload.map_err(reject_body)?;

    let pool = DatabaseManager::pool().await?;
    let user = User::register(
        &pool,
        NewUser {
            username: req.username,
            password: req.password,
            first_name: req.first_name,
            last_name: req.last_name,
            email: req.email,
            is_admin: false,
        },
    )
    .await?;

    let token = issue_token(&auth, &user)?;
    Ok(ApiResponse::created(TokenResponse { token }))
}

pub(crate) fn issue_token(auth: &AuthState, user: &User) -> Result<String, ApiError> {
    let claims = Claims::new(&user.username, user.is_admin, auth.token_ttl_hours);
    sign_token(&claims, &auth.jwt_secret).map_err(|e| {
        tracing::error!("Failed to sign token for {}: {}", user.username, e);
        ApiError::internal_server_error("Failed to issue token")
    })
}
