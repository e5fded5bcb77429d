use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};

use crate::database::models::{NewUser, User, UserDetail, UserUpdate};
use crate::database::DatabaseManager;
use crate::middleware::{ApiResponse, ApiResult, AuthState};

use super::auth::issue_token;
use super::reject_body;

/// Admin user creation returns the new account along with a token for it.
#[derive(Debug, Serialize)]
pub struct CreatedUser {
    pub user: User,
    pub token: String,
}

/// POST /users - create a user, possibly an admin (admin only)
pub async fn create(
    State(auth): State<AuthState>,
    payload: Result<Json<NewUser>, JsonRejection>,
) -> ApiResult<CreatedUser> {
    let Json(data) = payload.map_err(reject_body)?;

    let pool = DatabaseManager::pool().await?;
    let user = User::register(&pool, data).await?;

    let token = issue_token(&auth, &user)?;
    Ok(ApiResponse::created(CreatedUser { user, token }))
}

/// GET /users - list all users (admin)
pub async fn list() -> ApiResult<Vec<User>> {
    let pool = DatabaseManager::pool().await?;
    let users = User::find_all(&pool).await?;
    Ok(ApiResponse::success(users))
}

/// GET /users/:username - user with their job applications (self or admin)
pub async fn get(Path(username): Path<String>) -> ApiResult<UserDetail> {
    let pool = DatabaseManager::pool().await?;
    let user = User::get(&pool, &username).await?;
    Ok(ApiResponse::success(user))
}

/// PATCH /users/:username - partial update (self or admin)
pub async fn update(
    Path(username): Path<String>,
    payload: Result<Json<UserUpdate>, JsonRejection>,
) -> ApiResult<User> {
    let Json(data) = payload.map_err(reject_body)?;

    let pool = DatabaseManager::pool().await?;
    let user = User::update(&pool, &username, data).await?;
    Ok(ApiResponse::success(user))
}

/// DELETE /users/:username - remove a user (self or admin)
pub async fn remove(Path(username): Path<String>) -> ApiResult<Value> {
    let pool = DatabaseManager::pool().await?;
    User::remove(&pool, &username).await?;
    Ok(ApiResponse::success(json!({ "deleted": username })))
}

/// POST /users/:username/jobs/:id - apply to a job (self or admin)
pub async fn apply(Path((username, job_id)): Path<(String, i32)>) -> ApiResult<Value> {
    let pool = DatabaseManager::pool().await?;
    User::apply_to_job(&pool, &username, job_id).await?;
    Ok(ApiResponse::created(json!({ "applied": job_id })))
}
