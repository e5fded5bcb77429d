use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query,
    },
    Json,
};
use serde_json::{json, Value};

use crate::database::models::{Job, JobDetail, JobSearch, JobUpdate, NewJob};
use crate::database::DatabaseManager;
use crate::middleware::{ApiResponse, ApiResult};

use super::{reject_body, reject_query};

/// GET /jobs - list jobs, optionally filtered
pub async fn list(query: Result<Query<JobSearch>, QueryRejection>) -> ApiResult<Vec<Job>> {
    let Query(search) = query.map_err(reject_query)?;

    let pool = DatabaseManager::pool().await?;
    let jobs = Job::find_all(&pool, search).await?;
    Ok(ApiResponse::success(jobs))
}

/// GET /jobs/:id - job with its company
pub async fn get(Path(id): Path<i32>) -> ApiResult<JobDetail> {
    let pool = DatabaseManager::pool().await?;
    let job = Job::get(&pool, id).await?;
    Ok(ApiResponse::success(job))
}

/// POST /jobs - create a job (admin)
pub async fn create(payload: Result<Json<NewJob>, JsonRejection>) -> ApiResult<Job> {
    let Json(data) = payload.map_err(reject_body)?;

    let pool = DatabaseManager::pool().await?;
    let job = Job::create(&pool, data).await?;
    Ok(ApiResponse::created(job))
}

/// PATCH /jobs/:id - partial update (admin)
pub async fn update(
    Path(id): Path<i32>,
    payload: Result<Json<JobUpdate>, JsonRejection>,
) -> ApiResult<Job> {
    let Json(data) = payload.map_err(reject_body)?;

    let pool = DatabaseManager::pool().await?;
    let job = Job::update(&pool, id, data).await?;
    Ok(ApiResponse::success(job))
}

/// DELETE /jobs/:id - remove a job (admin)
pub async fn remove(Path(id): Path<i32>) -> ApiResult<Value> {
    let pool = DatabaseManager::pool().await?;
    Job::remove(&pool, id).await?;
    Ok(ApiResponse::success(json!({ "deleted": id })))
}
