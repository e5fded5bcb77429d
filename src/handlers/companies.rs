use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query,
    },
    Json,
};
use serde_json::{json, Value};

use crate::database::models::{Company, CompanyDetail, CompanySearch, CompanyUpdate, NewCompany};
use crate::database::DatabaseManager;
use crate::middleware::{ApiResponse, ApiResult};

use super::{reject_body, reject_query};

/// GET /companies - list companies, optionally filtered
pub async fn list(query: Result<Query<CompanySearch>, QueryRejection>) -> ApiResult<Vec<Company>> {
    let Query(search) = query.map_err(reject_query)?;

    let pool = DatabaseManager::pool().await?;
    let companies = Company::find_all(&pool, search).await?;
    Ok(ApiResponse::success(companies))
}

/// GET /companies/:handle - company with its jobs
pub async fn get(Path(handle): Path<String>) -> ApiResult<CompanyDetail> {
    let pool = DatabaseManager::pool().await?;
    let company = Company::get(&pool, &handle).await?;
    Ok(ApiResponse::success(company))
}

/// POST /companies - create a company (admin)
pub async fn create(payload: Result<Json<NewCompany>, JsonRejection>) -> ApiResult<Company> {
    let Json(data) = payload.map_err(reject_body)?;

    let pool = DatabaseManager::pool().await?;
    let company = Company::create(&pool, data).await?;
    Ok(ApiResponse::created(company))
}

/// PATCH /companies/:handle - partial update (admin)
pub async fn update(
    Path(handle): Path<String>,
    payload: Result<Json<CompanyUpdate>, JsonRejection>,
) -> ApiResult<Company> {
    let Json(data) = payload.map_err(reject_body)?;

    let pool = DatabaseManager::pool().await?;
    let company = Company::update(&pool, &handle, data).await?;
    Ok(ApiResponse::success(company))
}

/// DELETE /companies/:handle - remove a company (admin)
pub async fn remove(Path(handle): Path<String>) -> ApiResult<Value> {
    let pool = DatabaseManager::pool().await?;
    Company::remove(&pool, &handle).await?;
    Ok(ApiResponse::success(json!({ "deleted": handle })))
}
