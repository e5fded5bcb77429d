use axum::extract::rejection::{JsonRejection, QueryRejection};

use crate::error::ApiError;

pub mod auth;
pub mod companies;
pub mod jobs;
pub mod users;

pub(crate) fn reject_body(rejection: JsonRejection) -> ApiError {
    ApiError::bad_request(rejection.body_text())
}

pub(crate) fn reject_query(rejection: QueryRejection) -> ApiError {
    ApiError::bad_request(rejection.body_text())
}
