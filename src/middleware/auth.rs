use axum::{
    extract::{RawPathParams, Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::auth::{verify_token, Claims};
use crate::error::ApiError;

/// Auth material the gate needs, passed in explicitly at router construction
/// instead of read from process-wide config.
#[derive(Clone)]
pub struct AuthState {
    pub jwt_secret: String,
    pub token_ttl_hours: u64,
}

impl AuthState {
    pub fn new(jwt_secret: impl Into<String>, token_ttl_hours: u64) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            token_ttl_hours,
        }
    }
}

/// Authenticated caller context extracted from a verified bearer token
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub username: String,
    pub is_admin: bool,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            username: claims.username,
            is_admin: claims.is_admin,
        }
    }
}

/// Identity extraction. Runs on every request, ahead of any gate.
///
/// A verified token attaches an [`AuthUser`] to the request; a missing or
/// invalid token attaches nothing. This stage never fails the request -
/// rejecting anonymous callers is the gates' job.
pub async fn authenticate_jwt(
    State(auth): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(token) = bearer_token(request.headers()) {
        match verify_token(&token, &auth.jwt_secret) {
            Ok(claims) => {
                request.extensions_mut().insert(AuthUser::from(claims));
            }
            Err(err) => {
                tracing::debug!("discarding unverifiable bearer token: {}", err);
            }
        }
    }

    next.run(request).await
}

/// Gate: any authenticated caller.
pub async fn require_logged_in(request: Request, next: Next) -> Result<Response, ApiError> {
    if request.extensions().get::<AuthUser>().is_none() {
        return Err(ApiError::unauthorized("Authentication required"));
    }
    Ok(next.run(request).await)
}

/// Gate: callers whose admin flag is set.
pub async fn require_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    let is_admin = request
        .extensions()
        .get::<AuthUser>()
        .map(|user| user.is_admin);

    if is_admin != Some(true) {
        return Err(ApiError::unauthorized("Administrator access required"));
    }
    Ok(next.run(request).await)
}

/// Gate: the account named by the route's `:username` segment, or any admin.
pub async fn require_self_or_admin(
    params: RawPathParams,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = request
        .extensions()
        .get::<AuthUser>()
        .cloned()
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    if user.is_admin {
        return Ok(next.run(request).await);
    }

    let target = params
        .iter()
        .find(|(name, _)| *name == "username")
        .map(|(_, value)| value);

    if target == Some(user.username.as_str()) {
        return Ok(next.run(request).await);
    }

    Err(ApiError::unauthorized(
        "Must be the account owner or an administrator",
    ))
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))?
        .trim();

    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}
