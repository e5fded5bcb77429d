pub mod auth;
pub mod response;

pub use auth::{
    authenticate_jwt, require_admin, require_logged_in, require_self_or_admin, AuthState, AuthUser,
};
pub use response::{ApiResponse, ApiResult};
