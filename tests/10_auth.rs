use anyhow::Result;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware::{from_fn, from_fn_with_state},
    routing::get,
    Extension, Router,
};
use http_body_util::BodyExt;
use tower::ServiceExt;

use jobboard_api::auth::{sign_token, Claims};
use jobboard_api::middleware::{
    authenticate_jwt, require_admin, require_logged_in, require_self_or_admin, AuthState, AuthUser,
};

const SECRET: &str = "gate-test-secret";

// The gate chain under test mirrors the one assembled in main: identity
// extraction wraps everything, the per-route gates sit inside it.
fn gate_app() -> Router {
    let auth = AuthState::new(SECRET, 1);

    Router::new()
        .route("/open", get(whoami))
        .route("/private", get(whoami).route_layer(from_fn(require_logged_in)))
        .route("/admin", get(whoami).route_layer(from_fn(require_admin)))
        .route(
            "/users/:username",
            get(whoami).route_layer(from_fn(require_self_or_admin)),
        )
        .route(
            "/users/:username/jobs/:id",
            get(whoami).route_layer(from_fn(require_self_or_admin)),
        )
        .layer(from_fn_with_state(auth, authenticate_jwt))
}

async fn whoami(user: Option<Extension<AuthUser>>) -> String {
    match user {
        Some(Extension(user)) => format!("{}:{}", user.username, user.is_admin),
        None => "anonymous".to_string(),
    }
}

fn token_for(username: &str, is_admin: bool) -> String {
    sign_token(&Claims::new(username, is_admin, 1), SECRET).unwrap()
}

async fn send(uri: &str, token: Option<&str>) -> Result<(StatusCode, String)> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }

    let response = gate_app().oneshot(builder.body(Body::empty())?).await?;
    let status = response.status();
    let bytes = response.into_body().collect().await?.to_bytes();
    Ok((status, String::from_utf8_lossy(&bytes).to_string()))
}

#[tokio::test]
async fn anonymous_request_passes_identity_extraction() -> Result<()> {
    let (status, body) = send("/open", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "anonymous");
    Ok(())
}

#[tokio::test]
async fn valid_token_attaches_payload() -> Result<()> {
    let token = token_for("u1", false);
    let (status, body) = send("/open", Some(&token)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "u1:false");
    Ok(())
}

#[tokio::test]
async fn garbage_token_is_silently_discarded() -> Result<()> {
    let (status, body) = send("/open", Some("not.a.token")).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "anonymous");
    Ok(())
}

#[tokio::test]
async fn wrong_secret_token_is_silently_discarded() -> Result<()> {
    let forged = sign_token(&Claims::new("u1", true, 1), "some-other-secret").unwrap();
    let (status, body) = send("/open", Some(&forged)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "anonymous");
    Ok(())
}

#[tokio::test]
async fn expired_token_is_silently_discarded() -> Result<()> {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        username: "u1".to_string(),
        is_admin: false,
        iat: now - 7200,
        exp: now - 3600,
    };
    let token = sign_token(&claims, SECRET).unwrap();

    let (status, body) = send("/open", Some(&token)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "anonymous");
    Ok(())
}

#[tokio::test]
async fn logged_in_gate_admits_any_authenticated_caller() -> Result<()> {
    let token = token_for("u1", false);
    let (status, body) = send("/private", Some(&token)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "u1:false");
    Ok(())
}

#[tokio::test]
async fn logged_in_gate_rejects_anonymous() -> Result<()> {
    let (status, body) = send("/private", None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let payload: serde_json::Value = serde_json::from_str(&body)?;
    assert_eq!(payload["error"], true);
    assert_eq!(payload["code"], "UNAUTHORIZED");
    Ok(())
}

#[tokio::test]
async fn logged_in_gate_rejects_expired_token() -> Result<()> {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        username: "u1".to_string(),
        is_admin: false,
        iat: now - 7200,
        exp: now - 3600,
    };
    let token = sign_token(&claims, SECRET).unwrap();

    let (status, _) = send("/private", Some(&token)).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn admin_gate_admits_admins_only() -> Result<()> {
    let admin = token_for("boss", true);
    let (status, body) = send("/admin", Some(&admin)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "boss:true");

    let plain = token_for("u1", false);
    let (status, _) = send("/admin", Some(&plain)).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send("/admin", None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn self_or_admin_gate_admits_matching_username() -> Result<()> {
    let token = token_for("u1", false);
    let (status, body) = send("/users/u1", Some(&token)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "u1:false");
    Ok(())
}

#[tokio::test]
async fn self_or_admin_gate_rejects_other_accounts() -> Result<()> {
    let token = token_for("u1", false);
    let (status, _) = send("/users/u2", Some(&token)).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn self_or_admin_gate_admits_admin_for_any_account() -> Result<()> {
    let token = token_for("boss", true);
    let (status, body) = send("/users/u2", Some(&token)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "boss:true");
    Ok(())
}

#[tokio::test]
async fn self_or_admin_gate_rejects_anonymous() -> Result<()> {
    let (status, _) = send("/users/u1", None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn self_or_admin_gate_reads_username_on_nested_routes() -> Result<()> {
    let token = token_for("u1", false);

    let (status, _) = send("/users/u1/jobs/7", Some(&token)).await?;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send("/users/u2/jobs/7", Some(&token)).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}
