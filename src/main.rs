use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, patch, post},
    Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use jobboard_api::config;
use jobboard_api::database::DatabaseManager;
use jobboard_api::handlers::{auth, companies, jobs, users};
use jobboard_api::middleware::{
    authenticate_jwt, require_admin, require_self_or_admin, AuthState,
};

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL, SECRET_KEY, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    let app_config = config::config();
    tracing::info!("Starting jobboard API in {:?} mode", app_config.environment);

    let auth_state = AuthState::new(
        app_config.security.jwt_secret.clone(),
        app_config.security.jwt_expiry_hours,
    );

    let app = app(auth_state);

    let port = std::env::var("PORT")
        .ok()
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3001);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    tracing::info!("jobboard API listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}

fn app(auth_state: AuthState) -> Router {
    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        // Resources
        .merge(auth_routes())
        .merge(company_routes())
        .merge(job_routes())
        .merge(user_routes())
        // Identity extraction runs ahead of every route-level gate
        .layer(from_fn_with_state(auth_state.clone(), authenticate_jwt))
        // Global middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(auth_state)
}

fn auth_routes() -> Router<AuthState> {
    Router::new()
        .route("/auth/token", post(auth::token))
        .route("/auth/register", post(auth::register))
}

fn company_routes() -> Router<AuthState> {
    let public = Router::new()
        .route("/companies", get(companies::list))
        .route("/companies/:handle", get(companies::get));

    let admin = Router::new()
        .route("/companies", post(companies::create))
        .route(
            "/companies/:handle",
            patch(companies::update).delete(companies::remove),
        )
        .route_layer(from_fn(require_admin));

    public.merge(admin)
}

fn job_routes() -> Router<AuthState> {
    let public = Router::new()
        .route("/jobs", get(jobs::list))
        .route("/jobs/:id", get(jobs::get));

    let admin = Router::new()
        .route("/jobs", post(jobs::create))
        .route("/jobs/:id", patch(jobs::update).delete(jobs::remove))
        .route_layer(from_fn(require_admin));

    public.merge(admin)
}

fn user_routes() -> Router<AuthState> {
    let admin = Router::new()
        .route("/users", post(users::create).get(users::list))
        .route_layer(from_fn(require_admin));

    let self_or_admin = Router::new()
        .route(
            "/users/:username",
            get(users::get).patch(users::update).delete(users::remove),
        )
        .route("/users/:username/jobs/:id", post(users::apply))
        .route_layer(from_fn(require_self_or_admin));

    admin.merge(self_or_admin)
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "success": true,
        "data": {
            "name": "jobboard API",
            "version": version,
            "endpoints": {
                "auth": "/auth/token, /auth/register (public - token acquisition)",
                "companies": "/companies[/:handle] (GET public, mutations admin)",
                "jobs": "/jobs[/:id] (GET public, mutations admin)",
                "users": "/users[/:username] (admin or account owner)",
            }
        }
    }))
}

async fn health() -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match DatabaseManager::health_check().await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            axum::response::Json(json!({
                "success": false,
                "error": "database unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "database_error": e.to_string()
                }
            })),
        ),
    }
}
