//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors, but application-level
//! errors should use `kernel::error::AppError`.

use axum::{
    Json, Router, http,
    http::{Method, header},
    middleware::from_fn,
    routing::get,
};
use chrono::Utc;
use session::application::SessionStore;
use session::middleware::{CurrentUser, SessionMiddlewareState, require_session};
use session::{PgSessionRepository, SessionConfig, session_router};
use sqlx::postgres::PgPoolOptions;
use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// Re-export unified error types for use in handlers
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=info,session=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Session configuration. Startup must fail on a missing signing secret;
    // a generated fallback would sign tokens no other instance could verify.
    let session_config = SessionConfig::from_env()
        .map_err(|e| anyhow::anyhow!("session configuration invalid: {e}"))?;

    // Database connection
    let database_url = env::var("DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set in environment"))?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("../../../database/migrations")
        .run(&pool)
        .await?;

    tracing::info!("Migrations completed");

    // Startup cleanup: remove fully expired sessions.
    // Errors here should not prevent server startup.
    let repo = PgSessionRepository::new(pool.clone());
    let cleanup_store = SessionStore::new(
        Arc::new(repo.clone()),
        Arc::new(session_config.clone()),
    );
    match cleanup_store.cleanup_expired(Utc::now()).await {
        Ok(deleted) => {
            tracing::info!(sessions_deleted = deleted, "Session cleanup completed");
        }
        Err(e) => {
            tracing::warn!(error = %e, "Session cleanup failed, continuing anyway");
        }
    }

    // CORS configuration
    let frontend_origins = env::var("FRONTEND_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:40922,http://127.0.0.1:40922".to_string());

    let allowed_origins: Vec<http::HeaderValue> = frontend_origins
        .split(',')
        .filter_map(|origin| origin.trim().parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ]))
        .allow_credentials(true);

    // Protected routes sit behind the session middleware
    let middleware_state = SessionMiddlewareState {
        repo: Arc::new(repo.clone()),
        config: Arc::new(session_config.clone()),
    };
    let protected = Router::new()
        .route("/me", get(current_user))
        .layer(from_fn(move |req, next| {
            require_session(middleware_state.clone(), req, next)
        }));

    // Build router
    let api = Router::new()
        .nest("/session", session_router(repo, session_config))
        .merge(protected);
    let app = Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], 31113));
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// GET /api/me
///
/// Echoes the validated claims; mainly a smoke test for the middleware.
async fn current_user(
    axum::Extension(user): axum::Extension<CurrentUser>,
) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "userId": user.claims.sub,
        "userName": user.claims.name,
        "roles": user.claims.roles,
    }))
}
