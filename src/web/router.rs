//! Router configuration for the Web API.

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::handlers::{
    clear_preview_cache, create_file, create_folder, create_share, delete_file, delete_share,
    get_file, get_preview, list_files, list_shares, open_share, preview_cache_stats, rename_file,
    scan_file, AppState,
};
use super::middleware::{create_cors_layer, jwt_auth, scan_rate_limit, JwtState, RateLimitState};

/// Create the main API router.
pub fn create_router(
    app_state: Arc<AppState>,
    jwt_state: Arc<JwtState>,
    rate_limit_state: Arc<RateLimitState>,
    cors_origins: &[String],
) -> Router {
    let scan_routes = Router::new()
        .route("/scan", post(scan_file))
        .route_layer(middleware::from_fn(move |req, next| {
            let state = rate_limit_state.clone();
            scan_rate_limit(state, req, next)
        }));

    let file_routes = Router::new()
        .route("/files", get(list_files).post(create_file))
        .route("/folders", post(create_folder))
        .route(
            "/files/:id",
            get(get_file).patch(rename_file).delete(delete_file),
        )
        .route("/files/:id/preview", get(get_preview))
        .route("/files/:id/shares", get(list_shares).post(create_share))
        .route("/shares/:token", get(open_share).delete(delete_share));

    let admin_routes = Router::new()
        .route("/preview-cache", get(preview_cache_stats))
        .route("/preview-cache/clear", post(clear_preview_cache));

    let api_routes = Router::new()
        .merge(scan_routes)
        .merge(file_routes)
        .nest("/admin", admin_routes);

    Router::new()
        .nest("/api", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(cors_origins))
                .layer(middleware::from_fn(move |req, next| {
                    let state = jwt_state.clone();
                    jwt_auth(state, req, next)
                })),
        )
        .with_state(app_state)
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health_check))
}

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}
