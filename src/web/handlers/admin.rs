//! Admin handlers.

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::web::dto::{ApiResponse, CacheClearResponse, CacheStatsResponse};
use crate::web::handlers::AppState;
use crate::web::middleware::AdminUser;

/// POST /api/admin/preview-cache/clear - Drop every cached preview URL.
pub async fn clear_preview_cache(
    State(state): State<Arc<AppState>>,
    AdminUser(claims): AdminUser,
) -> Json<CacheClearResponse> {
    let cleared = state.preview.clear();
    tracing::info!(admin = %claims.sub, cleared, "Preview cache cleared");
    Json(CacheClearResponse { cleared })
}

/// GET /api/admin/preview-cache - Preview cache statistics.
pub async fn preview_cache_stats(
    State(state): State<Arc<AppState>>,
    AdminUser(_claims): AdminUser,
) -> Json<ApiResponse<CacheStatsResponse>> {
    Json(ApiResponse::new(CacheStatsResponse {
        entries: state.preview.len(),
        ttl_secs: state.preview.ttl().as_secs(),
    }))
}
