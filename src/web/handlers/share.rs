//! Share link handlers.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use std::sync::Arc;

use crate::file::{FileRepository, NewShare, ShareRepository};
use crate::web::dto::{
    ApiResponse, CreateShareRequest, FileResponse, ShareResponse, SharedFileResponse,
    ValidatedJson,
};
use crate::web::error::ApiError;
use crate::web::handlers::file::{load_accessible, preview_url_for};
use crate::web::handlers::AppState;
use crate::web::middleware::{AuthUser, SHARE_PASSWORD_HEADER};

/// POST /api/files/:id/shares - Create a share link.
pub async fn create_share(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(id): Path<i64>,
    ValidatedJson(req): ValidatedJson<CreateShareRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ShareResponse>>), ApiError> {
    load_accessible(&state, &claims, id).await?;

    let mut new_share = NewShare::new(id, claims.sub.clone());
    if let Some(password) = req.password {
        new_share = new_share.with_password(password);
    }
    if let Some(secs) = req.expires_in_secs {
        new_share = new_share.with_expiry(chrono::Duration::seconds(secs));
    }

    let share = ShareRepository::new(state.db.pool())
        .create(&new_share)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(ShareResponse::from(share))),
    ))
}

/// GET /api/files/:id/shares - List the share links of a record.
pub async fn list_shares(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<ShareResponse>>>, ApiError> {
    load_accessible(&state, &claims, id).await?;

    let shares = ShareRepository::new(state.db.pool())
        .list_by_file(id)
        .await?;

    Ok(Json(ApiResponse::new(
        shares.into_iter().map(ShareResponse::from).collect(),
    )))
}

/// GET /api/shares/:token - Open a share link.
///
/// Public. Protected links need the password in `X-Share-Password`.
/// Records flagged as malware are returned without a preview URL.
pub async fn open_share(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<SharedFileResponse>>, ApiError> {
    let password = headers
        .get(SHARE_PASSWORD_HEADER)
        .and_then(|v| v.to_str().ok());

    let share = ShareRepository::new(state.db.pool())
        .verify(&token, password)
        .await?;

    let file = FileRepository::new(state.db.pool())
        .get_by_id(share.file_id)
        .await?
        .ok_or_else(|| ApiError::not_found("File not found"))?;

    // Flagged files are never signed for anonymous visitors.
    let preview_url = if file.is_malware {
        tracing::warn!(file_id = file.id, "Shared file flagged as malware, preview withheld");
        None
    } else {
        preview_url_for(&state, &file).await
    };

    Ok(Json(ApiResponse::new(SharedFileResponse {
        file: FileResponse::from(file),
        preview_url,
    })))
}

/// DELETE /api/shares/:token - Revoke a share link.
pub async fn delete_share(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(token): Path<String>,
) -> Result<StatusCode, ApiError> {
    let share_repo = ShareRepository::new(state.db.pool());
    let share = share_repo
        .get_by_token(&token)
        .await?
        .ok_or_else(|| ApiError::not_found("Share not found"))?;

    if !claims.can_access(&share.created_by) {
        return Err(ApiError::forbidden("Access denied"));
    }

    share_repo.delete(&token).await?;
    Ok(StatusCode::NO_CONTENT)
}
