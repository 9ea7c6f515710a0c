//! File and folder handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::file::{FileRecord, FileRepository, NewFile};
use crate::web::dto::{
    ApiResponse, CreateFileRequest, CreateFolderRequest, FileResponse, ListFilesQuery,
    PreviewResponse, RenameRequest, ValidatedJson,
};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::web::middleware::{AuthUser, JwtClaims};

/// Load a record the caller may access.
pub(crate) async fn load_accessible(
    state: &AppState,
    claims: &JwtClaims,
    id: i64,
) -> Result<FileRecord, ApiError> {
    let file = FileRepository::new(state.db.pool())
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("File not found"))?;

    if !claims.can_access(&file.owner_id) {
        tracing::warn!(file_id = id, sub = %claims.sub, "File access refused");
        return Err(ApiError::forbidden("Access denied"));
    }

    Ok(file)
}

/// Preview URL for a record, or None.
///
/// Signing failures are logged and reported as no preview.
pub(crate) async fn preview_url_for(state: &AppState, file: &FileRecord) -> Option<String> {
    if !file.is_previewable() {
        return None;
    }

    match state.preview.get_preview_url(file).await {
        Ok(url) => url,
        Err(e) => {
            tracing::warn!(file_id = file.id, error = %e, "Preview URL unavailable");
            None
        }
    }
}

/// GET /api/files - List the records in a folder (root by default).
pub async fn list_files(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Query(query): Query<ListFilesQuery>,
) -> Result<Json<ApiResponse<Vec<FileResponse>>>, ApiError> {
    if let Some(parent) = query.parent {
        load_accessible(&state, &claims, parent).await?;
    }

    let files = FileRepository::new(state.db.pool())
        .list_by_parent(query.parent)
        .await?;

    let responses = files
        .into_iter()
        .filter(|f| claims.can_access(&f.owner_id))
        .map(FileResponse::from)
        .collect();

    Ok(Json(ApiResponse::new(responses)))
}

/// POST /api/files - Create a file record.
pub async fn create_file(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    ValidatedJson(req): ValidatedJson<CreateFileRequest>,
) -> Result<(StatusCode, Json<ApiResponse<FileResponse>>), ApiError> {
    if let Some(parent) = req.parent_id {
        load_accessible(&state, &claims, parent).await?;
    }

    let mut new_file =
        NewFile::file(req.name, req.storage_path, claims.sub.clone()).with_size(req.size);
    if let Some(parent) = req.parent_id {
        new_file = new_file.with_parent(parent);
    }
    if let Some(content_type) = req.content_type.filter(|ct| !ct.trim().is_empty()) {
        new_file = new_file.with_content_type(content_type);
    }

    let file = FileRepository::new(state.db.pool())
        .create(&new_file)
        .await?;

    tracing::info!(file_id = file.id, owner = %file.owner_id, "File record created");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(FileResponse::from(file))),
    ))
}

/// POST /api/folders - Create a folder.
pub async fn create_folder(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    ValidatedJson(req): ValidatedJson<CreateFolderRequest>,
) -> Result<(StatusCode, Json<ApiResponse<FileResponse>>), ApiError> {
    if let Some(parent) = req.parent_id {
        load_accessible(&state, &claims, parent).await?;
    }

    let folder = FileRepository::new(state.db.pool())
        .create_folder(&req.name, req.parent_id, &claims.sub)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(FileResponse::from(folder))),
    ))
}

/// GET /api/files/:id - Get a record.
pub async fn get_file(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<FileResponse>>, ApiError> {
    let file = load_accessible(&state, &claims, id).await?;
    Ok(Json(ApiResponse::new(FileResponse::from(file))))
}

/// PATCH /api/files/:id - Rename a record.
pub async fn rename_file(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(id): Path<i64>,
    ValidatedJson(req): ValidatedJson<RenameRequest>,
) -> Result<Json<ApiResponse<FileResponse>>, ApiError> {
    load_accessible(&state, &claims, id).await?;

    let file = FileRepository::new(state.db.pool())
        .rename(id, &req.name)
        .await?;

    Ok(Json(ApiResponse::new(FileResponse::from(file))))
}

/// DELETE /api/files/:id - Delete a record (folders recursively).
pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    load_accessible(&state, &claims, id).await?;

    if !FileRepository::new(state.db.pool()).delete(id).await? {
        return Err(ApiError::not_found("File not found"));
    }

    tracing::info!(file_id = id, sub = %claims.sub, "File record deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/files/:id/preview - Signed preview URL for a record.
pub async fn get_preview(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<PreviewResponse>, ApiError> {
    let file = load_accessible(&state, &claims, id).await?;
    let previewable = file.is_previewable();
    let url = preview_url_for(&state, &file).await;

    Ok(Json(PreviewResponse { url, previewable }))
}
