//! Malware scan handler.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::file::FileRepository;
use crate::scan::{ScanOutcome, ScanRequest};
use crate::web::dto::{ScanPendingResponse, ScanRequestBody, ValidatedJson};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::web::middleware::AuthUser;

/// POST /api/scan - Scan a file URL with the reputation service.
///
/// Responds 200 with the verdict, or 202 when the analysis is still running
/// after the last poll.
pub async fn scan_file(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    ValidatedJson(req): ValidatedJson<ScanRequestBody>,
) -> Result<Response, ApiError> {
    let file_id = req
        .file_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty());

    // Only records the caller may modify are flagged.
    if let Some(id) = file_id.as_deref().and_then(|id| id.parse::<i64>().ok()) {
        let file_repo = FileRepository::new(state.db.pool());
        if let Some(file) = file_repo.get_by_id(id).await? {
            if !claims.can_access(&file.owner_id) {
                return Err(ApiError::forbidden("Access denied"));
            }
        }
    }

    let request = ScanRequest {
        file_url: req.file_url,
        file_id,
    };

    match state.scanner.scan(request).await? {
        ScanOutcome::Completed(report) => Ok(Json(report).into_response()),
        ScanOutcome::Pending { analysis_id } => Ok((
            StatusCode::ACCEPTED,
            Json(ScanPendingResponse::new(analysis_id)),
        )
            .into_response()),
    }
}
