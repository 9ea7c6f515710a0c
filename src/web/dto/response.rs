//! Response DTOs for the Web API.

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::file::{FileRecord, ShareLink};

/// Generic API response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a new API response.
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Convert an SQLite `datetime('now')` value to RFC 3339.
///
/// Values that do not parse are passed through unchanged.
pub fn to_rfc3339(value: &str) -> String {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
        .map(|dt| dt.and_utc().to_rfc3339())
        .unwrap_or_else(|_| value.to_string())
}

/// File or folder in API responses.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileResponse {
    pub id: i64,
    pub name: String,
    pub parent_id: Option<i64>,
    pub is_folder: bool,
    pub content_type: Option<String>,
    pub size: i64,
    pub owner_id: String,
    /// Flagged by a completed scan.
    pub is_malware: bool,
    /// Whether the UI can render an inline preview.
    pub previewable: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<FileRecord> for FileResponse {
    fn from(file: FileRecord) -> Self {
        let content_type = file.effective_content_type();
        let previewable = file.is_previewable();

        Self {
            id: file.id,
            name: file.name,
            parent_id: file.parent_id,
            is_folder: file.is_folder,
            content_type,
            size: file.size,
            owner_id: file.owner_id,
            is_malware: file.is_malware,
            previewable,
            created_at: to_rfc3339(&file.created_at),
            updated_at: to_rfc3339(&file.updated_at),
        }
    }
}

/// Preview lookup result. `url` is null when no preview is available.
#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    pub url: Option<String>,
    pub previewable: bool,
}

/// Share link in API responses.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareResponse {
    pub token: String,
    pub file_id: i64,
    /// Whether a password is required.
    pub protected: bool,
    pub expires_at: Option<String>,
    pub created_by: String,
    pub created_at: String,
}

impl From<ShareLink> for ShareResponse {
    fn from(share: ShareLink) -> Self {
        Self {
            protected: share.is_protected(),
            token: share.token,
            file_id: share.file_id,
            expires_at: share.expires_at.as_deref().map(to_rfc3339),
            created_by: share.created_by,
            created_at: to_rfc3339(&share.created_at),
        }
    }
}

/// A file opened through a share link.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedFileResponse {
    pub file: FileResponse,
    pub preview_url: Option<String>,
}

/// Scan still running after the polling budget (202).
#[derive(Debug, Serialize)]
pub struct ScanPendingResponse {
    /// Provider analysis ID.
    pub id: String,
    pub status: &'static str,
}

impl ScanPendingResponse {
    pub fn new(id: String) -> Self {
        Self {
            id,
            status: "pending",
        }
    }
}

/// Result of clearing the preview cache.
#[derive(Debug, Serialize)]
pub struct CacheClearResponse {
    /// Number of entries removed.
    pub cleared: usize,
}

/// Preview cache statistics.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStatsResponse {
    pub entries: usize,
    pub ttl_secs: u64,
}
