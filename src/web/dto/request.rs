//! Request DTOs for the Web API.

use serde::{Deserialize, Deserializer};
use validator::Validate;

/// Accept an optional ID sent either as a JSON string or a number.
fn optional_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    Ok(Option::<RawId>::deserialize(deserializer)?.map(|raw| match raw {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    }))
}

/// Body of `POST /api/scan`.
///
/// `fileUrl` is optional at this level so its absence is reported as a
/// 400 with a JSON error body.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ScanRequestBody {
    /// Publicly reachable URL of the file to scan.
    #[serde(default)]
    pub file_url: Option<String>,
    /// File record to flag when a threat is found.
    #[serde(default, deserialize_with = "optional_id")]
    pub file_id: Option<String>,
}

/// Body of `POST /api/files`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateFileRequest {
    /// Display name.
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,
    /// Object path in the storage bucket.
    #[validate(length(min = 1, max = 1024, message = "Storage path must be 1-1024 characters"))]
    pub storage_path: String,
    /// Containing folder.
    #[serde(default)]
    pub parent_id: Option<i64>,
    /// MIME type.
    #[serde(default)]
    pub content_type: Option<String>,
    /// Size in bytes.
    #[serde(default)]
    #[validate(range(min = 0, message = "Size cannot be negative"))]
    pub size: i64,
}

/// Body of `POST /api/folders`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateFolderRequest {
    /// Folder name.
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,
    /// Containing folder.
    #[serde(default)]
    pub parent_id: Option<i64>,
}

/// Body of `PATCH /api/files/:id`.
#[derive(Debug, Deserialize, Validate)]
pub struct RenameRequest {
    /// New name.
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,
}

/// Body of `POST /api/files/:id/shares`.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateShareRequest {
    /// Optional password protecting the link.
    #[serde(default)]
    #[validate(length(max = 128, message = "Password must be at most 128 characters"))]
    pub password: Option<String>,
    /// Optional lifetime in seconds (up to 30 days).
    #[serde(default)]
    #[validate(range(min = 60, max = 2592000, message = "Expiry must be between 1 minute and 30 days"))]
    pub expires_in_secs: Option<i64>,
}

/// Query of `GET /api/files`.
#[derive(Debug, Default, Deserialize)]
pub struct ListFilesQuery {
    /// Folder to list (root when absent).
    #[serde(default)]
    pub parent: Option<i64>,
}
