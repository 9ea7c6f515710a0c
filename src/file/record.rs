//! File and folder records for the explorer tree.

use async_trait::async_trait;
use serde::Serialize;

use crate::db::DbPool;
use crate::scan::ThreatRecorder;
use crate::{Result, VaultError};

use super::validation::validate_name;

const SELECT_COLUMNS: &str = "SELECT id, name, parent_id, is_folder, storage_path, content_type, size,
        owner_id, is_malware, scan_result, created_at, updated_at FROM files";

/// A file or folder in the explorer.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct FileRecord {
    /// Unique record ID.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Containing folder (None at the root).
    pub parent_id: Option<i64>,
    /// Whether this record is a folder.
    pub is_folder: bool,
    /// Object path in the storage bucket (None for folders).
    pub storage_path: Option<String>,
    /// MIME type reported at upload.
    pub content_type: Option<String>,
    /// Size in bytes.
    pub size: i64,
    /// Owner (subject of the auth token).
    pub owner_id: String,
    /// Set when the remote scan reported a threat.
    pub is_malware: bool,
    /// Raw provider result stored alongside the malware flag (JSON).
    pub scan_result: Option<String>,
    /// Creation timestamp.
    pub created_at: String,
    /// Last update timestamp.
    pub updated_at: String,
}

impl FileRecord {
    /// Content type, falling back to a guess from the file extension.
    pub fn effective_content_type(&self) -> Option<String> {
        match self.content_type.as_deref() {
            Some(ct) if !ct.is_empty() => Some(ct.to_string()),
            _ => crate::preview::guess_content_type(&self.name),
        }
    }

    /// Whether the UI can render an inline preview of this record.
    pub fn is_previewable(&self) -> bool {
        !self.is_folder
            && self
                .effective_content_type()
                .as_deref()
                .is_some_and(crate::preview::is_previewable)
    }
}

/// Data for creating a new record.
#[derive(Debug, Clone)]
pub struct NewFile {
    /// Display name.
    pub name: String,
    /// Containing folder.
    pub parent_id: Option<i64>,
    /// Whether this is a folder.
    pub is_folder: bool,
    /// Object path in the storage bucket.
    pub storage_path: Option<String>,
    /// MIME type.
    pub content_type: Option<String>,
    /// Size in bytes.
    pub size: i64,
    /// Owner.
    pub owner_id: String,
}

impl NewFile {
    /// A file record backed by an object in storage.
    pub fn file(
        name: impl Into<String>,
        storage_path: impl Into<String>,
        owner_id: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            parent_id: None,
            is_folder: false,
            storage_path: Some(storage_path.into()),
            content_type: None,
            size: 0,
            owner_id: owner_id.into(),
        }
    }

    /// A folder record.
    pub fn folder(name: impl Into<String>, owner_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent_id: None,
            is_folder: true,
            storage_path: None,
            content_type: None,
            size: 0,
            owner_id: owner_id.into(),
        }
    }

    /// Place the record inside a folder.
    pub fn with_parent(mut self, parent_id: i64) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    /// Set the content type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Set the size.
    pub fn with_size(mut self, size: i64) -> Self {
        self.size = size;
        self
    }
}

/// Repository for file and folder records.
pub struct FileRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> FileRepository<'a> {
    /// Create a new FileRepository with the given pool reference.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Create a file or folder record.
    ///
    /// The name is validated, the parent must be an existing folder and no
    /// sibling of the same owner may already use the name.
    pub async fn create(&self, new_file: &NewFile) -> Result<FileRecord> {
        let name = validate_name(&new_file.name)
            .map_err(|e| VaultError::Validation(e.to_string()))?;

        if let Some(parent_id) = new_file.parent_id {
            self.require_folder(parent_id).await?;
        }
        if self
            .name_taken(&new_file.owner_id, new_file.parent_id, &name, None)
            .await?
        {
            return Err(VaultError::Conflict(format!("'{}' already exists", name)));
        }

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO files (name, parent_id, is_folder, storage_path, content_type, size, owner_id)
             VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING id",
        )
        .bind(&name)
        .bind(new_file.parent_id)
        .bind(new_file.is_folder)
        .bind(&new_file.storage_path)
        .bind(&new_file.content_type)
        .bind(new_file.size)
        .bind(&new_file.owner_id)
        .fetch_one(self.pool)
        .await?;

        tracing::debug!(id, name = %name, is_folder = new_file.is_folder, "Created file record");

        self.get_by_id(id)
            .await?
            .ok_or_else(|| VaultError::NotFound("file".to_string()))
    }

    /// Create a folder.
    pub async fn create_folder(
        &self,
        name: &str,
        parent_id: Option<i64>,
        owner_id: &str,
    ) -> Result<FileRecord> {
        let mut folder = NewFile::folder(name, owner_id);
        folder.parent_id = parent_id;
        self.create(&folder).await
    }

    /// Get a record by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<FileRecord>> {
        let record = sqlx::query_as::<_, FileRecord>(&format!("{SELECT_COLUMNS} WHERE id = ?"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(record)
    }

    /// List the children of a folder (or the root), folders first.
    pub async fn list_by_parent(&self, parent_id: Option<i64>) -> Result<Vec<FileRecord>> {
        let records = sqlx::query_as::<_, FileRecord>(&format!(
            "{SELECT_COLUMNS} WHERE parent_id IS ? ORDER BY is_folder DESC, name COLLATE NOCASE, id"
        ))
        .bind(parent_id)
        .fetch_all(self.pool)
        .await?;
        Ok(records)
    }

    /// Rename a record.
    pub async fn rename(&self, id: i64, new_name: &str) -> Result<FileRecord> {
        let name =
            validate_name(new_name).map_err(|e| VaultError::Validation(e.to_string()))?;

        let current = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| VaultError::NotFound("file".to_string()))?;

        if current.name == name {
            return Ok(current);
        }
        if self
            .name_taken(&current.owner_id, current.parent_id, &name, Some(id))
            .await?
        {
            return Err(VaultError::Conflict(format!("'{}' already exists", name)));
        }

        sqlx::query("UPDATE files SET name = ?, updated_at = datetime('now') WHERE id = ?")
            .bind(&name)
            .bind(id)
            .execute(self.pool)
            .await?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| VaultError::NotFound("file".to_string()))
    }

    /// Delete a record (children of a folder cascade).
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM files WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Flag a record as malware and store the raw provider result.
    pub async fn mark_malware(&self, id: i64, scan_result: &serde_json::Value) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE files SET is_malware = 1, scan_result = ?, updated_at = datetime('now')
             WHERE id = ?",
        )
        .bind(scan_result.to_string())
        .bind(id)
        .execute(self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn require_folder(&self, id: i64) -> Result<()> {
        match self.get_by_id(id).await? {
            Some(record) if record.is_folder => Ok(()),
            Some(_) => Err(VaultError::Validation(
                "parent must be a folder".to_string(),
            )),
            None => Err(VaultError::NotFound("parent folder".to_string())),
        }
    }

    async fn name_taken(
        &self,
        owner_id: &str,
        parent_id: Option<i64>,
        name: &str,
        exclude_id: Option<i64>,
    ) -> Result<bool> {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM files
             WHERE owner_id = ? AND parent_id IS ? AND name = ? AND id IS NOT ?)",
        )
        .bind(owner_id)
        .bind(parent_id)
        .bind(name)
        .bind(exclude_id)
        .fetch_one(self.pool)
        .await?;
        Ok(taken)
    }
}

/// Writes scan verdicts onto file records.
#[derive(Debug, Clone)]
pub struct FileThreatRecorder {
    pool: DbPool,
}

impl FileThreatRecorder {
    /// Create a recorder backed by the given pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ThreatRecorder for FileThreatRecorder {
    async fn record_threat(&self, file_id: &str, result: &serde_json::Value) -> Result<()> {
        let id: i64 = file_id
            .trim()
            .parse()
            .map_err(|_| VaultError::NotFound(format!("file {}", file_id)))?;

        let updated = FileRepository::new(&self.pool)
            .mark_malware(id, result)
            .await?;
        if !updated {
            return Err(VaultError::NotFound(format!("file {}", file_id)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use serde_json::json;

    async fn setup_db() -> Database {
        Database::open_in_memory().await.unwrap()
    }

    #[tokio::test]
    async fn test_create_file() {
        let db = setup_db().await;
        let repo = FileRepository::new(db.pool());

        let file = repo
            .create(
                &NewFile::file("report.pdf", "user-1/report.pdf", "user-1")
                    .with_content_type("application/pdf")
                    .with_size(2048),
            )
            .await
            .unwrap();

        assert_eq!(file.name, "report.pdf");
        assert!(!file.is_folder);
        assert_eq!(file.storage_path.as_deref(), Some("user-1/report.pdf"));
        assert_eq!(file.content_type.as_deref(), Some("application/pdf"));
        assert_eq!(file.size, 2048);
        assert!(!file.is_malware);
        assert!(file.scan_result.is_none());
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_name() {
        let db = setup_db().await;
        let repo = FileRepository::new(db.pool());

        let result = repo.create(&NewFile::folder("a/b", "user-1")).await;
        assert!(matches!(result, Err(VaultError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_in_folder() {
        let db = setup_db().await;
        let repo = FileRepository::new(db.pool());

        let folder = repo.create_folder("Docs", None, "user-1").await.unwrap();
        assert!(folder.is_folder);

        let file = repo
            .create(&NewFile::file("a.txt", "user-1/a.txt", "user-1").with_parent(folder.id))
            .await
            .unwrap();
        assert_eq!(file.parent_id, Some(folder.id));
    }

    #[tokio::test]
    async fn test_create_parent_must_be_folder() {
        let db = setup_db().await;
        let repo = FileRepository::new(db.pool());

        let file = repo
            .create(&NewFile::file("a.txt", "user-1/a.txt", "user-1"))
            .await
            .unwrap();
        let result = repo
            .create(&NewFile::file("b.txt", "user-1/b.txt", "user-1").with_parent(file.id))
            .await;
        assert!(matches!(result, Err(VaultError::Validation(_))));

        let result = repo.create_folder("Sub", Some(9999), "user-1").await;
        assert!(matches!(result, Err(VaultError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_create_duplicate_name_conflicts() {
        let db = setup_db().await;
        let repo = FileRepository::new(db.pool());

        repo.create_folder("Docs", None, "user-1").await.unwrap();
        let result = repo.create_folder("Docs", None, "user-1").await;
        assert!(matches!(result, Err(VaultError::Conflict(_))));

        // Another owner may use the same name.
        assert!(repo.create_folder("Docs", None, "user-2").await.is_ok());
    }

    #[tokio::test]
    async fn test_list_by_parent_folders_first() {
        let db = setup_db().await;
        let repo = FileRepository::new(db.pool());

        repo.create(&NewFile::file("b.txt", "u/b.txt", "u"))
            .await
            .unwrap();
        repo.create(&NewFile::file("a.txt", "u/a.txt", "u"))
            .await
            .unwrap();
        let folder = repo.create_folder("Zeta", None, "u").await.unwrap();
        repo.create(&NewFile::file("inner.txt", "u/inner.txt", "u").with_parent(folder.id))
            .await
            .unwrap();

        let root = repo.list_by_parent(None).await.unwrap();
        let names: Vec<&str> = root.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Zeta", "a.txt", "b.txt"]);

        let inner = repo.list_by_parent(Some(folder.id)).await.unwrap();
        assert_eq!(inner.len(), 1);
        assert_eq!(inner[0].name, "inner.txt");
    }

    #[tokio::test]
    async fn test_rename() {
        let db = setup_db().await;
        let repo = FileRepository::new(db.pool());

        let file = repo
            .create(&NewFile::file("old.txt", "u/old.txt", "u"))
            .await
            .unwrap();
        let renamed = repo.rename(file.id, "  new.txt ").await.unwrap();
        assert_eq!(renamed.name, "new.txt");
        assert_eq!(renamed.storage_path.as_deref(), Some("u/old.txt"));
    }

    #[tokio::test]
    async fn test_rename_validation_and_conflict() {
        let db = setup_db().await;
        let repo = FileRepository::new(db.pool());

        let a = repo
            .create(&NewFile::file("a.txt", "u/a.txt", "u"))
            .await
            .unwrap();
        repo.create(&NewFile::file("b.txt", "u/b.txt", "u"))
            .await
            .unwrap();

        assert!(matches!(
            repo.rename(a.id, "").await,
            Err(VaultError::Validation(_))
        ));
        assert!(matches!(
            repo.rename(a.id, "b.txt").await,
            Err(VaultError::Conflict(_))
        ));
        // Renaming to its own name is a no-op.
        assert_eq!(repo.rename(a.id, "a.txt").await.unwrap().name, "a.txt");
        assert!(matches!(
            repo.rename(9999, "c.txt").await,
            Err(VaultError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_folder_cascades() {
        let db = setup_db().await;
        let repo = FileRepository::new(db.pool());

        let folder = repo.create_folder("Docs", None, "u").await.unwrap();
        let child = repo
            .create(&NewFile::file("a.txt", "u/a.txt", "u").with_parent(folder.id))
            .await
            .unwrap();

        assert!(repo.delete(folder.id).await.unwrap());
        assert!(repo.get_by_id(child.id).await.unwrap().is_none());
        assert!(!repo.delete(folder.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_threat_recorder_marks_file() {
        let db = setup_db().await;
        let repo = FileRepository::new(db.pool());
        let file = repo
            .create(&NewFile::file("evil.exe", "u/evil.exe", "u"))
            .await
            .unwrap();

        let recorder = FileThreatRecorder::new(db.pool().clone());
        let raw = json!({"status": "completed", "stats": {"malicious": 3}});
        recorder
            .record_threat(&file.id.to_string(), &raw)
            .await
            .unwrap();

        let updated = repo.get_by_id(file.id).await.unwrap().unwrap();
        assert!(updated.is_malware);
        let stored: serde_json::Value =
            serde_json::from_str(updated.scan_result.as_deref().unwrap()).unwrap();
        assert_eq!(stored["stats"]["malicious"], 3);
    }

    #[tokio::test]
    async fn test_threat_recorder_unknown_file() {
        let db = setup_db().await;
        let recorder = FileThreatRecorder::new(db.pool().clone());

        assert!(recorder.record_threat("42", &json!({})).await.is_err());
        assert!(recorder.record_threat("not-a-number", &json!({})).await.is_err());
    }

    #[test]
    fn test_effective_content_type_falls_back_to_extension() {
        let mut record = FileRecord {
            id: 1,
            name: "photo.png".to_string(),
            parent_id: None,
            is_folder: false,
            storage_path: Some("u/photo.png".to_string()),
            content_type: None,
            size: 0,
            owner_id: "u".to_string(),
            is_malware: false,
            scan_result: None,
            created_at: String::new(),
            updated_at: String::new(),
        };
        assert_eq!(record.effective_content_type().as_deref(), Some("image/png"));

        record.content_type = Some("text/plain".to_string());
        assert_eq!(record.effective_content_type().as_deref(), Some("text/plain"));
        assert!(record.is_previewable());

        record.content_type = Some("application/zip".to_string());
        assert!(!record.is_previewable());

        record.content_type = None;
        record.is_folder = true;
        assert!(!record.is_previewable());
    }
}
