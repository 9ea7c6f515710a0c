//! Share links with optional password protection.

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, NaiveDateTime, Utc};
use rand_core::OsRng;
use serde::Serialize;
use uuid::Uuid;

use crate::db::DbPool;
use crate::{Result, VaultError};

/// Timestamp format SQLite's `datetime('now')` produces.
const SQLITE_DATETIME: &str = "%Y-%m-%d %H:%M:%S";

/// A share link for a file or folder.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ShareLink {
    /// Row ID.
    pub id: i64,
    /// Public token used in the share URL.
    pub token: String,
    /// Shared record.
    pub file_id: i64,
    /// Argon2 hash of the share password.
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    /// Expiry (UTC, SQLite datetime format); None never expires.
    pub expires_at: Option<String>,
    /// Creator (subject of the auth token).
    pub created_by: String,
    /// Creation timestamp.
    pub created_at: String,
}

impl ShareLink {
    /// Whether a password is required to open this link.
    pub fn is_protected(&self) -> bool {
        self.password_hash.is_some()
    }

    /// Whether the link has expired.
    pub fn is_expired(&self) -> bool {
        match self.expires_at.as_deref() {
            Some(at) => NaiveDateTime::parse_from_str(at, SQLITE_DATETIME)
                .map(|at| at.and_utc() <= Utc::now())
                .unwrap_or(true),
            None => false,
        }
    }
}

/// Data for creating a share link.
#[derive(Debug, Clone)]
pub struct NewShare {
    /// Shared record.
    pub file_id: i64,
    /// Optional plaintext password.
    pub password: Option<String>,
    /// Optional lifetime.
    pub expires_in: Option<Duration>,
    /// Creator.
    pub created_by: String,
}

impl NewShare {
    /// Create an unprotected, non-expiring share.
    pub fn new(file_id: i64, created_by: impl Into<String>) -> Self {
        Self {
            file_id,
            password: None,
            expires_in: None,
            created_by: created_by.into(),
        }
    }

    /// Protect the share with a password.
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Expire the share after the given duration.
    pub fn with_expiry(mut self, expires_in: Duration) -> Self {
        self.expires_in = Some(expires_in);
        self
    }
}

fn hash_share_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| VaultError::Validation(format!("password hashing failed: {}", e)))
}

fn verify_share_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Repository for share links.
pub struct ShareRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> ShareRepository<'a> {
    /// Create a new ShareRepository with the given pool reference.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Create a share link. Empty passwords are treated as no password.
    pub async fn create(&self, share: &NewShare) -> Result<ShareLink> {
        let password_hash = match share.password.as_deref() {
            Some(p) if !p.is_empty() => Some(hash_share_password(p)?),
            _ => None,
        };
        let expires_at = share
            .expires_in
            .map(|d| (Utc::now() + d).format(SQLITE_DATETIME).to_string());
        let token = Uuid::new_v4().simple().to_string();

        sqlx::query(
            "INSERT INTO shares (token, file_id, password_hash, expires_at, created_by)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&token)
        .bind(share.file_id)
        .bind(&password_hash)
        .bind(&expires_at)
        .bind(&share.created_by)
        .execute(self.pool)
        .await?;

        tracing::info!(file_id = share.file_id, protected = password_hash.is_some(), "Share link created");

        self.get_by_token(&token)
            .await?
            .ok_or_else(|| VaultError::NotFound("share".to_string()))
    }

    /// Get a share link by token (expired links included).
    pub async fn get_by_token(&self, token: &str) -> Result<Option<ShareLink>> {
        let share = sqlx::query_as::<_, ShareLink>(
            "SELECT id, token, file_id, password_hash, expires_at, created_by, created_at
             FROM shares WHERE token = ?",
        )
        .bind(token)
        .fetch_optional(self.pool)
        .await?;
        Ok(share)
    }

    /// List share links for a record, newest first.
    pub async fn list_by_file(&self, file_id: i64) -> Result<Vec<ShareLink>> {
        let shares = sqlx::query_as::<_, ShareLink>(
            "SELECT id, token, file_id, password_hash, expires_at, created_by, created_at
             FROM shares WHERE file_id = ? ORDER BY id DESC",
        )
        .bind(file_id)
        .fetch_all(self.pool)
        .await?;
        Ok(shares)
    }

    /// Delete a share link.
    pub async fn delete(&self, token: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM shares WHERE token = ?")
            .bind(token)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Resolve a share link for a visitor.
    ///
    /// Unknown and expired tokens are NotFound. A protected link without the
    /// right password is a Permission error.
    pub async fn verify(&self, token: &str, password: Option<&str>) -> Result<ShareLink> {
        let share = self
            .get_by_token(token)
            .await?
            .filter(|s| !s.is_expired())
            .ok_or_else(|| VaultError::NotFound("share".to_string()))?;

        if let Some(hash) = share.password_hash.as_deref() {
            let ok = password.is_some_and(|p| verify_share_password(p, hash));
            if !ok {
                tracing::debug!(share_id = share.id, "Share password rejected");
                return Err(VaultError::Permission("invalid share password".to_string()));
            }
        }

        Ok(share)
    }
}
