//! Database schema and migrations for filevault.
//!
//! Migrations run in order the first time a database is opened or upgraded.
//! The `schema_version` table records which ones have been applied.

/// Database migrations.
pub const MIGRATIONS: &[&str] = &[
    // v1: file and folder records
    r#"
CREATE TABLE files (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    name          TEXT NOT NULL,
    parent_id     INTEGER REFERENCES files(id) ON DELETE CASCADE,
    is_folder     INTEGER NOT NULL DEFAULT 0,
    storage_path  TEXT,                      -- object path in the storage bucket
    content_type  TEXT,
    size          INTEGER NOT NULL DEFAULT 0,
    owner_id      TEXT NOT NULL,             -- subject of the hosted auth token
    created_at    TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at    TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX idx_files_parent_id ON files(parent_id);
CREATE INDEX idx_files_owner_id ON files(owner_id);
"#,
    // v2: malware flag written by the remote scan
    r#"
ALTER TABLE files ADD COLUMN is_malware INTEGER NOT NULL DEFAULT 0;
ALTER TABLE files ADD COLUMN scan_result TEXT;  -- raw provider attributes (JSON)
"#,
    // v3: share links
    r#"
CREATE TABLE shares (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    token          TEXT NOT NULL UNIQUE,
    file_id        INTEGER NOT NULL REFERENCES files(id) ON DELETE CASCADE,
    password_hash  TEXT,                     -- Argon2 hash, NULL when unprotected
    expires_at     TEXT,
    created_by     TEXT NOT NULL,
    created_at     TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX idx_shares_file_id ON shares(file_id);
"#,
];
