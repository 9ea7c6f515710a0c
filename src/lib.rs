//! filevault - file manager backend
//!
//! Keeps file and folder records, hands out short-lived signed preview URLs
//! from the storage backend through a TTL cache, and scans files with a
//! remote reputation service.

pub mod config;
pub mod db;
pub mod error;
pub mod file;
pub mod logging;
pub mod preview;
pub mod scan;
pub mod web;

pub use config::Config;
pub use db::Database;
pub use error::{Result, VaultError};
pub use file::{FileRecord, FileRepository, NewFile, ShareRepository};
pub use preview::{is_previewable, PreviewUrlCache};
pub use scan::{ScanOutcome, ScanService};
pub use web::WebServer;
