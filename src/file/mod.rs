//! File management module for filevault.
//!
//! - File and folder records (the explorer tree)
//! - Name validation for create/rename
//! - Share links with optional password protection
//! - Threat flag persistence for the remote scan

mod record;
mod share;
mod validation;

pub use record::{FileRecord, FileRepository, FileThreatRecorder, NewFile};
pub use share::{NewShare, ShareLink, ShareRepository};
pub use validation::{validate_name, NameError};

/// Maximum length for a file or folder name (in characters).
pub const MAX_NAME_LENGTH: usize = 255;
