//! API handlers.

pub mod admin;
pub mod file;
pub mod scan;
pub mod share;

pub use admin::*;
pub use file::*;
pub use scan::*;
pub use share::*;

use std::sync::Arc;

use crate::db::Database;
use crate::preview::PreviewUrlCache;
use crate::scan::ScanService;

/// Shared state of the API handlers.
pub struct AppState {
    /// Database handle.
    pub db: Database,
    /// Signed preview URL cache.
    pub preview: Arc<PreviewUrlCache>,
    /// Remote malware scanner.
    pub scanner: Arc<ScanService>,
}

impl AppState {
    /// Create the handler state.
    pub fn new(db: Database, preview: Arc<PreviewUrlCache>, scanner: Arc<ScanService>) -> Self {
        Self {
            db,
            preview,
            scanner,
        }
    }
}
