//! Web API module for filevault.
//!
//! REST endpoints for file records, share links, signed previews and
//! remote malware scans.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use handlers::AppState;
pub use router::{create_health_router, create_router};
pub use server::WebServer;
