//! Middleware for the Web API.

pub mod auth;
pub mod cors;
pub mod rate_limit;

pub use auth::{jwt_auth, AdminUser, AuthUser, JwtClaims, JwtState, ADMIN_ROLE};
pub use cors::{create_cors_layer, SHARE_PASSWORD_HEADER};
pub use rate_limit::{scan_rate_limit, RateLimitState};
