//! Verification of access tokens issued by the hosted auth service.

use axum::{
    async_trait,
    body::Body,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, Request},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::web::error::ApiError;

/// Role name granting access to admin endpoints.
pub const ADMIN_ROLE: &str = "admin";

fn default_role() -> String {
    "authenticated".to_string()
}

/// Claims of a hosted-auth access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject (user ID).
    pub sub: String,
    /// Email address, when the provider includes it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Role.
    #[serde(default = "default_role")]
    pub role: String,
    /// Expiration timestamp.
    pub exp: u64,
}

impl JwtClaims {
    /// Whether the caller may use admin endpoints.
    pub fn is_admin(&self) -> bool {
        self.role == ADMIN_ROLE
    }

    /// Whether the caller owns `owner_id` or is an admin.
    pub fn can_access(&self, owner_id: &str) -> bool {
        self.sub == owner_id || self.is_admin()
    }
}

/// Token verification settings.
#[derive(Clone)]
pub struct JwtState {
    /// Decoding key for JWT verification.
    pub decoding_key: DecodingKey,
    /// Validation settings.
    pub validation: Validation,
}

impl JwtState {
    /// Create a JWT state from the shared HS256 secret.
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::default();
        validation.validate_exp = true;
        // Hosted auth tokens carry `aud: "authenticated"`; the audience is not pinned.
        validation.validate_aud = false;

        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Decode and validate a token.
    pub fn verify(&self, token: &str) -> Result<JwtClaims, ApiError> {
        decode::<JwtClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!("JWT validation failed: {}", e);
                ApiError::unauthorized("Invalid or expired token")
            })
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Extractor for authenticated callers.
#[derive(Debug, Clone)]
pub struct AuthUser(pub JwtClaims);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token =
            bearer_token(parts).ok_or_else(|| ApiError::unauthorized("Missing authorization"))?;

        let jwt_state = parts
            .extensions
            .get::<Arc<JwtState>>()
            .ok_or_else(|| ApiError::internal("JWT state not configured"))?;

        jwt_state.verify(token).map(AuthUser)
    }
}

/// Extractor for callers with the admin role.
#[derive(Debug, Clone)]
pub struct AdminUser(pub JwtClaims);

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthUser(claims) = AuthUser::from_request_parts(parts, state).await?;
        if !claims.is_admin() {
            tracing::warn!(sub = %claims.sub, "Admin endpoint refused");
            return Err(ApiError::forbidden("Admin access required"));
        }
        Ok(AdminUser(claims))
    }
}

/// Middleware injecting the JWT state into request extensions.
pub async fn jwt_auth(jwt_state: Arc<JwtState>, mut request: Request<Body>, next: Next) -> Response {
    request.extensions_mut().insert(jwt_state);
    next.run(request).await
}
