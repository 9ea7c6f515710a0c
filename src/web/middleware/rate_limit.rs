//! Per-client rate limiting for the scan endpoint.
//!
//! Each scan costs a call to a metered third-party API, so scans are
//! limited per client IP.

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::{
    collections::HashMap,
    net::SocketAddr,
    num::NonZeroU32,
    sync::{Arc, RwLock},
    time::Duration,
};

use crate::web::error::ApiError;

/// Rate limiter for a single client.
pub type ClientRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Per-IP limiter registry.
pub struct RateLimitState {
    limiters: RwLock<HashMap<String, Arc<ClientRateLimiter>>>,
    requests_per_minute: u32,
    trust_proxy_headers: bool,
}

impl RateLimitState {
    /// Create a registry allowing `requests_per_minute` per client.
    ///
    /// Clients are keyed on the peer address until
    /// [`with_trust_proxy_headers`](Self::with_trust_proxy_headers) is set.
    pub fn new(requests_per_minute: u32) -> Self {
        Self {
            limiters: RwLock::new(HashMap::new()),
            requests_per_minute,
            trust_proxy_headers: false,
        }
    }

    /// Key clients on `X-Forwarded-For` / `X-Real-IP` when present.
    pub fn with_trust_proxy_headers(mut self, trust: bool) -> Self {
        self.trust_proxy_headers = trust;
        self
    }

    fn limiter_for(&self, ip: &str) -> Arc<ClientRateLimiter> {
        {
            let read_guard = self.limiters.read().unwrap_or_else(|e| e.into_inner());
            if let Some(limiter) = read_guard.get(ip) {
                return limiter.clone();
            }
        }

        let mut write_guard = self.limiters.write().unwrap_or_else(|e| e.into_inner());
        write_guard
            .entry(ip.to_string())
            .or_insert_with(|| {
                let per_minute =
                    NonZeroU32::new(self.requests_per_minute).unwrap_or(NonZeroU32::MIN);
                Arc::new(RateLimiter::direct(Quota::per_minute(per_minute)))
            })
            .clone()
    }

    /// Check whether a request from `ip` is allowed.
    pub fn check(&self, ip: &str) -> bool {
        self.limiter_for(ip).check().is_ok()
    }

    /// Drop limiters nobody is holding.
    pub fn cleanup(&self) {
        self.limiters
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .retain(|_, v| Arc::strong_count(v) > 1);
    }

    /// Periodically clean up the registry.
    pub fn start_cleanup_task(self: Arc<Self>) {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(300));
            interval.tick().await;
            loop {
                interval.tick().await;
                self.cleanup();
            }
        });
    }
}

/// Extract the client IP.
///
/// Forwarding headers are client-controlled, so they are read only when
/// `trust_proxy_headers` is set. Otherwise the peer address is used.
fn client_ip(req: &Request<Body>, trust_proxy_headers: bool) -> String {
    let header = |name: &str| {
        if !trust_proxy_headers {
            return None;
        }
        req.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(',').next().unwrap_or_default().trim().to_string())
            .filter(|v| !v.is_empty())
    };

    header("X-Forwarded-For")
        .or_else(|| header("X-Real-IP"))
        .or_else(|| {
            req.extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        })
        .unwrap_or_else(|| "unknown".to_string())
}

/// Middleware rejecting clients over their scan quota with 429.
pub async fn scan_rate_limit(
    state: Arc<RateLimitState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let ip = client_ip(&req, state.trust_proxy_headers);

    if !state.check(&ip) {
        tracing::warn!(ip = %ip, "Scan rate limit exceeded");
        return ApiError::too_many_requests("Too many scan requests. Please try again later.")
            .into_response();
    }

    next.run(req).await
}
