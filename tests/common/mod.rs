//! Shared helpers for Web API integration tests.
//!
//! Builds a router over an in-memory database with an in-process URL signer
//! and a scripted reputation service.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum_test::TestServer;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};

use filevault::file::{FileRecord, FileRepository, FileThreatRecorder, NewFile};
use filevault::preview::{PreviewUrlCache, UrlSigner};
use filevault::scan::{
    Analysis, AnalysisStatus, PollPolicy, ReputationClient, ScanService, ScanStats,
};
use filevault::web::handlers::AppState;
use filevault::web::middleware::{JwtState, RateLimitState};
use filevault::web::router::create_router;
use filevault::{Database, Result, VaultError};

/// Secret shared with the hosted auth system in tests.
pub const JWT_SECRET: &str = "test-secret-key-for-testing-only";

/// Create an access token like the hosted auth system issues.
pub fn access_token(sub: &str, role: &str) -> String {
    let claims = json!({
        "sub": sub,
        "aud": "authenticated",
        "email": format!("{}@example.test", sub),
        "role": role,
        "exp": chrono::Utc::now().timestamp() + 3600,
    });
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .unwrap()
}

/// Bearer header value for a regular user.
pub fn bearer(sub: &str) -> String {
    format!("Bearer {}", access_token(sub, "authenticated"))
}

/// Bearer header value for an admin.
pub fn admin_bearer(sub: &str) -> String {
    format!("Bearer {}", access_token(sub, "admin"))
}

/// Signer counting its calls; every call yields a distinct URL.
#[derive(Default)]
pub struct CountingSigner {
    calls: AtomicUsize,
    failing: std::sync::atomic::AtomicBool,
}

impl CountingSigner {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl UrlSigner for CountingSigner {
    async fn sign(&self, path: &str) -> Result<String> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.failing.load(Ordering::SeqCst) {
            return Err(VaultError::Storage("signing backend unavailable".to_string()));
        }
        Ok(format!("https://storage.test/signed/{}?token=t{}", path, n))
    }
}

/// Reputation service replaying a fixed script.
pub struct ScriptedClient {
    submit: std::result::Result<String, String>,
    analyses: Mutex<VecDeque<Analysis>>,
    submitted: Mutex<Vec<String>>,
}

impl ScriptedClient {
    /// Accept submissions and answer fetches with `analyses` in order.
    pub fn new(analyses: Vec<Analysis>) -> Self {
        Self {
            submit: Ok("analysis-1".to_string()),
            analyses: Mutex::new(analyses.into()),
            submitted: Mutex::new(Vec::new()),
        }
    }

    /// Reject every submission.
    pub fn failing_submit(message: &str) -> Self {
        Self {
            submit: Err(message.to_string()),
            analyses: Mutex::new(VecDeque::new()),
            submitted: Mutex::new(Vec::new()),
        }
    }

    /// URLs submitted so far.
    pub fn submitted(&self) -> Vec<String> {
        self.submitted.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReputationClient for ScriptedClient {
    async fn submit_url(&self, url: &str) -> Result<String> {
        self.submitted.lock().unwrap().push(url.to_string());
        self.submit
            .clone()
            .map_err(|e| VaultError::Scan(format!("analysis submission failed: {}", e)))
    }

    async fn fetch_analysis(&self, _analysis_id: &str) -> Result<Analysis> {
        self.analyses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| VaultError::Scan("result retrieval failed: 404".to_string()))
    }
}

/// A finished analysis with the given verdict counts.
pub fn completed(malicious: u64, suspicious: u64) -> Analysis {
    let stats = ScanStats {
        malicious,
        suspicious,
        harmless: 60,
        undetected: 10,
        timeout: 0,
    };
    let attributes = json!({
        "status": "completed",
        "stats": {
            "malicious": malicious,
            "suspicious": suspicious,
            "harmless": 60,
            "undetected": 10,
            "timeout": 0
        }
    });
    Analysis {
        status: AnalysisStatus::Completed,
        stats,
        body: json!({"data": {"id": "analysis-1", "type": "analysis", "attributes": attributes.clone()}}),
        attributes,
    }
}

/// An analysis still in the queue.
pub fn queued() -> Analysis {
    let attributes = json!({"status": "queued", "stats": {}});
    Analysis {
        status: AnalysisStatus::Queued,
        stats: ScanStats::default(),
        body: json!({"data": {"id": "analysis-1", "attributes": attributes.clone()}}),
        attributes,
    }
}

/// Poll schedule short enough for tests.
pub fn fast_policy(max_attempts: u32) -> PollPolicy {
    PollPolicy {
        initial_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(4),
        max_attempts,
    }
}

/// A running test application.
pub struct TestApp {
    pub server: TestServer,
    pub db: Database,
    pub signer: Arc<CountingSigner>,
    pub preview: Arc<PreviewUrlCache>,
}

/// Builder for [`TestApp`].
pub struct TestAppBuilder {
    client: Arc<dyn ReputationClient>,
    policy: PollPolicy,
    scan_rate_limit: u32,
    trust_proxy_headers: bool,
    cors_origins: Vec<String>,
}

impl TestAppBuilder {
    pub fn new() -> Self {
        Self {
            client: Arc::new(ScriptedClient::new(vec![completed(0, 0)])),
            policy: fast_policy(3),
            scan_rate_limit: 1000,
            trust_proxy_headers: false,
            cors_origins: vec![],
        }
    }

    pub fn client(mut self, client: Arc<dyn ReputationClient>) -> Self {
        self.client = client;
        self
    }

    pub fn policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn scan_rate_limit(mut self, per_minute: u32) -> Self {
        self.scan_rate_limit = per_minute;
        self
    }

    pub fn trust_proxy_headers(mut self, trust: bool) -> Self {
        self.trust_proxy_headers = trust;
        self
    }

    pub fn cors_origins(mut self, origins: &[&str]) -> Self {
        self.cors_origins = origins.iter().map(|o| o.to_string()).collect();
        self
    }

    pub async fn build(self) -> TestApp {
        let db = Database::open_in_memory()
            .await
            .expect("Failed to create test database");

        let signer = Arc::new(CountingSigner::default());
        let preview = Arc::new(PreviewUrlCache::new(
            signer.clone(),
            Duration::from_secs(1800),
        ));
        let scanner = Arc::new(ScanService::new(
            self.client,
            Arc::new(FileThreatRecorder::new(db.pool().clone())),
            self.policy,
        ));

        let app_state = Arc::new(AppState::new(db.clone(), preview.clone(), scanner));
        let jwt_state = Arc::new(JwtState::new(JWT_SECRET));
        let rate_limit_state = Arc::new(
            RateLimitState::new(self.scan_rate_limit)
                .with_trust_proxy_headers(self.trust_proxy_headers),
        );

        let router = create_router(app_state, jwt_state, rate_limit_state, &self.cors_origins);
        let server = TestServer::new(router).expect("Failed to create test server");

        TestApp {
            server,
            db,
            signer,
            preview,
        }
    }
}

impl Default for TestAppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Create a test application with default collaborators.
pub async fn create_test_app() -> TestApp {
    TestAppBuilder::new().build().await
}

/// Insert a file record directly.
pub async fn insert_file(
    db: &Database,
    owner: &str,
    name: &str,
    content_type: Option<&str>,
) -> FileRecord {
    let mut new_file = NewFile::file(name, format!("{}/{}", owner, name), owner).with_size(1024);
    if let Some(ct) = content_type {
        new_file = new_file.with_content_type(ct);
    }
    FileRepository::new(db.pool())
        .create(&new_file)
        .await
        .expect("Failed to create file record")
}

/// `data` member of a wrapped response.
pub fn data(body: &Value) -> &Value {
    &body["data"]
}
