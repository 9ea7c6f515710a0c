//! Web server for filevault.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;

use crate::config::{Config, ServerConfig};
use crate::file::FileThreatRecorder;
use crate::preview::{PreviewUrlCache, StorageSigner};
use crate::scan::{PollPolicy, ScanService, VirusTotalClient};
use crate::{Database, Result, VaultError};

use super::handlers::AppState;
use super::middleware::{JwtState, RateLimitState};
use super::router::{create_health_router, create_router};

/// Web server for the API.
pub struct WebServer {
    /// Server address.
    addr: SocketAddr,
    /// Application state.
    app_state: Arc<AppState>,
    /// JWT state.
    jwt_state: Arc<JwtState>,
    /// Scan rate limiter.
    rate_limit_state: Arc<RateLimitState>,
    /// Server configuration.
    server_config: ServerConfig,
}

impl WebServer {
    /// Create a web server around prepared handler state.
    pub fn new(config: &Config, app_state: AppState) -> Result<Self> {
        let addr = format!("{}:{}", config.server.host, config.server.port)
            .parse()
            .map_err(|e| VaultError::Config(format!("invalid server address: {e}")))?;

        Ok(Self {
            addr,
            app_state: Arc::new(app_state),
            jwt_state: Arc::new(JwtState::new(&config.auth.jwt_secret)),
            rate_limit_state: Arc::new(
                RateLimitState::new(config.server.scan_rate_limit)
                    .with_trust_proxy_headers(config.server.trust_proxy_headers),
            ),
            server_config: config.server.clone(),
        })
    }

    /// Create a web server wired to the configured database, storage
    /// backend and reputation service.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let db = Database::open(&config.database.path).await?;

        let signer = Arc::new(StorageSigner::new(&config.storage)?);
        let preview = Arc::new(PreviewUrlCache::new(signer, config.preview.ttl()));
        tracing::info!(
            ttl_secs = config.preview.ttl_secs,
            "Preview URL cache initialized"
        );

        let client = Arc::new(VirusTotalClient::new(&config.scan)?);
        let recorder = Arc::new(FileThreatRecorder::new(db.pool().clone()));
        let scanner = Arc::new(ScanService::new(
            client,
            recorder,
            PollPolicy::from(&config.scan),
        ));

        Self::new(config, AppState::new(db, preview, scanner))
    }

    /// Get the server address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    fn into_router(self) -> Router {
        Arc::clone(&self.rate_limit_state).start_cleanup_task();

        create_router(
            self.app_state,
            self.jwt_state,
            self.rate_limit_state,
            &self.server_config.cors_origins,
        )
        .merge(create_health_router())
    }

    /// Run the web server.
    pub async fn run(self) -> std::result::Result<(), std::io::Error> {
        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;
        let router = self.into_router();

        tracing::info!("Web server listening on http://{}", local_addr);

        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
    }

    /// Run the server in the background and return the bound address.
    ///
    /// Binding to port 0 picks a free port.
    pub async fn run_with_addr(self) -> std::result::Result<SocketAddr, std::io::Error> {
        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;
        let router = self.into_router();

        tracing::info!("Web server listening on http://{}", local_addr);

        tokio::spawn(async move {
            if let Err(e) = axum::serve(
                listener,
                router.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            {
                tracing::error!("Web server error: {}", e);
            }
        });

        Ok(local_addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_config() -> Config {
        let mut config = Config::default();
        config.server.host = "127.0.0.1".to_string();
        config.server.port = 0;
        config.auth.jwt_secret = "test-secret-key".to_string();
        config.storage.base_url = "http://127.0.0.1:9".to_string();
        config
    }

    async fn create_test_state(config: &Config) -> AppState {
        let db = Database::open_in_memory().await.unwrap();
        let signer = Arc::new(StorageSigner::new(&config.storage).unwrap());
        let preview = Arc::new(PreviewUrlCache::new(signer, config.preview.ttl()));
        let scanner = Arc::new(ScanService::new(
            Arc::new(VirusTotalClient::new(&config.scan).unwrap()),
            Arc::new(FileThreatRecorder::new(db.pool().clone())),
            PollPolicy::from(&config.scan),
        ));
        AppState::new(db, preview, scanner)
    }

    #[tokio::test]
    async fn test_web_server_new() {
        let config = create_test_config();
        let server = WebServer::new(&config, create_test_state(&config).await).unwrap();
        assert_eq!(server.addr().ip().to_string(), "127.0.0.1");
    }

    #[tokio::test]
    async fn test_web_server_invalid_address() {
        let mut config = create_test_config();
        config.server.host = "not an address".to_string();
        let state = create_test_state(&config).await;
        assert!(matches!(
            WebServer::new(&config, state),
            Err(VaultError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_web_server_run() {
        let config = create_test_config();
        let server = WebServer::new(&config, create_test_state(&config).await).unwrap();
        let addr = server.run_with_addr().await.unwrap();

        let resp = reqwest::get(format!("http://{}/health", addr)).await.unwrap();
        assert!(resp.status().is_success());
        assert_eq!(resp.text().await.unwrap(), "OK");
    }

    #[tokio::test]
    async fn test_from_config_creates_database() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = create_test_config();
        config.database.path = dir
            .path()
            .join("data/filevault.db")
            .to_string_lossy()
            .into_owned();

        let server = WebServer::from_config(&config).await.unwrap();
        assert_eq!(server.addr().port(), 0);
        assert!(dir.path().join("data/filevault.db").exists());
    }
}
