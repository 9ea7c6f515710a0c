//! Reputation service client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::config::ScanConfig;
use crate::{Result, VaultError};

use super::types::{Analysis, AnalysisStatus, ScanStats};

/// User agent string for reputation requests.
const USER_AGENT: &str = "filevault/0.1 (url scanner)";

/// A third-party URL reputation service.
#[async_trait]
pub trait ReputationClient: Send + Sync {
    /// Submit a URL for analysis and return the analysis ID.
    async fn submit_url(&self, url: &str) -> Result<String>;

    /// Fetch an analysis by ID.
    async fn fetch_analysis(&self, analysis_id: &str) -> Result<Analysis>;
}

/// Client for the VirusTotal v3 API.
#[derive(Debug, Clone)]
pub struct VirusTotalClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl VirusTotalClient {
    /// Create a client from the scan configuration.
    pub fn new(config: &ScanConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| VaultError::Scan(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }
}

/// Parse `GET /analyses/{id}` output.
fn parse_analysis(body: Value) -> Result<Analysis> {
    let attributes = body
        .pointer("/data/attributes")
        .cloned()
        .ok_or_else(|| VaultError::Scan("analysis response has no attributes".to_string()))?;

    let status = attributes
        .get("status")
        .and_then(Value::as_str)
        .map(AnalysisStatus::parse)
        .unwrap_or(AnalysisStatus::Other(String::new()));

    let stats = match attributes.get("stats") {
        Some(stats) => serde_json::from_value::<ScanStats>(stats.clone())
            .map_err(|e| VaultError::Scan(format!("invalid analysis stats: {}", e)))?,
        None => ScanStats::default(),
    };

    Ok(Analysis {
        status,
        stats,
        attributes,
        body,
    })
}

#[async_trait]
impl ReputationClient for VirusTotalClient {
    async fn submit_url(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .post(format!("{}/urls", self.base_url))
            .header("x-apikey", &self.api_key)
            .form(&[("url", url)])
            .send()
            .await
            .map_err(|e| VaultError::Scan(format!("analysis submission failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(VaultError::Scan(format!(
                "analysis submission failed: HTTP {}",
                status
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| VaultError::Scan(format!("analysis submission failed: {}", e)))?;

        body.pointer("/data/id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                VaultError::Scan("analysis submission failed: no analysis id".to_string())
            })
    }

    async fn fetch_analysis(&self, analysis_id: &str) -> Result<Analysis> {
        let response = self
            .client
            .get(format!(
                "{}/analyses/{}",
                self.base_url,
                urlencoding::encode(analysis_id)
            ))
            .header("x-apikey", &self.api_key)
            .send()
            .await
            .map_err(|e| VaultError::Scan(format!("result retrieval failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(VaultError::Scan(format!(
                "result retrieval failed: HTTP {}",
                status
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| VaultError::Scan(format!("result retrieval failed: {}", e)))?;

        parse_analysis(body)
    }
}
