//! Scan orchestration: submit, poll, classify, record.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::ScanConfig;
use crate::{Result, VaultError};

use super::client::ReputationClient;
use super::types::{ScanOutcome, ScanReport, ScanRequest};

/// Persists a threat verdict onto a file record.
#[async_trait]
pub trait ThreatRecorder: Send + Sync {
    /// Flag `file_id` as malware and store the provider attributes.
    async fn record_threat(&self, file_id: &str, result: &serde_json::Value) -> Result<()>;
}

/// Delay schedule for fetching analysis results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Wait before the first fetch.
    pub initial_delay: Duration,
    /// Upper bound for a single wait.
    pub max_delay: Duration,
    /// Number of fetches before giving up with "pending".
    pub max_attempts: u32,
}

impl PollPolicy {
    /// Wait before fetch number `attempt` (0-based): doubles each time, capped.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.initial_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(5),
            max_delay: Duration::from_secs(20),
            max_attempts: 4,
        }
    }
}

impl From<&ScanConfig> for PollPolicy {
    fn from(config: &ScanConfig) -> Self {
        Self {
            initial_delay: Duration::from_millis(config.initial_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms.max(config.initial_delay_ms)),
            max_attempts: config.max_attempts.max(1),
        }
    }
}

/// Validate the submitted file URL.
fn validate_file_url(file_url: Option<&str>) -> Result<String> {
    let raw = file_url
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| VaultError::BadRequest("fileUrl is required".to_string()))?;

    let parsed = url::Url::parse(raw)
        .map_err(|e| VaultError::BadRequest(format!("invalid fileUrl: {}", e)))?;

    match parsed.scheme() {
        "http" | "https" => Ok(raw.to_string()),
        scheme => Err(VaultError::BadRequest(format!(
            "unsupported fileUrl scheme: {}",
            scheme
        ))),
    }
}

/// Runs remote scans and records threats.
pub struct ScanService {
    client: Arc<dyn ReputationClient>,
    recorder: Arc<dyn ThreatRecorder>,
    policy: PollPolicy,
}

impl ScanService {
    /// Create a scan service.
    pub fn new(
        client: Arc<dyn ReputationClient>,
        recorder: Arc<dyn ThreatRecorder>,
        policy: PollPolicy,
    ) -> Self {
        Self {
            client,
            recorder,
            policy,
        }
    }

    /// Polling policy in use.
    pub fn policy(&self) -> PollPolicy {
        self.policy
    }

    /// Scan a file URL.
    ///
    /// Missing input is `BadRequest`; submission and retrieval failures are
    /// `Scan` errors and abort the invocation. Recording a threat is best
    /// effort: failures are logged, not returned.
    pub async fn scan(&self, request: ScanRequest) -> Result<ScanOutcome> {
        let file_url = validate_file_url(request.file_url.as_deref())?;
        let file_id = request
            .file_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());

        let analysis_id = self.client.submit_url(&file_url).await.map_err(|e| {
            tracing::error!(error = %e, "Scan submission failed");
            e
        })?;
        tracing::info!(analysis_id = %analysis_id, file_id = ?file_id, "Scan submitted");

        for attempt in 0..self.policy.max_attempts {
            tokio::time::sleep(self.policy.delay_for(attempt)).await;

            let analysis = self.client.fetch_analysis(&analysis_id).await.map_err(|e| {
                tracing::error!(analysis_id = %analysis_id, error = %e, "Scan result retrieval failed");
                e
            })?;

            if !analysis.status.is_completed() {
                tracing::debug!(
                    analysis_id = %analysis_id,
                    attempt = attempt + 1,
                    status = ?analysis.status,
                    "Analysis not finished yet"
                );
                continue;
            }

            let is_threat = analysis.stats.is_threat();
            tracing::info!(
                analysis_id = %analysis_id,
                malicious = analysis.stats.malicious,
                suspicious = analysis.stats.suspicious,
                is_threat,
                "Scan completed"
            );

            if is_threat {
                if let Some(file_id) = file_id {
                    if let Err(e) = self
                        .recorder
                        .record_threat(file_id, &analysis.attributes)
                        .await
                    {
                        tracing::warn!(file_id, error = %e, "Failed to record threat on file");
                    }
                }
            }

            return Ok(ScanOutcome::Completed(ScanReport {
                analysis_id,
                result: analysis.body,
                is_threat,
                stats: analysis.stats,
            }));
        }

        tracing::warn!(
            analysis_id = %analysis_id,
            attempts = self.policy.max_attempts,
            "Analysis still pending after last attempt"
        );
        Ok(ScanOutcome::Pending { analysis_id })
    }
}
