//! Types exchanged with the reputation service.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Engine verdict counts for an analysis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanStats {
    /// Engines flagging the URL as malicious.
    #[serde(default)]
    pub malicious: u64,
    /// Engines flagging the URL as suspicious.
    #[serde(default)]
    pub suspicious: u64,
    /// Engines reporting the URL as harmless.
    #[serde(default)]
    pub harmless: u64,
    /// Engines with no opinion.
    #[serde(default)]
    pub undetected: u64,
    /// Engines that timed out.
    #[serde(default)]
    pub timeout: u64,
}

impl ScanStats {
    /// A URL is a threat if any engine calls it malicious or suspicious.
    pub fn is_threat(&self) -> bool {
        self.malicious > 0 || self.suspicious > 0
    }
}

/// Lifecycle state reported for an analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisStatus {
    /// Waiting for engines.
    Queued,
    /// Engines are running.
    InProgress,
    /// Verdicts are final.
    Completed,
    /// Any status this client does not know.
    Other(String),
}

impl AnalysisStatus {
    /// Parse the provider's status string.
    pub fn parse(s: &str) -> Self {
        match s {
            "queued" => AnalysisStatus::Queued,
            "in-progress" | "in_progress" => AnalysisStatus::InProgress,
            "completed" => AnalysisStatus::Completed,
            other => AnalysisStatus::Other(other.to_string()),
        }
    }

    /// Whether verdicts are final.
    pub fn is_completed(&self) -> bool {
        matches!(self, AnalysisStatus::Completed)
    }
}

/// One fetched analysis.
#[derive(Debug, Clone)]
pub struct Analysis {
    /// Analysis status.
    pub status: AnalysisStatus,
    /// Verdict counts.
    pub stats: ScanStats,
    /// Provider attributes (`data.attributes`), stored on flagged records.
    pub attributes: Value,
    /// Full response body.
    pub body: Value,
}

/// Input of a scan invocation.
#[derive(Debug, Clone, Default)]
pub struct ScanRequest {
    /// Publicly reachable URL of the file.
    pub file_url: Option<String>,
    /// Record to flag when a threat is found.
    pub file_id: Option<String>,
}

impl ScanRequest {
    /// A scan of `file_url` without a record to update.
    pub fn new(file_url: impl Into<String>) -> Self {
        Self {
            file_url: Some(file_url.into()),
            file_id: None,
        }
    }

    /// Attach the record to flag.
    pub fn with_file_id(mut self, file_id: impl Into<String>) -> Self {
        self.file_id = Some(file_id.into());
        self
    }
}

/// Final verdict of a completed scan.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanReport {
    /// Provider analysis ID.
    #[serde(rename = "id")]
    pub analysis_id: String,
    /// Full provider response.
    pub result: Value,
    /// Whether the file is considered dangerous.
    pub is_threat: bool,
    /// Verdict counts.
    pub stats: ScanStats,
}

/// What a scan invocation produced.
#[derive(Debug, Clone)]
pub enum ScanOutcome {
    /// The analysis finished within the polling budget.
    Completed(ScanReport),
    /// The analysis was still running after the last attempt.
    Pending {
        /// Provider analysis ID, usable to look the result up later.
        analysis_id: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_is_threat() {
        assert!(!ScanStats::default().is_threat());
        assert!(ScanStats {
            malicious: 1,
            ..Default::default()
        }
        .is_threat());
        assert!(ScanStats {
            suspicious: 2,
            ..Default::default()
        }
        .is_threat());
        assert!(!ScanStats {
            harmless: 70,
            undetected: 10,
            ..Default::default()
        }
        .is_threat());
    }

    #[test]
    fn test_stats_partial_json() {
        let stats: ScanStats = serde_json::from_value(json!({"malicious": 1})).unwrap();
        assert_eq!(stats.malicious, 1);
        assert_eq!(stats.harmless, 0);
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(AnalysisStatus::parse("queued"), AnalysisStatus::Queued);
        assert_eq!(AnalysisStatus::parse("in-progress"), AnalysisStatus::InProgress);
        assert!(AnalysisStatus::parse("completed").is_completed());
        assert_eq!(
            AnalysisStatus::parse("weird"),
            AnalysisStatus::Other("weird".to_string())
        );
    }

    #[test]
    fn test_report_serialization() {
        let report = ScanReport {
            analysis_id: "u-abc".to_string(),
            result: json!({"data": {}}),
            is_threat: true,
            stats: ScanStats {
                malicious: 1,
                ..Default::default()
            },
        };
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["id"], "u-abc");
        assert_eq!(value["isThreat"], true);
        assert_eq!(value["stats"]["malicious"], 1);
        assert!(value.get("analysisId").is_none());
    }
}
