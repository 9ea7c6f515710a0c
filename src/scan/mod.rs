//! Remote malware scanning.
//!
//! A publicly reachable file URL is submitted to a reputation service, the
//! analysis is polled with backoff, and a threat verdict is written back to
//! the file record when a file ID was supplied.

mod client;
mod service;
mod types;

pub use client::{ReputationClient, VirusTotalClient};
pub use service::{PollPolicy, ScanService, ThreatRecorder};
pub use types::{Analysis, AnalysisStatus, ScanOutcome, ScanReport, ScanRequest, ScanStats};
