//! URL signing against the hosted storage backend.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::config::StorageConfig;
use crate::{Result, VaultError};

/// User agent string for storage requests.
const USER_AGENT: &str = "filevault/0.1 (storage signer)";

/// Issues time-limited access URLs for stored objects.
#[async_trait]
pub trait UrlSigner: Send + Sync {
    /// Sign the object at `path` and return an absolute URL.
    async fn sign(&self, path: &str) -> Result<String>;
}

#[derive(Debug, Deserialize)]
struct SignResponse {
    #[serde(rename = "signedURL", alias = "signedUrl")]
    signed_url: String,
}

/// Signer calling the storage API's `object/sign` endpoint.
#[derive(Debug, Clone)]
pub struct StorageSigner {
    client: Client,
    base_url: String,
    bucket: String,
    service_key: String,
    expires_in_secs: u64,
}

impl StorageSigner {
    /// Create a signer from the storage configuration.
    pub fn new(config: &StorageConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| VaultError::Storage(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            bucket: config.bucket.clone(),
            service_key: config.service_key.clone(),
            expires_in_secs: config.signed_url_expiry_secs,
        })
    }

    fn sign_endpoint(&self, path: &str) -> String {
        let encoded: Vec<String> = path
            .trim_start_matches('/')
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect();
        format!(
            "{}/storage/v1/object/sign/{}/{}",
            self.base_url,
            urlencoding::encode(&self.bucket),
            encoded.join("/")
        )
    }

    /// The API answers with a URL relative to `/storage/v1`.
    fn absolute_url(&self, signed: &str) -> String {
        if signed.starts_with("http://") || signed.starts_with("https://") {
            signed.to_string()
        } else {
            format!(
                "{}/storage/v1/{}",
                self.base_url,
                signed.trim_start_matches('/')
            )
        }
    }
}

#[async_trait]
impl UrlSigner for StorageSigner {
    async fn sign(&self, path: &str) -> Result<String> {
        let response = self
            .client
            .post(self.sign_endpoint(path))
            .bearer_auth(&self.service_key)
            .header("apikey", &self.service_key)
            .json(&json!({ "expiresIn": self.expires_in_secs }))
            .send()
            .await
            .map_err(|e| VaultError::Storage(format!("signing request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(path, %status, "Storage backend refused to sign URL");
            return Err(VaultError::Storage(format!("HTTP error: {}", status)));
        }

        let body: SignResponse = response
            .json()
            .await
            .map_err(|e| VaultError::Storage(format!("invalid signing response: {}", e)))?;

        Ok(self.absolute_url(&body.signed_url))
    }
}
