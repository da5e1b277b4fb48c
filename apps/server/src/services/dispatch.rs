//! Registry dispatch client.

use std::time::Duration;

use serde_json::Value as JsonValue;

use crate::config::RegistryConfig;

/// Wire content type for exchanged documents.
const FHIR_JSON: &str = "application/fhir+json";

/// What the registry answered to a delivered document.
#[derive(Debug, Clone)]
pub struct RegistryResponse {
    pub status: u16,
    pub body: JsonValue,
}

/// HTTP client for submitting transaction documents to the configured
/// external registry.
pub struct DispatchClient {
    client: reqwest::Client,
    base_url: String,
}

impl DispatchClient {
    pub fn new(config: &RegistryConfig) -> crate::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| crate::Error::Internal(format!("failed to build dispatch client: {e}")))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Submits one document to the registry.
    ///
    /// Timeouts, connection failures and non-success answers all surface as
    /// `Error::Transport`; only a 2xx answer counts as delivered.
    pub async fn submit(&self, document: &JsonValue) -> crate::Result<RegistryResponse> {
        let response = self
            .client
            .post(&self.base_url)
            .header(reqwest::header::CONTENT_TYPE, FHIR_JSON)
            .body(document.to_string())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    crate::Error::Transport(format!("registry timed out: {e}"))
                } else {
                    crate::Error::Transport(format!("registry unreachable: {e}"))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(crate::Error::Transport(format!("registry answered {status}")));
        }

        // Some registries answer 2xx with an empty or non-JSON body; that
        // still counts as delivered.
        let body = response.json::<JsonValue>().await.unwrap_or(JsonValue::Null);
        Ok(RegistryResponse {
            status: status.as_u16(),
            body,
        })
    }
}
