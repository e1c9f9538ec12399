//! HTTP plumbing shared by the remote providers

use crate::mt::error::{MtResult, ProviderError};
use std::time::Duration;

/// Client-side timeout used when a provider is built without one
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = concat!("chunked-translator/", env!("CARGO_PKG_VERSION"));

/// Build the reqwest client every provider owns
pub fn build_client(timeout: Duration) -> MtResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| ProviderError::config(format!("Failed to create HTTP client: {}", e)))
}

/// Turn a response into JSON, mapping non-success statuses and bad bodies
pub async fn read_json(response: reqwest::Response) -> MtResult<serde_json::Value> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(ProviderError::from_status(status, &body));
    }

    response
        .json()
        .await
        .map_err(|e| ProviderError::parse(format!("Failed to parse response body: {}", e)))
}
