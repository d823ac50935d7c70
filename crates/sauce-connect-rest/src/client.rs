//! REST client for the Sauce Labs tunnel endpoints

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Production REST endpoint
pub const DEFAULT_BASE_URL: &str = "https://saucelabs.com";

/// Upper bound for a single REST call. Shutdown latency of an in-flight
/// listing is bounded by this value.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// REST client errors
#[derive(Debug, Error)]
pub enum RestError {
    #[error("Sauce Labs endpoint unavailable: {0}")]
    RemoteUnavailable(String),

    #[error("Malformed response from Sauce Labs: {0}")]
    MalformedResponse(String),
}

/// Identifier of a live tunnel as reported by the REST API.
///
/// Opaque token; only equality is meaningful.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TunnelId(String);

impl TunnelId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TunnelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TunnelId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Client for the Sauce Labs REST v1 tunnel endpoints
pub struct SauceRestClient {
    http: reqwest::Client,
    base_url: String,
    account_id: String,
    access_key: String,
}

impl SauceRestClient {
    /// Create a client for the given account credentials against the
    /// production endpoint.
    pub fn new(account_id: impl Into<String>, access_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            account_id: account_id.into(),
            access_key: access_key.into(),
        }
    }

    /// Override the endpoint base URL (e.g. for a local test server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    fn tunnels_url(&self) -> String {
        format!("{}/rest/v1/{}/tunnels", self.base_url, self.account_id)
    }

    fn tunnel_url(&self, tunnel: &TunnelId) -> String {
        format!("{}/{}", self.tunnels_url(), tunnel)
    }

    /// List the ids of all tunnels currently live for the account.
    ///
    /// Returns a point-in-time snapshot in the order the API reported the
    /// ids; it is stale as soon as it is returned.
    pub async fn list_tunnels(&self) -> Result<Vec<TunnelId>, RestError> {
        let url = self.tunnels_url();
        debug!(%url, "listing tunnels");

        let response = self
            .http
            .get(&url)
            .basic_auth(&self.account_id, Some(&self.access_key))
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|err| RestError::RemoteUnavailable(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RestError::RemoteUnavailable(format!(
                "tunnel listing returned status {}",
                status
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|err| RestError::RemoteUnavailable(err.to_string()))?;

        let tunnels: Vec<TunnelId> = serde_json::from_str(&body)
            .map_err(|err| RestError::MalformedResponse(err.to_string()))?;

        debug!(count = tunnels.len(), "tunnel listing succeeded");
        Ok(tunnels)
    }

    /// Delete a tunnel.
    ///
    /// The response body is read and discarded; only the status matters.
    pub async fn delete_tunnel(&self, tunnel: &TunnelId) -> Result<(), RestError> {
        let url = self.tunnel_url(tunnel);
        debug!(%url, "deleting tunnel");

        let response = self
            .http
            .delete(&url)
            .basic_auth(&self.account_id, Some(&self.access_key))
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|err| RestError::RemoteUnavailable(err.to_string()))?;

        let status = response.status();
        let _ = response.text().await;

        if !status.is_success() {
            return Err(RestError::RemoteUnavailable(format!(
                "tunnel deletion returned status {}",
                status
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tunnels_url() {
        let client = SauceRestClient::new("acct", "key");
        assert_eq!(
            client.tunnels_url(),
            "https://saucelabs.com/rest/v1/acct/tunnels"
        );
    }

    #[test]
    fn test_tunnel_url_with_base_override() {
        let client = SauceRestClient::new("acct", "key").with_base_url("http://127.0.0.1:8080/");
        assert_eq!(
            client.tunnel_url(&TunnelId::from("t-1")),
            "http://127.0.0.1:8080/rest/v1/acct/tunnels/t-1"
        );
    }

    #[test]
    fn test_tunnel_id_equality_and_display() {
        let a = TunnelId::from("abc");
        let b = TunnelId::new("abc".to_string());
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "abc");
        assert_eq!(a.as_str(), "abc");
    }

    #[test]
    fn test_tunnel_id_deserializes_from_json_string() {
        let ids: Vec<TunnelId> = serde_json::from_str(r#"["a","b"]"#).unwrap();
        assert_eq!(ids, vec![TunnelId::from("a"), TunnelId::from("b")]);
    }
}
