//! Proxy connectivity checker
//!
//! Verifies a candidate proxy actually routes traffic by fetching the
//! configured IP-check endpoint through it before a worker commits to it.

use std::time::Duration;

use tracing::info;

use super::config::{ProxyConfig, ProxyError};

/// Checks that a proxy endpoint is reachable and routing
pub struct ProxyChecker {
    ip_check_url: String,
    timeout: Duration,
}

impl ProxyChecker {
    /// Create a new checker against the given IP-check endpoint
    pub fn new(ip_check_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            ip_check_url: ip_check_url.into(),
            timeout,
        }
    }

    /// Fetch the IP-check endpoint through the proxy.
    ///
    /// Returns the exit IP the endpoint reports. Any transport failure, error
    /// status, or missing `ip` field fails the check.
    pub async fn check(&self, proxy: &ProxyConfig) -> Result<String, ProxyError> {
        let failed = |message: String| ProxyError::CheckFailed {
            host: proxy.host.clone(),
            message,
        };

        let client = reqwest::Client::builder()
            .proxy(proxy.to_reqwest()?)
            .timeout(self.timeout)
            .build()
            .map_err(|e| failed(e.to_string()))?;

        let response = client
            .get(&self.ip_check_url)
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(failed(format!("HTTP {}", response.status())));
        }

        let data: serde_json::Value = response.json().await.map_err(|e| failed(e.to_string()))?;

        let ip = data
            .get("ip")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| failed("no ip in response".to_string()))?;

        info!(proxy = %proxy.url(), exit_ip = %ip, "proxy check passed");
        Ok(ip)
    }
}
