//! Keep-alive ping sender
//!
//! Sends one liveness report per call. The fixed-interval timer in the worker
//! is the retry mechanism; this sender never retries on its own.

use reqwest::{header, Client};

use super::types::*;
use crate::auth::AccountSession;
use crate::server_message;

/// Sender for the ping endpoint.
///
/// Shares the owning worker's transport so pings reuse the session cookies
/// and proxy routing established during the session exchange.
pub struct PingSender {
    client: Client,
    ping_url: String,
}

impl PingSender {
    /// Create a new ping sender on top of an existing transport
    pub fn new(client: Client, ping_url: impl Into<String>) -> Self {
        Self {
            client,
            ping_url: ping_url.into(),
        }
    }

    /// Send a single liveness report for the given session.
    ///
    /// Fails fast with [`PingError::MissingIdentifier`] when the session has
    /// no uid; that is a contract violation, not a transient failure.
    pub async fn send(
        &self,
        session: &AccountSession,
        token: &str,
        browser_id: &str,
    ) -> Result<PingOutcome, PingError> {
        if session.uid.is_empty() {
            return Err(PingError::MissingIdentifier);
        }

        let record = PingRecord::new(&session.uid, browser_id);

        let response = self
            .client
            .post(&self.ping_url)
            .bearer_auth(token)
            .header(header::ACCEPT, "application/json")
            .json(&record)
            .send()
            .await
            .map_err(|e| PingError::Transport {
                status: e.status().map(|s| s.as_u16()),
                message: e.to_string(),
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| PingError::Transport {
            status: Some(status.as_u16()),
            message: e.to_string(),
        })?;

        if !status.is_success() {
            return Err(PingError::Transport {
                status: Some(status.as_u16()),
                message: server_message(&body).unwrap_or_else(|| status.to_string()),
            });
        }

        classify_ping_body(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_with_uid(uid: &str) -> AccountSession {
        serde_json::from_value(serde_json::json!({ "uid": uid, "name": "t" })).unwrap()
    }

    #[tokio::test]
    async fn test_empty_uid_fails_before_any_network_io() {
        let sender = PingSender::new(Client::new(), "http://127.0.0.1:1/ping");
        let session = session_with_uid("");

        // The guard fires before the request is built, so the bogus endpoint
        // is never contacted.
        let err = sender.send(&session, "token", "browser").await.unwrap_err();
        assert!(matches!(err, PingError::MissingIdentifier));
    }
}
