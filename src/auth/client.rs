//! Session exchange client
//!
//! Performs the single authenticated call that converts a bearer token into
//! an account identifier. Retry policy belongs to the caller; this client
//! never retries.

use reqwest::{header, Client};
use tracing::debug;

use super::types::*;
use crate::server_message;

/// Client for the session endpoint.
///
/// Holds a clone of the owning worker's transport, so the exchange shares the
/// worker's cookie jar, user agent, and proxy routing.
pub struct SessionClient {
    client: Client,
    session_url: String,
}

impl SessionClient {
    /// Create a new session client on top of an existing transport
    pub fn new(client: Client, session_url: impl Into<String>) -> Self {
        Self {
            client,
            session_url: session_url.into(),
        }
    }

    /// Exchange a bearer token for an account session.
    ///
    /// Sends an empty JSON body; the account is identified purely by the
    /// `Authorization` header. Any transport failure, non-2xx status,
    /// malformed body, or missing `data.uid` is a [`SessionError`].
    pub async fn get_session(&self, token: &str) -> Result<AccountSession, SessionError> {
        let response = self
            .client
            .post(&self.session_url)
            .bearer_auth(token)
            .header(header::ACCEPT, "application/json")
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(|e| SessionError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SessionError::Network(e.to_string()))?;

        debug!(%status, "session endpoint responded");

        if !status.is_success() {
            return Err(SessionError::Http {
                status: status.as_u16(),
                message: server_message(&body).unwrap_or_else(|| status.to_string()),
            });
        }

        let parsed: SessionResponse = serde_json::from_str(&body)
            .map_err(|e| SessionError::InvalidResponse(e.to_string()))?;

        parsed.into_session()
    }
}
