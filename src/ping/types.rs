//! Keep-alive ping types
//!
//! The ping record, response classification, and error taxonomy.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Client protocol version the server expects in every ping.
pub const CLIENT_VERSION: &str = "2.4.0";

/// Liveness report tying an account uid to a stable browser identity.
///
/// Built fresh on every tick, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct PingRecord {
    pub id: String,
    pub browser_id: String,
    pub timestamp: u64,
    pub version: &'static str,
}

impl PingRecord {
    pub fn new(uid: &str, browser_id: &str) -> Self {
        Self {
            id: uid.to_string(),
            browser_id: browser_id.to_string(),
            timestamp: unix_timestamp(),
            version: CLIENT_VERSION,
        }
    }
}

/// Current Unix time in seconds
fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Raw ping endpoint response
#[derive(Debug, Deserialize)]
pub struct PingResponse {
    pub code: Option<i64>,
    pub data: Option<PingData>,
    pub message: Option<String>,
}

/// Server-side diagnostics attached to an accepted ping
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PingData {
    /// Optional reputation score of the reporting IP
    pub ip_score: Option<f64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Result of an accepted ping
#[derive(Debug, Clone)]
pub struct PingOutcome {
    pub ip_score: Option<f64>,
    /// Full response payload, kept for operator visibility
    pub payload: Value,
}

/// Ping error types
#[derive(Debug, thiserror::Error)]
pub enum PingError {
    #[error("ping invoked without an account uid")]
    MissingIdentifier,

    #[error("ping rejected by server (code {}): {}", .code.map_or_else(|| "unknown".to_string(), |c| c.to_string()), .message)]
    Rejected { code: Option<i64>, message: String },

    #[error("ping failed (HTTP {}): {}", .status.map_or_else(|| "unknown".to_string(), |s| s.to_string()), .message)]
    Transport { status: Option<u16>, message: String },
}

/// Classify a 2xx ping response body.
///
/// The server signals acceptance with a numeric `code` of 0; any other value,
/// its absence, or an unparseable body counts as a rejection.
pub fn classify_ping_body(body: &str) -> Result<PingOutcome, PingError> {
    let payload: Value = serde_json::from_str(body).map_err(|_| PingError::Rejected {
        code: None,
        message: "unparseable response body".to_string(),
    })?;

    let response: PingResponse =
        serde_json::from_value(payload.clone()).map_err(|_| PingError::Rejected {
            code: None,
            message: "unexpected response shape".to_string(),
        })?;

    match response.code {
        Some(0) => Ok(PingOutcome {
            ip_score: response.data.and_then(|d| d.ip_score),
            payload,
        }),
        code => Err(PingError::Rejected {
            code,
            message: response.message.unwrap_or_else(|| "no message".to_string()),
        }),
    }
}
