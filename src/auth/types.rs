//! Session exchange types
//!
//! Models for the authentication response and its error taxonomy.

use serde::Deserialize;

/// Account identity returned by a successful session exchange.
///
/// Extra server-supplied fields are carried through opaquely so pings and
/// logging can surface whatever the server attaches to the account.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountSession {
    #[serde(default)]
    pub uid: String,
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Raw session endpoint response
#[derive(Debug, Deserialize)]
pub struct SessionResponse {
    pub data: Option<AccountSession>,
    pub message: Option<String>,
}

impl SessionResponse {
    /// Validate the response into an [`AccountSession`].
    ///
    /// A response without a non-empty `data.uid` is a failed exchange
    /// regardless of HTTP status.
    pub fn into_session(self) -> Result<AccountSession, SessionError> {
        match self.data {
            Some(session) if !session.uid.is_empty() => Ok(session),
            _ => Err(SessionError::MissingUid {
                message: self
                    .message
                    .unwrap_or_else(|| "no account uid in response".to_string()),
            }),
        }
    }
}

/// Session exchange error types
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session request failed: {0}")]
    Network(String),

    #[error("session request failed (HTTP {status}): {message}")]
    Http { status: u16, message: String },

    #[error("invalid session response: {0}")]
    InvalidResponse(String),

    #[error("session response missing account uid: {message}")]
    MissingUid { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_with_uid_is_accepted() {
        let response: SessionResponse =
            serde_json::from_str(r#"{"data": {"uid": "u-42", "name": "alice"}}"#).unwrap();
        let session = response.into_session().unwrap();
        assert_eq!(session.uid, "u-42");
        assert_eq!(session.name, "alice");
    }

    #[test]
    fn test_extra_fields_pass_through() {
        let response: SessionResponse = serde_json::from_str(
            r#"{"data": {"uid": "u-1", "name": "bob", "tier": "gold", "balance": 7}}"#,
        )
        .unwrap();
        let session = response.into_session().unwrap();
        assert_eq!(session.extra["tier"], "gold");
        assert_eq!(session.extra["balance"], 7);
    }

    #[test]
    fn test_missing_data_is_rejected() {
        let response: SessionResponse =
            serde_json::from_str(r#"{"message": "maintenance"}"#).unwrap();
        match response.into_session() {
            Err(SessionError::MissingUid { message }) => assert_eq!(message, "maintenance"),
            other => panic!("expected MissingUid, got {:?}", other.map(|s| s.uid)),
        }
    }

    #[test]
    fn test_empty_uid_is_rejected() {
        let response: SessionResponse =
            serde_json::from_str(r#"{"data": {"uid": "", "name": "ghost"}}"#).unwrap();
        assert!(response.into_session().is_err());
    }

    #[test]
    fn test_missing_uid_field_is_rejected() {
        let response: SessionResponse =
            serde_json::from_str(r#"{"data": {"name": "nameless"}}"#).unwrap();
        assert!(response.into_session().is_err());
    }
}
