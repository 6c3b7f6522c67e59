//! Error types shared by the API client, configuration and session layers.

use std::path::PathBuf;
use thiserror::Error;

/// Banner text shown when the cipher list cannot be fetched.
pub const CIPHERS_LOAD_MESSAGE: &str = "Failed to load ciphers. Is backend running?";

/// Banner text for a failed audit when the server offers no detail.
pub const AUDIT_FALLBACK_MESSAGE: &str = "Audit failed due to network or server error.";

/// Failure of a single HTTP exchange with the audit backend.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Network(#[source] reqwest::Error),

    #[error("{}", status_message(.status, .detail))]
    Status { status: u16, detail: Option<String> },

    #[error("malformed response: {0}")]
    Decode(#[source] reqwest::Error),

    #[error("invalid client setup: {0}")]
    Setup(String),
}

impl TransportError {
    /// Human-readable detail supplied by the server, if the error body had one.
    pub fn server_detail(&self) -> Option<&str> {
        match self {
            TransportError::Status {
                detail: Some(detail),
                ..
            } => Some(detail),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            TransportError::Network(err) | TransportError::Decode(err) => {
                err.status().map(|status| status.as_u16())
            }
            TransportError::Setup(_) => None,
        }
    }
}

fn status_message(status: &u16, detail: &Option<String>) -> String {
    match detail {
        Some(detail) => detail.to_string(),
        None => format!("server returned status {status}"),
    }
}

/// Errors surfaced to the user as a banner. Neither kind ends the session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("{}", CIPHERS_LOAD_MESSAGE)]
    CiphersLoad,

    #[error("{0}")]
    Audit(String),
}

impl SessionError {
    /// Picks the most specific message: server detail first, generic fallback otherwise.
    pub fn from_audit_failure(err: &TransportError) -> Self {
        let message = err
            .server_detail()
            .map(str::to_owned)
            .unwrap_or_else(|| AUDIT_FALLBACK_MESSAGE.to_string());
        SessionError::Audit(message)
    }

    pub fn is_audit(&self) -> bool {
        matches!(self, SessionError::Audit(_))
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audit_banner_prefers_server_detail() {
        let err = TransportError::Status {
            status: 400,
            detail: Some("bad key length".to_string()),
        };
        assert_eq!(
            SessionError::from_audit_failure(&err).to_string(),
            "bad key length"
        );
    }

    #[test]
    fn audit_banner_falls_back_without_detail() {
        let err = TransportError::Status {
            status: 502,
            detail: None,
        };
        assert_eq!(
            SessionError::from_audit_failure(&err),
            SessionError::Audit(AUDIT_FALLBACK_MESSAGE.to_string())
        );
        assert_eq!(err.to_string(), "server returned status 502");

        let setup = TransportError::Setup("bad url".to_string());
        assert_eq!(
            SessionError::from_audit_failure(&setup).to_string(),
            AUDIT_FALLBACK_MESSAGE
        );
    }

    #[test]
    fn ciphers_banner_is_fixed() {
        assert_eq!(SessionError::CiphersLoad.to_string(), CIPHERS_LOAD_MESSAGE);
        assert!(!SessionError::CiphersLoad.is_audit());
    }
}
