use thiserror::Error;

/// Top-level error type for the `aircontrol-api` crate.
///
/// Every variant belongs to exactly one [`ErrorKind`]. Callers that only
/// care about the coarse category (setup flows, exit codes) branch on
/// [`Error::kind`] instead of matching variants.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Login rejected, no identity in the login response, or the session
    /// expired again after the single re-authentication attempt.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// Unexpected HTTP status (anything but 200, 401 and 403).
    #[error("Unexpected HTTP status {status}")]
    HttpStatus { status: u16 },

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Data ────────────────────────────────────────────────────────
    /// The response body was not the JSON we expected, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    // ── API ─────────────────────────────────────────────────────────
    /// Well-formed response reporting an application-level failure.
    #[error("API error: {message}")]
    Api {
        message: String,
        code: Option<String>,
    },
}

/// Coarse error category.
///
/// The setup flow maps these to "invalid credentials", "cannot connect"
/// and a generic failure message respectively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Auth,
    Connection,
    Api,
}

impl Error {
    /// The category this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Authentication { .. } => ErrorKind::Auth,
            Self::Api { .. } => ErrorKind::Api,
            Self::Transport(_)
            | Self::InvalidUrl(_)
            | Self::Timeout { .. }
            | Self::HttpStatus { .. }
            | Self::Tls(_)
            | Self::Deserialization { .. } => ErrorKind::Connection,
        }
    }

    /// Returns `true` for credential or session failures.
    pub fn is_auth(&self) -> bool {
        self.kind() == ErrorKind::Auth
    }

    /// Returns `true` if the server could not be reached or answered garbage.
    pub fn is_connection(&self) -> bool {
        self.kind() == ErrorKind::Connection
    }

    /// Extract the application status code, if available.
    pub fn api_error_code(&self) -> Option<&str> {
        match self {
            Self::Api { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    /// Map a reqwest failure, turning client-side timeouts into [`Error::Timeout`].
    pub(crate) fn from_transport(err: reqwest::Error, timeout: std::time::Duration) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                timeout_secs: whole_seconds(timeout),
            }
        } else {
            Self::Transport(err)
        }
    }
}

/// Seconds rounded up, so sub-second timeouts never read as `0s`.
fn whole_seconds(timeout: std::time::Duration) -> u64 {
    timeout.as_secs() + u64::from(timeout.subsec_nanos() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_cover_every_category() {
        let auth = Error::Authentication {
            message: "bad password".into(),
        };
        let status = Error::HttpStatus { status: 502 };
        let body = Error::Deserialization {
            message: "expected value".into(),
            body: "<html>".into(),
        };
        let api = Error::Api {
            message: "device offline".into(),
            code: Some("500".into()),
        };

        assert_eq!(auth.kind(), ErrorKind::Auth);
        assert_eq!(status.kind(), ErrorKind::Connection);
        assert_eq!(body.kind(), ErrorKind::Connection);
        assert_eq!(api.kind(), ErrorKind::Api);
        assert!(auth.is_auth());
        assert!(body.is_connection());
        assert_eq!(api.api_error_code(), Some("500"));
        assert_eq!(status.api_error_code(), None);
    }

    #[test]
    fn timeout_message_names_seconds() {
        let err = Error::Timeout { timeout_secs: 10 };
        assert_eq!(err.to_string(), "Request timed out after 10s");
    }

    #[test]
    fn timeout_seconds_round_up() {
        use std::time::Duration;

        assert_eq!(whole_seconds(Duration::from_millis(200)), 1);
        assert_eq!(whole_seconds(Duration::from_secs(10)), 10);
        assert_eq!(whole_seconds(Duration::from_millis(10_001)), 11);
        assert_eq!(whole_seconds(Duration::ZERO), 0);
    }
}
