//! JCDecaux client error types.

use std::fmt;

/// Errors from the JCDecaux HTTP client.
#[derive(Debug, thiserror::Error)]
pub enum JcDecauxError {
    /// HTTP request failed (unreachable host, timeout, TLS, ...)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid API key or unauthorized
    #[error("unauthorized: check JCDECAUX_API_KEY")]
    Unauthorized,

    /// Station number not known to the contract
    #[error("station {0} not found")]
    StationNotFound(u32),

    /// API returned an error status
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response JSON
    #[error("JSON parse error: {message}")]
    Json {
        message: String,
        body: Option<String>,
    },

    /// Client could not be built from its configuration
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// User-facing category of a failed fetch.
///
/// Only the presentation layer cares about this; the state layer treats
/// every failure the same.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// No reachable network.
    Connectivity,
    /// Reachable, but answered with an error status.
    Protocol,
    /// Anything else, including a body that does not decode.
    Unexpected,
}

impl JcDecauxError {
    /// Categorize this error for presentation.
    pub fn kind(&self) -> FailureKind {
        match self {
            JcDecauxError::Http(e) if e.is_connect() || e.is_timeout() || e.is_request() => {
                FailureKind::Connectivity
            }
            JcDecauxError::Http(e) if e.is_status() => FailureKind::Protocol,
            JcDecauxError::Http(_) => FailureKind::Unexpected,
            JcDecauxError::Unauthorized
            | JcDecauxError::StationNotFound(_)
            | JcDecauxError::Api { .. } => FailureKind::Protocol,
            JcDecauxError::Json { .. } | JcDecauxError::Config(_) => FailureKind::Unexpected,
        }
    }

    /// Message suitable for an error banner.
    pub fn user_message(&self) -> String {
        match self.kind() {
            FailureKind::Connectivity => {
                "Unable to reach the bike-share service, check your internet connection".to_string()
            }
            FailureKind::Protocol => format!("Network error: {self}"),
            FailureKind::Unexpected => format!("Unexpected error: {self}"),
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Connectivity => f.write_str("connectivity"),
            FailureKind::Protocol => f.write_str("protocol"),
            FailureKind::Unexpected => f.write_str("unexpected"),
        }
    }
}
