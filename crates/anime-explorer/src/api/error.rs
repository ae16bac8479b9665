use reqwest::StatusCode;
use thiserror::Error;

/// Why a request to the listing API did not produce data.
///
/// Raw transport errors are mapped onto one of these kinds before they
/// leave the client.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiFailure {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("request timed out")]
    Timeout,

    #[error("server returned status {status}")]
    ServerError { status: u16 },

    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl ApiFailure {
    /// Short machine-friendly name, used as a log field
    pub fn kind(&self) -> &'static str {
        match self {
            ApiFailure::NetworkUnreachable(_) => "network-unreachable",
            ApiFailure::Timeout => "timeout",
            ApiFailure::ServerError { .. } => "server-error",
            ApiFailure::MalformedResponse(_) => "malformed-response",
        }
    }

    /// Whether asking again later (pull-to-refresh) can reasonably succeed
    pub fn is_retriable(&self) -> bool {
        match self {
            ApiFailure::NetworkUnreachable(_) | ApiFailure::Timeout => true,
            ApiFailure::ServerError { status } => *status == 429 || *status >= 500,
            ApiFailure::MalformedResponse(_) => false,
        }
    }

    /// Map a non-success HTTP status
    pub fn from_status(status: StatusCode) -> Self {
        ApiFailure::ServerError {
            status: status.as_u16(),
        }
    }
}

impl From<reqwest::Error> for ApiFailure {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ApiFailure::Timeout
        } else if e.is_decode() || e.is_body() {
            ApiFailure::MalformedResponse(e.to_string())
        } else if let Some(status) = e.status() {
            ApiFailure::from_status(status)
        } else {
            // connect, request, redirect and builder errors all mean we never got an answer
            ApiFailure::NetworkUnreachable(e.to_string())
        }
    }
}
