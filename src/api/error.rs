//! Request layer errors
//!
//! Every failure of a console request collapses into one `ApiError` whose
//! `Display` is the message shown to the operator.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    /// Network unreachable, DNS failure, timeout
    #[error("request failed: {message} (URL: {url})")]
    Transport { message: String, url: String },

    /// Non-2xx response whose body is not JSON
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// Envelope rejected by status or code
    #[error("{message}")]
    Rejected {
        status: u16,
        code: Option<i64>,
        message: String,
    },

    /// 2xx response whose body is not JSON
    #[error("non-JSON response")]
    NonJson,

    #[error("unexpected response data: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("failed to encode request body: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("request cancelled")]
    Cancelled,

    #[error("not signed in: no access token stored")]
    MissingToken,
}

impl ApiError {
    /// Envelope code or HTTP status that caused the rejection, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } | Self::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True when the server refused the credentials (401)
    pub fn is_unauthorized(&self) -> bool {
        match self {
            Self::Rejected { status, code, .. } => *status == 401 || *code == Some(401),
            Self::Http { status, .. } => *status == 401,
            Self::MissingToken => true,
            _ => false,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
