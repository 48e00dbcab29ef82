//! Error taxonomy shared by all three utilities.
//!
//! HTTP failures are split into explicit kinds so callers can distinguish a
//! duplicate-name conflict from a fatal failure without string-matching at
//! every call site.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ForgeError {
    /// Transport-level failure: DNS, connect, timeout, malformed body.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// HTTP 4xx, with the response body captured.
    #[error("client error (HTTP {status}): {body}")]
    Client { status: u16, body: String },

    /// HTTP 5xx, with the response body captured.
    #[error("server error (HTTP {status}): {body}")]
    Server { status: u16, body: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("input error: {0}")]
    Input(String),

    #[error("encryption error: {0}")]
    Crypto(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ForgeError {
    /// True for GitLab's duplicate-name rejection on a create call.
    pub fn is_taken_conflict(&self) -> bool {
        matches!(
            self,
            ForgeError::Client { status: 400, body } if body.contains("has already been taken")
        )
    }
}

/// Resolve a response into `Ok` or the matching error kind.
///
/// The body is read eagerly on failure so the error carries whatever the
/// platform said about the rejection.
pub async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ForgeError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let code = status.as_u16();
    let body = response.text().await.unwrap_or_default();
    if status.is_server_error() {
        Err(ForgeError::Server { status: code, body })
    } else {
        Err(ForgeError::Client { status: code, body })
    }
}
