//! Error taxonomy surfaced to callers
//!
//! Three request-failure origins are represented uniformly so callers that
//! only care about the message don't have to distinguish transport from
//! application errors, while `status()` preserves the HTTP code for callers
//! that branch on it (e.g. 404 on profile fetch means "no profile yet").

use std::time::Duration;

use serde_json::Value;

/// Error returned by every [`crate::ApiClient`] operation.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// No response received: network down, DNS failure, connection refused.
    #[error("transport failure: {0}")]
    Transport(String),

    /// No response within the configured window.
    #[error("request timed out after {elapsed_ms} ms")]
    Timeout { elapsed_ms: u64 },

    /// Server responded with a non-2xx status after all recovery attempts.
    /// The raw body is preserved (as JSON when parseable).
    #[error("server returned {status}: {message}")]
    Http {
        status: u16,
        message: String,
        body: Option<Value>,
    },

    /// A 2xx response whose body did not match the declared success type.
    #[error("failed to decode response body: {0}")]
    Decode(String),

    /// Failure on the session recovery path. The stored credentials have
    /// already been cleared: the application-level effect is an
    /// involuntary logout, and callers should redirect to the
    /// unauthenticated state.
    #[error("session refresh failed: {0}")]
    Refresh(#[from] medhire_auth::Error),
}

impl ApiError {
    /// HTTP status of the failing response, if the server responded.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Refresh(medhire_auth::Error::Rejected { status, .. }) => Some(*status),
            _ => None,
        }
    }

    /// Whether this error carries the given HTTP status.
    pub fn is_status(&self, code: u16) -> bool {
        self.status() == Some(code)
    }

    /// Map a reqwest transport error into the taxonomy.
    pub(crate) fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                elapsed_ms: timeout.as_millis() as u64,
            }
        } else {
            Self::Transport(err.to_string())
        }
    }

    /// Build an `Http` error from a non-2xx response, preserving status and
    /// raw body. The message is taken from the backend's `message` field
    /// when present, falling back to the body text or the canonical status
    /// reason.
    pub(crate) async fn from_response(response: reqwest::Response) -> Self {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        let body: Option<Value> = serde_json::from_str(&text).ok();

        let message = body
            .as_ref()
            .and_then(|v| v.get("message"))
            .and_then(Value::as_str)
            .map(str::to_owned)
            .unwrap_or_else(|| {
                if text.is_empty() {
                    status
                        .canonical_reason()
                        .unwrap_or("unknown error")
                        .to_owned()
                } else {
                    text.clone()
                }
            });

        Self::Http {
            status: status.as_u16(),
            message,
            body,
        }
    }
}
