//! Token refresh endpoint call
//!
//! The refresh protocol is the single endpoint this crate calls directly:
//! `POST {base_url}/auth/refresh-token` with the refresh token as a JSON
//! payload. The backend responds with a complete new pair; both tokens are
//! rotated on every successful refresh.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Backend path of the refresh endpoint, relative to the API base URL.
pub const REFRESH_PATH: &str = "/auth/refresh-token";

/// An access/refresh credential pair.
///
/// Both values are opaque bearer strings; nothing in this crate inspects
/// their contents. The wire shape matches the refresh endpoint response
/// and the login/OTP-verify responses.
#[derive(Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

// Tokens are secrets: keep them out of Debug output and logs.
impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .finish()
    }
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

/// Exchange a refresh token for a new token pair.
///
/// The caller owns persistence: on success the returned pair must
/// overwrite the stored one, and on failure the stored pair must be
/// cleared (the session is unrecoverable without a valid refresh token).
///
/// `timeout` bounds this single call; the API client passes its
/// per-request timeout so a hanging refresh cannot stall queued callers
/// indefinitely.
pub async fn refresh_session(
    client: &reqwest::Client,
    base_url: &str,
    refresh_token: &str,
    timeout: Duration,
) -> Result<TokenPair> {
    let url = format!("{}{}", base_url.trim_end_matches('/'), REFRESH_PATH);

    let response = client
        .post(url)
        .timeout(timeout)
        .json(&RefreshRequest { refresh_token })
        .send()
        .await
        .map_err(|e| {
            if e.is_timeout() {
                Error::Timeout
            } else {
                Error::Http(format!("refresh request failed: {e}"))
            }
        })?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("<no body>"));
        return Err(Error::Rejected {
            status: status.as_u16(),
            body,
        });
    }

    response
        .json::<TokenPair>()
        .await
        .map_err(|e| Error::Parse(format!("invalid refresh response: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_pair_deserializes() {
        let json = r#"{"access_token":"at_abc","refresh_token":"rt_def"}"#;
        let pair: TokenPair = serde_json::from_str(json).unwrap();
        assert_eq!(pair.access_token, "at_abc");
        assert_eq!(pair.refresh_token, "rt_def");
    }

    #[test]
    fn token_pair_serializes() {
        let pair = TokenPair {
            access_token: "at_test".into(),
            refresh_token: "rt_test".into(),
        };
        let json = serde_json::to_string(&pair).unwrap();
        assert!(json.contains("\"access_token\":\"at_test\""));
        assert!(json.contains("\"refresh_token\":\"rt_test\""));
    }

    #[test]
    fn token_pair_debug_redacts_values() {
        let pair = TokenPair {
            access_token: "at_secret".into(),
            refresh_token: "rt_secret".into(),
        };
        let debug = format!("{pair:?}");
        assert!(!debug.contains("at_secret"));
        assert!(!debug.contains("rt_secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn refresh_request_wire_shape() {
        let body = RefreshRequest {
            refresh_token: "rt_abc",
        };
        let json = serde_json::to_string(&body).unwrap();
        assert_eq!(json, r#"{"refresh_token":"rt_abc"}"#);
    }

    #[tokio::test]
    async fn unreachable_backend_is_an_http_error() {
        // Nothing listens on this port; the connect error must surface as
        // Error::Http, not a panic or timeout.
        let client = reqwest::Client::new();
        let result = refresh_session(
            &client,
            "http://127.0.0.1:9",
            "rt_abc",
            Duration::from_secs(2),
        )
        .await;
        assert!(matches!(result, Err(Error::Http(_))));
    }
}
