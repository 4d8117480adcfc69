//! Login, OTP, and logout flows
//!
//! Every flow that yields a token pair persists it through the session
//! store before returning, so the next request dispatches authenticated.
//! The browser half of the Google OAuth flow is the identity provider's
//! concern; this module only posts the resulting ID token.

use medhire_auth::TokenPair;
use reqwest::Method;
use serde::Serialize;
use tracing::{debug, info};

use crate::client::{ApiClient, RequestOptions};
use crate::error::ApiError;

#[derive(Serialize)]
struct OtpRequest<'a> {
    phone: &'a str,
}

#[derive(Serialize)]
struct OtpVerify<'a> {
    phone: &'a str,
    code: &'a str,
}

#[derive(Serialize)]
struct GoogleToken<'a> {
    id_token: &'a str,
}

impl ApiClient {
    /// Ask the backend to send a one-time code to the given phone number.
    pub async fn request_otp(&self, phone: &str) -> Result<(), ApiError> {
        self.post_empty("/auth/request-otp", &OtpRequest { phone })
            .await
    }

    /// Exchange a one-time code for a session. Stores the returned pair.
    pub async fn verify_otp(&self, phone: &str, code: &str) -> Result<(), ApiError> {
        let pair: TokenPair = self.post("/auth/verify-otp", &OtpVerify { phone, code }).await?;
        self.session().store(&pair).await?;
        info!("signed in via OTP");
        Ok(())
    }

    /// Sign in with a Google ID token. Stores the returned pair.
    pub async fn google_sign_in(&self, id_token: &str) -> Result<(), ApiError> {
        let pair: TokenPair = self
            .post("/auth/google/sign-in", &GoogleToken { id_token })
            .await?;
        self.session().store(&pair).await?;
        info!("signed in via Google");
        Ok(())
    }

    /// Create an account from a Google ID token. Stores the returned pair.
    pub async fn google_sign_up(&self, id_token: &str) -> Result<(), ApiError> {
        let pair: TokenPair = self
            .post("/auth/google/sign-up", &GoogleToken { id_token })
            .await?;
        self.session().store(&pair).await?;
        info!("signed up via Google");
        Ok(())
    }

    /// End the session. Server notification is best-effort; the local
    /// credential deletion is what actually logs the device out.
    pub async fn logout(&self) -> Result<(), ApiError> {
        if let Err(e) = self
            .request_empty(Method::POST, "/auth/logout", None, RequestOptions::new())
            .await
        {
            debug!(error = %e, "server logout notification failed, clearing locally anyway");
        }
        self.session().clear().await?;
        Ok(())
    }

    async fn post_empty<B: Serialize>(&self, path: &str, body: &B) -> Result<(), ApiError> {
        let body = serde_json::to_value(body)
            .map_err(|e| ApiError::Decode(format!("failed to encode request body: {e}")))?;
        self.request_empty(Method::POST, path, Some(body), RequestOptions::new())
            .await
    }
}
