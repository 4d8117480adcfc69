//! Request pipeline: bearer attachment, dispatch, 401 recovery, replay
//!
//! Every outbound call goes through [`ApiClient::request`]. The request
//! descriptor (method, path, body, options) stays owned by the pipeline
//! for the whole attempt, so a call that hits the recovery path can be
//! replayed byte-for-byte with only the Authorization header changed.

use std::sync::Arc;
use std::time::Duration;

use common::Secret;
use medhire_auth::{SecureStore, SessionStore, refresh_session};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::gate::RefreshGate;

/// Per-call overrides. All fields are optional; the defaults come from
/// [`ClientConfig`].
#[derive(Debug, Default, Clone)]
pub struct RequestOptions {
    headers: Vec<(String, String)>,
    query: Vec<(String, String)>,
    timeout: Option<Duration>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an extra request header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Add a query parameter.
    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    /// Override the per-call timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Authenticated API client.
///
/// Cheap to share behind an `Arc`; any number of calls may be in flight
/// concurrently. The only cross-request state is the session store and
/// the refresh gate.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
    session: Arc<SessionStore>,
    gate: RefreshGate,
}

impl ApiClient {
    /// Build a client over the given secure store.
    ///
    /// The store is the device keychain collaborator; tests and desktop
    /// hosts pass `MemoryStore`/`FileStore` from `medhire-auth`.
    pub fn new(config: &ClientConfig, store: Arc<dyn SecureStore>) -> Self {
        let session = Arc::new(SessionStore::new(
            store,
            config.access_token_key.clone(),
            config.refresh_token_key.clone(),
        ));
        info!(base_url = %config.base_url, timeout_ms = config.timeout_ms, "api client initialized");
        Self {
            http: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            timeout: config.timeout(),
            session,
            gate: RefreshGate::new(),
        }
    }

    /// Session credential lifecycle (login stores, logout clears,
    /// `is_authenticated` for post-error checks).
    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Issue a request and deserialize the 2xx body into `T`.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        opts: RequestOptions,
    ) -> Result<T, ApiError> {
        let response = self.perform(method, path, body.as_ref(), &opts).await?;
        if !response.status().is_success() {
            return Err(ApiError::from_response(response).await);
        }
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// Issue a request and discard the 2xx body (DELETEs, fire-and-forget
    /// POSTs).
    pub async fn request_empty(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        opts: RequestOptions,
    ) -> Result<(), ApiError> {
        let response = self.perform(method, path, body.as_ref(), &opts).await?;
        if !response.status().is_success() {
            return Err(ApiError::from_response(response).await);
        }
        Ok(())
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request(Method::GET, path, None, RequestOptions::new())
            .await
    }

    pub async fn get_with<T: DeserializeOwned>(
        &self,
        path: &str,
        opts: RequestOptions,
    ) -> Result<T, ApiError> {
        self.request(Method::GET, path, None, opts).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.request(Method::POST, path, Some(encode(body)?), RequestOptions::new())
            .await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.request(Method::PUT, path, Some(encode(body)?), RequestOptions::new())
            .await
    }

    pub async fn patch<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.request(Method::PATCH, path, Some(encode(body)?), RequestOptions::new())
            .await
    }

    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.request_empty(Method::DELETE, path, None, RequestOptions::new())
            .await
    }

    /// Dispatch with recovery: attach the current token, send, and on a
    /// first 401 refresh-or-wait then replay exactly once. The replay's
    /// response is returned as-is; a second 401 propagates to the caller
    /// like any other HTTP error.
    async fn perform(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        opts: &RequestOptions,
    ) -> Result<reqwest::Response, ApiError> {
        let timeout = opts.timeout.unwrap_or(self.timeout);
        let request_id = Uuid::new_v4();

        metrics::counter!("client_requests_total", "method" => method.to_string()).increment(1);

        // Epoch sampled before dispatch: if another wave rotates the
        // tokens between our dispatch and our 401, the gate tells us to
        // replay without refreshing again.
        let epoch = self.gate.epoch();

        let bearer = self.session.access_token().await;
        debug!(%request_id, %method, path, authenticated = bearer.is_some(), "dispatching");

        let response = self
            .dispatch(&method, path, body, opts, bearer.as_ref(), timeout)
            .await?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        debug!(%request_id, path, "received 401, entering recovery");
        let token = self.recover(epoch, timeout).await?;

        debug!(%request_id, path, "replaying with refreshed token");
        self.dispatch(&method, path, body, opts, Some(&token), timeout)
            .await
    }

    /// Single network attempt. No retries, no recovery.
    async fn dispatch(
        &self,
        method: &Method,
        path: &str,
        body: Option<&Value>,
        opts: &RequestOptions,
        bearer: Option<&Secret<String>>,
        timeout: Duration,
    ) -> Result<reqwest::Response, ApiError> {
        let url = self.url(path);
        let mut request = self.http.request(method.clone(), url).timeout(timeout);

        if !opts.query.is_empty() {
            request = request.query(&opts.query);
        }
        for (name, value) in &opts.headers {
            request = request.header(name, value);
        }
        if let Some(token) = bearer {
            request = request.bearer_auth(token.expose());
        }
        if let Some(json) = body {
            request = request.json(json);
        }

        request
            .send()
            .await
            .map_err(|e| ApiError::from_reqwest(e, timeout))
    }

    /// The recovery path: refresh the session once per wave of 401s.
    ///
    /// Holds the gate for the duration of the refresh call, which is
    /// bounded by the request timeout, so queued callers wait at most one
    /// timeout window before their turn. Returns the access token to
    /// replay with.
    async fn recover(
        &self,
        seen_epoch: u64,
        timeout: Duration,
    ) -> Result<Secret<String>, ApiError> {
        let permit = self.gate.acquire().await;

        if self.gate.epoch() != seen_epoch {
            // A caller ahead in the queue already rotated the tokens.
            return match self.session.access_token().await {
                Some(token) => Ok(token),
                // Rotation happened but the session is gone: a logout
                // raced the queue. Surface it as a dead session.
                None => Err(ApiError::Refresh(medhire_auth::Error::NoRefreshToken)),
            };
        }

        let Some(refresh) = self.session.refresh_token().await else {
            // Nothing to renew with. This is also the path every queued
            // waiter takes after the head of the wave failed and cleared
            // the store: they fail here without touching the network.
            if let Err(e) = self.session.clear().await {
                warn!(error = %e, "failed to clear credentials");
            }
            return Err(ApiError::Refresh(medhire_auth::Error::NoRefreshToken));
        };

        metrics::counter!("client_refresh_total").increment(1);
        match refresh_session(&self.http, &self.base_url, refresh.expose(), timeout).await {
            Ok(pair) => {
                if let Err(e) = self.session.store(&pair).await {
                    // The old refresh token was consumed server-side; a
                    // pair we cannot persist is a dead session.
                    metrics::counter!("client_refresh_failures_total").increment(1);
                    warn!(error = %e, "failed to persist refreshed tokens, session ended");
                    if let Err(clear_err) = self.session.clear().await {
                        warn!(error = %clear_err, "failed to clear credentials");
                    }
                    return Err(ApiError::Refresh(e));
                }
                self.gate.advance(&permit);
                info!("access token refreshed");
                Ok(Secret::new(pair.access_token))
            }
            Err(e) => {
                metrics::counter!("client_refresh_failures_total").increment(1);
                warn!(error = %e, "token refresh failed, session ended");
                if let Err(clear_err) = self.session.clear().await {
                    warn!(error = %clear_err, "failed to clear credentials");
                }
                Err(ApiError::Refresh(e))
            }
        }
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}

fn encode<B: Serialize + ?Sized>(body: &B) -> Result<Value, ApiError> {
    serde_json::to_value(body)
        .map_err(|e| ApiError::Decode(format!("failed to encode request body: {e}")))
}
