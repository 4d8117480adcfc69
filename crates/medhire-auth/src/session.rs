//! Two-key session lifecycle over a secure store
//!
//! `SessionStore` owns the mapping between the credential pair and its two
//! configurable storage keys. It is the single writer of those keys: login
//! and refresh overwrite both, logout and refresh failure delete both.

use std::sync::Arc;

use common::Secret;
use tracing::{debug, info};

use crate::error::Result;
use crate::store::SecureStore;
use crate::token::TokenPair;

/// Credential pair lifecycle manager.
///
/// Absence of a token is not an error at this layer: `access_token`
/// returns None and the API client dispatches the request
/// unauthenticated, letting the backend reject it if auth is required.
pub struct SessionStore {
    store: Arc<dyn SecureStore>,
    access_key: String,
    refresh_key: String,
}

impl SessionStore {
    pub fn new(store: Arc<dyn SecureStore>, access_key: String, refresh_key: String) -> Self {
        Self {
            store,
            access_key,
            refresh_key,
        }
    }

    /// Current access token, if a session exists.
    pub async fn access_token(&self) -> Option<Secret<String>> {
        self.store.get(&self.access_key).await.map(Secret::new)
    }

    /// Current refresh token, if a session exists.
    pub async fn refresh_token(&self) -> Option<Secret<String>> {
        self.store.get(&self.refresh_key).await.map(Secret::new)
    }

    /// Whether a session exists (access token present).
    pub async fn is_authenticated(&self) -> bool {
        self.store.get(&self.access_key).await.is_some()
    }

    /// Persist a new pair, overwriting any previous session.
    pub async fn store(&self, pair: &TokenPair) -> Result<()> {
        self.store
            .set(&self.access_key, pair.access_token.clone())
            .await?;
        self.store
            .set(&self.refresh_key, pair.refresh_token.clone())
            .await?;
        debug!("session credentials stored");
        Ok(())
    }

    /// Delete both credential entries (logout or irrecoverable refresh
    /// failure).
    ///
    /// Both deletes are attempted even if the first fails, so a partial
    /// session cannot survive an I/O hiccup on one key.
    pub async fn clear(&self) -> Result<()> {
        let access = self.store.delete(&self.access_key).await;
        let refresh = self.store.delete(&self.refresh_key).await;
        info!("session credentials cleared");
        access.and(refresh)
    }
}
