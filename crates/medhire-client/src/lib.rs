//! Authenticated API client for the MedHire provider backend
//!
//! All network traffic from the mobile shell flows through [`ApiClient`]:
//! it attaches the current bearer token, detects access-token expiry
//! (HTTP 401), refreshes the session exactly once per concurrent wave of
//! failing requests, replays the originals with the new token, and falls
//! back to a logged-out state when the refresh itself fails.
//!
//! Request lifecycle:
//! 1. Read the access token from the secure store, attach as Bearer
//! 2. Dispatch with the per-call timeout (default 30s)
//! 3. On 401 (first time only): wait on the refresh gate, refresh or
//!    reuse the token rotated by the caller ahead in the queue
//! 4. Replay once with the fresh token
//! 5. Any other failure propagates as [`ApiError`]

pub mod client;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod gate;

pub use client::{ApiClient, RequestOptions};
pub use config::ClientConfig;
pub use error::ApiError;
pub use gate::RefreshGate;
