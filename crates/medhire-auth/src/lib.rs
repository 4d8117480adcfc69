//! Session credential management for the MedHire client
//!
//! Provides the secure credential store abstraction, the two-key session
//! lifecycle, and the token refresh endpoint call. This crate is a
//! standalone library with no dependency on the API client — it can be
//! tested and used independently.
//!
//! Credential flow:
//! 1. Login/OTP-verify/OAuth callback yields a `TokenPair`
//! 2. Pair stored via `session::SessionStore::store()`
//! 3. API client attaches the access token per request
//! 4. On 401, client calls `token::refresh_session()` with the refresh token
//! 5. New pair overwrites the old via `SessionStore::store()`
//! 6. Logout or refresh failure clears both keys via `SessionStore::clear()`

pub mod error;
pub mod session;
pub mod store;
pub mod token;

pub use error::{Error, Result};
pub use session::SessionStore;
pub use store::{FileStore, MemoryStore, SecureStore};
pub use token::{REFRESH_PATH, TokenPair, refresh_session};
