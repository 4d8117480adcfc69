//! Common types for the MedHire client SDK

mod error;
mod secret;

pub use error::{Error, Result};
pub use secret::Secret;
