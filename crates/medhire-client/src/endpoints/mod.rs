//! Typed endpoint helpers
//!
//! Thin wrappers over the passthrough client, one module per mobile flow.
//! These pin the request/response shapes the backend defines; they add no
//! protocol semantics of their own. Everything here rides the same
//! pipeline — bearer attachment and 401 recovery included.

pub mod applications;
pub mod auth;
pub mod jobs;
pub mod profile;

pub use applications::{Application, ApplicationStatus};
pub use jobs::{JobPosting, JobPostingDraft};
pub use profile::{CompanyProfile, CompanyProfileDraft};
