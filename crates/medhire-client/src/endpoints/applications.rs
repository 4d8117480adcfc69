//! Applicant review endpoints
//!
//! Application status is a closed enum; the backend rejects anything
//! outside it, so unknown statuses fail at the serde boundary instead of
//! leaking into review screens.

use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::client::{ApiClient, RequestOptions};
use crate::error::ApiError;

/// Review state of an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    Shortlisted,
    Rejected,
    Hired,
}

/// An applicant's submission against a job posting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Application {
    pub id: String,
    pub job_id: String,
    pub applicant_name: String,
    pub status: ApplicationStatus,
    pub submitted_at: String,
}

impl ApiClient {
    /// List applications, optionally filtered to one job posting.
    pub async fn list_applications(
        &self,
        job_id: Option<&str>,
    ) -> Result<Vec<Application>, ApiError> {
        let mut opts = RequestOptions::new();
        if let Some(id) = job_id {
            opts = opts.query("job_id", id);
        }
        self.get_with("/applications", opts).await
    }

    /// Move an application to a new review state.
    pub async fn update_application_status(
        &self,
        id: &str,
        status: ApplicationStatus,
    ) -> Result<Application, ApiError> {
        self.request(
            Method::PATCH,
            &format!("/applications/{id}"),
            Some(json!({ "status": status })),
            RequestOptions::new(),
        )
        .await
    }
}
