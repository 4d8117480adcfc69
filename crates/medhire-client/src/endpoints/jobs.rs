//! Job posting CRUD endpoints

use serde::{Deserialize, Serialize};

use crate::client::ApiClient;
use crate::error::ApiError;

/// A job posting as returned by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobPosting {
    pub id: String,
    pub title: String,
    pub description: String,
    pub specialty: String,
    pub location: String,
    pub employment_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary_range: Option<String>,
}

/// Fields the provider supplies when creating or updating a posting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobPostingDraft {
    pub title: String,
    pub description: String,
    pub specialty: String,
    pub location: String,
    pub employment_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary_range: Option<String>,
}

impl ApiClient {
    pub async fn list_job_postings(&self) -> Result<Vec<JobPosting>, ApiError> {
        self.get("/job-postings").await
    }

    pub async fn get_job_posting(&self, id: &str) -> Result<JobPosting, ApiError> {
        self.get(&format!("/job-postings/{id}")).await
    }

    pub async fn create_job_posting(&self, draft: &JobPostingDraft) -> Result<JobPosting, ApiError> {
        self.post("/job-postings", draft).await
    }

    pub async fn update_job_posting(
        &self,
        id: &str,
        draft: &JobPostingDraft,
    ) -> Result<JobPosting, ApiError> {
        self.put(&format!("/job-postings/{id}"), draft).await
    }

    pub async fn delete_job_posting(&self, id: &str) -> Result<(), ApiError> {
        self.delete(&format!("/job-postings/{id}")).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn posting_roundtrips() {
        let json = r#"{
            "id": "jp_9",
            "title": "Registered Nurse",
            "description": "Night shift, ICU",
            "specialty": "critical_care",
            "location": "Abuja",
            "employment_type": "full_time",
            "salary_range": "₦400k–₦550k"
        }"#;
        let posting: JobPosting = serde_json::from_str(json).unwrap();
        assert_eq!(posting.title, "Registered Nurse");
        assert_eq!(posting.salary_range.as_deref(), Some("₦400k–₦550k"));

        let back = serde_json::to_value(&posting).unwrap();
        assert_eq!(back["employment_type"], "full_time");
    }
}
