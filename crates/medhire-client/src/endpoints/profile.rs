//! Company profile endpoints
//!
//! A provider that has signed up but not yet created a profile gets a 404
//! from `GET /company-profile`; that is "no profile yet", not a failure,
//! so `fetch_company_profile` maps it to `None`.

use serde::{Deserialize, Serialize};

use crate::client::ApiClient;
use crate::error::ApiError;

/// A provider's company profile as returned by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub id: String,
    pub name: String,
    pub description: String,
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
}

/// Fields the provider supplies when creating or updating a profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyProfileDraft {
    pub name: String,
    pub description: String,
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

impl ApiClient {
    /// Fetch the caller's company profile, or `None` if one hasn't been
    /// created yet.
    pub async fn fetch_company_profile(&self) -> Result<Option<CompanyProfile>, ApiError> {
        match self.get::<CompanyProfile>("/company-profile").await {
            Ok(profile) => Ok(Some(profile)),
            Err(e) if e.is_status(404) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn create_company_profile(
        &self,
        draft: &CompanyProfileDraft,
    ) -> Result<CompanyProfile, ApiError> {
        self.post("/company-profile", draft).await
    }

    pub async fn update_company_profile(
        &self,
        draft: &CompanyProfileDraft,
    ) -> Result<CompanyProfile, ApiError> {
        self.put("/company-profile", draft).await
    }
}
