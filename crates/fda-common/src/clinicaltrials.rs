/// ClinicalTrials.gov v2 (`/studies`) wire types and fetcher.
use serde::Deserialize;
use tracing::info;

use crate::error::CommonError;
use crate::http::RegistryClient;

/// Statuses requested from the registry. Terminal statuses are included so
/// halted programs can still surface as leads.
pub const TRACKED_STATUSES: &[&str] = &[
    "RECRUITING",
    "NOT_YET_RECRUITING",
    "ACTIVE_NOT_RECRUITING",
    "ENROLLING_BY_INVITATION",
    "SUSPENDED",
    "TERMINATED",
];

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StudiesResponse {
    pub studies: Option<Vec<Study>>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Study {
    pub protocol_section: Option<ProtocolSection>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProtocolSection {
    pub identification_module: Option<IdentificationModule>,
    pub status_module: Option<StatusModule>,
    pub sponsor_collaborators_module: Option<SponsorCollaboratorsModule>,
    pub design_module: Option<DesignModule>,
    pub arms_interventions_module: Option<ArmsInterventionsModule>,
    pub conditions_module: Option<ConditionsModule>,
    pub eligibility_module: Option<EligibilityModule>,
    pub contacts_locations_module: Option<ContactsLocationsModule>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IdentificationModule {
    pub nct_id: Option<String>,
    pub brief_title: Option<String>,
    pub official_title: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StatusModule {
    pub overall_status: Option<String>,
    pub start_date_struct: Option<DateStruct>,
    pub primary_completion_date_struct: Option<DateStruct>,
    pub last_update_post_date_struct: Option<DateStruct>,
}

/// Registry dates are `YYYY-MM` or `YYYY-MM-DD`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DateStruct {
    pub date: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SponsorCollaboratorsModule {
    pub lead_sponsor: Option<Sponsor>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Sponsor {
    pub name: Option<String>,
    pub class: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DesignModule {
    pub study_type: Option<String>,
    pub phases: Option<Vec<String>>,
    pub enrollment_info: Option<EnrollmentInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EnrollmentInfo {
    pub count: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ArmsInterventionsModule {
    pub interventions: Option<Vec<Intervention>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Intervention {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConditionsModule {
    pub conditions: Option<Vec<String>>,
    pub keywords: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EligibilityModule {
    pub eligibility_criteria: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ContactsLocationsModule {
    pub locations: Option<Vec<serde_json::Value>>,
}

impl RegistryClient {
    /// Fetch one page of interventional studies in the tracked statuses.
    pub async fn studies(&self, page_size: u32) -> Result<Vec<Study>, CommonError> {
        let url = format!("{}/studies", self.config().ctgov_base_url);
        let query = [
            ("filter.overallStatus", TRACKED_STATUSES.join("|")),
            ("filter.advanced", "AREA[StudyType]INTERVENTIONAL".to_string()),
            ("pageSize", page_size.to_string()),
        ];
        let response: StudiesResponse = self
            .get_json(&url, &query, self.config().ctgov_timeout)
            .await?;
        let studies = response.studies.unwrap_or_default();
        if studies.is_empty() {
            return Err(CommonError::EmptyPayload("studies".to_string()));
        }
        info!(count = studies.len(), "fetched clinical trials");
        Ok(studies)
    }
}
