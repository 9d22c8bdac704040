/// openFDA wire types and fetchers.
///
/// Every field is optional: openFDA omits keys freely and occasionally sends
/// `null`. Consumers decode these once into their own fully-defaulted records.
use serde::Deserialize;
use tracing::info;

use crate::error::CommonError;
use crate::http::{DateWindow, RegistryClient};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OpenFdaResponse<T> {
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

/// Harmonized `openfda` block attached to drugs@FDA and enforcement records.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OpenFdaFields {
    pub brand_name: Option<Vec<String>>,
    pub generic_name: Option<Vec<String>>,
    pub manufacturer_name: Option<Vec<String>>,
    pub pharm_class_epc: Option<Vec<String>>,
    pub pharm_class_moa: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DrugsFdaResult {
    pub application_number: Option<String>,
    pub sponsor_name: Option<String>,
    pub openfda: Option<OpenFdaFields>,
    pub products: Option<Vec<DrugsFdaProduct>>,
    pub submissions: Option<Vec<DrugsFdaSubmission>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DrugsFdaProduct {
    pub brand_name: Option<String>,
    pub dosage_form: Option<String>,
    pub route: Option<String>,
    pub marketing_status: Option<String>,
    pub active_ingredients: Option<Vec<ActiveIngredient>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ActiveIngredient {
    pub name: Option<String>,
    pub strength: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DrugsFdaSubmission {
    pub submission_type: Option<String>,
    pub submission_number: Option<String>,
    pub submission_status: Option<String>,
    /// `YYYYMMDD`
    pub submission_status_date: Option<String>,
    pub review_priority: Option<String>,
    pub submission_class_code: Option<String>,
    pub submission_class_code_description: Option<String>,
}

/// A drug enforcement report (recall) from `/drug/enforcement.json`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EnforcementResult {
    pub recall_number: Option<String>,
    pub recalling_firm: Option<String>,
    pub classification: Option<String>,
    pub status: Option<String>,
    pub product_description: Option<String>,
    pub reason_for_recall: Option<String>,
    pub recall_initiation_date: Option<String>,
    pub report_date: Option<String>,
    pub voluntary_mandated: Option<String>,
    pub distribution_pattern: Option<String>,
    pub openfda: Option<OpenFdaFields>,
}

impl RegistryClient {
    /// Fetch drugs@FDA applications with submission activity inside `window`.
    pub async fn drug_applications(
        &self,
        window: DateWindow,
        limit: u32,
    ) -> Result<Vec<DrugsFdaResult>, CommonError> {
        let url = format!("{}/drug/drugsfda.json", self.config().openfda_base_url);
        let query = [
            (
                "search",
                format!("submissions.submission_status_date:{}", window.openfda_range()),
            ),
            ("limit", limit.to_string()),
        ];
        let response: OpenFdaResponse<DrugsFdaResult> = self
            .get_json(&url, &query, self.config().openfda_timeout)
            .await?;
        if response.results.is_empty() {
            return Err(CommonError::EmptyPayload("drugsfda".to_string()));
        }
        info!(count = response.results.len(), "fetched drug applications");
        Ok(response.results)
    }

    /// Fetch drug enforcement reports (recalls) reported inside `window`.
    pub async fn drug_enforcement(
        &self,
        window: DateWindow,
        limit: u32,
    ) -> Result<Vec<EnforcementResult>, CommonError> {
        let url = format!("{}/drug/enforcement.json", self.config().openfda_base_url);
        let query = [
            ("search", format!("report_date:{}", window.openfda_range())),
            ("limit", limit.to_string()),
        ];
        let response: OpenFdaResponse<EnforcementResult> = self
            .get_json(&url, &query, self.config().openfda_timeout)
            .await?;
        if response.results.is_empty() {
            return Err(CommonError::EmptyPayload("enforcement".to_string()));
        }
        info!(count = response.results.len(), "fetched enforcement reports");
        Ok(response.results)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::http::RegistryClientConfig;

    fn client_for(server: &MockServer) -> RegistryClient {
        RegistryClient::new(RegistryClientConfig {
            openfda_base_url: server.uri(),
            ..RegistryClientConfig::default()
        })
        .unwrap()
    }

    fn window() -> DateWindow {
        DateWindow::trailing(NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(), 29)
    }

    #[tokio::test]
    async fn decodes_sparse_drugsfda_payload() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/drug/drugsfda.json"))
            .and(query_param(
                "search",
                "submissions.submission_status_date:[20240601 TO 20240630]",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "meta": { "results": { "total": 2 } },
                "results": [
                    {
                        "application_number": "NDA215000",
                        "sponsor_name": "ACME PHARMA INC",
                        "submissions": [
                            { "submission_type": "ORIG", "submission_status": "CR", "submission_status_date": "20240620" }
                        ]
                    },
                    { "sponsor_name": null, "openfda": null }
                ]
            })))
            .mount(&server)
            .await;

        let results = client_for(&server).drug_applications(window(), 10).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].application_number.as_deref(), Some("NDA215000"));
        let subs = results[0].submissions.as_ref().unwrap();
        assert_eq!(subs[0].submission_status.as_deref(), Some("CR"));
        assert!(results[1].application_number.is_none());
        assert!(results[1].openfda.is_none());
    }

    #[tokio::test]
    async fn server_error_is_reported_as_upstream() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/drug/enforcement.json"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let err = client_for(&server).drug_enforcement(window(), 10).await.unwrap_err();
        match err {
            CommonError::Upstream { status, body } => {
                assert_eq!(status.as_u16(), 503);
                assert_eq!(body, "maintenance");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn empty_results_are_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/drug/drugsfda.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "results": [] })))
            .mount(&server)
            .await;

        let err = client_for(&server).drug_applications(window(), 10).await.unwrap_err();
        assert!(matches!(err, CommonError::EmptyPayload(_)));
    }

    #[tokio::test]
    async fn malformed_body_is_invalid_json() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/drug/drugsfda.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = client_for(&server).drug_applications(window(), 10).await.unwrap_err();
        assert!(matches!(err, CommonError::InvalidJson(_)));
    }
}
