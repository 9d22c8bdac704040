/// Error types shared by the upstream registry clients.
///
/// These represent failures talking to third-party registries (openFDA,
/// ClinicalTrials.gov). Service crates wrap `CommonError` via `#[from]` and
/// decide whether a failure is fatal or should degrade to fallback data.
use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum CommonError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("invalid response JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("upstream returned error: status={status} body={body}")]
    Upstream { status: StatusCode, body: String },

    #[error("invalid registry url: {0}")]
    InvalidUrl(String),

    #[error("invalid registry config: {0}")]
    InvalidConfig(String),

    #[error("upstream returned no records: {0}")]
    EmptyPayload(String),
}
