use std::time::Duration;

use chrono::{Days, NaiveDate};
use reqwest::Url;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::CommonError;

#[derive(Clone, Debug)]
pub struct RegistryClientConfig {
    pub openfda_base_url: String,
    pub ctgov_base_url: String,
    pub openfda_timeout: Duration,
    pub ctgov_timeout: Duration,
    pub max_error_body_bytes: usize,
}

impl Default for RegistryClientConfig {
    fn default() -> Self {
        Self {
            openfda_base_url: "https://api.fda.gov".to_string(),
            ctgov_base_url: "https://clinicaltrials.gov/api/v2".to_string(),
            openfda_timeout: Duration::from_secs(30),
            ctgov_timeout: Duration::from_secs(45),
            max_error_body_bytes: 8 * 1024,
        }
    }
}

fn lookup_parsed<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Result<Option<T>, CommonError> {
    match lookup(name) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| CommonError::InvalidConfig(format!("{name} has an invalid value: {raw:?}"))),
        _ => Ok(None),
    }
}

fn lookup_secs(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: Duration,
) -> Result<Duration, CommonError> {
    match lookup_parsed::<u64>(lookup, name)? {
        Some(0) => Err(CommonError::InvalidConfig(format!("{name} must be positive"))),
        Some(secs) => Ok(Duration::from_secs(secs)),
        None => Ok(default),
    }
}

impl RegistryClientConfig {
    pub fn from_env() -> Result<Self, CommonError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source. Unset or blank variables keep
    /// their defaults; set values must parse.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, CommonError> {
        let defaults = Self::default();

        let url = |name: &str, default: String| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or(default)
        };
        let openfda_base_url = url("OPENFDA_BASE_URL", defaults.openfda_base_url);
        let ctgov_base_url = url("CTGOV_BASE_URL", defaults.ctgov_base_url);

        let openfda_timeout =
            lookup_secs(&lookup, "OPENFDA_TIMEOUT_SECS", defaults.openfda_timeout)?;
        let ctgov_timeout = lookup_secs(&lookup, "CTGOV_TIMEOUT_SECS", defaults.ctgov_timeout)?;
        let max_error_body_bytes = lookup_parsed::<usize>(&lookup, "MAX_ERROR_BODY_BYTES")?
            .unwrap_or(defaults.max_error_body_bytes);

        Ok(Self {
            openfda_base_url: openfda_base_url.trim_end_matches('/').to_string(),
            ctgov_base_url: ctgov_base_url.trim_end_matches('/').to_string(),
            openfda_timeout,
            ctgov_timeout,
            max_error_body_bytes,
        })
    }
}

/// Inclusive date range used by the openFDA `[FROM TO TO]` search syntax.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateWindow {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateWindow {
    /// Window covering the `days` before (and including) `today`. Saturates
    /// at the earliest representable date.
    pub fn trailing(today: NaiveDate, days: u32) -> Self {
        let from = today
            .checked_sub_days(Days::new(u64::from(days)))
            .unwrap_or(NaiveDate::MIN);
        Self { from, to: today }
    }

    pub fn openfda_range(&self) -> String {
        format!("[{} TO {}]", self.from.format("%Y%m%d"), self.to.format("%Y%m%d"))
    }
}

/// Thin JSON client shared by the openFDA and ClinicalTrials.gov wrappers.
///
/// Each call is a single attempt bounded by its timeout. Callers own the
/// fallback policy; nothing here retries.
#[derive(Clone)]
pub struct RegistryClient {
    config: RegistryClientConfig,
    http: reqwest::Client,
}

impl RegistryClient {
    pub fn new(config: RegistryClientConfig) -> Result<Self, CommonError> {
        let http = reqwest::Client::builder()
            .user_agent("lead-intel/registry-client")
            .build()?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &RegistryClientConfig {
        &self.config
    }

    pub(crate) async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        query: &[(&str, String)],
        timeout: Duration,
    ) -> Result<T, CommonError> {
        let url = Url::parse_with_params(url, query)
            .map_err(|e| CommonError::InvalidUrl(format!("{url}: {e}")))?;
        debug!(url = %url, timeout_ms = timeout.as_millis(), "registry request");

        let resp = self.http.get(url).timeout(timeout).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = read_limited_text(resp, self.config.max_error_body_bytes).await;
            return Err(CommonError::Upstream { status, body });
        }

        let bytes = resp.bytes().await?;
        Ok(serde_json::from_slice::<T>(&bytes)?)
    }
}

async fn read_limited_text(resp: reqwest::Response, max_bytes: usize) -> String {
    match resp.bytes().await {
        Ok(mut b) => {
            if b.len() > max_bytes {
                b.truncate(max_bytes);
            }
            String::from_utf8_lossy(&b).to_string()
        }
        Err(e) => {
            warn!(error = %e, "failed to read upstream error body");
            "<failed to read error body>".to_string()
        }
    }
}
