/// Upstream fan-out with per-dataset fallback to the synthetic records.
use chrono::NaiveDate;
use fda_common::error::CommonError;
use fda_common::http::{DateWindow, RegistryClient};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::AppError;
use crate::record::{ApplicationRecord, ComplianceRecord, TrialRecord};
use crate::sample;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    Live,
    Synthetic,
}

/// Where each dataset of the current snapshot came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSources {
    pub applications: DataSource,
    pub trials: DataSource,
    pub recalls: DataSource,
    /// Warning letters and inspections have no public JSON registry.
    pub compliance_notices: DataSource,
}

impl DataSources {
    pub fn synthetic() -> Self {
        Self {
            applications: DataSource::Synthetic,
            trials: DataSource::Synthetic,
            recalls: DataSource::Synthetic,
            compliance_notices: DataSource::Synthetic,
        }
    }
}

/// Decoded records of one fetch pass.
#[derive(Debug, Clone)]
pub struct UpstreamBatch {
    pub applications: Vec<ApplicationRecord>,
    pub trials: Vec<TrialRecord>,
    pub compliance: Vec<ComplianceRecord>,
    pub sources: DataSources,
}

pub struct Gateway {
    client: Option<RegistryClient>,
    lookback_days: u32,
    fetch_limit: u32,
}

fn or_synthetic<T>(
    dataset: &str,
    result: Result<Vec<T>, CommonError>,
    fallback: impl FnOnce() -> Vec<T>,
) -> (Vec<T>, DataSource) {
    match result {
        Ok(records) => (records, DataSource::Live),
        Err(e) => {
            warn!(dataset, error = %e, "upstream fetch failed, using synthetic records");
            (fallback(), DataSource::Synthetic)
        }
    }
}

impl Gateway {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        if !config.live_data {
            return Ok(Self::offline());
        }
        Ok(Self {
            client: Some(RegistryClient::new(config.registry.clone())?),
            lookback_days: config.lookback_days,
            fetch_limit: config.fetch_limit,
        })
    }

    /// A gateway that never touches the network.
    pub fn offline() -> Self {
        Self {
            client: None,
            lookback_days: 0,
            fetch_limit: 0,
        }
    }

    pub fn is_live(&self) -> bool {
        self.client.is_some()
    }

    /// Fetch every dataset. Never fails: each dataset independently falls
    /// back to synthetic records.
    pub async fn fetch_all(&self, today: NaiveDate) -> UpstreamBatch {
        let Some(client) = &self.client else {
            info!("live data disabled, using synthetic records");
            return synthetic_batch(today);
        };

        let window = DateWindow::trailing(today, self.lookback_days);
        let (applications, recalls, studies) = futures::join!(
            client.drug_applications(window, self.fetch_limit),
            client.drug_enforcement(window, self.fetch_limit),
            client.studies(self.fetch_limit),
        );

        let (applications, applications_source) =
            or_synthetic("drug applications", applications, || sample::applications(today));
        let (recalls, recalls_source) =
            or_synthetic("recalls", recalls, || sample::recalls(today));
        let (studies, trials_source) =
            or_synthetic("clinical trials", studies, || sample::studies(today));

        let mut compliance: Vec<ComplianceRecord> =
            recalls.into_iter().map(ComplianceRecord::from).collect();
        compliance.extend(
            sample::compliance_notices(today)
                .into_iter()
                .map(ComplianceRecord::from),
        );

        UpstreamBatch {
            applications: applications.into_iter().map(ApplicationRecord::from).collect(),
            trials: studies.into_iter().map(TrialRecord::from).collect(),
            compliance,
            sources: DataSources {
                applications: applications_source,
                trials: trials_source,
                recalls: recalls_source,
                compliance_notices: DataSource::Synthetic,
            },
        }
    }
}

pub fn synthetic_batch(today: NaiveDate) -> UpstreamBatch {
    let mut compliance: Vec<ComplianceRecord> = sample::recalls(today)
        .into_iter()
        .map(ComplianceRecord::from)
        .collect();
    compliance.extend(
        sample::compliance_notices(today)
            .into_iter()
            .map(ComplianceRecord::from),
    );
    UpstreamBatch {
        applications: sample::applications(today)
            .into_iter()
            .map(ApplicationRecord::from)
            .collect(),
        trials: sample::studies(today)
            .into_iter()
            .map(TrialRecord::from)
            .collect(),
        compliance,
        sources: DataSources::synthetic(),
    }
}
