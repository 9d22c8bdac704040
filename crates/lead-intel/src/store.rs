/// The published lead snapshot and its read-side queries.
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::company::CompanyProfile;
use crate::error::AppError;
use crate::gateway::DataSources;
use crate::model::{Lead, LeadType, Priority, TherapeuticArea, TrialPhase};
use crate::normalize;
use crate::stats::{self, Statistics};

/// Counts of records that did not become leads in a pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildReport {
    /// Records rejected by analysis (e.g. missing identifier).
    pub skipped: usize,
    /// Trials that failed the inclusion filter.
    pub filtered: usize,
    pub duplicates: usize,
}

/// One complete, immutable generation result.
#[derive(Debug)]
pub struct Snapshot {
    leads: Vec<Lead>,
    index: HashMap<String, usize>,
    companies: BTreeMap<String, CompanyProfile>,
    statistics: Statistics,
    sources: DataSources,
    report: BuildReport,
    generated_at: DateTime<Utc>,
}

impl Snapshot {
    /// `leads` must already be in display order with unique ids.
    pub fn new(
        leads: Vec<Lead>,
        companies: BTreeMap<String, CompanyProfile>,
        statistics: Statistics,
        sources: DataSources,
        report: BuildReport,
        generated_at: DateTime<Utc>,
    ) -> Self {
        let index = leads
            .iter()
            .enumerate()
            .map(|(i, lead)| (lead.id.clone(), i))
            .collect();
        Self {
            leads,
            index,
            companies,
            statistics,
            sources,
            report,
            generated_at,
        }
    }

    pub fn empty(now: DateTime<Utc>) -> Self {
        let companies = BTreeMap::new();
        let statistics = stats::compute(&[], &companies, now);
        Self::new(
            Vec::new(),
            companies,
            statistics,
            DataSources::synthetic(),
            BuildReport::default(),
            now,
        )
    }

    pub fn leads(&self) -> &[Lead] {
        &self.leads
    }

    pub fn lead(&self, id: &str) -> Option<&Lead> {
        self.index
            .get(id)
            .or_else(|| self.index.get(&id.trim().to_uppercase()))
            .map(|&i| &self.leads[i])
    }

    /// Lookup by any spelling that normalizes to the company key.
    pub fn company(&self, name: &str) -> Option<&CompanyProfile> {
        self.companies.get(&normalize::company_name(name))
    }

    pub fn companies(&self) -> &BTreeMap<String, CompanyProfile> {
        &self.companies
    }

    pub fn statistics(&self) -> &Statistics {
        &self.statistics
    }

    pub fn sources(&self) -> DataSources {
        self.sources
    }

    pub fn report(&self) -> BuildReport {
        self.report
    }

    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    pub fn filter(&self, query: &LeadQuery) -> Vec<&Lead> {
        self.leads.iter().filter(|l| query.matches(l)).collect()
    }

    /// Case-insensitive substring match across names, reasons and identifiers.
    pub fn search(&self, term: &str, limit: usize) -> Vec<&Lead> {
        let needle = term.trim().to_lowercase();
        self.leads
            .iter()
            .filter(|lead| search_fields(lead).any(|f| f.to_lowercase().contains(&needle)))
            .take(limit)
            .collect()
    }
}

fn search_fields(lead: &Lead) -> impl Iterator<Item = &str> {
    [
        Some(lead.id.as_str()),
        Some(lead.company.as_str()),
        Some(lead.product.as_str()),
        Some(lead.indication.as_str()),
        Some(lead.urgency_reason.as_str()),
        lead.application_context
            .as_ref()
            .map(|a| a.generic_name.as_str()),
        lead.trial_context.as_ref().map(|t| t.title.as_str()),
        lead.compliance_context.as_ref().map(|c| c.reason.as_str()),
    ]
    .into_iter()
    .flatten()
}

/// Owner of the current snapshot. Readers clone the `Arc`; publishing is
/// a single pointer swap.
pub struct LeadStore {
    current: RwLock<Arc<Snapshot>>,
}

impl LeadStore {
    pub fn new(initial: Snapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(initial)),
        }
    }

    pub async fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&*self.current.read().await)
    }

    pub async fn publish(&self, snapshot: Arc<Snapshot>) {
        *self.current.write().await = snapshot;
    }
}

/// Raw `GET /api/leads` query string.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadFilter {
    pub priority: Option<String>,
    #[serde(rename = "type")]
    pub lead_type: Option<String>,
    pub therapeutic: Option<String>,
    pub biomarker: Option<String>,
    pub phase: Option<String>,
    pub submission_type: Option<String>,
    pub high_value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BiomarkerFilter {
    Any,
    None,
    Marker(String),
}

/// Validated filter; every present field must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeadQuery {
    pub priority: Option<Priority>,
    pub lead_type: Option<LeadType>,
    pub therapeutic: Option<TherapeuticArea>,
    pub biomarker: Option<BiomarkerFilter>,
    pub phase: Option<TrialPhase>,
    pub submission_type: Option<String>,
    pub high_value: Option<bool>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty() && *v != "all")
}

fn parse_bool(name: &str, raw: &str) -> Result<bool, AppError> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(AppError::BadRequest(format!("{name} must be true or false"))),
    }
}

fn parse_phase(raw: &str) -> Option<TrialPhase> {
    let wanted = raw.to_ascii_uppercase().replace([' ', '/', '|', '-'], "_");
    [
        TrialPhase::EarlyPhase1,
        TrialPhase::Phase1,
        TrialPhase::Phase1Phase2,
        TrialPhase::Phase2,
        TrialPhase::Phase2Phase3,
        TrialPhase::Phase3,
        TrialPhase::Phase4,
        TrialPhase::Na,
    ]
    .into_iter()
    .find(|p| p.as_str() == wanted)
}

impl LeadFilter {
    /// Validate values. Blank values and `all` mean "no filter".
    pub fn parse(&self) -> Result<LeadQuery, AppError> {
        let bad = |field: &str, value: &str| {
            AppError::BadRequest(format!("unknown {field}: {value}"))
        };

        let priority = present(&self.priority)
            .map(|v| Priority::parse(v).ok_or_else(|| bad("priority", v)))
            .transpose()?;
        let lead_type = present(&self.lead_type)
            .map(|v| LeadType::parse(v).ok_or_else(|| bad("type", v)))
            .transpose()?;
        let therapeutic = present(&self.therapeutic)
            .map(|v| TherapeuticArea::parse(v).ok_or_else(|| bad("therapeutic area", v)))
            .transpose()?;
        let phase = present(&self.phase)
            .map(|v| parse_phase(v).ok_or_else(|| bad("phase", v)))
            .transpose()?;
        let biomarker = present(&self.biomarker).map(|v| match v.to_ascii_lowercase().as_str() {
            "true" | "yes" | "any" => BiomarkerFilter::Any,
            "false" | "no" | "none" => BiomarkerFilter::None,
            _ => BiomarkerFilter::Marker(v.to_ascii_uppercase()),
        });
        let high_value = present(&self.high_value)
            .map(|v| parse_bool("highValue", v))
            .transpose()?;

        Ok(LeadQuery {
            priority,
            lead_type,
            therapeutic,
            biomarker,
            phase,
            submission_type: present(&self.submission_type).map(|v| v.to_ascii_uppercase()),
            high_value,
        })
    }
}

impl LeadQuery {
    pub fn matches(&self, lead: &Lead) -> bool {
        if self.priority.is_some_and(|p| p != lead.priority) {
            return false;
        }
        if self.lead_type.is_some_and(|t| t != lead.lead_type) {
            return false;
        }
        if self.therapeutic.is_some_and(|a| a != lead.therapeutic_area) {
            return false;
        }
        if self.phase.is_some_and(|p| lead.phase() != Some(p)) {
            return false;
        }
        if self.high_value.is_some_and(|hv| hv != lead.is_high_value()) {
            return false;
        }
        if let Some(wanted) = &self.submission_type {
            let actual = lead
                .application_context
                .as_ref()
                .map(|a| a.submission_type.as_str());
            if actual != Some(wanted.as_str()) {
                return false;
            }
        }
        if let Some(filter) = &self.biomarker {
            let biomarkers = lead.trial_context.as_ref().map(|t| &t.biomarkers);
            let hit = match filter {
                BiomarkerFilter::Any => biomarkers.is_some_and(|b| b.has_biomarkers()),
                BiomarkerFilter::None => !biomarkers.is_some_and(|b| b.has_biomarkers()),
                BiomarkerFilter::Marker(name) => biomarkers
                    .is_some_and(|b| b.markers.iter().any(|m| m.eq_ignore_ascii_case(name))),
            };
            if !hit {
                return false;
            }
        }
        true
    }
}
