/// Snapshot statistics, recomputed wholesale after every generation pass.
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::company::{CompanyProfile, CompanyRisk};
use crate::model::{Lead, LeadType, Priority};

const TOP_MARKERS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub total_leads: usize,
    pub total_companies: usize,
    pub average_score: f64,
    pub high_value_leads: usize,
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerCount {
    pub marker: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BiomarkerInsights {
    pub trials_with_biomarkers: usize,
    pub enrichment_strategies: BTreeMap<String, usize>,
    pub complexity: BTreeMap<String, usize>,
    pub top_markers: Vec<MarkerCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub overview: Overview,
    pub by_priority: BTreeMap<String, usize>,
    pub by_type: BTreeMap<String, usize>,
    pub by_phase: BTreeMap<String, usize>,
    pub by_submission_type: BTreeMap<String, usize>,
    pub therapeutic_distribution: BTreeMap<String, usize>,
    pub biomarker_insights: BiomarkerInsights,
    pub company_risk: BTreeMap<String, usize>,
    /// Lead activity per `YYYY-MM`.
    pub timing: BTreeMap<String, usize>,
    pub generated_at: DateTime<Utc>,
}

fn bump(map: &mut BTreeMap<String, usize>, key: &str) {
    *map.entry(key.to_string()).or_insert(0) += 1;
}

fn zeroed<'a>(keys: impl IntoIterator<Item = &'a str>) -> BTreeMap<String, usize> {
    keys.into_iter().map(|k| (k.to_string(), 0)).collect()
}

pub fn compute(
    leads: &[Lead],
    companies: &BTreeMap<String, CompanyProfile>,
    generated_at: DateTime<Utc>,
) -> Statistics {
    let mut by_priority = zeroed(Priority::ALL.iter().map(|p| p.as_str()));
    let mut by_type = zeroed(LeadType::ALL.iter().map(|t| t.as_str()));
    let mut by_phase = BTreeMap::new();
    let mut by_submission_type = BTreeMap::new();
    let mut therapeutic_distribution = BTreeMap::new();
    let mut timing = BTreeMap::new();

    let mut trials_with_biomarkers = 0;
    let mut enrichment_strategies = BTreeMap::new();
    let mut complexity = BTreeMap::new();
    let mut marker_counts: BTreeMap<String, usize> = BTreeMap::new();

    for lead in leads {
        bump(&mut by_priority, lead.priority.as_str());
        bump(&mut by_type, lead.lead_type.as_str());
        bump(&mut therapeutic_distribution, lead.therapeutic_area.as_str());
        if let Some(date) = lead.activity_date {
            bump(&mut timing, &date.format("%Y-%m").to_string());
        }
        if let Some(app) = &lead.application_context {
            bump(&mut by_submission_type, &app.submission_type);
        }
        if let Some(trial) = &lead.trial_context {
            bump(&mut by_phase, trial.phase.as_str());
            let biomarkers = &trial.biomarkers;
            if biomarkers.has_biomarkers() {
                trials_with_biomarkers += 1;
                bump(&mut enrichment_strategies, biomarkers.enrichment.as_str());
                bump(&mut complexity, biomarkers.complexity.as_str());
                for marker in &biomarkers.markers {
                    bump(&mut marker_counts, marker);
                }
            }
        }
    }

    let mut top_markers: Vec<MarkerCount> = marker_counts
        .into_iter()
        .map(|(marker, count)| MarkerCount { marker, count })
        .collect();
    top_markers.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.marker.cmp(&b.marker)));
    top_markers.truncate(TOP_MARKERS);

    let mut company_risk = zeroed(CompanyRisk::ALL.iter().map(|r| r.as_str()));
    for profile in companies.values() {
        bump(&mut company_risk, profile.risk.as_str());
    }

    let average_score = if leads.is_empty() {
        0.0
    } else {
        let total: f64 = leads.iter().map(|l| f64::from(l.score)).sum();
        (total / leads.len() as f64 * 10.0).round() / 10.0
    };
    let count = |p: Priority| by_priority.get(p.as_str()).copied().unwrap_or(0);
    let overview = Overview {
        total_leads: leads.len(),
        total_companies: companies.len(),
        average_score,
        high_value_leads: leads.iter().filter(|l| l.is_high_value()).count(),
        critical: count(Priority::Critical),
        high: count(Priority::High),
        medium: count(Priority::Medium),
        low: count(Priority::Low),
    };

    Statistics {
        overview,
        by_priority,
        by_type,
        by_phase,
        by_submission_type,
        therapeutic_distribution,
        biomarker_insights: BiomarkerInsights {
            trials_with_biomarkers,
            enrichment_strategies,
            complexity,
            top_markers,
        },
        company_risk,
        timing,
        generated_at,
    }
}
