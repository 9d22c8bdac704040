/// Clinical-trial analysis: phase/stagnation signals, biomarker strategy,
/// derived scores and the inclusion filter.
use std::collections::HashMap;
use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;

use crate::biomarker;
use crate::error::AppError;
use crate::model::{
    BiomarkerStrategy, EnrichmentStrategy, LeadDraft, LeadType, Level, PainPoint, PainPointKind,
    PressureLevel, Severity, TherapeuticArea, TrialContext, TrialPhase,
};
use crate::normalize;
use crate::record::{TrialRecord, UNKNOWN};
use crate::rules::{self, first_match, Rule};

const HIGH_VALUE_SPONSORS: &[&str] = &[
    "PFIZER",
    "MERCK",
    "NOVARTIS",
    "ROCHE",
    "ASTRAZENECA",
    "BRISTOL-MYERS SQUIBB",
    "JOHNSON & JOHNSON",
    "JANSSEN",
    "ELI LILLY",
    "ABBVIE",
    "AMGEN",
    "GILEAD",
    "SANOFI",
    "GSK",
    "GLAXOSMITHKLINE",
    "BAYER",
    "TAKEDA",
    "BOEHRINGER INGELHEIM",
    "NOVO NORDISK",
    "REGENERON",
    "VERTEX",
    "BIOGEN",
    "DAIICHI SANKYO",
    "ASTELLAS",
];

const THERAPEUTIC_INTERVENTIONS: &[&str] = &["DRUG", "BIOLOGICAL", "COMBINATION_PRODUCT"];

/// Markers with crowded competitive landscapes in oncology.
const CROWDED_MARKERS: &[&str] = &["PD-L1", "PD-1", "EGFR", "HER2"];

static DOSE_FINDING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(dose[- ](finding|escalation|optimi[sz]ation|ranging|expansion)|maximum tolerated dose|MTD|RP2D|recommended phase 2 dose)\b",
    )
    .expect("valid regex")
});

static FIRST_IN_HUMAN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(first[- ]in[- ](human|man)|FIH)\b").expect("valid regex")
});

/// Phase-2 trial counts per (sponsor, lead condition) across one batch.
#[derive(Debug, Default)]
pub struct TrialBatchIndex {
    phase2_counts: HashMap<(String, String), usize>,
}

fn batch_key(record: &TrialRecord) -> Option<(String, String)> {
    let condition = record.conditions.first()?.trim().to_lowercase();
    if condition.is_empty() {
        return None;
    }
    Some((normalize::company_name(&record.sponsor), condition))
}

impl TrialBatchIndex {
    pub fn build(records: &[TrialRecord]) -> Self {
        let mut phase2_counts = HashMap::new();
        for record in records {
            if !TrialPhase::from_tag(&record.phase_tag).includes_phase2() {
                continue;
            }
            if let Some(key) = batch_key(record) {
                *phase2_counts.entry(key).or_insert(0) += 1;
            }
        }
        Self { phase2_counts }
    }

    /// Phase-2 trials in the batch sharing this record's sponsor and lead condition.
    pub fn phase2_siblings(&self, record: &TrialRecord) -> usize {
        batch_key(record)
            .and_then(|key| self.phase2_counts.get(&key).copied())
            .unwrap_or(0)
    }
}

/// Whole months from `start` to `today`; negative for future starts.
pub fn months_between(start: NaiveDate, today: NaiveDate) -> i64 {
    let mut months = i64::from(today.year() - start.year()) * 12 + i64::from(today.month())
        - i64::from(start.month());
    if today.day() < start.day() {
        months -= 1;
    }
    months
}

pub fn is_high_value_sponsor(sponsor: &str, sponsor_class: &str) -> bool {
    if sponsor_class != "INDUSTRY" {
        return false;
    }
    let normalized = normalize::company_name(sponsor);
    HIGH_VALUE_SPONSORS
        .iter()
        .any(|name| normalized == *name || normalized.starts_with(&format!("{name} ")))
}

fn is_halted(status: &str) -> bool {
    matches!(status, "SUSPENDED" | "TERMINATED")
}

fn passes_gate(record: &TrialRecord) -> bool {
    record.study_type == "INTERVENTIONAL"
        && record
            .interventions
            .iter()
            .any(|i| THERAPEUTIC_INTERVENTIONS.contains(&i.kind.as_str()))
}

fn recruitment_challenge(
    record: &TrialRecord,
    area: TherapeuticArea,
    biomarkers: &BiomarkerStrategy,
) -> Level {
    let selective = matches!(
        biomarkers.enrichment,
        EnrichmentStrategy::EnrichedOnly | EnrichmentStrategy::MixedPopulation
    );
    if (selective && record.location_count < 10)
        || area == TherapeuticArea::RareDisease
        || (record.enrollment >= 300 && record.location_count < 5)
    {
        Level::High
    } else if biomarkers.has_biomarkers() || record.enrollment >= 200 || record.location_count < 3
    {
        Level::Medium
    } else {
        Level::Low
    }
}

fn competitive_pressure(area: TherapeuticArea, biomarkers: &BiomarkerStrategy) -> PressureLevel {
    match area {
        TherapeuticArea::Oncology
            if biomarkers
                .markers
                .iter()
                .any(|m| CROWDED_MARKERS.contains(&m.as_str())) =>
        {
            PressureLevel::Critical
        }
        TherapeuticArea::Oncology | TherapeuticArea::Metabolic => PressureLevel::High,
        TherapeuticArea::Immunology | TherapeuticArea::Cns | TherapeuticArea::Cardiovascular => {
            PressureLevel::Moderate
        }
        _ => PressureLevel::Low,
    }
}

fn complexity_score(record: &TrialRecord, phase: TrialPhase, biomarkers: &BiomarkerStrategy) -> u8 {
    let mut score: u32 = 20;
    score += match biomarkers.complexity {
        Level::High => 30,
        Level::Medium => 15,
        Level::Low => 0,
    };
    if matches!(phase, TrialPhase::Phase1Phase2 | TrialPhase::Phase2Phase3) {
        score += 15;
    }
    if record.location_count >= 20 {
        score += 10;
    }
    if record.enrollment >= 300 {
        score += 10;
    }
    if record.interventions.len() >= 3 {
        score += 10;
    }
    if biomarkers.categories.len() >= 2 {
        score += 5;
    }
    rules::clamp_score(score)
}

fn urgency_weight(severity: Severity) -> u32 {
    match severity {
        Severity::Critical => 20,
        Severity::High => 12,
        Severity::Medium => 6,
        Severity::Low => 2,
    }
}

fn urgency_score(points: &[PainPoint], recent_start: bool, high_value: bool, halted: bool) -> u8 {
    let mut raw: u32 = 45 + points.iter().map(|p| urgency_weight(p.severity)).sum::<u32>();
    if recent_start {
        raw += 10;
    }
    if high_value {
        raw += 5;
    }
    let score = rules::clamp_score(raw);
    if halted {
        score.max(rules::CRITICAL_FLOOR)
    } else {
        score
    }
}

/// Facts the inclusion table is evaluated against.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrialSignals {
    pub critical_pain_point: bool,
    pub new_trial_opportunity: bool,
    pub phase2_stagnation: bool,
    pub urgency_score: u8,
    pub biomarker_complexity: Option<Level>,
    pub phase: Option<TrialPhase>,
    pub complexity_score: u8,
    pub competitive_pressure: Option<PressureLevel>,
    pub recruitment_challenge: Option<Level>,
    pub started_recently: bool,
    pub not_yet_recruiting: bool,
    pub halted: bool,
    pub high_value_sponsor: bool,
    pub repeated_phase2: bool,
    pub first_in_human: bool,
}

/// OR-ed inclusion conditions in reporting order. The first hit names the
/// fit reason; inclusion itself only needs any hit.
pub static INCLUSION: &[Rule<TrialSignals, &str>] = &[
    Rule {
        id: "critical_pain_point",
        when: |s| s.critical_pain_point,
        then: "Critical trial issue requiring immediate support",
    },
    Rule {
        id: "new_trial_opportunity",
        when: |s| s.new_trial_opportunity,
        then: "New trial entering start-up",
    },
    Rule {
        id: "phase2_stagnation",
        when: |s| s.phase2_stagnation,
        then: "Phase 2 program stagnating",
    },
    Rule {
        id: "high_urgency",
        when: |s| s.urgency_score >= 70,
        then: "High urgency score",
    },
    Rule {
        id: "complex_biomarker_strategy",
        when: |s| s.biomarker_complexity == Some(Level::High),
        then: "Complex biomarker strategy",
    },
    Rule {
        id: "early_phase",
        when: |s| s.phase.is_some_and(|p| p.is_early()),
        then: "Early-phase development",
    },
    Rule {
        id: "phase2_3",
        when: |s| s.phase == Some(TrialPhase::Phase2Phase3),
        then: "Seamless Phase 2/3 design",
    },
    Rule {
        id: "high_complexity",
        when: |s| s.complexity_score >= 60,
        then: "High operational complexity",
    },
    Rule {
        id: "critical_competition",
        when: |s| s.competitive_pressure == Some(PressureLevel::Critical),
        then: "Critical competitive pressure",
    },
    Rule {
        id: "recruitment_challenge",
        when: |s| s.recruitment_challenge == Some(Level::High),
        then: "High recruitment challenge",
    },
    Rule {
        id: "recent_start",
        when: |s| s.started_recently,
        then: "Started within the last 6 months",
    },
    Rule {
        id: "not_yet_recruiting",
        when: |s| s.not_yet_recruiting,
        then: "Not yet recruiting",
    },
    Rule {
        id: "halted",
        when: |s| s.halted,
        then: "Trial suspended or terminated",
    },
    Rule {
        id: "high_value_advanced",
        when: |s| s.high_value_sponsor && s.phase.is_some_and(|p| p.is_advanced()),
        then: "High-value sponsor in late-stage development",
    },
    Rule {
        id: "repeated_phase2",
        when: |s| s.repeated_phase2 || s.first_in_human,
        then: "Repeated Phase 2 or first-in-human program",
    },
];

/// Fit reason for an included trial, `None` when every condition fails.
pub fn fit_reason(signals: &TrialSignals) -> Option<&'static str> {
    first_match(INCLUSION, signals).map(|rule| rule.then)
}

struct Detected {
    points: Vec<PainPoint>,
    stagnation: bool,
    repeated_phase2: bool,
    first_in_human: bool,
}

fn detect_pain_points(
    record: &TrialRecord,
    phase: TrialPhase,
    months: Option<i64>,
    siblings: usize,
    biomarkers: &BiomarkerStrategy,
    recruitment: Level,
    pressure: PressureLevel,
) -> Detected {
    let mut points = Vec::new();
    let title_text = format!("{} {}", record.title, record.official_title);

    if is_halted(&record.status) {
        points.push(PainPoint::new(
            PainPointKind::TrialHalted,
            Severity::Critical,
            format!("Trial {} is {}", record.nct_id, record.status.to_lowercase()),
            "Root-cause assessment and program rescue plan",
        ));
    }

    let stagnation = match months {
        Some(m) if phase.includes_phase2() && m > 24 => {
            let severity = if m >= 30 { Severity::High } else { Severity::Medium };
            points.push(PainPoint::new(
                PainPointKind::Phase2Stagnation,
                severity,
                format!("{} running for {m} months without advancing", phase.label()),
                "Go/no-go decision support and Phase 3 readiness review",
            ));
            true
        }
        _ => false,
    };

    let repeated_phase2 = phase.includes_phase2() && siblings >= 2;
    if repeated_phase2 {
        points.push(PainPoint::new(
            PainPointKind::RepeatedPhase2,
            Severity::High,
            format!("{siblings} Phase 2 trials by the same sponsor in the same indication"),
            "Portfolio-level Phase 2 strategy review",
        ));
    }

    if DOSE_FINDING_RE.is_match(&title_text) || DOSE_FINDING_RE.is_match(&record.eligibility) {
        points.push(PainPoint::new(
            PainPointKind::DoseOptimization,
            Severity::Medium,
            "Dose-finding design with dose optimization exposure",
            "Exposure-response and dose justification package",
        ));
    }

    let first_in_human =
        phase == TrialPhase::EarlyPhase1 || FIRST_IN_HUMAN_RE.is_match(&title_text);
    if first_in_human {
        points.push(PainPoint::new(
            PainPointKind::FirstInHuman,
            Severity::High,
            "First-in-human study with starting-dose and safety-monitoring risk",
            "Starting dose rationale and sentinel dosing plan",
        ));
    }

    if record.status == "NOT_YET_RECRUITING" {
        points.push(PainPoint::new(
            PainPointKind::PreRecruitment,
            Severity::Medium,
            "Trial registered but not yet recruiting",
            "Site activation and enrollment forecasting",
        ));
    }

    if biomarkers.enrichment == EnrichmentStrategy::MixedPopulation {
        points.push(PainPoint::new(
            PainPointKind::BiomarkerMixedPopulation,
            Severity::High,
            format!(
                "Mixed biomarker-positive and negative population ({})",
                if biomarkers.markers.is_empty() {
                    "unnamed markers".to_string()
                } else {
                    biomarkers.markers.join(", ")
                }
            ),
            "Subgroup analysis plan and companion diagnostic strategy",
        ));
    }

    if recruitment == Level::High {
        points.push(PainPoint::new(
            PainPointKind::RecruitmentChallenge,
            Severity::Medium,
            format!(
                "Enrolling {} participants across {} sites",
                record.enrollment, record.location_count
            ),
            "Site footprint and eligibility feasibility review",
        ));
    }

    if matches!(pressure, PressureLevel::High | PressureLevel::Critical) {
        points.push(PainPoint::new(
            PainPointKind::CompetitivePressure,
            Severity::Low,
            "Crowded competitive landscape in this indication",
            "Differentiation and target product profile review",
        ));
    }

    Detected {
        points,
        stagnation,
        repeated_phase2,
        first_in_human,
    }
}

/// Analyze one trial as of `today`. `Ok(None)` means the trial did not pass
/// the inclusion filter.
pub fn analyze(
    record: &TrialRecord,
    index: &TrialBatchIndex,
    today: NaiveDate,
) -> Result<Option<LeadDraft>, AppError> {
    if record.nct_id.is_empty() {
        return Err(AppError::InvalidRecord("trial without nct_id".to_string()));
    }
    if !passes_gate(record) {
        return Ok(None);
    }

    let phase = TrialPhase::from_tag(&record.phase_tag);
    let months = record.start_date.map(|start| months_between(start, today));
    let started_recently = months.is_some_and(|m| (0..=6).contains(&m));
    let halted = is_halted(&record.status);
    let not_yet_recruiting = record.status == "NOT_YET_RECRUITING";

    let mut area_texts: Vec<String> = record.conditions.clone();
    area_texts.push(record.title.clone());
    area_texts.extend(record.keywords.iter().cloned());
    area_texts.extend(record.interventions.iter().map(|i| i.name.clone()));
    let area = normalize::therapeutic_area(&area_texts);

    let biomarker_text = format!(
        "{} {} {} {}",
        record.title,
        record.official_title,
        record.keywords.join(" "),
        record.eligibility
    );
    let biomarkers = biomarker::detect(&biomarker_text);

    let high_value = is_high_value_sponsor(&record.sponsor, &record.sponsor_class);
    let recruitment = recruitment_challenge(record, area, &biomarkers);
    let pressure = competitive_pressure(area, &biomarkers);
    let complexity = complexity_score(record, phase, &biomarkers);

    let detected = detect_pain_points(
        record,
        phase,
        months,
        index.phase2_siblings(record),
        &biomarkers,
        recruitment,
        pressure,
    );
    let urgency = urgency_score(&detected.points, started_recently, high_value, halted);
    let new_trial_opportunity =
        not_yet_recruiting || started_recently || months.is_some_and(|m| m < 0);

    let signals = TrialSignals {
        critical_pain_point: detected
            .points
            .iter()
            .any(|p| p.severity == Severity::Critical),
        new_trial_opportunity,
        phase2_stagnation: detected.stagnation,
        urgency_score: urgency,
        biomarker_complexity: Some(biomarkers.complexity),
        phase: Some(phase),
        complexity_score: complexity,
        competitive_pressure: Some(pressure),
        recruitment_challenge: Some(recruitment),
        started_recently,
        not_yet_recruiting,
        halted,
        high_value_sponsor: high_value,
        repeated_phase2: detected.repeated_phase2,
        first_in_human: detected.first_in_human,
    };
    let Some(reason) = fit_reason(&signals) else {
        return Ok(None);
    };

    let product = record
        .interventions
        .iter()
        .find(|i| THERAPEUTIC_INTERVENTIONS.contains(&i.kind.as_str()))
        .map(|i| i.name.clone())
        .unwrap_or_else(|| UNKNOWN.to_string());
    let indication = if record.conditions.is_empty() {
        UNKNOWN.to_string()
    } else {
        record.conditions.join(", ")
    };

    let mut draft = LeadDraft {
        id: record.nct_id.clone(),
        company: normalize::company_name(&record.sponsor),
        lead_type: LeadType::ClinicalTrial,
        score: urgency,
        therapeutic_area: area,
        product,
        indication,
        urgency_reason: String::new(),
        pain_points: detected.points,
        application: None,
        trial: Some(TrialContext {
            nct_id: record.nct_id.clone(),
            title: record.title.clone(),
            phase,
            phase_tag: record.phase_tag.clone(),
            status: record.status.clone(),
            start_date: record.start_date,
            months_since_start: months,
            conditions: record.conditions.clone(),
            interventions: record.interventions.iter().map(|i| i.name.clone()).collect(),
            enrollment: record.enrollment,
            location_count: record.location_count,
            sponsor_class: record.sponsor_class.clone(),
            high_value_sponsor: high_value,
            biomarkers,
            complexity_score: complexity,
            urgency_score: urgency,
            competitive_pressure: pressure,
            recruitment_challenge: recruitment,
            new_trial_opportunity,
            fit_reason: reason.to_string(),
        }),
        compliance: None,
        activity_date: record.last_update.or(record.start_date),
        company_boost: 0,
    };
    draft.urgency_reason = match draft.primary_pain_point() {
        Some(point) => format!("{} ({})", point.description, record.nct_id),
        None => format!("{reason} ({})", record.nct_id),
    };
    Ok(Some(draft))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Priority;
    use crate::record::InterventionRecord;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()
    }

    fn trial(phase_tag: &str, status: &str, months_ago: u32) -> TrialRecord {
        TrialRecord {
            nct_id: "NCT01234567".to_string(),
            title: "Study of Compound X in Adults With Chronic Kidney Disease".to_string(),
            official_title: String::new(),
            status: status.to_string(),
            start_date: today().checked_sub_months(chrono::Months::new(months_ago)),
            last_update: None,
            sponsor: "Acme Biopharma Inc.".to_string(),
            sponsor_class: "INDUSTRY".to_string(),
            study_type: "INTERVENTIONAL".to_string(),
            phase_tag: phase_tag.to_string(),
            enrollment: 120,
            interventions: vec![InterventionRecord {
                kind: "DRUG".to_string(),
                name: "Compound X".to_string(),
            }],
            conditions: vec!["Chronic Kidney Disease".to_string()],
            keywords: Vec::new(),
            eligibility: "Adults with eGFR between 25 and 60.".to_string(),
            location_count: 12,
        }
    }

    #[test]
    fn months_between_counts_whole_months() {
        let start = NaiveDate::from_ymd_opt(2022, 1, 15).unwrap();
        assert_eq!(months_between(start, NaiveDate::from_ymd_opt(2024, 7, 15).unwrap()), 30);
        assert_eq!(months_between(start, NaiveDate::from_ymd_opt(2024, 7, 14).unwrap()), 29);
        assert_eq!(months_between(start, NaiveDate::from_ymd_opt(2021, 12, 15).unwrap()), -1);
    }

    #[test]
    fn dose_finding_language_in_eligibility_counts() {
        let has_dose_point = |record: &TrialRecord| {
            let index = TrialBatchIndex::build(std::slice::from_ref(record));
            analyze(record, &index, today())
                .unwrap()
                .expect("early phase is included")
                .pain_points
                .iter()
                .any(|p| p.kind == PainPointKind::DoseOptimization)
        };

        let plain = trial("PHASE1", "RECRUITING", 10);
        assert!(!has_dose_point(&plain));

        let mut escalation = plain.clone();
        escalation.eligibility =
            "Participants join the dose-escalation cohort until the RP2D is established.".into();
        assert!(has_dose_point(&escalation));
    }

    #[test]
    fn stagnant_phase2_is_included() {
        let record = trial("PHASE2", "RECRUITING", 30);
        let index = TrialBatchIndex::build(std::slice::from_ref(&record));
        let draft = analyze(&record, &index, today()).unwrap().expect("included");
        let stagnation = draft
            .pain_points
            .iter()
            .find(|p| p.kind == PainPointKind::Phase2Stagnation)
            .expect("stagnation detected");
        assert_eq!(stagnation.severity, Severity::High);
        let ctx = draft.trial.as_ref().unwrap();
        assert_eq!(ctx.months_since_start, Some(30));
        assert_eq!(ctx.fit_reason, "Phase 2 program stagnating");
    }

    #[test]
    fn shorter_stagnation_is_medium() {
        let record = trial("PHASE2", "ACTIVE_NOT_RECRUITING", 26);
        let draft = analyze(&record, &TrialBatchIndex::default(), today())
            .unwrap()
            .expect("included");
        let stagnation = draft
            .pain_points
            .iter()
            .find(|p| p.kind == PainPointKind::Phase2Stagnation)
            .unwrap();
        assert_eq!(stagnation.severity, Severity::Medium);
    }

    #[test]
    fn halted_trial_is_critical() {
        let record = trial("PHASE3", "TERMINATED", 18);
        let draft = analyze(&record, &TrialBatchIndex::default(), today())
            .unwrap()
            .expect("included");
        assert!(draft.score >= 85);
        assert_eq!(draft.priority(), Priority::Critical);
        assert_eq!(
            draft.trial.unwrap().fit_reason,
            "Critical trial issue requiring immediate support"
        );
    }

    #[test]
    fn unremarkable_phase3_is_excluded() {
        let record = trial("PHASE3", "RECRUITING", 14);
        assert!(analyze(&record, &TrialBatchIndex::default(), today())
            .unwrap()
            .is_none());
    }

    #[test]
    fn non_drug_or_observational_trials_fail_the_gate() {
        let mut behavioral = trial("PHASE1", "RECRUITING", 2);
        behavioral.interventions[0].kind = "BEHAVIORAL".to_string();
        assert!(analyze(&behavioral, &TrialBatchIndex::default(), today())
            .unwrap()
            .is_none());

        let mut observational = trial("PHASE1", "RECRUITING", 2);
        observational.study_type = "OBSERVATIONAL".to_string();
        assert!(analyze(&observational, &TrialBatchIndex::default(), today())
            .unwrap()
            .is_none());
    }

    #[test]
    fn repeated_phase2_counts_same_sponsor_and_condition() {
        let first = trial("PHASE2", "RECRUITING", 12);
        let mut second = trial("PHASE1|PHASE2", "RECRUITING", 3);
        second.nct_id = "NCT07654321".to_string();
        second.sponsor = "ACME BIOPHARMA".to_string();
        let mut other = trial("PHASE2", "RECRUITING", 3);
        other.conditions = vec!["Gout".to_string()];

        let batch = vec![first.clone(), second, other];
        let index = TrialBatchIndex::build(&batch);
        assert_eq!(index.phase2_siblings(&first), 2);
        let draft = analyze(&first, &index, today()).unwrap().expect("included");
        assert!(draft
            .pain_points
            .iter()
            .any(|p| p.kind == PainPointKind::RepeatedPhase2));
    }

    #[test]
    fn first_in_human_not_yet_recruiting() {
        let mut record = trial("EARLY_PHASE1", "NOT_YET_RECRUITING", 0);
        record.title = "A First-in-Human Dose Escalation Study of NX-101".to_string();
        record.start_date = Some(today() + chrono::Duration::days(45));
        let draft = analyze(&record, &TrialBatchIndex::default(), today())
            .unwrap()
            .expect("included");
        let kinds: Vec<PainPointKind> = draft.pain_points.iter().map(|p| p.kind).collect();
        assert!(kinds.contains(&PainPointKind::FirstInHuman));
        assert!(kinds.contains(&PainPointKind::PreRecruitment));
        assert!(kinds.contains(&PainPointKind::DoseOptimization));
        let ctx = draft.trial.unwrap();
        assert!(ctx.new_trial_opportunity);
        assert_eq!(ctx.fit_reason, "New trial entering start-up");
    }

    #[test]
    fn crowded_oncology_markers_are_critical_pressure() {
        let mut record = trial("PHASE3", "RECRUITING", 14);
        record.conditions = vec!["Non-Small Cell Lung Cancer".to_string()];
        record.eligibility = "EGFR mutation confirmed by central testing.".to_string();
        let draft = analyze(&record, &TrialBatchIndex::default(), today())
            .unwrap()
            .expect("included");
        let ctx = draft.trial.unwrap();
        assert_eq!(ctx.competitive_pressure, PressureLevel::Critical);
        assert_eq!(ctx.fit_reason, "Critical competitive pressure");
    }

    #[test]
    fn high_value_sponsor_requires_industry_class() {
        assert!(is_high_value_sponsor("Pfizer Inc.", "INDUSTRY"));
        assert!(is_high_value_sponsor("Merck Sharp & Dohme LLC", "INDUSTRY"));
        assert!(!is_high_value_sponsor("Pfizer Inc.", "OTHER"));
        assert!(!is_high_value_sponsor("Pfizerish Labs", "INDUSTRY"));
    }

    #[test]
    fn missing_identifier_is_rejected() {
        let mut record = trial("PHASE2", "RECRUITING", 30);
        record.nct_id.clear();
        assert!(analyze(&record, &TrialBatchIndex::default(), today()).is_err());
    }

    #[test]
    fn sparse_study_never_panics() {
        let mut record = TrialRecord::from(fda_common::clinicaltrials::Study::default());
        record.nct_id = "NCT00000000".to_string();
        assert!(analyze(&record, &TrialBatchIndex::default(), today())
            .unwrap()
            .is_none());
    }

    fn one_hot() -> Vec<TrialSignals> {
        let base = TrialSignals::default;
        vec![
            TrialSignals { critical_pain_point: true, ..base() },
            TrialSignals { new_trial_opportunity: true, ..base() },
            TrialSignals { phase2_stagnation: true, ..base() },
            TrialSignals { urgency_score: 70, ..base() },
            TrialSignals { biomarker_complexity: Some(Level::High), ..base() },
            TrialSignals { phase: Some(TrialPhase::Phase1), ..base() },
            TrialSignals { phase: Some(TrialPhase::Phase2Phase3), ..base() },
            TrialSignals { complexity_score: 60, ..base() },
            TrialSignals { competitive_pressure: Some(PressureLevel::Critical), ..base() },
            TrialSignals { recruitment_challenge: Some(Level::High), ..base() },
            TrialSignals { started_recently: true, ..base() },
            TrialSignals { not_yet_recruiting: true, ..base() },
            TrialSignals { halted: true, ..base() },
            TrialSignals {
                high_value_sponsor: true,
                phase: Some(TrialPhase::Phase3),
                ..base()
            },
            TrialSignals { repeated_phase2: true, ..base() },
        ]
    }

    #[test]
    fn every_row_includes_on_its_own() {
        assert_eq!(INCLUSION.len(), 15);
        assert!(fit_reason(&TrialSignals::default()).is_none());
        for signals in one_hot() {
            assert!(fit_reason(&signals).is_some(), "{signals:?} should be included");
        }
    }

    #[test]
    fn adding_conditions_never_excludes() {
        let rows = one_hot();
        for included in &rows {
            for extra in &rows {
                let merged = TrialSignals {
                    critical_pain_point: included.critical_pain_point || extra.critical_pain_point,
                    new_trial_opportunity: included.new_trial_opportunity
                        || extra.new_trial_opportunity,
                    phase2_stagnation: included.phase2_stagnation || extra.phase2_stagnation,
                    urgency_score: included.urgency_score.max(extra.urgency_score),
                    biomarker_complexity: included.biomarker_complexity.or(extra.biomarker_complexity),
                    phase: included.phase.or(extra.phase),
                    complexity_score: included.complexity_score.max(extra.complexity_score),
                    competitive_pressure: included.competitive_pressure.or(extra.competitive_pressure),
                    recruitment_challenge: included
                        .recruitment_challenge
                        .or(extra.recruitment_challenge),
                    started_recently: included.started_recently || extra.started_recently,
                    not_yet_recruiting: included.not_yet_recruiting || extra.not_yet_recruiting,
                    halted: included.halted || extra.halted,
                    high_value_sponsor: included.high_value_sponsor || extra.high_value_sponsor,
                    repeated_phase2: included.repeated_phase2 || extra.repeated_phase2,
                    first_in_human: included.first_in_human || extra.first_in_human,
                };
                assert!(fit_reason(&merged).is_some());
            }
        }
    }
}
