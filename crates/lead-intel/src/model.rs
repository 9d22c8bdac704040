use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Source category a lead was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadType {
    DrugApplication,
    ClinicalTrial,
    WarningLetter,
    Recall,
    InspectionFinding,
}

impl LeadType {
    pub const ALL: [LeadType; 5] = [
        LeadType::DrugApplication,
        LeadType::ClinicalTrial,
        LeadType::WarningLetter,
        LeadType::Recall,
        LeadType::InspectionFinding,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LeadType::DrugApplication => "drug_application",
            LeadType::ClinicalTrial => "clinical_trial",
            LeadType::WarningLetter => "warning_letter",
            LeadType::Recall => "recall",
            LeadType::InspectionFinding => "inspection_finding",
        }
    }

    /// Accepts the wire name plus a few short aliases used by the dashboard.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "drug_application" | "application" | "nda" | "bla" => Some(LeadType::DrugApplication),
            "clinical_trial" | "trial" => Some(LeadType::ClinicalTrial),
            "warning_letter" => Some(LeadType::WarningLetter),
            "recall" => Some(LeadType::Recall),
            "inspection_finding" | "inspection" => Some(LeadType::InspectionFinding),
            _ => None,
        }
    }
}

/// Coarse urgency bucket used for sorting and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

impl Priority {
    pub const ALL: [Priority; 4] = [
        Priority::Critical,
        Priority::High,
        Priority::Medium,
        Priority::Low,
    ];

    /// The only way a priority is assigned: score bands from `rules::PRIORITY_BANDS`.
    pub fn from_score(score: u8) -> Self {
        crate::rules::PRIORITY_BANDS
            .iter()
            .find(|(floor, _)| score >= *floor)
            .map(|(_, priority)| *priority)
            .unwrap_or(Priority::Low)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Critical => "CRITICAL",
            Priority::High => "HIGH",
            Priority::Medium => "MEDIUM",
            Priority::Low => "LOW",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Priority::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(value.trim()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TherapeuticArea {
    Oncology,
    Cns,
    Cardiovascular,
    Metabolic,
    Immunology,
    InfectiousDisease,
    RareDisease,
    Other,
}

impl TherapeuticArea {
    pub fn as_str(&self) -> &'static str {
        match self {
            TherapeuticArea::Oncology => "ONCOLOGY",
            TherapeuticArea::Cns => "CNS",
            TherapeuticArea::Cardiovascular => "CARDIOVASCULAR",
            TherapeuticArea::Metabolic => "METABOLIC",
            TherapeuticArea::Immunology => "IMMUNOLOGY",
            TherapeuticArea::InfectiousDisease => "INFECTIOUS_DISEASE",
            TherapeuticArea::RareDisease => "RARE_DISEASE",
            TherapeuticArea::Other => "OTHER",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TherapeuticArea::Oncology => "oncology",
            TherapeuticArea::Cns => "CNS",
            TherapeuticArea::Cardiovascular => "cardiovascular",
            TherapeuticArea::Metabolic => "metabolic",
            TherapeuticArea::Immunology => "immunology",
            TherapeuticArea::InfectiousDisease => "infectious disease",
            TherapeuticArea::RareDisease => "rare disease",
            TherapeuticArea::Other => "specialty",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let wanted = value.trim().to_ascii_uppercase().replace([' ', '-'], "_");
        [
            TherapeuticArea::Oncology,
            TherapeuticArea::Cns,
            TherapeuticArea::Cardiovascular,
            TherapeuticArea::Metabolic,
            TherapeuticArea::Immunology,
            TherapeuticArea::InfectiousDisease,
            TherapeuticArea::RareDisease,
            TherapeuticArea::Other,
        ]
        .into_iter()
        .find(|area| area.as_str() == wanted)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    /// Lower is more severe.
    pub fn rank(&self) -> u8 {
        match self {
            Severity::Critical => 0,
            Severity::High => 1,
            Severity::Medium => 2,
            Severity::Low => 3,
        }
    }
}

/// Three-step scale used for complexity and recruitment difficulty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Level {
    Low,
    Medium,
    High,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Low => "LOW",
            Level::Medium => "MEDIUM",
            Level::High => "HIGH",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PressureLevel {
    Low,
    Moderate,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PainPointKind {
    CompleteResponseLetter,
    RefuseToFile,
    RepeatReviewCycles,
    ExpeditedReview,
    ActiveReview,
    LifecycleManagement,
    TrialHalted,
    Phase2Stagnation,
    RepeatedPhase2,
    DoseOptimization,
    FirstInHuman,
    PreRecruitment,
    BiomarkerMixedPopulation,
    RecruitmentChallenge,
    CompetitivePressure,
    ProductRecall,
    WarningLetter,
    InspectionObservations,
}

impl PainPointKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PainPointKind::CompleteResponseLetter => "complete_response_letter",
            PainPointKind::RefuseToFile => "refuse_to_file",
            PainPointKind::RepeatReviewCycles => "repeat_review_cycles",
            PainPointKind::ExpeditedReview => "expedited_review",
            PainPointKind::ActiveReview => "active_review",
            PainPointKind::LifecycleManagement => "lifecycle_management",
            PainPointKind::TrialHalted => "trial_halted",
            PainPointKind::Phase2Stagnation => "phase2_stagnation",
            PainPointKind::RepeatedPhase2 => "repeated_phase2",
            PainPointKind::DoseOptimization => "dose_optimization",
            PainPointKind::FirstInHuman => "first_in_human",
            PainPointKind::PreRecruitment => "pre_recruitment",
            PainPointKind::BiomarkerMixedPopulation => "biomarker_mixed_population",
            PainPointKind::RecruitmentChallenge => "recruitment_challenge",
            PainPointKind::CompetitivePressure => "competitive_pressure",
            PainPointKind::ProductRecall => "product_recall",
            PainPointKind::WarningLetter => "warning_letter",
            PainPointKind::InspectionObservations => "inspection_observations",
        }
    }
}

/// A detected sub-condition feeding the score and the outreach email.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PainPoint {
    pub kind: PainPointKind,
    pub severity: Severity,
    pub description: String,
    pub next_step: String,
}

impl PainPoint {
    pub fn new(
        kind: PainPointKind,
        severity: Severity,
        description: impl Into<String>,
        next_step: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            severity,
            description: description.into(),
            next_step: next_step.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationContext {
    pub application_number: String,
    /// NDA, BLA, ANDA, or UNKNOWN (from the application number prefix).
    pub application_type: String,
    pub brand_name: String,
    pub generic_name: String,
    /// ORIG or SUPPL for the most recent submission.
    pub submission_type: String,
    pub status_code: String,
    pub submission_status: String,
    pub status_date: Option<NaiveDate>,
    pub review_priority: String,
    pub expedited: bool,
    pub complete_response_cycles: usize,
    pub supplement_count: usize,
    pub division: String,
    pub days_since_activity: Option<i64>,
    /// Id of the ladder row that set the base score.
    pub rule: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrialPhase {
    EarlyPhase1,
    Phase1,
    Phase1Phase2,
    Phase2,
    Phase2Phase3,
    Phase3,
    Phase4,
    Na,
}

impl TrialPhase {
    /// Substring classification of a registry phase tag such as `PHASE1|PHASE2`.
    ///
    /// `EARLY_PHASE1` is tested first because it contains `PHASE1`.
    pub fn from_tag(tag: &str) -> Self {
        let tag = tag.to_ascii_uppercase().replace([' ', '/', ','], "|");
        if tag.contains("EARLY_PHASE1") {
            TrialPhase::EarlyPhase1
        } else if tag.contains("PHASE1") && tag.contains("PHASE2") {
            TrialPhase::Phase1Phase2
        } else if tag.contains("PHASE2") && tag.contains("PHASE3") {
            TrialPhase::Phase2Phase3
        } else if tag.contains("PHASE3") {
            TrialPhase::Phase3
        } else if tag.contains("PHASE2") {
            TrialPhase::Phase2
        } else if tag.contains("PHASE1") {
            TrialPhase::Phase1
        } else if tag.contains("PHASE4") {
            TrialPhase::Phase4
        } else {
            TrialPhase::Na
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TrialPhase::EarlyPhase1 => "EARLY_PHASE1",
            TrialPhase::Phase1 => "PHASE1",
            TrialPhase::Phase1Phase2 => "PHASE1_PHASE2",
            TrialPhase::Phase2 => "PHASE2",
            TrialPhase::Phase2Phase3 => "PHASE2_PHASE3",
            TrialPhase::Phase3 => "PHASE3",
            TrialPhase::Phase4 => "PHASE4",
            TrialPhase::Na => "NA",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TrialPhase::EarlyPhase1 => "Early Phase 1",
            TrialPhase::Phase1 => "Phase 1",
            TrialPhase::Phase1Phase2 => "Phase 1/2",
            TrialPhase::Phase2 => "Phase 2",
            TrialPhase::Phase2Phase3 => "Phase 2/3",
            TrialPhase::Phase3 => "Phase 3",
            TrialPhase::Phase4 => "Phase 4",
            TrialPhase::Na => "N/A",
        }
    }

    pub fn includes_phase2(&self) -> bool {
        matches!(
            self,
            TrialPhase::Phase1Phase2 | TrialPhase::Phase2 | TrialPhase::Phase2Phase3
        )
    }

    pub fn is_early(&self) -> bool {
        matches!(self, TrialPhase::EarlyPhase1 | TrialPhase::Phase1)
    }

    pub fn is_advanced(&self) -> bool {
        matches!(self, TrialPhase::Phase2Phase3 | TrialPhase::Phase3)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerCategory {
    Genetic,
    Protein,
    Genomic,
    LiquidBiopsy,
    Immunologic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrichmentStrategy {
    MixedPopulation,
    EnrichedOnly,
    AllComers,
    BiomarkerStratified,
    None,
}

impl EnrichmentStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnrichmentStrategy::MixedPopulation => "mixed_population",
            EnrichmentStrategy::EnrichedOnly => "enriched_only",
            EnrichmentStrategy::AllComers => "all_comers",
            EnrichmentStrategy::BiomarkerStratified => "biomarker_stratified",
            EnrichmentStrategy::None => "none",
        }
    }
}

/// Detected patient-selection approach of a trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BiomarkerStrategy {
    pub markers: Vec<String>,
    pub categories: Vec<MarkerCategory>,
    pub enrichment: EnrichmentStrategy,
    pub complexity: Level,
}

impl BiomarkerStrategy {
    pub fn has_biomarkers(&self) -> bool {
        !self.markers.is_empty() || !self.categories.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialContext {
    pub nct_id: String,
    pub title: String,
    pub phase: TrialPhase,
    pub phase_tag: String,
    pub status: String,
    pub start_date: Option<NaiveDate>,
    pub months_since_start: Option<i64>,
    pub conditions: Vec<String>,
    pub interventions: Vec<String>,
    pub enrollment: u32,
    pub location_count: usize,
    pub sponsor_class: String,
    pub high_value_sponsor: bool,
    pub biomarkers: BiomarkerStrategy,
    pub complexity_score: u8,
    pub urgency_score: u8,
    pub competitive_pressure: PressureLevel,
    pub recruitment_challenge: Level,
    pub new_trial_opportunity: bool,
    /// First matching inclusion condition.
    pub fit_reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceContext {
    /// Recall number, warning letter reference, or inspection id.
    pub reference: String,
    /// `Class I`..`Class III` for recalls, `OAI`/`VAI`/`NAI` for inspections.
    pub classification: String,
    pub status: String,
    pub product_description: String,
    pub reason: String,
    pub event_date: Option<NaiveDate>,
    pub issuing_office: String,
    pub quality_issue: bool,
    pub rule: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateKind {
    CompleteResponseLetter,
    RefuseToFile,
    ActiveReview,
    FirstInHuman,
    PreRecruitment,
    BiomarkerMixedPopulation,
    Generic,
}

/// Outreach email with its paragraphs kept separate so the dashboard can
/// render them individually.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Email {
    pub template: TemplateKind,
    pub subject: String,
    pub greeting: String,
    pub opening_hook: String,
    pub problem_statement: String,
    pub offering: String,
    pub analysis_bullets: Vec<String>,
    pub urgency_line: Option<String>,
    pub call_to_action: String,
    pub signature: String,
    pub deadline: Option<NaiveDate>,
}

impl Email {
    /// Body paragraphs in send order (greeting through signature).
    pub fn paragraphs(&self) -> Vec<String> {
        let mut out = vec![
            self.greeting.clone(),
            self.opening_hook.clone(),
            self.problem_statement.clone(),
            self.offering.clone(),
        ];
        if !self.analysis_bullets.is_empty() {
            out.push(
                self.analysis_bullets
                    .iter()
                    .map(|b| format!("• {b}"))
                    .collect::<Vec<_>>()
                    .join("\n"),
            );
        }
        if let Some(line) = &self.urgency_line {
            out.push(line.clone());
        }
        out.push(self.call_to_action.clone());
        out.push(self.signature.clone());
        out
    }

    pub fn body(&self) -> String {
        self.paragraphs().join("\n\n")
    }
}

/// Most severe pain point, first among equals.
pub fn primary_pain_point(points: &[PainPoint]) -> Option<&PainPoint> {
    points
        .iter()
        .enumerate()
        .min_by_key(|(idx, p)| (p.severity.rank(), *idx))
        .map(|(_, p)| p)
}

/// A classified record before company boosts and email generation.
#[derive(Debug, Clone, PartialEq)]
pub struct LeadDraft {
    pub id: String,
    pub company: String,
    pub lead_type: LeadType,
    pub score: u8,
    pub therapeutic_area: TherapeuticArea,
    pub product: String,
    pub indication: String,
    pub urgency_reason: String,
    pub pain_points: Vec<PainPoint>,
    pub application: Option<ApplicationContext>,
    pub trial: Option<TrialContext>,
    pub compliance: Option<ComplianceContext>,
    pub activity_date: Option<NaiveDate>,
    pub company_boost: u8,
}

impl LeadDraft {
    pub fn priority(&self) -> Priority {
        Priority::from_score(self.score)
    }

    pub fn primary_pain_point(&self) -> Option<&PainPoint> {
        primary_pain_point(&self.pain_points)
    }

    pub fn finish(self, email: Email, created_at: DateTime<Utc>) -> Lead {
        Lead {
            priority: self.priority(),
            id: self.id,
            company: self.company,
            lead_type: self.lead_type,
            score: self.score,
            therapeutic_area: self.therapeutic_area,
            product: self.product,
            indication: self.indication,
            urgency_reason: self.urgency_reason,
            pain_points: self.pain_points,
            application_context: self.application,
            trial_context: self.trial,
            compliance_context: self.compliance,
            email,
            company_boost: self.company_boost,
            activity_date: self.activity_date,
            created_at,
        }
    }
}

/// A scored, classified opportunity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: String,
    /// Normalized company name (uppercase, legal suffixes stripped).
    pub company: String,
    pub lead_type: LeadType,
    pub priority: Priority,
    /// 0–100; `priority == Priority::from_score(score)` always holds.
    pub score: u8,
    pub therapeutic_area: TherapeuticArea,
    pub product: String,
    pub indication: String,
    pub urgency_reason: String,
    pub pain_points: Vec<PainPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_context: Option<ApplicationContext>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trial_context: Option<TrialContext>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compliance_context: Option<ComplianceContext>,
    pub email: Email,
    pub company_boost: u8,
    pub activity_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl Lead {
    pub fn is_high_value(&self) -> bool {
        self.score >= 85
            || self
                .trial_context
                .as_ref()
                .is_some_and(|t| t.high_value_sponsor)
    }

    pub fn phase(&self) -> Option<TrialPhase> {
        self.trial_context.as_ref().map(|t| t.phase)
    }

    pub fn primary_pain_point(&self) -> Option<&PainPoint> {
        primary_pain_point(&self.pain_points)
    }
}
