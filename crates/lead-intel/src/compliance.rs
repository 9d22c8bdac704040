/// Recalls, warning letters and inspection findings.
use chrono::NaiveDate;

use crate::error::AppError;
use crate::model::{ComplianceContext, LeadDraft, LeadType, PainPoint, PainPointKind, Severity};
use crate::normalize;
use crate::record::{ComplianceKind, ComplianceRecord, UNKNOWN};
use crate::rules::{self, first_match, Rule, TierOutcome};

const QUALITY_KEYWORDS: &[&str] = &[
    "cgmp",
    "contamination",
    "sterility",
    "impurit",
    "particulate",
    "dissolution",
    "potency",
    "nitrosamine",
    "stability",
];

/// `"Class II"` -> `"II"`, `"oai"` -> `"OAI"`.
fn class_token(classification: &str) -> String {
    classification
        .split_whitespace()
        .last()
        .unwrap_or_default()
        .to_ascii_uppercase()
}

fn recall_class(record: &ComplianceRecord, class: &str) -> bool {
    record.kind == ComplianceKind::Recall && class_token(&record.classification) == class
}

fn inspection(record: &ComplianceRecord, class: &str) -> bool {
    record.kind == ComplianceKind::InspectionFinding && class_token(&record.classification) == class
}

pub static TIER_LADDER: &[Rule<ComplianceRecord, TierOutcome>] = &[
    Rule {
        id: "recall_class_i",
        when: |r| recall_class(r, "I"),
        then: TierOutcome { base_score: 90, reason: "Class I recall" },
    },
    Rule {
        id: "warning_letter",
        when: |r| r.kind == ComplianceKind::WarningLetter,
        then: TierOutcome { base_score: 85, reason: "FDA warning letter issued" },
    },
    Rule {
        id: "inspection_oai",
        when: |r| inspection(r, "OAI"),
        then: TierOutcome { base_score: 75, reason: "Inspection classified Official Action Indicated" },
    },
    Rule {
        id: "recall_class_ii",
        when: |r| recall_class(r, "II"),
        then: TierOutcome { base_score: 70, reason: "Class II recall" },
    },
    Rule {
        id: "recall_class_iii",
        when: |r| recall_class(r, "III"),
        then: TierOutcome { base_score: 55, reason: "Class III recall" },
    },
    Rule {
        id: "inspection_vai",
        when: |r| inspection(r, "VAI"),
        then: TierOutcome { base_score: 55, reason: "Inspection classified Voluntary Action Indicated" },
    },
    Rule {
        id: "inspection_nai",
        when: |r| inspection(r, "NAI"),
        then: TierOutcome { base_score: 40, reason: "Inspection classified No Action Indicated" },
    },
    Rule {
        id: "baseline",
        when: |_| true,
        then: TierOutcome { base_score: 50, reason: "Compliance event on record" },
    },
];

pub fn is_quality_issue(text: &str) -> bool {
    let lower = text.to_lowercase();
    QUALITY_KEYWORDS.iter().any(|k| lower.contains(k))
}

fn pain_point(record: &ComplianceRecord) -> PainPoint {
    let class = class_token(&record.classification);
    match record.kind {
        ComplianceKind::Recall => {
            let severity = match class.as_str() {
                "I" => Severity::Critical,
                "II" => Severity::High,
                "III" => Severity::Medium,
                _ => Severity::Low,
            };
            PainPoint::new(
                PainPointKind::ProductRecall,
                severity,
                format!("{} recall: {}", record.classification, record.reason),
                "CAPA effectiveness review and recall strategy support",
            )
        }
        ComplianceKind::WarningLetter => PainPoint::new(
            PainPointKind::WarningLetter,
            Severity::Critical,
            format!("Warning letter: {}", record.classification),
            "Warning letter response and remediation roadmap",
        ),
        ComplianceKind::InspectionFinding => {
            let severity = match class.as_str() {
                "OAI" => Severity::High,
                "VAI" => Severity::Medium,
                _ => Severity::Low,
            };
            PainPoint::new(
                PainPointKind::InspectionObservations,
                severity,
                format!("Inspection outcome {}: {}", record.classification, record.reason),
                "Form 483 response and inspection readiness program",
            )
        }
    }
}

fn lead_type(kind: ComplianceKind) -> LeadType {
    match kind {
        ComplianceKind::Recall => LeadType::Recall,
        ComplianceKind::WarningLetter => LeadType::WarningLetter,
        ComplianceKind::InspectionFinding => LeadType::InspectionFinding,
    }
}

/// First sentence-ish chunk of a long product description.
fn short_product(record: &ComplianceRecord) -> String {
    if let Some(name) = record.product_names.iter().find(|n| n.as_str() != UNKNOWN) {
        return name.clone();
    }
    let description = record.product_description.trim();
    match description.char_indices().nth(80) {
        Some((idx, _)) => format!("{}…", &description[..idx]),
        None => description.to_string(),
    }
}

pub fn analyze(record: &ComplianceRecord, today: NaiveDate) -> Result<LeadDraft, AppError> {
    if record.reference.is_empty() {
        return Err(AppError::InvalidRecord(format!(
            "{:?} without reference from {}",
            record.kind, record.firm
        )));
    }
    let rule = first_match(TIER_LADDER, record).ok_or_else(|| {
        AppError::InvalidRecord(format!("no tier rule for {}", record.reference))
    })?;

    let days_since = record.event_date.map(|d| (today - d).num_days());
    let points = vec![pain_point(record)];
    let score = rules::clamp_score(
        u32::from(rule.then.base_score)
            + u32::from(rules::recency_bonus(days_since))
            + rules::pain_point_bonus(&points),
    );

    let mut area_texts = record.product_names.clone();
    area_texts.extend(record.pharm_classes.iter().cloned());
    area_texts.push(record.product_description.clone());
    let area = normalize::therapeutic_area(&area_texts);

    let quality_issue = is_quality_issue(&format!("{} {}", record.reason, record.classification));

    Ok(LeadDraft {
        id: record.reference.clone(),
        company: normalize::company_name(&record.firm),
        lead_type: lead_type(record.kind),
        score,
        therapeutic_area: area,
        product: short_product(record),
        indication: area.label().to_string(),
        urgency_reason: format!("{} ({})", rule.then.reason, record.reference),
        pain_points: points,
        application: None,
        trial: None,
        compliance: Some(ComplianceContext {
            reference: record.reference.clone(),
            classification: record.classification.clone(),
            status: record.status.clone(),
            product_description: record.product_description.clone(),
            reason: record.reason.clone(),
            event_date: record.event_date,
            issuing_office: record.issuing_office.clone(),
            quality_issue,
            rule: rule.id.to_string(),
        }),
        activity_date: record.event_date,
        company_boost: 0,
    })
}
