/// Drug-application (drugs@FDA) analysis.
use chrono::NaiveDate;

use crate::error::AppError;
use crate::model::{
    ApplicationContext, LeadDraft, LeadType, PainPoint, PainPointKind, Severity,
};
use crate::normalize;
use crate::record::{ApplicationRecord, SubmissionRecord, UNKNOWN};
use crate::rules::{self, first_match, Rule, TierOutcome};

/// Facts about an application the tier ladder is evaluated against.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplicationSignals {
    pub status_code: String,
    pub priority_review: bool,
    pub breakthrough: bool,
    pub complete_response_cycles: usize,
    pub original_submissions: usize,
}

impl ApplicationSignals {
    fn approved(&self) -> bool {
        matches!(self.status_code.as_str(), "AP" | "TA" | "WD")
    }

    fn in_review(&self) -> bool {
        self.status_code == "FI"
    }
}

pub static TIER_LADDER: &[Rule<ApplicationSignals, TierOutcome>] = &[
    Rule {
        id: "complete_response_letter",
        when: |s| s.status_code == "CR",
        then: TierOutcome { base_score: 95, reason: "Complete Response Letter received" },
    },
    Rule {
        id: "refuse_to_file",
        when: |s| s.status_code == "RT",
        then: TierOutcome { base_score: 90, reason: "Refuse to File letter received" },
    },
    Rule {
        id: "expedited_review",
        when: |s| (s.breakthrough || s.priority_review) && !s.approved(),
        then: TierOutcome { base_score: 75, reason: "Expedited review in progress" },
    },
    Rule {
        id: "active_review",
        when: |s| s.in_review(),
        then: TierOutcome { base_score: 70, reason: "Application under active FDA review" },
    },
    Rule {
        id: "repeat_cycles",
        when: |s| s.complete_response_cycles >= 2 || s.original_submissions >= 2,
        then: TierOutcome { base_score: 55, reason: "Multiple submission cycles" },
    },
    Rule {
        id: "baseline",
        when: |_| true,
        then: TierOutcome { base_score: 50, reason: "Routine submission activity" },
    },
];

/// Most recent submission by status date; undated submissions sort oldest,
/// ties go to the later entry in the record.
fn latest_submission(submissions: &[SubmissionRecord]) -> Option<&SubmissionRecord> {
    submissions
        .iter()
        .enumerate()
        .max_by_key(|(idx, s)| (s.status_date, *idx))
        .map(|(_, s)| s)
}

fn application_type(number: &str) -> String {
    let prefix: String = number.chars().take_while(|c| c.is_ascii_alphabetic()).collect();
    match prefix.as_str() {
        "NDA" | "BLA" | "ANDA" => prefix,
        _ => "UNKNOWN".to_string(),
    }
}

pub fn signals(record: &ApplicationRecord) -> ApplicationSignals {
    let latest = latest_submission(&record.submissions);
    ApplicationSignals {
        status_code: latest.map(|s| s.status_code.clone()).unwrap_or_default(),
        priority_review: latest.is_some_and(|s| s.review_priority == "PRIORITY"),
        breakthrough: record
            .submissions
            .iter()
            .any(|s| s.class_description.to_lowercase().contains("breakthrough")),
        complete_response_cycles: record
            .submissions
            .iter()
            .filter(|s| s.status_code == "CR")
            .count(),
        original_submissions: record
            .submissions
            .iter()
            .filter(|s| s.submission_type == "ORIG")
            .count(),
    }
}

fn pain_points(
    record: &ApplicationRecord,
    signals: &ApplicationSignals,
    product: &str,
    status_date: Option<NaiveDate>,
) -> Vec<PainPoint> {
    let mut points = Vec::new();
    let on = status_date
        .map(|d| format!(" on {}", d.format("%Y-%m-%d")))
        .unwrap_or_default();

    match signals.status_code.as_str() {
        "CR" => points.push(PainPoint::new(
            PainPointKind::CompleteResponseLetter,
            Severity::Critical,
            format!("Complete Response Letter issued{on} for {product}"),
            "Deficiency gap analysis and Type A meeting preparation",
        )),
        "RT" => points.push(PainPoint::new(
            PainPointKind::RefuseToFile,
            Severity::Critical,
            format!("Refuse to File decision{on} for {product}"),
            "Submission completeness audit ahead of refiling",
        )),
        _ => {}
    }
    if signals.complete_response_cycles >= 2 {
        points.push(PainPoint::new(
            PainPointKind::RepeatReviewCycles,
            Severity::High,
            format!(
                "{} complete response cycles on record",
                signals.complete_response_cycles
            ),
            "Cross-cycle deficiency trend review",
        ));
    }
    if (signals.breakthrough || signals.priority_review) && !signals.approved() {
        points.push(PainPoint::new(
            PainPointKind::ExpeditedReview,
            Severity::Medium,
            "Compressed expedited review timeline",
            "Information-request response planning",
        ));
    }
    if signals.in_review() {
        points.push(PainPoint::new(
            PainPointKind::ActiveReview,
            Severity::Medium,
            format!("{product} is under active review"),
            "Labeling negotiation and advisory committee preparation",
        ));
    }
    let supplements = record
        .submissions
        .iter()
        .filter(|s| s.submission_type == "SUPPL")
        .count();
    if supplements >= 5 {
        points.push(PainPoint::new(
            PainPointKind::LifecycleManagement,
            Severity::Low,
            format!("{supplements} supplements filed for {product}"),
            "Lifecycle and post-approval change strategy",
        ));
    }
    points
}

/// Classify and score one application record as of `today`.
pub fn analyze(record: &ApplicationRecord, today: NaiveDate) -> Result<LeadDraft, AppError> {
    if record.application_number.is_empty() {
        return Err(AppError::InvalidRecord(
            "drug application without application_number".to_string(),
        ));
    }

    let signals = signals(record);
    let rule = first_match(TIER_LADDER, &signals).ok_or_else(|| {
        AppError::InvalidRecord(format!("no tier rule for {}", record.application_number))
    })?;

    let latest = latest_submission(&record.submissions);
    let status_date = latest.and_then(|s| s.status_date);
    let days_since = status_date.map(|d| (today - d).num_days());

    let product = if record.brand_name != UNKNOWN {
        record.brand_name.clone()
    } else {
        record.generic_name.clone()
    };

    let mut area_texts = vec![record.brand_name.clone(), record.generic_name.clone()];
    area_texts.extend(record.pharm_classes.iter().cloned());
    let area = normalize::therapeutic_area(&area_texts);

    let points = pain_points(record, &signals, &product, status_date);
    let raw = u32::from(rule.then.base_score)
        + u32::from(rules::recency_bonus(days_since))
        + rules::pain_point_bonus(&points);
    let score = rules::clamp_score(raw);

    let mut urgency_reason = format!("{} ({}", rule.then.reason, record.application_number);
    if let Some(days) = days_since {
        urgency_reason.push_str(&format!(", {days} days ago"));
    }
    urgency_reason.push(')');

    let indication = if record.pharm_classes.is_empty() {
        record.generic_name.clone()
    } else {
        record.pharm_classes.join("; ")
    };

    let context = ApplicationContext {
        application_number: record.application_number.clone(),
        application_type: application_type(&record.application_number),
        brand_name: record.brand_name.clone(),
        generic_name: record.generic_name.clone(),
        submission_type: latest
            .map(|s| s.submission_type.clone())
            .unwrap_or_else(|| UNKNOWN.to_uppercase()),
        status_code: signals.status_code.clone(),
        submission_status: rules::translate_status(&signals.status_code),
        status_date,
        review_priority: latest
            .map(|s| s.review_priority.clone())
            .unwrap_or_else(|| UNKNOWN.to_uppercase()),
        expedited: signals.breakthrough || signals.priority_review,
        complete_response_cycles: signals.complete_response_cycles,
        supplement_count: record
            .submissions
            .iter()
            .filter(|s| s.submission_type == "SUPPL")
            .count(),
        division: normalize::review_division(area).to_string(),
        days_since_activity: days_since,
        rule: rule.id.to_string(),
    };

    Ok(LeadDraft {
        id: record.application_number.clone(),
        company: normalize::company_name(&record.sponsor),
        lead_type: LeadType::DrugApplication,
        score,
        therapeutic_area: area,
        product,
        indication,
        urgency_reason,
        pain_points: points,
        application: Some(context),
        trial: None,
        compliance: None,
        activity_date: status_date,
        company_boost: 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Priority, TherapeuticArea};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()
    }

    fn submission(kind: &str, code: &str, days_ago: i64) -> SubmissionRecord {
        SubmissionRecord {
            submission_type: kind.to_string(),
            submission_number: "1".to_string(),
            status_code: code.to_string(),
            status_date: Some(today() - chrono::Duration::days(days_ago)),
            review_priority: "STANDARD".to_string(),
            class_description: String::new(),
        }
    }

    fn record(submissions: Vec<SubmissionRecord>) -> ApplicationRecord {
        ApplicationRecord {
            application_number: "NDA216789".to_string(),
            sponsor: "Nexavira Therapeutics, Inc.".to_string(),
            brand_name: "ZYNTERRA".to_string(),
            generic_name: "zanubrutinib".to_string(),
            pharm_classes: vec!["Kinase Inhibitor [EPC]".to_string()],
            submissions,
        }
    }

    #[test]
    fn recent_complete_response_is_critical() {
        let draft = analyze(
            &record(vec![submission("ORIG", "FI", 300), submission("ORIG", "CR", 10)]),
            today(),
        )
        .unwrap();
        assert_eq!(draft.priority(), Priority::Critical);
        assert!(draft.score >= 95);
        assert!(draft.urgency_reason.contains("Complete Response Letter"));
        assert_eq!(draft.company, "NEXAVIRA THERAPEUTICS");
        assert_eq!(draft.therapeutic_area, TherapeuticArea::Oncology);
        let ctx = draft.application.unwrap();
        assert_eq!(ctx.submission_status, "Complete Response Letter");
        assert_eq!(ctx.application_type, "NDA");
        assert_eq!(ctx.days_since_activity, Some(10));
        assert_eq!(ctx.rule, "complete_response_letter");
        assert_eq!(
            draft.pain_points[0].kind,
            PainPointKind::CompleteResponseLetter
        );
    }

    #[test]
    fn refuse_to_file_is_critical() {
        let draft = analyze(&record(vec![submission("ORIG", "RT", 45)]), today()).unwrap();
        assert_eq!(draft.priority(), Priority::Critical);
        assert_eq!(draft.application.unwrap().submission_status, "Refuse to File");
    }

    #[test]
    fn priority_review_outranks_active_review() {
        let mut sub = submission("ORIG", "FI", 60);
        sub.review_priority = "PRIORITY".to_string();
        let draft = analyze(&record(vec![sub]), today()).unwrap();
        assert_eq!(draft.application.as_ref().unwrap().rule, "expedited_review");
        assert_eq!(draft.priority(), Priority::High);
    }

    #[test]
    fn filed_application_is_active_review() {
        let draft = analyze(&record(vec![submission("ORIG", "FI", 60)]), today()).unwrap();
        assert_eq!(draft.application.as_ref().unwrap().rule, "active_review");
        assert_eq!(draft.priority(), Priority::High);
    }

    #[test]
    fn stale_approval_is_low() {
        let draft = analyze(&record(vec![submission("ORIG", "AP", 120)]), today()).unwrap();
        assert_eq!(draft.application.as_ref().unwrap().rule, "baseline");
        assert_eq!(draft.score, 50);
        assert_eq!(draft.priority(), Priority::Low);
    }

    #[test]
    fn repeated_cycles_are_medium() {
        let draft = analyze(
            &record(vec![
                submission("ORIG", "CR", 700),
                submission("ORIG", "CR", 400),
                submission("ORIG", "AP", 90),
            ]),
            today(),
        )
        .unwrap();
        assert_eq!(draft.application.as_ref().unwrap().rule, "repeat_cycles");
        assert!(draft
            .pain_points
            .iter()
            .any(|p| p.kind == PainPointKind::RepeatReviewCycles));
        assert_eq!(draft.priority(), Priority::Medium);
    }

    #[test]
    fn missing_nested_fields_use_defaults() {
        let bare = ApplicationRecord::from(fda_common::openfda::DrugsFdaResult {
            application_number: Some("BLA761000".to_string()),
            ..Default::default()
        });
        let draft = analyze(&bare, today()).unwrap();
        assert_eq!(draft.company, "UNKNOWN");
        assert_eq!(draft.product, UNKNOWN);
        assert!(draft.pain_points.is_empty());
        assert_eq!(draft.activity_date, None);
        let ctx = draft.application.unwrap();
        assert_eq!(ctx.application_type, "BLA");
        assert_eq!(ctx.submission_status, "");
    }

    #[test]
    fn missing_identifier_is_rejected() {
        let mut rec = record(vec![]);
        rec.application_number.clear();
        assert!(analyze(&rec, today()).is_err());
    }

    #[test]
    fn score_is_clamped() {
        let mut subs: Vec<SubmissionRecord> =
            (0..8).map(|d| submission("SUPPL", "AP", 500 + d)).collect();
        subs.push(submission("ORIG", "CR", 300));
        subs.push(submission("ORIG", "CR", 1));
        let draft = analyze(&record(subs), today()).unwrap();
        assert_eq!(draft.score, 100);
    }

    #[test]
    fn ladder_ends_with_catch_all() {
        let last = TIER_LADDER.last().unwrap();
        assert_eq!(last.id, "baseline");
        assert!((last.when)(&ApplicationSignals::default()));
    }
}
