/// Company buckets, the post-hoc score boost and company profiles.
use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::model::{Lead, LeadDraft, LeadType, Priority, TherapeuticArea};
use crate::normalize;
use crate::rules;

const TOUCHPOINT_BOOST: u8 = 3;
const MAX_TOUCHPOINT_BOOST: u8 = 9;
const URGENT_BOOST: u8 = 5;

/// Per-company aggregation of one generation pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub name: String,
    pub leads: BTreeMap<LeadType, Vec<String>>,
    pub therapeutic_areas: BTreeSet<TherapeuticArea>,
    pub has_urgent_issues: bool,
    pub has_quality_issues: bool,
    pub has_compliance_issues: bool,
    pub touchpoints: usize,
}

impl Company {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    fn add(&mut self, draft: &LeadDraft) {
        self.leads
            .entry(draft.lead_type)
            .or_default()
            .push(draft.id.clone());
        self.therapeutic_areas.insert(draft.therapeutic_area);
        self.touchpoints += 1;
        if draft.priority() == Priority::Critical {
            self.has_urgent_issues = true;
        }
        let compliance = matches!(
            draft.lead_type,
            LeadType::WarningLetter | LeadType::Recall | LeadType::InspectionFinding
        );
        if compliance {
            self.has_compliance_issues = true;
        }
        if draft.lead_type == LeadType::Recall
            || draft.compliance.as_ref().is_some_and(|c| c.quality_issue)
        {
            self.has_quality_issues = true;
        }
    }

    /// Boost earned by this company's non-critical leads.
    pub fn boost(&self) -> u8 {
        let extra = self.touchpoints.saturating_sub(1).min(usize::from(u8::MAX)) as u8;
        let touch = extra.saturating_mul(TOUCHPOINT_BOOST).min(MAX_TOUCHPOINT_BOOST);
        touch + if self.has_urgent_issues { URGENT_BOOST } else { 0 }
    }
}

/// Bucket drafts by normalized company name. Flags reflect pre-boost priorities.
pub fn aggregate(drafts: &[LeadDraft]) -> BTreeMap<String, Company> {
    let mut companies: BTreeMap<String, Company> = BTreeMap::new();
    for draft in drafts {
        companies
            .entry(draft.company.clone())
            .or_insert_with(|| Company::new(&draft.company))
            .add(draft);
    }
    companies
}

/// Apply the company boost once. Critical leads are left alone; everything
/// else is re-clamped so priority follows the boosted score.
pub fn apply_boosts(drafts: &mut [LeadDraft], companies: &BTreeMap<String, Company>) {
    for draft in drafts.iter_mut() {
        if draft.priority() == Priority::Critical {
            continue;
        }
        let Some(company) = companies.get(&draft.company) else {
            continue;
        };
        let boost = company.boost();
        if boost == 0 {
            continue;
        }
        draft.score = rules::clamp_score(u32::from(draft.score) + u32::from(boost));
        draft.company_boost = boost;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompanyRisk {
    High,
    Elevated,
    Moderate,
    Low,
}

impl CompanyRisk {
    pub const ALL: [CompanyRisk; 4] = [
        CompanyRisk::High,
        CompanyRisk::Elevated,
        CompanyRisk::Moderate,
        CompanyRisk::Low,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CompanyRisk::High => "HIGH",
            CompanyRisk::Elevated => "ELEVATED",
            CompanyRisk::Moderate => "MODERATE",
            CompanyRisk::Low => "LOW",
        }
    }

    fn approach(&self) -> &'static str {
        match self {
            CompanyRisk::High => {
                "Executive-level outreach within 48 hours with a remediation-focused proposal"
            }
            CompanyRisk::Elevated => {
                "Targeted outreach to the functional lead this week referencing the critical issue"
            }
            CompanyRisk::Moderate => {
                "Consultative introduction offering a program assessment across active touchpoints"
            }
            CompanyRisk::Low => "Add to nurture sequence and monitor for new regulatory activity",
        }
    }
}

pub fn assess_risk(company: &Company, leads: &[&Lead]) -> CompanyRisk {
    let any_high = leads
        .iter()
        .any(|l| matches!(l.priority, Priority::Critical | Priority::High));
    if company.has_urgent_issues && (company.has_compliance_issues || company.touchpoints >= 3) {
        CompanyRisk::High
    } else if company.has_urgent_issues || company.has_compliance_issues {
        CompanyRisk::Elevated
    } else if company.touchpoints >= 2 || any_high {
        CompanyRisk::Moderate
    } else {
        CompanyRisk::Low
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Opportunity {
    pub id: String,
    pub lead_type: LeadType,
    pub priority: Priority,
    pub score: u8,
    pub product: String,
    pub urgency_reason: String,
}

/// Company view served by `GET /api/companies/{name}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyProfile {
    pub display_name: String,
    #[serde(flatten)]
    pub company: Company,
    pub risk: CompanyRisk,
    pub recommended_approach: String,
    pub average_score: f64,
    pub opportunities: Vec<Opportunity>,
}

impl CompanyProfile {
    /// `leads` must be this company's leads.
    pub fn build(company: Company, leads: &[&Lead]) -> Self {
        let risk = assess_risk(&company, leads);
        let mut opportunities: Vec<Opportunity> = leads
            .iter()
            .map(|l| Opportunity {
                id: l.id.clone(),
                lead_type: l.lead_type,
                priority: l.priority,
                score: l.score,
                product: l.product.clone(),
                urgency_reason: l.urgency_reason.clone(),
            })
            .collect();
        opportunities.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.id.cmp(&b.id)));

        let average_score = if leads.is_empty() {
            0.0
        } else {
            leads.iter().map(|l| f64::from(l.score)).sum::<f64>() / leads.len() as f64
        };

        Self {
            display_name: normalize::display_name(&company.name),
            company,
            risk,
            recommended_approach: risk.approach().to_string(),
            average_score,
            opportunities,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ComplianceContext, Email, TemplateKind};
    use chrono::{TimeZone, Utc};

    fn draft(id: &str, company: &str, lead_type: LeadType, score: u8) -> LeadDraft {
        LeadDraft {
            id: id.into(),
            company: company.into(),
            lead_type,
            score,
            therapeutic_area: TherapeuticArea::Oncology,
            product: "P".into(),
            indication: "I".into(),
            urgency_reason: "r".into(),
            pain_points: Vec::new(),
            application: None,
            trial: None,
            compliance: None,
            activity_date: None,
            company_boost: 0,
        }
    }

    fn email() -> Email {
        Email {
            template: TemplateKind::Generic,
            subject: String::new(),
            greeting: String::new(),
            opening_hook: String::new(),
            problem_statement: String::new(),
            offering: String::new(),
            analysis_bullets: Vec::new(),
            urgency_line: None,
            call_to_action: String::new(),
            signature: String::new(),
            deadline: None,
        }
    }

    #[test]
    fn aggregation_sets_flags_and_touchpoints() {
        let mut recall = draft("D-1", "ACME", LeadType::Recall, 73);
        recall.compliance = Some(ComplianceContext {
            reference: "D-1".into(),
            classification: "Class II".into(),
            status: "Ongoing".into(),
            product_description: "p".into(),
            reason: "r".into(),
            event_date: None,
            issuing_office: "o".into(),
            quality_issue: true,
            rule: "recall_class_ii".into(),
        });
        let drafts = vec![
            draft("NDA1", "ACME", LeadType::DrugApplication, 97),
            recall,
            draft("NCT1", "OTHER CO", LeadType::ClinicalTrial, 50),
        ];
        let companies = aggregate(&drafts);
        let acme = &companies["ACME"];
        assert_eq!(acme.touchpoints, 2);
        assert!(acme.has_urgent_issues);
        assert!(acme.has_quality_issues);
        assert!(acme.has_compliance_issues);
        assert_eq!(acme.leads[&LeadType::Recall], vec!["D-1".to_string()]);
        assert!(!companies["OTHER CO"].has_urgent_issues);
    }

    #[test]
    fn boost_caps_touchpoints_and_skips_critical_leads() {
        let mut drafts = vec![
            draft("A", "ACME", LeadType::DrugApplication, 97),
            draft("B", "ACME", LeadType::ClinicalTrial, 57),
            draft("C", "ACME", LeadType::ClinicalTrial, 50),
            draft("D", "ACME", LeadType::ClinicalTrial, 50),
            draft("E", "ACME", LeadType::ClinicalTrial, 98),
            draft("F", "SOLO", LeadType::ClinicalTrial, 50),
        ];
        let companies = aggregate(&drafts);
        assert_eq!(companies["ACME"].boost(), 9 + 5);
        assert_eq!(companies["SOLO"].boost(), 0);

        apply_boosts(&mut drafts, &companies);
        assert_eq!(drafts[0].score, 97);
        assert_eq!(drafts[0].company_boost, 0);
        assert_eq!(drafts[1].score, 71);
        assert_eq!(drafts[1].priority(), Priority::High);
        assert_eq!(drafts[1].company_boost, 14);
        assert_eq!(drafts[5].score, 50);
    }

    #[test]
    fn boosted_scores_stay_clamped() {
        let mut drafts = vec![
            draft("A", "ACME", LeadType::DrugApplication, 95),
            draft("B", "ACME", LeadType::ClinicalTrial, 84),
            draft("C", "ACME", LeadType::ClinicalTrial, 84),
            draft("D", "ACME", LeadType::ClinicalTrial, 84),
        ];
        let companies = aggregate(&drafts);
        apply_boosts(&mut drafts, &companies);
        assert!(drafts.iter().all(|d| d.score <= 100));
        assert_eq!(drafts[1].score, 98);
        assert_eq!(drafts[1].priority(), Priority::Critical);
    }

    #[test]
    fn profile_sorts_opportunities_and_assigns_risk() {
        let drafts = vec![
            draft("NDA1", "ACME", LeadType::DrugApplication, 60),
            draft("NCT9", "ACME", LeadType::ClinicalTrial, 90),
            draft("D-1", "ACME", LeadType::Recall, 73),
        ];
        let companies = aggregate(&drafts);
        let created = Utc.with_ymd_and_hms(2024, 6, 30, 12, 0, 0).unwrap();
        let leads: Vec<Lead> = drafts.into_iter().map(|d| d.finish(email(), created)).collect();
        let refs: Vec<&Lead> = leads.iter().collect();
        let profile = CompanyProfile::build(companies["ACME"].clone(), &refs);

        assert_eq!(profile.risk, CompanyRisk::High);
        assert_eq!(profile.display_name, "Acme");
        let ids: Vec<&str> = profile.opportunities.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["NCT9", "D-1", "NDA1"]);
        assert!((profile.average_score - 74.333).abs() < 0.01);

        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["risk"], "HIGH");
        assert_eq!(json["name"], "ACME");
        assert_eq!(json["touchpoints"], 3);
    }

    #[test]
    fn quiet_single_lead_company_is_low_risk() {
        let drafts = vec![draft("NCT1", "SOLO", LeadType::ClinicalTrial, 50)];
        let companies = aggregate(&drafts);
        let created = Utc.with_ymd_and_hms(2024, 6, 30, 12, 0, 0).unwrap();
        let lead = drafts[0].clone().finish(email(), created);
        assert_eq!(assess_risk(&companies["SOLO"], &[&lead]), CompanyRisk::Low);
    }
}
