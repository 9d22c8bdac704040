/// Fully-defaulted internal records.
///
/// Upstream DTOs are decoded here exactly once. Analysis code works only on
/// these types: strings default to "Unknown" or empty, lists to empty, and
/// only genuinely optional dates stay `Option`.
use chrono::NaiveDate;
use serde::Deserialize;

use fda_common::clinicaltrials::Study;
use fda_common::openfda::{DrugsFdaResult, EnforcementResult, OpenFdaFields};

pub const UNKNOWN: &str = "Unknown";

#[derive(Debug, Clone, PartialEq)]
pub struct ApplicationRecord {
    pub application_number: String,
    pub sponsor: String,
    pub brand_name: String,
    pub generic_name: String,
    pub pharm_classes: Vec<String>,
    pub submissions: Vec<SubmissionRecord>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionRecord {
    pub submission_type: String,
    pub submission_number: String,
    pub status_code: String,
    pub status_date: Option<NaiveDate>,
    pub review_priority: String,
    pub class_description: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrialRecord {
    pub nct_id: String,
    pub title: String,
    pub official_title: String,
    pub status: String,
    pub start_date: Option<NaiveDate>,
    pub last_update: Option<NaiveDate>,
    pub sponsor: String,
    pub sponsor_class: String,
    pub study_type: String,
    /// Registry phases joined with `|`, e.g. `PHASE1|PHASE2`.
    pub phase_tag: String,
    pub enrollment: u32,
    pub interventions: Vec<InterventionRecord>,
    pub conditions: Vec<String>,
    pub keywords: Vec<String>,
    pub eligibility: String,
    pub location_count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InterventionRecord {
    pub kind: String,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComplianceKind {
    Recall,
    WarningLetter,
    InspectionFinding,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComplianceRecord {
    pub kind: ComplianceKind,
    pub reference: String,
    pub firm: String,
    pub classification: String,
    pub status: String,
    pub product_description: String,
    pub reason: String,
    pub event_date: Option<NaiveDate>,
    pub issuing_office: String,
    pub product_names: Vec<String>,
    pub pharm_classes: Vec<String>,
}

/// Warning letters and inspection classifications have no public JSON
/// registry; the built-in set uses this wire shape.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ComplianceNotice {
    /// `warning_letter` or `inspection`.
    pub notice_type: Option<String>,
    pub reference: Option<String>,
    pub firm_name: Option<String>,
    /// Subject line for letters, `OAI`/`VAI`/`NAI` for inspections.
    pub classification: Option<String>,
    pub status: Option<String>,
    pub product: Option<String>,
    pub summary: Option<String>,
    /// `YYYY-MM-DD`
    pub issued_date: Option<String>,
    pub issuing_office: Option<String>,
}

/// `YYYYMMDD` (openFDA).
pub fn parse_compact_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y%m%d").ok()
}

/// `YYYY-MM-DD` or `YYYY-MM` (ClinicalTrials.gov); month-only dates pin to the 1st.
pub fn parse_registry_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(&format!("{raw}-01"), "%Y-%m-%d"))
        .ok()
}

fn text_or_unknown(value: Option<String>) -> String {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

fn text_or_empty(value: Option<String>) -> String {
    value.map(|s| s.trim().to_string()).unwrap_or_default()
}

fn first_of(values: Option<&Vec<String>>) -> Option<String> {
    values.and_then(|v| v.iter().find(|s| !s.trim().is_empty()).cloned())
}

fn pharm_classes(openfda: Option<&OpenFdaFields>) -> Vec<String> {
    let Some(fields) = openfda else {
        return Vec::new();
    };
    fields
        .pharm_class_epc
        .iter()
        .chain(fields.pharm_class_moa.iter())
        .flatten()
        .cloned()
        .collect()
}

impl From<DrugsFdaResult> for ApplicationRecord {
    fn from(dto: DrugsFdaResult) -> Self {
        let openfda = dto.openfda.as_ref();
        let products = dto.products.unwrap_or_default();

        let brand_name = first_of(openfda.and_then(|o| o.brand_name.as_ref()))
            .or_else(|| products.iter().find_map(|p| p.brand_name.clone()));
        let generic_name = first_of(openfda.and_then(|o| o.generic_name.as_ref())).or_else(|| {
            products
                .iter()
                .flat_map(|p| p.active_ingredients.iter().flatten())
                .find_map(|i| i.name.clone())
        });
        let sponsor = dto
            .sponsor_name
            .filter(|s| !s.trim().is_empty())
            .or_else(|| first_of(openfda.and_then(|o| o.manufacturer_name.as_ref())));

        let submissions = dto
            .submissions
            .unwrap_or_default()
            .into_iter()
            .map(|s| SubmissionRecord {
                submission_type: text_or_unknown(s.submission_type).to_uppercase(),
                submission_number: text_or_empty(s.submission_number),
                status_code: text_or_empty(s.submission_status).to_uppercase(),
                status_date: s.submission_status_date.as_deref().and_then(parse_compact_date),
                review_priority: text_or_unknown(s.review_priority).to_uppercase(),
                class_description: text_or_empty(s.submission_class_code_description),
            })
            .collect();

        Self {
            application_number: text_or_empty(dto.application_number).to_uppercase(),
            sponsor: text_or_unknown(sponsor),
            brand_name: text_or_unknown(brand_name),
            generic_name: text_or_unknown(generic_name),
            pharm_classes: pharm_classes(openfda),
            submissions,
        }
    }
}

impl From<Study> for TrialRecord {
    fn from(dto: Study) -> Self {
        let section = dto.protocol_section.unwrap_or_default();
        let ident = section.identification_module.unwrap_or_default();
        let status = section.status_module.unwrap_or_default();
        let sponsor = section
            .sponsor_collaborators_module
            .and_then(|m| m.lead_sponsor)
            .unwrap_or_default();
        let design = section.design_module.unwrap_or_default();
        let conditions = section.conditions_module.unwrap_or_default();

        let date_of = |d: Option<fda_common::clinicaltrials::DateStruct>| {
            d.and_then(|d| d.date).as_deref().and_then(parse_registry_date)
        };

        let interventions = section
            .arms_interventions_module
            .and_then(|m| m.interventions)
            .unwrap_or_default()
            .into_iter()
            .map(|i| InterventionRecord {
                kind: text_or_unknown(i.kind).to_uppercase(),
                name: text_or_unknown(i.name),
            })
            .collect();

        Self {
            nct_id: text_or_empty(ident.nct_id).to_uppercase(),
            title: text_or_unknown(ident.brief_title),
            official_title: text_or_empty(ident.official_title),
            status: text_or_unknown(status.overall_status).to_uppercase(),
            start_date: date_of(status.start_date_struct),
            last_update: date_of(status.last_update_post_date_struct),
            sponsor: text_or_unknown(sponsor.name),
            sponsor_class: text_or_unknown(sponsor.class).to_uppercase(),
            study_type: text_or_unknown(design.study_type).to_uppercase(),
            phase_tag: design.phases.unwrap_or_default().join("|").to_uppercase(),
            enrollment: design.enrollment_info.and_then(|e| e.count).unwrap_or(0),
            interventions,
            conditions: conditions.conditions.unwrap_or_default(),
            keywords: conditions.keywords.unwrap_or_default(),
            eligibility: section
                .eligibility_module
                .and_then(|m| m.eligibility_criteria)
                .unwrap_or_default(),
            location_count: section
                .contacts_locations_module
                .and_then(|m| m.locations)
                .map(|l| l.len())
                .unwrap_or(0),
        }
    }
}

impl From<EnforcementResult> for ComplianceRecord {
    fn from(dto: EnforcementResult) -> Self {
        let openfda = dto.openfda.as_ref();
        let product_names = openfda
            .map(|o| {
                o.brand_name
                    .iter()
                    .chain(o.generic_name.iter())
                    .flatten()
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        let event_date = dto
            .recall_initiation_date
            .as_deref()
            .and_then(parse_compact_date)
            .or_else(|| dto.report_date.as_deref().and_then(parse_compact_date));

        Self {
            kind: ComplianceKind::Recall,
            reference: text_or_empty(dto.recall_number).to_uppercase(),
            firm: text_or_unknown(dto.recalling_firm),
            classification: text_or_unknown(dto.classification),
            status: text_or_unknown(dto.status),
            product_description: text_or_unknown(dto.product_description),
            reason: text_or_unknown(dto.reason_for_recall),
            event_date,
            issuing_office: text_or_unknown(dto.voluntary_mandated),
            pharm_classes: pharm_classes(openfda),
            product_names,
        }
    }
}

impl From<ComplianceNotice> for ComplianceRecord {
    fn from(dto: ComplianceNotice) -> Self {
        let kind = match dto.notice_type.as_deref().map(str::to_ascii_lowercase).as_deref() {
            Some("inspection") | Some("inspection_finding") | Some("483") => {
                ComplianceKind::InspectionFinding
            }
            _ => ComplianceKind::WarningLetter,
        };
        let product = text_or_unknown(dto.product);

        Self {
            kind,
            reference: text_or_empty(dto.reference).to_uppercase(),
            firm: text_or_unknown(dto.firm_name),
            classification: text_or_unknown(dto.classification),
            status: text_or_unknown(dto.status),
            product_names: vec![product.clone()],
            product_description: product,
            reason: text_or_unknown(dto.summary),
            event_date: dto.issued_date.as_deref().and_then(parse_registry_date),
            issuing_office: text_or_unknown(dto.issuing_office),
            pharm_classes: Vec::new(),
        }
    }
}
