/// Built-in synthetic records in the upstream wire shapes.
///
/// Dates are relative to the evaluation date so the data exercises the same
/// recency and stagnation rules every day. Records go through the same DTOs
/// as live payloads.
use chrono::{Months, NaiveDate};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::warn;

use fda_common::clinicaltrials::Study;
use fda_common::openfda::{DrugsFdaResult, EnforcementResult};

use crate::record::ComplianceNotice;

fn days_ago(today: NaiveDate, days: i64) -> NaiveDate {
    today - chrono::Duration::days(days)
}

/// openFDA `YYYYMMDD`.
fn compact(today: NaiveDate, days: i64) -> String {
    days_ago(today, days).format("%Y%m%d").to_string()
}

fn iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn months_ago(today: NaiveDate, months: u32) -> String {
    iso(today.checked_sub_months(Months::new(months)).unwrap_or(today))
}

fn months_ahead(today: NaiveDate, months: u32) -> String {
    iso(today.checked_add_months(Months::new(months)).unwrap_or(today))
}

fn locations(count: usize) -> Value {
    Value::Array(
        (1..=count)
            .map(|i| json!({ "facility": format!("Investigational Site {i}") }))
            .collect(),
    )
}

fn decode<T: DeserializeOwned>(dataset: &str, raw: Value) -> Vec<T> {
    match serde_json::from_value::<Vec<T>>(raw) {
        Ok(records) => records,
        Err(e) => {
            warn!(dataset, error = %e, "synthetic dataset failed to decode");
            Vec::new()
        }
    }
}

pub fn applications(today: NaiveDate) -> Vec<DrugsFdaResult> {
    let raw = json!([
        {
            "application_number": "NDA216789",
            "sponsor_name": "Nexavira Therapeutics, Inc.",
            "openfda": {
                "brand_name": ["ZYNTERRA"],
                "generic_name": ["ZANUBRELIB"],
                "pharm_class_epc": ["Kinase Inhibitor [EPC]"]
            },
            "submissions": [
                { "submission_type": "ORIG", "submission_number": "1", "submission_status": "FI",
                  "submission_status_date": compact(today, 320), "review_priority": "STANDARD" },
                { "submission_type": "ORIG", "submission_number": "1", "submission_status": "CR",
                  "submission_status_date": compact(today, 10), "review_priority": "STANDARD" }
            ]
        },
        {
            "application_number": "BLA761245",
            "sponsor_name": "Helixgen Biologics, LLC",
            "openfda": {
                "brand_name": ["HELIXAMAB"],
                "generic_name": ["HELIXATUZUMAB"],
                "pharm_class_epc": ["Antineoplastic Monoclonal Antibody [EPC]"]
            },
            "submissions": [
                { "submission_type": "ORIG", "submission_number": "1", "submission_status": "RT",
                  "submission_status_date": compact(today, 40), "review_priority": "STANDARD" }
            ]
        },
        {
            "application_number": "NDA218034",
            "sponsor_name": "CardioNext Pharmaceuticals Inc.",
            "openfda": {
                "brand_name": ["CARDIVEX"],
                "generic_name": ["VERICARDINE"],
                "pharm_class_epc": ["Cardiac Myosin Inhibitor [EPC]"]
            },
            "submissions": [
                { "submission_type": "ORIG", "submission_number": "1", "submission_status": "FI",
                  "submission_status_date": compact(today, 25), "review_priority": "PRIORITY",
                  "submission_class_code": "TYPE 1",
                  "submission_class_code_description": "Type 1 - New Molecular Entity" }
            ]
        },
        {
            "application_number": "NDA215550",
            "sponsor_name": "Neurovance Inc",
            "openfda": {
                "brand_name": ["NEUROVEX"],
                "generic_name": ["LEVOSERANIL"],
                "pharm_class_epc": ["Antiepileptic Agent [EPC]"]
            },
            "submissions": [
                { "submission_type": "ORIG", "submission_number": "1", "submission_status": "CR",
                  "submission_status_date": compact(today, 900), "review_priority": "STANDARD" },
                { "submission_type": "ORIG", "submission_number": "2", "submission_status": "CR",
                  "submission_status_date": compact(today, 500), "review_priority": "STANDARD" },
                { "submission_type": "ORIG", "submission_number": "3", "submission_status": "FI",
                  "submission_status_date": compact(today, 45), "review_priority": "STANDARD" }
            ]
        },
        {
            "application_number": "ANDA212345",
            "sponsor_name": "Generic Labs Ltd.",
            "products": [
                { "brand_name": "METFORMIN HYDROCHLORIDE",
                  "active_ingredients": [{ "name": "METFORMIN HYDROCHLORIDE", "strength": "500MG" }] }
            ],
            "submissions": [
                { "submission_type": "ORIG", "submission_number": "1", "submission_status": "AP",
                  "submission_status_date": compact(today, 100), "review_priority": "STANDARD" }
            ]
        },
        {
            "application_number": "NDA208888",
            "sponsor_name": "Pfizer Inc.",
            "openfda": {
                "brand_name": ["THROMBEX"],
                "generic_name": ["APIXOTRAN"],
                "pharm_class_epc": ["Factor Xa Anticoagulant [EPC]"]
            },
            "submissions": [
                { "submission_type": "ORIG", "submission_number": "1", "submission_status": "AP",
                  "submission_status_date": compact(today, 2000), "review_priority": "STANDARD" },
                { "submission_type": "SUPPL", "submission_number": "4", "submission_status": "AP",
                  "submission_status_date": compact(today, 150), "review_priority": "STANDARD" },
                { "submission_type": "SUPPL", "submission_number": "5", "submission_status": "AP",
                  "submission_status_date": compact(today, 120), "review_priority": "STANDARD" },
                { "submission_type": "SUPPL", "submission_number": "6", "submission_status": "AP",
                  "submission_status_date": compact(today, 90), "review_priority": "STANDARD" },
                { "submission_type": "SUPPL", "submission_number": "7", "submission_status": "AP",
                  "submission_status_date": compact(today, 60), "review_priority": "STANDARD" },
                { "submission_type": "SUPPL", "submission_number": "8", "submission_status": "AP",
                  "submission_status_date": compact(today, 20), "review_priority": "STANDARD" }
            ]
        }
    ]);
    decode("drug applications", raw)
}

#[allow(clippy::too_many_arguments)]
fn study(
    nct_id: &str,
    title: &str,
    status: &str,
    start: String,
    sponsor: (&str, &str),
    study_type: &str,
    phases: &[&str],
    intervention: (&str, &str),
    conditions: &[&str],
    eligibility: &str,
    enrollment: u32,
    sites: usize,
) -> Value {
    json!({
        "protocolSection": {
            "identificationModule": { "nctId": nct_id, "briefTitle": title },
            "statusModule": {
                "overallStatus": status,
                "startDateStruct": { "date": start }
            },
            "sponsorCollaboratorsModule": {
                "leadSponsor": { "name": sponsor.0, "class": sponsor.1 }
            },
            "designModule": {
                "studyType": study_type,
                "phases": phases,
                "enrollmentInfo": { "count": enrollment }
            },
            "armsInterventionsModule": {
                "interventions": [{ "type": intervention.0, "name": intervention.1 }]
            },
            "conditionsModule": { "conditions": conditions },
            "eligibilityModule": { "eligibilityCriteria": eligibility },
            "contactsLocationsModule": { "locations": locations(sites) }
        }
    })
}

pub fn studies(today: NaiveDate) -> Vec<Study> {
    let raw = json!([
        study(
            "NCT05550001",
            "PF-0799 in EGFR-Mutant Non-Small Cell Lung Cancer",
            "RECRUITING",
            months_ago(today, 30),
            ("Pfizer", "INDUSTRY"),
            "INTERVENTIONAL",
            &["PHASE2"],
            ("DRUG", "PF-0799"),
            &["Non-Small Cell Lung Cancer"],
            "Confirmed EGFR mutation (exon 19 deletion or L858R) by tissue or ctDNA testing.",
            180,
            24,
        ),
        study(
            "NCT05770008",
            "PF-0812 Combination Therapy in Previously Treated NSCLC",
            "RECRUITING",
            months_ago(today, 14),
            ("Pfizer", "INDUSTRY"),
            "INTERVENTIONAL",
            &["PHASE2"],
            ("DRUG", "PF-0812"),
            &["Non-Small Cell Lung Cancer"],
            "Progression after at least one prior line of systemic therapy.",
            150,
            18,
        ),
        study(
            "NCT06010002",
            "A First-in-Human Study of NX-2207 in Advanced Solid Tumors",
            "NOT_YET_RECRUITING",
            months_ahead(today, 2),
            ("Nexavira Therapeutics, Inc.", "INDUSTRY"),
            "INTERVENTIONAL",
            &["EARLY_PHASE1"],
            ("DRUG", "NX-2207"),
            &["Advanced Solid Tumor"],
            "Adults with advanced solid tumors refractory to standard therapy.",
            40,
            3,
        ),
        study(
            "NCT05880003",
            "Helixatuzumab Versus Standard Care in Metastatic Breast Cancer",
            "RECRUITING",
            months_ago(today, 8),
            ("Helixgen Biologics, LLC", "INDUSTRY"),
            "INTERVENTIONAL",
            &["PHASE2", "PHASE3"],
            ("BIOLOGICAL", "Helixatuzumab"),
            &["Metastatic Breast Cancer"],
            "Cohort A: HER2-positive by IHC 3+. Cohort B: HER2-negative disease.",
            420,
            35,
        ),
        study(
            "NCT04770004",
            "OGN-301 Gene Therapy for Duchenne Muscular Dystrophy",
            "SUSPENDED",
            months_ago(today, 20),
            ("Orphagen Bio", "INDUSTRY"),
            "INTERVENTIONAL",
            &["PHASE1", "PHASE2"],
            ("BIOLOGICAL", "OGN-301"),
            &["Duchenne Muscular Dystrophy"],
            "Ambulatory boys aged 4 to 7 with a confirmed dystrophin gene mutation.",
            24,
            4,
        ),
        study(
            "NCT05990005",
            "MK-1234 Once Weekly in Adults With Type 2 Diabetes",
            "RECRUITING",
            months_ago(today, 12),
            ("Merck Sharp & Dohme LLC", "INDUSTRY"),
            "INTERVENTIONAL",
            &["PHASE3"],
            ("DRUG", "MK-1234"),
            &["Type 2 Diabetes"],
            "HbA1c between 7.0% and 10.5% on stable metformin.",
            900,
            120,
        ),
        study(
            "NCT06100006",
            "Registry of Outcomes in Chronic Heart Failure",
            "RECRUITING",
            months_ago(today, 4),
            ("Heartline Research Foundation", "OTHER"),
            "OBSERVATIONAL",
            &[],
            ("OTHER", "Standard of care"),
            &["Heart Failure"],
            "Adults hospitalized for heart failure in the past year.",
            2000,
            40,
        ),
        study(
            "NCT05660007",
            "Exercise Coaching After Myocardial Infarction",
            "RECRUITING",
            months_ago(today, 5),
            ("Cardio Wellness Institute", "OTHER"),
            "INTERVENTIONAL",
            &["PHASE4"],
            ("BEHAVIORAL", "Exercise coaching"),
            &["Coronary Artery Disease"],
            "Adults within 12 weeks of myocardial infarction.",
            300,
            6,
        ),
    ]);
    decode("clinical trials", raw)
}

pub fn recalls(today: NaiveDate) -> Vec<EnforcementResult> {
    let raw = json!([
        {
            "recall_number": "D-0421-2024",
            "recalling_firm": "Generic Labs Ltd.",
            "classification": "Class II",
            "status": "Ongoing",
            "product_description": "Metformin Hydrochloride Extended-Release Tablets, USP, 500 mg, 100-count bottles",
            "reason_for_recall": "CGMP Deviations: N-Nitrosodimethylamine (NDMA) impurity above the acceptable intake limit.",
            "recall_initiation_date": compact(today, 60),
            "report_date": compact(today, 50),
            "voluntary_mandated": "Voluntary: Firm initiated",
            "openfda": {
                "generic_name": ["METFORMIN HYDROCHLORIDE"],
                "pharm_class_epc": ["Biguanide [EPC]"]
            }
        },
        {
            "recall_number": "D-0612-2024",
            "recalling_firm": "Sterilab Pharma Inc.",
            "classification": "Class I",
            "status": "Ongoing",
            "product_description": "Ceftriaxone for Injection, USP, 1 g single-dose vial",
            "reason_for_recall": "Lack of Assurance of Sterility: visible particulate matter observed in retained samples.",
            "recall_initiation_date": compact(today, 12),
            "report_date": compact(today, 6),
            "voluntary_mandated": "Voluntary: Firm initiated",
            "openfda": {
                "generic_name": ["CEFTRIAXONE SODIUM"],
                "pharm_class_epc": ["Cephalosporin Antibacterial [EPC]"]
            }
        }
    ]);
    decode("recalls", raw)
}

pub fn compliance_notices(today: NaiveDate) -> Vec<ComplianceNotice> {
    let raw = json!([
        {
            "notice_type": "warning_letter",
            "reference": "WL-320-24-101",
            "firm_name": "Nexavira Therapeutics, Inc.",
            "classification": "CGMP/Finished Pharmaceuticals/Adulterated",
            "status": "Open",
            "product": "ZYNTERRA (zanubrelib) capsules",
            "summary": "Failure to establish adequate contamination controls and to investigate out-of-specification stability results.",
            "issued_date": iso(days_ago(today, 20)),
            "issuing_office": "Center for Drug Evaluation and Research"
        },
        {
            "notice_type": "inspection",
            "reference": "FEI-3004567-OAI",
            "firm_name": "CardioNext Pharmaceuticals Inc.",
            "classification": "OAI",
            "status": "Closed",
            "product": "CARDIVEX (vericardine) tablets",
            "summary": "Form 483 observations on data integrity controls and an incomplete stability program.",
            "issued_date": iso(days_ago(today, 35)),
            "issuing_office": "Office of Pharmaceutical Quality Operations"
        }
    ]);
    decode("compliance notices", raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()
    }

    #[test]
    fn every_dataset_decodes() {
        assert_eq!(applications(today()).len(), 6);
        assert_eq!(studies(today()).len(), 8);
        assert_eq!(recalls(today()).len(), 2);
        assert_eq!(compliance_notices(today()).len(), 2);
    }

    #[test]
    fn dates_follow_the_evaluation_date() {
        let apps = applications(today());
        let crl = &apps[0].submissions.as_ref().unwrap()[1];
        assert_eq!(crl.submission_status_date.as_deref(), Some("20240620"));

        let trials = studies(today());
        let start = trials[0]
            .protocol_section
            .as_ref()
            .and_then(|p| p.status_module.as_ref())
            .and_then(|s| s.start_date_struct.as_ref())
            .and_then(|d| d.date.clone());
        assert_eq!(start.as_deref(), Some("2021-12-30"));
    }
}
