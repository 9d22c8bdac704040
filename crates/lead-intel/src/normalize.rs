/// Text normalization: company names, therapeutic-area keywords, FDA divisions.
use std::sync::LazyLock;

use regex::Regex;

use crate::model::TherapeuticArea;

/// Trailing tokens removed from company names. `AND`/`&` are only dropped
/// once they become trailing (e.g. "ELI LILLY AND CO").
const LEGAL_SUFFIXES: &[&str] = &[
    "INC", "INCORPORATED", "LLC", "LTD", "LIMITED", "CORP", "CORPORATION", "CO", "COMPANY",
    "PLC", "AG", "SA", "GMBH", "LP", "NV", "BV", "SE", "SPA", "KK", "AND", "&",
];

static PUNCTUATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.,;:()]+").expect("valid regex"));

/// Normalize a sponsor / firm name into the company key.
///
/// Uppercases, drops punctuation, collapses whitespace, and strips trailing
/// legal suffixes. Idempotent; blank input becomes `UNKNOWN`.
pub fn company_name(raw: &str) -> String {
    let upper = PUNCTUATION_RE.replace_all(&raw.to_uppercase(), " ").to_string();
    let mut tokens: Vec<&str> = upper.split_whitespace().collect();
    while tokens.len() > 1 {
        match tokens.last() {
            Some(last) if LEGAL_SUFFIXES.contains(last) => {
                tokens.pop();
            }
            _ => break,
        }
    }
    if tokens.is_empty() {
        return "UNKNOWN".to_string();
    }
    tokens.join(" ")
}

/// "NEXAVIRA THERAPEUTICS" -> "Nexavira Therapeutics", for salutations.
pub fn display_name(normalized: &str) -> String {
    normalized
        .split_whitespace()
        .map(|word| {
            if word.len() <= 3 && word.chars().all(|c| c.is_ascii_uppercase()) && word != "AND" {
                return word.to_string();
            }
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_string() + &chars.as_str().to_lowercase(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Keyword lists per area, tested in this order; first hit wins.
const AREA_KEYWORDS: &[(TherapeuticArea, &[&str])] = &[
    (
        TherapeuticArea::Oncology,
        &[
            "cancer", "tumor", "tumour", "oncolog", "carcinoma", "lymphoma", "leukemia",
            "leukaemia", "melanoma", "sarcoma", "myeloma", "glioblastoma", "neoplas", "metasta",
            "kinase inhibitor", "nsclc",
        ],
    ),
    (
        TherapeuticArea::Cns,
        &[
            "alzheimer", "parkinson", "epilep", "seizure", "depress", "schizophren", "migraine",
            "multiple sclerosis", "neuropath", "bipolar", "anxiety", "adhd", "insomnia",
            "amyotrophic", "neurolog", "central nervous system",
        ],
    ),
    (
        TherapeuticArea::Cardiovascular,
        &[
            "heart", "cardiac", "cardio", "hypertension", "atrial", "coronary", "thrombo",
            "anticoagul", "arrhythm", "stroke", "cholesterol", "statin",
        ],
    ),
    (
        TherapeuticArea::Metabolic,
        &[
            "diabetes", "obesity", "insulin", "glucose", "glp-1", "nash", "mash", "metabolic",
            "thyroid", "weight management", "biguanide",
        ],
    ),
    (
        TherapeuticArea::Immunology,
        &[
            "rheumatoid", "psoriasis", "lupus", "crohn", "colitis", "atopic dermatitis", "asthma",
            "immun", "inflammat", "arthritis", "interleukin", "tnf",
        ],
    ),
    (
        TherapeuticArea::InfectiousDisease,
        &[
            "infection", "viral", "virus", "bacterial", "hiv", "hepatitis", "covid", "influenza",
            "antibiotic", "antiviral", "antifungal", "vaccine", "tuberculosis", "rsv", "sepsis",
        ],
    ),
    (
        TherapeuticArea::RareDisease,
        &[
            "orphan", "rare", "duchenne", "cystic fibrosis", "sickle cell", "hemophilia",
            "spinal muscular atrophy", "fabry", "gaucher", "pompe", "huntington", "lysosomal",
            "enzyme replacement",
        ],
    ),
];

/// Short alphabetic keywords (≤4 chars) must match a whole word so that e.g.
/// "hiv" does not fire inside "archive"; longer keywords match as substrings.
fn keyword_hit(haystack: &str, words: &[&str], keyword: &str) -> bool {
    if keyword.len() <= 4 && keyword.chars().all(|c| c.is_ascii_alphabetic()) {
        words.contains(&keyword)
    } else {
        haystack.contains(keyword)
    }
}

/// Classify free text (product, class, conditions, titles) into a therapeutic area.
pub fn therapeutic_area<S: AsRef<str>>(texts: &[S]) -> TherapeuticArea {
    let haystack = texts
        .iter()
        .map(|t| t.as_ref().to_lowercase())
        .collect::<Vec<_>>()
        .join(" ");
    let words: Vec<&str> = haystack
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    AREA_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| keyword_hit(&haystack, &words, k)))
        .map(|(area, _)| *area)
        .unwrap_or(TherapeuticArea::Other)
}

/// Review division used in outreach copy.
pub fn review_division(area: TherapeuticArea) -> &'static str {
    match area {
        TherapeuticArea::Oncology => "Office of Oncologic Diseases",
        TherapeuticArea::Cns => "Office of Neuroscience",
        TherapeuticArea::Cardiovascular => "Division of Cardiology and Nephrology",
        TherapeuticArea::Metabolic => "Division of Diabetes, Lipid Disorders, and Obesity",
        TherapeuticArea::Immunology => "Office of Immunology and Inflammation",
        TherapeuticArea::InfectiousDisease => "Office of Infectious Diseases",
        TherapeuticArea::RareDisease => "Division of Rare Diseases and Medical Genetics",
        TherapeuticArea::Other => "Office of New Drugs",
    }
}
