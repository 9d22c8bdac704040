/// Biomarker-strategy detection over trial title and eligibility text.
use std::sync::LazyLock;

use regex::Regex;

use crate::model::{BiomarkerStrategy, EnrichmentStrategy, Level, MarkerCategory};

static CATEGORY_PATTERNS: LazyLock<Vec<(MarkerCategory, Regex)>> = LazyLock::new(|| {
    [
        (
            MarkerCategory::Genetic,
            r"(?i)\b(mutation|mutations|mutant|mutated|germline|fusion|fusions|rearrangement|amplification|alteration|alterations)\b",
        ),
        (
            MarkerCategory::Protein,
            r"(?i)\b(overexpress\w*|expression|immunohistochemistry|IHC|protein level\w*)\b",
        ),
        (
            MarkerCategory::Genomic,
            r"(?i)\b(NGS|next[- ]generation sequencing|genomic\w*|whole[- ]exome|tumou?r mutational burden|microsatellite)\b",
        ),
        (
            MarkerCategory::LiquidBiopsy,
            r"(?i)\b(ctDNA|cfDNA|liquid biops(y|ies)|circulating tumou?r (DNA|cells))\b",
        ),
        (
            MarkerCategory::Immunologic,
            r"(?i)\b(PD-?L1|HLA-?\w*|tumou?r[- ]infiltrating|immune (signature|profil\w*)|CD8\+?)",
        ),
    ]
    .into_iter()
    .map(|(category, pattern)| (category, Regex::new(pattern).expect("valid regex")))
    .collect()
});

/// Curated named markers. Matching is case-sensitive so "MET" or "KIT" do
/// not fire on ordinary English words.
static NAMED_MARKERS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    [
        ("HER2", r"\b(HER2|HER-2|ERBB2)\b"),
        ("EGFR", r"\bEGFR\b"),
        ("ALK", r"\bALK\b"),
        ("ROS1", r"\bROS1\b"),
        ("BRAF", r"\bBRAF\b"),
        ("KRAS", r"\bKRAS\b"),
        ("NRAS", r"\bNRAS\b"),
        ("MET", r"\b(c-)?MET\b"),
        ("RET", r"\bRET\b"),
        ("NTRK", r"\bNTRK[1-3]?\b"),
        ("PD-L1", r"\bPD-?L1\b"),
        ("PD-1", r"\bPD-1\b"),
        ("BRCA1", r"\bBRCA1\b"),
        ("BRCA2", r"\bBRCA2\b"),
        ("PIK3CA", r"\bPIK3CA\b"),
        ("FGFR", r"\bFGFR[1-4]?\b"),
        ("IDH1", r"\bIDH1\b"),
        ("IDH2", r"\bIDH2\b"),
        ("FLT3", r"\bFLT3\b"),
        ("KIT", r"\bc?-?KIT\b"),
        ("CD19", r"\bCD19\b"),
        ("CD20", r"\bCD20\b"),
        ("BCMA", r"\bBCMA\b"),
        ("MSI-H", r"\b(MSI-H|MSI-high|dMMR)\b"),
        ("TMB", r"\b(TMB|TMB-H)\b"),
        ("ESR1", r"\bESR1\b"),
    ]
    .into_iter()
    .map(|(name, pattern)| (name, Regex::new(pattern).expect("valid regex")))
    .collect()
});

/// Detect markers, marker categories, enrichment strategy and complexity.
pub fn detect(text: &str) -> BiomarkerStrategy {
    let markers: Vec<String> = NAMED_MARKERS
        .iter()
        .filter(|(_, re)| re.is_match(text))
        .map(|(name, _)| name.to_string())
        .collect();
    let categories: Vec<MarkerCategory> = CATEGORY_PATTERNS
        .iter()
        .filter(|(_, re)| re.is_match(text))
        .map(|(category, _)| *category)
        .collect();

    let lower = text.to_lowercase();
    let has_signal = !markers.is_empty() || !categories.is_empty();

    let enrichment = if has_signal && lower.contains("positive") && lower.contains("negative") {
        EnrichmentStrategy::MixedPopulation
    } else if lower.contains("enriched") || lower.contains("enrichment") {
        EnrichmentStrategy::EnrichedOnly
    } else if lower.contains("all-comers")
        || lower.contains("all comers")
        || lower.contains("unselected")
        || lower.contains("regardless of")
    {
        EnrichmentStrategy::AllComers
    } else if has_signal {
        EnrichmentStrategy::BiomarkerStratified
    } else {
        EnrichmentStrategy::None
    };

    let complexity = if markers.len() >= 3
        || categories.len() >= 3
        || enrichment == EnrichmentStrategy::MixedPopulation
    {
        Level::High
    } else if has_signal {
        Level::Medium
    } else {
        Level::Low
    };

    BiomarkerStrategy {
        markers,
        categories,
        enrichment,
        complexity,
    }
}
