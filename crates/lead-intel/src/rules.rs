/// Shared rule-table machinery and the score/priority tables every analyzer uses.
///
/// Business rules are data: ordered `(predicate, outcome)` rows evaluated
/// first-match-wins. Row order is part of the contract because the winning
/// row's id and reason are reported back to clients.
use crate::model::{PainPoint, Priority, Severity};

/// One row of an ordered decision table.
pub struct Rule<I: ?Sized, O> {
    pub id: &'static str,
    pub when: fn(&I) -> bool,
    pub then: O,
}

/// Evaluate `table` top to bottom and return the first row whose predicate holds.
pub fn first_match<'a, I: ?Sized, O>(table: &'a [Rule<I, O>], input: &I) -> Option<&'a Rule<I, O>> {
    table.iter().find(|rule| (rule.when)(input))
}

/// Outcome of a tier ladder: the base score the lead starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierOutcome {
    pub base_score: u8,
    pub reason: &'static str,
}

/// Score floors per priority, highest first. Ladder base scores sit inside
/// the band of the tier they represent.
pub const PRIORITY_BANDS: &[(u8, Priority)] = &[
    (85, Priority::Critical),
    (65, Priority::High),
    (55, Priority::Medium),
    (0, Priority::Low),
];

/// Minimum score for terminal trial statuses (SUSPENDED / TERMINATED).
pub const CRITICAL_FLOOR: u8 = 85;

/// drugs@FDA submission status codes.
pub const STATUS_CODES: &[(&str, &str)] = &[
    ("AP", "Approved"),
    ("CR", "Complete Response Letter"),
    ("RT", "Refuse to File"),
    ("FI", "Filed"),
    ("TA", "Tentative Approval"),
    ("WD", "Withdrawn"),
];

/// Translate a submission status code; unknown codes pass through unchanged.
pub fn translate_status(code: &str) -> String {
    let trimmed = code.trim();
    STATUS_CODES
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(trimmed))
        .map(|(_, status)| status.to_string())
        .unwrap_or_else(|| code.to_string())
}

/// Bonus for recent activity. Future-dated or unknown activity earns nothing.
pub fn recency_bonus(days_since: Option<i64>) -> u8 {
    match days_since {
        Some(d) if (0..=7).contains(&d) => 5,
        Some(d) if (0..=30).contains(&d) => 3,
        _ => 0,
    }
}

pub fn severity_weight(severity: Severity) -> u32 {
    match severity {
        Severity::Critical => 5,
        Severity::High => 3,
        Severity::Medium => 2,
        Severity::Low => 1,
    }
}

pub fn pain_point_bonus(points: &[PainPoint]) -> u32 {
    points.iter().map(|p| severity_weight(p.severity)).sum()
}

/// Clamp an additive total into the 0–100 score range.
pub fn clamp_score(raw: u32) -> u8 {
    raw.min(100) as u8
}
