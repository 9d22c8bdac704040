/// Outreach email templating.
///
/// The trigger is the lead's most severe pain point. Its kind selects a
/// template through an ordered table; the generic template catches the rest.
use chrono::NaiveDate;
use rand::Rng;

use crate::model::{Email, LeadDraft, LeadType, PainPoint, PainPointKind, TemplateKind};
use crate::normalize;
use crate::rules::{first_match, Rule};

pub static TEMPLATE_RULES: &[Rule<PainPointKind, TemplateKind>] = &[
    Rule {
        id: "complete_response_letter",
        when: |k| *k == PainPointKind::CompleteResponseLetter,
        then: TemplateKind::CompleteResponseLetter,
    },
    Rule {
        id: "refuse_to_file",
        when: |k| *k == PainPointKind::RefuseToFile,
        then: TemplateKind::RefuseToFile,
    },
    Rule {
        id: "active_review",
        when: |k| matches!(k, PainPointKind::ActiveReview | PainPointKind::ExpeditedReview),
        then: TemplateKind::ActiveReview,
    },
    Rule {
        id: "first_in_human",
        when: |k| *k == PainPointKind::FirstInHuman,
        then: TemplateKind::FirstInHuman,
    },
    Rule {
        id: "pre_recruitment",
        when: |k| *k == PainPointKind::PreRecruitment,
        then: TemplateKind::PreRecruitment,
    },
    Rule {
        id: "biomarker_mixed_population",
        when: |k| *k == PainPointKind::BiomarkerMixedPopulation,
        then: TemplateKind::BiomarkerMixedPopulation,
    },
];

pub const CREDIBILITY: &[&str] = &[
    "Our team has supported more than 40 sponsors through FDA interactions in the past three years.",
    "Our regulatory strategists include former FDA reviewers who have sat on the other side of the table.",
    "We have helped sponsors turn around comparable situations in as little as one review cycle.",
];

const MAX_BULLETS: usize = 4;

const SIGNATURE: &str = "Best regards,\n[Your Name]\n[Title]\n[Company]\n[Phone] | [Email]";

pub fn template_for(trigger: Option<&PainPoint>) -> TemplateKind {
    trigger
        .and_then(|p| first_match(TEMPLATE_RULES, &p.kind))
        .map(|rule| rule.then)
        .unwrap_or(TemplateKind::Generic)
}

/// Days from the evaluation date to the deadline quoted in the email.
pub fn deadline_offset_days(template: TemplateKind) -> Option<i64> {
    match template {
        TemplateKind::CompleteResponseLetter => Some(180),
        TemplateKind::RefuseToFile => Some(30),
        TemplateKind::ActiveReview => Some(60),
        TemplateKind::FirstInHuman => Some(90),
        TemplateKind::PreRecruitment => Some(45),
        TemplateKind::BiomarkerMixedPopulation => Some(60),
        TemplateKind::Generic => None,
    }
}

fn team(lead_type: LeadType) -> &'static str {
    match lead_type {
        LeadType::ClinicalTrial => "Clinical Development",
        LeadType::DrugApplication => "Regulatory Affairs",
        LeadType::WarningLetter | LeadType::Recall | LeadType::InspectionFinding => {
            "Quality & Compliance"
        }
    }
}

struct TemplateCopy {
    subject: String,
    hook: String,
    problem: String,
    offering: String,
}

fn copy_for(template: TemplateKind, draft: &LeadDraft, company: &str, division: &str) -> TemplateCopy {
    let product = &draft.product;
    let indication = &draft.indication;
    match template {
        TemplateKind::CompleteResponseLetter => TemplateCopy {
            subject: format!("{product}: a path from Complete Response to approval"),
            hook: format!(
                "I saw that {company} recently received a Complete Response Letter for {product}."
            ),
            problem: format!(
                "A CRL from the {division} typically means a resubmission clock, a Type A meeting \
                 request within weeks, and deficiencies that need to be closed with evidence rather \
                 than argument."
            ),
            offering: "We run a structured deficiency gap analysis and prepare the Type A meeting \
                       package so your resubmission addresses every review point."
                .to_string(),
        },
        TemplateKind::RefuseToFile => TemplateCopy {
            subject: format!("Refiling {product} after a Refuse to File decision"),
            hook: format!("I understand the FDA issued a Refuse to File decision on {product}."),
            problem: "An RTF usually points to completeness issues that are fixable, but every \
                      month before refiling pushes the action date further out."
                .to_string(),
            offering: "We audit the dossier for completeness against current guidance and help \
                       you refile with confidence."
                .to_string(),
        },
        TemplateKind::ActiveReview => TemplateCopy {
            subject: format!("Supporting the {product} review in the {division}"),
            hook: format!("Congratulations on moving {product} into active FDA review."),
            problem: "The review window is when information requests, labeling negotiations and \
                      advisory committee preparation compete for the same people."
                .to_string(),
            offering: "We provide rapid-response teams for information requests and labeling \
                       strategy while your core team stays focused."
                .to_string(),
        },
        TemplateKind::FirstInHuman => TemplateCopy {
            subject: format!("First-in-human readiness for {product}"),
            hook: format!("I noticed {company} is preparing a first-in-human study of {product}."),
            problem: "Starting-dose justification, sentinel dosing and safety monitoring decisions \
                      made now shape the whole early-phase program."
                .to_string(),
            offering: "We help design FIH protocols with defensible starting doses and escalation \
                       rules that hold up to FDA and IRB review."
                .to_string(),
        },
        TemplateKind::PreRecruitment => TemplateCopy {
            subject: format!("Getting the {product} trial enrolling on schedule"),
            hook: format!(
                "I saw the {company} trial in {indication} is registered but not yet recruiting."
            ),
            problem: "Most enrollment delays are locked in before the first patient is screened, \
                      during site selection and feasibility."
                .to_string(),
            offering: "We run eligibility feasibility and site activation planning so the trial \
                       starts enrolling on the day it opens."
                .to_string(),
        },
        TemplateKind::BiomarkerMixedPopulation => TemplateCopy {
            subject: format!("Biomarker strategy for the {product} program"),
            hook: format!(
                "Your {product} trial enrolls both biomarker-positive and biomarker-negative patients."
            ),
            problem: "Mixed populations raise hard questions about subgroup analysis, alpha \
                      allocation and companion diagnostic timing that the FDA will ask early."
                .to_string(),
            offering: "We build biomarker analysis plans and companion diagnostic strategies \
                       aligned with current FDA expectations."
                .to_string(),
        },
        TemplateKind::Generic => TemplateCopy {
            subject: format!("Regulatory support for {product}"),
            hook: format!("I have been following {company}'s work on {product}."),
            problem: format!(
                "{} programs in {} face a fast-moving regulatory landscape.",
                draft.therapeutic_area.label(),
                indication
            ),
            offering: "We partner with sponsors on regulatory strategy, clinical development and \
                       compliance so programs keep moving."
                .to_string(),
        },
    }
}

fn bullets(points: &[PainPoint]) -> Vec<String> {
    points
        .iter()
        .take(MAX_BULLETS)
        .map(|p| format!("{}: {}", p.description, p.next_step))
        .collect()
}

/// Build the outreach email for `draft`. Deterministic for a given draft,
/// evaluation date and RNG state.
pub fn compose<R: Rng + ?Sized>(draft: &LeadDraft, today: NaiveDate, rng: &mut R) -> Email {
    let trigger = draft.primary_pain_point();
    let template = template_for(trigger);
    let company = normalize::display_name(&draft.company);
    let division = draft
        .application
        .as_ref()
        .map(|a| a.division.clone())
        .unwrap_or_else(|| normalize::review_division(draft.therapeutic_area).to_string());

    let copy = copy_for(template, draft, &company, &division);
    let credibility = CREDIBILITY[rng.random_range(0..CREDIBILITY.len())];
    let deadline = deadline_offset_days(template).map(|days| today + chrono::Duration::days(days));

    let urgency_line = deadline.map(|date| {
        format!(
            "With a realistic target of {}, the next few weeks matter most.",
            date.format("%B %-d, %Y")
        )
    });

    Email {
        template,
        subject: copy.subject,
        greeting: format!("Dear {company} {} Team,", team(draft.lead_type)),
        opening_hook: copy.hook,
        problem_statement: copy.problem,
        offering: format!("{} {credibility}", copy.offering),
        analysis_bullets: bullets(&draft.pain_points),
        urgency_line,
        call_to_action: "Would you be open to a 20-minute call next week to compare notes?"
            .to_string(),
        signature: SIGNATURE.to_string(),
        deadline,
    }
}
