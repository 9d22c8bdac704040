/// Lead export as JSON or CSV.
use crate::error::AppError;
use crate::model::Lead;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub fn parse(value: Option<&str>) -> Result<Self, AppError> {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            None | Some("") | Some("json") => Ok(ExportFormat::Json),
            Some("csv") => Ok(ExportFormat::Csv),
            Some(other) => Err(AppError::BadRequest(format!(
                "unsupported export format: {other}"
            ))),
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Json => "application/json",
            ExportFormat::Csv => "text/csv; charset=utf-8",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }
}

const CSV_HEADER: &[&str] = &[
    "id",
    "company",
    "type",
    "priority",
    "score",
    "therapeutic_area",
    "product",
    "indication",
    "urgency_reason",
    "primary_pain_point",
    "company_boost",
    "activity_date",
    "email_subject",
];

fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn row(lead: &Lead) -> Vec<String> {
    vec![
        lead.id.clone(),
        lead.company.clone(),
        lead.lead_type.as_str().to_string(),
        lead.priority.as_str().to_string(),
        lead.score.to_string(),
        lead.therapeutic_area.as_str().to_string(),
        lead.product.clone(),
        lead.indication.clone(),
        lead.urgency_reason.clone(),
        lead.primary_pain_point()
            .map(|p| p.kind.as_str().to_string())
            .unwrap_or_default(),
        lead.company_boost.to_string(),
        lead.activity_date
            .map(|d| d.to_string())
            .unwrap_or_default(),
        lead.email.subject.clone(),
    ]
}

pub fn to_csv(leads: &[&Lead]) -> String {
    let mut out = CSV_HEADER.join(",");
    out.push_str("\r\n");
    for lead in leads {
        let fields: Vec<String> = row(lead).iter().map(|f| escape(f)).collect();
        out.push_str(&fields.join(","));
        out.push_str("\r\n");
    }
    out
}

pub fn render(leads: &[&Lead], format: ExportFormat) -> Result<String, AppError> {
    match format {
        ExportFormat::Json => Ok(serde_json::to_string_pretty(leads)?),
        ExportFormat::Csv => Ok(to_csv(leads)),
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::gateway;
    use crate::pipeline;
    use crate::store::Snapshot;

    fn snapshot() -> Snapshot {
        let today = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
        let now = today.and_hms_opt(8, 0, 0).unwrap().and_utc();
        pipeline::build_snapshot(
            gateway::synthetic_batch(today),
            today,
            now,
            &mut StdRng::seed_from_u64(11),
        )
    }

    #[test]
    fn format_parsing() {
        assert_eq!(ExportFormat::parse(None).unwrap(), ExportFormat::Json);
        assert_eq!(ExportFormat::parse(Some("CSV")).unwrap(), ExportFormat::Csv);
        assert!(matches!(
            ExportFormat::parse(Some("xlsx")),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn csv_quotes_fields_with_delimiters() {
        assert_eq!(escape("plain"), "plain");
        assert_eq!(escape("a,b"), "\"a,b\"");
        assert_eq!(escape("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(escape("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn csv_has_one_row_per_lead() {
        let snap = snapshot();
        let leads: Vec<&Lead> = snap.leads().iter().collect();
        let csv = to_csv(&leads);
        let mut lines = csv.split("\r\n").filter(|l| !l.is_empty());
        assert_eq!(lines.next().unwrap(), CSV_HEADER.join(","));
        assert_eq!(lines.count(), leads.len());
        assert!(csv.contains("NDA216789"));
    }

    #[test]
    fn json_export_keeps_every_lead() {
        let snap = snapshot();
        let leads: Vec<&Lead> = snap.leads().iter().collect();
        let json = render(&leads, ExportFormat::Json).unwrap();
        let parsed: Vec<Lead> = serde_json::from_str(&json).unwrap();
        let ids: Vec<&str> = parsed.iter().map(|l| l.id.as_str()).collect();
        let expected: Vec<&str> = leads.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, expected);
    }
}
