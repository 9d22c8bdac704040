/// REST surface over the published snapshot.
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use crate::company::CompanyProfile;
use crate::error::AppError;
use crate::export::{self, ExportFormat};
use crate::model::{
    ApplicationContext, ComplianceContext, Email, Lead, PainPoint, Priority, TemplateKind,
    TrialContext,
};
use crate::normalize;
use crate::pipeline::LeadGenerator;
use crate::stats::Statistics;
use crate::store::LeadFilter;

const SEARCH_LIMIT: usize = 50;

static DASHBOARD: &str = include_str!("../static/dashboard.html");

#[derive(Clone)]
pub struct AppState {
    generator: Arc<LeadGenerator>,
    top_leads: usize,
}

impl AppState {
    pub fn new(generator: Arc<LeadGenerator>, top_leads: usize) -> Self {
        Self {
            generator,
            top_leads,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(dashboard))
        .route("/health", get(health))
        .route("/api/leads", get(list_leads))
        .route("/api/leads/{id}/email", get(lead_email))
        .route("/api/generate-leads", post(generate_leads))
        .route("/api/analytics/comprehensive", get(analytics))
        .route("/api/companies/{name}", get(company))
        .route("/api/search", get(search))
        .route("/api/export/leads", get(export_leads))
        .with_state(state)
}

async fn dashboard() -> Html<&'static str> {
    Html(DASHBOARD)
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    let snapshot = state.generator.store().snapshot().await;
    let stats = snapshot.statistics();
    Json(json!({
        "status": "healthy",
        "generatedAt": snapshot.generated_at(),
        "features": {
            "liveData": state.generator.is_live(),
            "biomarkerAnalysis": true,
            "companyAggregation": true,
            "emailGeneration": true,
            "export": ["json", "csv"],
        },
        "data": {
            "leads": stats.overview.total_leads,
            "companies": stats.overview.total_companies,
            "critical": stats.overview.critical,
            "clinicalTrials": stats.by_type.get("clinical_trial").copied().unwrap_or(0),
            "drugApplications": stats.by_type.get("drug_application").copied().unwrap_or(0),
        },
        "dataSources": snapshot.sources(),
        "lastBuild": snapshot.report(),
    }))
}

async fn list_leads(
    State(state): State<AppState>,
    Query(filter): Query<LeadFilter>,
) -> Result<Json<Vec<Lead>>, AppError> {
    let query = filter.parse()?;
    let snapshot = state.generator.store().snapshot().await;
    let leads = snapshot.filter(&query).into_iter().cloned().collect();
    Ok(Json(leads))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmailMetadata {
    lead_id: String,
    company: String,
    display_name: String,
    priority: Priority,
    score: u8,
    template: TemplateKind,
    deadline: Option<NaiveDate>,
    body: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmailResponse {
    email: Email,
    trigger: Option<PainPoint>,
    metadata: EmailMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    application_context: Option<ApplicationContext>,
    #[serde(skip_serializing_if = "Option::is_none")]
    trial_context: Option<TrialContext>,
    #[serde(skip_serializing_if = "Option::is_none")]
    compliance_context: Option<ComplianceContext>,
}

async fn lead_email(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<EmailResponse>, AppError> {
    let snapshot = state.generator.store().snapshot().await;
    let lead = snapshot
        .lead(&id)
        .ok_or_else(|| AppError::NotFound(format!("lead not found: {id}")))?;

    Ok(Json(EmailResponse {
        email: lead.email.clone(),
        trigger: lead.primary_pain_point().cloned(),
        metadata: EmailMetadata {
            lead_id: lead.id.clone(),
            company: lead.company.clone(),
            display_name: normalize::display_name(&lead.company),
            priority: lead.priority,
            score: lead.score,
            template: lead.email.template,
            deadline: lead.email.deadline,
            body: lead.email.body(),
        },
        application_context: lead.application_context.clone(),
        trial_context: lead.trial_context.clone(),
        compliance_context: lead.compliance_context.clone(),
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    count: usize,
    generated_at: DateTime<Utc>,
    top_leads: Vec<Lead>,
    statistics: Statistics,
}

async fn generate_leads(State(state): State<AppState>) -> Json<GenerateResponse> {
    info!("lead generation requested");
    let snapshot = state.generator.regenerate().await;
    Json(GenerateResponse {
        count: snapshot.leads().len(),
        generated_at: snapshot.generated_at(),
        top_leads: snapshot.leads().iter().take(state.top_leads).cloned().collect(),
        statistics: snapshot.statistics().clone(),
    })
}

async fn analytics(State(state): State<AppState>) -> Json<Statistics> {
    let snapshot = state.generator.store().snapshot().await;
    Json(snapshot.statistics().clone())
}

async fn company(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<CompanyProfile>, AppError> {
    let snapshot = state.generator.store().snapshot().await;
    snapshot
        .company(&name)
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("company not found: {name}")))
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    q: Option<String>,
}

async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Value>, AppError> {
    let term = params.q.unwrap_or_default();
    if term.trim().is_empty() {
        return Err(AppError::BadRequest("query parameter q is required".to_string()));
    }
    let snapshot = state.generator.store().snapshot().await;
    let results: Vec<&Lead> = snapshot.search(&term, SEARCH_LIMIT);
    Ok(Json(json!({
        "query": term.trim(),
        "count": results.len(),
        "results": results,
    })))
}

#[derive(Debug, Deserialize)]
struct ExportParams {
    format: Option<String>,
}

async fn export_leads(
    State(state): State<AppState>,
    Query(params): Query<ExportParams>,
) -> Result<Response, AppError> {
    let format = ExportFormat::parse(params.format.as_deref())?;
    let snapshot = state.generator.store().snapshot().await;
    let leads: Vec<&Lead> = snapshot.leads().iter().collect();
    let body = export::render(&leads, format)?;
    let filename = format!(
        "leads-{}.{}",
        snapshot.generated_at().format("%Y%m%d"),
        format.extension()
    );
    let headers = [
        (header::CONTENT_TYPE, format.content_type().to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        ),
    ];
    Ok((headers, body).into_response())
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;

    use reqwest::StatusCode;
    use tokio::net::TcpListener;

    use super::*;
    use crate::gateway::Gateway;
    use crate::store::{LeadStore, Snapshot};

    async fn spawn() -> SocketAddr {
        let store = Arc::new(LeadStore::new(Snapshot::empty(Utc::now())));
        let generator = Arc::new(LeadGenerator::new(Gateway::offline(), store, Some(7)));
        generator.regenerate().await;
        let app = router(AppState::new(generator, 3));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app.into_make_service()).await.unwrap();
        });
        addr
    }

    #[tokio::test]
    async fn health_reports_sources_and_counts() {
        let addr = spawn().await;
        let body: Value = reqwest::get(format!("http://{addr}/health"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["features"]["liveData"], false);
        assert_eq!(body["dataSources"]["applications"], "synthetic");
        assert!(body["data"]["leads"].as_u64().unwrap() > 0);
    }

    #[tokio::test]
    async fn leads_filter_and_reject_bad_values() {
        let addr = spawn().await;
        let leads: Vec<Value> = reqwest::get(format!("http://{addr}/api/leads?priority=CRITICAL"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert!(!leads.is_empty());
        assert!(leads.iter().all(|l| l["priority"] == "CRITICAL"));

        let resp = reqwest::get(format!("http://{addr}/api/leads?priority=urgent"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn email_endpoint_returns_context_or_404() {
        let addr = spawn().await;
        let resp = reqwest::get(format!("http://{addr}/api/leads/NDA216789/email"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["trigger"]["kind"], "complete_response_letter");
        assert_eq!(body["metadata"]["template"], "complete_response_letter");
        assert!(body["applicationContext"].is_object());
        assert!(body.get("trialContext").is_none());

        let resp = reqwest::get(format!("http://{addr}/api/leads/NCT00000000/email"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = resp.json().await.unwrap();
        assert!(body["error"].as_str().unwrap().contains("NCT00000000"));
    }

    #[tokio::test]
    async fn generate_returns_top_leads() {
        let addr = spawn().await;
        let body: Value = reqwest::Client::new()
            .post(format!("http://{addr}/api/generate-leads"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert!(body["count"].as_u64().unwrap() > 3);
        assert_eq!(body["topLeads"].as_array().unwrap().len(), 3);
        assert!(body["statistics"]["overview"].is_object());
    }

    #[tokio::test]
    async fn company_and_search_endpoints() {
        let addr = spawn().await;
        let resp = reqwest::get(format!("http://{addr}/api/companies/Pfizer%20Inc.")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["name"], "PFIZER");
        assert!(body["opportunities"].as_array().unwrap().len() >= 2);

        let resp = reqwest::get(format!("http://{addr}/api/companies/Nobody")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let body: Value = reqwest::get(format!("http://{addr}/api/search?q=breast"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert!(body["count"].as_u64().unwrap() >= 1);

        let resp = reqwest::get(format!("http://{addr}/api/search?q=%20")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn export_sets_attachment_headers() {
        let addr = spawn().await;
        let resp = reqwest::get(format!("http://{addr}/api/export/leads?format=csv"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let disposition = resp.headers()[header::CONTENT_DISPOSITION.as_str()]
            .to_str()
            .unwrap()
            .to_string();
        assert!(disposition.starts_with("attachment;"));
        assert!(disposition.contains(".csv"));
        let text = resp.text().await.unwrap();
        assert!(text.starts_with("id,company,type"));

        let resp = reqwest::get(format!("http://{addr}/api/export/leads?format=xml"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn dashboard_is_served() {
        let addr = spawn().await;
        let text = reqwest::get(format!("http://{addr}/")).await.unwrap().text().await.unwrap();
        assert!(text.contains("<html"));
    }
}
