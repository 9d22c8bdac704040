/// One generation pass: analyze, dedupe, boost, compose, rank, publish.
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::application;
use crate::company::{self, CompanyProfile};
use crate::compliance;
use crate::email;
use crate::gateway::{Gateway, UpstreamBatch};
use crate::model::{Lead, LeadDraft};
use crate::stats;
use crate::store::{BuildReport, LeadStore, Snapshot};
use crate::trial::{self, TrialBatchIndex};

/// Turn one upstream batch into a complete snapshot. Pure apart from `rng`,
/// which only picks email wording.
pub fn build_snapshot<R: Rng + ?Sized>(
    batch: UpstreamBatch,
    today: NaiveDate,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Snapshot {
    let mut report = BuildReport::default();
    let mut drafts: Vec<LeadDraft> = Vec::new();

    for record in &batch.applications {
        match application::analyze(record, today) {
            Ok(draft) => drafts.push(draft),
            Err(e) => {
                warn!(error = %e, "skipping drug application");
                report.skipped += 1;
            }
        }
    }

    let index = TrialBatchIndex::build(&batch.trials);
    for record in &batch.trials {
        match trial::analyze(record, &index, today) {
            Ok(Some(draft)) => drafts.push(draft),
            Ok(None) => {
                debug!(nct_id = %record.nct_id, "trial filtered out");
                report.filtered += 1;
            }
            Err(e) => {
                warn!(error = %e, "skipping clinical trial");
                report.skipped += 1;
            }
        }
    }

    for record in &batch.compliance {
        match compliance::analyze(record, today) {
            Ok(draft) => drafts.push(draft),
            Err(e) => {
                warn!(error = %e, "skipping compliance record");
                report.skipped += 1;
            }
        }
    }

    let mut seen = HashSet::new();
    drafts.retain(|draft| {
        if seen.insert(draft.id.clone()) {
            true
        } else {
            warn!(id = %draft.id, "duplicate lead id, keeping the first");
            report.duplicates += 1;
            false
        }
    });

    let companies = company::aggregate(&drafts);
    company::apply_boosts(&mut drafts, &companies);

    let mut leads: Vec<Lead> = drafts
        .into_iter()
        .map(|draft| {
            let email = email::compose(&draft, today, &mut *rng);
            draft.finish(email, now)
        })
        .collect();
    leads.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.id.cmp(&b.id)));

    let profiles: BTreeMap<String, CompanyProfile> = companies
        .into_iter()
        .map(|(name, company)| {
            let own: Vec<&Lead> = leads.iter().filter(|l| l.company == name).collect();
            (name, CompanyProfile::build(company, &own))
        })
        .collect();

    let statistics = stats::compute(&leads, &profiles, now);
    Snapshot::new(leads, profiles, statistics, batch.sources, report, now)
}

/// Runs generation passes and publishes their snapshots.
pub struct LeadGenerator {
    gateway: Gateway,
    store: Arc<LeadStore>,
    /// Held for the whole pass so concurrent regenerations run one at a time.
    generation: Mutex<StdRng>,
}

impl LeadGenerator {
    pub fn new(gateway: Gateway, store: Arc<LeadStore>, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            gateway,
            store,
            generation: Mutex::new(rng),
        }
    }

    pub fn store(&self) -> &Arc<LeadStore> {
        &self.store
    }

    pub fn is_live(&self) -> bool {
        self.gateway.is_live()
    }

    /// Fetch, rebuild and publish. Readers keep seeing the previous snapshot
    /// until the new one is complete.
    pub async fn regenerate(&self) -> Arc<Snapshot> {
        let mut rng = self.generation.lock().await;
        let now = Utc::now();
        let today = now.date_naive();

        let batch = self.gateway.fetch_all(today).await;
        let snapshot = Arc::new(build_snapshot(batch, today, now, &mut *rng));
        self.store.publish(Arc::clone(&snapshot)).await;

        let report = snapshot.report();
        info!(
            leads = snapshot.leads().len(),
            companies = snapshot.companies().len(),
            skipped = report.skipped,
            filtered = report.filtered,
            duplicates = report.duplicates,
            "lead snapshot published"
        );
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway;
    use crate::model::{LeadType, Priority};
    use crate::record::ApplicationRecord;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()
    }

    fn now() -> DateTime<Utc> {
        today().and_hms_opt(9, 30, 0).unwrap().and_utc()
    }

    fn build(seed: u64) -> Snapshot {
        build_snapshot(
            gateway::synthetic_batch(today()),
            today(),
            now(),
            &mut StdRng::seed_from_u64(seed),
        )
    }

    #[test]
    fn synthetic_batch_yields_ranked_leads() {
        let snap = build(1);
        let leads = snap.leads();
        assert!(!leads.is_empty());
        for pair in leads.windows(2) {
            assert!(
                pair[0].score > pair[1].score
                    || (pair[0].score == pair[1].score && pair[0].id < pair[1].id)
            );
        }
        for lead in leads {
            assert_eq!(lead.priority, Priority::from_score(lead.score), "{}", lead.id);
            assert!(lead.score <= 100);
        }
        assert_eq!(leads[0].priority, Priority::Critical);
    }

    #[test]
    fn every_source_contributes() {
        let snap = build(1);
        for lead_type in [
            LeadType::DrugApplication,
            LeadType::ClinicalTrial,
            LeadType::Recall,
            LeadType::WarningLetter,
            LeadType::InspectionFinding,
        ] {
            assert!(
                snap.leads().iter().any(|l| l.lead_type == lead_type),
                "no {lead_type:?} lead"
            );
        }
        // observational and behavioral studies never pass the gate
        assert_eq!(snap.report().filtered, 2);
        assert!(snap.lead("NCT06100006").is_none());
        assert!(snap.lead("NCT05660007").is_none());
        assert!(snap.lead("NCT05990005").is_some());
        assert_eq!(snap.report().skipped, 0);
    }

    #[test]
    fn duplicate_ids_keep_the_first_record() {
        let mut batch = gateway::synthetic_batch(today());
        let copy: ApplicationRecord = batch.applications[0].clone();
        batch.applications.push(copy);
        let snap = build_snapshot(batch, today(), now(), &mut StdRng::seed_from_u64(1));
        assert_eq!(snap.report().duplicates, 1);
        let ids: HashSet<&str> = snap.leads().iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids.len(), snap.leads().len());
    }

    #[test]
    fn records_without_ids_are_skipped() {
        let mut batch = gateway::synthetic_batch(today());
        batch.applications[0].application_number.clear();
        let snap = build_snapshot(batch, today(), now(), &mut StdRng::seed_from_u64(1));
        assert_eq!(snap.report().skipped, 1);
    }

    #[test]
    fn critical_leads_are_never_boosted() {
        let snap = build(1);
        for lead in snap.leads() {
            if lead.company_boost > 0 {
                assert!(lead.score >= lead.company_boost);
            }
        }
        let crl = snap.lead("NDA216789").unwrap();
        assert_eq!(crl.company_boost, 0);
    }

    #[test]
    fn same_seed_same_emails() {
        let a = build(42);
        let b = build(42);
        for (x, y) in a.leads().iter().zip(b.leads()) {
            assert_eq!(x.email, y.email);
        }
    }

    #[test]
    fn profiles_and_statistics_agree_with_leads() {
        let snap = build(3);
        let stats = snap.statistics();
        assert_eq!(stats.overview.total_leads, snap.leads().len());
        assert_eq!(stats.overview.total_companies, snap.companies().len());
        let by_priority: usize = stats.by_priority.values().sum();
        assert_eq!(by_priority, snap.leads().len());
        assert_eq!(stats.by_priority.len(), 4);
        assert_eq!(stats.by_type.len(), 5);
        assert_eq!(stats.company_risk.values().sum::<usize>(), snap.companies().len());

        let touchpoints: usize = snap.companies().values().map(|c| c.company.touchpoints).sum();
        assert_eq!(touchpoints, snap.leads().len());

        let pfizer = snap.company("Pfizer").unwrap();
        assert!(pfizer.company.touchpoints >= 2);
        assert!(pfizer
            .opportunities
            .windows(2)
            .all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn biomarker_insights_count_trial_markers() {
        let snap = build(3);
        let insights = &snap.statistics().biomarker_insights;
        assert!(insights.trials_with_biomarkers >= 2);
        assert!(insights.top_markers.iter().any(|m| m.marker == "HER2"));
        assert!(insights.top_markers.len() <= 10);
    }

    #[tokio::test]
    async fn concurrent_regenerations_publish_whole_snapshots() {
        let store = Arc::new(LeadStore::new(Snapshot::empty(Utc::now())));
        let generator = LeadGenerator::new(Gateway::offline(), Arc::clone(&store), Some(4));

        let (first, second) = tokio::join!(generator.regenerate(), generator.regenerate());
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(first.leads().len(), second.leads().len());
        for snap in [&first, &second] {
            assert_eq!(snap.statistics().overview.total_leads, snap.leads().len());
            assert_eq!(snap.report(), first.report());
        }

        let current = store.snapshot().await;
        assert!(Arc::ptr_eq(&current, &first) || Arc::ptr_eq(&current, &second));
        assert_eq!(current.leads().len(), first.leads().len());
    }

    #[tokio::test]
    async fn regenerate_publishes_into_the_store() {
        let store = Arc::new(LeadStore::new(Snapshot::empty(Utc::now())));
        let generator = LeadGenerator::new(Gateway::offline(), Arc::clone(&store), Some(9));
        assert!(!generator.is_live());

        let published = generator.regenerate().await;
        let current = store.snapshot().await;
        assert!(Arc::ptr_eq(&published, &current));
        assert!(!current.leads().is_empty());
    }
}
