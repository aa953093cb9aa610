//! Dashboard statistics

use std::collections::BTreeMap;

use chrono::Utc;

use crate::alerting::AlertEvaluator;
use crate::db::Store;
use crate::error::Result;
use crate::models::{
    DashboardStats, DocumentFilter, PipelineStage, ProjectFilter, ProjectStatus, Severity,
    WorkerFilter, WorkerStatus,
};

/// Build the dashboard headline numbers
pub async fn build_stats(store: &dyn Store, evaluator: &AlertEvaluator) -> Result<DashboardStats> {
    let today = Utc::now().date_naive();

    let workers = store.list_workers(&WorkerFilter::default()).await?;
    let active_workers = workers
        .iter()
        .filter(|w| w.status == WorkerStatus::Active)
        .count();
    let workers_on_leave = workers
        .iter()
        .filter(|w| w.status == WorkerStatus::OnLeave)
        .count();

    let mut active_projects = 0;
    let mut total_budget = 0.0;
    let mut total_spent = 0.0;
    for project in store.list_projects(&ProjectFilter::default()).await? {
        if project.status == ProjectStatus::Completed {
            continue;
        }
        if project.status == ProjectStatus::Active {
            active_projects += 1;
        }
        total_budget += project.budget;
        total_spent += store.project_spend(project.id).await?;
    }

    let mut pipeline: BTreeMap<String, usize> = PipelineStage::ALL
        .iter()
        .map(|stage| (stage.as_str().to_string(), 0))
        .collect();
    for candidate in store.list_candidates(None).await? {
        *pipeline.entry(candidate.stage.as_str().to_string()).or_default() += 1;
    }

    let alerts = evaluator.alerts_on(today).await?;
    let critical_alerts = alerts
        .iter()
        .filter(|a| a.severity == Severity::Critical)
        .count();
    let warning_alerts = alerts
        .iter()
        .filter(|a| a.severity == Severity::Warning)
        .count();

    let expiring_documents = store
        .list_documents(
            &DocumentFilter {
                expiring_within_days: Some(evaluator.thresholds().document_warning_days),
                ..Default::default()
            },
            today,
        )
        .await?
        .len();

    let unread_notifications = store.list_notifications(true).await?.len();

    Ok(DashboardStats {
        total_workers: workers.len(),
        active_workers,
        workers_on_leave,
        active_projects,
        total_budget,
        total_spent,
        pipeline,
        critical_alerts,
        warning_alerts,
        expiring_documents,
        unread_notifications,
        generated_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AlertingConfig;
    use crate::db::{seed_demo_data, MemoryStore};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_stats_over_demo_data() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        seed_demo_data(store.as_ref()).await.unwrap();
        let evaluator = AlertEvaluator::new(store.clone(), &AlertingConfig::default()).unwrap();

        let stats = build_stats(store.as_ref(), &evaluator).await.unwrap();

        assert_eq!(stats.total_workers, 6);
        assert_eq!(stats.active_workers, 4);
        assert_eq!(stats.workers_on_leave, 1);
        assert_eq!(stats.active_projects, 3);
        assert_eq!(stats.total_budget, 400_000.0);
        assert_eq!(stats.pipeline.len(), PipelineStage::ALL.len());
        assert_eq!(stats.pipeline["offer"], 1);
        assert_eq!(stats.pipeline["hired"], 0);
        assert!(stats.critical_alerts >= 1);
        assert!(stats.warning_alerts >= 1);
        assert_eq!(stats.unread_notifications, 0);
    }
}
