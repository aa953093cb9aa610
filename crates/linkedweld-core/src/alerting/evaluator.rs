//! Alert evaluation over the current records

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::config::{AlertThresholds, AlertingConfig};
use crate::db::Store;
use crate::error::Result;
use crate::models::{
    Alert, DocumentFilter, Notification, ProjectFilter, ProjectStatus, WorkerFilter,
};

use super::notifier::NotificationSender;
use super::rules::{budget_alert, document_alert, sort_alerts};

/// Outcome of one sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    /// Alerts currently raised
    pub evaluated: usize,
    /// Notifications created for alerts not seen before
    pub created: usize,
    /// Successful outbound deliveries
    pub delivered: usize,
}

/// Computes alerts from the store and turns new ones into notifications
pub struct AlertEvaluator {
    /// Record store
    store: Arc<dyn Store>,
    /// Outbound notification sender
    notifier: NotificationSender,
    /// Alert thresholds
    thresholds: AlertThresholds,
    /// Interval between sweeps
    check_interval: Duration,
}

impl AlertEvaluator {
    /// Create a new alert evaluator
    pub fn new(store: Arc<dyn Store>, config: &AlertingConfig) -> Result<Self> {
        Ok(Self {
            store,
            notifier: NotificationSender::new(config.channels.clone())?,
            thresholds: config.thresholds,
            check_interval: config.check_interval,
        })
    }

    /// Thresholds in use
    pub fn thresholds(&self) -> &AlertThresholds {
        &self.thresholds
    }

    /// Start the sweep loop
    pub async fn start(&self) {
        info!(interval = ?self.check_interval, "Starting alert evaluator");

        let mut ticker = interval(self.check_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            if let Err(e) = self.sweep().await {
                error!(error = %e, "Error sweeping alerts");
            }
        }
    }

    /// Alerts raised by the current records
    pub async fn current_alerts(&self) -> Result<Vec<Alert>> {
        self.alerts_on(Utc::now().date_naive()).await
    }

    /// Alerts raised by the current records as of `today`
    pub async fn alerts_on(&self, today: NaiveDate) -> Result<Vec<Alert>> {
        let workers: HashMap<_, _> = self
            .store
            .list_workers(&WorkerFilter::default())
            .await?
            .into_iter()
            .map(|w| (w.id, w))
            .collect();

        let mut alerts = Vec::new();

        let documents = self
            .store
            .list_documents(&DocumentFilter::default(), today)
            .await?;
        for document in &documents {
            let Some(worker) = workers.get(&document.worker_id) else {
                continue;
            };
            if let Some(alert) = document_alert(document, worker, today, &self.thresholds) {
                alerts.push(alert);
            }
        }

        let projects = self.store.list_projects(&ProjectFilter::default()).await?;
        for project in &projects {
            if project.status == ProjectStatus::Completed {
                continue;
            }
            let spent = self.store.project_spend(project.id).await?;
            if let Some(alert) = budget_alert(project, spent, &self.thresholds) {
                alerts.push(alert);
            }
        }

        sort_alerts(&mut alerts);

        debug!(
            documents = documents.len(),
            projects = projects.len(),
            alerts = alerts.len(),
            "Evaluated alerts"
        );

        Ok(alerts)
    }

    /// Record and deliver notifications for alerts not notified before
    pub async fn sweep(&self) -> Result<SweepReport> {
        self.sweep_on(Utc::now().date_naive()).await
    }

    /// Sweep as of `today`
    pub async fn sweep_on(&self, today: NaiveDate) -> Result<SweepReport> {
        let alerts = self.alerts_on(today).await?;
        metrics::gauge!("linkedweld_alerts_current").set(alerts.len() as f64);

        let mut report = SweepReport {
            evaluated: alerts.len(),
            ..Default::default()
        };

        for alert in alerts {
            let notification = notification_for(alert);
            // A concurrent sweep may have stored the same key first
            if !self.store.insert_notification_if_absent(&notification).await? {
                continue;
            }
            report.created += 1;
            metrics::counter!("linkedweld_notifications_created_total").increment(1);

            info!(
                notification_id = %notification.id,
                severity = notification.severity.as_str(),
                title = %notification.title,
                "Alert raised"
            );

            let delivered = self
                .notifier
                .send_all(&notification)
                .await
                .into_iter()
                .filter(|record| record.success)
                .count();
            report.delivered += delivered;
            metrics::counter!("linkedweld_notifications_delivered_total")
                .increment(delivered as u64);
        }

        info!(
            evaluated = report.evaluated,
            created = report.created,
            delivered = report.delivered,
            "Alert sweep finished"
        );

        Ok(report)
    }
}

fn notification_for(alert: Alert) -> Notification {
    Notification::new(alert.kind.into(), alert.severity, alert.title, alert.message)
        .with_entity(alert.entity_id)
        .with_dedup_key(alert.dedup_key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::models::{
        DocumentInput, DocumentType, ExpenseCategory, ExpenseInput, NotificationKind,
        ProjectInput, Severity, WorkerInput,
    };
    use chrono::Duration as Days;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
    }

    async fn setup() -> (Arc<dyn Store>, AlertEvaluator) {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let evaluator = AlertEvaluator::new(store.clone(), &AlertingConfig::default()).unwrap();
        (store, evaluator)
    }

    async fn add_trc(store: &dyn Store, days: i64) -> uuid::Uuid {
        let worker = WorkerInput {
            first_name: "Andrii".to_string(),
            last_name: "Melnyk".to_string(),
            ..Default::default()
        }
        .into_worker()
        .unwrap();
        store.insert_worker(&worker).await.unwrap();

        let document = DocumentInput {
            doc_type: DocumentType::Trc,
            number: None,
            issued_on: None,
            expires_on: Some(today() + Days::days(days)),
            notes: None,
        }
        .into_document(worker.id)
        .unwrap();
        store.insert_document(&document).await.unwrap();
        document.id
    }

    #[tokio::test]
    async fn test_alerts_cover_documents_and_budgets() {
        let (store, evaluator) = setup().await;
        add_trc(store.as_ref(), 45).await;

        let project = ProjectInput {
            name: "Boiler house".to_string(),
            budget: 1_000.0,
            ..Default::default()
        }
        .into_project()
        .unwrap();
        store.insert_project(&project).await.unwrap();
        let expense = ExpenseInput {
            category: ExpenseCategory::Labor,
            amount: 950.0,
            description: None,
            incurred_on: None,
        }
        .into_expense(project.id)
        .unwrap();
        store.insert_expense(&expense).await.unwrap();

        let alerts = evaluator.alerts_on(today()).await.unwrap();
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].severity, Severity::Critical);
        assert_eq!(alerts[0].project_id, Some(project.id));
        assert_eq!(alerts[1].severity, Severity::Warning);
    }

    #[tokio::test]
    async fn test_sweep_deduplicates() {
        let (store, evaluator) = setup().await;
        let document_id = add_trc(store.as_ref(), 10).await;

        let first = evaluator.sweep_on(today()).await.unwrap();
        assert_eq!(
            first,
            SweepReport {
                evaluated: 1,
                created: 1,
                delivered: 0
            }
        );

        let second = evaluator.sweep_on(today()).await.unwrap();
        assert_eq!(second.evaluated, 1);
        assert_eq!(second.created, 0);

        let notifications = store.list_notifications(false).await.unwrap();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].kind, NotificationKind::DocumentExpiry);
        assert_eq!(notifications[0].entity_id, Some(document_id));
    }

    #[tokio::test]
    async fn test_escalation_creates_new_notification() {
        let (store, evaluator) = setup().await;
        add_trc(store.as_ref(), 40).await;

        assert_eq!(evaluator.sweep_on(today()).await.unwrap().created, 1);
        // Ten days later the same document crosses into the critical band
        let later = today() + Days::days(10);
        assert_eq!(evaluator.sweep_on(later).await.unwrap().created, 1);

        let severities: Vec<Severity> = store
            .list_notifications(false)
            .await
            .unwrap()
            .iter()
            .map(|n| n.severity)
            .collect();
        assert!(severities.contains(&Severity::Warning));
        assert!(severities.contains(&Severity::Critical));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_sweeps_notify_once() {
        let (store, evaluator) = setup().await;
        add_trc(store.as_ref(), 5).await;

        let (a, b) = tokio::join!(evaluator.sweep_on(today()), evaluator.sweep_on(today()));
        assert_eq!(a.unwrap().created + b.unwrap().created, 1);
        assert_eq!(store.list_notifications(false).await.unwrap().len(), 1);
    }
}
