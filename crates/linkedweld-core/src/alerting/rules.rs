//! Alert rules for document expiry and project budgets

use std::cmp::Ordering;

use chrono::NaiveDate;

use crate::config::AlertThresholds;
use crate::models::{
    Alert, AlertKind, BudgetLevel, BudgetSummary, Document, Project, ProjectStatus, Severity,
    Worker, WorkerStatus,
};

/// Dedup key for a document alert at a given severity
pub fn document_dedup_key(document_id: impl std::fmt::Display, severity: Severity) -> String {
    format!("document:{}:{}", document_id, severity.as_str())
}

/// Dedup key for a budget alert at a given severity
pub fn budget_dedup_key(project_id: impl std::fmt::Display, severity: Severity) -> String {
    format!("budget:{}:{}", project_id, severity.as_str())
}

/// Severity for a document expiring in `days` (negative once expired)
pub fn expiry_severity(days: i64, thresholds: &AlertThresholds) -> Option<Severity> {
    if days <= thresholds.document_critical_days {
        Some(Severity::Critical)
    } else if days <= thresholds.document_warning_days {
        Some(Severity::Warning)
    } else {
        None
    }
}

/// Alert for a worker document, if it is inside the warning window.
///
/// Undated documents and documents of inactive workers never alert.
pub fn document_alert(
    document: &Document,
    worker: &Worker,
    today: NaiveDate,
    thresholds: &AlertThresholds,
) -> Option<Alert> {
    if worker.status == WorkerStatus::Inactive {
        return None;
    }

    let days = document.days_until_expiry(today)?;
    let severity = expiry_severity(days, thresholds)?;
    let label = document.doc_type.label();
    let name = worker.full_name();

    let (title, message) = if days < 0 {
        (
            format!("{label} expired: {name}"),
            format!("{label} of {name} expired {} day(s) ago", -days),
        )
    } else if days == 0 {
        (
            format!("{label} expires today: {name}"),
            format!("{label} of {name} expires today"),
        )
    } else {
        (
            format!("{label} expiring: {name}"),
            format!("{label} of {name} expires in {days} day(s)"),
        )
    };

    Some(Alert {
        kind: AlertKind::DocumentExpiry,
        severity,
        title,
        message,
        entity_id: document.id,
        worker_id: Some(worker.id),
        project_id: None,
        days_remaining: Some(days),
        ratio: None,
        dedup_key: document_dedup_key(document.id, severity),
    })
}

/// Spend to budget ratio, zero when there is no budget
pub fn budget_ratio(budget: f64, spent: f64) -> f64 {
    if budget > 0.0 {
        spent / budget
    } else {
        0.0
    }
}

/// Budget level for a ratio; both bounds are strict
pub fn budget_level(ratio: f64, thresholds: &AlertThresholds) -> BudgetLevel {
    if ratio > thresholds.budget_critical_ratio {
        BudgetLevel::Critical
    } else if ratio > thresholds.budget_warning_ratio {
        BudgetLevel::Warning
    } else {
        BudgetLevel::Ok
    }
}

/// Spend summary for a project
pub fn budget_summary(project: &Project, spent: f64, thresholds: &AlertThresholds) -> BudgetSummary {
    let ratio = budget_ratio(project.budget, spent);
    let level = if project.budget > 0.0 {
        budget_level(ratio, thresholds)
    } else {
        BudgetLevel::Ok
    };

    BudgetSummary {
        project_id: project.id,
        budget: project.budget,
        spent,
        remaining: project.budget - spent,
        ratio,
        level,
    }
}

/// Alert for a project whose spend is in the warning or critical band.
///
/// Completed projects and projects without a budget never alert.
pub fn budget_alert(project: &Project, spent: f64, thresholds: &AlertThresholds) -> Option<Alert> {
    if project.status == ProjectStatus::Completed || project.budget <= 0.0 {
        return None;
    }

    let ratio = budget_ratio(project.budget, spent);
    let severity = match budget_level(ratio, thresholds) {
        BudgetLevel::Critical => Severity::Critical,
        BudgetLevel::Warning => Severity::Warning,
        BudgetLevel::Ok => return None,
    };

    let percent = ratio * 100.0;
    let title = if ratio > 1.0 {
        format!("Over budget: {}", project.name)
    } else {
        format!("Budget at {percent:.0}%: {}", project.name)
    };

    Some(Alert {
        kind: AlertKind::Budget,
        severity,
        title,
        message: format!(
            "{} has spent {:.2} of {:.2} ({:.1}%)",
            project.name, spent, project.budget, percent
        ),
        entity_id: project.id,
        worker_id: None,
        project_id: Some(project.id),
        days_remaining: None,
        ratio: Some(ratio),
        dedup_key: budget_dedup_key(project.id, severity),
    })
}

/// Order alerts critical first, then most urgent: fewest days left, highest ratio
pub fn sort_alerts(alerts: &mut [Alert]) {
    alerts.sort_by(|a, b| {
        b.severity
            .cmp(&a.severity)
            .then_with(|| urgency(a, b))
            .then_with(|| a.title.cmp(&b.title))
    });
}

fn urgency(a: &Alert, b: &Alert) -> Ordering {
    match (a.days_remaining, b.days_remaining) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => {
            let x = a.ratio.unwrap_or_default();
            let y = b.ratio.unwrap_or_default();
            y.partial_cmp(&x).unwrap_or(Ordering::Equal)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DocumentInput, DocumentType, ProjectInput, WorkerInput};
    use chrono::Duration;
    use rstest::rstest;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    fn worker(status: WorkerStatus) -> Worker {
        WorkerInput {
            first_name: "Oleh".to_string(),
            last_name: "Kovalenko".to_string(),
            status: Some(status),
            ..Default::default()
        }
        .into_worker()
        .unwrap()
    }

    fn trc(worker: &Worker, days: Option<i64>) -> Document {
        DocumentInput {
            doc_type: DocumentType::Trc,
            number: None,
            issued_on: None,
            expires_on: days.map(|d| today() + Duration::days(d)),
            notes: None,
        }
        .into_document(worker.id)
        .unwrap()
    }

    fn project(budget: f64, status: ProjectStatus) -> Project {
        ProjectInput {
            name: "Pipe rack".to_string(),
            status: Some(status),
            budget,
            ..Default::default()
        }
        .into_project()
        .unwrap()
    }

    #[rstest]
    #[case(-10, Some(Severity::Critical))]
    #[case(0, Some(Severity::Critical))]
    #[case(30, Some(Severity::Critical))]
    #[case(31, Some(Severity::Warning))]
    #[case(90, Some(Severity::Warning))]
    #[case(91, None)]
    #[case(365, None)]
    fn test_expiry_severity(#[case] days: i64, #[case] expected: Option<Severity>) {
        assert_eq!(expiry_severity(days, &AlertThresholds::default()), expected);
    }

    #[rstest]
    #[case(0.0, BudgetLevel::Ok)]
    #[case(0.7, BudgetLevel::Ok)]
    #[case(0.71, BudgetLevel::Warning)]
    #[case(0.9, BudgetLevel::Warning)]
    #[case(0.91, BudgetLevel::Critical)]
    #[case(1.5, BudgetLevel::Critical)]
    fn test_budget_level(#[case] ratio: f64, #[case] expected: BudgetLevel) {
        assert_eq!(budget_level(ratio, &AlertThresholds::default()), expected);
    }

    #[test]
    fn test_document_alert_for_expired_trc() {
        let w = worker(WorkerStatus::Active);
        let doc = trc(&w, Some(-3));
        let alert = document_alert(&doc, &w, today(), &AlertThresholds::default()).unwrap();

        assert_eq!(alert.severity, Severity::Critical);
        assert_eq!(alert.days_remaining, Some(-3));
        assert_eq!(alert.worker_id, Some(w.id));
        assert_eq!(alert.dedup_key, format!("document:{}:critical", doc.id));
        assert!(alert.title.contains("expired"));
    }

    #[test]
    fn test_document_alert_skips_inactive_and_undated() {
        let thresholds = AlertThresholds::default();
        let inactive = worker(WorkerStatus::Inactive);
        assert!(document_alert(&trc(&inactive, Some(5)), &inactive, today(), &thresholds).is_none());

        let active = worker(WorkerStatus::OnLeave);
        assert!(document_alert(&trc(&active, None), &active, today(), &thresholds).is_none());
        assert!(document_alert(&trc(&active, Some(60)), &active, today(), &thresholds).is_some());
    }

    #[test]
    fn test_budget_alert_rules() {
        let thresholds = AlertThresholds::default();
        let active = project(10_000.0, ProjectStatus::Active);

        let critical = budget_alert(&active, 9_500.0, &thresholds).unwrap();
        assert_eq!(critical.severity, Severity::Critical);
        assert_eq!(critical.dedup_key, format!("budget:{}:critical", active.id));

        let warning = budget_alert(&active, 7_500.0, &thresholds).unwrap();
        assert_eq!(warning.severity, Severity::Warning);

        assert!(budget_alert(&active, 7_000.0, &thresholds).is_none());
        assert!(budget_alert(&project(10_000.0, ProjectStatus::Completed), 9_999.0, &thresholds)
            .is_none());
        assert!(budget_alert(&project(0.0, ProjectStatus::Active), 500.0, &thresholds).is_none());
    }

    #[test]
    fn test_budget_summary_without_budget() {
        let summary = budget_summary(
            &project(0.0, ProjectStatus::Planned),
            250.0,
            &AlertThresholds::default(),
        );
        assert_eq!(summary.ratio, 0.0);
        assert_eq!(summary.remaining, -250.0);
        assert_eq!(summary.level, BudgetLevel::Ok);
    }

    #[test]
    fn test_sort_alerts_critical_and_urgent_first() {
        let thresholds = AlertThresholds::default();
        let w = worker(WorkerStatus::Active);
        let p = project(1_000.0, ProjectStatus::Active);

        let mut alerts = vec![
            document_alert(&trc(&w, Some(80)), &w, today(), &thresholds).unwrap(),
            budget_alert(&p, 950.0, &thresholds).unwrap(),
            document_alert(&trc(&w, Some(2)), &w, today(), &thresholds).unwrap(),
            document_alert(&trc(&w, Some(-1)), &w, today(), &thresholds).unwrap(),
        ];
        sort_alerts(&mut alerts);

        let order: Vec<(Severity, Option<i64>)> = alerts
            .iter()
            .map(|a| (a.severity, a.days_remaining))
            .collect();
        assert_eq!(
            order,
            [
                (Severity::Critical, Some(-1)),
                (Severity::Critical, Some(2)),
                (Severity::Critical, None),
                (Severity::Warning, Some(80)),
            ]
        );
    }
}
