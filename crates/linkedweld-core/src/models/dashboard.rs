//! Dashboard summary types

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Headline numbers for the dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    /// All worker records
    pub total_workers: usize,
    /// Workers with status active
    pub active_workers: usize,
    /// Workers on leave
    pub workers_on_leave: usize,
    /// Projects with status active
    pub active_projects: usize,
    /// Summed over projects that are not completed
    pub total_budget: f64,
    /// Summed over projects that are not completed
    pub total_spent: f64,
    /// Candidates per stage, keyed by stage name
    pub pipeline: BTreeMap<String, usize>,
    /// Current critical alerts
    pub critical_alerts: usize,
    /// Current warning alerts
    pub warning_alerts: usize,
    /// Documents inside the warning window, expired included
    pub expiring_documents: usize,
    /// Notifications not yet read
    pub unread_notifications: usize,
    /// When the numbers were computed
    pub generated_at: DateTime<Utc>,
}
