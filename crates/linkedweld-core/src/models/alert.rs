//! Alert data models

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::NotificationKind;

/// Alert severity level
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational
    Info,
    /// Warning
    #[default]
    Warning,
    /// Critical
    Critical,
}

impl Severity {
    /// Lowercase name, matching the wire format
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }
}

/// What raised an alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    /// A worker document is expiring or expired
    DocumentExpiry,
    /// A project is close to or over budget
    Budget,
}

impl From<AlertKind> for NotificationKind {
    fn from(kind: AlertKind) -> Self {
        match kind {
            AlertKind::DocumentExpiry => NotificationKind::DocumentExpiry,
            AlertKind::Budget => NotificationKind::Budget,
        }
    }
}

/// A condition that needs attention, computed from current records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    /// What raised the alert
    pub kind: AlertKind,

    /// Severity level
    pub severity: Severity,

    /// Short headline
    pub title: String,

    /// Human-readable message
    pub message: String,

    /// Document or project the alert is about
    pub entity_id: Uuid,

    /// Worker concerned (document alerts)
    pub worker_id: Option<Uuid>,

    /// Project concerned (budget alerts)
    pub project_id: Option<Uuid>,

    /// Days until expiry; negative once expired
    pub days_remaining: Option<i64>,

    /// Spend to budget ratio
    pub ratio: Option<f64>,

    /// Stable key for deduplicating notifications
    pub dedup_key: String,
}
