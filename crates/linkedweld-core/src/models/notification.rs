//! Stored notifications and outbound channel configuration

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Severity;

/// What a notification is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Document expiry alert
    DocumentExpiry,
    /// Budget alert
    Budget,
    /// Recruitment event
    Recruitment,
    /// System message
    System,
}

/// A notification shown in the dashboard inbox
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// Unique identifier
    pub id: Uuid,

    /// What the notification is about
    pub kind: NotificationKind,

    /// Severity level
    pub severity: Severity,

    /// Short headline
    pub title: String,

    /// Human-readable message
    pub message: String,

    /// Record the notification refers to
    pub entity_id: Option<Uuid>,

    /// Key used to avoid notifying twice for the same condition
    pub dedup_key: Option<String>,

    /// Whether a user has seen it
    pub read: bool,

    /// When it was created
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Create an unread notification
    pub fn new(
        kind: NotificationKind,
        severity: Severity,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            severity,
            title: title.into(),
            message: message.into(),
            entity_id: None,
            dedup_key: None,
            read: false,
            created_at: Utc::now(),
        }
    }

    /// Attach the record this notification refers to
    pub fn with_entity(mut self, entity_id: Uuid) -> Self {
        self.entity_id = Some(entity_id);
        self
    }

    /// Attach a deduplication key
    pub fn with_dedup_key(mut self, key: impl Into<String>) -> Self {
        self.dedup_key = Some(key.into());
        self
    }
}

/// Query for listing notifications
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationQuery {
    /// Only unread notifications
    #[serde(default)]
    pub unread_only: bool,
}

/// Outbound notification channel configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotificationChannel {
    /// Slack incoming webhook
    Slack {
        webhook_url: String,
        channel: Option<String>,
        #[serde(default)]
        min_severity: Severity,
    },
    /// Generic JSON webhook
    Webhook {
        url: String,
        headers: Option<serde_json::Value>,
        #[serde(default)]
        min_severity: Severity,
    },
}

impl NotificationChannel {
    /// Channel type name
    pub fn channel_type(&self) -> &'static str {
        match self {
            Self::Slack { .. } => "slack",
            Self::Webhook { .. } => "webhook",
        }
    }

    /// Lowest severity this channel delivers
    pub fn min_severity(&self) -> Severity {
        match self {
            Self::Slack { min_severity, .. } | Self::Webhook { min_severity, .. } => *min_severity,
        }
    }
}

/// Record of a delivery attempt to one channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRecord {
    /// Channel type
    pub channel_type: String,

    /// When it was sent
    pub sent_at: DateTime<Utc>,

    /// Whether it succeeded
    pub success: bool,

    /// Error message if failed
    pub error: Option<String>,
}
