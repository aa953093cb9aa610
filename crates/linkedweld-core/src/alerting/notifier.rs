//! Outbound notification delivery

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{Notification, NotificationChannel, NotificationKind, NotificationRecord, Severity};

/// Sends notifications to the configured outbound channels
pub struct NotificationSender {
    client: Client,
    channels: Vec<NotificationChannel>,
}

impl NotificationSender {
    /// Create a sender for the given channels
    pub fn new(channels: Vec<NotificationChannel>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::internal(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { client, channels })
    }

    /// Configured channels
    pub fn channels(&self) -> &[NotificationChannel] {
        &self.channels
    }

    /// Deliver a notification to every channel whose minimum severity it meets
    pub async fn send_all(&self, notification: &Notification) -> Vec<NotificationRecord> {
        let mut records = Vec::new();

        for channel in &self.channels {
            if notification.severity < channel.min_severity() {
                debug!(
                    channel = channel.channel_type(),
                    severity = notification.severity.as_str(),
                    "Below channel minimum severity, skipping"
                );
                continue;
            }
            records.push(self.send(channel, notification).await);
        }

        records
    }

    /// Deliver a notification to one channel
    pub async fn send(
        &self,
        channel: &NotificationChannel,
        notification: &Notification,
    ) -> NotificationRecord {
        let sent_at = Utc::now();

        let result = match channel {
            NotificationChannel::Slack {
                webhook_url,
                channel: slack_channel,
                ..
            } => {
                self.send_slack(webhook_url, slack_channel.as_deref(), notification)
                    .await
            }
            NotificationChannel::Webhook { url, headers, .. } => {
                self.send_webhook(url, headers.as_ref(), notification).await
            }
        };

        if let Err(e) = &result {
            warn!(
                channel = channel.channel_type(),
                notification_id = %notification.id,
                error = %e,
                "Notification delivery failed"
            );
        }

        NotificationRecord {
            channel_type: channel.channel_type().to_string(),
            sent_at,
            success: result.is_ok(),
            error: result.err().map(|e| e.to_string()),
        }
    }

    /// Send Slack notification
    async fn send_slack(
        &self,
        webhook_url: &str,
        channel: Option<&str>,
        notification: &Notification,
    ) -> std::result::Result<(), NotificationError> {
        let color = match notification.severity {
            Severity::Critical => "#dc3545",
            Severity::Warning => "#ffc107",
            Severity::Info => "#17a2b8",
        };

        let severity_emoji = match notification.severity {
            Severity::Critical => "🚨",
            Severity::Warning => "⚠️",
            Severity::Info => "ℹ️",
        };

        let payload = SlackPayload {
            channel: channel.map(String::from),
            username: Some("LinkedWeld".to_string()),
            icon_emoji: Some(":hammer_and_wrench:".to_string()),
            attachments: vec![SlackAttachment {
                color: color.to_string(),
                title: format!("{} {}", severity_emoji, notification.title),
                text: notification.message.clone(),
                fields: vec![
                    SlackField {
                        title: "Severity".to_string(),
                        value: notification.severity.as_str().to_string(),
                        short: true,
                    },
                    SlackField {
                        title: "Type".to_string(),
                        value: kind_label(notification.kind).to_string(),
                        short: true,
                    },
                ],
                footer: Some("LinkedWeld Pro".to_string()),
                ts: Some(notification.created_at.timestamp()),
            }],
        };

        let response = self
            .client
            .post(webhook_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| NotificationError::Http(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(NotificationError::Rejected(format!(
                "Slack returned {}: {}",
                status, body
            )));
        }

        info!(notification_id = %notification.id, "Slack notification sent");
        Ok(())
    }

    /// Send generic webhook notification
    async fn send_webhook(
        &self,
        url: &str,
        headers: Option<&serde_json::Value>,
        notification: &Notification,
    ) -> std::result::Result<(), NotificationError> {
        let payload = WebhookPayload {
            id: notification.id,
            kind: notification.kind,
            severity: notification.severity,
            title: &notification.title,
            message: &notification.message,
            entity_id: notification.entity_id,
            created_at: notification.created_at,
        };

        let mut request = self.client.post(url).json(&payload);

        if let Some(headers_map) = headers.and_then(serde_json::Value::as_object) {
            for (key, value) in headers_map {
                if let Some(value_str) = value.as_str() {
                    request = request.header(key, value_str);
                }
            }
        }

        let response = request
            .send()
            .await
            .map_err(|e| NotificationError::Http(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(NotificationError::Rejected(format!(
                "Webhook returned {}: {}",
                status, body
            )));
        }

        info!(notification_id = %notification.id, url = %url, "Webhook notification sent");
        Ok(())
    }
}

fn kind_label(kind: NotificationKind) -> &'static str {
    match kind {
        NotificationKind::DocumentExpiry => "Document expiry",
        NotificationKind::Budget => "Budget",
        NotificationKind::Recruitment => "Recruitment",
        NotificationKind::System => "System",
    }
}

/// Notification errors
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    /// Request could not be sent
    #[error("HTTP error: {0}")]
    Http(String),

    /// Channel answered with a non-success status
    #[error("Rejected: {0}")]
    Rejected(String),
}

// Slack payload types
#[derive(Debug, Serialize)]
struct SlackPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    channel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    icon_emoji: Option<String>,
    attachments: Vec<SlackAttachment>,
}

#[derive(Debug, Serialize)]
struct SlackAttachment {
    color: String,
    title: String,
    text: String,
    fields: Vec<SlackField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    footer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ts: Option<i64>,
}

#[derive(Debug, Serialize)]
struct SlackField {
    title: String,
    value: String,
    short: bool,
}

// Generic webhook payload
#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    id: Uuid,
    kind: NotificationKind,
    severity: Severity,
    title: &'a str,
    message: &'a str,
    entity_id: Option<Uuid>,
    created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn notification(severity: Severity) -> Notification {
        Notification::new(
            NotificationKind::DocumentExpiry,
            severity,
            "TRC expiring: Oleh Kovalenko",
            "TRC of Oleh Kovalenko expires in 12 day(s)",
        )
    }

    #[tokio::test]
    async fn test_webhook_delivery_with_headers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .and(header("x-api-key", "secret"))
            .and(body_partial_json(serde_json::json!({
                "kind": "document_expiry",
                "severity": "critical",
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let sender = NotificationSender::new(vec![NotificationChannel::Webhook {
            url: format!("{}/hook", server.uri()),
            headers: Some(serde_json::json!({ "x-api-key": "secret" })),
            min_severity: Severity::Warning,
        }])
        .unwrap();

        let records = sender.send_all(&notification(Severity::Critical)).await;
        assert_eq!(records.len(), 1);
        assert!(records[0].success, "{:?}", records[0].error);
        assert_eq!(records[0].channel_type, "webhook");
    }

    #[tokio::test]
    async fn test_slack_failure_is_recorded() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let sender = NotificationSender::new(vec![NotificationChannel::Slack {
            webhook_url: server.uri(),
            channel: Some("#site-ops".to_string()),
            min_severity: Severity::Info,
        }])
        .unwrap();

        let records = sender.send_all(&notification(Severity::Warning)).await;
        assert_eq!(records.len(), 1);
        assert!(!records[0].success);
        assert!(records[0].error.as_deref().unwrap().contains("500"));
    }

    #[tokio::test]
    async fn test_min_severity_filters_channels() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let sender = NotificationSender::new(vec![NotificationChannel::Webhook {
            url: server.uri(),
            headers: None,
            min_severity: Severity::Critical,
        }])
        .unwrap();

        assert!(sender.send_all(&notification(Severity::Warning)).await.is_empty());
    }
}
