//! Notification entities - queue entries, in-app rows, templates, and stats

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DomainError;

/// Failure reason prefix marking an entry suppressed by user preference
pub const SUPPRESSED_PREFIX: &str = "suppressed:";
/// Suppressed because the channel is switched off for the event type
pub const SUPPRESSED_CHANNEL_DISABLED: &str = "suppressed:channel_disabled";
/// Suppressed because the dispatch time falls inside quiet hours or days
pub const SUPPRESSED_QUIET_HOURS: &str = "suppressed:quiet_hours";

// ============================================================================
// Channel
// ============================================================================

/// Delivery channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationChannel {
    Push,
    InApp,
    Email,
    Sms,
}

impl NotificationChannel {
    pub const ALL: [Self; 4] = [Self::Push, Self::InApp, Self::Email, Self::Sms];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Push => "push",
            Self::InApp => "in_app",
            Self::Email => "email",
            Self::Sms => "sms",
        }
    }
}

impl fmt::Display for NotificationChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationChannel {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| DomainError::ValidationError(format!("unknown channel: {s}")))
    }
}

// ============================================================================
// Event Type
// ============================================================================

/// Event types producers enqueue notifications for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationEventType {
    TaskCreated,
    TaskAccepted,
    TaskCancelled,
    TaskCompleted,
    DisputeCreated,
    ChatNewMessage,
    SupportCreated,
    SupportUpdated,
    SupportResolved,
    AdminSystemAlert,
    AdminUserReport,
}

impl NotificationEventType {
    pub const ALL: [Self; 11] = [
        Self::TaskCreated,
        Self::TaskAccepted,
        Self::TaskCancelled,
        Self::TaskCompleted,
        Self::DisputeCreated,
        Self::ChatNewMessage,
        Self::SupportCreated,
        Self::SupportUpdated,
        Self::SupportResolved,
        Self::AdminSystemAlert,
        Self::AdminUserReport,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::TaskCreated => "task_created",
            Self::TaskAccepted => "task_accepted",
            Self::TaskCancelled => "task_cancelled",
            Self::TaskCompleted => "task_completed",
            Self::DisputeCreated => "dispute_created",
            Self::ChatNewMessage => "chat_new_message",
            Self::SupportCreated => "support_created",
            Self::SupportUpdated => "support_updated",
            Self::SupportResolved => "support_resolved",
            Self::AdminSystemAlert => "admin_system_alert",
            Self::AdminUserReport => "admin_user_report",
        }
    }

    /// Default (push, in_app, email) switches for a freshly created preference.
    /// SMS is always off by default.
    pub fn default_channels(self) -> ChannelToggles {
        let email = match self {
            Self::TaskCreated
            | Self::TaskAccepted
            | Self::TaskCancelled
            | Self::ChatNewMessage
            | Self::SupportUpdated => false,
            Self::TaskCompleted
            | Self::DisputeCreated
            | Self::SupportCreated
            | Self::SupportResolved
            | Self::AdminSystemAlert
            | Self::AdminUserReport => true,
        };
        ChannelToggles {
            push: true,
            in_app: true,
            email,
            sms: false,
        }
    }
}

impl fmt::Display for NotificationEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationEventType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|e| e.as_str() == s)
            .ok_or_else(|| DomainError::ValidationError(format!("unknown event type: {s}")))
    }
}

/// One boolean per channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChannelToggles {
    pub push: bool,
    pub in_app: bool,
    pub email: bool,
    pub sms: bool,
}

impl ChannelToggles {
    pub fn get(&self, channel: NotificationChannel) -> bool {
        match channel {
            NotificationChannel::Push => self.push,
            NotificationChannel::InApp => self.in_app,
            NotificationChannel::Email => self.email,
            NotificationChannel::Sms => self.sms,
        }
    }

    pub fn set(&mut self, channel: NotificationChannel, enabled: bool) {
        match channel {
            NotificationChannel::Push => self.push = enabled,
            NotificationChannel::InApp => self.in_app = enabled,
            NotificationChannel::Email => self.email = enabled,
            NotificationChannel::Sms => self.sms = enabled,
        }
    }
}

// ============================================================================
// Queue Entry
// ============================================================================

/// Queue entry status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum QueueStatus {
    #[default]
    Pending,
    Sent,
    Failed,
}

impl QueueStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Sent => "sent",
            Self::Failed => "failed",
        }
    }

    /// Sent and failed entries are never picked up again
    #[inline]
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for QueueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueueStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "sent" => Ok(Self::Sent),
            "failed" => Ok(Self::Failed),
            other => Err(DomainError::InvalidStatus(other.to_string())),
        }
    }
}

/// A notification waiting for (or done with) dispatch
///
/// `event_type` and `channel` stay as stored strings: producers outside this
/// system write them, and an unrecognised value must fail the entry rather
/// than the whole batch load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationQueueEntry {
    pub id: i64,
    pub target_user_id: i64,
    pub event_type: String,
    pub channel: String,
    pub template_key: String,
    pub payload: Value,
    pub status: QueueStatus,
    pub retry_count: i32,
    pub next_attempt_at: DateTime<Utc>,
    pub failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NotificationQueueEntry {
    /// Create a pending entry due immediately (id is assigned by the store)
    pub fn pending(
        target_user_id: i64,
        event_type: NotificationEventType,
        channel: NotificationChannel,
        template_key: impl Into<String>,
        payload: Value,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            target_user_id,
            event_type: event_type.as_str().to_string(),
            channel: channel.as_str().to_string(),
            template_key: template_key.into(),
            payload,
            status: QueueStatus::Pending,
            retry_count: 0,
            next_attempt_at: now,
            failure_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn channel(&self) -> Option<NotificationChannel> {
        self.channel.parse().ok()
    }

    pub fn event_kind(&self) -> Option<NotificationEventType> {
        self.event_type.parse().ok()
    }

    /// Check if the entry failed because the user's preferences suppressed it
    pub fn is_suppressed(&self) -> bool {
        self.status == QueueStatus::Failed
            && self
                .failure_reason
                .as_deref()
                .is_some_and(|r| r.starts_with(SUPPRESSED_PREFIX))
    }
}

// ============================================================================
// In-App Notification
// ============================================================================

/// Notification shown inside the application
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InAppNotification {
    pub id: i64,
    pub user_id: i64,
    pub queue_entry_id: Option<i64>,
    pub title: String,
    pub body: String,
    pub is_read: bool,
    pub is_pinned: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl InAppNotification {
    pub fn new(user_id: i64, title: String, body: String) -> Self {
        Self {
            id: 0,
            user_id,
            queue_entry_id: None,
            title,
            body,
            is_read: false,
            is_pinned: false,
            read_at: None,
            expires_at: None,
            created_at: Utc::now(),
        }
    }

    #[inline]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }

    /// Mark as read; the first read time is kept
    pub fn mark_read(&mut self, now: DateTime<Utc>) {
        if !self.is_read {
            self.is_read = true;
            self.read_at = Some(now);
        }
    }
}

// ============================================================================
// Templates
// ============================================================================

/// Title/body text produced for one queue entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedNotification {
    pub title: String,
    pub body: String,
}

impl RenderedNotification {
    /// Use the payload's own `title`/`body` when no template exists
    pub fn from_payload(payload: &Value) -> Option<Self> {
        let title = payload.get("title").and_then(Value::as_str);
        let body = payload.get("body").and_then(Value::as_str);
        if title.is_none() && body.is_none() {
            return None;
        }
        Some(Self {
            title: title.unwrap_or_default().to_string(),
            body: body.unwrap_or_default().to_string(),
        })
    }
}

/// Per-channel message template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationTemplate {
    pub template_key: String,
    pub channel: String,
    pub title_template: String,
    pub body_template: String,
}

impl NotificationTemplate {
    pub fn render(&self, payload: &Value) -> RenderedNotification {
        RenderedNotification {
            title: render_placeholders(&self.title_template, payload),
            body: render_placeholders(&self.body_template, payload),
        }
    }
}

/// Replace `{{name}}` placeholders with values from a JSON object.
///
/// Strings are inserted verbatim, other scalars via their JSON text, and
/// missing keys become empty. Unterminated `{{` is copied through.
pub fn render_placeholders(template: &str, payload: &Value) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            out.push_str(&rest[start..]);
            return out;
        };
        let key = after[..end].trim();
        match payload.get(key) {
            Some(Value::String(s)) => out.push_str(s),
            Some(Value::Null) | None => {}
            Some(other) => out.push_str(&other.to_string()),
        }
        rest = &after[end + 2..];
    }
    out.push_str(rest);
    out
}

// ============================================================================
// Delivery Statistics
// ============================================================================

/// Daily counters per template and channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryStat {
    pub day: NaiveDate,
    pub template_key: String,
    pub channel: String,
    pub sent: i64,
    pub delivered: i64,
    pub failed: i64,
}

impl DeliveryStat {
    pub fn new(day: NaiveDate, template_key: impl Into<String>, channel: impl Into<String>) -> Self {
        Self {
            day,
            template_key: template_key.into(),
            channel: channel.into(),
            sent: 0,
            delivered: 0,
            failed: 0,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sent == 0 && self.delivered == 0 && self.failed == 0
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_default_channel_matrix() {
        let task = NotificationEventType::TaskCreated.default_channels();
        assert!(task.push && task.in_app && !task.email && !task.sms);

        let done = NotificationEventType::TaskCompleted.default_channels();
        assert!(done.push && done.in_app && done.email && !done.sms);

        let updated = NotificationEventType::SupportUpdated.default_channels();
        assert!(!updated.email);
        assert!(NotificationEventType::SupportResolved.default_channels().email);

        for event in NotificationEventType::ALL {
            assert!(!event.default_channels().sms, "{event} must default sms off");
        }
    }

    #[test]
    fn test_enum_parsing() {
        assert_eq!(
            "in_app".parse::<NotificationChannel>().unwrap(),
            NotificationChannel::InApp
        );
        assert!("fax".parse::<NotificationChannel>().is_err());
        assert_eq!(
            "dispute_created".parse::<NotificationEventType>().unwrap(),
            NotificationEventType::DisputeCreated
        );
        assert!("failed".parse::<QueueStatus>().unwrap().is_terminal());
        assert!(!QueueStatus::Pending.is_terminal());
    }

    #[test]
    fn test_render_placeholders() {
        let payload = json!({"name": "Mina", "count": 3, "empty": null});
        assert_eq!(
            render_placeholders("Hi {{name}}, {{ count }} new{{empty}}{{missing}}", &payload),
            "Hi Mina, 3 new"
        );
        assert_eq!(render_placeholders("broken {{name", &payload), "broken {{name");
        assert_eq!(render_placeholders("plain", &payload), "plain");
    }

    #[test]
    fn test_template_fallback_to_payload() {
        let payload = json!({"title": "Task accepted"});
        let rendered = RenderedNotification::from_payload(&payload).unwrap();
        assert_eq!(rendered.title, "Task accepted");
        assert_eq!(rendered.body, "");

        assert!(RenderedNotification::from_payload(&json!({"task_id": 5})).is_none());
    }

    #[test]
    fn test_suppressed_entry() {
        let mut entry = NotificationQueueEntry::pending(
            1,
            NotificationEventType::ChatNewMessage,
            NotificationChannel::Push,
            "chat_new_message",
            json!({}),
        );
        assert!(!entry.is_suppressed());
        entry.status = QueueStatus::Failed;
        entry.failure_reason = Some(SUPPRESSED_QUIET_HOURS.to_string());
        assert!(entry.is_suppressed());
        assert_eq!(entry.channel(), Some(NotificationChannel::Push));
    }

    #[test]
    fn test_in_app_read_and_expiry() {
        let now = Utc::now();
        let mut n = InAppNotification::new(1, "t".into(), "b".into());
        assert!(!n.is_expired(now));
        n.expires_at = Some(now);
        assert!(n.is_expired(now));

        n.mark_read(now);
        let first = n.read_at;
        n.mark_read(now + chrono::Duration::seconds(5));
        assert_eq!(n.read_at, first);
    }
}
