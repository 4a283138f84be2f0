//! Notification preferences - channel switches, overrides, and quiet hours

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Duration, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::notification::{NotificationChannel, NotificationEventType};
use crate::error::DomainError;

/// Smallest accepted UTC offset (UTC-12:00)
pub const MIN_UTC_OFFSET_MINUTES: i32 = -720;
/// Largest accepted UTC offset (UTC+14:00)
pub const MAX_UTC_OFFSET_MINUTES: i32 = 840;

/// Per-event switches; unset channels fall back to the event's default
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChannelOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub push: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_app: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sms: Option<bool>,
}

impl ChannelOverride {
    pub fn get(&self, channel: NotificationChannel) -> Option<bool> {
        match channel {
            NotificationChannel::Push => self.push,
            NotificationChannel::InApp => self.in_app,
            NotificationChannel::Email => self.email,
            NotificationChannel::Sms => self.sms,
        }
    }

    pub fn set(&mut self, channel: NotificationChannel, enabled: bool) {
        let slot = match channel {
            NotificationChannel::Push => &mut self.push,
            NotificationChannel::InApp => &mut self.in_app,
            NotificationChannel::Email => &mut self.email,
            NotificationChannel::Sms => &mut self.sms,
        };
        *slot = Some(enabled);
    }

    /// Copy every channel `other` sets onto `self`
    pub fn merge(&mut self, other: &ChannelOverride) {
        for channel in NotificationChannel::ALL {
            if let Some(enabled) = other.get(channel) {
                self.set(channel, enabled);
            }
        }
    }
}

/// A user's notification preference record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserNotificationPreference {
    pub user_id: i64,
    pub push_enabled: bool,
    pub in_app_enabled: bool,
    pub email_enabled: bool,
    pub sms_enabled: bool,
    pub quiet_hours_start: Option<NaiveTime>,
    pub quiet_hours_end: Option<NaiveTime>,
    /// ISO weekdays, Monday = 1 through Sunday = 7
    pub quiet_days: Vec<i16>,
    pub event_overrides: BTreeMap<String, ChannelOverride>,
    pub utc_offset_minutes: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserNotificationPreference {
    /// Preference created on first access
    pub fn with_defaults(user_id: i64) -> Self {
        let now = Utc::now();
        let event_overrides = NotificationEventType::ALL
            .into_iter()
            .map(|event| {
                let defaults = event.default_channels();
                let mut ov = ChannelOverride::default();
                for channel in NotificationChannel::ALL {
                    ov.set(channel, defaults.get(channel));
                }
                (event.as_str().to_string(), ov)
            })
            .collect();

        Self {
            user_id,
            push_enabled: true,
            in_app_enabled: true,
            email_enabled: true,
            sms_enabled: false,
            quiet_hours_start: None,
            quiet_hours_end: None,
            quiet_days: Vec::new(),
            event_overrides,
            utc_offset_minutes: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Global switch for a channel
    pub fn global_enabled(&self, channel: NotificationChannel) -> bool {
        match channel {
            NotificationChannel::Push => self.push_enabled,
            NotificationChannel::InApp => self.in_app_enabled,
            NotificationChannel::Email => self.email_enabled,
            NotificationChannel::Sms => self.sms_enabled,
        }
    }

    /// Whether `channel` may carry notifications of `event_type`.
    ///
    /// The global switch must be on. The event override decides next, then
    /// the event's default matrix; unknown event types follow the global switch.
    pub fn channel_enabled(&self, event_type: &str, channel: NotificationChannel) -> bool {
        if !self.global_enabled(channel) {
            return false;
        }
        self.event_overrides
            .get(event_type)
            .and_then(|ov| ov.get(channel))
            .or_else(|| {
                event_type
                    .parse::<NotificationEventType>()
                    .ok()
                    .map(|e| e.default_channels().get(channel))
            })
            .unwrap_or(true)
    }

    /// Whether `at` falls on a quiet day or inside the quiet-hours window,
    /// evaluated in the user's local time.
    pub fn is_quiet_at(&self, at: DateTime<Utc>) -> bool {
        let local = at.naive_utc() + Duration::minutes(i64::from(self.utc_offset_minutes));

        let weekday = local.weekday().number_from_monday() as i16;
        if self.quiet_days.contains(&weekday) {
            return true;
        }

        let (Some(start), Some(end)) = (self.quiet_hours_start, self.quiet_hours_end) else {
            return false;
        };
        let time = local.time().with_nanosecond(0).unwrap_or(local.time());
        match start.cmp(&end) {
            std::cmp::Ordering::Equal => false,
            std::cmp::Ordering::Less => start <= time && time < end,
            std::cmp::Ordering::Greater => time >= start || time < end,
        }
    }
}

// ============================================================================
// Partial Update
// ============================================================================

/// A validated partial update to a preference record.
///
/// Built from the raw JSON document so every field can be checked before
/// anything is written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreferenceUpdate {
    pub push_enabled: Option<bool>,
    pub in_app_enabled: Option<bool>,
    pub email_enabled: Option<bool>,
    pub sms_enabled: Option<bool>,
    /// `Some(None)` clears the window
    pub quiet_hours: Option<Option<(NaiveTime, NaiveTime)>>,
    pub quiet_days: Option<Vec<i16>>,
    pub event_overrides: Option<BTreeMap<String, ChannelOverride>>,
    pub utc_offset_minutes: Option<i32>,
}

fn invalid(field: &str, reason: impl Into<String>) -> DomainError {
    DomainError::InvalidPreference {
        field: field.to_string(),
        reason: reason.into(),
    }
}

/// Parse a strict `HH:MM:SS` time
pub fn parse_clock_time(value: &str) -> Option<NaiveTime> {
    let bytes = value.as_bytes();
    if bytes.len() != 8 || bytes[2] != b':' || bytes[5] != b':' {
        return None;
    }
    let digits = [0usize, 1, 3, 4, 6, 7];
    if !digits.iter().all(|&i| bytes[i].is_ascii_digit()) {
        return None;
    }
    let num = |i: usize| u32::from(bytes[i] - b'0') * 10 + u32::from(bytes[i + 1] - b'0');
    NaiveTime::from_hms_opt(num(0), num(3), num(6))
}

fn parse_bool(obj: &Map<String, Value>, field: &str) -> Result<Option<bool>, DomainError> {
    match obj.get(field) {
        None => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(_) => Err(invalid(field, "must be a boolean")),
    }
}

fn parse_time_field(value: &Value, field: &str) -> Result<Option<NaiveTime>, DomainError> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => parse_clock_time(s)
            .map(Some)
            .ok_or_else(|| invalid(field, "must match HH:MM:SS")),
        _ => Err(invalid(field, "must be a HH:MM:SS string or null")),
    }
}

const KNOWN_FIELDS: [&str; 9] = [
    "push_enabled",
    "in_app_enabled",
    "email_enabled",
    "sms_enabled",
    "quiet_hours_start",
    "quiet_hours_end",
    "quiet_days",
    "event_overrides",
    "utc_offset_minutes",
];

impl PreferenceUpdate {
    /// Validate a partial preference document
    pub fn from_json(doc: &Value) -> Result<Self, DomainError> {
        let obj = doc
            .as_object()
            .ok_or_else(|| invalid("$", "preference update must be a JSON object"))?;

        if let Some(unknown) = obj.keys().find(|k| !KNOWN_FIELDS.contains(&k.as_str())) {
            return Err(invalid(unknown, "unknown field"));
        }

        let mut update = Self {
            push_enabled: parse_bool(obj, "push_enabled")?,
            in_app_enabled: parse_bool(obj, "in_app_enabled")?,
            email_enabled: parse_bool(obj, "email_enabled")?,
            sms_enabled: parse_bool(obj, "sms_enabled")?,
            ..Self::default()
        };

        match (obj.get("quiet_hours_start"), obj.get("quiet_hours_end")) {
            (None, None) => {}
            (Some(start), Some(end)) => {
                let start = parse_time_field(start, "quiet_hours_start")?;
                let end = parse_time_field(end, "quiet_hours_end")?;
                update.quiet_hours = match (start, end) {
                    (Some(s), Some(e)) => Some(Some((s, e))),
                    (None, None) => Some(None),
                    _ => {
                        return Err(invalid(
                            "quiet_hours_start",
                            "start and end must both be set or both be null",
                        ))
                    }
                };
            }
            (Some(_), None) => {
                return Err(invalid("quiet_hours_end", "required with quiet_hours_start"))
            }
            (None, Some(_)) => {
                return Err(invalid("quiet_hours_start", "required with quiet_hours_end"))
            }
        }

        if let Some(days) = obj.get("quiet_days") {
            let items = days
                .as_array()
                .ok_or_else(|| invalid("quiet_days", "must be an array of integers 1-7"))?;
            let mut parsed = Vec::with_capacity(items.len());
            for item in items {
                let day = item
                    .as_i64()
                    .filter(|d| (1..=7).contains(d))
                    .ok_or_else(|| invalid("quiet_days", "values must be integers 1-7"))?;
                parsed.push(day as i16);
            }
            parsed.sort_unstable();
            parsed.dedup();
            update.quiet_days = Some(parsed);
        }

        if let Some(overrides) = obj.get("event_overrides") {
            update.event_overrides = Some(parse_overrides(overrides)?);
        }

        if let Some(offset) = obj.get("utc_offset_minutes") {
            let minutes = offset
                .as_i64()
                .filter(|m| {
                    (i64::from(MIN_UTC_OFFSET_MINUTES)..=i64::from(MAX_UTC_OFFSET_MINUTES))
                        .contains(m)
                })
                .ok_or_else(|| invalid("utc_offset_minutes", "must be an integer in -720..=840"))?;
            update.utc_offset_minutes = Some(minutes as i32);
        }

        Ok(update)
    }

    /// Check if the update changes nothing
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply to an existing record
    pub fn apply(self, pref: &mut UserNotificationPreference) {
        if let Some(v) = self.push_enabled {
            pref.push_enabled = v;
        }
        if let Some(v) = self.in_app_enabled {
            pref.in_app_enabled = v;
        }
        if let Some(v) = self.email_enabled {
            pref.email_enabled = v;
        }
        if let Some(v) = self.sms_enabled {
            pref.sms_enabled = v;
        }
        if let Some(window) = self.quiet_hours {
            pref.quiet_hours_start = window.map(|(s, _)| s);
            pref.quiet_hours_end = window.map(|(_, e)| e);
        }
        if let Some(days) = self.quiet_days {
            pref.quiet_days = days;
        }
        if let Some(overrides) = self.event_overrides {
            for (event, ov) in overrides {
                pref.event_overrides.entry(event).or_default().merge(&ov);
            }
        }
        if let Some(offset) = self.utc_offset_minutes {
            pref.utc_offset_minutes = offset;
        }
        pref.updated_at = Utc::now();
    }
}

fn parse_overrides(value: &Value) -> Result<BTreeMap<String, ChannelOverride>, DomainError> {
    let obj = value
        .as_object()
        .ok_or_else(|| invalid("event_overrides", "must be an object keyed by event type"))?;

    let mut out = BTreeMap::new();
    for (event, channels) in obj {
        let field = format!("event_overrides.{event}");
        if event.parse::<NotificationEventType>().is_err() {
            return Err(invalid(&field, "unknown event type"));
        }
        let channels = channels
            .as_object()
            .ok_or_else(|| invalid(&field, "must be an object of channel switches"))?;

        let mut ov = ChannelOverride::default();
        for (key, enabled) in channels {
            let channel: NotificationChannel = key
                .parse()
                .map_err(|_| invalid(&format!("{field}.{key}"), "unknown channel"))?;
            let enabled = enabled
                .as_bool()
                .ok_or_else(|| invalid(&format!("{field}.{key}"), "must be a boolean"))?;
            ov.set(channel, enabled);
        }
        out.insert(event.clone(), ov);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn test_defaults() {
        let pref = UserNotificationPreference::with_defaults(42);
        assert!(pref.push_enabled && pref.in_app_enabled && pref.email_enabled);
        assert!(!pref.sms_enabled);
        assert!(pref.quiet_hours_start.is_none());
        assert_eq!(pref.event_overrides.len(), NotificationEventType::ALL.len());

        assert!(!pref.channel_enabled("task_created", NotificationChannel::Email));
        assert!(pref.channel_enabled("task_completed", NotificationChannel::Email));
        assert!(!pref.channel_enabled("task_completed", NotificationChannel::Sms));
    }

    #[test]
    fn test_global_switch_wins() {
        let mut pref = UserNotificationPreference::with_defaults(1);
        pref.push_enabled = false;
        assert!(!pref.channel_enabled("task_completed", NotificationChannel::Push));
        assert!(!pref.channel_enabled("something_new", NotificationChannel::Push));
        assert!(pref.channel_enabled("something_new", NotificationChannel::InApp));
    }

    #[test]
    fn test_quiet_hours_wrapping_midnight() {
        let mut pref = UserNotificationPreference::with_defaults(1);
        pref.quiet_hours_start = parse_clock_time("22:00:00");
        pref.quiet_hours_end = parse_clock_time("07:00:00");

        assert!(pref.is_quiet_at(at(2026, 3, 4, 23, 30)));
        assert!(pref.is_quiet_at(at(2026, 3, 4, 6, 59)));
        assert!(!pref.is_quiet_at(at(2026, 3, 4, 7, 0)));
        assert!(!pref.is_quiet_at(at(2026, 3, 4, 12, 0)));
    }

    #[test]
    fn test_quiet_hours_same_day_window() {
        let mut pref = UserNotificationPreference::with_defaults(1);
        pref.quiet_hours_start = parse_clock_time("12:00:00");
        pref.quiet_hours_end = parse_clock_time("13:00:00");

        assert!(pref.is_quiet_at(at(2026, 3, 4, 12, 30)));
        assert!(!pref.is_quiet_at(at(2026, 3, 4, 13, 0)));

        pref.quiet_hours_end = pref.quiet_hours_start;
        assert!(!pref.is_quiet_at(at(2026, 3, 4, 12, 30)));
    }

    #[test]
    fn test_quiet_days_and_offset() {
        let mut pref = UserNotificationPreference::with_defaults(1);
        // 2026-03-07 is a Saturday
        pref.quiet_days = vec![6];
        assert!(pref.is_quiet_at(at(2026, 3, 7, 10, 0)));
        assert!(!pref.is_quiet_at(at(2026, 3, 6, 10, 0)));

        // Friday 20:00 UTC is already Saturday at UTC+9
        pref.utc_offset_minutes = 540;
        assert!(pref.is_quiet_at(at(2026, 3, 6, 20, 0)));
    }

    #[test]
    fn test_parse_clock_time() {
        assert!(parse_clock_time("00:00:00").is_some());
        assert!(parse_clock_time("23:59:59").is_some());
        assert!(parse_clock_time("24:00:00").is_none());
        assert!(parse_clock_time("9:00:00").is_none());
        assert!(parse_clock_time("09:60:00").is_none());
        assert!(parse_clock_time("09:00").is_none());
    }

    #[test]
    fn test_update_valid_document() {
        let update = PreferenceUpdate::from_json(&json!({
            "email_enabled": false,
            "quiet_hours_start": "22:00:00",
            "quiet_hours_end": "07:00:00",
            "quiet_days": [7, 6, 6],
            "event_overrides": {"chat_new_message": {"push": false}},
            "utc_offset_minutes": -300
        }))
        .unwrap();

        let mut pref = UserNotificationPreference::with_defaults(5);
        update.apply(&mut pref);

        assert!(!pref.email_enabled);
        assert_eq!(pref.quiet_days, vec![6, 7]);
        assert_eq!(pref.utc_offset_minutes, -300);
        assert!(!pref.channel_enabled("chat_new_message", NotificationChannel::Push));
        // untouched channels of the override survive the merge
        assert!(pref.channel_enabled("chat_new_message", NotificationChannel::InApp));
    }

    #[test]
    fn test_update_rejections() {
        let cases = [
            json!({"push_enabled": "yes"}),
            json!({"quiet_hours_start": "22:00", "quiet_hours_end": "07:00:00"}),
            json!({"quiet_hours_start": "22:00:00"}),
            json!({"quiet_hours_start": "22:00:00", "quiet_hours_end": null}),
            json!({"quiet_days": [0]}),
            json!({"quiet_days": [8]}),
            json!({"quiet_days": ["mon"]}),
            json!({"event_overrides": {"chat_new_message": {"fax": true}}}),
            json!({"event_overrides": {"chat_new_message": {"push": 1}}}),
            json!({"event_overrides": {"not_an_event": {"push": true}}}),
            json!({"utc_offset_minutes": 900}),
            json!({"favourite_colour": "blue"}),
            json!([1, 2]),
        ];
        for doc in cases {
            let err = PreferenceUpdate::from_json(&doc).unwrap_err();
            assert!(err.is_validation(), "{doc} should be rejected");
        }
    }

    #[test]
    fn test_clear_quiet_hours() {
        let mut pref = UserNotificationPreference::with_defaults(1);
        pref.quiet_hours_start = parse_clock_time("22:00:00");
        pref.quiet_hours_end = parse_clock_time("07:00:00");

        let update =
            PreferenceUpdate::from_json(&json!({"quiet_hours_start": null, "quiet_hours_end": null}))
                .unwrap();
        update.apply(&mut pref);
        assert!(pref.quiet_hours_start.is_none());
        assert!(pref.quiet_hours_end.is_none());
    }
}
