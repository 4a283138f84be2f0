//! Preference entity <-> model mapper

use relay_core::UserNotificationPreference;

use crate::models::PreferenceModel;

/// Convert PreferenceModel to UserNotificationPreference entity
impl From<PreferenceModel> for UserNotificationPreference {
    fn from(model: PreferenceModel) -> Self {
        UserNotificationPreference {
            user_id: model.user_id,
            push_enabled: model.push_enabled,
            in_app_enabled: model.in_app_enabled,
            email_enabled: model.email_enabled,
            sms_enabled: model.sms_enabled,
            quiet_hours_start: model.quiet_hours_start,
            quiet_hours_end: model.quiet_hours_end,
            quiet_days: model.quiet_days,
            event_overrides: model.event_overrides.0,
            utc_offset_minutes: model.utc_offset_minutes,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
