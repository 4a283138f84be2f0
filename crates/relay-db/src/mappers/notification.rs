//! Notification entities <-> model mapper

use relay_core::{
    DeliveryStat, DomainError, InAppNotification, NotificationQueueEntry, NotificationTemplate,
};

use crate::models::{
    DeliveryStatModel, InAppNotificationModel, NotificationQueueModel, NotificationTemplateModel,
};

/// Convert NotificationQueueModel to NotificationQueueEntry entity
impl TryFrom<NotificationQueueModel> for NotificationQueueEntry {
    type Error = DomainError;

    fn try_from(model: NotificationQueueModel) -> Result<Self, Self::Error> {
        Ok(NotificationQueueEntry {
            id: model.id,
            target_user_id: model.target_user_id,
            event_type: model.event_type,
            channel: model.channel,
            template_key: model.template_key,
            payload: model.payload,
            status: model.status.parse()?,
            retry_count: model.retry_count,
            next_attempt_at: model.next_attempt_at,
            failure_reason: model.failure_reason,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

/// Convert InAppNotificationModel to InAppNotification entity
impl From<InAppNotificationModel> for InAppNotification {
    fn from(model: InAppNotificationModel) -> Self {
        InAppNotification {
            id: model.id,
            user_id: model.user_id,
            queue_entry_id: model.queue_entry_id,
            title: model.title,
            body: model.body,
            is_read: model.is_read,
            is_pinned: model.is_pinned,
            read_at: model.read_at,
            expires_at: model.expires_at,
            created_at: model.created_at,
        }
    }
}

/// Convert NotificationTemplateModel to NotificationTemplate entity
impl From<NotificationTemplateModel> for NotificationTemplate {
    fn from(model: NotificationTemplateModel) -> Self {
        NotificationTemplate {
            template_key: model.template_key,
            channel: model.channel,
            title_template: model.title_template,
            body_template: model.body_template,
        }
    }
}

/// Convert DeliveryStatModel to DeliveryStat entity
impl From<DeliveryStatModel> for DeliveryStat {
    fn from(model: DeliveryStatModel) -> Self {
        DeliveryStat {
            day: model.day,
            template_key: model.template_key,
            channel: model.channel,
            sent: model.sent,
            delivered: model.delivered,
            failed: model.failed,
        }
    }
}
