//! In-memory store implementing every repository trait.
//!
//! Backs tests and single-process demos. Shares semantics with the
//! PostgreSQL repositories: monotonic cursors, guarded ticket transitions,
//! one in-app row per queue entry. `set_available(false)` makes every call
//! fail with `StorageUnavailable` so degraded paths can be exercised.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::Mutex;

use relay_core::entities::{
    DeliveryStat, InAppNotification, Message, NotificationQueueEntry, NotificationTemplate,
    QueueStatus, ReadCursor, Room, SupportEvent, SupportEventLog, SupportStatus,
    UserNotificationPreference,
};
use relay_core::traits::{
    DeliveryStatsRepository, InAppNotificationRepository, MessageRepository,
    NotificationQueueRepository, NotificationTemplateRepository, PreferenceRepository,
    ReadCursorRepository, RepoResult, RoomRepository, SupportEventRepository,
};
use relay_core::DomainError;

#[derive(Default)]
struct State {
    next_id: i64,
    rooms: BTreeMap<i64, Room>,
    messages: BTreeMap<i64, Message>,
    cursors: HashMap<(i64, i64), ReadCursor>,
    queue: BTreeMap<i64, NotificationQueueEntry>,
    preferences: HashMap<i64, UserNotificationPreference>,
    in_app: BTreeMap<i64, InAppNotification>,
    templates: HashMap<(String, String), NotificationTemplate>,
    stats: BTreeMap<(NaiveDate, String, String), DeliveryStat>,
    tickets: BTreeMap<i64, SupportEvent>,
    ticket_logs: Vec<SupportEventLog>,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Shared in-memory store; clones see the same data
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
    unavailable: Arc<AtomicBool>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle simulated storage availability
    pub fn set_available(&self, available: bool) {
        self.unavailable.store(!available, Ordering::SeqCst);
    }

    /// Check whether calls currently succeed
    pub fn is_available(&self) -> bool {
        !self.unavailable.load(Ordering::SeqCst)
    }

    fn check(&self) -> RepoResult<()> {
        if self.is_available() {
            Ok(())
        } else {
            Err(DomainError::StorageUnavailable(
                "in-memory store marked unavailable".to_string(),
            ))
        }
    }

    /// Seed a room directly, keeping its id if non-zero
    pub fn insert_room(&self, mut room: Room) -> Room {
        let mut state = self.state.lock();
        if room.id == 0 {
            room.id = state.next_id();
        } else {
            state.next_id = state.next_id.max(room.id);
        }
        state.rooms.insert(room.id, room.clone());
        room
    }

    /// Seed a notification template
    pub fn insert_template(&self, template: NotificationTemplate) {
        self.state.lock().templates.insert(
            (template.template_key.clone(), template.channel.clone()),
            template,
        );
    }

    /// Every in-app notification stored for a user, any state
    pub fn in_app_for(&self, user_id: i64) -> Vec<InAppNotification> {
        self.state
            .lock()
            .in_app
            .values()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect()
    }

    /// Every queue entry, ordered by id
    pub fn queue_entries(&self) -> Vec<NotificationQueueEntry> {
        self.state.lock().queue.values().cloned().collect()
    }

    /// Overwrite a queue entry (test setup for due times and statuses)
    pub fn put_queue_entry(&self, entry: NotificationQueueEntry) {
        self.state.lock().queue.insert(entry.id, entry);
    }

    /// Overwrite an in-app notification (test setup for ages and flags)
    pub fn put_in_app(&self, notification: InAppNotification) {
        self.state.lock().in_app.insert(notification.id, notification);
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("available", &self.is_available())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl RoomRepository for MemoryStore {
    async fn find_by_id(&self, id: i64) -> RepoResult<Option<Room>> {
        self.check()?;
        Ok(self.state.lock().rooms.get(&id).cloned())
    }

    async fn create(&self, room: &Room) -> RepoResult<Room> {
        self.check()?;
        let mut room = room.clone();
        room.id = 0;
        Ok(self.insert_room(room))
    }
}

#[async_trait]
impl MessageRepository for MemoryStore {
    async fn latest_id(&self, room_id: i64) -> RepoResult<Option<i64>> {
        self.check()?;
        Ok(self
            .state
            .lock()
            .messages
            .values()
            .filter(|m| m.room_id == room_id)
            .map(|m| m.id)
            .max())
    }

    async fn unread_counts(&self, user_id: i64) -> RepoResult<Vec<(i64, i64)>> {
        self.check()?;
        let state = self.state.lock();
        let counts = state
            .rooms
            .values()
            .filter(|r| r.is_member(user_id))
            .map(|room| {
                let after = state
                    .cursors
                    .get(&(user_id, room.id))
                    .map_or(0, |c| c.last_read_message_id);
                let unread = state
                    .messages
                    .values()
                    .filter(|m| m.room_id == room.id && m.id > after)
                    .count();
                (room.id, i64::try_from(unread).unwrap_or(i64::MAX))
            })
            .collect();
        Ok(counts)
    }

    async fn append(&self, room_id: i64, sender_id: i64, body: &str) -> RepoResult<Message> {
        self.check()?;
        let mut state = self.state.lock();
        let message = Message {
            id: state.next_id(),
            room_id,
            sender_id,
            body: body.to_string(),
            sent_at: Utc::now(),
        };
        state.messages.insert(message.id, message.clone());
        Ok(message)
    }
}

#[async_trait]
impl ReadCursorRepository for MemoryStore {
    async fn advance(
        &self,
        user_id: i64,
        room_id: i64,
        message_id: i64,
    ) -> RepoResult<ReadCursor> {
        self.check()?;
        let mut state = self.state.lock();
        let cursor = state
            .cursors
            .entry((user_id, room_id))
            .or_insert_with(|| ReadCursor::new(user_id, room_id, 0));
        cursor.advance(message_id);
        cursor.updated_at = Utc::now();
        Ok(cursor.clone())
    }
}

#[async_trait]
impl NotificationQueueRepository for MemoryStore {
    async fn enqueue(&self, entry: &NotificationQueueEntry) -> RepoResult<i64> {
        self.check()?;
        let mut state = self.state.lock();
        let mut entry = entry.clone();
        entry.id = state.next_id();
        entry.status = QueueStatus::Pending;
        entry.retry_count = 0;
        entry.failure_reason = None;
        let id = entry.id;
        state.queue.insert(id, entry);
        Ok(id)
    }

    async fn find_by_id(&self, id: i64) -> RepoResult<Option<NotificationQueueEntry>> {
        self.check()?;
        Ok(self.state.lock().queue.get(&id).cloned())
    }

    async fn find_due(
        &self,
        now: DateTime<Utc>,
        after_id: i64,
        limit: i64,
    ) -> RepoResult<Vec<NotificationQueueEntry>> {
        self.check()?;
        let limit = usize::try_from(limit.max(1)).unwrap_or(usize::MAX);
        Ok(self
            .state
            .lock()
            .queue
            .range(after_id.saturating_add(1)..)
            .map(|(_, e)| e)
            .filter(|e| e.status == QueueStatus::Pending && e.next_attempt_at <= now)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn mark_sent(&self, id: i64, at: DateTime<Utc>) -> RepoResult<()> {
        self.check()?;
        let mut state = self.state.lock();
        let entry = pending_entry(&mut state, id)?;
        entry.status = QueueStatus::Sent;
        entry.failure_reason = None;
        entry.updated_at = at;
        Ok(())
    }

    async fn mark_failed(
        &self,
        id: i64,
        reason: &str,
        retry_count: i32,
        at: DateTime<Utc>,
    ) -> RepoResult<()> {
        self.check()?;
        let mut state = self.state.lock();
        let entry = pending_entry(&mut state, id)?;
        entry.status = QueueStatus::Failed;
        entry.failure_reason = Some(reason.to_string());
        entry.retry_count = retry_count;
        entry.updated_at = at;
        Ok(())
    }

    async fn schedule_retry(
        &self,
        id: i64,
        retry_count: i32,
        next_attempt_at: DateTime<Utc>,
        reason: &str,
        at: DateTime<Utc>,
    ) -> RepoResult<()> {
        self.check()?;
        let mut state = self.state.lock();
        let entry = pending_entry(&mut state, id)?;
        entry.retry_count = retry_count;
        entry.next_attempt_at = next_attempt_at;
        entry.failure_reason = Some(reason.to_string());
        entry.updated_at = at;
        Ok(())
    }

    async fn delete_terminal_before(&self, cutoff: DateTime<Utc>) -> RepoResult<u64> {
        self.check()?;
        let mut state = self.state.lock();
        let before = state.queue.len();
        state
            .queue
            .retain(|_, e| !(e.status.is_terminal() && e.updated_at < cutoff));
        Ok((before - state.queue.len()) as u64)
    }
}

fn pending_entry(state: &mut State, id: i64) -> RepoResult<&mut NotificationQueueEntry> {
    state
        .queue
        .get_mut(&id)
        .filter(|e| e.status == QueueStatus::Pending)
        .ok_or(DomainError::QueueEntryNotFound(id))
}

#[async_trait]
impl PreferenceRepository for MemoryStore {
    async fn find(&self, user_id: i64) -> RepoResult<Option<UserNotificationPreference>> {
        self.check()?;
        Ok(self.state.lock().preferences.get(&user_id).cloned())
    }

    async fn insert_if_absent(&self, preference: &UserNotificationPreference) -> RepoResult<()> {
        self.check()?;
        self.state
            .lock()
            .preferences
            .entry(preference.user_id)
            .or_insert_with(|| preference.clone());
        Ok(())
    }

    async fn update(&self, preference: &UserNotificationPreference) -> RepoResult<()> {
        self.check()?;
        let mut state = self.state.lock();
        match state.preferences.get_mut(&preference.user_id) {
            Some(stored) => {
                *stored = preference.clone();
                Ok(())
            }
            None => Err(DomainError::InternalError(format!(
                "Preference row missing for user {}",
                preference.user_id
            ))),
        }
    }
}

#[async_trait]
impl InAppNotificationRepository for MemoryStore {
    async fn upsert_for_entry(&self, notification: &InAppNotification) -> RepoResult<i64> {
        self.check()?;
        let mut state = self.state.lock();
        if let Some(entry_id) = notification.queue_entry_id {
            let existing = state
                .in_app
                .values_mut()
                .find(|n| n.queue_entry_id == Some(entry_id));
            if let Some(existing) = existing {
                existing.title.clone_from(&notification.title);
                existing.body.clone_from(&notification.body);
                return Ok(existing.id);
            }
        }
        let mut stored = notification.clone();
        stored.id = state.next_id();
        let id = stored.id;
        state.in_app.insert(id, stored);
        Ok(id)
    }

    async fn list_for_user(
        &self,
        user_id: i64,
        unread_only: bool,
        now: DateTime<Utc>,
        limit: i64,
    ) -> RepoResult<Vec<InAppNotification>> {
        self.check()?;
        let mut items: Vec<InAppNotification> = self
            .state
            .lock()
            .in_app
            .values()
            .filter(|n| n.user_id == user_id && !n.is_expired(now))
            .filter(|n| !unread_only || !n.is_read)
            .cloned()
            .collect();
        items.sort_by(|a, b| {
            b.is_pinned
                .cmp(&a.is_pinned)
                .then(b.created_at.cmp(&a.created_at))
                .then(b.id.cmp(&a.id))
        });
        items.truncate(usize::try_from(limit.clamp(1, 100)).unwrap_or(100));
        Ok(items)
    }

    async fn mark_read(
        &self,
        id: i64,
        user_id: i64,
        at: DateTime<Utc>,
    ) -> RepoResult<Option<InAppNotification>> {
        self.check()?;
        let mut state = self.state.lock();
        Ok(state
            .in_app
            .get_mut(&id)
            .filter(|n| n.user_id == user_id)
            .map(|n| {
                n.mark_read(at);
                n.clone()
            }))
    }

    async fn set_pinned(
        &self,
        id: i64,
        user_id: i64,
        pinned: bool,
    ) -> RepoResult<Option<InAppNotification>> {
        self.check()?;
        let mut state = self.state.lock();
        Ok(state
            .in_app
            .get_mut(&id)
            .filter(|n| n.user_id == user_id)
            .map(|n| {
                n.is_pinned = pinned;
                n.clone()
            }))
    }

    async fn delete_read_before(&self, cutoff: DateTime<Utc>) -> RepoResult<u64> {
        self.check()?;
        let mut state = self.state.lock();
        let before = state.in_app.len();
        state
            .in_app
            .retain(|_, n| !(n.is_read && !n.is_pinned && n.created_at < cutoff));
        Ok((before - state.in_app.len()) as u64)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> RepoResult<u64> {
        self.check()?;
        let mut state = self.state.lock();
        let before = state.in_app.len();
        state.in_app.retain(|_, n| !n.is_expired(now));
        Ok((before - state.in_app.len()) as u64)
    }
}

#[async_trait]
impl NotificationTemplateRepository for MemoryStore {
    async fn find(
        &self,
        template_key: &str,
        channel: &str,
    ) -> RepoResult<Option<NotificationTemplate>> {
        self.check()?;
        Ok(self
            .state
            .lock()
            .templates
            .get(&(template_key.to_string(), channel.to_string()))
            .cloned())
    }
}

#[async_trait]
impl DeliveryStatsRepository for MemoryStore {
    async fn record(&self, stat: &DeliveryStat) -> RepoResult<()> {
        self.check()?;
        let mut state = self.state.lock();
        let row = state
            .stats
            .entry((stat.day, stat.template_key.clone(), stat.channel.clone()))
            .or_insert_with(|| DeliveryStat::new(stat.day, &*stat.template_key, &*stat.channel));
        row.sent += stat.sent;
        row.delivered += stat.delivered;
        row.failed += stat.failed;
        Ok(())
    }

    async fn find_by_day(&self, day: NaiveDate) -> RepoResult<Vec<DeliveryStat>> {
        self.check()?;
        Ok(self
            .state
            .lock()
            .stats
            .values()
            .filter(|s| s.day == day)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl SupportEventRepository for MemoryStore {
    async fn create(&self, event: &SupportEvent) -> RepoResult<SupportEvent> {
        self.check()?;
        let mut state = self.state.lock();
        let mut created = event.clone();
        created.id = state.next_id();
        let mut log =
            SupportEventLog::entry(created.id, None, None, created.status, created.created_at);
        log.id = state.next_id();
        state.tickets.insert(created.id, created.clone());
        state.ticket_logs.push(log);
        Ok(created)
    }

    async fn find_by_id(&self, id: i64) -> RepoResult<Option<SupportEvent>> {
        self.check()?;
        Ok(self.state.lock().tickets.get(&id).cloned())
    }

    async fn find_logs(&self, event_id: i64) -> RepoResult<Vec<SupportEventLog>> {
        self.check()?;
        Ok(self
            .state
            .lock()
            .ticket_logs
            .iter()
            .filter(|l| l.event_id == event_id)
            .cloned()
            .collect())
    }

    async fn apply_transition(
        &self,
        event: &SupportEvent,
        expected_status: SupportStatus,
        log: &SupportEventLog,
    ) -> RepoResult<()> {
        self.check()?;
        let mut state = self.state.lock();
        let stored = state
            .tickets
            .get(&event.id)
            .ok_or(DomainError::SupportEventNotFound(event.id))?;
        let rating_taken = stored.rating.is_some() && stored.rating != event.rating;
        if stored.status != expected_status || rating_taken {
            return Err(DomainError::ConcurrentModification);
        }
        let mut log = log.clone();
        log.id = state.next_id();
        log.event_id = event.id;
        state.tickets.insert(event.id, event.clone());
        state.ticket_logs.push(log);
        Ok(())
    }

    async fn record_rating(&self, event: &SupportEvent) -> RepoResult<()> {
        self.check()?;
        let mut state = self.state.lock();
        let stored = state
            .tickets
            .get_mut(&event.id)
            .ok_or(DomainError::SupportEventNotFound(event.id))?;
        if stored.rating.is_some() {
            return Err(DomainError::AlreadyRated);
        }
        stored.rating = event.rating;
        stored.review.clone_from(&event.review);
        stored.updated_at = event.updated_at;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use relay_core::{NotificationChannel, NotificationEventType, RoomKind};
    use serde_json::json;

    use super::*;

    fn store_with_room() -> (MemoryStore, Room) {
        let store = MemoryStore::new();
        let room = store.insert_room(Room::new(RoomKind::Chat, 1, 2));
        (store, room)
    }

    #[tokio::test]
    async fn test_unread_counts_follow_cursor() {
        let (store, room) = store_with_room();
        let first = store.append(room.id, 2, "hi").await.unwrap();
        store.append(room.id, 2, "there").await.unwrap();

        assert_eq!(store.unread_counts(1).await.unwrap(), vec![(room.id, 2)]);

        store.advance(1, room.id, first.id).await.unwrap();
        assert_eq!(store.unread_counts(1).await.unwrap(), vec![(room.id, 1)]);
    }

    #[tokio::test]
    async fn test_cursor_never_moves_back() {
        let (store, room) = store_with_room();
        store.advance(1, room.id, 10).await.unwrap();
        let cursor = store.advance(1, room.id, 3).await.unwrap();
        assert_eq!(cursor.last_read_message_id, 10);
    }

    #[tokio::test]
    async fn test_find_due_respects_cursor_and_time() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let mut ids = Vec::new();
        for _ in 0..3 {
            let entry = NotificationQueueEntry::pending(
                1,
                NotificationEventType::ChatNewMessage,
                NotificationChannel::InApp,
                "chat_new_message",
                json!({}),
            );
            ids.push(store.enqueue(&entry).await.unwrap());
        }
        let mut later = NotificationQueueRepository::find_by_id(&store, ids[2])
            .await
            .unwrap()
            .unwrap();
        later.next_attempt_at = now + Duration::minutes(5);
        store.put_queue_entry(later);

        let due = store.find_due(now, ids[0], 10).await.unwrap();
        assert_eq!(due.iter().map(|e| e.id).collect::<Vec<_>>(), vec![ids[1]]);
    }

    #[tokio::test]
    async fn test_terminal_updates_require_pending() {
        let store = MemoryStore::new();
        let entry = NotificationQueueEntry::pending(
            1,
            NotificationEventType::TaskCreated,
            NotificationChannel::Push,
            "task_created",
            json!({}),
        );
        let id = store.enqueue(&entry).await.unwrap();
        store.mark_sent(id, Utc::now()).await.unwrap();
        assert!(matches!(
            store.mark_failed(id, "late", 1, Utc::now()).await,
            Err(DomainError::QueueEntryNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_in_app_upsert_is_per_entry() {
        let store = MemoryStore::new();
        let mut n = InAppNotification::new(5, "a".into(), "b".into());
        n.queue_entry_id = Some(42);
        let first = store.upsert_for_entry(&n).await.unwrap();
        n.title = "again".into();
        let second = store.upsert_for_entry(&n).await.unwrap();

        assert_eq!(first, second);
        let stored = store.in_app_for(5);
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].title, "again");
    }

    #[tokio::test]
    async fn test_stale_transition_is_rejected() {
        let (store, room) = store_with_room();
        let ticket = SupportEventRepository::create(&store, &SupportEvent::open(&room, Utc::now()))
            .await
            .unwrap();

        let mut moved = ticket.clone();
        moved.status = SupportStatus::InProgress;
        let log = SupportEventLog::entry(
            ticket.id,
            Some(2),
            Some(SupportStatus::Open),
            SupportStatus::InProgress,
            Utc::now(),
        );
        store
            .apply_transition(&moved, SupportStatus::Open, &log)
            .await
            .unwrap();

        let again = store.apply_transition(&moved, SupportStatus::Open, &log).await;
        assert!(matches!(again, Err(DomainError::ConcurrentModification)));
        assert_eq!(store.find_logs(ticket.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_unavailable_store_fails_every_call() {
        let (store, room) = store_with_room();
        store.set_available(false);
        let err = RoomRepository::find_by_id(&store, room.id).await.unwrap_err();
        assert!(err.is_storage_unavailable());

        store.set_available(true);
        assert!(RoomRepository::find_by_id(&store, room.id)
            .await
            .unwrap()
            .is_some());
    }
}
