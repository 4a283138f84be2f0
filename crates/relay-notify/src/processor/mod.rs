//! Notification queue processor
//!
//! Drains due queue entries in id order under a TTL run lock. Each entry is
//! routed through the user's preferences, rendered, handed to its channel
//! adapter, and committed on its own before the next one starts.

mod report;
mod stats;

pub use report::{CleanupReport, EntryOutcome, RunOutcome, RunReport};
pub use stats::StatsCollector;

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use relay_common::NotifyConfig;
use relay_core::entities::{
    NotificationChannel, NotificationQueueEntry, RenderedNotification, UserNotificationPreference,
    SUPPRESSED_CHANNEL_DISABLED, SUPPRESSED_QUIET_HOURS,
};
use relay_core::traits::{
    DeliveryStatsRepository, InAppNotificationRepository, NotificationQueueRepository,
    NotificationTemplateRepository, PreferenceRepository, RunLock,
};
use relay_core::DomainError;
use relay_db::{
    PgDeliveryStatsRepository, PgInAppNotificationRepository, PgNotificationQueueRepository,
    PgPool, PgPreferenceRepository, PgNotificationTemplateRepository,
};
use tracing::{debug, error, info, instrument, warn};

use crate::adapters::AdapterSet;
use crate::error::{DeliveryError, ProcessorResult};

/// Lock key shared by every processor instance
pub const RUN_LOCK_KEY: &str = "notify:run";

/// Failure reason when neither a template nor payload text exists
pub const TEMPLATE_MISSING: &str = "template_missing";

/// Failure reason for a channel string no adapter understands
pub const UNKNOWN_CHANNEL: &str = "unknown_channel";

/// Repositories the processor reads and writes
#[derive(Clone)]
pub struct NotifyRepositories {
    pub queue: Arc<dyn NotificationQueueRepository>,
    pub preferences: Arc<dyn PreferenceRepository>,
    pub templates: Arc<dyn NotificationTemplateRepository>,
    pub in_app: Arc<dyn InAppNotificationRepository>,
    pub stats: Arc<dyn DeliveryStatsRepository>,
}

impl NotifyRepositories {
    /// Every repository backed by one store
    pub fn from_store<S>(store: S) -> Self
    where
        S: NotificationQueueRepository
            + PreferenceRepository
            + NotificationTemplateRepository
            + InAppNotificationRepository
            + DeliveryStatsRepository
            + Clone
            + 'static,
    {
        Self {
            queue: Arc::new(store.clone()),
            preferences: Arc::new(store.clone()),
            templates: Arc::new(store.clone()),
            in_app: Arc::new(store.clone()),
            stats: Arc::new(store),
        }
    }

    /// PostgreSQL repositories sharing one pool
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            queue: Arc::new(PgNotificationQueueRepository::new(pool.clone())),
            preferences: Arc::new(PgPreferenceRepository::new(pool.clone())),
            templates: Arc::new(PgNotificationTemplateRepository::new(pool.clone())),
            in_app: Arc::new(PgInAppNotificationRepository::new(pool.clone())),
            stats: Arc::new(PgDeliveryStatsRepository::new(pool)),
        }
    }
}

impl std::fmt::Debug for NotifyRepositories {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifyRepositories").finish_non_exhaustive()
    }
}

/// Longest wait between two attempts, 30 days
pub const MAX_RETRY_DELAY_SECS: i64 = 30 * 24 * 60 * 60;

/// Delay before retry number `attempt` (1-based): base doubled per attempt,
/// capped at [`MAX_RETRY_DELAY_SECS`]
pub fn retry_delay(base_secs: u64, attempt: i32) -> Duration {
    let max = Duration::seconds(MAX_RETRY_DELAY_SECS);
    let exponent = u32::try_from(attempt.saturating_sub(1)).unwrap_or(0).min(16);
    let secs = base_secs.saturating_mul(1_u64 << exponent);
    i64::try_from(secs)
        .ok()
        .and_then(Duration::try_seconds)
        .map_or(max, |delay| delay.min(max))
}

/// Notification queue processor
pub struct NotificationProcessor {
    repos: NotifyRepositories,
    adapters: AdapterSet,
    lock: Arc<dyn RunLock>,
    config: NotifyConfig,
}

impl NotificationProcessor {
    pub fn new(
        repos: NotifyRepositories,
        adapters: AdapterSet,
        lock: Arc<dyn RunLock>,
        config: NotifyConfig,
    ) -> Self {
        Self {
            repos,
            adapters,
            lock,
            config,
        }
    }

    /// Run one guarded pass now
    pub async fn run(&self) -> ProcessorResult<RunOutcome> {
        self.run_at(Utc::now()).await
    }

    /// Run one guarded pass, treating `now` as the current time.
    ///
    /// Returns `Skipped` without touching the queue when another run holds
    /// the lock. The time budget is measured on the wall clock.
    #[instrument(skip(self))]
    pub async fn run_at(&self, now: DateTime<Utc>) -> ProcessorResult<RunOutcome> {
        let Some(token) = self
            .lock
            .try_acquire(RUN_LOCK_KEY, self.config.lock_ttl())
            .await?
        else {
            info!("Another run holds the lock; skipping");
            return Ok(RunOutcome::Skipped);
        };

        let report = self.process(now).await;

        match self.lock.release(&token).await {
            Ok(true) => {}
            Ok(false) => warn!("Run lock expired before release"),
            Err(e) => warn!(error = %e, "Failed to release run lock"),
        }

        info!(
            picked = report.picked,
            sent = report.sent,
            retried = report.retried,
            failed = report.failed,
            suppressed = report.suppressed,
            errors = report.errors,
            aborted = report.aborted,
            budget_exhausted = report.budget_exhausted,
            "Notification run finished"
        );
        Ok(RunOutcome::Completed(report))
    }

    async fn process(&self, now: DateTime<Utc>) -> RunReport {
        let mut report = RunReport::new(now);
        let mut stats = StatsCollector::new(now.date_naive());
        let started = tokio::time::Instant::now();
        let budget = self.config.run_budget();
        let mut after_id = 0;

        'batches: loop {
            if started.elapsed() >= budget {
                report.budget_exhausted = true;
                break;
            }

            let batch = match self
                .repos
                .queue
                .find_due(now, after_id, self.config.batch_size)
                .await
            {
                Ok(batch) => batch,
                Err(e) => {
                    warn!(error = %e, "Failed to load due entries; aborting run");
                    report.aborted = true;
                    break;
                }
            };
            if batch.is_empty() {
                break;
            }
            report.batches += 1;
            debug!(size = batch.len(), after_id, "Processing batch");

            for entry in batch {
                if started.elapsed() >= budget {
                    report.budget_exhausted = true;
                    break 'batches;
                }
                after_id = entry.id;
                report.picked += 1;

                match self.process_entry(&entry, now).await {
                    Ok(outcome) => {
                        report.record(outcome);
                        stats.record(&entry, outcome);
                    }
                    Err(e) if e.is_storage_unavailable() => {
                        warn!(entry_id = entry.id, error = %e, "Store unavailable; aborting run");
                        report.aborted = true;
                        break 'batches;
                    }
                    Err(e) => {
                        warn!(entry_id = entry.id, error = %e, "Entry skipped");
                        report.errors += 1;
                    }
                }
            }
        }

        if report.aborted {
            return report;
        }

        report.cleanup = match self.cleanup(now).await {
            Ok(cleanup) => Some(cleanup),
            Err(e) => {
                warn!(error = %e, "Cleanup failed");
                None
            }
        };

        for stat in stats.into_stats() {
            if let Err(e) = self.repos.stats.record(&stat).await {
                warn!(
                    template_key = %stat.template_key,
                    channel = %stat.channel,
                    error = %e,
                    "Failed to record delivery stats"
                );
            }
        }

        report
    }

    /// Route, render and dispatch one entry, committing its new state
    #[instrument(skip(self, entry), fields(entry_id = entry.id, channel = %entry.channel))]
    async fn process_entry(
        &self,
        entry: &NotificationQueueEntry,
        now: DateTime<Utc>,
    ) -> ProcessorResult<EntryOutcome> {
        let Some(channel) = entry.channel() else {
            self.fail(entry, UNKNOWN_CHANNEL, entry.retry_count, now).await?;
            return Ok(EntryOutcome::Failed);
        };

        let preference = self.preference(entry.target_user_id).await?;
        if let Some(reason) = suppression(&preference, entry, channel, now) {
            debug!(reason, "Entry suppressed");
            self.fail(entry, reason, entry.retry_count, now).await?;
            return Ok(EntryOutcome::Suppressed);
        }

        let Some(content) = self.render(entry, channel).await? else {
            self.fail(entry, TEMPLATE_MISSING, entry.retry_count, now).await?;
            return Ok(EntryOutcome::Failed);
        };

        match self.adapters.deliver(channel, entry, &content, now).await {
            Ok(receipt) => {
                self.record_sent(entry, now).await?;
                Ok(EntryOutcome::Sent {
                    delivered: receipt.delivered,
                })
            }
            Err(DeliveryError::Storage(e)) if e.is_storage_unavailable() => Err(e.into()),
            Err(e) if e.is_retryable() => {
                let attempt = entry.retry_count.saturating_add(1);
                let reason = e.to_string();
                if attempt < self.config.max_retries {
                    let delay = retry_delay(self.config.retry_backoff_secs, attempt);
                    let next = now.checked_add_signed(delay).unwrap_or(now);
                    self.repos
                        .queue
                        .schedule_retry(entry.id, attempt, next, &reason, now)
                        .await?;
                    debug!(attempt, next_attempt_at = %next, error = %e, "Delivery retry scheduled");
                    Ok(EntryOutcome::Retried)
                } else {
                    self.fail(entry, &reason, attempt, now).await?;
                    Ok(EntryOutcome::Failed)
                }
            }
            Err(e) => {
                self.fail(entry, &e.to_string(), entry.retry_count, now).await?;
                Ok(EntryOutcome::Failed)
            }
        }
    }

    /// Commit a delivered entry as sent, trying the write twice.
    ///
    /// An entry left pending here is picked up and delivered again by a
    /// later run, so the second failure is logged at error level.
    async fn record_sent(&self, entry: &NotificationQueueEntry, now: DateTime<Utc>) -> Result<(), DomainError> {
        let first = match self.repos.queue.mark_sent(entry.id, now).await {
            Ok(()) => return Ok(()),
            Err(e) => e,
        };
        warn!(entry_id = entry.id, error = %first, "Failed to mark delivered entry sent; retrying");

        self.repos.queue.mark_sent(entry.id, now).await.map_err(|e| {
            error!(
                entry_id = entry.id,
                error = %e,
                "Delivered entry not recorded as sent; it may be delivered again"
            );
            e
        })
    }

    async fn fail(
        &self,
        entry: &NotificationQueueEntry,
        reason: &str,
        retry_count: i32,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        debug!(entry_id = entry.id, reason, "Entry failed");
        self.repos
            .queue
            .mark_failed(entry.id, reason, retry_count, now)
            .await
    }

    /// The user's preference, created with defaults on first use
    async fn preference(&self, user_id: i64) -> Result<UserNotificationPreference, DomainError> {
        let repo = &self.repos.preferences;
        if let Some(pref) = repo.find(user_id).await? {
            return Ok(pref);
        }
        repo.insert_if_absent(&UserNotificationPreference::with_defaults(user_id))
            .await?;
        repo.find(user_id).await?.ok_or_else(|| {
            DomainError::InternalError(format!("Preference for user {user_id} missing after insert"))
        })
    }

    /// Template for (key, channel), else the payload's own title and body
    async fn render(
        &self,
        entry: &NotificationQueueEntry,
        channel: NotificationChannel,
    ) -> Result<Option<RenderedNotification>, DomainError> {
        let template = self
            .repos
            .templates
            .find(&entry.template_key, channel.as_str())
            .await?;
        Ok(match template {
            Some(template) => Some(template.render(&entry.payload)),
            None => RenderedNotification::from_payload(&entry.payload),
        })
    }

    async fn cleanup(&self, now: DateTime<Utc>) -> Result<CleanupReport, DomainError> {
        let queue_cutoff = days_before(now, self.config.queue_retention_days);
        let read_cutoff = days_before(now, self.config.read_retention_days);

        let report = CleanupReport {
            queue_entries: self.repos.queue.delete_terminal_before(queue_cutoff).await?,
            read_notifications: self.repos.in_app.delete_read_before(read_cutoff).await?,
            expired_notifications: self.repos.in_app.delete_expired(now).await?,
        };
        debug!(?report, "Cleanup finished");
        Ok(report)
    }
}

/// `now` minus a retention period; an out-of-range period keeps everything
fn days_before(now: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    Duration::try_days(days)
        .and_then(|period| now.checked_sub_signed(period))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Why preferences block this entry right now, if they do
fn suppression(
    preference: &UserNotificationPreference,
    entry: &NotificationQueueEntry,
    channel: NotificationChannel,
    now: DateTime<Utc>,
) -> Option<&'static str> {
    if !preference.channel_enabled(&entry.event_type, channel) {
        Some(SUPPRESSED_CHANNEL_DISABLED)
    } else if preference.is_quiet_at(now) {
        Some(SUPPRESSED_QUIET_HOURS)
    } else {
        None
    }
}

impl std::fmt::Debug for NotificationProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationProcessor")
            .field("adapters", &self.adapters)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::{NaiveTime, TimeZone};
    use relay_cache::LocalRunLock;
    use relay_core::entities::{
        InAppNotification, NotificationEventType, NotificationTemplate, QueueStatus,
    };
    use relay_db::MemoryStore;
    use serde_json::{json, Value};

    use super::*;
    use crate::adapters::{ChannelAdapter, DeliveryReceipt, InAppAdapter};

    /// Push adapter answering with a fixed result
    struct ScriptedPush {
        transient: bool,
        delay: Option<std::time::Duration>,
        calls: AtomicUsize,
    }

    impl ScriptedPush {
        fn ok() -> Arc<Self> {
            Arc::new(Self {
                transient: false,
                delay: None,
                calls: AtomicUsize::new(0),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                transient: true,
                delay: None,
                calls: AtomicUsize::new(0),
            })
        }

        fn slow() -> Arc<Self> {
            Arc::new(Self {
                transient: false,
                delay: Some(std::time::Duration::from_millis(200)),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl ChannelAdapter for ScriptedPush {
        fn channel(&self) -> NotificationChannel {
            NotificationChannel::Push
        }

        async fn deliver(
            &self,
            _entry: &NotificationQueueEntry,
            _content: &RenderedNotification,
            _now: DateTime<Utc>,
        ) -> Result<DeliveryReceipt, DeliveryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.transient {
                Err(DeliveryError::Transient("provider busy".into()))
            } else {
                Ok(DeliveryReceipt { delivered: false })
            }
        }
    }

    fn noon() -> DateTime<Utc> {
        // A Wednesday
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn config() -> NotifyConfig {
        NotifyConfig::default()
    }

    fn processor(store: &MemoryStore, push: Arc<ScriptedPush>, config: NotifyConfig) -> NotificationProcessor {
        processor_with_lock(store, push, config, Arc::new(LocalRunLock::new()))
    }

    fn processor_with_lock(
        store: &MemoryStore,
        push: Arc<ScriptedPush>,
        config: NotifyConfig,
        lock: Arc<dyn RunLock>,
    ) -> NotificationProcessor {
        let adapters = AdapterSet::new()
            .with(Arc::new(InAppAdapter::new(Arc::new(store.clone()))))
            .with(push);
        NotificationProcessor::new(NotifyRepositories::from_store(store.clone()), adapters, lock, config)
    }

    async fn enqueue(
        store: &MemoryStore,
        user_id: i64,
        event: NotificationEventType,
        channel: NotificationChannel,
        payload: Value,
    ) -> i64 {
        let mut entry = NotificationQueueEntry::pending(user_id, event, channel, event.as_str(), payload);
        entry.next_attempt_at = noon() - Duration::minutes(1);
        entry.created_at = entry.next_attempt_at;
        entry.updated_at = entry.next_attempt_at;
        store.enqueue(&entry).await.unwrap()
    }

    async fn entry(store: &MemoryStore, id: i64) -> NotificationQueueEntry {
        NotificationQueueRepository::find_by_id(store, id)
            .await
            .unwrap()
            .unwrap()
    }

    fn completed(outcome: RunOutcome) -> RunReport {
        match outcome {
            RunOutcome::Completed(report) => report,
            RunOutcome::Skipped => panic!("run was skipped"),
        }
    }

    /// Queue whose first `failures` calls to `mark_sent` error out
    struct FlakyQueue {
        inner: MemoryStore,
        failures: AtomicUsize,
    }

    #[async_trait]
    impl NotificationQueueRepository for FlakyQueue {
        async fn enqueue(&self, entry: &NotificationQueueEntry) -> Result<i64, DomainError> {
            self.inner.enqueue(entry).await
        }

        async fn find_by_id(&self, id: i64) -> Result<Option<NotificationQueueEntry>, DomainError> {
            NotificationQueueRepository::find_by_id(&self.inner, id).await
        }

        async fn find_due(
            &self,
            now: DateTime<Utc>,
            after_id: i64,
            limit: i64,
        ) -> Result<Vec<NotificationQueueEntry>, DomainError> {
            self.inner.find_due(now, after_id, limit).await
        }

        async fn mark_sent(&self, id: i64, at: DateTime<Utc>) -> Result<(), DomainError> {
            let left = self.failures.load(Ordering::SeqCst);
            if left > 0 {
                self.failures.store(left - 1, Ordering::SeqCst);
                return Err(DomainError::InternalError("write conflict".into()));
            }
            self.inner.mark_sent(id, at).await
        }

        async fn mark_failed(
            &self,
            id: i64,
            reason: &str,
            retry_count: i32,
            at: DateTime<Utc>,
        ) -> Result<(), DomainError> {
            self.inner.mark_failed(id, reason, retry_count, at).await
        }

        async fn schedule_retry(
            &self,
            id: i64,
            retry_count: i32,
            next_attempt_at: DateTime<Utc>,
            reason: &str,
            at: DateTime<Utc>,
        ) -> Result<(), DomainError> {
            self.inner
                .schedule_retry(id, retry_count, next_attempt_at, reason, at)
                .await
        }

        async fn delete_terminal_before(&self, cutoff: DateTime<Utc>) -> Result<u64, DomainError> {
            self.inner.delete_terminal_before(cutoff).await
        }
    }

    fn flaky_processor(store: &MemoryStore, push: Arc<ScriptedPush>, failures: usize) -> NotificationProcessor {
        let queue = FlakyQueue {
            inner: store.clone(),
            failures: AtomicUsize::new(failures),
        };
        let repos = NotifyRepositories {
            queue: Arc::new(queue),
            ..NotifyRepositories::from_store(store.clone())
        };
        let adapters = AdapterSet::new()
            .with(Arc::new(InAppAdapter::new(Arc::new(store.clone()))))
            .with(push);
        NotificationProcessor::new(repos, adapters, Arc::new(LocalRunLock::new()), config())
    }

    #[tokio::test]
    async fn test_in_app_dispatch_with_template() {
        let store = MemoryStore::new();
        store.insert_template(NotificationTemplate {
            template_key: "task_accepted".into(),
            channel: "in_app".into(),
            title_template: "Task {{task_id}} accepted".into(),
            body_template: "{{helper}} is on it".into(),
        });
        let id = enqueue(
            &store,
            5,
            NotificationEventType::TaskAccepted,
            NotificationChannel::InApp,
            json!({"task_id": 42, "helper": "Sam"}),
        )
        .await;

        let report = completed(processor(&store, ScriptedPush::ok(), config()).run_at(noon()).await.unwrap());
        assert_eq!((report.picked, report.sent, report.delivered), (1, 1, 1));
        assert_eq!(entry(&store, id).await.status, QueueStatus::Sent);

        let rows = store.in_app_for(5);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].title, "Task 42 accepted");
        assert_eq!(rows[0].body, "Sam is on it");

        let stats = store.find_by_day(noon().date_naive()).await.unwrap();
        assert_eq!(stats.len(), 1);
        assert_eq!((stats[0].sent, stats[0].delivered, stats[0].failed), (1, 1, 0));
    }

    #[tokio::test]
    async fn test_disabled_channel_is_suppressed_without_retry() {
        let store = MemoryStore::new();
        // SMS is off by default
        let id = enqueue(
            &store,
            5,
            NotificationEventType::TaskCreated,
            NotificationChannel::Sms,
            json!({"title": "t", "body": "b"}),
        )
        .await;

        let report = completed(processor(&store, ScriptedPush::ok(), config()).run_at(noon()).await.unwrap());
        assert_eq!(report.suppressed, 1);

        let stored = entry(&store, id).await;
        assert_eq!(stored.status, QueueStatus::Failed);
        assert_eq!(stored.failure_reason.as_deref(), Some(SUPPRESSED_CHANNEL_DISABLED));
        assert!(stored.is_suppressed());
        assert_eq!(stored.retry_count, 0);
    }

    #[tokio::test]
    async fn test_quiet_hours_suppress_inside_window_only() {
        let store = MemoryStore::new();
        let mut pref = UserNotificationPreference::with_defaults(5);
        pref.quiet_hours_start = NaiveTime::from_hms_opt(22, 0, 0);
        pref.quiet_hours_end = NaiveTime::from_hms_opt(7, 0, 0);
        store.insert_if_absent(&pref).await.unwrap();

        let push = ScriptedPush::ok();
        let processor = processor(&store, push.clone(), config());
        let payload = json!({"title": "t", "body": "b"});

        let night = enqueue(&store, 5, NotificationEventType::TaskAccepted, NotificationChannel::Push, payload.clone()).await;
        let late = Utc.with_ymd_and_hms(2024, 5, 1, 23, 30, 0).unwrap();
        completed(processor.run_at(late).await.unwrap());
        let stored = entry(&store, night).await;
        assert_eq!(stored.failure_reason.as_deref(), Some(SUPPRESSED_QUIET_HOURS));
        assert_eq!(push.calls.load(Ordering::SeqCst), 0);

        let day = enqueue(&store, 5, NotificationEventType::TaskAccepted, NotificationChannel::Push, payload).await;
        completed(processor.run_at(noon()).await.unwrap());
        assert_eq!(entry(&store, day).await.status, QueueStatus::Sent);
        assert_eq!(push.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_transient_failures_retry_with_backoff_then_fail() {
        let store = MemoryStore::new();
        let push = ScriptedPush::failing();
        let processor = processor(&store, push.clone(), config());
        let id = enqueue(
            &store,
            5,
            NotificationEventType::TaskAccepted,
            NotificationChannel::Push,
            json!({"title": "t", "body": "b"}),
        )
        .await;

        let report = completed(processor.run_at(noon()).await.unwrap());
        assert_eq!(report.retried, 1);
        let stored = entry(&store, id).await;
        assert_eq!(stored.status, QueueStatus::Pending);
        assert_eq!(stored.retry_count, 1);
        assert_eq!(stored.next_attempt_at, noon() + Duration::seconds(60));

        // Not due yet
        let report = completed(processor.run_at(noon() + Duration::seconds(30)).await.unwrap());
        assert_eq!(report.picked, 0);

        let second = noon() + Duration::seconds(61);
        completed(processor.run_at(second).await.unwrap());
        let stored = entry(&store, id).await;
        assert_eq!(stored.retry_count, 2);
        assert_eq!(stored.next_attempt_at, second + Duration::seconds(120));

        let report = completed(processor.run_at(second + Duration::seconds(121)).await.unwrap());
        assert_eq!(report.failed, 1);
        let stored = entry(&store, id).await;
        assert_eq!(stored.status, QueueStatus::Failed);
        assert_eq!(stored.retry_count, 3);
        assert_eq!(stored.failure_reason.as_deref(), Some("transient: provider busy"));
        assert_eq!(push.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_and_template_failures() {
        let store = MemoryStore::new();
        let adapters = AdapterSet::from_config(&config(), Arc::new(store.clone())).unwrap();
        let processor = NotificationProcessor::new(
            NotifyRepositories::from_store(store.clone()),
            adapters,
            Arc::new(LocalRunLock::new()),
            config(),
        );

        // Email is on for task_completed but no webhook is configured
        let email = enqueue(
            &store,
            5,
            NotificationEventType::TaskCompleted,
            NotificationChannel::Email,
            json!({"title": "t", "body": "b"}),
        )
        .await;
        let bare = enqueue(
            &store,
            5,
            NotificationEventType::TaskCompleted,
            NotificationChannel::InApp,
            json!({"task_id": 1}),
        )
        .await;

        let report = completed(processor.run_at(noon()).await.unwrap());
        assert_eq!(report.failed, 2);

        let stored = entry(&store, email).await;
        assert_eq!(stored.status, QueueStatus::Failed);
        assert_eq!(stored.failure_reason.as_deref(), Some("channel not configured: email"));
        assert_eq!(stored.retry_count, 0);
        assert_eq!(
            entry(&store, bare).await.failure_reason.as_deref(),
            Some(TEMPLATE_MISSING)
        );

        let stats = store.find_by_day(noon().date_naive()).await.unwrap();
        assert_eq!(stats.iter().map(|s| s.failed).sum::<i64>(), 2);
    }

    #[tokio::test]
    async fn test_unknown_channel_fails_entry() {
        let store = MemoryStore::new();
        let id = enqueue(&store, 5, NotificationEventType::TaskCreated, NotificationChannel::Push, json!({})).await;
        let mut stored = entry(&store, id).await;
        stored.channel = "pigeon".into();
        store.put_queue_entry(stored);

        completed(processor(&store, ScriptedPush::ok(), config()).run_at(noon()).await.unwrap());
        assert_eq!(entry(&store, id).await.failure_reason.as_deref(), Some(UNKNOWN_CHANNEL));
    }

    #[tokio::test]
    async fn test_held_lock_skips_without_touching_entries() {
        let store = MemoryStore::new();
        let lock = Arc::new(LocalRunLock::new());
        let token = lock
            .try_acquire(RUN_LOCK_KEY, std::time::Duration::from_secs(60))
            .await
            .unwrap()
            .unwrap();
        let id = enqueue(&store, 5, NotificationEventType::TaskAccepted, NotificationChannel::Push, json!({"title": "t"})).await;

        let processor = processor_with_lock(&store, ScriptedPush::ok(), config(), lock.clone());
        assert_eq!(processor.run_at(noon()).await.unwrap(), RunOutcome::Skipped);
        assert_eq!(entry(&store, id).await.status, QueueStatus::Pending);

        lock.release(&token).await.unwrap();
        completed(processor.run_at(noon()).await.unwrap());
        assert_eq!(entry(&store, id).await.status, QueueStatus::Sent);
    }

    #[tokio::test]
    async fn test_concurrent_runs_do_work_once() {
        let store = MemoryStore::new();
        let lock: Arc<dyn RunLock> = Arc::new(LocalRunLock::new());
        let push = ScriptedPush::slow();
        for _ in 0..3 {
            enqueue(&store, 5, NotificationEventType::TaskAccepted, NotificationChannel::Push, json!({"title": "t"})).await;
        }

        let first = processor_with_lock(&store, push.clone(), config(), lock.clone());
        let second = processor_with_lock(&store, push.clone(), config(), lock);
        let (a, b) = tokio::join!(first.run_at(noon()), second.run_at(noon()));

        let outcomes = [a.unwrap(), b.unwrap()];
        let skipped = outcomes.iter().filter(|o| **o == RunOutcome::Skipped).count();
        assert_eq!(skipped, 1);
        assert_eq!(push.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_storage_outage_aborts_run() {
        let store = MemoryStore::new();
        let id = enqueue(&store, 5, NotificationEventType::TaskAccepted, NotificationChannel::Push, json!({"title": "t"})).await;
        store.set_available(false);

        let report = completed(processor(&store, ScriptedPush::ok(), config()).run_at(noon()).await.unwrap());
        assert!(report.aborted);
        assert!(report.cleanup.is_none());

        store.set_available(true);
        assert_eq!(entry(&store, id).await.status, QueueStatus::Pending);
        assert!(store.find_by_day(noon().date_naive()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_batches_and_budget() {
        let store = MemoryStore::new();
        for _ in 0..5 {
            enqueue(&store, 5, NotificationEventType::TaskAccepted, NotificationChannel::InApp, json!({"title": "t"})).await;
        }

        let mut small = config();
        small.batch_size = 2;
        let report = completed(processor(&store, ScriptedPush::ok(), small).run_at(noon()).await.unwrap());
        assert_eq!((report.batches, report.picked, report.sent), (3, 5, 5));

        enqueue(&store, 5, NotificationEventType::TaskAccepted, NotificationChannel::InApp, json!({"title": "t"})).await;
        let mut no_time = config();
        no_time.run_budget_secs = 0;
        let report = completed(processor(&store, ScriptedPush::ok(), no_time).run_at(noon()).await.unwrap());
        assert!(report.budget_exhausted);
        assert_eq!(report.picked, 0);
    }

    #[tokio::test]
    async fn test_cleanup_retention() {
        let store = MemoryStore::new();
        let now = noon();

        let old = enqueue(&store, 5, NotificationEventType::TaskAccepted, NotificationChannel::Push, json!({})).await;
        let mut stored = entry(&store, old).await;
        stored.status = QueueStatus::Sent;
        stored.updated_at = now - Duration::days(8);
        store.put_queue_entry(stored);

        let recent = enqueue(&store, 5, NotificationEventType::TaskAccepted, NotificationChannel::Push, json!({})).await;
        let mut stored = entry(&store, recent).await;
        stored.status = QueueStatus::Failed;
        stored.updated_at = now - Duration::days(2);
        store.put_queue_entry(stored);

        let aged = |id: i64, read: bool, pinned: bool, expires: Option<DateTime<Utc>>| {
            let mut n = InAppNotification::new(9, format!("n{id}"), "b".into());
            n.id = id;
            n.is_read = read;
            n.is_pinned = pinned;
            n.expires_at = expires;
            n.created_at = now - Duration::days(31);
            n
        };
        store.put_in_app(aged(1001, true, false, None));
        store.put_in_app(aged(1002, true, true, None));
        store.put_in_app(aged(1003, false, false, None));
        store.put_in_app(aged(1004, false, false, Some(now - Duration::hours(1))));

        let report = completed(processor(&store, ScriptedPush::ok(), config()).run_at(now).await.unwrap());
        assert_eq!(
            report.cleanup,
            Some(CleanupReport {
                queue_entries: 1,
                read_notifications: 1,
                expired_notifications: 1,
            })
        );

        assert!(NotificationQueueRepository::find_by_id(&store, old).await.unwrap().is_none());
        assert!(NotificationQueueRepository::find_by_id(&store, recent).await.unwrap().is_some());
        let mut left: Vec<i64> = store.in_app_for(9).iter().map(|n| n.id).collect();
        left.sort_unstable();
        assert_eq!(left, vec![1002, 1003]);
    }

    #[tokio::test]
    async fn test_sent_write_is_retried_after_delivery() {
        let store = MemoryStore::new();
        let push = ScriptedPush::ok();
        let id = enqueue(&store, 5, NotificationEventType::TaskAccepted, NotificationChannel::Push, json!({"title": "t"})).await;

        let report = completed(flaky_processor(&store, push.clone(), 1).run_at(noon()).await.unwrap());
        assert_eq!((report.sent, report.errors), (1, 0));
        assert_eq!(entry(&store, id).await.status, QueueStatus::Sent);
        assert_eq!(push.calls.load(Ordering::SeqCst), 1);

        // A later run finds nothing left to deliver
        let report = completed(processor(&store, push.clone(), config()).run_at(noon()).await.unwrap());
        assert_eq!(report.picked, 0);
        assert_eq!(push.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unrecorded_delivery_is_counted_as_error() {
        let store = MemoryStore::new();
        let push = ScriptedPush::ok();
        let id = enqueue(&store, 5, NotificationEventType::TaskAccepted, NotificationChannel::Push, json!({"title": "t"})).await;
        let other = enqueue(&store, 6, NotificationEventType::TaskAccepted, NotificationChannel::Push, json!({"title": "t"})).await;

        let report = completed(flaky_processor(&store, push.clone(), 2).run_at(noon()).await.unwrap());
        assert_eq!((report.picked, report.sent, report.errors), (2, 1, 1));
        assert!(!report.aborted);
        assert_eq!(entry(&store, id).await.status, QueueStatus::Pending);
        assert_eq!(entry(&store, other).await.status, QueueStatus::Sent);
    }

    #[tokio::test]
    async fn test_bad_payload_does_not_block_batch() {
        let store = MemoryStore::new();
        let bad = enqueue(
            &store,
            5,
            NotificationEventType::TaskAccepted,
            NotificationChannel::InApp,
            json!({"title": "t", "expires_in_days": 1_000_000_000}),
        )
        .await;
        let junk = enqueue(&store, 5, NotificationEventType::TaskAccepted, NotificationChannel::InApp, json!("junk")).await;
        let good = enqueue(
            &store,
            5,
            NotificationEventType::TaskAccepted,
            NotificationChannel::InApp,
            json!({"title": "ok", "expires_in_days": 3}),
        )
        .await;

        let report = completed(processor(&store, ScriptedPush::ok(), config()).run_at(noon()).await.unwrap());
        assert_eq!((report.picked, report.sent, report.failed, report.errors), (3, 1, 2, 0));
        assert!(report.cleanup.is_some());

        let stored = entry(&store, bad).await;
        assert_eq!(stored.status, QueueStatus::Failed);
        assert_eq!(stored.retry_count, 0);
        assert!(stored
            .failure_reason
            .as_deref()
            .is_some_and(|r| r.starts_with("permanent: expires_in_days out of range")));
        assert_eq!(entry(&store, junk).await.failure_reason.as_deref(), Some(TEMPLATE_MISSING));
        assert_eq!(entry(&store, good).await.status, QueueStatus::Sent);

        let delivered = store.in_app_for(5);
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].title, "ok");
        assert_eq!(delivered[0].expires_at, Some(noon() + Duration::days(3)));
    }

    #[test]
    fn test_retry_delay_doubles() {
        assert_eq!(retry_delay(60, 1), Duration::seconds(60));
        assert_eq!(retry_delay(60, 2), Duration::seconds(120));
        assert_eq!(retry_delay(60, 3), Duration::seconds(240));
        assert_eq!(retry_delay(60, 0), Duration::seconds(60));
    }

    #[test]
    fn test_days_before_saturates() {
        assert_eq!(days_before(noon(), 7), noon() - Duration::days(7));
        assert_eq!(days_before(noon(), i64::MAX), DateTime::<Utc>::MIN_UTC);
    }

    #[test]
    fn test_retry_delay_is_capped() {
        let max = Duration::seconds(MAX_RETRY_DELAY_SECS);
        assert_eq!(retry_delay(u64::MAX, 1), max);
        assert_eq!(retry_delay(u64::MAX / 2, 40), max);
        assert_eq!(retry_delay(86_400, 16), max);
        assert_eq!(retry_delay(86_400, 2), Duration::days(2));
    }
}
