//! # relay-notify
//!
//! Notification queue processor: drains pending entries, applies user
//! preferences and quiet hours, dispatches through channel adapters,
//! retries with backoff, cleans up old rows, and records daily stats.
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use relay_cache::LocalRunLock;
//! use relay_notify::{AdapterSet, NotificationProcessor, NotifyRepositories};
//!
//! let repos = NotifyRepositories::postgres(pool);
//! let adapters = AdapterSet::from_config(&config.notify, repos.in_app.clone())?;
//! let processor = NotificationProcessor::new(repos, adapters, Arc::new(LocalRunLock::new()), config.notify);
//! let outcome = processor.run().await?;
//! ```

pub mod adapters;
pub mod error;
pub mod processor;

pub use adapters::{AdapterSet, ChannelAdapter, DeliveryReceipt, InAppAdapter, WebhookAdapter};
pub use error::{DeliveryError, ProcessorError, ProcessorResult};
pub use processor::{
    retry_delay, CleanupReport, EntryOutcome, NotificationProcessor, NotifyRepositories,
    RunOutcome, RunReport, RUN_LOCK_KEY,
};
