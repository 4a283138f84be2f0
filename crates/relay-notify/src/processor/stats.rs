//! Daily delivery counters collected during a run

use std::collections::BTreeMap;

use chrono::NaiveDate;
use relay_core::entities::{DeliveryStat, NotificationQueueEntry};

use super::report::EntryOutcome;

/// Accumulates counters per (template, channel) for one day
#[derive(Debug)]
pub struct StatsCollector {
    day: NaiveDate,
    rows: BTreeMap<(String, String), DeliveryStat>,
}

impl StatsCollector {
    pub fn new(day: NaiveDate) -> Self {
        Self {
            day,
            rows: BTreeMap::new(),
        }
    }

    /// Count an entry's outcome; retries are not counted until they finish
    pub fn record(&mut self, entry: &NotificationQueueEntry, outcome: EntryOutcome) {
        let key = (entry.template_key.clone(), entry.channel.clone());
        let day = self.day;
        let row = self
            .rows
            .entry(key)
            .or_insert_with(|| DeliveryStat::new(day, &*entry.template_key, &*entry.channel));

        match outcome {
            EntryOutcome::Sent { delivered } => {
                row.sent += 1;
                if delivered {
                    row.delivered += 1;
                }
            }
            EntryOutcome::Failed | EntryOutcome::Suppressed => row.failed += 1,
            EntryOutcome::Retried => {}
        }
    }

    /// Non-empty rows, ready to upsert
    pub fn into_stats(self) -> Vec<DeliveryStat> {
        self.rows.into_values().filter(|s| !s.is_empty()).collect()
    }
}
