//! Persisted activity log and per-service API call statistics.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use chrono::Utc;
use tracing::warn;

use crate::db::Store;
use crate::models::activity::{ApiCallStats, AppLogs, LogEntry, LogLevel};

/// Shared log book, constructed once and handed to every component that
/// reports activity.
pub struct LogBook {
    store: Store,
    capacity: usize,
    // Serializes read-modify-write cycles on the `appLogs` key.
    guard: Mutex<()>,
}

impl LogBook {
    #[must_use]
    pub const fn new(store: Store, capacity: usize) -> Self {
        Self {
            store,
            capacity,
            guard: Mutex::new(()),
        }
    }

    pub fn record(&self, level: LogLevel, message: impl Into<String>) {
        let entry = LogEntry {
            at: Utc::now(),
            level,
            message: message.into(),
        };
        let capacity = self.capacity;

        self.update(|logs| {
            logs.entries.push(entry);
            if logs.entries.len() > capacity {
                let excess = logs.entries.len() - capacity;
                logs.entries.drain(..excess);
            }
        });
    }

    pub fn record_api_call(&self, service: &str, ok: bool, elapsed: Duration) {
        let elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);

        self.update(|logs| {
            let stats = logs.api_stats.entry(service.to_string()).or_default();
            stats.calls += 1;
            if !ok {
                stats.failures += 1;
            }
            stats.total_ms = stats.total_ms.saturating_add(elapsed_ms);
            stats.last_called = Some(Utc::now());
        });
    }

    #[must_use]
    pub fn entries(&self) -> Vec<LogEntry> {
        self.store.app_logs().entries
    }

    #[must_use]
    pub fn api_stats(&self) -> Vec<(String, ApiCallStats)> {
        self.store.app_logs().api_stats.into_iter().collect()
    }

    pub fn clear(&self) {
        self.update(|logs| *logs = AppLogs::default());
    }

    fn update(&self, apply: impl FnOnce(&mut AppLogs)) {
        let _guard = self.guard.lock().unwrap_or_else(PoisonError::into_inner);

        let mut logs = self.store.app_logs();
        apply(&mut logs);

        if let Err(e) = self.store.save_app_logs(&logs) {
            warn!(error = %e, "Failed to persist log book");
        }
    }
}
