use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub at: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
}

/// Running counters for one external service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiCallStats {
    pub calls: u64,
    pub failures: u64,
    pub total_ms: u64,
    pub last_called: Option<DateTime<Utc>>,
}

impl ApiCallStats {
    #[must_use]
    pub fn average_ms(&self) -> u64 {
        if self.calls == 0 {
            0
        } else {
            self.total_ms / self.calls
        }
    }
}

/// Persisted shape of the `appLogs` key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppLogs {
    #[serde(default)]
    pub entries: Vec<LogEntry>,
    #[serde(default)]
    pub api_stats: BTreeMap<String, ApiCallStats>,
}
