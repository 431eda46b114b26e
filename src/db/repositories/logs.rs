use tracing::warn;

use crate::db::{Kv, StoreError};
use crate::models::activity::AppLogs;

pub const APP_LOGS_KEY: &str = "appLogs";

pub struct LogRepository {
    conn: Kv,
}

impl LogRepository {
    #[must_use]
    pub const fn new(conn: Kv) -> Self {
        Self { conn }
    }

    #[must_use]
    pub fn get(&self) -> AppLogs {
        self.conn
            .read_json(APP_LOGS_KEY)
            .unwrap_or_else(|e| {
                warn!(error = %e, "Failed to read cached logs, starting fresh");
                None
            })
            .unwrap_or_default()
    }

    pub fn put(&self, logs: &AppLogs) -> Result<(), StoreError> {
        self.conn.write_json(APP_LOGS_KEY, logs)
    }
}
