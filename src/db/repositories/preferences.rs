use tracing::warn;

use crate::db::{Kv, StoreError};
use crate::domain::Theme;

pub const THEME_KEY: &str = "theme";
pub const LANGUAGE_KEY: &str = "language";

pub struct PreferencesRepository {
    conn: Kv,
}

impl PreferencesRepository {
    #[must_use]
    pub const fn new(conn: Kv) -> Self {
        Self { conn }
    }

    #[must_use]
    pub fn theme(&self) -> Theme {
        self.conn
            .read_json(THEME_KEY)
            .unwrap_or_else(|e| {
                warn!(error = %e, "Failed to read theme preference");
                None
            })
            .unwrap_or_default()
    }

    pub fn set_theme(&self, theme: Theme) -> Result<(), StoreError> {
        self.conn.write_json(THEME_KEY, &theme)
    }

    #[must_use]
    pub fn language(&self) -> Option<String> {
        self.conn.read_json(LANGUAGE_KEY).unwrap_or_else(|e| {
            warn!(error = %e, "Failed to read language preference");
            None
        })
    }

    pub fn set_language(&self, language: &str) -> Result<(), StoreError> {
        let language = language.trim();
        let valid = !language.is_empty()
            && language.len() <= 16
            && language
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-');

        if !valid {
            return Err(StoreError::InvalidInput(format!(
                "invalid language tag '{language}'"
            )));
        }

        self.conn.write_json(LANGUAGE_KEY, language)
    }
}
