use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::domain::{AnimeId, ListKind, ListStatus, Stars, Theme};
use crate::models::activity::AppLogs;
use crate::models::tracking::{ManualEntry, ManualEntryDraft, RatingRecord};

pub mod backend;
pub mod repositories;

pub use backend::{FileBackend, KeyValueBackend, MemoryBackend};
pub use repositories::lists::ListCounts;

/// Storage-layer failures.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Stored value under '{key}' is not valid JSON: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize value: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// JSON-typed view over a raw [`KeyValueBackend`].
#[derive(Clone)]
pub struct Kv(Arc<dyn KeyValueBackend>);

impl Kv {
    pub fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        let Some(raw) = self.0.get(key)? else {
            return Ok(None);
        };

        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| StoreError::Corrupt {
                key: key.to_string(),
                source,
            })
    }

    pub fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let raw = serde_json::to_string(value).map_err(StoreError::Serialize)?;
        self.0.set(key, raw)
    }

    pub fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.0.remove(key)
    }

    pub fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        Ok(self
            .0
            .keys()?
            .into_iter()
            .filter(|k| k.starts_with(prefix))
            .collect())
    }
}

/// Handle to everything the application persists locally.
///
/// Cheap to clone; all clones share one backend.
#[derive(Clone)]
pub struct Store {
    conn: Kv,
}

impl Store {
    /// Opens the JSON-file store at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let backend = FileBackend::open(path)?;
        info!(path = %backend.path().display(), "Local storage opened");
        Ok(Self::with_backend(Arc::new(backend)))
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self::with_backend(Arc::new(MemoryBackend::new()))
    }

    #[must_use]
    pub fn with_backend(backend: Arc<dyn KeyValueBackend>) -> Self {
        Self { conn: Kv(backend) }
    }

    fn list_repo(&self) -> repositories::lists::ListRepository {
        repositories::lists::ListRepository::new(self.conn.clone())
    }

    fn rating_repo(&self) -> repositories::ratings::RatingRepository {
        repositories::ratings::RatingRepository::new(self.conn.clone())
    }

    fn manual_repo(&self) -> repositories::manual::ManualEntryRepository {
        repositories::manual::ManualEntryRepository::new(self.conn.clone())
    }

    fn preferences_repo(&self) -> repositories::preferences::PreferencesRepository {
        repositories::preferences::PreferencesRepository::new(self.conn.clone())
    }

    fn logs_repo(&self) -> repositories::logs::LogRepository {
        repositories::logs::LogRepository::new(self.conn.clone())
    }

    // Status lists

    #[must_use]
    pub fn get_list(&self, kind: ListKind) -> Vec<AnimeId> {
        self.list_repo().get(kind)
    }

    pub fn add_to_list(&self, kind: ListKind, id: AnimeId) -> Result<(), StoreError> {
        self.list_repo().add(kind, id)
    }

    pub fn remove_from_list(&self, kind: ListKind, id: AnimeId) -> Result<bool, StoreError> {
        self.list_repo().remove(kind, id)
    }

    #[must_use]
    pub fn get_status(&self, id: AnimeId) -> ListStatus {
        self.list_repo().status(id)
    }

    #[must_use]
    pub fn list_counts(&self) -> ListCounts {
        self.list_repo().counts()
    }

    pub fn replace_list(&self, kind: ListKind, ids: &[AnimeId]) -> Result<(), StoreError> {
        self.list_repo().replace(kind, ids)
    }

    // Ratings

    #[must_use]
    pub fn get_rating(&self, id: AnimeId) -> Option<RatingRecord> {
        self.rating_repo().get(id)
    }

    pub fn set_rating(
        &self,
        id: AnimeId,
        stars: Stars,
        opinion: &str,
    ) -> Result<RatingRecord, StoreError> {
        self.rating_repo().set(id, stars, opinion)
    }

    pub fn put_rating(&self, id: AnimeId, record: &RatingRecord) -> Result<(), StoreError> {
        self.rating_repo().put(id, record)
    }

    pub fn delete_rating(&self, id: AnimeId) -> Result<bool, StoreError> {
        self.rating_repo().delete(id)
    }

    pub fn all_ratings(&self) -> Result<Vec<(AnimeId, RatingRecord)>, StoreError> {
        self.rating_repo().all()
    }

    pub fn clear_ratings(&self) -> Result<usize, StoreError> {
        self.rating_repo().clear()
    }

    // Manual entries

    #[must_use]
    pub fn manual_entries(&self) -> Vec<ManualEntry> {
        self.manual_repo().list()
    }

    #[must_use]
    pub fn get_manual_entry(&self, id: Uuid) -> Option<ManualEntry> {
        self.manual_repo().get(id)
    }

    pub fn add_manual_entry(&self, draft: ManualEntryDraft) -> Result<ManualEntry, StoreError> {
        self.manual_repo().add(draft)
    }

    pub fn update_manual_entry(
        &self,
        id: Uuid,
        draft: ManualEntryDraft,
    ) -> Result<Option<ManualEntry>, StoreError> {
        self.manual_repo().update(id, draft)
    }

    pub fn remove_manual_entry(&self, id: Uuid) -> Result<bool, StoreError> {
        self.manual_repo().remove(id)
    }

    pub fn replace_manual_entries(&self, entries: &[ManualEntry]) -> Result<(), StoreError> {
        self.manual_repo().replace(entries)
    }

    // Preferences

    #[must_use]
    pub fn theme(&self) -> Theme {
        self.preferences_repo().theme()
    }

    pub fn set_theme(&self, theme: Theme) -> Result<(), StoreError> {
        self.preferences_repo().set_theme(theme)
    }

    #[must_use]
    pub fn language(&self) -> Option<String> {
        self.preferences_repo().language()
    }

    pub fn set_language(&self, language: &str) -> Result<(), StoreError> {
        self.preferences_repo().set_language(language)
    }

    // Logs and API statistics

    #[must_use]
    pub fn app_logs(&self) -> AppLogs {
        self.logs_repo().get()
    }

    pub fn save_app_logs(&self, logs: &AppLogs) -> Result<(), StoreError> {
        self.logs_repo().put(logs)
    }
}
