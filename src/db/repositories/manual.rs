use chrono::Utc;
use tracing::warn;
use uuid::Uuid;

use crate::db::{Kv, StoreError};
use crate::models::tracking::{ManualEntry, ManualEntryDraft};

pub const MANUAL_ENTRIES_KEY: &str = "manualAnimeList";

pub struct ManualEntryRepository {
    conn: Kv,
}

impl ManualEntryRepository {
    #[must_use]
    pub const fn new(conn: Kv) -> Self {
        Self { conn }
    }

    #[must_use]
    pub fn list(&self) -> Vec<ManualEntry> {
        self.conn
            .read_json(MANUAL_ENTRIES_KEY)
            .unwrap_or_else(|e| {
                warn!(error = %e, "Failed to read manual entries, treating as empty");
                None
            })
            .unwrap_or_default()
    }

    #[must_use]
    pub fn get(&self, id: Uuid) -> Option<ManualEntry> {
        self.list().into_iter().find(|e| e.id == id)
    }

    pub fn add(&self, draft: ManualEntryDraft) -> Result<ManualEntry, StoreError> {
        let draft = validate(draft)?;
        let entry = ManualEntry {
            id: Uuid::new_v4(),
            title: draft.title,
            image_url: draft.image_url,
            rating: draft.rating,
            notes: draft.notes,
            created_at: Utc::now(),
        };

        let mut entries = self.list();
        entries.insert(0, entry.clone());
        self.replace(&entries)?;
        Ok(entry)
    }

    /// Returns `None` when no entry has `id`.
    pub fn update(
        &self,
        id: Uuid,
        draft: ManualEntryDraft,
    ) -> Result<Option<ManualEntry>, StoreError> {
        let draft = validate(draft)?;
        let mut entries = self.list();

        let Some(entry) = entries.iter_mut().find(|e| e.id == id) else {
            return Ok(None);
        };

        entry.title = draft.title;
        entry.image_url = draft.image_url;
        entry.rating = draft.rating;
        entry.notes = draft.notes;
        let updated = entry.clone();

        self.replace(&entries)?;
        Ok(Some(updated))
    }

    pub fn remove(&self, id: Uuid) -> Result<bool, StoreError> {
        let entries = self.list();
        let before = entries.len();
        let remaining: Vec<ManualEntry> = entries.into_iter().filter(|e| e.id != id).collect();

        if remaining.len() == before {
            return Ok(false);
        }

        self.replace(&remaining)?;
        Ok(true)
    }

    pub fn replace(&self, entries: &[ManualEntry]) -> Result<(), StoreError> {
        self.conn.write_json(MANUAL_ENTRIES_KEY, entries)
    }
}

fn validate(mut draft: ManualEntryDraft) -> Result<ManualEntryDraft, StoreError> {
    draft.title = draft.title.trim().to_string();
    if draft.title.is_empty() {
        return Err(StoreError::InvalidInput("title cannot be empty".to_string()));
    }

    draft.image_url = draft
        .image_url
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty());

    if let Some(url) = &draft.image_url
        && url::Url::parse(url).is_err()
    {
        return Err(StoreError::InvalidInput(format!("invalid image URL: {url}")));
    }

    Ok(draft)
}
