//! Export and import of everything the application keeps locally.
//!
//! The export document is a versioned envelope:
//!
//! ```json
//! {
//!   "meta": { "app": "AllNime", "version": 1, "exported_at": "..." },
//!   "ratings": { "42": { "stars": 4, "opinion": "...", "updated_at": "..." } },
//!   "lists": { "watchingList": [42], "completedList": [] },
//!   "theme": "dark",
//!   "manual": [],
//!   "language": "en"
//! }
//! ```
//!
//! Imports are parsed and validated in full before the first write.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::db::{Store, StoreError};
use crate::domain::{AnimeId, ListKind, ListStatus, Theme};
use crate::models::tracking::{ManualEntry, RatingRecord};

pub const EXPORT_APP_NAME: &str = "AllNime";
pub const EXPORT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Backup is not valid JSON: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("Backup has no 'meta' envelope")]
    MissingEnvelope,

    #[error("Unsupported backup version {found} (expected {expected})", expected = EXPORT_VERSION)]
    UnsupportedVersion { found: u32 },

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImportMode {
    /// Replace ratings, lists and manual entries with the backup's.
    #[default]
    Overwrite,
    /// Keep what exists and add only what is missing.
    Merge,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportMeta {
    pub app: String,
    pub version: u32,
    pub exported_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportDocument {
    pub meta: ExportMeta,
    pub ratings: BTreeMap<String, RatingRecord>,
    pub lists: BTreeMap<String, Vec<AnimeId>>,
    pub theme: Theme,
    #[serde(default)]
    pub manual: Vec<ManualEntry>,
    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub list_entries_added: usize,
    pub ratings_imported: usize,
    pub ratings_kept: usize,
    pub manual_imported: usize,
    /// Entries that could not be understood and were left out.
    pub skipped: usize,
    pub theme_applied: bool,
    pub language_applied: bool,
}

/// Loosely typed view of a backup; individual bad entries are skipped
/// rather than failing the whole import.
#[derive(Debug, Deserialize)]
struct RawDocument {
    meta: Option<RawMeta>,
    #[serde(default)]
    ratings: BTreeMap<String, Value>,
    #[serde(default)]
    lists: BTreeMap<String, Vec<Value>>,
    #[serde(default)]
    theme: Option<Value>,
    #[serde(default)]
    manual: Vec<Value>,
    #[serde(default)]
    language: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawMeta {
    version: u32,
}

/// A backup that passed validation, ready to apply.
#[derive(Debug, Default)]
struct ImportPlan {
    lists: Vec<(ListKind, Vec<AnimeId>)>,
    ratings: Vec<(AnimeId, RatingRecord)>,
    manual: Vec<ManualEntry>,
    theme: Option<Theme>,
    language: Option<String>,
    skipped: usize,
}

pub struct BackupService {
    store: Store,
}

impl BackupService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    pub fn export_all_data(&self) -> Result<ExportDocument, StoreError> {
        let ratings = self
            .store
            .all_ratings()?
            .into_iter()
            .map(|(id, record)| (id.to_string(), record))
            .collect();

        let lists = ListKind::ALL
            .iter()
            .map(|kind| (kind.storage_key().to_string(), self.store.get_list(*kind)))
            .collect();

        let document = ExportDocument {
            meta: ExportMeta {
                app: EXPORT_APP_NAME.to_string(),
                version: EXPORT_VERSION,
                exported_at: Utc::now(),
            },
            ratings,
            lists,
            theme: self.store.theme(),
            manual: self.store.manual_entries(),
            language: self.store.language(),
        };

        info!(
            event = "data_exported",
            ratings = document.ratings.len(),
            manual = document.manual.len(),
            "Exported local data"
        );
        Ok(document)
    }

    pub fn export_json(&self) -> anyhow::Result<String> {
        let document = self.export_all_data()?;
        Ok(serde_json::to_string_pretty(&document)?)
    }

    pub fn import_all_data(&self, json: &str, mode: ImportMode) -> Result<ImportSummary, ImportError> {
        let plan = parse(json)?;

        let summary = match mode {
            ImportMode::Overwrite => self.apply_overwrite(plan)?,
            ImportMode::Merge => self.apply_merge(plan)?,
        };

        info!(
            event = "data_imported",
            ?mode,
            lists = summary.list_entries_added,
            ratings = summary.ratings_imported,
            skipped = summary.skipped,
            "Imported local data"
        );
        Ok(summary)
    }

    fn apply_overwrite(&self, plan: ImportPlan) -> Result<ImportSummary, StoreError> {
        let mut summary = ImportSummary {
            skipped: plan.skipped,
            ..ImportSummary::default()
        };

        self.store.clear_ratings()?;
        for (id, record) in &plan.ratings {
            self.store.put_rating(*id, record)?;
        }
        summary.ratings_imported = plan.ratings.len();

        for kind in ListKind::ALL {
            let ids = plan
                .lists
                .iter()
                .find(|(k, _)| *k == kind)
                .map(|(_, ids)| ids.as_slice())
                .unwrap_or_default();
            self.store.replace_list(kind, ids)?;
            summary.list_entries_added += ids.len();
        }

        self.store.replace_manual_entries(&plan.manual)?;
        summary.manual_imported = plan.manual.len();

        if let Some(theme) = plan.theme {
            self.store.set_theme(theme)?;
            summary.theme_applied = true;
        }

        if let Some(language) = &plan.language {
            match self.store.set_language(language) {
                Ok(()) => summary.language_applied = true,
                Err(e) => {
                    warn!(language, error = %e, "Ignoring language from backup");
                    summary.skipped += 1;
                }
            }
        }

        Ok(summary)
    }

    fn apply_merge(&self, plan: ImportPlan) -> Result<ImportSummary, StoreError> {
        let mut summary = ImportSummary {
            skipped: plan.skipped,
            ..ImportSummary::default()
        };

        for (kind, ids) in &plan.lists {
            let mut current = self.store.get_list(*kind);
            let before = current.len();
            for id in ids {
                if self.store.get_status(*id) == ListStatus::None && !current.contains(id) {
                    current.push(*id);
                }
            }
            if current.len() > before {
                summary.list_entries_added += current.len() - before;
                self.store.replace_list(*kind, &current)?;
            }
        }

        for (id, record) in &plan.ratings {
            if self.store.get_rating(*id).is_some() {
                summary.ratings_kept += 1;
            } else {
                self.store.put_rating(*id, record)?;
                summary.ratings_imported += 1;
            }
        }

        let mut manual = self.store.manual_entries();
        let known: HashSet<_> = manual.iter().map(|e| e.id).collect();
        let fresh: Vec<ManualEntry> = plan
            .manual
            .into_iter()
            .filter(|e| !known.contains(&e.id))
            .collect();
        if !fresh.is_empty() {
            summary.manual_imported = fresh.len();
            manual.extend(fresh);
            self.store.replace_manual_entries(&manual)?;
        }

        Ok(summary)
    }
}

fn parse(json: &str) -> Result<ImportPlan, ImportError> {
    let raw: RawDocument = serde_json::from_str(json).map_err(ImportError::Malformed)?;

    let meta = raw.meta.ok_or(ImportError::MissingEnvelope)?;
    if meta.version != EXPORT_VERSION {
        return Err(ImportError::UnsupportedVersion {
            found: meta.version,
        });
    }

    let mut plan = ImportPlan::default();
    let mut listed: HashSet<AnimeId> = HashSet::new();

    for kind in ListKind::ALL {
        let Some(values) = raw.lists.get(kind.storage_key()) else {
            continue;
        };

        let mut ids = Vec::with_capacity(values.len());
        for value in values {
            match numeric_id(value) {
                // An id may only sit in one list; the first list wins.
                Some(id) if listed.insert(id) => ids.push(id),
                _ => plan.skipped += 1,
            }
        }
        plan.lists.push((kind, ids));
    }

    for key in raw.lists.keys() {
        if ListKind::from_storage_key(key).is_none() {
            warn!(key, "Ignoring unknown list in backup");
        }
    }

    for (key, value) in raw.ratings {
        let id = key.parse::<AnimeId>().ok().filter(AnimeId::is_valid);
        let record = serde_json::from_value::<RatingRecord>(value).ok();
        match (id, record) {
            (Some(id), Some(record)) => plan.ratings.push((id, record)),
            _ => {
                warn!(key, "Skipping unreadable rating in backup");
                plan.skipped += 1;
            }
        }
    }

    for value in raw.manual {
        match serde_json::from_value::<ManualEntry>(value) {
            Ok(entry) if !entry.title.trim().is_empty() => plan.manual.push(entry),
            _ => plan.skipped += 1,
        }
    }

    if let Some(value) = raw.theme {
        match serde_json::from_value::<Theme>(value) {
            Ok(theme) => plan.theme = Some(theme),
            Err(_) => plan.skipped += 1,
        }
    }

    plan.language = raw.language;
    Ok(plan)
}

/// Accepts JSON numbers and numeric strings, as older exports stored both.
fn numeric_id(value: &Value) -> Option<AnimeId> {
    let id = match value {
        Value::Number(n) => n.as_i64().map(AnimeId::new),
        Value::String(s) => s.parse::<AnimeId>().ok(),
        _ => None,
    }?;
    id.is_valid().then_some(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Stars;

    fn id(n: i64) -> AnimeId {
        AnimeId::new(n)
    }

    fn seeded() -> Store {
        let store = Store::in_memory();
        store.add_to_list(ListKind::Watching, id(1)).unwrap();
        store.add_to_list(ListKind::Watching, id(2)).unwrap();
        store.add_to_list(ListKind::Completed, id(3)).unwrap();
        store
            .set_rating(id(3), Stars::new(5).unwrap(), "Great")
            .unwrap();
        store.set_theme(Theme::Dark).unwrap();
        store
    }

    #[test]
    fn round_trip_reproduces_lists_ratings_and_theme() {
        let source = seeded();
        let json = BackupService::new(source.clone()).export_json().unwrap();

        let target = Store::in_memory();
        target.add_to_list(ListKind::Dropped, id(99)).unwrap();
        target
            .set_rating(id(99), Stars::new(1).unwrap(), "")
            .unwrap();

        BackupService::new(target.clone())
            .import_all_data(&json, ImportMode::Overwrite)
            .unwrap();

        for kind in ListKind::ALL {
            assert_eq!(target.get_list(kind), source.get_list(kind), "{kind}");
        }
        assert_eq!(target.all_ratings().unwrap(), source.all_ratings().unwrap());
        assert_eq!(target.theme(), Theme::Dark);
    }

    #[test]
    fn invalid_documents_change_nothing() {
        let store = seeded();
        let service = BackupService::new(store.clone());
        let before = service.export_all_data().unwrap();

        assert!(matches!(
            service.import_all_data("{not json", ImportMode::Overwrite),
            Err(ImportError::Malformed(_))
        ));
        assert!(matches!(
            service.import_all_data(r#"{"lists":{}}"#, ImportMode::Overwrite),
            Err(ImportError::MissingEnvelope)
        ));
        assert!(matches!(
            service.import_all_data(r#"{"meta":{"version":2}}"#, ImportMode::Overwrite),
            Err(ImportError::UnsupportedVersion { found: 2 })
        ));

        let after = service.export_all_data().unwrap();
        assert_eq!(before.lists, after.lists);
        assert_eq!(before.ratings, after.ratings);
    }

    #[test]
    fn merge_adds_only_unlisted_ids_and_missing_ratings() {
        let store = seeded();
        let doc = r#"{
            "meta": {"app": "AllNime", "version": 1, "exported_at": "2024-01-01T00:00:00Z"},
            "lists": {
                "watchingList": [3, "4", "abc", null],
                "droppedList": [5]
            },
            "ratings": {
                "3": {"stars": 1, "opinion": "", "updated_at": "2024-01-01T00:00:00Z"},
                "4": {"stars": 4, "opinion": "ok", "updated_at": "2024-01-01T00:00:00Z"},
                "x": {"stars": 4, "updated_at": "2024-01-01T00:00:00Z"}
            }
        }"#;

        let summary = BackupService::new(store.clone())
            .import_all_data(doc, ImportMode::Merge)
            .unwrap();

        assert_eq!(store.get_list(ListKind::Watching), vec![id(2), id(1), id(4)]);
        assert_eq!(store.get_list(ListKind::Dropped), vec![id(5)]);
        assert_eq!(store.get_status(id(3)), ListStatus::In(ListKind::Completed));
        assert_eq!(store.get_rating(id(3)).unwrap().stars.value(), 5);
        assert_eq!(store.get_rating(id(4)).unwrap().stars.value(), 4);

        assert_eq!(summary.list_entries_added, 2);
        assert_eq!(summary.ratings_imported, 1);
        assert_eq!(summary.ratings_kept, 1);
        assert_eq!(summary.skipped, 3);
        assert!(!summary.theme_applied);
    }

    #[test]
    fn overwrite_keeps_single_membership() {
        let store = Store::in_memory();
        let doc = r#"{
            "meta": {"version": 1},
            "lists": {"planToWatchList": [7], "watchingList": [7, 8]},
            "theme": "neon"
        }"#;

        let summary = BackupService::new(store.clone())
            .import_all_data(doc, ImportMode::Overwrite)
            .unwrap();

        assert_eq!(store.get_list(ListKind::PlanToWatch), vec![id(7)]);
        assert_eq!(store.get_list(ListKind::Watching), vec![id(8)]);
        assert_eq!(store.theme(), Theme::System);
        assert_eq!(summary.skipped, 2);
    }
}
