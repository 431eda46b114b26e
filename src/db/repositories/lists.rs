use serde_json::Value;
use tracing::{debug, warn};

use crate::db::{Kv, StoreError};
use crate::domain::{AnimeId, ListKind, ListStatus};

/// Number of entries in each status list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListCounts {
    pub plan_to_watch: usize,
    pub watching: usize,
    pub completed: usize,
    pub dropped: usize,
}

impl ListCounts {
    #[must_use]
    pub const fn get(&self, kind: ListKind) -> usize {
        match kind {
            ListKind::PlanToWatch => self.plan_to_watch,
            ListKind::Watching => self.watching,
            ListKind::Completed => self.completed,
            ListKind::Dropped => self.dropped,
        }
    }

    #[must_use]
    pub const fn total(&self) -> usize {
        self.plan_to_watch + self.watching + self.completed + self.dropped
    }
}

/// The four mutually exclusive status lists.
///
/// Each list is a JSON array of identifiers under its own key, newest first.
/// Every mutation rewrites the whole array.
pub struct ListRepository {
    conn: Kv,
}

impl ListRepository {
    #[must_use]
    pub const fn new(conn: Kv) -> Self {
        Self { conn }
    }

    /// Reads a list. Unavailable or corrupt storage reads as empty.
    ///
    /// Non-numeric and non-positive elements are skipped.
    #[must_use]
    pub fn get(&self, kind: ListKind) -> Vec<AnimeId> {
        match self.conn.read_json::<Vec<Value>>(kind.storage_key()) {
            Ok(Some(values)) => values
                .iter()
                .filter_map(Value::as_i64)
                .map(AnimeId::new)
                .filter(AnimeId::is_valid)
                .collect(),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(list = %kind, error = %e, "Failed to read status list, treating as empty");
                Vec::new()
            }
        }
    }

    /// Moves `id` into `kind`, dropping it from every other list first.
    pub fn add(&self, kind: ListKind, id: AnimeId) -> Result<(), StoreError> {
        if !id.is_valid() {
            return Err(StoreError::InvalidInput(format!("invalid anime id {id}")));
        }

        for other in ListKind::ALL.into_iter().filter(|k| *k != kind) {
            let list = self.get(other);
            if list.contains(&id) {
                let filtered: Vec<AnimeId> = list.into_iter().filter(|x| *x != id).collect();
                self.replace(other, &filtered)?;
                debug!(%id, from = %other, "Removed from previous list");
            }
        }

        let mut list = self.get(kind);
        if list.contains(&id) {
            return Ok(());
        }

        list.insert(0, id);
        self.replace(kind, &list)
    }

    /// Returns whether `id` was present.
    pub fn remove(&self, kind: ListKind, id: AnimeId) -> Result<bool, StoreError> {
        let list = self.get(kind);
        let before = list.len();
        let filtered: Vec<AnimeId> = list.into_iter().filter(|x| *x != id).collect();

        if filtered.len() == before {
            return Ok(false);
        }

        self.replace(kind, &filtered)?;
        Ok(true)
    }

    #[must_use]
    pub fn status(&self, id: AnimeId) -> ListStatus {
        ListKind::ALL
            .into_iter()
            .find(|kind| self.get(*kind).contains(&id))
            .map_or(ListStatus::None, ListStatus::In)
    }

    #[must_use]
    pub fn counts(&self) -> ListCounts {
        ListCounts {
            plan_to_watch: self.get(ListKind::PlanToWatch).len(),
            watching: self.get(ListKind::Watching).len(),
            completed: self.get(ListKind::Completed).len(),
            dropped: self.get(ListKind::Dropped).len(),
        }
    }

    pub fn replace(&self, kind: ListKind, ids: &[AnimeId]) -> Result<(), StoreError> {
        self.conn.write_json(kind.storage_key(), ids)
    }
}
