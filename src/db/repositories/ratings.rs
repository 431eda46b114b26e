use chrono::Utc;
use tracing::warn;

use crate::db::{Kv, StoreError};
use crate::domain::{AnimeId, Stars};
use crate::models::tracking::RatingRecord;

pub const RATING_PREFIX: &str = "rating_";

#[must_use]
pub fn rating_key(id: AnimeId) -> String {
    format!("{RATING_PREFIX}{id}")
}

pub struct RatingRepository {
    conn: Kv,
}

impl RatingRepository {
    #[must_use]
    pub const fn new(conn: Kv) -> Self {
        Self { conn }
    }

    #[must_use]
    pub fn get(&self, id: AnimeId) -> Option<RatingRecord> {
        self.conn
            .read_json(&rating_key(id))
            .unwrap_or_else(|e| {
                warn!(%id, error = %e, "Failed to read rating");
                None
            })
    }

    pub fn set(&self, id: AnimeId, stars: Stars, opinion: &str) -> Result<RatingRecord, StoreError> {
        if !id.is_valid() {
            return Err(StoreError::InvalidInput(format!("invalid anime id {id}")));
        }

        let record = RatingRecord {
            stars,
            opinion: opinion.trim().to_string(),
            updated_at: Utc::now(),
        };
        self.put(id, &record)?;
        Ok(record)
    }

    pub fn put(&self, id: AnimeId, record: &RatingRecord) -> Result<(), StoreError> {
        self.conn.write_json(&rating_key(id), record)
    }

    /// Returns whether a rating existed.
    pub fn delete(&self, id: AnimeId) -> Result<bool, StoreError> {
        let existed = self.get(id).is_some();
        self.conn.remove(&rating_key(id))?;
        Ok(existed)
    }

    /// Every readable rating, ordered by id. Keys with a non-numeric suffix
    /// or an unparseable value are skipped.
    pub fn all(&self) -> Result<Vec<(AnimeId, RatingRecord)>, StoreError> {
        let mut ratings: Vec<(AnimeId, RatingRecord)> = self
            .conn
            .keys_with_prefix(RATING_PREFIX)?
            .into_iter()
            .filter_map(|key| key[RATING_PREFIX.len()..].parse::<AnimeId>().ok())
            .filter_map(|id| self.get(id).map(|record| (id, record)))
            .collect();

        ratings.sort_by_key(|(id, _)| *id);
        Ok(ratings)
    }

    pub fn clear(&self) -> Result<usize, StoreError> {
        let keys = self.conn.keys_with_prefix(RATING_PREFIX)?;
        for key in &keys {
            self.conn.remove(key)?;
        }
        Ok(keys.len())
    }
}
