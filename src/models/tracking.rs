use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::Stars;

/// Personal star rating and opinion for one catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingRecord {
    pub stars: Stars,
    #[serde(default)]
    pub opinion: String,
    pub updated_at: DateTime<Utc>,
}

/// An anime the user typed in by hand, independent of any catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualEntry {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub rating: Option<Stars>,
    #[serde(default)]
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

/// User input for creating or editing a [`ManualEntry`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManualEntryDraft {
    pub title: String,
    pub image_url: Option<String>,
    pub rating: Option<Stars>,
    pub notes: String,
}
