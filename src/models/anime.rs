use serde::{Deserialize, Serialize};

use crate::domain::AnimeId;

/// Which catalog a record was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CatalogKind {
    Jikan,
    AniList,
}

/// Catalog metadata normalized across both external catalogs.
///
/// `id` is always the MyAnimeList identifier, since that is what the status
/// lists and ratings are keyed by. AniList records without a MAL mapping
/// carry `AnimeId(0)` and are dropped by the content filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimeRecord {
    pub id: AnimeId,
    pub title: String,
    pub title_english: Option<String>,
    pub title_japanese: Option<String>,
    pub kind: Option<String>,
    pub episodes: Option<i32>,
    pub status: Option<String>,
    pub score: Option<f32>,
    pub synopsis: Option<String>,
    pub image_url: Option<String>,
    pub genres: Vec<String>,
    pub studios: Vec<String>,
    pub year: Option<i32>,
    pub season: Option<String>,
    /// `Some(false)` marks an entry the catalog has not approved yet.
    pub approved: Option<bool>,
    /// Catalog-level adult flag (AniList `isAdult`, Jikan `Rx` rating).
    #[serde(default)]
    pub is_adult: bool,
    pub source: CatalogKind,
}

impl AnimeRecord {
    /// English title when available, otherwise the canonical title.
    #[must_use]
    pub fn display_title(&self) -> &str {
        self.title_english
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(&self.title)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub id: i64,
    pub name: String,
    pub count: Option<u32>,
}

#[cfg(test)]
pub(crate) fn sample_record(id: i64, title: &str) -> AnimeRecord {
    AnimeRecord {
        id: AnimeId::new(id),
        title: title.to_string(),
        title_english: None,
        title_japanese: None,
        kind: Some("TV".to_string()),
        episodes: Some(12),
        status: Some("Finished Airing".to_string()),
        score: Some(8.1),
        synopsis: None,
        image_url: None,
        genres: vec!["Action".to_string()],
        studios: vec![],
        year: Some(2020),
        season: None,
        approved: Some(true),
        is_adult: false,
        source: CatalogKind::Jikan,
    }
}
