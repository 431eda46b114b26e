use std::sync::Arc;

use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::clients::filter::ContentFilter;
use crate::clients::{CatalogSource, tracked};
use crate::domain::AnimeId;
use crate::models::anime::{AnimeRecord, CatalogKind, Genre};
use crate::services::logs::LogBook;

const JIKAN_API: &str = "https://api.jikan.moe/v4";

#[derive(Debug, Deserialize)]
struct JikanResponse<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
pub struct MalAnime {
    pub mal_id: i64,
    #[serde(default)]
    pub title: String,
    pub title_english: Option<String>,
    pub title_japanese: Option<String>,
    #[serde(rename = "type")]
    pub anime_type: Option<String>,
    pub episodes: Option<i32>,
    pub status: Option<String>,
    pub score: Option<f32>,
    pub synopsis: Option<String>,
    pub rating: Option<String>,
    pub images: Option<MalImages>,
    #[serde(default)]
    pub genres: Vec<MalGenericInfo>,
    #[serde(default)]
    pub explicit_genres: Vec<MalGenericInfo>,
    #[serde(default)]
    pub studios: Vec<MalGenericInfo>,
    pub year: Option<i32>,
    pub season: Option<String>,
    pub approved: Option<bool>,
    pub aired: Option<Aired>,
}

#[derive(Debug, Deserialize)]
pub struct MalImages {
    pub jpg: Option<MalImageSet>,
    pub webp: Option<MalImageSet>,
}

#[derive(Debug, Deserialize)]
pub struct MalImageSet {
    pub image_url: Option<String>,
    pub large_image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Aired {
    pub prop: Option<AiredProp>,
}

#[derive(Debug, Deserialize)]
pub struct AiredProp {
    pub from: Option<AiredDate>,
}

#[derive(Debug, Deserialize)]
pub struct AiredDate {
    pub year: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct MalGenericInfo {
    pub mal_id: i64,
    pub name: String,
    pub count: Option<u32>,
}

impl MalAnime {
    pub fn get_start_year(&self) -> Option<i32> {
        if let Some(year) = self.year {
            return Some(year);
        }

        self.aired
            .as_ref()
            .and_then(|a| a.prop.as_ref())
            .and_then(|p| p.from.as_ref())
            .and_then(|f| f.year)
    }

    fn image_url(&self) -> Option<String> {
        let images = self.images.as_ref()?;
        [images.jpg.as_ref(), images.webp.as_ref()]
            .into_iter()
            .flatten()
            .find_map(|set| set.large_image_url.clone().or_else(|| set.image_url.clone()))
    }

    #[must_use]
    pub fn into_record(self) -> AnimeRecord {
        let year = self.get_start_year();
        let image_url = self.image_url();
        let is_adult = self
            .rating
            .as_deref()
            .is_some_and(|r| r.starts_with("Rx"));

        AnimeRecord {
            id: AnimeId::new(self.mal_id),
            title: self.title,
            title_english: self.title_english,
            title_japanese: self.title_japanese,
            kind: self.anime_type,
            episodes: self.episodes,
            status: self.status,
            score: self.score,
            synopsis: self.synopsis,
            image_url,
            genres: self
                .genres
                .into_iter()
                .chain(self.explicit_genres)
                .map(|g| g.name)
                .collect(),
            studios: self.studios.into_iter().map(|s| s.name).collect(),
            year,
            season: self.season,
            approved: self.approved,
            is_adult,
            source: CatalogKind::Jikan,
        }
    }
}

/// REST client for the Jikan (MyAnimeList) proxy.
#[derive(Clone)]
pub struct JikanClient {
    client: Client,
    base_url: String,
    filter: ContentFilter,
    log_book: Option<Arc<LogBook>>,
}

impl Default for JikanClient {
    fn default() -> Self {
        Self::new()
    }
}

impl JikanClient {
    pub fn new() -> Self {
        Self::with_shared_client(Client::new(), JIKAN_API)
    }

    pub fn with_shared_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            filter: ContentFilter::default(),
            log_book: None,
        }
    }

    #[must_use]
    pub fn with_filter(mut self, filter: ContentFilter) -> Self {
        self.filter = filter;
        self
    }

    #[must_use]
    pub fn with_log_book(mut self, log_book: Arc<LogBook>) -> Self {
        self.log_book = Some(log_book);
        self
    }

    /// GET `path` and decode the `data` envelope. A 404 yields `Ok(None)`.
    async fn fetch<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "Jikan request");

        tracked(self.log_book.as_deref(), "jikan", self.request(&url)).await
    }

    async fn request<T: DeserializeOwned>(&self, url: &str) -> Result<Option<T>> {
        let response = self.client.get(url).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("Jikan API error: {} - {}", status, body));
        }

        let response: JikanResponse<T> = response
            .json()
            .await
            .with_context(|| format!("Failed to decode Jikan response from {url}"))?;

        Ok(Some(response.data))
    }

    fn admit(&self, anime: Option<MalAnime>) -> Option<AnimeRecord> {
        anime
            .map(MalAnime::into_record)
            .filter(|r| self.filter.admits(r))
    }

    pub async fn get_anime_full(&self, id: AnimeId) -> Result<Option<AnimeRecord>> {
        let anime = self.fetch::<MalAnime>(&format!("/anime/{id}/full")).await?;
        Ok(self.admit(anime))
    }

    pub async fn get_anime(&self, id: AnimeId) -> Result<Option<AnimeRecord>> {
        let anime = self.fetch::<MalAnime>(&format!("/anime/{id}")).await?;
        Ok(self.admit(anime))
    }

    pub async fn search_anime(&self, query: &str, limit: u32) -> Result<Vec<AnimeRecord>> {
        let path = format!("/anime?q={}&limit={}", urlencoding::encode(query), limit);
        self.fetch_list(&path).await
    }

    pub async fn genres(&self) -> Result<Vec<Genre>> {
        let genres = self
            .fetch::<Vec<MalGenericInfo>>("/genres/anime")
            .await?
            .unwrap_or_default();

        Ok(genres
            .into_iter()
            .filter(|g| !self.filter.blocks_genre(&g.name))
            .map(|g| Genre {
                id: g.mal_id,
                name: g.name,
                count: g.count,
            })
            .collect())
    }

    pub async fn season_now(&self, page: u32) -> Result<Vec<AnimeRecord>> {
        self.fetch_list(&format!("/seasons/now?page={page}")).await
    }

    pub async fn top_anime(&self, page: u32) -> Result<Vec<AnimeRecord>> {
        self.fetch_list(&format!("/top/anime?page={page}")).await
    }

    async fn fetch_list(&self, path: &str) -> Result<Vec<AnimeRecord>> {
        let items = self.fetch::<Vec<MalAnime>>(path).await?.unwrap_or_default();
        Ok(self
            .filter
            .apply(items.into_iter().map(MalAnime::into_record).collect()))
    }
}

#[async_trait::async_trait]
impl CatalogSource for JikanClient {
    fn name(&self) -> &'static str {
        "Jikan"
    }

    async fn anime_full(&self, id: AnimeId) -> Result<Option<AnimeRecord>> {
        self.get_anime_full(id).await
    }

    async fn anime_basic(&self, id: AnimeId) -> Result<Option<AnimeRecord>> {
        self.get_anime(id).await
    }

    async fn search(&self, query: &str, limit: u32) -> Result<Vec<AnimeRecord>> {
        self.search_anime(query, limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_FIXTURE: &str = r#"{
        "data": {
            "mal_id": 20,
            "title": "Naruto",
            "title_english": "Naruto",
            "title_japanese": "ナルト",
            "type": "TV",
            "episodes": 220,
            "status": "Finished Airing",
            "score": 8.0,
            "rating": "PG-13 - Teens 13 or older",
            "approved": true,
            "images": {"jpg": {"image_url": "https://cdn/small.jpg", "large_image_url": "https://cdn/large.jpg"}},
            "genres": [{"mal_id": 1, "name": "Action"}],
            "explicit_genres": [],
            "studios": [{"mal_id": 1, "name": "Studio Pierrot"}],
            "year": null,
            "season": "fall",
            "aired": {"prop": {"from": {"day": 3, "month": 10, "year": 2002}}}
        }
    }"#;

    #[test]
    fn maps_full_payload() {
        let response: JikanResponse<MalAnime> = serde_json::from_str(FULL_FIXTURE).unwrap();
        let record = response.data.into_record();

        assert_eq!(record.id, AnimeId::new(20));
        assert_eq!(record.year, Some(2002));
        assert_eq!(record.image_url.as_deref(), Some("https://cdn/large.jpg"));
        assert_eq!(record.studios, vec!["Studio Pierrot"]);
        assert_eq!(record.source, CatalogKind::Jikan);
        assert!(!record.is_adult);
    }

    #[test]
    fn explicit_genres_and_rx_rating_mark_adult() {
        let payload = r#"{
            "mal_id": 99,
            "title": "Filtered",
            "rating": "Rx - Hentai",
            "genres": [],
            "explicit_genres": [{"mal_id": 12, "name": "Hentai"}]
        }"#;
        let record = serde_json::from_str::<MalAnime>(payload)
            .unwrap()
            .into_record();

        assert!(record.is_adult);
        assert_eq!(record.genres, vec!["Hentai"]);
        assert!(!ContentFilter::default().admits(&record));
    }

    #[test]
    fn sparse_payload_still_decodes() {
        let record = serde_json::from_str::<MalAnime>(r#"{"mal_id": 5}"#)
            .unwrap()
            .into_record();
        assert_eq!(record.title, "");
        assert!(record.genres.is_empty());
        assert!(!ContentFilter::default().admits(&record));
    }
}
