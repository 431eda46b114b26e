use std::sync::Arc;

use anyhow::{Context, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::clients::filter::ContentFilter;
use crate::clients::{CatalogSource, tracked};
use crate::domain::AnimeId;
use crate::models::anime::{AnimeRecord, CatalogKind};
use crate::services::logs::LogBook;

const ANILIST_API: &str = "https://graphql.anilist.co";

const MEDIA_FIELDS: &str = r"
    id
    idMal
    title { romaji english native }
    format
    episodes
    status
    season
    seasonYear
    isAdult
    coverImage { extraLarge large }
    description(asHtml: false)
    averageScore
    genres
    studios(isMain: true) {
        nodes {
            name
            isAnimationStudio
        }
    }
";

#[derive(Serialize)]
struct GraphQLRequest<'a, V: Serialize> {
    query: &'a str,
    variables: V,
}

#[derive(Deserialize)]
struct GraphQLResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQLError>,
}

#[derive(Deserialize)]
struct GraphQLError {
    message: String,
    status: Option<u16>,
}

#[derive(Deserialize)]
struct PageData {
    #[serde(rename = "Page")]
    page: Page,
}

#[derive(Deserialize)]
struct Page {
    media: Vec<Media>,
}

#[derive(Deserialize)]
struct MediaData {
    #[serde(rename = "Media")]
    media: Option<Media>,
}

#[derive(Deserialize)]
struct Media {
    id: i64,
    #[serde(rename = "idMal")]
    id_mal: Option<i64>,
    title: Title,
    format: Option<String>,
    episodes: Option<i32>,
    status: Option<String>,
    season: Option<String>,
    #[serde(rename = "seasonYear")]
    season_year: Option<i32>,
    #[serde(rename = "isAdult", default)]
    is_adult: bool,
    #[serde(rename = "coverImage")]
    cover_image: Option<CoverImage>,
    description: Option<String>,
    #[serde(rename = "averageScore")]
    average_score: Option<i32>,
    #[serde(default)]
    genres: Vec<String>,
    studios: Option<Studios>,
}

#[derive(Deserialize)]
struct Studios {
    nodes: Vec<StudioNode>,
}

#[derive(Deserialize)]
struct StudioNode {
    name: String,
    #[serde(rename = "isAnimationStudio")]
    is_animation_studio: bool,
}

#[derive(Deserialize)]
struct CoverImage {
    #[serde(rename = "extraLarge")]
    extra_large: Option<String>,
    large: Option<String>,
}

#[derive(Deserialize)]
struct Title {
    romaji: Option<String>,
    english: Option<String>,
    native: Option<String>,
}

/// Anime season names as AniList spells them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "UPPERCASE")]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Fall,
}

/// GraphQL client for AniList.
#[derive(Clone)]
pub struct AnilistClient {
    client: Client,
    endpoint: String,
    filter: ContentFilter,
    log_book: Option<Arc<LogBook>>,
}

impl Default for AnilistClient {
    fn default() -> Self {
        Self::new()
    }
}

impl AnilistClient {
    pub fn new() -> Self {
        Self::with_shared_client(
            Client::builder()
                .user_agent("AllNime/1.0")
                .build()
                .unwrap_or_else(|_| Client::new()),
            ANILIST_API,
        )
    }

    pub fn with_shared_client(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
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

    /// Runs one GraphQL query. `Ok(None)` means AniList answered "not found".
    async fn query<V, T>(&self, query: &str, variables: V) -> Result<Option<T>>
    where
        V: Serialize + Send,
        T: DeserializeOwned,
    {
        let request = GraphQLRequest { query, variables };
        tracked(self.log_book.as_deref(), "anilist", self.post(&request)).await
    }

    async fn post<V, T>(&self, request: &GraphQLRequest<'_, V>) -> Result<Option<T>>
    where
        V: Serialize,
        T: DeserializeOwned,
    {
        let response = self.client.post(&self.endpoint).json(request).send().await?;
        let status = response.status();

        let body: GraphQLResponse<T> = response
            .json()
            .await
            .with_context(|| format!("Failed to decode AniList response (HTTP {status})"))?;

        let not_found = status == reqwest::StatusCode::NOT_FOUND
            || body.errors.iter().any(|e| e.status == Some(404));

        if let Some(data) = body.data
            && !not_found
        {
            return Ok(Some(data));
        }

        if not_found {
            return Ok(None);
        }

        let messages: Vec<String> = body.errors.into_iter().map(|e| e.message).collect();
        Err(anyhow::anyhow!(
            "AniList API error: {} - {}",
            status,
            messages.join("; ")
        ))
    }

    async fn page(
        &self,
        extra_vars: &str,
        filter_args: &str,
        variables: serde_json::Value,
    ) -> Result<Vec<AnimeRecord>> {
        let gql_query = format!(
            "query ($page: Int, $perPage: Int{extra_vars}) {{
                Page(page: $page, perPage: $perPage) {{
                    media({filter_args}, type: ANIME) {{ {MEDIA_FIELDS} }}
                }}
            }}"
        );

        let data: Option<PageData> = self.query(&gql_query, variables).await?;

        Ok(self.filter.apply(
            data.map(|d| d.page.media.into_iter().map(map_media).collect())
                .unwrap_or_default(),
        ))
    }

    async fn single(&self, selector: &str, id: i64) -> Result<Option<AnimeRecord>> {
        let gql_query = format!(
            "query ($id: Int) {{
                Media({selector}: $id, type: ANIME) {{ {MEDIA_FIELDS} }}
            }}"
        );

        let data: Option<MediaData> = self
            .query(&gql_query, serde_json::json!({ "id": id }))
            .await?;

        Ok(data
            .and_then(|d| d.media)
            .map(map_media)
            .filter(|r| self.filter.admits(r)))
    }

    pub async fn search_anime(&self, query: &str, limit: u32) -> Result<Vec<AnimeRecord>> {
        self.page(
            ", $search: String",
            "search: $search",
            serde_json::json!({ "search": query, "page": 1, "perPage": limit }),
        )
        .await
    }

    /// Looks up by AniList's own id.
    pub async fn get_by_id(&self, anilist_id: i64) -> Result<Option<AnimeRecord>> {
        self.single("id", anilist_id).await
    }

    /// Looks up by MyAnimeList id.
    pub async fn get_by_mal_id(&self, id: AnimeId) -> Result<Option<AnimeRecord>> {
        debug!(%id, "AniList lookup by MAL id");
        self.single("idMal", id.value()).await
    }

    pub async fn season(&self, season: Season, year: i32, page: u32) -> Result<Vec<AnimeRecord>> {
        self.page(
            ", $season: MediaSeason, $seasonYear: Int",
            "season: $season, seasonYear: $seasonYear, sort: POPULARITY_DESC",
            serde_json::json!({ "season": season, "seasonYear": year, "page": page, "perPage": 25 }),
        )
        .await
    }

    pub async fn top(&self, page: u32) -> Result<Vec<AnimeRecord>> {
        self.page(
            "",
            "sort: SCORE_DESC",
            serde_json::json!({ "page": page, "perPage": 25 }),
        )
        .await
    }
}

fn map_media(m: Media) -> AnimeRecord {
    let studios = m
        .studios
        .map(|s| {
            s.nodes
                .into_iter()
                .filter(|n| n.is_animation_studio)
                .map(|n| n.name)
                .collect()
        })
        .unwrap_or_default();

    debug!(anilist_id = m.id, mal_id = ?m.id_mal, "Mapped AniList media");

    let title = m
        .title
        .romaji
        .clone()
        .or_else(|| m.title.english.clone())
        .unwrap_or_default();

    AnimeRecord {
        // Lists are keyed by MAL id; records without one are filtered out.
        id: AnimeId::new(m.id_mal.unwrap_or(0)),
        title,
        title_english: m.title.english,
        title_japanese: m.title.native,
        kind: m.format,
        episodes: m.episodes,
        status: m.status,
        score: m.average_score.map(|s| s as f32 / 10.0),
        synopsis: m.description.map(|d| plain_text(&d)),
        image_url: m.cover_image.and_then(|c| c.extra_large.or(c.large)),
        genres: m.genres,
        studios,
        year: m.season_year,
        season: m.season.map(|s| s.to_lowercase()),
        approved: None,
        is_adult: m.is_adult,
        source: CatalogKind::AniList,
    }
}

fn plain_text(html: &str) -> String {
    html2text::from_read(html.as_bytes(), 100)
        .map_or_else(|_| html.to_string(), |text| text.trim().to_string())
}

#[async_trait::async_trait]
impl CatalogSource for AnilistClient {
    fn name(&self) -> &'static str {
        "AniList"
    }

    async fn anime_full(&self, id: AnimeId) -> Result<Option<AnimeRecord>> {
        self.get_by_mal_id(id).await
    }

    async fn anime_basic(&self, id: AnimeId) -> Result<Option<AnimeRecord>> {
        self.get_by_mal_id(id).await
    }

    async fn search(&self, query: &str, limit: u32) -> Result<Vec<AnimeRecord>> {
        self.search_anime(query, limit).await
    }
}
