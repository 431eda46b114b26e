//! HTTP adapters for the external catalogs and the streaming aggregator.

pub mod anilist;
pub mod filter;
pub mod jikan;
pub mod streaming;

use std::future::Future;
use std::time::{Duration, Instant};

use anyhow::Result;

use crate::domain::AnimeId;
use crate::models::anime::AnimeRecord;
use crate::services::logs::LogBook;

/// Read-only view of a catalog that can answer detail and search queries.
///
/// Lookups return `Ok(None)` when the catalog positively reports that the
/// identifier does not exist, and `Err` for every other failure.
#[async_trait::async_trait]
pub trait CatalogSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// Richest available record for `id`.
    async fn anime_full(&self, id: AnimeId) -> Result<Option<AnimeRecord>>;

    /// Lighter record for `id`, used when the full resource fails.
    async fn anime_basic(&self, id: AnimeId) -> Result<Option<AnimeRecord>>;

    /// Free-text title search, best match first.
    async fn search(&self, query: &str, limit: u32) -> Result<Vec<AnimeRecord>>;
}

/// Build a shared HTTP client with a fixed per-request timeout.
pub fn build_http_client(timeout_seconds: u64, user_agent: &str) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_seconds))
        .user_agent(user_agent)
        .pool_max_idle_per_host(10)
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build shared HTTP client: {e}"))
}

/// Awaits `call` and reports its outcome and latency to the log book.
pub(crate) async fn tracked<T>(
    log_book: Option<&LogBook>,
    service: &str,
    call: impl Future<Output = Result<T>>,
) -> Result<T> {
    let started = Instant::now();
    let result = call.await;

    if let Some(book) = log_book {
        book.record_api_call(service, result.is_ok(), started.elapsed());
    }

    result
}
