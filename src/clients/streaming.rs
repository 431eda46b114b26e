//! Best-effort episode lookup against a list of interchangeable
//! streaming-aggregator endpoints.
//!
//! Endpoints are probed in configured order. The last endpoint that
//! answered is remembered for a fixed window and tried first while the
//! window lasts. Nothing here ever returns an error to the caller: every
//! failure collapses into [`StreamingOutcome::AllEndpointsFailed`].

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::clients::tracked;
use crate::services::logs::LogBook;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamingEpisode {
    pub id: String,
    pub number: f32,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StreamingInfo {
    pub endpoint: String,
    pub show_id: String,
    pub title: String,
    pub episodes: Vec<StreamingEpisode>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StreamingOutcome {
    Found(StreamingInfo),
    /// An endpoint answered but knew no matching show.
    NoMatch,
    /// Every endpoint failed; each failure is listed as `(endpoint, reason)`.
    AllEndpointsFailed { attempts: Vec<(String, String)> },
}

impl StreamingOutcome {
    #[must_use]
    pub fn into_option(self) -> Option<StreamingInfo> {
        match self {
            Self::Found(info) => Some(info),
            Self::NoMatch | Self::AllEndpointsFailed { .. } => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    id: String,
    title: String,
}

#[derive(Debug, Deserialize)]
struct InfoResponse {
    id: String,
    title: String,
    #[serde(default)]
    episodes: Vec<StreamingEpisode>,
}

#[derive(Debug, Clone, Copy)]
struct Preferred {
    index: usize,
    since: Instant,
}

pub struct StreamingClient {
    client: Client,
    endpoints: Vec<String>,
    ttl: Duration,
    preferred: Mutex<Option<Preferred>>,
    log_book: Option<Arc<LogBook>>,
}

impl StreamingClient {
    #[must_use]
    pub fn new(client: Client, endpoints: Vec<String>, ttl: Duration) -> Self {
        Self {
            client,
            endpoints: endpoints
                .into_iter()
                .map(|e| e.trim_end_matches('/').to_string())
                .collect(),
            ttl,
            preferred: Mutex::new(None),
            log_book: None,
        }
    }

    #[must_use]
    pub fn with_log_book(mut self, log_book: Arc<LogBook>) -> Self {
        self.log_book = Some(log_book);
        self
    }

    /// Endpoint currently preferred, if its window has not expired.
    #[must_use]
    pub fn preferred_endpoint(&self) -> Option<&str> {
        self.fresh_preferred()
            .and_then(|i| self.endpoints.get(i))
            .map(String::as_str)
    }

    fn fresh_preferred(&self) -> Option<usize> {
        let preferred = self.preferred.lock().unwrap_or_else(PoisonError::into_inner);
        preferred
            .filter(|p| p.since.elapsed() < self.ttl)
            .map(|p| p.index)
    }

    fn probe_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.endpoints.len()).collect();
        if let Some(first) = self.fresh_preferred() {
            order.retain(|i| *i != first);
            order.insert(0, first);
        }
        order
    }

    fn mark_healthy(&self, index: usize) {
        let mut preferred = self.preferred.lock().unwrap_or_else(PoisonError::into_inner);
        if preferred.is_none_or(|p| p.index != index) {
            info!(endpoint = %self.endpoints[index], "Switching preferred streaming endpoint");
        }
        *preferred = Some(Preferred {
            index,
            since: Instant::now(),
        });
    }

    fn mark_failed(&self, index: usize) {
        let mut preferred = self.preferred.lock().unwrap_or_else(PoisonError::into_inner);
        if preferred.is_some_and(|p| p.index == index) {
            *preferred = None;
        }
    }

    /// Finds episodes for `title`, failing over across endpoints.
    pub async fn lookup(&self, title: &str) -> StreamingOutcome {
        let mut attempts = Vec::new();

        for index in self.probe_order() {
            let endpoint = &self.endpoints[index];
            let call = self.query_endpoint(endpoint, title);

            match tracked(self.log_book.as_deref(), "streaming", call).await {
                Ok(found) => {
                    self.mark_healthy(index);
                    return found.map_or(StreamingOutcome::NoMatch, StreamingOutcome::Found);
                }
                Err(e) => {
                    warn!(%endpoint, error = %e, "Streaming endpoint failed, trying next");
                    self.mark_failed(index);
                    attempts.push((endpoint.clone(), format!("{e:#}")));
                }
            }
        }

        warn!(
            event = "streaming_unavailable",
            attempts = attempts.len(),
            "All streaming endpoints failed"
        );
        StreamingOutcome::AllEndpointsFailed { attempts }
    }

    async fn query_endpoint(&self, endpoint: &str, title: &str) -> Result<Option<StreamingInfo>> {
        let search_url = format!("{}/search?q={}", endpoint, urlencoding::encode(title));
        debug!(url = %search_url, "Streaming search");

        let search: SearchResponse = self
            .client
            .get(&search_url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .context("Failed to decode streaming search response")?;

        let Some(hit) = search.results.into_iter().next() else {
            return Ok(None);
        };

        let info_url = format!("{}/info/{}", endpoint, urlencoding::encode(&hit.id));
        let info: InfoResponse = self
            .client
            .get(&info_url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .context("Failed to decode streaming info response")?;

        debug!(show = %hit.title, episodes = info.episodes.len(), "Streaming info fetched");

        Ok(Some(StreamingInfo {
            endpoint: endpoint.to_string(),
            show_id: info.id,
            title: info.title,
            episodes: info.episodes,
        }))
    }
}
