//! Reconciliation of identifiers that the primary catalog does not know.
//!
//! Locally stored identifiers can drift from the catalog's canonical ones
//! (merged entries, ids copied from another catalog). When a title is known,
//! the resolver runs a text search and remembers the first hit's id for the
//! rest of the process. The mapping is never persisted.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::clients::CatalogSource;
use crate::domain::AnimeId;
use crate::models::anime::AnimeRecord;

/// Number of search hits requested when reconciling. Only the first is used.
const RECONCILE_SEARCH_LIMIT: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnresolvedReason {
    NoTitle,
    NoMatch,
    SearchFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Served from the in-memory mapping without a search.
    Cached(AnimeId),
    /// Freshly resolved by title search and now cached.
    Resolved(AnimeId),
    /// No mapping could be made; the original id is returned as-is.
    Unchanged { id: AnimeId, reason: UnresolvedReason },
}

impl Resolution {
    /// The identifier callers should use from here on.
    #[must_use]
    pub const fn id(&self) -> AnimeId {
        match self {
            Self::Cached(id) | Self::Resolved(id) | Self::Unchanged { id, .. } => *id,
        }
    }

    #[must_use]
    pub const fn is_mapped(&self) -> bool {
        !matches!(self, Self::Unchanged { .. })
    }
}

/// A remembered mapping together with the search hit that produced it.
struct Mapping {
    to: AnimeId,
    hit: AnimeRecord,
}

pub struct IdResolver {
    search: Arc<dyn CatalogSource>,
    cache: RwLock<HashMap<AnimeId, Mapping>>,
}

impl IdResolver {
    #[must_use]
    pub fn new(search: Arc<dyn CatalogSource>) -> Self {
        Self {
            search,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Maps `id` to a catalog identifier, searching by `title` if needed.
    ///
    /// Concurrent calls for the same unmapped id may each search; they
    /// write the same mapping.
    pub async fn resolve(&self, id: AnimeId, title: Option<&str>) -> Resolution {
        if let Some(mapped) = self.cache.read().await.get(&id) {
            return Resolution::Cached(mapped.to);
        }

        let Some(title) = title.map(str::trim).filter(|t| !t.is_empty()) else {
            return Resolution::Unchanged {
                id,
                reason: UnresolvedReason::NoTitle,
            };
        };

        match self.search.search(title, RECONCILE_SEARCH_LIMIT).await {
            Ok(results) => {
                let Some(first) = results.into_iter().next() else {
                    warn!(%id, title, "Title search returned nothing, keeping original id");
                    return Resolution::Unchanged {
                        id,
                        reason: UnresolvedReason::NoMatch,
                    };
                };

                let to = first.id;
                self.cache
                    .write()
                    .await
                    .insert(id, Mapping { to, hit: first });
                info!(
                    event = "id_reconciled",
                    from = %id,
                    %to,
                    source = self.search.name(),
                    title,
                    "Reconciled identifier by title"
                );
                Resolution::Resolved(to)
            }
            Err(e) => {
                warn!(%id, title, error = %e, "Title search failed, keeping original id");
                Resolution::Unchanged {
                    id,
                    reason: UnresolvedReason::SearchFailed(e.to_string()),
                }
            }
        }
    }

    /// The search hit that produced the mapping for `id`, if any.
    pub async fn search_hit(&self, id: AnimeId) -> Option<AnimeRecord> {
        self.cache.read().await.get(&id).map(|m| m.hit.clone())
    }

    pub async fn forget(&self, id: AnimeId) -> Option<AnimeId> {
        self.cache.write().await.remove(&id).map(|m| m.to)
    }

    pub async fn mappings(&self) -> Vec<(AnimeId, AnimeId)> {
        let mut pairs: Vec<(AnimeId, AnimeId)> = self
            .cache
            .read()
            .await
            .iter()
            .map(|(from, mapping)| (*from, mapping.to))
            .collect();
        pairs.sort_unstable();
        pairs
    }
}
