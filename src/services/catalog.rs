//! Detail lookups with a cascading fallback chain.
//!
//! A detail request walks these steps and stops at the first record:
//!
//! 1. full resource from the primary catalog
//! 2. basic resource from the primary catalog
//! 3. lookup by identifier in the secondary catalog
//! 4. reconciliation by title through [`IdResolver`], then a basic fetch of
//!    the resolved id (falling back to the search hit itself)
//!
//! The result says which step answered, or why none did.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::clients::CatalogSource;
use crate::domain::AnimeId;
use crate::models::anime::AnimeRecord;
use crate::services::reconcile::{IdResolver, Resolution, UnresolvedReason};

/// Which step of the chain produced the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupPath {
    Full,
    Basic,
    SecondaryById,
    TitleReconciliation { from: AnimeId },
}

impl fmt::Display for LookupPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full => f.write_str("full record"),
            Self::Basic => f.write_str("basic record"),
            Self::SecondaryById => f.write_str("secondary catalog"),
            Self::TitleReconciliation { from } => write!(f, "title search (from id {from})"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DetailOutcome {
    Found { record: AnimeRecord, via: LookupPath },
    /// Every step answered that the identifier does not exist.
    NotFound,
    /// At least one step failed for a reason other than "absent".
    Unavailable { reason: String },
}

impl DetailOutcome {
    pub fn into_result(self, id: AnimeId) -> Result<(AnimeRecord, LookupPath), CatalogError> {
        match self {
            Self::Found { record, via } => Ok((record, via)),
            Self::NotFound => Err(CatalogError::NotFound(id)),
            Self::Unavailable { reason } => Err(CatalogError::Unavailable { id, reason }),
        }
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Anime not found: {0}")]
    NotFound(AnimeId),

    #[error("Catalog temporarily unavailable for {id}: {reason}")]
    Unavailable { id: AnimeId, reason: String },
}

pub struct CatalogService {
    primary: Arc<dyn CatalogSource>,
    secondary: Option<Arc<dyn CatalogSource>>,
    resolver: Arc<IdResolver>,
    search_limit: u32,
}

impl CatalogService {
    #[must_use]
    pub fn new(
        primary: Arc<dyn CatalogSource>,
        secondary: Option<Arc<dyn CatalogSource>>,
        resolver: Arc<IdResolver>,
        search_limit: u32,
    ) -> Self {
        Self {
            primary,
            secondary,
            resolver,
            search_limit,
        }
    }

    #[must_use]
    pub fn resolver(&self) -> &IdResolver {
        &self.resolver
    }

    /// Fetches details for `id`, trying every fallback before giving up.
    pub async fn anime_details(&self, id: AnimeId, title: Option<&str>) -> DetailOutcome {
        let mut failures: Vec<String> = Vec::new();

        // A previously reconciled id goes straight to its mapping.
        let mut tried_mapping = false;
        if let Resolution::Cached(mapped) = self.resolver.resolve(id, None).await
            && mapped != id
        {
            debug!(%id, %mapped, "Using cached id mapping");
            tried_mapping = true;
            if let Some(outcome) = self.fetch_resolved(id, mapped, &mut failures).await {
                return outcome;
            }
        }

        match self.primary.anime_full(id).await {
            Ok(Some(record)) => return found(record, LookupPath::Full),
            Ok(None) => debug!(%id, "Full record not found"),
            Err(e) => note_failure(&mut failures, self.primary.name(), "full", &e),
        }

        match self.primary.anime_basic(id).await {
            Ok(Some(record)) => return found(record, LookupPath::Basic),
            Ok(None) => debug!(%id, "Basic record not found"),
            Err(e) => note_failure(&mut failures, self.primary.name(), "basic", &e),
        }

        if let Some(secondary) = &self.secondary {
            match secondary.anime_basic(id).await {
                Ok(Some(record)) => return found(record, LookupPath::SecondaryById),
                Ok(None) => debug!(%id, source = secondary.name(), "Not found by id"),
                Err(e) => note_failure(&mut failures, secondary.name(), "by-id", &e),
            }
        }

        match self.resolver.resolve(id, title).await {
            Resolution::Cached(_) if tried_mapping => {}
            Resolution::Resolved(mapped) | Resolution::Cached(mapped) => {
                if let Some(outcome) = self.fetch_resolved(id, mapped, &mut failures).await {
                    return outcome;
                }
            }
            Resolution::Unchanged {
                reason: UnresolvedReason::SearchFailed(msg),
                ..
            } => failures.push(format!("{} search: {msg}", self.primary.name())),
            Resolution::Unchanged { reason, .. } => {
                debug!(%id, ?reason, "Title reconciliation did not produce a mapping");
            }
        }

        if failures.is_empty() {
            info!(%id, "Anime not found in any catalog");
            DetailOutcome::NotFound
        } else {
            warn!(%id, failures = failures.len(), "Catalog lookups failed");
            DetailOutcome::Unavailable {
                reason: failures.join("; "),
            }
        }
    }

    /// Fetches the basic record of a reconciled id, falling back to the
    /// search hit the resolver kept for it.
    async fn fetch_resolved(
        &self,
        original: AnimeId,
        mapped: AnimeId,
        failures: &mut Vec<String>,
    ) -> Option<DetailOutcome> {
        let via = LookupPath::TitleReconciliation { from: original };

        match self.primary.anime_basic(mapped).await {
            Ok(Some(record)) => return Some(found(record, via)),
            Ok(None) => debug!(%mapped, "Reconciled id has no basic record"),
            Err(e) => note_failure(failures, self.primary.name(), "reconciled", &e),
        }

        self.resolver
            .search_hit(original)
            .await
            .map(|record| found(record, via))
    }

    /// Text search on the primary catalog, falling back to the secondary on error.
    pub async fn search(&self, query: &str) -> anyhow::Result<Vec<AnimeRecord>> {
        match self.primary.search(query, self.search_limit).await {
            Ok(results) => Ok(results),
            Err(e) => {
                let Some(secondary) = &self.secondary else {
                    return Err(e);
                };
                warn!(error = %e, source = secondary.name(), "Primary search failed, using fallback");
                secondary.search(query, self.search_limit).await
            }
        }
    }
}

fn found(record: AnimeRecord, via: LookupPath) -> DetailOutcome {
    debug!(id = %record.id, %via, "Anime details resolved");
    DetailOutcome::Found { record, via }
}

fn note_failure(failures: &mut Vec<String>, source: &str, step: &str, error: &anyhow::Error) {
    warn!(source, step, error = %error, "Catalog lookup step failed");
    failures.push(format!("{source} {step}: {error}"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::anime::sample_record;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Clone, Copy, PartialEq, Eq)]
    enum Reply {
        Absent,
        Broken,
    }

    struct FakeCatalog {
        full: HashMap<i64, AnimeRecord>,
        basic: HashMap<i64, AnimeRecord>,
        otherwise: Reply,
        hits: Vec<AnimeRecord>,
        search_fails: bool,
        searches: AtomicUsize,
    }

    impl FakeCatalog {
        fn new(otherwise: Reply) -> Self {
            Self {
                full: HashMap::new(),
                basic: HashMap::new(),
                otherwise,
                hits: Vec::new(),
                search_fails: false,
                searches: AtomicUsize::new(0),
            }
        }

        fn answer(&self, found: Option<&AnimeRecord>) -> anyhow::Result<Option<AnimeRecord>> {
            match (found, self.otherwise) {
                (Some(record), _) => Ok(Some(record.clone())),
                (None, Reply::Absent) => Ok(None),
                (None, Reply::Broken) => anyhow::bail!("HTTP 503"),
            }
        }
    }

    #[async_trait::async_trait]
    impl CatalogSource for FakeCatalog {
        fn name(&self) -> &'static str {
            "fake"
        }

        async fn anime_full(&self, id: AnimeId) -> anyhow::Result<Option<AnimeRecord>> {
            self.answer(self.full.get(&id.value()))
        }

        async fn anime_basic(&self, id: AnimeId) -> anyhow::Result<Option<AnimeRecord>> {
            self.answer(self.basic.get(&id.value()))
        }

        async fn search(&self, _query: &str, _limit: u32) -> anyhow::Result<Vec<AnimeRecord>> {
            self.searches.fetch_add(1, Ordering::SeqCst);
            if self.search_fails || self.otherwise == Reply::Broken {
                anyhow::bail!("HTTP 503");
            }
            Ok(self.hits.clone())
        }
    }

    fn service(primary: Arc<FakeCatalog>, secondary: Option<Arc<FakeCatalog>>) -> CatalogService {
        let resolver = Arc::new(IdResolver::new(primary.clone()));
        CatalogService::new(
            primary,
            secondary.map(|s| s as Arc<dyn CatalogSource>),
            resolver,
            10,
        )
    }

    #[tokio::test]
    async fn full_record_wins() {
        let mut primary = FakeCatalog::new(Reply::Absent);
        primary.full.insert(1, sample_record(1, "Cowboy Bebop"));
        primary.basic.insert(1, sample_record(1, "Basic"));

        let outcome = service(Arc::new(primary), None)
            .anime_details(AnimeId::new(1), None)
            .await;
        assert!(matches!(
            outcome,
            DetailOutcome::Found { via: LookupPath::Full, ref record } if record.title == "Cowboy Bebop"
        ));
    }

    #[tokio::test]
    async fn broken_full_falls_back_to_basic_then_secondary() {
        let mut primary = FakeCatalog::new(Reply::Broken);
        primary.basic.insert(2, sample_record(2, "Basic only"));
        let svc = service(Arc::new(primary), None);
        assert!(matches!(
            svc.anime_details(AnimeId::new(2), None).await,
            DetailOutcome::Found { via: LookupPath::Basic, .. }
        ));

        let mut secondary = FakeCatalog::new(Reply::Absent);
        secondary.basic.insert(3, sample_record(3, "From AniList"));
        let svc = service(
            Arc::new(FakeCatalog::new(Reply::Absent)),
            Some(Arc::new(secondary)),
        );
        assert!(matches!(
            svc.anime_details(AnimeId::new(3), None).await,
            DetailOutcome::Found { via: LookupPath::SecondaryById, .. }
        ));
    }

    #[tokio::test]
    async fn unknown_id_reconciles_by_title() {
        let mut primary = FakeCatalog::new(Reply::Absent);
        primary.basic.insert(20, sample_record(20, "Naruto"));
        primary.hits = vec![sample_record(20, "Naruto"), sample_record(1735, "Shippuuden")];
        let primary = Arc::new(primary);
        let svc = service(primary.clone(), Some(Arc::new(FakeCatalog::new(Reply::Absent))));

        let original = AnimeId::new(185_660);
        let outcome = svc.anime_details(original, Some("Naruto")).await;
        let DetailOutcome::Found { record, via } = outcome else {
            panic!("expected a record, got {outcome:?}");
        };
        assert_eq!(record.id, AnimeId::new(20));
        assert_eq!(via, LookupPath::TitleReconciliation { from: original });

        // Served from the mapping without a second search.
        let again = svc.anime_details(original, None).await;
        assert!(matches!(again, DetailOutcome::Found { ref record, .. } if record.id == AnimeId::new(20)));
        assert_eq!(primary.searches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn search_hit_is_used_when_resolved_record_is_missing() {
        let mut primary = FakeCatalog::new(Reply::Absent);
        primary.hits = vec![sample_record(20, "Naruto")];
        let svc = service(Arc::new(primary), None);

        let outcome = svc.anime_details(AnimeId::new(185_660), Some("Naruto")).await;
        assert!(matches!(
            outcome,
            DetailOutcome::Found { ref record, via: LookupPath::TitleReconciliation { .. } }
                if record.title == "Naruto"
        ));
    }

    #[tokio::test]
    async fn search_hit_is_reused_without_searching_again() {
        let mut primary = FakeCatalog::new(Reply::Absent);
        primary.hits = vec![sample_record(20, "Naruto")];
        let primary = Arc::new(primary);
        let svc = service(primary.clone(), None);
        let original = AnimeId::new(185_660);

        for _ in 0..3 {
            let outcome = svc.anime_details(original, Some("Naruto")).await;
            assert!(matches!(outcome, DetailOutcome::Found { ref record, .. } if record.id == AnimeId::new(20)));
        }
        assert_eq!(primary.searches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_title_search_is_unavailable_not_missing() {
        let mut primary = FakeCatalog::new(Reply::Absent);
        primary.search_fails = true;
        let svc = service(
            Arc::new(primary),
            Some(Arc::new(FakeCatalog::new(Reply::Absent))),
        );
        let id = AnimeId::new(185_660);

        let outcome = svc.anime_details(id, Some("Naruto")).await;
        let DetailOutcome::Unavailable { reason } = &outcome else {
            panic!("expected unavailable, got {outcome:?}");
        };
        assert!(reason.contains("fake search"));
        assert!(reason.contains("HTTP 503"));
        assert!(matches!(
            outcome.into_result(id),
            Err(CatalogError::Unavailable { .. })
        ));
    }

    #[tokio::test]
    async fn absent_everywhere_is_not_found() {
        let svc = service(
            Arc::new(FakeCatalog::new(Reply::Absent)),
            Some(Arc::new(FakeCatalog::new(Reply::Absent))),
        );
        let id = AnimeId::new(404);

        let outcome = svc.anime_details(id, Some("Nothing matches")).await;
        assert_eq!(outcome, DetailOutcome::NotFound);
        assert!(matches!(
            outcome.into_result(id),
            Err(CatalogError::NotFound(found)) if found == id
        ));
    }

    #[tokio::test]
    async fn any_failure_makes_it_unavailable() {
        let svc = service(
            Arc::new(FakeCatalog::new(Reply::Absent)),
            Some(Arc::new(FakeCatalog::new(Reply::Broken))),
        );
        let id = AnimeId::new(7);

        let outcome = svc.anime_details(id, None).await;
        let DetailOutcome::Unavailable { reason } = &outcome else {
            panic!("expected unavailable, got {outcome:?}");
        };
        assert!(reason.contains("HTTP 503"));
        assert!(matches!(
            outcome.into_result(id),
            Err(CatalogError::Unavailable { .. })
        ));
    }

    #[tokio::test]
    async fn search_falls_back_to_secondary() {
        let mut secondary = FakeCatalog::new(Reply::Absent);
        secondary.hits = vec![sample_record(5, "Fallback hit")];
        let svc = service(
            Arc::new(FakeCatalog::new(Reply::Broken)),
            Some(Arc::new(secondary)),
        );

        let results = svc.search("anything").await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "Fallback hit");

        let lonely = service(Arc::new(FakeCatalog::new(Reply::Broken)), None);
        assert!(lonely.search("anything").await.is_err());
    }
}
