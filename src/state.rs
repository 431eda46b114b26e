use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::Local;
use tracing::info;

use crate::clients::CatalogSource;
use crate::clients::anilist::AnilistClient;
use crate::clients::build_http_client;
use crate::clients::filter::ContentFilter;
use crate::clients::jikan::JikanClient;
use crate::clients::streaming::StreamingClient;
use crate::config::Config;
use crate::db::Store;
use crate::services::{AgeGate, BackupService, CatalogService, IdResolver, LogBook, Profile};

/// Everything a command needs, wired once from [`Config`].
pub struct AppContext {
    pub config: Config,

    pub store: Store,

    pub log_book: Arc<LogBook>,

    pub filter: ContentFilter,

    pub jikan: Arc<JikanClient>,

    pub anilist: Arc<AnilistClient>,

    pub streaming: Option<StreamingClient>,

    pub catalog: CatalogService,

    pub backup: BackupService,
}

impl AppContext {
    /// Opens the configured file store and builds every client.
    pub fn new(config: Config, profile: &Profile) -> anyhow::Result<Self> {
        let store = Store::open(&config.general.storage_path).with_context(|| {
            format!(
                "Failed to open local storage at {}",
                config.general.storage_path
            )
        })?;
        Self::with_store(config, store, profile)
    }

    pub fn with_store(config: Config, store: Store, profile: &Profile) -> anyhow::Result<Self> {
        let log_book = Arc::new(LogBook::new(
            store.clone(),
            config.general.log_book_capacity,
        ));

        let gate = AgeGate::new(config.content.assume_adult_when_unknown);
        let allow_adult =
            config.content.allow_adult && gate.allows_adult(profile, Local::now().date_naive());
        let filter = ContentFilter::new(allow_adult, &config.content.blocked_genres);
        info!(
            allow_adult = filter.allows_adult(),
            "Content filter configured"
        );

        let catalog_http = build_http_client(
            config.catalog.request_timeout_seconds,
            &config.catalog.user_agent,
        )?;

        let jikan = Arc::new(
            JikanClient::with_shared_client(catalog_http.clone(), &config.catalog.jikan_url)
                .with_filter(filter.clone())
                .with_log_book(log_book.clone()),
        );
        let anilist = Arc::new(
            AnilistClient::with_shared_client(catalog_http, &config.catalog.anilist_url)
                .with_filter(filter.clone())
                .with_log_book(log_book.clone()),
        );

        let streaming = if config.streaming.enabled {
            let streaming_http = build_http_client(
                config.streaming.request_timeout_seconds,
                &config.catalog.user_agent,
            )?;
            Some(
                StreamingClient::new(
                    streaming_http,
                    config.streaming.endpoints.clone(),
                    Duration::from_secs(config.streaming.healthy_endpoint_ttl_seconds),
                )
                .with_log_book(log_book.clone()),
            )
        } else {
            None
        };

        let primary: Arc<dyn CatalogSource> = jikan.clone();
        let secondary: Arc<dyn CatalogSource> = anilist.clone();
        let resolver = Arc::new(IdResolver::new(primary.clone()));
        let catalog = CatalogService::new(
            primary,
            Some(secondary),
            resolver,
            config.catalog.search_limit,
        );

        let backup = BackupService::new(store.clone());

        Ok(Self {
            config,
            store,
            log_book,
            filter,
            jikan,
            anilist,
            streaming,
            catalog,
            backup,
        })
    }

    /// Stored language preference, falling back to the configured default.
    #[must_use]
    pub fn language(&self) -> String {
        self.store
            .language()
            .unwrap_or_else(|| self.config.general.default_language.clone())
    }
}
