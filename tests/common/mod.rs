#![allow(dead_code)]

use allnime::config::Config;
use allnime::db::Store;
use allnime::services::Profile;
use allnime::state::AppContext;
use axum::Router;
use serde_json::{Value, json};

/// Serves `app` on an ephemeral local port and returns its base URL.
pub async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind mock server");
    let addr = listener.local_addr().expect("missing local addr");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("mock server failed");
    });

    format!("http://{addr}")
}

/// Context whose catalogs point at a mock server at `base`.
pub fn context_for(base: &str, streaming: Vec<String>) -> AppContext {
    let mut config = Config::default();
    config.catalog.jikan_url = base.to_string();
    config.catalog.anilist_url = format!("{base}/graphql");
    config.catalog.request_timeout_seconds = 2;
    config.streaming.enabled = !streaming.is_empty();
    config.streaming.endpoints = streaming;
    config.streaming.request_timeout_seconds = 2;

    AppContext::with_store(config, Store::in_memory(), &Profile::default())
        .expect("failed to build context")
}

pub fn jikan_anime(id: i64, title: &str) -> Value {
    json!({
        "mal_id": id,
        "title": title,
        "title_english": title,
        "type": "TV",
        "episodes": 220,
        "status": "Finished Airing",
        "score": 8.0,
        "rating": "PG-13 - Teens 13 or older",
        "approved": true,
        "genres": [{"mal_id": 1, "name": "Action"}],
        "explicit_genres": [],
        "studios": [],
        "year": 2002
    })
}

pub fn anilist_media(anilist_id: i64, mal_id: i64, title: &str) -> Value {
    json!({
        "id": anilist_id,
        "idMal": mal_id,
        "title": {"romaji": title, "english": title, "native": null},
        "format": "TV",
        "episodes": 12,
        "status": "FINISHED",
        "averageScore": 81,
        "description": "A story.<br>Told twice.",
        "coverImage": {"large": null, "extraLarge": null},
        "genres": ["Drama"],
        "studios": {"nodes": []},
        "seasonYear": 2020,
        "season": "FALL",
        "isAdult": false
    })
}

pub fn anilist_not_found() -> Value {
    json!({
        "data": {"Media": null},
        "errors": [{"message": "Not Found.", "status": 404}]
    })
}
