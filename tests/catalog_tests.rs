//! Catalog adapters and the detail fallback chain against local mock servers.

mod common;

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use allnime::clients::CatalogSource;
use allnime::domain::AnimeId;
use allnime::services::{CatalogError, DetailOutcome, LookupPath};
use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use common::{anilist_media, anilist_not_found, context_for, jikan_anime, serve};
use serde_json::json;

fn anilist_always_missing() -> Router {
    Router::new().route(
        "/graphql",
        post(|| async { (StatusCode::NOT_FOUND, Json(anilist_not_found())) }),
    )
}

#[tokio::test]
async fn unknown_id_resolves_by_title_search() {
    let searches = Arc::new(AtomicUsize::new(0));
    let counter = searches.clone();

    let app = Router::new()
        .route("/anime/{id}/full", get(|| async { StatusCode::NOT_FOUND }))
        .route(
            "/anime/{id}",
            get(|Path(id): Path<i64>| async move {
                if id == 20 {
                    Json(json!({ "data": jikan_anime(20, "Naruto") })).into_response()
                } else {
                    StatusCode::NOT_FOUND.into_response()
                }
            }),
        )
        .route(
            "/anime",
            get(move |Query(params): Query<HashMap<String, String>>| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    assert_eq!(params.get("q").map(String::as_str), Some("Naruto"));
                    Json(json!({
                        "data": [jikan_anime(20, "Naruto"), jikan_anime(1735, "Naruto: Shippuuden")]
                    }))
                }
            }),
        )
        .merge(anilist_always_missing());

    let base = serve(app).await;
    let ctx = context_for(&base, vec![]);
    let original = AnimeId::new(185_660);

    let outcome = ctx.catalog.anime_details(original, Some("Naruto")).await;
    let (record, via) = outcome.into_result(original).expect("expected a record");
    assert_eq!(record.id, AnimeId::new(20));
    assert_eq!(record.title, "Naruto");
    assert_eq!(via, LookupPath::TitleReconciliation { from: original });

    let again = ctx.catalog.anime_details(original, None).await;
    assert!(matches!(again, DetailOutcome::Found { ref record, .. } if record.id == AnimeId::new(20)));
    assert_eq!(searches.load(Ordering::SeqCst), 1);
    assert_eq!(
        ctx.catalog.resolver().mappings().await,
        vec![(original, AnimeId::new(20))]
    );
}

#[tokio::test]
async fn server_errors_are_unavailable_not_missing() {
    let app = Router::new()
        .route(
            "/anime/{id}/full",
            get(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
        )
        .route(
            "/anime/{id}",
            get(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
        )
        .merge(anilist_always_missing());

    let base = serve(app).await;
    let ctx = context_for(&base, vec![]);
    let id = AnimeId::new(1);

    let outcome = ctx.catalog.anime_details(id, None).await;
    assert!(matches!(outcome, DetailOutcome::Unavailable { .. }));
    assert!(matches!(
        outcome.into_result(id),
        Err(CatalogError::Unavailable { .. })
    ));

    let stats = ctx.log_book.api_stats();
    let jikan = stats
        .iter()
        .find(|(service, _)| service == "jikan")
        .map(|(_, s)| s.clone())
        .expect("jikan calls should be recorded");
    assert_eq!(jikan.calls, 2);
    assert_eq!(jikan.failures, 2);
}

#[tokio::test]
async fn missing_everywhere_is_not_found() {
    let app = Router::new()
        .route("/anime/{id}/full", get(|| async { StatusCode::NOT_FOUND }))
        .route("/anime/{id}", get(|| async { StatusCode::NOT_FOUND }))
        .merge(anilist_always_missing());

    let base = serve(app).await;
    let ctx = context_for(&base, vec![]);

    assert_eq!(
        ctx.catalog.anime_details(AnimeId::new(9_999_999), None).await,
        DetailOutcome::NotFound
    );
}

#[tokio::test]
async fn anilist_answers_when_jikan_does_not_know_the_id() {
    let app = Router::new()
        .route("/anime/{id}/full", get(|| async { StatusCode::NOT_FOUND }))
        .route("/anime/{id}", get(|| async { StatusCode::NOT_FOUND }))
        .route(
            "/graphql",
            post(|| async {
                Json(json!({ "data": { "Media": anilist_media(100, 42, "Mock Show") } }))
            }),
        );

    let base = serve(app).await;
    let ctx = context_for(&base, vec![]);

    let outcome = ctx.catalog.anime_details(AnimeId::new(42), None).await;
    let DetailOutcome::Found { record, via } = outcome else {
        panic!("expected a record, got {outcome:?}");
    };
    assert_eq!(via, LookupPath::SecondaryById);
    assert_eq!(record.id, AnimeId::new(42));
    let synopsis = record.synopsis.expect("synopsis");
    assert!(synopsis.contains("A story."));
    assert!(!synopsis.contains("<br>"));
}

#[tokio::test]
async fn listings_apply_the_content_filter() {
    let mut adult = jikan_anime(3, "Hidden");
    adult["genres"] = json!([{"mal_id": 12, "name": "Hentai"}]);
    let mut unapproved = jikan_anime(4, "Pending");
    unapproved["approved"] = json!(false);

    let listing = json!({ "data": [jikan_anime(1, "Shown"), adult, unapproved] });
    let genres = json!({ "data": [
        {"mal_id": 1, "name": "Action", "count": 5000},
        {"mal_id": 12, "name": "Hentai", "count": 10},
        {"mal_id": 9, "name": "Erotica", "count": 3}
    ]});

    let app = Router::new()
        .route("/top/anime", {
            let listing = listing.clone();
            get(move || async move { Json(listing) })
        })
        .route("/anime", get(move || async move { Json(listing) }))
        .route("/genres/anime", get(move || async move { Json(genres) }));

    let base = serve(app).await;
    let ctx = context_for(&base, vec![]);

    let top = ctx.jikan.top_anime(1).await.expect("top list");
    let ids: Vec<i64> = top.iter().map(|r| r.id.value()).collect();
    assert_eq!(ids, vec![1]);

    let found = ctx.jikan.search("Shown", 10).await.expect("search");
    assert_eq!(found.len(), 1);

    let names: Vec<String> = ctx
        .jikan
        .genres()
        .await
        .expect("genres")
        .into_iter()
        .map(|g| g.name)
        .collect();
    assert_eq!(names, vec!["Action"]);
}

#[tokio::test]
async fn anilist_lookup_by_its_own_id() {
    let app = Router::new().route(
        "/graphql",
        post(|Json(body): Json<serde_json::Value>| async move {
            if body["variables"]["id"] == 100 {
                Json(json!({ "data": { "Media": anilist_media(100, 42, "Mock Show") } }))
                    .into_response()
            } else {
                (StatusCode::NOT_FOUND, Json(anilist_not_found())).into_response()
            }
        }),
    );

    let base = serve(app).await;
    let ctx = context_for(&base, vec![]);

    let record = ctx
        .anilist
        .get_by_id(100)
        .await
        .expect("lookup")
        .expect("known media");
    assert_eq!(record.id, AnimeId::new(42));
    assert_eq!(record.title, "Mock Show");

    assert!(ctx.anilist.get_by_id(5).await.expect("lookup").is_none());
}
