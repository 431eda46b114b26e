//! Streaming endpoint failover against local mock servers.

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use allnime::clients::streaming::StreamingOutcome;
use axum::extract::Path;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use common::{context_for, serve};
use serde_json::json;

fn healthy(prefix: &str, hits: Arc<AtomicUsize>) -> Router {
    Router::new()
        .route(
            &format!("/{prefix}/search"),
            get(move || {
                let hits = hits.clone();
                async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    Json(json!({ "results": [{ "id": "frieren", "title": "Frieren" }] }))
                }
            }),
        )
        .route(
            &format!("/{prefix}/info/{{id}}"),
            get(|Path(id): Path<String>| async move {
                Json(json!({
                    "id": id,
                    "title": "Frieren",
                    "episodes": [
                        { "id": "frieren-1", "number": 1, "title": "The Journey's End" },
                        { "id": "frieren-2", "number": 2 }
                    ]
                }))
            }),
        )
}

fn broken(prefix: &str, hits: Arc<AtomicUsize>) -> Router {
    Router::new().route(
        &format!("/{prefix}/search"),
        get(move || {
            let hits = hits.clone();
            async move {
                hits.fetch_add(1, Ordering::SeqCst);
                StatusCode::BAD_GATEWAY
            }
        }),
    )
}

#[tokio::test]
async fn fails_over_and_prefers_the_endpoint_that_answered() {
    let down_hits = Arc::new(AtomicUsize::new(0));
    let up_hits = Arc::new(AtomicUsize::new(0));
    let app = broken("down", down_hits.clone()).merge(healthy("up", up_hits.clone()));

    let base = serve(app).await;
    let ctx = context_for(&base, vec![format!("{base}/down"), format!("{base}/up")]);
    let streaming = ctx.streaming.as_ref().expect("streaming enabled");

    let StreamingOutcome::Found(info) = streaming.lookup("Frieren").await else {
        panic!("expected episodes from the healthy endpoint");
    };
    assert_eq!(info.endpoint, format!("{base}/up"));
    assert_eq!(info.show_id, "frieren");
    assert_eq!(info.episodes.len(), 2);
    assert_eq!(info.episodes[0].title.as_deref(), Some("The Journey's End"));

    let expected = format!("{base}/up");
    assert_eq!(streaming.preferred_endpoint(), Some(expected.as_str()));

    // The preferred endpoint is tried first, so the broken one is skipped.
    assert!(streaming.lookup("Frieren").await.into_option().is_some());
    assert_eq!(down_hits.load(Ordering::SeqCst), 1);
    assert_eq!(up_hits.load(Ordering::SeqCst), 2);

    let stats = ctx.log_book.api_stats();
    let (_, streaming_stats) = stats
        .iter()
        .find(|(service, _)| service == "streaming")
        .expect("streaming calls should be recorded");
    assert_eq!(streaming_stats.calls, 3);
    assert_eq!(streaming_stats.failures, 1);
}

#[tokio::test]
async fn every_endpoint_failing_is_reported_not_raised() {
    let hits = Arc::new(AtomicUsize::new(0));
    let app = broken("a", hits.clone()).merge(broken("b", hits.clone()));

    let base = serve(app).await;
    let ctx = context_for(&base, vec![format!("{base}/a"), format!("{base}/b")]);
    let streaming = ctx.streaming.as_ref().expect("streaming enabled");

    let outcome = streaming.lookup("Frieren").await;
    let StreamingOutcome::AllEndpointsFailed { attempts } = &outcome else {
        panic!("expected every endpoint to fail, got {outcome:?}");
    };
    assert_eq!(attempts.len(), 2);
    assert_eq!(attempts[0].0, format!("{base}/a"));
    assert!(outcome.into_option().is_none());
    assert_eq!(hits.load(Ordering::SeqCst), 2);
    assert_eq!(streaming.preferred_endpoint(), None);
}

#[tokio::test]
async fn empty_search_is_a_healthy_no_match() {
    let app = Router::new().route(
        "/empty/search",
        get(|| async { Json(json!({ "results": [] })) }),
    );

    let base = serve(app).await;
    let ctx = context_for(&base, vec![format!("{base}/empty")]);
    let streaming = ctx.streaming.as_ref().expect("streaming enabled");

    assert_eq!(streaming.lookup("Nothing").await, StreamingOutcome::NoMatch);
    let expected = format!("{base}/empty");
    assert_eq!(streaming.preferred_endpoint(), Some(expected.as_str()));
}
