// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::init_logging;
use axum::extract::Path;
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use changesignal::config::settings::FetcherSettings;
use changesignal::engines::fetcher::Fetcher;
use changesignal::engines::playwright_engine::PlaywrightEngine;
use changesignal::engines::reqwest_engine::ReqwestEngine;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

#[derive(Default)]
struct LoadCounters {
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    flaky_calls: AtomicUsize,
}

async fn start_server(counters: Arc<LoadCounters>) -> SocketAddr {
    let slow = counters.clone();
    let flaky = counters.clone();

    let app = Router::new()
        .route(
            "/slow/{id}",
            get(move |Path(id): Path<usize>| {
                let counters = slow.clone();
                async move {
                    let now = counters.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    counters.max_in_flight.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(100)).await;
                    counters.in_flight.fetch_sub(1, Ordering::SeqCst);
                    Html(format!("<html><body><p>page {}</p></body></html>", id))
                }
            }),
        )
        .route(
            "/flaky",
            get(move || {
                let counters = flaky.clone();
                async move {
                    if counters.flaky_calls.fetch_add(1, Ordering::SeqCst) < 2 {
                        (StatusCode::SERVICE_UNAVAILABLE, Html("busy".to_string()))
                    } else {
                        (StatusCode::OK, Html("<html><body>ready</body></html>".to_string()))
                    }
                }
            }),
        )
        .route("/missing", get(|| async { (StatusCode::NOT_FOUND, "gone") }));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn local_fetcher() -> Fetcher {
    init_logging();
    Fetcher::new(
        Arc::new(ReqwestEngine::new()),
        None,
        FetcherSettings {
            allow_private_hosts: true,
            backoff_base_ms: 10,
            ..Default::default()
        },
    )
}

#[tokio::test]
async fn test_batch_fetch_respects_concurrency_cap() {
    let counters = Arc::new(LoadCounters::default());
    let addr = start_server(counters.clone()).await;
    let fetcher = local_fetcher();

    let urls: Vec<String> = (0..50).map(|i| format!("http://{}/slow/{}", addr, i)).collect();
    let results = fetcher.batch_fetch(urls.clone()).await;

    assert_eq!(results.len(), 50);
    for (i, result) in results.iter().enumerate() {
        assert!(result.success, "fetch {} failed: {:?}", i, result.error);
        assert_eq!(result.url, urls[i]);
        assert!(result.html.as_deref().unwrap().contains(&format!("page {}", i)));
    }

    let peak = counters.max_in_flight.load(Ordering::SeqCst);
    assert!(peak <= 15, "peak concurrency was {}", peak);
    assert!(peak > 1, "requests were never concurrent");
    assert_eq!(fetcher.available_slots(), 15);
}

#[tokio::test]
async fn test_fetch_retries_transient_errors() {
    let counters = Arc::new(LoadCounters::default());
    let addr = start_server(counters.clone()).await;

    let result = local_fetcher()
        .fetch(&format!("http://{}/flaky", addr))
        .await
        .unwrap();

    assert!(result.success);
    assert_eq!(result.attempt_count, 3);
    assert_eq!(result.status_code, Some(200));
    assert_eq!(counters.flaky_calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_fetch_reports_final_status() {
    let counters = Arc::new(LoadCounters::default());
    let addr = start_server(counters).await;

    let result = local_fetcher()
        .fetch(&format!("http://{}/missing", addr))
        .await
        .unwrap();

    assert!(!result.success);
    assert_eq!(result.attempt_count, 3);
    assert_eq!(result.status_code, Some(404));
    assert_eq!(result.html.as_deref(), Some("gone"));
    assert_eq!(result.error.as_deref(), Some("Unexpected status code: 404"));
}

#[tokio::test]
async fn test_private_hosts_rejected_by_default() {
    let fetcher = Fetcher::new(Arc::new(ReqwestEngine::new()), None, FetcherSettings::default());

    assert!(fetcher.fetch("http://127.0.0.1:8080/").await.is_err());
    assert!(fetcher.fetch("http://localhost/").await.is_err());
    assert!(fetcher.fetch("http://10.0.0.7/admin").await.is_err());
}

#[tokio::test]
async fn test_unreachable_renderer_yields_tagged_failure() {
    let counters = Arc::new(LoadCounters::default());
    let addr = start_server(counters).await;
    let fetcher = Fetcher::new(
        Arc::new(ReqwestEngine::new()),
        Some(Arc::new(PlaywrightEngine::with_remote("http://127.0.0.1:1"))),
        FetcherSettings {
            allow_private_hosts: true,
            backoff_base_ms: 10,
            use_fallback_renderer: true,
            ..Default::default()
        },
    );

    let result = fetcher.fetch(&format!("http://{}/missing", addr)).await.unwrap();

    assert!(!result.success);
    assert!(result.used_fallback_renderer);
    assert_eq!(result.attempt_count, 4);
    assert!(result.error.is_some());
}

#[tokio::test]
async fn test_default_fetcher_configuration() {
    let fetcher = Fetcher::from_settings(FetcherSettings::default());
    assert_eq!(fetcher.available_slots(), 15);
}
