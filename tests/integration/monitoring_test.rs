// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{disabled, init_logging, InMemoryChangeRecordRepository, InMemorySnapshotRepository};
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use changesignal::config::settings::{FetcherSettings, Settings};
use changesignal::domain::models::severity::ChangeType;
use changesignal::domain::models::snapshot::MonitoredPage;
use changesignal::domain::services::change_detection_service::ChangeDetectionService;
use changesignal::domain::services::monitoring_service::MonitoringService;
use changesignal::engines::fetcher::Fetcher;
use changesignal::engines::reqwest_engine::ReqwestEngine;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;

const VERSIONS: [&str; 2] = [
    r#"<html><head><title>Acme Features</title></head><body>
        <h1>Features</h1><ul><li>Single sign on</li><li>API access</li></ul>
    </body></html>"#,
    r#"<html><head><title>Acme Features</title></head><body>
        <h1>Features</h1><ul><li>Single sign on</li><li>API access</li><li>Audit log</li></ul>
    </body></html>"#,
];

async fn start_site(version: Arc<AtomicUsize>) -> SocketAddr {
    let app = Router::new()
        .route(
            "/features",
            get(move || {
                let version = version.clone();
                async move { Html(VERSIONS[version.load(Ordering::SeqCst).min(1)]) }
            }),
        )
        .route(
            "/down",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "maintenance") }),
        );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

struct Monitor {
    snapshots: Arc<InMemorySnapshotRepository>,
    records: Arc<InMemoryChangeRecordRepository>,
    service: MonitoringService,
}

fn monitor() -> Monitor {
    init_logging();
    let snapshots = Arc::new(InMemorySnapshotRepository::new());
    let records = Arc::new(InMemoryChangeRecordRepository::new());
    let fetcher = Fetcher::new(
        Arc::new(ReqwestEngine::new()),
        None,
        FetcherSettings {
            allow_private_hosts: true,
            backoff_base_ms: 10,
            ..Default::default()
        },
    );
    let detector = ChangeDetectionService::new(snapshots.clone(), records.clone(), &Settings::default())
        .with_fast_tier(disabled())
        .with_deep_tier(disabled());

    Monitor {
        service: MonitoringService::new(Arc::new(fetcher), snapshots.clone(), Arc::new(detector)),
        snapshots,
        records,
    }
}

#[tokio::test]
async fn test_check_page_lifecycle() {
    let version = Arc::new(AtomicUsize::new(0));
    let addr = start_site(version.clone()).await;
    let monitor = monitor();
    let page = MonitoredPage::new(1, format!("http://{}/features", addr));

    // First capture establishes the baseline
    let first = monitor.service.check_page(&page).await.unwrap();
    assert!(first.snapshot.success);
    assert_eq!(first.snapshot.page_title.as_deref(), Some("Acme Features"));
    assert!(first.snapshot.content_hash.is_some());
    assert!(first.record.is_none());

    let second = monitor.service.check_page(&page).await.unwrap();
    let unchanged = second.record.expect("record for unchanged page");
    assert!(!unchanged.change_detected);
    assert_eq!(unchanged.snapshot_id, second.snapshot.id);

    version.store(1, Ordering::SeqCst);
    let third = monitor.service.check_page(&page).await.unwrap();
    let changed = third.record.expect("record for changed page");
    assert!(changed.change_detected);
    assert_eq!(changed.change_type, ChangeType::Features);
    assert_eq!(
        changed.structured_diff.feature_changes.unwrap().added,
        vec!["Audit log".to_string()]
    );

    assert_eq!(monitor.snapshots.len(), 3);
    assert_eq!(monitor.records.records().len(), 2);
}

#[tokio::test]
async fn test_check_page_records_failed_fetch() {
    let addr = start_site(Arc::new(AtomicUsize::new(0))).await;
    let monitor = monitor();
    let page = MonitoredPage::new(2, format!("http://{}/down", addr));

    let outcome = monitor.service.check_page(&page).await.unwrap();

    assert!(!outcome.snapshot.success);
    assert_eq!(outcome.snapshot.http_status_code, Some(500));
    assert_eq!(
        outcome.snapshot.error_message.as_deref(),
        Some("Unexpected status code: 500")
    );
    assert!(outcome.snapshot.cleaned_text.is_none());
    assert!(outcome.record.is_none());
    assert_eq!(monitor.snapshots.len(), 1);
}

#[tokio::test]
async fn test_check_page_rejects_unsupported_scheme() {
    let monitor = monitor();
    let page = MonitoredPage::new(3, "ftp://acme.io/features");

    let outcome = monitor.service.check_page(&page).await.unwrap();

    assert!(!outcome.snapshot.success);
    assert!(outcome
        .snapshot
        .error_message
        .unwrap()
        .contains("Unsupported URL scheme"));
    assert!(outcome.record.is_none());
    assert!(monitor.records.records().is_empty());
}
