//! Monitor regression tests.
//!
//! Runs the real reqwest client against local axum servers standing in
//! for the monitored endpoints, with mail captured in memory.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::get;
use tokio::sync::watch;
use tower::ServiceExt;

use keepalive_api::{ApiState, build_router};
use keepalive_core::{Endpoint, MonitorConfig};
use keepalive_health::{ReqwestClient, RetryPolicy};
use keepalive_notify::{ALL_SUCCEEDED, MemoryMailer, Notifier};
use keepalive_scheduler::{Scheduler, SweepSchedule};

/// Serve `/healthy` (200), `/broken` (500) and `/flaky` (500 once, then 200).
async fn spawn_backend() -> String {
    let flaky_hits = Arc::new(AtomicUsize::new(0));
    let app = Router::new()
        .route("/healthy", get(|| async { "ok" }))
        .route(
            "/broken",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "broken") }),
        )
        .route(
            "/flaky",
            get(move || {
                let hits = flaky_hits.clone();
                async move {
                    if hits.fetch_add(1, Ordering::SeqCst) == 0 {
                        StatusCode::INTERNAL_SERVER_ERROR
                    } else {
                        StatusCode::OK
                    }
                }
            }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

fn fast_policy() -> RetryPolicy {
    RetryPolicy {
        max_retries: 2,
        retry_delay: Duration::from_millis(10),
        timeout: Duration::from_secs(2),
    }
}

fn fast_sweep() -> SweepSchedule {
    SweepSchedule {
        interval: Duration::from_secs(300),
        pacing: Duration::from_millis(10),
        run_on_start: false,
    }
}

fn monitor(urls: Vec<String>, mailer: &MemoryMailer) -> Scheduler {
    Scheduler::new(
        urls.into_iter().map(Endpoint::new).collect(),
        Arc::new(ReqwestClient::new().unwrap()),
        fast_policy(),
        Notifier::new(Arc::new(mailer.clone())),
    )
    .with_sweep(fast_sweep())
}

#[tokio::test]
async fn healthy_and_broken_endpoints_in_one_sweep() {
    let base = spawn_backend().await;
    let mailer = MemoryMailer::new();
    let healthy = format!("{base}/healthy");
    let broken = format!("{base}/broken");
    let sched = monitor(vec![healthy.clone(), broken.clone()], &mailer);

    let reports = sched.sweep().await;
    assert!(reports[0].healthy());
    assert_eq!(reports[0].attempts.len(), 1);
    assert!(!reports[1].healthy());
    assert_eq!(reports[1].attempts.len(), 3);

    let sent = mailer.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].subject, format!("Ping Service Error: {broken}"));
    assert!(sent[0].body.contains("status code 500"));

    assert_eq!(sched.error_log().len().await, 1);
}

#[tokio::test]
async fn flaky_endpoint_recovers_without_alert() {
    let base = spawn_backend().await;
    let mailer = MemoryMailer::new();
    let sched = monitor(vec![format!("{base}/flaky")], &mailer);

    let reports = sched.sweep().await;
    assert!(reports[0].healthy());
    assert_eq!(reports[0].attempts.len(), 2);
    assert!(mailer.sent().await.is_empty());
    assert!(sched.error_log().is_empty().await);
}

#[tokio::test]
async fn unreachable_endpoint_is_terminal_failure() {
    let mailer = MemoryMailer::new();
    let sched = monitor(vec!["http://127.0.0.1:1/health".to_string()], &mailer);

    let reports = sched.sweep().await;
    assert!(!reports[0].healthy());
    assert_eq!(mailer.sent().await.len(), 1);
}

#[tokio::test]
async fn digest_drains_what_the_sweep_recorded() {
    let base = spawn_backend().await;
    let mailer = MemoryMailer::new();
    let sched = monitor(
        vec![format!("{base}/broken"), format!("{base}/healthy")],
        &mailer,
    );

    sched.sweep().await;
    sched.sweep().await;
    assert_eq!(sched.dispatch_digest().await, 2);

    let sent = mailer.sent().await;
    // Two failure alerts, then the digest.
    assert_eq!(sent.len(), 3);
    let digest = &sent[2];
    assert!(digest.subject.starts_with("Daily Ping Report - "));
    assert_eq!(digest.body.matches("/broken").count(), 2);

    assert_eq!(sched.dispatch_digest().await, 0);
    assert_eq!(mailer.sent().await[3].body, ALL_SUCCEEDED);
}

#[tokio::test]
async fn status_route_reflects_pending_errors() {
    let base = spawn_backend().await;
    let mailer = MemoryMailer::new();
    let sched = monitor(vec![format!("{base}/broken")], &mailer);
    sched.sweep().await;

    let config = MonitorConfig {
        endpoints: sched.endpoints().to_vec(),
        ..MonitorConfig::default()
    };
    let router = build_router(ApiState::new(&config, sched.error_log().clone()));

    let req = Request::builder().uri("/status").body(Body::empty()).unwrap();
    let resp = router.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["pending_errors"], 1);

    sched.dispatch_digest().await;

    let req = Request::builder().uri("/status").body(Body::empty()).unwrap();
    let resp = router.oneshot(req).await.unwrap();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["pending_errors"], 0);
}

#[tokio::test]
async fn run_loop_sweeps_on_start_and_stops() {
    let base = spawn_backend().await;
    let mailer = MemoryMailer::new();
    let sched = Arc::new(
        monitor(vec![format!("{base}/broken")], &mailer).with_sweep(SweepSchedule {
            run_on_start: true,
            ..fast_sweep()
        }),
    );
    let (tx, rx) = watch::channel(false);

    let runner = sched.clone();
    let handle = tokio::spawn(async move { runner.run(rx).await });

    let mut waited = Duration::ZERO;
    while sched.error_log().is_empty().await && waited < Duration::from_secs(5) {
        tokio::time::sleep(Duration::from_millis(20)).await;
        waited += Duration::from_millis(20);
    }
    assert_eq!(sched.error_log().len().await, 1);

    tx.send(true).unwrap();
    handle.await.unwrap();
}
