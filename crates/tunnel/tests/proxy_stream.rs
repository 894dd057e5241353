//! End-to-end runner behavior against an in-process origin: proxy
//! streaming, range passthrough, upstream failures, client aborts, and the
//! cleanup guarantees around all of them.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::http::{HeaderMap, StatusCode, header};
use axum::routing::get;
use bytes::Bytes;
use reqwest::Client;
use rustc_hash::FxHashMap;
use tempfile::TempDir;

use sluice_plan::{Container, OutputFormat, PlanInput, PlanKind, StreamPlan};
use sluice_tunnel::{
    OperationRegistry, ProcessRunner, RunnerConfig, StreamError, TempFileConfig, TempFileManager,
};

const BODY: &str = "0123456789abcdef";

async fn spawn_origin() -> String {
    let app = Router::new()
        .route(
            "/clip.mp4",
            get(|headers: HeaderMap| async move {
                match headers.get(header::RANGE).and_then(|v| v.to_str().ok()) {
                    Some("bytes=4-7") => (
                        StatusCode::PARTIAL_CONTENT,
                        [(header::ACCEPT_RANGES, "bytes")],
                        &BODY[4..8],
                    ),
                    _ => (StatusCode::OK, [(header::ACCEPT_RANGES, "bytes")], BODY),
                }
            }),
        )
        .route("/gone.mp4", get(|| async { StatusCode::NOT_FOUND }))
        .route(
            // Never answers: the request hangs before any headers arrive.
            "/slow.mp4",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                BODY
            }),
        )
        .route(
            // Headers arrive at once, then the body stalls after one byte.
            "/drip.mp4",
            get(|| async {
                let chunks = futures::stream::unfold(0u32, |sent| async move {
                    if sent == 0 {
                        Some((Ok::<_, std::io::Error>(Bytes::from_static(b"x")), 1))
                    } else {
                        tokio::time::sleep(Duration::from_secs(3600)).await;
                        None
                    }
                });
                axum::body::Body::from_stream(chunks)
            }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

struct Fixture {
    runner: Arc<ProcessRunner>,
    temp: Arc<TempFileManager>,
    registry: Arc<OperationRegistry>,
    _scratch: TempDir,
}

fn fixture_with(config: RunnerConfig) -> Fixture {
    let scratch = tempfile::tempdir().unwrap();
    let client = Client::new();
    let temp = Arc::new(TempFileManager::new(
        client.clone(),
        TempFileConfig {
            dir: scratch.path().to_path_buf(),
            sweep_interval: Duration::from_secs(60),
            max_age: Duration::from_secs(300),
        },
    ));
    let registry = Arc::new(OperationRegistry::new());
    let runner = Arc::new(ProcessRunner::new(
        client,
        config,
        Arc::clone(&temp),
        Arc::clone(&registry),
    ));
    Fixture {
        runner,
        temp,
        registry,
        _scratch: scratch,
    }
}

fn fixture() -> Fixture {
    fixture_with(RunnerConfig::default())
}

fn proxy_plan(url: String) -> StreamPlan {
    StreamPlan {
        kind: PlanKind::DirectProxy,
        inputs: vec![PlanInput::new(url)],
        output: Some(OutputFormat::container(Container::Mp4)),
        filename: "clip.mp4".into(),
        tags: FxHashMap::default(),
        size_multiplier: 1.0,
        prefetch: false,
    }
}

async fn wait_until_idle(registry: &OperationRegistry) {
    for _ in 0..100 {
        if registry.is_empty() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("registry still has entries after the operation ended");
}

#[tokio::test]
async fn direct_proxy_relays_origin_bytes() {
    let origin = spawn_origin().await;
    let fx = fixture();

    let mut handle = fx
        .runner
        .open(proxy_plan(format!("{origin}/clip.mp4")), None)
        .await
        .unwrap();
    assert_eq!(handle.info.status, 200);
    assert_eq!(handle.info.content_length, Some(BODY.len() as u64));
    assert!(handle.info.accept_ranges);

    let mut body = Vec::new();
    while let Some(chunk) = handle.receiver.recv().await {
        body.extend_from_slice(&chunk.unwrap());
    }
    assert_eq!(body, BODY.as_bytes());

    wait_until_idle(&fx.registry).await;
    assert_eq!(fx.temp.tracked_count(), 0);
}

#[tokio::test]
async fn range_request_is_passed_through() {
    let origin = spawn_origin().await;
    let fx = fixture();

    let mut handle = fx
        .runner
        .open(
            proxy_plan(format!("{origin}/clip.mp4")),
            Some("bytes=4-7".to_string()),
        )
        .await
        .unwrap();
    assert_eq!(handle.info.status, 206);

    let mut body = Vec::new();
    while let Some(chunk) = handle.receiver.recv().await {
        body.extend_from_slice(&chunk.unwrap());
    }
    assert_eq!(body, b"4567");
}

#[tokio::test]
async fn upstream_error_surfaces_before_any_byte() {
    let origin = spawn_origin().await;
    let fx = fixture();

    let err = fx
        .runner
        .open(proxy_plan(format!("{origin}/gone.mp4")), None)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        StreamError::UpstreamStatus {
            status: 404,
            url: format!("{origin}/gone.mp4"),
        }
    );

    wait_until_idle(&fx.registry).await;
    assert_eq!(fx.temp.tracked_count(), 0);
}

#[tokio::test]
async fn hung_origin_cannot_outlive_the_deadline() {
    let origin = spawn_origin().await;
    let fx = fixture_with(RunnerConfig {
        deadline: Duration::from_millis(100),
        ..RunnerConfig::default()
    });

    // The origin never answers the request; the deadline must still cut
    // the starting phase short.
    let start = std::time::Instant::now();
    let err = fx
        .runner
        .open(proxy_plan(format!("{origin}/slow.mp4")), None)
        .await
        .unwrap_err();
    assert_eq!(err, StreamError::DeadlineExceeded);
    assert!(start.elapsed() < Duration::from_secs(2));

    wait_until_idle(&fx.registry).await;
    assert_eq!(fx.temp.tracked_count(), 0);
}

#[tokio::test]
async fn dropping_a_stalled_open_cancels_the_operation() {
    let origin = spawn_origin().await;
    let fx = fixture();

    // Caller gives up while the origin is still hanging; the spawned
    // operation must be cancelled, not left to run out its full deadline.
    let opening = fx
        .runner
        .open(proxy_plan(format!("{origin}/slow.mp4")), None);
    let result = tokio::time::timeout(Duration::from_millis(100), opening).await;
    assert!(result.is_err());

    wait_until_idle(&fx.registry).await;
}

#[tokio::test]
async fn dropping_the_handle_cancels_and_cleans_up() {
    let origin = spawn_origin().await;
    let fx = fixture();

    let handle = fx
        .runner
        .open(proxy_plan(format!("{origin}/drip.mp4")), None)
        .await
        .unwrap();
    assert_eq!(fx.registry.len(), 1);

    drop(handle);
    wait_until_idle(&fx.registry).await;
    assert_eq!(fx.temp.tracked_count(), 0);
}

#[cfg(unix)]
mod processing {
    use super::*;

    /// Uses `/bin/true` as the processing binary: it ignores the built
    /// argument list and exits cleanly, which is enough to observe the
    /// prefetch, start-info and cleanup paths without a real encoder.
    fn noop_fixture() -> Fixture {
        fixture_with(RunnerConfig {
            ffmpeg_binary: "true".to_string(),
            ..RunnerConfig::default()
        })
    }

    fn remux_plan(url: String, prefetch: bool) -> StreamPlan {
        StreamPlan {
            kind: PlanKind::Remux {
                hls: false,
                drop_audio: false,
            },
            inputs: vec![PlanInput::new(url)],
            output: Some(OutputFormat::container(Container::Mp4)),
            filename: "clip.mp4".into(),
            tags: FxHashMap::default(),
            size_multiplier: 1.5,
            prefetch,
        }
    }

    #[tokio::test]
    async fn processing_start_info_carries_the_estimate() {
        let origin = spawn_origin().await;
        let fx = noop_fixture();

        let handle = fx
            .runner
            .open(remux_plan(format!("{origin}/clip.mp4"), false), None)
            .await
            .unwrap();
        assert_eq!(handle.info.status, 200);
        assert_eq!(handle.info.content_type.as_deref(), Some("video/mp4"));
        assert!(!handle.info.accept_ranges);
        // 16 bytes at the origin, multiplier 1.5.
        assert_eq!(handle.info.estimated_length, Some(24));

        wait_until_idle(&fx.registry).await;
    }

    #[tokio::test]
    async fn prefetched_input_is_released_after_the_stream() {
        let origin = spawn_origin().await;
        let fx = noop_fixture();

        let mut handle = fx
            .runner
            .open(remux_plan(format!("{origin}/clip.mp4"), true), None)
            .await
            .unwrap();
        while handle.receiver.recv().await.is_some() {}

        wait_until_idle(&fx.registry).await;
        assert_eq!(fx.temp.tracked_count(), 0);
        assert_eq!(
            std::fs::read_dir(fx._scratch.path()).unwrap().count(),
            0,
            "temp file must be deleted once the operation ends"
        );
    }

    #[tokio::test]
    async fn failed_prefetch_degrades_to_remote_streaming() {
        let origin = spawn_origin().await;
        let fx = noop_fixture();

        // Download of the input 404s; the runner must still start, reading
        // straight from the origin URL.
        let handle = fx
            .runner
            .open(remux_plan(format!("{origin}/gone.mp4"), true), None)
            .await
            .unwrap();
        assert_eq!(handle.info.status, 200);

        wait_until_idle(&fx.registry).await;
        assert_eq!(fx.temp.tracked_count(), 0);
    }
}
