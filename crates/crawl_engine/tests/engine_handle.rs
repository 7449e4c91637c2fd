use std::sync::Arc;
use std::time::Duration;

use crawl_core::{JobId, JobState, ScrapeRequest};
use crawl_engine::{
    ApiErrorKind, ApiSettings, EngineCommand, EngineEvent, EngineHandle, PollSettings,
    ReqwestJobApi,
};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const WAIT: Duration = Duration::from_secs(5);

fn engine_for(server: &MockServer, output: &TempDir) -> EngineHandle {
    let api = ReqwestJobApi::new(&ApiSettings {
        base_url: server.uri(),
        ..ApiSettings::default()
    })
    .unwrap();
    EngineHandle::with_api(
        Arc::new(api),
        PollSettings {
            interval: Duration::from_millis(50),
            max_duration: None,
        },
        output.path().to_path_buf(),
    )
    .unwrap()
}

/// Blocks until an event matching `pred` shows up; other events are skipped.
fn wait_for(engine: &EngineHandle, pred: impl Fn(&EngineEvent) -> bool) -> EngineEvent {
    let deadline = std::time::Instant::now() + WAIT;
    while std::time::Instant::now() < deadline {
        if let Some(event) = engine.recv_timeout(Duration::from_millis(100)) {
            if pred(&event) {
                return event;
            }
        }
    }
    panic!("timed out waiting for engine event");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn submit_reports_job_id_with_ticket() {
    engine_logging::initialize_for_tests();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/scrape"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"project_id": "abc123"})),
        )
        .mount(&server)
        .await;
    let output = TempDir::new().unwrap();
    let engine = engine_for(&server, &output);

    engine.send(EngineCommand::Submit {
        ticket: 7,
        request: ScrapeRequest {
            url: "http://example.com".into(),
            depth: 2,
            filters: Vec::new(),
        },
    });

    let event = wait_for(&engine, |_| true);
    assert_eq!(
        event,
        EngineEvent::Submitted {
            ticket: 7,
            job_id: JobId::new("abc123")
        }
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn polling_ticks_and_status_fetch_round_trip() {
    engine_logging::initialize_for_tests();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/project/abc123/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "in_progress", "progress": 10, "pages_downloaded": 1, "total_pages": 10
        })))
        .mount(&server)
        .await;
    let output = TempDir::new().unwrap();
    let engine = engine_for(&server, &output);
    let job = JobId::new("abc123");

    engine.send(EngineCommand::StartPolling { job_id: job.clone() });
    let tick = wait_for(&engine, |e| matches!(e, EngineEvent::PollTick { .. }));
    assert_eq!(tick, EngineEvent::PollTick { job_id: job.clone() });

    engine.send(EngineCommand::FetchStatus {
        job_id: job.clone(),
        seq: 1,
    });
    match wait_for(&engine, |e| matches!(e, EngineEvent::StatusFetched { .. })) {
        EngineEvent::StatusFetched { job_id, seq, status } => {
            assert_eq!(job_id, job);
            assert_eq!(seq, 1);
            assert_eq!(status.status, JobState::InProgress);
        }
        other => panic!("unexpected event {other:?}"),
    }

    engine.send(EngineCommand::StopPolling);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn transient_status_failure_is_reported_not_fatal() {
    engine_logging::initialize_for_tests();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/project/abc123/status"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    let output = TempDir::new().unwrap();
    let engine = engine_for(&server, &output);
    let job = JobId::new("abc123");

    engine.send(EngineCommand::StartPolling { job_id: job.clone() });
    engine.send(EngineCommand::FetchStatus {
        job_id: job.clone(),
        seq: 1,
    });
    match wait_for(&engine, |e| matches!(e, EngineEvent::StatusFailed { .. })) {
        EngineEvent::StatusFailed { error, .. } => {
            assert_eq!(error.kind, ApiErrorKind::HttpStatus(503))
        }
        other => panic!("unexpected event {other:?}"),
    }

    // The timer keeps running after the failure.
    wait_for(&engine, |e| matches!(e, EngineEvent::PollTick { .. }));
    engine.send(EngineCommand::StopPolling);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn document_export_writes_named_file() {
    engine_logging::initialize_for_tests();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/project/abc123/export/pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"%PDF-1.4".to_vec(), "application/pdf"))
        .mount(&server)
        .await;
    let output = TempDir::new().unwrap();
    let engine = engine_for(&server, &output);

    engine.send(EngineCommand::ExportDocument {
        job_id: JobId::new("abc123"),
    });

    match wait_for(&engine, |_| true) {
        EngineEvent::DocumentExported { path, .. } => {
            assert_eq!(path, output.path().join("abc123.pdf"));
            assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.4");
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn document_export_failure_is_an_event() {
    engine_logging::initialize_for_tests();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/project/abc123/export/pdf"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let output = TempDir::new().unwrap();
    let engine = engine_for(&server, &output);

    engine.send(EngineCommand::ExportDocument {
        job_id: JobId::new("abc123"),
    });

    match wait_for(&engine, |_| true) {
        EngineEvent::DocumentExportFailed { job_id, message } => {
            assert_eq!(job_id, JobId::new("abc123"));
            assert!(message.contains("500"), "message: {message}");
        }
        other => panic!("unexpected event {other:?}"),
    }
    assert!(!output.path().join("abc123.pdf").exists());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn archive_download_is_saved_and_reported() {
    engine_logging::initialize_for_tests();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/project/abc123/export/zip"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"PK\x03\x04".to_vec(), "application/zip"))
        .mount(&server)
        .await;
    let output = TempDir::new().unwrap();
    let engine = engine_for(&server, &output);

    engine.send(EngineCommand::DownloadArchive {
        job_id: JobId::new("abc123"),
    });

    match wait_for(&engine, |_| true) {
        EngineEvent::ArchiveSaved { job_id, path } => {
            assert_eq!(job_id, JobId::new("abc123"));
            assert_eq!(path, output.path().join("abc123.zip"));
            assert_eq!(std::fs::read(&path).unwrap(), b"PK\x03\x04");
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn failed_archive_download_leaves_no_file() {
    engine_logging::initialize_for_tests();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/project/abc123/export/zip"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    let output = TempDir::new().unwrap();
    let engine = engine_for(&server, &output);

    engine.send(EngineCommand::DownloadArchive {
        job_id: JobId::new("abc123"),
    });

    match wait_for(&engine, |_| true) {
        EngineEvent::ArchiveFailed { job_id, message } => {
            assert_eq!(job_id, JobId::new("abc123"));
            assert!(message.contains("404"), "message: {message}");
        }
        other => panic!("unexpected event {other:?}"),
    }
    assert_eq!(std::fs::read_dir(output.path()).unwrap().count(), 0);
}
