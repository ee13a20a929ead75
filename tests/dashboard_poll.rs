//! Dashboard against the simulated backend over real HTTP.

mod common;

use axum::{Router, routing::get};
use common::{quiet_printer, spawn_backend};
use krusty_dash::reconciler::Reconciliation;
use krusty_dash::{ApiError, ControlCommand, Dashboard, DashboardConfig, JobStatus, NoticeKind, RatingDraft};
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;

#[tokio::test]
async fn test_poll_once_fills_every_slice() {
    let mut printer = quiet_printer();
    let job_id = printer.start_job("benchy.gcode");
    let (config, _state) = spawn_backend(printer).await;
    let dashboard = Dashboard::connect(config).unwrap();

    let report = dashboard.poll_once().await;
    assert!(report.all_ok());

    let state = dashboard.state().await;
    let status = state.printer.expect("printer status loaded");
    assert!(status.printing);
    assert!(!status.paused);
    assert_eq!(state.tracker.current().map(|j| j.id), Some(job_id));
    assert_eq!(state.telemetry.len(), 1);
    assert_eq!(state.last_valid_command.as_deref(), Some("G28"));
}

#[tokio::test]
async fn test_telemetry_keeps_last_twenty_samples() {
    let (config, _state) = spawn_backend(quiet_printer()).await;
    let dashboard = Dashboard::connect(config).unwrap();
    for _ in 0..25 {
        dashboard.refresh_printer_status().await.unwrap();
    }
    let state = dashboard.state().await;
    assert_eq!(state.telemetry.len(), 20);
}

#[tokio::test]
async fn test_pause_repolls_status_immediately() {
    let mut printer = quiet_printer();
    printer.start_job("benchy.gcode");
    let (config, _state) = spawn_backend(printer).await;
    let dashboard = Dashboard::connect(config).unwrap();
    dashboard.poll_once().await;
    assert!(dashboard.controls().await.pause);

    let notice = dashboard.dispatch(ControlCommand::Pause).await;
    assert_eq!(notice.kind, NoticeKind::Success);
    assert_eq!(notice.message, "Printer pause command sent");

    let state = dashboard.state().await;
    assert!(state.printer.as_ref().unwrap().paused);
    let controls = dashboard.controls().await;
    assert!(!controls.pause);
    assert!(controls.resume);
    assert!(controls.cancel);
}

#[tokio::test]
async fn test_failed_pause_leaves_state_untouched() {
    let mut printer = quiet_printer();
    printer.start_job("benchy.gcode");
    let (config, state) = spawn_backend(printer).await;
    let dashboard = Dashboard::connect(config).unwrap();
    dashboard.poll_once().await;
    state.lock().unwrap().fail_commands = true;

    let notice = dashboard.dispatch(ControlCommand::Pause).await;
    assert_eq!(notice.kind, NoticeKind::Failure);
    assert_eq!(notice.message, "Failed to pause printer");
    let local = dashboard.state().await;
    assert!(!local.printer.as_ref().unwrap().paused);
    assert_eq!(local.last_notice, Some(notice));
}

#[tokio::test]
async fn test_active_job_cleared_when_finished() {
    let mut printer = quiet_printer();
    printer.progress_step = 50.0;
    let job_id = printer.start_job("vase.gcode");
    let (config, _state) = spawn_backend(printer).await;
    let dashboard = Dashboard::connect(config).unwrap();

    dashboard.refresh_printer_status().await.unwrap();
    dashboard.refresh_jobs().await.unwrap();
    assert_eq!(dashboard.state().await.tracker.current().map(|j| j.id), Some(job_id));
    assert_eq!(dashboard.rating_draft().await.job_id, None);

    // Second status request pushes the simulated job to 100%.
    dashboard.refresh_printer_status().await.unwrap();
    dashboard.refresh_jobs().await.unwrap();
    let state = dashboard.state().await;
    assert!(state.tracker.current().is_none());
    assert_eq!(state.jobs[0].status, JobStatus::Finished);
    assert_eq!(state.rating.job_id, Some(job_id));

    // Repeated polls with the same terminal status stay cleared.
    let mut tracker = state.tracker.clone();
    assert_eq!(tracker.apply(&state.jobs), Reconciliation::Retained);
}

#[tokio::test]
async fn test_rating_round_trip_clears_draft() {
    let mut printer = quiet_printer();
    printer.progress_step = 100.0;
    let job_id = printer.start_job("cube.gcode");
    let (config, state) = spawn_backend(printer).await;
    let dashboard = Dashboard::connect(config).unwrap();
    dashboard.poll_once().await;

    dashboard
        .set_rating_draft(RatingDraft {
            quality: Some(4.0),
            speed: Some(5.0),
            feedback: "smooth walls".to_string(),
            job_id: Some(job_id),
        })
        .await;
    let notice = dashboard.submit_rating().await;
    assert!(notice.is_success(), "{}", notice);
    assert_eq!(dashboard.rating_draft().await, RatingDraft::for_job(job_id));

    let ratings = state.lock().unwrap().ratings.clone();
    assert_eq!(ratings.len(), 1);
    assert_eq!(ratings[0].print_quality, 4.0);
    assert_eq!(ratings[0].feedback, "smooth walls");
}

#[tokio::test]
async fn test_next_valid_command_updates_last_valid() {
    let (config, _state) = spawn_backend(quiet_printer()).await;
    let dashboard = Dashboard::connect(config).unwrap();

    let notice = dashboard.submit_next_valid("M104 S200").await;
    assert!(notice.is_success());
    assert_eq!(dashboard.state().await.last_valid_command.as_deref(), Some("M104 S200"));

    let notice = dashboard.submit_next_valid("   ").await;
    assert_eq!(notice.kind, NoticeKind::Validation);
}

#[tokio::test]
async fn test_downloads_write_named_files() {
    let mut printer = quiet_printer();
    let job_id = printer.start_job("cube.gcode");
    let (mut config, _state) = spawn_backend(printer).await;
    let dir = tempdir().unwrap();
    config.downloads.directory = dir.path().join("downloads");
    let dashboard = Dashboard::connect(config).unwrap();

    let notice = dashboard.download_timelapse(job_id).await;
    assert!(notice.is_success(), "{}", notice);
    let video = dir.path().join("downloads").join(format!("timelapse_{}.mp4", job_id));
    assert_eq!(
        std::fs::read(&video).unwrap(),
        format!("SIMULATED-TIMELAPSE-{}", job_id).into_bytes()
    );

    let notice = dashboard.download_photos(job_id).await;
    assert!(notice.is_success());
    let archive = dir.path().join("downloads").join(format!("photos_{}.zip", job_id));
    assert!(std::fs::read(&archive).unwrap().starts_with(b"PK"));

    let notice = dashboard.download_timelapse(999).await;
    assert_eq!(notice.kind, NoticeKind::Failure);
    assert!(!dir.path().join("downloads").join("timelapse_999.mp4").exists());
}

#[tokio::test]
async fn test_unreachable_backend_fails_silently() {
    let mut config = DashboardConfig::with_base_url("http://127.0.0.1:1");
    config.backend.request_timeout_ms = 500;
    let dashboard = Dashboard::connect(config).unwrap();

    let report = dashboard.poll_once().await;
    assert!(!report.printer_status && !report.jobs && !report.last_valid);
    let state = dashboard.state().await;
    assert!(state.printer.is_none());
    assert!(state.telemetry.is_empty());

    let notice = dashboard.dispatch(ControlCommand::Preheat).await;
    assert_eq!(notice.kind, NoticeKind::Failure);
}

#[tokio::test]
async fn test_malformed_body_is_a_decode_error() {
    let app = Router::new().route("/dashboard/printer-status", get(|| async { "not json" }));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    let dashboard = Dashboard::connect(DashboardConfig::with_base_url(format!("http://{}", addr))).unwrap();

    let err = dashboard.refresh_printer_status().await.unwrap_err();
    assert!(matches!(err, ApiError::Decode(_)));
    // Jobs endpoint is missing on this backend.
    let err = dashboard.refresh_jobs().await.unwrap_err();
    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn test_background_polling_stops_on_shutdown() {
    let (mut config, _state) = spawn_backend(quiet_printer()).await;
    config.polling.interval_ms = 20;
    let dashboard = Arc::new(Dashboard::connect(config).unwrap());

    let poller = dashboard.start();
    tokio::time::sleep(Duration::from_millis(200)).await;
    poller.shutdown().await;

    let samples = dashboard.state().await.telemetry.len();
    assert!(samples >= 2, "expected several ticks, got {}", samples);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(dashboard.state().await.telemetry.len(), samples);
}
