// SPDX-License-Identifier: MPL-2.0

//! End-to-end tests: capture surface, submission and sync

use asset_capture::backends::virtual_camera::ChunkPlan;
use asset_capture::geolocation::Coordinates;
use asset_capture::notifications::MemorySink;
use asset_capture::{
    AppError, AssetCaptureApp, CameraMode, Config, RecorderState, SessionState, SyncEvent,
    UploadStatus, VirtualCamera, VirtualCameraConfig,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

fn small_camera() -> VirtualCameraConfig {
    VirtualCameraConfig {
        native_size: Some((64, 48)),
        ..Default::default()
    }
}

fn app(camera: &VirtualCamera, offline: bool, latency: Duration) -> (AssetCaptureApp, Arc<MemorySink>) {
    let config = Config {
        start_offline: offline,
        sync_latency_ms: latency.as_millis() as u64,
        stub_location: Some(Coordinates::new(19.07, 72.87)),
        ..Default::default()
    };
    let sink = Arc::new(MemorySink::new());
    let app = AssetCaptureApp::new(config, Arc::new(camera.clone()), sink.clone());
    (app, sink)
}

async fn wait_completed(events: &mut broadcast::Receiver<SyncEvent>) -> (usize, Vec<u64>) {
    loop {
        if let SyncEvent::Completed { count, ids } = events.recv().await.unwrap() {
            return (count, ids);
        }
    }
}

#[tokio::test]
async fn test_tracks_balance_over_open_close_sequences() {
    let camera = VirtualCamera::new(small_camera());
    let (app, _sink) = app(&camera, false, Duration::from_millis(10));

    for round in 0..4 {
        let surface = app.capture_surface(CameraMode::Photo);
        if round % 2 == 0 {
            surface.show().await.unwrap();
        }
        surface.dismiss();
        surface.dismiss();
        if round == 3 {
            surface.show().await.unwrap();
            // Dropped without an explicit dismissal
        }
    }

    let stats = camera.stats();
    assert_eq!(stats.tracks_acquired, 3);
    assert_eq!(stats.tracks_stopped, stats.tracks_acquired);
}

#[tokio::test]
async fn test_two_captures_yield_two_artifacts() {
    let camera = VirtualCamera::new(small_camera());
    let (app, sink) = app(&camera, false, Duration::from_millis(10));

    let surface = app.capture_surface(CameraMode::Photo);
    surface.show().await.unwrap();

    let first = surface.capture_photo().await.unwrap().unwrap();
    let second = surface.capture_photo().await.unwrap().unwrap();

    for submission in [&first, &second] {
        assert_eq!(submission.artifact.mime_type, "image/jpeg");
        assert!(!submission.artifact.is_empty());
        assert_eq!(submission.item.status, UploadStatus::Verified);
    }
    assert_ne!(first.artifact.handle, second.artifact.handle);
    assert_ne!(first.item.id, second.item.id);
    assert_eq!(sink.count("capture_saved"), 2);
    assert_eq!(app.ledger().confirmed_len(), 2);

    assert_eq!(app.store().live_count(), 2);
    surface.dismiss();
    assert_eq!(app.store().live_count(), 0);
}

#[tokio::test]
async fn test_double_start_records_once() {
    let camera = VirtualCamera::new(VirtualCameraConfig {
        chunks: ChunkPlan::Scripted {
            on_start: vec![10, 20],
            on_stop: vec![15],
        },
        ..small_camera()
    });
    let (app, sink) = app(&camera, false, Duration::from_millis(10));

    let surface = app.capture_surface(CameraMode::Video);
    surface.show().await.unwrap();

    surface.start_recording().unwrap();
    surface.start_recording().unwrap();
    assert_eq!(surface.recorder_state(), RecorderState::Recording);
    assert_eq!(camera.stats().recorders_created, 1);

    let submission = surface.stop_recording().await.unwrap();
    assert_eq!(submission.artifact.len(), 45);
    assert_eq!(submission.item.label, "New Video Evidence");
    assert_eq!(surface.recorder_state(), RecorderState::Stopped);
    assert_eq!(sink.count("capture_saved"), 1);

    assert!(surface.stop_recording().await.is_none());
    assert_eq!(sink.count("capture_saved"), 1);
}

#[tokio::test]
async fn test_chunks_concatenate_in_arrival_order() {
    let camera = VirtualCamera::new(VirtualCameraConfig {
        chunks: ChunkPlan::Scripted {
            on_start: vec![10, 20, 15],
            on_stop: Vec::new(),
        },
        ..small_camera()
    });
    let (app, _sink) = app(&camera, true, Duration::from_millis(10));

    let surface = app.capture_surface(CameraMode::Video);
    surface.show().await.unwrap();
    surface.start_recording().unwrap();

    let submission = surface.stop_recording().await.unwrap();
    assert_eq!(submission.artifact.len(), 45);
    assert_eq!(submission.artifact.mime_type, "video/webm");
    assert_eq!(submission.item.status, UploadStatus::Pending);
    assert_eq!(app.ledger().queue_len(), 1);
}

#[tokio::test]
async fn test_stop_without_start_has_no_effect() {
    let camera = VirtualCamera::new(small_camera());
    let (app, sink) = app(&camera, false, Duration::from_millis(10));

    let surface = app.capture_surface(CameraMode::Video);
    surface.show().await.unwrap();

    assert!(surface.stop_recording().await.is_none());
    assert_eq!(surface.recorder_state(), RecorderState::Idle);
    assert!(sink.events().is_empty());
    assert_eq!(app.ledger().confirmed_len(), 0);
    assert_eq!(app.store().live_count(), 0);
}

#[tokio::test]
async fn test_unavailable_camera_fails_gracefully() {
    let camera = VirtualCamera::new(VirtualCameraConfig {
        deny_permission: true,
        ..small_camera()
    });
    let (app, sink) = app(&camera, false, Duration::from_millis(10));

    let surface = app.capture_surface(CameraMode::Photo);
    let err = surface.show().await.unwrap_err();
    assert!(matches!(err, AppError::Camera(_)));
    assert_eq!(surface.session_state(), SessionState::Failed);
    assert_eq!(
        surface.last_error().as_deref(),
        Some("Camera access denied or unavailable")
    );

    assert!(surface.capture_photo().await.is_err());
    assert!(surface.start_recording().is_err());
    assert_eq!(surface.session_state(), SessionState::Failed);
    assert_eq!(surface.recorder_state(), RecorderState::Idle);
    assert_eq!(sink.count("camera_error"), 1);
    let reported = sink
        .events()
        .into_iter()
        .find(|event| event.name == "camera_error")
        .unwrap();
    assert_eq!(
        reported.payload["message"],
        "Camera access denied or unavailable"
    );
    assert_eq!(app.ledger().confirmed_len() + app.ledger().queue_len(), 0);
}

#[tokio::test]
async fn test_unsupported_recorder_keeps_photo_capture() {
    let camera = VirtualCamera::new(VirtualCameraConfig {
        supported_mime_types: Vec::new(),
        ..small_camera()
    });
    let (app, _sink) = app(&camera, false, Duration::from_millis(10));

    let surface = app.capture_surface(CameraMode::Video);
    surface.show().await.unwrap();

    assert!(surface.start_recording().is_err());
    assert_eq!(surface.session_state(), SessionState::Active);
    assert_eq!(surface.recorder_state(), RecorderState::Idle);
    assert!(surface.last_error().is_some());

    assert!(surface.capture_photo().await.unwrap().is_some());
}

#[tokio::test]
async fn test_dismiss_during_encode_submits_nothing() {
    let camera = VirtualCamera::new(small_camera());
    let (app, sink) = app(&camera, true, Duration::from_millis(10));

    let surface = Arc::new(app.capture_surface(CameraMode::Photo));
    surface.show().await.unwrap();

    let capture = {
        let surface = Arc::clone(&surface);
        tokio::spawn(async move { surface.capture_photo().await })
    };
    tokio::task::yield_now().await;
    surface.dismiss();

    assert!(capture.await.unwrap().unwrap().is_none());
    assert_eq!(app.ledger().queue_len(), 0);
    assert_eq!(sink.count("capture_queued"), 0);
    assert_eq!(app.store().live_count(), 0);
}

#[tokio::test]
async fn test_dismiss_cancels_recording() {
    let camera = VirtualCamera::new(VirtualCameraConfig {
        chunks: ChunkPlan::Scripted {
            on_start: vec![10],
            on_stop: vec![5],
        },
        ..small_camera()
    });
    let (app, _sink) = app(&camera, false, Duration::from_millis(10));

    let surface = app.capture_surface(CameraMode::Video);
    surface.show().await.unwrap();
    surface.start_recording().unwrap();
    surface.dismiss();

    assert_eq!(surface.recorder_state(), RecorderState::Idle);
    assert!(surface.stop_recording().await.is_none());
    assert_eq!(app.ledger().confirmed_len(), 0);
    assert_eq!(camera.stats().tracks_stopped, camera.stats().tracks_acquired);
}

#[tokio::test(start_paused = true)]
async fn test_offline_captures_drain_once_when_online() {
    let camera = VirtualCamera::new(small_camera());
    let (app, sink) = app(&camera, true, Duration::from_millis(1200));
    let mut events = app.sync().subscribe();

    let surface = app.capture_surface(CameraMode::Photo);
    surface.show().await.unwrap();
    for _ in 0..3 {
        surface.capture_photo().await.unwrap().unwrap();
    }
    surface.dismiss();

    assert_eq!(app.ledger().queue_len(), 3);
    assert_eq!(app.ledger().confirmed_len(), 0);

    assert!(app.set_online(true));
    let (count, ids) = wait_completed(&mut events).await;
    assert_eq!(count, 3);
    assert_eq!(ids, vec![1, 2, 3]);

    assert_eq!(app.ledger().queue_len(), 0);
    assert_eq!(app.ledger().confirmed_len(), 3);
    assert!(
        app.ledger()
            .confirmed()
            .iter()
            .all(|item| item.status == UploadStatus::Pending)
    );

    // Staying online starts nothing new
    assert!(!app.set_online(true));
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(sink.count("sync_started"), 1);
    assert_eq!(sink.count("sync_complete"), 1);
}

#[tokio::test]
async fn test_capture_during_sync_stays_queued() {
    let camera = VirtualCamera::new(small_camera());
    let (app, _sink) = app(&camera, true, Duration::from_millis(300));
    let mut events = app.sync().subscribe();

    let surface = app.capture_surface(CameraMode::Photo);
    surface.show().await.unwrap();
    surface.capture_photo().await.unwrap().unwrap();

    app.set_online(true);
    assert_eq!(events.recv().await.unwrap(), SyncEvent::Started { count: 1 });

    // Back offline before the second capture so it is queued
    app.set_online(false);
    surface.capture_photo().await.unwrap().unwrap();

    let (count, _) = wait_completed(&mut events).await;
    assert_eq!(count, 1);
    assert_eq!(app.ledger().confirmed_len(), 1);
    assert_eq!(app.ledger().queue_len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_discards_in_flight_sync() {
    let camera = VirtualCamera::new(small_camera());
    let (app, sink) = app(&camera, true, Duration::from_millis(1200));
    let mut events = app.sync().subscribe();

    let surface = app.capture_surface(CameraMode::Photo);
    surface.show().await.unwrap();
    surface.capture_photo().await.unwrap().unwrap();

    app.set_online(true);
    assert_eq!(events.recv().await.unwrap(), SyncEvent::Started { count: 1 });
    app.shutdown();
    tokio::time::sleep(Duration::from_secs(5)).await;

    assert_eq!(app.ledger().queue_len(), 1);
    assert_eq!(app.ledger().confirmed_len(), 0);
    assert_eq!(sink.count("sync_complete"), 0);
}

#[tokio::test]
async fn test_export_schema() {
    let camera = VirtualCamera::new(small_camera());
    let (app, _sink) = app(&camera, false, Duration::from_millis(10));

    let surface = app.capture_surface(CameraMode::Photo);
    surface.show().await.unwrap();
    surface.capture_photo().await.unwrap().unwrap();

    let exported = app.ledger().export_json().unwrap();
    let positions: Vec<usize> = ["\"id\"", "\"kind\"", "\"createdAt\"", "\"status\"", "\"label\"", "\"location\""]
        .iter()
        .map(|key| exported.find(key).unwrap())
        .collect();
    assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
}

#[tokio::test(start_paused = true)]
async fn test_quick_offline_online_toggle_still_syncs() {
    let camera = VirtualCamera::new(small_camera());
    let (app, sink) = app(&camera, false, Duration::from_millis(1200));

    let surface = app.capture_surface(CameraMode::Photo);
    surface.show().await.unwrap();
    let first = surface.capture_photo().await.unwrap().unwrap();
    assert_eq!(app.ledger().confirmed_len(), 1);

    // No await between the toggles, so the observer only wakes afterwards
    app.set_online(false);
    app.desk().submit(&first.artifact);
    app.set_online(true);
    assert_eq!(app.ledger().queue_len(), 1);

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(app.ledger().queue_len(), 0);
    assert_eq!(app.ledger().confirmed_len(), 2);
    assert_eq!(sink.count("sync_started"), 1);
}
