mod support;

use {
    com::{Measurements, ProbeResponse, ProcessedResult, RemoteError, ServerEvent},
    session::*,
    std::sync::atomic::Ordering,
    support::{Harness, HarnessOptions, settle},
    tokio::time::{Duration, Instant, sleep, sleep_until},
};

fn result(chest: &str, waist: &str, hip: &str) -> ServerEvent {
    ServerEvent::ProcessedImage(ProcessedResult {
        image: format!("data:image/jpeg;base64,{chest}"),
        measurements: Measurements {
            chest: chest.to_string(),
            waist: waist.to_string(),
            hip: hip.to_string(),
            timestamp: None,
        },
    })
}

fn config(interval_ms: u64) -> ControllerConfig {
    ControllerConfig::default().with_interval(Duration::from_millis(interval_ms))
}

#[tokio::test(start_paused = true)]
async fn test_open_connects_and_enables_analysis() {
    let harness = Harness::start(config(500));

    harness.open_with_camera().await;

    let view = harness.view();
    assert!(view.open);
    assert_eq!(view.status, ConnectionStatus::Connected);
    assert!(!view.start_camera_enabled);
    assert!(view.analysis_enabled);
    assert!(view.video_visible);
    assert_eq!(harness.sent(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_eager_first_frame() {
    let harness = Harness::start(config(500));
    harness.open_with_camera().await;

    harness.handle.toggle().unwrap();
    settle().await;
    assert_eq!(harness.sent(), 1);

    let sent = harness.sink.sent.lock().unwrap()[0].clone();
    assert!(sent.image.starts_with("data:image/jpeg;base64,"));

    sleep(Duration::from_millis(400)).await;
    harness.emit(result("95 cm", "80 cm", "98 cm"));
    settle().await;
    // in flight is clear, but the first tick is still 100 ms away
    assert_eq!(harness.sent(), 1);

    sleep(Duration::from_millis(110)).await;
    assert_eq!(harness.sent(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_one_in_flight_when_latency_exceeds_interval() {
    let harness = Harness::start(config(100));
    harness.open_with_camera().await;

    harness.handle.toggle().unwrap();
    sleep(Duration::from_millis(1050)).await;
    assert_eq!(harness.sent(), 1);

    harness.emit(result("95 cm", "80 cm", "98 cm"));
    sleep(Duration::from_millis(100)).await;
    assert_eq!(harness.sent(), 2);

    sleep(Duration::from_millis(1000)).await;
    assert_eq!(harness.sent(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_stop_cancels_ticks_and_late_result_applies() {
    let harness = Harness::start(config(200));
    harness.open_with_camera().await;

    harness.handle.toggle().unwrap();
    settle().await;
    assert_eq!(harness.sent(), 1);

    harness.handle.toggle().unwrap();
    settle().await;
    let view = harness.view();
    assert!(!view.running);
    assert!(view.video_visible);
    assert!(!view.image_visible);

    harness.emit(result("95 cm", "80 cm", "98 cm"));
    sleep(Duration::from_millis(2000)).await;
    assert_eq!(harness.sent(), 1);

    let view = harness.view();
    assert_eq!(view.measurements.chest, "95 cm");
    assert_eq!(view.measurements.waist, "80 cm");
    assert_eq!(view.measurements.hip, "98 cm");
    assert!(view.results_visible);
    assert!(!view.image_visible);

    // the late result cleared in flight, so a restart sends right away
    harness.handle.toggle().unwrap();
    settle().await;
    assert_eq!(harness.sent(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_processed_image_clears_in_flight() {
    let harness = Harness::start(config(100));
    harness.open_with_camera().await;
    harness.handle.toggle().unwrap();
    settle().await;

    // results carry no frame id, any result releases the frame in flight
    harness.emit(result("unrelated", "unrelated", "unrelated"));
    sleep(Duration::from_millis(105)).await;
    assert_eq!(harness.sent(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_remote_error_clears_in_flight() {
    let harness = Harness::start(config(100));
    harness.open_with_camera().await;
    harness.handle.toggle().unwrap();
    settle().await;

    harness.emit(ServerEvent::Error(RemoteError {
        message: "cannot identify image file".to_string(),
    }));
    sleep(Duration::from_millis(105)).await;

    assert_eq!(harness.sent(), 2);
    assert!(harness.view().running);
    assert!(harness.notices().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_while_running() {
    let harness = Harness::start(config(100));
    harness.open_with_camera().await;
    harness.handle.toggle().unwrap();
    settle().await;
    assert_eq!(harness.sent(), 1);

    harness.emit(ServerEvent::Disconnected {
        reason: "transport close".to_string(),
    });
    settle().await;

    let view = harness.view();
    assert!(!view.running);
    assert_eq!(view.status, ConnectionStatus::Disconnected);
    assert!(!view.analysis_enabled);
    assert!(view.video_visible);

    sleep(Duration::from_millis(1000)).await;
    assert_eq!(harness.sent(), 1);

    // no reconnect: analysis stays off
    harness.handle.toggle().unwrap();
    sleep(Duration::from_millis(1000)).await;
    assert_eq!(harness.sent(), 1);
    assert!(!harness.view().running);
    assert_eq!(harness.connects.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_two_results_at_500ms() {
    let harness = Harness::start(config(500));
    harness.open_with_camera().await;

    harness.handle.toggle().unwrap();
    let start = Instant::now();
    let views_before = harness.views().len();

    sleep_until(start + Duration::from_millis(100)).await;
    harness.emit(result("95 cm", "80 cm", "98 cm"));
    sleep_until(start + Duration::from_millis(650)).await;
    harness.emit(result("96 cm", "79 cm", "97 cm"));
    sleep_until(start + Duration::from_millis(700)).await;

    let view = harness.view();
    assert_eq!(view.measurements.chest, "96 cm");
    assert_eq!(view.measurements.waist, "79 cm");
    assert_eq!(view.measurements.hip, "97 cm");
    assert!(view.image_visible);
    assert_eq!(view.image.as_deref(), Some("data:image/jpeg;base64,96 cm"));
    assert!(view.results_visible);
    assert!(
        harness.views()[views_before..]
            .iter()
            .all(|view| !view.video_visible)
    );
    // eager frame at 0, tick at 500
    assert_eq!(harness.sent(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_camera_permission_denied() {
    let harness = Harness::start_with(
        config(100),
        HarnessOptions {
            deny_camera: true,
            ..Default::default()
        },
    );
    harness.open_with_camera().await;

    assert_eq!(harness.notices().len(), 1);
    assert!(harness.notices()[0].contains("Unable to access camera"));
    let view = harness.view();
    assert!(view.start_camera_enabled);
    assert!(!view.analysis_enabled);

    harness.handle.toggle().unwrap();
    sleep(Duration::from_millis(1000)).await;
    assert_eq!(harness.sent(), 0);
    assert!(!harness.view().running);
}

#[tokio::test(start_paused = true)]
async fn test_connect_failure() {
    let harness = Harness::start_with(
        config(100),
        HarnessOptions {
            fail_connect: true,
            ..Default::default()
        },
    );
    harness.open_with_camera().await;

    assert_eq!(harness.view().status, ConnectionStatus::Disconnected);
    assert!(harness.notices()[0].contains("Unable to connect"));

    harness.handle.toggle().unwrap();
    sleep(Duration::from_millis(500)).await;
    assert_eq!(harness.sent(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_stop_camera_stops_analysis() {
    let harness = Harness::start(config(100));
    harness.open_with_camera().await;
    harness.handle.toggle().unwrap();
    settle().await;
    harness.emit(result("95 cm", "80 cm", "98 cm"));
    settle().await;
    assert!(harness.view().results_visible);

    harness.handle.stop_camera().unwrap();
    settle().await;

    let view = harness.view();
    assert!(!view.running);
    assert!(view.start_camera_enabled);
    assert!(!view.analysis_enabled);
    assert!(!view.results_visible);
    assert_eq!(harness.camera_stops.load(Ordering::SeqCst), 1);

    sleep(Duration::from_millis(1000)).await;
    assert_eq!(harness.sent(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_connection_reused_across_sessions() {
    let harness = Harness::start(config(100));
    harness.open_with_camera().await;

    harness.handle.close().unwrap();
    settle().await;
    let view = harness.view();
    assert!(!view.open);
    assert!(!view.results_visible);
    assert!(view.start_camera_enabled);
    assert_eq!(harness.camera_stops.load(Ordering::SeqCst), 1);

    harness.open_with_camera().await;
    assert_eq!(harness.connects.load(Ordering::SeqCst), 1);
    let view = harness.view();
    assert!(view.open);
    assert_eq!(view.status, ConnectionStatus::Connected);
    assert!(view.analysis_enabled);

    harness.handle.toggle().unwrap();
    settle().await;
    assert_eq!(harness.sent(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_probe() {
    let harness = Harness::start(config(100));
    harness.handle.open().unwrap();
    settle().await;

    harness.handle.probe().unwrap();
    settle().await;
    assert_eq!(harness.sink.probes.load(Ordering::SeqCst), 1);

    let response = ProbeResponse {
        status: "success".to_string(),
        message: "backend ready".to_string(),
        timestamp: Some(1.0),
    };
    harness.emit(ServerEvent::ProbeResponse(response.clone()));
    settle().await;
    assert_eq!(harness.view().probe, Some(response));
}

#[tokio::test(start_paused = true)]
async fn test_probe_right_after_open() {
    let harness = Harness::start(config(100));

    // the channel is still connecting when the probe is handled
    harness.handle.open().unwrap();
    harness.handle.probe().unwrap();
    harness.handle.start_camera().unwrap();
    settle().await;

    assert_eq!(harness.sink.probes.load(Ordering::SeqCst), 1);
    assert!(harness.view().analysis_enabled);

    sleep(Duration::from_millis(1000)).await;
    assert_eq!(harness.sink.probes.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_probe_dropped_when_connect_fails() {
    let harness = Harness::start_with(
        config(100),
        HarnessOptions {
            fail_connect: true,
            ..Default::default()
        },
    );
    harness.handle.open().unwrap();
    harness.handle.probe().unwrap();
    settle().await;

    assert_eq!(harness.sink.probes.load(Ordering::SeqCst), 0);
    assert_eq!(harness.view().status, ConnectionStatus::Disconnected);
}

#[tokio::test(start_paused = true)]
async fn test_encode_failure_drops_tick() {
    let harness = Harness::start(config(100));
    harness.open_with_camera().await;
    harness.truncated_frames.store(true, Ordering::SeqCst);

    harness.handle.toggle().unwrap();
    settle().await;
    assert_eq!(harness.sent(), 0);
    assert!(harness.view().running);

    sleep(Duration::from_millis(150)).await;
    assert_eq!(harness.sent(), 0);

    // nothing was marked in flight, so the next tick sends
    harness.truncated_frames.store(false, Ordering::SeqCst);
    sleep(Duration::from_millis(100)).await;
    assert_eq!(harness.sent(), 1);

    sleep(Duration::from_millis(300)).await;
    assert_eq!(harness.sent(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_failed_send_not_in_flight() {
    let harness = Harness::start(config(100));
    harness.open_with_camera().await;
    harness.sink.refuse_sends.store(true, Ordering::SeqCst);

    harness.handle.toggle().unwrap();
    settle().await;
    sleep(Duration::from_millis(150)).await;
    assert_eq!(harness.sent(), 0);

    harness.sink.refuse_sends.store(false, Ordering::SeqCst);
    sleep(Duration::from_millis(100)).await;
    assert_eq!(harness.sent(), 1);

    sleep(Duration::from_millis(300)).await;
    assert_eq!(harness.sent(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_result_after_stop_camera_shows_panel() {
    let harness = Harness::start(config(100));
    harness.open_with_camera().await;
    harness.handle.toggle().unwrap();
    settle().await;
    assert_eq!(harness.sent(), 1);

    harness.handle.stop_camera().unwrap();
    settle().await;
    assert!(!harness.view().results_visible);

    harness.emit(result("91 cm", "77 cm", "96 cm"));
    settle().await;

    let view = harness.view();
    assert!(view.results_visible);
    assert!(!view.image_visible);
    assert_eq!(view.measurements.waist, "77 cm");
}

#[tokio::test(start_paused = true)]
async fn test_toggle_without_camera() {
    let harness = Harness::start(config(100));
    harness.handle.open().unwrap();
    settle().await;

    harness.handle.toggle().unwrap();
    sleep(Duration::from_millis(500)).await;

    assert_eq!(harness.sent(), 0);
    assert!(!harness.view().running);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown() {
    let harness = Harness::start(config(100));
    harness.open_with_camera().await;
    harness.handle.toggle().unwrap();
    settle().await;

    harness.handle.shutdown().unwrap();
    let Harness {
        handle,
        task,
        sink,
        camera_stops,
        ..
    } = harness;
    task.await.unwrap();

    assert!(sink.closed.load(Ordering::SeqCst));
    assert_eq!(camera_stops.load(Ordering::SeqCst), 1);
    assert_eq!(handle.toggle(), Err(SessionError::ControllerStopped));
}
