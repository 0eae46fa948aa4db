use {
    com::{Measurements, ProbeResponse},
    measure::{TerminalPresenter, render_line, wait_until_ready},
    session::{ConnectionStatus, Presenter, View},
    std::{
        io::{self, Write},
        sync::{Arc, Mutex},
        time::Duration,
    },
};

#[derive(Clone, Default)]
struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl SharedBuf {
    fn lines(&self) -> Vec<String> {
        String::from_utf8(self.0.lock().unwrap().clone())
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }
}

fn running_view() -> View {
    View {
        open: true,
        status: ConnectionStatus::Processing,
        video_visible: false,
        image_visible: true,
        image: Some("data:image/jpeg;base64,AAAA".to_string()),
        results_visible: true,
        measurements: Measurements {
            chest: "95.0 cm".to_string(),
            waist: "80.0 cm".to_string(),
            hip: "Not detected".to_string(),
            timestamp: None,
        },
        start_camera_enabled: false,
        analysis_enabled: true,
        running: true,
        probe: None,
    }
}

#[test]
fn test_render_closed() {
    assert_eq!(render_line(&View::default()), "[Connecting...] closed");
}

#[test]
fn test_render_running_verbatim_measurements() {
    assert_eq!(
        render_line(&running_view()),
        "[Processing] camera on | analysing | chest 95.0 cm | waist 80.0 cm | hip Not detected"
    );
}

#[test]
fn test_render_probe() {
    let view = View {
        open: true,
        status: ConnectionStatus::Connected,
        probe: Some(ProbeResponse {
            status: "success".to_string(),
            message: "ok".to_string(),
            timestamp: None,
        }),
        ..Default::default()
    };
    assert_eq!(render_line(&view), "[Connected] camera off | backend success");
}

#[test]
fn test_presenter_skips_repeated_lines() {
    let out = SharedBuf::default();
    let (mut presenter, screens) = TerminalPresenter::new(out.clone());

    let mut view = running_view();
    presenter.present(&view);
    // a new image alone does not change the line
    view.image = Some("data:image/jpeg;base64,BBBB".to_string());
    presenter.present(&view);

    assert_eq!(out.lines().len(), 1);
    assert_eq!(screens.borrow().view, view);
}

#[test]
fn test_presenter_notice() {
    let out = SharedBuf::default();
    let (mut presenter, screens) = TerminalPresenter::new(out.clone());

    presenter.notice("Unable to access camera.");

    assert_eq!(out.lines(), vec!["!! Unable to access camera.".to_string()]);
    assert_eq!(
        screens.borrow().notice.as_deref(),
        Some("Unable to access camera.")
    );
}

#[tokio::test]
async fn test_wait_until_ready_then_reuse_screens() {
    let (mut presenter, mut screens) = TerminalPresenter::new(SharedBuf::default());
    let waiting = tokio::spawn(async move {
        let ready = wait_until_ready(&mut screens, Duration::from_secs(5)).await;
        // the receiver stays usable after the wait
        let watcher = screens.clone();
        let running = screens.borrow().view.running;
        (ready, watcher.borrow().view.analysis_enabled, running)
    });

    presenter.present(&running_view());

    assert_eq!(waiting.await.unwrap(), (Some(true), true, true));
}

#[tokio::test]
async fn test_wait_until_ready_on_notice() {
    let (mut presenter, mut screens) = TerminalPresenter::new(SharedBuf::default());
    presenter.notice("Unable to access camera.");

    let ready = wait_until_ready(&mut screens, Duration::from_secs(5)).await;

    assert_eq!(ready, Some(false));
    assert!(screens.borrow().notice.is_some());
}

#[tokio::test]
async fn test_wait_until_ready_times_out() {
    let (_presenter, mut screens) = TerminalPresenter::new(SharedBuf::default());

    let ready = wait_until_ready(&mut screens, Duration::from_millis(20)).await;

    assert_eq!(ready, None);
}
