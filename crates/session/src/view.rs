use com::{Measurements, ProbeResponse};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connecting,
    Connected,
    Processing,
    Disconnected,
}

impl ConnectionStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ConnectionStatus::Connecting => "Connecting...",
            ConnectionStatus::Connected => "Connected",
            ConnectionStatus::Processing => "Processing",
            ConnectionStatus::Disconnected => "Disconnected",
        }
    }
}

/// Everything a presenter needs to draw the measurement panel.
#[derive(Debug, Clone, PartialEq)]
pub struct View {
    /// A session is open.
    pub open: bool,
    pub status: ConnectionStatus,
    /// The live camera surface.
    pub video_visible: bool,
    /// The processed image surface.
    pub image_visible: bool,
    /// Latest processed image, as a data URI.
    pub image: Option<String>,
    pub results_visible: bool,
    pub measurements: Measurements,
    pub start_camera_enabled: bool,
    pub analysis_enabled: bool,
    pub running: bool,
    pub probe: Option<ProbeResponse>,
}

impl Default for View {
    fn default() -> Self {
        Self {
            open: false,
            status: ConnectionStatus::Connecting,
            video_visible: true,
            image_visible: false,
            image: None,
            results_visible: false,
            measurements: Measurements::default(),
            start_camera_enabled: true,
            analysis_enabled: false,
            running: false,
            probe: None,
        }
    }
}

impl View {
    /// Label of the analysis toggle.
    pub fn analysis_label(&self) -> &'static str {
        if self.running {
            "Stop Real-Time Analysis"
        } else {
            "Start Real-Time Analysis"
        }
    }
}

/// Renders [`View`]s.
pub trait Presenter: Send + 'static {
    /// Called after every change.
    fn present(&mut self, view: &View);
    /// A blocking notice the user has to see, e.g. camera access failed.
    fn notice(&mut self, message: &str);
}

/// Logs view transitions.
#[derive(Debug, Default)]
pub struct LogPresenter {
    last: Option<View>,
}

impl LogPresenter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Presenter for LogPresenter {
    fn present(&mut self, view: &View) {
        let last = self.last.take().unwrap_or_default();
        if last.open != view.open {
            log::info!("session {}", if view.open { "opened" } else { "closed" });
        }
        if last.status != view.status {
            log::info!("status: {}", view.status.label());
        }
        if last.start_camera_enabled != view.start_camera_enabled {
            log::info!(
                "camera {}",
                if view.start_camera_enabled { "off" } else { "on" }
            );
        }
        if last.running != view.running {
            log::info!("analysis {}", if view.running { "running" } else { "stopped" });
        }
        if last.measurements != view.measurements {
            log::info!(
                "chest {}, waist {}, hip {}",
                view.measurements.chest,
                view.measurements.waist,
                view.measurements.hip
            );
        }
        if last.probe != view.probe {
            if let Some(probe) = &view.probe {
                log::info!("backend {}: {}", probe.status, probe.message);
            }
        }
        self.last = Some(view.clone());
    }

    fn notice(&mut self, message: &str) {
        log::warn!("{}", message);
    }
}
