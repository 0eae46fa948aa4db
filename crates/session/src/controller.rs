use {
    crate::*,
    base::Epoch,
    com::{ComError, FramePayload, ProbeResponse, ProcessedResult, RemoteError, ServerEvent},
    futures_util::StreamExt,
    image::FrameEncoder,
    std::{mem, time::Duration},
    tokio::{
        sync::mpsc,
        task::JoinHandle,
        time::{Instant, MissedTickBehavior, interval_at},
    },
    video::VideoError,
};

// tokio intervals panic on a zero period
const MIN_INTERVAL: Duration = Duration::from_millis(1);

const CAMERA_ACCESS_NOTICE: &str =
    "Unable to access camera. Please ensure you have granted camera permissions.";

/// Everything the controller reacts to, in inbox order.
pub(crate) enum Event {
    // user and lifecycle
    Open,
    StartCamera,
    CameraStarted(Result<Box<dyn FrameSource>, VideoError>),
    StopCamera,
    Toggle,
    Probe,
    Close,
    Shutdown,
    // timer
    FrameDue { run: u64 },
    // channel
    ConnectionReady(Result<Box<dyn FrameSink>, ComError>),
    Connected { sid: String },
    Disconnected { reason: String },
    ResultReceived(ProcessedResult),
    RemoteError(RemoteError),
    ProbeAnswered(ProbeResponse),
}

impl From<ServerEvent> for Event {
    fn from(event: ServerEvent) -> Self {
        match event {
            ServerEvent::Connected { sid } => Event::Connected { sid },
            ServerEvent::Disconnected { reason } => Event::Disconnected { reason },
            ServerEvent::ProcessedImage(result) => Event::ResultReceived(result),
            ServerEvent::Error(error) => Event::RemoteError(error),
            ServerEvent::ProbeResponse(response) => Event::ProbeAnswered(response),
        }
    }
}

/// Cloneable front door of a running [`Controller`].
#[derive(Clone, Debug)]
pub struct ControllerHandle {
    inbox: mpsc::UnboundedSender<Event>,
}

impl ControllerHandle {
    fn post(&self, event: Event) -> Result<(), SessionError> {
        self.inbox
            .send(event)
            .map_err(|_| SessionError::ControllerStopped)
    }

    /// Open a session. Connects the channel the first time.
    pub fn open(&self) -> Result<(), SessionError> {
        self.post(Event::Open)
    }

    pub fn start_camera(&self) -> Result<(), SessionError> {
        self.post(Event::StartCamera)
    }

    pub fn stop_camera(&self) -> Result<(), SessionError> {
        self.post(Event::StopCamera)
    }

    /// Start analysis when idle, stop it when running.
    pub fn toggle(&self) -> Result<(), SessionError> {
        self.post(Event::Toggle)
    }

    /// Ask the server whether its backend is working.
    pub fn probe(&self) -> Result<(), SessionError> {
        self.post(Event::Probe)
    }

    /// Close the session, stopping camera and analysis. The channel stays up.
    pub fn close(&self) -> Result<(), SessionError> {
        self.post(Event::Close)
    }

    /// Close everything and end the controller task.
    pub fn shutdown(&self) -> Result<(), SessionError> {
        self.post(Event::Shutdown)
    }
}

enum ChannelState {
    Unopened,
    Connecting,
    Ready(Box<dyn FrameSink>),
    Lost,
}

/// The processing loop actor.
///
/// Owns the session, the channel, the frame encoder and the view. At most
/// one frame is in flight at any time; timer ticks that find one in flight
/// are dropped.
pub struct Controller<O, C, P> {
    config: ControllerConfig,
    opener: O,
    connector: C,
    presenter: P,
    encoder: FrameEncoder,
    inbox: mpsc::UnboundedReceiver<Event>,
    sender: mpsc::WeakUnboundedSender<Event>,
    session: Option<Session>,
    epoch: Epoch,
    channel: ChannelState,
    probe_pending: bool,
    view: View,
    presented: Option<View>,
}

impl<O: CameraOpener, C: Connector, P: Presenter> Controller<O, C, P> {
    pub fn new(
        config: ControllerConfig,
        opener: O,
        connector: C,
        presenter: P,
    ) -> (Self, ControllerHandle) {
        let (sender, inbox) = mpsc::unbounded_channel();
        let controller = Self {
            encoder: FrameEncoder::new(config.quality),
            config,
            opener,
            connector,
            presenter,
            inbox,
            sender: sender.downgrade(),
            session: None,
            epoch: Epoch::new(),
            channel: ChannelState::Unopened,
            probe_pending: false,
            view: View::default(),
            presented: None,
        };
        (controller, ControllerHandle { inbox: sender })
    }

    /// Create a controller and run it on its own task.
    pub fn spawn(
        config: ControllerConfig,
        opener: O,
        connector: C,
        presenter: P,
    ) -> (ControllerHandle, JoinHandle<()>) {
        let (controller, handle) = Self::new(config, opener, connector, presenter);
        (handle, tokio::spawn(controller.run()))
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    /// Process events until shutdown, or until nothing can post anymore.
    pub async fn run(mut self) {
        log::debug!("controller started");
        while let Some(event) = self.inbox.recv().await {
            let keep_going = self.handle(event);
            self.present();
            if !keep_going {
                break;
            }
        }
        self.teardown();
        self.present();
        log::debug!("controller stopped");
    }

    fn handle(&mut self, event: Event) -> bool {
        match event {
            Event::Open => self.on_open(),
            Event::StartCamera => self.on_start_camera(),
            Event::CameraStarted(result) => self.on_camera_started(result),
            Event::StopCamera => self.on_stop_camera(),
            Event::Toggle => self.on_toggle(),
            Event::Probe => self.on_probe(),
            Event::Close => self.on_close(),
            Event::Shutdown => return false,
            Event::FrameDue { run } => self.on_frame_due(run),
            Event::ConnectionReady(result) => self.on_connection_ready(result),
            Event::Connected { sid } => self.on_connected(sid),
            Event::Disconnected { reason } => self.on_disconnected(reason),
            Event::ResultReceived(result) => self.on_result(result),
            Event::RemoteError(error) => self.on_remote_error(error),
            Event::ProbeAnswered(response) => self.on_probe_answered(response),
        }
        true
    }

    fn present(&mut self) {
        if self.presented.as_ref() != Some(&self.view) {
            self.presenter.present(&self.view);
            self.presented = Some(self.view.clone());
        }
    }

    fn is_connected(&self) -> bool {
        match &self.channel {
            ChannelState::Ready(sink) => sink.is_connected(),
            _ => false,
        }
    }

    fn can_analyse(&self) -> bool {
        self.is_connected()
            && self
                .session
                .as_ref()
                .is_some_and(|session| session.has_camera())
    }

    fn refresh_analysis_enabled(&mut self) {
        self.view.analysis_enabled = self.can_analyse();
    }

    // a fresh panel keeps only what belongs to the page, not the session
    fn reset_view(&mut self, open: bool) {
        self.view = View {
            open,
            status: self.view.status,
            probe: self.view.probe.clone(),
            ..Default::default()
        };
    }

    fn on_open(&mut self) {
        if self.session.is_some() {
            log::debug!("session already open");
            return;
        }
        self.session = Some(Session::new(self.epoch.clone()));
        self.reset_view(true);
        match self.channel {
            ChannelState::Unopened => self.connect(),
            ChannelState::Lost => self.view.status = ConnectionStatus::Disconnected,
            ChannelState::Connecting | ChannelState::Ready(_) => {}
        }
    }

    fn connect(&mut self) {
        let Some(inbox) = self.sender.upgrade() else {
            return;
        };
        self.channel = ChannelState::Connecting;
        self.view.status = ConnectionStatus::Connecting;

        let connecting = self.connector.connect();
        tokio::spawn(async move {
            match connecting.await {
                Ok((sink, mut events)) => {
                    let ready = Event::ConnectionReady(Ok(Box::new(sink) as Box<dyn FrameSink>));
                    if inbox.send(ready).is_err() {
                        return;
                    }
                    while let Some(event) = events.next().await {
                        if inbox.send(Event::from(event)).is_err() {
                            break;
                        }
                    }
                }
                Err(error) => {
                    let _ = inbox.send(Event::ConnectionReady(Err(error)));
                }
            }
        });
    }

    fn on_connection_ready(&mut self, result: Result<Box<dyn FrameSink>, ComError>) {
        match result {
            Ok(sink) => {
                self.channel = ChannelState::Ready(sink);
                if mem::take(&mut self.probe_pending) {
                    self.on_probe();
                }
            }
            Err(error) => {
                log::error!("unable to connect: {}", error);
                if mem::take(&mut self.probe_pending) {
                    log::warn!("probe dropped, no connection");
                }
                self.channel = ChannelState::Lost;
                self.view.status = ConnectionStatus::Disconnected;
                self.presenter
                    .notice(&format!("Unable to connect to server: {error}"));
            }
        }
    }

    fn on_connected(&mut self, sid: String) {
        log::info!("connected to server ({})", sid);
        self.view.status = ConnectionStatus::Connected;
        self.refresh_analysis_enabled();
    }

    fn on_disconnected(&mut self, reason: String) {
        log::warn!("disconnected from server: {}", reason);
        self.channel = ChannelState::Lost;
        self.view.status = ConnectionStatus::Disconnected;
        if let Some(session) = self.session.as_mut() {
            session.stop_run();
            // nothing will answer it now
            session.clear_in_flight();
        }
        self.view.running = false;
        self.view.video_visible = true;
        self.view.image_visible = false;
        self.view.analysis_enabled = false;
    }

    fn on_start_camera(&mut self) {
        let Some(session) = self.session.as_mut() else {
            log::warn!("start camera without an open session");
            return;
        };
        if session.has_camera() || session.camera_pending() {
            log::debug!("camera already started");
            return;
        }
        let Some(inbox) = self.sender.upgrade() else {
            return;
        };
        session.set_camera_pending(true);

        let opening = self.opener.open();
        tokio::spawn(async move {
            let _ = inbox.send(Event::CameraStarted(opening.await));
        });
    }

    fn on_camera_started(&mut self, result: Result<Box<dyn FrameSource>, VideoError>) {
        let Some(session) = self.session.as_mut() else {
            // closed while the camera was opening
            if let Ok(mut source) = result {
                source.stop();
            }
            return;
        };
        session.set_camera_pending(false);
        match result {
            Ok(source) => {
                log::info!("camera started at {}", source.size());
                session.attach_camera(source);
                self.view.start_camera_enabled = false;
                self.view.video_visible = true;
                self.refresh_analysis_enabled();
            }
            Err(error) => {
                log::error!("error accessing camera: {}", error);
                self.view.start_camera_enabled = true;
                self.view.analysis_enabled = false;
                if error.is_acquisition_failure() {
                    self.presenter.notice(CAMERA_ACCESS_NOTICE);
                } else {
                    self.presenter.notice(&format!("Camera error: {error}"));
                }
            }
        }
    }

    fn on_stop_camera(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.stop_run();
        session.stop_camera();
        self.view.running = false;
        self.view.video_visible = true;
        self.view.image_visible = false;
        self.view.results_visible = false;
        self.view.start_camera_enabled = true;
        self.view.analysis_enabled = false;
        if self.view.status == ConnectionStatus::Processing {
            self.view.status = ConnectionStatus::Connected;
        }
    }

    fn on_toggle(&mut self) {
        let Some(running) = self.session.as_ref().map(Session::is_running) else {
            log::warn!("toggle without an open session");
            return;
        };

        if running {
            if let Some(session) = self.session.as_mut() {
                session.stop_run();
            }
            log::info!("analysis stopped");
            self.view.running = false;
            self.view.video_visible = true;
            self.view.image_visible = false;
            if self.view.status == ConnectionStatus::Processing {
                self.view.status = ConnectionStatus::Connected;
            }
            return;
        }

        if !self.can_analyse() {
            log::warn!("cannot start analysis: camera off or channel not connected");
            return;
        }
        let Some(inbox) = self.sender.upgrade() else {
            return;
        };
        let period = self.config.interval.max(MIN_INTERVAL);
        if let Some(session) = self.session.as_mut() {
            let run = session.start_run(|run| spawn_timer(inbox, period, run));
            log::info!("analysis started, run {} every {:?}", run, period);
        }
        self.view.running = true;
        self.view.video_visible = false;
        self.view.image_visible = true;

        // first frame goes out now, not one interval from now
        self.capture_and_send();
    }

    fn on_frame_due(&mut self, run: u64) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        if !session.is_running() || !session.epoch().is_current(run) {
            log::trace!("stale tick from run {}", run);
            return;
        }
        self.capture_and_send();
    }

    fn capture_and_send(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.is_in_flight() {
            log::debug!("tick dropped, frame in flight");
            return;
        }
        let Some(frame) = session
            .source()
            .filter(|source| source.is_active())
            .and_then(|source| source.snapshot())
        else {
            log::debug!("tick dropped, no frame");
            return;
        };
        let ChannelState::Ready(sink) = &self.channel else {
            log::debug!("tick dropped, channel not ready");
            return;
        };

        let data_uri = match self.encoder.encode(&frame.image) {
            Ok(data_uri) => data_uri,
            Err(error) => {
                log::warn!("unable to encode frame {}: {}", frame.sequence, error);
                return;
            }
        };
        match sink.send_frame(&FramePayload::new(data_uri)) {
            Ok(()) => {
                log::trace!(
                    "sent frame {} ({})",
                    frame.sequence,
                    self.encoder.canvas_size()
                );
                session.mark_in_flight(frame.sequence);
            }
            Err(error) => log::warn!("unable to send frame {}: {}", frame.sequence, error),
        }
    }

    fn on_result(&mut self, result: ProcessedResult) {
        let Some(session) = self.session.as_mut() else {
            log::debug!("result after the session closed");
            return;
        };
        match session.clear_in_flight() {
            Some(frame) if !session.is_running() || !frame.is_current(session.epoch()) => {
                log::debug!("late result for frame {}, applying anyway", frame.inner);
            }
            Some(_) => {}
            None => log::debug!("result without a frame in flight"),
        }
        let running = session.is_running();

        self.view.measurements = result.measurements;
        self.view.image = Some(result.image);
        self.view.image_visible = running;
        self.view.results_visible = true;
        if self.view.status != ConnectionStatus::Disconnected {
            self.view.status = ConnectionStatus::Processing;
        }
    }

    fn on_remote_error(&mut self, error: RemoteError) {
        log::warn!("error from server: {}", error.message);
        if let Some(session) = self.session.as_mut() {
            session.clear_in_flight();
        }
    }

    fn on_probe(&mut self) {
        let sink = match &self.channel {
            ChannelState::Ready(sink) => sink,
            // sent once the handshake completes
            ChannelState::Unopened | ChannelState::Connecting => {
                log::debug!("probe queued until connected");
                self.probe_pending = true;
                return;
            }
            ChannelState::Lost => {
                log::warn!("probe: channel not connected");
                return;
            }
        };
        if let Err(error) = sink.probe() {
            log::warn!("probe failed: {}", error);
        }
    }

    fn on_probe_answered(&mut self, response: ProbeResponse) {
        log::info!("probe answered: {} {}", response.status, response.message);
        self.view.probe = Some(response);
    }

    fn on_close(&mut self) {
        if self.session.take().is_none() {
            return;
        }
        log::info!("session closed");
        self.reset_view(false);
    }

    fn teardown(&mut self) {
        self.session.take();
        if let ChannelState::Ready(sink) = &self.channel {
            sink.close();
        }
        self.channel = ChannelState::Lost;
        self.reset_view(false);
    }
}

fn spawn_timer(inbox: mpsc::UnboundedSender<Event>, period: Duration, run: u64) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            if inbox.send(Event::FrameDue { run }).is_err() {
                break;
            }
        }
    })
}
