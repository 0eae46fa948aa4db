//! In-process fakes for the camera, the channel and the screen.

#![allow(dead_code)]

use {
    base::Vec2,
    com::{ComError, FramePayload, ServerEvent},
    futures_util::{
        StreamExt,
        stream::{self, BoxStream},
    },
    image::{Image, PixelFormat},
    session::*,
    std::{
        future::Future,
        io,
        sync::{
            Arc, Mutex,
            atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
        },
    },
    tokio::{sync::mpsc, task::JoinHandle},
    video::{VideoError, VideoFrame},
};

pub const FRAME_SIZE: Vec2<usize> = Vec2 { x: 16, y: 8 };

pub struct FakeSource {
    active: bool,
    sequence: AtomicU64,
    stops: Arc<AtomicUsize>,
    truncated: Arc<AtomicBool>,
}

impl FrameSource for FakeSource {
    fn is_active(&self) -> bool {
        self.active
    }

    fn size(&self) -> Vec2<usize> {
        FRAME_SIZE
    }

    fn snapshot(&self) -> Option<VideoFrame> {
        if !self.active {
            return None;
        }
        // a truncated buffer cannot be encoded
        let len = if self.truncated.load(Ordering::SeqCst) {
            FRAME_SIZE.area()
        } else {
            FRAME_SIZE.area() * 3
        };
        Some(VideoFrame {
            image: Image::new(FRAME_SIZE, vec![128u8; len], PixelFormat::Rgb8),
            sequence: self.sequence.fetch_add(1, Ordering::SeqCst),
        })
    }

    fn stop(&mut self) {
        if self.active {
            self.active = false;
            self.stops.fetch_add(1, Ordering::SeqCst);
        }
    }
}

pub struct FakeOpener {
    deny: bool,
    stops: Arc<AtomicUsize>,
    truncated: Arc<AtomicBool>,
}

impl CameraOpener for FakeOpener {
    fn open(&self) -> impl Future<Output = Result<Box<dyn FrameSource>, VideoError>> + Send + 'static {
        let deny = self.deny;
        let stops = Arc::clone(&self.stops);
        let truncated = Arc::clone(&self.truncated);
        async move {
            if deny {
                return Err(VideoError::PermissionDenied("camera access denied".to_string()));
            }
            Ok(Box::new(FakeSource {
                active: true,
                sequence: AtomicU64::new(0),
                stops,
                truncated,
            }) as Box<dyn FrameSource>)
        }
    }
}

#[derive(Clone, Default)]
pub struct FakeSink {
    pub sent: Arc<Mutex<Vec<FramePayload>>>,
    pub probes: Arc<AtomicUsize>,
    pub closed: Arc<AtomicBool>,
    pub refuse_sends: Arc<AtomicBool>,
}

impl FrameSink for FakeSink {
    fn send_frame(&self, payload: &FramePayload) -> Result<(), ComError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(ComError::ConnectionClosed);
        }
        if self.refuse_sends.load(Ordering::SeqCst) {
            return Err(ComError::MessageTooLarge(payload.image.len()));
        }
        self.sent.lock().unwrap().push(payload.clone());
        Ok(())
    }

    fn probe(&self) -> Result<(), ComError> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        !self.closed.load(Ordering::SeqCst)
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

pub struct FakeConnector {
    sink: FakeSink,
    fail: bool,
    events: Mutex<Option<mpsc::UnboundedReceiver<ServerEvent>>>,
    connects: Arc<AtomicUsize>,
}

impl Connector for FakeConnector {
    type Sink = FakeSink;
    type Events = BoxStream<'static, ServerEvent>;

    fn connect(
        &self,
    ) -> impl Future<Output = Result<(FakeSink, Self::Events), ComError>> + Send + 'static {
        self.connects.fetch_add(1, Ordering::SeqCst);
        let sink = self.sink.clone();
        let events = self.events.lock().unwrap().take();
        let fail = self.fail;
        async move {
            if fail {
                return Err(ComError::Io(io::Error::new(
                    io::ErrorKind::ConnectionRefused,
                    "connection refused",
                )));
            }
            let events = events.ok_or(ComError::ConnectionClosed)?;
            let events = stream::unfold(events, |mut events| async move {
                events.recv().await.map(|event| (event, events))
            })
            .boxed();
            Ok((sink, events))
        }
    }
}

#[derive(Clone, Default)]
pub struct RecordingPresenter {
    pub views: Arc<Mutex<Vec<View>>>,
    pub notices: Arc<Mutex<Vec<String>>>,
}

impl Presenter for RecordingPresenter {
    fn present(&mut self, view: &View) {
        self.views.lock().unwrap().push(view.clone());
    }

    fn notice(&mut self, message: &str) {
        self.notices.lock().unwrap().push(message.to_string());
    }
}

#[derive(Default)]
pub struct HarnessOptions {
    pub deny_camera: bool,
    pub fail_connect: bool,
}

pub struct Harness {
    pub handle: ControllerHandle,
    pub server: mpsc::UnboundedSender<ServerEvent>,
    pub sink: FakeSink,
    pub presenter: RecordingPresenter,
    pub camera_stops: Arc<AtomicUsize>,
    pub truncated_frames: Arc<AtomicBool>,
    pub connects: Arc<AtomicUsize>,
    pub task: JoinHandle<()>,
}

impl Harness {
    pub fn start(config: ControllerConfig) -> Self {
        Self::start_with(config, HarnessOptions::default())
    }

    pub fn start_with(config: ControllerConfig, options: HarnessOptions) -> Self {
        let (server, events) = mpsc::unbounded_channel();
        let _ = server.send(ServerEvent::Connected {
            sid: "fake-sid".to_string(),
        });
        let sink = FakeSink::default();
        let camera_stops = Arc::new(AtomicUsize::new(0));
        let truncated_frames = Arc::new(AtomicBool::new(false));
        let connects = Arc::new(AtomicUsize::new(0));
        let presenter = RecordingPresenter::default();

        let opener = FakeOpener {
            deny: options.deny_camera,
            stops: Arc::clone(&camera_stops),
            truncated: Arc::clone(&truncated_frames),
        };
        let connector = FakeConnector {
            sink: sink.clone(),
            fail: options.fail_connect,
            events: Mutex::new(Some(events)),
            connects: Arc::clone(&connects),
        };
        let (handle, task) = Controller::spawn(config, opener, connector, presenter.clone());

        Self {
            handle,
            server,
            sink,
            presenter,
            camera_stops,
            truncated_frames,
            connects,
            task,
        }
    }

    /// Open a session and start the camera, and wait until both are up.
    pub async fn open_with_camera(&self) {
        self.handle.open().unwrap();
        self.handle.start_camera().unwrap();
        settle().await;
    }

    pub fn sent(&self) -> usize {
        self.sink.sent.lock().unwrap().len()
    }

    pub fn view(&self) -> View {
        self.presenter
            .views
            .lock()
            .unwrap()
            .last()
            .cloned()
            .unwrap_or_default()
    }

    pub fn views(&self) -> Vec<View> {
        self.presenter.views.lock().unwrap().clone()
    }

    pub fn notices(&self) -> Vec<String> {
        self.presenter.notices.lock().unwrap().clone()
    }

    pub fn emit(&self, event: ServerEvent) {
        self.server.send(event).unwrap();
    }
}

/// Let every spawned task run until it blocks, without moving the clock.
pub async fn settle() {
    for _ in 0..32 {
        tokio::task::yield_now().await;
    }
}
