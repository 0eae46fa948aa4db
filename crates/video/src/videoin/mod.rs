use {
    crate::*,
    base::Vec2,
    std::{
        sync::{
            Arc,
            atomic::{AtomicBool, Ordering},
        },
        time::Duration,
    },
    tokio::{
        sync::{oneshot, watch},
        task::{JoinHandle, spawn_blocking},
        time::timeout,
    },
};

// preferred capture size, devices may negotiate something else
pub const IDEAL_SIZE: Vec2<usize> = Vec2 { x: 1280, y: 720 };

// delay before reconnecting after failure
const WAIT_BEFORE_RECONNECT_MS: u64 = 100;

// how long open() waits for the first frame
const FIRST_FRAME_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub enum VideoInConfig {
    Pattern(pattern::PatternConfig),
    #[cfg(feature = "v4l2")]
    V4l2(v4l2::V4l2Config),
}

impl Default for VideoInConfig {
    fn default() -> Self {
        #[cfg(feature = "v4l2")]
        return VideoInConfig::V4l2(v4l2::V4l2Config::default());
        #[cfg(not(feature = "v4l2"))]
        return VideoInConfig::Pattern(pattern::PatternConfig::default());
    }
}

impl VideoInConfig {
    pub fn size(&self) -> Option<Vec2<usize>> {
        match self {
            VideoInConfig::Pattern(config) => config.size,
            #[cfg(feature = "v4l2")]
            VideoInConfig::V4l2(config) => config.size,
        }
    }

    pub fn frame_rate(&self) -> Option<f32> {
        match self {
            VideoInConfig::Pattern(config) => config.frame_rate,
            #[cfg(feature = "v4l2")]
            VideoInConfig::V4l2(config) => config.frame_rate,
        }
    }
}

/// A camera backend.
///
/// All three methods are called from the same blocking worker thread.
pub trait VideoInDevice: Send {
    /// Open the device, returning the configuration that was actually set.
    fn open(&mut self, config: &VideoInConfig) -> Result<VideoInConfig, VideoError>;
    /// Close the device, if open.
    fn close(&mut self);
    /// Block until the next frame is available.
    fn blocking_capture(&mut self) -> Result<image::Image, VideoError>;
}

/// A live video feed.
pub struct VideoIn {
    receiver: watch::Receiver<Option<VideoFrame>>,
    cancel: Arc<AtomicBool>,
    size: Vec2<usize>,
    frame_rate: f32,
    join_handle: Option<JoinHandle<()>>,
}

impl VideoIn {
    fn create_device(config: &VideoInConfig) -> Box<dyn VideoInDevice> {
        match config {
            VideoInConfig::Pattern(_) => Box::new(pattern::Pattern::new()),
            #[cfg(feature = "v4l2")]
            VideoInConfig::V4l2(_) => Box::new(v4l2::V4l2::new()),
        }
    }

    fn spawn_worker(
        mut device: Box<dyn VideoInDevice>,
        mut config: VideoInConfig,
        sender: watch::Sender<Option<VideoFrame>>,
        cancel: Arc<AtomicBool>,
        init_tx: oneshot::Sender<Result<VideoInConfig, VideoError>>,
    ) -> JoinHandle<()> {
        spawn_blocking(move || {
            // open on the worker thread, some backends are thread affine
            match device.open(&config) {
                Ok(actual) => {
                    config = actual.clone();
                    let _ = init_tx.send(Ok(actual));
                }
                Err(error) => {
                    let _ = init_tx.send(Err(error));
                    return;
                }
            }

            let mut sequence = 0u64;
            while !cancel.load(Ordering::Relaxed) {
                log::debug!("video worker: starting capture loop");
                while !cancel.load(Ordering::Relaxed) {
                    match device.blocking_capture() {
                        Ok(image) => {
                            let frame = VideoFrame { image, sequence };
                            sequence += 1;
                            if sender.send(Some(frame)).is_err() {
                                // VideoIn was dropped
                                device.close();
                                return;
                            }
                        }
                        Err(error) => {
                            log::error!("video worker: capture failed: {}", error);
                            break;
                        }
                    }
                }

                // close, wait, and reopen the device
                while !cancel.load(Ordering::Relaxed) {
                    log::info!("video worker: reconnecting...");
                    device.close();
                    std::thread::sleep(Duration::from_millis(WAIT_BEFORE_RECONNECT_MS));
                    if let Ok(reopened) = device.open(&config) {
                        config = reopened;
                        break;
                    }
                }
            }
            device.close();
            log::debug!("video worker: stopped");
        })
    }

    /// Open the backend described by `config`.
    pub async fn open(config: VideoInConfig) -> Result<Self, VideoError> {
        let device = Self::create_device(&config);
        Self::open_device(device, config).await
    }

    /// Open a caller-supplied backend.
    ///
    /// Returns once the device is open and its first frame has arrived.
    pub async fn open_device(
        device: Box<dyn VideoInDevice>,
        config: VideoInConfig,
    ) -> Result<Self, VideoError> {
        let (sender, mut receiver) = watch::channel::<Option<VideoFrame>>(None);
        let (init_tx, init_rx) = oneshot::channel();
        let cancel = Arc::new(AtomicBool::new(false));

        let join_handle =
            Self::spawn_worker(device, config, sender, Arc::clone(&cancel), init_tx);

        let config = init_rx
            .await
            .map_err(|_| VideoError::Device("worker thread died during init".to_string()))??;

        let first_frame = timeout(FIRST_FRAME_TIMEOUT, receiver.changed()).await;
        match first_frame {
            Ok(Ok(())) => {}
            Ok(Err(_)) => {
                return Err(VideoError::Stream(
                    "worker stopped before the first frame".to_string(),
                ));
            }
            Err(_) => {
                cancel.store(true, Ordering::Relaxed);
                return Err(VideoError::Stream("no frame from camera".to_string()));
            }
        }

        let size = config.size().unwrap_or(IDEAL_SIZE);
        let frame_rate = config.frame_rate().unwrap_or(0.0);
        log::info!("camera open: {} at {} fps", size, frame_rate);

        Ok(Self {
            receiver,
            cancel,
            size,
            frame_rate,
            join_handle: Some(join_handle),
        })
    }

    /// Negotiated capture size.
    pub fn size(&self) -> Vec2<usize> {
        self.size
    }

    pub fn frame_rate(&self) -> f32 {
        self.frame_rate
    }

    pub fn is_active(&self) -> bool {
        self.join_handle.is_some()
    }

    /// The most recent frame, or `None` once stopped.
    pub fn latest(&self) -> Option<VideoFrame> {
        if !self.is_active() {
            return None;
        }
        self.receiver.borrow().clone()
    }

    /// Stop capturing and release the device. Safe to call repeatedly.
    pub fn stop(&mut self) {
        self.cancel.store(true, Ordering::Relaxed);
        // the worker notices the flag after its current capture returns
        if self.join_handle.take().is_some() {
            log::info!("camera stopped");
        }
    }
}

impl Drop for VideoIn {
    fn drop(&mut self) {
        self.stop();
    }
}

pub mod pattern;

#[cfg(feature = "v4l2")]
pub mod v4l2;
