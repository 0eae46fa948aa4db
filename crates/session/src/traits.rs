use {
    base::Vec2,
    com::{ChannelSender, ComError, FramePayload, ServerEvent},
    futures_core::Stream,
    std::future::Future,
    video::{VideoError, VideoFrame, VideoIn},
};

/// A live camera feed as the controller sees it.
pub trait FrameSource: Send {
    fn is_active(&self) -> bool;
    /// Size of the frames currently delivered.
    fn size(&self) -> Vec2<usize>;
    /// The most recent frame, if any.
    fn snapshot(&self) -> Option<VideoFrame>;
    /// Release the device. Must be idempotent.
    fn stop(&mut self);
}

/// Where encoded frames go.
pub trait FrameSink: Send + Sync {
    /// Fire-and-forget send of one frame.
    fn send_frame(&self, payload: &FramePayload) -> Result<(), ComError>;
    fn probe(&self) -> Result<(), ComError>;
    fn is_connected(&self) -> bool;
    fn close(&self);
}

/// Opens the camera, off the actor task.
pub trait CameraOpener: Send + Sync + 'static {
    fn open(&self) -> impl Future<Output = Result<Box<dyn FrameSource>, VideoError>> + Send + 'static;
}

/// Opens the channel, off the actor task.
pub trait Connector: Send + Sync + 'static {
    type Sink: FrameSink + 'static;
    type Events: Stream<Item = ServerEvent> + Send + Unpin + 'static;

    fn connect(
        &self,
    ) -> impl Future<Output = Result<(Self::Sink, Self::Events), ComError>> + Send + 'static;
}

impl FrameSource for VideoIn {
    fn is_active(&self) -> bool {
        VideoIn::is_active(self)
    }

    fn size(&self) -> Vec2<usize> {
        VideoIn::size(self)
    }

    fn snapshot(&self) -> Option<VideoFrame> {
        self.latest()
    }

    fn stop(&mut self) {
        VideoIn::stop(self)
    }
}

impl FrameSink for ChannelSender {
    fn send_frame(&self, payload: &FramePayload) -> Result<(), ComError> {
        ChannelSender::send_frame(self, payload)
    }

    fn probe(&self) -> Result<(), ComError> {
        ChannelSender::probe(self)
    }

    fn is_connected(&self) -> bool {
        ChannelSender::is_connected(self)
    }

    fn close(&self) {
        ChannelSender::close(self)
    }
}
