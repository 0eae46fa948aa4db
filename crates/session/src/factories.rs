use {
    crate::*,
    com::{Channel, ChannelConfig, ChannelEvents, ChannelSender, ComError},
    std::future::Future,
    video::{VideoError, VideoIn, VideoInConfig},
};

/// Opens a [`VideoIn`] with a fixed configuration.
#[derive(Debug, Clone, Default)]
pub struct VideoOpener {
    config: VideoInConfig,
}

impl VideoOpener {
    pub fn new(config: VideoInConfig) -> Self {
        Self { config }
    }
}

impl CameraOpener for VideoOpener {
    fn open(&self) -> impl Future<Output = Result<Box<dyn FrameSource>, VideoError>> + Send + 'static {
        let config = self.config.clone();
        async move {
            let video = VideoIn::open(config).await?;
            Ok(Box::new(video) as Box<dyn FrameSource>)
        }
    }
}

/// Connects a Socket.IO [`Channel`].
#[derive(Debug, Clone, Default)]
pub struct ChannelConnector {
    config: ChannelConfig,
}

impl ChannelConnector {
    pub fn new(config: ChannelConfig) -> Self {
        Self { config }
    }
}

impl Connector for ChannelConnector {
    type Sink = ChannelSender;
    type Events = ChannelEvents;

    fn connect(
        &self,
    ) -> impl Future<Output = Result<(ChannelSender, ChannelEvents), ComError>> + Send + 'static {
        let config = self.config.clone();
        async move { Channel::connect(&config).await }
    }
}
