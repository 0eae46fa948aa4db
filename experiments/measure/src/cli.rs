use {
    base::Vec2,
    clap::Parser,
    com::ChannelConfig,
    session::ControllerConfig,
    std::{path::PathBuf, time::Duration},
    video::{VideoInConfig, pattern::PatternConfig},
};

pub const PATTERN_DEVICE: &str = "pattern";

/// Stream camera frames to a body measurement server and show the results.
#[derive(Debug, Parser)]
#[command(name = "measure", version)]
pub struct Cli {
    /// Socket.IO server to stream to.
    #[arg(long, default_value = com::DEFAULT_URL)]
    pub server: String,

    /// Time between frames while analysis runs.
    #[arg(long, default_value_t = 500)]
    pub interval_ms: u64,

    /// JPEG quality, 0.0 to 1.0.
    #[arg(long, default_value_t = image::DEFAULT_QUALITY)]
    pub quality: f32,

    #[arg(long, default_value_t = 1280)]
    pub width: usize,

    #[arg(long, default_value_t = 720)]
    pub height: usize,

    /// Camera to use: `pattern`, or a V4L2 device path.
    #[arg(long)]
    pub device: Option<String>,

    /// Write logs to daily files in this directory instead of stdout.
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    /// Stop after this many seconds.
    #[arg(long)]
    pub duration_secs: Option<u64>,

    /// Ask the server whether its backend works before starting.
    #[arg(long)]
    pub probe: bool,
}

impl Cli {
    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig::default()
            .with_interval(Duration::from_millis(self.interval_ms))
            .with_quality(self.quality)
    }

    pub fn channel_config(&self) -> ChannelConfig {
        ChannelConfig::new(self.server.clone())
    }

    pub fn size(&self) -> Vec2<usize> {
        Vec2::new(self.width, self.height)
    }

    pub fn duration(&self) -> Option<Duration> {
        self.duration_secs.map(Duration::from_secs)
    }

    pub fn video_config(&self) -> anyhow::Result<VideoInConfig> {
        let pattern = VideoInConfig::Pattern(PatternConfig {
            size: Some(self.size()),
            ..Default::default()
        });
        match self.device.as_deref() {
            None | Some(PATTERN_DEVICE) => Ok(pattern),
            #[cfg(feature = "v4l2")]
            Some(path) => Ok(VideoInConfig::V4l2(video::v4l2::V4l2Config {
                path: Some(path.into()),
                size: Some(self.size()),
                ..Default::default()
            })),
            #[cfg(not(feature = "v4l2"))]
            Some(path) => anyhow::bail!(
                "camera device {path} needs the v4l2 feature, use --device {PATTERN_DEVICE}"
            ),
        }
    }
}
