use {image::DEFAULT_QUALITY, std::time::Duration};

pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Time between frame ticks while analysis runs.
    pub interval: Duration,
    /// JPEG quality in `0.0..=1.0`.
    pub quality: f32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            quality: DEFAULT_QUALITY,
        }
    }
}

impl ControllerConfig {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_quality(mut self, quality: f32) -> Self {
        self.quality = quality;
        self
    }
}
