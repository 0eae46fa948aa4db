use {
    crate::*,
    base::Vec2,
    image::{Image, PixelFormat},
    std::time::Duration,
};

const DEFAULT_FRAME_RATE: f32 = 30.0;

/// Synthetic camera: a diagonal gradient that scrolls one step per frame.
#[derive(Debug, Clone)]
pub struct PatternConfig {
    pub size: Option<Vec2<usize>>,
    pub frame_rate: Option<f32>,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            size: Some(IDEAL_SIZE),
            frame_rate: Some(DEFAULT_FRAME_RATE),
        }
    }
}

pub(crate) struct Pattern {
    open: bool,
    size: Vec2<usize>,
    period: Duration,
    offset: usize,
}

impl Pattern {
    pub fn new() -> Self {
        Self {
            open: false,
            size: Vec2::zero(),
            period: Duration::ZERO,
            offset: 0,
        }
    }

    fn render(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(self.size.area() * 3);
        for y in 0..self.size.y {
            for x in 0..self.size.x {
                let v = ((x + y + self.offset) & 0xFF) as u8;
                data.extend_from_slice(&[v, 255 - v, (y & 0xFF) as u8]);
            }
        }
        data
    }
}

impl VideoInDevice for Pattern {
    fn open(&mut self, config: &VideoInConfig) -> Result<VideoInConfig, VideoError> {
        #[allow(irrefutable_let_patterns)]
        let VideoInConfig::Pattern(config) = config else {
            return Err(VideoError::Device(
                "Pattern::open should be called with VideoInConfig::Pattern".to_string(),
            ));
        };

        let size = config.size.unwrap_or(IDEAL_SIZE);
        if size.is_empty() {
            return Err(VideoError::Device(format!("invalid pattern size {size}")));
        }
        let frame_rate = config.frame_rate.unwrap_or(DEFAULT_FRAME_RATE);
        // zero, negative, NaN and subnormal rates have no finite period
        let period = Duration::try_from_secs_f32(1.0 / frame_rate).map_err(|_| {
            VideoError::Device(format!("invalid pattern frame rate {frame_rate}"))
        })?;

        self.size = size;
        self.period = period;
        self.open = true;
        Ok(VideoInConfig::Pattern(PatternConfig {
            size: Some(size),
            frame_rate: Some(frame_rate),
        }))
    }

    fn close(&mut self) {
        self.open = false;
    }

    fn blocking_capture(&mut self) -> Result<Image, VideoError> {
        if !self.open {
            return Err(VideoError::Stream("No stream".to_string()));
        }
        std::thread::sleep(self.period);
        let image = Image::new(self.size, self.render(), PixelFormat::Rgb8);
        self.offset = self.offset.wrapping_add(1);
        Ok(image)
    }
}
