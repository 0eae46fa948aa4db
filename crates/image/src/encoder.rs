use {crate::*, base::Vec2};

pub const DEFAULT_QUALITY: f32 = 0.8;

/// Turns camera frames into JPEG data URIs.
///
/// Every call draws the frame onto one shared off-screen canvas sized to the
/// frame's native dimensions, so the previous frame's pixels do not survive
/// an `encode`.
#[derive(Debug)]
pub struct FrameEncoder {
    quality: f32,
    canvas: Vec<u8>,
    canvas_size: Vec2<usize>,
}

impl Default for FrameEncoder {
    fn default() -> Self {
        Self::new(DEFAULT_QUALITY)
    }
}

impl FrameEncoder {
    pub fn new(quality: f32) -> Self {
        Self {
            quality,
            canvas: Vec::new(),
            canvas_size: Vec2::zero(),
        }
    }

    pub fn quality(&self) -> f32 {
        self.quality
    }

    pub fn set_quality(&mut self, quality: f32) {
        self.quality = quality;
    }

    /// Size of the canvas after the last successful draw.
    pub fn canvas_size(&self) -> Vec2<usize> {
        self.canvas_size
    }

    pub fn canvas(&self) -> &[u8] {
        &self.canvas
    }

    /// Encode `frame` as a `data:image/jpeg;base64,...` URI.
    pub fn encode(&mut self, frame: &Image) -> Result<String, ImageError> {
        self.canvas_size = Vec2::zero();
        let size = draw_rgb(frame, &mut self.canvas)?;
        self.canvas_size = size;
        let jpeg = rgb_to_jpeg(size, &self.canvas, jpeg_quality(self.quality))?;
        Ok(encode_data_uri(JPEG_MIME, &jpeg))
    }
}
