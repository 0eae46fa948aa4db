use {crate::*, base::Vec2};

/// A single frame or still, tagged with its pixel layout.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    pub size: Vec2<usize>,
    pub data: Vec<u8>,
    pub format: PixelFormat,
}

impl Image {
    pub fn new(size: Vec2<usize>, data: Vec<u8>, format: PixelFormat) -> Self {
        Self { size, data, format }
    }

    /// Check that the buffer holds exactly one frame of `size`.
    ///
    /// Compressed formats carry their own size, so only uncompressed
    /// layouts are checked.
    pub fn validate(&self) -> Result<(), ImageError> {
        let Some(bytes_per_pixel) = self.format.bytes_per_pixel() else {
            return Ok(());
        };
        let expected = self.size.area() * bytes_per_pixel;
        if self.data.len() != expected {
            return Err(ImageError::BufferSize {
                expected,
                got: self.data.len(),
            });
        }
        Ok(())
    }
}
