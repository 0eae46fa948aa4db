use {crate::*, base::Vec2, crates_image::ImageEncoder};

/// Map a 0.0..=1.0 quality fraction onto the JPEG 1..=100 scale.
pub fn jpeg_quality(fraction: f32) -> u8 {
    let fraction = if fraction.is_finite() { fraction } else { 1.0 };
    (fraction.clamp(0.0, 1.0) * 100.0).round().clamp(1.0, 100.0) as u8
}

pub fn rgb_to_jpeg(size: Vec2<usize>, data: &[u8], quality: u8) -> Result<Vec<u8>, ImageError> {
    let expected = size.area() * 3;
    if data.len() != expected {
        return Err(ImageError::BufferSize {
            expected,
            got: data.len(),
        });
    }
    if size.is_empty() {
        return Err(ImageError::Encode(format!("cannot encode empty frame {size}")));
    }

    let mut buffer = Vec::new();
    crates_image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100))
        .write_image(
            data,
            size.x as u32,
            size.y as u32,
            crates_image::ExtendedColorType::Rgb8,
        )
        .map_err(|e| ImageError::Encode(e.to_string()))?;
    Ok(buffer)
}
