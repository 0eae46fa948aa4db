use {crate::*, base::Vec2};

/// Unpack YUYV 4:2:2 into `rgb`, replacing its contents.
pub fn yuyv_to_rgb_into(size: Vec2<usize>, data: &[u8], rgb: &mut Vec<u8>) {
    rgb.clear();
    rgb.reserve(size.area() * 3);
    for chunk in data.chunks_exact(4) {
        let (r0, g0, b0) = yuv_to_rgb(chunk[0], chunk[1], chunk[3]);
        let (r1, g1, b1) = yuv_to_rgb(chunk[2], chunk[1], chunk[3]);
        rgb.extend_from_slice(&[r0, g0, b0, r1, g1, b1]);
    }
}

pub fn yuyv_to_rgb(size: Vec2<usize>, data: &[u8]) -> Vec<u8> {
    let mut rgb = Vec::new();
    yuyv_to_rgb_into(size, data, &mut rgb);
    rgb
}

/// Decode compressed image bytes (JPEG or PNG) into an `Rgb8` image.
pub fn decode_image(bytes: &[u8]) -> Result<Image, ImageError> {
    let rgb = crates_image::load_from_memory(bytes)?.to_rgb8();
    let (width, height) = rgb.dimensions();
    Ok(Image::new(
        Vec2::new(width as usize, height as usize),
        rgb.into_raw(),
        PixelFormat::Rgb8,
    ))
}

pub fn jpeg_to_rgb(image: &Image) -> Result<Image, ImageError> {
    if image.format != PixelFormat::Jpeg {
        return Err(ImageError::Decode(format!(
            "expected Jpeg format, got {:?}",
            image.format
        )));
    }
    decode_image(&image.data)
}

/// Rasterise `image` into `canvas` as packed RGB, returning the size drawn.
///
/// The canvas is overwritten; nothing of the previous contents survives.
pub fn draw_rgb(image: &Image, canvas: &mut Vec<u8>) -> Result<Vec2<usize>, ImageError> {
    image.validate()?;
    match image.format {
        PixelFormat::Rgb8 => {
            canvas.clear();
            canvas.extend_from_slice(&image.data);
            Ok(image.size)
        }
        PixelFormat::Yuyv => {
            yuyv_to_rgb_into(image.size, &image.data, canvas);
            Ok(image.size)
        }
        PixelFormat::Jpeg => {
            let decoded = decode_image(&image.data)?;
            canvas.clear();
            canvas.extend_from_slice(&decoded.data);
            Ok(decoded.size)
        }
    }
}
