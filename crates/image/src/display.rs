use base::Vec2;

/// Pack RGB pixels as `0x00RRGGBB` words for framebuffer windows.
pub fn rgb_to_u32(size: Vec2<usize>, data: &[u8]) -> Vec<u32> {
    let mut buf = Vec::with_capacity(size.area());
    for chunk in data.chunks_exact(3) {
        buf.push((chunk[0] as u32) << 16 | (chunk[1] as u32) << 8 | chunk[2] as u32);
    }
    buf
}
