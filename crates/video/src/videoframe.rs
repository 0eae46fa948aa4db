use image::Image;

#[derive(Debug, Clone)]
pub struct VideoFrame {
    pub image: Image,
    // counts up from 0 for every frame the worker captured since open
    pub sequence: u64,
}
