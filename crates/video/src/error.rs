use std::{fmt, io};

#[derive(Debug)]
pub enum VideoError {
    PermissionDenied(String),
    DeviceUnavailable(String),
    Device(String),
    Stream(String),
    Decode(image::ImageError),
}

impl VideoError {
    /// True when the camera could not be acquired at all, as opposed to
    /// failing after it was opened.
    pub fn is_acquisition_failure(&self) -> bool {
        matches!(
            self,
            VideoError::PermissionDenied(_) | VideoError::DeviceUnavailable(_)
        )
    }
}

impl fmt::Display for VideoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VideoError::PermissionDenied(msg) => write!(f, "camera permission denied: {msg}"),
            VideoError::DeviceUnavailable(msg) => write!(f, "camera unavailable: {msg}"),
            VideoError::Device(msg) => write!(f, "device error: {msg}"),
            VideoError::Stream(msg) => write!(f, "stream error: {msg}"),
            VideoError::Decode(err) => write!(f, "decode error: {err}"),
        }
    }
}

impl std::error::Error for VideoError {}

impl From<io::Error> for VideoError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::PermissionDenied => VideoError::PermissionDenied(err.to_string()),
            io::ErrorKind::NotFound => VideoError::DeviceUnavailable(err.to_string()),
            _ => VideoError::Device(err.to_string()),
        }
    }
}

impl From<image::ImageError> for VideoError {
    fn from(err: image::ImageError) -> Self {
        VideoError::Decode(err)
    }
}
