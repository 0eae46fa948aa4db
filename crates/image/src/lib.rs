//! Frame encoding for the measurement client.
//!
//! Camera frames arrive as [`Image`]s in one of a few pixel formats. The
//! [`FrameEncoder`] rasterises them onto an off-screen RGB canvas and turns
//! the canvas into a JPEG data URI ready to be sent to the processor.
//! The processed images coming back are data URIs as well, and can be
//! decoded with [`decode_data_uri`] and [`decode_image`].

mod datauri;
pub use datauri::*;

mod display;
pub use display::*;

mod encoder;
pub use encoder::*;

mod error;
pub use error::*;

mod image;
pub use image::*;

mod jpeg;
pub use jpeg::*;

mod pixelformat;
pub use pixelformat::*;

mod rgb;
pub use rgb::*;
