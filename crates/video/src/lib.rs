//! Live camera capture for the measurement client.
//!
//! [`VideoIn`] drives a [`VideoInDevice`] on a blocking worker and keeps
//! only the most recent frame around: the feed is live, never recorded.

mod error;
pub use error::*;

mod videoframe;
pub use videoframe::*;

mod videoin;
pub use videoin::*;
