//! Socket.IO channel to the remote measurement processor.
//!
//! One [`Channel`] is one Engine.IO v4 WebSocket session carrying Socket.IO v5
//! events on the default namespace. Frames go out through a cloneable
//! [`ChannelSender`], everything the server says comes back through
//! [`ChannelEvents`].

mod channel;
pub use channel::*;

mod config;
pub use config::*;

mod error;
pub use error::*;

mod events;
pub use events::*;

pub mod packet;
