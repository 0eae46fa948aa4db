//! The processing loop: camera frames out, measurements back in.
//!
//! A [`Controller`] is a single actor task. User actions arrive through a
//! [`ControllerHandle`]; camera opens, channel events and timer ticks are
//! posted into the same inbox, so all session state is owned by one task.

mod config;
pub use config::*;

mod controller;
pub use controller::*;

mod error;
pub use error::*;

mod factories;
pub use factories::*;

mod session;
pub use session::*;

mod traits;
pub use traits::*;

mod view;
pub use view::*;
