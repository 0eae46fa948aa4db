//! Pieces of the `measure` client that do not need a terminal or a window.

mod cli;
pub use cli::*;

mod terminal;
pub use terminal::*;

#[cfg(feature = "window")]
pub mod window;
