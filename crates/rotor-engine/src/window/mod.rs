//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop and Window and maps redraw requests onto frame loop
//! ticks.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig};
