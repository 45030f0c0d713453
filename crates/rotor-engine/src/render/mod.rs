//! Frame recording.
//!
//! The renderer records a backend-agnostic command stream per frame and hands it
//! to the context's backend for execution.

mod cmd;
mod color;
mod renderer;

pub use cmd::{DrawCmd, FrameCommands};
pub use color::Color;
pub use renderer::{FrameMatrices, Projection, Renderer};
