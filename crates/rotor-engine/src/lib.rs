//! Rotor engine crate.
//!
//! A minimal real-time 3D harness: acquires a graphics context, uploads a static
//! triangle, builds a shader pipeline and spins the triangle once per host frame.
//! Rendering goes through the `device::Backend` seam, so the same harness runs on
//! wgpu in a window or on the in-memory headless backend.

pub mod core;
pub mod device;
pub mod geometry;
pub mod logging;
pub mod render;
pub mod shader;
pub mod time;
pub mod window;

pub use crate::core::{run_headless, FrameLoop, Harness, HeadlessConfig, HeadlessReport};
pub use crate::device::{RenderError, RenderResult};
