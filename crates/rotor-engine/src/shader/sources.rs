//! Default WGSL sources for the triangle pipeline.
//!
//! Hosts may pass their own sources instead; any pair that declares the four
//! required inputs links.

/// Vertex stage: transforms `aVertexPosition` by `uPMatrix * uMVMatrix` and passes
/// `aVertexColor` through at `@location(0)`.
pub const BASIC_VERTEX_SHADER: &str = include_str!("shaders/basic.vert.wgsl");

/// Fragment stage: outputs the interpolated vertex color.
pub const BASIC_FRAGMENT_SHADER: &str = include_str!("shaders/basic.frag.wgsl");
