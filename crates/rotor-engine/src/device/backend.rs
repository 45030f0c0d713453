//! Backend seam: the drawable surface capability and the object that executes
//! recorded frames on a real or simulated GPU.

use std::fmt;

use crate::render::{Color, FrameCommands};

use super::error::RenderResult;

/// Handle to a static vertex buffer owned by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(pub(crate) u32);

/// Handle to a linked program owned by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramId(pub(crate) u32);

/// Vertex attribute slot (`@location(n)` in WGSL).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttribLocation(pub u32);

/// Uniform slot (`@group(g) @binding(b)` in WGSL).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UniformLocation {
    pub group: u32,
    pub binding: u32,
}

impl fmt::Display for UniformLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@group({}) @binding({})", self.group, self.binding)
    }
}

/// Which context request produced a backend.
///
/// `Primary` is tried first; `Compatibility` is the fallback identifier used when the
/// primary request is refused.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ContextKind {
    Primary,
    Compatibility,
}

impl ContextKind {
    /// Request order used by context acquisition.
    pub const REQUEST_ORDER: [ContextKind; 2] = [ContextKind::Primary, ContextKind::Compatibility];

    pub const fn name(self) -> &'static str {
        match self {
            ContextKind::Primary => "primary",
            ContextKind::Compatibility => "compatibility",
        }
    }
}

/// Drawable surface handed over by the windowing layer.
pub trait Surface {
    type Backend: Backend;

    /// Current drawable width in physical pixels.
    fn width(&self) -> u32;

    /// Current drawable height in physical pixels.
    fn height(&self) -> u32;

    /// Attempts to create a context of the requested kind.
    ///
    /// `None` means this kind is unavailable on the surface; the caller may try the
    /// next kind.
    fn get_context(&self, kind: ContextKind) -> Option<Self::Backend>;
}

/// Vertex input the linked program reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveAttribute {
    pub name: String,
    pub location: AttribLocation,
    /// Components declared by the shader (1 for scalars, 2..=4 for vectors).
    pub components: u32,
}

/// Uniform the linked program reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveUniform {
    pub name: String,
    pub location: UniformLocation,
    /// Size of the uniform in bytes.
    pub size: u32,
}

/// One validated shader stage.
#[derive(Debug, Clone, Copy)]
pub struct StageSource<'a> {
    pub source: &'a str,
    pub entry_point: &'a str,
}

/// Everything a backend needs to realize a linked program.
///
/// Attributes listed here are enabled for per-vertex supply when the program is
/// created, not per frame.
#[derive(Debug, Clone, Copy)]
pub struct ProgramDesc<'a> {
    pub label: &'a str,
    pub vertex: StageSource<'a>,
    pub fragment: StageSource<'a>,
    pub attributes: &'a [ActiveAttribute],
    pub uniforms: &'a [ActiveUniform],
}

/// Result of presenting one frame.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PresentOutcome {
    /// The frame reached the surface.
    Presented,
    /// Transient condition; the frame was dropped and the next one may succeed.
    Skipped,
    /// The surface or device is gone; the loop should stop.
    Lost,
}

/// Low-level rendering backend.
///
/// A backend is affine to the thread that created it. All handles it returns are
/// only meaningful to that backend instance.
pub trait Backend {
    /// Enables depth testing for every subsequent draw.
    fn enable_depth_test(&mut self);

    /// Sets the color used by `DrawCmd::Clear`.
    fn set_clear_color(&mut self, color: Color);

    /// Allocates a write-once vertex buffer holding `data`.
    fn create_vertex_buffer(&mut self, label: &str, data: &[f32]) -> RenderResult<BufferId>;

    /// Realizes a program whose stages already compiled and linked.
    fn create_program(&mut self, desc: &ProgramDesc<'_>) -> RenderResult<ProgramId>;

    /// Executes one recorded frame and presents it.
    ///
    /// Unknown handles inside `frame` are programmer errors and panic.
    fn submit(&mut self, frame: &FrameCommands) -> PresentOutcome;
}
