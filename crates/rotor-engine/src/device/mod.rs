//! Graphics context and backends.
//!
//! This module is responsible for:
//! - acquiring a context from a drawable surface (primary, then compatibility)
//! - the `Backend` seam that buffers, programs and frames go through
//! - the wgpu backend (window surface) and the in-memory headless backend

mod backend;
mod context;
mod error;
mod gpu;
mod headless;
mod init;
mod surface;

pub use backend::{
    ActiveAttribute, ActiveUniform, AttribLocation, Backend, BufferId, ContextKind,
    PresentOutcome, ProgramDesc, ProgramId, StageSource, Surface, UniformLocation,
};
pub use context::{GraphicsContext, CLEAR_COLOR};
pub use error::{RenderError, RenderResult, ShaderStage};
pub use gpu::{WgpuBackend, WindowSurface};
pub use headless::{HeadlessBackend, HeadlessProgram, HeadlessSurface, DEFAULT_MEMORY_BUDGET};
pub use init::WgpuInit;
