//! Shader programs.
//!
//! Sources are WGSL. Each stage is parsed and validated on the CPU before any
//! backend object is created, so compile and link diagnostics are identical on
//! every backend.

mod pipeline;
mod sources;
mod stage;

pub use pipeline::{
    LinkStatus, PipelineBuilder, PipelineLocations, ShaderPipeline, StageStatus,
    ATTR_VERTEX_COLOR, ATTR_VERTEX_POSITION, UNIFORM_MODEL_VIEW, UNIFORM_PROJECTION,
};
pub use sources::{BASIC_FRAGMENT_SHADER, BASIC_VERTEX_SHADER};
