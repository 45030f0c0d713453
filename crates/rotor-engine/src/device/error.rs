use std::fmt;

use thiserror::Error;

/// Shader stage a compile diagnostic belongs to.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    pub const fn name(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Fragment => "fragment",
        }
    }

    pub(crate) fn to_naga(self) -> naga::ShaderStage {
        match self {
            ShaderStage::Vertex => naga::ShaderStage::Vertex,
            ShaderStage::Fragment => naga::ShaderStage::Fragment,
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Setup-time failures of the rendering core.
///
/// Every variant is terminal for the resource it concerns. Nothing here is produced
/// by the per-frame path; the frame loop assumes setup succeeded.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RenderError {
    /// Neither the primary nor the compatibility context could be created.
    #[error("could not initialise a graphics context (primary and compatibility requests both failed)")]
    ContextUnavailable,

    /// The drawable surface has no area.
    #[error("surface has zero size ({width}x{height})")]
    InvalidSurface { width: u32, height: u32 },

    /// The backend refused a buffer allocation.
    #[error("GPU buffer allocation of {requested} bytes failed")]
    ResourceExhausted { requested: u64 },

    /// Vertex data does not divide into whole vertices.
    #[error("invalid geometry: {len} floats cannot be split into items of {item_size} components")]
    InvalidGeometry { len: usize, item_size: u32 },

    #[error("{stage} shader failed to compile:\n{log}")]
    ShaderCompileFailed { stage: ShaderStage, log: String },

    #[error("shader program failed to link:\n{log}")]
    LinkFailed { log: String },
}

pub type RenderResult<T> = Result<T, RenderError>;
