use crate::device::{Backend, BufferId, GraphicsContext, RenderError, RenderResult};

/// GPU-resident vertex attribute data.
///
/// Buffers are uploaded once with static usage and never modified afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeometryBuffer {
    handle: BufferId,
    item_size: u32,
    vertex_count: u32,
}

impl GeometryBuffer {
    /// Uploads `data` as `item_size` floats per vertex.
    ///
    /// `item_size` must be in `1..=4` and `data` must hold a whole, non-zero number
    /// of vertices.
    pub fn upload<B: Backend>(
        ctx: &mut GraphicsContext<B>,
        label: &str,
        data: &[f32],
        item_size: u32,
    ) -> RenderResult<Self> {
        let invalid = RenderError::InvalidGeometry {
            len: data.len(),
            item_size,
        };
        if !(1..=4).contains(&item_size) || data.is_empty() {
            return Err(invalid);
        }
        if data.len() % item_size as usize != 0 {
            return Err(invalid);
        }

        let handle = ctx.backend_mut().create_vertex_buffer(label, data)?;
        let vertex_count = (data.len() / item_size as usize) as u32;

        log::debug!("uploaded `{label}`: {vertex_count} vertices x {item_size} components");

        Ok(Self {
            handle,
            item_size,
            vertex_count,
        })
    }

    #[inline]
    pub fn handle(&self) -> BufferId {
        self.handle
    }

    /// Components per vertex.
    #[inline]
    pub fn item_size(&self) -> u32 {
        self.item_size
    }

    #[inline]
    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }
}
