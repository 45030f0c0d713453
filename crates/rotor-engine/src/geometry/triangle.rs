use crate::device::{Backend, GraphicsContext, RenderResult};

use super::GeometryBuffer;

/// Components per vertex for both triangle attributes (homogeneous xyzw / rgba).
pub const TRIANGLE_ITEM_SIZE: u32 = 4;

/// Equilateral-ish triangle around the origin in the XY plane.
#[rustfmt::skip]
pub const TRIANGLE_POSITIONS: [f32; 12] = [
     0.0,   1.0, 0.0, 1.0,
    -0.87, -0.5, 0.0, 1.0,
     0.87, -0.5, 0.0, 1.0,
];

/// Red, green and blue corners.
#[rustfmt::skip]
pub const TRIANGLE_COLORS: [f32; 12] = [
    1.0, 0.0, 0.0, 1.0,
    0.0, 1.0, 0.0, 1.0,
    0.0, 0.0, 1.0, 1.0,
];

/// Position and color buffers of the single triangle the harness draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriangleGeometry {
    pub positions: GeometryBuffer,
    pub colors: GeometryBuffer,
}

impl TriangleGeometry {
    pub fn upload<B: Backend>(ctx: &mut GraphicsContext<B>) -> RenderResult<Self> {
        let positions = GeometryBuffer::upload(
            ctx,
            "triangle positions",
            &TRIANGLE_POSITIONS,
            TRIANGLE_ITEM_SIZE,
        )?;
        let colors =
            GeometryBuffer::upload(ctx, "triangle colors", &TRIANGLE_COLORS, TRIANGLE_ITEM_SIZE)?;

        Ok(Self { positions, colors })
    }

    /// Vertices drawn per frame.
    #[inline]
    pub fn vertex_count(&self) -> u32 {
        self.positions.vertex_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::HeadlessSurface;

    #[test]
    fn triangle_has_three_vertices_of_four_components() {
        let mut ctx = GraphicsContext::acquire(&HeadlessSurface::new(800, 600)).unwrap();
        let tri = TriangleGeometry::upload(&mut ctx).unwrap();

        for buf in [tri.positions, tri.colors] {
            assert_eq!(buf.vertex_count(), 3);
            assert_eq!(buf.item_size(), 4);
        }
        assert_ne!(tri.positions.handle(), tri.colors.handle());
    }

    #[test]
    fn triangle_data_reaches_backend() {
        let mut ctx = GraphicsContext::acquire(&HeadlessSurface::new(800, 600)).unwrap();
        let tri = TriangleGeometry::upload(&mut ctx).unwrap();

        let backend = ctx.backend();
        assert_eq!(backend.buffer_data(tri.positions.handle()), Some(&TRIANGLE_POSITIONS[..]));
        assert_eq!(backend.buffer_data(tri.colors.handle()), Some(&TRIANGLE_COLORS[..]));
    }
}
