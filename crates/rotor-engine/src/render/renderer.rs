use glam::{Mat4, Vec3};

use crate::device::{Backend, GraphicsContext, PresentOutcome};
use crate::geometry::TriangleGeometry;
use crate::shader::ShaderPipeline;
use crate::time::RotationState;

use super::cmd::{DrawCmd, FrameCommands};

/// Perspective projection parameters.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Projection {
    /// Vertical field of view, in degrees.
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Projection {
    fn default() -> Self {
        Self {
            fov_y_degrees: 45.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

impl Projection {
    /// Right-handed projection onto a `[0, 1]` depth range.
    pub fn matrix(&self, aspect_ratio: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_y_degrees.to_radians(), aspect_ratio, self.near, self.far)
    }
}

/// The two matrices uploaded each frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameMatrices {
    pub projection: Mat4,
    pub model_view: Mat4,
}

/// Records and submits one frame of the rotating triangle.
///
/// Everything a frame needs is re-issued every time, so drawing the same state
/// twice produces the same command stream.
#[derive(Debug, Clone)]
pub struct Renderer {
    projection: Projection,
    eye_distance: f32,
    frame: FrameCommands,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer {
    pub fn new() -> Self {
        Self::with_projection(Projection::default())
    }

    pub fn with_projection(projection: Projection) -> Self {
        Self {
            projection,
            eye_distance: 2.0,
            frame: FrameCommands::new(),
        }
    }

    #[inline]
    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    /// Matrices for a frame at `rotation` on `ctx`'s viewport.
    ///
    /// Model-view is a translation away from the eye followed by the rotation about
    /// the view axis, so the triangle spins in place.
    pub fn frame_matrices<B: Backend>(
        &self,
        ctx: &GraphicsContext<B>,
        rotation: &RotationState,
    ) -> FrameMatrices {
        let projection = self.projection.matrix(ctx.aspect_ratio());
        let model_view = Mat4::from_translation(Vec3::new(0.0, 0.0, -self.eye_distance))
            * Mat4::from_rotation_z(rotation.radians() as f32);

        FrameMatrices {
            projection,
            model_view,
        }
    }

    /// Draws the triangle at `rotation` and presents the frame.
    pub fn draw_frame<B: Backend>(
        &mut self,
        ctx: &mut GraphicsContext<B>,
        geometry: &TriangleGeometry,
        pipeline: &ShaderPipeline,
        rotation: &RotationState,
    ) -> PresentOutcome {
        debug_assert_eq!(
            geometry.positions.vertex_count(),
            geometry.colors.vertex_count(),
            "position and color buffers disagree on vertex count"
        );

        let matrices = self.frame_matrices(ctx, rotation);
        let loc = pipeline.locations();

        let frame = &mut self.frame;
        frame.clear();
        frame.push(DrawCmd::Viewport {
            width: ctx.viewport_width(),
            height: ctx.viewport_height(),
        });
        frame.push(DrawCmd::Clear { depth: true });
        frame.push(DrawCmd::UseProgram(pipeline.program()));
        frame.push(DrawCmd::UniformMatrix4 {
            location: loc.projection,
            value: matrices.projection.to_cols_array(),
        });
        frame.push(DrawCmd::UniformMatrix4 {
            location: loc.model_view,
            value: matrices.model_view.to_cols_array(),
        });
        frame.push(DrawCmd::VertexAttrib {
            location: loc.vertex_position,
            buffer: geometry.positions.handle(),
            item_size: geometry.positions.item_size(),
        });
        frame.push(DrawCmd::VertexAttrib {
            location: loc.vertex_color,
            buffer: geometry.colors.handle(),
            item_size: geometry.colors.item_size(),
        });
        frame.push(DrawCmd::DrawArrays {
            first: 0,
            count: geometry.vertex_count(),
        });

        ctx.backend_mut().submit(frame)
    }
}
