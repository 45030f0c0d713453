use crate::device::{Backend, GraphicsContext, PresentOutcome, RenderResult, Surface};
use crate::geometry::TriangleGeometry;
use crate::render::Renderer;
use crate::shader::{
    PipelineBuilder, ShaderPipeline, BASIC_FRAGMENT_SHADER, BASIC_VERTEX_SHADER,
};
use crate::time::RotationState;

/// Everything one rotating-triangle session owns.
///
/// Built in dependency order: context, then geometry, then the shader pipeline.
/// Any failure aborts setup and drops what was created so far.
pub struct Harness<B: Backend> {
    pub context: GraphicsContext<B>,
    pub geometry: TriangleGeometry,
    pub pipeline: ShaderPipeline,
    pub renderer: Renderer,
}

impl<B: Backend> Harness<B> {
    /// Sets up a harness on `surface` using the given shader sources.
    pub fn setup<S>(surface: &S, vertex_source: &str, fragment_source: &str) -> RenderResult<Self>
    where
        S: Surface<Backend = B>,
    {
        let mut context = GraphicsContext::acquire(surface)?;
        let geometry = TriangleGeometry::upload(&mut context)?;
        let pipeline = PipelineBuilder::new(vertex_source, fragment_source)
            .label("triangle")
            .build(&mut context)?;

        log::info!(
            "harness ready on {} context ({}x{})",
            context.kind().name(),
            context.viewport_width(),
            context.viewport_height()
        );

        Ok(Self {
            context,
            geometry,
            pipeline,
            renderer: Renderer::new(),
        })
    }

    /// Sets up a harness with the built-in WGSL sources.
    pub fn with_default_shaders<S>(surface: &S) -> RenderResult<Self>
    where
        S: Surface<Backend = B>,
    {
        Self::setup(surface, BASIC_VERTEX_SHADER, BASIC_FRAGMENT_SHADER)
    }

    /// Draws and presents one frame at `rotation`.
    pub fn draw(&mut self, rotation: &RotationState) -> PresentOutcome {
        self.renderer
            .draw_frame(&mut self.context, &self.geometry, &self.pipeline, rotation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{ContextKind, HeadlessBackend, HeadlessSurface, RenderError, ShaderStage};

    #[test]
    fn setup_builds_everything() {
        let h: Harness<HeadlessBackend> =
            Harness::with_default_shaders(&HeadlessSurface::new(800, 600)).unwrap();

        assert_eq!(h.context.kind(), ContextKind::Primary);
        assert_eq!(h.geometry.vertex_count(), 3);
        assert_eq!(h.context.active_program(), Some(h.pipeline.program()));
        assert!(h.context.backend().depth_test_enabled());

        let program = h.context.backend().program(h.pipeline.program()).unwrap();
        assert_eq!(program.label, "triangle");
    }

    #[test]
    fn setup_surfaces_context_failure() {
        let surface = HeadlessSurface::new(800, 600)
            .without_primary()
            .without_compatibility();
        let err = Harness::with_default_shaders(&surface).err();
        assert_eq!(err, Some(RenderError::ContextUnavailable));
    }

    #[test]
    fn setup_surfaces_allocation_failure() {
        // Room for the positions buffer only.
        let surface = HeadlessSurface::new(800, 600).with_memory_budget(48);
        let err = Harness::with_default_shaders(&surface).err();
        assert_eq!(err, Some(RenderError::ResourceExhausted { requested: 48 }));
    }

    #[test]
    fn setup_surfaces_shader_failure() {
        let surface = HeadlessSurface::new(800, 600);
        let err = Harness::setup(&surface, BASIC_VERTEX_SHADER, "nonsense").err();
        assert!(matches!(
            err,
            Some(RenderError::ShaderCompileFailed { stage: ShaderStage::Fragment, .. })
        ));
    }
}
