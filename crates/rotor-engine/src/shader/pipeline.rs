use crate::device::{
    ActiveAttribute, ActiveUniform, AttribLocation, Backend, GraphicsContext, ProgramDesc,
    ProgramId, RenderError, RenderResult, ShaderStage, StageSource, UniformLocation,
};

use super::stage::{self, CompiledStage};

pub const ATTR_VERTEX_POSITION: &str = "aVertexPosition";
pub const ATTR_VERTEX_COLOR: &str = "aVertexColor";
pub const UNIFORM_PROJECTION: &str = "uPMatrix";
pub const UNIFORM_MODEL_VIEW: &str = "uMVMatrix";

/// Compilation state of one shader stage.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum StageStatus {
    Uncompiled,
    Compiling,
    Compiled,
    Failed,
}

/// Link state of the program.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum LinkStatus {
    Unlinked,
    Linking,
    Linked,
    Failed,
}

/// Slots of the four inputs the renderer drives, resolved once at build time.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct PipelineLocations {
    pub vertex_position: AttribLocation,
    pub vertex_color: AttribLocation,
    pub projection: UniformLocation,
    pub model_view: UniformLocation,
}

/// Linked vertex + fragment program with cached input locations.
///
/// A value of this type only exists after both stages compiled and the program
/// linked; there is no way to bind a failed pipeline.
#[derive(Debug, Clone)]
pub struct ShaderPipeline {
    program: ProgramId,
    vertex_entry: String,
    fragment_entry: String,
    locations: PipelineLocations,
}

impl ShaderPipeline {
    /// Compiles both stages, links them and makes the program active on `ctx`.
    pub fn build<B: Backend>(
        ctx: &mut GraphicsContext<B>,
        vertex_source: &str,
        fragment_source: &str,
    ) -> RenderResult<Self> {
        PipelineBuilder::new(vertex_source, fragment_source).build(ctx)
    }

    #[inline]
    pub fn program(&self) -> ProgramId {
        self.program
    }

    pub fn vertex_entry(&self) -> &str {
        &self.vertex_entry
    }

    pub fn fragment_entry(&self) -> &str {
        &self.fragment_entry
    }

    #[inline]
    pub fn locations(&self) -> &PipelineLocations {
        &self.locations
    }
}

/// Drives the compile/link state machine and keeps its final state observable.
///
/// Both stages are always compiled so every diagnostic is reported, but linking is
/// only attempted once both succeeded. When both fail, the vertex error is returned
/// and both are logged.
#[derive(Debug)]
pub struct PipelineBuilder<'s> {
    label: &'s str,
    vertex_source: &'s str,
    fragment_source: &'s str,
    vertex: StageStatus,
    fragment: StageStatus,
    link: LinkStatus,
}

impl<'s> PipelineBuilder<'s> {
    pub fn new(vertex_source: &'s str, fragment_source: &'s str) -> Self {
        Self {
            label: "rotor program",
            vertex_source,
            fragment_source,
            vertex: StageStatus::Uncompiled,
            fragment: StageStatus::Uncompiled,
            link: LinkStatus::Unlinked,
        }
    }

    /// Debug label forwarded to the backend.
    pub fn label(mut self, label: &'s str) -> Self {
        self.label = label;
        self
    }

    pub fn vertex_status(&self) -> StageStatus {
        self.vertex
    }

    pub fn fragment_status(&self) -> StageStatus {
        self.fragment
    }

    pub fn link_status(&self) -> LinkStatus {
        self.link
    }

    /// Runs the state machine from the start.
    ///
    /// Building again restarts both stages; a successful rebuild creates a new
    /// program and makes it active.
    pub fn build<B: Backend>(&mut self, ctx: &mut GraphicsContext<B>) -> RenderResult<ShaderPipeline> {
        self.vertex = StageStatus::Uncompiled;
        self.fragment = StageStatus::Uncompiled;
        self.link = LinkStatus::Unlinked;

        let vertex = self.compile_stage(ShaderStage::Vertex);
        let fragment = self.compile_stage(ShaderStage::Fragment);
        let (vertex, fragment) = match (vertex, fragment) {
            (Ok(v), Ok(f)) => (v, f),
            (Err(e), _) | (Ok(_), Err(e)) => return Err(e),
        };

        self.link = LinkStatus::Linking;
        match self.link_program(ctx, &vertex, &fragment) {
            Ok(pipeline) => {
                self.link = LinkStatus::Linked;
                Ok(pipeline)
            }
            Err(e) => {
                self.link = LinkStatus::Failed;
                log::error!("{e}");
                Err(e)
            }
        }
    }

    fn compile_stage(&mut self, stage: ShaderStage) -> RenderResult<CompiledStage> {
        let (source, status) = match stage {
            ShaderStage::Vertex => (self.vertex_source, &mut self.vertex),
            ShaderStage::Fragment => (self.fragment_source, &mut self.fragment),
        };

        *status = StageStatus::Compiling;
        match stage::compile(stage, source) {
            Ok(compiled) => {
                *status = StageStatus::Compiled;
                Ok(compiled)
            }
            Err(log) => {
                *status = StageStatus::Failed;
                log::error!("{stage} shader failed to compile:\n{log}");
                Err(RenderError::ShaderCompileFailed { stage, log })
            }
        }
    }

    fn link_program<B: Backend>(
        &self,
        ctx: &mut GraphicsContext<B>,
        vertex: &CompiledStage,
        fragment: &CompiledStage,
    ) -> RenderResult<ShaderPipeline> {
        let (attributes, uniforms, locations) =
            link_interfaces(vertex, fragment).map_err(|log| RenderError::LinkFailed { log })?;

        let program = ctx.backend_mut().create_program(&ProgramDesc {
            label: self.label,
            vertex: StageSource {
                source: self.vertex_source,
                entry_point: &vertex.entry_point,
            },
            fragment: StageSource {
                source: self.fragment_source,
                entry_point: &fragment.entry_point,
            },
            attributes: &attributes,
            uniforms: &uniforms,
        })?;
        ctx.set_active_program(program);

        log::info!(
            "linked `{}`: {} attributes, {} uniforms",
            self.label,
            attributes.len(),
            uniforms.len()
        );

        Ok(ShaderPipeline {
            program,
            vertex_entry: vertex.entry_point.clone(),
            fragment_entry: fragment.entry_point.clone(),
            locations,
        })
    }
}

/// Checks that the stages fit together and resolves the required names.
///
/// Every problem found is reported, one per line.
fn link_interfaces(
    vertex: &CompiledStage,
    fragment: &CompiledStage,
) -> Result<(Vec<ActiveAttribute>, Vec<ActiveUniform>, PipelineLocations), String> {
    let mut errors = Vec::new();

    for input in &fragment.inputs {
        if !vertex.outputs.iter().any(|o| o.location == input.location) {
            errors.push(format!(
                "fragment input `{}` at @location({}) is not written by the vertex stage",
                input.name, input.location
            ));
        }
    }

    let mut uniforms: Vec<ActiveUniform> = Vec::new();
    for u in vertex.uniforms.iter().chain(&fragment.uniforms) {
        match uniforms.iter().find(|seen| seen.name == u.name) {
            Some(seen) if seen.location == u.location => {}
            Some(seen) => errors.push(format!(
                "uniform `{}` bound at {} in one stage and {} in the other",
                u.name, seen.location, u.location
            )),
            None => {
                if let Some(other) = uniforms.iter().find(|seen| seen.location == u.location) {
                    errors.push(format!(
                        "uniforms `{}` and `{}` share {}",
                        other.name, u.name, u.location
                    ));
                } else {
                    uniforms.push(u.clone());
                }
            }
        }
    }

    let attributes: Vec<ActiveAttribute> = vertex
        .inputs
        .iter()
        .map(|v| ActiveAttribute {
            name: v.name.clone(),
            location: AttribLocation(v.location),
            components: v.components,
        })
        .collect();

    let attribute = |name: &str, errors: &mut Vec<String>| {
        let found = attributes.iter().find(|a| a.name == name).map(|a| a.location);
        if found.is_none() {
            errors.push(format!("active attribute `{name}` not found"));
        }
        found
    };
    let vertex_position = attribute(ATTR_VERTEX_POSITION, &mut errors);
    let vertex_color = attribute(ATTR_VERTEX_COLOR, &mut errors);

    let uniform = |name: &str, errors: &mut Vec<String>| {
        let found = uniforms.iter().find(|u| u.name == name).map(|u| u.location);
        if found.is_none() {
            errors.push(format!("active uniform `{name}` not found"));
        }
        found
    };
    let projection = uniform(UNIFORM_PROJECTION, &mut errors);
    let model_view = uniform(UNIFORM_MODEL_VIEW, &mut errors);

    match (vertex_position, vertex_color, projection, model_view) {
        (Some(vertex_position), Some(vertex_color), Some(projection), Some(model_view))
            if errors.is_empty() =>
        {
            let locations = PipelineLocations {
                vertex_position,
                vertex_color,
                projection,
                model_view,
            };
            Ok((attributes, uniforms, locations))
        }
        _ => Err(errors.join("\n")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{HeadlessBackend, HeadlessSurface};
    use crate::shader::{BASIC_FRAGMENT_SHADER, BASIC_VERTEX_SHADER};

    fn ctx() -> GraphicsContext<HeadlessBackend> {
        GraphicsContext::acquire(&HeadlessSurface::new(800, 600)).unwrap()
    }

    // ── success ───────────────────────────────────────────────────────────

    #[test]
    fn valid_sources_link() {
        let mut ctx = ctx();
        let mut builder = PipelineBuilder::new(BASIC_VERTEX_SHADER, BASIC_FRAGMENT_SHADER);
        let pipeline = builder.build(&mut ctx).unwrap();

        assert_eq!(builder.vertex_status(), StageStatus::Compiled);
        assert_eq!(builder.fragment_status(), StageStatus::Compiled);
        assert_eq!(builder.link_status(), LinkStatus::Linked);

        let loc = pipeline.locations();
        assert_eq!(loc.vertex_position, AttribLocation(0));
        assert_eq!(loc.vertex_color, AttribLocation(1));
        assert_eq!(loc.projection, UniformLocation { group: 0, binding: 0 });
        assert_eq!(loc.model_view, UniformLocation { group: 0, binding: 1 });
    }

    #[test]
    fn linked_program_becomes_active_with_attributes_enabled() {
        let mut ctx = ctx();
        let pipeline = ShaderPipeline::build(&mut ctx, BASIC_VERTEX_SHADER, BASIC_FRAGMENT_SHADER)
            .unwrap();

        assert_eq!(ctx.active_program(), Some(pipeline.program()));
        assert_eq!(pipeline.vertex_entry(), "vs_main");
        assert_eq!(pipeline.fragment_entry(), "fs_main");
        let program = ctx.backend().program(pipeline.program()).unwrap();
        assert_eq!(program.vertex_entry, "vs_main");
        assert_eq!(program.fragment_entry, "fs_main");
        assert_eq!(program.attributes.len(), 2);
        assert_eq!(program.uniforms.len(), 2);
    }

    #[test]
    fn label_reaches_backend() {
        let mut ctx = ctx();
        let pipeline = PipelineBuilder::new(BASIC_VERTEX_SHADER, BASIC_FRAGMENT_SHADER)
            .label("spinner")
            .build(&mut ctx)
            .unwrap();
        assert_eq!(ctx.backend().program(pipeline.program()).unwrap().label, "spinner");
    }

    // ── rebuilds ──────────────────────────────────────────────────────────

    #[test]
    fn failed_builder_can_run_again() {
        let mut ctx = ctx();
        let vs = BASIC_VERTEX_SHADER.replace("uMVMatrix", "uModelView");
        let mut builder = PipelineBuilder::new(&vs, BASIC_FRAGMENT_SHADER);

        assert!(builder.build(&mut ctx).is_err());
        assert_eq!(builder.link_status(), LinkStatus::Failed);

        assert!(matches!(builder.build(&mut ctx), Err(RenderError::LinkFailed { .. })));
        assert_eq!(builder.vertex_status(), StageStatus::Compiled);
        assert_eq!(builder.link_status(), LinkStatus::Failed);
    }

    #[test]
    fn successful_rebuild_activates_new_program() {
        let mut ctx = ctx();
        let mut builder = PipelineBuilder::new(BASIC_VERTEX_SHADER, BASIC_FRAGMENT_SHADER);

        let first = builder.build(&mut ctx).unwrap();
        let second = builder.build(&mut ctx).unwrap();

        assert_ne!(first.program(), second.program());
        assert_eq!(ctx.active_program(), Some(second.program()));
        assert_eq!(builder.link_status(), LinkStatus::Linked);
    }

    // ── compile failures ──────────────────────────────────────────────────

    #[test]
    fn invalid_vertex_source_never_links() {
        let mut ctx = ctx();
        let mut builder = PipelineBuilder::new("this is not wgsl", BASIC_FRAGMENT_SHADER);
        let err = builder.build(&mut ctx).unwrap_err();

        match err {
            RenderError::ShaderCompileFailed { stage, log } => {
                assert_eq!(stage, ShaderStage::Vertex);
                assert!(!log.is_empty());
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(builder.vertex_status(), StageStatus::Failed);
        assert_eq!(builder.fragment_status(), StageStatus::Compiled);
        assert_eq!(builder.link_status(), LinkStatus::Unlinked);
        assert_eq!(ctx.active_program(), None);
    }

    #[test]
    fn both_stages_compiled_even_when_vertex_fails() {
        let mut ctx = ctx();
        let mut builder = PipelineBuilder::new("fn", "fn");
        let err = builder.build(&mut ctx).unwrap_err();

        assert!(matches!(
            err,
            RenderError::ShaderCompileFailed { stage: ShaderStage::Vertex, .. }
        ));
        assert_eq!(builder.vertex_status(), StageStatus::Failed);
        assert_eq!(builder.fragment_status(), StageStatus::Failed);
        assert_eq!(builder.link_status(), LinkStatus::Unlinked);
    }

    #[test]
    fn invalid_fragment_source_reports_fragment_stage() {
        let mut ctx = ctx();
        let err = ShaderPipeline::build(&mut ctx, BASIC_VERTEX_SHADER, "@fragment fn").unwrap_err();
        assert!(matches!(
            err,
            RenderError::ShaderCompileFailed { stage: ShaderStage::Fragment, .. }
        ));
    }

    // ── link failures ─────────────────────────────────────────────────────

    #[test]
    fn missing_uniform_fails_link() {
        let vs = BASIC_VERTEX_SHADER.replace("uMVMatrix", "uModelView");
        let mut ctx = ctx();
        let mut builder = PipelineBuilder::new(&vs, BASIC_FRAGMENT_SHADER);

        let Err(RenderError::LinkFailed { log }) = builder.build(&mut ctx) else {
            panic!("expected link failure");
        };
        assert!(log.contains("`uMVMatrix` not found"));
        assert_eq!(builder.link_status(), LinkStatus::Failed);
        assert_eq!(ctx.active_program(), None);
    }

    #[test]
    fn unmatched_fragment_input_fails_link() {
        let fs = BASIC_FRAGMENT_SHADER.replace("@location(0) vColor", "@location(3) vColor");
        let mut ctx = ctx();
        let Err(RenderError::LinkFailed { log }) =
            ShaderPipeline::build(&mut ctx, BASIC_VERTEX_SHADER, &fs)
        else {
            panic!("expected link failure");
        };
        assert!(log.contains("@location(3)"));
    }

    #[test]
    fn conflicting_uniform_bindings_fail_link() {
        let fs = "@group(0) @binding(5) var<uniform> uPMatrix: mat4x4<f32>;\n\
                  @fragment fn fs_main(@location(0) c: vec4<f32>) -> @location(0) vec4<f32> {\n\
                      return uPMatrix * c;\n\
                  }";
        let mut ctx = ctx();
        let Err(RenderError::LinkFailed { log }) =
            ShaderPipeline::build(&mut ctx, BASIC_VERTEX_SHADER, fs)
        else {
            panic!("expected link failure");
        };
        assert!(log.contains("uPMatrix"));
    }
}
