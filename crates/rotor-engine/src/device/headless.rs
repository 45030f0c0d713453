//! In-memory backend.
//!
//! Executes nothing on a GPU: buffers and programs are kept as plain data and each
//! submitted frame is validated against them and retained for inspection. Used by
//! the test suite and by headless runs of the harness.

use crate::render::{Color, DrawCmd, FrameCommands};

use super::backend::{
    ActiveAttribute, ActiveUniform, Backend, BufferId, ContextKind, PresentOutcome, ProgramDesc,
    ProgramId, Surface,
};
use super::error::{RenderError, RenderResult};

/// Default simulated GPU memory available to vertex buffers.
pub const DEFAULT_MEMORY_BUDGET: u64 = 64 * 1024 * 1024;

/// Off-screen surface with configurable context availability.
#[derive(Debug, Clone)]
pub struct HeadlessSurface {
    width: u32,
    height: u32,
    primary: bool,
    compatibility: bool,
    memory_budget: u64,
}

impl HeadlessSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            primary: true,
            compatibility: true,
            memory_budget: DEFAULT_MEMORY_BUDGET,
        }
    }

    /// Refuses primary context requests.
    pub fn without_primary(mut self) -> Self {
        self.primary = false;
        self
    }

    /// Refuses compatibility context requests.
    pub fn without_compatibility(mut self) -> Self {
        self.compatibility = false;
        self
    }

    /// Limits the bytes of vertex data the backend will accept.
    pub fn with_memory_budget(mut self, bytes: u64) -> Self {
        self.memory_budget = bytes;
        self
    }
}

impl Surface for HeadlessSurface {
    type Backend = HeadlessBackend;

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn get_context(&self, kind: ContextKind) -> Option<HeadlessBackend> {
        let available = match kind {
            ContextKind::Primary => self.primary,
            ContextKind::Compatibility => self.compatibility,
        };
        available.then(|| HeadlessBackend::new(kind, self.memory_budget))
    }
}

/// Program retained by [`HeadlessBackend`].
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessProgram {
    pub label: String,
    pub vertex_entry: String,
    pub fragment_entry: String,
    pub attributes: Vec<ActiveAttribute>,
    pub uniforms: Vec<ActiveUniform>,
}

/// Backend that records instead of rendering.
#[derive(Debug)]
pub struct HeadlessBackend {
    kind: ContextKind,
    depth_test: bool,
    clear_color: Option<Color>,

    memory_budget: u64,
    memory_used: u64,

    buffers: Vec<Vec<f32>>,
    programs: Vec<HeadlessProgram>,

    last_frame: Option<FrameCommands>,
    frames_submitted: u64,
    vertices_drawn: u64,
}

impl HeadlessBackend {
    pub fn new(kind: ContextKind, memory_budget: u64) -> Self {
        Self {
            kind,
            depth_test: false,
            clear_color: None,
            memory_budget,
            memory_used: 0,
            buffers: Vec::new(),
            programs: Vec::new(),
            last_frame: None,
            frames_submitted: 0,
            vertices_drawn: 0,
        }
    }

    pub fn kind(&self) -> ContextKind {
        self.kind
    }

    pub fn depth_test_enabled(&self) -> bool {
        self.depth_test
    }

    pub fn clear_color(&self) -> Option<Color> {
        self.clear_color
    }

    pub fn memory_used(&self) -> u64 {
        self.memory_used
    }

    /// Contents of a buffer created by this backend.
    pub fn buffer_data(&self, id: BufferId) -> Option<&[f32]> {
        self.buffers.get(id.0 as usize).map(Vec::as_slice)
    }

    pub fn program(&self, id: ProgramId) -> Option<&HeadlessProgram> {
        self.programs.get(id.0 as usize)
    }

    /// The most recently submitted frame.
    pub fn last_frame(&self) -> Option<&FrameCommands> {
        self.last_frame.as_ref()
    }

    pub fn frames_submitted(&self) -> u64 {
        self.frames_submitted
    }

    pub fn vertices_drawn(&self) -> u64 {
        self.vertices_drawn
    }

    /// Walks `frame` the way a GPU backend would, asserting every handle and slot.
    fn validate(&self, frame: &FrameCommands) -> u64 {
        let mut program: Option<&HeadlessProgram> = None;
        let mut bound: Vec<(ActiveAttribute, u32)> = Vec::new();
        let mut vertices = 0u64;

        for cmd in frame.commands() {
            match cmd {
                DrawCmd::Viewport { width, height } => {
                    assert!(*width > 0 && *height > 0, "viewport must have area");
                }
                DrawCmd::Clear { .. } => {}
                DrawCmd::UseProgram(id) => {
                    let p = self.program(*id);
                    assert!(p.is_some(), "UseProgram with unknown program {id:?}");
                    program = p;
                    bound.clear();
                }
                DrawCmd::UniformMatrix4 { location, .. } => {
                    let Some(p) = program else {
                        panic!("UniformMatrix4 with no active program");
                    };
                    assert!(
                        p.uniforms.iter().any(|u| u.location == *location && u.size >= 64),
                        "program `{}` has no mat4 uniform at {location}",
                        p.label
                    );
                }
                DrawCmd::VertexAttrib { location, buffer, item_size } => {
                    let Some(p) = program else {
                        panic!("VertexAttrib with no active program");
                    };
                    let Some(attr) = p.attributes.iter().find(|a| a.location == *location) else {
                        panic!("program `{}` has no attribute at {location:?}", p.label);
                    };
                    let Some(data) = self.buffer_data(*buffer) else {
                        panic!("VertexAttrib with unknown buffer {buffer:?}");
                    };
                    assert!((1..=4).contains(item_size), "item_size {item_size} out of range");
                    let count = (data.len() / *item_size as usize) as u32;
                    bound.retain(|(a, _)| a.location != *location);
                    bound.push((attr.clone(), count));
                }
                DrawCmd::DrawArrays { first, count } => {
                    let Some(p) = program else {
                        panic!("DrawArrays with no active program");
                    };
                    for attr in &p.attributes {
                        let Some((_, available)) = bound.iter().find(|(a, _)| a == attr) else {
                            panic!("attribute `{}` enabled but not sourced", attr.name);
                        };
                        assert!(
                            first + count <= *available,
                            "draw of {count} vertices overruns `{}`",
                            attr.name
                        );
                    }
                    vertices += *count as u64;
                }
            }
        }

        vertices
    }
}

impl Backend for HeadlessBackend {
    fn enable_depth_test(&mut self) {
        self.depth_test = true;
    }

    fn set_clear_color(&mut self, color: Color) {
        self.clear_color = Some(color);
    }

    fn create_vertex_buffer(&mut self, label: &str, data: &[f32]) -> RenderResult<BufferId> {
        let requested = std::mem::size_of_val(data) as u64;
        if self.memory_used.saturating_add(requested) > self.memory_budget {
            log::error!(
                "headless buffer `{label}`: {requested} bytes requested, {} of {} in use",
                self.memory_used,
                self.memory_budget
            );
            return Err(RenderError::ResourceExhausted { requested });
        }

        self.memory_used += requested;
        self.buffers.push(data.to_vec());
        Ok(BufferId(self.buffers.len() as u32 - 1))
    }

    fn create_program(&mut self, desc: &ProgramDesc<'_>) -> RenderResult<ProgramId> {
        self.programs.push(HeadlessProgram {
            label: desc.label.to_string(),
            vertex_entry: desc.vertex.entry_point.to_string(),
            fragment_entry: desc.fragment.entry_point.to_string(),
            attributes: desc.attributes.to_vec(),
            uniforms: desc.uniforms.to_vec(),
        });
        Ok(ProgramId(self.programs.len() as u32 - 1))
    }

    fn submit(&mut self, frame: &FrameCommands) -> PresentOutcome {
        let vertices = self.validate(frame);

        self.vertices_drawn += vertices;
        self.frames_submitted += 1;
        match self.last_frame.as_mut() {
            Some(last) => last.clone_from(frame),
            None => self.last_frame = Some(frame.clone()),
        }

        PresentOutcome::Presented
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{AttribLocation, StageSource, UniformLocation};

    fn backend() -> HeadlessBackend {
        HeadlessBackend::new(ContextKind::Primary, 64)
    }

    fn program_with_one_attribute(b: &mut HeadlessBackend) -> ProgramId {
        let attributes = [ActiveAttribute {
            name: "aVertexPosition".to_string(),
            location: AttribLocation(0),
            components: 4,
        }];
        let uniforms = [ActiveUniform {
            name: "uPMatrix".to_string(),
            location: UniformLocation { group: 0, binding: 0 },
            size: 64,
        }];
        let stage = StageSource { source: "", entry_point: "main" };
        b.create_program(&ProgramDesc {
            label: "test",
            vertex: stage,
            fragment: stage,
            attributes: &attributes,
            uniforms: &uniforms,
        })
        .unwrap()
    }

    // ── buffers ───────────────────────────────────────────────────────────

    #[test]
    fn buffers_count_against_budget() {
        let mut b = backend();
        let id = b.create_vertex_buffer("a", &[0.0; 12]).unwrap();
        assert_eq!(b.memory_used(), 48);
        assert_eq!(b.buffer_data(id).map(<[f32]>::len), Some(12));

        let err = b.create_vertex_buffer("b", &[0.0; 8]).unwrap_err();
        assert_eq!(err, RenderError::ResourceExhausted { requested: 32 });
        assert_eq!(b.memory_used(), 48);
    }

    // ── frames ────────────────────────────────────────────────────────────

    #[test]
    fn submit_records_frame_and_vertex_count() {
        let mut b = backend();
        let buffer = b.create_vertex_buffer("pos", &[0.0; 12]).unwrap();
        let program = program_with_one_attribute(&mut b);

        let mut frame = FrameCommands::new();
        frame.push(DrawCmd::Viewport { width: 4, height: 4 });
        frame.push(DrawCmd::Clear { depth: true });
        frame.push(DrawCmd::UseProgram(program));
        frame.push(DrawCmd::VertexAttrib {
            location: AttribLocation(0),
            buffer,
            item_size: 4,
        });
        frame.push(DrawCmd::DrawArrays { first: 0, count: 3 });

        assert_eq!(b.submit(&frame), PresentOutcome::Presented);
        assert_eq!(b.frames_submitted(), 1);
        assert_eq!(b.vertices_drawn(), 3);
        assert_eq!(b.last_frame(), Some(&frame));
    }

    #[test]
    #[should_panic(expected = "no active program")]
    fn draw_without_program_panics() {
        let mut b = backend();
        let mut frame = FrameCommands::new();
        frame.push(DrawCmd::DrawArrays { first: 0, count: 3 });
        b.submit(&frame);
    }

    #[test]
    #[should_panic(expected = "overruns")]
    fn draw_past_buffer_end_panics() {
        let mut b = backend();
        let buffer = b.create_vertex_buffer("pos", &[0.0; 8]).unwrap();
        let program = program_with_one_attribute(&mut b);

        let mut frame = FrameCommands::new();
        frame.push(DrawCmd::UseProgram(program));
        frame.push(DrawCmd::VertexAttrib {
            location: AttribLocation(0),
            buffer,
            item_size: 4,
        });
        frame.push(DrawCmd::DrawArrays { first: 0, count: 3 });
        b.submit(&frame);
    }
}
