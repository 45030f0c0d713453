use std::collections::HashMap;
use std::num::NonZeroU64;

use anyhow::{Context, Result};
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::render::{Color, DrawCmd, FrameCommands};

use super::backend::{
    ActiveAttribute, AttribLocation, Backend, BufferId, ContextKind, PresentOutcome, ProgramDesc,
    ProgramId, Surface, UniformLocation,
};
use super::error::{RenderError, RenderResult};
use super::init::{AdapterRequest, WgpuInit};
use super::surface;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Window-backed drawable surface.
///
/// Each context request creates a fresh wgpu instance restricted to the backends of
/// the requested [`ContextKind`].
pub struct WindowSurface<'w> {
    window: &'w Window,
    init: WgpuInit,
}

impl<'w> WindowSurface<'w> {
    pub fn new(window: &'w Window, init: WgpuInit) -> Self {
        Self { window, init }
    }
}

impl<'w> Surface for WindowSurface<'w> {
    type Backend = WgpuBackend<'w>;

    fn width(&self) -> u32 {
        self.window.inner_size().width
    }

    fn height(&self) -> u32 {
        self.window.inner_size().height
    }

    fn get_context(&self, kind: ContextKind) -> Option<WgpuBackend<'w>> {
        match pollster::block_on(WgpuBackend::new(self.window, kind, &self.init)) {
            Ok(backend) => Some(backend),
            Err(e) => {
                log::warn!("{} context request failed: {e:#}", kind.name());
                None
            }
        }
    }
}

/// Owns wgpu core objects, the surface configuration and every resource created
/// through the [`Backend`] trait.
pub struct WgpuBackend<'w> {
    /// Surface bound to the window.
    ///
    /// Surface lifetime is tied to the window; the window must outlive the backend.
    surface: wgpu::Surface<'w>,

    /// Logical device.
    device: wgpu::Device,

    /// Command queue.
    queue: wgpu::Queue,

    /// Active surface configuration.
    config: wgpu::SurfaceConfiguration,

    /// Drawable size in physical pixels at creation.
    size: PhysicalSize<u32>,

    clear_color: wgpu::Color,
    depth_view: Option<wgpu::TextureView>,

    buffers: Vec<wgpu::Buffer>,
    programs: Vec<GpuProgram>,
}

impl<'w> WgpuBackend<'w> {
    /// Creates a backend bound to a window.
    ///
    /// Adapter/device acquisition is asynchronous under wgpu.
    pub async fn new(window: &'w Window, kind: ContextKind, init: &WgpuInit) -> Result<Self> {
        let size = window.inner_size();
        anyhow::ensure!(size.width > 0 && size.height > 0, "window has zero size");

        let request = AdapterRequest::for_kind(kind);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: request.backends,
            ..Default::default()
        });

        // Surface lifetime is tied to `window` via `'w`.
        let surface = instance
            .create_surface(window)
            .context("failed to create wgpu surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: request.power_preference,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;

        let info = adapter.get_info();
        log::debug!("{} adapter: {} ({:?})", kind.name(), info.name, info.backend);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("rotor device"),
                required_features: wgpu::Features::empty(),
                required_limits: request.limits(&adapter),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device/queue")?;

        let surface_caps = surface.get_capabilities(&adapter);
        let format = surface::choose_surface_format(&surface_caps, init.prefer_srgb)
            .context("no supported surface formats")?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: init.present_mode,
            alpha_mode: surface::choose_alpha_mode(&surface_caps),
            view_formats: vec![],
            desired_maximum_frame_latency: init.desired_maximum_frame_latency,
        };

        surface.configure(&device, &config);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            size,
            clear_color: wgpu::Color::BLACK,
            depth_view: None,
            buffers: Vec::new(),
            programs: Vec::new(),
        })
    }

    fn create_depth_view(&self) -> wgpu::TextureView {
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("rotor depth"),
            size: wgpu::Extent3d {
                width: self.config.width,
                height: self.config.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&wgpu::TextureViewDescriptor::default())
    }

    /// Turns the command stream into uniform uploads plus a list of draws.
    ///
    /// Pipelines needed by the draws are created here so the render pass can borrow
    /// everything immutably.
    fn plan(&mut self, frame: &FrameCommands) -> FramePlan {
        let mut plan = FramePlan::default();
        let mut program: Option<usize> = None;
        let mut attribs: Vec<(AttribLocation, BufferId, u32)> = Vec::new();
        let depth_enabled = self.depth_view.is_some();

        for cmd in frame.commands() {
            match cmd {
                DrawCmd::Viewport { width, height } => plan.viewport = Some((*width, *height)),
                DrawCmd::Clear { depth } => {
                    plan.clear_color = true;
                    plan.clear_depth = *depth;
                }
                DrawCmd::UseProgram(id) => {
                    let index = id.0 as usize;
                    assert!(index < self.programs.len(), "UseProgram with unknown program {id:?}");
                    program = Some(index);
                    attribs.clear();
                }
                DrawCmd::UniformMatrix4 { location, value } => {
                    let Some(index) = program else {
                        panic!("UniformMatrix4 with no active program");
                    };
                    let slot = self.programs[index].uniform(*location);
                    self.queue
                        .write_buffer(&slot.buffer, 0, bytemuck::cast_slice(value.as_slice()));
                }
                DrawCmd::VertexAttrib { location, buffer, item_size } => {
                    assert!(
                        (buffer.0 as usize) < self.buffers.len(),
                        "VertexAttrib with unknown buffer {buffer:?}"
                    );
                    attribs.retain(|(l, _, _)| l != location);
                    attribs.push((*location, *buffer, *item_size));
                }
                DrawCmd::DrawArrays { first, count } => {
                    let Some(index) = program else {
                        panic!("DrawArrays with no active program");
                    };
                    attribs.sort_by_key(|(l, _, _)| *l);
                    let gpu_program = &mut self.programs[index];
                    gpu_program.assert_attributes_sourced(&attribs);

                    let key = PipelineKey {
                        attribs: attribs.iter().map(|(l, _, size)| (l.0, *size)).collect(),
                        depth: depth_enabled,
                    };
                    if !gpu_program.pipelines.contains_key(&key) {
                        let pipeline =
                            build_pipeline(&self.device, self.config.format, gpu_program, &key);
                        gpu_program.pipelines.insert(key.clone(), pipeline);
                    }

                    plan.draws.push(PlannedDraw {
                        program: index,
                        key,
                        buffers: attribs.iter().map(|(_, b, _)| *b).collect(),
                        vertices: *first..*first + *count,
                    });
                }
            }
        }

        plan
    }
}

impl Backend for WgpuBackend<'_> {
    fn enable_depth_test(&mut self) {
        if self.depth_view.is_none() {
            self.depth_view = Some(self.create_depth_view());
        }
    }

    fn set_clear_color(&mut self, color: Color) {
        self.clear_color = color.to_wgpu();
    }

    fn create_vertex_buffer(&mut self, label: &str, data: &[f32]) -> RenderResult<BufferId> {
        let requested = std::mem::size_of_val(data) as u64;
        if requested > self.device.limits().max_buffer_size {
            log::error!("vertex buffer `{label}` of {requested} bytes exceeds device limits");
            return Err(RenderError::ResourceExhausted { requested });
        }

        let buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(data),
            usage: wgpu::BufferUsages::VERTEX,
        });

        self.buffers.push(buffer);
        Ok(BufferId(self.buffers.len() as u32 - 1))
    }

    fn create_program(&mut self, desc: &ProgramDesc<'_>) -> RenderResult<ProgramId> {
        let program = GpuProgram::new(&self.device, desc);
        self.programs.push(program);
        Ok(ProgramId(self.programs.len() as u32 - 1))
    }

    fn submit(&mut self, frame: &FrameCommands) -> PresentOutcome {
        let surface_texture = match self.surface.get_current_texture() {
            Ok(t) => t,
            Err(err) => {
                return surface::map_surface_error(
                    &self.surface,
                    &self.device,
                    &self.config,
                    self.size,
                    err,
                );
            }
        };

        let plan = self.plan(frame);

        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("rotor frame encoder"),
            });

        {
            let color_load = if plan.clear_color {
                wgpu::LoadOp::Clear(self.clear_color)
            } else {
                wgpu::LoadOp::Load
            };
            let depth_load = if plan.clear_depth {
                wgpu::LoadOp::Clear(1.0)
            } else {
                wgpu::LoadOp::Load
            };

            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("rotor frame pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: color_load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: self.depth_view.as_ref().map(|depth_view| {
                    wgpu::RenderPassDepthStencilAttachment {
                        view: depth_view,
                        depth_ops: Some(wgpu::Operations {
                            load: depth_load,
                            store: wgpu::StoreOp::Store,
                        }),
                        stencil_ops: None,
                    }
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            if let Some((w, h)) = plan.viewport {
                // wgpu rejects viewports larger than the attachment.
                let w = w.min(self.config.width) as f32;
                let h = h.min(self.config.height) as f32;
                rpass.set_viewport(0.0, 0.0, w, h, 0.0, 1.0);
            }

            for draw in &plan.draws {
                let program = &self.programs[draw.program];
                rpass.set_pipeline(&program.pipelines[&draw.key]);
                for (group, bind_group) in program.bind_groups.iter().enumerate() {
                    rpass.set_bind_group(group as u32, bind_group, &[]);
                }
                for (slot, buffer) in draw.buffers.iter().enumerate() {
                    rpass.set_vertex_buffer(slot as u32, self.buffers[buffer.0 as usize].slice(..));
                }
                rpass.draw(draw.vertices.clone(), 0..1);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        surface_texture.present();

        PresentOutcome::Presented
    }
}

#[derive(Default)]
struct FramePlan {
    viewport: Option<(u32, u32)>,
    clear_color: bool,
    clear_depth: bool,
    draws: Vec<PlannedDraw>,
}

struct PlannedDraw {
    program: usize,
    key: PipelineKey,
    /// Vertex buffers in slot order (attributes sorted by location).
    buffers: Vec<BufferId>,
    vertices: std::ops::Range<u32>,
}

/// Vertex layout plus depth state a render pipeline was built for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct PipelineKey {
    /// `(shader location, item size)` sorted by location.
    attribs: Vec<(u32, u32)>,
    depth: bool,
}

struct UniformSlot {
    location: UniformLocation,
    buffer: wgpu::Buffer,
}

/// Realized program: shader modules, uniform storage and lazily built pipelines.
struct GpuProgram {
    label: String,
    vertex_module: wgpu::ShaderModule,
    fragment_module: wgpu::ShaderModule,
    vertex_entry: String,
    fragment_entry: String,
    attributes: Vec<ActiveAttribute>,
    uniforms: Vec<UniformSlot>,
    /// One bind group per group index, starting at 0.
    bind_groups: Vec<wgpu::BindGroup>,
    layout: wgpu::PipelineLayout,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
}

impl GpuProgram {
    fn new(device: &wgpu::Device, desc: &ProgramDesc<'_>) -> Self {
        let vertex_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(desc.label),
            source: wgpu::ShaderSource::Wgsl(desc.vertex.source.into()),
        });
        let fragment_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(desc.label),
            source: wgpu::ShaderSource::Wgsl(desc.fragment.source.into()),
        });

        let uniforms: Vec<UniformSlot> = desc
            .uniforms
            .iter()
            .map(|u| UniformSlot {
                location: u.location,
                buffer: device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some(u.name.as_str()),
                    // Uniform buffer bindings must be 16-byte aligned.
                    size: (u.size as u64).next_multiple_of(16),
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                }),
            })
            .collect();

        let group_count = desc
            .uniforms
            .iter()
            .map(|u| u.location.group + 1)
            .max()
            .unwrap_or(0);

        let mut layouts = Vec::with_capacity(group_count as usize);
        let mut bind_groups = Vec::with_capacity(group_count as usize);
        for group in 0..group_count {
            let members: Vec<(&UniformSlot, u32)> = uniforms
                .iter()
                .zip(desc.uniforms)
                .filter(|(slot, _)| slot.location.group == group)
                .map(|(slot, u)| (slot, u.size))
                .collect();

            let layout_entries: Vec<wgpu::BindGroupLayoutEntry> = members
                .iter()
                .map(|(slot, size)| wgpu::BindGroupLayoutEntry {
                    binding: slot.location.binding,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: NonZeroU64::new(*size as u64),
                    },
                    count: None,
                })
                .collect();

            let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some(desc.label),
                entries: &layout_entries,
            });

            let entries: Vec<wgpu::BindGroupEntry> = members
                .iter()
                .map(|(slot, _)| wgpu::BindGroupEntry {
                    binding: slot.location.binding,
                    resource: slot.buffer.as_entire_binding(),
                })
                .collect();

            bind_groups.push(device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(desc.label),
                layout: &layout,
                entries: &entries,
            }));
            layouts.push(layout);
        }

        let layout_refs: Vec<&wgpu::BindGroupLayout> = layouts.iter().collect();
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(desc.label),
            bind_group_layouts: &layout_refs,
            immediate_size: 0,
        });

        Self {
            label: desc.label.to_string(),
            vertex_module,
            fragment_module,
            vertex_entry: desc.vertex.entry_point.to_string(),
            fragment_entry: desc.fragment.entry_point.to_string(),
            attributes: desc.attributes.to_vec(),
            uniforms,
            bind_groups,
            layout,
            pipelines: HashMap::new(),
        }
    }

    fn uniform(&self, location: UniformLocation) -> &UniformSlot {
        self.uniforms
            .iter()
            .find(|u| u.location == location)
            .unwrap_or_else(|| panic!("program `{}` has no uniform at {location}", self.label))
    }

    /// Every enabled attribute must be sourced, and nothing else.
    fn assert_attributes_sourced(&self, attribs: &[(AttribLocation, BufferId, u32)]) {
        for attr in &self.attributes {
            assert!(
                attribs.iter().any(|(l, _, _)| *l == attr.location),
                "attribute `{}` enabled but not sourced",
                attr.name
            );
        }
        for (location, _, _) in attribs {
            assert!(
                self.attributes.iter().any(|a| a.location == *location),
                "program `{}` has no attribute at {location:?}",
                self.label
            );
        }
    }
}

fn build_pipeline(
    device: &wgpu::Device,
    format: wgpu::TextureFormat,
    program: &GpuProgram,
    key: &PipelineKey,
) -> wgpu::RenderPipeline {
    let attributes: Vec<[wgpu::VertexAttribute; 1]> = key
        .attribs
        .iter()
        .map(|&(location, item_size)| {
            [wgpu::VertexAttribute {
                format: surface::float_vertex_format(item_size),
                offset: 0,
                shader_location: location,
            }]
        })
        .collect();

    let buffers: Vec<wgpu::VertexBufferLayout<'_>> = key
        .attribs
        .iter()
        .zip(&attributes)
        .map(|(&(_, item_size), attrs)| wgpu::VertexBufferLayout {
            array_stride: item_size as u64 * std::mem::size_of::<f32>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: attrs,
        })
        .collect();

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(program.label.as_str()),
        layout: Some(&program.layout),

        vertex: wgpu::VertexState {
            module: &program.vertex_module,
            entry_point: Some(program.vertex_entry.as_str()),
            compilation_options: Default::default(),
            buffers: &buffers,
        },

        fragment: Some(wgpu::FragmentState {
            module: &program.fragment_module,
            entry_point: Some(program.fragment_entry.as_str()),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),

        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },

        depth_stencil: key.depth.then(|| wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),

        multiview_mask: None,
        cache: None,
    })
}
