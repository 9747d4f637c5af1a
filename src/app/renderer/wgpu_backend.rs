//! Windowed backend on top of wgpu
//!
//! Stages are WGSL shader modules and a linked program is a render pipeline
//! built from a vertex and a fragment module. Compile and link errors are
//! captured with validation error scopes so a broken shader reaches the
//! caller as a [`GfxError`] instead of the device's uncaptured error handler.
//!
//! `clear` and `draw` are recorded while a frame is open and encoded into
//! render passes on `present`: every clear starts a new pass.

use std::marker::PhantomData;
use std::rc::Rc;
use std::sync::Arc;

use tokio::runtime::Handle;
use tracing::{debug, info, warn};
use wgpu::util::DeviceExt;
use wgpu::{Device, Queue, Surface, SurfaceConfiguration};
use winit::window::Window;

use super::handle::HandleTable;
use super::{
    BufferId, ClearColor, DrawCall, FrameError, GfxError, GraphicsBackend, ProgramId, ShaderStage,
    StageId, VertexArrayId, VertexLayout,
};

struct StageModule {
    stage: ShaderStage,
    label: String,
    module: wgpu::ShaderModule,
}

struct VertexArray {
    vertex_buffer: BufferId,
    element_buffer: Option<BufferId>,
}

struct DrawOp {
    pipeline: wgpu::RenderPipeline,
    vertex_buffer: wgpu::Buffer,
    element_buffer: Option<wgpu::Buffer>,
    call: DrawCall,
}

/// Draws between two clears
struct Pass {
    clear: Option<wgpu::Color>,
    draws: Vec<DrawOp>,
}

struct Frame {
    output: wgpu::SurfaceTexture,
    passes: Vec<Pass>,
}

/// GPU backend bound to one window surface
pub struct WgpuBackend {
    window: Arc<Window>,
    surface: Surface<'static>,
    device: Device,
    queue: Queue,
    config: SurfaceConfiguration,
    runtime: Handle,
    stages: HandleTable<StageId, StageModule>,
    programs: HandleTable<ProgramId, wgpu::RenderPipeline>,
    buffers: HandleTable<BufferId, wgpu::Buffer>,
    vertex_arrays: HandleTable<VertexArrayId, VertexArray>,
    frame: Option<Frame>,
    // GPU calls stay on the task that created the backend
    _not_send: PhantomData<Rc<()>>,
}

impl WgpuBackend {
    /// Creates the device and configures a surface for `window`
    ///
    /// `runtime` is used to wait on error scopes from synchronous calls, so
    /// those calls must not be made from inside the runtime.
    pub async fn new(window: Arc<Window>, vsync: bool, runtime: Handle) -> anyhow::Result<Self> {
        info!("Initializing wgpu backend");

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;

        info!(
            adapter.name = adapter.get_info().name,
            adapter.backend = ?adapter.get_info().backend,
            "Found GPU adapter"
        );

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Main Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
                experimental_features: Default::default(),
            })
            .await?;

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| anyhow::anyhow!("surface reports no supported formats"))?;

        let config = SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: if vsync {
                wgpu::PresentMode::AutoVsync
            } else {
                wgpu::PresentMode::AutoNoVsync
            },
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        surface.configure(&device, &config);

        info!(
            surface.width = config.width,
            surface.height = config.height,
            surface.format = ?config.format,
            vsync,
            "Surface configured"
        );

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            runtime,
            stages: HandleTable::new(),
            programs: HandleTable::new(),
            buffers: HandleTable::new(),
            vertex_arrays: HandleTable::new(),
            frame: None,
            _not_send: PhantomData,
        })
    }

    /// Resizes the surface; zero sizes (minimized windows) are ignored
    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);

            info!(
                width = new_size.width,
                height = new_size.height,
                "Surface resized"
            );
        }
    }

    /// Pops the innermost error scope, waiting on the device if needed
    fn pop_error_scope(&self) -> Option<wgpu::Error> {
        self.runtime.block_on(self.device.pop_error_scope())
    }

    /// Compiler messages for `module`, one per line
    fn compilation_log(&self, module: &wgpu::ShaderModule, fallback: &wgpu::Error) -> String {
        let info = self.runtime.block_on(module.get_compilation_info());
        let lines: Vec<String> = info
            .messages
            .iter()
            .filter(|m| matches!(m.message_type, wgpu::CompilationMessageType::Error))
            .map(|m| match &m.location {
                Some(loc) => format!("{}:{}: {}", loc.line_number, loc.line_position, m.message),
                None => m.message.clone(),
            })
            .collect();

        if lines.is_empty() {
            fallback.to_string()
        } else {
            lines.join("\n")
        }
    }

    fn stage(&self, id: StageId, expected: ShaderStage) -> Result<&StageModule, GfxError> {
        let stage = self.stages.get(id).ok_or(GfxError::UnknownHandle {
            kind: StageId::KIND,
            id: id.get(),
        })?;
        if stage.stage != expected {
            return Err(GfxError::Link {
                label: stage.label.clone(),
                log: format!("{id} is a {} stage, expected {expected}", stage.stage),
            });
        }
        Ok(stage)
    }

    fn buffer(&self, id: BufferId) -> Result<&wgpu::Buffer, GfxError> {
        self.buffers.get(id).ok_or(GfxError::UnknownHandle {
            kind: BufferId::KIND,
            id: id.get(),
        })
    }

    fn create_buffer(&mut self, label: &str, contents: &[u8], usage: wgpu::BufferUsages) -> BufferId {
        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents,
                usage,
            });
        let id = self.buffers.insert(buffer);
        debug!(%id, bytes = contents.len(), label, "Buffer created");
        id
    }
}

impl From<ClearColor> for wgpu::Color {
    fn from(ClearColor([r, g, b, a]): ClearColor) -> Self {
        wgpu::Color { r, g, b, a }
    }
}

impl GraphicsBackend for WgpuBackend {
    fn compile_stage(
        &mut self,
        stage: ShaderStage,
        label: &str,
        source: &str,
    ) -> Result<StageId, GfxError> {
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let module = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(label),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            });

        if let Some(err) = self.pop_error_scope() {
            return Err(GfxError::Compile {
                stage,
                label: label.to_string(),
                log: self.compilation_log(&module, &err),
            });
        }

        let id = self.stages.insert(StageModule {
            stage,
            label: label.to_string(),
            module,
        });
        debug!(%id, %stage, label, "Shader stage compiled");
        Ok(id)
    }

    fn link_program(
        &mut self,
        vertex: StageId,
        fragment: StageId,
        layout: &VertexLayout,
    ) -> Result<ProgramId, GfxError> {
        let vs = self.stage(vertex, ShaderStage::Vertex)?;
        let fs = self.stage(fragment, ShaderStage::Fragment)?;
        let label = format!("{} + {}", vs.label, fs.label);
        let attributes = layout.wgpu_attributes();

        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let pipeline = self
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(&label),
                layout: None,
                vertex: wgpu::VertexState {
                    module: &vs.module,
                    entry_point: Some(ShaderStage::Vertex.entry_point()),
                    buffers: &[wgpu::VertexBufferLayout {
                        array_stride: layout.stride_bytes(),
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &attributes,
                    }],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &fs.module,
                    entry_point: Some(ShaderStage::Fragment.entry_point()),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: self.config.format,
                        blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    unclipped_depth: false,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    conservative: false,
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState {
                    count: 1,
                    mask: !0,
                    alpha_to_coverage_enabled: false,
                },
                multiview: None,
                cache: None,
            });

        if let Some(err) = self.pop_error_scope() {
            return Err(GfxError::Link {
                label,
                log: err.to_string(),
            });
        }

        let id = self.programs.insert(pipeline);
        debug!(%id, label, "Program linked");
        Ok(id)
    }

    fn release_stage(&mut self, id: StageId) {
        self.stages.remove(id);
    }

    fn release_program(&mut self, id: ProgramId) {
        if self.programs.remove(id).is_some() {
            debug!(%id, "Program released");
        }
    }

    fn create_vertex_buffer(&mut self, data: &[f32]) -> BufferId {
        self.create_buffer(
            "Vertex Buffer",
            bytemuck::cast_slice(data),
            wgpu::BufferUsages::VERTEX,
        )
    }

    fn create_element_buffer(&mut self, data: &[u32]) -> BufferId {
        self.create_buffer(
            "Element Buffer",
            bytemuck::cast_slice(data),
            wgpu::BufferUsages::INDEX,
        )
    }

    fn create_vertex_array(
        &mut self,
        vertex_buffer: BufferId,
        element_buffer: Option<BufferId>,
        _layout: &VertexLayout,
    ) -> Result<VertexArrayId, GfxError> {
        // wgpu binds buffers per draw; the array only pairs them up
        self.buffer(vertex_buffer)?;
        if let Some(element_buffer) = element_buffer {
            self.buffer(element_buffer)?;
        }

        Ok(self.vertex_arrays.insert(VertexArray {
            vertex_buffer,
            element_buffer,
        }))
    }

    fn release_buffer(&mut self, id: BufferId) {
        if let Some(buffer) = self.buffers.remove(id) {
            buffer.destroy();
        }
    }

    fn release_vertex_array(&mut self, id: VertexArrayId) {
        self.vertex_arrays.remove(id);
    }

    fn begin_frame(&mut self) -> Result<(), FrameError> {
        if self.frame.is_some() {
            warn!("Previous frame was never presented, dropping it");
            self.frame = None;
        }

        let output = match self.surface.get_current_texture() {
            Ok(output) => output,
            Err(err @ (wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)) => {
                warn!(error = %err, "Surface lost, reconfiguring");
                self.surface.configure(&self.device, &self.config);
                return Err(err.into());
            }
            Err(err) => return Err(err.into()),
        };

        self.frame = Some(Frame {
            output,
            passes: Vec::new(),
        });
        Ok(())
    }

    fn clear(&mut self, color: ClearColor) {
        let Some(frame) = self.frame.as_mut() else {
            warn!("Clear with no frame in progress");
            return;
        };

        match frame.passes.last_mut() {
            // Nothing drawn since the last clear; the new colour replaces it
            Some(pass) if pass.draws.is_empty() => pass.clear = Some(color.into()),
            _ => frame.passes.push(Pass {
                clear: Some(color.into()),
                draws: Vec::new(),
            }),
        }
    }

    fn draw(
        &mut self,
        program: ProgramId,
        vertex_array: VertexArrayId,
        call: DrawCall,
    ) -> Result<(), GfxError> {
        if self.frame.is_none() {
            return Err(GfxError::NoFrame);
        }

        let pipeline = self
            .programs
            .get(program)
            .ok_or(GfxError::UnknownHandle {
                kind: ProgramId::KIND,
                id: program.get(),
            })?
            .clone();
        let array = self
            .vertex_arrays
            .get(vertex_array)
            .ok_or(GfxError::UnknownHandle {
                kind: VertexArrayId::KIND,
                id: vertex_array.get(),
            })?;
        let vertex_buffer = self.buffer(array.vertex_buffer)?.clone();
        let element_buffer = match (call, array.element_buffer) {
            (DrawCall::Elements { .. }, None) => {
                return Err(GfxError::UnknownHandle {
                    kind: BufferId::KIND,
                    id: 0,
                });
            }
            (_, Some(id)) => Some(self.buffer(id)?.clone()),
            (_, None) => None,
        };

        let op = DrawOp {
            pipeline,
            vertex_buffer,
            element_buffer,
            call,
        };

        let Some(frame) = self.frame.as_mut() else {
            return Err(GfxError::NoFrame);
        };
        match frame.passes.last_mut() {
            Some(pass) => pass.draws.push(op),
            None => frame.passes.push(Pass {
                clear: None,
                draws: vec![op],
            }),
        }
        Ok(())
    }

    fn present(&mut self) -> Result<(), FrameError> {
        let Some(frame) = self.frame.take() else {
            return Err(FrameError::NoFrame);
        };

        let view = frame
            .output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        for pass in &frame.passes {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Model Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: match pass.clear {
                            Some(color) => wgpu::LoadOp::Clear(color),
                            None => wgpu::LoadOp::Load,
                        },
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            for op in &pass.draws {
                rpass.set_pipeline(&op.pipeline);
                rpass.set_vertex_buffer(0, op.vertex_buffer.slice(..));
                match (op.call, &op.element_buffer) {
                    (DrawCall::Elements { index_count }, Some(elements)) => {
                        rpass.set_index_buffer(elements.slice(..), wgpu::IndexFormat::Uint32);
                        rpass.draw_indexed(0..index_count, 0, 0..1);
                    }
                    (call, _) => rpass.draw(0..call.count(), 0..1),
                }
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        self.window.pre_present_notify();
        frame.output.present();
        Ok(())
    }
}
