//! Headless backend that records every GPU call
//!
//! Nothing is drawn. The backend keeps the same handle bookkeeping as a real
//! context (unknown or released handles are errors) and models the
//! framebuffer as "last clear colour plus draws since that clear", which is
//! enough to observe what the render loop asked the GPU to do.

use std::collections::VecDeque;

use tracing::trace;

use super::handle::HandleTable;
use super::{
    BufferId, ClearColor, DrawCall, FrameError, GfxError, GraphicsBackend, ProgramId, ShaderStage,
    StageId, VertexArrayId, VertexLayout,
};

/// A recorded backend call
#[derive(Debug, Clone, PartialEq)]
pub enum GfxCall {
    CompileStage { stage: ShaderStage, label: String },
    LinkProgram { program: ProgramId },
    ReleaseStage(StageId),
    ReleaseProgram(ProgramId),
    CreateBuffer { buffer: BufferId, len: usize },
    CreateVertexArray(VertexArrayId),
    ReleaseBuffer(BufferId),
    ReleaseVertexArray(VertexArrayId),
    BeginFrame,
    Clear(ClearColor),
    Draw {
        program: ProgramId,
        vertex_array: VertexArrayId,
        call: DrawCall,
    },
    Present,
}

impl GfxCall {
    /// Returns true for calls that touch the framebuffer
    pub fn is_frame_call(&self) -> bool {
        matches!(
            self,
            Self::BeginFrame | Self::Clear(_) | Self::Draw { .. } | Self::Present
        )
    }
}

/// Modelled framebuffer contents
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Framebuffer {
    /// Colour of the most recent clear, if any
    pub clear_color: Option<ClearColor>,
    /// Draws issued since the most recent clear
    pub draws_since_clear: usize,
}

struct VertexArrayEntry {
    vertex_buffer: BufferId,
    element_buffer: Option<BufferId>,
}

struct PendingFailure {
    stage: Option<ShaderStage>,
    log: String,
}

/// Records calls instead of talking to a GPU
pub struct RecordingBackend {
    calls: Vec<GfxCall>,
    stages: HandleTable<StageId, ShaderStage>,
    programs: HandleTable<ProgramId, ()>,
    buffers: HandleTable<BufferId, usize>,
    vertex_arrays: HandleTable<VertexArrayId, VertexArrayEntry>,
    framebuffer: Framebuffer,
    frame_open: bool,
    compile_failures: VecDeque<PendingFailure>,
    link_failures: VecDeque<String>,
    frame_failures: VecDeque<FrameError>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            stages: HandleTable::new(),
            programs: HandleTable::new(),
            buffers: HandleTable::new(),
            vertex_arrays: HandleTable::new(),
            framebuffer: Framebuffer::default(),
            frame_open: false,
            compile_failures: VecDeque::new(),
            link_failures: VecDeque::new(),
            frame_failures: VecDeque::new(),
        }
    }

    /// Makes the next compile of `stage` (or of any stage, if `None`) fail
    /// with `log`
    pub fn fail_next_compile(&mut self, stage: Option<ShaderStage>, log: impl Into<String>) {
        self.compile_failures.push_back(PendingFailure {
            stage,
            log: log.into(),
        });
    }

    /// Makes the next link fail with `log`
    pub fn fail_next_link(&mut self, log: impl Into<String>) {
        self.link_failures.push_back(log.into());
    }

    /// Makes the next `begin_frame` fail with `err`
    pub fn fail_next_frame(&mut self, err: FrameError) {
        self.frame_failures.push_back(err);
    }

    /// All calls in issue order
    pub fn calls(&self) -> &[GfxCall] {
        &self.calls
    }

    /// Drops the call log, keeping live objects
    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    pub fn framebuffer(&self) -> Framebuffer {
        self.framebuffer
    }

    /// Every draw call issued so far
    pub fn draws(&self) -> Vec<DrawCall> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                GfxCall::Draw { call, .. } => Some(*call),
                _ => None,
            })
            .collect()
    }

    /// Number of `present` calls
    pub fn frames_presented(&self) -> usize {
        self.count(|call| matches!(call, GfxCall::Present))
    }

    /// Number of successful program links
    pub fn programs_linked(&self) -> usize {
        self.count(|call| matches!(call, GfxCall::LinkProgram { .. }))
    }

    /// Counts calls matching `predicate`
    pub fn count(&self, predicate: impl Fn(&GfxCall) -> bool) -> usize {
        self.calls.iter().filter(|call| predicate(call)).count()
    }

    /// Returns true if `program` is linked and not yet released
    pub fn is_program_live(&self, program: ProgramId) -> bool {
        self.programs.contains(program)
    }

    /// Number of GPU objects not yet released
    pub fn live_objects(&self) -> usize {
        self.stages.len() + self.programs.len() + self.buffers.len() + self.vertex_arrays.len()
    }

    fn take_compile_failure(&mut self, stage: ShaderStage) -> Option<String> {
        let position = self
            .compile_failures
            .iter()
            .position(|f| f.stage.is_none_or(|s| s == stage))?;
        self.compile_failures.remove(position).map(|f| f.log)
    }
}

impl Default for RecordingBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphicsBackend for RecordingBackend {
    fn compile_stage(
        &mut self,
        stage: ShaderStage,
        label: &str,
        source: &str,
    ) -> Result<StageId, GfxError> {
        if let Some(log) = self.take_compile_failure(stage) {
            return Err(GfxError::Compile {
                stage,
                label: label.to_string(),
                log,
            });
        }
        if !source.contains(stage.entry_point()) {
            return Err(GfxError::Compile {
                stage,
                label: label.to_string(),
                log: format!("missing entry point `{}`", stage.entry_point()),
            });
        }

        let id = self.stages.insert(stage);
        trace!(%id, %stage, label, "recorded stage compile");
        self.calls.push(GfxCall::CompileStage {
            stage,
            label: label.to_string(),
        });
        Ok(id)
    }

    fn link_program(
        &mut self,
        vertex: StageId,
        fragment: StageId,
        _layout: &VertexLayout,
    ) -> Result<ProgramId, GfxError> {
        for (id, expected) in [(vertex, ShaderStage::Vertex), (fragment, ShaderStage::Fragment)] {
            match self.stages.get(id) {
                Some(stage) if *stage == expected => {}
                Some(stage) => {
                    return Err(GfxError::Link {
                        label: "program".to_string(),
                        log: format!("{id} is a {stage} stage, expected {expected}"),
                    });
                }
                None => {
                    return Err(GfxError::UnknownHandle {
                        kind: StageId::KIND,
                        id: id.get(),
                    });
                }
            }
        }

        if let Some(log) = self.link_failures.pop_front() {
            return Err(GfxError::Link {
                label: "program".to_string(),
                log,
            });
        }

        let program = self.programs.insert(());
        self.calls.push(GfxCall::LinkProgram { program });
        Ok(program)
    }

    fn release_stage(&mut self, id: StageId) {
        if self.stages.remove(id).is_some() {
            self.calls.push(GfxCall::ReleaseStage(id));
        }
    }

    fn release_program(&mut self, id: ProgramId) {
        if self.programs.remove(id).is_some() {
            self.calls.push(GfxCall::ReleaseProgram(id));
        }
    }

    fn create_vertex_buffer(&mut self, data: &[f32]) -> BufferId {
        let buffer = self.buffers.insert(data.len());
        self.calls.push(GfxCall::CreateBuffer {
            buffer,
            len: data.len(),
        });
        buffer
    }

    fn create_element_buffer(&mut self, data: &[u32]) -> BufferId {
        let buffer = self.buffers.insert(data.len());
        self.calls.push(GfxCall::CreateBuffer {
            buffer,
            len: data.len(),
        });
        buffer
    }

    fn create_vertex_array(
        &mut self,
        vertex_buffer: BufferId,
        element_buffer: Option<BufferId>,
        _layout: &VertexLayout,
    ) -> Result<VertexArrayId, GfxError> {
        for buffer in std::iter::once(vertex_buffer).chain(element_buffer) {
            if !self.buffers.contains(buffer) {
                return Err(GfxError::UnknownHandle {
                    kind: BufferId::KIND,
                    id: buffer.get(),
                });
            }
        }

        let id = self.vertex_arrays.insert(VertexArrayEntry {
            vertex_buffer,
            element_buffer,
        });
        self.calls.push(GfxCall::CreateVertexArray(id));
        Ok(id)
    }

    fn release_buffer(&mut self, id: BufferId) {
        if self.buffers.remove(id).is_some() {
            self.calls.push(GfxCall::ReleaseBuffer(id));
        }
    }

    fn release_vertex_array(&mut self, id: VertexArrayId) {
        if self.vertex_arrays.remove(id).is_some() {
            self.calls.push(GfxCall::ReleaseVertexArray(id));
        }
    }

    fn begin_frame(&mut self) -> Result<(), FrameError> {
        if let Some(err) = self.frame_failures.pop_front() {
            return Err(err);
        }
        self.frame_open = true;
        self.calls.push(GfxCall::BeginFrame);
        Ok(())
    }

    fn clear(&mut self, color: ClearColor) {
        self.framebuffer = Framebuffer {
            clear_color: Some(color),
            draws_since_clear: 0,
        };
        self.calls.push(GfxCall::Clear(color));
    }

    fn draw(
        &mut self,
        program: ProgramId,
        vertex_array: VertexArrayId,
        call: DrawCall,
    ) -> Result<(), GfxError> {
        if !self.frame_open {
            return Err(GfxError::NoFrame);
        }
        if !self.programs.contains(program) {
            return Err(GfxError::UnknownHandle {
                kind: ProgramId::KIND,
                id: program.get(),
            });
        }
        let Some(entry) = self.vertex_arrays.get(vertex_array) else {
            return Err(GfxError::UnknownHandle {
                kind: VertexArrayId::KIND,
                id: vertex_array.get(),
            });
        };
        if matches!(call, DrawCall::Elements { .. }) && entry.element_buffer.is_none() {
            return Err(GfxError::UnknownHandle {
                kind: BufferId::KIND,
                id: 0,
            });
        }
        debug_assert!(self.buffers.contains(entry.vertex_buffer));

        self.framebuffer.draws_since_clear += 1;
        self.calls.push(GfxCall::Draw {
            program,
            vertex_array,
            call,
        });
        Ok(())
    }

    fn present(&mut self) -> Result<(), FrameError> {
        if !self.frame_open {
            return Err(FrameError::NoFrame);
        }
        self.frame_open = false;
        self.calls.push(GfxCall::Present);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VS: &str = "@vertex fn vs_main() {}";
    const FS: &str = "@fragment fn fs_main() {}";

    fn linked(backend: &mut RecordingBackend) -> ProgramId {
        let layout = VertexLayout::position_only();
        let vs = backend.compile_stage(ShaderStage::Vertex, "vs", VS).unwrap();
        let fs = backend
            .compile_stage(ShaderStage::Fragment, "fs", FS)
            .unwrap();
        backend.link_program(vs, fs, &layout).unwrap()
    }

    #[test]
    fn test_repeated_clear_is_idempotent() {
        let mut backend = RecordingBackend::new();
        let color = ClearColor([0.1, 0.2, 0.3, 1.0]);

        backend.begin_frame().unwrap();
        backend.clear(color);
        let once = backend.framebuffer();
        backend.clear(color);
        backend.clear(color);

        assert_eq!(backend.framebuffer(), once);
        assert_eq!(once.clear_color, Some(color));
        assert_eq!(once.draws_since_clear, 0);
    }

    #[test]
    fn test_injected_compile_failure_targets_stage() {
        let mut backend = RecordingBackend::new();
        backend.fail_next_compile(Some(ShaderStage::Fragment), "bad token");

        assert!(
            backend
                .compile_stage(ShaderStage::Vertex, "vs", VS)
                .is_ok()
        );
        let err = backend
            .compile_stage(ShaderStage::Fragment, "fs", FS)
            .unwrap_err();
        assert!(matches!(err, GfxError::Compile { ref log, .. } if log == "bad token"));

        // Failure is consumed
        assert!(
            backend
                .compile_stage(ShaderStage::Fragment, "fs", FS)
                .is_ok()
        );
    }

    #[test]
    fn test_link_rejects_swapped_stages() {
        let mut backend = RecordingBackend::new();
        let layout = VertexLayout::position_only();
        let vs = backend.compile_stage(ShaderStage::Vertex, "vs", VS).unwrap();
        let fs = backend
            .compile_stage(ShaderStage::Fragment, "fs", FS)
            .unwrap();

        assert!(matches!(
            backend.link_program(fs, vs, &layout),
            Err(GfxError::Link { .. })
        ));
    }

    #[test]
    fn test_draw_requires_open_frame() {
        let mut backend = RecordingBackend::new();
        let program = linked(&mut backend);
        let vbo = backend.create_vertex_buffer(&[0.0; 9]);
        let vao = backend
            .create_vertex_array(vbo, None, &VertexLayout::position_only())
            .unwrap();
        let call = DrawCall::Arrays { vertex_count: 3 };

        assert_eq!(backend.draw(program, vao, call), Err(GfxError::NoFrame));

        backend.begin_frame().unwrap();
        backend.draw(program, vao, call).unwrap();
        backend.present().unwrap();
        assert_eq!(backend.draws(), vec![call]);
        assert_eq!(backend.frames_presented(), 1);
    }

    #[test]
    fn test_release_tracks_live_objects() {
        let mut backend = RecordingBackend::new();
        let program = linked(&mut backend);
        // two stages + one program
        assert_eq!(backend.live_objects(), 3);

        backend.release_program(program);
        backend.release_program(program);
        assert!(!backend.is_program_live(program));
        assert_eq!(
            backend.count(|c| matches!(c, GfxCall::ReleaseProgram(_))),
            1
        );
    }
}
