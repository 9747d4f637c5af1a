//! Shader program built from two source files, rebuildable in place
//!
//! A program is compiled from a vertex and a fragment source file and linked
//! against the model's vertex layout. [`ShaderProgram::rebuild`] re-reads the
//! same two files and swaps in the new program only if every step succeeds,
//! so a broken edit leaves the running program untouched.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use super::renderer::{GfxError, GraphicsBackend, ProgramId, ShaderStage, StageId, VertexLayout};

/// Errors building a shader program
#[derive(Error, Debug)]
pub enum ShaderError {
    #[error("failed to read shader source {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}: {source}")]
    Compile {
        path: PathBuf,
        #[source]
        source: GfxError,
    },

    #[error(transparent)]
    Link(GfxError),
}

impl ShaderError {
    /// Compiler or linker output, if the failure came from the GPU
    pub fn log(&self) -> Option<&str> {
        match self {
            Self::Compile {
                source: GfxError::Compile { log, .. },
                ..
            }
            | Self::Link(GfxError::Link { log, .. }) => Some(log.as_str()),
            _ => None,
        }
    }
}

/// A linked vertex + fragment program and the files it came from
#[derive(Debug)]
pub struct ShaderProgram {
    vertex_path: PathBuf,
    fragment_path: PathBuf,
    layout: VertexLayout,
    program: ProgramId,
    generation: u32,
}

impl ShaderProgram {
    /// Compiles both stages and links them
    pub fn build<G: GraphicsBackend + ?Sized>(
        gfx: &mut G,
        vertex_path: impl Into<PathBuf>,
        fragment_path: impl Into<PathBuf>,
        layout: &VertexLayout,
    ) -> Result<Self, ShaderError> {
        let vertex_path = vertex_path.into();
        let fragment_path = fragment_path.into();
        let program = compile_and_link(gfx, &vertex_path, &fragment_path, layout)?;

        info!(
            %program,
            vertex = %vertex_path.display(),
            fragment = %fragment_path.display(),
            "Shader program linked"
        );

        Ok(Self {
            vertex_path,
            fragment_path,
            layout: layout.clone(),
            program,
            generation: 0,
        })
    }

    /// Re-reads both sources from disk and relinks
    ///
    /// On success the old program is released and replaced. On failure
    /// nothing changes and the old program stays valid.
    pub fn rebuild<G: GraphicsBackend + ?Sized>(&mut self, gfx: &mut G) -> Result<(), ShaderError> {
        let program = compile_and_link(gfx, &self.vertex_path, &self.fragment_path, &self.layout)?;
        let old = std::mem::replace(&mut self.program, program);
        gfx.release_program(old);
        self.generation += 1;

        info!(
            %old,
            new = %program,
            generation = self.generation,
            "Shader program rebuilt"
        );
        Ok(())
    }

    /// The currently linked program
    pub fn handle(&self) -> ProgramId {
        self.program
    }

    /// Number of successful rebuilds
    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn vertex_path(&self) -> &Path {
        &self.vertex_path
    }

    pub fn fragment_path(&self) -> &Path {
        &self.fragment_path
    }

    pub fn release<G: GraphicsBackend + ?Sized>(self, gfx: &mut G) {
        debug!(program = %self.program, "Releasing shader program");
        gfx.release_program(self.program);
    }
}

fn read_source(path: &Path) -> Result<String, ShaderError> {
    std::fs::read_to_string(path).map_err(|source| ShaderError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn compile_stage<G: GraphicsBackend + ?Sized>(
    gfx: &mut G,
    stage: ShaderStage,
    path: &Path,
    source: &str,
) -> Result<StageId, ShaderError> {
    let label = path.display().to_string();
    gfx.compile_stage(stage, &label, source)
        .map_err(|source| ShaderError::Compile {
            path: path.to_path_buf(),
            source,
        })
}

/// Reads, compiles and links; stage objects never outlive this call
fn compile_and_link<G: GraphicsBackend + ?Sized>(
    gfx: &mut G,
    vertex_path: &Path,
    fragment_path: &Path,
    layout: &VertexLayout,
) -> Result<ProgramId, ShaderError> {
    let vertex_source = read_source(vertex_path)?;
    let fragment_source = read_source(fragment_path)?;

    let vertex = compile_stage(gfx, ShaderStage::Vertex, vertex_path, &vertex_source)?;
    let fragment = match compile_stage(gfx, ShaderStage::Fragment, fragment_path, &fragment_source)
    {
        Ok(fragment) => fragment,
        Err(err) => {
            gfx.release_stage(vertex);
            return Err(err);
        }
    };

    let linked = gfx.link_program(vertex, fragment, layout);
    gfx.release_stage(vertex);
    gfx.release_stage(fragment);
    linked.map_err(ShaderError::Link)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::renderer::{GfxCall, RecordingBackend};

    struct Sources {
        dir: tempfile::TempDir,
    }

    impl Sources {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            std::fs::write(dir.path().join("vertex.wgsl"), "fn vs_main() {}").unwrap();
            std::fs::write(dir.path().join("fragment.wgsl"), "fn fs_main() {}").unwrap();
            Self { dir }
        }

        fn vertex(&self) -> PathBuf {
            self.dir.path().join("vertex.wgsl")
        }

        fn fragment(&self) -> PathBuf {
            self.dir.path().join("fragment.wgsl")
        }

        fn build(&self, gfx: &mut RecordingBackend) -> ShaderProgram {
            ShaderProgram::build(
                gfx,
                self.vertex(),
                self.fragment(),
                &VertexLayout::position_only(),
            )
            .unwrap()
        }
    }

    #[test]
    fn test_build_releases_stages_after_link() {
        let sources = Sources::new();
        let mut gfx = RecordingBackend::new();
        let program = sources.build(&mut gfx);

        assert_eq!(gfx.count(|c| matches!(c, GfxCall::ReleaseStage(_))), 2);
        assert!(gfx.is_program_live(program.handle()));
        // only the program remains
        assert_eq!(gfx.live_objects(), 1);
    }

    #[test]
    fn test_rebuild_replaces_and_releases_old_program() {
        let sources = Sources::new();
        let mut gfx = RecordingBackend::new();
        let mut program = sources.build(&mut gfx);
        let old = program.handle();

        program.rebuild(&mut gfx).unwrap();

        assert_ne!(program.handle(), old);
        assert!(!gfx.is_program_live(old));
        assert!(gfx.is_program_live(program.handle()));
        assert_eq!(program.generation(), 1);
    }

    #[test]
    fn test_failed_rebuild_keeps_last_good_program() {
        let sources = Sources::new();
        let mut gfx = RecordingBackend::new();
        let mut program = sources.build(&mut gfx);
        let old = program.handle();

        gfx.fail_next_compile(Some(ShaderStage::Fragment), "expected `;`");
        let err = program.rebuild(&mut gfx).unwrap_err();

        assert_eq!(err.log(), Some("expected `;`"));
        assert_eq!(program.handle(), old);
        assert!(gfx.is_program_live(old));
        assert_eq!(program.generation(), 0);
        // the vertex stage compiled before the failure was released
        assert_eq!(gfx.live_objects(), 1);
    }

    #[test]
    fn test_failed_link_releases_stages() {
        let sources = Sources::new();
        let mut gfx = RecordingBackend::new();
        let mut program = sources.build(&mut gfx);

        gfx.fail_next_link("location 0 not written");
        let err = program.rebuild(&mut gfx).unwrap_err();

        assert!(matches!(err, ShaderError::Link(_)));
        assert_eq!(gfx.live_objects(), 1);
    }

    #[test]
    fn test_rebuild_rereads_sources_from_disk() {
        let sources = Sources::new();
        let mut gfx = RecordingBackend::new();
        let mut program = sources.build(&mut gfx);

        // Entry point removed on disk: the recording backend rejects it
        std::fs::write(sources.fragment(), "fn broken() {}").unwrap();
        assert!(matches!(
            program.rebuild(&mut gfx),
            Err(ShaderError::Compile { .. })
        ));

        std::fs::write(sources.fragment(), "fn fs_main() { /* edited */ }").unwrap();
        assert!(program.rebuild(&mut gfx).is_ok());
    }

    #[test]
    fn test_missing_source_is_read_error() {
        let mut gfx = RecordingBackend::new();
        let result = ShaderProgram::build(
            &mut gfx,
            "missing/vertex.wgsl",
            "missing/fragment.wgsl",
            &VertexLayout::position_only(),
        );
        assert!(matches!(result, Err(ShaderError::Read { .. })));
        assert_eq!(gfx.live_objects(), 0);
    }
}
