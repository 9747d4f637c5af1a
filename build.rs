use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use vergen::{BuildBuilder, CargoBuilder, Emitter, RustcBuilder};
use vergen_gitcl::{Emitter as GitEmitter, GitclBuilder};

type BuildResult<T> = Result<T, Box<dyn std::error::Error>>;

fn main() -> BuildResult<()> {
    emit_build_metadata()?;
    stage_profiles()?;
    println!("cargo:rerun-if-changed=assets/shaders");
    Ok(())
}

/// VERGEN_* variables read by `build_info`
fn emit_build_metadata() -> BuildResult<()> {
    let build = BuildBuilder::default().build_timestamp(true).build()?;
    let cargo = CargoBuilder::default()
        .opt_level(true)
        .target_triple(true)
        .build()?;
    let rustc = RustcBuilder::default().semver(true).channel(true).build()?;

    Emitter::default()
        .add_instructions(&build)?
        .add_instructions(&cargo)?
        .add_instructions(&rustc)?
        .emit()?;

    // Falls back to defaults outside a git checkout
    let gitcl = GitclBuilder::default()
        .sha(true)
        .branch(true)
        .commit_timestamp(true)
        .dirty(true)
        .build()?;
    GitEmitter::default().add_instructions(&gitcl)?.emit()?;

    Ok(())
}

/// target/<profile>/ from OUT_DIR (target/<profile>/build/hotshade-<hash>/out)
fn profile_dir() -> BuildResult<PathBuf> {
    let out_dir = PathBuf::from(env::var("OUT_DIR")?);
    out_dir
        .ancestors()
        .nth(3)
        .map(Path::to_path_buf)
        .ok_or_else(|| "OUT_DIR is not under a cargo target directory".into())
}

/// Copies the profile files next to the binaries so `AppConfig::load`
/// finds them regardless of the working directory
fn stage_profiles() -> BuildResult<()> {
    let profiles: &[&str] = match env::var("PROFILE")?.as_str() {
        "release" => &["release"],
        _ => &["debug", "release"],
    };

    let dest = profile_dir()?.join("config");
    fs::create_dir_all(&dest)?;

    for profile in profiles {
        let file = format!("{profile}.toml");
        let src = Path::new("config").join(&file);
        println!("cargo:rerun-if-changed={}", src.display());
        if src.exists() {
            fs::copy(&src, dest.join(&file))?;
        }
    }

    Ok(())
}
