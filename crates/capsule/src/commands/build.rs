//! `capsule build`: generate the wrapper artifact.

use crate::cli::{BuildArgs, RunnerKind};
use capsule_core::{config, ComponentDescriptor, Error, Result};
use capsule_engines::BuildInfo;
use capsule_runners::{ExecutableRunner, GeneratedFile, NextflowRunner, Runner};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Generate (or check) the artifacts for the component at `config_path`.
///
/// Returns the paths written or verified.
///
/// # Errors
///
/// Returns configuration errors from loading/generation, and I/O errors
/// from writing. In check mode, a missing or diverging artifact is an
/// error naming the file.
pub fn execute(config_path: &Path, args: &BuildArgs, build_info: &BuildInfo) -> Result<Vec<PathBuf>> {
    let descriptor = config::load(config_path)?;
    let files = generate(&descriptor, args, build_info)?;

    let mut written = Vec::new();
    for file in &files {
        let path = args.output.join(&file.path);
        if args.check {
            check_file(&path, &file.content)?;
        } else {
            write_file(&path, &file.content, file.executable)?;
        }
        written.push(path);
    }

    if !args.check {
        copy_resources(config_path, &descriptor, &args.output)?;
    }
    Ok(written)
}

/// Generate the artifact files without touching the filesystem.
///
/// # Errors
///
/// Returns configuration errors surfaced by the runner.
pub fn generate(
    descriptor: &ComponentDescriptor,
    args: &BuildArgs,
    build_info: &BuildInfo,
) -> Result<Vec<GeneratedFile>> {
    let runner = match args.runner {
        RunnerKind::Executable => {
            Runner::Executable(ExecutableRunner::new().testing(args.testing))
        }
        RunnerKind::Nextflow => Runner::Nextflow(NextflowRunner::new()),
    };
    runner.generate(descriptor, build_info)
}

fn write_file(path: &Path, content: &str, executable: bool) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| {
            Error::io(source, "creating output directory", Some(parent.to_path_buf()))
        })?;
    }
    std::fs::write(path, content)
        .map_err(|source| Error::io(source, "writing artifact", Some(path.to_path_buf())))?;

    #[cfg(unix)]
    if executable {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).map_err(
            |source| Error::io(source, "marking artifact executable", Some(path.to_path_buf())),
        )?;
    }

    info!("Generated: {}", path.display());
    Ok(())
}

fn check_file(path: &Path, expected: &str) -> Result<()> {
    if !path.exists() {
        return Err(Error::config(format!(
            "missing artifact: {}",
            path.display()
        )));
    }
    let actual = std::fs::read_to_string(path)
        .map_err(|source| Error::io(source, "reading artifact", Some(path.to_path_buf())))?;
    if actual != expected {
        return Err(Error::config(format!(
            "artifact is out of date: {}",
            path.display()
        )));
    }
    Ok(())
}

/// Copy the component's resource files next to the generated wrapper, so
/// the artifact directory is self-contained.
fn copy_resources(
    config_path: &Path,
    descriptor: &ComponentDescriptor,
    output: &Path,
) -> Result<()> {
    let base = config_path.parent().unwrap_or_else(|| Path::new("."));
    for resource in &descriptor.resources {
        let source = base.join(&resource.path);
        if !source.exists() {
            warn!(
                component = %descriptor.name,
                "resource '{}' not found next to the config file",
                resource.path
            );
            continue;
        }
        let target = output.join(&resource.path);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent).map_err(|source| {
                Error::io(source, "creating resource directory", Some(parent.to_path_buf()))
            })?;
        }
        std::fs::copy(&source, &target)
            .map_err(|error| Error::io(error, "copying resource", Some(source.clone())))?;
    }
    Ok(())
}
