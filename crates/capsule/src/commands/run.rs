//! `capsule run`: generate into a temporary directory and execute.

use crate::cli::{BuildArgs, RunArgs, RunnerKind};
use capsule_core::exec::ProcessExecutor;
use capsule_core::{config, Result};
use capsule_engines::{BuildInfo, EngineSet};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Generate the wrapper for the component at `config_path` into a
/// temporary directory, execute it with the forwarded arguments, and
/// return the wrapper's exit code.
///
/// # Errors
///
/// Returns configuration errors (including an unknown `--engine` id,
/// validated against the declared engines before anything runs) and I/O
/// errors from staging or spawning the wrapper.
pub fn execute(
    config_path: &Path,
    args: &RunArgs,
    build_info: &BuildInfo,
    executor: &impl ProcessExecutor,
) -> Result<i32> {
    let descriptor = config::load(config_path)?;

    // Fail fast on a bad engine id instead of letting the wrapper exit 1.
    if let Some(engine) = &args.engine {
        let engines = EngineSet::for_component(&descriptor)?;
        engines.get(engine)?;
    }

    let stage_dir = stage_dir(&descriptor.name);
    let build_args = BuildArgs {
        output: stage_dir.clone(),
        runner: RunnerKind::Executable,
        testing: false,
        check: false,
    };
    super::build::execute(config_path, &build_args, build_info)?;

    let wrapper = stage_dir.join(&descriptor.name);
    let mut wrapper_args = Vec::new();
    if let Some(engine) = &args.engine {
        wrapper_args.push(format!("---engine={engine}"));
    }
    wrapper_args.extend(args.args.iter().cloned());

    debug!(wrapper = %wrapper.display(), ?wrapper_args, "executing staged wrapper");
    let status = executor.run_inherited(&wrapper.to_string_lossy(), &wrapper_args, None);

    // Best-effort cleanup; the exit status of the component wins.
    if let Err(error) = std::fs::remove_dir_all(&stage_dir) {
        debug!(%error, "could not remove staging directory");
    }

    status
}

fn stage_dir(component: &str) -> PathBuf {
    std::env::temp_dir().join(format!("capsule_run_{component}_{}", std::process::id()))
}
