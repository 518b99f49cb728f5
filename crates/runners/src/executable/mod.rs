//! Executable runner.
//!
//! Produces one self-contained bash wrapper for a component by invoking a
//! fixed sequence of concern generators — engine selection, native, docker,
//! apptainer, mounts/ownership/limits, final command — and folding their
//! fragments with [`Fragment::concat`]. The concatenation order is fixed
//! regardless of which engines are declared, so later sections may rely on
//! variables and functions earlier sections define.
//!
//! The wrapper exposes one uniform CLI surface: the component's own
//! arguments plus the triple-dash engine flags (`---engine`, `---setup`,
//! `---dockerfile`, `---definitionfile`, `---docker_image_id`,
//! `---apptainer_image_id`, `---debug`, `---docker_run_args`, `---cpus`,
//! `---memory`). Flags scoped to a non-active engine type parse normally
//! and are dropped at dispatch time.

mod apptainer;
mod command;
mod docker;
mod engine_select;
mod mounts;
mod native;

pub use apptainer::DEFAULT_STRATEGY as APPTAINER_DEFAULT_STRATEGY;
pub use docker::DEFAULT_STRATEGY as DOCKER_DEFAULT_STRATEGY;

use crate::fragment::Fragment;
use capsule_core::{ComponentDescriptor, Result};
use capsule_engines::{BuildInfo, EngineSet};
use tracing::debug;

/// Generates executable bash wrappers.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecutableRunner {
    testing: bool,
}

impl ExecutableRunner {
    /// Create a runner for regular artifacts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate a test artifact: `test_setup` requirements are appended to
    /// the container setup.
    #[must_use]
    pub fn testing(mut self, testing: bool) -> Self {
        self.testing = testing;
        self
    }

    /// Generate the wrapper script text for a component.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for duplicate engine ids or an
    /// unsupported builder.
    pub fn generate(
        &self,
        descriptor: &ComponentDescriptor,
        build_info: &BuildInfo,
    ) -> Result<String> {
        let engines = EngineSet::for_component(descriptor)?;
        debug!(
            component = %descriptor.name,
            engines = engines.engines().len(),
            testing = self.testing,
            "generating executable wrapper"
        );

        let fragments = [
            engine_select::fragment(&engines),
            native::fragment(&engines),
            docker::fragment(descriptor, &engines, build_info, self.testing)?,
            apptainer::fragment(descriptor, &engines, build_info, self.testing)?,
            mounts::fragment(descriptor, &engines),
            command::fragment(descriptor, &engines),
        ];
        let merged = Fragment::concat(fragments);
        Ok(render(descriptor, &merged))
    }
}

fn render(descriptor: &ComponentDescriptor, fragment: &Fragment) -> String {
    let version = descriptor
        .version
        .as_deref()
        .map_or_else(String::new, |v| format!(" {v}"));
    let description = descriptor
        .description
        .as_deref()
        .map_or_else(String::new, |d| format!("\n\n{d}"));

    format!(
        r#"#!/usr/bin/env bash

# {name} wrapper, generated by capsule {generator_version}.
# Changes to this file will be overwritten.

set -e

CAPSULE_RESOURCES_DIR=$(cd "$(dirname "$0")" && pwd)
CAPSULE_POSITIONAL_ARGS=()

{pre_parse}
CapsuleHelp() {{
  cat << 'CAPSULE_EOF_HELP'
{name}{version}{description}

Options:
{help_strings}CAPSULE_EOF_HELP
}}

while [ $# -gt 0 ]; do
  case "$1" in
    -h|--help)
      CapsuleHelp
      exit 0
      ;;
{parsers}    *)
      CAPSULE_POSITIONAL_ARGS+=("$1")
      shift
      ;;
  esac
done

{post_parse}
{pre_run}
{run}
{post_run}
exit "${{CAPSULE_EXIT_CODE:-0}}"
"#,
        name = descriptor.name,
        generator_version = env!("CARGO_PKG_VERSION"),
        pre_parse = fragment.pre_parse,
        help_strings = fragment.help_strings,
        parsers = fragment.parsers,
        post_parse = fragment.post_parse,
        pre_run = fragment.pre_run,
        run = fragment.run,
        post_run = fragment.post_run,
    )
}
