//! # capsule-runners
//!
//! Wrapper-generation runners for capsule components:
//!
//! - [`ExecutableRunner`]: one self-contained bash wrapper composed from
//!   per-concern [`Fragment`]s, runnable natively or under docker/apptainer
//! - [`NextflowRunner`]: a Nextflow module (process + config stanza)
//! - [`mount::MountTranslator`]: host↔container path translation shared by
//!   the generators and by callers running components from the host side
//!
//! Generation is synchronous and side-effect-free: pure construction over
//! immutable descriptors, no I/O beyond returning text.

pub mod executable;
pub mod fragment;
pub mod mount;
pub mod nextflow;

pub use executable::ExecutableRunner;
pub use fragment::Fragment;
pub use mount::{MountMapping, MountTranslator};
pub use nextflow::{ContainerDirective, NextflowModule, NextflowRunner};

use capsule_core::{ComponentDescriptor, Result};
use capsule_engines::BuildInfo;

/// A file produced by a runner, relative to the artifact directory.
#[derive(Debug, Clone)]
pub struct GeneratedFile {
    /// Path relative to the output directory
    pub path: String,
    /// File content
    pub content: String,
    /// Whether the file should carry the executable bit
    pub executable: bool,
}

/// A wrapper-generation strategy producing one deployable artifact.
#[derive(Debug, Clone, Copy)]
pub enum Runner {
    /// Self-contained bash wrapper
    Executable(ExecutableRunner),
    /// Nextflow module
    Nextflow(NextflowRunner),
}

impl Runner {
    /// Generate the artifact files for a component.
    ///
    /// # Errors
    ///
    /// Returns configuration errors surfaced by the underlying runner.
    pub fn generate(
        &self,
        descriptor: &ComponentDescriptor,
        build_info: &BuildInfo,
    ) -> Result<Vec<GeneratedFile>> {
        match self {
            Self::Executable(runner) => {
                let script = runner.generate(descriptor, build_info)?;
                Ok(vec![GeneratedFile {
                    path: descriptor.name.clone(),
                    content: script,
                    executable: true,
                }])
            }
            Self::Nextflow(runner) => {
                let module = runner.generate(descriptor)?;
                Ok(vec![
                    GeneratedFile {
                        path: "main.nf".to_string(),
                        content: module.main_nf,
                        executable: false,
                    },
                    GeneratedFile {
                        path: "nextflow.config".to_string(),
                        content: module.config,
                        executable: false,
                    },
                ])
            }
        }
    }
}
