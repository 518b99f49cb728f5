//! Nextflow runner.
//!
//! Instead of a bash wrapper, emits a Nextflow module for the component: a
//! `main.nf` process carrying a container directive for the first declared
//! container engine, plus a `nextflow.config` stanza enabling the matching
//! execution profile. Reuses the engines' image identity but none of the
//! fragment machinery.

use capsule_core::{ComponentDescriptor, Direction, EngineType, Result};
use capsule_engines::{Engine, EngineSet};
use tracing::debug;

/// The container directive attached to the generated process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerDirective {
    /// Family of the engine providing the image
    pub engine_type: EngineType,
    /// Resolved image reference or image file
    pub image: String,
}

/// A generated Nextflow module.
#[derive(Debug, Clone)]
pub struct NextflowModule {
    /// The `main.nf` process text
    pub main_nf: String,
    /// The `nextflow.config` text
    pub config: String,
    /// The container directive, absent for native-only components
    pub directive: Option<ContainerDirective>,
}

/// Generates Nextflow modules.
#[derive(Debug, Clone, Copy, Default)]
pub struct NextflowRunner;

impl NextflowRunner {
    /// Create a runner.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Generate the Nextflow module for a component.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for duplicate engine ids.
    pub fn generate(&self, descriptor: &ComponentDescriptor) -> Result<NextflowModule> {
        let engines = EngineSet::for_component(descriptor)?;
        let directive = engines.engines().iter().find_map(|engine| match engine {
            Engine::Docker(e) => Some(ContainerDirective {
                engine_type: EngineType::Docker,
                image: e.target_identifier(descriptor),
            }),
            Engine::Apptainer(e) => Some(ContainerDirective {
                engine_type: EngineType::Apptainer,
                image: e.target_identifier(descriptor),
            }),
            Engine::Native(_) => None,
        });
        debug!(
            component = %descriptor.name,
            container = directive.as_ref().map(|d| d.image.as_str()),
            "generating nextflow module"
        );

        let process_name = descriptor.full_name("_");
        let main_nf = main_nf(descriptor, &process_name, directive.as_ref());
        let config = config(&process_name, directive.as_ref());

        Ok(NextflowModule {
            main_nf,
            config,
            directive,
        })
    }
}

fn main_nf(
    descriptor: &ComponentDescriptor,
    process_name: &str,
    directive: Option<&ContainerDirective>,
) -> String {
    let mut out = format!("process {process_name} {{\n");
    if let Some(directive) = directive {
        out.push_str(&format!("    container '{}'\n\n", directive.image));
    }

    let inputs: Vec<&str> = descriptor
        .arguments
        .iter()
        .filter_map(|a| a.as_file())
        .filter(|f| f.direction == Direction::Input)
        .map(|f| f.name.trim_start_matches('-'))
        .collect();
    if !inputs.is_empty() {
        out.push_str("    input:\n");
        for input in &inputs {
            out.push_str(&format!("    path {input}\n"));
        }
        out.push('\n');
    }

    let outputs: Vec<&str> = descriptor
        .arguments
        .iter()
        .filter_map(|a| a.as_file())
        .filter(|f| f.direction == Direction::Output)
        .map(|f| f.name.trim_start_matches('-'))
        .collect();
    if !outputs.is_empty() {
        out.push_str("    output:\n");
        for output in &outputs {
            out.push_str(&format!("    path \"${{{output}}}\"\n"));
        }
        out.push('\n');
    }

    let script = descriptor.main_script().unwrap_or("main.sh");
    out.push_str(&format!(
        "    script:\n    \"\"\"\n    bash $moduleDir/{script}\n    \"\"\"\n}}\n"
    ));
    out
}

fn config(process_name: &str, directive: Option<&ContainerDirective>) -> String {
    let Some(directive) = directive else {
        return String::from("// native component; no container profile required\n");
    };

    let profile = match directive.engine_type {
        EngineType::Docker => "docker.enabled = true\n",
        EngineType::Apptainer => "apptainer.enabled = true\napptainer.autoMounts = true\n",
        EngineType::Native => "",
    };
    format!(
        "{profile}\nprocess {{\n    withName: '{process_name}' {{\n        container = '{image}'\n    }}\n}}\n",
        image = directive.image,
    )
}
