//! # capsule-engines
//!
//! Engine variants and the supporting resolvers for capsule:
//!
//! - [`Engine`]: the closed family of execution methods (native, docker,
//!   apptainer) behind one capability surface
//! - [`EngineSet`]: the typed engine table built once from a component's
//!   declarations, validated for id uniqueness up front
//! - [`image::ImageIdentifier`]: canonical engine-aware image references
//! - [`strategy`]: named setup policies resolved to ordered action plans
//! - [`meta::BuildInfo`]: explicit build metadata inputs
//!
//! Everything here is pure construction over immutable descriptors; no
//! container tool is ever invoked from this crate.

pub mod apptainer;
pub mod docker;
pub mod image;
pub mod meta;
pub mod native;
pub mod strategy;

pub use apptainer::ApptainerEngine;
pub use docker::DockerEngine;
pub use image::ImageIdentifier;
pub use meta::BuildInfo;
pub use native::NativeEngine;
pub use strategy::{SetupAction, SetupStep, SetupStrategy};

use capsule_core::{ComponentDescriptor, EngineSpec, EngineType, Error, Result};
use std::collections::HashSet;

/// A method of executing a component.
#[derive(Debug, Clone)]
pub enum Engine {
    /// Direct process invocation on the host
    Native(NativeEngine),
    /// Docker-family container
    Docker(DockerEngine),
    /// Apptainer container
    Apptainer(ApptainerEngine),
}

impl Engine {
    /// Build an engine from its declaration. `component` is the owning
    /// component's name, used in error messages.
    #[must_use]
    pub fn from_spec(spec: &EngineSpec, component: &str) -> Self {
        match spec {
            EngineSpec::Native(s) => Self::Native(NativeEngine::new(s.clone())),
            EngineSpec::Docker(s) => Self::Docker(DockerEngine::new(s.clone(), component)),
            EngineSpec::Apptainer(s) => Self::Apptainer(ApptainerEngine::new(s.clone(), component)),
        }
    }

    /// Engine id.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Native(e) => e.id(),
            Self::Docker(e) => e.id(),
            Self::Apptainer(e) => e.id(),
        }
    }

    /// The engine family.
    #[must_use]
    pub fn engine_type(&self) -> EngineType {
        match self {
            Self::Native(_) => EngineType::Native,
            Self::Docker(_) => EngineType::Docker,
            Self::Apptainer(_) => EngineType::Apptainer,
        }
    }

    /// The target image identifier for this engine.
    #[must_use]
    pub fn target_identifier(&self, descriptor: &ComponentDescriptor) -> String {
        match self {
            Self::Native(e) => e.target_identifier(descriptor),
            Self::Docker(e) => e.target_identifier(descriptor),
            Self::Apptainer(e) => e.target_identifier(descriptor),
        }
    }

    /// The setup artifact text (Dockerfile or definition file) for this
    /// engine; empty for native engines.
    #[must_use]
    pub fn setup_artifact(
        &self,
        descriptor: &ComponentDescriptor,
        build_info: &BuildInfo,
        testing: bool,
    ) -> String {
        match self {
            Self::Native(_) => String::new(),
            Self::Docker(e) => e.dockerfile(descriptor, build_info, testing),
            Self::Apptainer(e) => e.definition_file(descriptor, build_info, testing),
        }
    }
}

/// The typed engine table for one component, built once from the declared
/// engines and validated for id uniqueness at construction.
#[derive(Debug, Clone)]
pub struct EngineSet {
    engines: Vec<Engine>,
}

impl EngineSet {
    /// Build the table from declared engine specs.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateEngineId`] when two engines share an id and
    /// [`Error::Config`] when no engines are declared.
    pub fn from_specs(specs: &[EngineSpec], component: &str) -> Result<Self> {
        if specs.is_empty() {
            return Err(Error::config(format!(
                "component '{component}' declares no engines"
            )));
        }
        let mut seen = HashSet::new();
        for spec in specs {
            if !seen.insert(spec.id()) {
                return Err(Error::DuplicateEngineId {
                    id: spec.id().to_string(),
                    component: component.to_string(),
                });
            }
        }
        let engines: Vec<Engine> = specs
            .iter()
            .map(|spec| Engine::from_spec(spec, component))
            .collect();
        tracing::debug!(
            component,
            ids = ?engines.iter().map(Engine::id).collect::<Vec<_>>(),
            "built engine table"
        );
        Ok(Self { engines })
    }

    /// Build the table for a component descriptor.
    ///
    /// # Errors
    ///
    /// See [`EngineSet::from_specs`].
    pub fn for_component(descriptor: &ComponentDescriptor) -> Result<Self> {
        Self::from_specs(&descriptor.engines, &descriptor.name)
    }

    /// All engines, in declaration order.
    #[must_use]
    pub fn engines(&self) -> &[Engine] {
        &self.engines
    }

    /// The default engine: the first declared one.
    #[must_use]
    pub fn default_engine(&self) -> &Engine {
        &self.engines[0]
    }

    /// All engine ids, in declaration order.
    #[must_use]
    pub fn ids(&self) -> Vec<&str> {
        self.engines.iter().map(Engine::id).collect()
    }

    /// Look up an engine by id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownEngine`] listing the allowed ids.
    pub fn get(&self, id: &str) -> Result<&Engine> {
        self.engines
            .iter()
            .find(|engine| engine.id() == id)
            .ok_or_else(|| Error::UnknownEngine {
                id: id.to_string(),
                allowed: self.ids().iter().map(ToString::to_string).collect(),
            })
    }

    /// Whether any declared engine has the given type.
    #[must_use]
    pub fn has_type(&self, engine_type: EngineType) -> bool {
        self.engines.iter().any(|e| e.engine_type() == engine_type)
    }

    /// All docker-family engines, in declaration order.
    pub fn dockers(&self) -> impl Iterator<Item = &DockerEngine> {
        self.engines.iter().filter_map(|engine| match engine {
            Engine::Docker(e) => Some(e),
            _ => None,
        })
    }

    /// All apptainer engines, in declaration order.
    pub fn apptainers(&self) -> impl Iterator<Item = &ApptainerEngine> {
        self.engines.iter().filter_map(|engine| match engine {
            Engine::Apptainer(e) => Some(e),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use capsule_core::{DockerSpec, NativeSpec};

    fn specs() -> Vec<EngineSpec> {
        vec![
            EngineSpec::Native(NativeSpec::default()),
            EngineSpec::Docker(DockerSpec {
                id: "docker".to_string(),
                image: "ubuntu:22.04".to_string(),
                builder: "docker".to_string(),
                builder_executable: None,
                target_image: None,
                target_tag: None,
                target_organization: None,
                target_package: None,
                target_registry: None,
                setup: Vec::new(),
                test_setup: Vec::new(),
            }),
        ]
    }

    #[test]
    fn first_declared_engine_is_the_default() {
        let set = EngineSet::from_specs(&specs(), "c").unwrap();
        assert_eq!(set.default_engine().id(), "native");
        assert_eq!(set.ids(), vec!["native", "docker"]);
    }

    #[test]
    fn unknown_id_lists_allowed_engines() {
        let set = EngineSet::from_specs(&specs(), "c").unwrap();
        let err = set.get("podman").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unknown engine id 'podman'. Declared engines: native, docker"
        );
    }

    #[test]
    fn duplicate_ids_fail_at_construction() {
        let mut duplicated = specs();
        duplicated.push(EngineSpec::Native(NativeSpec {
            id: "docker".to_string(),
        }));
        let err = EngineSet::from_specs(&duplicated, "c").unwrap_err();
        assert!(matches!(err, Error::DuplicateEngineId { .. }));
    }
}
