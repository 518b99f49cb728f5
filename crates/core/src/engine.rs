//! Engine declarations.
//!
//! An engine is a method of executing a component: as a native process, in a
//! Docker-family container, or in an Apptainer container. This module holds
//! the declaration data only; the behavior living on top of it (image
//! resolution, setup artifacts, build commands) is in `capsule-engines`.

use crate::requirements::Requirement;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The executing family of an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineType {
    /// Direct process invocation on the host
    Native,
    /// Docker-family container (docker, buildah, podman)
    Docker,
    /// Apptainer container
    Apptainer,
}

impl EngineType {
    /// The id an engine of this type gets when none is declared.
    #[must_use]
    pub fn default_id(self) -> &'static str {
        match self {
            Self::Native => "native",
            Self::Docker => "docker",
            Self::Apptainer => "apptainer",
        }
    }
}

impl fmt::Display for EngineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.default_id())
    }
}

/// A declared engine. Tagged by `type` in the component config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EngineSpec {
    /// Run the component directly on the host
    Native(NativeSpec),
    /// Run the component in a Docker-family container
    Docker(DockerSpec),
    /// Run the component in an Apptainer container
    Apptainer(ApptainerSpec),
}

impl EngineSpec {
    /// Unique id of this engine within the component.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Native(s) => &s.id,
            Self::Docker(s) => &s.id,
            Self::Apptainer(s) => &s.id,
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
}

/// Native engine declaration. Carries no image configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeSpec {
    /// Engine id, unique within the component
    #[serde(default = "default_native_id")]
    pub id: String,
}

impl Default for NativeSpec {
    fn default() -> Self {
        Self {
            id: default_native_id(),
        }
    }
}

fn default_native_id() -> String {
    EngineType::Native.default_id().to_string()
}

/// Docker-family engine declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DockerSpec {
    /// Engine id, unique within the component
    #[serde(default = "default_docker_id")]
    pub id: String,
    /// Base image the component image is built from
    pub image: String,
    /// Image builder: `docker` or `buildah`
    #[serde(default = "default_builder")]
    pub builder: String,
    /// Override for the builder executable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub builder_executable: Option<String>,
    /// Explicit target image reference, used verbatim when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_image: Option<String>,
    /// Tag for the built image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_tag: Option<String>,
    /// Organization part of the target image reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_organization: Option<String>,
    /// Package name overriding the component name in the reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_package: Option<String>,
    /// Registry part of the target image reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_registry: Option<String>,
    /// Ordered install requirements baked into the image
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub setup: Vec<Requirement>,
    /// Additional requirements appended only for test builds
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub test_setup: Vec<Requirement>,
}

fn default_docker_id() -> String {
    EngineType::Docker.default_id().to_string()
}

fn default_builder() -> String {
    "docker".to_string()
}

/// Apptainer engine declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApptainerSpec {
    /// Engine id, unique within the component
    #[serde(default = "default_apptainer_id")]
    pub id: String,
    /// Source image: a `docker://`/`library://`/`shub://`/`oras://` URI or
    /// a local `.sif` path
    pub image: String,
    /// Explicit target image file, used verbatim when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_image: Option<String>,
    /// Ordered install requirements baked into the image
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub setup: Vec<Requirement>,
    /// Additional requirements appended only for test builds
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub test_setup: Vec<Requirement>,
}

fn default_apptainer_id() -> String {
    EngineType::Apptainer.default_id().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_deserializes_tagged_forms() {
        let yaml = r"
- type: native
- type: docker
  image: ubuntu:22.04
- type: apptainer
  id: hpc
  image: docker://ubuntu:22.04
";
        let specs: Vec<EngineSpec> = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(specs.len(), 3);
        assert_eq!(specs[0].id(), "native");
        assert_eq!(specs[1].id(), "docker");
        assert_eq!(specs[1].engine_type(), EngineType::Docker);
        assert_eq!(specs[2].id(), "hpc");
        assert_eq!(specs[2].engine_type(), EngineType::Apptainer);
    }

    #[test]
    fn docker_builder_defaults_to_docker() {
        let spec: DockerSpec = serde_yaml::from_str("image: alpine:3.20").unwrap();
        assert_eq!(spec.builder, "docker");
        assert_eq!(spec.id, "docker");
    }

    #[test]
    fn default_ids_follow_engine_type() {
        assert_eq!(EngineType::Native.default_id(), "native");
        assert_eq!(EngineType::Docker.default_id(), "docker");
        assert_eq!(EngineType::Apptainer.default_id(), "apptainer");
    }
}
