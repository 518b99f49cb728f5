//! Canonical container image references.
//!
//! An [`ImageIdentifier`] is the engine-aware representation of a container
//! image. Docker-family references render as
//! `[registry/][organization/]name[:tag]`; Apptainer images are single local
//! files, so the apptainer rendering is the bare name and ignores tag,
//! registry and organization even when populated.

use capsule_core::{ComponentDescriptor, EngineType};
use std::fmt;

/// Default tag when the component declares no version.
pub const DEFAULT_TAG: &str = "latest";

/// Default separator between namespace and name in image names.
pub const DEFAULT_NAMESPACE_SEPARATOR: &str = "/";

/// Canonical, engine-type-aware container image reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageIdentifier {
    /// Registry host, e.g. `ghcr.io`
    pub registry: Option<String>,
    /// Organization or user segment
    pub organization: Option<String>,
    /// Image name
    pub name: String,
    /// Image tag
    pub tag: String,
    /// Engine family the reference is rendered for
    pub engine_type: EngineType,
}

impl ImageIdentifier {
    /// Compute the image reference for a component.
    ///
    /// `explicit_name` takes precedence over the descriptor-derived name;
    /// when it contains a colon it is split at the first colon into name and
    /// tag. Otherwise the name is the namespace-qualified component name and
    /// the tag is the component version (or [`DEFAULT_TAG`]).
    ///
    /// When `engine_id` differs from the canonical default id for
    /// `engine_type`, `-<engine_id>` is appended to the tag so multi-engine
    /// components do not collide on one image name.
    #[must_use]
    pub fn resolve(
        descriptor: &ComponentDescriptor,
        explicit_name: Option<&str>,
        namespace_separator: Option<&str>,
        engine_id: Option<&str>,
        engine_type: EngineType,
    ) -> Self {
        let separator = namespace_separator.unwrap_or(DEFAULT_NAMESPACE_SEPARATOR);
        let default_tag = || {
            descriptor
                .version
                .clone()
                .unwrap_or_else(|| DEFAULT_TAG.to_string())
        };

        let (name, mut tag) = match explicit_name {
            Some(explicit) => match explicit.split_once(':') {
                Some((name, tag)) => (name.to_string(), tag.to_string()),
                None => (explicit.to_string(), default_tag()),
            },
            None => (descriptor.full_name(separator), default_tag()),
        };

        if let Some(id) = engine_id {
            if id != engine_type.default_id() {
                tag = format!("{tag}-{id}");
            }
        }

        Self {
            registry: None,
            organization: None,
            name,
            tag,
            engine_type,
        }
    }

    /// Attach a registry host.
    #[must_use]
    pub fn with_registry(mut self, registry: Option<String>) -> Self {
        self.registry = registry;
        self
    }

    /// Attach an organization segment.
    #[must_use]
    pub fn with_organization(mut self, organization: Option<String>) -> Self {
        self.organization = organization;
        self
    }
}

impl fmt::Display for ImageIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Apptainer images are single files; only the name is meaningful.
        if self.engine_type == EngineType::Apptainer {
            return f.write_str(&self.name);
        }
        if let Some(registry) = &self.registry {
            write!(f, "{registry}/")?;
        }
        if let Some(organization) = &self.organization {
            write!(f, "{organization}/")?;
        }
        write!(f, "{}:{}", self.name, self.tag)
    }
}
