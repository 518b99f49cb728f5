//! Docker-family engine.
//!
//! Owns the image-source configuration for components running in docker,
//! buildah or podman containers: Dockerfile emission from the declared
//! requirements, target image identity, and build-command construction for
//! the supported builders.

use crate::image::ImageIdentifier;
use crate::meta::BuildInfo;
use capsule_core::escape::{escape_double, shell_quote};
use capsule_core::{ComponentDescriptor, DockerSpec, EngineType, Error, Requirement, Result};
use std::path::Path;

/// Default executable for the buildah builder. Buildah itself is not
/// expected on the host, so it runs through an Apptainer-hosted image.
pub const BUILDAH_EXECUTABLE: &str = "apptainer run docker://quay.io/buildah/stable:latest buildah";

/// A component engine executing in a Docker-family container.
#[derive(Debug, Clone)]
pub struct DockerEngine {
    spec: DockerSpec,
    component: String,
}

impl DockerEngine {
    /// Create an engine from its declaration. `component` is the owning
    /// component's name, used in error messages.
    #[must_use]
    pub fn new(spec: DockerSpec, component: impl Into<String>) -> Self {
        Self {
            spec,
            component: component.into(),
        }
    }

    /// Engine id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.spec.id
    }

    /// The underlying declaration.
    #[must_use]
    pub fn spec(&self) -> &DockerSpec {
        &self.spec
    }

    /// The resolved image identifier for the built component image.
    #[must_use]
    pub fn image_identifier(&self, descriptor: &ComponentDescriptor) -> ImageIdentifier {
        let explicit = match (&self.spec.target_package, &self.spec.target_tag) {
            (Some(package), Some(tag)) => Some(format!("{package}:{tag}")),
            (Some(package), None) => Some(package.clone()),
            (None, Some(tag)) => Some(format!("{}:{tag}", descriptor.full_name("/"))),
            (None, None) => None,
        };
        ImageIdentifier::resolve(
            descriptor,
            explicit.as_deref(),
            None,
            Some(self.id()),
            EngineType::Docker,
        )
        .with_registry(self.spec.target_registry.clone())
        .with_organization(self.spec.target_organization.clone())
    }

    /// The target image reference. An explicit `target_image` is returned
    /// verbatim; otherwise the reference is resolved from the descriptor.
    #[must_use]
    pub fn target_identifier(&self, descriptor: &ComponentDescriptor) -> String {
        match &self.spec.target_image {
            Some(target) => target.clone(),
            None => self.image_identifier(descriptor).to_string(),
        }
    }

    /// The requirements effective for a build: `setup`, then `test_setup`
    /// when `testing` is set.
    fn effective_setup(&self, testing: bool) -> impl Iterator<Item = &Requirement> {
        self.spec
            .setup
            .iter()
            .chain(testing.then_some(&self.spec.test_setup).into_iter().flatten())
    }

    /// Emit the Dockerfile for the component image.
    #[must_use]
    pub fn dockerfile(
        &self,
        descriptor: &ComponentDescriptor,
        build_info: &BuildInfo,
        testing: bool,
    ) -> String {
        let mut out = format!("FROM {}\n", self.spec.image);

        if !descriptor.authors.is_empty() {
            let authors = descriptor
                .authors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            out.push_str(&format!(
                "LABEL org.opencontainers.image.authors=\"{}\"\n",
                escape_double(&authors)
            ));
        }
        out.push_str(&format!(
            "LABEL org.opencontainers.image.description=\"Companion container for {}\"\n",
            escape_double(&descriptor.full_name("/"))
        ));
        out.push_str(&format!(
            "LABEL org.opencontainers.image.created=\"{}\"\n",
            build_info.timestamp.to_rfc3339()
        ));
        if let Some(version) = &descriptor.version {
            out.push_str(&format!(
                "LABEL org.opencontainers.image.version=\"{}\"\n",
                escape_double(version)
            ));
        }
        if let Some(commit) = &build_info.commit {
            out.push_str(&format!(
                "LABEL org.opencontainers.image.revision=\"{}\"\n",
                escape_double(commit)
            ));
        }
        if let Some(source) = build_info.source_url() {
            out.push_str(&format!(
                "LABEL org.opencontainers.image.source=\"{}\"\n",
                escape_double(&source)
            ));
        }

        for requirement in self.effective_setup(testing) {
            let commands = requirement.install_commands();
            if commands.is_empty() {
                continue;
            }
            out.push('\n');
            out.push_str("RUN ");
            out.push_str(&commands.join(" && \\\n  "));
            out.push('\n');
        }

        out
    }

    /// The builder invocation prefix: the chosen executable followed by the
    /// builder subcommand.
    ///
    /// The executable is `builder_executable` when set, otherwise the
    /// default for the declared builder. The builder subcommand (`build`, or
    /// `bud --format docker` for buildah) is always appended after the
    /// executable, including when the override already encodes a complete
    /// custom command.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedBuilder`] for builder values other than
    /// `docker` and `buildah`.
    pub fn builder_prefix(&self) -> Result<String> {
        let (executable, subcommand) = match self.spec.builder.as_str() {
            "docker" => (
                self.spec
                    .builder_executable
                    .clone()
                    .unwrap_or_else(|| "docker".to_string()),
                "build",
            ),
            "buildah" => (
                self.spec
                    .builder_executable
                    .clone()
                    .unwrap_or_else(|| BUILDAH_EXECUTABLE.to_string()),
                "bud --format docker",
            ),
            other => {
                return Err(Error::UnsupportedBuilder {
                    builder: other.to_string(),
                    component: self.component.clone(),
                });
            }
        };
        Ok(format!("{executable} {subcommand}"))
    }

    /// Construct the shell command that builds the component image.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedBuilder`] for builder values other than
    /// `docker` and `buildah`.
    pub fn build_command(
        &self,
        descriptor: &ComponentDescriptor,
        dockerfile_path: &Path,
        context_path: &Path,
        extra_args: &[String],
    ) -> Result<String> {
        let image = self.target_identifier(descriptor);
        let mut command = format!(
            "{} -f {} -t {}",
            self.builder_prefix()?,
            shell_quote(&dockerfile_path.to_string_lossy()),
            shell_quote(&image),
        );
        for arg in extra_args {
            command.push(' ');
            command.push_str(&shell_quote(arg));
        }
        command.push(' ');
        command.push_str(&shell_quote(&context_path.to_string_lossy()));
        Ok(command)
    }
}
