//! Apptainer engine.
//!
//! Owns the image-source configuration for components running in Apptainer
//! containers: definition-file emission (bootstrap header, labels, post,
//! environment and runscript sections) and target image identity. An
//! Apptainer image is a single `.sif` file, so target identity is a file
//! name rather than a registry reference.

use crate::meta::BuildInfo;
use capsule_core::{ApptainerSpec, ComponentDescriptor, Requirement};

/// Environment file sourced by generated containers.
pub const ENVIRONMENT_FILE: &str = "/.capsule_env";

/// A component engine executing in an Apptainer container.
#[derive(Debug, Clone)]
pub struct ApptainerEngine {
    spec: ApptainerSpec,
    #[allow(dead_code)]
    component: String,
}

/// A parsed bootstrap header: the agent and its from-location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bootstrap<'a> {
    /// Bootstrap agent, e.g. `docker` or `localimage`
    pub agent: &'a str,
    /// Location the agent builds from
    pub from: &'a str,
}

/// Parse an image string into its bootstrap agent and from-location.
///
/// Scheme prefixes are checked in order (`docker://`, `library://`,
/// `shub://`, `oras://`); a bare `.sif` path bootstraps from a local image;
/// anything else is treated as a docker reference.
#[must_use]
pub fn parse_bootstrap(image: &str) -> Bootstrap<'_> {
    for agent in ["docker", "library", "shub", "oras"] {
        if let Some(rest) = image.strip_prefix(agent).and_then(|r| r.strip_prefix("://")) {
            return Bootstrap { agent, from: rest };
        }
    }
    if image.ends_with(".sif") {
        return Bootstrap {
            agent: "localimage",
            from: image,
        };
    }
    Bootstrap {
        agent: "docker",
        from: image,
    }
}

impl ApptainerEngine {
    /// Create an engine from its declaration. `component` is the owning
    /// component's name, used in error messages.
    #[must_use]
    pub fn new(spec: ApptainerSpec, component: impl Into<String>) -> Self {
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
    pub fn spec(&self) -> &ApptainerSpec {
        &self.spec
    }

    /// The target image file: `target_image` when set, else `<name>.sif`.
    #[must_use]
    pub fn target_identifier(&self, descriptor: &ComponentDescriptor) -> String {
        match &self.spec.target_image {
            Some(target) => target.clone(),
            None => format!("{}.sif", descriptor.name),
        }
    }

    fn effective_setup(&self, testing: bool) -> impl Iterator<Item = &Requirement> {
        self.spec
            .setup
            .iter()
            .chain(testing.then_some(&self.spec.test_setup).into_iter().flatten())
    }

    /// Emit the Apptainer definition file for the component image.
    #[must_use]
    pub fn definition_file(
        &self,
        descriptor: &ComponentDescriptor,
        build_info: &BuildInfo,
        testing: bool,
    ) -> String {
        let bootstrap = parse_bootstrap(&self.spec.image);
        let mut out = format!("Bootstrap: {}\nFrom: {}\n", bootstrap.agent, bootstrap.from);

        out.push_str("\n%labels\n");
        if !descriptor.authors.is_empty() {
            let authors = descriptor
                .authors
                .iter()
                .map(|a| a.name.clone())
                .collect::<Vec<_>>()
                .join(", ");
            out.push_str(&format!("    Author {authors}\n"));
        }
        out.push_str(&format!(
            "    Description Container for {}\n",
            descriptor.full_name("/")
        ));
        out.push_str(&format!(
            "    Created {}\n",
            build_info.timestamp.to_rfc3339()
        ));
        if let Some(version) = &descriptor.version {
            out.push_str(&format!("    Version {version}\n"));
        }
        if let Some(commit) = &build_info.commit {
            out.push_str(&format!("    Revision {commit}\n"));
        }
        if let Some(source) = build_info.source_url() {
            out.push_str(&format!("    URL {source}\n"));
        }

        out.push_str("\n%post\n");
        for requirement in self.effective_setup(testing) {
            for command in requirement.install_commands() {
                out.push_str(&format!("    {command}\n"));
            }
        }
        // Best-effort cache cleanup; at most one package manager is present.
        out.push_str(
            "    apt-get clean -y 2>/dev/null || yum clean all 2>/dev/null || apk cache clean 2>/dev/null || true\n",
        );

        out.push_str(&format!("\n%environment\n    . {ENVIRONMENT_FILE}\n"));

        let runscript = match descriptor.main_script() {
            Some(script) => format!(
                "    exec bash {}/{} \"$@\"\n",
                descriptor.container_dir(),
                script
            ),
            None => "    exec true\n".to_string(),
        };
        out.push_str(&format!("\n%runscript\n{runscript}"));

        out
    }
}
