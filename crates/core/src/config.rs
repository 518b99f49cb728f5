//! Component config loading and validation.
//!
//! The descriptor is read from a YAML file. Validation happens eagerly so
//! that a bad config fails at load time, not at first use: the component
//! needs a name, engine ids must be unique, and a component without engines
//! gets an implicit native engine so the first-declared-engine default
//! always exists.

use crate::component::ComponentDescriptor;
use crate::engine::{EngineSpec, NativeSpec};
use crate::{Error, Result};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, warn};

/// Load and validate a component descriptor from a YAML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not valid YAML, or fails
/// validation.
pub fn load(path: &Path) -> Result<ComponentDescriptor> {
    let text = std::fs::read_to_string(path).map_err(|source| {
        Error::io(source, "reading component config", Some(path.to_path_buf()))
    })?;
    let descriptor = parse(&text)?;
    debug!(
        component = %descriptor.name,
        engines = descriptor.engines.len(),
        "loaded component config from {}",
        path.display()
    );
    Ok(descriptor)
}

/// Parse and validate a component descriptor from YAML text.
///
/// # Errors
///
/// Returns an error if the text is not valid YAML or fails validation.
pub fn parse(text: &str) -> Result<ComponentDescriptor> {
    let mut descriptor: ComponentDescriptor = serde_yaml::from_str(text)?;
    validate(&mut descriptor)?;
    Ok(descriptor)
}

fn validate(descriptor: &mut ComponentDescriptor) -> Result<()> {
    if descriptor.name.trim().is_empty() {
        return Err(Error::config("component name must not be empty"));
    }

    let mut seen = HashSet::new();
    for engine in &descriptor.engines {
        if !seen.insert(engine.id().to_string()) {
            return Err(Error::DuplicateEngineId {
                id: engine.id().to_string(),
                component: descriptor.name.clone(),
            });
        }
    }

    if descriptor.engines.is_empty() {
        descriptor
            .engines
            .push(EngineSpec::Native(NativeSpec::default()));
    }

    if descriptor.resources.is_empty() {
        warn!(
            component = %descriptor.name,
            "component declares no resources; the wrapper will have nothing to run"
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineType;

    const CONFIG: &str = r"
name: align
namespace: mapping
version: 1.2.0
authors:
  - name: Jane Doe
    email: jane@example.com
arguments:
  - type: file
    name: --input
    required: true
  - type: file
    name: --output
    direction: output
resources:
  - path: align.sh
engines:
  - type: docker
    image: ubuntu:22.04
  - type: native
";

    #[test]
    fn parses_a_full_config() {
        let descriptor = parse(CONFIG).unwrap();
        assert_eq!(descriptor.name, "align");
        assert_eq!(descriptor.version.as_deref(), Some("1.2.0"));
        assert_eq!(descriptor.engines.len(), 2);
        assert_eq!(descriptor.engines[0].engine_type(), EngineType::Docker);
        assert_eq!(descriptor.main_script(), Some("align.sh"));
    }

    #[test]
    fn missing_engines_default_to_native() {
        let descriptor = parse("name: solo\nresources:\n  - path: run.sh\n").unwrap();
        assert_eq!(descriptor.engines.len(), 1);
        assert_eq!(descriptor.engines[0].engine_type(), EngineType::Native);
    }

    #[test]
    fn duplicate_engine_ids_are_rejected() {
        let config = r"
name: dup
engines:
  - type: docker
    id: main
    image: a
  - type: apptainer
    id: main
    image: b.sif
";
        let err = parse(config).unwrap_err();
        assert!(matches!(err, Error::DuplicateEngineId { ref id, .. } if id == "main"));
    }

    #[test]
    fn empty_name_is_rejected() {
        let err = parse("name: '  '\n").unwrap_err();
        assert!(err.is_config());
    }
}
