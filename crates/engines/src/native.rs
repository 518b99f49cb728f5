//! Native engine.
//!
//! No container is involved: the component runs as a direct process
//! invocation on the host, so there is no image to identify and no setup
//! artifact to emit.

use capsule_core::{ComponentDescriptor, NativeSpec};

/// A component engine executing directly on the host.
#[derive(Debug, Clone)]
pub struct NativeEngine {
    spec: NativeSpec,
}

impl NativeEngine {
    /// Create an engine from its declaration.
    #[must_use]
    pub fn new(spec: NativeSpec) -> Self {
        Self { spec }
    }

    /// Engine id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.spec.id
    }

    /// Native runs have no image; the identifier is the component name.
    #[must_use]
    pub fn target_identifier(&self, descriptor: &ComponentDescriptor) -> String {
        descriptor.name.clone()
    }
}
