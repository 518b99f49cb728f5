//! # capsule-core
//!
//! Core types and error handling for the capsule ecosystem:
//!
//! - the component descriptor model and its YAML config loader
//! - engine declarations (native / docker / apptainer)
//! - package-installation requirements rendered to command lists
//! - shell escaping helpers
//! - the process-executor collaborator for invoking external tools
//!
//! Behavior on top of these types (image identity, setup strategies,
//! artifact generation) lives in `capsule-engines` and `capsule-runners`.

pub mod component;
pub mod config;
pub mod engine;
pub mod error;
pub mod escape;
pub mod exec;
pub mod requirements;

pub use component::{Argument, Author, ComponentDescriptor, Direction, FileArgument, Resource};
pub use engine::{ApptainerSpec, DockerSpec, EngineSpec, EngineType, NativeSpec};
pub use error::{Error, Result};
pub use requirements::Requirement;
