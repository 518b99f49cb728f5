//! # capsule
//!
//! Command-line front end: loads a component config, generates the wrapper
//! artifact (executable or Nextflow module), and optionally executes it.

pub mod cli;
pub mod commands;

pub use cli::{Cli, Command, EXIT_CONFIG, EXIT_OK, EXIT_RUNTIME};
