//! Command-line surface.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Exit code for success.
pub const EXIT_OK: i32 = 0;
/// Exit code for runtime failures (setup, subprocess, io).
pub const EXIT_RUNTIME: i32 = 1;
/// Exit code for configuration errors.
pub const EXIT_CONFIG: i32 = 2;

/// Map an error to its process exit code.
#[must_use]
pub fn exit_code_for(error: &capsule_core::Error) -> i32 {
    if error.is_config() {
        EXIT_CONFIG
    } else {
        EXIT_RUNTIME
    }
}

/// Package a script into a portable, container-ready executable wrapper.
#[derive(Debug, Parser)]
#[command(name = "capsule", version, about)]
pub struct Cli {
    /// Path to the component config file
    #[arg(
        short,
        long,
        global = true,
        default_value = "capsule.yaml",
        env = "CAPSULE_CONFIG"
    )]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate the wrapper artifact for a component
    Build(BuildArgs),
    /// Generate into a temporary directory and execute the wrapper
    Run(RunArgs),
}

/// Which artifact to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RunnerKind {
    /// Self-contained bash wrapper
    Executable,
    /// Nextflow module (main.nf + nextflow.config)
    Nextflow,
}

/// Arguments for `capsule build`.
#[derive(Debug, Args)]
pub struct BuildArgs {
    /// Output directory for generated artifacts
    #[arg(short, long, default_value = "target/capsule")]
    pub output: PathBuf,

    /// Artifact flavor to generate
    #[arg(long, value_enum, default_value_t = RunnerKind::Executable)]
    pub runner: RunnerKind,

    /// Append test_setup requirements to the container setup
    #[arg(long)]
    pub testing: bool,

    /// Verify artifacts on disk are up to date without writing
    #[arg(long)]
    pub check: bool,
}

/// Arguments for `capsule run`.
#[derive(Debug, Args)]
pub struct RunArgs {
    /// Engine id to run with (default: the first declared engine)
    #[arg(long)]
    pub engine: Option<String>,

    /// Arguments forwarded to the component
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use capsule_core::Error;

    #[test]
    fn cli_parses_build_with_runner() {
        let cli = Cli::try_parse_from([
            "capsule", "build", "--runner", "nextflow", "--output", "out",
        ])
        .unwrap();
        match cli.command {
            Command::Build(args) => {
                assert_eq!(args.runner, RunnerKind::Nextflow);
                assert_eq!(args.output, PathBuf::from("out"));
                assert!(!args.testing);
            }
            Command::Run(_) => panic!("expected build"),
        }
    }

    #[test]
    fn run_forwards_component_arguments() {
        let cli = Cli::try_parse_from([
            "capsule", "run", "--engine", "docker", "--", "--input", "a.txt",
        ])
        .unwrap();
        match cli.command {
            Command::Run(args) => {
                assert_eq!(args.engine.as_deref(), Some("docker"));
                assert_eq!(args.args, vec!["--input", "a.txt"]);
            }
            Command::Build(_) => panic!("expected run"),
        }
    }

    #[test]
    fn configuration_errors_exit_with_2() {
        assert_eq!(exit_code_for(&Error::config("bad")), EXIT_CONFIG);
        let runtime = Error::MissingCommand {
            command: "samtools".to_string(),
        };
        assert_eq!(exit_code_for(&runtime), EXIT_RUNTIME);
    }
}
