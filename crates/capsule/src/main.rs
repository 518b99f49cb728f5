//! capsule CLI entry point.

// The binary prints results and errors to stdout/stderr directly.
#![allow(clippy::print_stdout, clippy::print_stderr)]

use capsule::cli::{exit_code_for, Cli, Command, EXIT_OK};
use capsule::commands;
use capsule_core::exec::SystemExecutor;
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let executor = SystemExecutor;
    let build_info = commands::collect_build_info(&executor, chrono::Local::now().fixed_offset());

    let code = match cli.command {
        Command::Build(args) => {
            match commands::build::execute(&cli.config, &args, &build_info) {
                Ok(written) => {
                    for path in written {
                        println!("{}", path.display());
                    }
                    EXIT_OK
                }
                Err(error) => {
                    let code = exit_code_for(&error);
                    eprintln!("{:?}", miette::Report::new(error));
                    code
                }
            }
        }
        Command::Run(args) => {
            match commands::run::execute(&cli.config, &args, &build_info, &executor) {
                Ok(status) => status,
                Err(error) => {
                    let code = exit_code_for(&error);
                    eprintln!("{:?}", miette::Report::new(error));
                    code
                }
            }
        }
    };

    std::process::exit(code);
}
