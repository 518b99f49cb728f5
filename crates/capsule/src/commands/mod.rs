//! Command implementations.

pub mod build;
pub mod run;

use capsule_core::exec::ProcessExecutor;
use capsule_engines::BuildInfo;
use chrono::{DateTime, FixedOffset};
use tracing::debug;

/// Collect build metadata at the CLI edge: the clock is read once here and
/// git details are gathered best-effort, so generation itself stays
/// deterministic over its inputs.
pub fn collect_build_info(
    executor: &impl ProcessExecutor,
    timestamp: DateTime<FixedOffset>,
) -> BuildInfo {
    let commit = git_value(executor, &["rev-parse", "HEAD"]);
    let remote = git_value(executor, &["config", "--get", "remote.origin.url"]);
    BuildInfo::new(timestamp)
        .with_commit(commit)
        .with_remote(remote)
}

fn git_value(executor: &impl ProcessExecutor, args: &[&str]) -> Option<String> {
    let args: Vec<String> = args.iter().map(ToString::to_string).collect();
    match executor.run("git", &args, None) {
        Ok(output) if output.success() => {
            let value = output.stdout.trim().to_string();
            (!value.is_empty()).then_some(value)
        }
        Ok(output) => {
            debug!(args = ?args, status = output.status, "git lookup failed");
            None
        }
        Err(error) => {
            debug!(%error, "git not available");
            None
        }
    }
}
