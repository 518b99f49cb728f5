//! End-to-end build command tests against a temporary component.

use capsule::cli::{BuildArgs, RunnerKind};
use capsule::commands::build;
use capsule_engines::BuildInfo;
use chrono::{FixedOffset, TimeZone};
use std::path::PathBuf;

const CONFIG: &str = r"
name: greet
version: '0.1'
arguments:
  - type: string
    name: --name
    default: world
resources:
  - path: greet.sh
engines:
  - type: docker
    image: alpine:3.20
  - type: native
";

fn build_info() -> BuildInfo {
    let timestamp = FixedOffset::east_opt(0)
        .unwrap()
        .with_ymd_and_hms(2024, 5, 17, 10, 0, 0)
        .unwrap();
    BuildInfo::new(timestamp)
}

fn stage_component(dir: &std::path::Path) -> PathBuf {
    let config_path = dir.join("capsule.yaml");
    std::fs::write(&config_path, CONFIG).unwrap();
    std::fs::write(dir.join("greet.sh"), "#!/bin/bash\necho \"hello $par_name\"\n").unwrap();
    config_path
}

fn args(output: PathBuf) -> BuildArgs {
    BuildArgs {
        output,
        runner: RunnerKind::Executable,
        testing: false,
        check: false,
    }
}

#[test]
fn build_writes_an_executable_wrapper_and_resources() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = stage_component(dir.path());
    let output = dir.path().join("out");

    let written = build::execute(&config_path, &args(output.clone()), &build_info()).unwrap();
    assert_eq!(written, vec![output.join("greet")]);

    let wrapper = std::fs::read_to_string(output.join("greet")).unwrap();
    assert!(wrapper.starts_with("#!/usr/bin/env bash"));
    assert!(output.join("greet.sh").exists());

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(output.join("greet")).unwrap().permissions().mode();
        assert_eq!(mode & 0o111, 0o111);
    }
}

#[test]
fn check_mode_accepts_fresh_artifacts_and_flags_drift() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = stage_component(dir.path());
    let output = dir.path().join("out");
    let info = build_info();

    build::execute(&config_path, &args(output.clone()), &info).unwrap();

    let mut check_args = args(output.clone());
    check_args.check = true;
    build::execute(&config_path, &check_args, &info).unwrap();

    std::fs::write(output.join("greet"), "tampered").unwrap();
    let err = build::execute(&config_path, &check_args, &info).unwrap_err();
    assert!(err.to_string().contains("out of date"));
}

#[test]
fn nextflow_runner_emits_module_and_config() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = stage_component(dir.path());
    let output = dir.path().join("nf");

    let mut nf_args = args(output.clone());
    nf_args.runner = RunnerKind::Nextflow;
    let written = build::execute(&config_path, &nf_args, &build_info()).unwrap();
    assert_eq!(
        written,
        vec![output.join("main.nf"), output.join("nextflow.config")]
    );
    let config = std::fs::read_to_string(output.join("nextflow.config")).unwrap();
    assert!(config.contains("docker.enabled = true"));
}

#[test]
fn missing_config_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = build::execute(
        &dir.path().join("absent.yaml"),
        &args(dir.path().join("out")),
        &build_info(),
    )
    .unwrap_err();
    assert!(matches!(err, capsule_core::Error::Io { .. }));
}
