//! Generated-wrapper content checks.

use capsule_core::config;
use capsule_engines::BuildInfo;
use capsule_runners::ExecutableRunner;
use chrono::{FixedOffset, TimeZone};

const CONFIG: &str = r"
name: align
version: 1.0.0
description: Align reads against a reference.
arguments:
  - type: file
    name: --input
    required: true
  - type: file
    name: --inputs
    multiple: true
    multiple_sep: ';'
  - type: file
    name: --output
    direction: output
  - type: string
    name: --label
    default: sample
dependencies:
  - samtools
resources:
  - path: align.sh
engines:
  - type: docker
    image: ubuntu:22.04
    setup:
      - type: apt
        packages: [curl]
    test_setup:
      - type: apt
        packages: [wget]
  - type: native
  - type: apptainer
    id: hpc
    image: docker://ubuntu:22.04
";

fn build_info() -> BuildInfo {
    let timestamp = FixedOffset::east_opt(0)
        .unwrap()
        .with_ymd_and_hms(2024, 5, 17, 10, 0, 0)
        .unwrap();
    BuildInfo::new(timestamp)
}

fn generate() -> String {
    let descriptor = config::parse(CONFIG).unwrap();
    ExecutableRunner::new()
        .generate(&descriptor, &build_info())
        .unwrap()
}

#[test]
fn wrapper_is_a_bash_script_with_the_uniform_surface() {
    let script = generate();
    assert!(script.starts_with("#!/usr/bin/env bash"));
    for flag in [
        "---engine",
        "---setup",
        "---dockerfile",
        "---definitionfile",
        "---docker_image_id",
        "---apptainer_image_id",
        "---debug",
        "---docker_run_args",
    ] {
        assert!(script.contains(flag), "missing flag {flag}");
    }
}

#[test]
fn first_declared_engine_is_the_default() {
    let script = generate();
    assert!(script.contains("CAPSULE_ENGINE_ID=\"docker\""));
}

#[test]
fn dispatch_case_covers_ids_and_rejects_unknown_ones() {
    let script = generate();
    assert!(script.contains("CAPSULE_ENGINE_TYPE=\"docker\""));
    assert!(script.contains("CAPSULE_ENGINE_TYPE=\"native\""));
    assert!(script.contains("CAPSULE_ENGINE_TYPE=\"apptainer\""));
    assert!(script.contains(
        "echo \"Unknown engine id '$CAPSULE_ENGINE_ID'. Declared engines: docker, native, hpc\" >&2"
    ));
}

#[test]
fn dockerfile_heredoc_embeds_the_setup() {
    let script = generate();
    assert!(script.contains("FROM ubuntu:22.04"));
    assert!(script.contains("apt-get install -y curl"));
    // test_setup only appears in test artifacts
    assert!(!script.contains("wget"));
}

#[test]
fn test_artifacts_append_test_setup_after_setup() {
    let descriptor = config::parse(CONFIG).unwrap();
    let script = ExecutableRunner::new()
        .testing(true)
        .generate(&descriptor, &build_info())
        .unwrap();
    let curl_at = script.find("apt-get install -y curl").unwrap();
    let wget_at = script.find("apt-get install -y wget").unwrap();
    assert!(curl_at < wget_at);
}

#[test]
fn setup_dispatch_mirrors_the_strategy_tables() {
    let script = generate();
    // fallback chain for pull-else-build
    assert!(script.contains("CapsuleDockerPull || CapsuleDockerBuild --no-cache"));
    assert!(script.contains("CapsuleDockerPull || CapsuleDockerBuild\n"));
    // existence guard for the ifneedbe policies
    assert!(script.contains("if ! CapsuleDockerImageExists \"$(CapsuleDockerImage)\"; then"));
    // default strategy applied on plain runs
    assert!(script.contains("CapsuleDockerSetup \"ifneedbecachedbuild\""));
    // required-command postcondition
    assert!(script.contains("CapsuleDockerCheckCommands \"$image\" samtools"));
}

#[test]
fn mount_detection_translates_and_queues_outputs() {
    let script = generate();
    assert!(script.contains("CAPSULE_AUTOMOUNT_PREFIX=\"${CAPSULE_AUTOMOUNT_PREFIX-/capsule_automount}\""));
    assert!(script.contains("par_input=$(CapsuleAutodetectMount \"$par_input\")"));
    assert!(script.contains("CAPSULE_CHOWN_TARGETS+=(\"$par_output\")"));
    assert!(script.contains("trap CapsuleChownOutputs EXIT"));
    // values are rewritten back after the run
    assert!(script.contains("par_output=$(CapsuleStripAutomount \"$par_output\")"));
}

#[test]
fn multiple_file_values_split_on_their_separator() {
    let script = generate();
    assert!(script.contains("IFS=';' read -r -a CAPSULE_SPLIT_PARTS <<< \"$par_inputs\""));
}

#[test]
fn required_and_defaulted_arguments_are_enforced() {
    let script = generate();
    assert!(script.contains("echo \"Missing required argument: --input\" >&2"));
    assert!(script.contains("par_label=\"sample\""));
}

#[test]
fn run_sections_cover_every_declared_engine_family() {
    let script = generate();
    assert!(script.contains("bash \"$CAPSULE_RESOURCES_DIR/align.sh\""));
    assert!(script.contains("bash /capsule/align/align.sh"));
    assert!(script.contains("apptainer exec"));
    assert!(script.contains("exit \"${CAPSULE_EXIT_CODE:-0}\""));
}

#[test]
fn sections_appear_in_composition_order() {
    let script = generate();
    let dispatch = script.find("Unknown engine id").unwrap();
    let docker_modes = script.find("CapsuleDockerSetup \"ifneedbecachedbuild\"").unwrap();
    let run = script.find("case \"$CAPSULE_ENGINE_TYPE\" in").unwrap();
    assert!(dispatch < docker_modes);
    assert!(docker_modes < run);
}

#[test]
fn native_only_components_carry_no_container_machinery() {
    let descriptor = config::parse(
        "name: solo\nresources:\n  - path: run.sh\nengines:\n  - type: native\n",
    )
    .unwrap();
    let script = ExecutableRunner::new()
        .generate(&descriptor, &build_info())
        .unwrap();
    assert!(!script.contains("CapsuleDockerSetup"));
    assert!(!script.contains("CapsuleApptainerSetup"));
    assert!(!script.contains("CAPSULE_AUTOMOUNT_PREFIX"));
    assert!(script.contains("bash \"$CAPSULE_RESOURCES_DIR/run.sh\""));
}

#[test]
fn apptainer_push_strategies_are_rejected_at_runtime() {
    let script = generate();
    assert!(script.contains("Setup strategy '$1' is not supported for apptainer engines"));
}

#[test]
fn non_default_engine_id_shapes_the_image_tag() {
    let descriptor = config::parse(
        r"
name: c
version: '2.0'
resources:
  - path: run.sh
engines:
  - type: docker
    id: gpu
    image: nvidia/cuda:12
",
    )
    .unwrap();
    let script = ExecutableRunner::new()
        .generate(&descriptor, &build_info())
        .unwrap();
    assert!(script.contains("echo c:2.0-gpu"));
}
