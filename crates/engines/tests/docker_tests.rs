//! Dockerfile emission and build-command construction.

use capsule_core::{ComponentDescriptor, DockerSpec, Error, Requirement};
use capsule_engines::meta::BuildInfo;
use capsule_engines::DockerEngine;
use chrono::{FixedOffset, TimeZone};
use std::path::Path;

fn descriptor() -> ComponentDescriptor {
    ComponentDescriptor {
        name: "align".to_string(),
        namespace: None,
        version: Some("1.0".to_string()),
        description: None,
        authors: Vec::new(),
        arguments: Vec::new(),
        dependencies: Vec::new(),
        resources: Vec::new(),
        engines: Vec::new(),
    }
}

fn spec() -> DockerSpec {
    DockerSpec {
        id: "docker".to_string(),
        image: "ubuntu:22.04".to_string(),
        builder: "docker".to_string(),
        builder_executable: None,
        target_image: None,
        target_tag: None,
        target_organization: None,
        target_package: None,
        target_registry: None,
        setup: Vec::new(),
        test_setup: Vec::new(),
    }
}

fn build_info() -> BuildInfo {
    let timestamp = FixedOffset::east_opt(0)
        .unwrap()
        .with_ymd_and_hms(2024, 5, 17, 10, 0, 0)
        .unwrap();
    BuildInfo::new(timestamp)
}

#[test]
fn docker_builder_uses_docker_build() {
    let engine = DockerEngine::new(spec(), "align");
    let command = engine
        .build_command(&descriptor(), Path::new("Dockerfile"), Path::new("."), &[])
        .unwrap();
    assert_eq!(command, "docker build -f Dockerfile -t align:1.0 .");
}

#[test]
fn buildah_without_override_runs_through_apptainer() {
    let engine = DockerEngine::new(
        DockerSpec {
            builder: "buildah".to_string(),
            ..spec()
        },
        "align",
    );
    let command = engine
        .build_command(&descriptor(), Path::new("Dockerfile"), Path::new("."), &[])
        .unwrap();
    assert_eq!(
        command,
        "apptainer run docker://quay.io/buildah/stable:latest buildah \
         bud --format docker -f Dockerfile -t align:1.0 ."
    );
}

#[test]
fn buildah_override_still_gets_the_subcommand_appended() {
    let engine = DockerEngine::new(
        DockerSpec {
            builder: "buildah".to_string(),
            builder_executable: Some("podman".to_string()),
            ..spec()
        },
        "align",
    );
    let command = engine
        .build_command(&descriptor(), Path::new("Dockerfile"), Path::new("."), &[])
        .unwrap();
    assert_eq!(command, "podman bud --format docker -f Dockerfile -t align:1.0 .");
}

#[test]
fn unsupported_builder_names_value_and_component() {
    let engine = DockerEngine::new(
        DockerSpec {
            builder: "unsupported_x".to_string(),
            ..spec()
        },
        "align",
    );
    let err = engine
        .build_command(&descriptor(), Path::new("Dockerfile"), Path::new("."), &[])
        .unwrap_err();
    assert!(matches!(err, Error::UnsupportedBuilder { .. }));
    let msg = err.to_string();
    assert!(msg.contains("Unsupported builder: 'unsupported_x'"));
    assert!(msg.contains("align"));
}

#[test]
fn extra_args_are_escaped_and_placed_before_context() {
    let engine = DockerEngine::new(spec(), "align");
    let command = engine
        .build_command(
            &descriptor(),
            Path::new("/tmp/work dir/Dockerfile"),
            Path::new("/tmp/work dir"),
            &["--platform".to_string(), "linux/amd64".to_string()],
        )
        .unwrap();
    assert_eq!(
        command,
        "docker build -f '/tmp/work dir/Dockerfile' -t align:1.0 --platform linux/amd64 '/tmp/work dir'"
    );
}

#[test]
fn explicit_target_image_is_used_verbatim() {
    let engine = DockerEngine::new(
        DockerSpec {
            target_image: Some("ghcr.io/acme/align:pinned".to_string()),
            ..spec()
        },
        "align",
    );
    assert_eq!(
        engine.target_identifier(&descriptor()),
        "ghcr.io/acme/align:pinned"
    );
}

#[test]
fn target_fields_shape_the_resolved_reference() {
    let engine = DockerEngine::new(
        DockerSpec {
            target_registry: Some("ghcr.io".to_string()),
            target_organization: Some("acme".to_string()),
            target_tag: Some("2024".to_string()),
            ..spec()
        },
        "align",
    );
    assert_eq!(engine.target_identifier(&descriptor()), "ghcr.io/acme/align:2024");
}

#[test]
fn test_setup_is_appended_only_for_test_builds() {
    let engine = DockerEngine::new(
        DockerSpec {
            setup: vec![Requirement::Apt {
                packages: vec!["curl".to_string()],
            }],
            test_setup: vec![Requirement::Apt {
                packages: vec!["wget".to_string()],
            }],
            ..spec()
        },
        "align",
    );

    let plain = engine.dockerfile(&descriptor(), &build_info(), false);
    assert!(plain.contains("apt-get install -y curl"));
    assert!(!plain.contains("wget"));

    let testing = engine.dockerfile(&descriptor(), &build_info(), true);
    let curl_at = testing.find("apt-get install -y curl").unwrap();
    let wget_at = testing.find("apt-get install -y wget").unwrap();
    assert!(curl_at < wget_at);
}

#[test]
fn dockerfile_starts_from_the_base_image_with_metadata() {
    let info = build_info().with_commit(Some("abc123".to_string()));
    let engine = DockerEngine::new(spec(), "align");
    let dockerfile = engine.dockerfile(&descriptor(), &info, false);
    assert!(dockerfile.starts_with("FROM ubuntu:22.04\n"));
    assert!(dockerfile.contains("org.opencontainers.image.created=\"2024-05-17T10:00:00+00:00\""));
    assert!(dockerfile.contains("org.opencontainers.image.revision=\"abc123\""));
}
