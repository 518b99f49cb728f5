//! Nextflow module emission.

use capsule_core::config;
use capsule_core::EngineType;
use capsule_runners::NextflowRunner;

const CONFIG: &str = r"
name: align
namespace: mapping
version: '1.0'
arguments:
  - type: file
    name: --input
  - type: file
    name: --output
    direction: output
resources:
  - path: align.sh
engines:
  - type: docker
    image: ubuntu:22.04
";

#[test]
fn docker_component_gets_a_container_directive_and_profile() {
    let descriptor = config::parse(CONFIG).unwrap();
    let module = NextflowRunner::new().generate(&descriptor).unwrap();

    let directive = module.directive.unwrap();
    assert_eq!(directive.engine_type, EngineType::Docker);
    assert_eq!(directive.image, "mapping/align:1.0");

    assert!(module.main_nf.contains("process mapping_align {"));
    assert!(module.main_nf.contains("container 'mapping/align:1.0'"));
    assert!(module.main_nf.contains("path input"));
    assert!(module.main_nf.contains("bash $moduleDir/align.sh"));

    assert!(module.config.contains("docker.enabled = true"));
    assert!(module.config.contains("withName: 'mapping_align'"));
    assert!(module.config.contains("container = 'mapping/align:1.0'"));
}

#[test]
fn apptainer_component_enables_the_apptainer_profile() {
    let config_text = r"
name: c
resources:
  - path: run.sh
engines:
  - type: apptainer
    image: docker://ubuntu:22.04
";
    let descriptor = config::parse(config_text).unwrap();
    let module = NextflowRunner::new().generate(&descriptor).unwrap();

    let directive = module.directive.unwrap();
    assert_eq!(directive.engine_type, EngineType::Apptainer);
    assert_eq!(directive.image, "c.sif");
    assert!(module.config.contains("apptainer.enabled = true"));
}

#[test]
fn native_component_generates_no_container_directive() {
    let descriptor =
        config::parse("name: solo\nresources:\n  - path: run.sh\n").unwrap();
    let module = NextflowRunner::new().generate(&descriptor).unwrap();
    assert!(module.directive.is_none());
    assert!(!module.main_nf.contains("container '"));
}

#[test]
fn first_declared_container_engine_wins() {
    let config_text = r"
name: c
version: '1.0'
resources:
  - path: run.sh
engines:
  - type: native
  - type: apptainer
    image: docker://ubuntu:22.04
  - type: docker
    image: ubuntu:22.04
";
    let descriptor = config::parse(config_text).unwrap();
    let module = NextflowRunner::new().generate(&descriptor).unwrap();
    assert_eq!(module.directive.unwrap().engine_type, EngineType::Apptainer);
}
