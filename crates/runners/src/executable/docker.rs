//! Docker-engine concern.
//!
//! Emits the docker-scoped flags (`---dockerfile`, `---docker_image_id`,
//! `---docker_run_args`), the per-engine image/Dockerfile/build functions
//! dispatched over the declared docker engine ids, the runtime setup
//! function derived from the strategy resolver, and the `docker run` exec
//! prefix assembly. Everything is guarded on the resolved engine type, so
//! these flags are silently inert when a non-docker engine is selected.

use crate::fragment::Fragment;
use capsule_core::escape::shell_quote;
use capsule_core::{ComponentDescriptor, EngineType, Result};
use capsule_engines::strategy::{docker_plan, SetupAction, SetupStep, SetupStrategy};
use capsule_engines::{BuildInfo, DockerEngine, EngineSet};

/// Strategy applied on plain runs and bare `---setup` invocations.
pub const DEFAULT_STRATEGY: &str = "ifneedbecachedbuild";

pub(crate) fn fragment(
    descriptor: &ComponentDescriptor,
    engines: &EngineSet,
    build_info: &BuildInfo,
    testing: bool,
) -> Result<Fragment> {
    if !engines.has_type(EngineType::Docker) {
        return Ok(Fragment::new());
    }

    let image_fn = engine_case(engines, |e| {
        Ok(format!("echo {}", shell_quote(&e.target_identifier(descriptor))))
    })?;
    // Heredoc bodies and terminators must stay at column zero.
    let mut dockerfile_fn = String::new();
    for engine in engines.dockers() {
        dockerfile_fn.push_str(&format!(
            "    {id})\n      cat << 'CAPSULE_EOF_DOCKERFILE'\n{content}CAPSULE_EOF_DOCKERFILE\n      ;;\n",
            id = engine.id(),
            content = engine.dockerfile(descriptor, build_info, testing),
        ));
    }
    let build_prefix_fn = engine_case(engines, |e| {
        Ok(format!("echo {}", shell_quote(&e.builder_prefix()?)))
    })?;

    let deps = descriptor
        .dependencies
        .iter()
        .map(|d| shell_quote(d))
        .collect::<Vec<_>>()
        .join(" ");
    let deps_suffix = if deps.is_empty() {
        String::new()
    } else {
        format!(" {deps}")
    };

    let pre_parse = format!(
        r#"CAPSULE_DOCKER_RUN_ARGS=""

CapsuleDockerImage() {{
  case "$CAPSULE_ENGINE_ID" in
{image_fn}  esac
}}

CapsuleDockerfile() {{
  case "$CAPSULE_ENGINE_ID" in
{dockerfile_fn}  esac
}}

CapsuleDockerBuildPrefix() {{
  case "$CAPSULE_ENGINE_ID" in
{build_prefix_fn}  esac
}}

CapsuleDockerImageExists() {{
  docker image inspect "$1" >/dev/null 2>&1
}}

CapsuleDockerCheckCommands() {{
  local image="$1"
  shift
  local required
  for required in bash "$@"; do
    if ! docker run --rm --entrypoint= "$image" bash -c "command -v '$required'" >/dev/null 2>&1; then
      echo "Required command '$required' is not present in the image '$image'" >&2
      exit 1
    fi
  done
}}

CapsuleDockerBuild() {{
  local image build_dir
  image="$(CapsuleDockerImage)"
  build_dir=$(mktemp -d "${{TMPDIR:-/tmp}}/capsule_build_{name}_XXXXXX")
  CapsuleDockerfile > "$build_dir/Dockerfile"
  echo "Building container image '$image'"
  $(CapsuleDockerBuildPrefix) -f "$build_dir/Dockerfile" -t "$image" "$@" "$CAPSULE_RESOURCES_DIR"
  rm -rf "$build_dir"
  CapsuleDockerCheckCommands "$image"{deps_suffix}
}}

CapsuleDockerPull() {{
  local image
  image="$(CapsuleDockerImage)"
  echo "Pulling container image '$image'"
  docker pull "$image" && CapsuleDockerCheckCommands "$image"{deps_suffix}
}}

CapsuleDockerPush() {{
  local image
  image="$(CapsuleDockerImage)"
  echo "Pushing container image '$image'"
  docker push "$image" && CapsuleDockerCheckCommands "$image"{deps_suffix}
}}

CapsuleDockerPushIfAbsent() {{
  local image
  image="$(CapsuleDockerImage)"
  if docker manifest inspect "$image" >/dev/null 2>&1; then
    echo "Container image '$image' already present in the registry"
  else
    CapsuleDockerPush
  fi
}}

CapsuleDockerDebug() {{
  local image
  image="$(CapsuleDockerImage)"
  echo "+ docker run --rm -it --entrypoint=bash $image"
  docker run --rm -it --entrypoint=bash "$image"
}}

CapsuleDockerSetup() {{
  case "$1" in
{setup_case}    *)
      echo "Unknown setup strategy '$1'" >&2
      exit 1
      ;;
  esac
}}
"#,
        name = descriptor.name,
        setup_case = setup_case(),
    );

    let env_flags: String = descriptor
        .arguments
        .iter()
        .map(|arg| format!(" -e par_{}", arg.plain_name()))
        .collect();

    let pre_run = format!(
        r#"if [ "$CAPSULE_ENGINE_TYPE" == "docker" ]; then
  CapsuleDetectMounts
  CAPSULE_EXEC_PREFIX="docker run --rm -i$CAPSULE_MOUNT_ARGS${{CAPSULE_CPUS:+ --cpus $CAPSULE_CPUS}}${{CAPSULE_MEMORY:+ --memory $CAPSULE_MEMORY}}$CAPSULE_DOCKER_RUN_ARGS{env_flags} -v \"$CAPSULE_RESOURCES_DIR:{container_dir}\" --entrypoint= $(CapsuleDockerImage)"
fi
"#,
        container_dir = descriptor.container_dir(),
    );

    Ok(Fragment {
        pre_parse,
        parsers: r#"    ---dockerfile)
      CAPSULE_MODE="dockerfile"
      shift
      ;;
    ---docker_image_id)
      CAPSULE_MODE="docker_image_id"
      shift
      ;;
    ---docker_run_args)
      CAPSULE_DOCKER_RUN_ARGS="$CAPSULE_DOCKER_RUN_ARGS $2"
      shift 2
      ;;
    ---docker_run_args=*)
      CAPSULE_DOCKER_RUN_ARGS="$CAPSULE_DOCKER_RUN_ARGS ${1#*=}"
      shift
      ;;
"#
        .to_string(),
        help_strings: "    ---dockerfile        print the Dockerfile for the selected engine and exit\n\
                       \x20   ---docker_image_id   print the resolved container image id and exit\n\
                       \x20   ---docker_run_args=ARG  extra arguments passed to 'docker run'\n"
            .to_string(),
        post_parse: format!(
            r#"if [ "$CAPSULE_ENGINE_TYPE" == "docker" ]; then
  case "$CAPSULE_MODE" in
    dockerfile)
      CapsuleDockerfile
      exit 0
      ;;
    docker_image_id)
      CapsuleDockerImage
      exit 0
      ;;
    setup)
      CapsuleDockerSetup "${{CAPSULE_SETUP_STRATEGY:-{DEFAULT_STRATEGY}}}"
      exit 0
      ;;
    debug)
      CapsuleDockerDebug
      exit 0
      ;;
  esac
  CapsuleDockerSetup "{DEFAULT_STRATEGY}"
fi
"#
        ),
        pre_run,
        ..Fragment::new()
    })
}

/// Render one `case` arm per declared docker engine.
fn engine_case(
    engines: &EngineSet,
    body: impl Fn(&DockerEngine) -> Result<String>,
) -> Result<String> {
    let mut out = String::new();
    for engine in engines.dockers() {
        let rendered = body(engine)?;
        let indented = rendered
            .lines()
            .map(|line| format!("      {line}\n"))
            .collect::<String>();
        out.push_str(&format!("    {})\n{indented}      ;;\n", engine.id()));
    }
    Ok(out)
}

/// Render the runtime strategy dispatch from the resolver tables, so the
/// generated shell and the host-side planner cannot drift apart.
fn setup_case() -> String {
    let mut out = String::new();
    for strategy in SetupStrategy::ALL {
        let when_present = docker_plan(strategy, true);
        let when_absent = docker_plan(strategy, false);

        let body = if when_present == when_absent {
            steps_to_shell(&when_absent, "      ")
        } else {
            // Divergent plans only ever differ by the up-front existence
            // check: the image being present makes the plan empty.
            let inner = steps_to_shell(&when_absent, "        ");
            format!(
                "      if ! CapsuleDockerImageExists \"$(CapsuleDockerImage)\"; then\n{inner}      fi\n"
            )
        };
        out.push_str(&format!("    {})\n{body}      ;;\n", strategy.name()));
    }
    out
}

fn steps_to_shell(steps: &[SetupStep], indent: &str) -> String {
    let mut out = String::new();
    for step in steps {
        let mut line = action_to_shell(step.action);
        if let Some(fallback) = step.fallback {
            line = format!("{line} || {}", action_to_shell(fallback));
        }
        out.push_str(&format!("{indent}{line}\n"));
    }
    out
}

fn action_to_shell(action: SetupAction) -> String {
    match action {
        SetupAction::Build { cached: false } => "CapsuleDockerBuild --no-cache".to_string(),
        SetupAction::Build { cached: true } => "CapsuleDockerBuild".to_string(),
        SetupAction::Pull => "CapsuleDockerPull".to_string(),
        SetupAction::Push => "CapsuleDockerPush".to_string(),
        SetupAction::PushIfAbsent => "CapsuleDockerPushIfAbsent".to_string(),
    }
}
