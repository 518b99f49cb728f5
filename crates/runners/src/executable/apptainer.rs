//! Apptainer-engine concern.
//!
//! Emits the apptainer-scoped flags (`---definitionfile`,
//! `---apptainer_image_id`), the per-engine image/definition/build/pull
//! functions, the runtime setup function derived from the strategy
//! resolver, and the `apptainer exec` prefix assembly. Apptainer uses a
//! simpler path policy than docker: no rewritable prefix, paths pass
//! through as-is, with explicit bind flags accumulated for paths outside
//! the default bind locations (home, temp, current directory).

use crate::fragment::Fragment;
use capsule_core::escape::shell_quote;
use capsule_core::{ComponentDescriptor, EngineType, Result};
use capsule_engines::strategy::{apptainer_plan, SetupAction, SetupStep, SetupStrategy};
use capsule_engines::{BuildInfo, EngineSet};

/// Strategy applied on plain runs and bare `---setup` invocations.
pub const DEFAULT_STRATEGY: &str = "ifneedbebuild";

pub(crate) fn fragment(
    descriptor: &ComponentDescriptor,
    engines: &EngineSet,
    build_info: &BuildInfo,
    testing: bool,
) -> Result<Fragment> {
    if !engines.has_type(EngineType::Apptainer) {
        return Ok(Fragment::new());
    }

    let mut image_fn = String::new();
    let mut source_fn = String::new();
    let mut definition_fn = String::new();
    for engine in engines.apptainers() {
        let id = engine.id();
        image_fn.push_str(&format!(
            "    {id})\n      echo {}\n      ;;\n",
            shell_quote(&engine.target_identifier(descriptor))
        ));
        source_fn.push_str(&format!(
            "    {id})\n      echo {}\n      ;;\n",
            shell_quote(&engine.spec().image)
        ));
        definition_fn.push_str(&format!(
            "    {id})\n      cat << 'CAPSULE_EOF_DEFINITION'\n{content}CAPSULE_EOF_DEFINITION\n      ;;\n",
            content = engine.definition_file(descriptor, build_info, testing),
        ));
    }

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
        r#"CapsuleApptainerImage() {{
  case "$CAPSULE_ENGINE_ID" in
{image_fn}  esac
}}

CapsuleApptainerSource() {{
  case "$CAPSULE_ENGINE_ID" in
{source_fn}  esac
}}

CapsuleApptainerDefinition() {{
  case "$CAPSULE_ENGINE_ID" in
{definition_fn}  esac
}}

CapsuleApptainerImageExists() {{
  [ -f "$1" ]
}}

CapsuleApptainerCheckCommands() {{
  local image="$1"
  shift
  local required
  for required in bash "$@"; do
    if ! apptainer exec "$image" bash -c "command -v '$required'" >/dev/null 2>&1; then
      echo "Required command '$required' is not present in the image '$image'" >&2
      exit 1
    fi
  done
}}

CapsuleApptainerBuild() {{
  local image def_dir
  image="$(CapsuleApptainerImage)"
  def_dir=$(mktemp -d "${{TMPDIR:-/tmp}}/capsule_build_{name}_XXXXXX")
  CapsuleApptainerDefinition > "$def_dir/container.def"
  echo "Building container image '$image'"
  apptainer build --force "$image" "$def_dir/container.def"
  rm -rf "$def_dir"
  CapsuleApptainerCheckCommands "$image"{deps_suffix}
}}

CapsuleApptainerPull() {{
  local image
  image="$(CapsuleApptainerImage)"
  echo "Pulling container image '$image'"
  apptainer pull --force "$image" "$(CapsuleApptainerSource)" && CapsuleApptainerCheckCommands "$image"{deps_suffix}
}}

CapsuleApptainerDebug() {{
  local image
  image="$(CapsuleApptainerImage)"
  echo "+ apptainer shell $image"
  apptainer shell "$image"
}}

CAPSULE_BIND_ARGS=""

CapsuleApptainerBindArg() {{
  local abs dir
  abs=$(CapsuleAbsolutePath "$1")
  dir=$(dirname "$abs")
  case "$dir" in
    "$HOME"*|/tmp*|"$PWD"*)
      ;;
    *)
      case " $CAPSULE_BIND_ARGS " in
        *" --bind $dir "*)
          ;;
        *)
          CAPSULE_BIND_ARGS="$CAPSULE_BIND_ARGS --bind $dir"
          ;;
      esac
      ;;
  esac
}}

CapsuleApptainerSetup() {{
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

    let detect_binds = detect_binds(descriptor);

    let pre_run = format!(
        r#"if [ "$CAPSULE_ENGINE_TYPE" == "apptainer" ]; then
{detect_binds}  CAPSULE_EXEC_PREFIX="apptainer exec$CAPSULE_BIND_ARGS --bind \"$CAPSULE_RESOURCES_DIR\" \"$(CapsuleApptainerImage)\""
fi
"#
    );

    Ok(Fragment {
        pre_parse,
        parsers: r#"    ---definitionfile)
      CAPSULE_MODE="definitionfile"
      shift
      ;;
    ---apptainer_image_id)
      CAPSULE_MODE="apptainer_image_id"
      shift
      ;;
"#
        .to_string(),
        help_strings: "    ---definitionfile    print the Apptainer definition file and exit\n\
                       \x20   ---apptainer_image_id  print the resolved image file and exit\n"
            .to_string(),
        post_parse: format!(
            r#"if [ "$CAPSULE_ENGINE_TYPE" == "apptainer" ]; then
  case "$CAPSULE_MODE" in
    definitionfile)
      CapsuleApptainerDefinition
      exit 0
      ;;
    apptainer_image_id)
      CapsuleApptainerImage
      exit 0
      ;;
    setup)
      CapsuleApptainerSetup "${{CAPSULE_SETUP_STRATEGY:-{DEFAULT_STRATEGY}}}"
      exit 0
      ;;
    debug)
      CapsuleApptainerDebug
      exit 0
      ;;
  esac
  CapsuleApptainerSetup "{DEFAULT_STRATEGY}"
fi
"#
        ),
        pre_run,
        ..Fragment::new()
    })
}

/// Per-argument bind detection for declared file arguments.
fn detect_binds(descriptor: &ComponentDescriptor) -> String {
    let mut out = String::new();
    for argument in &descriptor.arguments {
        let Some(file) = argument.as_file() else {
            continue;
        };
        let var = format!("par_{}", argument.plain_name());
        if file.multiple {
            let sep = file.multiple_sep;
            out.push_str(&format!(
                r#"  if [ -n "${{{var}+x}}" ]; then
    IFS='{sep}' read -r -a CAPSULE_SPLIT_PARTS <<< "${var}"
    for capsule_part in "${{CAPSULE_SPLIT_PARTS[@]}}"; do
      CapsuleApptainerBindArg "$capsule_part"
    done
  fi
"#
            ));
        } else {
            out.push_str(&format!(
                "  if [ -n \"${{{var}+x}}\" ]; then\n    CapsuleApptainerBindArg \"${var}\"\n  fi\n"
            ));
        }
    }
    out
}

/// Render the runtime strategy dispatch from the resolver tables. Push
/// strategies have no apptainer counterpart and reject at runtime.
fn setup_case() -> String {
    let mut out = String::new();
    for strategy in SetupStrategy::ALL {
        let Ok(when_absent) = apptainer_plan(strategy, false, "") else {
            out.push_str(&format!(
                "    {})\n      echo \"Setup strategy '$1' is not supported for apptainer engines\" >&2\n      exit 1\n      ;;\n",
                strategy.name()
            ));
            continue;
        };
        // The error arm above is the only fallible branch; with a fixed
        // existence value the plan itself cannot fail.
        let when_present = apptainer_plan(strategy, true, "").unwrap_or_default();

        let body = if when_present == when_absent {
            steps_to_shell(&when_absent, "      ")
        } else {
            let inner = steps_to_shell(&when_absent, "        ");
            format!(
                "      if ! CapsuleApptainerImageExists \"$(CapsuleApptainerImage)\"; then\n{inner}      fi\n"
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
        SetupAction::Build { .. } => "CapsuleApptainerBuild".to_string(),
        SetupAction::Pull => "CapsuleApptainerPull".to_string(),
        // Unreachable: push strategies error out before planning.
        SetupAction::Push | SetupAction::PushIfAbsent => "false".to_string(),
    }
}
