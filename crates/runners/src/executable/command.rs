//! Final-command concern.
//!
//! Emits the per-argument parsers and help lines for the component's own
//! CLI surface, applies defaults and required checks after parsing, exports
//! the argument values, and invokes the main script under the selected
//! engine, propagating its exit code as the wrapper's own.

use crate::fragment::Fragment;
use capsule_core::escape::escape_double;
use capsule_core::{Argument, ComponentDescriptor, EngineType};
use capsule_engines::EngineSet;

pub(crate) fn fragment(descriptor: &ComponentDescriptor, engines: &EngineSet) -> Fragment {
    let mut parsers = String::new();
    let mut help_strings = String::new();
    let mut post_parse = String::new();

    for argument in &descriptor.arguments {
        parsers.push_str(&parser_arms(argument));
        help_strings.push_str(&help_line(argument));
        post_parse.push_str(&default_and_required(argument));
    }

    let export_line = if descriptor.arguments.is_empty() {
        String::new()
    } else {
        let names: Vec<String> = descriptor
            .arguments
            .iter()
            .map(|a| format!("par_{}", a.plain_name()))
            .collect();
        format!("export {}\n", names.join(" "))
    };

    Fragment {
        parsers,
        help_strings,
        post_parse,
        pre_run: export_line,
        run: run_section(descriptor, engines),
        ..Fragment::new()
    }
}

fn parser_arms(argument: &Argument) -> String {
    let name = argument.name();
    let var = format!("par_{}", argument.plain_name());
    if argument.multiple() {
        let sep = argument.multiple_sep();
        format!(
            r#"    {name})
      if [ -z "${{{var}+x}}" ]; then
        {var}="$2"
      else
        {var}="${var}{sep}$2"
      fi
      shift 2
      ;;
    {name}=*)
      if [ -z "${{{var}+x}}" ]; then
        {var}="${{1#*=}}"
      else
        {var}="${var}{sep}${{1#*=}}"
      fi
      shift
      ;;
"#
        )
    } else {
        format!(
            r#"    {name})
      {var}="$2"
      shift 2
      ;;
    {name}=*)
      {var}="${{1#*=}}"
      shift
      ;;
"#
        )
    }
}

fn help_line(argument: &Argument) -> String {
    let mut line = format!("    {}", argument.name());
    if argument.required() {
        line.push_str(" (required)");
    }
    if let Some(description) = argument.description() {
        line.push_str(&format!("  {description}"));
    }
    if let Some(default) = argument.default_value() {
        line.push_str(&format!(" (default: {default})"));
    }
    line.push('\n');
    line
}

fn default_and_required(argument: &Argument) -> String {
    let var = format!("par_{}", argument.plain_name());
    if let Some(default) = argument.default_value() {
        format!(
            "if [ -z \"${{{var}+x}}\" ]; then\n  {var}=\"{}\"\nfi\n",
            escape_double(default)
        )
    } else if argument.required() {
        format!(
            "if [ -z \"${{{var}+x}}\" ]; then\n  echo \"Missing required argument: {}\" >&2\n  exit 1\nfi\n",
            argument.name()
        )
    } else {
        String::new()
    }
}

fn run_section(descriptor: &ComponentDescriptor, engines: &EngineSet) -> String {
    let Some(script) = descriptor.main_script() else {
        return "echo \"Component declares no script to run\" >&2\nCAPSULE_EXIT_CODE=1\n"
            .to_string();
    };

    let mut arms = String::new();
    if engines.has_type(EngineType::Native) {
        arms.push_str(&format!(
            r#"  native)
    bash "$CAPSULE_RESOURCES_DIR/{script}" "${{CAPSULE_POSITIONAL_ARGS[@]}}" || CAPSULE_EXIT_CODE=$?
    ;;
"#
        ));
    }
    if engines.has_type(EngineType::Docker) {
        arms.push_str(&format!(
            r#"  docker)
    eval "$CAPSULE_EXEC_PREFIX bash {container_dir}/{script}" '"${{CAPSULE_POSITIONAL_ARGS[@]}}"' || CAPSULE_EXIT_CODE=$?
    ;;
"#,
            container_dir = descriptor.container_dir(),
        ));
    }
    if engines.has_type(EngineType::Apptainer) {
        arms.push_str(&format!(
            r#"  apptainer)
    eval "$CAPSULE_EXEC_PREFIX bash \"$CAPSULE_RESOURCES_DIR/{script}\"" '"${{CAPSULE_POSITIONAL_ARGS[@]}}"' || CAPSULE_EXIT_CODE=$?
    ;;
"#
        ));
    }

    format!("CAPSULE_EXIT_CODE=0\ncase \"$CAPSULE_ENGINE_TYPE\" in\n{arms}esac\n")
}
