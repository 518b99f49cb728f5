//! Mount, ownership-fixup and resource-limit concern.
//!
//! Emits the automount helper functions (absolute-path resolution, host→
//! container translation, prefix stripping), the per-argument mount
//! detection, the post-run ownership fixup registered as an exit trap so it
//! runs on all exit paths, and the `---cpus`/`---memory` limit flags.
//!
//! The automount prefix is read once at wrapper start from the
//! `CAPSULE_AUTOMOUNT_PREFIX` environment variable; an empty value disables
//! prefixing entirely.

use crate::fragment::Fragment;
use crate::mount::{AUTOMOUNT_PREFIX_ENV, DEFAULT_AUTOMOUNT_PREFIX};
use capsule_core::{ComponentDescriptor, Direction, EngineType};
use capsule_engines::EngineSet;

pub(crate) fn fragment(descriptor: &ComponentDescriptor, engines: &EngineSet) -> Fragment {
    let has_docker = engines.has_type(EngineType::Docker);
    let has_apptainer = engines.has_type(EngineType::Apptainer);
    if !has_docker && !has_apptainer {
        return Fragment::new();
    }

    let mut pre_parse = format!(
        "{AUTOMOUNT_PREFIX_ENV}=\"${{{AUTOMOUNT_PREFIX_ENV}-{DEFAULT_AUTOMOUNT_PREFIX}}}\"\n"
    );

    pre_parse.push_str(
        r#"
CapsuleAbsolutePath() {
  case "$1" in
    /*)
      echo "$1"
      ;;
    *)
      echo "$PWD/${1#./}"
      ;;
  esac
}

CapsuleAutodetectMount() {
  local abs
  abs=$(CapsuleAbsolutePath "$1")
  echo "$CAPSULE_AUTOMOUNT_PREFIX$abs"
}

CapsuleMountArg() {
  local abs dir
  abs=$(CapsuleAbsolutePath "$1")
  dir=$(dirname "$abs")
  case " $CAPSULE_MOUNT_ARGS " in
    *" -v \"$dir:$CAPSULE_AUTOMOUNT_PREFIX$dir\" "*)
      ;;
    *)
      CAPSULE_MOUNT_ARGS="$CAPSULE_MOUNT_ARGS -v \"$dir:$CAPSULE_AUTOMOUNT_PREFIX$dir\""
      ;;
  esac
}

CapsuleStripAutomount() {
  if [ -z "$CAPSULE_AUTOMOUNT_PREFIX" ]; then
    echo "$1"
  else
    echo "${1#"$CAPSULE_AUTOMOUNT_PREFIX"}"
  fi
}

CAPSULE_MOUNT_ARGS=""
CAPSULE_CHOWN_TARGETS=()

"#,
    );

    pre_parse.push_str(&detect_mounts_fn(descriptor));

    if has_docker {
        pre_parse.push_str(
            r#"
CapsuleChownOutputs() {
  if [ "${#CAPSULE_CHOWN_TARGETS[@]}" -gt 0 ]; then
    eval "docker run --rm --entrypoint=chown$CAPSULE_MOUNT_ARGS $(CapsuleDockerImage) -R $(id -u):$(id -g) ${CAPSULE_CHOWN_TARGETS[*]} >/dev/null 2>&1 || true"
  fi
}
"#,
        );
    }

    let pre_run = if has_docker {
        r#"if [ "$CAPSULE_ENGINE_TYPE" == "docker" ]; then
  trap CapsuleChownOutputs EXIT
fi
"#
        .to_string()
    } else {
        String::new()
    };

    let post_run = if has_docker {
        strip_mounts(descriptor)
    } else {
        String::new()
    };

    Fragment {
        pre_parse,
        parsers: r#"    ---cpus)
      CAPSULE_CPUS="$2"
      shift 2
      ;;
    ---cpus=*)
      CAPSULE_CPUS="${1#*=}"
      shift
      ;;
    ---memory)
      CAPSULE_MEMORY="$2"
      shift 2
      ;;
    ---memory=*)
      CAPSULE_MEMORY="${1#*=}"
      shift
      ;;
"#
        .to_string(),
        help_strings: "    ---cpus=N            limit the container to N cpus\n\
                       \x20   ---memory=BYTES      limit the container memory\n"
            .to_string(),
        pre_run,
        post_run,
        ..Fragment::new()
    }
}

/// The mount-detection function: translate every provided file argument and
/// record its bind mount, queuing output paths for ownership fixup.
fn detect_mounts_fn(descriptor: &ComponentDescriptor) -> String {
    let mut body = String::from("  CAPSULE_MOUNT_ARGS=\"\"\n  CAPSULE_CHOWN_TARGETS=()\n");
    for argument in &descriptor.arguments {
        let Some(file) = argument.as_file() else {
            continue;
        };
        let var = format!("par_{}", argument.plain_name());
        let is_output = file.direction == Direction::Output;
        if file.multiple {
            let sep = file.multiple_sep;
            let chown = if is_output {
                "      CAPSULE_CHOWN_TARGETS+=(\"$capsule_part\")\n"
            } else {
                ""
            };
            body.push_str(&format!(
                r#"  if [ -n "${{{var}+x}}" ]; then
    CAPSULE_JOINED=""
    IFS='{sep}' read -r -a CAPSULE_SPLIT_PARTS <<< "${var}"
    for capsule_part in "${{CAPSULE_SPLIT_PARTS[@]}}"; do
      CapsuleMountArg "$capsule_part"
      capsule_part=$(CapsuleAutodetectMount "$capsule_part")
{chown}      CAPSULE_JOINED="${{CAPSULE_JOINED:+$CAPSULE_JOINED{sep}}}$capsule_part"
    done
    {var}="$CAPSULE_JOINED"
  fi
"#
            ));
        } else {
            let chown = if is_output {
                format!("    CAPSULE_CHOWN_TARGETS+=(\"${var}\")\n")
            } else {
                String::new()
            };
            body.push_str(&format!(
                "  if [ -n \"${{{var}+x}}\" ]; then\n    CapsuleMountArg \"${var}\"\n    {var}=$(CapsuleAutodetectMount \"${var}\")\n{chown}  fi\n"
            ));
        }
    }
    format!("CapsuleDetectMounts() {{\n{body}}}\n")
}

/// Rewrite translated file arguments back to host paths after the run.
fn strip_mounts(descriptor: &ComponentDescriptor) -> String {
    let mut body = String::new();
    for argument in &descriptor.arguments {
        let Some(file) = argument.as_file() else {
            continue;
        };
        let var = format!("par_{}", argument.plain_name());
        if file.multiple {
            let sep = file.multiple_sep;
            body.push_str(&format!(
                r#"  if [ -n "${{{var}+x}}" ]; then
    CAPSULE_JOINED=""
    IFS='{sep}' read -r -a CAPSULE_SPLIT_PARTS <<< "${var}"
    for capsule_part in "${{CAPSULE_SPLIT_PARTS[@]}}"; do
      capsule_part=$(CapsuleStripAutomount "$capsule_part")
      CAPSULE_JOINED="${{CAPSULE_JOINED:+$CAPSULE_JOINED{sep}}}$capsule_part"
    done
    {var}="$CAPSULE_JOINED"
  fi
"#
            ));
        } else {
            body.push_str(&format!(
                "  if [ -n \"${{{var}+x}}\" ]; then\n    {var}=$(CapsuleStripAutomount \"${var}\")\n  fi\n"
            ));
        }
    }
    if body.is_empty() {
        return String::new();
    }
    format!("if [ \"$CAPSULE_ENGINE_TYPE\" == \"docker\" ]; then\n{body}fi\n")
}
