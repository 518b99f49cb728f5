//! Engine-selection concern.
//!
//! Emits the `---engine` flag, the shared `---setup`/`---debug` mode flags,
//! and the id→type dispatch `case` generated from the validated engine
//! table. The dispatch fallthrough exits 1 listing the declared ids.

use crate::fragment::Fragment;
use capsule_engines::EngineSet;

pub(crate) fn fragment(engines: &EngineSet) -> Fragment {
    let default_id = engines.default_engine().id();

    let mut dispatch = String::new();
    for engine in engines.engines() {
        dispatch.push_str(&format!(
            "  {})\n    CAPSULE_ENGINE_TYPE=\"{}\"\n    ;;\n",
            engine.id(),
            engine.engine_type()
        ));
    }
    let allowed = engines.ids().join(", ");

    Fragment {
        pre_parse: format!(
            "CAPSULE_ENGINE_ID=\"{default_id}\"\nCAPSULE_MODE=\"\"\nCAPSULE_SETUP_STRATEGY=\"\"\n"
        ),
        parsers: r#"    ---engine)
      CAPSULE_ENGINE_ID="$2"
      shift 2
      ;;
    ---engine=*)
      CAPSULE_ENGINE_ID="${1#*=}"
      shift
      ;;
    ---setup)
      CAPSULE_MODE="setup"
      shift
      ;;
    ---setup=*)
      CAPSULE_MODE="setup"
      CAPSULE_SETUP_STRATEGY="${1#*=}"
      shift
      ;;
    ---debug)
      CAPSULE_MODE="debug"
      shift
      ;;
"#
        .to_string(),
        help_strings: format!(
            "    ---engine=ID         select the engine to run with (default: {default_id})\n\
             \x20   ---setup[=STRATEGY]  apply the image setup strategy and exit\n\
             \x20   ---debug             open an interactive shell in the container\n"
        ),
        post_parse: format!(
            r#"case "$CAPSULE_ENGINE_ID" in
{dispatch}  *)
    echo "Unknown engine id '$CAPSULE_ENGINE_ID'. Declared engines: {allowed}" >&2
    exit 1
    ;;
esac
"#
        ),
        ..Fragment::new()
    }
}
