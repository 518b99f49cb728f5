//! Native-engine concern.
//!
//! A native run is a direct process invocation with no subprocess wrapping
//! layer, so this generator only clears the exec prefix and short-circuits
//! the container-only modes.

use crate::fragment::Fragment;
use capsule_core::EngineType;
use capsule_engines::EngineSet;

pub(crate) fn fragment(engines: &EngineSet) -> Fragment {
    if !engines.has_type(EngineType::Native) {
        return Fragment::new();
    }

    Fragment {
        post_parse: r#"if [ "$CAPSULE_ENGINE_TYPE" == "native" ] && [ -n "$CAPSULE_MODE" ]; then
  exit 0
fi
"#
        .to_string(),
        pre_run: r#"if [ "$CAPSULE_ENGINE_TYPE" == "native" ]; then
  CAPSULE_EXEC_PREFIX=""
fi
"#
        .to_string(),
        ..Fragment::new()
    }
}
