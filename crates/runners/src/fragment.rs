//! Wrapper fragments.
//!
//! A [`Fragment`] is an immutable record of named text sections contributed
//! by one concern generator. Composition concatenates same-named sections
//! across fragments in strict generator-invocation order and never reorders
//! across sections, so later generators may rely on shell functions and
//! variables earlier ones define.

/// Named text sections contributed by one generator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragment {
    /// Variable and function definitions placed before argument parsing
    pub pre_parse: String,
    /// `case` arms inserted into the argument-parsing loop
    pub parsers: String,
    /// Lines appended to the generated help text
    pub help_strings: String,
    /// Code run after parsing, before the main command
    pub pre_run: String,
    /// The main command invocation
    pub run: String,
    /// Code run after the main command
    pub post_run: String,
    /// Code run directly after the parsing loop (mode dispatch, defaults)
    pub post_parse: String,
}

impl Fragment {
    /// An empty fragment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold fragments into one by concatenating same-named sections in
    /// iteration order.
    #[must_use]
    pub fn concat(fragments: impl IntoIterator<Item = Self>) -> Self {
        fragments.into_iter().fold(Self::new(), |mut acc, fragment| {
            append(&mut acc.pre_parse, &fragment.pre_parse);
            append(&mut acc.parsers, &fragment.parsers);
            append(&mut acc.help_strings, &fragment.help_strings);
            append(&mut acc.pre_run, &fragment.pre_run);
            append(&mut acc.run, &fragment.run);
            append(&mut acc.post_run, &fragment.post_run);
            append(&mut acc.post_parse, &fragment.post_parse);
            acc
        })
    }
}

fn append(section: &mut String, text: &str) {
    if text.is_empty() {
        return;
    }
    if !section.is_empty() && !section.ends_with('\n') {
        section.push('\n');
    }
    section.push_str(text);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concat_preserves_invocation_order_per_section() {
        let first = Fragment {
            pre_parse: "a=1\n".to_string(),
            run: "run_a\n".to_string(),
            ..Fragment::new()
        };
        let second = Fragment {
            pre_parse: "b=2\n".to_string(),
            parsers: "arm_b\n".to_string(),
            ..Fragment::new()
        };
        let merged = Fragment::concat([first, second]);
        assert_eq!(merged.pre_parse, "a=1\nb=2\n");
        assert_eq!(merged.parsers, "arm_b\n");
        assert_eq!(merged.run, "run_a\n");
        assert_eq!(merged.post_run, "");
    }

    #[test]
    fn sections_never_bleed_into_each_other() {
        let fragment = Fragment {
            pre_run: "before\n".to_string(),
            post_run: "after\n".to_string(),
            ..Fragment::new()
        };
        let merged = Fragment::concat([fragment]);
        assert_eq!(merged.pre_run, "before\n");
        assert_eq!(merged.post_run, "after\n");
    }
}
