//! Shell escaping utilities for generated command lines and scripts.

/// Characters that never need quoting in a POSIX shell word.
fn is_safe(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '/' | ':' | '=' | '@' | '%' | '+' | ',')
}

/// Quote a string for use as a single shell word.
///
/// Strings consisting only of safe characters are returned unchanged;
/// anything else is single-quoted with embedded quotes escaped.
#[must_use]
pub fn shell_quote(s: &str) -> String {
    if !s.is_empty() && s.chars().all(is_safe) {
        s.to_string()
    } else {
        format!("'{}'", s.replace('\'', r"'\''"))
    }
}

/// Quote and join a list of strings into a shell command fragment.
#[must_use]
pub fn quote_join<'a>(words: impl IntoIterator<Item = &'a str>) -> String {
    words
        .into_iter()
        .map(shell_quote)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Escape a string for embedding inside a double-quoted bash string.
#[must_use]
pub fn escape_double(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '\\' | '`' | '$' | '"') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
