//! Identifier and token spelling helpers shared by the tree builder and the emitters.

use heck::{ToKebabCase, ToSnakeCase, ToUpperCamelCase};
use once_cell::sync::Lazy;
use regex::Regex;

/// Command line spelling of a service, endpoint or field name.
pub fn kebab(name: &str) -> String {
    name.to_kebab_case()
}

/// Rust identifier built from several terms, e.g. `["calc", "add", "a"]` -> `calc_add_a`.
pub fn snake(terms: &[&str]) -> String {
    terms
        .iter()
        .map(|t| t.to_snake_case())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

/// Snake-case Rust identifier for one name, raw-escaped when it is a keyword.
pub fn ident(name: &str) -> String {
    const KEYWORDS: &[&str] = &[
        "as", "async", "await", "box", "break", "const", "continue", "dyn", "else", "enum",
        "extern", "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move",
        "mut", "pub", "ref", "return", "static", "struct", "trait", "true", "type", "unsafe",
        "use", "where", "while", "yield",
    ];
    let id = name.to_snake_case();
    if KEYWORDS.contains(&id.as_str()) {
        format!("r#{id}")
    } else {
        id
    }
}

/// Rust type-style name, e.g. `add` -> `Add`, `list-bottles` -> `ListBottles`.
pub fn camel(name: &str) -> String {
    name.to_upper_camel_case()
}

/// Quote a value for display in a shell command line.
///
/// Plain words are returned as-is; anything else is wrapped in single quotes
/// with embedded single quotes escaped the POSIX way.
pub fn shell_quote(value: &str) -> String {
    static PLAIN_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"^[A-Za-z0-9_@%+=:,./-]+$").expect("valid regex"));
    if PLAIN_RE.is_match(value) {
        return value.to_string();
    }
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// Remove one level of quoting added by [`shell_quote`].
pub fn shell_unquote(value: &str) -> String {
    match value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')) {
        Some(inner) => inner.replace(r"'\''", "'"),
        None => value.to_string(),
    }
}
