//! Translation between field identifiers and document node names.
//!
//! Identifiers may be written in any case with `_` separators (`pool_size`,
//! `POOL_SIZE`); their node name is lowercase with `-` separators
//! (`pool-size`). Matching a document key against an identifier ignores case
//! and treats `-` and `_` as the same character, so hand-edited documents
//! using either spelling resolve.

/// Node name for a field identifier. Purely numeric names are quoted.
pub fn node_name(ident: &str) -> String {
    if is_numeric(ident) {
        return format!("\"{ident}\"");
    }
    ident.to_lowercase().replace('_', "-")
}

/// Whether a document key refers to the given field identifier.
pub fn key_matches(key: &str, ident: &str) -> bool {
    key.len() == ident.len()
        && key
            .chars()
            .zip(ident.chars())
            .all(|(a, b)| normalize_char(a) == normalize_char(b))
}

/// Document form of a map key. Keys are kept verbatim and quoted only when a
/// plain scalar would not read back as the same string.
pub fn map_key(key: &str) -> String {
    if needs_quotes(key) {
        quote(key)
    } else {
        key.to_string()
    }
}

/// Double-quote a string. Line breaks are written as `\n`.
pub(crate) fn quote(s: &str) -> String {
    quote_with(s, "\\n")
}

/// Double-quote a string, writing line breaks as `newline`.
pub(crate) fn quote_with(s: &str, newline: &str) -> String {
    format!("\"{}\"", escape(s, newline))
}

/// Body of a double-quoted scalar. Characters YAML cannot carry verbatim
/// inside quotes use its escape sequences.
pub(crate) fn escape(s: &str, newline: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str(newline),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\0' => out.push_str("\\0"),
            c if needs_escape(c) => {
                let code = u32::from(c);
                if code <= 0xFF {
                    out.push_str(&format!("\\x{code:02X}"));
                } else {
                    out.push_str(&format!("\\u{code:04X}"));
                }
            }
            c => out.push(c),
        }
    }
    out
}

/// Control characters, Unicode line separators and non-characters.
fn needs_escape(c: char) -> bool {
    c.is_control() || matches!(c, '\u{2028}' | '\u{2029}' | '\u{FEFF}' | '\u{FFFE}' | '\u{FFFF}')
}

fn normalize_char(c: char) -> char {
    if c == '-' { '_' } else { c.to_ascii_lowercase() }
}

fn is_numeric(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

fn needs_quotes(key: &str) -> bool {
    if key.is_empty() || is_numeric(key) {
        return true;
    }
    if matches!(
        key.to_ascii_lowercase().as_str(),
        "true" | "false" | "null" | "yes" | "no" | "on" | "off" | "~"
    ) {
        return true;
    }
    if key.parse::<f64>().is_ok() {
        return true;
    }
    let first = key.chars().next().unwrap_or(' ');
    if "-?:,[]{}#&*!|>'\"%@` ".contains(first) || key.ends_with(' ') {
        return true;
    }
    key.contains(": ") || key.contains(" #") || key.ends_with(':') || key.chars().any(needs_escape)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upper_snake_becomes_kebab() {
        assert_eq!(node_name("FIELD_WITH_COMMENT"), "field-with-comment");
        assert_eq!(node_name("pool_size"), "pool-size");
    }

    #[test]
    fn numeric_names_are_quoted() {
        assert_eq!(node_name("1"), "\"1\"");
        assert_eq!(node_name("1a"), "1a");
    }

    #[test]
    fn key_matching_ignores_case_and_separator() {
        assert!(key_matches("pool-size", "pool_size"));
        assert!(key_matches("POOL_SIZE", "pool_size"));
        assert!(key_matches("Pool-Size", "POOL_SIZE"));
        assert!(!key_matches("pool", "pool_size"));
        assert!(!key_matches("poolxsize", "pool_size"));
    }

    #[test]
    fn plain_map_keys_are_verbatim() {
        assert_eq!(map_key("other"), "other");
        assert_eq!(map_key("Mixed_Case"), "Mixed_Case");
    }

    #[test]
    fn ambiguous_map_keys_are_quoted() {
        assert_eq!(map_key("2"), "\"2\"");
        assert_eq!(map_key("true"), "\"true\"");
        assert_eq!(map_key("1.5"), "\"1.5\"");
        assert_eq!(map_key("a: b"), "\"a: b\"");
        assert_eq!(map_key(""), "\"\"");
    }

    #[test]
    fn quote_escapes() {
        assert_eq!(quote(r#"say "hi" \o/"#), r#""say \"hi\" \\o/""#);
    }

    #[test]
    fn control_characters_use_yaml_escapes() {
        assert_eq!(quote("a\rb\tc"), r#""a\rb\tc""#);
        assert_eq!(quote("bell\u{7}"), r#""bell\x07""#);
        assert_eq!(quote("nul\0 del\u{7f}"), r#""nul\0 del\x7F""#);
        assert_eq!(quote("sep\u{2028}"), r#""sep\u2028""#);
        assert_eq!(quote("two\nlines"), r#""two\nlines""#);
        assert_eq!(quote_with("two\nlines", "{NL}"), r#""two{NL}lines""#);
        assert_eq!(quote("héllo ✓"), "\"héllo ✓\"");
    }

    #[test]
    fn map_keys_with_control_characters_are_escaped() {
        assert_eq!(map_key("tab\tkey"), r#""tab\tkey""#);
        assert_eq!(map_key("line\nkey"), r#""line\nkey""#);
    }
}
