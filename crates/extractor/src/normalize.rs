use crate::language::is_filtered;
use once_cell::sync::Lazy;
use regex::Regex;

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][\w]*(?:(?:\.|::)[A-Za-z_][\w]*)*$").unwrap());

/// Normalize a raw captured type token and append every surviving name to `out`.
///
/// `Dictionary<string, List<Item>>[]` yields `Item` (the base names `Dictionary` and
/// `List` and the argument `string` are filtered out).
pub(crate) fn normalize_into(raw: &str, out: &mut Vec<String>) {
    let token = strip_array_suffix(raw.trim()).trim_end_matches('?').trim();
    if token.is_empty() {
        return;
    }

    if let Some(inner) = token.strip_prefix('(').and_then(|t| t.strip_suffix(')')) {
        for element in split_top_level(inner) {
            normalize_into(leading_type_token(element), out);
        }
        return;
    }

    if let Some(open) = token.find('<') {
        let base = token[..open].trim();
        let args = match token.rfind('>') {
            Some(close) if close > open => &token[open + 1..close],
            _ => &token[open + 1..],
        };
        for arg in split_top_level(args) {
            normalize_into(arg, out);
        }
        push_if_kept(base, out);
        return;
    }

    push_if_kept(token, out);
}

fn push_if_kept(token: &str, out: &mut Vec<String>) {
    let token = token.strip_prefix("global::").unwrap_or(token);
    if !IDENTIFIER.is_match(token) || is_filtered(token) {
        return;
    }
    out.push(token.to_string());
}

/// Remove every `[...]` segment (`int[,]`, `Item[][]`)
pub(crate) fn strip_array_suffix(token: &str) -> &str {
    match token.find('[') {
        Some(idx) => token[..idx].trim_end(),
        None => token,
    }
}

/// Split on commas that are not nested inside `<>`, `()` or `[]`
pub(crate) fn split_top_level(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;

    for (idx, ch) in text.char_indices() {
        match ch {
            '<' | '(' | '[' => depth += 1,
            '>' | ')' | ']' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(text[start..idx].trim());
                start = idx + 1;
            }
            _ => {}
        }
    }
    parts.push(text[start..].trim());
    parts.retain(|part| !part.is_empty());
    parts
}

const PARAMETER_MODIFIERS: &[&str] = &["this", "ref", "out", "in", "params", "readonly", "scoped"];

/// Type token at the start of a parameter or tuple element
/// (`[NotNull] ref Dictionary<int, Foo> map = null` -> `Dictionary<int, Foo>`)
pub(crate) fn leading_type_token(param: &str) -> &str {
    let mut rest = param.trim();

    while rest.starts_with('[') {
        match rest.find(']') {
            Some(close) => rest = rest[close + 1..].trim_start(),
            None => return "",
        }
    }

    loop {
        let word_end = rest
            .find(|c: char| c.is_whitespace())
            .unwrap_or(rest.len());
        let word = &rest[..word_end];
        if PARAMETER_MODIFIERS.contains(&word) && word_end < rest.len() {
            rest = rest[word_end..].trim_start();
        } else {
            break;
        }
    }

    let mut depth = 0i32;
    for (idx, ch) in rest.char_indices() {
        match ch {
            '<' | '(' | '[' => depth += 1,
            '>' | ')' | ']' => depth -= 1,
            c if c.is_whitespace() && depth == 0 => {
                // `List <int>` style spacing keeps the generic part attached
                let tail = rest[idx..].trim_start();
                if tail.starts_with('<') || tail.starts_with('[') || tail.starts_with('?') {
                    continue;
                }
                return rest[..idx].trim();
            }
            _ => {}
        }
    }
    rest.trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn normalize(raw: &str) -> Vec<String> {
        let mut out = Vec::new();
        normalize_into(raw, &mut out);
        out
    }

    #[test]
    fn strips_arrays_and_nullable() {
        assert_eq!(normalize("Enemy[]"), vec!["Enemy"]);
        assert_eq!(normalize("Enemy[,][]"), vec!["Enemy"]);
        assert_eq!(normalize("Target?"), vec!["Target"]);
    }

    #[test]
    fn expands_generic_arguments_recursively() {
        assert_eq!(
            normalize("Registry<Item, Pool<Bullet>>"),
            vec!["Item", "Bullet", "Pool", "Registry"]
        );
        assert_eq!(normalize("Dictionary<string, List<Item>>"), vec!["Item"]);
    }

    #[test]
    fn drops_keywords_and_common_types() {
        assert!(normalize("int").is_empty());
        assert!(normalize("System.String").is_empty());
        assert!(normalize("void").is_empty());
    }

    #[test]
    fn tuple_elements_are_treated_individually() {
        assert_eq!(normalize("(Enemy target, int score)"), vec!["Enemy"]);
    }

    #[test]
    fn splits_only_top_level_commas() {
        assert_eq!(
            split_top_level("A<B, C>, D, E[,]"),
            vec!["A<B, C>", "D", "E[,]"]
        );
    }

    #[test]
    fn leading_type_skips_attributes_and_modifiers() {
        assert_eq!(
            leading_type_token("[NotNull] ref Dictionary<int, Foo> map = null"),
            "Dictionary<int, Foo>"
        );
        assert_eq!(leading_type_token("params Item[] items"), "Item[]");
        assert_eq!(leading_type_token("this Player player"), "Player");
        assert_eq!(leading_type_token("Weapon"), "Weapon");
    }
}
