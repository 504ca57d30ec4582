use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

static STAR_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*{2,}").expect("valid star run regex"));

/// Accent classes substituted for plain vowels.
const VOWEL_CLASSES: [(char, &str); 5] = [
    ('a', "[a,á,à,ä,â,ã]"),
    ('e', "[e,é,ë,ê]"),
    ('i', "[i,í,ï,ì,î]"),
    ('o', "[o,ó,ö,ò,ô]"),
    ('u', "[u,ü,ú,ù]"),
];

/// A compiled wildcard pattern, ready to be emitted as `{$regex, $options}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegexPattern {
    pub regex: String,
    pub case_insensitive: bool,
}

impl RegexPattern {
    pub fn to_json(&self) -> Value {
        let mut condition = Map::new();
        condition.insert("$regex".to_string(), Value::String(self.regex.clone()));
        let options = if self.case_insensitive { "i" } else { "" };
        condition.insert("$options".to_string(), Value::String(options.to_string()));
        Value::Object(condition)
    }
}

/// Where the literal text of a wildcard pattern must sit in the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Anchor {
    Prefix,
    Suffix,
    Anywhere,
}

/// Compile a glob-like `*` pattern into an accent-folding, case-insensitive regex.
///
/// `lu*` matches values starting with "lu", `*lu` values ending with it, and
/// `*lu*` (or a pattern with only interior stars) values containing it. Every
/// `*` is removed from the literal text, which is regex-escaped before vowel
/// expansion.
pub fn compile_wildcard(pattern: &str) -> RegexPattern {
    let collapsed = STAR_RUN_RE.replace_all(pattern, "*");
    let leading = collapsed.starts_with('*');
    let trailing = collapsed.ends_with('*');

    let anchor = match (leading, trailing) {
        (true, false) => Anchor::Suffix,
        (false, true) => Anchor::Prefix,
        _ => Anchor::Anywhere,
    };

    let literal = collapsed.replace('*', "");
    let body = expand_vowels(&regex::escape(&literal));

    let regex = match anchor {
        Anchor::Prefix => format!("^{}", body),
        Anchor::Suffix => format!("{}$", body),
        Anchor::Anywhere => body,
    };

    RegexPattern {
        regex,
        case_insensitive: true,
    }
}

fn expand_vowels(text: &str) -> String {
    let mut expanded = String::with_capacity(text.len() * 2);
    for c in text.chars() {
        match VOWEL_CLASSES.iter().find(|(vowel, _)| *vowel == c) {
            Some((_, class)) => expanded.push_str(class),
            None => expanded.push(c),
        }
    }
    expanded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_star_is_prefix_match() {
        let pattern = compile_wildcard("lucas****");
        assert_eq!(pattern.regex, "^l[u,ü,ú,ù]c[a,á,à,ä,â,ã]s");
        assert!(pattern.case_insensitive);
    }

    #[test]
    fn test_leading_star_is_suffix_match() {
        let pattern = compile_wildcard("*****douglas");
        assert_eq!(pattern.regex, "d[o,ó,ö,ò,ô][u,ü,ú,ù]gl[a,á,à,ä,â,ã]s$");
    }

    #[test]
    fn test_both_stars_is_substring_match() {
        let pattern = compile_wildcard("*****jorge*****");
        assert_eq!(pattern.regex, "j[o,ó,ö,ò,ô]rg[e,é,ë,ê]");
    }

    #[test]
    fn test_interior_star_is_stripped_and_unanchored() {
        let pattern = compile_wildcard("l*c");
        assert_eq!(pattern.regex, "lc");
    }

    #[test]
    fn test_lone_star_matches_anything() {
        assert_eq!(compile_wildcard("*").regex, "");
        assert_eq!(compile_wildcard("***").regex, "");
    }

    #[test]
    fn test_metacharacters_are_escaped() {
        let pattern = compile_wildcard("v1.2*");
        assert_eq!(pattern.regex, r"^v1\.2");
    }

    #[test]
    fn test_uppercase_vowels_are_left_alone() {
        assert_eq!(compile_wildcard("LU*").regex, "^LU");
    }

    #[test]
    fn test_compiled_regex_matches_accented_values() {
        let pattern = compile_wildcard("jose*");
        let re = Regex::new(&format!("(?i){}", pattern.regex)).unwrap();
        assert!(re.is_match("José Silva"));
        assert!(re.is_match("JOSE"));
        assert!(!re.is_match("Maria José"));
    }

    #[test]
    fn test_to_json_shape() {
        assert_eq!(
            compile_wildcard("lu*").to_json(),
            serde_json::json!({"$regex": "^l[u,ü,ú,ù]", "$options": "i"})
        );
    }
}
