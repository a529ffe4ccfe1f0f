//! URI scheme extraction for protocol-restricted attributes
//!
//! Browsers are forgiving about how a scheme is written: surrounding
//! whitespace and control characters are dropped and tabs or newlines inside
//! the URL are removed before the scheme is read. The scheme reported here is
//! the one a browser would act on, so `" java\tscript:alert(1)"` yields
//! `javascript`.

use regex::Regex;
use std::sync::OnceLock;

/// Extract the lowercased scheme of a URI reference
///
/// Returns `None` for relative references such as `/path`, `page.html`,
/// `#anchor` or `//host/path`.
///
/// # Examples
///
/// ```
/// use safe_html_validator::uri::scheme;
///
/// assert_eq!(scheme("https://example.com").as_deref(), Some("https"));
/// assert_eq!(scheme("  JavaScript:alert(1)").as_deref(), Some("javascript"));
/// assert_eq!(scheme("java\tscript:alert(1)").as_deref(), Some("javascript"));
/// assert_eq!(scheme("/relative/path"), None);
/// assert_eq!(scheme("a/b:c"), None);
/// ```
pub fn scheme(value: &str) -> Option<String> {
    let cleaned: String = value
        .trim_matches(|c: char| c <= ' ')
        .chars()
        .filter(|c| !matches!(c, '\t' | '\n' | '\r'))
        .collect();

    static SCHEME_REGEX: OnceLock<Option<Regex>> = OnceLock::new();
    let regex = SCHEME_REGEX.get_or_init(|| Regex::new(r"^([A-Za-z][A-Za-z0-9+.\-]*):").ok());
    let regex = regex.as_ref()?;

    regex
        .captures(&cleaned)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str().to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_common_schemes() {
        assert_eq!(scheme("http://example.com").as_deref(), Some("http"));
        assert_eq!(scheme("mailto:a@example.com").as_deref(), Some("mailto"));
        assert_eq!(scheme("data:text/html,x").as_deref(), Some("data"));
        assert_eq!(scheme("svn+ssh://host").as_deref(), Some("svn+ssh"));
    }

    #[test]
    fn test_relative_references() {
        assert_eq!(scheme(""), None);
        assert_eq!(scheme("   "), None);
        assert_eq!(scheme("page.html"), None);
        assert_eq!(scheme("../parent"), None);
        assert_eq!(scheme("#anchor"), None);
        assert_eq!(scheme("//cdn.example.com/a.js"), None);
        assert_eq!(scheme("?q=a:b"), None);
        assert_eq!(scheme("1abc:def"), None);
    }

    #[test]
    fn test_obfuscated_schemes() {
        assert_eq!(scheme("\u{0}javascript:x").as_deref(), Some("javascript"));
        assert_eq!(scheme("\x01\x02 JAVASCRIPT:x").as_deref(), Some("javascript"));
        assert_eq!(scheme("jav\nascr\ript:x").as_deref(), Some("javascript"));
        assert_eq!(scheme("vb\tscript:x").as_deref(), Some("vbscript"));
    }

    proptest! {
        #[test]
        fn prop_scheme_is_lowercase_prefix(
            name in "[A-Za-z][A-Za-z0-9+.-]{0,10}",
            rest in "[A-Za-z0-9/?=&%#.:-]{0,32}",
        ) {
            let value = format!("{name}:{rest}");
            let extracted = scheme(&value);
            prop_assert_eq!(extracted, Some(name.to_ascii_lowercase()));
        }

        #[test]
        fn prop_slash_prefixed_values_have_no_scheme(rest in "[A-Za-z0-9/?=&%#.:-]{0,32}") {
            let value = format!("/{rest}");
            prop_assert_eq!(scheme(&value), None);
        }
    }
}
