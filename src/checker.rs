//! Safelist conformance check for fragment documents
//!
//! The check walks the fragment below the shell's `<body>` in depth-first
//! pre-order and stops at the first node the [`Safelist`] does not permit:
//!
//! - an element passes if its tag is allowed and every attribute is allowed
//!   on that tag (directly, through the `:all` wildcard, or as an enforced
//!   value), with protocol-restricted attributes carrying either no scheme or
//!   one of the listed schemes
//! - text and comments always pass
//! - doctypes and processing instructions never pass
//!
//! A failed check is an ordinary outcome and is reported as `false`; the
//! offending node is only named in a `debug` trace event.
//!
//! # Examples
//!
//! ```rust
//! use safe_html_validator::checker::is_conformant;
//! use safe_html_validator::fragment::load_fragment;
//! use safe_html_validator::safelist::{Preset, Safelist};
//!
//! let safelist = Safelist::from_preset(Preset::SimpleText);
//! assert!(is_conformant(&load_fragment("<b>hello</b>", ""), &safelist));
//! assert!(!is_conformant(&load_fragment("<script>alert(1)</script>", ""), &safelist));
//! ```

use tracing::debug;

use crate::fragment::{Element, FragmentDocument, Node, NodeKind};
use crate::safelist::Safelist;

/// Whether every node and attribute of `document` is permitted by `safelist`
pub fn is_conformant(document: &FragmentDocument, safelist: &Safelist) -> bool {
    if !document.children(document.head()).is_empty() {
        debug!("shell head is not empty");
        return false;
    }

    document.children(document.body()).iter().all(|&top| {
        document
            .descendants(top)
            .all(|id| node_conforms(document.node(id), safelist))
    })
}

fn node_conforms(node: &Node, safelist: &Safelist) -> bool {
    match node.kind() {
        NodeKind::Element(element) => element_conforms(element, safelist),
        NodeKind::Text(_) | NodeKind::Comment(_) => true,
        NodeKind::Doctype(name) => {
            debug!(doctype = %name, "doctype is not permitted in a fragment");
            false
        }
        NodeKind::ProcessingInstruction(target) => {
            debug!(target = %target, "processing instruction is not permitted in a fragment");
            false
        }
        NodeKind::Document => false,
    }
}

fn element_conforms(element: &Element, safelist: &Safelist) -> bool {
    let tag = element.name();
    if !safelist.is_safe_tag(tag) {
        debug!(tag, "tag is not on the safelist");
        return false;
    }

    for (attribute, value) in element.attributes() {
        if !safelist.is_safe_attribute(tag, attribute, value) {
            debug!(tag, attribute, "attribute or its value is not on the safelist");
            return false;
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::load_fragment;
    use crate::safelist::{ALL_TAGS, Preset, TagSpec};

    fn check(preset: Preset, input: &str) -> bool {
        is_conformant(&load_fragment(input, ""), &Safelist::from_preset(preset))
    }

    #[test]
    fn test_empty_and_plain_text_conform() {
        for preset in Preset::ALL {
            assert!(check(preset, ""), "{preset}: empty input");
            assert!(check(preset, "plain text, 1 > 0 & so on"), "{preset}: text");
        }
    }

    #[test]
    fn test_none_rejects_any_element() {
        assert!(!check(Preset::None, "<b>x</b>"));
        assert!(!check(Preset::None, "text <br/>"));
        assert!(!check(Preset::None, "<unknown-tag>"));
    }

    #[test]
    fn test_nested_disallowed_element_is_found() {
        assert!(check(Preset::Basic, "<p><em><b>deep</b></em></p>"));
        assert!(!check(Preset::Basic, "<p><em><b><iframe></iframe></b></em></p>"));
        assert!(!check(Preset::Basic, "<p>ok</p><p>ok</p><p><img></p>"));
    }

    #[test]
    fn test_context_illegal_elements_are_judged_where_written() {
        assert!(check(Preset::Relaxed, "<td>cell</td>"));
        assert!(!check(Preset::Basic, "<td>cell</td>"));
        assert!(!check(Preset::Basic, "<b>x</b><tr><td>y</td></tr>"));
    }

    #[test]
    fn test_attribute_rules() {
        assert!(check(Preset::Basic, r#"<a href="https://example.com">x</a>"#));
        assert!(check(Preset::Basic, r#"<a href="/local">x</a>"#));
        assert!(!check(Preset::Basic, r#"<a href="javascript:alert(1)">x</a>"#));
        assert!(!check(Preset::Basic, r#"<a href="x" onclick="y">x</a>"#));
        assert!(!check(Preset::Basic, r#"<b class="x">x</b>"#));
    }

    #[test]
    fn test_enforced_attribute_value() {
        assert!(check(Preset::Basic, r#"<a href="http://x" rel="nofollow">x</a>"#));
        assert!(!check(Preset::Basic, r#"<a href="http://x" rel="opener">x</a>"#));
        assert!(!check(Preset::Relaxed, r#"<a rel="nofollow">x</a>"#));
    }

    #[test]
    fn test_wildcard_attributes() {
        let mut safelist = Safelist::from_preset(Preset::SimpleText);
        safelist.add_attributes(ALL_TAGS, ["title"]);
        let document = load_fragment(r#"<b title="t"><i title="u">x</i></b>"#, "");
        assert!(is_conformant(&document, &safelist));
    }

    #[test]
    fn test_comments_pass_doctypes_do_not() {
        assert!(check(Preset::SimpleText, "<!-- note --><b>x</b>"));
        assert!(check(Preset::None, "<!-- <script> -->"));
        assert!(!check(Preset::Relaxed, "<!DOCTYPE html><p>x</p>"));
    }

    #[test]
    fn test_processing_instruction_node_is_rejected() {
        let mut document = load_fragment("<b>x</b>", "");
        let body = document.body();
        document.append(body, NodeKind::ProcessingInstruction("php".to_string()));
        assert!(!is_conformant(&document, &Safelist::from_preset(Preset::Relaxed)));
    }

    #[test]
    fn test_parsed_processing_instruction_is_rejected() {
        assert!(!check(Preset::Relaxed, "<?php x ?>"));
        assert!(!check(Preset::None, "plain <?xml version=\"1.0\"?> text"));
    }

    #[test]
    fn test_non_empty_head_is_rejected() {
        let mut document = load_fragment("<b>x</b>", "");
        let head = document.head();
        document.append(head, NodeKind::Text("x".to_string()));
        assert!(!is_conformant(&document, &Safelist::from_preset(Preset::Relaxed)));
    }

    #[test]
    fn test_tag_spec_protocols() {
        let safelist = Safelist::build(
            Preset::None,
            &[] as &[&str],
            &[TagSpec::new("embed-link").with_protocols("src", ["https"])],
        );
        let ok = load_fragment(r#"<embed-link src="https://x">"#, "");
        let relative = load_fragment(r#"<embed-link src="x.png">"#, "");
        let bad = load_fragment(r#"<embed-link src="http://x">"#, "");
        assert!(is_conformant(&ok, &safelist));
        assert!(is_conformant(&relative, &safelist));
        assert!(!is_conformant(&bad, &safelist));
    }

    #[test]
    fn test_check_is_repeatable() {
        let safelist = Safelist::from_preset(Preset::Basic);
        let document = load_fragment(r#"<a href="ftp://x">x</a><script></script>"#, "");
        let first = is_conformant(&document, &safelist);
        let second = is_conformant(&document, &safelist);
        assert!(!first);
        assert_eq!(first, second);
    }
}
