//! Rich-content translation: parse, slot matching, rebuild rules.

use std::rc::Rc;

use pgt::{
    ComponentRegistry, ComponentSlot, Element, Engine, Node, Scope, Slot, Slots, TransProps,
    create_trans, trans,
};
use serde_json::json;

fn fixture() -> Engine {
    let engine = Engine::from_json(json!({
        "lng": "en",
        "fallbackLng": "en",
        "resources": {
            "en": {
                "translation": {
                    "plain": "Just text",
                    "greet": "Hello {{name}}",
                    "subscribe": "Click <0>here</0> to <1>subscribe</1>.",
                    "nested": "Go to <0>the <1>best</1> page</0> now",
                    "named": "Read the <docs>manual</docs>",
                    "keep": "First line<br/>then <strong>bold</strong> text",
                    "unknown": "A <widget>strange <b>thing</b></widget> here",
                    "unknown-void": "A <widget/> here",
                    "empty": "",
                    "item_one": "{{count}} item",
                    "item_other": "{{count}} items",
                },
            },
            "fr": {
                "translation": {
                    "subscribe": "Cliquez <0>ici</0> pour <1>abonner</1>.",
                },
            },
        },
    }))
    .unwrap();
    engine.init().unwrap();
    engine
}

fn element(node: &Node) -> &Element {
    node.as_element().expect("expected element")
}

#[test]
fn subscribe_scenario_builds_anchor_and_bold() {
    let props = TransProps::new()
        .engine(fixture())
        .key("subscribe")
        .slots(Slots::positional([
            Slot::Element(Element::new("a").attr("href", "")),
            Slot::Element(Element::new("b")),
        ]));

    let content = trans(&props);
    assert_eq!(content.len(), 5);
    assert_eq!(content[0], Node::text("Click "));

    let anchor = element(&content[1]);
    assert_eq!(anchor.name, "a");
    assert_eq!(anchor.attr_value("href"), Some(""));
    assert_eq!(anchor.children, vec![Node::text("here")]);

    assert_eq!(content[2], Node::text(" to "));

    let bold = element(&content[3]);
    assert_eq!(bold.name, "b");
    assert_eq!(bold.children, vec![Node::text("subscribe")]);

    assert_eq!(content[4], Node::text("."));
}

#[test]
fn output_order_is_document_order() {
    let props = TransProps::new()
        .engine(fixture())
        .key("subscribe")
        .slots(Slots::positional([
            Slot::Element(Element::new("a")),
            Slot::Element(Element::new("b")),
        ]));

    let kinds: Vec<String> = trans(&props)
        .iter()
        .map(|node| match node {
            Node::Text(text) => format!("text:{text}"),
            Node::Element(el) => format!("el:{}", el.name),
        })
        .collect();
    assert_eq!(
        kinds,
        vec!["text:Click ", "el:a", "text: to ", "el:b", "text:."]
    );
}

#[test]
fn plain_string_fast_path() {
    let props = TransProps::new().engine(fixture()).key("plain");
    assert_eq!(trans(&props), vec![Node::text("Just text")]);
}

#[test]
fn plain_rebuild_is_identity() {
    // No slots, no keep tags: output equals the raw translated text.
    let engine = fixture();
    let raw = engine.t("plain");
    let props = TransProps::new().engine(engine).key("plain");
    let content = trans(&props);
    assert_eq!(content, vec![Node::text(raw)]);
}

#[test]
fn empty_translation_renders_nothing() {
    let props = TransProps::new().engine(fixture()).key("empty");
    assert!(trans(&props).is_empty());
}

#[test]
fn missing_key_without_default_renders_key() {
    let props = TransProps::new().engine(fixture()).key("missing.key");
    assert_eq!(trans(&props), vec![Node::text("missing.key")]);
}

#[test]
fn missing_key_with_default_renders_default() {
    let props = TransProps::new()
        .engine(fixture())
        .key("missing.key")
        .default_value("Fallback");
    assert_eq!(trans(&props), vec![Node::text("Fallback")]);
}

#[test]
fn values_interpolate_in_text_nodes() {
    let props = TransProps::new()
        .engine(fixture())
        .key("greet")
        .value("name", "Ada");
    assert_eq!(trans(&props), vec![Node::text("Hello Ada")]);
}

#[test]
fn count_selects_plural_form() {
    let engine = fixture();
    let one = TransProps::new().engine(engine.clone()).key("item").count(1);
    assert_eq!(trans(&one), vec![Node::text("1 item")]);

    let many = TransProps::new().engine(engine).key("item").count(5);
    assert_eq!(trans(&many), vec![Node::text("5 items")]);
}

#[test]
fn nested_slots_through_element_children() {
    // <0> maps to a link whose own children provide the nested slot <1>.
    let link = Element::new("a")
        .attr("href", "/page")
        .text("the ")
        .child(Element::new("b").text("best"))
        .text(" page");
    let props = TransProps::new()
        .engine(fixture())
        .key("nested")
        .slots(Slots::positional([Slot::Element(link)]));

    let content = trans(&props);
    assert_eq!(content[0], Node::text("Go to "));

    let anchor = element(&content[1]);
    assert_eq!(anchor.name, "a");
    assert_eq!(anchor.attr_value("href"), Some("/page"));
    assert_eq!(anchor.children.len(), 3);
    assert_eq!(anchor.children[0], Node::text("the "));
    let bold = element(&anchor.children[1]);
    assert_eq!(bold.name, "b");
    assert_eq!(bold.children, vec![Node::text("best")]);
    assert_eq!(anchor.children[2], Node::text(" page"));

    assert_eq!(content[2], Node::text(" now"));
}

#[test]
fn childless_placeholder_keeps_element_content() {
    // The translation's <0/> carries no children; the slot element's own
    // content fills it.
    let engine = Engine::from_json(json!({
        "lng": "en",
        "resources": { "en": { "translation": { "k": "Press <0/> now" } } },
    }))
    .unwrap();
    engine.init().unwrap();

    let button = Element::new("button").text("Save");
    let props = TransProps::new()
        .engine(engine)
        .key("k")
        .slots(Slots::positional([Slot::Element(button)]));

    let content = trans(&props);
    let el = element(&content[1]);
    assert_eq!(el.name, "button");
    assert_eq!(el.children, vec![Node::text("Save")]);
}

#[test]
fn named_slot_matches_symbolic_tag() {
    let props = TransProps::new()
        .engine(fixture())
        .key("named")
        .slots(Slots::new().named("docs", Element::new("a").attr("href", "/docs")));

    let content = trans(&props);
    assert_eq!(content[0], Node::text("Read the "));
    let anchor = element(&content[1]);
    assert_eq!(anchor.name, "a");
    assert_eq!(anchor.children, vec![Node::text("manual")]);
}

#[test]
fn parsed_attributes_merge_without_overriding() {
    let engine = Engine::from_json(json!({
        "lng": "en",
        "resources": {
            "en": { "translation": { "k": "See <0 class=\"hint\" href=\"theirs\">this</0>" } },
        },
    }))
    .unwrap();
    engine.init().unwrap();

    let props = TransProps::new()
        .engine(engine)
        .key("k")
        .slots(Slots::positional([Slot::Element(
            Element::new("a").attr("href", "mine"),
        )]));

    let content = trans(&props);
    let anchor = element(&content[1]);
    assert_eq!(anchor.attr_value("href"), Some("mine"), "slot props win");
    assert_eq!(anchor.attr_value("class"), Some("hint"), "parsed attrs merge in");
}

#[test]
fn keep_tags_materialize_without_slots() {
    let props = TransProps::new().engine(fixture()).key("keep");
    let content = trans(&props);

    assert_eq!(content[0], Node::text("First line"));
    let br = element(&content[1]);
    assert_eq!(br.name, "br");
    assert!(br.void);
    assert!(br.children.is_empty());
    assert_eq!(content[2], Node::text("then "));
    let strong = element(&content[3]);
    assert_eq!(strong.name, "strong");
    assert_eq!(strong.children, vec![Node::text("bold")]);
    assert_eq!(content[4], Node::text(" text"));
}

#[test]
fn unknown_symbolic_tag_degrades_to_literal_markup() {
    let props = TransProps::new()
        .engine(fixture())
        .key("unknown")
        .slots(Slots::new().named("unused", Slot::Text("x".to_string())));

    let content = trans(&props);
    assert_eq!(content[0], Node::text("A "));
    assert_eq!(
        content[1],
        Node::text("<widget>strange <b>thing</b></widget>"),
        "unmatched tag keeps its markup instead of disappearing"
    );
    assert_eq!(content[2], Node::text(" here"));
}

#[test]
fn unknown_void_tag_renders_empty_paired_literal() {
    let props = TransProps::new()
        .engine(fixture())
        .key("unknown-void")
        .slots(Slots::new().named("unused", Slot::Text("x".to_string())));

    let content = trans(&props);
    assert_eq!(content[1], Node::text("<widget></widget>"));
}

#[test]
fn unmatched_numeric_tag_unwraps_children() {
    let engine = Engine::from_json(json!({
        "lng": "en",
        "resources": {
            "en": { "translation": { "k": "a <5>kept <b>inner</b></5> z" } },
        },
    }))
    .unwrap();
    engine.init().unwrap();

    // Slot 0 exists but 5 does not; 5 unwraps, <b> degrades to literal.
    let props = TransProps::new()
        .engine(engine)
        .key("k")
        .slots(Slots::positional([Slot::Text("unused".to_string())]));

    let content = trans(&props);
    assert_eq!(content[0], Node::text("a "));
    assert_eq!(content[1], Node::text("kept "));
    assert_eq!(content[2], Node::text("<b>inner</b>"));
    assert_eq!(content[3], Node::text(" z"));
}

#[test]
fn numeric_tag_with_text_child_interpolates() {
    let engine = Engine::from_json(json!({
        "lng": "en",
        "resources": { "en": { "translation": { "k": "Hi <0>{{who}}</0>!" } } },
    }))
    .unwrap();
    engine.init().unwrap();

    let mut data = pgt::Values::new();
    data.insert("who".to_string(), json!("you"));
    let props = TransProps::new()
        .engine(engine)
        .key("k")
        .slots(Slots::positional([Slot::Values(data)]));

    let content = trans(&props);
    assert_eq!(
        content,
        vec![Node::text("Hi "), Node::text("you"), Node::text("!")]
    );
}

#[test]
fn string_slot_interpolates() {
    let engine = Engine::from_json(json!({
        "lng": "en",
        "resources": { "en": { "translation": { "k": "-<0>ignored</0>-" } } },
    }))
    .unwrap();
    engine.init().unwrap();

    let props = TransProps::new()
        .engine(engine)
        .key("k")
        .value("name", "Ada")
        .slots(Slots::positional([Slot::Text("{{name}}".to_string())]));

    let content = trans(&props);
    assert_eq!(
        content,
        vec![Node::text("-"), Node::text("Ada"), Node::text("-")]
    );
}

#[test]
fn component_slot_renders_through_registry() {
    let mut registry = ComponentRegistry::new();
    registry.register(
        "Link",
        Rc::new(|props, children| {
            let mut el = Element::new("a").attr("data-component", "Link");
            for (name, value) in props {
                el = el.attr(name.clone(), value.clone());
            }
            el.children = children;
            Node::Element(el)
        }),
    );

    let engine = Engine::from_json(json!({
        "lng": "en",
        "resources": { "en": { "translation": { "k": "Go <0>home</0>" } } },
    }))
    .unwrap();
    engine.init().unwrap();

    let props = TransProps::new()
        .engine(engine)
        .key("k")
        .registry(registry)
        .slots(Slots::positional([Slot::Component(
            ComponentSlot::new("Link").prop("href", "/home"),
        )]));

    let content = trans(&props);
    let link = element(&content[1]);
    assert_eq!(link.attr_value("data-component"), Some("Link"));
    assert_eq!(link.attr_value("href"), Some("/home"));
    assert_eq!(link.children, vec![Node::text("home")]);
}

#[test]
fn key_derived_from_children() {
    let engine = Engine::from_json(json!({
        "lng": "en",
        "resources": {
            "en": {
                "translation": {
                    "Click <1>here</1>": "Cliquez <1>ici</1>",
                },
            },
        },
    }))
    .unwrap();
    engine.init().unwrap();

    // No explicit key: children serialize to "Click <1>here</1>".
    let props = TransProps::new()
        .engine(engine)
        .child(Slot::Text("Click ".to_string()))
        .child(Slot::Element(Element::new("a").attr("href", "/x").text("here")));

    let content = trans(&props);
    assert_eq!(content[0], Node::text("Cliquez "));
    let anchor = element(&content[1]);
    assert_eq!(anchor.name, "a");
    assert_eq!(anchor.children, vec![Node::text("ici")]);
}

#[test]
fn children_serialization_shapes() {
    use pgt::nodes_to_string;

    // Keep tag without attributes stays verbatim.
    let keep = vec![
        Slot::Text("a".to_string()),
        Slot::Element(Element::new("strong").text("b")),
    ];
    assert_eq!(nodes_to_string(&keep), "a<strong>b</strong>");

    // Childless keep tag.
    let br = vec![Slot::Text("a".to_string()), Slot::Element(Element::new("br"))];
    assert_eq!(nodes_to_string(&br), "a<br />");

    // Non-keep element anonymizes positionally.
    let anon = vec![
        Slot::Text("x ".to_string()),
        Slot::Element(Element::new("a").attr("href", "/").text("y")),
    ];
    assert_eq!(nodes_to_string(&anon), "x <1>y</1>");

    // Value object with a single key becomes an interpolation token.
    let mut data = pgt::Values::new();
    data.insert("name".to_string(), json!("ignored"));
    assert_eq!(nodes_to_string(&[Slot::Values(data.clone())]), "{{name}}");

    data.insert("format".to_string(), json!("uppercase"));
    assert_eq!(nodes_to_string(&[Slot::Values(data)]), "{{name, uppercase}}");
}

#[test]
fn missing_key_falls_back_to_children_content() {
    // Derived key has no resource: the derived default (same string) is
    // translated back through the placeholder pipeline.
    let engine = Engine::from_json(json!({ "lng": "en" })).unwrap();
    engine.init().unwrap();

    let props = TransProps::new()
        .engine(engine)
        .child(Slot::Text("Press ".to_string()))
        .child(Slot::Element(Element::new("b").text("enter")));

    let content = trans(&props);
    assert_eq!(content[0], Node::text("Press "));
    let bold = element(&content[1]);
    assert_eq!(bold.name, "b");
    assert_eq!(bold.children, vec![Node::text("enter")]);
}

#[test]
fn create_trans_reacts_to_language_change() {
    let scope = Scope::new();
    scope.run(|| {
        let engine = fixture();
        let memo = create_trans(
            TransProps::new()
                .engine(engine.clone())
                .key("subscribe")
                .slots(Slots::positional([
                    Slot::Element(Element::new("a")),
                    Slot::Element(Element::new("b")),
                ])),
        );

        assert_eq!(memo.get()[0], Node::text("Click "));

        engine.change_language(Some("fr")).unwrap();
        assert_eq!(memo.get()[0], Node::text("Cliquez "));
    });
    scope.dispose();
}
