#![forbid(unsafe_code)]

//! Rich-content translation: rebuild a translated string's placeholder
//! markup into a content tree with caller-supplied slots.
//!
//! # Design
//!
//! The translated value is parsed (wrapped in a synthetic `<0>` root) into
//! a placeholder tree, then walked in lock-step with a [`Slots`] mapping.
//! Tags look their slot up by parsed integer position first, then by
//! symbolic name. Unmatched tags degrade rather than fail: numeric ones
//! unwrap into their children, allow-listed inline tags (`br`, `strong`,
//! `i`, `p`) materialize as minimal elements, anything else becomes its
//! literal markup text. Every text segment runs through the engine's
//! interpolator, so slot-supplied values substitute late.
//!
//! Output order is strictly the parse tree's document order.

use std::collections::BTreeMap;
use std::rc::Rc;

use pgt_i18n::{Engine, TranslateOptions, global};
use pgt_markup::{Dom, Element, Node, Tag, is_void_element, parse};
use pgt_reactive::{Memo, create_memo, provide_context, use_context};
use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::context::use_translation_config;
use crate::reactive_engine::ReactiveEngine;

/// Interpolation data attached to a slot or passed as values.
pub type Values = BTreeMap<String, Value>;

/// Inline tags preserved/materialized without a slot.
const KEEP_TAGS: &[&str] = &["br", "strong", "i", "p"];

/// Custom translate function for [`TransProps::t`].
pub type TranslateFn = Rc<dyn Fn(&str, &TranslateOptions) -> String>;

/// Renders a named component: `(props, children) -> node`.
pub type ComponentFn = Rc<dyn Fn(&[(String, String)], Vec<Node>) -> Node>;

/// Dynamic-component registry: placeholder components resolve by name.
#[derive(Clone, Default)]
pub struct ComponentRegistry {
    map: FxHashMap<String, ComponentFn>,
}

impl ComponentRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, render: ComponentFn) {
        self.map.insert(name.into(), render);
    }

    #[must_use]
    pub fn render(
        &self,
        name: &str,
        props: &[(String, String)],
        children: Vec<Node>,
    ) -> Option<Node> {
        self.map.get(name).map(|render| render(props, children))
    }
}

impl std::fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentRegistry")
            .field("components", &self.map.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Provide a component registry to the current scope's subtree.
pub fn provide_components(registry: ComponentRegistry) {
    provide_context(registry);
}

/// What a placeholder tag becomes when rebuilt.
#[derive(Clone)]
pub enum Slot {
    /// Literal string, interpolated on use.
    Text(String),
    /// An externally-owned element. Its own children fill a childless
    /// placeholder; its own nested children also serve as the positional
    /// slots for the placeholder's children.
    Element(Element),
    /// A dynamic component reference with its own props and nested slots.
    Component(ComponentSlot),
    /// Interpolation data (legacy object-placeholder form).
    Values(Values),
}

impl From<Element> for Slot {
    fn from(el: Element) -> Self {
        Self::Element(el)
    }
}

impl From<&str> for Slot {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

/// A dynamic component slot.
#[derive(Clone)]
pub struct ComponentSlot {
    pub name: String,
    pub props: Vec<(String, String)>,
    pub slots: Slots,
}

impl ComponentSlot {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            props: Vec::new(),
            slots: Slots::new(),
        }
    }

    #[must_use]
    pub fn prop(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.props.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn slots(mut self, slots: Slots) -> Self {
        self.slots = slots;
        self
    }
}

/// Placeholder-key → slot mapping, by position and by name.
#[derive(Clone, Default)]
pub struct Slots {
    by_index: FxHashMap<usize, Slot>,
    by_name: FxHashMap<String, Slot>,
}

impl Slots {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Positional slots from an ordered list.
    #[must_use]
    pub fn positional(slots: impl IntoIterator<Item = Slot>) -> Self {
        let mut out = Self::default();
        for (index, slot) in slots.into_iter().enumerate() {
            out.by_index.insert(index, slot);
        }
        out
    }

    /// Positional slots from an element's own children.
    fn from_nodes(nodes: &[Node]) -> Self {
        Self::positional(nodes.iter().map(|node| match node {
            Node::Text(text) => Slot::Text(text.clone()),
            Node::Element(el) => Slot::Element(el.clone()),
        }))
    }

    #[must_use]
    pub fn at(mut self, index: usize, slot: impl Into<Slot>) -> Self {
        self.by_index.insert(index, slot.into());
        self
    }

    #[must_use]
    pub fn named(mut self, name: impl Into<String>, slot: impl Into<Slot>) -> Self {
        self.by_name.insert(name.into(), slot.into());
        self
    }

    /// Lookup: parsed integer position first, then symbolic name.
    #[must_use]
    pub fn lookup(&self, tag_name: &str) -> Option<&Slot> {
        if let Ok(index) = tag_name.parse::<usize>()
            && let Some(slot) = self.by_index.get(&index)
        {
            return Some(slot);
        }
        self.by_name.get(tag_name)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_index.is_empty() && self.by_name.is_empty()
    }

    /// Interpolation data carried by `Values` slots, merged in key order.
    fn values_data(&self) -> Values {
        let mut data = Values::new();
        for slot in self.by_index.values().chain(self.by_name.values()) {
            if let Slot::Values(map) = slot {
                data.extend(map.clone());
            }
        }
        data
    }
}

impl std::fmt::Debug for Slots {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Slots")
            .field("positional", &self.by_index.len())
            .field("named", &self.by_name.len())
            .finish()
    }
}

/// Props for the rich-content translator.
#[derive(Clone, Default)]
pub struct TransProps {
    /// Translation key. Derived from `children` when absent.
    pub key: Option<String>,
    pub count: Option<i64>,
    pub context: Option<String>,
    /// Interpolation values.
    pub values: Values,
    pub ns: Option<Vec<String>>,
    pub default_value: Option<String>,
    /// Explicit per-call options (lowest merge priority).
    pub options: TranslateOptions,
    /// Placeholder slots. When absent, `children` serve positionally.
    pub slots: Option<Slots>,
    /// Literal child content; also the source of a derived key/default.
    pub children: Vec<Slot>,
    pub registry: Option<ComponentRegistry>,
    /// Custom translate function (wins over the engine).
    pub t: Option<TranslateFn>,
    pub engine: Option<Engine>,
}

impl TransProps {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    #[must_use]
    pub fn count(mut self, count: i64) -> Self {
        self.count = Some(count);
        self
    }

    #[must_use]
    pub fn context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    #[must_use]
    pub fn value(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn ns(mut self, ns: impl Into<String>) -> Self {
        self.ns = Some(vec![ns.into()]);
        self
    }

    #[must_use]
    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    #[must_use]
    pub fn slots(mut self, slots: Slots) -> Self {
        self.slots = Some(slots);
        self
    }

    #[must_use]
    pub fn child(mut self, slot: impl Into<Slot>) -> Self {
        self.children.push(slot.into());
        self
    }

    #[must_use]
    pub fn registry(mut self, registry: ComponentRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    #[must_use]
    pub fn translate_fn(mut self, t: TranslateFn) -> Self {
        self.t = Some(t);
        self
    }

    #[must_use]
    pub fn engine(mut self, engine: Engine) -> Self {
        self.engine = Some(engine);
        self
    }
}

/// Serialize children to their string form: positional anonymized tags,
/// keep-list tags verbatim when plain, `{{name}}` for value objects.
#[must_use]
pub fn nodes_to_string(children: &[Slot]) -> String {
    let mut out = String::new();
    for (index, slot) in children.iter().enumerate() {
        match slot {
            Slot::Text(text) => out.push_str(text),
            Slot::Element(el) => out.push_str(&element_to_string(el, index)),
            Slot::Component(_) => {
                out.push_str(&format!("<{index}></{index}>"));
            }
            Slot::Values(map) => {
                let format = map.get("format").and_then(Value::as_str);
                let mut keys = map.keys().filter(|k| k.as_str() != "format");
                if let (Some(key), None) = (keys.next(), keys.next()) {
                    match format {
                        Some(format) => out.push_str(&format!("{{{{{key}, {format}}}}}")),
                        None => out.push_str(&format!("{{{{{key}}}}}")),
                    }
                }
            }
        }
    }
    out
}

fn element_to_string(el: &Element, position: usize) -> String {
    let keep = KEEP_TAGS.contains(&el.name.as_str()) && el.attrs.is_empty();
    if el.children.is_empty() {
        if keep {
            return format!("<{} />", el.name);
        }
        return format!("<{position}></{position}>");
    }
    if keep && let [Node::Text(text)] = el.children.as_slice() {
        return format!("<{0}>{text}</{0}>", el.name);
    }
    let content = node_children_to_string(&el.children);
    format!("<{position}>{content}</{position}>")
}

fn node_children_to_string(nodes: &[Node]) -> String {
    let mut out = String::new();
    for (index, node) in nodes.iter().enumerate() {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => out.push_str(&element_to_string(el, index)),
        }
    }
    out
}

/// Translate and rebuild. Pure: given fixed props and engine state,
/// returns the content tree once. See [`create_trans`] for the reactive
/// wrapper.
#[must_use]
pub fn trans(props: &TransProps) -> Vec<Node> {
    let config = use_translation_config();
    let engine = props
        .engine
        .clone()
        .or_else(|| config.as_ref().map(|c| c.engine.clone()))
        .unwrap_or_else(global);
    let registry = props
        .registry
        .clone()
        .or_else(use_context::<ComponentRegistry>)
        .unwrap_or_default();

    // Key and default derivation from children when absent.
    let children_string = nodes_to_string(&props.children);
    let children_string = (!children_string.is_empty()).then_some(children_string);
    let default_value = props
        .default_value
        .clone()
        .or_else(|| children_string.clone())
        .or_else(|| props.key.clone());
    let key = props
        .key
        .clone()
        .or_else(|| children_string.clone())
        .or_else(|| default_value.clone());

    // Namespace order: prop → context → engine default → "translation".
    let namespaces = props
        .ns
        .clone()
        .or_else(|| config.and_then(|c| c.ns))
        .unwrap_or_else(|| {
            let default_ns = engine.options().default_ns;
            if default_ns.is_empty() {
                vec!["translation".to_string()]
            } else {
                vec![default_ns]
            }
        });

    // Caller values shallow-merged with engine default variables (the
    // defaults win, matching the component's historical merge direction).
    let values = {
        let defaults = engine.options().interpolation.default_variables;
        let mut merged = props.values.clone();
        merged.extend(defaults);
        merged
    };

    // Option merge, later overrides earlier: explicit options → context/
    // count → values → default value and namespaces.
    let t_opts = {
        let mut opts = props.options.clone();
        if props.context.is_some() {
            opts.context = props.context.clone();
        }
        if props.count.is_some() {
            opts.count = props.count;
        }
        opts.values.extend(values);
        opts.default_value = default_value.clone();
        opts.ns = Some(namespaces);
        opts
    };

    let translation = match &key {
        Some(key) => match &props.t {
            Some(t) => t(key, &t_opts),
            None => engine.t_with(key, &t_opts),
        },
        None => default_value.clone().unwrap_or_default(),
    };

    // Empty translation renders nothing.
    if translation.is_empty() {
        return Vec::new();
    }

    let slots = props
        .slots
        .clone()
        .unwrap_or_else(|| Slots::positional(props.children.iter().cloned()));

    // Plain-string fast path: no slots and none of the keep-list tags.
    let needs_tree = KEEP_TAGS
        .iter()
        .any(|tag| translation.contains(&format!("<{tag}")));
    if slots.is_empty() && !needs_tree {
        return vec![Node::text(translation)];
    }

    // Interpolation data for the rebuild: Values-slot data, overridden by
    // the translate options' own values.
    let build_values = {
        let mut merged = slots.values_data();
        merged.extend(t_opts.values.clone());
        merged
    };

    let dom = parse(&format!("<0>{translation}</0>"));
    let Some(Dom::Tag(root)) = dom.first() else {
        return vec![Node::text(translation)];
    };

    let builder = Builder {
        engine: &engine,
        registry: &registry,
        values: build_values,
    };
    builder.build(&slots, &root.children)
}

struct Builder<'a> {
    engine: &'a Engine,
    registry: &'a ComponentRegistry,
    values: Values,
}

impl Builder<'_> {
    fn interpolate(&self, text: &str) -> String {
        let lng = self
            .engine
            .resolved_language()
            .or_else(|| self.engine.language())
            .unwrap_or_default();
        self.engine
            .interpolator()
            .interpolate(text, &self.values, &lng, &BTreeMap::new())
    }

    fn interpolate_with(&self, text: &str, extra: &Values) -> String {
        let lng = self
            .engine
            .resolved_language()
            .or_else(|| self.engine.language())
            .unwrap_or_default();
        self.engine
            .interpolator()
            .interpolate(text, &self.values, &lng, extra)
    }

    /// Rebuild one level of the parse tree against a slot mapping.
    fn build(&self, slots: &Slots, dom: &[Dom]) -> Vec<Node> {
        let mut out = Vec::new();
        for node in dom {
            match node {
                Dom::Text(text) => out.push(Node::text(self.interpolate(text))),
                Dom::Tag(tag) => self.build_tag(slots, tag, &mut out),
            }
        }
        out
    }

    fn build_tag(&self, slots: &Slots, tag: &Tag, out: &mut Vec<Node>) {
        match slots.lookup(&tag.name) {
            Some(Slot::Text(text)) => {
                out.push(Node::text(self.interpolate(text)));
            }
            Some(Slot::Element(el)) => {
                // The element's own children are the nested slots for the
                // placeholder's children.
                let nested = Slots::from_nodes(&el.children);
                let rebuilt = self.build(&nested, &tag.children);
                let mut element = el.clone();
                if rebuilt.is_empty() && !el.children.is_empty() {
                    // Childless placeholder: keep the element's own content.
                } else {
                    element.children = rebuilt;
                }
                // Parsed attributes merge in; the slot's own win.
                element.merge_attrs(&tag.attrs);
                out.push(Node::Element(element));
            }
            Some(Slot::Component(component)) => {
                let children = self.build(&component.slots, &tag.children);
                let mut props = component.props.clone();
                for (name, value) in &tag.attrs {
                    if !props.iter().any(|(n, _)| n == name) {
                        props.push((name.clone(), value.clone()));
                    }
                }
                let rendered = self
                    .registry
                    .render(&component.name, &props, children.clone())
                    .unwrap_or_else(|| {
                        // No renderer registered: a minimal element stands in.
                        let mut el = Element::new(&component.name);
                        el.attrs = props.clone();
                        el.children = children;
                        Node::Element(el)
                    });
                out.push(rendered);
            }
            Some(Slot::Values(data)) => {
                // Legacy object placeholder: the tag's text child is
                // interpolated with the slot's data.
                let content = tag.single_text_child().unwrap_or("");
                let text = self.interpolate_with(content, data);
                if !text.is_empty() {
                    out.push(Node::text(text));
                }
            }
            None => self.build_unmatched(tag, out),
        }
    }

    fn build_unmatched(&self, tag: &Tag, out: &mut Vec<Node>) {
        if tag.is_numeric() {
            // Inert positional placeholder: unwrap into its children. A
            // lone text child is inline interpolation content (narrow
            // legacy carve-out; not extended to symbolic tags).
            if let Some(text) = tag.single_text_child() {
                let interpolated = self.interpolate(text);
                if !interpolated.is_empty() {
                    out.push(Node::text(interpolated));
                }
            } else {
                out.extend(self.build(&Slots::default(), &tag.children));
            }
            return;
        }

        if KEEP_TAGS.contains(&tag.name.as_str()) {
            // Materialize a minimal element of the allow-listed tag.
            let mut element = Element::new(&tag.name);
            if tag.void || is_void_element(&tag.name) {
                element.void = true;
            } else {
                element.children = self.build(&Slots::default(), &tag.children);
            }
            out.push(Node::Element(element));
            return;
        }

        if tag.void {
            // Unmatched void tag: an empty paired-tag literal.
            out.push(Node::text(format!("<{0}></{0}>", tag.name)));
            return;
        }

        // Unknown symbolic tag: degrade to literal markup, children
        // serialized to their markup representation.
        let inner: String = self
            .build(&Slots::default(), &tag.children)
            .iter()
            .map(|node| match node {
                Node::Text(text) => text.clone(),
                Node::Element(el) => el.to_markup(),
            })
            .collect();
        out.push(Node::text(format!("<{0}>{inner}</{0}>", tag.name)));
    }
}

/// Reactive rich-content translation: a memo of the rebuilt tree that
/// re-evaluates when any translation-affecting engine state changes.
///
/// Context (engine, default namespaces, component registry) is resolved
/// now, in the calling scope; re-evaluations reuse it.
#[must_use]
pub fn create_trans(props: TransProps) -> Memo<Vec<Node>> {
    let config = use_translation_config();
    let engine = props
        .engine
        .clone()
        .or_else(|| config.as_ref().map(|c| c.engine.clone()))
        .unwrap_or_else(global);
    let registry = props
        .registry
        .clone()
        .or_else(use_context::<ComponentRegistry>)
        .unwrap_or_default();

    let mut resolved = props;
    resolved.engine = Some(engine.clone());
    resolved.registry = Some(registry);
    if resolved.ns.is_none() {
        resolved.ns = config.and_then(|c| c.ns);
    }

    let facade = ReactiveEngine::wrap(&engine);
    create_memo(move || {
        facade.track();
        trans(&resolved)
    })
}
