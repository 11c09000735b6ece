#![forbid(unsafe_code)]

//! Content trees: what the rich-content translator emits.
//!
//! A [`Node`] is the rendered counterpart of a parsed placeholder: text or
//! an element with attributes and children. The tree is plain data so any
//! renderer can walk it; [`Node::to_markup`] serializes back to markup
//! text, which the translator uses when an unrecognized tag degrades to
//! its literal form.

use crate::escape::escape;

/// One node of a rebuilt content tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    Text(String),
    Element(Element),
}

impl Node {
    #[must_use]
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text(content.into())
    }

    /// The element, when this node is one.
    #[must_use]
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Self::Element(el) => Some(el),
            Self::Text(_) => None,
        }
    }

    /// Concatenated text content of the subtree.
    #[must_use]
    pub fn text_content(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Element(el) => el
                .children
                .iter()
                .map(Node::text_content)
                .collect::<Vec<_>>()
                .concat(),
        }
    }

    /// Serialize to markup text. Text is escaped; void elements render
    /// self-closed.
    #[must_use]
    pub fn to_markup(&self) -> String {
        match self {
            Self::Text(text) => escape(text),
            Self::Element(el) => el.to_markup(),
        }
    }
}

impl From<Element> for Node {
    fn from(el: Element) -> Self {
        Self::Element(el)
    }
}

impl From<&str> for Node {
    fn from(text: &str) -> Self {
        Self::text(text)
    }
}

/// An element node: name, attributes in insertion order, children.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
    pub void: bool,
}

impl Element {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
            children: Vec::new(),
            void: false,
        }
    }

    /// A childless, self-closing element.
    #[must_use]
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
            children: Vec::new(),
            void: true,
        }
    }

    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn child(mut self, node: impl Into<Node>) -> Self {
        self.children.push(node.into());
        self
    }

    #[must_use]
    pub fn text(self, content: impl Into<String>) -> Self {
        self.child(Node::text(content))
    }

    /// Attribute value by name (first match).
    #[must_use]
    pub fn attr_value(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Merge attributes that are not already present. Existing values win.
    pub fn merge_attrs(&mut self, attrs: &[(String, String)]) {
        for (name, value) in attrs {
            if self.attr_value(name).is_none() {
                self.attrs.push((name.clone(), value.clone()));
            }
        }
    }

    #[must_use]
    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        out.push('<');
        out.push_str(&self.name);
        for (name, value) in &self.attrs {
            out.push(' ');
            out.push_str(name);
            if !value.is_empty() {
                out.push_str("=\"");
                out.push_str(&escape(value));
                out.push('"');
            } else {
                out.push_str("=\"\"");
            }
        }
        if self.void && self.children.is_empty() {
            out.push_str("/>");
            return out;
        }
        out.push('>');
        for child in &self.children {
            out.push_str(&child.to_markup());
        }
        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
        out
    }
}

/// Serialize a node list to markup text.
#[must_use]
pub fn to_markup(nodes: &[Node]) -> String {
    nodes.iter().map(Node::to_markup).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
