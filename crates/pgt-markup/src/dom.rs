#![forbid(unsafe_code)]

//! Placeholder tree: the parsed shape of a translated string.
//!
//! Tag names come in two kinds: numeric names (`"0"`, `"1"`) are
//! positional placeholders standing in for caller-supplied content;
//! symbolic names (`"strong"`, `"a"`) are named placeholders or plain
//! markup. The tree is immutable once parsed and rebuilt on every
//! translation change.

/// One node of the parsed placeholder tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Dom {
    /// Literal text between tags.
    Text(String),
    /// A tag with attributes and children.
    Tag(Tag),
}

impl Dom {
    #[must_use]
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text(content.into())
    }

    /// The tag, when this node is one.
    #[must_use]
    pub fn as_tag(&self) -> Option<&Tag> {
        match self {
            Self::Tag(tag) => Some(tag),
            Self::Text(_) => None,
        }
    }
}

/// A parsed tag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tag {
    pub name: String,
    /// Attributes in source order.
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Dom>,
    /// Self-closing or a known void element.
    pub void: bool,
}

impl Tag {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
            children: Vec::new(),
            void: false,
        }
    }

    /// Positional index when the name is numeric.
    #[must_use]
    pub fn index(&self) -> Option<usize> {
        self.name.parse().ok()
    }

    /// True for positional placeholder names ("0", "1", ...).
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        self.index().is_some()
    }

    /// The single text child, when the tag wraps exactly one text node.
    #[must_use]
    pub fn single_text_child(&self) -> Option<&str> {
        match self.children.as_slice() {
            [Dom::Text(text)] => Some(text),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_names_index() {
        assert_eq!(Tag::new("0").index(), Some(0));
        assert_eq!(Tag::new("17").index(), Some(17));
        assert_eq!(Tag::new("strong").index(), None);
        assert!(Tag::new("3").is_numeric());
        assert!(!Tag::new("a").is_numeric());
    }

    #[test]
    fn single_text_child_detection() {
        let mut tag = Tag::new("x");
        assert_eq!(tag.single_text_child(), None);

        tag.children.push(Dom::text("only"));
        assert_eq!(tag.single_text_child(), Some("only"));

        tag.children.push(Dom::Tag(Tag::new("y")));
        assert_eq!(tag.single_text_child(), None);
    }
}
