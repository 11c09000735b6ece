#![forbid(unsafe_code)]

//! Best-effort parser for the markup subset that appears in translations.
//!
//! # Design
//!
//! A single forward scan with an explicit open-tag stack. The grammar is
//! deliberately small: open/close/self-closing tags, single- or
//! double-quoted and unquoted attribute values, text. Everything else is
//! recovered from, never rejected:
//!
//! - a `<` that does not start a well-formed tag is literal text;
//! - a closing tag with no matching opener is dropped;
//! - a closing tag matching a non-top opener auto-closes the tags above it;
//! - unclosed tags at end of input are auto-closed.
//!
//! Malformed input therefore always yields *some* tree, and the worst
//! case for the caller is literal text — the parser never panics and
//! never returns an error.

use smallvec::SmallVec;

use crate::dom::{Dom, Tag};

/// Elements that never take children.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// True for tag names that never take children.
#[must_use]
pub fn is_void_element(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

/// Parse markup into a placeholder tree.
#[must_use]
pub fn parse(input: &str) -> Vec<Dom> {
    Parser::new(input).run()
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
    root: Vec<Dom>,
    stack: SmallVec<[Tag; 8]>,
    text_start: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            root: Vec::new(),
            stack: SmallVec::new(),
            text_start: 0,
        }
    }

    fn run(mut self) -> Vec<Dom> {
        while let Some(open) = self.input[self.pos..].find('<') {
            let open = self.pos + open;
            match self.try_tag(open) {
                Some(next) => {
                    self.pos = next;
                    self.text_start = next;
                }
                None => {
                    // Literal '<': keep scanning past it.
                    self.pos = open + 1;
                }
            }
        }
        self.flush_text(self.input.len());

        if !self.stack.is_empty() {
            tracing::debug!(
                target: "pgt.markup",
                unclosed = self.stack.len(),
                "auto-closing unclosed tags"
            );
        }
        while let Some(tag) = self.stack.pop() {
            self.push_node(Dom::Tag(tag));
        }
        self.root
    }

    /// Attempt to read a tag starting at `open` (the `<`). Returns the
    /// position just past the tag, or `None` when this is not a tag.
    fn try_tag(&mut self, open: usize) -> Option<usize> {
        let rest = &self.input[open + 1..];
        if let Some(rest) = rest.strip_prefix('/') {
            return self.try_close(open, rest);
        }

        let name_len = tag_name_len(rest);
        if name_len == 0 {
            return None;
        }
        let name = &rest[..name_len];

        let mut tag = Tag::new(name);
        let mut cursor = open + 1 + name_len;
        let end;
        loop {
            cursor = skip_whitespace(self.input, cursor);
            match self.input[cursor..].chars().next() {
                None => return None, // Unterminated tag: literal text.
                Some('>') => {
                    end = cursor + 1;
                    break;
                }
                Some('/') if self.input[cursor + 1..].starts_with('>') => {
                    tag.void = true;
                    end = cursor + 2;
                    break;
                }
                Some(_) => {
                    let Some(next) = read_attr(self.input, cursor, &mut tag) else {
                        return None;
                    };
                    cursor = next;
                }
            }
        }

        self.flush_text(open);
        if tag.void || is_void_element(&tag.name) {
            tag.void = true;
            self.push_node(Dom::Tag(tag));
        } else {
            self.stack.push(tag);
        }
        Some(end)
    }

    /// Attempt to read a closing tag; `rest` starts after `</`.
    fn try_close(&mut self, open: usize, rest: &str) -> Option<usize> {
        let name_len = tag_name_len(rest);
        if name_len == 0 {
            return None;
        }
        let name = rest[..name_len].to_string();
        let after = skip_whitespace(self.input, open + 2 + name_len);
        if !self.input[after..].starts_with('>') {
            return None;
        }
        let end = after + 1;

        self.flush_text(open);
        match self.stack.iter().rposition(|t| t.name == name) {
            Some(index) => {
                // Auto-close anything opened above the match.
                while self.stack.len() > index + 1 {
                    let tag = self.stack.pop().expect("len checked");
                    self.push_node(Dom::Tag(tag));
                }
                let tag = self.stack.pop().expect("index exists");
                self.push_node(Dom::Tag(tag));
            }
            None => {
                tracing::debug!(target: "pgt.markup", tag = %name, "stray closing tag dropped");
            }
        }
        Some(end)
    }

    fn flush_text(&mut self, until: usize) {
        if until > self.text_start {
            let text = self.input[self.text_start..until].to_string();
            self.push_node(Dom::Text(text));
        }
        self.text_start = until;
    }

    fn push_node(&mut self, node: Dom) {
        match self.stack.last_mut() {
            Some(parent) => parent.children.push(node),
            None => self.root.push(node),
        }
    }
}

fn tag_name_len(rest: &str) -> usize {
    rest.chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .map(char::len_utf8)
        .sum()
}

fn skip_whitespace(input: &str, mut pos: usize) -> usize {
    while input[pos..].starts_with(|c: char| c.is_ascii_whitespace()) {
        pos += 1;
    }
    pos
}

/// Read one attribute at `pos`; returns the position after it, or `None`
/// when the tag turns out malformed.
fn read_attr(input: &str, pos: usize, tag: &mut Tag) -> Option<usize> {
    let rest = &input[pos..];
    let name_len = rest
        .chars()
        .take_while(|c| !c.is_ascii_whitespace() && !matches!(c, '=' | '>' | '/'))
        .map(char::len_utf8)
        .sum::<usize>();
    if name_len == 0 {
        return None;
    }
    let name = rest[..name_len].to_string();
    let mut cursor = skip_whitespace(input, pos + name_len);

    if !input[cursor..].starts_with('=') {
        // Bare attribute.
        tag.attrs.push((name, String::new()));
        return Some(cursor);
    }
    cursor = skip_whitespace(input, cursor + 1);

    match input[cursor..].chars().next() {
        Some(quote @ ('"' | '\'')) => {
            let value_start = cursor + 1;
            let close = input[value_start..].find(quote)?;
            let value = input[value_start..value_start + close].to_string();
            tag.attrs.push((name, value));
            Some(value_start + close + 1)
        }
        Some(_) => {
            let value_len = input[cursor..]
                .chars()
                .take_while(|c| !c.is_ascii_whitespace() && !matches!(c, '>' | '/'))
                .map(char::len_utf8)
                .sum::<usize>();
            let value = input[cursor..cursor + value_len].to_string();
            tag.attrs.push((name, value));
            Some(cursor + value_len)
        }
        None => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
