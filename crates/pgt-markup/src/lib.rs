#![forbid(unsafe_code)]

//! Placeholder markup for Polyglot translations.
//!
//! Translated strings may carry a miniature markup dialect: numeric tags
//! (`<0>…</0>`) standing in for caller-supplied content, and symbolic
//! tags (`<strong>`, `<br/>`) for plain inline elements. This crate
//! parses that dialect into a placeholder tree, models the content tree a
//! rich translator rebuilds, and serializes content back to markup text.
//!
//! # Role in Polyglot
//! Pure data and parsing; no reactivity, no engine. The parser is
//! best-effort by contract: malformed input degrades to literal text and
//! never raises.

pub mod content;
pub mod dom;
pub mod escape;
pub mod parse;

pub use content::{Element, Node, to_markup};
pub use dom::{Dom, Tag};
pub use escape::escape;
pub use parse::{is_void_element, parse};
