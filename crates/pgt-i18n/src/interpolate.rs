#![forbid(unsafe_code)]

//! Variable interpolation.
//!
//! Replaces `{{name}}` tokens (affixes configurable) with values from the
//! supplied maps. A token may carry a format tag: `{{price, currency}}`
//! passes the value and `"currency"` through the registered format
//! function.
//!
//! # Invariants
//!
//! 1. Text without tokens passes through unchanged.
//! 2. Substitution is single-pass: a replacement value containing token
//!    syntax is not re-expanded.
//! 3. A token with no matching variable is left intact (and logged), so a
//!    missing value is visible rather than silently erased.

use std::collections::BTreeMap;
use std::rc::Rc;

use serde_json::Value;

use crate::options::InterpolationOptions;

/// Custom value formatter: `(value, format, lng) -> text`.
pub type FormatFn = Rc<dyn Fn(&Value, &str, &str) -> String>;

/// The interpolation service.
#[derive(Clone)]
pub struct Interpolator {
    prefix: String,
    suffix: String,
    format: Option<FormatFn>,
}

impl Interpolator {
    #[must_use]
    pub fn new(options: &InterpolationOptions) -> Self {
        Self {
            prefix: options.prefix.clone(),
            suffix: options.suffix.clone(),
            format: None,
        }
    }

    /// Replace the format function.
    #[must_use]
    pub fn with_format(mut self, format: FormatFn) -> Self {
        self.format = Some(format);
        self
    }

    /// Interpolate `text` for language `lng`. `values` are the merged
    /// translation variables; `extra` wins over `values` on key clashes.
    pub fn interpolate(
        &self,
        text: &str,
        values: &BTreeMap<String, Value>,
        lng: &str,
        extra: &BTreeMap<String, Value>,
    ) -> String {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;

        while let Some(start) = rest.find(self.prefix.as_str()) {
            let after_prefix = &rest[start + self.prefix.len()..];
            let Some(end) = after_prefix.find(self.suffix.as_str()) else {
                // Unterminated token: emit the rest verbatim.
                break;
            };

            out.push_str(&rest[..start]);
            let token = &after_prefix[..end];
            rest = &after_prefix[end + self.suffix.len()..];

            let (name, format) = match token.split_once(',') {
                Some((name, format)) => (name.trim(), Some(format.trim())),
                None => (token.trim(), None),
            };

            let value = extra.get(name).or_else(|| values.get(name));
            match value {
                Some(v) => match (format, &self.format) {
                    (Some(fmt), Some(f)) => out.push_str(&f(v, fmt, lng)),
                    _ => out.push_str(&render_value(v)),
                },
                None => {
                    tracing::debug!(
                        target: "pgt.i18n",
                        variable = name,
                        "missing interpolation variable; token kept"
                    );
                    out.push_str(&self.prefix);
                    out.push_str(token);
                    out.push_str(&self.suffix);
                }
            }
        }

        out.push_str(rest);
        out
    }
}

impl std::fmt::Debug for Interpolator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interpolator")
            .field("prefix", &self.prefix)
            .field("suffix", &self.suffix)
            .field("has_format", &self.format.is_some())
            .finish()
    }
}

/// Render a JSON value as interpolated text.
fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
