#![forbid(unsafe_code)]

//! Key resolution and translation.
//!
//! # Design
//!
//! Lookup walks three axes in priority order:
//!
//! 1. **Namespace** — a `ns:` prefix in the key wins, then the explicit
//!    `ns` option, then the engine's default namespace.
//! 2. **Key candidates** — context and plural suffixes, most specific
//!    first: `key_ctx_one`, `key_ctx`, `key_one`, `key`.
//! 3. **Language chain** — the requested (or current) language, then the
//!    configured fallbacks, in order.
//!
//! A miss never fails: the default value (if given) or the key itself is
//! returned, so a broken resource set degrades to visible keys instead of
//! crashing the render path.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::engine::Engine;
use crate::plural::PluralRule;

/// Per-call translation options.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TranslateOptions {
    /// Language override for this call.
    pub lng: Option<String>,
    /// Namespace candidates, in order.
    pub ns: Option<Vec<String>>,
    /// Prefix joined to the key with the key separator.
    pub key_prefix: Option<String>,
    /// Plural count. Also exposed to interpolation as `count`.
    pub count: Option<i64>,
    /// Context suffix (`friend` -> `key_friend`).
    pub context: Option<String>,
    /// Returned (interpolated) when every lookup misses.
    pub default_value: Option<String>,
    /// Interpolation variables.
    pub values: BTreeMap<String, Value>,
}

impl TranslateOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn lng(mut self, lng: impl Into<String>) -> Self {
        self.lng = Some(lng.into());
        self
    }

    #[must_use]
    pub fn ns(mut self, ns: impl Into<String>) -> Self {
        self.ns = Some(vec![ns.into()]);
        self
    }

    #[must_use]
    pub fn namespaces(mut self, ns: impl IntoIterator<Item = String>) -> Self {
        self.ns = Some(ns.into_iter().collect());
        self
    }

    #[must_use]
    pub fn key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
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
    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    #[must_use]
    pub fn value(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }
}

/// Outcome of a lookup before interpolation.
pub(crate) struct Resolution {
    /// Raw resolved string and the language it was found in.
    pub found: Option<(String, String)>,
    /// Key with any `ns:` prefix stripped; the miss fallback.
    pub bare_key: String,
}

/// Resolve a key against the store without interpolating.
pub(crate) fn resolve(engine: &Engine, key: &str, opts: &TranslateOptions) -> Resolution {
    let options = engine.options();

    // Namespace from the key wins over the ns option.
    let (namespaces, bare_key) = match split_ns(key, &options.ns_separator) {
        Some((ns, rest)) => (vec![ns.to_string()], rest.to_string()),
        None => {
            let namespaces = opts
                .ns
                .clone()
                .filter(|ns| !ns.is_empty())
                .unwrap_or_else(|| vec![options.default_ns.clone()]);
            (namespaces, key.to_string())
        }
    };

    let full_key = match &opts.key_prefix {
        Some(prefix) if !prefix.is_empty() => {
            format!("{prefix}{}{bare_key}", options.key_separator)
        }
        _ => bare_key.clone(),
    };

    let languages = language_chain(engine, opts);

    for lng in &languages {
        let candidates = key_candidates(&full_key, lng, opts, &options);
        for ns in &namespaces {
            for candidate in &candidates {
                if let Some(Value::String(text)) =
                    engine
                        .store()
                        .get_resource(lng, ns, candidate, &options.key_separator)
                {
                    return Resolution {
                        found: Some((text, lng.clone())),
                        bare_key,
                    };
                }
            }
        }
    }

    Resolution {
        found: None,
        bare_key,
    }
}

/// Translate a key: resolve, then interpolate; misses fall back to the
/// default value or the key.
pub(crate) fn translate(engine: &Engine, key: &str, opts: &TranslateOptions) -> String {
    let resolution = resolve(engine, key, opts);
    let values = merged_values(engine, opts);

    match resolution.found {
        Some((text, lng)) => {
            engine
                .interpolator()
                .interpolate(&text, &values, &lng, &BTreeMap::new())
        }
        None => {
            tracing::debug!(target: "pgt.i18n", key = %resolution.bare_key, "missing translation");
            match &opts.default_value {
                Some(default) => {
                    let lng = language_chain(engine, opts)
                        .into_iter()
                        .next()
                        .unwrap_or_default();
                    engine
                        .interpolator()
                        .interpolate(default, &values, &lng, &BTreeMap::new())
                }
                None => resolution.bare_key,
            }
        }
    }
}

/// True when a key resolves without falling back.
pub(crate) fn exists(engine: &Engine, key: &str, opts: &TranslateOptions) -> bool {
    resolve(engine, key, opts).found.is_some()
}

/// Interpolation variables for one call: engine defaults, then caller
/// values, then the plural count.
pub(crate) fn merged_values(engine: &Engine, opts: &TranslateOptions) -> BTreeMap<String, Value> {
    let mut values = engine.options().interpolation.default_variables.clone();
    for (k, v) in &opts.values {
        values.insert(k.clone(), v.clone());
    }
    if let Some(count) = opts.count {
        values.insert("count".to_string(), Value::from(count));
    }
    values
}

fn split_ns<'a>(key: &'a str, ns_separator: &str) -> Option<(&'a str, &'a str)> {
    if ns_separator.is_empty() {
        return None;
    }
    key.split_once(ns_separator)
}

/// Candidate keys, most specific first.
fn key_candidates(
    key: &str,
    lng: &str,
    opts: &TranslateOptions,
    options: &crate::options::EngineOptions,
) -> Vec<String> {
    let context = opts.context.as_deref().filter(|c| !c.is_empty());
    let plural = opts
        .count
        .map(|count| PluralRule::for_locale(lng).categorize(count).suffix());

    let mut candidates = Vec::with_capacity(4);
    if let (Some(ctx), Some(suffix)) = (context, plural) {
        candidates.push(format!(
            "{key}{}{ctx}{}{suffix}",
            options.context_separator, options.plural_separator
        ));
    }
    if let Some(ctx) = context {
        candidates.push(format!("{key}{}{ctx}", options.context_separator));
    }
    if let Some(suffix) = plural {
        candidates.push(format!("{key}{}{suffix}", options.plural_separator));
    }
    candidates.push(key.to_string());
    candidates
}

/// Requested language plus fallbacks, deduplicated, order-preserving.
pub(crate) fn language_chain(engine: &Engine, opts: &TranslateOptions) -> Vec<String> {
    let primary = opts
        .lng
        .clone()
        .or_else(|| engine.language())
        .or_else(|| engine.resolved_language());

    let mut chain = Vec::new();
    if let Some(lng) = primary {
        if let Some(base) = lng.split(['-', '_']).next()
            && base != lng
        {
            chain.push(lng.clone());
            chain.push(base.to_string());
        } else {
            chain.push(lng);
        }
    }
    for fallback in engine.options().fallback_lng {
        if !chain.contains(&fallback) {
            chain.push(fallback);
        }
    }
    chain
}

/// A translator bound to a language, namespace list, and key prefix.
#[derive(Clone)]
pub struct FixedT {
    engine: Engine,
    lng: Option<String>,
    ns: Option<Vec<String>>,
    key_prefix: Option<String>,
}

impl FixedT {
    #[must_use]
    pub fn new(
        engine: Engine,
        lng: Option<String>,
        ns: Option<Vec<String>>,
        key_prefix: Option<String>,
    ) -> Self {
        Self {
            engine,
            lng,
            ns,
            key_prefix,
        }
    }

    /// Translate with the bound defaults.
    #[must_use]
    pub fn t(&self, key: &str) -> String {
        self.t_with(key, &TranslateOptions::default())
    }

    /// Translate with per-call options; unset fields fall back to the
    /// bound defaults.
    #[must_use]
    pub fn t_with(&self, key: &str, opts: &TranslateOptions) -> String {
        let mut merged = opts.clone();
        if merged.lng.is_none() {
            merged.lng = self.lng.clone();
        }
        if merged.ns.is_none() {
            merged.ns = self.ns.clone();
        }
        if merged.key_prefix.is_none() {
            merged.key_prefix = self.key_prefix.clone();
        }
        self.engine.t_with(key, &merged)
    }

    #[must_use]
    pub fn language(&self) -> Option<&str> {
        self.lng.as_deref()
    }

    #[must_use]
    pub fn namespaces(&self) -> Option<&[String]> {
        self.ns.as_deref()
    }

    #[must_use]
    pub fn key_prefix(&self) -> Option<&str> {
        self.key_prefix.as_deref()
    }
}

impl PartialEq for FixedT {
    fn eq(&self, other: &Self) -> bool {
        self.engine.ptr_eq(&other.engine)
            && self.lng == other.lng
            && self.ns == other.ns
            && self.key_prefix == other.key_prefix
    }
}

impl std::fmt::Debug for FixedT {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FixedT")
            .field("lng", &self.lng)
            .field("ns", &self.ns)
            .field("key_prefix", &self.key_prefix)
            .finish()
    }
}
