#![forbid(unsafe_code)]

//! Engine configuration.
//!
//! Options deserialize from JSON so configuration files and inline
//! `serde_json::json!` fixtures share one shape. Separators default to the
//! conventional `"."` / `":"` / `"_"` family; every field has a default so
//! partial option objects work.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

/// Engine options.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineOptions {
    /// Inline resources: `{ language: { namespace: { key: value } } }`.
    pub resources: Value,
    /// Initial language.
    pub lng: Option<String>,
    /// Ordered fallback languages. Accepts a single string or a list.
    #[serde(deserialize_with = "string_or_list")]
    pub fallback_lng: Vec<String>,
    /// Default namespace for unqualified keys.
    #[serde(alias = "defaultNS")]
    pub default_ns: String,
    /// Known namespaces. Grows when loads register new ones.
    #[serde(deserialize_with = "string_or_list")]
    pub ns: Vec<String>,
    /// Separator for key paths inside a bundle.
    pub key_separator: String,
    /// Separator between namespace and key (`"ns:key"`).
    pub ns_separator: String,
    /// Separator between key and context suffix.
    pub context_separator: String,
    /// Separator between key and plural category suffix.
    pub plural_separator: String,
    pub interpolation: InterpolationOptions,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            resources: Value::Null,
            lng: None,
            fallback_lng: Vec::new(),
            default_ns: "translation".to_string(),
            ns: vec!["translation".to_string()],
            key_separator: ".".to_string(),
            ns_separator: ":".to_string(),
            context_separator: "_".to_string(),
            plural_separator: "_".to_string(),
            interpolation: InterpolationOptions::default(),
        }
    }
}

impl EngineOptions {
    /// Parse options from a JSON value.
    pub fn from_json(value: Value) -> crate::error::Result<Self> {
        Ok(serde_json::from_value(value)?)
    }
}

/// Variable interpolation options.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InterpolationOptions {
    /// Token prefix.
    pub prefix: String,
    /// Token suffix.
    pub suffix: String,
    /// Variables merged into every interpolation.
    pub default_variables: BTreeMap<String, Value>,
}

impl Default for InterpolationOptions {
    fn default() -> Self {
        Self {
            prefix: "{{".to_string(),
            suffix: "}}".to_string(),
            default_variables: BTreeMap::new(),
        }
    }
}

fn string_or_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(s) => vec![s],
        OneOrMany::Many(list) => list,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_are_conventional() {
        let opts = EngineOptions::default();
        assert_eq!(opts.default_ns, "translation");
        assert_eq!(opts.key_separator, ".");
        assert_eq!(opts.ns_separator, ":");
        assert_eq!(opts.interpolation.prefix, "{{");
        assert_eq!(opts.interpolation.suffix, "}}");
    }

    #[test]
    fn fallback_accepts_single_string() {
        let opts = EngineOptions::from_json(json!({ "fallbackLng": "en" })).unwrap();
        assert_eq!(opts.fallback_lng, vec!["en"]);
    }

    #[test]
    fn fallback_accepts_list() {
        let opts = EngineOptions::from_json(json!({ "fallbackLng": ["fr", "en"] })).unwrap();
        assert_eq!(opts.fallback_lng, vec!["fr", "en"]);
    }

    #[test]
    fn resources_pass_through() {
        let opts = EngineOptions::from_json(json!({
            "lng": "en",
            "resources": { "en": { "translation": { "k": "v" } } },
        }))
        .unwrap();
        assert_eq!(opts.lng.as_deref(), Some("en"));
        assert_eq!(opts.resources["en"]["translation"]["k"], "v");
    }

    #[test]
    fn default_variables_parse() {
        let opts = EngineOptions::from_json(json!({
            "interpolation": { "defaultVariables": { "app": "Polyglot" } },
        }))
        .unwrap();
        assert_eq!(
            opts.interpolation.default_variables.get("app"),
            Some(&json!("Polyglot"))
        );
    }
}
