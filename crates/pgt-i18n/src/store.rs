#![forbid(unsafe_code)]

//! Resource store: nested translation bundles per (language, namespace).
//!
//! Bundles are JSON trees. Keys passed to [`ResourceStore::get_resource`]
//! and [`ResourceStore::add_resource`] may contain the key separator and
//! are walked (or created) as a path. Mutations emit [`StoreEvent`]s on
//! the store's emitter so observers can invalidate.
//!
//! # Invariants
//!
//! 1. `add_*` emits exactly one `Added` per call; `remove_resource_bundle`
//!    emits exactly one `Removed` (only when the bundle existed).
//! 2. A read immediately after a mutation sees the mutated tree.
//! 3. Bundle trees handed out are clones; callers cannot mutate the store
//!    through them.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use serde_json::{Map, Value};

use crate::events::{EventEmitter, StoreEvent};

struct StoreInner {
    /// language -> namespace -> bundle tree.
    data: RefCell<BTreeMap<String, BTreeMap<String, Value>>>,
    emitter: EventEmitter<StoreEvent>,
}

/// Shared resource store. Cloning shares the underlying data and emitter.
#[derive(Clone)]
pub struct ResourceStore {
    inner: Rc<StoreInner>,
}

impl ResourceStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(StoreInner {
                data: RefCell::new(BTreeMap::new()),
                emitter: EventEmitter::new(),
            }),
        }
    }

    /// Emitter for `Added` / `Removed` events.
    #[must_use]
    pub fn emitter(&self) -> EventEmitter<StoreEvent> {
        self.inner.emitter.clone()
    }

    /// Seed the store from an inline `{ lng: { ns: tree } }` resources
    /// value. Silent: no events are emitted for the initial payload.
    pub fn seed(&self, resources: &Value) {
        let Value::Object(languages) = resources else {
            return;
        };
        let mut data = self.inner.data.borrow_mut();
        for (lng, namespaces) in languages {
            let Value::Object(namespaces) = namespaces else {
                continue;
            };
            let entry = data.entry(lng.clone()).or_default();
            for (ns, bundle) in namespaces {
                entry.insert(ns.clone(), bundle.clone());
            }
        }
    }

    /// Read a value by key path. `None` when the language, namespace, or
    /// path is absent.
    #[must_use]
    pub fn get_resource(
        &self,
        lng: &str,
        ns: &str,
        key: &str,
        key_separator: &str,
    ) -> Option<Value> {
        let data = self.inner.data.borrow();
        let bundle = data.get(lng)?.get(ns)?;
        get_path(bundle, key, key_separator).cloned()
    }

    /// Insert a single value by key path, creating intermediate objects.
    pub fn add_resource(&self, lng: &str, ns: &str, key: &str, value: &str, key_separator: &str) {
        self.insert_path(lng, ns, key, Value::String(value.to_string()), key_separator);
        self.emit_added(lng, ns);
    }

    /// Insert a flat map of key paths. One `Added` event for the batch.
    pub fn add_resources(&self, lng: &str, ns: &str, resources: &Value, key_separator: &str) {
        if let Value::Object(entries) = resources {
            for (key, value) in entries {
                self.insert_path(lng, ns, key, value.clone(), key_separator);
            }
        }
        self.emit_added(lng, ns);
    }

    /// Merge a whole bundle.
    ///
    /// `deep` merges trees recursively, `overwrite` controlling whether
    /// existing leaves are replaced. Shallow (the default in callers)
    /// assigns top-level keys, replacing whatever was there.
    pub fn add_resource_bundle(
        &self,
        lng: &str,
        ns: &str,
        bundle: &Value,
        deep: bool,
        overwrite: bool,
    ) {
        {
            let mut data = self.inner.data.borrow_mut();
            let target = data
                .entry(lng.to_string())
                .or_default()
                .entry(ns.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if deep {
                merge_deep(target, bundle, overwrite);
            } else if let (Value::Object(target), Value::Object(src)) = (target, bundle) {
                for (k, v) in src {
                    target.insert(k.clone(), v.clone());
                }
            }
        }
        self.emit_added(lng, ns);
    }

    #[must_use]
    pub fn has_resource_bundle(&self, lng: &str, ns: &str) -> bool {
        self.inner
            .data
            .borrow()
            .get(lng)
            .is_some_and(|namespaces| namespaces.contains_key(ns))
    }

    #[must_use]
    pub fn get_resource_bundle(&self, lng: &str, ns: &str) -> Option<Value> {
        self.inner.data.borrow().get(lng)?.get(ns).cloned()
    }

    /// Remove a bundle. Emits `Removed` only when something was removed.
    pub fn remove_resource_bundle(&self, lng: &str, ns: &str) {
        let removed = {
            let mut data = self.inner.data.borrow_mut();
            data.get_mut(lng)
                .is_some_and(|namespaces| namespaces.remove(ns).is_some())
        };
        if removed {
            self.inner.emitter.emit(&StoreEvent::Removed {
                lng: lng.to_string(),
                ns: ns.to_string(),
            });
        }
    }

    /// All bundles for a language, keyed by namespace.
    #[must_use]
    pub fn get_data_by_language(&self, lng: &str) -> Option<BTreeMap<String, Value>> {
        self.inner.data.borrow().get(lng).cloned()
    }

    /// Languages with at least one bundle.
    #[must_use]
    pub fn languages(&self) -> Vec<String> {
        self.inner.data.borrow().keys().cloned().collect()
    }

    /// True when a language has any bundle.
    #[must_use]
    pub fn has_language(&self, lng: &str) -> bool {
        self.inner
            .data
            .borrow()
            .get(lng)
            .is_some_and(|namespaces| !namespaces.is_empty())
    }

    fn insert_path(&self, lng: &str, ns: &str, key: &str, value: Value, key_separator: &str) {
        let mut data = self.inner.data.borrow_mut();
        let bundle = data
            .entry(lng.to_string())
            .or_default()
            .entry(ns.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        set_path(bundle, key, value, key_separator);
    }

    fn emit_added(&self, lng: &str, ns: &str) {
        self.inner.emitter.emit(&StoreEvent::Added {
            lng: lng.to_string(),
            ns: ns.to_string(),
        });
    }
}

impl Default for ResourceStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ResourceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let data = self.inner.data.borrow();
        f.debug_struct("ResourceStore")
            .field("languages", &data.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Walk a key path through a JSON tree.
fn get_path<'a>(tree: &'a Value, key: &str, separator: &str) -> Option<&'a Value> {
    if separator.is_empty() {
        return tree.get(key);
    }
    let mut current = tree;
    for segment in key.split(separator) {
        current = current.get(segment)?;
    }
    Some(current)
}

/// Set a key path in a JSON tree, creating intermediate objects. A
/// non-object intermediate is replaced.
fn set_path(tree: &mut Value, key: &str, value: Value, separator: &str) {
    let segments: Vec<&str> = if separator.is_empty() {
        vec![key]
    } else {
        key.split(separator).collect()
    };

    let mut current = tree;
    for segment in &segments[..segments.len() - 1] {
        if !current.is_object() {
            *current = Value::Object(Map::new());
        }
        current = current
            .as_object_mut()
            .expect("just ensured object")
            .entry((*segment).to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
    if !current.is_object() {
        *current = Value::Object(Map::new());
    }
    current
        .as_object_mut()
        .expect("just ensured object")
        .insert(segments[segments.len() - 1].to_string(), value);
}

/// Recursively merge `src` into `target`. Existing leaves are replaced
/// only when `overwrite` is set.
fn merge_deep(target: &mut Value, src: &Value, overwrite: bool) {
    match (target, src) {
        (Value::Object(target), Value::Object(src)) => {
            for (k, v) in src {
                match target.get_mut(k) {
                    Some(existing) if existing.is_object() && v.is_object() => {
                        merge_deep(existing, v, overwrite);
                    }
                    Some(existing) => {
                        if overwrite {
                            *existing = v.clone();
                        }
                    }
                    None => {
                        target.insert(k.clone(), v.clone());
                    }
                }
            }
        }
        (target, src) => {
            if overwrite {
                *target = src.clone();
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::RefCell;

    #[test]
    fn seed_and_get_resource() {
        let store = ResourceStore::new();
        store.seed(&json!({
            "en": { "translation": { "button": "Button", "special": { "button": "Special" } } },
        }));

        assert_eq!(
            store.get_resource("en", "translation", "button", "."),
            Some(json!("Button"))
        );
        assert_eq!(
            store.get_resource("en", "translation", "special.button", "."),
            Some(json!("Special"))
        );
        assert_eq!(store.get_resource("en", "translation", "missing", "."), None);
        assert_eq!(store.get_resource("fr", "translation", "button", "."), None);
    }

    #[test]
    fn add_resource_creates_path_and_emits() {
        let store = ResourceStore::new();
        let events = Rc::new(RefCell::new(Vec::new()));
        let events_clone = Rc::clone(&events);
        let _guard = store
            .emitter()
            .on(move |e| events_clone.borrow_mut().push(e.clone()));

        store.add_resource("en", "ns", "a.b.c", "leaf", ".");
        assert_eq!(store.get_resource("en", "ns", "a.b.c", "."), Some(json!("leaf")));
        assert_eq!(
            *events.borrow(),
            vec![StoreEvent::Added {
                lng: "en".to_string(),
                ns: "ns".to_string()
            }]
        );
    }

    #[test]
    fn add_resources_flat_keys_nest() {
        let store = ResourceStore::new();
        store.add_resources(
            "en",
            "very-informal",
            &json!({
                "special.button": "Epicly epic button",
                "special.link": "Clicky move",
            }),
            ".",
        );

        assert_eq!(
            store.get_resource_bundle("en", "very-informal"),
            Some(json!({
                "special": {
                    "button": "Epicly epic button",
                    "link": "Clicky move",
                }
            }))
        );
    }

    #[test]
    fn add_resources_emits_once_per_call() {
        let store = ResourceStore::new();
        let count = Rc::new(RefCell::new(0u32));
        let count_clone = Rc::clone(&count);
        let _guard = store.emitter().on(move |_| *count_clone.borrow_mut() += 1);

        store.add_resources("en", "ns", &json!({ "a": "1", "b": "2", "c": "3" }), ".");
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn deep_merge_preserves_unmentioned_leaves() {
        let store = ResourceStore::new();
        store.add_resources("en", "ns", &json!({ "special.button": "old" }), ".");
        store.add_resource_bundle("en", "ns", &json!({ "special": { "power": "new" } }), true, true);

        assert_eq!(
            store.get_resource_bundle("en", "ns"),
            Some(json!({ "special": { "button": "old", "power": "new" } }))
        );
    }

    #[test]
    fn deep_merge_overwrite_replaces_leaves() {
        let store = ResourceStore::new();
        store.add_resources(
            "en",
            "ns",
            &json!({ "special.button": "a", "special.link": "b", "special.power": "c" }),
            ".",
        );
        store.add_resource_bundle(
            "en",
            "ns",
            &json!({ "special": { "button": "X", "link": "Y", "power": "Z" } }),
            true,
            true,
        );

        assert_eq!(
            store.get_resource_bundle("en", "ns"),
            Some(json!({ "special": { "button": "X", "link": "Y", "power": "Z" } }))
        );
    }

    #[test]
    fn deep_merge_without_overwrite_keeps_existing() {
        let store = ResourceStore::new();
        store.add_resources("en", "ns", &json!({ "k": "old" }), ".");
        store.add_resource_bundle("en", "ns", &json!({ "k": "new", "k2": "added" }), true, false);

        assert_eq!(store.get_resource("en", "ns", "k", "."), Some(json!("old")));
        assert_eq!(store.get_resource("en", "ns", "k2", "."), Some(json!("added")));
    }

    #[test]
    fn shallow_bundle_assigns_top_level() {
        let store = ResourceStore::new();
        store.add_resources("en", "ns", &json!({ "keep": "kept", "replace": "old" }), ".");
        store.add_resource_bundle("en", "ns", &json!({ "replace": "new" }), false, false);

        assert_eq!(store.get_resource("en", "ns", "keep", "."), Some(json!("kept")));
        assert_eq!(store.get_resource("en", "ns", "replace", "."), Some(json!("new")));
    }

    #[test]
    fn remove_bundle_emits_only_when_present() {
        let store = ResourceStore::new();
        let events = Rc::new(RefCell::new(Vec::new()));
        let events_clone = Rc::clone(&events);
        let _guard = store
            .emitter()
            .on(move |e| events_clone.borrow_mut().push(e.clone()));

        store.remove_resource_bundle("en", "ghost");
        assert!(events.borrow().is_empty());

        store.add_resource("en", "ns", "k", "v", ".");
        store.remove_resource_bundle("en", "ns");
        assert!(!store.has_resource_bundle("en", "ns"));
        assert_eq!(
            events.borrow().last(),
            Some(&StoreEvent::Removed {
                lng: "en".to_string(),
                ns: "ns".to_string()
            })
        );
    }

    #[test]
    fn get_data_by_language_clones_all_bundles() {
        let store = ResourceStore::new();
        store.seed(&json!({
            "en": { "a": { "k": "1" }, "b": { "k": "2" } },
        }));

        let data = store.get_data_by_language("en").unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data["a"], json!({ "k": "1" }));
        assert!(store.get_data_by_language("de").is_none());
    }

    #[test]
    fn has_language_tracks_bundles() {
        let store = ResourceStore::new();
        assert!(!store.has_language("en"));
        store.add_resource("en", "ns", "k", "v", ".");
        assert!(store.has_language("en"));
    }
}
