#![forbid(unsafe_code)]

//! Per-argument-set memoization for pure engine lookups.
//!
//! # Design
//!
//! Each previously-requested argument set owns one equality-gated
//! observable holding its last result. Reading an argument set for the
//! first time computes eagerly and registers the entry; when the facade's
//! dirty trigger fires, *every* known entry is recomputed — lazily fresh
//! for argument sets someone once cared about, and nothing is ever
//! computed for argument sets nobody requested. Equality gating means a
//! recompute whose result did not change never re-runs dependents.
//!
//! Cache keys are typed (`Hash`/`Eq` derived from the actual argument
//! fields) rather than stringified call arguments; the one JSON-valued
//! component (interpolation values) is keyed through the canonical
//! serialization of an ordered map, which is deterministic.

use std::cell::RefCell;
use std::hash::Hash;

use pgt_i18n::TranslateOptions;
use pgt_reactive::Observable;
use rustc_hash::FxHashMap;

/// One memo map: typed key -> (original args, result observable).
pub(crate) struct ArgCache<K, A, V> {
    entries: RefCell<FxHashMap<K, (A, Observable<V>)>>,
}

impl<K, A, V> ArgCache<K, A, V>
where
    K: Eq + Hash + Clone,
    A: Clone,
    V: Clone + PartialEq + 'static,
{
    pub(crate) fn new() -> Self {
        Self {
            entries: RefCell::new(FxHashMap::default()),
        }
    }

    /// Read the cached result for `key`, computing and registering it on
    /// first use. Tracks the entry's observable.
    pub(crate) fn read(&self, key: K, args: A, compute: impl FnOnce(&A) -> V) -> V {
        let existing = self
            .entries
            .borrow()
            .get(&key)
            .map(|(_, obs)| obs.clone());
        match existing {
            Some(obs) => obs.get(),
            None => {
                let value = compute(&args);
                let obs = Observable::new(value);
                let out = obs.get();
                self.entries.borrow_mut().insert(key, (args, obs));
                out
            }
        }
    }

    /// Recompute every known entry. Entries whose value did not change do
    /// not notify dependents.
    pub(crate) fn refresh(&self, mut compute: impl FnMut(&A) -> V) {
        // Snapshot first: setting an observable can re-run dependents that
        // read back into this cache.
        let snapshot: Vec<(A, Observable<V>)> = self
            .entries
            .borrow()
            .values()
            .map(|(args, obs)| (args.clone(), obs.clone()))
            .collect();
        for (args, obs) in snapshot {
            obs.set(compute(&args));
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.borrow().len()
    }
}

/// Typed cache key for `t` / `exists` lookups.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct TranslateKey {
    key: String,
    lng: Option<String>,
    ns: Option<Vec<String>>,
    key_prefix: Option<String>,
    count: Option<i64>,
    context: Option<String>,
    default_value: Option<String>,
    /// Canonical JSON of the (ordered) interpolation values.
    values: String,
}

impl TranslateKey {
    pub(crate) fn new(key: &str, opts: &TranslateOptions) -> Self {
        let values = if opts.values.is_empty() {
            String::new()
        } else {
            serde_json::to_string(&opts.values).unwrap_or_default()
        };
        Self {
            key: key.to_string(),
            lng: opts.lng.clone(),
            ns: opts.ns.clone(),
            key_prefix: opts.key_prefix.clone(),
            count: opts.count,
            context: opts.context.clone(),
            default_value: opts.default_value.clone(),
            values,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
