#![forbid(unsafe_code)]

//! Reactive facade over an imperative i18n engine.
//!
//! # Design
//!
//! The engine is push-based (event emitter); reactive consumers are
//! pull-based. The bridge is one [`Trigger`]: every engine lifecycle
//! event (`Initialized`, `LanguageChanged`, `Loaded`) and store event
//! (`Added`, `Removed`) bumps it, and every facade mutator bumps it once
//! after the engine call has settled. Reads divide into three families:
//!
//! - **Snapshot fields** (language, languages, resolved language, the four
//!   init flags): refreshed by one effect keyed on the trigger into
//!   equality-gated observables, so a language change never re-runs a
//!   reader of `is_initialized()`.
//! - **Memoized lookups** (`t`, `exists`, `dir`, `has_loaded_namespace`,
//!   `has_resource_bundle`): cached per argument set, every known entry
//!   recomputed when the trigger fires (see [`crate::lookup_cache`]).
//! - **Direct tracked reads** (`get_resource`, `get_resource_bundle`,
//!   `get_data_by_language`, `options`, …): live structures with no cheap
//!   equality — they track the trigger and re-read on every change.
//!
//! Mutators run inside a batch, so the event-listener bumps and the
//! mutator's own bump coalesce to a single re-evaluation of each
//! dependent.
//!
//! # Invariants
//!
//! 1. Every state-changing engine call through the facade is followed by
//!    exactly one trigger bump, after the call settled.
//! 2. Wrapping the same engine twice in one thread yields the same live
//!    facade (idempotent wrap).
//! 3. Disposing the scope the facade was created in removes all engine
//!    and store listeners.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use pgt_i18n::{
    Direction, Engine, EngineEvent, EngineOptions, EventEmitter, FixedT, Result, Services,
    TranslateOptions,
};
use pgt_reactive::{EffectHandle, Observable, Trigger, batch, create_effect, on_cleanup};
use serde_json::Value;

use crate::context::use_translation_config;
use crate::lookup_cache::{ArgCache, TranslateKey};

struct Snapshot {
    language: Observable<Option<String>>,
    languages: Observable<Vec<String>>,
    resolved_language: Observable<Option<String>>,
    is_initialized: Observable<bool>,
    is_initializing: Observable<bool>,
    initialized_store_once: Observable<bool>,
    initialized_language_once: Observable<bool>,
}

impl Snapshot {
    fn of(engine: &Engine) -> Self {
        Self {
            language: Observable::new(engine.language()),
            languages: Observable::new(engine.languages()),
            resolved_language: Observable::new(engine.resolved_language()),
            is_initialized: Observable::new(engine.is_initialized()),
            is_initializing: Observable::new(engine.is_initializing()),
            initialized_store_once: Observable::new(engine.initialized_store_once()),
            initialized_language_once: Observable::new(engine.initialized_language_once()),
        }
    }

    fn refresh(&self, engine: &Engine) {
        self.language.set(engine.language());
        self.languages.set(engine.languages());
        self.resolved_language.set(engine.resolved_language());
        self.is_initialized.set(engine.is_initialized());
        self.is_initializing.set(engine.is_initializing());
        self.initialized_store_once.set(engine.initialized_store_once());
        self.initialized_language_once
            .set(engine.initialized_language_once());
    }
}

struct Caches {
    t: ArgCache<TranslateKey, (String, TranslateOptions), String>,
    exists: ArgCache<TranslateKey, (String, TranslateOptions), bool>,
    dir: ArgCache<Option<String>, Option<String>, Direction>,
    has_loaded_namespace: ArgCache<(String, Option<String>), (String, Option<String>), bool>,
    has_resource_bundle: ArgCache<(String, String), (String, String), bool>,
}

impl Caches {
    fn new() -> Self {
        Self {
            t: ArgCache::new(),
            exists: ArgCache::new(),
            dir: ArgCache::new(),
            has_loaded_namespace: ArgCache::new(),
            has_resource_bundle: ArgCache::new(),
        }
    }

    fn refresh(&self, engine: &Engine) {
        self.t.refresh(|(key, opts)| engine.t_with(key, opts));
        self.exists.refresh(|(key, opts)| engine.exists(key, opts));
        self.dir.refresh(|lng| engine.dir(lng.as_deref()));
        self.has_loaded_namespace
            .refresh(|(ns, lng)| engine.has_loaded_namespace(ns, lng.as_deref()));
        self.has_resource_bundle
            .refresh(|(lng, ns)| engine.has_resource_bundle(lng, ns));
    }
}

struct Inner {
    engine: Engine,
    trigger: Trigger,
    snapshot: Rc<Snapshot>,
    caches: Rc<Caches>,
    listeners: RefCell<Vec<pgt_i18n::ListenerGuard>>,
    _refresh_effect: EffectHandle,
}

/// Reactive facade over one [`Engine`]. Cloning shares the facade.
#[derive(Clone)]
pub struct ReactiveEngine {
    inner: Rc<Inner>,
}

thread_local! {
    /// Engine id -> live facade, for idempotent wrapping.
    static REGISTRY: RefCell<Vec<(usize, Weak<Inner>)>> = const { RefCell::new(Vec::new()) };
}

fn registry_lookup(id: usize) -> Option<ReactiveEngine> {
    REGISTRY.with(|registry| {
        let mut entries = registry.borrow_mut();
        entries.retain(|(_, weak)| weak.strong_count() > 0);
        entries
            .iter()
            .find(|(engine_id, _)| *engine_id == id)
            .and_then(|(_, weak)| weak.upgrade())
            .map(|inner| ReactiveEngine { inner })
    })
}

fn registry_insert(id: usize, inner: &Rc<Inner>) {
    REGISTRY.with(|registry| {
        registry.borrow_mut().push((id, Rc::downgrade(inner)));
    });
}

fn registry_remove(id: usize) {
    REGISTRY.with(|registry| {
        registry
            .borrow_mut()
            .retain(|(engine_id, _)| *engine_id != id);
    });
}

impl ReactiveEngine {
    /// Build a facade: explicit engine, else the context-provided engine,
    /// else the process-wide default.
    #[must_use]
    pub fn new(engine: Option<Engine>) -> Self {
        let engine = engine
            .or_else(|| use_translation_config().map(|config| config.engine))
            .unwrap_or_else(pgt_i18n::global);
        Self::wrap(&engine)
    }

    /// Wrap an engine. Idempotent: wrapping an engine that already has a
    /// live facade on this thread returns that facade unchanged.
    #[must_use]
    pub fn wrap(engine: &Engine) -> Self {
        if let Some(existing) = registry_lookup(engine.id()) {
            return existing;
        }

        let trigger = Trigger::new();
        let snapshot = Rc::new(Snapshot::of(engine));
        let caches = Rc::new(Caches::new());

        // One effect keyed on the trigger refreshes the snapshot fields
        // and every known lookup-cache entry.
        let refresh_effect = {
            let engine = engine.clone();
            let trigger = trigger.clone();
            let snapshot = Rc::clone(&snapshot);
            let caches = Rc::clone(&caches);
            create_effect(move || {
                trigger.track();
                batch(|| {
                    snapshot.refresh(&engine);
                    caches.refresh(&engine);
                });
            })
        };

        // Every lifecycle event bumps the trigger.
        let mut listeners = Vec::new();
        {
            let trigger_for_engine = trigger.clone();
            listeners.push(engine.emitter().on(move |_: &EngineEvent| {
                trigger_for_engine.notify();
            }));
            let trigger_for_store = trigger.clone();
            listeners.push(engine.store().emitter().on(move |_| {
                trigger_for_store.notify();
            }));
        }

        let inner = Rc::new(Inner {
            engine: engine.clone(),
            trigger,
            snapshot,
            caches,
            listeners: RefCell::new(listeners),
            _refresh_effect: refresh_effect,
        });
        registry_insert(engine.id(), &inner);

        // Scope disposal detaches the listeners and frees the registry
        // slot so a later wrap builds a fresh, live facade.
        let weak = Rc::downgrade(&inner);
        let engine_id = engine.id();
        on_cleanup(move || {
            if let Some(inner) = weak.upgrade() {
                inner.listeners.borrow_mut().clear();
            }
            registry_remove(engine_id);
        });

        Self { inner }
    }

    /// The wrapped engine.
    #[must_use]
    pub fn engine(&self) -> &Engine {
        &self.inner.engine
    }

    /// True when both handles share one facade.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Register the running computation as a dependent of *every* engine
    /// change. Coarse by construction; prefer the field accessors.
    pub fn track(&self) {
        self.inner.trigger.track();
    }

    // --- Snapshot reads ---------------------------------------------------

    #[must_use]
    pub fn language(&self) -> Option<String> {
        self.inner.snapshot.language.get()
    }

    #[must_use]
    pub fn languages(&self) -> Vec<String> {
        self.inner.snapshot.languages.get()
    }

    #[must_use]
    pub fn resolved_language(&self) -> Option<String> {
        self.inner.snapshot.resolved_language.get()
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.inner.snapshot.is_initialized.get()
    }

    #[must_use]
    pub fn is_initializing(&self) -> bool {
        self.inner.snapshot.is_initializing.get()
    }

    #[must_use]
    pub fn initialized_store_once(&self) -> bool {
        self.inner.snapshot.initialized_store_once.get()
    }

    #[must_use]
    pub fn initialized_language_once(&self) -> bool {
        self.inner.snapshot.initialized_language_once.get()
    }

    // --- Memoized lookups ---------------------------------------------------

    /// Translate a key. Memoized per argument set; refreshed on the dirty
    /// trigger.
    #[must_use]
    pub fn t(&self, key: &str) -> String {
        self.t_with(key, &TranslateOptions::default())
    }

    #[must_use]
    pub fn t_with(&self, key: &str, opts: &TranslateOptions) -> String {
        let engine = self.inner.engine.clone();
        self.inner.caches.t.read(
            TranslateKey::new(key, opts),
            (key.to_string(), opts.clone()),
            |(key, opts)| engine.t_with(key, opts),
        )
    }

    #[must_use]
    pub fn exists(&self, key: &str, opts: &TranslateOptions) -> bool {
        let engine = self.inner.engine.clone();
        self.inner.caches.exists.read(
            TranslateKey::new(key, opts),
            (key.to_string(), opts.clone()),
            |(key, opts)| engine.exists(key, opts),
        )
    }

    #[must_use]
    pub fn dir(&self, lng: Option<&str>) -> Direction {
        let engine = self.inner.engine.clone();
        let lng = lng.map(str::to_string);
        self.inner
            .caches
            .dir
            .read(lng.clone(), lng, |lng| engine.dir(lng.as_deref()))
    }

    #[must_use]
    pub fn has_loaded_namespace(&self, ns: &str, lng: Option<&str>) -> bool {
        let engine = self.inner.engine.clone();
        let args = (ns.to_string(), lng.map(str::to_string));
        self.inner
            .caches
            .has_loaded_namespace
            .read(args.clone(), args, |(ns, lng)| {
                engine.has_loaded_namespace(ns, lng.as_deref())
            })
    }

    #[must_use]
    pub fn has_resource_bundle(&self, lng: &str, ns: &str) -> bool {
        let engine = self.inner.engine.clone();
        let args = (lng.to_string(), ns.to_string());
        self.inner
            .caches
            .has_resource_bundle
            .read(args.clone(), args, |(lng, ns)| {
                engine.has_resource_bundle(lng, ns)
            })
    }

    // --- Direct tracked reads ---------------------------------------------

    /// Fixed translator. Function-valued, so tracked directly rather than
    /// memoized; its translations stay fresh through the facade's `t`.
    #[must_use]
    pub fn get_fixed_t(
        &self,
        lng: Option<String>,
        ns: Option<Vec<String>>,
        key_prefix: Option<String>,
    ) -> FixedT {
        self.inner.trigger.track();
        self.inner.engine.get_fixed_t(lng, ns, key_prefix)
    }

    #[must_use]
    pub fn get_resource(&self, lng: &str, ns: &str, key: &str) -> Option<Value> {
        self.inner.trigger.track();
        self.inner.engine.get_resource(lng, ns, key)
    }

    #[must_use]
    pub fn get_resource_bundle(&self, lng: &str, ns: &str) -> Option<Value> {
        self.inner.trigger.track();
        self.inner.engine.get_resource_bundle(lng, ns)
    }

    #[must_use]
    pub fn get_data_by_language(
        &self,
        lng: &str,
    ) -> Option<std::collections::BTreeMap<String, Value>> {
        self.inner.trigger.track();
        self.inner.engine.get_data_by_language(lng)
    }

    #[must_use]
    pub fn options(&self) -> EngineOptions {
        self.inner.trigger.track();
        self.inner.engine.options()
    }

    #[must_use]
    pub fn store(&self) -> pgt_i18n::ResourceStore {
        self.inner.trigger.track();
        self.inner.engine.store()
    }

    #[must_use]
    pub fn services(&self) -> Services {
        self.inner.trigger.track();
        self.inner.engine.services()
    }

    /// True when a loading backend module is installed. Tracked.
    #[must_use]
    pub fn has_backend(&self) -> bool {
        self.inner.trigger.track();
        self.inner.engine.has_backend()
    }

    /// The engine's lifecycle emitter (not tracked; for listeners).
    #[must_use]
    pub fn emitter(&self) -> EventEmitter<EngineEvent> {
        self.inner.engine.emitter()
    }

    // --- Mutators -----------------------------------------------------------

    /// Initialize the engine, then bump.
    pub fn init(&self) -> Result<()> {
        self.mutate(|engine| engine.init())
    }

    /// Change language, then bump once the engine has settled.
    pub fn change_language(&self, lng: Option<&str>) -> Result<()> {
        self.mutate(|engine| engine.change_language(lng))
    }

    pub fn set_default_namespace(&self, ns: &str) {
        self.mutate(|engine| {
            engine.set_default_namespace(ns);
        });
    }

    pub fn load_namespaces(&self, ns: &[String]) -> Result<()> {
        self.mutate(|engine| engine.load_namespaces(ns))
    }

    pub fn load_languages(&self, languages: &[String]) -> Result<()> {
        self.mutate(|engine| engine.load_languages(languages))
    }

    pub fn load_resources(&self) -> Result<()> {
        self.mutate(|engine| engine.load_resources())
    }

    pub fn reload_resources(
        &self,
        languages: Option<&[String]>,
        ns: Option<&[String]>,
    ) -> Result<()> {
        self.mutate(|engine| engine.reload_resources(languages, ns))
    }

    pub fn add_resource(&self, lng: &str, ns: &str, key: &str, value: &str) {
        self.mutate(|engine| {
            engine.add_resource(lng, ns, key, value);
        });
    }

    pub fn add_resources(&self, lng: &str, ns: &str, resources: &Value) {
        self.mutate(|engine| {
            engine.add_resources(lng, ns, resources);
        });
    }

    pub fn add_resource_bundle(
        &self,
        lng: &str,
        ns: &str,
        bundle: &Value,
        deep: bool,
        overwrite: bool,
    ) {
        self.mutate(|engine| {
            engine.add_resource_bundle(lng, ns, bundle, deep, overwrite);
        });
    }

    pub fn remove_resource_bundle(&self, lng: &str, ns: &str) {
        self.mutate(|engine| {
            engine.remove_resource_bundle(lng, ns);
        });
    }

    /// Run a state-changing engine call and bump the trigger exactly once
    /// after it settles. The whole thing is batched, so listener bumps
    /// from engine events coalesce with the explicit bump into a single
    /// dependent re-evaluation.
    fn mutate<R>(&self, f: impl FnOnce(&Engine) -> R) -> R {
        batch(|| {
            let result = f(&self.inner.engine);
            self.inner.trigger.notify();
            result
        })
    }

    // --- Instances ----------------------------------------------------------

    /// A facade over a fresh engine instance.
    #[must_use]
    pub fn create_reactive_instance(&self, options: EngineOptions) -> ReactiveEngine {
        ReactiveEngine::wrap(&self.inner.engine.create_instance(options))
    }

    /// A facade over a clone of the engine (shared store, independent
    /// language state).
    #[must_use]
    pub fn clone_reactive_instance(&self) -> ReactiveEngine {
        ReactiveEngine::wrap(&self.inner.engine.clone_instance())
    }
}

impl std::fmt::Debug for ReactiveEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReactiveEngine")
            .field("language", &self.inner.snapshot.language.peek())
            .field("trigger", &self.inner.trigger)
            .finish()
    }
}
