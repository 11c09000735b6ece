#![forbid(unsafe_code)]

//! The i18n engine.
//!
//! # Design
//!
//! [`Engine`] is a cheaply-cloneable handle over shared interior state
//! (options, resource store, language state, lifecycle flags, loaded-pair
//! set, optional backend). All mutation goes through its public methods;
//! every state-changing method finishes applying state *before* emitting
//! lifecycle events, so listeners always observe the post-mutation
//! snapshot.
//!
//! An engine that was never initialized is safe to read: lookups return
//! keys, language accessors return `None`, and the store is empty. This is
//! deliberate (readers should degrade, not fail) — readiness is the
//! caller's concern.
//!
//! # Failure Modes
//!
//! - **Backend load failure**: the pair is marked loaded anyway (so one
//!   broken namespace cannot wedge readiness forever), a warning is
//!   logged, and the first error is returned to the caller.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use rustc_hash::FxHashSet;
use serde_json::Value;

use crate::backend::Backend;
use crate::direction::{Direction, direction};
use crate::error::{EngineError, Result};
use crate::events::{EngineEvent, EventEmitter};
use crate::interpolate::{FormatFn, Interpolator};
use crate::options::EngineOptions;
use crate::store::ResourceStore;
use crate::translator::{self, FixedT, TranslateOptions};

struct EngineInner {
    options: RefCell<EngineOptions>,
    store: ResourceStore,
    emitter: EventEmitter<EngineEvent>,
    interpolator: RefCell<Interpolator>,
    backend: RefCell<Option<Rc<dyn Backend>>>,
    language: RefCell<Option<String>>,
    languages: RefCell<Vec<String>>,
    resolved_language: RefCell<Option<String>>,
    is_initialized: Cell<bool>,
    is_initializing: Cell<bool>,
    initialized_store_once: Cell<bool>,
    initialized_language_once: Cell<bool>,
    /// (language, namespace) pairs considered loaded.
    loaded: RefCell<FxHashSet<(String, String)>>,
}

/// Shared engine handle. Cloning shares all state.
#[derive(Clone)]
pub struct Engine {
    inner: Rc<EngineInner>,
}

/// Service accessors, mirroring the `services` surface consumers expect.
#[derive(Clone)]
pub struct Services {
    pub interpolator: Interpolator,
}

impl Engine {
    /// Create an uninitialized engine.
    #[must_use]
    pub fn new(options: EngineOptions) -> Self {
        let interpolator = Interpolator::new(&options.interpolation);
        Self {
            inner: Rc::new(EngineInner {
                options: RefCell::new(options),
                store: ResourceStore::new(),
                emitter: EventEmitter::new(),
                interpolator: RefCell::new(interpolator),
                backend: RefCell::new(None),
                language: RefCell::new(None),
                languages: RefCell::new(Vec::new()),
                resolved_language: RefCell::new(None),
                is_initialized: Cell::new(false),
                is_initializing: Cell::new(false),
                initialized_store_once: Cell::new(false),
                initialized_language_once: Cell::new(false),
                loaded: RefCell::new(FxHashSet::default()),
            }),
        }
    }

    /// Create an engine from a JSON options value.
    pub fn from_json(options: Value) -> Result<Self> {
        Ok(Self::new(EngineOptions::from_json(options)?))
    }

    /// Install a backend for namespaces without inline resources.
    pub fn set_backend(&self, backend: Rc<dyn Backend>) {
        *self.inner.backend.borrow_mut() = Some(backend);
    }

    /// Install a custom interpolation format function.
    pub fn set_format(&self, format: FormatFn) {
        let current = self.inner.interpolator.borrow().clone();
        *self.inner.interpolator.borrow_mut() = current.with_format(format);
    }

    // --- Identity ---------------------------------------------------------

    /// Stable identity of the shared state, for registries.
    #[must_use]
    pub fn id(&self) -> usize {
        Rc::as_ptr(&self.inner) as usize
    }

    /// True when both handles share one engine.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    // --- Lifecycle --------------------------------------------------------

    /// Initialize: seed inline resources, settle the language chain, load
    /// configured namespaces through the backend (when present), then emit
    /// `Initialized` and `Loaded`.
    ///
    /// Idempotent: a second call is a no-op.
    pub fn init(&self) -> Result<()> {
        if self.inner.is_initialized.get() {
            tracing::debug!(target: "pgt.i18n", "init called twice; ignored");
            return Ok(());
        }
        self.inner.is_initializing.set(true);

        let (resources, lng) = {
            let options = self.inner.options.borrow();
            (options.resources.clone(), options.lng.clone())
        };
        self.inner.store.seed(&resources);
        self.mark_inline_loaded(&resources);
        self.inner.initialized_store_once.set(true);

        let mut first_error = None;
        if let Some(lng) = &lng {
            let chain = self.compute_languages(lng);
            first_error = self.ensure_chain_loaded(&chain);
            self.apply_language(lng, chain);
            self.inner.initialized_language_once.set(true);
        }

        self.inner.is_initialized.set(true);
        self.inner.is_initializing.set(false);
        self.inner.emitter.emit(&EngineEvent::Initialized);
        self.inner.emitter.emit(&EngineEvent::Loaded);

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Switch language: load its namespaces, apply the new chain, then
    /// emit `LanguageChanged` and `Loaded`. With `None`, falls back to the
    /// first configured fallback language, then the current language.
    pub fn change_language(&self, lng: Option<&str>) -> Result<()> {
        let target = lng
            .map(str::to_string)
            .or_else(|| self.inner.options.borrow().fallback_lng.first().cloned())
            .or_else(|| self.language());
        let Some(target) = target else {
            return Ok(());
        };

        let chain = self.compute_languages(&target);
        let first_error = self.ensure_chain_loaded(&chain);
        self.apply_language(&target, chain);
        self.inner.initialized_language_once.set(true);

        self.inner
            .emitter
            .emit(&EngineEvent::LanguageChanged(target));
        self.inner.emitter.emit(&EngineEvent::Loaded);

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Change the default namespace for unqualified keys.
    pub fn set_default_namespace(&self, ns: &str) {
        self.inner.options.borrow_mut().default_ns = ns.to_string();
    }

    // --- Loading ----------------------------------------------------------

    /// Add namespaces to the configured set without loading them.
    pub fn register_namespaces(&self, namespaces: &[String]) {
        let mut options = self.inner.options.borrow_mut();
        for ns in namespaces {
            if !options.ns.contains(ns) {
                options.ns.push(ns.clone());
            }
        }
    }

    /// Load namespaces for the current language chain, registering unknown
    /// namespaces into the options. Emits `Loaded` when settled.
    pub fn load_namespaces(&self, namespaces: &[String]) -> Result<()> {
        self.register_namespaces(namespaces);

        let languages = self.lookup_languages();
        let mut first_error = None;
        for lng in &languages {
            for ns in namespaces {
                if let Some(err) = self.ensure_loaded(lng, ns) {
                    first_error.get_or_insert(err);
                }
            }
        }
        self.inner.emitter.emit(&EngineEvent::Loaded);
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Preload languages: every configured namespace for each given
    /// language. Emits `Loaded` when settled.
    pub fn load_languages(&self, languages: &[String]) -> Result<()> {
        let namespaces = self.inner.options.borrow().ns.clone();
        let mut first_error = None;
        for lng in languages {
            for ns in &namespaces {
                if let Some(err) = self.ensure_loaded(lng, ns) {
                    first_error.get_or_insert(err);
                }
            }
        }
        self.inner.emitter.emit(&EngineEvent::Loaded);
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Load every configured namespace for the current language chain.
    pub fn load_resources(&self) -> Result<()> {
        let namespaces = self.inner.options.borrow().ns.clone();
        self.load_namespaces(&namespaces)
    }

    /// Drop loaded marks for the given (or all) pairs and load them again
    /// through the backend, overwriting stale bundles.
    pub fn reload_resources(&self, languages: Option<&[String]>, ns: Option<&[String]>) -> Result<()> {
        let languages: Vec<String> = match languages {
            Some(list) => list.to_vec(),
            None => self.lookup_languages(),
        };
        let namespaces: Vec<String> = match ns {
            Some(list) => list.to_vec(),
            None => self.inner.options.borrow().ns.clone(),
        };

        {
            let mut loaded = self.inner.loaded.borrow_mut();
            for lng in &languages {
                for ns in &namespaces {
                    loaded.remove(&(lng.clone(), ns.clone()));
                }
            }
        }

        let mut first_error = None;
        for lng in &languages {
            for ns in &namespaces {
                if let Some(err) = self.reload_one(lng, ns) {
                    first_error.get_or_insert(err);
                }
            }
        }
        self.inner.emitter.emit(&EngineEvent::Loaded);
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// True when the namespace is loaded for the given (or current)
    /// language.
    #[must_use]
    pub fn has_loaded_namespace(&self, ns: &str, lng: Option<&str>) -> bool {
        let target = lng
            .map(str::to_string)
            .or_else(|| self.resolved_language())
            .or_else(|| self.language());
        match target {
            Some(lng) => {
                self.inner
                    .loaded
                    .borrow()
                    .contains(&(lng.clone(), ns.to_string()))
                    || self.inner.store.has_resource_bundle(&lng, ns)
            }
            None => false,
        }
    }

    // --- State accessors --------------------------------------------------

    #[must_use]
    pub fn language(&self) -> Option<String> {
        self.inner.language.borrow().clone()
    }

    #[must_use]
    pub fn languages(&self) -> Vec<String> {
        self.inner.languages.borrow().clone()
    }

    #[must_use]
    pub fn resolved_language(&self) -> Option<String> {
        self.inner.resolved_language.borrow().clone()
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.inner.is_initialized.get()
    }

    #[must_use]
    pub fn is_initializing(&self) -> bool {
        self.inner.is_initializing.get()
    }

    #[must_use]
    pub fn initialized_store_once(&self) -> bool {
        self.inner.initialized_store_once.get()
    }

    #[must_use]
    pub fn initialized_language_once(&self) -> bool {
        self.inner.initialized_language_once.get()
    }

    /// Snapshot of the current options.
    #[must_use]
    pub fn options(&self) -> EngineOptions {
        self.inner.options.borrow().clone()
    }

    /// The shared resource store.
    #[must_use]
    pub fn store(&self) -> ResourceStore {
        self.inner.store.clone()
    }

    /// Engine lifecycle event emitter.
    #[must_use]
    pub fn emitter(&self) -> EventEmitter<EngineEvent> {
        self.inner.emitter.clone()
    }

    /// Service accessors.
    #[must_use]
    pub fn services(&self) -> Services {
        Services {
            interpolator: self.interpolator(),
        }
    }

    /// The interpolation service.
    #[must_use]
    pub fn interpolator(&self) -> Interpolator {
        self.inner.interpolator.borrow().clone()
    }

    /// True when a backend is installed.
    #[must_use]
    pub fn has_backend(&self) -> bool {
        self.inner.backend.borrow().is_some()
    }

    // --- Translation ------------------------------------------------------

    /// Translate a key with default options.
    #[must_use]
    pub fn t(&self, key: &str) -> String {
        translator::translate(self, key, &TranslateOptions::default())
    }

    /// Translate a key with options.
    #[must_use]
    pub fn t_with(&self, key: &str, opts: &TranslateOptions) -> String {
        translator::translate(self, key, opts)
    }

    /// True when the key resolves to a stored string.
    #[must_use]
    pub fn exists(&self, key: &str, opts: &TranslateOptions) -> bool {
        translator::exists(self, key, opts)
    }

    /// A translator bound to a language, namespaces, and key prefix.
    #[must_use]
    pub fn get_fixed_t(
        &self,
        lng: Option<String>,
        ns: Option<Vec<String>>,
        key_prefix: Option<String>,
    ) -> FixedT {
        FixedT::new(self.clone(), lng, ns, key_prefix)
    }

    /// Text direction of the given (or current) language.
    #[must_use]
    pub fn dir(&self, lng: Option<&str>) -> Direction {
        let target = lng
            .map(str::to_string)
            .or_else(|| self.resolved_language())
            .or_else(|| self.language());
        direction(target.as_deref().unwrap_or("en"))
    }

    // --- Resource CRUD ----------------------------------------------------

    pub fn get_resource(&self, lng: &str, ns: &str, key: &str) -> Option<Value> {
        let separator = self.inner.options.borrow().key_separator.clone();
        self.inner.store.get_resource(lng, ns, key, &separator)
    }

    pub fn add_resource(&self, lng: &str, ns: &str, key: &str, value: &str) {
        let separator = self.inner.options.borrow().key_separator.clone();
        self.inner.store.add_resource(lng, ns, key, value, &separator);
        self.mark_loaded(lng, ns);
    }

    pub fn add_resources(&self, lng: &str, ns: &str, resources: &Value) {
        let separator = self.inner.options.borrow().key_separator.clone();
        self.inner.store.add_resources(lng, ns, resources, &separator);
        self.mark_loaded(lng, ns);
    }

    pub fn add_resource_bundle(
        &self,
        lng: &str,
        ns: &str,
        bundle: &Value,
        deep: bool,
        overwrite: bool,
    ) {
        self.inner
            .store
            .add_resource_bundle(lng, ns, bundle, deep, overwrite);
        self.mark_loaded(lng, ns);
    }

    #[must_use]
    pub fn has_resource_bundle(&self, lng: &str, ns: &str) -> bool {
        self.inner.store.has_resource_bundle(lng, ns)
    }

    #[must_use]
    pub fn get_resource_bundle(&self, lng: &str, ns: &str) -> Option<Value> {
        self.inner.store.get_resource_bundle(lng, ns)
    }

    pub fn remove_resource_bundle(&self, lng: &str, ns: &str) {
        self.inner.store.remove_resource_bundle(lng, ns);
        self.inner
            .loaded
            .borrow_mut()
            .remove(&(lng.to_string(), ns.to_string()));
    }

    #[must_use]
    pub fn get_data_by_language(
        &self,
        lng: &str,
    ) -> Option<std::collections::BTreeMap<String, Value>> {
        self.inner.store.get_data_by_language(lng)
    }

    // --- Instances --------------------------------------------------------

    /// A fresh, unrelated engine.
    #[must_use]
    pub fn create_instance(&self, options: EngineOptions) -> Engine {
        Engine::new(options)
    }

    /// A new engine sharing this one's resource store, with copied options
    /// and language state. Lifecycle events are independent.
    #[must_use]
    pub fn clone_instance(&self) -> Engine {
        let options = self.options();
        let interpolator = Interpolator::new(&options.interpolation);
        let clone = Engine {
            inner: Rc::new(EngineInner {
                options: RefCell::new(options),
                store: self.inner.store.clone(),
                emitter: EventEmitter::new(),
                interpolator: RefCell::new(interpolator),
                backend: RefCell::new(self.inner.backend.borrow().clone()),
                language: RefCell::new(self.language()),
                languages: RefCell::new(self.languages()),
                resolved_language: RefCell::new(self.resolved_language()),
                is_initialized: Cell::new(self.is_initialized()),
                is_initializing: Cell::new(false),
                initialized_store_once: Cell::new(self.initialized_store_once()),
                initialized_language_once: Cell::new(self.initialized_language_once()),
                loaded: RefCell::new(self.inner.loaded.borrow().clone()),
            }),
        };
        clone
    }

    // --- Internal ---------------------------------------------------------

    /// Languages to resolve lookups against right now.
    fn lookup_languages(&self) -> Vec<String> {
        let languages = self.languages();
        if !languages.is_empty() {
            return languages;
        }
        match self.language() {
            Some(lng) => self.compute_languages(&lng),
            None => self.inner.options.borrow().fallback_lng.clone(),
        }
    }

    /// `[lng, primary-subtag?, fallbacks…]`, deduplicated.
    fn compute_languages(&self, lng: &str) -> Vec<String> {
        let mut chain = vec![lng.to_string()];
        if let Some(base) = lng.split(['-', '_']).next()
            && base != lng
        {
            chain.push(base.to_string());
        }
        for fallback in &self.inner.options.borrow().fallback_lng {
            if !chain.contains(fallback) {
                chain.push(fallback.clone());
            }
        }
        chain
    }

    fn apply_language(&self, lng: &str, chain: Vec<String>) {
        let resolved = chain
            .iter()
            .find(|candidate| self.inner.store.has_language(candidate))
            .cloned()
            .unwrap_or_else(|| lng.to_string());
        *self.inner.language.borrow_mut() = Some(lng.to_string());
        *self.inner.languages.borrow_mut() = chain;
        *self.inner.resolved_language.borrow_mut() = Some(resolved);
    }

    fn ensure_chain_loaded(&self, chain: &[String]) -> Option<EngineError> {
        let namespaces = self.inner.options.borrow().ns.clone();
        let mut first_error = None;
        for lng in chain {
            for ns in &namespaces {
                if let Some(err) = self.ensure_loaded(lng, ns) {
                    first_error.get_or_insert(err);
                }
            }
        }
        first_error
    }

    /// Make one (language, namespace) pair loaded: inline bundles count,
    /// the backend fills gaps, and a failed load still marks the pair so
    /// readiness cannot wedge.
    fn ensure_loaded(&self, lng: &str, ns: &str) -> Option<EngineError> {
        if self
            .inner
            .loaded
            .borrow()
            .contains(&(lng.to_string(), ns.to_string()))
        {
            return None;
        }
        if self.inner.store.has_resource_bundle(lng, ns) {
            self.mark_loaded(lng, ns);
            return None;
        }

        let backend = self.inner.backend.borrow().clone();
        let result = match backend {
            None => None,
            Some(backend) => match backend.read(lng, ns) {
                Ok(bundle) => {
                    self.inner
                        .store
                        .add_resource_bundle(lng, ns, &bundle, true, true);
                    None
                }
                Err(source) => {
                    tracing::warn!(
                        target: "pgt.i18n",
                        lng,
                        ns,
                        error = %source,
                        "backend load failed"
                    );
                    Some(EngineError::Load {
                        lng: lng.to_string(),
                        ns: ns.to_string(),
                        source,
                    })
                }
            },
        };
        self.mark_loaded(lng, ns);
        result
    }

    /// Reload one pair through the backend, overwriting the stale bundle.
    fn reload_one(&self, lng: &str, ns: &str) -> Option<EngineError> {
        let backend = self.inner.backend.borrow().clone();
        let result = match backend {
            None => None,
            Some(backend) => match backend.read(lng, ns) {
                Ok(bundle) => {
                    self.inner
                        .store
                        .add_resource_bundle(lng, ns, &bundle, true, true);
                    None
                }
                Err(source) => {
                    tracing::warn!(
                        target: "pgt.i18n",
                        lng,
                        ns,
                        error = %source,
                        "backend reload failed"
                    );
                    Some(EngineError::Load {
                        lng: lng.to_string(),
                        ns: ns.to_string(),
                        source,
                    })
                }
            },
        };
        self.mark_loaded(lng, ns);
        result
    }

    fn mark_loaded(&self, lng: &str, ns: &str) {
        self.inner
            .loaded
            .borrow_mut()
            .insert((lng.to_string(), ns.to_string()));
    }

    fn mark_inline_loaded(&self, resources: &Value) {
        if let Value::Object(languages) = resources {
            let mut loaded = self.inner.loaded.borrow_mut();
            for (lng, namespaces) in languages {
                if let Value::Object(namespaces) = namespaces {
                    for ns in namespaces.keys() {
                        loaded.insert((lng.clone(), ns.clone()));
                    }
                }
            }
        }
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("language", &self.language())
            .field("initialized", &self.is_initialized())
            .field("languages", &self.languages())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
