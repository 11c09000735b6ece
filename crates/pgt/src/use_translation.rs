#![forbid(unsafe_code)]

//! The translation hook: a fixed translator, the engine facade, and a
//! readiness flag, wired to load missing languages/namespaces.
//!
//! # Design
//!
//! The hook resolves its engine (explicit → context → global default) and
//! wraps it in a [`ReactiveEngine`]. The returned translator reads through
//! a [`Resource`] holding the current [`FixedT`], so swapping the bound
//! language/namespaces/key-prefix is one equality-gated transition, while
//! plain language changes flow through the facade's memoized `t` without
//! any swap at all.
//!
//! Loading has two modes:
//!
//! - **suspense** (default): when not ready, the resource refetches — the
//!   fetcher loads the missing languages/namespaces and resolves the
//!   translator once the engine has settled. Callers gate rendering on
//!   [`UseTranslation::ready`] or [`Resource::is_loading`].
//! - **no suspense**: loads run with an in-place translator swap on
//!   completion; callers must consult `ready()` before trusting output.

use std::cell::RefCell;
use std::rc::Rc;

use pgt_i18n::{Engine, EngineEvent, FixedT, ListenerGuard, TranslateOptions, global};
use pgt_reactive::{EffectHandle, Resource, Source, create_effect, untrack};

use crate::context::use_translation_config;
use crate::reactive_engine::ReactiveEngine;

/// Options for [`use_translation`].
#[derive(Clone, Default)]
pub struct UseTranslationOptions {
    pub key_prefix: Option<Source<String>>,
    pub lng: Option<Source<String>>,
    pub ns: Option<Source<Vec<String>>>,
    /// Suspense mode on by default.
    pub suspense: Option<bool>,
    pub engine: Option<Engine>,
}

impl UseTranslationOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn key_prefix(mut self, prefix: impl Into<Source<String>>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }

    #[must_use]
    pub fn lng(mut self, lng: impl Into<Source<String>>) -> Self {
        self.lng = Some(lng.into());
        self
    }

    #[must_use]
    pub fn ns(mut self, ns: impl Into<Source<Vec<String>>>) -> Self {
        self.ns = Some(ns.into());
        self
    }

    /// Single-namespace convenience.
    #[must_use]
    pub fn namespace(mut self, ns: impl Into<String>) -> Self {
        self.ns = Some(Source::Value(vec![ns.into()]));
        self
    }

    #[must_use]
    pub fn suspense(mut self, suspense: bool) -> Self {
        self.suspense = Some(suspense);
        self
    }

    #[must_use]
    pub fn engine(mut self, engine: Engine) -> Self {
        self.engine = Some(engine);
        self
    }
}

/// Shared hook state: option sources plus the facade.
struct HookCore {
    facade: ReactiveEngine,
    key_prefix: Option<Source<String>>,
    lng: Option<Source<String>>,
    ns: Option<Source<Vec<String>>>,
    context_ns: Option<Vec<String>>,
    suspense: bool,
}

impl HookCore {
    /// Namespace resolution: explicit → context default → engine default →
    /// `"translation"`.
    fn namespaces(&self) -> Vec<String> {
        if let Some(ns) = &self.ns {
            let value = ns.get();
            if !value.is_empty() {
                return value;
            }
        }
        if let Some(ns) = &self.context_ns
            && !ns.is_empty()
        {
            return ns.clone();
        }
        let default_ns = self.facade.engine().options().default_ns;
        if default_ns.is_empty() {
            vec!["translation".to_string()]
        } else {
            vec![default_ns]
        }
    }

    fn lng_value(&self) -> Option<String> {
        self.lng.as_ref().map(Source::get).filter(|l| !l.is_empty())
    }

    fn key_prefix_value(&self) -> Option<String> {
        self.key_prefix
            .as_ref()
            .map(Source::get)
            .filter(|p| !p.is_empty())
    }

    /// Readiness: (initialized OR store initialized once) AND every
    /// requested namespace loaded for the requested language. An engine
    /// with no languages yet counts as ready (nothing can be loaded).
    fn ready(&self) -> bool {
        let initialized = self.facade.is_initialized() || self.facade.initialized_store_once();
        if !initialized {
            return false;
        }
        let no_languages = self.facade.languages().is_empty();
        let lng = self.lng_value();
        self.namespaces()
            .iter()
            .all(|ns| no_languages || self.facade.has_loaded_namespace(ns, lng.as_deref()))
    }

    /// The translator bound to the current option values.
    fn derive_translator(&self) -> FixedT {
        self.facade.engine().get_fixed_t(
            self.lng_value(),
            Some(self.namespaces()),
            self.key_prefix_value(),
        )
    }

    /// Load whatever the current options need: a language override pulls
    /// its namespaces, otherwise the namespaces load for the current
    /// chain. Settles synchronously through the engine's backend.
    fn load(&self) {
        let namespaces = self.namespaces();
        self.facade.engine().register_namespaces(&namespaces);
        let result = match self.lng_value() {
            Some(lng) => self.facade.load_languages(&[lng]),
            None => self.facade.load_namespaces(&namespaces),
        };
        if let Err(err) = result {
            tracing::warn!(target: "pgt", error = %err, "translation load failed");
        }
    }
}

/// The hook's return value: translator, facade, readiness.
pub struct UseTranslation {
    core: Rc<HookCore>,
    translator: Resource<FixedT>,
    _effects: Vec<EffectHandle>,
    _language_listener: ListenerGuard,
}

impl UseTranslation {
    /// Translate through the current bound translator. Tracked: re-runs
    /// readers when the translator swaps or the engine changes.
    #[must_use]
    pub fn t(&self, key: &str) -> String {
        self.t_with(key, &TranslateOptions::default())
    }

    #[must_use]
    pub fn t_with(&self, key: &str, opts: &TranslateOptions) -> String {
        let fixed = self.translator.get();
        let mut merged = opts.clone();
        if merged.lng.is_none() {
            merged.lng = fixed.language().map(str::to_string);
        }
        if merged.ns.is_none() {
            merged.ns = fixed.namespaces().map(<[String]>::to_vec);
        }
        if merged.key_prefix.is_none() {
            merged.key_prefix = fixed.key_prefix().map(str::to_string);
        }
        self.core.facade.t_with(key, &merged)
    }

    /// The engine facade.
    #[must_use]
    pub fn i18n(&self) -> &ReactiveEngine {
        &self.core.facade
    }

    /// Readiness of the requested language/namespace combination.
    #[must_use]
    pub fn ready(&self) -> bool {
        self.core.ready()
    }

    /// True while a suspense-mode load is outstanding.
    #[must_use]
    pub fn loading(&self) -> bool {
        self.translator.is_loading()
    }
}

impl std::fmt::Debug for UseTranslation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UseTranslation")
            .field("ready", &untrack(|| self.ready()))
            .finish_non_exhaustive()
    }
}

/// Create the translation hook.
pub fn use_translation(options: UseTranslationOptions) -> UseTranslation {
    let config = use_translation_config();
    let engine = options
        .engine
        .clone()
        .or_else(|| config.as_ref().map(|c| c.engine.clone()))
        .unwrap_or_else(global);
    let facade = ReactiveEngine::wrap(&engine);

    let core = Rc::new(HookCore {
        facade,
        key_prefix: options.key_prefix,
        lng: options.lng,
        ns: options.ns,
        context_ns: config.and_then(|c| c.ns),
        suspense: options.suspense.unwrap_or(true),
    });

    // The fetcher loads (suspense mode) and resolves the fresh translator.
    let fetcher_core = Rc::clone(&core);
    let translator = Resource::new(
        untrack(|| core.derive_translator()),
        move |resolver| {
            untrack(|| {
                if !fetcher_core.ready() && fetcher_core.suspense {
                    fetcher_core.load();
                }
                resolver.resolve(fetcher_core.derive_translator());
            });
        },
    );

    let mut effects = Vec::new();

    // Not ready: suspense refetches, plain mode loads and swaps in place.
    {
        let core = Rc::clone(&core);
        let translator = translator.clone();
        effects.push(create_effect(move || {
            if !core.ready() {
                if core.suspense {
                    translator.refetch();
                } else {
                    untrack(|| {
                        core.load();
                        translator.mutate(core.derive_translator());
                    });
                }
            }
        }));
    }

    // Re-derive the translator when namespaces, language override, or key
    // prefix change (order-sensitive comparison) while ready.
    {
        let core = Rc::clone(&core);
        let translator = translator.clone();
        let previous = RefCell::new(untrack(|| {
            (core.namespaces(), core.lng_value(), core.key_prefix_value())
        }));
        effects.push(create_effect(move || {
            let current = (core.namespaces(), core.lng_value(), core.key_prefix_value());
            let ready = core.ready();
            let changed = *previous.borrow() != current;
            if ready && changed {
                translator.mutate(untrack(|| core.derive_translator()));
            }
            *previous.borrow_mut() = current;
        }));
    }

    // Language changes re-derive the bound translator.
    let language_listener = {
        let core = Rc::clone(&core);
        let translator = translator.clone();
        engine.emitter().on(move |event| {
            if matches!(event, EngineEvent::LanguageChanged(_)) {
                translator.mutate(untrack(|| core.derive_translator()));
            }
        })
    };

    UseTranslation {
        core,
        translator,
        _effects: effects,
        _language_listener: language_listener,
    }
}

/// Render-prop equivalent of the hook: run `f` with a fresh hook value.
pub fn translation<R>(options: UseTranslationOptions, f: impl FnOnce(&UseTranslation) -> R) -> R {
    let hook = use_translation(options);
    f(&hook)
}
