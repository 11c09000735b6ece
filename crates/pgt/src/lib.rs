#![forbid(unsafe_code)]

//! Polyglot: reactive internationalization bindings.
//!
//! This crate is the public surface. It connects the imperative engine
//! (`pgt-i18n`) to the fine-grained reactive substrate (`pgt-reactive`):
//!
//! - [`ReactiveEngine`] — a facade exposing every engine attribute and
//!   lookup as a reactive read, invalidated exactly when the underlying
//!   engine changes (language change, resource add/remove, namespace
//!   load).
//! - [`use_translation`] — a hook returning a bound translator, the
//!   facade, and a readiness flag, with suspense or callback loading.
//! - [`translation`] — render-prop form of the hook.
//! - [`trans`] / [`create_trans`] — rich-content translation: placeholder
//!   markup in a translated string rebuilt into a content tree with
//!   caller-supplied elements, components, and strings.
//! - [`provide_translation`] — context provider binding an engine and
//!   default namespaces to a subtree.

pub mod context;
mod lookup_cache;
pub mod reactive_engine;
pub mod trans;
pub mod use_translation;

pub use context::{TranslationConfig, provide_translation, use_translation_config};
pub use reactive_engine::ReactiveEngine;
pub use trans::{
    ComponentFn, ComponentRegistry, ComponentSlot, Slot, Slots, TransProps, TranslateFn, Values,
    create_trans, nodes_to_string, provide_components, trans,
};
pub use use_translation::{UseTranslation, UseTranslationOptions, translation, use_translation};

// Curated re-exports so applications can depend on `pgt` alone.
pub use pgt_i18n::{
    Backend, Direction, Engine, EngineEvent, EngineOptions, FixedT, MapBackend, StoreEvent,
    TranslateOptions, global,
};
pub use pgt_markup::{Element, Node};
pub use pgt_reactive::{
    BatchScope, Observable, Scope, Source, batch, create_effect, create_memo, on_cleanup, untrack,
};
