#![forbid(unsafe_code)]

//! Internationalization engine for Polyglot.
//!
//! Provides translation lookup with namespace, context, plural, and
//! fallback-language resolution, a JSON resource store with lifecycle
//! events, variable interpolation, text-direction lookup, and a pluggable
//! backend for loading bundles that are not inlined.
//!
//! # Role in Polyglot
//! `pgt-i18n` is the imperative half of the system: an event-emitting,
//! mutable engine with no knowledge of reactivity. `pgt` wraps it in a
//! reactive facade; anything that only needs translations can depend on
//! this crate alone.
//!
//! # How it fits in the system
//! The engine emits `Initialized` / `LanguageChanged` / `Loaded` events
//! and the store emits `Added` / `Removed`; observers (like the reactive
//! facade) subscribe to exactly those five to know when any
//! translation-affecting state changed.

pub mod backend;
pub mod direction;
pub mod engine;
pub mod error;
pub mod events;
pub mod global;
pub mod interpolate;
pub mod options;
pub mod plural;
pub mod store;
pub mod translator;

pub use backend::{Backend, MapBackend};
pub use direction::{Direction, direction};
pub use engine::{Engine, Services};
pub use error::{BackendError, EngineError, Result};
pub use events::{EngineEvent, EventEmitter, ListenerGuard, StoreEvent};
pub use global::global;
pub use interpolate::{FormatFn, Interpolator};
pub use options::{EngineOptions, InterpolationOptions};
pub use plural::{PluralCategory, PluralRule};
pub use store::ResourceStore;
pub use translator::{FixedT, TranslateOptions};
