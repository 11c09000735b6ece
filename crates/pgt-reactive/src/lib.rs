#![forbid(unsafe_code)]

//! Fine-grained reactive primitives for Polyglot.
//!
//! Provides the demand-driven reactive substrate the translation bindings
//! are built on: shared observable values, valueless trigger signals,
//! auto-tracking effects and memos, batch coalescing, ownership scopes
//! with cleanup-on-disposal, type-keyed context, and a load-then-read
//! resource primitive.
//!
//! # Role in Polyglot
//! `pgt-reactive` knows nothing about translation. It is the generic
//! adapter layer that lets an imperative, event-emitting object be
//! observed by pull-based consumers: a [`Trigger`] is bumped by event
//! listeners, reads touch the trigger before delegating, and dependents
//! re-evaluate exactly when the underlying state changed.
//!
//! # How it fits in the system
//! `pgt` wraps a `pgt-i18n` engine with these primitives. Nothing here
//! depends on the engine or on markup, keeping the reactive layer
//! reusable and testable on its own.

pub mod batch;
pub mod effect;
pub mod graph;
pub mod observable;
pub mod resource;
pub mod scope;
pub mod source;
pub mod trigger;

pub use batch::{BatchScope, batch, is_batching};
pub use effect::{EffectHandle, Memo, create_effect, create_memo};
pub use graph::untrack;
pub use observable::{Observable, Subscription};
pub use resource::{Resource, ResourceResolver, ResourceState};
pub use scope::{Scope, on_cleanup, provide_context, use_context};
pub use source::Source;
pub use trigger::Trigger;
