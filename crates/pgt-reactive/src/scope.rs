#![forbid(unsafe_code)]

//! Ownership scopes: disposal-bound lifecycles and type-keyed context.
//!
//! # Design
//!
//! A [`Scope`] is an ownership region for reactive machinery. Effects
//! created while a scope is current are owned by it; `on_cleanup` callbacks
//! registered inside it run when it is disposed; context values provided in
//! it are visible to everything running under it (nearest provider wins).
//! Disposing a scope disposes its child scopes first, stops its effects,
//! then runs cleanups in reverse registration order — so listener
//! deregistration guards dropped by cleanups always run after the effects
//! that might still use them have stopped.
//!
//! # Invariants
//!
//! 1. Disposal is idempotent.
//! 2. Cleanups run exactly once, in reverse registration order.
//! 3. After disposal, owned effects never re-run, even for invalidations
//!    already queued in a batch.

use std::any::{Any, TypeId};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use rustc_hash::FxHashMap;

use crate::graph::Computation;

struct ScopeInner {
    parent: Option<Weak<ScopeInner>>,
    computations: RefCell<Vec<Rc<Computation>>>,
    cleanups: RefCell<Vec<Box<dyn FnOnce()>>>,
    contexts: RefCell<FxHashMap<TypeId, Rc<dyn Any>>>,
    children: RefCell<Vec<Rc<ScopeInner>>>,
    disposed: Cell<bool>,
}

thread_local! {
    static CURRENT_SCOPE: RefCell<Option<Rc<ScopeInner>>> = const { RefCell::new(None) };
}

/// Handle to an ownership scope. Cloning shares the same scope.
#[derive(Clone)]
pub struct Scope {
    inner: Rc<ScopeInner>,
}

impl Scope {
    /// Create a root scope with no parent.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(ScopeInner {
                parent: None,
                computations: RefCell::new(Vec::new()),
                cleanups: RefCell::new(Vec::new()),
                contexts: RefCell::new(FxHashMap::default()),
                children: RefCell::new(Vec::new()),
                disposed: Cell::new(false),
            }),
        }
    }

    /// Create a child of the current scope (or a root if none is current).
    /// The child is disposed automatically with its parent.
    #[must_use]
    pub fn child() -> Self {
        let parent = CURRENT_SCOPE.with(|cur| cur.borrow().clone());
        let inner = Rc::new(ScopeInner {
            parent: parent.as_ref().map(Rc::downgrade),
            computations: RefCell::new(Vec::new()),
            cleanups: RefCell::new(Vec::new()),
            contexts: RefCell::new(FxHashMap::default()),
            children: RefCell::new(Vec::new()),
            disposed: Cell::new(false),
        });
        if let Some(parent) = parent {
            parent.children.borrow_mut().push(Rc::clone(&inner));
        }
        Self { inner }
    }

    /// Run `f` with this scope current, restoring the previous scope after.
    pub fn run<R>(&self, f: impl FnOnce() -> R) -> R {
        let previous =
            CURRENT_SCOPE.with(|cur| cur.borrow_mut().replace(Rc::clone(&self.inner)));
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(f));
        CURRENT_SCOPE.with(|cur| *cur.borrow_mut() = previous);
        match result {
            Ok(out) => out,
            Err(payload) => std::panic::resume_unwind(payload),
        }
    }

    /// Dispose the scope: children first, then owned effects, then cleanups
    /// in reverse registration order. Idempotent.
    pub fn dispose(&self) {
        dispose_inner(&self.inner);
    }

    /// True once disposed.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scope")
            .field("disposed", &self.inner.disposed.get())
            .field("effects", &self.inner.computations.borrow().len())
            .field("cleanups", &self.inner.cleanups.borrow().len())
            .finish()
    }
}

fn dispose_inner(inner: &Rc<ScopeInner>) {
    if inner.disposed.replace(true) {
        return;
    }
    let children = std::mem::take(&mut *inner.children.borrow_mut());
    for child in &children {
        dispose_inner(child);
    }
    for comp in std::mem::take(&mut *inner.computations.borrow_mut()) {
        comp.dispose();
    }
    let cleanups = std::mem::take(&mut *inner.cleanups.borrow_mut());
    for cleanup in cleanups.into_iter().rev() {
        cleanup();
    }
}

/// Attach a computation to the current scope so disposal stops it.
/// No-op outside any scope.
pub(crate) fn register_computation(comp: &Rc<Computation>) {
    CURRENT_SCOPE.with(|cur| {
        if let Some(scope) = cur.borrow().as_ref() {
            scope.computations.borrow_mut().push(Rc::clone(comp));
        }
    });
}

/// Run `f` when the current scope is disposed.
///
/// Outside any scope the callback can never fire; it is dropped and a
/// warning is logged.
pub fn on_cleanup(f: impl FnOnce() + 'static) {
    CURRENT_SCOPE.with(|cur| match cur.borrow().as_ref() {
        Some(scope) => scope.cleanups.borrow_mut().push(Box::new(f)),
        None => {
            tracing::warn!(target: "pgt.reactive", "on_cleanup called outside a scope; dropped");
        }
    });
}

/// Provide a context value in the current scope, shadowing any provider of
/// the same type further up the chain. No-op (with a warning) outside a
/// scope.
pub fn provide_context<T: 'static>(value: T) {
    CURRENT_SCOPE.with(|cur| match cur.borrow().as_ref() {
        Some(scope) => {
            scope
                .contexts
                .borrow_mut()
                .insert(TypeId::of::<T>(), Rc::new(value));
        }
        None => {
            tracing::warn!(target: "pgt.reactive", "provide_context called outside a scope; dropped");
        }
    });
}

/// Look up a context value of type `T`, walking from the current scope
/// outward. Returns `None` when no provider is in scope.
#[must_use]
pub fn use_context<T: Clone + 'static>() -> Option<T> {
    let mut scope = CURRENT_SCOPE.with(|cur| cur.borrow().clone());
    while let Some(inner) = scope {
        if let Some(value) = inner.contexts.borrow().get(&TypeId::of::<T>()) {
            if let Some(typed) = value.downcast_ref::<T>() {
                return Some(typed.clone());
            }
        }
        scope = inner.parent.as_ref().and_then(Weak::upgrade);
    }
    None
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
