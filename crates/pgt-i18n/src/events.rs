#![forbid(unsafe_code)]

//! Event emitter for engine and store lifecycle events.
//!
//! # Design
//!
//! Listeners are held behind a shared `Rc` with id-tagged entries;
//! [`EventEmitter::on`] returns an RAII [`ListenerGuard`] that removes the
//! listener on drop, so deregistration is bound to the owner's lifetime
//! rather than to a manual `off` call. Dispatch snapshots the listener
//! list before calling out, so a listener may add or remove listeners
//! (including itself) without poisoning the iteration.
//!
//! # Invariants
//!
//! 1. Listeners fire in registration order.
//! 2. A dropped guard's listener never fires again.
//! 3. Emitting from inside a listener is allowed (snapshot dispatch).

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

/// Lifecycle events emitted by the engine itself.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EngineEvent {
    Initialized,
    LanguageChanged(String),
    Loaded,
}

/// Events emitted by the resource store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreEvent {
    Added { lng: String, ns: String },
    Removed { lng: String, ns: String },
}

type Listener<E> = Rc<dyn Fn(&E)>;

struct EmitterInner<E> {
    next_id: Cell<u64>,
    listeners: RefCell<Vec<(u64, Listener<E>)>>,
}

/// A shared event emitter. Cloning shares the listener list.
pub struct EventEmitter<E> {
    inner: Rc<EmitterInner<E>>,
}

impl<E> Clone for EventEmitter<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<E: 'static> EventEmitter<E> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(EmitterInner {
                next_id: Cell::new(1),
                listeners: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Register a listener. Dropping the returned guard deregisters it.
    #[must_use = "dropping the guard removes the listener"]
    pub fn on(&self, listener: impl Fn(&E) + 'static) -> ListenerGuard {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);
        self.inner
            .listeners
            .borrow_mut()
            .push((id, Rc::new(listener)));

        let weak: Weak<EmitterInner<E>> = Rc::downgrade(&self.inner);
        ListenerGuard {
            off: Some(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.listeners.borrow_mut().retain(|(lid, _)| *lid != id);
                }
            })),
        }
    }

    /// Dispatch an event to all registered listeners in registration order.
    pub fn emit(&self, event: &E) {
        let snapshot: Vec<Listener<E>> = self
            .inner
            .listeners
            .borrow()
            .iter()
            .map(|(_, l)| Rc::clone(l))
            .collect();
        for listener in snapshot {
            listener(event);
        }
    }

    /// Number of currently registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.borrow().len()
    }
}

impl<E: 'static> Default for EventEmitter<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> std::fmt::Debug for EventEmitter<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventEmitter")
            .field("listeners", &self.inner.listeners.borrow().len())
            .finish()
    }
}

/// RAII guard removing one listener on drop.
pub struct ListenerGuard {
    off: Option<Box<dyn FnOnce()>>,
}

impl ListenerGuard {
    /// Keep the listener registered for the emitter's whole lifetime.
    pub fn forget(mut self) {
        self.off = None;
    }
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        if let Some(off) = self.off.take() {
            off();
        }
    }
}

impl std::fmt::Debug for ListenerGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerGuard").finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
