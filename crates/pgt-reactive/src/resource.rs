#![forbid(unsafe_code)]

//! Load-then-read primitive.
//!
//! A [`Resource`] holds a value produced by a fetcher that may complete
//! immediately or later. Readers track both the value and the loading
//! state; resolution flips value and state inside one batch so dependents
//! observe a single consistent transition, never `Ready` with a stale
//! value.
//!
//! The fetcher receives a [`ResourceResolver`] and calls `resolve` when the
//! work settles. A synchronous fetcher resolves before `refetch` returns; a
//! deferred one can hold the resolver and complete later. If a resource is
//! dropped while a load is in flight, the eventual resolution still lands
//! in the shared observables but has no observers left.

use std::rc::Rc;

use crate::batch::batch;
use crate::observable::Observable;

/// Loading state of a [`Resource`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResourceState {
    Ready,
    Loading,
}

/// Completion handle passed to the fetcher.
pub struct ResourceResolver<T: Clone + PartialEq + 'static> {
    value: Observable<T>,
    state: Observable<ResourceState>,
}

impl<T: Clone + PartialEq + 'static> ResourceResolver<T> {
    /// Deliver the fetched value and mark the resource ready. Value and
    /// state flip in one batch.
    pub fn resolve(self, value: T) {
        batch(|| {
            self.value.set(value);
            self.state.set(ResourceState::Ready);
        });
    }
}

/// A value produced by a (possibly deferred) fetcher.
pub struct Resource<T: Clone + PartialEq + 'static> {
    value: Observable<T>,
    state: Observable<ResourceState>,
    fetcher: Rc<dyn Fn(ResourceResolver<T>)>,
}

impl<T: Clone + PartialEq + 'static> Clone for Resource<T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            state: self.state.clone(),
            fetcher: Rc::clone(&self.fetcher),
        }
    }
}

impl<T: Clone + PartialEq + 'static> Resource<T> {
    /// Create a resource seeded with `initial` and start the first fetch.
    pub fn new(initial: T, fetcher: impl Fn(ResourceResolver<T>) + 'static) -> Self {
        let resource = Self {
            value: Observable::new(initial),
            state: Observable::new(ResourceState::Ready),
            fetcher: Rc::new(fetcher),
        };
        resource.refetch();
        resource
    }

    /// Current value, tracked. While loading this is the last resolved (or
    /// initial) value.
    #[must_use]
    pub fn get(&self) -> T {
        self.value.get()
    }

    /// Current value without tracking.
    #[must_use]
    pub fn peek(&self) -> T {
        self.value.peek()
    }

    /// Loading state, tracked.
    #[must_use]
    pub fn state(&self) -> ResourceState {
        self.state.get()
    }

    /// True while a fetch is outstanding. Tracked.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.state() == ResourceState::Loading
    }

    /// Run the fetcher again. State goes `Loading` until the resolver is
    /// called.
    pub fn refetch(&self) {
        self.state.set(ResourceState::Loading);
        let resolver = ResourceResolver {
            value: self.value.clone(),
            state: self.state.clone(),
        };
        (self.fetcher)(resolver);
    }

    /// Replace the value directly, marking the resource ready. Used when
    /// the caller already has the result and no fetch is needed.
    pub fn mutate(&self, value: T) {
        batch(|| {
            self.value.set(value);
            self.state.set(ResourceState::Ready);
        });
    }
}

impl<T: Clone + PartialEq + std::fmt::Debug + 'static> std::fmt::Debug for Resource<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resource")
            .field("value", &self.value.peek())
            .field("state", &self.state.peek())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
