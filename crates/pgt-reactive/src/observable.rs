#![forbid(unsafe_code)]

//! Observable value wrapper with change notification, version tracking,
//! and auto-tracking reads.
//!
//! # Design
//!
//! [`Observable<T>`] wraps a value of type `T` in shared, reference-counted
//! storage (`Rc<RefCell<..>>`). When the value changes (determined by
//! `PartialEq`), all live subscribers are notified in registration order
//! and every computation that read the value during its last run is
//! invalidated. Reading inside an effect or memo registers that computation
//! as a dependent; reading outside any computation is a plain read.
//!
//! # Performance
//!
//! | Operation     | Complexity                 |
//! |---------------|----------------------------|
//! | `get()`       | O(1)                       |
//! | `set()`       | O(S + D), S = subscribers, D = dependents |
//! | `subscribe()` | O(1) amortized             |
//!
//! # Failure Modes
//!
//! - **Re-entrant set**: calling `set()` from within a subscriber callback
//!   of the same observable will panic (RefCell borrow rules). Re-entrant
//!   mutations indicate a design bug in the subscriber graph.
//! - **Subscriber leak**: if `Subscription` guards are stored indefinitely
//!   without being dropped, callbacks accumulate. Dead weak references are
//!   cleaned lazily during `notify()`.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::graph::DependentList;

/// A subscriber callback stored as a strong `Rc` internally, handed out
/// as `Weak` to the observable.
type CallbackRc<T> = Rc<dyn Fn(&T)>;
type CallbackWeak<T> = Weak<dyn Fn(&T)>;

/// Shared interior for [`Observable<T>`].
struct ObservableInner<T> {
    value: T,
    version: u64,
    /// Subscribers stored as weak references. Dead entries are pruned on notify.
    subscribers: Vec<CallbackWeak<T>>,
}

/// A shared, version-tracked value with change notification.
///
/// Cloning an `Observable` creates a new handle to the **same** inner state:
/// both handles see the same value and share subscribers and dependents.
///
/// # Invariants
///
/// 1. `version` increments by exactly 1 on each value-changing mutation.
/// 2. `set(v)` where `v == current` is a no-op.
/// 3. Subscribers are notified in registration order.
/// 4. Dead subscribers (dropped [`Subscription`] guards) are pruned lazily.
pub struct Observable<T> {
    inner: Rc<ObservableHolder<T>>,
}

struct ObservableHolder<T> {
    state: RefCell<ObservableInner<T>>,
    deps: DependentList,
}

// Manual Clone: shares the same Rc.
impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.borrow();
        f.debug_struct("Observable")
            .field("value", &state.value)
            .field("version", &state.version)
            .field("subscriber_count", &state.subscribers.len())
            .finish()
    }
}

impl<T: Clone + PartialEq + 'static> Observable<T> {
    /// Create a new observable with the given initial value.
    ///
    /// The initial version is 0 and no subscribers are registered.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(ObservableHolder {
                state: RefCell::new(ObservableInner {
                    value,
                    version: 0,
                    subscribers: Vec::new(),
                }),
                deps: DependentList::new(),
            }),
        }
    }

    /// Get a clone of the current value, registering the running
    /// computation (if any) as a dependent.
    #[must_use]
    pub fn get(&self) -> T {
        self.inner.deps.track();
        self.inner.state.borrow().value.clone()
    }

    /// Get a clone of the current value without dependency tracking.
    #[must_use]
    pub fn peek(&self) -> T {
        self.inner.state.borrow().value.clone()
    }

    /// Access the current value by reference without cloning. Tracks.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.inner.deps.track();
        f(&self.inner.state.borrow().value)
    }

    /// Set a new value. If the new value differs from the current value
    /// (by `PartialEq`), the version is incremented, all live subscribers
    /// are notified, and dependent computations are invalidated.
    pub fn set(&self, value: T) {
        let changed = {
            let mut state = self.inner.state.borrow_mut();
            if state.value == value {
                return;
            }
            state.value = value;
            state.version += 1;
            true
        };
        if changed {
            self.notify();
        }
    }

    /// Modify the value in place via a closure. If the value changes
    /// (compared by `PartialEq` against a snapshot), the version is
    /// incremented and subscribers and dependents are notified.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        let changed = {
            let mut state = self.inner.state.borrow_mut();
            let old = state.value.clone();
            f(&mut state.value);
            if state.value != old {
                state.version += 1;
                true
            } else {
                false
            }
        };
        if changed {
            self.notify();
        }
    }

    /// Subscribe to value changes. The callback is invoked with a reference
    /// to the new value each time it changes.
    ///
    /// Returns a [`Subscription`] guard. Dropping the guard unsubscribes
    /// the callback (it will not be called after drop, though it may still
    /// be in the subscriber list until the next `notify()` prunes it).
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        let strong: CallbackRc<T> = Rc::new(callback);
        let weak = Rc::downgrade(&strong);
        self.inner.state.borrow_mut().subscribers.push(weak);
        // Wrap in a holder that can be type-erased as `dyn Any`, since
        // `Rc<dyn Fn(&T)>` itself cannot directly coerce to `Rc<dyn Any>`.
        Subscription {
            _guard: Box::new(strong),
        }
    }

    /// Current version number. Increments by 1 on each value-changing
    /// mutation. Useful for dirty-checking.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.state.borrow().version
    }

    /// Number of currently registered subscribers (including dead ones
    /// not yet pruned).
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.state.borrow().subscribers.len()
    }

    /// True if both handles point at the same inner state.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Notify live subscribers, prune dead ones, and invalidate dependent
    /// computations.
    ///
    /// If a batch scope is active (see [`crate::batch::BatchScope`]),
    /// subscriber notifications and dependent re-runs are deferred until
    /// the batch exits, coalesced per callback/computation.
    fn notify(&self) {
        // Collect live callbacks first (to avoid holding the borrow during calls).
        let callbacks: Vec<CallbackRc<T>> = {
            let mut state = self.inner.state.borrow_mut();
            state.subscribers.retain(|w| w.strong_count() > 0);
            state
                .subscribers
                .iter()
                .filter_map(|w| w.upgrade())
                .collect()
        };

        crate::batch::record_sources_changed(1);

        if !callbacks.is_empty() {
            if crate::batch::is_batching() {
                // Defer each callback to the batch queue, keyed so repeated
                // mutations of the same observable coalesce.
                for cb in callbacks {
                    let callback_key = Rc::as_ptr(&cb) as *const () as usize;
                    let source = self.clone();
                    crate::batch::defer_or_run_keyed(callback_key, move || {
                        let latest = source.peek();
                        cb(&latest);
                    });
                }
            } else {
                // Clone the value once for all callbacks and fire.
                let value = self.inner.state.borrow().value.clone();
                for cb in &callbacks {
                    cb(&value);
                }
            }
        }

        // Dependent computations defer themselves when batching.
        self.inner.deps.notify();
    }
}

impl<T: Clone + PartialEq + Default + 'static> Default for Observable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

/// RAII guard for a subscriber callback.
///
/// Dropping the `Subscription` causes the associated callback to become
/// unreachable (the strong `Rc` is dropped, so the `Weak` in the
/// observable's subscriber list will fail to upgrade on the next
/// notification cycle).
pub struct Subscription {
    /// Type-erased strong reference keeping the callback `Rc` alive.
    _guard: Box<dyn std::any::Any>,
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn get_set_basic() {
        let obs = Observable::new(42);
        assert_eq!(obs.get(), 42);
        assert_eq!(obs.version(), 0);

        obs.set(99);
        assert_eq!(obs.get(), 99);
        assert_eq!(obs.version(), 1);
    }

    #[test]
    fn no_change_no_version_bump() {
        let obs = Observable::new(42);
        obs.set(42); // Same value.
        assert_eq!(obs.version(), 0);
    }

    #[test]
    fn with_access() {
        let obs = Observable::new(vec![1, 2, 3]);
        let sum = obs.with(|v| v.iter().sum::<i32>());
        assert_eq!(sum, 6);
    }

    #[test]
    fn peek_matches_get() {
        let obs = Observable::new("x".to_string());
        assert_eq!(obs.peek(), obs.get());
    }

    #[test]
    fn update_mutates_in_place() {
        let obs = Observable::new(vec![1, 2, 3]);
        obs.update(|v| v.push(4));
        assert_eq!(obs.get(), vec![1, 2, 3, 4]);
        assert_eq!(obs.version(), 1);
    }

    #[test]
    fn update_no_change_no_bump() {
        let obs = Observable::new(10);
        obs.update(|v| {
            *v = 10; // Same value.
        });
        assert_eq!(obs.version(), 0);
    }

    #[test]
    fn change_notification() {
        let obs = Observable::new(0);
        let count = Rc::new(Cell::new(0u32));
        let count_clone = Rc::clone(&count);

        let _sub = obs.subscribe(move |_val| {
            count_clone.set(count_clone.get() + 1);
        });

        obs.set(1);
        assert_eq!(count.get(), 1);

        obs.set(2);
        assert_eq!(count.get(), 2);

        // Same value — no notification.
        obs.set(2);
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn subscriber_receives_new_value() {
        let obs = Observable::new(0);
        let last_seen = Rc::new(Cell::new(0));
        let last_clone = Rc::clone(&last_seen);

        let _sub = obs.subscribe(move |val| {
            last_clone.set(*val);
        });

        obs.set(42);
        assert_eq!(last_seen.get(), 42);

        obs.set(99);
        assert_eq!(last_seen.get(), 99);
    }

    #[test]
    fn subscription_drop_unsubscribes() {
        let obs = Observable::new(0);
        let count = Rc::new(Cell::new(0u32));
        let count_clone = Rc::clone(&count);

        let sub = obs.subscribe(move |_val| {
            count_clone.set(count_clone.get() + 1);
        });

        obs.set(1);
        assert_eq!(count.get(), 1);

        drop(sub);

        obs.set(2);
        // Callback should NOT have been called.
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn multiple_subscribers() {
        let obs = Observable::new(0);
        let a = Rc::new(Cell::new(0u32));
        let b = Rc::new(Cell::new(0u32));
        let a_clone = Rc::clone(&a);
        let b_clone = Rc::clone(&b);

        let _sub_a = obs.subscribe(move |_| a_clone.set(a_clone.get() + 1));
        let _sub_b = obs.subscribe(move |_| b_clone.set(b_clone.get() + 1));

        obs.set(1);
        assert_eq!(a.get(), 1);
        assert_eq!(b.get(), 1);

        obs.set(2);
        assert_eq!(a.get(), 2);
        assert_eq!(b.get(), 2);
    }

    #[test]
    fn version_increment() {
        let obs = Observable::new("hello".to_string());
        assert_eq!(obs.version(), 0);

        obs.set("world".to_string());
        assert_eq!(obs.version(), 1);

        obs.set("!".to_string());
        assert_eq!(obs.version(), 2);

        // Same value, no increment.
        obs.set("!".to_string());
        assert_eq!(obs.version(), 2);
    }

    #[test]
    fn clone_shares_state() {
        let obs1 = Observable::new(0);
        let obs2 = obs1.clone();

        obs1.set(42);
        assert_eq!(obs2.get(), 42);
        assert_eq!(obs2.version(), 1);

        obs2.set(99);
        assert_eq!(obs1.get(), 99);
        assert_eq!(obs1.version(), 2);
    }

    #[test]
    fn clone_shares_subscribers() {
        let obs1 = Observable::new(0);
        let count = Rc::new(Cell::new(0u32));
        let count_clone = Rc::clone(&count);

        let _sub = obs1.subscribe(move |_| count_clone.set(count_clone.get() + 1));

        let obs2 = obs1.clone();
        obs2.set(1);
        assert_eq!(count.get(), 1); // Subscriber sees change via clone.
    }

    #[test]
    fn subscriber_count() {
        let obs = Observable::new(0);
        assert_eq!(obs.subscriber_count(), 0);

        let _s1 = obs.subscribe(|_| {});
        assert_eq!(obs.subscriber_count(), 1);

        let s2 = obs.subscribe(|_| {});
        assert_eq!(obs.subscriber_count(), 2);

        drop(s2);
        // Dead subscriber not yet pruned.
        assert_eq!(obs.subscriber_count(), 2);

        // Trigger notify to prune dead.
        obs.set(1);
        assert_eq!(obs.subscriber_count(), 1);
    }

    #[test]
    fn debug_format() {
        let obs = Observable::new(42);
        let dbg = format!("{:?}", obs);
        assert!(dbg.contains("Observable"));
        assert!(dbg.contains("42"));
        assert!(dbg.contains("version"));
    }

    #[test]
    fn notification_order_is_registration_order() {
        let obs = Observable::new(0);
        let log = Rc::new(RefCell::new(Vec::new()));

        let log1 = Rc::clone(&log);
        let _s1 = obs.subscribe(move |_| log1.borrow_mut().push('A'));

        let log2 = Rc::clone(&log);
        let _s2 = obs.subscribe(move |_| log2.borrow_mut().push('B'));

        let log3 = Rc::clone(&log);
        let _s3 = obs.subscribe(move |_| log3.borrow_mut().push('C'));

        obs.set(1);
        assert_eq!(*log.borrow(), vec!['A', 'B', 'C']);
    }

    #[test]
    fn many_set_calls_version_monotonic() {
        let obs = Observable::new(0);
        for i in 1..=100 {
            obs.set(i);
        }
        assert_eq!(obs.version(), 100);
        assert_eq!(obs.get(), 100);
    }

    #[test]
    fn batch_delta_propagates_atomically_without_stale_intermediate_values() {
        let rows = Observable::new(vec!["r0".to_string()]);
        let seen = Rc::new(RefCell::new(Vec::<Vec<String>>::new()));
        let seen_clone = Rc::clone(&seen);
        let _sub = rows.subscribe(move |current| seen_clone.borrow_mut().push(current.clone()));

        {
            let _batch = crate::batch::BatchScope::new();
            rows.set(vec!["r1".to_string()]);
            rows.set(vec!["r1".to_string(), "r2".to_string()]);
            rows.update(|current| current.push("r3".to_string()));
            assert!(
                seen.borrow().is_empty(),
                "callbacks must be deferred until batch exit"
            );
        }

        let snapshots = seen.borrow();
        assert_eq!(
            snapshots.len(),
            1,
            "batched updates should coalesce to one invalidation"
        );
        assert_eq!(
            snapshots[0],
            vec!["r1".to_string(), "r2".to_string(), "r3".to_string()],
            "subscriber must observe only final state"
        );
    }

    #[test]
    fn independent_observables_do_not_cross_notify() {
        let a = Observable::new(vec!["a".to_string()]);
        let b = Observable::new(vec!["b".to_string()]);
        let a_hits = Rc::new(Cell::new(0u32));
        let b_hits = Rc::new(Cell::new(0u32));
        let a_hits_clone = Rc::clone(&a_hits);
        let b_hits_clone = Rc::clone(&b_hits);

        let _sub_a = a.subscribe(move |_| a_hits_clone.set(a_hits_clone.get() + 1));
        let _sub_b = b.subscribe(move |_| b_hits_clone.set(b_hits_clone.get() + 1));

        a.set(vec!["a2".to_string()]);
        assert_eq!(a_hits.get(), 1);
        assert_eq!(b_hits.get(), 0);
    }

    #[test]
    fn string_observable() {
        let obs = Observable::new(String::new());
        let changes = Rc::new(Cell::new(0u32));
        let changes_clone = Rc::clone(&changes);

        let _sub = obs.subscribe(move |_| changes_clone.set(changes_clone.get() + 1));

        obs.set("hello".to_string());
        obs.set("hello".to_string()); // Same, no notify.
        obs.set("world".to_string());

        assert_eq!(changes.get(), 2);
        assert_eq!(obs.version(), 2);
    }
}
