#![forbid(unsafe_code)]

//! Effects and memos: the consumers of the dependency graph.
//!
//! An effect runs immediately and re-runs whenever any observable or
//! trigger it read during its last run changes. A memo is an effect whose
//! output is itself an equality-gated observable, so downstream dependents
//! re-run only when the computed value actually changes.

use std::rc::Rc;

use crate::graph::Computation;
use crate::observable::Observable;

/// Handle to a running effect.
///
/// The handle (or the scope the effect was created in) keeps the effect
/// alive; sources hold only weak references. Dropping every handle outside
/// a scope stops the effect.
#[must_use = "dropping the handle outside a scope stops the effect"]
pub struct EffectHandle {
    comp: Rc<Computation>,
}

impl Clone for EffectHandle {
    fn clone(&self) -> Self {
        Self {
            comp: Rc::clone(&self.comp),
        }
    }
}

impl EffectHandle {
    /// Permanently stop the effect. Queued invalidations become no-ops.
    pub fn dispose(&self) {
        self.comp.dispose();
    }

    /// True once [`dispose`](Self::dispose) has been called (directly or by
    /// the owning scope).
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.comp.is_disposed()
    }
}

impl std::fmt::Debug for EffectHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectHandle")
            .field("disposed", &self.comp.is_disposed())
            .finish()
    }
}

/// Create an effect: `f` runs now, and again whenever a dependency changes.
///
/// Dependencies are re-collected on every run, so conditional reads track
/// correctly. If a [`Scope`](crate::scope::Scope) is current, the effect is
/// owned by it and stops when the scope is disposed.
pub fn create_effect(f: impl FnMut() + 'static) -> EffectHandle {
    let comp = Computation::new(f);
    crate::scope::register_computation(&comp);
    comp.run();
    EffectHandle { comp }
}

/// A memoized derived value.
///
/// Reading a memo inside another computation subscribes that computation to
/// the memo's *output*, which only changes when the computed value differs
/// by `PartialEq`.
pub struct Memo<T: Clone + PartialEq + 'static> {
    value: Observable<T>,
    handle: EffectHandle,
}

impl<T: Clone + PartialEq + 'static> Clone for Memo<T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            handle: self.handle.clone(),
        }
    }
}

impl<T: Clone + PartialEq + 'static> Memo<T> {
    /// Current value, tracked.
    #[must_use]
    pub fn get(&self) -> T {
        self.value.get()
    }

    /// Current value without tracking.
    #[must_use]
    pub fn peek(&self) -> T {
        self.value.peek()
    }

    /// Handle to the underlying effect.
    #[must_use]
    pub fn handle(&self) -> &EffectHandle {
        &self.handle
    }
}

impl<T: Clone + PartialEq + std::fmt::Debug + 'static> std::fmt::Debug for Memo<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memo").field("value", &self.peek()).finish()
    }
}

/// Create a memo from a computation.
///
/// `f` runs once immediately to seed the value and again whenever any
/// dependency changes; the output observable only notifies when the new
/// value differs from the old.
pub fn create_memo<T: Clone + PartialEq + 'static>(mut f: impl FnMut() -> T + 'static) -> Memo<T> {
    use std::cell::RefCell;

    let slot: Rc<RefCell<Option<Observable<T>>>> = Rc::new(RefCell::new(None));
    let slot_inner = Rc::clone(&slot);
    let handle = create_effect(move || {
        let next = f();
        let mut guard = slot_inner.borrow_mut();
        match &*guard {
            Some(obs) => obs.set(next),
            None => *guard = Some(Observable::new(next)),
        }
    });
    // The effect ran synchronously above, so the slot is seeded.
    let value = slot
        .borrow()
        .clone()
        .expect("memo computation did not run");
    Memo { value, handle }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::BatchScope;
    use crate::observable::Observable;
    use std::cell::Cell;

    #[test]
    fn effect_runs_immediately() {
        let count = Rc::new(Cell::new(0u32));
        let count_clone = Rc::clone(&count);
        let _fx = create_effect(move || count_clone.set(count_clone.get() + 1));
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn effect_reruns_on_dependency_change() {
        let obs = Observable::new(0);
        let seen = Rc::new(Cell::new(-1));

        let obs_inner = obs.clone();
        let seen_clone = Rc::clone(&seen);
        let _fx = create_effect(move || seen_clone.set(obs_inner.get()));
        assert_eq!(seen.get(), 0);

        obs.set(7);
        assert_eq!(seen.get(), 7);

        obs.set(9);
        assert_eq!(seen.get(), 9);
    }

    #[test]
    fn effect_ignores_equal_writes() {
        let obs = Observable::new(5);
        let runs = Rc::new(Cell::new(0u32));

        let obs_inner = obs.clone();
        let runs_clone = Rc::clone(&runs);
        let _fx = create_effect(move || {
            obs_inner.get();
            runs_clone.set(runs_clone.get() + 1);
        });
        assert_eq!(runs.get(), 1);

        obs.set(5); // No change, no re-run.
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn effect_dependencies_are_dynamic() {
        let gate = Observable::new(true);
        let a = Observable::new(0);
        let b = Observable::new(0);
        let runs = Rc::new(Cell::new(0u32));

        let gate_inner = gate.clone();
        let a_inner = a.clone();
        let b_inner = b.clone();
        let runs_clone = Rc::clone(&runs);
        let _fx = create_effect(move || {
            if gate_inner.get() {
                a_inner.get();
            } else {
                b_inner.get();
            }
            runs_clone.set(runs_clone.get() + 1);
        });
        assert_eq!(runs.get(), 1);

        a.set(1);
        assert_eq!(runs.get(), 2, "a is a dependency while gate is true");

        gate.set(false);
        assert_eq!(runs.get(), 3);

        a.set(2);
        assert_eq!(runs.get(), 3, "a is no longer a dependency");

        b.set(1);
        assert_eq!(runs.get(), 4, "b became a dependency");
    }

    #[test]
    fn disposed_effect_stops_rerunning() {
        let obs = Observable::new(0);
        let runs = Rc::new(Cell::new(0u32));

        let obs_inner = obs.clone();
        let runs_clone = Rc::clone(&runs);
        let fx = create_effect(move || {
            obs_inner.get();
            runs_clone.set(runs_clone.get() + 1);
        });
        assert_eq!(runs.get(), 1);

        fx.dispose();
        obs.set(1);
        assert_eq!(runs.get(), 1);
        assert!(fx.is_disposed());
    }

    #[test]
    fn effect_coalesces_inside_batch() {
        let a = Observable::new(0);
        let b = Observable::new(0);
        let runs = Rc::new(Cell::new(0u32));

        let a_inner = a.clone();
        let b_inner = b.clone();
        let runs_clone = Rc::clone(&runs);
        let _fx = create_effect(move || {
            a_inner.get();
            b_inner.get();
            runs_clone.set(runs_clone.get() + 1);
        });
        assert_eq!(runs.get(), 1);

        {
            let _batch = BatchScope::new();
            a.set(1);
            b.set(2);
            a.set(3);
            assert_eq!(runs.get(), 1, "re-runs deferred inside batch");
        }
        assert_eq!(runs.get(), 2, "one coalesced re-run per batch");
    }

    #[test]
    fn memo_caches_and_gates_on_equality() {
        let obs = Observable::new(4);
        let memo_runs = Rc::new(Cell::new(0u32));
        let reader_runs = Rc::new(Cell::new(0u32));

        let obs_inner = obs.clone();
        let memo_runs_clone = Rc::clone(&memo_runs);
        let parity = create_memo(move || {
            memo_runs_clone.set(memo_runs_clone.get() + 1);
            obs_inner.get() % 2
        });
        assert_eq!(parity.get(), 0);
        assert_eq!(memo_runs.get(), 1);

        let parity_inner = parity.clone();
        let reader_runs_clone = Rc::clone(&reader_runs);
        let _fx = create_effect(move || {
            parity_inner.get();
            reader_runs_clone.set(reader_runs_clone.get() + 1);
        });
        assert_eq!(reader_runs.get(), 1);

        obs.set(6); // Parity unchanged: memo recomputes, reader does not.
        assert_eq!(memo_runs.get(), 2);
        assert_eq!(reader_runs.get(), 1);

        obs.set(7); // Parity flips: reader re-runs.
        assert_eq!(memo_runs.get(), 3);
        assert_eq!(reader_runs.get(), 2);
        assert_eq!(parity.peek(), 1);
    }

    #[test]
    fn memo_of_memo_chains() {
        let obs = Observable::new(1);
        let obs_inner = obs.clone();
        let doubled = create_memo(move || obs_inner.get() * 2);
        let doubled_inner = doubled.clone();
        let quadrupled = create_memo(move || doubled_inner.get() * 2);

        assert_eq!(quadrupled.get(), 4);
        obs.set(3);
        assert_eq!(quadrupled.get(), 12);
    }

    #[test]
    fn untracked_read_inside_effect() {
        let tracked = Observable::new(0);
        let ignored = Observable::new(0);
        let runs = Rc::new(Cell::new(0u32));

        let tracked_inner = tracked.clone();
        let ignored_inner = ignored.clone();
        let runs_clone = Rc::clone(&runs);
        let _fx = create_effect(move || {
            tracked_inner.get();
            crate::graph::untrack(|| ignored_inner.get());
            runs_clone.set(runs_clone.get() + 1);
        });
        assert_eq!(runs.get(), 1);

        ignored.set(5);
        assert_eq!(runs.get(), 1, "untracked read is not a dependency");

        tracked.set(5);
        assert_eq!(runs.get(), 2);
    }
}
