#![forbid(unsafe_code)]

//! Valueless dirty-token signal.
//!
//! A [`Trigger`] carries no data; it exists purely to invalidate dependents.
//! It is the adapter half of the "signal + forwarding getter" pattern:
//! reads of an imperative object first `track()` the trigger, and every
//! state-changing event on that object calls `notify()`, so reactive
//! consumers subscribe transitively without the object itself knowing
//! anything about the graph.

use crate::observable::Observable;

/// A dirty token: `track()` inside a computation, `notify()` on change.
///
/// Cloning shares the same token.
#[derive(Clone)]
pub struct Trigger {
    counter: Observable<u64>,
}

impl Trigger {
    #[must_use]
    pub fn new() -> Self {
        Self {
            counter: Observable::new(0),
        }
    }

    /// Register the running computation (if any) as a dependent.
    pub fn track(&self) {
        self.counter.with(|_| {});
    }

    /// Invalidate all dependents. Deferred and coalesced under batching.
    pub fn notify(&self) {
        self.counter.set(self.counter.peek().wrapping_add(1));
    }

    /// Number of notifications so far.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.counter.version()
    }
}

impl Default for Trigger {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Trigger")
            .field("version", &self.version())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::BatchScope;
    use crate::effect::create_effect;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn notify_reruns_tracking_effect() {
        let trigger = Trigger::new();
        let runs = Rc::new(Cell::new(0u32));

        let t = trigger.clone();
        let runs_clone = Rc::clone(&runs);
        let _fx = create_effect(move || {
            t.track();
            runs_clone.set(runs_clone.get() + 1);
        });
        assert_eq!(runs.get(), 1);

        trigger.notify();
        assert_eq!(runs.get(), 2);

        trigger.notify();
        assert_eq!(runs.get(), 3);
    }

    #[test]
    fn non_tracking_reader_unaffected() {
        let trigger = Trigger::new();
        trigger.notify();
        assert_eq!(trigger.version(), 1);
    }

    #[test]
    fn batched_notifies_coalesce() {
        let trigger = Trigger::new();
        let runs = Rc::new(Cell::new(0u32));

        let t = trigger.clone();
        let runs_clone = Rc::clone(&runs);
        let _fx = create_effect(move || {
            t.track();
            runs_clone.set(runs_clone.get() + 1);
        });

        {
            let _batch = BatchScope::new();
            trigger.notify();
            trigger.notify();
            trigger.notify();
            assert_eq!(runs.get(), 1);
        }
        assert_eq!(runs.get(), 2, "three bumps, one re-run");
    }

    #[test]
    fn clone_shares_token() {
        let a = Trigger::new();
        let b = a.clone();
        let runs = Rc::new(Cell::new(0u32));

        let t = a.clone();
        let runs_clone = Rc::clone(&runs);
        let _fx = create_effect(move || {
            t.track();
            runs_clone.set(runs_clone.get() + 1);
        });

        b.notify();
        assert_eq!(runs.get(), 2);
    }
}
