#![forbid(unsafe_code)]

//! Dependency-graph core: computations, source tracking, and `untrack`.
//!
//! # Design
//!
//! The graph is demand-driven. A [`Computation`] (the engine behind effects
//! and memos) re-collects its dependencies on every run: while its body
//! executes, it is installed as the *current* computation in a thread-local
//! cell, and every source read during that window registers the computation
//! as a dependent. Sources store `(Weak<Computation>, generation)` pairs;
//! the generation tag identifies which run produced the registration, so
//! registrations left over from an earlier run are pruned lazily the next
//! time the source notifies — the same lazy pruning the subscriber list
//! uses for dropped guards.
//!
//! # Invariants
//!
//! 1. A computation's dependency set is exactly the sources read during its
//!    most recent run.
//! 2. A disposed computation is never re-run, even if a notification for it
//!    is already queued in a batch.
//! 3. Notifying a source while one of its dependents is mid-run does not
//!    re-enter that dependent (the run is skipped and logged).

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use rustc_hash::FxHashSet;

/// A re-runnable reactive computation. Effects and memos wrap one of these.
pub(crate) struct Computation {
    body: RefCell<Box<dyn FnMut()>>,
    /// Incremented at the start of each run; tags dependency registrations.
    generation: Cell<u64>,
    /// Source ids read during the current run (dedup guard).
    reads: RefCell<FxHashSet<u64>>,
    disposed: Cell<bool>,
    running: Cell<bool>,
}

thread_local! {
    static CURRENT: RefCell<Option<Rc<Computation>>> = const { RefCell::new(None) };
    static NEXT_SOURCE_ID: Cell<u64> = const { Cell::new(1) };
}

impl Computation {
    pub(crate) fn new(body: impl FnMut() + 'static) -> Rc<Self> {
        Rc::new(Self {
            body: RefCell::new(Box::new(body)),
            generation: Cell::new(0),
            reads: RefCell::new(FxHashSet::default()),
            disposed: Cell::new(false),
            running: Cell::new(false),
        })
    }

    pub(crate) fn is_disposed(&self) -> bool {
        self.disposed.get()
    }

    pub(crate) fn dispose(&self) {
        self.disposed.set(true);
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation.get()
    }

    /// Run the computation body, collecting dependencies fresh.
    pub(crate) fn run(self: &Rc<Self>) {
        if self.disposed.get() {
            return;
        }
        if self.running.get() {
            // A source written from inside this computation's own body
            // tried to re-enter it. Skipping is the only safe option.
            tracing::debug!(target: "pgt.reactive", "re-entrant computation run skipped");
            return;
        }

        self.generation.set(self.generation.get() + 1);
        self.reads.borrow_mut().clear();
        self.running.set(true);

        let previous = CURRENT.with(|cur| cur.borrow_mut().replace(Rc::clone(self)));
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            (self.body.borrow_mut())();
        }));
        CURRENT.with(|cur| *cur.borrow_mut() = previous);
        self.running.set(false);

        if let Err(payload) = result {
            std::panic::resume_unwind(payload);
        }
    }

    /// Schedule a re-run: immediate outside a batch, coalesced per
    /// computation inside one.
    ///
    /// Deferred entries are generation-stamped: if the computation already
    /// re-ran by the time the batch flushes (a cascading notification got
    /// to it first), the stale entry is skipped — values are updated
    /// eagerly, so the earlier run already observed the final state.
    pub(crate) fn invalidate(self: &Rc<Self>) {
        if self.disposed.get() {
            return;
        }
        if crate::batch::is_batching() {
            let key = Rc::as_ptr(self) as usize;
            let this = Rc::clone(self);
            let generation = self.generation.get();
            crate::batch::defer_or_run_keyed(key, move || {
                if this.generation.get() == generation {
                    this.run();
                }
            });
        } else {
            self.run();
        }
    }
}

/// Fresh id for a source. Ids are per-thread and never reused.
pub(crate) fn next_source_id() -> u64 {
    NEXT_SOURCE_ID.with(|id| {
        let v = id.get();
        id.set(v + 1);
        v
    })
}

/// Per-source list of dependent computations.
pub(crate) struct DependentList {
    id: u64,
    entries: RefCell<Vec<(Weak<Computation>, u64)>>,
}

impl DependentList {
    pub(crate) fn new() -> Self {
        Self {
            id: next_source_id(),
            entries: RefCell::new(Vec::new()),
        }
    }

    /// Register the currently-running computation (if any) as a dependent.
    pub(crate) fn track(&self) {
        CURRENT.with(|cur| {
            if let Some(comp) = cur.borrow().as_ref() {
                // One registration per source per run.
                if comp.reads.borrow_mut().insert(self.id) {
                    self.entries
                        .borrow_mut()
                        .push((Rc::downgrade(comp), comp.generation()));
                }
            }
        });
    }

    /// Invalidate all live dependents, pruning dead and stale entries.
    pub(crate) fn notify(&self) {
        let live: Vec<Rc<Computation>> = {
            let mut entries = self.entries.borrow_mut();
            entries.retain(|(weak, generation)| {
                weak.upgrade()
                    .is_some_and(|c| !c.is_disposed() && c.generation() == *generation)
            });
            entries
                .iter()
                .filter_map(|(weak, _)| weak.upgrade())
                .collect()
        };
        for comp in live {
            comp.invalidate();
        }
    }

    /// Number of registrations, live or not (pruned lazily on notify).
    pub(crate) fn len(&self) -> usize {
        self.entries.borrow().len()
    }
}

/// Run `f` with dependency collection suspended: source reads inside `f`
/// do not register the surrounding computation.
pub fn untrack<R>(f: impl FnOnce() -> R) -> R {
    let previous = CURRENT.with(|cur| cur.borrow_mut().take());
    let out = f();
    CURRENT.with(|cur| *cur.borrow_mut() = previous);
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
