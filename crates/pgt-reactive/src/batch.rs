#![forbid(unsafe_code)]

//! Batch update coalescing for reactive notifications.
//!
//! When several sources are mutated in rapid succession, dependents would
//! re-run once per mutation. Batch coalescing defers all notifications
//! until the batch scope exits, then fires each unique dependent at most
//! once with the final state.
//!
//! # Usage
//!
//! ```ignore
//! use pgt_reactive::{BatchScope, Observable};
//!
//! let x = Observable::new(0);
//! let y = Observable::new(0);
//!
//! {
//!     let _batch = BatchScope::new();
//!     x.set(1);  // notification deferred
//!     y.set(2);  // notification deferred
//!     x.set(3);  // notification deferred (coalesced with first x.set)
//! }  // all notifications fire here; x dependents run once, seeing 3
//! ```
//!
//! # Invariants
//!
//! 1. Nested batches are supported: only the outermost scope triggers flush.
//! 2. Within a batch, reads always return the latest value (values are
//!    updated immediately, only notifications are deferred).
//! 3. After a batch exits, all dependents see the final state, never an
//!    intermediate state.
//! 4. Flush calls deferred entries in the order they were first enqueued;
//!    a keyed entry replaced later keeps its original queue position.
//!
//! # Failure Modes
//!
//! - **Callback panics during flush**: remaining entries still run. The
//!   first panic is re-raised after all entries have been attempted.

use std::cell::RefCell;

use tracing::{info, info_span};
use web_time::Instant;

/// A deferred notification: fires one dependent with the latest value.
type DeferredNotify = Box<dyn FnOnce()>;

/// Deferred entry, optionally keyed for in-batch coalescing.
struct DeferredEntry {
    key: Option<usize>,
    notify: DeferredNotify,
}

impl DeferredEntry {
    fn unkeyed(notify: DeferredNotify) -> Self {
        Self { key: None, notify }
    }

    fn keyed(key: usize, notify: DeferredNotify) -> Self {
        Self {
            key: Some(key),
            notify,
        }
    }
}

/// Thread-local batch context.
struct BatchContext {
    /// Nesting depth. Only flush when this reaches 0.
    depth: u32,
    /// Queued notifications to fire on flush.
    deferred: Vec<DeferredEntry>,
    /// Number of source mutations coalesced into this batch.
    sources_changed: u64,
}

thread_local! {
    static BATCH_CTX: RefCell<Option<BatchContext>> = const { RefCell::new(None) };
}

/// Returns true if a batch is currently active on this thread.
pub fn is_batching() -> bool {
    BATCH_CTX.with(|ctx| ctx.borrow().is_some())
}

/// Enqueue a deferred notification to fire when the current batch exits.
///
/// If no batch is active, the notification fires immediately.
///
/// Returns `true` if the notification was deferred, `false` if it fired
/// immediately.
pub fn defer_or_run(f: impl FnOnce() + 'static) -> bool {
    BATCH_CTX.with(|ctx| {
        let mut guard = ctx.borrow_mut();
        if let Some(ref mut batch) = *guard {
            batch.deferred.push(DeferredEntry::unkeyed(Box::new(f)));
            true
        } else {
            drop(guard); // Release borrow before calling f.
            f();
            false
        }
    })
}

/// Enqueue a deferred notification keyed by `key`.
///
/// If the key already exists in the current batch, the previously queued
/// callback is replaced so the latest callback wins while preserving the
/// original enqueue order.
pub fn defer_or_run_keyed(key: usize, f: impl FnOnce() + 'static) -> bool {
    BATCH_CTX.with(|ctx| {
        let mut guard = ctx.borrow_mut();
        if let Some(ref mut batch) = *guard {
            if let Some(entry) = batch
                .deferred
                .iter_mut()
                .find(|entry| entry.key == Some(key))
            {
                entry.notify = Box::new(f);
            } else {
                batch.deferred.push(DeferredEntry::keyed(key, Box::new(f)));
            }
            true
        } else {
            drop(guard); // Release borrow before calling f.
            f();
            false
        }
    })
}

/// Record source-level changes while a batch is active.
pub fn record_sources_changed(sources: u64) {
    if sources == 0 {
        return;
    }
    BATCH_CTX.with(|ctx| {
        if let Some(ref mut batch) = *ctx.borrow_mut() {
            batch.sources_changed = batch.sources_changed.saturating_add(sources);
        }
    });
}

/// Run `f` inside a batch scope.
pub fn batch<R>(f: impl FnOnce() -> R) -> R {
    let _scope = BatchScope::new();
    f()
}

/// Flush a drained batch context. Called by `BatchScope::drop` after the
/// context has been detached, so notifications enqueued by the callbacks
/// themselves fire immediately instead of being lost with the context.
fn flush(ctx: BatchContext) {
    let BatchContext {
        deferred,
        sources_changed,
        ..
    } = ctx;

    if deferred.is_empty() {
        return;
    }

    let dependents_notified = deferred.len() as u64;
    let propagation_start = Instant::now();
    let _span = info_span!(
        "reactive.delta",
        sources_changed,
        dependents_notified,
        duration_us = tracing::field::Empty
    )
    .entered();

    // Run all deferred notifications. If one panics, still run the rest.
    let mut first_panic: Option<Box<dyn std::any::Any + Send>> = None;
    for entry in deferred {
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(entry.notify));
        if let Err(payload) = result
            && first_panic.is_none()
        {
            first_panic = Some(payload);
        }
    }

    let duration_us = propagation_start.elapsed().as_micros() as u64;
    tracing::Span::current().record("duration_us", duration_us);
    info!(
        propagation_duration_us = duration_us,
        sources_changed, dependents_notified, "reactive delta propagated"
    );

    if let Some(payload) = first_panic {
        std::panic::resume_unwind(payload);
    }
}

/// RAII guard that begins a batch scope.
///
/// While a `BatchScope` is alive, all notifications are deferred. When the
/// outermost `BatchScope` drops, all deferred notifications fire.
///
/// Nested `BatchScope`s are supported — only the outermost one flushes.
pub struct BatchScope {
    /// Whether this scope is the outermost (responsible for flush).
    is_root: bool,
}

impl BatchScope {
    /// Begin a new batch scope.
    ///
    /// If already inside a batch, this increments the nesting depth.
    #[must_use]
    pub fn new() -> Self {
        let is_root = BATCH_CTX.with(|ctx| {
            let mut guard = ctx.borrow_mut();
            match *guard {
                Some(ref mut batch) => {
                    batch.depth += 1;
                    false
                }
                None => {
                    *guard = Some(BatchContext {
                        depth: 1,
                        deferred: Vec::new(),
                        sources_changed: 0,
                    });
                    true
                }
            }
        });
        Self { is_root }
    }

    /// Number of deferred notifications queued in the current batch.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        BATCH_CTX.with(|ctx| ctx.borrow().as_ref().map_or(0, |b| b.deferred.len()))
    }
}

impl Default for BatchScope {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for BatchScope {
    fn drop(&mut self) {
        // Detach the context before flushing so the queue runs outside the
        // batch: callbacks that mutate further sources notify immediately.
        let drained = BATCH_CTX.with(|ctx| {
            let mut guard = ctx.borrow_mut();
            match *guard {
                Some(ref mut batch) => {
                    batch.depth -= 1;
                    if batch.depth == 0 { guard.take() } else { None }
                }
                None => None,
            }
        });

        if let Some(ctx) = drained {
            flush(ctx);
        }
    }
}

impl std::fmt::Debug for BatchScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchScope")
            .field("is_root", &self.is_root)
            .field("pending", &self.pending_count())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
