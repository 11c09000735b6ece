#![forbid(unsafe_code)]

//! Process-wide default engine.
//!
//! The final fallback when no engine is passed explicitly and none is
//! provided through context: a lazily-created, initially-uninitialized
//! engine shared by the whole thread. Its lifecycle is the application's
//! business — this module only hands out the handle.

use std::cell::OnceCell;

use crate::engine::Engine;
use crate::options::EngineOptions;

thread_local! {
    static GLOBAL: OnceCell<Engine> = const { OnceCell::new() };
}

/// The default engine for this thread. Created on first access,
/// uninitialized until someone calls `init` on it.
#[must_use]
pub fn global() -> Engine {
    GLOBAL.with(|cell| cell.get_or_init(|| Engine::new(EngineOptions::default())).clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_is_stable_per_thread() {
        let a = global();
        let b = global();
        assert!(a.ptr_eq(&b));
    }

    #[test]
    fn global_starts_uninitialized() {
        // Another test on this thread may have initialized it; only check
        // that reads are safe.
        let engine = global();
        let _ = engine.language();
        let _ = engine.t("missing-key");
    }
}
