#![forbid(unsafe_code)]

//! Static-or-reactive input values.
//!
//! APIs that accept configuration (a language override, a namespace list)
//! should work with both a plain value and a live observable. [`Source`]
//! is that either type: reading a `Value` variant is free and untracked,
//! reading a `Reactive` variant tracks like any observable read.

use crate::observable::Observable;

/// A value that is either fixed or backed by an observable.
#[derive(Clone)]
pub enum Source<T: Clone + PartialEq + 'static> {
    Value(T),
    Reactive(Observable<T>),
}

impl<T: Clone + PartialEq + 'static> Source<T> {
    /// Current value; tracks when reactive.
    #[must_use]
    pub fn get(&self) -> T {
        match self {
            Self::Value(v) => v.clone(),
            Self::Reactive(obs) => obs.get(),
        }
    }

    /// Current value without tracking.
    #[must_use]
    pub fn peek(&self) -> T {
        match self {
            Self::Value(v) => v.clone(),
            Self::Reactive(obs) => obs.peek(),
        }
    }

    /// True when backed by an observable.
    #[must_use]
    pub fn is_reactive(&self) -> bool {
        matches!(self, Self::Reactive(_))
    }
}

impl<T: Clone + PartialEq + Default + 'static> Default for Source<T> {
    fn default() -> Self {
        Self::Value(T::default())
    }
}

impl<T: Clone + PartialEq + 'static> From<T> for Source<T> {
    fn from(value: T) -> Self {
        Self::Value(value)
    }
}

impl<T: Clone + PartialEq + 'static> From<Observable<T>> for Source<T> {
    fn from(obs: Observable<T>) -> Self {
        Self::Reactive(obs)
    }
}

impl From<&str> for Source<String> {
    fn from(value: &str) -> Self {
        Self::Value(value.to_string())
    }
}

impl<T: Clone + PartialEq + std::fmt::Debug + 'static> std::fmt::Debug for Source<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Value(v) => f.debug_tuple("Source::Value").field(v).finish(),
            Self::Reactive(obs) => f.debug_tuple("Source::Reactive").field(obs).finish(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
