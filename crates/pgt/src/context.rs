#![forbid(unsafe_code)]

//! Translation context: binds an engine and a default namespace to a
//! subtree of scopes.
//!
//! The provider is resolved at hook/translator *creation* time, not on
//! every re-run — reactive re-evaluation happens outside the creating
//! scope, so live context walks there would come up empty.

use pgt_i18n::Engine;
use pgt_reactive::{provide_context, use_context};

/// Engine plus default namespaces for a subtree.
#[derive(Clone)]
pub struct TranslationConfig {
    pub engine: Engine,
    pub ns: Option<Vec<String>>,
}

impl std::fmt::Debug for TranslationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranslationConfig")
            .field("ns", &self.ns)
            .finish_non_exhaustive()
    }
}

/// Provide an engine (and optionally default namespaces) to the current
/// scope's subtree.
pub fn provide_translation(engine: Engine, ns: Option<Vec<String>>) {
    provide_context(TranslationConfig { engine, ns });
}

/// The nearest provided translation config, if any.
#[must_use]
pub fn use_translation_config() -> Option<TranslationConfig> {
    use_context::<TranslationConfig>()
}
