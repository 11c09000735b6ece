#![forbid(unsafe_code)]

//! Pluggable bundle loading.
//!
//! A [`Backend`] supplies the bundle for a (language, namespace) pair that
//! is not present inline. Loading strategy (files, network, generated) is
//! entirely the backend's concern; the engine only asks for trees.

use serde_json::Value;

use crate::error::BackendError;

/// Bundle loader for namespaces without inline resources.
pub trait Backend {
    /// Produce the bundle tree for `lng`/`ns`.
    fn read(&self, lng: &str, ns: &str) -> Result<Value, BackendError>;
}

/// Backend over an in-memory `{ lng: { ns: tree } }` value. Useful for
/// tests and small embedded apps.
#[derive(Clone, Debug)]
pub struct MapBackend {
    bundles: Value,
}

impl MapBackend {
    #[must_use]
    pub fn new(bundles: Value) -> Self {
        Self { bundles }
    }
}

impl Backend for MapBackend {
    fn read(&self, lng: &str, ns: &str) -> Result<Value, BackendError> {
        self.bundles
            .get(lng)
            .and_then(|namespaces| namespaces.get(ns))
            .cloned()
            .ok_or_else(|| BackendError::NotFound {
                lng: lng.to_string(),
                ns: ns.to_string(),
            })
    }
}
