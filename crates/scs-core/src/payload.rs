//! Config Server parameter payloads
//!
//! A payload is whatever JSON object the service broker hands back, with no
//! schema beyond the handful of keys the classifier and transformer look at.
//! Every accessor here narrows by type and answers `None` for a missing key
//! or a value of the wrong shape; nothing in this module can fail.

use serde_json::{Map, Value};

/// Arbitrary Config Server configuration parameters
pub type ConfigPayload = Map<String, Value>;

/// Keys with meaning in the SCS 2.x and 3.x parameter schemas
pub(crate) mod keys {
    pub(crate) const GIT: &str = "git";
    pub(crate) const REPOS: &str = "repos";
    pub(crate) const ENCRYPT: &str = "encrypt";
    pub(crate) const KEY: &str = "key";
    pub(crate) const COMPOSITE: &str = "composite";
    pub(crate) const VAULT: &str = "vault";
    pub(crate) const TYPE: &str = "type";

    /// Backends that SCS 2.x nests under their own key in a composite entry
    pub(crate) const NESTED_BACKENDS: [&str; 2] = [GIT, VAULT];
}

/// Type-narrowing accessors over a payload object
pub trait PayloadExt {
    /// Object stored under `key`, if present and an object
    fn object_at(&self, key: &str) -> Option<&ConfigPayload>;

    /// Array stored under `key`, if present and an array
    fn array_at(&self, key: &str) -> Option<&Vec<Value>>;

    /// Mutable object stored under `key`, if present and an object
    fn object_at_mut(&mut self, key: &str) -> Option<&mut ConfigPayload>;

    /// Mutable array stored under `key`, if present and an array
    fn array_at_mut(&mut self, key: &str) -> Option<&mut Vec<Value>>;
}

impl PayloadExt for ConfigPayload {
    #[inline]
    fn object_at(&self, key: &str) -> Option<&ConfigPayload> {
        self.get(key).and_then(Value::as_object)
    }

    #[inline]
    fn array_at(&self, key: &str) -> Option<&Vec<Value>> {
        self.get(key).and_then(Value::as_array)
    }

    #[inline]
    fn object_at_mut(&mut self, key: &str) -> Option<&mut ConfigPayload> {
        self.get_mut(key).and_then(Value::as_object_mut)
    }

    #[inline]
    fn array_at_mut(&mut self, key: &str) -> Option<&mut Vec<Value>> {
        self.get_mut(key).and_then(Value::as_array_mut)
    }
}

/// Parse a JSON document that must be an object at the top level
///
/// # Errors
/// Returns the decode error for malformed JSON or a non-object document.
pub fn parse_payload(raw: &str) -> Result<ConfigPayload, serde_json::Error> {
    serde_json::from_str(raw)
}
