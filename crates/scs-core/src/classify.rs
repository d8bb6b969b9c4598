//! Compatibility classifier
//!
//! Decides which SCS 2.x-only features a Config Server instance relies on.
//! Each rule is evaluated on its own against the top-level payload.

use crate::payload::{keys, ConfigPayload, PayloadExt};
use crate::types::CompatibilityFlags;
use serde_json::Value;

/// Classify Config Server parameters against the SCS 3.x schema
///
/// Total over every payload: shapes it does not recognise count as the
/// feature being absent.
#[must_use]
pub fn classify(payload: &ConfigPayload) -> CompatibilityFlags {
    CompatibilityFlags {
        uses_old_git_repos: uses_old_git_repos(payload),
        uses_encrypt_key: uses_encrypt_key(payload),
        uses_old_composite: uses_old_composite(payload),
    }
}

// SCS 3.x does not support multiple repositories via { "git": { "repos": ... } }
fn uses_old_git_repos(payload: &ConfigPayload) -> bool {
    payload
        .object_at(keys::GIT)
        .is_some_and(|git| git.contains_key(keys::REPOS))
}

// encrypt.key is missing from SCS 3.0.0 and returns in 3.1.6
fn uses_encrypt_key(payload: &ConfigPayload) -> bool {
    payload
        .object_at(keys::ENCRYPT)
        .is_some_and(|encrypt| encrypt.contains_key(keys::KEY))
}

// SCS 2.x composite entries nest { "git": {...} } or { "vault": {...} },
// SCS 3.x entries carry { "type": "git", ... } instead
fn uses_old_composite(payload: &ConfigPayload) -> bool {
    payload.array_at(keys::COMPOSITE).is_some_and(|entries| {
        entries
            .iter()
            .filter_map(Value::as_object)
            .any(has_nested_backend)
    })
}

fn has_nested_backend(entry: &ConfigPayload) -> bool {
    keys::NESTED_BACKENDS
        .iter()
        .any(|backend| entry.object_at(backend).is_some())
}
