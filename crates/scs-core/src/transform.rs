//! Parameter transformer
//!
//! Rewrites SCS 2.x Config Server parameters toward the SCS 3.x schema:
//! - drops `git.repos`, which SCS 3.x has no equivalent for
//! - flattens nested composite backends into `type`-tagged entries
//!
//! The two rules touch disjoint key paths. Anything the rules do not
//! recognise is left exactly as it was.

use crate::payload::{keys, ConfigPayload, PayloadExt};
use serde_json::Value;

/// Rewrite parameters in place
pub fn transform(payload: &mut ConfigPayload) {
    drop_git_repos(payload);
    flatten_composite_backends(payload);
}

/// Rewrite parameters, returning the result
#[inline]
#[must_use]
pub fn transformed(mut payload: ConfigPayload) -> ConfigPayload {
    transform(&mut payload);
    payload
}

fn drop_git_repos(payload: &mut ConfigPayload) {
    if let Some(git) = payload.object_at_mut(keys::GIT) {
        if git.remove(keys::REPOS).is_some() {
            tracing::debug!("dropped git.repos");
        }
    }
}

fn flatten_composite_backends(payload: &mut ConfigPayload) {
    let Some(entries) = payload.array_at_mut(keys::COMPOSITE) else {
        return;
    };

    for entry in entries.iter_mut().filter_map(Value::as_object_mut) {
        // a flattened backend may carry another backend object; each pass
        // removes one level of nesting
        loop {
            let mut changed = false;
            for backend in keys::NESTED_BACKENDS {
                changed |= flatten_backend(entry, backend);
            }
            if !changed {
                break;
            }
        }
    }
}

/// `{ "git": { "uri": "x" } }` becomes `{ "type": "git", "uri": "x" }`
fn flatten_backend(entry: &mut ConfigPayload, backend: &str) -> bool {
    if entry.object_at(backend).is_none() {
        return false;
    }

    let Some(Value::Object(nested)) = entry.remove(backend) else {
        return false;
    };
    entry.extend(nested);
    entry.insert(keys::TYPE.to_owned(), Value::String(backend.to_owned()));
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify;
    use crate::payload::parse_payload;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use serde_json::{json, Map};

    fn check(input: &str, expected: &str) {
        let actual = transformed(parse_payload(input).unwrap());
        assert_eq!(Value::Object(actual), Value::Object(parse_payload(expected).unwrap()));
    }

    #[test]
    fn noop_when_already_compatible() {
        check(
            r#"{ "type": "foo", "number": 36, "enabled": true }"#,
            r#"{ "type": "foo", "number": 36, "enabled": true }"#,
        );
    }

    #[test]
    fn removes_git_repos_only() {
        check(
            r#"{ "git": { "repos": [], "foo": "bar" } }"#,
            r#"{ "git": { "foo": "bar" } }"#,
        );
    }

    #[test]
    fn flattens_composite_git() {
        check(
            r#"{ "composite": [ { "git": {} } ] }"#,
            r#"{ "composite": [ { "type": "git" } ] }"#,
        );
    }

    #[test]
    fn flattens_composite_vault_keeping_fields() {
        check(
            r#"{ "composite": [ { "vault": { "foo": 42 } } ] }"#,
            r#"{ "composite": [ { "type": "vault", "foo": 42 } ] }"#,
        );
    }

    #[test]
    fn flattens_each_composite_entry_in_order() {
        check(
            r#"{ "composite": [ { "git": { "foo": "bar" } }, { "type": "git", "uri": "u" }, { "vault": { "baz": 42 } } ] }"#,
            r#"{ "composite": [ { "type": "git", "foo": "bar" }, { "type": "git", "uri": "u" }, { "type": "vault", "baz": 42 } ] }"#,
        );
    }

    #[test]
    fn nested_fields_overwrite_entry_fields() {
        check(
            r#"{ "composite": [ { "uri": "old", "label": "main", "git": { "uri": "new" } } ] }"#,
            r#"{ "composite": [ { "uri": "new", "label": "main", "type": "git" } ] }"#,
        );
    }

    #[test]
    fn flattens_backends_nested_inside_backends() {
        let cases = [
            (
                r#"{ "composite": [ { "vault": { "git": { "uri": "u" } } } ] }"#,
                r#"{ "composite": [ { "type": "git", "uri": "u" } ] }"#,
            ),
            (
                r#"{ "composite": [ { "git": { "git": { "label": "main" }, "uri": "u" } } ] }"#,
                r#"{ "composite": [ { "type": "git", "uri": "u", "label": "main" } ] }"#,
            ),
            (
                r#"{ "composite": [ { "git": { "vault": { "host": "h", "git": "scalar" } } } ] }"#,
                r#"{ "composite": [ { "type": "vault", "host": "h", "git": "scalar" } ] }"#,
            ),
        ];
        for (input, expected) in cases {
            check(input, expected);

            let once = transformed(parse_payload(input).unwrap());
            assert!(!classify(&once).uses_old_composite, "composite flag for {input}");
            assert_eq!(transformed(once.clone()), once, "second pass for {input}");
        }
    }

    #[test]
    fn leaves_unexpected_shapes_untouched() {
        let cases = [
            r#"{ "git": "repos" }"#,
            r#"{ "composite": { "git": {} } }"#,
            r#"{ "composite": [ "git", 1, null, [ { "git": {} } ] ] }"#,
            r#"{ "composite": [ { "git": "https://example.com" } ] }"#,
            r#"{ "encrypt": { "key": "k" } }"#,
        ];
        for raw in cases {
            check(raw, raw);
        }
    }

    #[test]
    fn unrelated_fields_survive() {
        let input = json!({
            "count": 3,
            "git": { "uri": "u", "repos": {}, "searchPaths": ["a", "b"] },
            "vault": { "host": "h" },
            "composite": []
        });
        let Value::Object(map) = input else { unreachable!() };

        let out = transformed(map);
        assert_eq!(
            Value::Object(out),
            json!({
                "count": 3,
                "git": { "uri": "u", "searchPaths": ["a", "b"] },
                "vault": { "host": "h" },
                "composite": []
            })
        );
    }

    fn leaf() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(|n| json!(n)),
            "[a-z]{0,8}".prop_map(Value::String),
        ]
    }

    fn field_name() -> impl Strategy<Value = String> {
        prop_oneof![
            3 => "f_[a-z]{1,4}",
            1 => Just("git".to_owned()),
            1 => Just("vault".to_owned()),
            1 => Just("type".to_owned()),
        ]
    }

    // Values may be objects keyed by backend names, at any depth
    fn field_value() -> impl Strategy<Value = Value> {
        leaf().prop_recursive(3, 24, 4, |inner| {
            prop::collection::btree_map(field_name(), inner, 0..4)
                .prop_map(|fields| Value::Object(fields.into_iter().collect()))
        })
    }

    fn field_map() -> impl Strategy<Value = Map<String, Value>> {
        prop::collection::btree_map(field_name(), field_value(), 0..4)
            .prop_map(|fields| fields.into_iter().collect())
    }

    fn composite_entry() -> impl Strategy<Value = Value> {
        prop_oneof![
            field_map().prop_map(Value::Object),
            (field_map(), field_map()).prop_map(|(mut entry, nested)| {
                entry.insert("git".into(), Value::Object(nested));
                Value::Object(entry)
            }),
            (field_map(), field_map()).prop_map(|(mut entry, nested)| {
                entry.insert("vault".into(), Value::Object(nested));
                Value::Object(entry)
            }),
            field_map().prop_map(|mut entry| {
                entry.insert("type".into(), json!("vault"));
                Value::Object(entry)
            }),
            field_map().prop_map(|mut entry| {
                entry.insert("git".into(), json!("https://example.com/repo"));
                Value::Object(entry)
            }),
            leaf(),
        ]
    }

    fn git_section() -> impl Strategy<Value = Value> {
        prop_oneof![
            field_map().prop_map(Value::Object),
            (field_map(), leaf()).prop_map(|(mut git, repos)| {
                git.insert("repos".into(), repos);
                Value::Object(git)
            }),
            leaf(),
        ]
    }

    fn payload_strategy() -> impl Strategy<Value = ConfigPayload> {
        (
            field_map(),
            prop::option::of(git_section()),
            prop::option::of(field_map()),
            prop::option::of(prop::collection::vec(composite_entry(), 0..5)),
        )
            .prop_map(|(mut payload, git, encrypt, composite)| {
                if let Some(git) = git {
                    payload.insert("git".into(), git);
                }
                if let Some(mut encrypt) = encrypt {
                    encrypt.insert("key".into(), json!("secret"));
                    payload.insert("encrypt".into(), Value::Object(encrypt));
                }
                if let Some(entries) = composite {
                    payload.insert("composite".into(), Value::Array(entries));
                }
                payload
            })
    }

    proptest! {
        #[test]
        fn prop_transform_clears_structural_flags(payload in payload_strategy()) {
            let before = classify(&payload);
            let after = classify(&transformed(payload));

            prop_assert!(!after.uses_old_git_repos);
            prop_assert!(!after.uses_old_composite);
            prop_assert_eq!(after.uses_encrypt_key, before.uses_encrypt_key);
        }

        #[test]
        fn prop_transform_is_idempotent(payload in payload_strategy()) {
            let once = transformed(payload);
            let twice = transformed(once.clone());
            prop_assert_eq!(once, twice);
        }
    }
}
