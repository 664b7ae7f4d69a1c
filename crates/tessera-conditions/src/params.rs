//! Context parameters: named placeholders inside a condition tree.
//!
//! A placeholder is a string of the form `:name` appearing as a call
//! parameter or as the expected value of a return value test. Placeholders
//! are filled per decryption attempt and never persisted.

use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Leading sentinel of every placeholder.
pub const CONTEXT_PARAM_PREFIX: char = ':';

/// Placeholder bound to the requester's authenticated address.
pub const USER_ADDRESS_PARAM: &str = ":userAddress";

/// Placeholders callers may never supply themselves.
pub const RESERVED_CONTEXT_PARAMS: [&str; 1] = [USER_ADDRESS_PARAM];

/// Whether `name` is reserved.
pub fn is_reserved(name: &str) -> bool {
    RESERVED_CONTEXT_PARAMS.contains(&name)
}

/// Whether `value` follows the placeholder grammar `:[A-Za-z_][A-Za-z0-9_]*`.
pub fn is_context_param(value: &str) -> bool {
    let Some(rest) = value.strip_prefix(CONTEXT_PARAM_PREFIX) else {
        return false;
    };
    let mut chars = rest.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Whether `value` starts like a placeholder, well-formed or not.
pub fn looks_like_context_param(value: &str) -> bool {
    value.starts_with(CONTEXT_PARAM_PREFIX)
}

/// Collect placeholder names found anywhere in `value`.
pub(crate) fn collect_params(value: &Value, out: &mut BTreeSet<String>) {
    match value {
        Value::String(s) if is_context_param(s) => {
            out.insert(s.clone());
        }
        Value::Array(items) => items.iter().for_each(|item| collect_params(item, out)),
        _ => {}
    }
}

/// Replace placeholders in `value`, recording names with no binding.
pub(crate) fn substitute_value(
    value: &Value,
    bindings: &BTreeMap<String, Value>,
    missing: &mut BTreeSet<String>,
) -> Value {
    match value {
        Value::String(s) if is_context_param(s) => match bindings.get(s) {
            Some(bound) => bound.clone(),
            None => {
                missing.insert(s.clone());
                value.clone()
            }
        },
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| substitute_value(item, bindings, missing))
                .collect(),
        ),
        _ => value.clone(),
    }
}
