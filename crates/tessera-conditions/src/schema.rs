//! Field rules shared by every condition schema.
//!
//! Rules never stop at the first violation: each one appends to the
//! [`FieldValidator`] it is given, so a single validation pass reports every
//! broken field of a (possibly nested) condition object.

use crate::params::{is_context_param, looks_like_context_param};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tessera_core::identifiers::{is_valid_address, ADDRESS_STRING_LEN, SUPPORTED_CHAIN_IDS};
use tessera_core::validation::{issues_by_field, FieldIssue, FieldValidator};
use tessera_core::TesseraError;

/// Shape of a validation failure keyed by field path, e.g.
/// `{"contractAddress": ["Invalid", "String must contain exactly 42 character(s)"]}`.
pub fn format_issues(issues: &[FieldIssue]) -> BTreeMap<String, Vec<String>> {
    issues_by_field(issues)
}

/// Field messages of a schema error, empty for any other error.
pub fn schema_issues(error: &TesseraError) -> BTreeMap<String, Vec<String>> {
    match error {
        TesseraError::SchemaValidation { issues } => format_issues(issues),
        _ => BTreeMap::new(),
    }
}

pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

pub(crate) fn expect_object<'a>(
    v: &mut FieldValidator,
    field: &str,
    value: &'a Value,
) -> Option<&'a Map<String, Value>> {
    match value {
        Value::Object(map) => Some(map),
        other => {
            v.issue(field, format!("Expected object, received {}", type_name(other)));
            None
        }
    }
}

pub(crate) fn required<'a>(
    v: &mut FieldValidator,
    obj: &'a Map<String, Value>,
    field: &str,
) -> Option<&'a Value> {
    let value = obj.get(field);
    if value.is_none() {
        v.issue(field, "Required");
    }
    value
}

pub(crate) fn string_field<'a>(
    v: &mut FieldValidator,
    obj: &'a Map<String, Value>,
    field: &str,
) -> Option<&'a str> {
    match required(v, obj, field)? {
        Value::String(s) => Some(s.as_str()),
        other => {
            v.issue(field, format!("Expected string, received {}", type_name(other)));
            None
        }
    }
}

pub(crate) fn literal_field(
    v: &mut FieldValidator,
    obj: &Map<String, Value>,
    field: &str,
    expected: &str,
) {
    if let Some(actual) = string_field(v, obj, field) {
        if actual != expected {
            v.issue(field, format!("Invalid literal value, expected \"{expected}\""));
        }
    }
}

pub(crate) fn address_field(v: &mut FieldValidator, obj: &Map<String, Value>, field: &str) {
    if let Some(address) = string_field(v, obj, field) {
        if !is_valid_address(address) {
            v.issue(field, "Invalid");
        }
        if address.len() != ADDRESS_STRING_LEN {
            v.issue(
                field,
                format!("String must contain exactly {ADDRESS_STRING_LEN} character(s)"),
            );
        }
    }
}

/// A chain id must be one of the supported literals; a miss reports every
/// allowed literal.
pub(crate) fn chain_field(v: &mut FieldValidator, obj: &Map<String, Value>, field: &str) {
    let Some(value) = required(v, obj, field) else {
        return;
    };
    let supported = value
        .as_u64()
        .map(|id| SUPPORTED_CHAIN_IDS.iter().any(|chain| chain.value() == id))
        .unwrap_or(false);
    if !supported {
        for chain in SUPPORTED_CHAIN_IDS {
            v.issue(
                field,
                format!("Invalid literal value, expected {}", chain.value()),
            );
        }
    }
}

pub(crate) fn array_field<'a>(
    v: &mut FieldValidator,
    obj: &'a Map<String, Value>,
    field: &str,
) -> Option<&'a Vec<Value>> {
    match required(v, obj, field)? {
        Value::Array(items) => Some(items),
        other => {
            v.issue(field, format!("Expected array, received {}", type_name(other)));
            None
        }
    }
}

/// Strings that start with the placeholder sentinel must be well-formed
/// placeholders.
pub(crate) fn context_param_value(v: &mut FieldValidator, field: &str, value: &Value) {
    match value {
        Value::String(s) if looks_like_context_param(s) && !is_context_param(s) => {
            v.issue(field, format!("Invalid context parameter {s:?}"));
        }
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                context_param_value(v, &format!("{field}[{index}]"), item);
            }
        }
        _ => {}
    }
}

pub(crate) fn reject_unknown_keys(
    v: &mut FieldValidator,
    obj: &Map<String, Value>,
    allowed: &[&str],
) {
    for key in obj.keys() {
        if !allowed.contains(&key.as_str()) {
            v.issue(key, "Unrecognized key");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn run(rule: impl FnOnce(&mut FieldValidator, &Map<String, Value>), value: Value) -> BTreeMap<String, Vec<String>> {
        let mut v = FieldValidator::new();
        let obj = value.as_object().cloned().unwrap_or_default();
        rule(&mut v, &obj);
        format_issues(&v.into_issues())
    }

    #[test]
    fn test_short_address_reports_both_rules() {
        let issues = run(|v, o| address_field(v, o, "contractAddress"), json!({"contractAddress": "0x123"}));
        assert_eq!(
            issues["contractAddress"],
            vec!["Invalid", "String must contain exactly 42 character(s)"]
        );
    }

    #[test]
    fn test_bad_chain_lists_allowed_literals_in_order() {
        let issues = run(|v, o| chain_field(v, o, "chain"), json!({"chain": "not-an-integer"}));
        assert_eq!(
            issues["chain"],
            vec![
                "Invalid literal value, expected 137",
                "Invalid literal value, expected 80002",
                "Invalid literal value, expected 11155111",
                "Invalid literal value, expected 1",
            ]
        );
    }

    #[test]
    fn test_missing_field_is_required() {
        let issues = run(|v, o| chain_field(v, o, "chain"), json!({}));
        assert_eq!(issues["chain"], vec!["Required"]);
    }

    #[test]
    fn test_malformed_placeholder_flagged_with_path() {
        let mut v = FieldValidator::new();
        context_param_value(&mut v, "parameters", &json!(["ok", ":bad-name"]));
        let issues = format_issues(&v.into_issues());
        assert!(issues.contains_key("parameters[1]"));
    }
}
