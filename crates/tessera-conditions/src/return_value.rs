//! Return value tests: how a fetched value is compared to an expectation.

use crate::schema::{context_param_value, expect_object, reject_unknown_keys, required};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;
use tessera_core::identifiers::is_valid_address;
use tessera_core::validation::FieldValidator;
use tessera_core::{Result, TesseraError};

/// Comparison applied between the fetched value and the expected value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Comparator {
    /// `==`
    #[serde(rename = "==")]
    Equal,
    /// `>`
    #[serde(rename = ">")]
    GreaterThan,
    /// `<`
    #[serde(rename = "<")]
    LessThan,
    /// `>=`
    #[serde(rename = ">=")]
    GreaterOrEqual,
    /// `<=`
    #[serde(rename = "<=")]
    LessOrEqual,
    /// `!=`
    #[serde(rename = "!=")]
    NotEqual,
}

/// Every comparator in the order validation messages list them.
pub const COMPARATORS: [Comparator; 6] = [
    Comparator::Equal,
    Comparator::GreaterThan,
    Comparator::LessThan,
    Comparator::GreaterOrEqual,
    Comparator::LessOrEqual,
    Comparator::NotEqual,
];

impl Comparator {
    /// Wire symbol.
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Equal => "==",
            Self::GreaterThan => ">",
            Self::LessThan => "<",
            Self::GreaterOrEqual => ">=",
            Self::LessOrEqual => "<=",
            Self::NotEqual => "!=",
        }
    }

    /// Parse a wire symbol.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        COMPARATORS.into_iter().find(|c| c.symbol() == symbol)
    }

    fn holds(self, ordering: Ordering) -> bool {
        match self {
            Self::Equal => ordering == Ordering::Equal,
            Self::NotEqual => ordering != Ordering::Equal,
            Self::GreaterThan => ordering == Ordering::Greater,
            Self::LessThan => ordering == Ordering::Less,
            Self::GreaterOrEqual => ordering != Ordering::Less,
            Self::LessOrEqual => ordering != Ordering::Greater,
        }
    }

    fn is_equality(self) -> bool {
        matches!(self, Self::Equal | Self::NotEqual)
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Expected outcome of a read: `fetched[index] <comparator> value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnValueTest {
    /// Position within a tuple/array result
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
    /// Comparison to apply
    pub comparator: Comparator,
    /// Expected value; may be a placeholder
    pub value: Value,
}

impl ReturnValueTest {
    /// Build a test without an index.
    pub fn new(comparator: Comparator, value: impl Into<Value>) -> Self {
        Self {
            index: None,
            comparator,
            value: value.into(),
        }
    }

    /// Select an element of a tuple/array result.
    pub fn with_index(mut self, index: u32) -> Self {
        self.index = Some(index);
        self
    }

    /// Schema rules for a `returnValueTest` object.
    pub(crate) fn check(v: &mut FieldValidator, value: &Value) {
        let Some(obj) = expect_object(v, "", value) else {
            return;
        };
        reject_unknown_keys(v, obj, &["index", "comparator", "value"]);

        if let Some(comparator) = required(v, obj, "comparator") {
            let known = comparator
                .as_str()
                .and_then(Comparator::from_symbol)
                .is_some();
            if !known {
                let expected = COMPARATORS
                    .iter()
                    .map(|c| format!("'{}'", c.symbol()))
                    .collect::<Vec<_>>()
                    .join(" | ");
                v.issue(
                    "comparator",
                    format!("Invalid enum value. Expected {expected}, received {comparator}"),
                );
            }
        }

        if let Some(expected) = required(v, obj, "value") {
            context_param_value(v, "value", expected);
        }

        if let Some(index) = obj.get("index") {
            if index.as_u64().and_then(|i| u32::try_from(i).ok()).is_none() {
                v.issue("index", "Expected non-negative integer");
            }
        }
    }

    /// Compare a fetched value against this test.
    ///
    /// Integers and decimal strings compare numerically, addresses compare
    /// case-insensitively, anything else only supports `==` and `!=`.
    pub fn evaluate(&self, fetched: &Value) -> Result<bool> {
        let actual = match self.index {
            Some(index) => fetched
                .as_array()
                .and_then(|items| items.get(index as usize))
                .ok_or_else(|| {
                    TesseraError::invalid(format!(
                        "Return value has no element at index {index}"
                    ))
                })?,
            None => fetched,
        };

        if let (Some(a), Some(b)) = (as_integer(actual), as_integer(&self.value)) {
            return Ok(self.comparator.holds(a.cmp(&b)));
        }

        if !self.comparator.is_equality() {
            return Err(TesseraError::invalid(format!(
                "Comparator {} needs numeric operands, got {actual} and {}",
                self.comparator, self.value
            )));
        }

        let equal = match (actual, &self.value) {
            (Value::String(a), Value::String(b)) if is_valid_address(a) && is_valid_address(b) => {
                a.eq_ignore_ascii_case(b)
            }
            (a, b) => a == b,
        };
        Ok(self.comparator.holds(if equal {
            Ordering::Equal
        } else {
            Ordering::Less
        }))
    }
}

fn as_integer(value: &Value) -> Option<i128> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .map(i128::from)
            .or_else(|| n.as_u64().map(i128::from)),
        Value::String(s) => s.parse::<i128>().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_numeric_comparisons_accept_decimal_strings() {
        let test = ReturnValueTest::new(Comparator::GreaterOrEqual, 10);
        assert!(test.evaluate(&json!("10")).unwrap());
        assert!(test.evaluate(&json!(11)).unwrap());
        assert!(!test.evaluate(&json!(9)).unwrap());
    }

    #[test]
    fn test_address_equality_ignores_case() {
        let test = ReturnValueTest::new(
            Comparator::Equal,
            "0x209e639a0ec166ac7a1a4ba41968fa967db30221",
        );
        assert!(test
            .evaluate(&json!("0x209E639A0EC166AC7A1A4BA41968FA967DB30221"))
            .unwrap());
    }

    #[test]
    fn test_index_selects_tuple_element() {
        let test = ReturnValueTest::new(Comparator::Equal, true).with_index(1);
        assert!(test.evaluate(&json!([false, true])).unwrap());
        assert!(test.evaluate(&json!([false])).is_err());
    }

    #[test]
    fn test_ordering_on_strings_is_an_error() {
        let test = ReturnValueTest::new(Comparator::LessThan, "abc");
        assert!(test.evaluate(&json!("abd")).is_err());
    }

    #[test]
    fn test_not_equal() {
        let test = ReturnValueTest::new(Comparator::NotEqual, "a");
        assert!(test.evaluate(&json!("b")).unwrap());
        assert!(!test.evaluate(&json!("a")).unwrap());
    }

    #[test]
    fn test_serde_uses_symbols() {
        let test = ReturnValueTest::new(Comparator::LessOrEqual, 3);
        assert_eq!(
            serde_json::to_value(&test).unwrap(),
            json!({"comparator": "<=", "value": 3})
        );
    }

    #[test]
    fn test_check_reports_unknown_comparator() {
        let mut v = FieldValidator::new();
        ReturnValueTest::check(&mut v, &json!({"comparator": "~", "value": 1}));
        let issues = v.into_issues();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].field, "comparator");
        assert!(issues[0].message.contains("'=='"));
    }
}
