//! Boolean combinators over conditions.

use crate::condition::Condition;
use crate::schema::{array_field, expect_object, literal_field, reject_unknown_keys, required};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use tessera_core::validation::FieldValidator;

/// Compound conditions may nest at most this many levels deep.
pub const MAX_NESTED_DEPTH: usize = 2;

/// Boolean operator of a compound condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    /// All operands hold
    And,
    /// Any operand holds
    Or,
    /// The single operand does not hold
    Not,
}

impl Operator {
    /// Wire name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::And => "and",
            Self::Or => "or",
            Self::Not => "not",
        }
    }

    fn parse(name: &str) -> Option<Self> {
        [Self::And, Self::Or, Self::Not]
            .into_iter()
            .find(|op| op.as_str() == name)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `operator` applied to an ordered list of operands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompoundCondition {
    /// Combinator
    pub operator: Operator,
    /// Child conditions, in order
    pub operands: Vec<Condition>,
}

impl CompoundCondition {
    /// Wire tag.
    pub const CONDITION_TYPE: &'static str = "compound";

    /// Conjunction.
    pub fn and(operands: Vec<Condition>) -> Self {
        Self {
            operator: Operator::And,
            operands,
        }
    }

    /// Disjunction.
    pub fn or(operands: Vec<Condition>) -> Self {
        Self {
            operator: Operator::Or,
            operands,
        }
    }

    /// Negation.
    pub fn not(operand: Condition) -> Self {
        Self {
            operator: Operator::Not,
            operands: vec![operand],
        }
    }

    /// `depth` counts compound levels, starting at 1 for this node.
    pub(crate) fn check(v: &mut FieldValidator, value: &Value, depth: usize) {
        let Some(obj) = expect_object(v, "", value) else {
            return;
        };
        reject_unknown_keys(v, obj, &["conditionType", "operator", "operands"]);
        if obj.contains_key("conditionType") {
            literal_field(v, obj, "conditionType", Self::CONDITION_TYPE);
        }
        if depth > MAX_NESTED_DEPTH {
            v.issue(
                "",
                format!("Exceeded max nested depth of {MAX_NESTED_DEPTH} for multi-condition type"),
            );
            return;
        }

        let operator = match required(v, obj, "operator") {
            Some(raw) => {
                let parsed = raw.as_str().and_then(Operator::parse);
                if parsed.is_none() {
                    v.issue(
                        "operator",
                        format!("Invalid enum value. Expected 'and' | 'or' | 'not', received {raw}"),
                    );
                }
                parsed
            }
            None => None,
        };

        let Some(operands) = array_field(v, obj, "operands") else {
            return;
        };
        match operator {
            Some(Operator::Not) if operands.len() != 1 => {
                v.issue("operands", "Operator 'not' requires exactly one operand");
            }
            Some(Operator::And | Operator::Or) if operands.is_empty() => {
                v.issue("operands", "Array must contain at least 1 element(s)");
            }
            _ => {}
        }
        v.each("operands", operands, |item, _, operand| {
            Condition::check(item, operand, depth);
        });
    }
}
