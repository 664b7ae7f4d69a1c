//! Versioned envelope around a root condition.
//!
//! The expression is what travels with a ciphertext. Its canonical form is a
//! JSON object with sorted keys, so serializing the same expression always
//! yields the same bytes.

use crate::condition::Condition;
use crate::schema::expect_object;
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use tessera_core::validation::FieldValidator;
use tessera_core::{ChainId, Conditions, Result, TesseraError};

/// Envelope version written by this crate.
pub const VERSION: &str = "1.0.0";

/// A condition tree ready to be attached to a ciphertext.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionExpression {
    /// Envelope version
    pub version: String,
    /// Root condition
    pub condition: Condition,
}

impl ConditionExpression {
    /// Wrap a root condition at the current version.
    pub fn new(condition: impl Into<Condition>) -> Self {
        Self {
            version: VERSION.to_string(),
            condition: condition.into(),
        }
    }

    /// Object form `{"version": .., "condition": {..}}`.
    pub fn to_object(&self) -> Result<Value> {
        let mut obj = Map::new();
        obj.insert("version".to_string(), Value::from(self.version.clone()));
        obj.insert("condition".to_string(), self.condition.to_object()?);
        Ok(Value::Object(obj))
    }

    /// Parse and validate the object form.
    ///
    /// Versions with a different major component are rejected.
    pub fn from_object(value: &Value) -> Result<Self> {
        let mut v = FieldValidator::new();
        let Some(obj) = expect_object(&mut v, "", value) else {
            return Err(TesseraError::schema(v.into_issues()));
        };

        let version = match obj.get("version") {
            Some(Value::String(version)) => {
                if !is_compatible(version) {
                    v.issue(
                        "version",
                        format!("Version {version} is incompatible with {VERSION}"),
                    );
                }
                Some(version.clone())
            }
            Some(_) => {
                v.issue("version", "Expected string");
                None
            }
            None => {
                v.issue("version", "Required");
                None
            }
        };

        let condition = match obj.get("condition") {
            Some(condition) => match Condition::validate(condition) {
                Ok(condition) => Some(condition),
                Err(TesseraError::SchemaValidation { issues }) => {
                    let mut nested = v.for_field("condition");
                    for issue in issues {
                        nested.issue(&issue.field, issue.message);
                    }
                    v.merge(nested);
                    None
                }
                Err(other) => return Err(other),
            },
            None => {
                v.issue("condition", "Required");
                None
            }
        };

        v.finish().map_err(TesseraError::schema)?;
        match (version, condition) {
            (Some(version), Some(condition)) => Ok(Self { version, condition }),
            _ => Err(TesseraError::internal("Validated expression is incomplete")),
        }
    }

    /// Canonical JSON text.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.to_object()?)?)
    }

    /// Parse canonical JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_object(&value)
    }

    /// Canonical bytes (UTF-8 JSON).
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(self.to_json()?.into_bytes())
    }

    /// Parse canonical bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let json = std::str::from_utf8(bytes)
            .map_err(|e| TesseraError::serialization(format!("Expression is not UTF-8: {e}")))?;
        Self::from_json(json)
    }

    /// Opaque form carried in an access control policy.
    pub fn to_conditions(&self) -> Result<Conditions> {
        Ok(Conditions(self.to_json()?))
    }

    /// Recover an expression from a policy's conditions.
    pub fn from_conditions(conditions: &Conditions) -> Result<Self> {
        Self::from_json(conditions.as_str())
    }

    /// Placeholders the expression needs bound before evaluation.
    pub fn context_params(&self) -> BTreeSet<String> {
        self.condition.context_params()
    }

    /// Chain a requester proof should be bound to: the first chain read.
    pub fn primary_chain(&self) -> ChainId {
        self.condition
            .chains()
            .first()
            .copied()
            .unwrap_or(ChainId::EthereumMainnet)
    }
}

fn major(version: &str) -> Option<u64> {
    version.split('.').next()?.parse().ok()
}

fn is_compatible(version: &str) -> bool {
    let parts: Vec<&str> = version.split('.').collect();
    parts.len() == 3
        && parts.iter().all(|p| p.parse::<u64>().is_ok())
        && major(version) == major(VERSION)
}
