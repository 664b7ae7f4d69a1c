//! Accumulating field validation
//!
//! Used for configuration and for condition schemas. Every rule appends to the
//! same issue list so callers see every violated field at once rather than the
//! first one.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single violated field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldIssue {
    /// Dotted path of the field (`operands[1].chain`)
    pub field: String,
    /// Human-readable violation
    pub message: String,
}

impl FieldIssue {
    /// Create a new issue.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.field.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.field, self.message)
        }
    }
}

/// Group issues by field path, preserving the order messages were raised in.
pub fn issues_by_field(issues: &[FieldIssue]) -> BTreeMap<String, Vec<String>> {
    let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for issue in issues {
        grouped
            .entry(issue.field.clone())
            .or_default()
            .push(issue.message.clone());
    }
    grouped
}

/// Validator that accumulates issues under a field prefix
#[derive(Debug, Default)]
pub struct FieldValidator {
    issues: Vec<FieldIssue>,
    field_prefix: String,
}

impl FieldValidator {
    /// Create a new validator
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a validator for a nested field
    pub fn for_field(&self, field_name: &str) -> Self {
        Self {
            issues: Vec::new(),
            field_prefix: self.full_field_name(field_name),
        }
    }

    /// Record an issue for a field
    pub fn issue(&mut self, field_name: &str, message: impl Into<String>) -> &mut Self {
        let field = self.full_field_name(field_name);
        self.issues.push(FieldIssue::new(field, message));
        self
    }

    /// Validate that a value is present
    pub fn required<T>(&mut self, field_name: &str, value: &Option<T>) -> &mut Self {
        if value.is_none() {
            self.issue(field_name, "Required");
        }
        self
    }

    /// Validate that a number is within range
    pub fn range<T>(&mut self, field_name: &str, value: T, min: Option<T>, max: Option<T>) -> &mut Self
    where
        T: PartialOrd + Copy + fmt::Display,
    {
        if let Some(min) = min {
            if value < min {
                self.issue(field_name, format!("Must be at least {min} (got {value})"));
            }
        }
        if let Some(max) = max {
            if value > max {
                self.issue(field_name, format!("Must be at most {max} (got {value})"));
            }
        }
        self
    }

    /// Validate using a custom predicate
    pub fn custom<T, F>(&mut self, field_name: &str, value: &T, predicate: F, message: &str) -> &mut Self
    where
        F: FnOnce(&T) -> bool,
    {
        if !predicate(value) {
            self.issue(field_name, message);
        }
        self
    }

    /// Validate a collection of items
    pub fn each<T, F>(&mut self, field_name: &str, items: &[T], mut validator: F) -> &mut Self
    where
        F: FnMut(&mut FieldValidator, usize, &T),
    {
        for (index, item) in items.iter().enumerate() {
            let mut item_validator = self.for_field(&format!("{field_name}[{index}]"));
            validator(&mut item_validator, index, item);
            self.merge(item_validator);
        }
        self
    }

    /// Merge issues from another validator
    pub fn merge(&mut self, other: FieldValidator) {
        self.issues.extend(other.issues);
    }

    /// Whether any issue has been recorded
    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }

    /// Finish validation, returning every recorded issue on failure
    pub fn finish(self) -> Result<(), Vec<FieldIssue>> {
        if self.issues.is_empty() {
            Ok(())
        } else {
            Err(self.issues)
        }
    }

    /// Get all recorded issues
    pub fn into_issues(self) -> Vec<FieldIssue> {
        self.issues
    }

    fn full_field_name(&self, field_name: &str) -> String {
        match (self.field_prefix.is_empty(), field_name.is_empty()) {
            (true, _) => field_name.to_string(),
            (false, true) => self.field_prefix.clone(),
            (false, false) if field_name.starts_with('[') => {
                format!("{}{}", self.field_prefix, field_name)
            }
            (false, false) => format!("{}.{}", self.field_prefix, field_name),
        }
    }
}
