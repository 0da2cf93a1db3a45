//! condition evaluator
//!
//! evaluates expressions against a snapshot of the fields they reference.
//! evaluation never fails: anything that cannot be compared is false.
//!
//! per-condition rules:
//! - the field value must have the comparison's type (string, number,
//!   boolean); there is no coercion, so `"21"` is not a number
//! - an absent or null field value makes every operator false, the negated
//!   ones (NOT_EQUALS, NOT_INCLUDES) included
//! - unsupported comparisons are false

use std::collections::HashMap;

use serde_json::Value as JsonValue;

use super::path::FieldPath;
use super::types::{
    BooleanOp, Comparison, Condition, Expression, LogicalOp, NumberOp, StringOp, ValueKind,
};

// ============================================================================
// Snapshot
// ============================================================================

/// point-in-time values of the fields an expression reads
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    values: HashMap<FieldPath, Option<JsonValue>>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// read exactly the dependencies of `expression` from a value tree
    pub fn capture(expression: &Expression, values: &JsonValue) -> Self {
        expression
            .dependencies()
            .into_iter()
            .map(|path| {
                let value = path.resolve(values).cloned();
                (path, value)
            })
            .collect()
    }

    /// pair watched names with the values a store returned for them, by position
    pub fn from_watched(names: &[FieldPath], watched: Vec<Option<JsonValue>>) -> Self {
        let mut snapshot = Self::new();
        let mut watched = watched.into_iter();
        for name in names {
            snapshot.insert(name.clone(), watched.next().flatten());
        }
        snapshot
    }

    pub fn insert(&mut self, path: FieldPath, value: Option<JsonValue>) {
        self.values.insert(path, value);
    }

    /// current value of a field; null and missing both read as `None`
    pub fn get(&self, path: &FieldPath) -> Option<&JsonValue> {
        match self.values.get(path) {
            Some(Some(JsonValue::Null)) | Some(None) | None => None,
            Some(Some(value)) => Some(value),
        }
    }

    pub fn contains(&self, path: &FieldPath) -> bool {
        self.values.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &FieldPath> {
        self.values.keys()
    }
}

impl FromIterator<(FieldPath, Option<JsonValue>)> for Snapshot {
    fn from_iter<I: IntoIterator<Item = (FieldPath, Option<JsonValue>)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl FromIterator<(FieldPath, JsonValue)> for Snapshot {
    fn from_iter<I: IntoIterator<Item = (FieldPath, JsonValue)>>(iter: I) -> Self {
        iter.into_iter().map(|(p, v)| (p, Some(v))).collect()
    }
}

// ============================================================================
// Evaluation
// ============================================================================

/// evaluate an expression against a snapshot
pub fn evaluate(expression: &Expression, snapshot: &Snapshot) -> bool {
    match expression {
        Expression::Literal(value) => *value,
        Expression::Group {
            operator,
            conditions,
        } => {
            // empty group = true (vacuous), for OR as well as AND
            if conditions.is_empty() {
                return true;
            }
            let mut results = conditions
                .iter()
                .map(|c| c.evaluate(snapshot.get(&c.name)));
            match operator {
                LogicalOp::And => results.all(|r| r),
                LogicalOp::Or => results.any(|r| r),
            }
        }
    }
}

/// evaluate a possibly absent expression; absent = true
pub fn evaluate_optional(expression: Option<&Expression>, snapshot: &Snapshot) -> bool {
    expression
        .map(|e| evaluate(e, snapshot))
        .unwrap_or(true)
}

/// capture a snapshot from a full value tree and evaluate
pub fn evaluate_values(expression: &Expression, values: &JsonValue) -> bool {
    evaluate(expression, &Snapshot::capture(expression, values))
}

impl Condition {
    /// evaluate this condition against the current value of its field
    pub fn evaluate(&self, value: Option<&JsonValue>) -> bool {
        if let Comparison::Unsupported {
            operator, reason, ..
        } = &self.comparison
        {
            tracing::warn!(
                field = %self.name,
                operator = %operator,
                "unsupported condition treated as false: {}",
                reason
            );
            return false;
        }

        let value = match value {
            None | Some(JsonValue::Null) => return false,
            Some(v) => v,
        };

        match (&self.comparison, value) {
            (Comparison::Text { op, value: expected }, JsonValue::String(actual)) => {
                compare_text(*op, actual, expected)
            }
            (Comparison::Number { op, value: expected }, JsonValue::Number(actual)) => actual
                .as_f64()
                .map(|actual| compare_number(*op, actual, *expected))
                .unwrap_or(false),
            (Comparison::Boolean { op, value: expected }, JsonValue::Bool(actual)) => {
                compare_bool(*op, *actual, *expected)
            }
            (comparison, actual) => {
                tracing::debug!(
                    field = %self.name,
                    expected = ?comparison.kind().map(|k| k.as_str()),
                    actual = ?ValueKind::of(actual).map(|k| k.as_str()),
                    "field value type does not match condition, treating as false"
                );
                false
            }
        }
    }
}

// ============================================================================
// Comparison Helpers
// ============================================================================

fn compare_text(op: StringOp, actual: &str, expected: &str) -> bool {
    match op {
        StringOp::Equals => actual == expected,
        StringOp::NotEquals => actual != expected,
        StringOp::StartsWith => actual.starts_with(expected),
        StringOp::EndsWith => actual.ends_with(expected),
        StringOp::Includes => actual.contains(expected),
        StringOp::NotIncludes => !actual.contains(expected),
    }
}

fn compare_number(op: NumberOp, actual: f64, expected: f64) -> bool {
    match op {
        NumberOp::Equals => actual == expected,
        NumberOp::NotEquals => actual != expected,
        NumberOp::GreaterThan => actual > expected,
        NumberOp::LessThan => actual < expected,
        NumberOp::GreaterThanOrEqual => actual >= expected,
        NumberOp::LessThanOrEqual => actual <= expected,
    }
}

fn compare_bool(op: BooleanOp, actual: bool, expected: bool) -> bool {
    match op {
        BooleanOp::Equals => actual == expected,
        BooleanOp::NotEquals => actual != expected,
    }
}
