//! typed condition builders
//!
//! a `TextField` can only produce string comparisons, a `NumberField` only
//! numeric ones, and so on, so an operator that does not fit the field's
//! value type is a compile error instead of a silent `false` at runtime.
//!
//! ```
//! use suprform::conditions::{Expression, NumberField, TextField};
//!
//! let age = NumberField::parse("age").unwrap();
//! let email = TextField::parse("contact.email").unwrap();
//! let rule = Expression::all(vec![age.greater_than(17), email.includes("@")]);
//! assert_eq!(rule.dependencies().len(), 2);
//! ```

use super::path::{FieldPath, PathError};
use super::types::{BooleanOp, Condition, NumberOp, StringOp};

/// a field holding a string
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TextField(FieldPath);

impl TextField {
    pub fn new(path: FieldPath) -> Self {
        Self(path)
    }

    pub fn parse(path: &str) -> Result<Self, PathError> {
        FieldPath::parse(path).map(Self)
    }

    pub fn path(&self) -> &FieldPath {
        &self.0
    }

    fn condition(&self, op: StringOp, value: impl Into<String>) -> Condition {
        Condition::text(self.0.clone(), op, value)
    }

    pub fn equals(&self, value: impl Into<String>) -> Condition {
        self.condition(StringOp::Equals, value)
    }

    pub fn not_equals(&self, value: impl Into<String>) -> Condition {
        self.condition(StringOp::NotEquals, value)
    }

    pub fn starts_with(&self, value: impl Into<String>) -> Condition {
        self.condition(StringOp::StartsWith, value)
    }

    pub fn ends_with(&self, value: impl Into<String>) -> Condition {
        self.condition(StringOp::EndsWith, value)
    }

    pub fn includes(&self, value: impl Into<String>) -> Condition {
        self.condition(StringOp::Includes, value)
    }

    pub fn not_includes(&self, value: impl Into<String>) -> Condition {
        self.condition(StringOp::NotIncludes, value)
    }
}

/// a field holding a number
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NumberField(FieldPath);

impl NumberField {
    pub fn new(path: FieldPath) -> Self {
        Self(path)
    }

    pub fn parse(path: &str) -> Result<Self, PathError> {
        FieldPath::parse(path).map(Self)
    }

    pub fn path(&self) -> &FieldPath {
        &self.0
    }

    fn condition(&self, op: NumberOp, value: impl Into<f64>) -> Condition {
        Condition::number(self.0.clone(), op, value)
    }

    pub fn equals(&self, value: impl Into<f64>) -> Condition {
        self.condition(NumberOp::Equals, value)
    }

    pub fn not_equals(&self, value: impl Into<f64>) -> Condition {
        self.condition(NumberOp::NotEquals, value)
    }

    pub fn greater_than(&self, value: impl Into<f64>) -> Condition {
        self.condition(NumberOp::GreaterThan, value)
    }

    pub fn less_than(&self, value: impl Into<f64>) -> Condition {
        self.condition(NumberOp::LessThan, value)
    }

    pub fn greater_than_or_equal(&self, value: impl Into<f64>) -> Condition {
        self.condition(NumberOp::GreaterThanOrEqual, value)
    }

    pub fn less_than_or_equal(&self, value: impl Into<f64>) -> Condition {
        self.condition(NumberOp::LessThanOrEqual, value)
    }
}

/// a field holding a boolean
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BoolField(FieldPath);

impl BoolField {
    pub fn new(path: FieldPath) -> Self {
        Self(path)
    }

    pub fn parse(path: &str) -> Result<Self, PathError> {
        FieldPath::parse(path).map(Self)
    }

    pub fn path(&self) -> &FieldPath {
        &self.0
    }

    pub fn equals(&self, value: bool) -> Condition {
        Condition::boolean(self.0.clone(), BooleanOp::Equals, value)
    }

    pub fn not_equals(&self, value: bool) -> Condition {
        Condition::boolean(self.0.clone(), BooleanOp::NotEquals, value)
    }

    /// shorthand for `equals(true)`
    pub fn is_set(&self) -> Condition {
        self.equals(true)
    }
}
