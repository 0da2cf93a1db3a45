//! core types for the condition system

use std::fmt;

use serde::{Serialize, Serializer};
use serde_json::{json, Value as JsonValue};

use super::path::FieldPath;

// ============================================================================
// Operators
// ============================================================================

/// how the conditions of a group are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LogicalOp {
    /// every condition must hold
    #[default]
    And,
    /// at least one condition must hold
    Or,
}

impl LogicalOp {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "AND" => Some(LogicalOp::And),
            "OR" => Some(LogicalOp::Or),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogicalOp::And => "AND",
            LogicalOp::Or => "OR",
        }
    }
}

impl fmt::Display for LogicalOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// operators valid against string field values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StringOp {
    Equals,
    NotEquals,
    StartsWith,
    EndsWith,
    Includes,
    NotIncludes,
}

impl StringOp {
    pub const ALL: [StringOp; 6] = [
        StringOp::Equals,
        StringOp::NotEquals,
        StringOp::StartsWith,
        StringOp::EndsWith,
        StringOp::Includes,
        StringOp::NotIncludes,
    ];

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.as_str() == s)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StringOp::Equals => "EQUALS",
            StringOp::NotEquals => "NOT_EQUALS",
            StringOp::StartsWith => "STARTS_WITH",
            StringOp::EndsWith => "ENDS_WITH",
            StringOp::Includes => "INCLUDES",
            StringOp::NotIncludes => "NOT_INCLUDES",
        }
    }
}

/// operators valid against numeric field values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumberOp {
    Equals,
    NotEquals,
    GreaterThan,
    LessThan,
    GreaterThanOrEqual,
    LessThanOrEqual,
}

impl NumberOp {
    pub const ALL: [NumberOp; 6] = [
        NumberOp::Equals,
        NumberOp::NotEquals,
        NumberOp::GreaterThan,
        NumberOp::LessThan,
        NumberOp::GreaterThanOrEqual,
        NumberOp::LessThanOrEqual,
    ];

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.as_str() == s)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NumberOp::Equals => "EQUALS",
            NumberOp::NotEquals => "NOT_EQUALS",
            NumberOp::GreaterThan => "GREATER_THAN",
            NumberOp::LessThan => "LESS_THAN",
            NumberOp::GreaterThanOrEqual => "GREATER_THAN_OR_EQUAL",
            NumberOp::LessThanOrEqual => "LESS_THAN_OR_EQUAL",
        }
    }
}

/// operators valid against boolean field values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BooleanOp {
    Equals,
    NotEquals,
}

impl BooleanOp {
    pub const ALL: [BooleanOp; 2] = [BooleanOp::Equals, BooleanOp::NotEquals];

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.as_str() == s)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BooleanOp::Equals => "EQUALS",
            BooleanOp::NotEquals => "NOT_EQUALS",
        }
    }
}

/// check if `s` names any operator of any value type
pub fn is_known_operator(s: &str) -> bool {
    StringOp::parse(s).is_some() || NumberOp::parse(s).is_some() || BooleanOp::parse(s).is_some()
}

// ============================================================================
// Comparison
// ============================================================================

/// the value type a comparison applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    String,
    Number,
    Boolean,
}

impl ValueKind {
    /// kind of a JSON value, `None` for null, arrays and objects
    pub fn of(value: &JsonValue) -> Option<Self> {
        match value {
            JsonValue::String(_) => Some(ValueKind::String),
            JsonValue::Number(_) => Some(ValueKind::Number),
            JsonValue::Bool(_) => Some(ValueKind::Boolean),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::String => "string",
            ValueKind::Number => "number",
            ValueKind::Boolean => "boolean",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// an operator fused with its literal, typed by value category
///
/// `Unsupported` only comes out of the parser, for data whose operator is
/// unknown or invalid for the literal's type. it always evaluates to false.
#[derive(Debug, Clone, PartialEq)]
pub enum Comparison {
    Text { op: StringOp, value: String },
    Number { op: NumberOp, value: f64 },
    Boolean { op: BooleanOp, value: bool },
    Unsupported {
        operator: String,
        value: JsonValue,
        reason: String,
    },
}

impl Comparison {
    /// build a comparison from untyped operator and literal
    ///
    /// never fails: anything that does not form a valid pair becomes
    /// `Unsupported` with a reason
    pub fn from_parts(operator: &str, value: &JsonValue) -> Self {
        let unsupported = |reason: String| Comparison::Unsupported {
            operator: operator.to_string(),
            value: value.clone(),
            reason,
        };

        if !is_known_operator(operator) {
            return unsupported(format!("unknown operator '{}'", operator));
        }

        match value {
            JsonValue::String(s) => match StringOp::parse(operator) {
                Some(op) => Comparison::Text {
                    op,
                    value: s.clone(),
                },
                None => unsupported(format!("operator {} is not valid for a string", operator)),
            },
            JsonValue::Number(n) => match (NumberOp::parse(operator), n.as_f64()) {
                (Some(op), Some(value)) => Comparison::Number { op, value },
                (None, _) => {
                    unsupported(format!("operator {} is not valid for a number", operator))
                }
                (_, None) => unsupported(format!("number {} is out of range", n)),
            },
            JsonValue::Bool(b) => match BooleanOp::parse(operator) {
                Some(op) => Comparison::Boolean { op, value: *b },
                None => unsupported(format!("operator {} is not valid for a boolean", operator)),
            },
            JsonValue::Null => unsupported("comparison value is null".to_string()),
            JsonValue::Array(_) | JsonValue::Object(_) => unsupported(
                "comparison value must be a string, number or boolean".to_string(),
            ),
        }
    }

    pub fn operator_name(&self) -> &str {
        match self {
            Comparison::Text { op, .. } => op.as_str(),
            Comparison::Number { op, .. } => op.as_str(),
            Comparison::Boolean { op, .. } => op.as_str(),
            Comparison::Unsupported { operator, .. } => operator,
        }
    }

    /// the literal as JSON
    pub fn literal(&self) -> JsonValue {
        match self {
            Comparison::Text { value, .. } => JsonValue::String(value.clone()),
            Comparison::Number { value, .. } => number_json(*value),
            Comparison::Boolean { value, .. } => JsonValue::Bool(*value),
            Comparison::Unsupported { value, .. } => value.clone(),
        }
    }

    /// value type this comparison expects, `None` when unsupported
    pub fn kind(&self) -> Option<ValueKind> {
        match self {
            Comparison::Text { .. } => Some(ValueKind::String),
            Comparison::Number { .. } => Some(ValueKind::Number),
            Comparison::Boolean { .. } => Some(ValueKind::Boolean),
            Comparison::Unsupported { .. } => None,
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, Comparison::Unsupported { .. })
    }
}

/// integral floats serialize as integers so `18` stays `18`
fn number_json(n: f64) -> JsonValue {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        json!(n as i64)
    } else {
        json!(n)
    }
}

// ============================================================================
// Condition
// ============================================================================

/// a single field comparison
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    /// the field whose current value is compared
    pub name: FieldPath,
    pub comparison: Comparison,
}

impl Condition {
    pub fn new(name: FieldPath, comparison: Comparison) -> Self {
        Self { name, comparison }
    }

    pub fn text(name: FieldPath, op: StringOp, value: impl Into<String>) -> Self {
        Self::new(
            name,
            Comparison::Text {
                op,
                value: value.into(),
            },
        )
    }

    pub fn number(name: FieldPath, op: NumberOp, value: impl Into<f64>) -> Self {
        Self::new(
            name,
            Comparison::Number {
                op,
                value: value.into(),
            },
        )
    }

    pub fn boolean(name: FieldPath, op: BooleanOp, value: bool) -> Self {
        Self::new(name, Comparison::Boolean { op, value })
    }

    /// same comparison against a field nested under `prefix`
    pub fn prefixed(&self, prefix: &FieldPath) -> Self {
        Self {
            name: self.name.prefixed(prefix),
            comparison: self.comparison.clone(),
        }
    }

    pub fn to_json(&self) -> JsonValue {
        json!({
            "name": self.name.as_str(),
            "operator": self.comparison.operator_name(),
            "value": self.comparison.literal(),
        })
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.name,
            self.comparison.operator_name(),
            self.comparison.literal()
        )
    }
}

impl Serialize for Condition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

// ============================================================================
// Expression
// ============================================================================

/// a visibility or disabled rule
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// fixed result, reads no fields
    Literal(bool),
    /// flat list of conditions joined by one logical operator
    Group {
        operator: LogicalOp,
        conditions: Vec<Condition>,
    },
}

impl Expression {
    pub fn always(value: bool) -> Self {
        Expression::Literal(value)
    }

    pub fn all(conditions: Vec<Condition>) -> Self {
        Expression::Group {
            operator: LogicalOp::And,
            conditions,
        }
    }

    pub fn any(conditions: Vec<Condition>) -> Self {
        Expression::Group {
            operator: LogicalOp::Or,
            conditions,
        }
    }

    /// check if this is a group without conditions (evaluates to true)
    pub fn is_empty(&self) -> bool {
        match self {
            Expression::Literal(_) => false,
            Expression::Group { conditions, .. } => conditions.is_empty(),
        }
    }

    pub fn conditions(&self) -> &[Condition] {
        match self {
            Expression::Literal(_) => &[],
            Expression::Group { conditions, .. } => conditions,
        }
    }

    /// distinct field paths read by this expression, in first-use order
    pub fn dependencies(&self) -> Vec<FieldPath> {
        let mut deps: Vec<FieldPath> = Vec::new();
        for condition in self.conditions() {
            if !deps.contains(&condition.name) {
                deps.push(condition.name.clone());
            }
        }
        deps
    }

    /// copy with every condition name nested under `prefix`
    pub fn prefixed(&self, prefix: &FieldPath) -> Self {
        match self {
            Expression::Literal(b) => Expression::Literal(*b),
            Expression::Group {
                operator,
                conditions,
            } => Expression::Group {
                operator: *operator,
                conditions: conditions.iter().map(|c| c.prefixed(prefix)).collect(),
            },
        }
    }

    pub fn to_json(&self) -> JsonValue {
        match self {
            Expression::Literal(b) => JsonValue::Bool(*b),
            Expression::Group {
                operator,
                conditions,
            } => json!({
                "operator": operator.as_str(),
                "conditions": conditions.iter().map(Condition::to_json).collect::<Vec<_>>(),
            }),
        }
    }
}

impl From<bool> for Expression {
    fn from(value: bool) -> Self {
        Expression::Literal(value)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Literal(b) => write!(f, "{}", b),
            Expression::Group {
                operator,
                conditions,
            } => {
                let name = match operator {
                    LogicalOp::And => "all",
                    LogicalOp::Or => "any",
                };
                write!(f, "{}(", name)?;
                for (i, c) in conditions.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", c)?;
                }
                write!(f, ")")
            }
        }
    }
}

impl Serialize for Expression {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}
