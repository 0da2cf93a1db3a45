//! condition parser - converts JSON to expressions
//!
//! accepted shapes:
//! - `true` / `false`: literal expression
//! - `{ "operator": "AND" | "OR", "conditions": [...] }`, both keys optional
//!   (operator defaults to AND, conditions to empty)
//! - each condition: `{ "name": "<path>", "operator": "<OP>", "value": <literal> }`
//!
//! structural problems are errors. an unknown operator, or one that does not
//! fit the literal's type, is not: it parses into an unsupported comparison
//! that evaluates to false, so forms authored against newer operator sets
//! keep rendering.

use serde::{Deserialize, Deserializer};
use serde_json::Value as JsonValue;
use thiserror::Error;

use super::path::FieldPath;
use super::types::{Comparison, Condition, Expression, LogicalOp};

/// error type for parsing expressions
///
/// `path` is a JSONPath-style location inside the parsed document (`$` is the root)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{path}: {message}")]
pub struct ParseError {
    pub message: String,
    pub path: String,
}

impl ParseError {
    pub fn new(message: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path: path.into(),
        }
    }
}

const ROOT: &str = "$";

/// parse a JSON value into an expression
pub fn parse_expression(json: &JsonValue) -> Result<Expression, ParseError> {
    parse_expression_at(json, ROOT)
}

/// like [`parse_expression`], but `null` means "no expression"
pub fn parse_optional_expression(json: &JsonValue) -> Result<Option<Expression>, ParseError> {
    match json {
        JsonValue::Null => Ok(None),
        other => parse_expression(other).map(Some),
    }
}

/// parse a single condition object
pub fn parse_condition(json: &JsonValue) -> Result<Condition, ParseError> {
    parse_condition_at(json, ROOT)
}

pub(crate) fn parse_expression_at(json: &JsonValue, path: &str) -> Result<Expression, ParseError> {
    match json {
        JsonValue::Bool(b) => Ok(Expression::Literal(*b)),
        JsonValue::Object(obj) => {
            let operator = match obj.get("operator") {
                None | Some(JsonValue::Null) => LogicalOp::default(),
                Some(JsonValue::String(s)) => LogicalOp::parse(s).ok_or_else(|| {
                    ParseError::new(
                        format!("unknown logical operator '{}': use AND or OR", s),
                        format!("{}.operator", path),
                    )
                })?,
                Some(other) => {
                    return Err(ParseError::new(
                        format!("'operator' must be a string, got {}", other),
                        format!("{}.operator", path),
                    ))
                }
            };

            let conditions = match obj.get("conditions") {
                None | Some(JsonValue::Null) => Vec::new(),
                Some(JsonValue::Array(items)) => items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| {
                        parse_condition_at(item, &format!("{}.conditions[{}]", path, i))
                    })
                    .collect::<Result<Vec<_>, _>>()?,
                Some(_) => {
                    return Err(ParseError::new(
                        "'conditions' must be an array",
                        format!("{}.conditions", path),
                    ))
                }
            };

            Ok(Expression::Group {
                operator,
                conditions,
            })
        }
        other => Err(ParseError::new(
            format!("expected boolean or object, got {}", other),
            path,
        )),
    }
}

fn parse_condition_at(json: &JsonValue, path: &str) -> Result<Condition, ParseError> {
    let obj = json
        .as_object()
        .ok_or_else(|| ParseError::new("condition must be an object", path))?;

    let name = match obj.get("name") {
        Some(JsonValue::String(s)) => FieldPath::parse(s)
            .map_err(|e| ParseError::new(e.to_string(), format!("{}.name", path)))?,
        Some(_) => {
            return Err(ParseError::new(
                "'name' must be a string",
                format!("{}.name", path),
            ))
        }
        None => return Err(ParseError::new("missing 'name'", path)),
    };

    let operator = match obj.get("operator") {
        Some(JsonValue::String(s)) => s.as_str(),
        Some(_) => {
            return Err(ParseError::new(
                "'operator' must be a string",
                format!("{}.operator", path),
            ))
        }
        None => return Err(ParseError::new("missing 'operator'", path)),
    };

    // an absent value is kept as null and ends up unsupported
    let value = obj.get("value").unwrap_or(&JsonValue::Null);

    Ok(Condition::new(name, Comparison::from_parts(operator, value)))
}

impl<'de> Deserialize<'de> for Expression {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let json = JsonValue::deserialize(deserializer)?;
        parse_expression(&json).map_err(serde::de::Error::custom)
    }
}

impl<'de> Deserialize<'de> for Condition {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let json = JsonValue::deserialize(deserializer)?;
        parse_condition(&json).map_err(serde::de::Error::custom)
    }
}
