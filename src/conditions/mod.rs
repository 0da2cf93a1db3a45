//! condition evaluation for field visibility and disabled state
//!
//! an expression is either a literal boolean or a flat list of field
//! conditions joined by AND / OR. each condition compares the current value
//! of one field against a literal:
//! - strings: EQUALS, NOT_EQUALS, STARTS_WITH, ENDS_WITH, INCLUDES, NOT_INCLUDES
//! - numbers: EQUALS, NOT_EQUALS, GREATER_THAN, LESS_THAN,
//!   GREATER_THAN_OR_EQUAL, LESS_THAN_OR_EQUAL
//! - booleans: EQUALS, NOT_EQUALS

mod eval;
mod field;
mod parser;
mod path;
mod types;

pub use eval::{evaluate, evaluate_optional, evaluate_values, Snapshot};
pub use field::{BoolField, NumberField, TextField};
pub use parser::{parse_condition, parse_expression, parse_optional_expression, ParseError};
pub use path::{FieldPath, PathError};
pub use types::{
    is_known_operator, BooleanOp, Comparison, Condition, Expression, LogicalOp, NumberOp,
    StringOp, ValueKind,
};
