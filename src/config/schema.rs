use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::conditions::{parse_optional_expression, Expression, FieldPath, ParseError, PathError};
use crate::form::FieldRegistration;

/// declarative form: plain fields plus repeated field groups
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FormDefinition {
    /// mark the labels of fields that carry validation rules
    #[serde(default)]
    pub show_asterisk: bool,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub field_arrays: Vec<FieldArrayDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<JsonValue>,
    /// validation rules, passed to the form store untouched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules: Option<JsonValue>,
    /// expression deciding whether the field is rendered
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<JsonValue>,
    /// expression deciding whether the field refuses input
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled: Option<JsonValue>,
    /// drop the value when the field goes away
    #[serde(default)]
    pub should_unregister: bool,
}

impl FieldDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: None,
            default: None,
            rules: None,
            visibility: None,
            disabled: None,
            should_unregister: false,
        }
    }

    pub fn path(&self) -> Result<FieldPath, PathError> {
        FieldPath::parse(&self.name)
    }

    pub fn visibility_expression(&self) -> Result<Option<Expression>, ParseError> {
        parse_gate(self.visibility.as_ref())
    }

    pub fn disabled_expression(&self) -> Result<Option<Expression>, ParseError> {
        parse_gate(self.disabled.as_ref())
    }

    /// label as rendered; the marker needs both the form flag and rules
    pub fn display_label(&self, show_asterisk: bool) -> Option<String> {
        self.label.as_ref().map(|label| {
            if show_asterisk && self.rules.is_some() {
                format!("{} *", label)
            } else {
                label.clone()
            }
        })
    }
}

fn parse_gate(json: Option<&JsonValue>) -> Result<Option<Expression>, ParseError> {
    match json {
        Some(json) => parse_optional_expression(json),
        None => Ok(None),
    }
}

/// fields repeated once per item of the array at `name`
///
/// item fields name their siblings relative to the item (`sku`, not
/// `items.0.sku`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldArrayDef {
    pub name: String,
    /// rules for the array as a whole (e.g. a minimum item count)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules: Option<JsonValue>,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
}

impl FieldArrayDef {
    pub fn path(&self) -> Result<FieldPath, PathError> {
        FieldPath::parse(&self.name)
    }

    /// registration for the array path itself; it never carries a default
    pub fn registration(&self) -> Result<FieldRegistration, PathError> {
        let registration = FieldRegistration::new(self.path()?);
        Ok(match &self.rules {
            Some(rules) => registration.with_rules(rules.clone()),
            None => registration,
        })
    }
}

/// a field bound to a concrete location in the value tree
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedField {
    pub name: FieldPath,
    pub label: Option<String>,
    pub default: Option<JsonValue>,
    pub rules: Option<JsonValue>,
    pub visibility: Option<Arc<Expression>>,
    pub disabled: Option<Arc<Expression>>,
    pub should_unregister: bool,
}

impl ResolvedField {
    pub fn registration(&self) -> FieldRegistration {
        let mut registration = FieldRegistration::new(self.name.clone())
            .with_should_unregister(self.should_unregister);
        if let Some(default) = &self.default {
            registration = registration.with_default(default.clone());
        }
        if let Some(rules) = &self.rules {
            registration = registration.with_rules(rules.clone());
        }
        registration
    }
}

/// verification finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    /// where in the definition, e.g. `fields[2].visibility.conditions[0]`
    pub location: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl Issue {
    pub fn new(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            message: message.into(),
            suggestion: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

impl std::fmt::Display for Issue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.location, self.message)?;
        if let Some(suggestion) = &self.suggestion {
            write!(f, " (did you mean '{}'?)", suggestion)?;
        }
        Ok(())
    }
}
