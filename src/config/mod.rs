//! form definition files
//!
//! definitions are JSON5 (plain JSON works too). loading returns the raw
//! definition; `FormDefinition::resolve_fields` binds it to a value tree and
//! `verify` reports authoring mistakes without touching any values.

mod schema;

pub use schema::{FieldArrayDef, FieldDef, FormDefinition, Issue, ResolvedField};

use anyhow::{anyhow, Context, Result};
use serde_json::Value as JsonValue;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use strsim::levenshtein;

use crate::conditions::{Comparison, Expression, FieldPath, ValueKind};
use crate::form::FieldRegistration;

/// max edit distance for "did you mean" suggestions
const SUGGESTION_THRESHOLD: usize = 2;

pub fn parse(text: &str) -> Result<FormDefinition> {
    json5::from_str(text).context("failed to parse form definition")
}

pub fn load(path: &Path) -> Result<FormDefinition> {
    if !path.exists() {
        return Err(anyhow!("form definition not found: {}", path.display()));
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read form definition: {}", path.display()))?;

    json5::from_str(&content)
        .with_context(|| format!("failed to parse form definition: {}", path.display()))
}

// ============================================================================
// Resolution
// ============================================================================

impl FormDefinition {
    /// bind every field to its location in `values`
    ///
    /// array fields are repeated once per item currently present at the
    /// array's path, with names and conditions nested under `<array>.<index>`.
    pub fn resolve_fields(&self, values: &JsonValue) -> Result<Vec<ResolvedField>> {
        let mut resolved = Vec::new();

        for (i, field) in self.fields.iter().enumerate() {
            let location = format!("fields[{}]", i);
            resolved.push(resolve_field(field, None, self.show_asterisk, &location)?);
        }

        for (i, array) in self.field_arrays.iter().enumerate() {
            let location = format!("field_arrays[{}]", i);
            let array_path = array
                .path()
                .with_context(|| format!("{}: invalid array name '{}'", location, array.name))?;

            let len = array_path
                .resolve(values)
                .and_then(JsonValue::as_array)
                .map(Vec::len)
                .unwrap_or(0);

            for index in 0..len {
                let prefix = array_path.index(index);
                for (j, field) in array.fields.iter().enumerate() {
                    let location = format!("{}.fields[{}]", location, j);
                    resolved.push(resolve_field(
                        field,
                        Some(&prefix),
                        self.show_asterisk,
                        &location,
                    )?);
                }
            }
        }

        Ok(resolved)
    }

    /// one registration per field array, carrying its array-level rules
    pub fn array_registrations(&self) -> Result<Vec<FieldRegistration>> {
        self.field_arrays
            .iter()
            .enumerate()
            .map(|(i, array)| {
                array.registration().with_context(|| {
                    format!("field_arrays[{}]: invalid array name '{}'", i, array.name)
                })
            })
            .collect()
    }

    /// number of declared fields, not counting array repetitions
    pub fn field_count(&self) -> usize {
        self.fields.len() + self.field_arrays.iter().map(|a| a.fields.len()).sum::<usize>()
    }
}

fn resolve_field(
    field: &FieldDef,
    prefix: Option<&FieldPath>,
    show_asterisk: bool,
    location: &str,
) -> Result<ResolvedField> {
    let name = field
        .path()
        .with_context(|| format!("{}: invalid field name '{}'", location, field.name))?;
    let visibility = field
        .visibility_expression()
        .with_context(|| format!("{}.visibility: invalid expression", location))?;
    let disabled = field
        .disabled_expression()
        .with_context(|| format!("{}.disabled: invalid expression", location))?;

    let scope = |expression: Option<Expression>| {
        expression.map(|e| match prefix {
            Some(prefix) => Arc::new(e.prefixed(prefix)),
            None => Arc::new(e),
        })
    };

    Ok(ResolvedField {
        name: match prefix {
            Some(prefix) => name.prefixed(prefix),
            None => name,
        },
        label: field.display_label(show_asterisk),
        default: field.default.clone(),
        rules: field.rules.clone(),
        visibility: scope(visibility),
        disabled: scope(disabled),
        should_unregister: field.should_unregister,
    })
}

// ============================================================================
// Verification
// ============================================================================

/// check a definition and return every issue found
pub fn verify(definition: &FormDefinition) -> Vec<Issue> {
    let mut issues = Vec::new();

    let top_level: Vec<(String, &FieldDef)> = definition
        .fields
        .iter()
        .enumerate()
        .map(|(i, f)| (format!("fields[{}]", i), f))
        .collect();

    let mut scope = Scope::collect(&top_level, &mut issues);
    for (i, array) in definition.field_arrays.iter().enumerate() {
        match array.path() {
            Ok(path) => scope.arrays.push(path),
            Err(e) => issues.push(Issue::new(
                format!("field_arrays[{}]", i),
                format!("invalid array name '{}': {}", array.name, e),
            )),
        }
    }
    check_conditions(&top_level, &scope, &mut issues);

    // item fields see their siblings only
    for (i, array) in definition.field_arrays.iter().enumerate() {
        let item_fields: Vec<(String, &FieldDef)> = array
            .fields
            .iter()
            .enumerate()
            .map(|(j, f)| (format!("field_arrays[{}].fields[{}]", i, j), f))
            .collect();

        let scope = Scope::collect(&item_fields, &mut issues);
        check_conditions(&item_fields, &scope, &mut issues);
    }

    issues
}

/// field names a condition may refer to
#[derive(Default)]
struct Scope {
    fields: Vec<FieldPath>,
    defaults: HashMap<FieldPath, ValueKind>,
    arrays: Vec<FieldPath>,
}

impl Scope {
    fn collect(fields: &[(String, &FieldDef)], issues: &mut Vec<Issue>) -> Self {
        let mut scope = Scope::default();
        let mut seen = HashSet::new();

        for (location, field) in fields {
            let path = match field.path() {
                Ok(path) => path,
                Err(e) => {
                    issues.push(Issue::new(
                        location.clone(),
                        format!("invalid field name '{}': {}", field.name, e),
                    ));
                    continue;
                }
            };

            if !seen.insert(path.clone()) {
                issues.push(Issue::new(
                    location.clone(),
                    format!("duplicate field name '{}'", path),
                ));
                continue;
            }

            if let Some(kind) = field.default.as_ref().and_then(ValueKind::of) {
                scope.defaults.insert(path.clone(), kind);
            }
            scope.fields.push(path);
        }

        scope
    }

    fn declares(&self, name: &FieldPath) -> bool {
        self.fields.iter().any(|f| f.overlaps(name)) || self.arrays.iter().any(|a| a.contains(name))
    }

    /// closest declared name within the suggestion threshold
    fn suggest(&self, name: &FieldPath) -> Option<String> {
        self.fields
            .iter()
            .chain(self.arrays.iter())
            .map(|f| (levenshtein(name.as_str(), f.as_str()), f))
            .filter(|(distance, _)| *distance <= SUGGESTION_THRESHOLD)
            .min_by_key(|(distance, _)| *distance)
            .map(|(_, f)| f.to_string())
    }
}

fn check_conditions(fields: &[(String, &FieldDef)], scope: &Scope, issues: &mut Vec<Issue>) {
    for (location, field) in fields {
        for (gate, parsed) in [
            ("visibility", field.visibility_expression()),
            ("disabled", field.disabled_expression()),
        ] {
            let gate_location = format!("{}.{}", location, gate);
            let expression = match parsed {
                Ok(Some(expression)) => expression,
                Ok(None) => continue,
                Err(e) => {
                    issues.push(Issue::new(gate_location, e.to_string()));
                    continue;
                }
            };

            for (k, condition) in expression.conditions().iter().enumerate() {
                let location = format!("{}.conditions[{}]", gate_location, k);

                if let Comparison::Unsupported { reason, .. } = &condition.comparison {
                    issues.push(Issue::new(location.clone(), reason.clone()));
                }

                if !scope.declares(&condition.name) {
                    let mut issue = Issue::new(
                        location.clone(),
                        format!("condition refers to unknown field '{}'", condition.name),
                    );
                    if let Some(suggestion) = scope.suggest(&condition.name) {
                        issue = issue.with_suggestion(suggestion);
                    }
                    issues.push(issue);
                    continue;
                }

                let declared = scope.defaults.get(&condition.name);
                if let (Some(declared), Some(expected)) = (declared, condition.comparison.kind()) {
                    if *declared != expected {
                        issues.push(Issue::new(
                            location,
                            format!(
                                "{} compares '{}' as a {}, but its default is a {}",
                                condition.comparison.operator_name(),
                                condition.name,
                                expected,
                                declared
                            ),
                        ));
                    }
                }
            }
        }
    }
}
