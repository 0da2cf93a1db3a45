//! reactive binding between expressions and live form state
//!
//! a `ConditionBinding` subscribes to exactly the fields its expression
//! reads, and re-evaluates when one of them changes. the result feeds a
//! gate: visibility (render the field at all) or disabled (accept input).

use std::sync::Arc;

use serde::Serialize;

use crate::conditions::{evaluate, Expression, FieldPath, Snapshot};
use crate::form::{FormState, Subscription};

// ============================================================================
// Gate
// ============================================================================

/// which field property a binding drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Gate {
    /// field (with label and error) is rendered
    Visibility,
    /// rendered field refuses input
    Disabled,
}

impl Gate {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gate::Visibility => "visibility",
            Gate::Disabled => "disabled",
        }
    }

    /// value used when there is nothing to evaluate (no expression, or an
    /// empty condition list): visible, and not disabled
    pub fn default_value(&self) -> bool {
        match self {
            Gate::Visibility => true,
            Gate::Disabled => false,
        }
    }

    /// gate value for an optional expression
    pub fn resolve(&self, expression: Option<&Expression>, snapshot: &Snapshot) -> bool {
        match expression {
            None => self.default_value(),
            Some(e) if e.is_empty() => self.default_value(),
            Some(e) => evaluate(e, snapshot),
        }
    }
}

impl std::fmt::Display for Gate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// ConditionBinding
// ============================================================================

/// one gate kept in sync with the fields its expression depends on
#[derive(Debug)]
pub struct ConditionBinding {
    gate: Gate,
    expression: Option<Arc<Expression>>,
    dependencies: Vec<FieldPath>,
    /// `None` when the expression reads no fields
    subscription: Option<Subscription>,
    value: bool,
    evaluations: u64,
}

impl ConditionBinding {
    /// subscribe to the expression's fields and compute the initial value
    pub fn mount<S: FormState + ?Sized>(
        gate: Gate,
        expression: Option<Arc<Expression>>,
        store: &S,
    ) -> Self {
        let mut binding = Self {
            gate,
            expression: None,
            dependencies: Vec::new(),
            subscription: None,
            value: gate.default_value(),
            evaluations: 0,
        };
        binding.attach(expression, store);
        binding
    }

    pub fn gate(&self) -> Gate {
        self.gate
    }

    /// latest gate value
    pub fn value(&self) -> bool {
        self.value
    }

    pub fn expression(&self) -> Option<&Arc<Expression>> {
        self.expression.as_ref()
    }

    /// fields this binding is subscribed to
    pub fn dependencies(&self) -> &[FieldPath] {
        &self.dependencies
    }

    /// number of evaluations since mount
    pub fn evaluations(&self) -> u64 {
        self.evaluations
    }

    /// process pending change notifications
    ///
    /// re-evaluates once if any notification arrived, no matter how many.
    /// returns true when the gate value changed.
    pub fn poll<S: FormState + ?Sized>(&mut self, store: &S) -> bool {
        let pending = match self.subscription.as_mut() {
            Some(sub) => sub.drain().len(),
            None => 0,
        };
        if pending == 0 {
            return false;
        }

        tracing::trace!(gate = %self.gate, pending, "dependency changed");
        let previous = self.value;
        self.recompute(store);
        previous != self.value
    }

    /// swap the expression
    ///
    /// the same `Arc`, or an equal expression, keeps the current subscription
    /// and value. returns true when the gate value changed.
    pub fn set_expression<S: FormState + ?Sized>(
        &mut self,
        expression: Option<Arc<Expression>>,
        store: &S,
    ) -> bool {
        let unchanged = match (&self.expression, &expression) {
            (None, None) => true,
            (Some(current), Some(new)) => Arc::ptr_eq(current, new) || current == new,
            _ => false,
        };
        if unchanged {
            return false;
        }

        let previous = self.value;
        self.attach(expression, store);
        previous != self.value
    }

    fn attach<S: FormState + ?Sized>(&mut self, expression: Option<Arc<Expression>>, store: &S) {
        let dependencies = expression
            .as_deref()
            .map(Expression::dependencies)
            .unwrap_or_default();

        // drop the old subscription before making the new one
        self.subscription = None;
        self.subscription = if dependencies.is_empty() {
            None
        } else {
            Some(store.subscribe(dependencies.clone()))
        };

        tracing::debug!(
            gate = %self.gate,
            dependencies = dependencies.len(),
            "binding attached"
        );

        self.expression = expression;
        self.dependencies = dependencies;
        self.recompute(store);
    }

    fn recompute<S: FormState + ?Sized>(&mut self, store: &S) {
        let snapshot = if self.dependencies.is_empty() {
            Snapshot::new()
        } else {
            Snapshot::from_watched(&self.dependencies, store.watch(&self.dependencies))
        };

        self.value = self.gate.resolve(self.expression.as_deref(), &snapshot);
        self.evaluations += 1;

        tracing::debug!(gate = %self.gate, value = self.value, "binding evaluated");
    }
}

// ============================================================================
// FieldGates
// ============================================================================

/// visibility and disabled state of one field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldState {
    pub visible: bool,
    pub disabled: bool,
}

/// the two independent bindings of a field wrapper
#[derive(Debug)]
pub struct FieldGates {
    name: FieldPath,
    visibility: ConditionBinding,
    disabled: ConditionBinding,
}

impl FieldGates {
    pub fn mount<S: FormState + ?Sized>(
        name: FieldPath,
        visibility: Option<Arc<Expression>>,
        disabled: Option<Arc<Expression>>,
        store: &S,
    ) -> Self {
        Self {
            name,
            visibility: ConditionBinding::mount(Gate::Visibility, visibility, store),
            disabled: ConditionBinding::mount(Gate::Disabled, disabled, store),
        }
    }

    pub fn name(&self) -> &FieldPath {
        &self.name
    }

    pub fn state(&self) -> FieldState {
        FieldState {
            visible: self.visibility.value(),
            disabled: self.disabled.value(),
        }
    }

    pub fn visibility(&self) -> &ConditionBinding {
        &self.visibility
    }

    pub fn disabled(&self) -> &ConditionBinding {
        &self.disabled
    }

    /// poll both bindings; returns true when either value changed
    pub fn poll<S: FormState + ?Sized>(&mut self, store: &S) -> bool {
        let visibility_changed = self.visibility.poll(store);
        let disabled_changed = self.disabled.poll(store);
        visibility_changed || disabled_changed
    }

    pub fn set_visibility<S: FormState + ?Sized>(
        &mut self,
        expression: Option<Arc<Expression>>,
        store: &S,
    ) -> bool {
        self.visibility.set_expression(expression, store)
    }

    pub fn set_disabled<S: FormState + ?Sized>(
        &mut self,
        expression: Option<Arc<Expression>>,
        store: &S,
    ) -> bool {
        self.disabled.set_expression(expression, store)
    }
}
