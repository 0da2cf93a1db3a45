//! in-memory form state
//!
//! holds the form value tree and field registrations, and notifies
//! subscribers through a `ChangeBus` on every write.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, Weak};

use serde::Serialize;
use serde_json::Value as JsonValue;
use thiserror::Error;
use tokio::sync::mpsc;

use super::events::{ChangeBus, FieldChange};
use super::FormState;
use crate::conditions::{FieldPath, PathError};

/// a write the store refused; nothing was changed and nobody was notified
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Path(#[from] PathError),
    #[error("form values are unavailable: a writer panicked while holding the lock")]
    Poisoned,
}

// ============================================================================
// Registration
// ============================================================================

/// a field registered with the form
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldRegistration {
    pub name: FieldPath,
    /// written to the value tree on registration when the path is absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<JsonValue>,
    /// validation rules, passed through untouched
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rules: Option<JsonValue>,
    /// drop the field's value when it is unregistered
    pub should_unregister: bool,
}

impl FieldRegistration {
    pub fn new(name: FieldPath) -> Self {
        Self {
            name,
            default_value: None,
            rules: None,
            should_unregister: false,
        }
    }

    pub fn with_default(mut self, value: JsonValue) -> Self {
        self.default_value = Some(value);
        self
    }

    pub fn with_rules(mut self, rules: JsonValue) -> Self {
        self.rules = Some(rules);
        self
    }

    pub fn with_should_unregister(mut self, should_unregister: bool) -> Self {
        self.should_unregister = should_unregister;
        self
    }
}

// ============================================================================
// Subscription
// ============================================================================

/// a live subscription to field changes; unsubscribes when dropped
pub struct Subscription {
    id: u64,
    paths: Vec<FieldPath>,
    receiver: mpsc::UnboundedReceiver<FieldChange>,
    bus: Weak<ChangeBus>,
}

impl Subscription {
    /// subscribe to `paths` on `bus`
    pub fn new(bus: &Arc<ChangeBus>, paths: Vec<FieldPath>) -> Self {
        let (id, receiver) = bus.subscribe(paths.clone());
        Self {
            id,
            paths,
            receiver,
            bus: Arc::downgrade(bus),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn paths(&self) -> &[FieldPath] {
        &self.paths
    }

    /// take every notification received so far
    pub fn drain(&mut self) -> Vec<FieldChange> {
        let mut changes = Vec::new();
        while let Ok(change) = self.receiver.try_recv() {
            changes.push(change);
        }
        changes
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(bus) = self.bus.upgrade() {
            bus.unsubscribe(self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("paths", &self.paths)
            .finish()
    }
}

// ============================================================================
// FormStore
// ============================================================================

/// in-memory form value tree with change notifications
pub struct FormStore {
    values: RwLock<JsonValue>,
    registrations: RwLock<HashMap<FieldPath, FieldRegistration>>,
    bus: Arc<ChangeBus>,
}

impl FormStore {
    pub fn new() -> Self {
        Self::with_values(JsonValue::Object(serde_json::Map::new()))
    }

    pub fn with_values(values: JsonValue) -> Self {
        Self {
            values: RwLock::new(values),
            registrations: RwLock::new(HashMap::new()),
            bus: Arc::new(ChangeBus::new()),
        }
    }

    /// write a single value and notify affected subscribers
    pub fn set_value(&self, path: &FieldPath, value: JsonValue) -> Result<(), StoreError> {
        {
            let mut values = self.values.write().map_err(|_| StoreError::Poisoned)?;
            path.assign(&mut values, value)?;
        }
        let notified = self.bus.emit(FieldChange::set(path.clone()));
        tracing::trace!(path = %path, notified, "field value set");
        Ok(())
    }

    /// read one value
    pub fn get_value(&self, path: &FieldPath) -> Option<JsonValue> {
        self.values
            .read()
            .ok()
            .and_then(|values| path.resolve(&values).cloned())
    }

    /// replace the whole value tree and notify every subscriber
    pub fn reset(&self, new_values: JsonValue) -> Result<(), StoreError> {
        {
            let mut values = self.values.write().map_err(|_| StoreError::Poisoned)?;
            *values = new_values;
        }
        let notified = self.bus.emit(FieldChange::reset());
        tracing::debug!(notified, "form values reset");
        Ok(())
    }

    /// remove a registration; drops the value too when the field asked for it
    pub fn unregister(&self, path: &FieldPath) -> Option<FieldRegistration> {
        let registration = self
            .registrations
            .write()
            .ok()
            .and_then(|mut regs| regs.remove(path))?;

        if registration.should_unregister {
            let removed = self
                .values
                .write()
                .ok()
                .and_then(|mut values| path.remove(&mut values));
            if removed.is_some() {
                self.bus.emit(FieldChange::removed(path.clone()));
            }
        }

        Some(registration)
    }

    pub fn registration(&self, path: &FieldPath) -> Option<FieldRegistration> {
        self.registrations
            .read()
            .ok()
            .and_then(|regs| regs.get(path).cloned())
    }

    pub fn registered_count(&self) -> usize {
        self.registrations.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn subscriber_count(&self) -> usize {
        self.bus.subscriber_count()
    }
}

impl Default for FormStore {
    fn default() -> Self {
        Self::new()
    }
}

impl FormState for FormStore {
    fn watch(&self, names: &[FieldPath]) -> Vec<Option<JsonValue>> {
        // one read lock for all names, so the values belong to the same instant
        match self.values.read() {
            Ok(values) => names
                .iter()
                .map(|name| name.resolve(&values).cloned())
                .collect(),
            Err(_) => vec![None; names.len()],
        }
    }

    fn get_values(&self) -> JsonValue {
        self.values
            .read()
            .map(|values| values.clone())
            .unwrap_or(JsonValue::Null)
    }

    fn subscribe(&self, names: Vec<FieldPath>) -> Subscription {
        Subscription::new(&self.bus, names)
    }

    fn register(&self, registration: FieldRegistration) {
        if let Some(default) = &registration.default_value {
            let missing = self.get_value(&registration.name).is_none();
            if missing {
                if let Err(e) = self.set_value(&registration.name, default.clone()) {
                    tracing::warn!(field = %registration.name, "default not written: {}", e);
                }
            }
        }

        if let Ok(mut regs) = self.registrations.write() {
            regs.insert(registration.name.clone(), registration);
        }
    }
}
