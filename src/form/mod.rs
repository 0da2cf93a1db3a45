//! form state boundary
//!
//! the binding layer only needs four things from a form-state engine: read
//! named values, read the whole tree, subscribe to named fields and register
//! fields. `FormState` captures that surface; `FormStore` is the in-memory
//! implementation used by the CLI and tests.

pub mod events;
mod store;

pub use events::{ChangeBus, ChangeKind, FieldChange};
pub use store::{FieldRegistration, FormStore, StoreError, Subscription};

use serde_json::Value as JsonValue;

use crate::conditions::FieldPath;

/// the operations the binding layer uses on a form-state engine
pub trait FormState {
    /// current values of `names`, in order, read at one instant
    fn watch(&self, names: &[FieldPath]) -> Vec<Option<JsonValue>>;

    /// the full value tree
    fn get_values(&self) -> JsonValue;

    /// subscribe to changes of exactly `names`
    fn subscribe(&self, names: Vec<FieldPath>) -> Subscription;

    /// register a field (default value and validation rules)
    fn register(&self, registration: FieldRegistration);
}
