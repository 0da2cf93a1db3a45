// integration tests for bindings over a custom form state implementation

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde_json::{json, Value as JsonValue};
use suprform::binding::{ConditionBinding, FieldGates, FieldState, Gate};
use suprform::conditions::{Expression, FieldPath, NumberField, TextField};
use suprform::form::{FieldRegistration, FormState, FormStore, Subscription};

/// wraps a FormStore and counts reads
struct CountingStore {
    inner: FormStore,
    watches: AtomicUsize,
    full_reads: AtomicUsize,
}

impl CountingStore {
    fn new(values: JsonValue) -> Self {
        Self {
            inner: FormStore::with_values(values),
            watches: AtomicUsize::new(0),
            full_reads: AtomicUsize::new(0),
        }
    }
}

impl FormState for CountingStore {
    fn watch(&self, names: &[FieldPath]) -> Vec<Option<JsonValue>> {
        self.watches.fetch_add(1, Ordering::SeqCst);
        self.inner.watch(names)
    }

    fn get_values(&self) -> JsonValue {
        self.full_reads.fetch_add(1, Ordering::SeqCst);
        self.inner.get_values()
    }

    fn subscribe(&self, names: Vec<FieldPath>) -> Subscription {
        self.inner.subscribe(names)
    }

    fn register(&self, registration: FieldRegistration) {
        self.inner.register(registration)
    }
}

fn path(s: &str) -> FieldPath {
    FieldPath::parse(s).unwrap()
}

#[test]
fn test_binding_reads_watched_fields_once_per_evaluation() {
    let store = CountingStore::new(json!({ "age": 21, "country": "US" }));
    let age = NumberField::parse("age").unwrap();
    let country = TextField::parse("country").unwrap();
    let expression = Arc::new(Expression::all(vec![
        age.greater_than(18),
        country.equals("US"),
    ]));

    let mut binding = ConditionBinding::mount(Gate::Visibility, Some(expression), &store);
    assert!(binding.value());
    assert_eq!(store.watches.load(Ordering::SeqCst), 1);

    store.inner.set_value(&path("age"), json!(12)).unwrap();
    store.inner.set_value(&path("country"), json!("CA")).unwrap();
    assert!(binding.poll(&store));
    assert!(!binding.value());

    // two notifications, one read
    assert_eq!(store.watches.load(Ordering::SeqCst), 2);
    assert_eq!(store.full_reads.load(Ordering::SeqCst), 0);
}

#[test]
fn test_literal_binding_never_reads() {
    let store = CountingStore::new(json!({}));
    let binding = ConditionBinding::mount(
        Gate::Disabled,
        Some(Arc::new(Expression::always(true))),
        &store,
    );

    assert!(binding.value());
    assert_eq!(store.watches.load(Ordering::SeqCst), 0);
}

#[test]
fn test_field_gates_follow_store_writes() {
    let store = FormStore::new();
    store.register(FieldRegistration::new(path("plan")).with_default(json!("free")));

    let plan = TextField::parse("plan").unwrap();
    let mut gates = FieldGates::mount(
        path("seats"),
        Some(Arc::new(Expression::all(vec![plan.not_equals("free")]))),
        Some(Arc::new(Expression::all(vec![plan.equals("enterprise")]))),
        &store,
    );
    assert_eq!(
        gates.state(),
        FieldState {
            visible: false,
            disabled: false
        }
    );

    store.set_value(&path("plan"), json!("team")).unwrap();
    assert!(gates.poll(&store));
    assert_eq!(
        gates.state(),
        FieldState {
            visible: true,
            disabled: false
        }
    );

    store.set_value(&path("plan"), json!("enterprise")).unwrap();
    assert!(gates.poll(&store));
    assert_eq!(
        gates.state(),
        FieldState {
            visible: true,
            disabled: true
        }
    );
}

#[test]
fn test_parent_write_notifies_nested_dependency() {
    let store = FormStore::with_values(json!({ "user": { "email": "a@b.c" } }));
    let email = TextField::parse("user.email").unwrap();
    let mut binding = ConditionBinding::mount(
        Gate::Visibility,
        Some(Arc::new(Expression::all(vec![email.ends_with(".org")]))),
        &store,
    );
    assert!(!binding.value());

    store.set_value(&path("user"), json!({ "email": "x@y.org" })).unwrap();
    assert!(binding.poll(&store));
    assert!(binding.value());
}

#[test]
fn test_unregistering_a_dependency_hides_dependent_field() {
    let store = FormStore::new();
    store.register(
        FieldRegistration::new(path("age"))
            .with_default(json!(30))
            .with_should_unregister(true),
    );

    let age = NumberField::parse("age").unwrap();
    let mut binding = ConditionBinding::mount(
        Gate::Visibility,
        Some(Arc::new(Expression::all(vec![age.greater_than(18)]))),
        &store,
    );
    assert!(binding.value());

    store.unregister(&path("age"));
    assert!(binding.poll(&store));
    assert!(!binding.value());
}
