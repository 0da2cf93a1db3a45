// integration tests for parsing and evaluating expressions through the public API

use serde_json::json;
use suprform::conditions::{
    evaluate, evaluate_optional, evaluate_values, parse_expression, Expression, FieldPath,
    NumberField, Snapshot, TextField,
};

#[test]
fn test_authored_json_matches_builders() {
    let authored = json!({
        "operator": "OR",
        "conditions": [
            { "name": "country", "operator": "EQUALS", "value": "US" },
            { "name": "country", "operator": "EQUALS", "value": "CA" }
        ]
    });

    let country = TextField::parse("country").unwrap();
    let built = Expression::any(vec![country.equals("US"), country.equals("CA")]);

    assert_eq!(parse_expression(&authored).unwrap(), built);
    assert_eq!(built.to_string(), r#"any(country EQUALS "US", country EQUALS "CA")"#);
}

#[test]
fn test_deserialize_inside_larger_document() {
    #[derive(serde::Deserialize)]
    struct Field {
        name: String,
        visibility: Option<Expression>,
    }

    let field: Field = serde_json::from_value(json!({
        "name": "email",
        "visibility": {
            "conditions": [{ "name": "age", "operator": "GREATER_THAN_OR_EQUAL", "value": 18 }]
        }
    }))
    .unwrap();

    assert_eq!(field.name, "email");
    let visibility = field.visibility.unwrap();
    assert!(evaluate_values(&visibility, &json!({ "age": 18 })));
    assert!(!evaluate_values(&visibility, &json!({ "age": 17 })));
}

#[test]
fn test_snapshot_reads_only_dependencies() {
    let age = NumberField::parse("user.age").unwrap();
    let expression = Expression::all(vec![age.greater_than(18)]);

    let values = json!({ "user": { "age": 40, "name": "x" }, "other": true });
    let snapshot = Snapshot::capture(&expression, &values);

    assert_eq!(snapshot.len(), 1);
    assert!(snapshot.contains(&FieldPath::parse("user.age").unwrap()));
    assert!(evaluate(&expression, &snapshot));
}

#[test]
fn test_bracket_and_dot_paths_agree() {
    let expression = parse_expression(&json!({
        "conditions": [{ "name": "items[1].sku", "operator": "ENDS_WITH", "value": "-B" }]
    }))
    .unwrap();

    let values = json!({ "items": [{ "sku": "A-A" }, { "sku": "A-B" }] });
    assert!(evaluate_values(&expression, &values));
    assert_eq!(expression.dependencies()[0].as_str(), "items.1.sku");
}

#[test]
fn test_strict_typing_across_the_api() {
    let expression = parse_expression(&json!({
        "conditions": [{ "name": "age", "operator": "GREATER_THAN", "value": 18 }]
    }))
    .unwrap();

    // numeric strings are not numbers
    assert!(!evaluate_values(&expression, &json!({ "age": "21" })));
    assert!(evaluate_values(&expression, &json!({ "age": 21.5 })));
    assert!(!evaluate_values(&expression, &json!({ "age": null })));
}

#[test]
fn test_absent_expression_and_literals() {
    let empty = Snapshot::new();
    assert!(evaluate_optional(None, &empty));
    assert!(evaluate_optional(Some(&Expression::all(vec![])), &empty));
    assert!(!evaluate_optional(Some(&Expression::always(false)), &empty));
    assert!(evaluate(&parse_expression(&json!(true)).unwrap(), &empty));
}

#[test]
fn test_parse_error_points_at_offending_node() {
    let err = parse_expression(&json!({
        "conditions": [
            { "name": "a", "operator": "EQUALS", "value": 1 },
            { "operator": "EQUALS", "value": 1 }
        ]
    }))
    .unwrap_err();

    assert_eq!(err.path, "$.conditions[1]");
    assert!(err.message.contains("name"));
}
