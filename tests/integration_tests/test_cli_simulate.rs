// integration tests for the simulate command

use crate::common::*;
use tempfile::TempDir;

#[test]
fn test_simulate_reports_transitions() {
    let dir = TempDir::new().unwrap();
    let form = write_form(dir.path(), SAMPLE_FORM);

    let output = run_suprform(&[
        "--json",
        "simulate",
        form.to_str().unwrap(),
        "--set",
        "country=US",
        "--set",
        "age=30",
        "--set",
        "country=CA",
    ]);
    assert!(
        output.status.success(),
        "stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );

    let json = parse_jsonrpc(&output);
    let result = &json["result"];

    assert_eq!(field(&result["initial"], "state")["visible"], false);

    let steps = result["steps"].as_array().unwrap();
    assert_eq!(steps.len(), 3);

    // non-JSON values are strings
    assert_eq!(steps[0]["path"], "country");
    assert_eq!(steps[0]["value"], "US");
    let transitions = steps[0]["transitions"].as_array().unwrap();
    assert_eq!(transitions.len(), 1);
    assert_eq!(transitions[0]["name"], "state");
    assert_eq!(transitions[0]["before"]["visible"], false);
    assert_eq!(transitions[0]["after"]["visible"], true);

    assert_eq!(steps[1]["value"], 30);
    assert_eq!(steps[1]["transitions"][0]["name"], "email");

    // US -> CA keeps state visible
    assert!(steps[2]["transitions"].as_array().unwrap().is_empty());

    assert_eq!(field(&result["final"], "email")["visible"], true);
    assert_eq!(field(&result["final"], "state")["visible"], true);
}

#[test]
fn test_simulate_array_item() {
    let dir = TempDir::new().unwrap();
    let form = write_form(dir.path(), SAMPLE_FORM);

    let output = run_suprform(&[
        "--json",
        "simulate",
        form.to_str().unwrap(),
        "--values",
        r#"{ "items": [{ "sku": "A1" }] }"#,
        "--set",
        "items[0].sku=\"X9\"",
    ]);
    assert!(output.status.success());

    let json = parse_jsonrpc(&output);
    let step = &json["result"]["steps"][0];
    assert_eq!(step["path"], "items.0.sku");
    assert_eq!(step["transitions"][0]["name"], "items.0.qty");
    assert_eq!(step["transitions"][0]["after"]["visible"], true);
}

#[test]
fn test_simulate_text_output() {
    let dir = TempDir::new().unwrap();
    let form = write_form(dir.path(), SAMPLE_FORM);

    let output = run_suprform(&[
        "--no-json",
        "simulate",
        form.to_str().unwrap(),
        "--set",
        "age=20",
        "--set",
        "country=MX",
    ]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("set age = 20"));
    assert!(stdout.contains("email: hidden -> visible"));
    assert!(stdout.contains("(no changes)"));
    assert!(stdout.contains("final:"));
}

#[test]
fn test_simulate_rejects_bad_assignment() {
    let dir = TempDir::new().unwrap();
    let form = write_form(dir.path(), SAMPLE_FORM);

    let output = run_suprform(&[
        "--json",
        "simulate",
        form.to_str().unwrap(),
        "--set",
        "age",
    ]);
    assert_eq!(output.status.code(), Some(2));

    let json = parse_jsonrpc(&output);
    assert_eq!(json["error"]["code"], -32002);
}

#[test]
fn test_simulate_rejects_index_far_past_end() {
    let dir = TempDir::new().unwrap();
    let form = write_form(dir.path(), SAMPLE_FORM);

    let output = run_suprform(&[
        "--json",
        "simulate",
        form.to_str().unwrap(),
        "--values",
        r#"{ "items": [{ "sku": "A1" }] }"#,
        "--set",
        "items.99999999999999=1",
    ]);
    assert_eq!(output.status.code(), Some(2));

    let json = parse_jsonrpc(&output);
    assert_eq!(json["error"]["code"], -32002);
    assert!(json["error"]["message"]
        .as_str()
        .unwrap()
        .contains("items.99999999999999"));
}

#[test]
fn test_simulate_appends_array_item() {
    let dir = TempDir::new().unwrap();
    let form = write_form(dir.path(), SAMPLE_FORM);

    let output = run_suprform(&[
        "--json",
        "simulate",
        form.to_str().unwrap(),
        "--values",
        r#"{ "items": [{ "sku": "A1" }] }"#,
        "--set",
        "items.1.sku=X2",
    ]);
    assert!(
        output.status.success(),
        "stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );

    let json = parse_jsonrpc(&output);
    assert_eq!(json["result"]["steps"][0]["path"], "items.1.sku");
}
