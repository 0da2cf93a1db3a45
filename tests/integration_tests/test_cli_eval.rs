// integration tests for the eval command

use crate::common::*;
use tempfile::TempDir;

#[test]
fn test_eval_json_output() {
    let dir = TempDir::new().unwrap();
    let form = write_form(dir.path(), SAMPLE_FORM);

    let output = run_suprform(&[
        "--json",
        "eval",
        form.to_str().unwrap(),
        "--values",
        r#"{ "age": 21, "country": "US", "items": [{ "sku": "X1" }, { "sku": "B2" }] }"#,
    ]);
    assert!(
        output.status.success(),
        "stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );

    let json = parse_jsonrpc(&output);
    assert_eq!(json["jsonrpc"], "2.0");
    assert!(json["id"].is_null());

    let fields = &json["result"]["fields"];
    assert_eq!(fields.as_array().unwrap().len(), 9);

    assert_eq!(field(fields, "email")["visible"], true);
    assert_eq!(field(fields, "email")["label"], "Email *");
    // no rules, no marker
    assert_eq!(field(fields, "age")["label"], "Age");
    assert_eq!(field(fields, "state")["visible"], true);
    assert_eq!(field(fields, "newsletter")["disabled"], true);
    assert_eq!(field(fields, "newsletter")["visible"], true);
    assert_eq!(field(fields, "items.0.qty")["visible"], true);
    assert_eq!(field(fields, "items.1.qty")["visible"], false);
}

#[test]
fn test_eval_applies_defaults() {
    let dir = TempDir::new().unwrap();
    let form = write_form(dir.path(), SAMPLE_FORM);

    let output = run_suprform(&["--json", "eval", form.to_str().unwrap()]);
    assert!(output.status.success());

    let json = parse_jsonrpc(&output);
    let result = &json["result"];

    // country defaults to MX, age to 0
    assert_eq!(result["values"]["country"], "MX");
    assert!(result["values"]["age"].is_number());
    assert_eq!(field(&result["fields"], "email")["visible"], false);
    assert_eq!(field(&result["fields"], "state")["visible"], false);
}

#[test]
fn test_eval_values_from_file() {
    let dir = TempDir::new().unwrap();
    let form = write_form(dir.path(), SAMPLE_FORM);
    let values = dir.path().join("values.json");
    std::fs::write(&values, r#"{ "country": "CA" }"#).unwrap();

    let output = run_suprform(&[
        "--json",
        "eval",
        form.to_str().unwrap(),
        "--values",
        values.to_str().unwrap(),
    ]);
    assert!(output.status.success());

    let json = parse_jsonrpc(&output);
    assert_eq!(field(&json["result"]["fields"], "state")["visible"], true);
}

#[test]
fn test_eval_text_output() {
    let dir = TempDir::new().unwrap();
    let form = write_form(dir.path(), SAMPLE_FORM);

    let output = run_suprform(&[
        "--no-json",
        "eval",
        form.to_str().unwrap(),
        "--values",
        r#"{ "age": 5 }"#,
    ]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let email = stdout
        .lines()
        .find(|l| l.starts_with("email"))
        .expect("email line");
    assert!(email.contains("hidden"));
    assert!(email.contains("enabled"));

    let newsletter = stdout
        .lines()
        .find(|l| l.starts_with("newsletter"))
        .expect("newsletter line");
    assert!(newsletter.contains("visible"));
    assert!(newsletter.contains("disabled"));
}

#[test]
fn test_eval_quiet_prints_nothing() {
    let dir = TempDir::new().unwrap();
    let form = write_form(dir.path(), SAMPLE_FORM);

    let output = run_suprform(&["--quiet", "eval", form.to_str().unwrap()]);
    assert!(output.status.success());
    assert!(output.stdout.is_empty());
}

#[test]
fn test_eval_missing_form() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("missing.json");

    let output = run_suprform(&["--json", "eval", missing.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(4));

    let json = parse_jsonrpc(&output);
    assert_eq!(json["error"]["code"], -32004);
    assert!(json["error"]["message"]
        .as_str()
        .unwrap()
        .contains("not found"));
}

#[test]
fn test_eval_invalid_values() {
    let dir = TempDir::new().unwrap();
    let form = write_form(dir.path(), SAMPLE_FORM);

    let output = run_suprform(&[
        "--no-json",
        "eval",
        form.to_str().unwrap(),
        "--values",
        "{ broken",
    ]);
    assert_eq!(output.status.code(), Some(2));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid --values"));
}

#[test]
fn test_eval_malformed_definition() {
    let dir = TempDir::new().unwrap();
    let form = write_form(dir.path(), "{ fields: [ { name: ");

    let output = run_suprform(&["--no-json", "eval", form.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn test_eval_unknown_operator_hides_field() {
    let dir = TempDir::new().unwrap();
    let form = write_form(
        dir.path(),
        r#"{ fields: [
            { name: "age" },
            { name: "x", visibility: { conditions: [
                { name: "age", operator: "BETWEEN", value: 3 },
            ] } },
        ] }"#,
    );

    let output = run_suprform(&[
        "--json",
        "eval",
        form.to_str().unwrap(),
        "--values",
        r#"{ "age": 3 }"#,
    ]);
    assert!(output.status.success());

    let json = parse_jsonrpc(&output);
    assert_eq!(field(&json["result"]["fields"], "x")["visible"], false);

    // unsupported comparisons are logged at warn, the default level
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("BETWEEN"), "stderr={}", stderr);
}
