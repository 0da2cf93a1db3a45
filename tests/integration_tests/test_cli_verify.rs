// integration tests for the verify command

use crate::common::*;
use tempfile::TempDir;

#[test]
fn test_verify_valid_form() {
    let dir = TempDir::new().unwrap();
    let form = write_form(dir.path(), SAMPLE_FORM);

    let output = run_suprform(&["--no-json", "verify", form.to_str().unwrap()]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(
        output.status.success(),
        "verify failed: stdout={}, stderr={}",
        stdout,
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(stdout.contains("valid"));
}

#[test]
fn test_verify_valid_form_json() {
    let dir = TempDir::new().unwrap();
    let form = write_form(dir.path(), SAMPLE_FORM);

    let output = run_suprform(&["--json", "verify", form.to_str().unwrap()]);
    assert!(output.status.success());

    let json = parse_jsonrpc(&output);
    assert_eq!(json["result"]["valid"], true);
    assert_eq!(json["result"]["fields"], 7);
}

#[test]
fn test_verify_reports_issues() {
    let dir = TempDir::new().unwrap();
    let form = write_form(
        dir.path(),
        r#"{ fields: [
            { name: "age", default: 0 },
            { name: "age" },
            { name: "email", visibility: { conditions: [
                { name: "agee", operator: "GREATER_THAN", value: 18 },
                { name: "age", operator: "EQUALS", value: "18" },
            ] } },
        ] }"#,
    );

    let output = run_suprform(&["--no-json", "verify", form.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(3));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("3 issue(s)"), "stderr={}", stderr);
    assert!(stderr.contains("duplicate field name 'age'"));
    assert!(stderr.contains("did you mean 'age'?"));
    assert!(stderr.contains("default is a number"));
}

#[test]
fn test_verify_reports_issues_json() {
    let dir = TempDir::new().unwrap();
    let form = write_form(
        dir.path(),
        r#"{ fields: [
            { name: "x", disabled: { conditions: [
                { name: "x", operator: "SOUNDS_LIKE", value: "y" },
            ] } },
        ] }"#,
    );

    let output = run_suprform(&["--json", "verify", form.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(3));

    let json = parse_jsonrpc(&output);
    assert_eq!(json["error"]["code"], -32003);

    let details = json["error"]["data"]["details"].as_array().unwrap();
    assert_eq!(details.len(), 1);
    assert!(details[0]
        .as_str()
        .unwrap()
        .contains("fields[0].disabled.conditions[0]"));
}

#[test]
fn test_verify_missing_file() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("missing.json5");

    let output = run_suprform(&["--no-json", "verify", missing.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(4));
}
