// shared utilities for integration tests

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde_json::Value as JsonValue;

/// form used across the CLI tests
///
/// - labels of fields with rules get a required marker
/// - email shows for adults
/// - state shows for US or CA
/// - newsletter is always disabled
/// - each item's qty shows when its sku starts with X
#[allow(dead_code)]
pub const SAMPLE_FORM: &str = r#"{
    // comments are fine, definitions are JSON5
    show_asterisk: true,
    fields: [
        { name: "age", label: "Age", default: 0 },
        { name: "country", default: "MX" },
        {
            name: "email",
            label: "Email",
            rules: { required: "Email is required" },
            visibility: {
                operator: "AND",
                conditions: [{ name: "age", operator: "GREATER_THAN_OR_EQUAL", value: 18 }],
            },
        },
        {
            name: "state",
            visibility: {
                operator: "OR",
                conditions: [
                    { name: "country", operator: "EQUALS", value: "US" },
                    { name: "country", operator: "EQUALS", value: "CA" },
                ],
            },
        },
        { name: "newsletter", disabled: true, rules: { required: true } },
    ],
    field_arrays: [
        {
            name: "items",
            fields: [
                { name: "sku" },
                {
                    name: "qty",
                    visibility: {
                        conditions: [{ name: "sku", operator: "STARTS_WITH", value: "X" }],
                    },
                },
            ],
        },
    ],
}"#;

/// path to the built suprform binary
pub fn suprform_binary_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_suprform"))
}

/// run suprform and capture output
pub fn run_suprform(args: &[&str]) -> Output {
    Command::new(suprform_binary_path())
        .args(args)
        .output()
        .expect("Failed to run suprform")
}

/// write a form definition into `dir`
pub fn write_form(dir: &Path, content: &str) -> PathBuf {
    let path = dir.join("form.json5");
    fs::write(&path, content).expect("Failed to write form definition");
    path
}

/// parse the single JSON-RPC line printed on stdout
pub fn parse_jsonrpc(output: &Output) -> JsonValue {
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(stdout.trim()).unwrap_or_else(|e| {
        panic!(
            "stdout is not JSON ({}): stdout={}, stderr={}",
            e,
            stdout,
            String::from_utf8_lossy(&output.stderr)
        )
    })
}

/// find a field entry by name in a `fields` array
#[allow(dead_code)]
pub fn field<'a>(fields: &'a JsonValue, name: &str) -> &'a JsonValue {
    fields
        .as_array()
        .and_then(|list| list.iter().find(|f| f["name"] == name))
        .unwrap_or_else(|| panic!("field '{}' not in {}", name, fields))
}
