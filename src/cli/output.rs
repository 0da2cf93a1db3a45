//! output formatting utilities for scriptable CLI output
//!
//! uses JSON-RPC 2.0 format for machine-readable output:
//! - success: {"jsonrpc": "2.0", "result": {...}, "id": null}
//! - error: {"jsonrpc": "2.0", "error": {"code": N, "message": "...", "data": {...}}, "id": null}

use serde::Serialize;
use serde_json::Value as JsonValue;
use std::io::IsTerminal;

use crate::binding::FieldState;

/// JSON-RPC version constant
const JSONRPC_VERSION: &str = "2.0";

/// output mode determines how results are formatted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// human-readable text output
    Text,
    /// machine-readable JSON-RPC 2.0 output
    Json,
    /// no output on success (errors still go to stderr)
    Quiet,
}

impl OutputMode {
    /// determine output mode from CLI flags and environment
    ///
    /// priority: quiet > json > no_json > auto-detect
    pub fn from_flags(json: bool, no_json: bool, quiet: bool) -> Self {
        if quiet {
            return Self::Quiet;
        }
        if json {
            return Self::Json;
        }
        if no_json {
            return Self::Text;
        }
        // auto-detect: JSON when stdout is not a TTY (piped)
        if !std::io::stdout().is_terminal() {
            Self::Json
        } else {
            Self::Text
        }
    }

    pub fn is_json(&self) -> bool {
        matches!(self, Self::Json)
    }

    pub fn is_quiet(&self) -> bool {
        matches!(self, Self::Quiet)
    }
}

/// JSON-RPC 2.0 success response
#[derive(Serialize)]
pub struct JsonRpcResponse<T: Serialize> {
    pub jsonrpc: &'static str,
    pub result: T,
    /// null for CLI responses (no request id)
    pub id: Option<String>,
}

impl<T: Serialize> JsonRpcResponse<T> {
    pub fn new(result: T) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            result,
            id: None,
        }
    }
}

/// JSON-RPC 2.0 error response
#[derive(Serialize)]
pub struct JsonRpcError {
    pub jsonrpc: &'static str,
    pub error: RpcError,
    pub id: Option<String>,
}

/// JSON-RPC 2.0 error object
#[derive(Serialize)]
pub struct RpcError {
    /// error code (exit code offset by -32000 for app-specific errors)
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ErrorData>,
}

/// additional error data
#[derive(Serialize)]
pub struct ErrorData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
}

impl JsonRpcError {
    /// create error with standard JSON-RPC error code range
    /// -32000 to -32099 is the JSON-RPC 2.0 range for application errors
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            error: RpcError {
                code: to_jsonrpc_code(code),
                message: message.into(),
                data: None,
            },
            id: None,
        }
    }

    pub fn with_details(code: i32, message: impl Into<String>, details: Vec<String>) -> Self {
        let mut error = Self::new(code, message);
        if !details.is_empty() {
            error.error.data = Some(ErrorData {
                details: Some(details),
            });
        }
        error
    }
}

/// convert exit code to JSON-RPC error code
/// JSON-RPC reserves -32000 to -32099 for server/application errors
fn to_jsonrpc_code(exit_code: i32) -> i32 {
    -32000 - exit_code
}

// ============================================================================
// Result data structures for different commands
// ============================================================================

/// one field as rendered: where it lives and how its gates resolved
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct FieldReport {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub visible: bool,
    pub disabled: bool,
}

/// result data for eval
#[derive(Serialize)]
pub struct EvalData {
    pub fields: Vec<FieldReport>,
    /// value tree after defaults were registered
    pub values: JsonValue,
}

/// fields each gate of a field depends on
#[derive(Serialize)]
pub struct DepsEntry {
    pub name: String,
    pub visibility: Vec<String>,
    pub disabled: Vec<String>,
}

#[derive(Serialize)]
pub struct DepsData {
    pub fields: Vec<DepsEntry>,
}

/// result data for a definition that verified cleanly
#[derive(Serialize)]
pub struct VerifyData {
    pub valid: bool,
    /// declared fields, not counting array repetitions
    pub fields: usize,
}

/// one gate state change caused by a simulated write
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct Transition {
    pub name: String,
    pub before: FieldState,
    pub after: FieldState,
}

/// one `--set` assignment and what it changed
#[derive(Serialize)]
pub struct StepData {
    pub path: String,
    pub value: JsonValue,
    pub transitions: Vec<Transition>,
}

/// result data for simulate
#[derive(Serialize)]
pub struct SimulateData {
    pub initial: Vec<FieldReport>,
    pub steps: Vec<StepData>,
    #[serde(rename = "final")]
    pub final_state: Vec<FieldReport>,
}

// ============================================================================
// Output functions
// ============================================================================

/// print JSON-RPC success response to stdout
pub fn print_json<T: Serialize>(data: &T) {
    let response = JsonRpcResponse::new(data);
    if let Ok(json) = serde_json::to_string(&response) {
        println!("{}", json);
    }
}

/// print JSON-RPC error with details to stdout
pub fn print_json_error(code: i32, message: &str, details: Vec<String>) {
    let error = JsonRpcError::with_details(code, message, details);
    if let Ok(json) = serde_json::to_string(&error) {
        println!("{}", json);
    }
}

/// one line per field: name, visibility and disabled state
pub fn format_field_line(field: &FieldReport, width: usize) -> String {
    format!(
        "{:<width$}  {:<7}  {}",
        field.name,
        if field.visible { "visible" } else { "hidden" },
        if field.disabled { "disabled" } else { "enabled" },
        width = width
    )
}

/// describe what changed between two field states
pub fn describe_transition(transition: &Transition) -> String {
    let mut parts = Vec::new();
    if transition.before.visible != transition.after.visible {
        parts.push(if transition.after.visible {
            "hidden -> visible"
        } else {
            "visible -> hidden"
        });
    }
    if transition.before.disabled != transition.after.disabled {
        parts.push(if transition.after.disabled {
            "enabled -> disabled"
        } else {
            "disabled -> enabled"
        });
    }
    format!("{}: {}", transition.name, parts.join(", "))
}
