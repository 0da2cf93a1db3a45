mod commands;
pub mod exit_codes;
pub mod output;

pub use commands::{Cli, Commands};

use thiserror::Error;

use output::OutputMode;

/// failure with a specific exit code
#[derive(Debug, Error)]
#[error("{message}")]
pub struct CommandError {
    pub code: i32,
    pub message: String,
    /// extra lines, e.g. verification issues
    pub details: Vec<String>,
}

impl CommandError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: Vec::new(),
        }
    }

    pub fn with_details(mut self, details: Vec<String>) -> Self {
        self.details = details;
        self
    }
}

/// exit code for an error, `ERROR` unless it carries one
pub fn exit_code(error: &anyhow::Error) -> i32 {
    error
        .downcast_ref::<CommandError>()
        .map(|e| e.code)
        .unwrap_or(exit_codes::ERROR)
}

/// run a command, report failures and return the process exit code
pub fn run(cli: Cli) -> i32 {
    let mode = OutputMode::from_flags(cli.json, cli.no_json, cli.quiet);

    match commands::execute(cli, mode) {
        Ok(()) => exit_codes::SUCCESS,
        Err(e) => {
            let code = exit_code(&e);
            report_error(&e, code, mode);
            code
        }
    }
}

fn report_error(error: &anyhow::Error, code: i32, mode: OutputMode) {
    let details = error
        .downcast_ref::<CommandError>()
        .map(|e| e.details.clone())
        .unwrap_or_default();

    if mode.is_json() {
        output::print_json_error(code, &format!("{:#}", error), details);
        return;
    }

    eprintln!("error: {:#}", error);
    for line in details {
        eprintln!("  - {}", line);
    }
}

pub(crate) fn fail(code: i32, message: impl Into<String>) -> anyhow::Error {
    CommandError::new(code, message).into()
}
