use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::{json, Value as JsonValue};

use std::fs;
use std::path::{Path, PathBuf};

use crate::binding::FieldGates;
use crate::conditions::{Expression, FieldPath};
use crate::config::{self, FormDefinition, ResolvedField};
use crate::form::{FormState, FormStore};

use super::output::{
    self, DepsData, DepsEntry, EvalData, FieldReport, OutputMode, SimulateData, StepData,
    Transition, VerifyData,
};
use super::{exit_codes, fail, CommandError};

#[derive(Parser)]
#[command(name = "suprform")]
#[command(about = "Evaluate declarative form conditions against form values")]
#[command(version)]
pub struct Cli {
    /// Output in JSON format (auto-enabled when stdout is piped)
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Force text output even when stdout is piped
    #[arg(long, global = true, conflicts_with = "json")]
    pub no_json: bool,

    /// Suppress all output on success (errors still go to stderr)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Log to stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show whether each field is visible and enabled
    Eval {
        /// Form definition file (JSON or JSON5)
        form: PathBuf,

        /// Form values: a JSON/JSON5 file or an inline JSON object
        #[arg(long)]
        values: Option<String>,
    },

    /// List the fields each visibility and disabled expression reads
    Deps {
        /// Form definition file (JSON or JSON5)
        form: PathBuf,

        /// Form values, used to expand field arrays
        #[arg(long)]
        values: Option<String>,
    },

    /// Check a form definition for mistakes
    Verify {
        /// Form definition file (JSON or JSON5)
        form: PathBuf,
    },

    /// Apply value changes one at a time and show how field states change
    Simulate {
        /// Form definition file (JSON or JSON5)
        form: PathBuf,

        /// Initial form values: a JSON/JSON5 file or an inline JSON object
        #[arg(long)]
        values: Option<String>,

        /// Assignment to apply, in order (PATH=JSON, non-JSON values are strings)
        #[arg(long = "set", value_name = "PATH=VALUE", action = clap::ArgAction::Append)]
        set: Vec<String>,
    },
}

// ============================================================================
// Helpers
// ============================================================================

fn load_form(path: &Path) -> Result<FormDefinition> {
    if !path.exists() {
        return Err(fail(
            exit_codes::FILE_NOT_FOUND,
            format!("form definition not found: {}", path.display()),
        ));
    }

    let definition =
        config::load(path).map_err(|e| fail(exit_codes::CONFIG_ERROR, format!("{:#}", e)))?;

    tracing::info!(
        path = %path.display(),
        fields = definition.field_count(),
        "form definition loaded"
    );
    Ok(definition)
}

/// `--values` is either a file or inline JSON/JSON5; absent means `{}`
fn read_values(arg: Option<&str>) -> Result<JsonValue> {
    let Some(arg) = arg else {
        return Ok(json!({}));
    };

    let path = Path::new(arg);
    let text = if path.is_file() {
        fs::read_to_string(path)
            .with_context(|| format!("failed to read values file: {}", path.display()))?
    } else {
        arg.to_string()
    };

    // plain JSON keeps integers as integers; JSON5 covers the rest
    serde_json::from_str(&text)
        .or_else(|_| json5::from_str(&text))
        .map_err(|e| fail(exit_codes::INVALID_ARGS, format!("invalid --values: {}", e)))
}

/// split `PATH=VALUE`; a value that is not JSON is taken as a string
fn parse_assignment(arg: &str) -> Result<(FieldPath, JsonValue)> {
    let (raw_path, raw_value) = arg.split_once('=').ok_or_else(|| {
        fail(
            exit_codes::INVALID_ARGS,
            format!("invalid --set '{}': expected PATH=VALUE", arg),
        )
    })?;

    let path = FieldPath::parse(raw_path.trim()).map_err(|e| {
        fail(
            exit_codes::INVALID_ARGS,
            format!("invalid --set '{}': {}", arg, e),
        )
    })?;

    let value = serde_json::from_str(raw_value)
        .unwrap_or_else(|_| JsonValue::String(raw_value.to_string()));

    Ok((path, value))
}

fn resolve(definition: &FormDefinition, values: &JsonValue) -> Result<Vec<ResolvedField>> {
    definition
        .resolve_fields(values)
        .map_err(|e| fail(exit_codes::CONFIG_ERROR, format!("{:#}", e)))
}

/// a form store with every resolved field registered and bound
///
/// fields are resolved once, against the initial values
struct MountedForm {
    store: FormStore,
    fields: Vec<(ResolvedField, FieldGates)>,
}

impl MountedForm {
    fn mount(definition: &FormDefinition, values: JsonValue) -> Result<Self> {
        let store = FormStore::with_values(values);
        let resolved = resolve(definition, &store.get_values())?;

        // defaults first, so the first evaluation sees them
        for registration in definition.array_registrations().map_err(|e| {
            fail(exit_codes::CONFIG_ERROR, format!("{:#}", e))
        })? {
            store.register(registration);
        }
        for field in &resolved {
            store.register(field.registration());
        }

        let fields = resolved
            .into_iter()
            .map(|field| {
                let gates = FieldGates::mount(
                    field.name.clone(),
                    field.visibility.clone(),
                    field.disabled.clone(),
                    &store,
                );
                (field, gates)
            })
            .collect();

        Ok(Self { store, fields })
    }

    fn reports(&self) -> Vec<FieldReport> {
        self.fields
            .iter()
            .map(|(field, gates)| {
                let state = gates.state();
                FieldReport {
                    name: field.name.to_string(),
                    label: field.label.clone(),
                    visible: state.visible,
                    disabled: state.disabled,
                }
            })
            .collect()
    }

    /// write one value, poll every binding and collect the state changes
    ///
    /// a write the store refuses is an argument error and changes nothing
    fn apply(&mut self, path: &FieldPath, value: JsonValue) -> Result<Vec<Transition>> {
        self.store.set_value(path, value).map_err(|e| {
            fail(
                exit_codes::INVALID_ARGS,
                format!("cannot set '{}': {}", path, e),
            )
        })?;

        let mut transitions = Vec::new();
        for (_, gates) in self.fields.iter_mut() {
            let before = gates.state();
            if gates.poll(&self.store) {
                transitions.push(Transition {
                    name: gates.name().to_string(),
                    before,
                    after: gates.state(),
                });
            }
        }
        Ok(transitions)
    }
}

fn print_fields(fields: &[FieldReport], indent: &str) {
    let width = fields.iter().map(|f| f.name.len()).max().unwrap_or(0);
    for field in fields {
        println!("{}{}", indent, output::format_field_line(field, width));
    }
}

fn dependency_names(expression: Option<&Expression>) -> Vec<String> {
    expression
        .map(|e| e.dependencies().iter().map(FieldPath::to_string).collect())
        .unwrap_or_default()
}

// ============================================================================
// Commands
// ============================================================================

pub fn execute(cli: Cli, output_mode: OutputMode) -> Result<()> {
    match cli.command {
        Commands::Eval { form, values } => {
            let definition = load_form(&form)?;
            let values = read_values(values.as_deref())?;
            let mounted = MountedForm::mount(&definition, values)?;
            let fields = mounted.reports();

            if output_mode.is_json() {
                output::print_json(&EvalData {
                    fields,
                    values: mounted.store.get_values(),
                });
            } else if !output_mode.is_quiet() {
                print_fields(&fields, "");
            }
            Ok(())
        }

        Commands::Deps { form, values } => {
            let definition = load_form(&form)?;
            let values = read_values(values.as_deref())?;
            let fields: Vec<DepsEntry> = resolve(&definition, &values)?
                .iter()
                .map(|field| DepsEntry {
                    name: field.name.to_string(),
                    visibility: dependency_names(field.visibility.as_deref()),
                    disabled: dependency_names(field.disabled.as_deref()),
                })
                .collect();

            if output_mode.is_json() {
                output::print_json(&DepsData { fields });
            } else if !output_mode.is_quiet() {
                for entry in &fields {
                    println!("{}", entry.name);
                    if !entry.visibility.is_empty() {
                        println!("  visibility <- {}", entry.visibility.join(", "));
                    }
                    if !entry.disabled.is_empty() {
                        println!("  disabled   <- {}", entry.disabled.join(", "));
                    }
                }
            }
            Ok(())
        }

        Commands::Verify { form } => {
            let definition = load_form(&form)?;
            let issues = config::verify(&definition);

            if !issues.is_empty() {
                for issue in &issues {
                    tracing::debug!(location = %issue.location, "{}", issue.message);
                }
                return Err(CommandError::new(
                    exit_codes::CONFIG_ERROR,
                    format!(
                        "form definition has {} issue(s): {}",
                        issues.len(),
                        form.display()
                    ),
                )
                .with_details(issues.iter().map(ToString::to_string).collect())
                .into());
            }

            if output_mode.is_json() {
                output::print_json(&VerifyData {
                    valid: true,
                    fields: definition.field_count(),
                });
            } else if !output_mode.is_quiet() {
                println!("✓ Form definition is valid: {}", form.display());
            }
            Ok(())
        }

        Commands::Simulate { form, values, set } => {
            let definition = load_form(&form)?;
            let values = read_values(values.as_deref())?;

            // validate every assignment before applying any
            let assignments = set
                .iter()
                .map(|arg| parse_assignment(arg))
                .collect::<Result<Vec<_>>>()?;

            let mut mounted = MountedForm::mount(&definition, values)?;
            let initial = mounted.reports();

            let mut steps = Vec::new();
            for (path, value) in assignments {
                let transitions = mounted.apply(&path, value.clone())?;
                tracing::info!(
                    path = %path,
                    changed = transitions.len(),
                    "assignment applied"
                );
                steps.push(StepData {
                    path: path.to_string(),
                    value,
                    transitions,
                });
            }

            let final_state = mounted.reports();

            if output_mode.is_json() {
                output::print_json(&SimulateData {
                    initial,
                    steps,
                    final_state,
                });
            } else if !output_mode.is_quiet() {
                println!("initial:");
                print_fields(&initial, "  ");
                for step in &steps {
                    println!("set {} = {}", step.path, step.value);
                    if step.transitions.is_empty() {
                        println!("  (no changes)");
                    }
                    for transition in &step.transitions {
                        println!("  {}", output::describe_transition(transition));
                    }
                }
                println!("final:");
                print_fields(&final_state, "  ");
            }
            Ok(())
        }
    }
}
