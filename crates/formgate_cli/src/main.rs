use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use formgate::{parse_form_file, validate_form, validate_form_definition, FormDefinition};
use serde_json::{Map, Value as JsonValue};

#[derive(Parser)]
#[command(name = "formgate")]
#[command(version, about = "Check form definitions and validate submissions")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Preflight a form definition file (YAML or JSON)
    Check {
        /// Path to the form definition file
        form: PathBuf,
    },
    /// Validate a submission against a form definition
    Validate {
        /// Path to the form definition file
        form: PathBuf,
        /// Path to the submission JSON file (an object of field values)
        submission: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match cli.command {
        Commands::Check { form } => check(&form),
        Commands::Validate { form, submission } => validate(&form, &submission),
    }
}

fn load_form(path: &PathBuf) -> Result<FormDefinition, String> {
    let source = std::fs::read_to_string(path)
        .map_err(|err| format!("failed to read {}: {}", path.display(), err))?;
    parse_form_file(&source)
        .map_err(|err| format!("failed to parse {}: {}", path.display(), err))
}

fn check(path: &PathBuf) -> ExitCode {
    let form = match load_form(path) {
        Ok(form) => form,
        Err(message) => {
            eprintln!("{message}");
            return ExitCode::FAILURE;
        }
    };
    match validate_form_definition(&form) {
        Ok(()) => {
            println!("OK: {} ({} sections)", form.name, form.sections.len());
            ExitCode::SUCCESS
        }
        Err(errors) => {
            for error in &errors {
                eprintln!("{error}");
            }
            eprintln!("{} error(s) found", errors.len());
            ExitCode::FAILURE
        }
    }
}

fn validate(form_path: &PathBuf, submission_path: &PathBuf) -> ExitCode {
    let form = match load_form(form_path) {
        Ok(form) => form,
        Err(message) => {
            eprintln!("{message}");
            return ExitCode::FAILURE;
        }
    };
    let raw = match std::fs::read_to_string(submission_path) {
        Ok(raw) => raw,
        Err(err) => {
            eprintln!("failed to read {}: {}", submission_path.display(), err);
            return ExitCode::FAILURE;
        }
    };
    let submission: Map<String, JsonValue> = match serde_json::from_str::<JsonValue>(&raw) {
        Ok(JsonValue::Object(map)) => map,
        Ok(_) => {
            eprintln!("submission must be a JSON object of field values");
            return ExitCode::FAILURE;
        }
        Err(err) => {
            eprintln!("failed to parse {}: {}", submission_path.display(), err);
            return ExitCode::FAILURE;
        }
    };

    let errors = validate_form(&form, &submission);
    match serde_json::to_string_pretty(&errors) {
        Ok(rendered) => println!("{rendered}"),
        Err(err) => {
            eprintln!("failed to render error map: {err}");
            return ExitCode::FAILURE;
        }
    }
    if errors.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
