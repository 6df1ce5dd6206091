mod wizard;

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use serde_json::{Map, Value};

use form_engine::{
    Session, SessionOptions, SubmitOutcome, build_render_payload, render_json_ui, render_text,
};
use form_spec::{
    Catalogue, ValidationResult, answers_schema, catalogue_warnings, resolve_visibility, validate,
};
use wizard::{PromptContext, Verbosity, WizardPresenter, parse_answer};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Progressive disclosure form wizard",
    long_about = "Walks a field catalogue one field at a time, with resume, validation, and schema helpers backed by the form engine"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum RenderMode {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Walk a form catalogue field by field in a text shell.
    Wizard {
        /// Path to the catalogue JSON describing the form.
        #[arg(long, value_name = "CATALOGUE")]
        catalogue: PathBuf,
        /// Optional JSON file with previously saved answers to resume from.
        #[arg(long, value_name = "ANSWERS")]
        answers: Option<PathBuf>,
        /// Treat the whole form as an optional section: validation never
        /// blocks progression.
        #[arg(long)]
        optional: bool,
        /// Show verbose output (statuses, visible fields, parse expectations).
        #[arg(long, alias = "debug")]
        verbose: bool,
        /// Also emit answer JSON on completion.
        #[arg(long)]
        answers_json: bool,
    },
    /// Validate a saved answers file against a catalogue.
    Validate {
        /// Path to the catalogue JSON.
        #[arg(long, value_name = "CATALOGUE")]
        catalogue: PathBuf,
        /// Path to the answers JSON file.
        #[arg(long, value_name = "ANSWERS")]
        answers: PathBuf,
    },
    /// Print the answers JSON schema for the currently visible fields.
    Schema {
        /// Path to the catalogue JSON.
        #[arg(long, value_name = "CATALOGUE")]
        catalogue: PathBuf,
        /// Optional answers file; visibility is resolved against it.
        #[arg(long, value_name = "ANSWERS")]
        answers: Option<PathBuf>,
    },
    /// Dump the render payload for a catalogue and saved answers.
    Inspect {
        /// Path to the catalogue JSON.
        #[arg(long, value_name = "CATALOGUE")]
        catalogue: PathBuf,
        /// Optional answers file to resume the session from.
        #[arg(long, value_name = "ANSWERS")]
        answers: Option<PathBuf>,
        /// Output mode for the payload.
        #[arg(long, value_enum, default_value_t = RenderMode::Text)]
        format: RenderMode,
    },
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Wizard {
            catalogue,
            answers,
            optional,
            verbose,
            answers_json,
        } => run_wizard(catalogue, answers, optional, verbose, answers_json),
        Command::Validate { catalogue, answers } => run_validate(catalogue, answers),
        Command::Schema { catalogue, answers } => run_schema(catalogue, answers),
        Command::Inspect {
            catalogue,
            answers,
            format,
        } => run_inspect(catalogue, answers, format),
    }
}

fn load_catalogue(path: &Path) -> CliResult<Catalogue> {
    let contents = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

fn load_answers(path: Option<&Path>) -> CliResult<Map<String, Value>> {
    match path {
        Some(path) => {
            let contents = fs::read_to_string(path)?;
            Ok(serde_json::from_str(&contents)?)
        }
        None => Ok(Map::new()),
    }
}

fn run_wizard(
    catalogue_path: PathBuf,
    answers_path: Option<PathBuf>,
    optional: bool,
    verbose: bool,
    answers_json: bool,
) -> CliResult<()> {
    let catalogue = load_catalogue(&catalogue_path)?;
    let initial = load_answers(answers_path.as_deref())?;

    if verbose {
        for warning in catalogue_warnings(&catalogue.fields) {
            eprintln!("Catalogue warning: {}", warning);
        }
    }

    let mut session = Session::new(
        catalogue.fields.clone(),
        initial,
        SessionOptions {
            optional_session: optional,
        },
    );
    let mut presenter = WizardPresenter::new(Verbosity::from_verbose(verbose), answers_json);
    presenter.show_header(&catalogue);

    while !session.is_complete() {
        let payload = build_render_payload(&session);
        presenter.show_status(&payload);

        let field = session
            .current_field()
            .cloned()
            .ok_or("session is in progress but has no current field")?;
        let prompt = PromptContext::new(&field, &payload.progress);
        presenter.show_prompt(&prompt);

        let line = read_answer_line()?;
        let input = line.trim();

        match input {
            "/back" => {
                if let Err(err) = session.previous() {
                    eprintln!("{}", err);
                }
                continue;
            }
            "/skip" if optional => {
                session.force_advance(&field.id, Value::String(String::new()))?;
                continue;
            }
            _ => {}
        }

        let options = field.options.clone().unwrap_or_default();
        match parse_answer(field.kind, input, &options) {
            Ok(value) => {
                if optional {
                    // Optional sections never trap the user; failures are
                    // advisory.
                    session.force_advance(&field.id, value)?;
                    if let Some(message) = session.errors().get(&field.id) {
                        eprintln!("Note: {}", message);
                    }
                } else if session.submit(&field.id, value)? == SubmitOutcome::Rejected
                    && let Some(message) = session.errors().get(&field.id)
                {
                    eprintln!("Invalid answer: {}", message);
                }
            }
            Err(error) => presenter.show_parse_error(&error),
        }
    }

    presenter.show_completion(&session.snapshot());
    Ok(())
}

fn read_answer_line() -> CliResult<String> {
    print!("> ");
    io::stdout().flush()?;
    let mut line = String::new();
    let read = io::stdin().read_line(&mut line)?;
    if read == 0 {
        return Err("input closed before the form was completed".into());
    }
    Ok(line)
}

fn run_validate(catalogue_path: PathBuf, answers_path: PathBuf) -> CliResult<()> {
    let catalogue = load_catalogue(&catalogue_path)?;
    let answers = load_answers(Some(&answers_path))?;

    let result = validate(&catalogue.fields, &answers);
    println!(
        "Validation result: {}",
        if result.valid { "valid" } else { "invalid" }
    );
    describe_validation(&result);

    if result.valid {
        Ok(())
    } else {
        Err("validation failed".into())
    }
}

fn describe_validation(result: &ValidationResult) {
    if !result.errors.is_empty() {
        println!("Errors:");
        for error in &result.errors {
            println!(
                "  {} - {}",
                error.path.as_deref().unwrap_or("<unknown>"),
                error.message
            );
        }
    }
    if !result.missing_required.is_empty() {
        println!(
            "Missing required answers: {}",
            result.missing_required.join(", ")
        );
    }
    if !result.unknown_fields.is_empty() {
        println!(
            "Unknown answer fields: {}",
            result.unknown_fields.join(", ")
        );
    }
}

fn run_schema(catalogue_path: PathBuf, answers_path: Option<PathBuf>) -> CliResult<()> {
    let catalogue = load_catalogue(&catalogue_path)?;
    let answers = load_answers(answers_path.as_deref())?;
    let visibility = resolve_visibility(&catalogue.fields, &answers);
    let schema = answers_schema(&catalogue.fields, &visibility);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}

fn run_inspect(
    catalogue_path: PathBuf,
    answers_path: Option<PathBuf>,
    format: RenderMode,
) -> CliResult<()> {
    let catalogue = load_catalogue(&catalogue_path)?;
    let answers = load_answers(answers_path.as_deref())?;
    let session = Session::new(catalogue.fields, answers, SessionOptions::default());
    let payload = build_render_payload(&session);
    match format {
        RenderMode::Text => println!("{}", render_text(&payload)),
        RenderMode::Json => println!(
            "{}",
            serde_json::to_string_pretty(&render_json_ui(&payload))?
        ),
    }
    Ok(())
}
