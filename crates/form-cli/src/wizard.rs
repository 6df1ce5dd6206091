use std::fmt::Write;

use serde_json::{Number, Value, json};

use form_engine::{RenderPayload, RenderProgress, RenderStatus, input_hint};
use form_spec::{AnswerSet, Catalogue, FieldKind, FieldSpec};

/// Controls which bits of state the wizard prints.
#[derive(Copy, Clone, Eq, PartialEq)]
pub enum Verbosity {
    /// Clean output: field prompts only.
    Clean,
    /// Verbose output: status, visible fields, error details, help text.
    Verbose,
}

impl Verbosity {
    pub fn from_verbose(verbose: bool) -> Self {
        if verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Clean
        }
    }

    pub fn is_verbose(&self) -> bool {
        matches!(self, Verbosity::Verbose)
    }
}

/// Toolbar responsible for printing prompts once the engine yields a field.
pub struct WizardPresenter {
    verbosity: Verbosity,
    header_printed: bool,
    show_answers_json: bool,
}

impl WizardPresenter {
    pub fn new(verbosity: Verbosity, show_answers_json: bool) -> Self {
        Self {
            verbosity,
            header_printed: false,
            show_answers_json,
        }
    }

    pub fn show_header(&mut self, catalogue: &Catalogue) {
        if self.header_printed {
            return;
        }
        println!("Form: {}", catalogue.title);
        if self.verbosity.is_verbose()
            && let Some(description) = &catalogue.description
        {
            println!("About: {}", description);
        }
        self.header_printed = true;
    }

    pub fn show_status(&self, payload: &RenderPayload) {
        if self.verbosity.is_verbose() {
            println!(
                "Status: {} ({}/{})",
                payload.status.as_str(),
                payload.progress.completed,
                payload.progress.total
            );
            self.print_visible_fields(payload);
        } else if payload.status == RenderStatus::NeedInput && payload.progress.total == 0 {
            println!("No visible fields are available; check your visibility rules.");
        }
    }

    fn print_visible_fields(&self, payload: &RenderPayload) {
        println!("Visible fields:");
        for field in payload.fields.iter().filter(|field| field.visible) {
            let mut entry = format!(" - {} ({})", field.id, field.label);
            if field.required {
                entry.push_str(" [required]");
            }
            if field.completed {
                entry.push_str(" [done]");
            }
            println!("{}", entry);
        }
    }

    pub fn show_prompt(&self, prompt: &PromptContext) {
        let mut line = if prompt.total > 0 {
            format!("{}/{} {}", prompt.index, prompt.total, prompt.label)
        } else {
            format!("{} {}", prompt.index, prompt.label)
        };
        if prompt.required {
            line.push_str(" *");
        }
        if let Some(hint) = &prompt.hint {
            line.push(' ');
            line.push_str(hint);
        }
        println!("{}", line);
        if let Some(help) = &prompt.help_text {
            println!("{}", help);
        }
        if self.verbosity.is_verbose()
            && let Some(placeholder) = &prompt.placeholder
        {
            println!("e.g. {}", placeholder);
        }
        if self.verbosity.is_verbose() && !prompt.options.is_empty() {
            println!("Options: {}", prompt.options.join(", "));
        }
    }

    pub fn show_parse_error(&self, error: &AnswerParseError) {
        eprintln!("Invalid answer: {}", error.user_message);
        if let Some(debug) = &error.debug_message {
            eprintln!("  Expected: {}", debug);
        }
    }

    pub fn show_completion(&self, answer_set: &AnswerSet) {
        println!("Done ✅");
        match answer_set.to_cbor() {
            Ok(bytes) => {
                println!("Answers (CBOR hex): {}", encode_hex(&bytes));
            }
            Err(err) => {
                eprintln!("Failed to serialize answers to CBOR: {}", err);
            }
        }
        if self.show_answers_json {
            match answer_set.to_json_pretty() {
                Ok(pretty) => println!("{}", pretty),
                Err(err) => {
                    eprintln!("Failed to serialize answers to JSON: {}", err);
                }
            }
        }
    }
}

/// Context used to format a single prompt.
pub struct PromptContext {
    pub index: usize,
    pub total: usize,
    pub label: String,
    pub help_text: Option<String>,
    pub placeholder: Option<String>,
    pub required: bool,
    pub hint: Option<String>,
    pub options: Vec<String>,
}

impl PromptContext {
    pub fn new(field: &FieldSpec, progress: &RenderProgress) -> Self {
        let options = field.options.clone().unwrap_or_default();
        let hint = input_hint(field.kind, &options);
        Self {
            index: (progress.completed + 1).max(1),
            total: progress.total,
            label: field.label.clone(),
            help_text: field.help_text.clone(),
            placeholder: field.placeholder.clone(),
            required: field.required,
            hint,
            options,
        }
    }
}

/// Error produced when parsing a typed answer from the user. The engine's
/// own validation messages are surfaced separately, inline per field.
#[derive(Debug)]
pub struct AnswerParseError {
    pub user_message: String,
    pub debug_message: Option<String>,
}

impl AnswerParseError {
    pub fn new(user_message: impl Into<String>, debug_message: Option<String>) -> Self {
        Self {
            user_message: user_message.into(),
            debug_message,
        }
    }
}

/// Turns a typed line into the JSON value the engine expects for the kind.
/// Option membership is not checked here: everything flows through the
/// engine's `submit` so validation messages come from one place.
pub fn parse_answer(kind: FieldKind, input: &str, _options: &[String]) -> Result<Value, AnswerParseError> {
    match kind {
        FieldKind::ShortText | FieldKind::LongText | FieldKind::SingleSelect => {
            Ok(Value::String(input.to_string()))
        }
        FieldKind::MultiSelect => {
            if input.is_empty() {
                return Ok(json!([]));
            }
            let items: Vec<Value> = input
                .split(',')
                .map(|item| Value::String(item.trim().to_string()))
                .collect();
            Ok(Value::Array(items))
        }
        FieldKind::Boolean => match input.to_ascii_lowercase().as_str() {
            "yes" | "y" | "true" => Ok(Value::Bool(true)),
            "no" | "n" | "false" => Ok(Value::Bool(false)),
            _ => Err(AnswerParseError::new(
                format!("'{}' is not a yes/no answer", input),
                Some("yes/no, y/n, true/false".into()),
            )),
        },
        FieldKind::Numeric => {
            // The empty string rides along so the engine's required check
            // can report it.
            if input.is_empty() {
                return Ok(Value::String(String::new()));
            }
            if let Ok(int) = input.parse::<i64>() {
                return Ok(json!(int));
            }
            input
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .ok_or_else(|| {
                    AnswerParseError::new(
                        format!("'{}' is not a number", input),
                        Some("a decimal number, e.g. 3 or 2.5".into()),
                    )
                })
        }
    }
}

fn encode_hex(bytes: &[u8]) -> String {
    let mut encoded = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        write!(&mut encoded, "{:02x}", byte).expect("writing to string cannot fail");
    }
    encoded
}
