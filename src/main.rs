//! Somnolens: sleep-disorder screening.
//!
//! Reads one request (a JSON object of field values) from a file argument or
//! stdin, prints one JSON response on stdout. Logs go to stderr or a file.

use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use somnolens::adapters::forest::RandomForest;
use somnolens::adapters::preprocessor::FittedPreprocessor;
use somnolens::adapters::sanitize::RedactingMakeWriter;
use somnolens::config::LogMode;
use somnolens::{
    AnalysisError, AnalysisService, ArtifactError, ArtifactLoader, Assessment, Config, RawInput,
    Stage,
};

const EXIT_OK: u8 = 0;
const EXIT_SYSTEM_ERROR: u8 = 1;
const EXIT_USER_ERROR: u8 = 2;
const EXIT_STARTUP_FAILURE: u8 = 3;

const USAGE: &str = "Usage: somnolens [INPUT.json]\n       somnolens --defaults\n\n\
Reads a JSON object of measurements from INPUT.json (or stdin) and prints the assessment as JSON.\n\
--defaults prints a pre-filled input template.\n\n\
Exit codes: 0 ok, 1 system error, 2 invalid input, 3 startup failure.";

#[derive(Serialize)]
struct FieldIssue {
    field: String,
    message: String,
}

#[derive(Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
enum Response<'a> {
    Ok {
        assessment: &'a Assessment,
    },
    Error {
        stage: &'a str,
        message: String,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        fields: Vec<FieldIssue>,
    },
}

enum Command {
    Help,
    Defaults,
    Analyze(Option<PathBuf>),
}

fn parse_args() -> Result<Command, String> {
    let mut input: Option<PathBuf> = None;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "-h" | "--help" => return Ok(Command::Help),
            "--defaults" => return Ok(Command::Defaults),
            // "-" reads stdin, same as no argument.
            "-" => {}
            _ if arg.starts_with('-') => return Err(format!("Unknown arg: {arg}")),
            _ if input.is_none() => input = Some(PathBuf::from(arg)),
            _ => return Err("at most one input file may be given".to_string()),
        }
    }
    Ok(Command::Analyze(input))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("failed to serialize response")?;
    println!("{out}");
    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("somnolens: {e:#}");
            ExitCode::from(EXIT_SYSTEM_ERROR)
        }
    }
}

fn run() -> Result<ExitCode> {
    let command = match parse_args() {
        Ok(command) => command,
        Err(msg) => {
            eprintln!("{msg}\n{USAGE}");
            return Ok(ExitCode::from(EXIT_USER_ERROR));
        }
    };

    let input_path = match command {
        Command::Help => {
            println!("{USAGE}");
            return Ok(ExitCode::SUCCESS);
        }
        Command::Defaults => {
            print_json(&RawInput::form_defaults())?;
            return Ok(ExitCode::SUCCESS);
        }
        Command::Analyze(path) => path,
    };

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("somnolens: {e}");
            return Ok(ExitCode::from(EXIT_STARTUP_FAILURE));
        }
    };

    // Stdout carries responses only.
    let (writer, _guard) = match config.log_mode {
        LogMode::File => {
            if let Some(parent) = config.log_file.parent() {
                // Best-effort: a missing directory surfaces as an open error below.
                let _ = std::fs::create_dir_all(parent);
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&config.log_file)
                .with_context(|| format!("failed to open log file {:?}", config.log_file))?;
            tracing_appender::non_blocking(file)
        }
        LogMode::Stderr => tracing_appender::non_blocking(std::io::stderr()),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(RedactingMakeWriter::new(writer)),
        )
        .init();

    let service = match start_service(&config) {
        Ok(service) => service,
        Err(e) => {
            tracing::error!(error = %e, "startup failed");
            eprintln!("somnolens: {e}");
            return Ok(ExitCode::from(EXIT_STARTUP_FAILURE));
        }
    };

    let body = match &input_path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read input file {path:?}"))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read input from stdin")?;
            buf
        }
    };

    let raw: RawInput = match serde_json::from_str(&body) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::info!(line = e.line(), column = e.column(), "request is not a JSON object");
            print_json(&malformed_request())?;
            return Ok(ExitCode::from(EXIT_USER_ERROR));
        }
    };

    let result = service.analyze(&raw);
    let (response, code) = respond(&result);
    print_json(&response)?;
    Ok(ExitCode::from(code))
}

type Service = AnalysisService<FittedPreprocessor, RandomForest>;

/// Load both artifacts named by `config` and build the pipeline.
fn start_service(config: &Config) -> Result<Service, ArtifactError> {
    let artifacts = ArtifactLoader::from_config(config)?.load()?;
    Ok(AnalysisService::from_artifacts(artifacts))
}

/// Response for a request body that is not a JSON object.
fn malformed_request() -> Response<'static> {
    Response::Error {
        stage: Stage::Validation.as_str(),
        message: "Input must be a JSON object mapping field names to values.".to_string(),
        fields: Vec::new(),
    }
}

/// Response and exit code for an analysis outcome.
fn respond(result: &Result<Assessment, AnalysisError>) -> (Response<'_>, u8) {
    match result {
        Ok(assessment) => (Response::Ok { assessment }, EXIT_OK),
        Err(e) if e.is_user_error() => (error_response(e), EXIT_USER_ERROR),
        Err(e) => (error_response(e), EXIT_SYSTEM_ERROR),
    }
}

fn error_response(e: &AnalysisError) -> Response<'static> {
    let fields = e
        .validation_errors()
        .map(|errors| {
            errors
                .iter()
                .map(|v| FieldIssue {
                    field: v.field.clone(),
                    message: v.guidance(),
                })
                .collect()
        })
        .unwrap_or_default();
    Response::Error {
        stage: e.stage().as_str(),
        message: e.user_message(),
        fields,
    }
}
