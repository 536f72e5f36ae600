//! CLI argument definitions for the EDC engine.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};

#[derive(Parser)]
#[command(
    name = "edc",
    version,
    about = "Clinical trial data capture and compliance engine",
    long_about = "Validate case report form data, screen study protocols, and run\n\
                  compliance checks against a study definition."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Allow field-level (PHI) values in trace logs.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Inspect and validate case report forms.
    #[command(subcommand)]
    Forms(FormsCommand),

    /// Define and check study protocols.
    #[command(subcommand)]
    Study(StudyCommand),
}

#[derive(Subcommand)]
pub enum FormsCommand {
    /// List the built-in case report form definitions.
    List,

    /// Validate a JSON data file against a form definition.
    Validate(FormsValidateArgs),
}

#[derive(Parser)]
pub struct FormsValidateArgs {
    /// Form identifier (e.g. vital_signs).
    #[arg(long = "form", value_name = "FORM_ID")]
    pub form_id: String,

    /// Path to a JSON object with the field values to validate.
    #[arg(value_name = "DATA_FILE")]
    pub data_file: PathBuf,
}

#[derive(Subcommand)]
pub enum StudyCommand {
    /// Parse a protocol file and define the study, reporting its summary.
    Define(StudyArgs),

    /// Define a study and run every registered compliance check against it.
    Check(StudyArgs),
}

#[derive(Parser)]
pub struct StudyArgs {
    /// Path to the study protocol JSON file.
    #[arg(value_name = "PROTOCOL_FILE")]
    pub protocol_file: PathBuf,

    /// Study identifier to register the protocol under.
    #[arg(long = "id", value_name = "STUDY_ID", default_value = "STUDY-1")]
    pub study_id: String,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
