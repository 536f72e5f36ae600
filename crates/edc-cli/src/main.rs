//! Clinical trial data capture CLI.

use std::io::{self, IsTerminal};

use clap::Parser;
use edc_cli::logging::{LogConfig, LogFormat, init_logging};
use tracing::Level;

mod cli;
mod commands;

use crate::cli::{Cli, Command, FormsCommand, LogFormatArg, LogLevelArg, StudyCommand};
use crate::commands::{run_forms_list, run_forms_validate, run_study_check, run_study_define};

fn main() {
    let cli = Cli::parse();
    if let Some(config) = log_config_from_cli(&cli) {
        if let Err(error) = init_logging(&config) {
            eprintln!("error: failed to initialize logging: {error}");
            std::process::exit(1);
        }
    }
    let exit_code = match &cli.command {
        Command::Forms(FormsCommand::List) => match run_forms_list() {
            Ok(()) => 0,
            Err(error) => {
                eprintln!("error: {error:#}");
                1
            }
        },
        Command::Forms(FormsCommand::Validate(args)) => match run_forms_validate(args) {
            Ok(valid) => {
                if valid {
                    0
                } else {
                    1
                }
            }
            Err(error) => {
                eprintln!("error: {error:#}");
                1
            }
        },
        Command::Study(StudyCommand::Define(args)) => match run_study_define(args) {
            Ok(()) => 0,
            Err(error) => {
                eprintln!("error: {error:#}");
                1
            }
        },
        Command::Study(StudyCommand::Check(args)) => match run_study_check(args) {
            Ok(all_passed) => {
                if all_passed {
                    0
                } else {
                    1
                }
            }
            Err(error) => {
                eprintln!("error: {error:#}");
                1
            }
        },
    };
    std::process::exit(exit_code);
}

/// Build logging configuration from CLI flags with consistent precedence.
/// Returns None when logging is fully silenced (-qq).
fn log_config_from_cli(cli: &Cli) -> Option<LogConfig> {
    let level = match cli.log_level {
        Some(LogLevelArg::Error) => Some(Level::ERROR),
        Some(LogLevelArg::Warn) => Some(Level::WARN),
        Some(LogLevelArg::Info) => Some(Level::INFO),
        Some(LogLevelArg::Debug) => Some(Level::DEBUG),
        Some(LogLevelArg::Trace) => Some(Level::TRACE),
        None => cli.verbosity.tracing_level(),
    }?;
    let format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    let with_ansi = cli.log_file.is_none() && io::stderr().is_terminal();
    Some(
        LogConfig::default()
            .with_level(level)
            .with_format(format)
            .with_log_file(cli.log_file.clone())
            .with_log_data(cli.log_data)
            .with_ansi(with_ansi),
    )
}
