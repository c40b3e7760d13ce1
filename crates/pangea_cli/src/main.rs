//! Pangea CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Invalid arguments or configuration
//! - 3: Validation failure
//! - 4: Template error

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use pangea_core::PangeaError;

mod commands;

use commands::{Cli, Commands};

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const INVALID_ARGS: u8 = 2;
    pub const VALIDATION_FAILURE: u8 = 3;
    pub const TEMPLATE_ERROR: u8 = 4;
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    let result = match &cli.command {
        Commands::Synth(args) => commands::synth::execute(&cli, args),
        Commands::Validate(args) => commands::validate::execute(&cli, args),
        Commands::Resources(args) => commands::resources::execute(&cli, args),
        Commands::Cost(args) => commands::cost::execute(&cli, args),
    };

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            let exit_code = categorize_error(&e);
            eprintln!("❌ Error: {:#}", e);
            ExitCode::from(exit_code)
        }
    }
}

fn init_logging(cli: &Cli) {
    let default_level = if cli.verbose {
        "pangea=debug"
    } else if cli.quiet {
        "pangea=error"
    } else {
        "pangea=info"
    };

    let mut filter = EnvFilter::from_default_env();
    for directive in [default_level, "warn"] {
        if let Ok(directive) = directive.parse() {
            filter = filter.add_directive(directive);
        }
    }

    let registry = tracing_subscriber::registry().with(filter);
    let log_result = if cli.log_json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init()
    };

    if log_result.is_err() {
        // Logging already initialized, continue
    }
}

/// Categorize error to determine exit code
fn categorize_error(e: &anyhow::Error) -> u8 {
    for cause in e.chain() {
        if let Some(err) = cause.downcast_ref::<PangeaError>() {
            return match err {
                PangeaError::Validation(_)
                | PangeaError::InvalidAttributes { .. }
                | PangeaError::InvalidResourceName { .. }
                | PangeaError::DuplicateResource(_)
                | PangeaError::UnknownResourceType(_) => ExitCodes::VALIDATION_FAILURE,
                PangeaError::UnsupportedTemplateFormat(_)
                | PangeaError::Json(_)
                | PangeaError::Yaml(_) => ExitCodes::TEMPLATE_ERROR,
                PangeaError::Config(_) | PangeaError::Toml(_) => ExitCodes::INVALID_ARGS,
                PangeaError::Io(_) => ExitCodes::GENERAL_ERROR,
            };
        }
    }

    let msg = e.to_string().to_lowercase();
    if msg.contains("validation") {
        ExitCodes::VALIDATION_FAILURE
    } else if msg.contains("template") {
        ExitCodes::TEMPLATE_ERROR
    } else if msg.contains("argument") || msg.contains("not found") {
        ExitCodes::INVALID_ARGS
    } else {
        ExitCodes::GENERAL_ERROR
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_categorize_pangea_errors() {
        let err = anyhow::Error::new(PangeaError::UnknownResourceType("aws_instance".into()));
        assert_eq!(categorize_error(&err), ExitCodes::VALIDATION_FAILURE);

        let err = anyhow::Error::new(PangeaError::Config("region must not be empty".into()));
        assert_eq!(categorize_error(&err), ExitCodes::INVALID_ARGS);

        let err = anyhow::Error::new(PangeaError::UnsupportedTemplateFormat("a.txt".into()));
        assert_eq!(categorize_error(&err), ExitCodes::TEMPLATE_ERROR);
    }

    #[test]
    fn test_categorize_wrapped_error() {
        let result: Result<(), PangeaError> = Err(PangeaError::DuplicateResource("aws_vpc.main".into()));
        let err = result.context("Failed to synthesize network.yaml").unwrap_err();
        assert_eq!(categorize_error(&err), ExitCodes::VALIDATION_FAILURE);
    }

    #[test]
    fn test_categorize_by_message() {
        assert_eq!(
            categorize_error(&anyhow::anyhow!("Template path not found: x")),
            ExitCodes::TEMPLATE_ERROR
        );
        assert_eq!(
            categorize_error(&anyhow::anyhow!("Path not found: x")),
            ExitCodes::INVALID_ARGS
        );
        assert_eq!(
            categorize_error(&anyhow::anyhow!("2 template(s) failed validation")),
            ExitCodes::VALIDATION_FAILURE
        );
        assert_eq!(categorize_error(&anyhow::anyhow!("disk full")), ExitCodes::GENERAL_ERROR);
    }
}
