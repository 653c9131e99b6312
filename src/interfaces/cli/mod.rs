//! CLI interface module
//!
//! One-shot commands that run without the HTTP server.

pub mod commands;

use std::fmt;

use crate::cli::{Commands, ConfigCommands, QrCommands};
use commands::{config_generate, qr_render};

#[derive(Debug)]
pub enum CliError {
    StorageError(String),
    ParseError(String),
    CommandError(String),
}

impl CliError {
    /// Format as simple output
    pub fn format_simple(&self) -> String {
        match self {
            CliError::StorageError(msg) => format!("Storage error: {}", msg),
            CliError::ParseError(msg) => format!("Parse error: {}", msg),
            CliError::CommandError(msg) => format!("Command error: {}", msg),
        }
    }

    /// Format as colored output
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        match self {
            CliError::StorageError(msg) => {
                format!("{} {}", "Storage error:".red().bold(), msg.white())
            }
            CliError::ParseError(msg) => {
                format!("{} {}", "Parse error:".yellow().bold(), msg.white())
            }
            CliError::CommandError(msg) => {
                format!("{} {}", "Command error:".red().bold(), msg.white())
            }
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for CliError {}

impl From<crate::errors::StudioError> for CliError {
    fn from(err: crate::errors::StudioError) -> Self {
        match err {
            crate::errors::StudioError::DatabaseConfig(_)
            | crate::errors::StudioError::DatabaseConnection(_)
            | crate::errors::StudioError::DatabaseOperation(_) => {
                CliError::StorageError(err.message().to_string())
            }
            crate::errors::StudioError::Validation(_) => {
                CliError::ParseError(err.message().to_string())
            }
            other => CliError::CommandError(other.to_string()),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::CommandError(err.to_string())
    }
}

/// Run a CLI command from clap-parsed input
pub async fn run_cli_command(cmd: Commands) -> Result<(), CliError> {
    match cmd {
        Commands::Config {
            action: ConfigCommands::Generate { output_path, force },
        } => config_generate(output_path, force).await,

        Commands::Qr {
            action:
                QrCommands::Render {
                    slug,
                    format,
                    size,
                    output,
                },
        } => qr_render(slug, format, size, output).await,

        Commands::Serve => Err(CliError::CommandError(
            "serve is handled by the server mode".to_string(),
        )),
    }
}
