//! Command-line interface definitions using clap

use clap::{Parser, Subcommand};

use crate::services::qr::AssetFormat;

/// QR-Gen Studio - dynamic QR codes and short links
#[derive(Parser)]
#[command(name = "qrgen-studio")]
#[command(version)]
#[command(about = "Dynamic QR codes and short links with scan analytics", long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(long, short = 'c', global = true, default_value = crate::config::DEFAULT_CONFIG_PATH)]
    pub config: String,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },

    /// QR code assets
    Qr {
        #[command(subcommand)]
        action: QrCommands,
    },
}

/// Configuration management commands
#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Generate example configuration file
    Generate {
        /// Output path (default: config.example.toml)
        output_path: Option<String>,

        /// Force overwrite without confirmation
        #[arg(long)]
        force: bool,
    },
}

/// QR asset commands
#[derive(Subcommand)]
pub enum QrCommands {
    /// Render a stored QR code to a file
    Render {
        /// Public slug of the QR code
        slug: String,

        /// Output format
        #[arg(long, short = 'f', default_value = "svg")]
        format: AssetFormat,

        /// PNG edge length (512 or 2048)
        #[arg(long, default_value_t = 512)]
        size: u32,

        /// Output file (default: generated file name)
        #[arg(long, short = 'o')]
        output: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_means_serve() {
        let cli = Cli::parse_from(["qrgen-studio"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.config, crate::config::DEFAULT_CONFIG_PATH);
    }

    #[test]
    fn test_parse_qr_render() {
        let cli = Cli::parse_from([
            "qrgen-studio",
            "--config",
            "custom.toml",
            "qr",
            "render",
            "menu",
            "--format",
            "png",
            "--size",
            "2048",
        ]);
        assert_eq!(cli.config, "custom.toml");
        match cli.command {
            Some(Commands::Qr {
                action:
                    QrCommands::Render {
                        slug,
                        format,
                        size,
                        output,
                    },
            }) => {
                assert_eq!(slug, "menu");
                assert_eq!(format, AssetFormat::Png);
                assert_eq!(size, 2048);
                assert!(output.is_none());
            }
            _ => panic!("expected qr render"),
        }
    }

    #[test]
    fn test_parse_config_generate() {
        let cli = Cli::parse_from(["qrgen-studio", "config", "generate", "out.toml", "--force"]);
        assert!(matches!(
            cli.command,
            Some(Commands::Config {
                action: ConfigCommands::Generate { force: true, .. }
            })
        ));
    }
}
