//! Static JSON CLI
//!
//! Exports CMS content into static JSON documents.
//!
//! This is the binary entry point. The library functionality is in `lib.rs`.

use clap::Parser;
use color_eyre::eyre::Result;

/// Command-line interface for Static JSON.
#[derive(Parser)]
#[command(
    name = "staticjson",
    version,
    about = "Export CMS content as static JSON documents"
)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "staticjson.toml")]
    config: std::path::PathBuf,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands.
#[derive(clap::Subcommand)]
enum Commands {
    /// Generate the JSON documents once
    Generate {
        /// Content dump to export (overrides export.content)
        #[arg(long)]
        content: Option<std::path::PathBuf>,
        /// Output directory (overrides export.output_dir)
        #[arg(short, long)]
        output: Option<std::path::PathBuf>,
    },
    /// Regenerate whenever the content dump changes
    Watch {
        /// Content dump to watch (overrides export.content)
        #[arg(long)]
        content: Option<std::path::PathBuf>,
    },
    /// Validate configuration and content model
    Check {
        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    staticjson::init_tracing(cli.verbose);

    match cli.command {
        Commands::Generate { content, output } => {
            staticjson::cmd::generate::run(&cli.config, content.as_deref(), output.as_deref())?;
        }
        Commands::Watch { content } => {
            staticjson::cmd::watch::run(&cli.config, content.as_deref()).await?;
        }
        Commands::Check { strict } => {
            staticjson::cmd::check::run(&cli.config, strict)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn test_cli_generate_command_parsing() {
        let args = ["staticjson", "generate", "--output", "dist"];
        let cli = Cli::parse_from(args);

        assert_eq!(cli.config, std::path::PathBuf::from("staticjson.toml"));
        assert_eq!(cli.verbose, 0);

        match cli.command {
            Commands::Generate { content, output } => {
                assert!(content.is_none());
                assert_eq!(output, Some(std::path::PathBuf::from("dist")));
            }
            _ => panic!("Expected Generate command"),
        }
    }

    #[test]
    fn test_cli_generate_with_content() {
        let args = ["staticjson", "generate", "--content", "dump.yaml"];
        let cli = Cli::parse_from(args);

        match cli.command {
            Commands::Generate { content, output } => {
                assert_eq!(content, Some(std::path::PathBuf::from("dump.yaml")));
                assert!(output.is_none());
            }
            _ => panic!("Expected Generate command"),
        }
    }

    #[test]
    fn test_cli_watch_command_parsing() {
        let args = ["staticjson", "watch"];
        let cli = Cli::parse_from(args);
        assert!(matches!(cli.command, Commands::Watch { content: None }));
    }

    #[test]
    fn test_cli_check_command_parsing() {
        let args = ["staticjson", "check", "--strict"];
        let cli = Cli::parse_from(args);

        match cli.command {
            Commands::Check { strict } => {
                assert!(strict);
            }
            _ => panic!("Expected Check command"),
        }
    }

    #[test]
    fn test_cli_verbosity_flags() {
        let args = ["staticjson", "-vvv", "generate"];
        let cli = Cli::parse_from(args);
        assert_eq!(cli.verbose, 3);
    }

    #[test]
    fn test_cli_custom_config() {
        let args = ["staticjson", "--config", "site/export.toml", "check"];
        let cli = Cli::parse_from(args);
        assert_eq!(cli.config, std::path::PathBuf::from("site/export.toml"));
    }
}
