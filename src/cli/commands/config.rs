use anyhow::Result;
use clap::Subcommand;

use crate::cli::output::get_formatter;
use crate::models::{Config, OutputFormat};

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the effective configuration
    Show,

    /// Write a default configuration file
    Init {
        /// Overwrite an existing configuration file
        #[arg(long, short = 'y')]
        force: bool,
    },

    /// Print the configuration file path
    Path,
}

pub async fn handle_config(cmd: ConfigCommand, format: OutputFormat, _verbose: bool) -> Result<()> {
    let formatter = get_formatter(format);

    match cmd {
        ConfigCommand::Show => {
            let config = Config::load()?;
            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&config)?);
                }
                _ => {
                    print!("{}", toml::to_string_pretty(&config)?);
                }
            }
        }
        ConfigCommand::Init { force } => {
            if let Some(path) = Config::config_path()
                && path.exists()
                && !force
            {
                anyhow::bail!(
                    "configuration already exists at {} (use --force to overwrite)",
                    path.display()
                );
            }
            let config = Config::default();
            config.save()?;
            if let Some(path) = Config::config_path() {
                println!(
                    "{}",
                    formatter
                        .format_message(&format!("Wrote configuration to {}", path.display()))
                );
            }
        }
        ConfigCommand::Path => match Config::config_path() {
            Some(path) => println!("{}", path.display()),
            None => anyhow::bail!("could not determine config directory"),
        },
    }

    Ok(())
}
