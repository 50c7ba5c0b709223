//! Config command - show and change client settings

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use moneta_core::config::{Config, Source, API_URL_ENV};
use moneta_core::SESSION_FILE;

use super::get_moneta_dir;
use crate::output;

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Set the finance API base URL
    SetApiUrl {
        /// Base URL, e.g. http://localhost:8080
        url: String,
    },
}

pub fn run(command: ConfigCommands) -> Result<()> {
    let moneta_dir = get_moneta_dir()?;

    match command {
        ConfigCommands::Show { json } => {
            let config = Config::load(&moneta_dir)?;

            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "config": config,
                        "directory": moneta_dir.to_string_lossy(),
                    }))?
                );
                return Ok(());
            }

            let source = match config.api_url_source {
                Source::Default => "default".to_string(),
                Source::File => "settings.json".to_string(),
                Source::Env => API_URL_ENV.to_string(),
            };
            println!("{}", "Configuration".bold());
            println!("  API URL:   {} {}", config.api_url, format!("({})", source).dimmed());
            println!("  Directory: {}", moneta_dir.display());
            println!("  Session:   {}", moneta_dir.join(SESSION_FILE).display());
        }
        ConfigCommands::SetApiUrl { url } => {
            url::Url::parse(url.trim()).with_context(|| format!("Invalid URL '{}'", url))?;
            Config::save_api_url(&moneta_dir, &url)?;
            output::success(&format!("API URL set to {}", url.trim()));
            if std::env::var(API_URL_ENV).is_ok() {
                output::warning(&format!("{} is set and overrides this value", API_URL_ENV));
            }
        }
    }

    Ok(())
}
