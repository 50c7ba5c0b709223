//! CLI command implementations

pub mod auth;
pub mod config;
pub mod logs;
pub mod transactions;

use std::path::PathBuf;

use anyhow::{Context, Result};
use moneta_core::{LogEvent, LoggingService, MonetaContext};

/// Get the logging service for CLI operations
///
/// Returns None if logging fails to initialize (shouldn't block operations)
pub fn get_logger() -> Option<LoggingService> {
    let moneta_dir = get_moneta_dir().ok()?;
    std::fs::create_dir_all(&moneta_dir).ok()?;
    LoggingService::new(&moneta_dir, env!("CARGO_PKG_VERSION")).ok()
}

/// Log an event, ignoring any errors (logging should never break the app)
pub fn log_event(logger: &Option<LoggingService>, event: LogEvent) {
    if let Some(l) = logger {
        let _ = l.log(event);
    }
}

/// Get the moneta directory from `MONETA_DIR` or default to ~/.moneta
pub fn get_moneta_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("MONETA_DIR") {
        return Ok(PathBuf::from(dir));
    }
    let home = dirs::home_dir().context("Could not find home directory; set MONETA_DIR")?;
    Ok(home.join(".moneta"))
}

/// Get or create moneta context
pub fn get_context() -> Result<MonetaContext> {
    let moneta_dir = get_moneta_dir()?;

    std::fs::create_dir_all(&moneta_dir)
        .with_context(|| format!("Failed to create moneta directory: {:?}", moneta_dir))?;

    MonetaContext::new(&moneta_dir).context("Failed to initialize moneta context")
}
