//! Moneta CLI - personal finance tracking in your terminal

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod output;

use commands::config::ConfigCommands;
use commands::logs::LogsCommands;
use commands::transactions::{FormArgs, RangeArgs};
use commands::{auth, transactions};
use moneta_core::LogEvent;

/// Moneta - personal finance tracking in your terminal
#[derive(Parser)]
#[command(name = "mt", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and remember the session
    Login {
        #[arg(long, short)]
        email: Option<String>,
        /// Password (or MONETA_PASSWORD, or piped on stdin)
        #[arg(long, short)]
        password: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Create an account
    Register {
        #[arg(long, short)]
        name: Option<String>,
        #[arg(long, short)]
        email: Option<String>,
        /// Password (or MONETA_PASSWORD, or piped on stdin)
        #[arg(long, short)]
        password: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Forget the stored session
    Logout {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show who is logged in
    #[command(alias = "status")]
    Whoami {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Transactions, totals and chart for a period
    Dashboard {
        #[command(flatten)]
        range: RangeArgs,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List transactions, newest first
    List {
        #[command(flatten)]
        range: RangeArgs,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show balance and totals by type and category
    Summary {
        #[command(flatten)]
        range: RangeArgs,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Add a transaction
    Add {
        #[command(flatten)]
        fields: FormArgs,
        #[command(flatten)]
        range: RangeArgs,
        /// Output as JSON (no prompts)
        #[arg(long)]
        json: bool,
    },

    /// Edit a transaction; only the given fields change
    Edit {
        /// Transaction ID
        id: i64,
        #[command(flatten)]
        fields: FormArgs,
        #[command(flatten)]
        range: RangeArgs,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete a transaction
    Delete {
        /// Transaction ID
        id: i64,
        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
        #[command(flatten)]
        range: RangeArgs,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the transaction categories
    Categories {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show or change settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// View and manage the event log
    Logs {
        #[command(subcommand)]
        command: LogsCommands,
    },
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Login { .. } => "login",
            Commands::Register { .. } => "register",
            Commands::Logout { .. } => "logout",
            Commands::Whoami { .. } => "whoami",
            Commands::Dashboard { .. } => "dashboard",
            Commands::List { .. } => "list",
            Commands::Summary { .. } => "summary",
            Commands::Add { .. } => "add",
            Commands::Edit { .. } => "edit",
            Commands::Delete { .. } => "delete",
            Commands::Categories { .. } => "categories",
            Commands::Config { .. } => "config",
            Commands::Logs { .. } => "logs",
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let command = cli.command.name();

    let logger = commands::get_logger();
    commands::log_event(&logger, LogEvent::new("command_executed").with_command(command));

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<moneta_core::Error>() {
                Some(core) => {
                    if let Some(l) = &logger {
                        let _ = l.log_failure("command_failed", command, None, core);
                    }
                }
                None => commands::log_event(
                    &logger,
                    LogEvent::new("command_failed")
                        .with_command(command)
                        .with_error("cli"),
                ),
            }

            output::error(&format!("{:#}", e));
            if matches!(
                e.downcast_ref::<moneta_core::Error>(),
                Some(moneta_core::Error::Auth(_))
            ) {
                output::info("Run 'mt login' to sign in.");
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Login { email, password, json } => auth::run_login(email, password, json),
        Commands::Register { name, email, password, json } => {
            auth::run_register(name, email, password, json)
        }
        Commands::Logout { json } => auth::run_logout(json),
        Commands::Whoami { json } => auth::run_whoami(json),
        Commands::Dashboard { range, json } => transactions::run_dashboard(range, json),
        Commands::List { range, json } => transactions::run_list(range, json),
        Commands::Summary { range, json } => transactions::run_summary(range, json),
        Commands::Add { fields, range, json } => transactions::run_add(fields, range, json),
        Commands::Edit {
            id,
            fields,
            range,
            json,
        } => transactions::run_edit(id, fields, range, json),
        Commands::Delete { id, force, range, json } => {
            transactions::run_delete(id, force, range, json)
        }
        Commands::Categories { json } => transactions::run_categories(json),
        Commands::Config { command } => commands::config::run(command),
        Commands::Logs { command } => commands::logs::run(command),
    }
}
