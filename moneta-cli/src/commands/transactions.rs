//! Transaction commands - list, add, edit, delete, summary, dashboard

use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Args;
use colored::Colorize;
use dialoguer::{Confirm, Input};
use rust_decimal::Decimal;

use moneta_core::domain::date_range::parse_date;
use moneta_core::{
    Category, DashboardView, DateRange, LogEvent, Mutation, MutationOutcome, TransactionForm,
    TransactionType,
};

use super::{get_context, get_logger, log_event};
use crate::output;

/// Date range selection shared by the data commands
#[derive(Args, Debug, Clone, Default)]
pub struct RangeArgs {
    /// Calendar month (YYYY-MM); defaults to the current month
    #[arg(long, conflicts_with_all = ["from", "to"])]
    pub month: Option<String>,
    /// First day of the range (YYYY-MM-DD), inclusive
    #[arg(long, requires = "to")]
    pub from: Option<String>,
    /// Last day of the range (YYYY-MM-DD), inclusive
    #[arg(long, requires = "from")]
    pub to: Option<String>,
}

impl RangeArgs {
    pub fn resolve(&self) -> Result<DateRange> {
        self.resolve_or(DateRange::current_month())
    }

    /// The selected range, or `fallback` when none was given
    pub fn resolve_or(&self, fallback: DateRange) -> Result<DateRange> {
        if let Some(month) = &self.month {
            return Ok(DateRange::parse_month(month)?);
        }
        match (&self.from, &self.to) {
            (Some(from), Some(to)) => Ok(DateRange::parse(from, to)?),
            _ => Ok(fallback),
        }
    }
}

/// Transaction fields; anything left out is prompted for (add) or kept (edit)
#[derive(Args, Debug, Clone, Default)]
pub struct FormArgs {
    /// Description
    #[arg(long, short)]
    pub description: Option<String>,
    /// Amount, e.g. 12.50
    #[arg(long, short, allow_hyphen_values = true)]
    pub amount: Option<String>,
    /// Date (YYYY-MM-DD)
    #[arg(long)]
    pub date: Option<String>,
    /// INCOME or EXPENSE
    #[arg(long = "type", short = 't')]
    pub transaction_type: Option<String>,
    /// Category name or id
    #[arg(long, short)]
    pub category: Option<String>,
}

impl FormArgs {
    /// Parse the given fields into a partial form
    fn to_form(&self) -> Result<TransactionForm> {
        Ok(TransactionForm {
            description: self.description.clone(),
            amount: self.amount.as_deref().map(parse_amount).transpose()?,
            date: self.date.as_deref().map(parse_date).transpose()?,
            transaction_type: self
                .transaction_type
                .as_deref()
                .map(TransactionType::from_str)
                .transpose()?,
            category: self.category.as_deref().map(Category::parse).transpose()?,
        })
    }
}

fn parse_amount(input: &str) -> Result<Decimal> {
    Decimal::from_str(input.trim().replace(',', ".").as_str())
        .with_context(|| format!("Invalid amount '{}'", input))
}

fn print_view(view: &DashboardView) {
    println!("{}", format!("Transactions {}", view.range).bold());
    if view.transactions.is_empty() {
        println!("No transactions in this period.");
    } else {
        println!("{}", output::transactions_table(&view.transactions));
    }
    println!();
    output::print_summary(&view.summary);
}

/// Report a mutation and the state of the refresh that followed it
fn report_mutation(outcome: MutationOutcome, command: &str, json: bool) -> Result<()> {
    let logger = get_logger();
    let event = match &outcome.mutation {
        Mutation::Created { .. } => "transaction_created",
        Mutation::Updated { .. } => "transaction_updated",
        Mutation::Deleted { .. } => "transaction_deleted",
    };
    log_event(
        &logger,
        LogEvent::new(event)
            .with_command(command)
            .with_endpoint(outcome.mutation.endpoint().template()),
    );
    if let (Some(logger), Err(e)) = (&logger, &outcome.refresh) {
        let _ = logger.log_failure("refresh_failed", command, outcome.failed_call, e);
    }

    if json {
        let refresh = match &outcome.refresh {
            Ok(view) => serde_json::json!({"ok": true, "view": view}),
            Err(e) => serde_json::json!({"ok": false, "error": e.to_string()}),
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "mutation": outcome.mutation,
                "refresh": refresh,
            }))?
        );
        return Ok(());
    }

    match &outcome.mutation {
        Mutation::Created { transaction } => {
            output::success(&format!("Created transaction {}", transaction.id))
        }
        Mutation::Updated { transaction } => {
            output::success(&format!("Updated transaction {}", transaction.id))
        }
        Mutation::Deleted { id } => output::success(&format!("Deleted transaction {}", id)),
    }

    match &outcome.refresh {
        Ok(view) => {
            println!();
            print_view(view);
        }
        Err(e) => {
            output::warning(&format!(
                "The change was saved, but reloading the list failed: {}",
                e
            ));
            output::info("Run 'mt dashboard' to see the current state.");
        }
    }
    Ok(())
}

pub fn run_list(range: RangeArgs, json: bool) -> Result<()> {
    let range = range.resolve()?;
    let ctx = get_context()?;
    let transactions = output::with_spinner("Loading transactions...", json, || {
        ctx.transaction_service.transactions(&range)
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&transactions)?);
        return Ok(());
    }

    println!("{}", format!("Transactions {}", range).bold());
    if transactions.is_empty() {
        println!("No transactions in this period.");
    } else {
        println!("{}", output::transactions_table(&transactions));
        println!("{} transaction(s)", transactions.len());
    }
    Ok(())
}

pub fn run_summary(range: RangeArgs, json: bool) -> Result<()> {
    let range = range.resolve()?;
    let ctx = get_context()?;
    let summary = output::with_spinner("Loading summary...", json, || {
        ctx.transaction_service.summary(&range)
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("{}", format!("Summary {}", range).bold());
    output::print_summary(&summary);
    Ok(())
}

pub fn run_dashboard(range: RangeArgs, json: bool) -> Result<()> {
    let range = range.resolve()?;
    let ctx = get_context()?;
    let view = output::with_spinner("Loading dashboard...", json, || {
        ctx.transaction_service.dashboard(&range)
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        print_view(&view);
    }
    Ok(())
}

pub fn run_add(fields: FormArgs, range: RangeArgs, json: bool) -> Result<()> {
    let ctx = get_context()?;
    // check the session before prompting
    ctx.session.guard()?;

    let mut form = TransactionForm {
        date: Some(Local::now().date_naive()),
        ..TransactionForm::default()
    }
    .with_overrides(fields.to_form()?);

    if form.description.is_none() && !json {
        form.description = Some(Input::new().with_prompt("Description").interact_text()?);
    }
    if form.amount.is_none() && !json {
        let amount: String = Input::new().with_prompt("Amount").interact_text()?;
        form.amount = Some(parse_amount(&amount)?);
    }

    // by default show the month the new transaction lands in
    let date = form.date.unwrap_or_else(|| Local::now().date_naive());
    let range = range.resolve_or(DateRange::containing_month(date))?;

    let outcome = output::with_spinner("Saving...", json, || {
        ctx.transaction_service.create(&form, &range)
    })?;
    report_mutation(outcome, "add", json)
}

pub fn run_edit(id: i64, fields: FormArgs, range: RangeArgs, json: bool) -> Result<()> {
    let range = range.resolve()?;
    let changes = fields.to_form()?;
    let ctx = get_context()?;

    let outcome = output::with_spinner("Saving...", json, || {
        ctx.transaction_service.edit(id, changes, &range)
    })?;
    report_mutation(outcome, "edit", json)
}

pub fn run_delete(id: i64, force: bool, range: RangeArgs, json: bool) -> Result<()> {
    let range = range.resolve()?;
    let ctx = get_context()?;
    ctx.session.guard()?;

    if !force && !json {
        if !Confirm::new()
            .with_prompt(format!("Delete transaction {}?", id))
            .default(false)
            .interact()?
        {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let outcome = output::with_spinner("Deleting...", json, || {
        ctx.transaction_service.delete(id, &range)
    })?;
    report_mutation(outcome, "delete", json)
}

pub fn run_categories(json: bool) -> Result<()> {
    if json {
        let categories: Vec<_> = Category::ALL
            .iter()
            .map(|c| serde_json::json!({"id": c.id(), "name": c.name()}))
            .collect();
        println!("{}", serde_json::to_string_pretty(&categories)?);
        return Ok(());
    }

    let mut table = output::create_table();
    table.set_header(vec!["ID", "Name"]);
    for category in Category::ALL {
        table.add_row(vec![category.id().to_string(), category.name().to_string()]);
    }
    println!("{}", table);
    Ok(())
}
