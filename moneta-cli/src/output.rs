//! Output formatting utilities

use std::time::Duration;

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL_CONDENSED, Cell, CellAlignment, ContentArrangement, Table};
use indicatif::{ProgressBar, ProgressStyle};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use moneta_core::{Summary, Transaction, TransactionType};

/// Print a success message
pub fn success(msg: &str) {
    println!("{}", msg.green());
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{}", msg.red());
}

/// Print a warning message
pub fn warning(msg: &str) {
    println!("{}", msg.yellow());
}

/// Print an info message
pub fn info(msg: &str) {
    println!("{}", msg.cyan());
}

/// Create a styled table
pub fn create_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Format bytes as human-readable size
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

/// Run `f` behind a spinner on stderr; hidden when stderr is not a terminal or `quiet`
pub fn with_spinner<T>(message: &str, quiet: bool, f: impl FnOnce() -> T) -> T {
    if quiet || atty::isnt(atty::Stream::Stderr) {
        return f();
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(80));

    let result = f();
    spinner.finish_and_clear();
    result
}

/// Amount with two decimals
pub fn format_amount(amount: Decimal) -> String {
    format!("{:.2}", amount)
}

/// Amount as shown in lists: expenses negative, sign and color follow the result
pub fn format_signed(tx: &Transaction) -> String {
    let signed = tx.transaction_type.signed(tx.amount);
    let magnitude = format_amount(signed.abs());
    if signed.is_sign_negative() && !signed.is_zero() {
        format!("-{}", magnitude).red().to_string()
    } else {
        format!("+{}", magnitude).green().to_string()
    }
}

/// Balance colored by sign
pub fn format_balance(balance: Decimal) -> String {
    let text = format_amount(balance);
    if balance.is_sign_negative() && !balance.is_zero() {
        text.red().bold().to_string()
    } else {
        text.green().bold().to_string()
    }
}

pub fn transactions_table(transactions: &[Transaction]) -> Table {
    let mut table = create_table();
    table.set_header(vec!["ID", "Date", "Description", "Category", "Type", "Amount"]);

    for tx in transactions {
        table.add_row(vec![
            Cell::new(tx.id),
            Cell::new(tx.date),
            Cell::new(&tx.description),
            Cell::new(tx.category_label()),
            Cell::new(tx.transaction_type),
            Cell::new(format_signed(tx)).set_alignment(CellAlignment::Right),
        ]);
    }

    table
}

const BAR_WIDTH: usize = 30;

/// Horizontal bars scaled to the largest value
pub fn bar_chart(rows: &[(String, Decimal)]) -> Vec<String> {
    let max = rows.iter().map(|(_, v)| v.abs()).max().unwrap_or(Decimal::ZERO);
    let label_width = rows.iter().map(|(l, _)| l.chars().count()).max().unwrap_or(0);

    rows.iter()
        .map(|(label, value)| {
            let len = if max.is_zero() {
                0
            } else {
                // ratio first: the product could overflow for huge totals
                (value.abs() / max * Decimal::from(BAR_WIDTH as u64))
                    .round()
                    .to_usize()
                    .unwrap_or(0)
            };
            format!(
                "{:<width$}  {:<bar$}  {}",
                label,
                "█".repeat(len),
                format_amount(*value),
                width = label_width,
                bar = BAR_WIDTH
            )
        })
        .collect()
}

/// Balance, per-type totals and the per-category chart
pub fn print_summary(summary: &Summary) {
    println!("Balance:  {}", format_balance(summary.balance));
    println!(
        "Income:   {}",
        format_amount(summary.total(TransactionType::Income)).green()
    );
    println!(
        "Expense:  {}",
        format_amount(summary.total(TransactionType::Expense)).red()
    );
    if !summary.is_consistent() {
        warning("Balance does not match income minus expense");
    }

    if summary.totals_by_category.is_empty() {
        return;
    }

    let mut rows: Vec<(String, Decimal)> = summary
        .totals_by_category
        .iter()
        .map(|(name, total)| (name.clone(), *total))
        .collect();
    rows.sort_by(|a, b| b.1.abs().cmp(&a.1.abs()));

    println!();
    println!("{}", "By category".bold());
    for line in bar_chart(&rows) {
        println!("  {}", line);
    }
}
