//! List command - show saved receipts and their warranty status.

use std::path::PathBuf;

use clap::Args;
use console::style;
use serde::Serialize;

use rcpt_core::extract::today;
use rcpt_core::models::receipt::{days_until_expiry, WarrantyStatus};
use rcpt_core::store::{JsonLinesStore, ReceiptStore, StoredReceipt};

use super::{load_config, OutputFormat};

/// Arguments for the list command.
#[derive(Args)]
pub struct ListArgs {
    /// Receipt log to read (default: from config)
    #[arg(long)]
    store: Option<PathBuf>,

    /// Only show receipts with this warranty status
    #[arg(long, value_enum)]
    status: Option<StatusFilter>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum StatusFilter {
    Active,
    Expiring,
    Expired,
}

impl From<StatusFilter> for WarrantyStatus {
    fn from(filter: StatusFilter) -> Self {
        match filter {
            StatusFilter::Active => WarrantyStatus::Active,
            StatusFilter::Expiring => WarrantyStatus::Expiring,
            StatusFilter::Expired => WarrantyStatus::Expired,
        }
    }
}

#[derive(Serialize)]
struct ListRow<'a> {
    id: usize,
    store: &'a str,
    item: &'a str,
    amount: String,
    purchase_date: String,
    warranty_expiry: String,
    status: WarrantyStatus,
    days_left: i64,
}

impl<'a> ListRow<'a> {
    fn new(stored: &'a StoredReceipt, status: WarrantyStatus) -> Self {
        let receipt = &stored.receipt;
        Self {
            id: stored.id,
            store: &receipt.store,
            item: &receipt.item,
            amount: receipt.currency.format_amount(receipt.amount),
            purchase_date: receipt.purchase_date.to_string(),
            warranty_expiry: receipt.warranty_expiry.to_string(),
            status,
            days_left: days_until_expiry(receipt.warranty_expiry, today()),
        }
    }
}

pub fn run(args: ListArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let path = args.store.unwrap_or(config.store.path);
    let store = JsonLinesStore::new(path);

    let today = today();
    let receipts = store.list()?;
    let wanted = args.status.map(WarrantyStatus::from);

    let rows: Vec<ListRow> = receipts
        .iter()
        .map(|stored| ListRow::new(stored, stored.current_status(today)))
        .filter(|row| wanted.is_none_or(|status| row.status == status))
        .collect();

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
        OutputFormat::Csv => print!("{}", format_csv(&rows)?),
        OutputFormat::Text => print_table(&rows, store.path().display().to_string()),
    }

    Ok(())
}

fn format_csv(rows: &[ListRow]) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for row in rows {
        wtr.serialize(row)?;
    }
    Ok(String::from_utf8(wtr.into_inner()?)?)
}

fn print_table(rows: &[ListRow], location: String) {
    if rows.is_empty() {
        println!("{} No receipts in {}", style("ℹ").blue(), location);
        return;
    }

    for row in rows {
        let status = match row.status {
            WarrantyStatus::Active => style(row.status.as_str()).green(),
            WarrantyStatus::Expiring => style(row.status.as_str()).yellow(),
            WarrantyStatus::Expired => style(row.status.as_str()).red(),
        };
        println!(
            "#{:<4} {:<24} {:>12}  bought {}  warranty until {} {} ({} days)",
            row.id,
            row.store,
            row.amount,
            row.purchase_date,
            row.warranty_expiry,
            status,
            row.days_left
        );
    }
}
