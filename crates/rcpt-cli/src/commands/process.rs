//! Process command - extract a receipt from a single file.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use rcpt_core::extract::today;
use rcpt_core::models::email::InboundEmail;
use rcpt_core::models::receipt::ParsedReceipt;

use super::{format_receipt, load_config, read_input, save_receipt, Extractor, Input, OutputFormat};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input file (.json webhook payload, .eml, .pdf, .txt or .html)
    #[arg(required = true)]
    input: PathBuf,

    /// Override the email subject
    #[arg(long)]
    subject: Option<String>,

    /// Override the email sender
    #[arg(long)]
    from: Option<String>,

    /// Do not follow invoice links
    #[arg(long)]
    offline: bool,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Append the receipt to the receipt log
    #[arg(long)]
    save: bool,

    /// Show extraction confidence
    #[arg(long)]
    show_confidence: bool,
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    let mut input = read_input(&args.input)?;
    if let Input::Email { email, .. } = &mut input {
        apply_overrides(email, &args);
    }

    info!("Processing file: {}", args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message("Extracting receipt...");

    let extractor = Extractor::new(config, args.offline)?;
    let result = extractor.input(input, &args.input).await;
    pb.finish_and_clear();
    let (receipt, original) = result?;

    let output = format_receipt(&receipt, args.format, today())?;
    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    if args.save {
        let stored = save_receipt(extractor.config(), &receipt, &original)?;
        println!(
            "{} Saved receipt #{} to {}",
            style("✓").green(),
            stored.id,
            extractor.config().store.path.display()
        );
    }

    if args.show_confidence {
        print_confidence(&receipt);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

fn apply_overrides(email: &mut InboundEmail, args: &ProcessArgs) {
    if let Some(subject) = &args.subject {
        email.subject = subject.clone();
    }
    if let Some(from) = &args.from {
        email.from = from.clone();
    }
}

pub fn print_confidence(receipt: &ParsedReceipt) {
    println!();
    println!(
        "{} Extraction confidence: {:.1}% ({})",
        style("ℹ").blue(),
        receipt.confidence * 100.0,
        receipt.source
    );
}
