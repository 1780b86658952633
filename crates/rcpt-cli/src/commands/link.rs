//! Link command - extract a receipt from pasted text.

use clap::Args;
use console::style;

use rcpt_core::extract::today;

use super::process::print_confidence;
use super::{format_receipt, load_config, save_receipt, Extractor, OutputFormat};

/// Arguments for the link command.
#[derive(Args)]
pub struct LinkArgs {
    /// Pasted text, usually an e-Arşiv invoice link
    #[arg(required = true)]
    text: String,

    /// Do not follow invoice links
    #[arg(long)]
    offline: bool,

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

pub async fn run(args: LinkArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let extractor = Extractor::new(config, args.offline)?;

    let receipt = extractor.link(&args.text).await?;
    println!("{}", format_receipt(&receipt, args.format, today())?);

    if args.save {
        let stored = save_receipt(extractor.config(), &receipt, &args.text)?;
        println!("{} Saved receipt #{}", style("✓").green(), stored.id);
    }

    if args.show_confidence {
        print_confidence(&receipt);
    }

    Ok(())
}
