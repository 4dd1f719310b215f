//! TCF broker CLI for enforcement settings and dry runs.
//!
//! This tool provides commands for:
//! - Validating enforcement settings files
//! - Running purpose enforcement against consent and vendor list fixtures

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod config;
mod enforce;
mod error;

use enforce::EnforceArgs;
use error::CliError;
use tcf_broker_common::gdpr::enforcement::BidderVendor;

#[derive(Parser)]
#[command(name = "tcfcli")]
#[command(about = "TCF broker CLI for GDPR enforcement settings")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Run purpose enforcement for a set of bidders and print the permissions as JSON
    Enforce {
        /// Path to the TOML configuration file
        #[arg(long, short)]
        file: PathBuf,

        /// Decoded consent JSON; when omitted the request carries no consent
        #[arg(long)]
        consent: Option<PathBuf>,

        /// Global Vendor List JSON
        #[arg(long)]
        vendor_list: PathBuf,

        /// Bidder as `code` or `code:vendor_id`; defaults to every bidder in the settings
        #[arg(long = "bidder", value_parser = enforce::parse_bidder_arg)]
        bidders: Vec<BidderVendor>,

        /// Whether GDPR applies; falls back to `gdpr.default_value`
        #[arg(long)]
        gdpr_applies: Option<bool>,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Validate config against settings validation
    Validate {
        /// Path to the TOML configuration file
        #[arg(long, short)]
        file: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logger(cli.verbose).and_then(|()| run(cli)) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_logger(verbose: bool) -> Result<(), CliError> {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}  {} {}",
                chrono::Local::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
                record.level(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stderr())
        .apply()?;
    Ok(())
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Config { action } => match action {
            ConfigAction::Validate { file } => config::validate(file, cli.verbose),
        },
        Commands::Enforce {
            file,
            consent,
            vendor_list,
            bidders,
            gdpr_applies,
            pretty,
        } => enforce::enforce(
            EnforceArgs {
                file,
                consent,
                vendor_list,
                bidders,
                gdpr_applies,
                pretty,
            },
            cli.verbose,
        ),
    }
}
