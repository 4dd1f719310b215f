//! Configuration management commands.
//!
//! Configuration is loaded from TOML files and merged with environment variables
//! prefixed with `TCF_BROKER__`. For example,
//! `TCF_BROKER__GDPR__PURPOSES__P2__ENFORCE_PURPOSE=basic` will override
//! `gdpr.purposes.p2.enforce_purpose` in the TOML file.

use std::fs;
use std::path::{Path, PathBuf};

use tcf_broker_common::gdpr::purpose::PurposeCode;
use tcf_broker_common::settings::Settings;

use crate::error::CliError;

/// Load and merge configuration from TOML file with environment variables.
///
/// Environment variables prefixed with `TCF_BROKER__` will override TOML values.
pub(crate) fn load_and_merge_config(
    file: &Path,
    verbose: bool,
) -> Result<(Settings, String), CliError> {
    let content = fs::read_to_string(file)?;

    if verbose {
        log::info!("Loading config from: {}", file.display());
        log::info!("Environment variables with TCF_BROKER__ prefix will be merged");
    }

    // Parsing also validates
    let settings = Settings::from_toml(&content)
        .map_err(|e| CliError::Config(format!("Failed to parse and merge config: {:?}", e)))?;

    let merged_toml = settings
        .to_canonical_toml()
        .map_err(|e| CliError::Config(format!("Failed to serialize merged config: {e:?}")))?;

    Ok((settings, merged_toml))
}

/// Validate configuration file.
///
/// Validates TOML syntax, enforcement types and bidder codes after merging
/// environment variables.
pub fn validate(file: PathBuf, verbose: bool) -> Result<(), CliError> {
    let (settings, merged_toml) = load_and_merge_config(&file, verbose)?;
    let gdpr = &settings.gdpr;

    println!("Configuration is valid");
    println!("  File: {}", file.display());
    println!(
        "  GDPR enforcement: {}",
        if gdpr.enabled { "enabled" } else { "disabled" }
    );
    println!("  GDPR applies by default: {}", gdpr.default_value);
    println!("  Mapped bidders: {}", gdpr.bidders.len());

    if verbose {
        println!("\nPurposes:");
        for purpose in PurposeCode::ALL {
            let purpose_config = gdpr.purposes.get(purpose);
            println!(
                "  - {}: {:?}, enforce_vendors={}, exceptions={:?}",
                purpose,
                purpose_config.enforce_purpose,
                purpose_config.enforce_vendors,
                purpose_config.vendor_exceptions
            );
        }
        println!(
            "  - special feature 1: enforce={}, exceptions={:?}",
            gdpr.special_features.sf1.enforce, gdpr.special_features.sf1.vendor_exceptions
        );

        println!("\nMerged configuration:");
        println!("---");
        for line in merged_toml.lines() {
            println!("{}", line);
        }
        println!("---");
    }

    Ok(())
}
