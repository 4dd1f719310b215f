//! Dry-run purpose enforcement against local fixtures.

use std::fs;
use std::path::{Path, PathBuf};

use tcf_broker_common::gdpr::consent::{ConsentSignal, TcfConsent};
use tcf_broker_common::gdpr::enforcement::BidderVendor;
use tcf_broker_common::gdpr::vendor_list::VendorList;
use tcf_broker_common::settings::Settings;

use crate::config::load_and_merge_config;
use crate::error::CliError;

/// Inputs for one dry-run enforcement.
#[derive(Debug)]
pub struct EnforceArgs {
    pub file: PathBuf,
    pub consent: Option<PathBuf>,
    pub vendor_list: PathBuf,
    pub bidders: Vec<BidderVendor>,
    pub gdpr_applies: Option<bool>,
    pub pretty: bool,
}

/// Parse a `--bidder` value of the form `code` or `code:vendor_id`.
pub fn parse_bidder_arg(value: &str) -> Result<BidderVendor, String> {
    let (code, vendor_id) = match value.split_once(':') {
        Some((code, id)) => {
            let id = id
                .trim()
                .parse::<u32>()
                .map_err(|e| format!("invalid vendor id in '{value}': {e}"))?;
            (code, Some(id))
        }
        None => (value, None),
    };

    let code = code.trim();
    if code.is_empty() {
        return Err(format!("missing bidder code in '{value}'"));
    }

    Ok(BidderVendor::new(code, vendor_id))
}

/// Fill missing vendor ids from the settings bidder map. Without explicit
/// bidders every mapped bidder is used.
fn resolve_bidders(bidders: Vec<BidderVendor>, settings: &Settings) -> Vec<BidderVendor> {
    if bidders.is_empty() {
        return settings.bidder_vendors();
    }

    bidders
        .into_iter()
        .map(|bidder| match bidder.vendor_id {
            Some(_) => bidder,
            None => {
                let vendor_id = settings.gdpr.bidders.get(&bidder.bidder_code).copied();
                if vendor_id.is_none() {
                    log::warn!("Bidder '{}' has no GVL vendor id", bidder.bidder_code);
                }
                BidderVendor {
                    vendor_id,
                    ..bidder
                }
            }
        })
        .collect()
}

fn load_consent(path: &Path) -> Result<TcfConsent, CliError> {
    let content = fs::read_to_string(path)?;
    TcfConsent::from_json(&content).map_err(|e| {
        CliError::Input(format!(
            "Failed to load consent '{}': {e:?}",
            path.display()
        ))
    })
}

fn load_vendor_list(path: &Path) -> Result<VendorList, CliError> {
    let content = fs::read_to_string(path)?;
    VendorList::from_json(&content).map_err(|e| {
        CliError::Input(format!(
            "Failed to load vendor list '{}': {e:?}",
            path.display()
        ))
    })
}

/// Run one enforcement and render the resulting permissions as JSON.
pub fn run_enforcement(args: EnforceArgs, verbose: bool) -> Result<String, CliError> {
    let (settings, _) = load_and_merge_config(&args.file, verbose)?;
    let vendor_list = load_vendor_list(&args.vendor_list)?;
    let consent = args.consent.as_deref().map(load_consent).transpose()?;
    let bidders = resolve_bidders(args.bidders, &settings);

    let enforcement = settings.enforcement();
    let permissions = enforcement.enforce_for_request(
        args.gdpr_applies,
        consent.as_ref().map(|c| c as &dyn ConsentSignal),
        &vendor_list,
        &bidders,
    );

    let json = if args.pretty {
        serde_json::to_string_pretty(&permissions)?
    } else {
        serde_json::to_string(&permissions)?
    };
    Ok(json)
}

/// Run one enforcement and print the permissions to stdout.
pub fn enforce(args: EnforceArgs, verbose: bool) -> Result<(), CliError> {
    let json = run_enforcement(args, verbose)?;
    println!("{}", json);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use tempfile::TempDir;

    const SETTINGS_TOML: &str = r#"
[gdpr.purposes.p2]
vendor_exceptions = ["house"]

[gdpr.bidders]
rubicon = 52
openx = 69
"#;

    const CONSENT_JSON: &str = r#"{
        "purpose_consents": [1, 2, 4, 7],
        "vendor_consents": [52],
        "special_feature_opt_ins": [1]
    }"#;

    const GVL_JSON: &str = r#"{
        "vendorListVersion": 42,
        "vendors": {
            "52": { "id": 52, "purposes": [1, 2, 4, 7], "specialFeatures": [1] },
            "69": { "id": 69, "purposes": [1, 2] }
        }
    }"#;

    struct Fixtures {
        _dir: TempDir,
        args: EnforceArgs,
    }

    fn fixtures(bidders: Vec<BidderVendor>) -> Fixtures {
        let dir = TempDir::new().expect("should create temp dir");
        let file = dir.path().join("settings.toml");
        let consent = dir.path().join("consent.json");
        let vendor_list = dir.path().join("gvl.json");
        fs::write(&file, SETTINGS_TOML).expect("should write settings");
        fs::write(&consent, CONSENT_JSON).expect("should write consent");
        fs::write(&vendor_list, GVL_JSON).expect("should write vendor list");

        Fixtures {
            _dir: dir,
            args: EnforceArgs {
                file,
                consent: Some(consent),
                vendor_list,
                bidders,
                gdpr_applies: Some(true),
                pretty: false,
            },
        }
    }

    fn run(args: EnforceArgs) -> Vec<Value> {
        let json = run_enforcement(args, false).expect("enforcement should succeed");
        serde_json::from_str(&json).expect("output should be a JSON array")
    }

    #[test]
    fn test_parse_bidder_arg() {
        assert_eq!(
            parse_bidder_arg("rubicon:52"),
            Ok(BidderVendor::new("rubicon", Some(52)))
        );
        assert_eq!(
            parse_bidder_arg("house"),
            Ok(BidderVendor::new("house", None))
        );
        assert!(parse_bidder_arg("rubicon:abc").is_err());
        assert!(parse_bidder_arg(":52").is_err());
    }

    #[test]
    fn test_enforce_with_explicit_bidders() {
        let fixtures = fixtures(vec![
            BidderVendor::new("rubicon", None),
            BidderVendor::new("openx", Some(69)),
            BidderVendor::new("house", None),
        ]);
        let output = run(fixtures.args);

        assert_eq!(output.len(), 3);
        assert_eq!(output[0]["bidder"], "rubicon");
        assert_eq!(output[0]["vendor_id"], 52, "vendor id should come from settings");
        assert_eq!(output[0]["action"]["block_bidder_request"], false);
        assert_eq!(output[0]["action"]["mask_geo"], false);

        assert_eq!(output[1]["action"]["block_bidder_request"], true);

        assert_eq!(output[2]["vendor_id"], Value::Null);
        assert_eq!(
            output[2]["action"]["block_bidder_request"], false,
            "excepted bidder should be allowed for purpose 2"
        );
        assert_eq!(output[2]["action"]["block_pixel_sync"], true);
    }

    #[test]
    fn test_enforce_defaults_to_settings_bidders() {
        let fixtures = fixtures(Vec::new());
        let output = run(fixtures.args);

        let bidders: Vec<&str> = output
            .iter()
            .filter_map(|p| p["bidder"].as_str())
            .collect();
        assert_eq!(bidders, vec!["openx", "rubicon"]);
    }

    #[test]
    fn test_enforce_without_consent_restricts() {
        let mut fixtures = fixtures(vec![BidderVendor::new("rubicon", Some(52))]);
        fixtures.args.consent = None;
        let output = run(fixtures.args);

        assert_eq!(output[0]["action"]["block_bidder_request"], true);
        assert_eq!(output[0]["action"]["mask_device_ip"], true);
    }

    #[test]
    fn test_enforce_gdpr_not_applicable_allows() {
        let mut fixtures = fixtures(vec![BidderVendor::new("openx", Some(69))]);
        fixtures.args.gdpr_applies = Some(false);
        let output = run(fixtures.args);

        assert_eq!(output[0]["action"]["block_bidder_request"], false);
        assert_eq!(output[0]["action"]["remove_user_ids"], false);
    }

    #[test]
    fn test_enforce_rejects_bad_vendor_list() {
        let fixtures = fixtures(Vec::new());
        fs::write(&fixtures.args.vendor_list, "{ not json").expect("should overwrite gvl");

        let result = run_enforcement(fixtures.args, false);
        assert!(matches!(result, Err(CliError::Input(_))));
    }

    #[test]
    fn test_enforce_pretty_output() {
        let mut fixtures = fixtures(vec![BidderVendor::new("rubicon", Some(52))]);
        fixtures.args.pretty = true;
        let json = run_enforcement(fixtures.args, false).expect("enforcement should succeed");
        assert!(json.contains('\n'), "pretty output should span lines");
    }
}
