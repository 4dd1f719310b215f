use config::{Config, Environment, File, FileFormat};
use error_stack::{Report, ResultExt};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::EnforcementError;
use crate::gdpr::config::GdprConfig;
use crate::gdpr::enforcement::{BidderVendor, TcfEnforcement};

pub const ENVIRONMENT_VARIABLE_PREFIX: &str = "TCF_BROKER";
pub const ENVIRONMENT_VARIABLE_SEPARATOR: &str = "__";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, Validate)]
pub struct Settings {
    #[serde(default)]
    #[validate(nested)]
    pub gdpr: GdprConfig,
}

impl Settings {
    /// Load settings from TOML, applying `TCF_BROKER__*` environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`EnforcementError::Configuration`] if the TOML is invalid, a
    /// value has the wrong type or an unknown variant, or validation fails.
    pub fn from_toml(toml_str: &str) -> Result<Self, Report<EnforcementError>> {
        let environment = Environment::default()
            .prefix(ENVIRONMENT_VARIABLE_PREFIX)
            .separator(ENVIRONMENT_VARIABLE_SEPARATOR);

        let toml = File::from_str(toml_str, FileFormat::Toml);
        let config = Config::builder()
            .add_source(toml)
            .add_source(environment)
            .build()
            .change_context(EnforcementError::Configuration {
                message: "Failed to build configuration".to_string(),
            })?;

        let settings: Self = config
            .try_deserialize()
            .change_context(EnforcementError::Configuration {
                message: "Failed to deserialize configuration".to_string(),
            })?;

        settings
            .validate()
            .change_context(EnforcementError::Configuration {
                message: "Settings validation failed".to_string(),
            })?;

        log::info!(
            "Loaded settings: GDPR enforcement {}, {} bidders mapped",
            if settings.gdpr.enabled { "enabled" } else { "disabled" },
            settings.gdpr.bidders.len()
        );

        Ok(settings)
    }

    /// Configured bidders paired with their GVL vendor ids.
    #[must_use]
    pub fn bidder_vendors(&self) -> Vec<BidderVendor> {
        self.gdpr
            .bidders
            .iter()
            .map(|(code, vendor_id)| BidderVendor::new(code.clone(), Some(*vendor_id)))
            .collect()
    }

    #[must_use]
    pub fn enforcement(&self) -> TcfEnforcement {
        TcfEnforcement::new(self.gdpr.clone())
    }

    /// Serialize the effective settings, after environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`EnforcementError::Configuration`] if serialization fails.
    pub fn to_canonical_toml(&self) -> Result<String, Report<EnforcementError>> {
        toml::to_string(self).change_context(EnforcementError::Configuration {
            message: "Failed to serialize settings".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gdpr::config::{EnforcePurpose, PurposeOneTreatmentInterpretation};
    use crate::gdpr::purpose::PurposeCode;

    const SETTINGS_TOML: &str = r#"
        [gdpr]
        enabled = true
        default_value = false
        purpose_one_treatment_interpretation = "access_allowed"

        [gdpr.purposes.p2]
        enforce_purpose = "full"
        enforce_vendors = true
        vendor_exceptions = ["house"]

        [gdpr.purposes.p7]
        enforce_purpose = "basic"
        enforce_vendors = false

        [gdpr.special_features.sf1]
        enforce = false

        [gdpr.bidders]
        rubicon = 52
        appnexus = 32
        "#;

    const P3_OVERRIDE: &str = "TCF_BROKER__GDPR__PURPOSES__P3__ENFORCE_PURPOSE";
    const P7_OVERRIDE: &str = "TCF_BROKER__GDPR__PURPOSES__P7__ENFORCE_PURPOSE";

    // Serializes with the env override tests.
    fn load_without_overrides(toml_str: &str) -> Settings {
        temp_env::with_vars_unset([P3_OVERRIDE, P7_OVERRIDE], || {
            Settings::from_toml(toml_str).expect("should load settings")
        })
    }

    #[test]
    fn test_settings_from_valid_toml() {
        let settings = load_without_overrides(SETTINGS_TOML);
        let gdpr = &settings.gdpr;

        assert!(gdpr.enabled);
        assert!(!gdpr.default_value);
        assert_eq!(
            gdpr.purpose_one_treatment_interpretation,
            PurposeOneTreatmentInterpretation::AccessAllowed
        );
        assert!(gdpr.purposes.p2.is_excepted(Some("house")));
        assert_eq!(gdpr.purposes.p7.enforce_purpose, EnforcePurpose::Basic);
        assert!(!gdpr.purposes.p7.enforce_vendors);
        assert_eq!(
            gdpr.purposes.get(PurposeCode::Three).enforce_purpose,
            EnforcePurpose::Full,
            "unlisted purposes should default to full enforcement"
        );
        assert!(!gdpr.special_features.sf1.enforce);
        assert_eq!(gdpr.bidders.get("rubicon"), Some(&52));
    }

    #[test]
    fn test_settings_empty_toml() {
        let settings = load_without_overrides("");
        assert_eq!(settings, Settings::default(), "empty TOML should load defaults");
    }

    #[test]
    fn test_settings_invalid_toml_syntax() {
        let settings = Settings::from_toml("[gdpr\nenabled = true");
        assert!(settings.is_err(), "Invalid TOML syntax should fail");
    }

    #[test]
    fn test_settings_unknown_enforcement_type() {
        let toml_str = r#"
            [gdpr.purposes.p1]
            enforce_purpose = "partial"
            "#;

        let err = Settings::from_toml(toml_str).expect_err("unknown variant should fail");
        assert!(err.to_string().contains("Configuration error"));
    }

    #[test]
    fn test_settings_validation_failure() {
        let toml_str = r#"
            [gdpr.purposes.p4]
            vendor_exceptions = [""]
            "#;

        let settings = Settings::from_toml(toml_str);
        assert!(settings.is_err(), "Empty exception code should fail validation");
    }

    #[test]
    fn test_bidder_vendors() {
        let settings = Settings::from_toml(SETTINGS_TOML).expect("should load settings");
        let bidders = settings.bidder_vendors();

        assert_eq!(
            bidders,
            vec![
                BidderVendor::new("appnexus", Some(32)),
                BidderVendor::new("rubicon", Some(52)),
            ]
        );
    }

    #[test]
    fn test_canonical_toml_round_trips() {
        let settings = load_without_overrides(SETTINGS_TOML);
        let canonical = settings.to_canonical_toml().expect("should serialize");
        assert_eq!(load_without_overrides(&canonical), settings);
    }

    #[test]
    fn test_set_env() {
        temp_env::with_var(P3_OVERRIDE, Some("no"), || {
            let settings = Settings::from_toml(SETTINGS_TOML);

            assert!(settings.is_ok(), "Settings should load with env override");
            assert_eq!(
                settings
                    .expect("should load settings")
                    .gdpr
                    .purposes
                    .p3
                    .enforce_purpose,
                EnforcePurpose::No
            );
        });
    }

    #[test]
    fn test_override_env() {
        temp_env::with_var(P7_OVERRIDE, Some("full"), || {
            let settings = Settings::from_toml(SETTINGS_TOML).expect("should load settings");

            assert_eq!(settings.gdpr.purposes.p7.enforce_purpose, EnforcePurpose::Full);
            assert!(
                !settings.gdpr.purposes.p7.enforce_vendors,
                "fields not overridden should keep their TOML value"
            );
        });
    }
}
