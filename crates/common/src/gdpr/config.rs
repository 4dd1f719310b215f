//! Publisher enforcement policy.
//!
//! These types are deserialized from the `[gdpr]` section of the settings
//! TOML. An unknown `enforce_purpose` value fails deserialization, so a
//! misconfigured policy never reaches the engine.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use super::purpose::PurposeCode;

/// How strictly a purpose is enforced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EnforcePurpose {
    /// Consent bits and GVL declarations are both checked.
    #[default]
    Full,
    /// Consent bits are checked, GVL declarations are trusted.
    Basic,
    /// The purpose is not gated.
    No,
}

/// Enforcement policy for one purpose.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Validate)]
pub struct PurposeConfig {
    #[serde(default)]
    pub enforce_purpose: EnforcePurpose,

    /// Whether per-vendor consent/legitimate interest bits are checked.
    #[serde(default = "default_true")]
    pub enforce_vendors: bool,

    /// Bidder codes exempted from evaluation for this purpose.
    #[serde(default)]
    #[validate(custom(function = validate_bidder_codes))]
    pub vendor_exceptions: BTreeSet<String>,
}

impl Default for PurposeConfig {
    fn default() -> Self {
        Self {
            enforce_purpose: EnforcePurpose::Full,
            enforce_vendors: true,
            vendor_exceptions: BTreeSet::new(),
        }
    }
}

impl PurposeConfig {
    #[must_use]
    pub fn new<I, S>(
        enforce_purpose: EnforcePurpose,
        enforce_vendors: bool,
        vendor_exceptions: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            enforce_purpose,
            enforce_vendors,
            vendor_exceptions: vendor_exceptions.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether `bidder_code` is exception-listed. Vendors without a bidder code never are.
    #[must_use]
    pub fn is_excepted(&self, bidder_code: Option<&str>) -> bool {
        is_excepted(&self.vendor_exceptions, bidder_code)
    }
}

pub(crate) fn is_excepted(vendor_exceptions: &BTreeSet<String>, bidder_code: Option<&str>) -> bool {
    bidder_code.is_some_and(|code| vendor_exceptions.contains(code))
}

/// Policy for each of the ten purposes, keyed `p1`..`p10`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, Validate)]
#[serde(default)]
pub struct Purposes {
    #[validate(nested)]
    pub p1: PurposeConfig,
    #[validate(nested)]
    pub p2: PurposeConfig,
    #[validate(nested)]
    pub p3: PurposeConfig,
    #[validate(nested)]
    pub p4: PurposeConfig,
    #[validate(nested)]
    pub p5: PurposeConfig,
    #[validate(nested)]
    pub p6: PurposeConfig,
    #[validate(nested)]
    pub p7: PurposeConfig,
    #[validate(nested)]
    pub p8: PurposeConfig,
    #[validate(nested)]
    pub p9: PurposeConfig,
    #[validate(nested)]
    pub p10: PurposeConfig,
}

impl Purposes {
    #[must_use]
    pub fn get(&self, purpose: PurposeCode) -> &PurposeConfig {
        match purpose {
            PurposeCode::One => &self.p1,
            PurposeCode::Two => &self.p2,
            PurposeCode::Three => &self.p3,
            PurposeCode::Four => &self.p4,
            PurposeCode::Five => &self.p5,
            PurposeCode::Six => &self.p6,
            PurposeCode::Seven => &self.p7,
            PurposeCode::Eight => &self.p8,
            PurposeCode::Nine => &self.p9,
            PurposeCode::Ten => &self.p10,
        }
    }

    pub fn get_mut(&mut self, purpose: PurposeCode) -> &mut PurposeConfig {
        match purpose {
            PurposeCode::One => &mut self.p1,
            PurposeCode::Two => &mut self.p2,
            PurposeCode::Three => &mut self.p3,
            PurposeCode::Four => &mut self.p4,
            PurposeCode::Five => &mut self.p5,
            PurposeCode::Six => &mut self.p6,
            PurposeCode::Seven => &mut self.p7,
            PurposeCode::Eight => &mut self.p8,
            PurposeCode::Nine => &mut self.p9,
            PurposeCode::Ten => &mut self.p10,
        }
    }
}

/// Enforcement policy for a special feature.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Validate)]
pub struct SpecialFeatureConfig {
    #[serde(default = "default_true")]
    pub enforce: bool,

    #[serde(default)]
    #[validate(custom(function = validate_bidder_codes))]
    pub vendor_exceptions: BTreeSet<String>,
}

impl Default for SpecialFeatureConfig {
    fn default() -> Self {
        Self {
            enforce: true,
            vendor_exceptions: BTreeSet::new(),
        }
    }
}

impl SpecialFeatureConfig {
    #[must_use]
    pub fn is_excepted(&self, bidder_code: Option<&str>) -> bool {
        is_excepted(&self.vendor_exceptions, bidder_code)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, Validate)]
#[serde(default)]
pub struct SpecialFeatures {
    /// Precise geolocation.
    #[validate(nested)]
    pub sf1: SpecialFeatureConfig,
}

/// How purpose 1 is handled when the consent carries the purpose one treatment flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PurposeOneTreatmentInterpretation {
    /// Evaluate purpose 1 as usual.
    #[default]
    Ignore,
    /// Only exception-listed vendors are allowed for purpose 1.
    NoAccessAllowed,
    /// Purpose 1 is not gated.
    AccessAllowed,
}

/// The `[gdpr]` settings section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Validate)]
pub struct GdprConfig {
    /// When false, enforcement is skipped and every vendor is allowed.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Whether GDPR applies when the request does not say.
    #[serde(default = "default_true")]
    pub default_value: bool,

    #[serde(default)]
    #[validate(nested)]
    pub purposes: Purposes,

    #[serde(default)]
    #[validate(nested)]
    pub special_features: SpecialFeatures,

    #[serde(default)]
    pub purpose_one_treatment_interpretation: PurposeOneTreatmentInterpretation,

    /// Bidder code to GVL vendor id.
    #[serde(default)]
    #[validate(custom(function = validate_bidder_map))]
    pub bidders: BTreeMap<String, u32>,
}

impl Default for GdprConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            default_value: true,
            purposes: Purposes::default(),
            special_features: SpecialFeatures::default(),
            purpose_one_treatment_interpretation: PurposeOneTreatmentInterpretation::default(),
            bidders: BTreeMap::new(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn validate_bidder_codes(codes: &BTreeSet<String>) -> Result<(), ValidationError> {
    if codes.iter().any(|code| code.trim().is_empty()) {
        return Err(ValidationError::new("empty_bidder_code"));
    }
    Ok(())
}

fn validate_bidder_map(bidders: &BTreeMap<String, u32>) -> Result<(), ValidationError> {
    if bidders.keys().any(|code| code.trim().is_empty()) {
        return Err(ValidationError::new("empty_bidder_code"));
    }
    Ok(())
}
