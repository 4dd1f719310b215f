//! Decoded consent signal consumed by purpose enforcement.
//!
//! Decoding a raw TC string happens upstream. Enforcement only queries the
//! decoded bits through [`ConsentSignal`], so any decoder can be plugged in.
//! [`TcfConsent`] is a plain in-memory implementation used for fixtures,
//! tests and the CLI.

use std::collections::BTreeSet;

use error_stack::{Report, ResultExt};
use serde::{Deserialize, Serialize};

use crate::error::EnforcementError;

use super::purpose::PurposeCode;

/// Publisher restriction type carried by a TC string for a purpose/vendor pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RestrictionType {
    /// The vendor may not process data for the purpose at all.
    NotAllowed,
    /// The vendor must rely on consent for the purpose.
    RequireConsent,
    /// The vendor must rely on legitimate interest for the purpose.
    RequireLegitimateInterest,
}

/// Read-only view of a decoded consent string.
///
/// Implementations are request scoped and immutable. They are shared across all
/// purpose passes of one auction, and possibly across concurrent auctions.
pub trait ConsentSignal: Sync {
    /// Purpose consent bit.
    fn purpose_consent(&self, purpose: PurposeCode) -> bool;

    /// Purpose legitimate interest transparency bit.
    fn purpose_legitimate_interest(&self, purpose: PurposeCode) -> bool;

    /// Vendor consent bit.
    fn vendor_consent(&self, vendor_id: u32) -> bool;

    /// Vendor legitimate interest bit.
    fn vendor_legitimate_interest(&self, vendor_id: u32) -> bool;

    /// Special feature opt-in bit.
    fn special_feature_opt_in(&self, feature_id: u8) -> bool;

    /// Whether the CMP flagged purpose one as not disclosed (purpose one treatment).
    fn purpose_one_treatment(&self) -> bool {
        false
    }

    /// Publisher restriction for `vendor_id` on `purpose`, if any.
    fn publisher_restriction(
        &self,
        _purpose: PurposeCode,
        _vendor_id: u32,
    ) -> Option<RestrictionType> {
        None
    }
}

/// A publisher restriction entry: one type applied to a set of vendors for one purpose.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PublisherRestriction {
    pub purpose_id: u8,
    pub restriction_type: RestrictionType,
    #[serde(default)]
    pub vendor_ids: BTreeSet<u32>,
}

/// In-memory decoded consent.
///
/// Every set holds the ids whose bit is set; anything absent reads as `false`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct TcfConsent {
    pub purpose_consents: BTreeSet<u8>,
    pub purpose_legitimate_interests: BTreeSet<u8>,
    pub vendor_consents: BTreeSet<u32>,
    pub vendor_legitimate_interests: BTreeSet<u32>,
    pub special_feature_opt_ins: BTreeSet<u8>,
    pub purpose_one_treatment: bool,
    pub publisher_restrictions: Vec<PublisherRestriction>,
}

impl TcfConsent {
    /// Parse a consent fixture from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`EnforcementError::Consent`] if the JSON is malformed or a
    /// publisher restriction references a purpose outside 1..=10.
    pub fn from_json(json: &str) -> Result<Self, Report<EnforcementError>> {
        let consent: TcfConsent =
            serde_json::from_str(json).change_context(EnforcementError::Consent {
                message: "Failed to parse consent JSON".to_string(),
            })?;

        for restriction in &consent.publisher_restrictions {
            PurposeCode::try_from(restriction.purpose_id).change_context(
                EnforcementError::Consent {
                    message: "Publisher restriction references an unknown purpose".to_string(),
                },
            )?;
        }

        Ok(consent)
    }

    #[must_use]
    pub fn with_purpose_consents(mut self, ids: impl IntoIterator<Item = u8>) -> Self {
        self.purpose_consents.extend(ids);
        self
    }

    #[must_use]
    pub fn with_purpose_legitimate_interests(mut self, ids: impl IntoIterator<Item = u8>) -> Self {
        self.purpose_legitimate_interests.extend(ids);
        self
    }

    #[must_use]
    pub fn with_vendor_consents(mut self, ids: impl IntoIterator<Item = u32>) -> Self {
        self.vendor_consents.extend(ids);
        self
    }

    #[must_use]
    pub fn with_vendor_legitimate_interests(mut self, ids: impl IntoIterator<Item = u32>) -> Self {
        self.vendor_legitimate_interests.extend(ids);
        self
    }

    #[must_use]
    pub fn with_special_feature_opt_ins(mut self, ids: impl IntoIterator<Item = u8>) -> Self {
        self.special_feature_opt_ins.extend(ids);
        self
    }

    #[must_use]
    pub fn with_publisher_restriction(
        mut self,
        purpose: PurposeCode,
        restriction_type: RestrictionType,
        vendor_ids: impl IntoIterator<Item = u32>,
    ) -> Self {
        self.publisher_restrictions.push(PublisherRestriction {
            purpose_id: purpose.id(),
            restriction_type,
            vendor_ids: vendor_ids.into_iter().collect(),
        });
        self
    }
}

impl ConsentSignal for TcfConsent {
    fn purpose_consent(&self, purpose: PurposeCode) -> bool {
        self.purpose_consents.contains(&purpose.id())
    }

    fn purpose_legitimate_interest(&self, purpose: PurposeCode) -> bool {
        self.purpose_legitimate_interests.contains(&purpose.id())
    }

    fn vendor_consent(&self, vendor_id: u32) -> bool {
        self.vendor_consents.contains(&vendor_id)
    }

    fn vendor_legitimate_interest(&self, vendor_id: u32) -> bool {
        self.vendor_legitimate_interests.contains(&vendor_id)
    }

    fn special_feature_opt_in(&self, feature_id: u8) -> bool {
        self.special_feature_opt_ins.contains(&feature_id)
    }

    fn purpose_one_treatment(&self) -> bool {
        self.purpose_one_treatment
    }

    // First matching entry wins; a TC string never encodes two types for one pair.
    fn publisher_restriction(
        &self,
        purpose: PurposeCode,
        vendor_id: u32,
    ) -> Option<RestrictionType> {
        self.publisher_restrictions
            .iter()
            .find(|r| r.purpose_id == purpose.id() && r.vendor_ids.contains(&vendor_id))
            .map(|r| r.restriction_type)
    }
}
