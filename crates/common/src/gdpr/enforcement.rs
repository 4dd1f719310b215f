//! Runs every purpose pass and the special feature pass for one auction.

use serde::{Deserialize, Serialize};

use super::config::{EnforcePurpose, GdprConfig, PurposeOneTreatmentInterpretation};
use super::consent::ConsentSignal;
use super::model::{
    attach_vendor_list, PrivacyEnforcementAction, VendorPermission, VendorPermissionWithGvl,
};
use super::purpose::PurposeCode;
use super::purpose_strategy::PurposeStrategy;
use super::special_feature::SpecialFeatureStrategy;
use super::vendor_list::VendorListProvider;

/// A candidate bidder and its GVL vendor id, if it has one.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BidderVendor {
    pub bidder_code: String,
    #[serde(default)]
    pub vendor_id: Option<u32>,
}

impl BidderVendor {
    #[must_use]
    pub fn new(bidder_code: impl Into<String>, vendor_id: Option<u32>) -> Self {
        Self {
            bidder_code: bidder_code.into(),
            vendor_id,
        }
    }
}

/// GDPR enforcement for auctions, built once from the `[gdpr]` settings.
///
/// Holds no per-request state; a single instance can serve concurrent
/// auctions.
#[derive(Debug, Clone)]
pub struct TcfEnforcement {
    config: GdprConfig,
    purpose_strategies: [PurposeStrategy; 10],
    special_feature: SpecialFeatureStrategy,
}

impl TcfEnforcement {
    #[must_use]
    pub fn new(config: GdprConfig) -> Self {
        Self {
            config,
            purpose_strategies: PurposeStrategy::all(),
            special_feature: SpecialFeatureStrategy::precise_geolocation(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &GdprConfig {
        &self.config
    }

    /// Whether GDPR applies, falling back to the configured default when the
    /// request does not say.
    #[must_use]
    pub fn gdpr_applies(&self, gdpr_applies: Option<bool>) -> bool {
        gdpr_applies.unwrap_or(self.config.default_value)
    }

    /// Compute one permission per bidder, in input order.
    ///
    /// Every permission starts fully restricted. The ten purpose passes run in
    /// increasing purpose id order over the same permissions, followed by the
    /// special feature pass.
    pub fn enforce(
        &self,
        consent: &dyn ConsentSignal,
        vendor_list: &dyn VendorListProvider,
        bidders: &[BidderVendor],
    ) -> Vec<VendorPermission> {
        if !self.config.enabled {
            log::debug!("GDPR enforcement disabled, allowing {} bidders", bidders.len());
            return permissions_with(bidders, &PrivacyEnforcementAction::allow_all());
        }

        let mut permissions = permissions_with(bidders, &PrivacyEnforcementAction::restrict_all());
        {
            let mut with_gvl = attach_vendor_list(&mut permissions, vendor_list);
            for strategy in &self.purpose_strategies {
                self.run_purpose(strategy, consent, &mut with_gvl);
            }
        }
        self.special_feature.process_special_feature(
            consent,
            &self.config.special_features.sf1,
            &mut permissions,
        );

        for permission in &permissions {
            log::debug!(
                "GDPR enforcement: bidder={} vendor_id={:?} restricted={:?}",
                permission.bidder_code().unwrap_or("-"),
                permission.vendor_id(),
                permission.action().restricted()
            );
        }

        permissions
    }

    /// Entry point for a request whose GDPR applicability and consent may be missing.
    pub fn enforce_for_request(
        &self,
        gdpr_applies: Option<bool>,
        consent: Option<&dyn ConsentSignal>,
        vendor_list: &dyn VendorListProvider,
        bidders: &[BidderVendor],
    ) -> Vec<VendorPermission> {
        if !self.config.enabled || !self.gdpr_applies(gdpr_applies) {
            log::debug!("GDPR not enforced for this request, allowing {} bidders", bidders.len());
            return permissions_with(bidders, &PrivacyEnforcementAction::allow_all());
        }

        match consent {
            Some(consent) => self.enforce(consent, vendor_list, bidders),
            None => {
                log::warn!(
                    "GDPR applies but no consent signal was supplied, restricting {} bidders",
                    bidders.len()
                );
                permissions_with(bidders, &PrivacyEnforcementAction::restrict_all())
            }
        }
    }

    fn run_purpose(
        &self,
        strategy: &PurposeStrategy,
        consent: &dyn ConsentSignal,
        vendor_permissions: &mut [VendorPermissionWithGvl<'_>],
    ) {
        let purpose = strategy.purpose_id();
        let purpose_config = self.config.purposes.get(purpose);

        if purpose == PurposeCode::One && consent.purpose_one_treatment() {
            match self.config.purpose_one_treatment_interpretation {
                PurposeOneTreatmentInterpretation::Ignore => {}
                PurposeOneTreatmentInterpretation::NoAccessAllowed => {
                    log::debug!("purpose one treatment: only excepted vendors allowed");
                    strategy.allow_excepted_only(purpose_config, vendor_permissions);
                    return;
                }
                PurposeOneTreatmentInterpretation::AccessAllowed => {
                    log::debug!("purpose one treatment: purpose 1 not enforced");
                    strategy.process_as(
                        EnforcePurpose::No,
                        consent,
                        purpose_config,
                        vendor_permissions,
                    );
                    return;
                }
            }
        }

        strategy.process_type_purpose_strategy(consent, purpose_config, vendor_permissions);
    }
}

fn permissions_with(
    bidders: &[BidderVendor],
    action: &PrivacyEnforcementAction,
) -> Vec<VendorPermission> {
    bidders
        .iter()
        .map(|bidder| {
            VendorPermission::with_action(
                bidder.vendor_id,
                Some(bidder.bidder_code.clone()),
                action.clone(),
            )
        })
        .collect()
}
