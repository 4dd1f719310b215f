//! Special feature enforcement.

use super::config::SpecialFeatureConfig;
use super::consent::ConsentSignal;
use super::model::{PrivacyEnforcementAction, Restriction, VendorPermission};

/// Special feature 1, precise geolocation.
pub const PRECISE_GEOLOCATION: u8 = 1;

/// Enforcement pass for one special feature. Runs after the purpose passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecialFeatureStrategy {
    feature_id: u8,
    restrictions: &'static [Restriction],
}

impl SpecialFeatureStrategy {
    #[must_use]
    pub fn precise_geolocation() -> Self {
        Self {
            feature_id: PRECISE_GEOLOCATION,
            restrictions: &[Restriction::MaskGeo, Restriction::MaskDeviceIp],
        }
    }

    #[must_use]
    pub fn feature_id(&self) -> u8 {
        self.feature_id
    }

    #[must_use]
    pub fn restrictions(&self) -> &'static [Restriction] {
        self.restrictions
    }

    pub fn allow(&self, action: &mut PrivacyEnforcementAction) {
        for restriction in self.restrictions {
            action.clear(*restriction);
        }
    }

    /// Clear owned flags on every vendor the feature config and opt-in allow.
    pub fn process_special_feature(
        &self,
        consent: &dyn ConsentSignal,
        config: &SpecialFeatureConfig,
        vendor_permissions: &mut [VendorPermission],
    ) {
        let opted_in = consent.special_feature_opt_in(self.feature_id);
        let mut allowed = 0;
        for permission in vendor_permissions.iter_mut() {
            if !config.enforce || opted_in || config.is_excepted(permission.bidder_code()) {
                self.allow(permission.action_mut());
                allowed += 1;
            }
        }

        log::debug!(
            "special feature {}: allowed {} of {} vendors (enforce={}, opted_in={})",
            self.feature_id,
            allowed,
            vendor_permissions.len(),
            config.enforce,
            opted_in
        );
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::gdpr::consent::TcfConsent;

    fn permissions() -> Vec<VendorPermission> {
        vec![
            VendorPermission::new(Some(1), Some("b1".to_string())),
            VendorPermission::new(Some(2), Some("b2".to_string())),
            VendorPermission::new(None, None),
        ]
    }

    fn masks(permission: &VendorPermission) -> (bool, bool) {
        let action = permission.action();
        (
            action.is_restricted(Restriction::MaskGeo),
            action.is_restricted(Restriction::MaskDeviceIp),
        )
    }

    #[test]
    fn test_opt_in_unmasks_everyone() {
        let consent = TcfConsent::default().with_special_feature_opt_ins([1]);
        let mut permissions = permissions();
        SpecialFeatureStrategy::precise_geolocation().process_special_feature(
            &consent,
            &SpecialFeatureConfig::default(),
            &mut permissions,
        );

        for permission in &permissions {
            assert_eq!(masks(permission), (false, false), "{permission:?}");
            assert!(
                permission.action().blocks_bidder_request(),
                "purpose flags must be untouched"
            );
        }
    }

    #[test]
    fn test_without_opt_in_only_exceptions_unmask() {
        let config = SpecialFeatureConfig {
            enforce: true,
            vendor_exceptions: BTreeSet::from(["b2".to_string()]),
        };
        let mut permissions = permissions();
        SpecialFeatureStrategy::precise_geolocation().process_special_feature(
            &TcfConsent::default(),
            &config,
            &mut permissions,
        );

        assert_eq!(masks(&permissions[0]), (true, true));
        assert_eq!(masks(&permissions[1]), (false, false));
        assert_eq!(masks(&permissions[2]), (true, true));
    }

    #[test]
    fn test_not_enforced_unmasks_everyone() {
        let config = SpecialFeatureConfig {
            enforce: false,
            vendor_exceptions: BTreeSet::new(),
        };
        let mut permissions = permissions();
        SpecialFeatureStrategy::precise_geolocation().process_special_feature(
            &TcfConsent::default(),
            &config,
            &mut permissions,
        );

        assert!(permissions.iter().all(|p| masks(p) == (false, false)));
    }

    #[test]
    fn test_other_feature_opt_in_does_not_count() {
        let consent = TcfConsent::default().with_special_feature_opt_ins([2]);
        let mut permissions = permissions();
        SpecialFeatureStrategy::precise_geolocation().process_special_feature(
            &consent,
            &SpecialFeatureConfig::default(),
            &mut permissions,
        );

        assert!(permissions.iter().all(|p| masks(p) == (true, true)));
    }
}
