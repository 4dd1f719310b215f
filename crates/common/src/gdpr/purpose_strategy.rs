//! Per-purpose enforcement passes.
//!
//! The ten purpose strategies are structurally identical. Each binds a purpose
//! to the restriction flags it owns; the enforcement algorithm comes from the
//! purpose's [`PurposeConfig`] at call time.

use std::collections::BTreeSet;

use super::config::{is_excepted, EnforcePurpose, PurposeConfig};
use super::consent::ConsentSignal;
use super::model::{
    PrivacyEnforcementAction, Restriction, VendorPermission, VendorPermissionWithGvl,
};
use super::purpose::PurposeCode;
use super::type_strategy::TypeEnforcementStrategy;

/// Restriction flags owned by each purpose. No flag appears twice.
const PURPOSE_RESTRICTIONS: [(PurposeCode, &[Restriction]); 10] = [
    (PurposeCode::One, &[Restriction::BlockPixelSync]),
    (PurposeCode::Two, &[Restriction::BlockBidderRequest]),
    (PurposeCode::Three, &[]),
    (
        PurposeCode::Four,
        &[Restriction::RemoveUserFpd, Restriction::RemoveUserIds],
    ),
    (PurposeCode::Five, &[]),
    (PurposeCode::Six, &[]),
    (PurposeCode::Seven, &[Restriction::BlockAnalyticsReport]),
    (PurposeCode::Eight, &[]),
    (PurposeCode::Nine, &[]),
    (PurposeCode::Ten, &[]),
];

/// Enforcement pass for a single TCF purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PurposeStrategy {
    purpose: PurposeCode,
    restrictions: &'static [Restriction],
}

impl PurposeStrategy {
    #[must_use]
    pub fn for_purpose(purpose: PurposeCode) -> Self {
        let restrictions = PURPOSE_RESTRICTIONS
            .iter()
            .find(|(code, _)| *code == purpose)
            .map_or(&[] as &[Restriction], |(_, restrictions)| *restrictions);
        Self {
            purpose,
            restrictions,
        }
    }

    /// One strategy per purpose, in increasing purpose id order.
    #[must_use]
    pub fn all() -> [PurposeStrategy; 10] {
        PurposeCode::ALL.map(Self::for_purpose)
    }

    #[must_use]
    pub fn purpose_id(&self) -> PurposeCode {
        self.purpose
    }

    #[must_use]
    pub fn restrictions(&self) -> &'static [Restriction] {
        self.restrictions
    }

    /// Clear the flags this purpose owns. Idempotent.
    pub fn allow(&self, action: &mut PrivacyEnforcementAction) {
        for restriction in self.restrictions {
            action.clear(*restriction);
        }
    }

    /// Evaluate this purpose for every vendor and clear owned flags on the allowed ones.
    ///
    /// Returns every permission in input order, allowed or not; callers read
    /// the outcome off each permission's action.
    pub fn process_type_purpose_strategy<'s>(
        &self,
        consent: &dyn ConsentSignal,
        purpose_config: &PurposeConfig,
        vendor_permissions: &'s mut [VendorPermissionWithGvl<'_>],
    ) -> Vec<&'s VendorPermission> {
        self.process_with(
            TypeEnforcementStrategy::from(purpose_config.enforce_purpose),
            consent,
            purpose_config,
            vendor_permissions,
        )
    }

    /// Allow only exception-listed vendors, skipping evaluation of the rest.
    pub(crate) fn allow_excepted_only<'s>(
        &self,
        purpose_config: &PurposeConfig,
        vendor_permissions: &'s mut [VendorPermissionWithGvl<'_>],
    ) -> Vec<&'s VendorPermission> {
        let (excepted, _) = partition_by_exceptions(
            vendor_permissions.iter_mut(),
            &purpose_config.vendor_exceptions,
        );
        for vendor in excepted {
            self.allow(vendor.action_mut());
        }

        let vendor_permissions: &'s [VendorPermissionWithGvl<'_>] = vendor_permissions;
        vendor_permissions
            .iter()
            .map(VendorPermissionWithGvl::vendor_permission)
            .collect()
    }

    /// Evaluate as if the purpose were configured with `enforce_purpose`.
    pub(crate) fn process_as<'s>(
        &self,
        enforce_purpose: EnforcePurpose,
        consent: &dyn ConsentSignal,
        purpose_config: &PurposeConfig,
        vendor_permissions: &'s mut [VendorPermissionWithGvl<'_>],
    ) -> Vec<&'s VendorPermission> {
        self.process_with(
            TypeEnforcementStrategy::from(enforce_purpose),
            consent,
            purpose_config,
            vendor_permissions,
        )
    }

    fn process_with<'s>(
        &self,
        type_strategy: TypeEnforcementStrategy,
        consent: &dyn ConsentSignal,
        purpose_config: &PurposeConfig,
        vendor_permissions: &'s mut [VendorPermissionWithGvl<'_>],
    ) -> Vec<&'s VendorPermission> {
        let total = vendor_permissions.len();
        let (excepted, to_evaluate) = partition_by_exceptions(
            vendor_permissions.iter_mut(),
            &purpose_config.vendor_exceptions,
        );
        let excepted_count = excepted.len();
        let enforce_vendors =
            effective_enforce_vendors(&to_evaluate, purpose_config.enforce_vendors);

        let allowed = type_strategy.allowed_by_type_strategy(
            self.purpose,
            consent,
            to_evaluate,
            excepted,
            enforce_vendors,
        );

        log::debug!(
            "{}: {:?} enforcement allowed {} of {} vendors ({} excepted, enforce_vendors={})",
            self.purpose,
            type_strategy,
            allowed.len(),
            total,
            excepted_count,
            enforce_vendors
        );

        for vendor in allowed {
            self.allow(vendor.action_mut());
        }

        let vendor_permissions: &'s [VendorPermissionWithGvl<'_>] = vendor_permissions;
        vendor_permissions
            .iter()
            .map(VendorPermissionWithGvl::vendor_permission)
            .collect()
    }
}

/// Split into `(excepted, to_evaluate)`, preserving input order in each.
pub(crate) fn partition_by_exceptions<'v, 'a>(
    vendor_permissions: impl Iterator<Item = &'v mut VendorPermissionWithGvl<'a>>,
    vendor_exceptions: &BTreeSet<String>,
) -> (
    Vec<&'v mut VendorPermissionWithGvl<'a>>,
    Vec<&'v mut VendorPermissionWithGvl<'a>>,
)
where
    'a: 'v,
{
    vendor_permissions.partition(|vendor| is_excepted(vendor_exceptions, vendor.bidder_code()))
}

// With every candidate exception-listed there is nothing left to gate, so
// the configured value is overridden.
fn effective_enforce_vendors<T>(to_evaluate: &[T], configured: bool) -> bool {
    to_evaluate.is_empty() || configured
}
