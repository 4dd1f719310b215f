//! Allow/deny algorithms selected by a purpose's `enforce_purpose` setting.

use super::config::EnforcePurpose;
use super::consent::{ConsentSignal, RestrictionType};
use super::legal_basis::LegalBasis;
use super::model::VendorPermissionWithGvl;
use super::purpose::PurposeCode;

/// The algorithm used to decide one purpose for a set of vendors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeEnforcementStrategy {
    /// Consent bits plus the vendor's GVL declaration.
    Full,
    /// Consent bits only.
    Basic,
    /// Everything is allowed.
    No,
}

impl From<EnforcePurpose> for TypeEnforcementStrategy {
    fn from(enforce_purpose: EnforcePurpose) -> Self {
        match enforce_purpose {
            EnforcePurpose::Full => Self::Full,
            EnforcePurpose::Basic => Self::Basic,
            EnforcePurpose::No => Self::No,
        }
    }
}

impl TypeEnforcementStrategy {
    /// Subset of `to_evaluate` and `excepted` permitted for `purpose`.
    ///
    /// Allowed `to_evaluate` entries come first, in input order, followed by
    /// every `excepted` entry. Exception-listed vendors are never evaluated.
    pub fn allowed_by_type_strategy<'v, 'a>(
        self,
        purpose: PurposeCode,
        consent: &dyn ConsentSignal,
        to_evaluate: Vec<&'v mut VendorPermissionWithGvl<'a>>,
        excepted: Vec<&'v mut VendorPermissionWithGvl<'a>>,
        enforce_vendors: bool,
    ) -> Vec<&'v mut VendorPermissionWithGvl<'a>> {
        let mut allowed: Vec<_> = to_evaluate
            .into_iter()
            .filter(|vendor| self.allows(purpose, consent, vendor, enforce_vendors))
            .collect();
        allowed.extend(excepted);
        allowed
    }

    /// Decision for a single, non-excepted vendor.
    #[must_use]
    pub fn allows(
        self,
        purpose: PurposeCode,
        consent: &dyn ConsentSignal,
        vendor: &VendorPermissionWithGvl<'_>,
        enforce_vendors: bool,
    ) -> bool {
        match self {
            Self::No => true,
            Self::Basic => {
                allowed_by_consent(purpose, consent, vendor.vendor_id(), enforce_vendors)
                    || allowed_by_legitimate_interest(
                        purpose,
                        consent,
                        vendor.vendor_id(),
                        enforce_vendors,
                    )
            }
            Self::Full => allowed_by_full_enforcement(purpose, consent, vendor, enforce_vendors),
        }
    }
}

fn allowed_by_consent(
    purpose: PurposeCode,
    consent: &dyn ConsentSignal,
    vendor_id: Option<u32>,
    enforce_vendors: bool,
) -> bool {
    consent.purpose_consent(purpose)
        && (!enforce_vendors || vendor_id.is_some_and(|id| consent.vendor_consent(id)))
}

fn allowed_by_legitimate_interest(
    purpose: PurposeCode,
    consent: &dyn ConsentSignal,
    vendor_id: Option<u32>,
    enforce_vendors: bool,
) -> bool {
    LegalBasis::LegitimateInterest.is_permitted_for(purpose)
        && consent.purpose_legitimate_interest(purpose)
        && (!enforce_vendors || vendor_id.is_some_and(|id| consent.vendor_legitimate_interest(id)))
}

// Each basis needs the matching GVL declaration. A flexible purpose lets a
// publisher restriction switch the vendor onto its other declared basis.
fn allowed_by_full_enforcement(
    purpose: PurposeCode,
    consent: &dyn ConsentSignal,
    vendor: &VendorPermissionWithGvl<'_>,
    enforce_vendors: bool,
) -> bool {
    let declaration = vendor.vendor();
    let vendor_id = vendor.vendor_id();
    let by_consent = || allowed_by_consent(purpose, consent, vendor_id, enforce_vendors);
    let by_legitimate_interest =
        || allowed_by_legitimate_interest(purpose, consent, vendor_id, enforce_vendors);

    match vendor_id.and_then(|id| consent.publisher_restriction(purpose, id)) {
        Some(RestrictionType::NotAllowed) => false,
        Some(RestrictionType::RequireConsent) => {
            let declared = declaration.declares_consent(purpose)
                || (declaration.is_flexible(purpose)
                    && declaration.declares_legitimate_interest(purpose));
            declared && by_consent()
        }
        Some(RestrictionType::RequireLegitimateInterest) => {
            let declared = declaration.declares_legitimate_interest(purpose)
                || (declaration.is_flexible(purpose) && declaration.declares_consent(purpose));
            declared && by_legitimate_interest()
        }
        None => {
            (declaration.declares_consent(purpose) && by_consent())
                || (declaration.declares_legitimate_interest(purpose) && by_legitimate_interest())
        }
    }
}
