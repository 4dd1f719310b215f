//! Legal bases TCF policy permits for each purpose.
//!
//! Purpose 1 and the profiling purposes 3 to 6 require consent. The remaining
//! purposes may also rest on legitimate interest. The mapping is fixed by TCF
//! v2.2 policy and is not inferred from vendor declarations.

use super::purpose::PurposeCode;

/// Ground on which a vendor may process data for a purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LegalBasis {
    Consent,
    LegitimateInterest,
}

const CONSENT_ONLY: &[LegalBasis] = &[LegalBasis::Consent];
const CONSENT_OR_LEGITIMATE_INTEREST: &[LegalBasis] =
    &[LegalBasis::Consent, LegalBasis::LegitimateInterest];

const PURPOSE_LEGAL_BASES: [(PurposeCode, &[LegalBasis]); 10] = [
    (PurposeCode::One, CONSENT_ONLY),
    (PurposeCode::Two, CONSENT_OR_LEGITIMATE_INTEREST),
    (PurposeCode::Three, CONSENT_ONLY),
    (PurposeCode::Four, CONSENT_ONLY),
    (PurposeCode::Five, CONSENT_ONLY),
    (PurposeCode::Six, CONSENT_ONLY),
    (PurposeCode::Seven, CONSENT_OR_LEGITIMATE_INTEREST),
    (PurposeCode::Eight, CONSENT_OR_LEGITIMATE_INTEREST),
    (PurposeCode::Nine, CONSENT_OR_LEGITIMATE_INTEREST),
    (PurposeCode::Ten, CONSENT_OR_LEGITIMATE_INTEREST),
];

/// Legal bases permitted for `purpose`.
#[must_use]
pub fn permitted_legal_bases(purpose: PurposeCode) -> &'static [LegalBasis] {
    PURPOSE_LEGAL_BASES
        .iter()
        .find(|(code, _)| *code == purpose)
        .map_or(CONSENT_ONLY, |(_, bases)| *bases)
}

impl LegalBasis {
    /// Whether this basis may be relied on for `purpose`.
    #[must_use]
    pub fn is_permitted_for(self, purpose: PurposeCode) -> bool {
        permitted_legal_bases(purpose).contains(&self)
    }
}
