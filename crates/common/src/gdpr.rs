//! GDPR purpose enforcement for auctions.
//!
//! For each candidate vendor the engine decides which privacy restrictions
//! apply, based on the decoded TCF consent signal, the publisher's enforcement
//! policy and the vendor's Global Vendor List declaration.
//!
//! Every vendor starts fully restricted. [`enforcement::TcfEnforcement`] then
//! runs one [`purpose_strategy::PurposeStrategy`] per purpose in increasing id
//! order, each clearing only the flags its purpose owns on the vendors it
//! allows, followed by the special feature pass.

pub mod config;
pub mod consent;
pub mod enforcement;
pub mod legal_basis;
pub mod model;
pub mod purpose;
pub mod purpose_strategy;
pub mod special_feature;
pub mod type_strategy;
pub mod vendor_list;

pub use config::{
    EnforcePurpose, GdprConfig, PurposeConfig, PurposeOneTreatmentInterpretation,
    SpecialFeatureConfig,
};
pub use consent::{ConsentSignal, RestrictionType, TcfConsent};
pub use enforcement::{BidderVendor, TcfEnforcement};
pub use model::{PrivacyEnforcementAction, Restriction, VendorPermission, VendorPermissionWithGvl};
pub use purpose::PurposeCode;
pub use purpose_strategy::PurposeStrategy;
pub use type_strategy::TypeEnforcementStrategy;
pub use vendor_list::{VendorDeclaration, VendorList, VendorListProvider};
