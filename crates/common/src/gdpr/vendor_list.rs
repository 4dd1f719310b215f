//! Global Vendor List snapshot.
//!
//! Loading and refreshing the GVL is handled elsewhere; enforcement receives a
//! read-only snapshot for the whole auction. A vendor missing from the snapshot
//! resolves to an empty declaration so that full enforcement fails closed.

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};

use error_stack::{Report, ResultExt};
use serde::{Deserialize, Serialize};

use crate::error::EnforcementError;

use super::purpose::PurposeCode;

/// A vendor's declared legal bases as published in the GVL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorDeclaration {
    pub id: u32,
    /// Purposes the vendor processes on the consent basis.
    #[serde(default)]
    pub purposes: BTreeSet<u8>,
    /// Purposes the vendor processes on the legitimate interest basis.
    #[serde(default)]
    pub leg_int_purposes: BTreeSet<u8>,
    /// Purposes for which a publisher may switch the vendor's basis.
    #[serde(default)]
    pub flexible_purposes: BTreeSet<u8>,
    #[serde(default)]
    pub special_features: BTreeSet<u8>,
}

impl VendorDeclaration {
    /// Declaration with no purposes, used when the GVL has no entry for a vendor.
    #[must_use]
    pub fn empty(id: u32) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn declares_consent(&self, purpose: PurposeCode) -> bool {
        self.purposes.contains(&purpose.id())
    }

    #[must_use]
    pub fn declares_legitimate_interest(&self, purpose: PurposeCode) -> bool {
        self.leg_int_purposes.contains(&purpose.id())
    }

    #[must_use]
    pub fn is_flexible(&self, purpose: PurposeCode) -> bool {
        self.flexible_purposes.contains(&purpose.id())
    }
}

/// Source of vendor declarations for one auction.
pub trait VendorListProvider: Sync {
    /// Declaration for `vendor_id`, or `None` if the vendor is not listed.
    fn vendor(&self, vendor_id: u32) -> Option<&VendorDeclaration>;
}

/// Resolve a vendor's declaration, falling back to an empty one.
///
/// Bidders without a GVL id get an empty declaration under id `0`.
#[must_use]
pub fn declaration_for(
    provider: &dyn VendorListProvider,
    vendor_id: Option<u32>,
) -> Cow<'_, VendorDeclaration> {
    match vendor_id.and_then(|id| provider.vendor(id)) {
        Some(declaration) => Cow::Borrowed(declaration),
        None => Cow::Owned(VendorDeclaration::empty(vendor_id.unwrap_or_default())),
    }
}

/// GVL v2 snapshot as published by IAB Europe.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorList {
    pub vendor_list_version: u32,
    #[serde(default)]
    pub tcf_policy_version: u32,
    #[serde(default)]
    pub vendors: BTreeMap<u32, VendorDeclaration>,
}

impl VendorList {
    /// Parse a GVL JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`EnforcementError::VendorList`] if the JSON is malformed or a
    /// vendor entry's `id` does not match its key.
    pub fn from_json(json: &str) -> Result<Self, Report<EnforcementError>> {
        let vendor_list: VendorList =
            serde_json::from_str(json).change_context(EnforcementError::VendorList {
                message: "Failed to parse vendor list JSON".to_string(),
            })?;

        if let Some((key, vendor)) = vendor_list.vendors.iter().find(|(key, v)| **key != v.id) {
            return Err(Report::new(EnforcementError::VendorList {
                message: format!("Vendor entry '{}' declares mismatched id {}", key, vendor.id),
            }));
        }

        log::info!(
            "Loaded vendor list version {} (policy {}) with {} vendors",
            vendor_list.vendor_list_version,
            vendor_list.tcf_policy_version,
            vendor_list.vendors.len()
        );

        Ok(vendor_list)
    }

    /// Build a snapshot from declarations, keyed by their ids.
    #[must_use]
    pub fn from_declarations(
        vendor_list_version: u32,
        declarations: impl IntoIterator<Item = VendorDeclaration>,
    ) -> Self {
        Self {
            vendor_list_version,
            tcf_policy_version: 0,
            vendors: declarations.into_iter().map(|v| (v.id, v)).collect(),
        }
    }
}

impl VendorListProvider for VendorList {
    fn vendor(&self, vendor_id: u32) -> Option<&VendorDeclaration> {
        self.vendors.get(&vendor_id)
    }
}
