//! Per-vendor restriction state threaded through the purpose passes.
//!
//! One [`VendorPermission`] is built per candidate vendor at the start of an
//! auction, starting fully restricted. Every purpose pass borrows the same
//! permissions mutably and clears only the flags its purpose owns, so state
//! accumulates across passes and is never shared between auctions.

use std::borrow::Cow;

use serde::Serialize;

use super::vendor_list::{declaration_for, VendorDeclaration, VendorListProvider};

/// A single restriction flag on [`PrivacyEnforcementAction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Restriction {
    BlockBidderRequest,
    BlockPixelSync,
    BlockAnalyticsReport,
    RemoveUserFpd,
    RemoveUserIds,
    MaskGeo,
    MaskDeviceIp,
}

impl Restriction {
    pub const ALL: [Restriction; 7] = [
        Restriction::BlockBidderRequest,
        Restriction::BlockPixelSync,
        Restriction::BlockAnalyticsReport,
        Restriction::RemoveUserFpd,
        Restriction::RemoveUserIds,
        Restriction::MaskGeo,
        Restriction::MaskDeviceIp,
    ];
}

/// Independent restriction flags for one vendor in one auction.
///
/// `true` means restricted. Flags only ever move from restricted to allowed,
/// and only through the strategy that owns them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrivacyEnforcementAction {
    block_bidder_request: bool,
    block_pixel_sync: bool,
    block_analytics_report: bool,
    remove_user_fpd: bool,
    remove_user_ids: bool,
    mask_geo: bool,
    mask_device_ip: bool,
}

impl PrivacyEnforcementAction {
    /// Every flag restricted. The starting point for each auction.
    #[must_use]
    pub fn restrict_all() -> Self {
        Self {
            block_bidder_request: true,
            block_pixel_sync: true,
            block_analytics_report: true,
            remove_user_fpd: true,
            remove_user_ids: true,
            mask_geo: true,
            mask_device_ip: true,
        }
    }

    /// Every flag allowed. Used when GDPR does not apply.
    #[must_use]
    pub fn allow_all() -> Self {
        Self {
            block_bidder_request: false,
            block_pixel_sync: false,
            block_analytics_report: false,
            remove_user_fpd: false,
            remove_user_ids: false,
            mask_geo: false,
            mask_device_ip: false,
        }
    }

    #[must_use]
    pub fn is_restricted(&self, restriction: Restriction) -> bool {
        match restriction {
            Restriction::BlockBidderRequest => self.block_bidder_request,
            Restriction::BlockPixelSync => self.block_pixel_sync,
            Restriction::BlockAnalyticsReport => self.block_analytics_report,
            Restriction::RemoveUserFpd => self.remove_user_fpd,
            Restriction::RemoveUserIds => self.remove_user_ids,
            Restriction::MaskGeo => self.mask_geo,
            Restriction::MaskDeviceIp => self.mask_device_ip,
        }
    }

    pub(crate) fn clear(&mut self, restriction: Restriction) {
        let flag = match restriction {
            Restriction::BlockBidderRequest => &mut self.block_bidder_request,
            Restriction::BlockPixelSync => &mut self.block_pixel_sync,
            Restriction::BlockAnalyticsReport => &mut self.block_analytics_report,
            Restriction::RemoveUserFpd => &mut self.remove_user_fpd,
            Restriction::RemoveUserIds => &mut self.remove_user_ids,
            Restriction::MaskGeo => &mut self.mask_geo,
            Restriction::MaskDeviceIp => &mut self.mask_device_ip,
        };
        *flag = false;
    }

    #[must_use]
    pub fn blocks_bidder_request(&self) -> bool {
        self.block_bidder_request
    }

    #[must_use]
    pub fn blocks_pixel_sync(&self) -> bool {
        self.block_pixel_sync
    }

    #[must_use]
    pub fn blocks_analytics_report(&self) -> bool {
        self.block_analytics_report
    }

    /// Flags still restricted, in [`Restriction::ALL`] order.
    #[must_use]
    pub fn restricted(&self) -> Vec<Restriction> {
        Restriction::ALL
            .into_iter()
            .filter(|r| self.is_restricted(*r))
            .collect()
    }
}

/// Enforcement record for one candidate vendor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VendorPermission {
    vendor_id: Option<u32>,
    #[serde(rename = "bidder")]
    bidder_code: Option<String>,
    action: PrivacyEnforcementAction,
}

impl VendorPermission {
    /// A fully restricted permission.
    #[must_use]
    pub fn new(vendor_id: Option<u32>, bidder_code: Option<String>) -> Self {
        Self::with_action(vendor_id, bidder_code, PrivacyEnforcementAction::restrict_all())
    }

    #[must_use]
    pub fn with_action(
        vendor_id: Option<u32>,
        bidder_code: Option<String>,
        action: PrivacyEnforcementAction,
    ) -> Self {
        Self {
            vendor_id,
            bidder_code,
            action,
        }
    }

    #[must_use]
    pub fn vendor_id(&self) -> Option<u32> {
        self.vendor_id
    }

    #[must_use]
    pub fn bidder_code(&self) -> Option<&str> {
        self.bidder_code.as_deref()
    }

    #[must_use]
    pub fn action(&self) -> &PrivacyEnforcementAction {
        &self.action
    }

    pub(crate) fn action_mut(&mut self) -> &mut PrivacyEnforcementAction {
        &mut self.action
    }
}

/// A permission paired with its GVL declaration for one evaluation call.
#[derive(Debug)]
pub struct VendorPermissionWithGvl<'a> {
    vendor_permission: &'a mut VendorPermission,
    vendor: Cow<'a, VendorDeclaration>,
}

impl<'a> VendorPermissionWithGvl<'a> {
    pub fn new(
        vendor_permission: &'a mut VendorPermission,
        vendor: Cow<'a, VendorDeclaration>,
    ) -> Self {
        Self {
            vendor_permission,
            vendor,
        }
    }

    #[must_use]
    pub fn vendor_permission(&self) -> &VendorPermission {
        &*self.vendor_permission
    }

    #[must_use]
    pub fn vendor(&self) -> &VendorDeclaration {
        &self.vendor
    }

    #[must_use]
    pub fn vendor_id(&self) -> Option<u32> {
        self.vendor_permission.vendor_id
    }

    #[must_use]
    pub fn bidder_code(&self) -> Option<&str> {
        self.vendor_permission.bidder_code()
    }

    pub(crate) fn action_mut(&mut self) -> &mut PrivacyEnforcementAction {
        self.vendor_permission.action_mut()
    }
}

/// Pair every permission with its declaration from `vendor_list`.
pub fn attach_vendor_list<'a>(
    permissions: &'a mut [VendorPermission],
    vendor_list: &'a dyn VendorListProvider,
) -> Vec<VendorPermissionWithGvl<'a>> {
    permissions
        .iter_mut()
        .map(|permission| {
            let vendor = declaration_for(vendor_list, permission.vendor_id);
            VendorPermissionWithGvl::new(permission, vendor)
        })
        .collect()
}
