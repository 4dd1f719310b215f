//! Error types for the enforcement crate.
//!
//! Purpose enforcement itself is total and never fails. Errors only surface
//! at the load boundary: settings, vendor list snapshots and consent fixtures.

use derive_more::{Display, Error};

/// Errors raised while loading or validating enforcement inputs.
#[derive(Debug, Display, Error)]
pub enum EnforcementError {
    /// Settings could not be parsed, merged or validated.
    #[display("Configuration error: {message}")]
    Configuration { message: String },

    /// A Global Vendor List snapshot could not be parsed or is inconsistent.
    #[display("Vendor list error: {message}")]
    VendorList { message: String },

    /// A decoded consent value could not be parsed.
    #[display("Consent error: {message}")]
    Consent { message: String },

    /// A purpose id outside the TCF range 1..=10.
    #[display("Invalid TCF purpose id: {id}")]
    InvalidPurpose { id: u8 },
}
