//! TCF v2 purpose enforcement for the bid-request broker.
//!
//! This crate decides, per auction and per candidate vendor, which privacy
//! restrictions must be applied before bid requests, user syncs and analytics
//! events leave the broker.
//!
//! # Modules
//!
//! - [`error`]: Error types and error handling utilities
//! - [`gdpr`]: Consent evaluation and per-purpose enforcement
//! - [`settings`]: Configuration loading and validation

pub mod error;
pub mod gdpr;
pub mod settings;
