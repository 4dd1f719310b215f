//! TCF purpose identifiers.

use std::fmt;

use error_stack::Report;

use crate::error::EnforcementError;

/// One of the ten standardized TCF v2 data-processing purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PurposeCode {
    /// Store and/or access information on a device.
    One = 1,
    /// Use limited data to select advertising.
    Two = 2,
    /// Create profiles for personalised advertising.
    Three = 3,
    /// Use profiles to select personalised advertising.
    Four = 4,
    /// Create profiles to personalise content.
    Five = 5,
    /// Use profiles to select personalised content.
    Six = 6,
    /// Measure advertising performance.
    Seven = 7,
    /// Measure content performance.
    Eight = 8,
    /// Understand audiences through statistics.
    Nine = 9,
    /// Develop and improve services.
    Ten = 10,
}

impl PurposeCode {
    /// All purposes in increasing id order, the order enforcement runs in.
    pub const ALL: [PurposeCode; 10] = [
        PurposeCode::One,
        PurposeCode::Two,
        PurposeCode::Three,
        PurposeCode::Four,
        PurposeCode::Five,
        PurposeCode::Six,
        PurposeCode::Seven,
        PurposeCode::Eight,
        PurposeCode::Nine,
        PurposeCode::Ten,
    ];

    /// Numeric TCF purpose id.
    #[must_use]
    pub const fn id(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for PurposeCode {
    type Error = Report<EnforcementError>;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        PurposeCode::ALL
            .into_iter()
            .find(|purpose| purpose.id() == id)
            .ok_or_else(|| Report::new(EnforcementError::InvalidPurpose { id }))
    }
}

impl fmt::Display for PurposeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "purpose {}", self.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_purpose_ids_are_sequential() {
        let ids: Vec<u8> = PurposeCode::ALL.iter().map(|p| p.id()).collect();
        assert_eq!(ids, (1..=10).collect::<Vec<u8>>());
    }

    #[test]
    fn test_try_from_valid_id() {
        let purpose = PurposeCode::try_from(7).expect("should parse purpose 7");
        assert_eq!(purpose, PurposeCode::Seven);
    }

    #[test]
    fn test_try_from_out_of_range() {
        for id in [0, 11, 255] {
            let err = PurposeCode::try_from(id).expect_err("should reject id");
            assert!(
                err.to_string().contains("Invalid TCF purpose id"),
                "unexpected error for {id}: {err}"
            );
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(PurposeCode::Two.to_string(), "purpose 2");
    }
}
