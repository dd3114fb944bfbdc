//! Canonical-precision quantity arithmetic.
//!
//! All ledger arithmetic happens in an ingredient's canonical unit at a fixed
//! internal scale, independent of what the UI rounds to for display.

use rust_decimal::Decimal;

/// Internal scale for all stored quantities (canonical units).
pub const CANONICAL_SCALE: u32 = 4;

/// Scale used for currency/quantity display. Presentation-only.
pub const DISPLAY_SCALE: u32 = 2;

/// Normalize a quantity to the ledger's internal precision.
///
/// Banker's rounding (the `rust_decimal` default) keeps repeated
/// conversions from drifting in one direction.
pub fn canonical(value: Decimal) -> Decimal {
    value.round_dp(CANONICAL_SCALE)
}

/// Round a quantity or amount for display.
pub fn display(value: Decimal) -> Decimal {
    value.round_dp(DISPLAY_SCALE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn canonical_rounds_to_four_places() {
        assert_eq!(canonical(dec!(0.123456)), dec!(0.1235));
        assert_eq!(canonical(dec!(1)), dec!(1));
    }

    #[test]
    fn display_rounds_to_two_places() {
        assert_eq!(display(dec!(14.4000)), dec!(14.40));
        assert_eq!(display(dec!(0.005)), dec!(0.00)); // banker's rounding
    }
}
