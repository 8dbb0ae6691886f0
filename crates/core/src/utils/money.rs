//! Minor-unit monetary conversion.
//!
//! The matter API reports every amount as an integer count of hundredths
//! (`150000` is `1500.00`). Internal rows store decimal currency units.

use rust_decimal::Decimal;

/// Number of decimal places encoded by one minor unit.
pub const MINOR_UNIT_SCALE: u32 = 2;

/// Convert an integer amount of minor units into currency units.
///
/// The conversion is exact: the integer becomes the mantissa of a decimal
/// with scale 2, so no floating point is involved.
pub fn minor_units_to_decimal(minor_units: i64) -> Decimal {
    Decimal::new(minor_units, MINOR_UNIT_SCALE)
}

/// Optional variant: absent amounts are treated as zero.
pub fn optional_minor_units(minor_units: Option<i64>) -> Decimal {
    minor_units_to_decimal(minor_units.unwrap_or(0))
}
