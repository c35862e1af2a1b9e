//! Common utility functions for IRRF calculations.
//!
//! Every monetary intermediate in the withholding computation is rounded to
//! cents as soon as it is produced, so these helpers are used at almost every
//! step of [`IrrfWorksheet`](super::IrrfWorksheet).

use rust_decimal::Decimal;

/// Rounds a decimal value to exactly two decimal places using half-up rounding.
///
/// Values at exactly 0.005 are rounded up to 0.01 (away from zero).
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use irrf_core::calculations::common::round_half_up;
///
/// assert_eq!(round_half_up(dec!(290.3115)), dec!(290.31));
/// assert_eq!(round_half_up(dec!(123.455)), dec!(123.46));
/// assert_eq!(round_half_up(dec!(-123.455)), dec!(-123.46)); // Away from zero
/// ```
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, rust_decimal::RoundingStrategy::MidpointAwayFromZero)
}

/// Returns the maximum of two decimal values.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use irrf_core::calculations::common::max;
///
/// assert_eq!(max(dec!(379.18), dec!(607.20)), dec!(607.20));
/// assert_eq!(max(dec!(-100.00), dec!(-200.00)), dec!(-100.00));
/// ```
pub fn max(
    a: Decimal,
    b: Decimal,
) -> Decimal {
    if a > b { a } else { b }
}

/// Restricts `value` to the closed interval `[lower, upper]`.
///
/// When `upper < lower` the lower bound wins, so a zero-width ceiling such as
/// a tax of `0.00` always yields `lower`.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use irrf_core::calculations::common::clamp;
///
/// assert_eq!(clamp(dec!(312.89), dec!(0), dec!(107.11)), dec!(107.11));
/// assert_eq!(clamp(dec!(-4.50), dec!(0), dec!(107.11)), dec!(0));
/// ```
pub fn clamp(
    value: Decimal,
    lower: Decimal,
    upper: Decimal,
) -> Decimal {
    max(value.min(upper), lower)
}
