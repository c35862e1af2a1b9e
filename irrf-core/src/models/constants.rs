use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Fixed amounts used by the monthly withholding computation.
///
/// The values are process-wide and never change after startup; a worksheet
/// borrows them for the duration of a single calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IrrfConstants {
    /// Deduction granted per dependent.
    pub dependent_deduction: Decimal,

    /// Simplified monthly discount, used instead of the itemized deductions
    /// whenever it is larger.
    pub simplified_deduction: Decimal,

    /// Taxable income up to which the PL 1087/25 reduction covers the whole
    /// tax (up to `reduction_cap`).
    pub reduction_full_ceiling: Decimal,

    /// Largest reduction granted below `reduction_full_ceiling`.
    pub reduction_cap: Decimal,

    /// Taxable income above which the PL 1087/25 reduction no longer applies.
    pub reduction_phase_out_ceiling: Decimal,

    /// Intercept of the phase-out line: `intercept - slope * income`.
    pub reduction_phase_out_intercept: Decimal,

    /// Slope of the phase-out line.
    pub reduction_phase_out_slope: Decimal,
}

impl IrrfConstants {
    pub const DEFAULT: Self = Self {
        dependent_deduction: Decimal::from_parts(18959, 0, 0, false, 2),
        simplified_deduction: Decimal::from_parts(60720, 0, 0, false, 2),
        reduction_full_ceiling: Decimal::from_parts(500000, 0, 0, false, 2),
        reduction_cap: Decimal::from_parts(31289, 0, 0, false, 2),
        reduction_phase_out_ceiling: Decimal::from_parts(735000, 0, 0, false, 2),
        reduction_phase_out_intercept: Decimal::from_parts(97862, 0, 0, false, 2),
        reduction_phase_out_slope: Decimal::from_parts(133145, 0, 0, false, 6),
    };

    /// Message reported when taxable income is above the phase-out ceiling.
    pub fn reduction_not_applicable_message(&self) -> String {
        format!(
            "the PL 1087/25 transitional reduction does not apply to taxable income above {:.2}",
            self.reduction_phase_out_ceiling
        )
    }
}

impl Default for IrrfConstants {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn default_constants_match_current_legislation() {
        let constants = IrrfConstants::DEFAULT;

        assert_eq!(constants.dependent_deduction, dec!(189.59));
        assert_eq!(constants.simplified_deduction, dec!(607.20));
        assert_eq!(constants.reduction_full_ceiling, dec!(5000.00));
        assert_eq!(constants.reduction_cap, dec!(312.89));
        assert_eq!(constants.reduction_phase_out_ceiling, dec!(7350.00));
        assert_eq!(constants.reduction_phase_out_intercept, dec!(978.62));
        assert_eq!(constants.reduction_phase_out_slope, dec!(0.133145));
    }

    #[test]
    fn not_applicable_message_names_the_ceiling() {
        let message = IrrfConstants::DEFAULT.reduction_not_applicable_message();

        assert_eq!(
            message,
            "the PL 1087/25 transitional reduction does not apply to taxable income above 7350.00"
        );
    }
}
