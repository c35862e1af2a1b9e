use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest monetary amount accepted by validation.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(276447232, 23283, 0, false, 2);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputField {
    TaxableIncome,
    OfficialPensionContribution,
    DependentCount,
    Alimony,
}

impl InputField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TaxableIncome => "taxable_income",
            Self::OfficialPensionContribution => "official_pension_contribution",
            Self::DependentCount => "dependent_count",
            Self::Alimony => "alimony",
        }
    }
}

impl fmt::Display for InputField {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single error kind of the calculator: the caller supplied input that
/// cannot be computed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    Missing(InputField),

    #[error("{0} must be a number")]
    NotANumber(InputField),

    #[error("{0} must be a finite number")]
    NotFinite(InputField),

    #[error("{0} must not be negative")]
    Negative(InputField),

    #[error("{0} must be a whole number")]
    NotInteger(InputField),

    #[error("{field} must not exceed {max}")]
    OutOfRange { field: InputField, max: Decimal },
}

/// Unvalidated input as it arrives from JSON or the command line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawIrrfInput {
    pub taxable_income: f64,
    pub official_pension_contribution: f64,
    pub dependent_count: f64,
    #[serde(default)]
    pub alimony: Option<f64>,
}

impl RawIrrfInput {
    /// Checks every field and converts the amounts to fixed-point decimals.
    ///
    /// Fields are checked in declaration order and the first violation is
    /// returned.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if a value is not finite, is negative, is
    /// larger than [`MAX_AMOUNT`], or if the dependent count is fractional.
    pub fn validate(&self) -> Result<IrrfInput, ValidationError> {
        let taxable_income = to_amount(InputField::TaxableIncome, self.taxable_income)?;
        let official_pension_contribution = to_amount(
            InputField::OfficialPensionContribution,
            self.official_pension_contribution,
        )?;
        let dependent_count = to_count(InputField::DependentCount, self.dependent_count)?;
        let alimony = match self.alimony {
            Some(value) => to_amount(InputField::Alimony, value)?,
            None => Decimal::ZERO,
        };

        IrrfInput::new(
            taxable_income,
            official_pension_contribution,
            dependent_count,
            alimony,
        )
    }
}

fn check_sign(
    field: InputField,
    value: f64,
) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NotFinite(field));
    }
    if value < 0.0 {
        return Err(ValidationError::Negative(field));
    }
    Ok(())
}

fn to_amount(
    field: InputField,
    value: f64,
) -> Result<Decimal, ValidationError> {
    check_sign(field, value)?;
    let out_of_range = ValidationError::OutOfRange {
        field,
        max: MAX_AMOUNT,
    };
    let amount = Decimal::try_from(value).map_err(|_| out_of_range.clone())?;
    if amount > MAX_AMOUNT {
        return Err(out_of_range);
    }
    Ok(amount)
}

fn to_count(
    field: InputField,
    value: f64,
) -> Result<u32, ValidationError> {
    check_sign(field, value)?;
    if value.fract() != 0.0 {
        return Err(ValidationError::NotInteger(field));
    }
    if value > f64::from(u32::MAX) {
        return Err(ValidationError::OutOfRange {
            field,
            max: Decimal::from(u32::MAX),
        });
    }
    // Whole, non-negative and within range, so the cast is exact.
    Ok(value as u32)
}

/// Validated input of a single withholding calculation.
///
/// Can only be obtained through [`IrrfInput::new`] or
/// [`RawIrrfInput::validate`], so a worksheet never sees negative or
/// out-of-range values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IrrfInput {
    taxable_income: Decimal,
    official_pension_contribution: Decimal,
    dependent_count: u32,
    alimony: Decimal,
}

impl IrrfInput {
    /// # Errors
    ///
    /// Returns [`ValidationError::Negative`] or [`ValidationError::OutOfRange`]
    /// for the first amount that is below zero or above [`MAX_AMOUNT`].
    pub fn new(
        taxable_income: Decimal,
        official_pension_contribution: Decimal,
        dependent_count: u32,
        alimony: Decimal,
    ) -> Result<Self, ValidationError> {
        for (field, value) in [
            (InputField::TaxableIncome, taxable_income),
            (
                InputField::OfficialPensionContribution,
                official_pension_contribution,
            ),
            (InputField::Alimony, alimony),
        ] {
            if value.is_sign_negative() && !value.is_zero() {
                return Err(ValidationError::Negative(field));
            }
            if value > MAX_AMOUNT {
                return Err(ValidationError::OutOfRange {
                    field,
                    max: MAX_AMOUNT,
                });
            }
        }

        Ok(Self {
            taxable_income,
            official_pension_contribution,
            dependent_count,
            alimony,
        })
    }

    pub fn taxable_income(&self) -> Decimal {
        self.taxable_income
    }

    pub fn official_pension_contribution(&self) -> Decimal {
        self.official_pension_contribution
    }

    pub fn dependent_count(&self) -> u32 {
        self.dependent_count
    }

    pub fn alimony(&self) -> Decimal {
        self.alimony
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn raw(
        taxable_income: f64,
        official_pension_contribution: f64,
        dependent_count: f64,
        alimony: Option<f64>,
    ) -> RawIrrfInput {
        RawIrrfInput {
            taxable_income,
            official_pension_contribution,
            dependent_count,
            alimony,
        }
    }

    #[test]
    fn max_amount_is_one_trillion() {
        assert_eq!(MAX_AMOUNT, dec!(1000000000000.00));
    }

    // =========================================================================
    // RawIrrfInput::validate tests
    // =========================================================================

    #[test]
    fn validate_converts_amounts_to_decimal() {
        let input = raw(5000.0, 750.0, 2.0, None).validate().unwrap();

        assert_eq!(input.taxable_income(), dec!(5000));
        assert_eq!(input.official_pension_contribution(), dec!(750));
        assert_eq!(input.dependent_count(), 2);
        assert_eq!(input.alimony(), dec!(0));
    }

    #[test]
    fn validate_keeps_cents_exact() {
        let input = raw(3036.1, 0.0, 0.0, Some(0.1)).validate().unwrap();

        assert_eq!(input.taxable_income(), dec!(3036.1));
        assert_eq!(input.alimony(), dec!(0.1));
    }

    #[test]
    fn validate_rejects_negative_income() {
        let result = raw(-1.0, 0.0, 0.0, None).validate();

        assert_eq!(
            result,
            Err(ValidationError::Negative(InputField::TaxableIncome))
        );
    }

    #[test]
    fn validate_rejects_fractional_dependents() {
        let result = raw(5000.0, 0.0, 2.5, None).validate();

        assert_eq!(
            result,
            Err(ValidationError::NotInteger(InputField::DependentCount))
        );
    }

    #[test]
    fn validate_rejects_negative_dependents() {
        let result = raw(5000.0, 0.0, -1.0, None).validate();

        assert_eq!(
            result,
            Err(ValidationError::Negative(InputField::DependentCount))
        );
    }

    #[test]
    fn validate_rejects_non_finite_contribution() {
        let result = raw(5000.0, f64::NAN, 0.0, None).validate();

        assert_eq!(
            result,
            Err(ValidationError::NotFinite(
                InputField::OfficialPensionContribution
            ))
        );
    }

    #[test]
    fn validate_rejects_infinite_alimony() {
        let result = raw(5000.0, 0.0, 0.0, Some(f64::INFINITY)).validate();

        assert_eq!(result, Err(ValidationError::NotFinite(InputField::Alimony)));
    }

    #[test]
    fn validate_rejects_negative_alimony() {
        let result = raw(5000.0, 0.0, 0.0, Some(-0.01)).validate();

        assert_eq!(result, Err(ValidationError::Negative(InputField::Alimony)));
    }

    #[test]
    fn validate_rejects_amount_above_maximum() {
        let result = raw(1e13, 0.0, 0.0, None).validate();

        assert_eq!(
            result,
            Err(ValidationError::OutOfRange {
                field: InputField::TaxableIncome,
                max: MAX_AMOUNT,
            })
        );
    }

    #[test]
    fn validate_rejects_dependents_above_u32() {
        let result = raw(5000.0, 0.0, 1e10, None).validate();

        assert!(matches!(
            result,
            Err(ValidationError::OutOfRange {
                field: InputField::DependentCount,
                ..
            })
        ));
    }

    #[test]
    fn validate_reports_first_failing_field() {
        let result = raw(-1.0, -1.0, 2.5, None).validate();

        assert_eq!(
            result,
            Err(ValidationError::Negative(InputField::TaxableIncome))
        );
    }

    #[test]
    fn validate_accepts_negative_zero() {
        let input = raw(-0.0, 0.0, 0.0, None).validate().unwrap();

        assert!(input.taxable_income().is_zero());
    }

    // =========================================================================
    // IrrfInput::new tests
    // =========================================================================

    #[test]
    fn new_rejects_negative_contribution() {
        let result = IrrfInput::new(dec!(100), dec!(-5), 0, dec!(0));

        assert_eq!(
            result,
            Err(ValidationError::Negative(
                InputField::OfficialPensionContribution
            ))
        );
    }

    #[test]
    fn new_accepts_zero_everything() {
        let input = IrrfInput::new(dec!(0), dec!(0), 0, dec!(0)).unwrap();

        assert_eq!(input.taxable_income(), dec!(0));
    }

    // =========================================================================
    // message tests
    // =========================================================================

    #[test]
    fn error_messages_name_the_field() {
        assert_eq!(
            ValidationError::NotInteger(InputField::DependentCount).to_string(),
            "dependent_count must be a whole number"
        );
        assert_eq!(
            ValidationError::Missing(InputField::TaxableIncome).to_string(),
            "taxable_income is required"
        );
        assert_eq!(
            ValidationError::NotANumber(InputField::Alimony).to_string(),
            "alimony must be a number"
        );
    }
}
