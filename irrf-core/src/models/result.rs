use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::CalculationStep;

/// How the applied deduction was obtained.
///
/// The itemized figures are only reported when they were actually used;
/// otherwise the single simplified amount replaces them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "deduction_method", rename_all = "snake_case")]
pub enum DeductionBasis {
    Itemized {
        official_pension_contribution: Decimal,
        dependent_count: u32,
        alimony: Decimal,
        dependents_deduction: Decimal,
    },
    Simplified {
        simplified_deduction: Decimal,
    },
}

/// Outcome of the PL 1087/25 transitional reduction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "transitional_reduction", rename_all = "snake_case")]
pub enum TransitionalReduction {
    /// Taxable income is within the reduction range.
    Applied { reduction: Decimal, final_tax: Decimal },
    /// Taxable income is above the phase-out ceiling; only the message is
    /// reported.
    NotApplicable { message: String },
}

impl TransitionalReduction {
    pub fn final_tax(&self) -> Option<Decimal> {
        match self {
            Self::Applied { final_tax, .. } => Some(*final_tax),
            Self::NotApplicable { .. } => None,
        }
    }

    pub fn reduction(&self) -> Option<Decimal> {
        match self {
            Self::Applied { reduction, .. } => Some(*reduction),
            Self::NotApplicable { .. } => None,
        }
    }
}

/// Result of a monthly withholding calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IrrfResult {
    #[serde(flatten)]
    pub deduction: DeductionBasis,

    /// Contribution plus dependents deduction plus alimony.
    pub total_legal_deductions: Decimal,

    /// The larger of `total_legal_deductions` and the simplified minimum.
    pub applied_deduction: Decimal,

    pub used_simplified_deduction: bool,

    /// Taxable income minus the applied deduction. May be negative.
    pub net_taxable_base: Decimal,

    /// Rate in percent of the selected bracket.
    pub rate: Decimal,

    pub table_deduction: Decimal,

    pub tax_before_reduction: Decimal,

    #[serde(flatten)]
    pub reduction: TransitionalReduction,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<Vec<CalculationStep>>,
}
