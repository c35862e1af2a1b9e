//! Monthly withholding (IRRF) calculation.
//!
//! The computation runs as a fixed sequence of steps, each rounded to cents
//! as soon as it is produced:
//!
//! | Step | Description |
//! |------|-------------|
//! | 1    | Dependents deduction (dependent count × 189.59) |
//! | 2    | Total legal deductions (contribution + dependents deduction + alimony) |
//! | 3    | Applied deduction (larger of step 2 and the simplified 607.20) |
//! | 4    | Net taxable base (taxable income − step 3) |
//! | 5    | Bracket selection (first bracket whose limit ≥ step 4) |
//! | 6    | Tax before reduction (step 4 × rate − table deduction, minimum 0) |
//! | 7    | PL 1087/25 candidate reduction, based on taxable income |
//! | 8    | PL 1087/25 applied reduction (step 7 clamped to `0..=step 6`) |
//! | 9    | Final tax (step 6 − step 8), only up to 7350.00 of taxable income |
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use irrf_core::calculations::IrrfWorksheet;
//! use irrf_core::{IrrfInput, TransitionalReduction};
//!
//! let input = IrrfInput::new(dec!(6000.00), dec!(0), 0, dec!(0)).unwrap();
//! let result = IrrfWorksheet::default().calculate(&input);
//!
//! assert_eq!(result.net_taxable_base, dec!(5392.80));
//! assert_eq!(result.tax_before_reduction, dec!(574.29));
//! assert_eq!(
//!     result.reduction,
//!     TransitionalReduction::Applied {
//!         reduction: dec!(179.75),
//!         final_tax: dec!(394.54),
//!     }
//! );
//! ```

use rust_decimal::Decimal;
use tracing::debug;

use crate::calculations::common::{clamp, max, round_half_up};
use crate::models::{
    BracketTable, CalculationStep, DeductionBasis, IrrfBracket, IrrfConstants, IrrfInput,
    IrrfResult, MONTHLY_TABLE, StepInput, StepResult, TransitionalReduction,
};

/// Which PL 1087/25 rule produced the candidate reduction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReductionBranch {
    /// Taxable income up to the full-exemption ceiling.
    Full,
    /// Taxable income inside the phase-out range.
    PhaseOut,
    /// Taxable income above the phase-out ceiling.
    NotApplicable,
}

/// Every intermediate value of one calculation.
#[derive(Debug, Clone, Copy)]
struct Computation {
    dependents_deduction: Decimal,
    alimony: Decimal,
    total_legal_deductions: Decimal,
    applied_deduction: Decimal,
    used_simplified_deduction: bool,
    net_taxable_base: Decimal,
    bracket: IrrfBracket,
    tax_before_reduction: Decimal,
    branch: ReductionBranch,
    candidate_reduction: Decimal,
    final_reduction: Decimal,
    final_tax: Decimal,
}

/// Calculator for the monthly withholding tax.
///
/// Borrows a bracket table and a set of constants; both are read-only, so a
/// worksheet can be shared freely between threads.
#[derive(Debug, Clone, Copy)]
pub struct IrrfWorksheet<'a> {
    table: &'a BracketTable,
    constants: &'a IrrfConstants,
}

impl Default for IrrfWorksheet<'static> {
    /// A worksheet over [`MONTHLY_TABLE`] and [`IrrfConstants::DEFAULT`].
    fn default() -> Self {
        Self::new(&MONTHLY_TABLE, &IrrfConstants::DEFAULT)
    }
}

impl<'a> IrrfWorksheet<'a> {
    pub fn new(
        table: &'a BracketTable,
        constants: &'a IrrfConstants,
    ) -> Self {
        Self { table, constants }
    }

    pub fn table(&self) -> &'a BracketTable {
        self.table
    }

    /// Calculates the withholding tax without a step trace.
    pub fn calculate(
        &self,
        input: &IrrfInput,
    ) -> IrrfResult {
        let computation = self.compute(input);
        self.result(input, &computation, None)
    }

    /// Calculates the withholding tax and attaches the nine-step trace.
    pub fn calculate_with_trace(
        &self,
        input: &IrrfInput,
    ) -> IrrfResult {
        let computation = self.compute(input);
        let trace = self.trace(input, &computation);
        self.result(input, &computation, Some(trace))
    }

    fn compute(
        &self,
        input: &IrrfInput,
    ) -> Computation {
        let dependents_deduction = self.dependents_deduction(input.dependent_count());
        let alimony = round_half_up(input.alimony());
        let total_legal_deductions = self.total_legal_deductions(
            input.official_pension_contribution(),
            dependents_deduction,
            alimony,
        );
        let (applied_deduction, used_simplified_deduction) =
            self.applied_deduction(total_legal_deductions);
        let net_taxable_base = self.net_taxable_base(input.taxable_income(), applied_deduction);
        let bracket = *self.table.select(net_taxable_base);
        let tax_before_reduction = self.tax_before_reduction(net_taxable_base, &bracket);
        let (candidate_reduction, branch) =
            self.candidate_reduction(input.taxable_income(), tax_before_reduction);
        let final_reduction = self.final_reduction(candidate_reduction, tax_before_reduction);
        let final_tax = self.final_tax(tax_before_reduction, final_reduction);

        debug!(
            taxable_income = %input.taxable_income(),
            %net_taxable_base,
            rate = %bracket.rate,
            %tax_before_reduction,
            %final_reduction,
            ?branch,
            "computed monthly withholding"
        );

        Computation {
            dependents_deduction,
            alimony,
            total_legal_deductions,
            applied_deduction,
            used_simplified_deduction,
            net_taxable_base,
            bracket,
            tax_before_reduction,
            branch,
            candidate_reduction,
            final_reduction,
            final_tax,
        }
    }

    fn result(
        &self,
        input: &IrrfInput,
        c: &Computation,
        trace: Option<Vec<CalculationStep>>,
    ) -> IrrfResult {
        let deduction = if c.used_simplified_deduction {
            DeductionBasis::Simplified {
                simplified_deduction: self.constants.simplified_deduction,
            }
        } else {
            DeductionBasis::Itemized {
                official_pension_contribution: input.official_pension_contribution(),
                dependent_count: input.dependent_count(),
                alimony: c.alimony,
                dependents_deduction: c.dependents_deduction,
            }
        };

        let reduction = match c.branch {
            ReductionBranch::NotApplicable => TransitionalReduction::NotApplicable {
                message: self.constants.reduction_not_applicable_message(),
            },
            ReductionBranch::Full | ReductionBranch::PhaseOut => TransitionalReduction::Applied {
                reduction: c.final_reduction,
                final_tax: c.final_tax,
            },
        };

        IrrfResult {
            deduction,
            total_legal_deductions: c.total_legal_deductions,
            applied_deduction: c.applied_deduction,
            used_simplified_deduction: c.used_simplified_deduction,
            net_taxable_base: c.net_taxable_base,
            rate: c.bracket.rate,
            table_deduction: c.bracket.table_deduction,
            tax_before_reduction: c.tax_before_reduction,
            reduction,
            trace,
        }
    }

    /// Step 1.
    fn dependents_deduction(
        &self,
        dependent_count: u32,
    ) -> Decimal {
        round_half_up(Decimal::from(dependent_count) * self.constants.dependent_deduction)
    }

    /// Step 2. `alimony` is expected to be rounded already; the sum is
    /// rounded again.
    fn total_legal_deductions(
        &self,
        contribution: Decimal,
        dependents_deduction: Decimal,
        alimony: Decimal,
    ) -> Decimal {
        round_half_up(contribution + dependents_deduction + alimony)
    }

    /// Step 3. Returns the applied deduction and whether the simplified
    /// minimum replaced the itemized sum.
    fn applied_deduction(
        &self,
        total_legal_deductions: Decimal,
    ) -> (Decimal, bool) {
        let minimum = self.constants.simplified_deduction;
        (
            max(total_legal_deductions, minimum),
            minimum > total_legal_deductions,
        )
    }

    /// Step 4. Not clamped at zero.
    fn net_taxable_base(
        &self,
        taxable_income: Decimal,
        applied_deduction: Decimal,
    ) -> Decimal {
        round_half_up(taxable_income - applied_deduction)
    }

    /// Step 6.
    fn tax_before_reduction(
        &self,
        net_taxable_base: Decimal,
        bracket: &IrrfBracket,
    ) -> Decimal {
        let raw = net_taxable_base * (bracket.rate / Decimal::ONE_HUNDRED) - bracket.table_deduction;
        round_half_up(max(raw, Decimal::ZERO))
    }

    /// Step 7. The branch depends on taxable income, not on the net base.
    fn candidate_reduction(
        &self,
        taxable_income: Decimal,
        tax_before_reduction: Decimal,
    ) -> (Decimal, ReductionBranch) {
        let k = self.constants;
        let (candidate, branch) = if taxable_income <= k.reduction_full_ceiling {
            (
                tax_before_reduction.min(k.reduction_cap),
                ReductionBranch::Full,
            )
        } else if taxable_income <= k.reduction_phase_out_ceiling {
            (
                round_half_up(
                    k.reduction_phase_out_intercept - k.reduction_phase_out_slope * taxable_income,
                ),
                ReductionBranch::PhaseOut,
            )
        } else {
            (Decimal::ZERO, ReductionBranch::NotApplicable)
        };

        if tax_before_reduction.is_zero() {
            (Decimal::ZERO, branch)
        } else {
            (candidate, branch)
        }
    }

    /// Step 8.
    fn final_reduction(
        &self,
        candidate: Decimal,
        tax_before_reduction: Decimal,
    ) -> Decimal {
        round_half_up(clamp(candidate, Decimal::ZERO, tax_before_reduction))
    }

    /// Step 9.
    fn final_tax(
        &self,
        tax_before_reduction: Decimal,
        final_reduction: Decimal,
    ) -> Decimal {
        round_half_up(tax_before_reduction - final_reduction)
    }

    fn trace(
        &self,
        input: &IrrfInput,
        c: &Computation,
    ) -> Vec<CalculationStep> {
        let k = self.constants;
        let amount = |value: Decimal| Some(StepResult::Amount(value));

        let applied_description = if c.used_simplified_deduction {
            format!(
                "The simplified deduction of {:.2} is larger than the legal deductions and replaces them.",
                k.simplified_deduction
            )
        } else {
            "The legal deductions exceed the simplified deduction and are used as itemized."
                .to_string()
        };

        let reduction_description = match c.branch {
            ReductionBranch::Full => format!(
                "Taxable income up to {:.2}: the reduction covers the tax, up to {:.2}.",
                k.reduction_full_ceiling, k.reduction_cap
            ),
            ReductionBranch::PhaseOut => format!(
                "Taxable income between {:.2} and {:.2}: the reduction phases out linearly.",
                k.reduction_full_ceiling, k.reduction_phase_out_ceiling
            ),
            ReductionBranch::NotApplicable => k.reduction_not_applicable_message(),
        };
        let reduction_formula = match c.branch {
            ReductionBranch::Full => format!("min(tax before reduction, {:.2})", k.reduction_cap),
            ReductionBranch::PhaseOut => format!(
                "{:.2} - {} × taxable income",
                k.reduction_phase_out_intercept, k.reduction_phase_out_slope
            ),
            ReductionBranch::NotApplicable => "0".to_string(),
        };

        let (final_description, final_result) = match c.branch {
            ReductionBranch::NotApplicable => (k.reduction_not_applicable_message(), None),
            ReductionBranch::Full | ReductionBranch::PhaseOut => (
                "Tax due after the transitional reduction.".to_string(),
                amount(c.final_tax),
            ),
        };

        vec![
            CalculationStep {
                position: 1,
                title: "Dependents deduction".to_string(),
                description: format!(
                    "Each dependent reduces the base by {:.2}.",
                    k.dependent_deduction
                ),
                formula: "dependent count × dependent deduction".to_string(),
                inputs: vec![
                    StepInput::new("dependent_count", Decimal::from(input.dependent_count())),
                    StepInput::new("dependent_deduction", k.dependent_deduction),
                ],
                result: amount(c.dependents_deduction),
            },
            CalculationStep {
                position: 2,
                title: "Total legal deductions".to_string(),
                description: "Official pension contribution, dependents deduction and alimony."
                    .to_string(),
                formula: "contribution + dependents deduction + alimony".to_string(),
                inputs: vec![
                    StepInput::new(
                        "official_pension_contribution",
                        input.official_pension_contribution(),
                    ),
                    StepInput::new("dependents_deduction", c.dependents_deduction),
                    StepInput::new("alimony", c.alimony),
                ],
                result: amount(c.total_legal_deductions),
            },
            CalculationStep {
                position: 3,
                title: "Applied deduction".to_string(),
                description: applied_description,
                formula: "max(total legal deductions, simplified deduction)".to_string(),
                inputs: vec![
                    StepInput::new("total_legal_deductions", c.total_legal_deductions),
                    StepInput::new("simplified_deduction", k.simplified_deduction),
                ],
                result: amount(c.applied_deduction),
            },
            CalculationStep {
                position: 4,
                title: "Net taxable base".to_string(),
                description: "Taxable income minus the applied deduction.".to_string(),
                formula: "taxable income - applied deduction".to_string(),
                inputs: vec![
                    StepInput::new("taxable_income", input.taxable_income()),
                    StepInput::new("applied_deduction", c.applied_deduction),
                ],
                result: amount(c.net_taxable_base),
            },
            CalculationStep {
                position: 5,
                title: "Bracket selection".to_string(),
                description: "First bracket whose upper limit is at least the net taxable base."
                    .to_string(),
                formula: "first bracket with limit ≥ net taxable base, else top bracket"
                    .to_string(),
                inputs: vec![StepInput::new("net_taxable_base", c.net_taxable_base)],
                result: Some(StepResult::Bracket {
                    rate: c.bracket.rate,
                    table_deduction: c.bracket.table_deduction,
                }),
            },
            CalculationStep {
                position: 6,
                title: "Tax before reduction".to_string(),
                description: "Bracket rate applied to the net base, minus the table deduction; never below zero."
                    .to_string(),
                formula: "max(net taxable base × rate / 100 - table deduction, 0)".to_string(),
                inputs: vec![
                    StepInput::new("net_taxable_base", c.net_taxable_base),
                    StepInput::new("rate", c.bracket.rate),
                    StepInput::new("table_deduction", c.bracket.table_deduction),
                ],
                result: amount(c.tax_before_reduction),
            },
            CalculationStep {
                position: 7,
                title: "PL 1087/25 candidate reduction".to_string(),
                description: reduction_description,
                formula: reduction_formula,
                inputs: vec![
                    StepInput::new("taxable_income", input.taxable_income()),
                    StepInput::new("tax_before_reduction", c.tax_before_reduction),
                ],
                result: amount(c.candidate_reduction),
            },
            CalculationStep {
                position: 8,
                title: "PL 1087/25 applied reduction".to_string(),
                description: "The candidate reduction is limited to the tax before reduction."
                    .to_string(),
                formula: "clamp(candidate reduction, 0, tax before reduction)".to_string(),
                inputs: vec![
                    StepInput::new("candidate_reduction", c.candidate_reduction),
                    StepInput::new("tax_before_reduction", c.tax_before_reduction),
                ],
                result: amount(c.final_reduction),
            },
            CalculationStep {
                position: 9,
                title: "Final tax".to_string(),
                description: final_description,
                formula: "tax before reduction - applied reduction".to_string(),
                inputs: vec![
                    StepInput::new("tax_before_reduction", c.tax_before_reduction),
                    StepInput::new("final_reduction", c.final_reduction),
                ],
                result: final_result,
            },
        ]
    }
}
