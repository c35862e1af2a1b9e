use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A named value consulted by a [`CalculationStep`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepInput {
    pub name: String,
    pub value: Decimal,
}

impl StepInput {
    pub fn new(
        name: impl Into<String>,
        value: Decimal,
    ) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Outcome of a single step: a plain amount, or the rate and table
/// deduction picked during bracket selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StepResult {
    Amount(Decimal),
    Bracket {
        rate: Decimal,
        table_deduction: Decimal,
    },
}

/// One audited step of the withholding computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationStep {
    /// 1-based position in the trace.
    pub position: usize,
    pub title: String,
    pub description: String,
    pub formula: String,
    pub inputs: Vec<StepInput>,
    /// `None` when the step produces nothing for this input, e.g. the final
    /// tax above the PL 1087/25 phase-out ceiling.
    pub result: Option<StepResult>,
}
