mod bracket;
mod constants;
mod input;
mod result;
mod trace;

pub use bracket::{BracketRow, BracketTable, BracketTableError, IrrfBracket, MONTHLY_TABLE};
pub use constants::IrrfConstants;
pub use input::{InputField, IrrfInput, MAX_AMOUNT, RawIrrfInput, ValidationError};
pub use result::{DeductionBasis, IrrfResult, TransitionalReduction};
pub use trace::{CalculationStep, StepInput, StepResult};
