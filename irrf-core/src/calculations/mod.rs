//! Withholding calculation logic.
//!
//! [`IrrfWorksheet`] runs the monthly IRRF computation; [`common`] holds the
//! rounding helpers shared by every step.

pub mod common;
pub mod irrf;

pub use irrf::IrrfWorksheet;
