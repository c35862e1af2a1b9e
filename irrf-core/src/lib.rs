//! Brazilian monthly withholding income tax (IRRF).
//!
//! Validate raw input with [`RawIrrfInput::validate`], then run it through an
//! [`IrrfWorksheet`](calculations::IrrfWorksheet).

pub mod calculations;
pub mod models;

pub use calculations::IrrfWorksheet;
pub use models::*;
