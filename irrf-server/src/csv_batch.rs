//! CSV batch calculation and bracket table export.
//!
//! ## Input format
//!
//! Headers are matched by name; column order does not matter.
//!
//! | Column                          | Required | Notes |
//! |---------------------------------|----------|-------|
//! | `taxable_income`                | yes      | e.g. `5000.00` |
//! | `official_pension_contribution` | yes      | |
//! | `dependent_count`               | yes      | whole number |
//! | `alimony`                       | no       | leave empty or omit for 0 |
//!
//! ```csv
//! taxable_income,official_pension_contribution,dependent_count,alimony
//! 5000.00,750.00,2,
//! 8000.00,0,0,350.00
//! ```
//!
//! ## Output format
//!
//! One row per input row, in file order. Rows that fail validation keep
//! their position and carry the message in the `error` column.

use std::io::{Read, Write};

use irrf_core::{BracketTable, DeductionBasis, IrrfResult, IrrfWorksheet, RawIrrfInput};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum CsvBatchError {
    /// Structurally invalid CSV, a missing required column, or a cell that
    /// is not a number.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("cannot write output: {0}")]
    Io(#[from] std::io::Error),
}

/// One output row of a batch run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchRow {
    /// 1-based data row number (the header is row 0).
    pub row: usize,
    pub taxable_income: String,
    pub deduction_method: String,
    pub applied_deduction: String,
    pub net_taxable_base: String,
    pub rate: String,
    pub table_deduction: String,
    pub tax_before_reduction: String,
    pub reduction: String,
    pub final_tax: String,
    pub error: String,
}

fn money(value: Decimal) -> String {
    format!("{value:.2}")
}

impl BatchRow {
    fn from_result(
        row: usize,
        input: &RawIrrfInput,
        result: &IrrfResult,
    ) -> Self {
        let deduction_method = match result.deduction {
            DeductionBasis::Itemized { .. } => "itemized",
            DeductionBasis::Simplified { .. } => "simplified",
        };
        Self {
            row,
            taxable_income: format!("{:.2}", input.taxable_income),
            deduction_method: deduction_method.to_string(),
            applied_deduction: money(result.applied_deduction),
            net_taxable_base: money(result.net_taxable_base),
            rate: result.rate.normalize().to_string(),
            table_deduction: money(result.table_deduction),
            tax_before_reduction: money(result.tax_before_reduction),
            reduction: result.reduction.reduction().map(money).unwrap_or_default(),
            final_tax: result.reduction.final_tax().map(money).unwrap_or_default(),
            error: String::new(),
        }
    }

    fn from_error(
        row: usize,
        input: &RawIrrfInput,
        error: String,
    ) -> Self {
        Self {
            row,
            taxable_income: format!("{:.2}", input.taxable_income),
            deduction_method: String::new(),
            applied_deduction: String::new(),
            net_taxable_base: String::new(),
            rate: String::new(),
            table_deduction: String::new(),
            tax_before_reduction: String::new(),
            reduction: String::new(),
            final_tax: String::new(),
            error,
        }
    }
}

/// Reads input rows from `reader` and calculates each one.
///
/// # Errors
///
/// Returns [`CsvBatchError::Csv`] if the CSV itself cannot be read. Per-row
/// validation failures do not abort the batch.
pub fn calculate_batch<R: Read>(
    worksheet: &IrrfWorksheet<'_>,
    reader: R,
) -> Result<Vec<BatchRow>, CsvBatchError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut rows = Vec::new();
    for (index, record) in csv_reader.deserialize::<RawIrrfInput>().enumerate() {
        let row = index + 1;
        let raw = record?;
        let batch_row = match raw.validate() {
            Ok(input) => BatchRow::from_result(row, &raw, &worksheet.calculate(&input)),
            Err(err) => {
                warn!(row, error = %err, "skipping invalid batch row");
                BatchRow::from_error(row, &raw, err.to_string())
            }
        };
        rows.push(batch_row);
    }

    debug!(rows = rows.len(), "batch calculated");
    Ok(rows)
}

/// Writes batch rows as CSV, header first.
pub fn write_batch<W: Write>(
    rows: &[BatchRow],
    writer: W,
) -> Result<(), CsvBatchError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

#[derive(Debug, Serialize)]
struct BracketCsvRow {
    position: usize,
    range: String,
    rate: String,
    table_deduction: String,
}

/// Writes the bracket table as CSV: position, range, rate (percent) and
/// table deduction.
pub fn write_brackets<W: Write>(
    table: &BracketTable,
    writer: W,
) -> Result<(), CsvBatchError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in table.rows() {
        csv_writer.serialize(BracketCsvRow {
            position: row.position,
            range: row.range,
            rate: row.rate.normalize().to_string(),
            table_deduction: money(row.table_deduction),
        })?;
    }
    csv_writer.flush()?;
    Ok(())
}
