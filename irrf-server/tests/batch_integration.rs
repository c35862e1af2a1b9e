//! Batch calculation against an on-disk fixture file.

use std::{fs::File, path::PathBuf};

use irrf_core::IrrfWorksheet;
use irrf_server::csv_batch;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("sample_payroll.csv")
}

/// Parses a money cell back into a decimal.
fn amount(cell: &str) -> Decimal {
    cell.parse().expect("money cell should be a decimal")
}

fn load_fixture() -> Vec<csv_batch::BatchRow> {
    let file = File::open(fixture_path()).expect("fixture file should open");
    csv_batch::calculate_batch(&IrrfWorksheet::default(), file)
        .expect("fixture file should parse")
}

#[test]
fn test_fixture_yields_one_row_per_record() {
    let rows = load_fixture();

    assert_eq!(rows.len(), 4);
    assert_eq!(
        rows.iter().map(|r| r.row).collect::<Vec<_>>(),
        vec![1, 2, 3, 4]
    );
}

#[test]
fn test_fixture_phase_out_row() {
    let rows = load_fixture();
    let row = &rows[1];

    assert_eq!(row.deduction_method, "simplified");
    assert_eq!(amount(&row.net_taxable_base), dec!(5392.80));
    assert_eq!(amount(&row.rate), dec!(27.5));
    assert_eq!(amount(&row.tax_before_reduction), dec!(574.29));
    assert_eq!(amount(&row.reduction), dec!(179.75));
    assert_eq!(amount(&row.final_tax), dec!(394.54));
}

#[test]
fn test_fixture_alimony_row_uses_simplified_minimum() {
    let rows = load_fixture();
    let row = &rows[2];

    // 350.00 of alimony is below the 607.20 simplified deduction.
    assert_eq!(row.deduction_method, "simplified");
    assert_eq!(amount(&row.applied_deduction), dec!(607.20));
    assert_eq!(amount(&row.tax_before_reduction), dec!(1124.29));
    assert_eq!(row.final_tax, "");
}

#[test]
fn test_fixture_invalid_row_carries_error() {
    let rows = load_fixture();
    let row = &rows[3];

    assert_eq!(row.taxable_income, "-1.00");
    assert_eq!(row.error, "taxable_income must not be negative");
    assert_eq!(row.final_tax, "");
}

#[test]
fn test_written_batch_round_trips_through_csv_reader() {
    let rows = load_fixture();
    let mut out = Vec::new();
    csv_batch::write_batch(&rows, &mut out).unwrap();

    let mut reader = csv::Reader::from_reader(out.as_slice());
    let headers = reader.headers().unwrap().clone();
    let records: Vec<_> = reader.records().map(Result::unwrap).collect();

    assert_eq!(&headers[0], "row");
    assert_eq!(&headers[10], "error");
    assert_eq!(records.len(), 4);
    assert_eq!(amount(&records[0][9]), dec!(0.00));
}
