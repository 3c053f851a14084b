use std::path::PathBuf;

use chrono::NaiveDate;
use tempfile::TempDir;

use oilgas_core::eia::{load_crude_oil, load_production, merge_measures, MeasureRecord};
use oilgas_core::error::EtlError;

const OIL_WIDE: &str = "\
Month,New York Crude Oil (Thousand Barrels per Day)  thousand barrels per day,Pennsylvania Crude Oil (Thousand Barrels per Day)  thousand barrels per day,U.S. Crude Oil (Thousand Barrels per Day)  thousand barrels per day
Jan-2024,10.0,5.5,700.0
Feb-2024,,6.0,710.0
";

const GAS_WIDE: &str = "\
Month,New York Natural Gas Gross Withdrawals (Million Cubic Feet per Day)  million cubic feet per day
Jan-2024,2.5
";

fn write_fixture(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).expect("failed to write fixture");
    path
}

fn date(y: i32, m: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, 1).unwrap()
}

#[test]
fn oil_loader_melts_converts_and_sorts() {
    let dir = TempDir::new().unwrap();
    let path = write_fixture(&dir, "oil.csv", OIL_WIDE);

    let records = load_crude_oil(&path, None).expect("load failed");

    // U.S. aggregate excluded; output sorted by (state, month) ascending.
    let keys: Vec<(&str, NaiveDate)> = records
        .iter()
        .map(|r| (r.state_name.as_str(), r.period_month))
        .collect();
    assert_eq!(
        keys,
        vec![
            ("New York", date(2024, 1)),
            ("New York", date(2024, 2)),
            ("Pennsylvania", date(2024, 1)),
            ("Pennsylvania", date(2024, 2)),
        ]
    );

    // 10 kbpd over a 31-day month -> 310,000 barrels.
    assert_eq!(records[0].volume, Some(310_000.0));
    // Null daily rate stays null, never zero.
    assert_eq!(records[1].volume, None);
    // Leap-year February: 6 kbpd * 29 days.
    assert_eq!(records[3].volume, Some(174_000.0));
}

#[test]
fn allow_list_restricts_states() {
    let dir = TempDir::new().unwrap();
    let path = write_fixture(&dir, "oil.csv", OIL_WIDE);

    let include = vec!["New York".to_string()];
    let records = load_crude_oil(&path, Some(&include)).expect("load failed");

    assert!(records.iter().all(|r| r.state_name == "New York"));
    assert_eq!(records.len(), 2);
}

#[test]
fn missing_month_column_is_fatal() {
    let dir = TempDir::new().unwrap();
    let path = write_fixture(
        &dir,
        "oil.csv",
        "Date,New York Crude Oil (Thousand Barrels per Day)\n2024-01-01,10.0\n",
    );

    let err = load_crude_oil(&path, None).unwrap_err();
    assert!(matches!(err, EtlError::MissingColumn { ref column, .. } if column == "Month"));
}

#[test]
fn non_csv_extension_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_fixture(&dir, "oil.xlsx", "not really a spreadsheet");

    let err = load_crude_oil(&path, None).unwrap_err();
    assert!(matches!(err, EtlError::UnsupportedFormat(_)));
}

#[test]
fn merge_is_outer_and_one_to_one() {
    let dir = TempDir::new().unwrap();
    let oil_path = write_fixture(&dir, "oil.csv", OIL_WIDE);
    let gas_path = write_fixture(&dir, "gas.csv", GAS_WIDE);

    let merged = load_production(&oil_path, &gas_path, None).expect("merge failed");
    assert_eq!(merged.len(), 4);

    let ny_jan = merged
        .iter()
        .find(|r| r.state_name == "New York" && r.period_month == date(2024, 1))
        .unwrap();
    assert_eq!(ny_jan.oil_bbl, Some(310_000.0));
    // 2.5 MMcf/d * 1000 * 31 days.
    assert_eq!(ny_jan.gas_mcf, Some(77_500.0));

    // Keys missing from the gas side survive with gas null, not dropped.
    let pa_jan = merged
        .iter()
        .find(|r| r.state_name == "Pennsylvania" && r.period_month == date(2024, 1))
        .unwrap();
    assert_eq!(pa_jan.oil_bbl, Some(170_500.0));
    assert_eq!(pa_jan.gas_mcf, None);
}

#[test]
fn gas_only_keys_survive_the_merge() {
    let gas = vec![MeasureRecord {
        period_month: date(2024, 3),
        state_name: "Ohio".to_string(),
        volume: Some(42.0),
    }];
    let merged = merge_measures(Vec::new(), gas).expect("merge failed");

    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].oil_bbl, None);
    assert_eq!(merged[0].gas_mcf, Some(42.0));
}

#[test]
fn duplicate_keys_abort_the_merge() {
    let dupe = MeasureRecord {
        period_month: date(2024, 1),
        state_name: "New York".to_string(),
        volume: Some(1.0),
    };
    let err = merge_measures(vec![dupe.clone(), dupe], Vec::new()).unwrap_err();
    assert!(matches!(err, EtlError::DuplicateKeys { side: "oil", .. }));
}
