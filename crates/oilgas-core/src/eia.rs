//! Loaders for the EIA state-level monthly production extracts.
//!
//! The source files are wide: one `Month` column plus one column per state,
//! whose header embeds the state name and the metric phrase, e.g.
//! `"West Virginia Crude Oil (Thousand Barrels per Day)  thousand barrels per day"`.
//! Both measures arrive as daily rates and are converted to monthly volumes:
//!
//! * oil: thousand barrels/day -> barrels/month (`kbpd * 1000 * days_in_month`)
//! * gas: million cubic feet/day -> thousand cubic feet/month (same factor)

use std::collections::BTreeMap;
use std::io::Cursor;
use std::path::Path;

use chrono::{Datelike, NaiveDate};
use polars::prelude::*;

use crate::error::{EtlError, Result};
use crate::transform::{days_in_month, month_first_day};

/// EIA aggregate labels that are not states and never load into the fact
/// table.
pub const EXCLUDE_AGGREGATES: &[&str] = &[
    "U.S.",
    "Federal Offshore Gulf of America",
    "Federal Offshore Pacific",
    "Other States",
];

/// Everything from the first metric keyword onward is stripped from a column
/// header to recover the state name.
const METRIC_KEYWORDS: &[&str] = &["Crude Oil", "Natural Gas"];

const DATE_COLUMN: &str = "Month";

/// One observation of a single measure, tidy form.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasureRecord {
    pub period_month: NaiveDate,
    pub state_name: String,
    /// Monthly volume; `None` whenever the source daily rate was null.
    pub volume: Option<f64>,
}

/// Oil and gas merged on (state, month) with outer-join semantics.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductionRecord {
    pub period_month: NaiveDate,
    pub state_name: String,
    pub oil_bbl: Option<f64>,
    pub gas_mcf: Option<f64>,
}

/// Load the crude oil extract as monthly barrels.
pub fn load_crude_oil(path: &Path, include_states: Option<&[String]>) -> Result<Vec<MeasureRecord>> {
    load_measure(path, include_states, "EIA crude oil extract")
}

/// Load the natural gas extract as monthly thousand cubic feet.
pub fn load_natural_gas(
    path: &Path,
    include_states: Option<&[String]>,
) -> Result<Vec<MeasureRecord>> {
    load_measure(path, include_states, "EIA natural gas extract")
}

/// Load both extracts and merge them one-to-one on (state, month).
pub fn load_production(
    oil_path: &Path,
    gas_path: &Path,
    include_states: Option<&[String]>,
) -> Result<Vec<ProductionRecord>> {
    let oil = load_crude_oil(oil_path, include_states)?;
    let gas = load_natural_gas(gas_path, include_states)?;
    merge_measures(oil, gas)
}

/// Outer-join two single-measure tables on (state, month). A key present on
/// only one side yields a row with the other measure null; duplicate keys on
/// either side are fatal.
pub fn merge_measures(
    oil: Vec<MeasureRecord>,
    gas: Vec<MeasureRecord>,
) -> Result<Vec<ProductionRecord>> {
    let oil_map = index_one_to_one(oil, "oil")?;
    let gas_map = index_one_to_one(gas, "gas")?;

    let mut merged: BTreeMap<(String, NaiveDate), ProductionRecord> = BTreeMap::new();
    for ((state_name, period_month), volume) in oil_map {
        merged.insert(
            (state_name.clone(), period_month),
            ProductionRecord {
                period_month,
                state_name,
                oil_bbl: volume,
                gas_mcf: None,
            },
        );
    }
    for ((state_name, period_month), volume) in gas_map {
        merged
            .entry((state_name.clone(), period_month))
            .or_insert_with(|| ProductionRecord {
                period_month,
                state_name,
                oil_bbl: None,
                gas_mcf: None,
            })
            .gas_mcf = volume;
    }

    // BTreeMap iteration keeps the output sorted by (state, month) ascending.
    Ok(merged.into_values().collect())
}

fn index_one_to_one(
    records: Vec<MeasureRecord>,
    side: &'static str,
) -> Result<BTreeMap<(String, NaiveDate), Option<f64>>> {
    let mut map = BTreeMap::new();
    let mut duplicates = Vec::new();
    for record in records {
        let key = (record.state_name, record.period_month);
        if map.insert(key.clone(), record.volume).is_some() {
            duplicates.push(format!("{} {}", key.0, key.1));
        }
    }
    if !duplicates.is_empty() {
        duplicates.sort();
        duplicates.dedup();
        return Err(EtlError::DuplicateKeys {
            side,
            keys: duplicates,
        });
    }
    Ok(map)
}

fn load_measure(
    path: &Path,
    include_states: Option<&[String]>,
    input_label: &str,
) -> Result<Vec<MeasureRecord>> {
    let df = read_wide_csv(path)?;
    if df.column(DATE_COLUMN).is_err() {
        return Err(EtlError::MissingColumn {
            input: input_label.to_string(),
            column: DATE_COLUMN.to_string(),
        });
    }

    let months = df
        .column(DATE_COLUMN)?
        .as_materialized_series()
        .cast(&DataType::String)?;
    let months = months.str()?;
    let mut periods = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        let raw = months
            .get(idx)
            .ok_or_else(|| EtlError::DateParse(format!("<null {DATE_COLUMN} row {idx}>")))?;
        periods.push(month_first_day(raw)?);
    }

    let mut records = Vec::new();
    for column in df.get_columns() {
        if column.name().as_str() == DATE_COLUMN {
            continue;
        }
        let state_name = extract_state_name(column.name().as_str());
        if !keep_state(&state_name, include_states) {
            continue;
        }

        // Non-strict cast: unparseable cells degrade to null, never abort.
        let rates = column.as_materialized_series().cast(&DataType::Float64)?;
        let rates = rates.f64()?;
        for (idx, period) in periods.iter().enumerate() {
            let volume = rates.get(idx).map(|daily_rate| {
                daily_rate * 1_000.0 * f64::from(days_in_month(period.year(), period.month()))
            });
            records.push(MeasureRecord {
                period_month: *period,
                state_name: state_name.clone(),
                volume,
            });
        }
    }

    records.sort_by(|a, b| {
        (a.state_name.as_str(), a.period_month).cmp(&(b.state_name.as_str(), b.period_month))
    });
    Ok(records)
}

fn read_wide_csv(path: &Path) -> Result<DataFrame> {
    let is_csv = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        .unwrap_or(false);
    if !is_csv {
        return Err(EtlError::UnsupportedFormat(format!(
            "{} (expected a .csv extract)",
            path.display()
        )));
    }

    let contents = std::fs::read(path)?;
    let mut df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(500))
        .into_reader_with_file_handle(Cursor::new(contents))
        .finish()?;

    let trimmed: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| name.as_str().trim().to_string())
        .collect();
    df.set_column_names(trimmed.iter().map(|name| name.as_str()))?;
    Ok(df)
}

/// Strip everything from the first metric keyword onward; headers with no
/// keyword pass through whole and fall to the state filter.
fn extract_state_name(header: &str) -> String {
    let cut = METRIC_KEYWORDS
        .iter()
        .filter_map(|keyword| header.find(keyword))
        .min()
        .unwrap_or(header.len());
    header[..cut].trim().to_string()
}

/// Allow-list membership when one is configured, otherwise anything that is
/// not a known aggregate label.
fn keep_state(state_name: &str, include_states: Option<&[String]>) -> bool {
    match include_states {
        Some(allow) => allow.iter().any(|name| name == state_name),
        None => !EXCLUDE_AGGREGATES.contains(&state_name),
    }
}
