//! Flat snapshot files written alongside the relational load: two Parquet
//! snapshots for downstream reuse and one CSV rollup deliverable.

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use polars::io::parquet::write::{ParquetCompression, ParquetWriter, StatisticsOptions};
use polars::prelude::{DataFrame, NamedFrom, Series};

use crate::error::Result;
use crate::warehouse::{ResolvedProduction, ResolvedWell};

/// Snapshot of the resolved production table (valid states only).
pub fn write_production_snapshot(rows: &[ResolvedProduction], path: &Path) -> Result<()> {
    let periods: Vec<String> = rows.iter().map(|r| r.period_month.to_string()).collect();
    let states: Vec<&str> = rows.iter().map(|r| r.state_name.as_str()).collect();
    let oil: Vec<Option<f64>> = rows.iter().map(|r| r.oil_bbl).collect();
    let gas: Vec<Option<f64>> = rows.iter().map(|r| r.gas_mcf).collect();

    let mut df = DataFrame::new(vec![
        Series::new("period_month".into(), periods).into(),
        Series::new("state_name".into(), states).into(),
        Series::new("oil_bbl".into(), oil).into(),
        Series::new("gas_mcf".into(), gas).into(),
    ])?;
    write_parquet(&mut df, path)
}

/// Snapshot of the resolved wells, foreign keys included, as fed to the well
/// dimension. This file is also the input for the GeoJSON export.
pub fn write_wells_snapshot(wells: &[ResolvedWell], path: &Path) -> Result<()> {
    let ids: Vec<&str> = wells.iter().map(|w| w.record.source_well_id.as_str()).collect();
    let names: Vec<&str> = wells.iter().map(|w| w.record.well_name.as_str()).collect();
    let state_codes: Vec<&str> = wells.iter().map(|w| w.record.state_code.as_str()).collect();
    let counties: Vec<&str> = wells.iter().map(|w| w.record.county_name.as_str()).collect();
    let operators: Vec<&str> = wells.iter().map(|w| w.record.operator_name.as_str()).collect();
    let statuses: Vec<&str> = wells.iter().map(|w| w.record.status_desc.as_str()).collect();
    let latitudes: Vec<Option<f64>> = wells.iter().map(|w| w.record.latitude).collect();
    let longitudes: Vec<Option<f64>> = wells.iter().map(|w| w.record.longitude).collect();
    let spud_dates: Vec<Option<String>> = wells
        .iter()
        .map(|w| w.record.spud_date.map(|d| d.to_string()))
        .collect();
    let last_updated: Vec<Option<String>> = wells
        .iter()
        .map(|w| w.record.last_updated.map(|d| d.to_string()))
        .collect();
    let coord_valid: Vec<bool> = wells.iter().map(|w| w.record.coord_valid).collect();
    let state_ids: Vec<i64> = wells.iter().map(|w| w.state_id).collect();
    let county_ids: Vec<Option<i64>> = wells.iter().map(|w| w.county_id).collect();
    let operator_ids: Vec<Option<i64>> = wells.iter().map(|w| w.operator_id).collect();
    let status_ids: Vec<Option<i64>> = wells.iter().map(|w| w.status_id).collect();

    let mut df = DataFrame::new(vec![
        Series::new("source_well_id".into(), ids).into(),
        Series::new("well_name".into(), names).into(),
        Series::new("state_code".into(), state_codes).into(),
        Series::new("county_name".into(), counties).into(),
        Series::new("operator_name".into(), operators).into(),
        Series::new("status_desc".into(), statuses).into(),
        Series::new("latitude".into(), latitudes).into(),
        Series::new("longitude".into(), longitudes).into(),
        Series::new("spud_date".into(), spud_dates).into(),
        Series::new("last_updated".into(), last_updated).into(),
        Series::new("coord_valid".into(), coord_valid).into(),
        Series::new("state_id".into(), state_ids).into(),
        Series::new("county_id".into(), county_ids).into(),
        Series::new("operator_id".into(), operator_ids).into(),
        Series::new("status_id".into(), status_ids).into(),
    ])?;
    write_parquet(&mut df, path)
}

/// Valid-coordinate well counts per county, descending by count (county name
/// ascending breaks ties so the file is deterministic).
pub fn write_wells_by_county(wells: &[ResolvedWell], path: &Path) -> Result<()> {
    let mut counts: HashMap<&str, u64> = HashMap::new();
    for well in wells {
        if well.record.coord_valid && !well.record.county_name.is_empty() {
            *counts.entry(well.record.county_name.as_str()).or_default() += 1;
        }
    }
    let mut rows: Vec<(&str, u64)> = counts.into_iter().collect();
    rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    ensure_parent(path)?;
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["county_name", "well_count"])?;
    for (county, count) in rows {
        writer.write_record([county, count.to_string().as_str()])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(df: &mut DataFrame, path: &Path) -> Result<()> {
    ensure_parent(path)?;
    let file = File::create(path)?;
    ParquetWriter::new(file)
        .with_compression(ParquetCompression::Zstd(None))
        .with_statistics(StatisticsOptions::default())
        .finish(df)?;
    Ok(())
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
