//! Row-wise loader for the NYSDEC well registry export.

use std::path::Path;

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::{EtlError, Result};
use crate::transform::{title_case, to_date_or_none, to_f64_or_none};

/// The registry covers a single state.
pub const HOME_STATE_CODE: &str = "NY";

const WELL_ID_COLUMN: &str = "API_WellNo";

/// Normalized well metadata. No rows are filtered here; wells without a
/// usable natural key are dropped at load time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WellRecord {
    pub source_well_id: String,
    pub well_name: String,
    pub state_code: String,
    pub county_name: String,
    pub operator_name: String,
    pub status_desc: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub spud_date: Option<NaiveDate>,
    pub last_updated: Option<NaiveDate>,
    /// True iff both coordinates are present and within WGS84 bounds.
    pub coord_valid: bool,
}

pub fn load_wells(path: &Path) -> Result<Vec<WellRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)?;
    let headers = reader.headers()?.clone();

    let position = |name: &str| headers.iter().position(|header| header.trim() == name);

    // Only the natural key column is required; everything else degrades to
    // empty when absent from the export.
    let well_id_idx = position(WELL_ID_COLUMN).ok_or_else(|| EtlError::MissingColumn {
        input: "NYSDEC well registry".to_string(),
        column: WELL_ID_COLUMN.to_string(),
    })?;
    let well_name_idx = position("Well_Name");
    let county_idx = position("County");
    let operator_idx = position("Company_name");
    let status_idx = position("GeneralWellStatus");
    let latitude_idx = position("Surface_latitude");
    let longitude_idx = position("Surface_Longitude");
    let spud_idx = position("Date_Spudded");
    let updated_idx = position("Dt_Mod");

    let mut wells = Vec::new();
    for record in reader.records() {
        let record = record?;

        let latitude = to_f64_or_none(field(&record, latitude_idx));
        let longitude = to_f64_or_none(field(&record, longitude_idx));
        let coord_valid = matches!(
            (latitude, longitude),
            (Some(lat), Some(lon))
                if (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon)
        );

        wells.push(WellRecord {
            source_well_id: record.get(well_id_idx).unwrap_or("").trim().to_string(),
            well_name: field(&record, well_name_idx).to_string(),
            state_code: HOME_STATE_CODE.to_string(),
            county_name: title_case(field(&record, county_idx)),
            operator_name: field(&record, operator_idx).to_string(),
            status_desc: field(&record, status_idx).to_string(),
            latitude,
            longitude,
            spud_date: to_date_or_none(field(&record, spud_idx)),
            last_updated: to_date_or_none(field(&record, updated_idx)),
            coord_valid,
        });
    }
    Ok(wells)
}

fn field<'a>(record: &'a csv::StringRecord, idx: Option<usize>) -> &'a str {
    idx.and_then(|idx| record.get(idx)).unwrap_or("").trim()
}
