//! Point-feature GeoJSON export of the wells snapshot (WGS84).

use std::fs::File;
use std::path::Path;

use geojson::{Feature, FeatureCollection, GeoJson, Geometry, JsonObject, JsonValue, Value};
use polars::prelude::*;
use tracing::info;

use crate::error::Result;

/// Read the wells Parquet snapshot and write one point feature per well with
/// in-range coordinates. Wells with missing or out-of-range coordinates are
/// skipped, not failed.
pub fn export_wells_geojson(parquet_path: &Path, out_path: &Path) -> Result<()> {
    let file = File::open(parquet_path)?;
    let df = ParquetReader::new(file).finish()?;

    let latitudes = df.column("latitude")?.f64()?;
    let longitudes = df.column("longitude")?.f64()?;
    let ids = df.column("source_well_id")?.str()?;
    let names = df.column("well_name")?.str()?;
    let counties = df.column("county_name")?.str()?;
    let operators = df.column("operator_name")?.str()?;
    let statuses = df.column("status_desc")?.str()?;
    let spud_dates = df.column("spud_date")?.str()?;

    let mut features = Vec::new();
    for idx in 0..df.height() {
        let (Some(lat), Some(lon)) = (latitudes.get(idx), longitudes.get(idx)) else {
            continue;
        };
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            continue;
        }

        let mut properties = JsonObject::new();
        properties.insert("source_well_id".to_string(), json_string(ids.get(idx)));
        properties.insert("well_name".to_string(), json_string(names.get(idx)));
        properties.insert("county_name".to_string(), json_string(counties.get(idx)));
        properties.insert("operator_name".to_string(), json_string(operators.get(idx)));
        properties.insert("status_desc".to_string(), json_string(statuses.get(idx)));
        properties.insert("spud_date".to_string(), json_string(spud_dates.get(idx)));

        features.push(Feature {
            bbox: None,
            geometry: Some(Geometry::new(Value::Point(vec![lon, lat]))),
            id: None,
            properties: Some(properties),
            foreign_members: None,
        });
    }

    let feature_count = features.len();
    let collection = FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    };

    if let Some(parent) = out_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(out_path, GeoJson::from(collection).to_string())?;

    info!(
        features = feature_count,
        path = %out_path.display(),
        "wrote wells GeoJSON"
    );
    Ok(())
}

fn json_string(value: Option<&str>) -> JsonValue {
    match value {
        Some(v) if !v.is_empty() => JsonValue::String(v.to_string()),
        _ => JsonValue::Null,
    }
}
