//! Dimension and fact loading against the star schema.
//!
//! Every step runs inside one caller-owned transaction; nothing here
//! commits. A failed step therefore rolls the whole run back.

use std::collections::{BTreeSet, HashMap};

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use sqlx::{Row, Sqlite, Transaction};
use tracing::{info, warn};

use crate::eia::ProductionRecord;
use crate::error::{EtlError, Result};
use crate::nysdec::WellRecord;

/// Source tag stamped on every fact row.
pub const FACT_SOURCE: &str = "EIA";

/// Counters for one load, serialized into the run log.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoadSummary {
    pub fact_rows_upserted: usize,
    pub production_rows_dropped: usize,
    pub unmatched_state_names: Vec<String>,
    pub operators_seen: usize,
    pub statuses_seen: usize,
    pub counties_seen: usize,
    pub wells_inserted: usize,
    pub wells_already_present: usize,
    pub wells_missing_key: usize,
}

/// Production row joined to its `dim_state` surrogate key.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedProduction {
    pub state_id: i64,
    pub period_month: NaiveDate,
    pub state_name: String,
    pub oil_bbl: Option<f64>,
    pub gas_mcf: Option<f64>,
}

/// Well row with its foreign keys attached; missing lookups stay `None`.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedWell {
    #[serde(flatten)]
    pub record: WellRecord,
    pub state_id: i64,
    pub county_id: Option<i64>,
    pub operator_id: Option<i64>,
    pub status_id: Option<i64>,
}

/// Run all warehouse steps for one pipeline execution. Returns the summary
/// plus the resolved rows so the caller can write flat snapshots of exactly
/// what was loaded.
pub async fn load_dimensions_and_fact(
    tx: &mut Transaction<'_, Sqlite>,
    production: Vec<ProductionRecord>,
    wells: Vec<WellRecord>,
    home_state_code: &str,
) -> Result<(LoadSummary, Vec<ResolvedProduction>, Vec<ResolvedWell>)> {
    let mut summary = LoadSummary::default();

    let resolved_production = resolve_states(tx, production, &mut summary).await?;
    upsert_fact(tx, &resolved_production, &mut summary).await?;

    let home_state_id = fetch_home_state_id(tx, home_state_code).await?;
    seed_well_dimensions(tx, &wells, home_state_id, &mut summary).await?;
    let resolved_wells = resolve_wells(tx, wells, home_state_id, &mut summary).await?;
    insert_wells(tx, &resolved_wells, &mut summary).await?;

    Ok((summary, resolved_production, resolved_wells))
}

/// Join production rows to `dim_state` by name. Unresolved names are dropped
/// with a single collected warning (lenient policy); the state dimension is
/// expected to be pre-seeded by the schema script.
async fn resolve_states(
    tx: &mut Transaction<'_, Sqlite>,
    production: Vec<ProductionRecord>,
    summary: &mut LoadSummary,
) -> Result<Vec<ResolvedProduction>> {
    let rows = sqlx::query("SELECT state_id, state_name FROM dim_state")
        .fetch_all(tx.as_mut())
        .await?;
    let mut state_map: HashMap<String, i64> = HashMap::with_capacity(rows.len());
    for row in rows {
        state_map.insert(row.try_get("state_name")?, row.try_get("state_id")?);
    }

    let mut resolved = Vec::with_capacity(production.len());
    let mut unmatched = BTreeSet::new();
    for record in production {
        match state_map.get(&record.state_name) {
            Some(&state_id) => resolved.push(ResolvedProduction {
                state_id,
                period_month: record.period_month,
                state_name: record.state_name,
                oil_bbl: record.oil_bbl,
                gas_mcf: record.gas_mcf,
            }),
            None => {
                summary.production_rows_dropped += 1;
                unmatched.insert(record.state_name);
            }
        }
    }

    if !unmatched.is_empty() {
        warn!(
            labels = ?unmatched,
            dropped_rows = summary.production_rows_dropped,
            "dropping production rows whose label has no dim_state match"
        );
        summary.unmatched_state_names = unmatched.into_iter().collect();
    }
    Ok(resolved)
}

/// Idempotent upsert keyed by (state_id, period_month): re-loading the same
/// month overwrites measures, source tag and load timestamp in one statement.
async fn upsert_fact(
    tx: &mut Transaction<'_, Sqlite>,
    rows: &[ResolvedProduction],
    summary: &mut LoadSummary,
) -> Result<()> {
    let load_ts = Utc::now().naive_utc();
    for row in rows {
        sqlx::query(
            r#"
            INSERT INTO fact_state_production_monthly
                (state_id, period_month, oil_bbl, gas_mcf, source, load_ts)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT (state_id, period_month) DO UPDATE SET
                oil_bbl = excluded.oil_bbl,
                gas_mcf = excluded.gas_mcf,
                source  = excluded.source,
                load_ts = excluded.load_ts
            "#,
        )
        .bind(row.state_id)
        .bind(row.period_month)
        .bind(row.oil_bbl)
        .bind(row.gas_mcf)
        .bind(FACT_SOURCE)
        .bind(load_ts)
        .execute(tx.as_mut())
        .await?;
        summary.fact_rows_upserted += 1;
    }
    info!(rows = summary.fact_rows_upserted, "fact table upsert complete");
    Ok(())
}

async fn fetch_home_state_id(
    tx: &mut Transaction<'_, Sqlite>,
    state_code: &str,
) -> Result<i64> {
    let row = sqlx::query("SELECT state_id FROM dim_state WHERE state_code = ?")
        .bind(state_code)
        .fetch_optional(tx.as_mut())
        .await?;
    match row {
        Some(row) => Ok(row.try_get("state_id")?),
        None => Err(EtlError::MissingReference(format!(
            "state '{state_code}' not found in dim_state; apply the schema seed first"
        ))),
    }
}

/// Discover distinct operator/status/county values and insert any that are
/// new. Existing rows are never touched, so surrogate keys stay stable.
async fn seed_well_dimensions(
    tx: &mut Transaction<'_, Sqlite>,
    wells: &[WellRecord],
    home_state_id: i64,
    summary: &mut LoadSummary,
) -> Result<()> {
    let mut operators = BTreeSet::new();
    let mut statuses = BTreeSet::new();
    let mut counties = BTreeSet::new();
    for well in wells {
        if !well.operator_name.is_empty() {
            operators.insert(well.operator_name.as_str());
        }
        if !well.status_desc.is_empty() {
            statuses.insert(well.status_desc.as_str());
        }
        if !well.county_name.is_empty() {
            counties.insert(well.county_name.as_str());
        }
    }
    summary.operators_seen = operators.len();
    summary.statuses_seen = statuses.len();
    summary.counties_seen = counties.len();

    for operator in operators {
        sqlx::query(
            "INSERT INTO dim_operator (operator_name) VALUES (?) \
             ON CONFLICT (operator_name) DO NOTHING",
        )
        .bind(operator)
        .execute(tx.as_mut())
        .await?;
    }
    for status in statuses {
        sqlx::query(
            "INSERT INTO dim_well_status (status_desc) VALUES (?) \
             ON CONFLICT (status_desc) DO NOTHING",
        )
        .bind(status)
        .execute(tx.as_mut())
        .await?;
    }
    for county in counties {
        sqlx::query(
            "INSERT INTO dim_county (state_id, county_name) VALUES (?, ?) \
             ON CONFLICT (state_id, county_name) DO NOTHING",
        )
        .bind(home_state_id)
        .bind(county)
        .execute(tx.as_mut())
        .await?;
    }
    Ok(())
}

/// Re-read the dimensions for name -> surrogate-key maps and attach foreign
/// keys. Wells with an empty natural key cannot be deduplicated and are
/// dropped here.
async fn resolve_wells(
    tx: &mut Transaction<'_, Sqlite>,
    wells: Vec<WellRecord>,
    home_state_id: i64,
    summary: &mut LoadSummary,
) -> Result<Vec<ResolvedWell>> {
    let operator_map =
        fetch_name_map(tx, "SELECT operator_name, operator_id FROM dim_operator").await?;
    let status_map =
        fetch_name_map(tx, "SELECT status_desc, status_id FROM dim_well_status").await?;

    let county_rows =
        sqlx::query("SELECT county_name, county_id FROM dim_county WHERE state_id = ?")
            .bind(home_state_id)
            .fetch_all(tx.as_mut())
            .await?;
    let mut county_map: HashMap<String, i64> = HashMap::with_capacity(county_rows.len());
    for row in county_rows {
        county_map.insert(row.try_get("county_name")?, row.try_get("county_id")?);
    }

    let mut resolved = Vec::with_capacity(wells.len());
    for record in wells {
        if record.source_well_id.is_empty() {
            summary.wells_missing_key += 1;
            continue;
        }
        let county_id = county_map.get(&record.county_name).copied();
        let operator_id = operator_map.get(&record.operator_name).copied();
        let status_id = status_map.get(&record.status_desc).copied();
        resolved.push(ResolvedWell {
            record,
            state_id: home_state_id,
            county_id,
            operator_id,
            status_id,
        });
    }

    if summary.wells_missing_key > 0 {
        warn!(
            dropped = summary.wells_missing_key,
            "dropping wells with no source_well_id"
        );
    }
    Ok(resolved)
}

async fn fetch_name_map(
    tx: &mut Transaction<'_, Sqlite>,
    sql: &str,
) -> Result<HashMap<String, i64>> {
    let rows = sqlx::query(sql).fetch_all(tx.as_mut()).await?;
    let mut map = HashMap::with_capacity(rows.len());
    for row in rows {
        map.insert(row.try_get(0)?, row.try_get(1)?);
    }
    Ok(map)
}

/// Insert-if-absent by natural key. Registry attributes are never refreshed
/// for wells already present.
async fn insert_wells(
    tx: &mut Transaction<'_, Sqlite>,
    wells: &[ResolvedWell],
    summary: &mut LoadSummary,
) -> Result<()> {
    for well in wells {
        let result = sqlx::query(
            r#"
            INSERT INTO dim_well
                (source_well_id, well_name, state_id, county_id, operator_id, status_id,
                 latitude, longitude, spud_date, last_updated)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (source_well_id) DO NOTHING
            "#,
        )
        .bind(&well.record.source_well_id)
        .bind(&well.record.well_name)
        .bind(well.state_id)
        .bind(well.county_id)
        .bind(well.operator_id)
        .bind(well.status_id)
        .bind(well.record.latitude)
        .bind(well.record.longitude)
        .bind(well.record.spud_date)
        .bind(well.record.last_updated)
        .execute(tx.as_mut())
        .await?;

        if result.rows_affected() > 0 {
            summary.wells_inserted += 1;
        } else {
            summary.wells_already_present += 1;
        }
    }
    info!(
        inserted = summary.wells_inserted,
        existing = summary.wells_already_present,
        "well dimension load complete"
    );
    Ok(())
}
