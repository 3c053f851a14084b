//! Orchestration of one full ETL run: load both sources, merge, warehouse
//! everything inside a single transaction, write the flat outputs, commit.

use serde::Serialize;
use tracing::info;

use crate::config::EtlConfig;
use crate::db::DbPool;
use crate::error::Result;
use crate::warehouse::{self, LoadSummary};
use crate::{eia, nysdec, outputs};

#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub production_rows: usize,
    pub well_rows: usize,
    pub load: LoadSummary,
}

/// Execute the pipeline. All relational writes share one transaction that
/// commits only after the snapshots are written; any error rolls the store
/// back to its pre-run state.
pub async fn run(pool: &DbPool, config: &EtlConfig) -> Result<RunSummary> {
    info!(
        oil = %config.eia_oil_file.display(),
        gas = %config.eia_gas_file.display(),
        "loading EIA production extracts"
    );
    let production = eia::load_production(
        &config.eia_oil_file,
        &config.eia_gas_file,
        config.include_states.as_deref(),
    )?;
    let production_rows = production.len();
    info!(rows = production_rows, "merged production table ready");

    info!(file = %config.nysdec_file.display(), "loading NYSDEC well registry");
    let wells = nysdec::load_wells(&config.nysdec_file)?;
    let well_rows = wells.len();
    info!(rows = well_rows, "well registry table ready");

    let mut tx = pool.begin().await?;
    let (load, resolved_production, resolved_wells) =
        warehouse::load_dimensions_and_fact(&mut tx, production, wells, nysdec::HOME_STATE_CODE)
            .await?;

    outputs::write_production_snapshot(&resolved_production, &config.production_snapshot_path())?;
    outputs::write_wells_snapshot(&resolved_wells, &config.wells_snapshot_path())?;
    outputs::write_wells_by_county(&resolved_wells, &config.wells_by_county_path())?;

    tx.commit().await?;
    info!("pipeline transaction committed");

    Ok(RunSummary {
        production_rows,
        well_rows,
        load,
    })
}
