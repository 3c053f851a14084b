use tempfile::TempDir;

use oilgas_core::config::EtlConfig;
use oilgas_core::db::{self, DbPool};
use oilgas_core::pipeline;

const SCHEMA_SQL: &str = include_str!("../../../sql/schema.sql");

const OIL_WIDE: &str = "\
Month,New York Crude Oil (Thousand Barrels per Day)  thousand barrels per day,Other States Crude Oil (Thousand Barrels per Day)  thousand barrels per day
Jan-2024,10.0,1.0
Feb-2024,11.0,1.0
";

const GAS_WIDE: &str = "\
Month,New York Natural Gas Gross Withdrawals (Million Cubic Feet per Day)  million cubic feet per day
Jan-2024,2.5
";

const REGISTRY: &str = "\
API_WellNo,Well_Name,County,Company_name,GeneralWellStatus,Surface_latitude,Surface_Longitude,Date_Spudded,Dt_Mod
31-003-00001,Smith 1,ALLEGANY,Acme Energy LLC,Active,42.1,-78.0,10/15/1985,
,Keyless,ERIE,Acme Energy LLC,Active,42.2,-78.1,,
";

fn fixture_config(dir: &TempDir) -> EtlConfig {
    let raw_dir = dir.path().join("raw");
    std::fs::create_dir_all(&raw_dir).unwrap();
    std::fs::write(raw_dir.join("oil.csv"), OIL_WIDE).unwrap();
    std::fs::write(raw_dir.join("gas.csv"), GAS_WIDE).unwrap();
    std::fs::write(raw_dir.join("wells.csv"), REGISTRY).unwrap();

    EtlConfig {
        eia_oil_file: raw_dir.join("oil.csv"),
        eia_gas_file: raw_dir.join("gas.csv"),
        nysdec_file: raw_dir.join("wells.csv"),
        raw_dir,
        processed_dir: dir.path().join("processed"),
        db_path: dir.path().join("oilgas.db"),
        schema_sql: dir.path().join("schema.sql"),
        include_states: None,
    }
}

async fn seeded_pool() -> DbPool {
    let pool = db::connect_in_memory().await.expect("in-memory pool");
    sqlx::raw_sql(SCHEMA_SQL)
        .execute(&pool)
        .await
        .expect("schema apply");
    pool
}

#[tokio::test]
async fn full_run_loads_star_schema_and_writes_outputs() {
    let dir = TempDir::new().unwrap();
    let config = fixture_config(&dir);
    let pool = seeded_pool().await;

    let summary = pipeline::run(&pool, &config).await.expect("run failed");

    // "Other States" is an aggregate: excluded by the loader, so nothing is
    // dropped at state resolution.
    assert_eq!(summary.production_rows, 2);
    assert_eq!(summary.load.fact_rows_upserted, 2);
    assert_eq!(summary.load.production_rows_dropped, 0);
    assert_eq!(summary.load.wells_inserted, 1);
    assert_eq!(summary.load.wells_missing_key, 1);

    assert!(config.production_snapshot_path().exists());
    assert!(config.wells_snapshot_path().exists());
    let rollup = std::fs::read_to_string(config.wells_by_county_path()).unwrap();
    assert!(rollup.contains("Allegany,1"));
}

#[tokio::test]
async fn rerunning_the_pipeline_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let config = fixture_config(&dir);
    let pool = seeded_pool().await;

    pipeline::run(&pool, &config).await.expect("first run failed");
    let facts_after_first: Vec<(i64, String, Option<f64>, Option<f64>)> = sqlx::query_as(
        "SELECT state_id, period_month, oil_bbl, gas_mcf \
         FROM fact_state_production_monthly ORDER BY state_id, period_month",
    )
    .fetch_all(&pool)
    .await
    .unwrap();

    let summary = pipeline::run(&pool, &config).await.expect("second run failed");
    let facts_after_second: Vec<(i64, String, Option<f64>, Option<f64>)> = sqlx::query_as(
        "SELECT state_id, period_month, oil_bbl, gas_mcf \
         FROM fact_state_production_monthly ORDER BY state_id, period_month",
    )
    .fetch_all(&pool)
    .await
    .unwrap();

    assert_eq!(facts_after_first, facts_after_second);
    assert_eq!(summary.load.wells_inserted, 0);
    assert_eq!(summary.load.wells_already_present, 1);

    let wells: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM dim_well")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(wells, 1);
}
