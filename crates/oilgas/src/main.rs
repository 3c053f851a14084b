use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use oilgas_core::config::EtlConfig;
use oilgas_core::{db, geo, pipeline};

/// Oil & gas ETL runner: loads the EIA production extracts and the NYSDEC
/// well registry into the SQLite star schema.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Apply sql/schema.sql before loading
    #[arg(long)]
    apply_schema: bool,

    /// Export wells.geojson after the load
    #[arg(long)]
    make_geojson: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = EtlConfig::from_env().context("failed to load ETL configuration")?;
    std::fs::create_dir_all(&config.processed_dir)
        .context("failed to create processed output directory")?;

    let pool = db::connect(&config.db_path)
        .await
        .with_context(|| format!("failed to open store at {}", config.db_path.display()))?;

    if cli.apply_schema {
        if config.schema_sql.exists() {
            info!(path = %config.schema_sql.display(), "applying schema");
            db::apply_schema(&pool, &config.schema_sql).await?;
        } else {
            warn!(path = %config.schema_sql.display(), "schema script not found, skipping");
        }
    }

    let summary = pipeline::run(&pool, &config).await?;
    info!(summary = %serde_json::to_string(&summary)?, "ETL completed successfully");

    if cli.make_geojson {
        info!("exporting wells GeoJSON");
        geo::export_wells_geojson(&config.wells_snapshot_path(), &config.wells_geojson_path())?;
    }

    Ok(())
}
