use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{EtlError, Result};

/// Environment variable naming an optional TOML file that overrides the
/// stock layout.
pub const CONFIG_ENV_VAR: &str = "OILGAS_CONFIG";

/// All fixed paths and knobs for one pipeline run, passed explicitly into the
/// entry point rather than read ambiently.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EtlConfig {
    pub raw_dir: PathBuf,
    pub processed_dir: PathBuf,
    pub db_path: PathBuf,
    pub eia_oil_file: PathBuf,
    pub eia_gas_file: PathBuf,
    pub nysdec_file: PathBuf,
    pub schema_sql: PathBuf,
    /// When set, only these state names are kept from the EIA extracts;
    /// otherwise everything except the known aggregate labels is kept.
    pub include_states: Option<Vec<String>>,
}

impl Default for EtlConfig {
    fn default() -> Self {
        let raw_dir = PathBuf::from("data/raw");
        Self {
            eia_oil_file: raw_dir.join("eia_monthly_crude_oil.csv"),
            eia_gas_file: raw_dir.join("eia_monthly_natural_gas.csv"),
            nysdec_file: raw_dir.join("nysdec_wells.csv"),
            raw_dir,
            processed_dir: PathBuf::from("data/processed"),
            db_path: PathBuf::from("data/oilgas.db"),
            schema_sql: PathBuf::from("sql/schema.sql"),
            include_states: None,
        }
    }
}

impl EtlConfig {
    /// Stock configuration, overridden by the TOML file named in
    /// `OILGAS_CONFIG` when that variable is set.
    pub fn from_env() -> Result<Self> {
        match std::env::var(CONFIG_ENV_VAR) {
            Ok(path) => Self::from_toml_file(Path::new(&path)),
            Err(_) => Ok(Self::default()),
        }
    }

    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents)
            .map_err(|err| EtlError::Config(format!("{}: {err}", path.display())))
    }

    pub fn production_snapshot_path(&self) -> PathBuf {
        self.processed_dir.join("production_monthly.parquet")
    }

    pub fn wells_snapshot_path(&self) -> PathBuf {
        self.processed_dir.join("wells.parquet")
    }

    pub fn wells_by_county_path(&self) -> PathBuf {
        self.processed_dir.join("wells_by_county.csv")
    }

    pub fn wells_geojson_path(&self) -> PathBuf {
        self.processed_dir.join("wells.geojson")
    }
}
