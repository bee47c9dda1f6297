//! Run configuration management
//!
//! Loads the TOML run file:
//!
//! ```toml
//! simm_version = "1.0"
//! learn_buckets = true
//!
//! [calculator]
//! calculation_currency_call = "USD"
//! enforce_im_regulations = true
//!
//! [fx_rates]
//! EURUSD = 1.1
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use pricer_simm::{FxRateTable, SimmCalculatorConfig, SimmVersion};
use serde::Deserialize;
use tracing::info;

use crate::{CliError, Result};

/// Contents of a run file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// SIMM version; only `1.0` is bundled.
    pub simm_version: String,
    /// Whether bucket mappings are learned from the CRIF file.
    pub learn_buckets: bool,
    /// Calculator options.
    pub calculator: SimmCalculatorConfig,
    /// FX rates keyed by six letter pair, e.g. `EURUSD`.
    pub fx_rates: BTreeMap<String, f64>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            simm_version: "1.0".to_string(),
            learn_buckets: true,
            calculator: SimmCalculatorConfig::default(),
            fx_rates: BTreeMap::new(),
        }
    }
}

impl RunConfig {
    /// Parses a run file from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: RunConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("Run file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Validates the calculator options and the SIMM version.
    pub fn validate(&self) -> Result<()> {
        self.calculator.validate()?;
        self.version()?;
        Ok(())
    }

    /// Requested SIMM version, which must be one with bundled tables.
    pub fn version(&self) -> Result<SimmVersion> {
        let version: SimmVersion = self.simm_version.parse()?;
        if version != SimmVersion::V1_0 {
            return Err(CliError::InvalidArgument(format!(
                "SIMM version {} is not bundled. Supported: 1.0",
                version
            )));
        }
        Ok(version)
    }

    /// FX rates as a rate table.
    pub fn fx_table(&self) -> Result<FxRateTable> {
        let mut table = FxRateTable::new();
        for (pair, rate) in &self.fx_rates {
            table.add_pair(pair, *rate)?;
        }
        Ok(table)
    }
}
