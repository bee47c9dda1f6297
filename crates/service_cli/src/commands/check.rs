//! Check command implementation
//!
//! Validates the run configuration and, optionally, a CRIF file without
//! running the calculation.

use std::collections::BTreeMap;
use std::path::Path;

use pricer_simm::{SimmBucketMapper, SimmConfiguration, SimmSide, TabulatedSimmConfiguration};
use tracing::info;

use crate::config::RunConfig;
use crate::loader;
use crate::Result;

/// Run the check command
pub fn run(config_path: &Path, config: &RunConfig, crif: Option<&Path>) -> Result<()> {
    info!("Checking configuration {}...", config_path.display());
    config.validate()?;

    let simm_config = TabulatedSimmConfiguration::isda_v1_0(SimmBucketMapper::new())?;
    println!("SIMM configuration:   {} (version {})", simm_config.name(), simm_config.version());
    println!(
        "Calculation currency: Call {}, Post {}",
        config.calculator.calculation_currency(SimmSide::Call),
        config.calculator.calculation_currency(SimmSide::Post)
    );
    println!("Result currency:      {}", config.calculator.result_currency());
    println!("Enforce regulations:  {}", config.calculator.enforce_im_regulations);
    println!("FX rates:             {}", config.fx_table()?.len());

    if let Some(path) = crif {
        let crif = loader::load_crif(path)?;
        if config.learn_buckets {
            SimmBucketMapper::from_records(crif.iter())?;
        }
        let mut by_netting_set: BTreeMap<String, (usize, usize)> = BTreeMap::new();
        for record in &crif {
            let entry = by_netting_set
                .entry(record.netting_set_details.to_string())
                .or_default();
            if record.is_simm_parameter() {
                entry.1 += 1;
            } else {
                entry.0 += 1;
            }
        }
        println!("CRIF records:         {}", crif.len());
        for (nsd, (sensitivities, parameters)) in by_netting_set {
            println!("  {:<20} {:>8} sensitivities {:>6} parameters", nsd, sensitivities, parameters);
        }
    }

    println!("All checks passed");
    Ok(())
}
