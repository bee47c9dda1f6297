//! Calculate command implementation
//!
//! Loads a CRIF file, runs the SIMM calculator and prints either the final
//! (winning regulation) results or the results of every regulation set.

use std::io::Write;
use std::path::Path;

use pricer_simm::{
    Crif, SimmBucketMapper, SimmCalculator, SimmResults, SimmSide, TabulatedSimmConfiguration,
};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::RunConfig;
use crate::loader;
use crate::{CliError, Result};

/// Output format of the calculate command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl std::str::FromStr for OutputFormat {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            other => Err(CliError::InvalidArgument(format!(
                "Unknown format: {}. Supported: table, json, csv",
                other
            ))),
        }
    }
}

/// One reported margin.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRow {
    pub side: String,
    pub netting_set: String,
    pub regulation: String,
    pub product_class: String,
    pub risk_class: String,
    pub margin_type: String,
    pub bucket: String,
    pub margin: f64,
    pub currency: String,
}

/// Runs the calculator for `crif` with the options of `config`.
pub fn calculate(crif: &Crif, config: &RunConfig) -> Result<SimmCalculator> {
    config.version()?;
    let mapper = if config.learn_buckets {
        SimmBucketMapper::from_records(crif.iter())?
    } else {
        SimmBucketMapper::new()
    };
    let simm_config = TabulatedSimmConfiguration::isda_v1_0(mapper)?;
    let fx = config.fx_table()?;
    Ok(SimmCalculator::new(crif, &simm_config, &fx, config.calculator.clone())?)
}

fn push_rows(
    rows: &mut Vec<ResultRow>,
    side: SimmSide,
    netting_set: String,
    regulation: String,
    results: &SimmResults,
) {
    for ((pc, rc, mt, bucket), margin) in results.iter() {
        rows.push(ResultRow {
            side: side.to_string(),
            netting_set: netting_set.clone(),
            regulation: regulation.clone(),
            product_class: pc.to_string(),
            risk_class: rc.to_string(),
            margin_type: mt.to_string(),
            bucket: bucket.clone(),
            margin,
            currency: results.result_currency().to_string(),
        });
    }
}

/// Flattens calculator output into report rows.
pub fn collect_rows(calc: &SimmCalculator, all: bool) -> Vec<ResultRow> {
    let mut rows = Vec::new();
    if all {
        for (side, by_nsd) in calc.all_simm_results() {
            for (nsd, by_regs) in by_nsd {
                for (regs, results) in by_regs {
                    push_rows(&mut rows, *side, nsd.to_string(), regs.to_string(), results);
                }
            }
        }
    } else {
        for (side, by_nsd) in calc.all_final_simm_results() {
            for (nsd, f) in by_nsd {
                push_rows(&mut rows, *side, nsd.to_string(), f.regulation.to_string(), &f.results);
            }
        }
    }
    rows
}

/// Writes `rows` in the requested format.
pub fn write_rows<W: Write>(rows: &[ResultRow], format: OutputFormat, mut out: W) -> Result<()> {
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut out, rows)?;
            writeln!(out)?;
        }
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(out);
            for row in rows {
                wtr.serialize(row)?;
            }
            wtr.flush()?;
        }
        OutputFormat::Table => {
            writeln!(out, "┌──────┬────────────┬──────────────┬────────────────────┬─────────────────────┬──────────────┬──────────┬──────────────────┐")?;
            writeln!(
                out,
                "│ {:<4} │ {:<10} │ {:<12} │ {:<18} │ {:<19} │ {:<12} │ {:<8} │ {:>16} │",
                "Side", "Netting", "Regulation", "ProductClass", "RiskClass", "MarginType", "Bucket", "Margin"
            )?;
            writeln!(out, "├──────┼────────────┼──────────────┼────────────────────┼─────────────────────┼──────────────┼──────────┼──────────────────┤")?;
            for r in rows {
                writeln!(
                    out,
                    "│ {:<4} │ {:<10} │ {:<12} │ {:<18} │ {:<19} │ {:<12} │ {:<8} │ {:>16.2} │",
                    r.side, r.netting_set, r.regulation, r.product_class, r.risk_class, r.margin_type, r.bucket, r.margin
                )?;
            }
            writeln!(out, "└──────┴────────────┴──────────────┴────────────────────┴─────────────────────┴──────────────┴──────────┴──────────────────┘")?;
        }
    }
    Ok(())
}

/// Run the calculate command
pub fn run(crif_path: &Path, config: &RunConfig, format: &str, all: bool) -> Result<()> {
    let format: OutputFormat = format.parse()?;
    info!("Starting SIMM calculation...");
    info!("  CRIF: {}", crif_path.display());
    info!("  SIMM version: {}", config.simm_version);
    info!("  Output format: {:?}", format);

    let crif = loader::load_crif(crif_path)?;
    let calc = calculate(&crif, config)?;

    if !all && !config.calculator.determine_winning_regulations {
        warn!("Winning regulations are not determined, no final results to report. Use --all");
    }
    let rows = collect_rows(&calc, all);
    write_rows(&rows, format, std::io::stdout().lock())?;

    info!("SIMM calculation complete");
    Ok(())
}
