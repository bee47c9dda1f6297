//! CRIF CSV loading
//!
//! Header names are matched case-insensitively. `TradeID`, `PortfolioID`,
//! `ProductClass`, `RiskType` and `Amount` are required; every other column
//! defaults to empty.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use pricer_simm::{
    parse_regulation_string, Crif, CrifRecord, ImModel, NettingSetDetails, ProductClass,
    RegulationSet, RiskType,
};
use tracing::info;

use crate::{CliError, Result};

const REQUIRED: [&str; 5] = ["tradeid", "portfolioid", "productclass", "risktype", "amount"];

/// Column positions keyed by lower-cased header name.
struct Columns(HashMap<String, usize>);

impl Columns {
    fn new(headers: &csv::StringRecord) -> Result<Self> {
        let map: HashMap<String, usize> = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.trim().to_lowercase(), i))
            .collect();
        if let Some(missing) = REQUIRED.iter().find(|h| !map.contains_key(**h)) {
            return Err(CliError::Crif {
                line: 1,
                message: format!("missing required column {}", missing),
            });
        }
        Ok(Self(map))
    }

    fn get<'r>(&self, row: &'r csv::StringRecord, name: &str) -> &'r str {
        self.0
            .get(name)
            .and_then(|&i| row.get(i))
            .map(str::trim)
            .unwrap_or("")
    }
}

fn parse_amount(value: &str, column: &str, line: u64) -> Result<f64> {
    value.parse().map_err(|_| CliError::Crif {
        line,
        message: format!("{} '{}' is not a number", column, value),
    })
}

fn parse_row(columns: &Columns, row: &csv::StringRecord, line: u64) -> Result<CrifRecord> {
    let with_line = |e: pricer_simm::SimmError| CliError::Crif {
        line,
        message: e.to_string(),
    };
    let product_class: ProductClass = columns.get(row, "productclass").parse().map_err(with_line)?;
    let risk_type: RiskType = columns.get(row, "risktype").parse().map_err(with_line)?;
    let im_model: ImModel = columns.get(row, "immodel").parse().map_err(with_line)?;

    let nsd = NettingSetDetails::with_discriminators(
        columns.get(row, "portfolioid"),
        columns.get(row, "agreementtype"),
        columns.get(row, "calltype"),
        columns.get(row, "initialmargintype"),
        columns.get(row, "legalentityid"),
    );

    let amount = parse_amount(columns.get(row, "amount"), "Amount", line)?;
    let empty = RegulationSet::new();
    let mut record = CrifRecord::new(columns.get(row, "tradeid"), nsd, product_class, risk_type)
        .with_trade_type(columns.get(row, "tradetype"))
        .with_qualifier(columns.get(row, "qualifier"))
        .with_bucket(columns.get(row, "bucket"))
        .with_labels(columns.get(row, "label1"), columns.get(row, "label2"))
        .with_amount(columns.get(row, "amountcurrency"), amount)
        .with_regulations(
            parse_regulation_string(columns.get(row, "collect_regulations"), &empty),
            parse_regulation_string(columns.get(row, "post_regulations"), &empty),
        )
        .with_im_model(im_model);

    let amount_usd = columns.get(row, "amountusd");
    if !amount_usd.is_empty() {
        record = record.with_amount_usd(parse_amount(amount_usd, "AmountUSD", line)?);
    }
    Ok(record)
}

/// Reads CRIF records from any CSV source.
pub fn read_crif<R: Read>(reader: R) -> Result<Crif> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);
    let columns = Columns::new(rdr.headers()?)?;

    let mut crif = Crif::new();
    for (i, row) in rdr.records().enumerate() {
        let row = row?;
        if row.iter().all(str::is_empty) {
            continue;
        }
        crif.add_record(parse_row(&columns, &row, i as u64 + 2)?);
    }
    Ok(crif)
}

/// Reads a CRIF CSV file.
pub fn load_crif(path: &Path) -> Result<Crif> {
    if !path.exists() {
        return Err(CliError::FileNotFound(path.display().to_string()));
    }
    let crif = read_crif(std::fs::File::open(path)?)?;
    info!("Loaded {} CRIF records from {}", crif.len(), path.display());
    Ok(crif)
}
