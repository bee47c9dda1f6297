//! Qualifier to bucket mapping.

use std::collections::HashMap;

use tracing::trace;

use crate::crif::CrifRecord;
use crate::error::{Result, SimmError};
use crate::types::RiskType;

/// Currencies in the regular volatility interest rate bucket.
const IR_REGULAR_VOL: [&str; 14] = [
    "USD", "EUR", "GBP", "AUD", "CAD", "CHF", "DKK", "HKD", "KRW", "NOK", "NZD", "SEK", "SGD", "TWD",
];

/// Maps `(risk type, qualifier)` to a SIMM bucket.
///
/// Interest rate buckets are derived from the currency. Other risk types
/// use explicit mappings; vol risk types share the mapping of their delta
/// counterpart. Unmapped commodities land in bucket `16` and everything
/// else in `Residual`.
///
/// # Examples
///
/// ```
/// use pricer_simm::{RiskType, SimmBucketMapper};
///
/// let mut mapper = SimmBucketMapper::new();
/// mapper.add_mapping(RiskType::Equity, "ACME", "3").unwrap();
///
/// assert_eq!(mapper.bucket(RiskType::EquityVol, "ACME").unwrap(), "3");
/// assert_eq!(mapper.bucket(RiskType::Equity, "OTHER").unwrap(), "Residual");
/// assert_eq!(mapper.bucket(RiskType::IRCurve, "JPY").unwrap(), "2");
/// ```
#[derive(Clone, Debug, Default)]
pub struct SimmBucketMapper {
    mappings: HashMap<(RiskType, String), String>,
}

impl SimmBucketMapper {
    /// Creates a mapper with no explicit mappings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mapper populated from the buckets carried on CRIF records.
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a CrifRecord>) -> Result<Self> {
        let mut mapper = Self::new();
        mapper.learn_from(records)?;
        Ok(mapper)
    }

    /// Whether the risk type is bucketed.
    pub fn has_buckets(&self, risk_type: RiskType) -> bool {
        matches!(
            risk_type,
            RiskType::IRCurve
                | RiskType::CreditQ
                | RiskType::CreditNonQ
                | RiskType::Equity
                | RiskType::Commodity
                | RiskType::IRVol
                | RiskType::InflationVol
                | RiskType::CreditVol
                | RiskType::CreditVolNonQ
                | RiskType::EquityVol
                | RiskType::CommodityVol
        )
    }

    /// Adds an explicit mapping.
    ///
    /// Interest rate mappings are ignored because those buckets are
    /// derived from the currency.
    pub fn add_mapping(&mut self, risk_type: RiskType, qualifier: &str, bucket: &str) -> Result<()> {
        if !self.has_buckets(risk_type) {
            return Err(SimmError::configuration(format!(
                "SimmBucketMapper::add_mapping(): Tried to add a bucket mapping for risk type {} but it does not have buckets",
                risk_type
            )));
        }
        let lookup = delta_counterpart(risk_type);
        if lookup == RiskType::IRCurve {
            return Ok(());
        }
        if !is_valid_bucket(bucket) {
            return Err(SimmError::InvalidBucket {
                qualifier: qualifier.to_string(),
                bucket: bucket.to_string(),
            });
        }
        self.mappings
            .insert((lookup, qualifier.to_string()), bucket.to_string());
        Ok(())
    }

    /// Adds a mapping for every bucketed record that carries a bucket.
    pub fn learn_from<'a>(&mut self, records: impl IntoIterator<Item = &'a CrifRecord>) -> Result<()> {
        for r in records {
            if r.bucket.is_empty() || !self.has_buckets(r.risk_type) {
                continue;
            }
            self.add_mapping(r.risk_type, &r.qualifier, &r.bucket)?;
        }
        Ok(())
    }

    /// Bucket for the risk type and qualifier.
    pub fn bucket(&self, risk_type: RiskType, qualifier: &str) -> Result<String> {
        if !self.has_buckets(risk_type) {
            return Err(SimmError::configuration(format!(
                "SimmBucketMapper::bucket(): The risk type {} does not have buckets",
                risk_type
            )));
        }
        let lookup = delta_counterpart(risk_type);
        if lookup == RiskType::IRCurve {
            return Ok(ir_bucket(qualifier).to_string());
        }
        if let Some(b) = self.mappings.get(&(lookup, qualifier.to_string())) {
            return Ok(b.clone());
        }
        let fallback = if lookup == RiskType::Commodity {
            "16"
        } else {
            "Residual"
        };
        trace!(
            risk_type = %risk_type,
            qualifier,
            bucket = fallback,
            "No bucket mapping, using fallback bucket"
        );
        Ok(fallback.to_string())
    }

    /// Whether an explicit mapping exists.
    pub fn has(&self, risk_type: RiskType, qualifier: &str) -> bool {
        self.mappings
            .contains_key(&(delta_counterpart(risk_type), qualifier.to_string()))
    }
}

fn delta_counterpart(risk_type: RiskType) -> RiskType {
    match risk_type {
        RiskType::IRVol | RiskType::InflationVol => RiskType::IRCurve,
        RiskType::CreditVol => RiskType::CreditQ,
        RiskType::CreditVolNonQ => RiskType::CreditNonQ,
        RiskType::EquityVol => RiskType::Equity,
        RiskType::CommodityVol => RiskType::Commodity,
        other => other,
    }
}

fn ir_bucket(currency: &str) -> &'static str {
    if IR_REGULAR_VOL.contains(&currency) {
        "1"
    } else if currency == "JPY" {
        "2"
    } else {
        "3"
    }
}

fn is_valid_bucket(bucket: &str) -> bool {
    bucket == "Residual" || bucket.parse::<u32>().map(|b| b > 0).unwrap_or(false)
}
