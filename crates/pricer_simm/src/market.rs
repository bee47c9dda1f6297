//! FX rates consumed by the SIMM calculator.
//!
//! The calculator only needs spot conversion factors: CRIF amounts are
//! converted into the result currency and concentration thresholds
//! (USD-denominated) are rebased when the result currency is not USD.

use std::collections::HashMap;

use crate::error::{Result, SimmError};

/// Source of spot FX rates.
///
/// `fx_rate("EUR", "USD")` returns the number of USD per one EUR, so that
/// `amount_eur * fx_rate("EUR", "USD")` is the USD amount.
pub trait FxRateProvider: Send + Sync {
    /// Spot rate converting one unit of `from` into `to`.
    fn fx_rate(&self, from: &str, to: &str) -> Result<f64>;
}

/// Table of quoted FX rates.
///
/// Lookups try the direct quote, then the inverse quote, then a cross
/// through USD. Converting a currency into itself always yields 1.
///
/// # Examples
///
/// ```
/// use pricer_simm::{FxRateProvider, FxRateTable};
///
/// let mut fx = FxRateTable::new();
/// fx.add_rate("EUR", "USD", 1.10);
/// fx.add_rate("USD", "JPY", 150.0);
///
/// assert_eq!(fx.fx_rate("USD", "USD").unwrap(), 1.0);
/// assert!((fx.fx_rate("USD", "EUR").unwrap() - 1.0 / 1.10).abs() < 1e-12);
/// assert!((fx.fx_rate("EUR", "JPY").unwrap() - 165.0).abs() < 1e-9);
/// ```
#[derive(Clone, Debug, Default)]
pub struct FxRateTable {
    rates: HashMap<(String, String), f64>,
}

impl FxRateTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) the quote converting one `from` into `to`.
    pub fn add_rate(&mut self, from: impl Into<String>, to: impl Into<String>, rate: f64) {
        self.rates.insert((from.into(), to.into()), rate);
    }

    /// Adds a quote given as a six-letter pair such as `EURUSD`.
    pub fn add_pair(&mut self, pair: &str, rate: f64) -> Result<()> {
        if pair.len() != 6 || !pair.is_ascii() {
            return Err(SimmError::configuration(format!(
                "FxRateTable::add_pair(): Currency pair {} must have six characters",
                pair
            )));
        }
        self.add_rate(&pair[..3], &pair[3..], rate);
        Ok(())
    }

    /// Number of quotes held.
    pub fn len(&self) -> usize {
        self.rates.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    fn lookup(&self, from: &str, to: &str) -> Option<f64> {
        if from == to {
            return Some(1.0);
        }
        if let Some(r) = self.rates.get(&(from.to_string(), to.to_string())) {
            return Some(*r);
        }
        self.rates
            .get(&(to.to_string(), from.to_string()))
            .filter(|r| **r != 0.0)
            .map(|r| 1.0 / r)
    }
}

impl FxRateProvider for FxRateTable {
    fn fx_rate(&self, from: &str, to: &str) -> Result<f64> {
        if let Some(rate) = self.lookup(from, to) {
            return Ok(rate);
        }
        match (self.lookup(from, "USD"), self.lookup("USD", to)) {
            (Some(a), Some(b)) => Ok(a * b),
            _ => Err(SimmError::MissingFxRate {
                context: "FxRateTable::fx_rate()".to_string(),
                pair: format!("{}{}", from, to),
            }),
        }
    }
}
