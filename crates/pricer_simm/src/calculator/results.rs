//! Sparse SIMM result table.

use std::collections::BTreeMap;

use crate::types::{MarginType, ProductClass, RiskClass};

/// Key of a [`SimmResults`] entry.
pub type SimmResultKey = (ProductClass, RiskClass, MarginType, String);

/// Margins keyed by `(product class, risk class, margin type, bucket)`.
///
/// The `"All"` bucket holds the aggregated value of a
/// `(product class, risk class, margin type)` combination. Absent keys mean
/// "not applicable", never zero.
///
/// # Examples
///
/// ```
/// use pricer_simm::{MarginType, ProductClass, RiskClass, SimmResults};
///
/// let mut results = SimmResults::new("USD", "USD");
/// results.add(ProductClass::RatesFX, RiskClass::FX, MarginType::Delta, "All", 10.0, false);
/// results.add(ProductClass::RatesFX, RiskClass::FX, MarginType::Delta, "All", 5.0, false);
///
/// assert_eq!(results.get(ProductClass::RatesFX, RiskClass::FX, MarginType::Delta, "All"), Some(15.0));
/// assert!(!results.has(ProductClass::Credit, RiskClass::FX, MarginType::Delta, "All"));
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SimmResults {
    data: BTreeMap<SimmResultKey, f64>,
    calculation_currency: String,
    result_currency: String,
}

impl SimmResults {
    /// Creates an empty table.
    pub fn new(calculation_currency: impl Into<String>, result_currency: impl Into<String>) -> Self {
        Self {
            data: BTreeMap::new(),
            calculation_currency: calculation_currency.into(),
            result_currency: result_currency.into(),
        }
    }

    /// Adds `margin` to the entry, or replaces it when `overwrite` is set.
    pub fn add(
        &mut self,
        pc: ProductClass,
        rc: RiskClass,
        mt: MarginType,
        bucket: &str,
        margin: f64,
        overwrite: bool,
    ) {
        let entry = self
            .data
            .entry((pc, rc, mt, bucket.to_string()))
            .or_insert(0.0);
        if overwrite {
            *entry = margin;
        } else {
            *entry += margin;
        }
    }

    /// Whether the entry exists.
    pub fn has(&self, pc: ProductClass, rc: RiskClass, mt: MarginType, bucket: &str) -> bool {
        self.data.contains_key(&(pc, rc, mt, bucket.to_string()))
    }

    /// Entry value, if present.
    pub fn get(&self, pc: ProductClass, rc: RiskClass, mt: MarginType, bucket: &str) -> Option<f64> {
        self.data.get(&(pc, rc, mt, bucket.to_string())).copied()
    }

    /// Aggregated `"All"` bucket value, if present.
    #[inline]
    pub fn get_all(&self, pc: ProductClass, rc: RiskClass, mt: MarginType) -> Option<f64> {
        self.get(pc, rc, mt, "All")
    }

    /// Netting set total, i.e. `(All, All, All, "All")`, or 0 when absent.
    pub fn total(&self) -> f64 {
        self.get_all(ProductClass::All, RiskClass::All, MarginType::All)
            .unwrap_or(0.0)
    }

    /// Iterates over entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&SimmResultKey, f64)> + '_ {
        self.data.iter().map(|(k, v)| (k, *v))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Currency the sensitivities were calculated in.
    pub fn calculation_currency(&self) -> &str {
        &self.calculation_currency
    }

    /// Currency the margins are expressed in.
    pub fn result_currency(&self) -> &str {
        &self.result_currency
    }
}
