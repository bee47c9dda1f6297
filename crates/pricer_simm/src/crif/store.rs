//! Ordered CRIF record store with the queries used by the margin formulas.

use std::collections::{BTreeSet, HashMap};

use super::record::{CrifRecord, NettingSetDetails};
use crate::types::{ImModel, ProductClass, RegulationSet, RiskType};

/// Aggregation key: every field except trade ID, amounts and amount currency.
type NettingKey<'a> = (
    &'a NettingSetDetails,
    ProductClass,
    RiskType,
    &'a str,
    &'a str,
    &'a str,
    &'a str,
    &'a RegulationSet,
    &'a RegulationSet,
    ImModel,
);

/// An ordered collection of CRIF records.
///
/// Insertion order is preserved, so iteration over the records feeding a
/// bucket margin is deterministic.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Crif {
    records: Vec<CrifRecord>,
}

impl Crif {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record.
    pub fn add_record(&mut self, record: CrifRecord) {
        self.records.push(record);
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records in insertion order.
    pub fn records(&self) -> &[CrifRecord] {
        &self.records
    }

    /// Iterates over the records.
    pub fn iter(&self) -> std::slice::Iter<'_, CrifRecord> {
        self.records.iter()
    }

    /// Whether at least one record is a sensitivity (not a SIMM parameter).
    pub fn has_crif_records(&self) -> bool {
        self.records.iter().any(|r| !r.is_simm_parameter())
    }

    /// Whether at least one record is a SIMM parameter.
    pub fn has_simm_parameters(&self) -> bool {
        self.records.iter().any(CrifRecord::is_simm_parameter)
    }

    /// Nets records that differ only in trade ID, amounts and amount currency.
    ///
    /// `amount`, `amount_usd` and `amount_result_ccy` are summed; only
    /// `amount_result_ccy` is meaningful across currencies. Trade IDs are
    /// kept when all contributors share one and cleared otherwise. SIMM
    /// parameter records are passed through unchanged because each one is
    /// an individual add-on instruction.
    pub fn aggregate(&self) -> Crif {
        let mut out: Vec<CrifRecord> = Vec::with_capacity(self.records.len());
        let mut positions: HashMap<NettingKey<'_>, usize> = HashMap::new();

        for record in &self.records {
            if record.is_simm_parameter() {
                out.push(record.clone());
                continue;
            }
            match positions.get(&netting_key(record)) {
                Some(&idx) => {
                    let target = &mut out[idx];
                    target.amount += record.amount;
                    target.amount_result_ccy += record.amount_result_ccy;
                    target.amount_usd = match (target.amount_usd, record.amount_usd) {
                        (Some(a), Some(b)) => Some(a + b),
                        (a, b) => a.or(b),
                    };
                    if target.trade_id != record.trade_id {
                        target.trade_id.clear();
                    }
                }
                None => {
                    positions.insert(netting_key(record), out.len());
                    out.push(record.clone());
                }
            }
        }

        Crif { records: out }
    }

    /// Product classes of sensitivity records, in product class order.
    pub fn product_classes(&self) -> BTreeSet<ProductClass> {
        self.records
            .iter()
            .filter(|r| !r.is_simm_parameter())
            .map(|r| r.product_class)
            .collect()
    }

    /// Records with the given product class and risk type.
    pub fn filter_by(&self, pc: ProductClass, rt: RiskType) -> Vec<&CrifRecord> {
        self.records
            .iter()
            .filter(|r| r.product_class == pc && r.risk_type == rt)
            .collect()
    }

    /// Records with the given product class, risk type and qualifier.
    pub fn filter_by_qualifier(
        &self,
        pc: ProductClass,
        rt: RiskType,
        qualifier: &str,
    ) -> Vec<&CrifRecord> {
        self.records
            .iter()
            .filter(|r| r.product_class == pc && r.risk_type == rt && r.qualifier == qualifier)
            .collect()
    }

    /// Records with the given product class, risk type and bucket.
    pub fn filter_by_bucket(&self, pc: ProductClass, rt: RiskType, bucket: &str) -> Vec<&CrifRecord> {
        self.records
            .iter()
            .filter(|r| r.product_class == pc && r.risk_type == rt && r.bucket == bucket)
            .collect()
    }

    /// Number of records with the given product class, risk type and qualifier.
    pub fn count_matching(&self, pc: ProductClass, rt: RiskType, qualifier: &str) -> usize {
        self.records
            .iter()
            .filter(|r| r.product_class == pc && r.risk_type == rt && r.qualifier == qualifier)
            .count()
    }

    /// First record with the given product class, risk type and qualifier.
    pub fn find_by(&self, pc: ProductClass, rt: RiskType, qualifier: &str) -> Option<&CrifRecord> {
        self.records
            .iter()
            .find(|r| r.product_class == pc && r.risk_type == rt && r.qualifier == qualifier)
    }

    /// Distinct qualifiers for the given product class and risk type.
    pub fn qualifiers_by(&self, pc: ProductClass, rt: RiskType) -> BTreeSet<String> {
        self.records
            .iter()
            .filter(|r| r.product_class == pc && r.risk_type == rt)
            .map(|r| r.qualifier.clone())
            .collect()
    }
}

fn netting_key(r: &CrifRecord) -> NettingKey<'_> {
    (
        &r.netting_set_details,
        r.product_class,
        r.risk_type,
        r.qualifier.as_str(),
        r.bucket.as_str(),
        r.label1.as_str(),
        r.label2.as_str(),
        &r.collect_regulations,
        &r.post_regulations,
        r.im_model,
    )
}

impl FromIterator<CrifRecord> for Crif {
    fn from_iter<I: IntoIterator<Item = CrifRecord>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Crif {
    type Item = CrifRecord;
    type IntoIter = std::vec::IntoIter<CrifRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a Crif {
    type Item = &'a CrifRecord;
    type IntoIter = std::slice::Iter<'a, CrifRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

impl Extend<CrifRecord> for Crif {
    fn extend<I: IntoIterator<Item = CrifRecord>>(&mut self, iter: I) {
        self.records.extend(iter);
    }
}
