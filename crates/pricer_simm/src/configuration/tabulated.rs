//! Table-driven SIMM configuration.

use std::collections::{BTreeSet, HashMap};

use statrs::distribution::{ContinuousCDF, Normal};

use super::{RiskFactor, SimmBucketMapper, SimmConfiguration};
use crate::error::{Result, SimmError};
use crate::types::{RiskClass, RiskType, SimmVersion};

/// Square matrix addressed by label.
#[derive(Clone, Debug, Default)]
pub(super) struct LabelledMatrix {
    labels: Vec<String>,
    values: Vec<f64>,
}

impl LabelledMatrix {
    /// Builds a matrix from row-major values.
    pub(super) fn new(labels: &[&str], values: &[f64]) -> Result<Self> {
        let n = labels.len();
        if values.len() != n * n {
            return Err(SimmError::configuration(format!(
                "LabelledMatrix::new(): Expected {} values for {} labels but got {}",
                n * n,
                n,
                values.len()
            )));
        }
        Ok(Self {
            labels: labels.iter().map(|l| l.to_string()).collect(),
            values: values.to_vec(),
        })
    }

    pub(super) fn get(&self, first: &str, second: &str) -> Option<f64> {
        let i = self.labels.iter().position(|l| l == first)?;
        let j = self.labels.iter().position(|l| l == second)?;
        self.values.get(i * self.labels.len() + j).copied()
    }
}

/// Correlation parameters that are single numbers.
#[derive(Clone, Copy, Debug, Default)]
pub(super) struct CorrelationScalars {
    pub(super) xccy: f64,
    pub(super) inflation: f64,
    pub(super) inflation_vol: f64,
    pub(super) ir_sub_curve: f64,
    pub(super) ir_inter_currency: f64,
    pub(super) crq_residual_intra: f64,
    pub(super) crq_same_intra: f64,
    pub(super) crq_diff_intra: f64,
    pub(super) crnq_residual_intra: f64,
    pub(super) crnq_same_intra: f64,
    pub(super) crnq_diff_intra: f64,
    pub(super) crnq_inter: f64,
    pub(super) fx: f64,
    pub(super) base_corr: f64,
}

/// SIMM configuration backed by in-memory tables.
///
/// Risk weights are looked up in order of specificity: flat per risk type,
/// then per bucket, then per bucket and `label1`. Correlations follow the
/// ISDA SIMM rules for each risk type pair.
///
/// # Examples
///
/// ```
/// use pricer_simm::{RiskType, SimmBucketMapper, SimmConfiguration, TabulatedSimmConfiguration};
///
/// let config = TabulatedSimmConfiguration::isda_v1_0(SimmBucketMapper::new()).unwrap();
/// assert_eq!(config.weight(RiskType::FX, "JPY", "", "USD").unwrap(), 7.9);
/// assert_eq!(config.weight(RiskType::IRCurve, "USD", "5y", "USD").unwrap(), 47.0);
/// ```
#[derive(Clone, Debug)]
pub struct TabulatedSimmConfiguration {
    pub(super) name: String,
    pub(super) version: SimmVersion,
    pub(super) calibration: bool,
    pub(super) mpor_days: u32,
    pub(super) mapper: SimmBucketMapper,
    pub(super) valid_risk_types: BTreeSet<RiskType>,
    pub(super) buckets: HashMap<RiskType, Vec<String>>,
    pub(super) labels1: HashMap<RiskType, Vec<String>>,
    pub(super) labels2: HashMap<RiskType, Vec<String>>,
    pub(super) rw_risk_type: HashMap<RiskType, f64>,
    pub(super) rw_bucket: HashMap<RiskType, Vec<f64>>,
    pub(super) rw_label1: HashMap<(RiskType, String), Vec<f64>>,
    pub(super) curvature_weights: HashMap<RiskType, Vec<f64>>,
    pub(super) historical_volatility_ratios: HashMap<RiskType, f64>,
    pub(super) risk_class_correlation: Vec<f64>,
    pub(super) ir_tenor_correlation: LabelledMatrix,
    pub(super) inter_bucket_correlation: HashMap<RiskType, LabelledMatrix>,
    pub(super) intra_bucket_correlation: HashMap<RiskType, Vec<f64>>,
    pub(super) scalars: CorrelationScalars,
    pub(super) concentration_thresholds: HashMap<RiskType, f64>,
    pub(super) curvature_margin_scaling: f64,
    pub(super) sigma_multiplier: f64,
}

impl TabulatedSimmConfiguration {
    /// Computes `sqrt(365 / (1.4 * mpor)) / N^-1(0.99)`.
    pub(super) fn sigma_multiplier_for(mpor_days: u32) -> Result<f64> {
        if mpor_days == 0 {
            return Err(SimmError::configuration(
                "TabulatedSimmConfiguration: margin period of risk must be positive",
            ));
        }
        let normal = Normal::new(0.0, 1.0).map_err(|e| SimmError::configuration(e.to_string()))?;
        Ok((365.0 / (1.4 * f64::from(mpor_days))).sqrt() / normal.inverse_cdf(0.99))
    }

    /// Margin period of risk in days.
    pub fn mpor_days(&self) -> u32 {
        self.mpor_days
    }

    /// Buckets defined for a risk type (empty if unbucketed).
    pub fn buckets(&self, risk_type: RiskType) -> &[String] {
        self.buckets
            .get(&risk_type)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Valid `label1` values for a risk type.
    pub fn labels1(&self, risk_type: RiskType) -> &[String] {
        self.labels1
            .get(&risk_type)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Valid `label2` values for a risk type.
    pub fn labels2(&self, risk_type: RiskType) -> &[String] {
        self.labels2
            .get(&risk_type)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn check_risk_type(&self, risk_type: RiskType) -> Result<()> {
        if self.is_valid_risk_type(risk_type) {
            Ok(())
        } else {
            Err(SimmError::configuration(format!(
                "The risk type {} is not valid for SIMM configuration with name {}",
                risk_type, self.name
            )))
        }
    }

    fn label_index(label: &str, labels: &[String]) -> Result<usize> {
        if labels.is_empty() {
            return Err(SimmError::configuration("Labels cannot be empty"));
        }
        labels.iter().position(|l| l == label).ok_or_else(|| {
            SimmError::configuration(format!(
                "The label '{}' could not be found in the labels",
                label
            ))
        })
    }

    fn bucket_index(&self, risk_type: RiskType, bucket: &str) -> Result<usize> {
        self.buckets(risk_type)
            .iter()
            .position(|b| b == bucket)
            .ok_or_else(|| {
                SimmError::configuration(format!(
                    "The bucket '{}' is not defined for risk type {}",
                    bucket, risk_type
                ))
            })
    }

    fn intra_bucket(&self, risk_type: RiskType, bucket: &str) -> Result<f64> {
        let idx = self.bucket_index(risk_type, bucket)?;
        self.intra_bucket_correlation
            .get(&risk_type)
            .and_then(|v| v.get(idx))
            .copied()
            .ok_or_else(|| {
                SimmError::configuration(format!(
                    "Could not find intra-bucket correlation for risk type {} and bucket {}",
                    risk_type, bucket
                ))
            })
    }

    fn inter_bucket(&self, risk_type: RiskType, first: &str, second: &str) -> Result<f64> {
        self.inter_bucket_correlation
            .get(&risk_type)
            .and_then(|m| m.get(first, second))
            .ok_or_else(|| {
                SimmError::configuration(format!(
                    "Could not find correlation for risk type {} and buckets {}, {}",
                    risk_type, first, second
                ))
            })
    }

    fn buckets_of(&self, first: &RiskFactor<'_>, second: &RiskFactor<'_>) -> Result<(String, String)> {
        Ok((
            self.mapper.bucket(first.risk_type, first.qualifier)?,
            self.mapper.bucket(second.risk_type, second.qualifier)?,
        ))
    }

    fn credit_correlation(
        &self,
        first: &RiskFactor<'_>,
        second: &RiskFactor<'_>,
        qualifying: bool,
    ) -> Result<f64> {
        let s = &self.scalars;
        let (b1, b2) = self.buckets_of(first, second)?;
        if b1 == "Residual" || b2 == "Residual" {
            let residual = if qualifying {
                s.crq_residual_intra
            } else {
                s.crnq_residual_intra
            };
            return Ok(if b1 == b2 { residual } else { 0.0 });
        }

        if qualifying {
            if b1 == b2 {
                Ok(if first.qualifier == second.qualifier {
                    s.crq_same_intra
                } else {
                    s.crq_diff_intra
                })
            } else {
                self.inter_bucket(RiskType::CreditQ, &b1, &b2)
            }
        } else if b1 == b2 {
            // From v2.2 names are grouped by label2 rather than by qualifier.
            let same = if self.calibration || self.version >= SimmVersion::V2_2 {
                first.label2 == second.label2
            } else {
                first.qualifier == second.qualifier
            };
            Ok(if same {
                s.crnq_same_intra
            } else {
                s.crnq_diff_intra
            })
        } else {
            Ok(s.crnq_inter)
        }
    }
}

fn both(first: &RiskFactor<'_>, second: &RiskFactor<'_>, a: RiskType, b: RiskType) -> bool {
    (first.risk_type == a && second.risk_type == a) || (first.risk_type == b && second.risk_type == b)
}

fn is_currency(code: &str) -> bool {
    code.len() == 3 && code.bytes().all(|c| c.is_ascii_uppercase())
}

impl SimmConfiguration for TabulatedSimmConfiguration {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> SimmVersion {
        self.version
    }

    fn is_simm_config_calibration(&self) -> bool {
        self.calibration
    }

    fn is_valid_risk_type(&self, risk_type: RiskType) -> bool {
        self.valid_risk_types.contains(&risk_type)
    }

    fn bucket_mapper(&self) -> &SimmBucketMapper {
        &self.mapper
    }

    fn weight(
        &self,
        risk_type: RiskType,
        qualifier: &str,
        label1: &str,
        _calculation_currency: &str,
    ) -> Result<f64> {
        self.check_risk_type(risk_type)?;

        if let Some(w) = self.rw_risk_type.get(&risk_type) {
            return Ok(*w);
        }

        let bucket = self.mapper.bucket(risk_type, qualifier)?;

        if let Some(weights) = self.rw_bucket.get(&risk_type) {
            let idx = self.bucket_index(risk_type, &bucket)?;
            return weights.get(idx).copied().ok_or_else(|| {
                SimmError::configuration(format!(
                    "Could not find risk weight for risk type {} and bucket {}",
                    risk_type, bucket
                ))
            });
        }

        if let Some(weights) = self.rw_label1.get(&(risk_type, bucket.clone())) {
            let idx = Self::label_index(label1, self.labels1(risk_type))?;
            return weights.get(idx).copied().ok_or_else(|| {
                SimmError::configuration(format!(
                    "Could not find risk weight for risk type {}, bucket {} and label1 {}",
                    risk_type, bucket, label1
                ))
            });
        }

        Err(SimmError::configuration(format!(
            "Could not find risk weight for risk type {}, qualifier {} and label1 {}",
            risk_type, qualifier, label1
        )))
    }

    fn curvature_weight(&self, risk_type: RiskType, label1: &str) -> Result<f64> {
        self.check_risk_type(risk_type)?;
        let weights = self.curvature_weights.get(&risk_type).ok_or_else(|| {
            SimmError::configuration(format!(
                "The risk type {} does not have a curvature weight",
                risk_type
            ))
        })?;
        let idx = Self::label_index(label1, self.labels1(risk_type))?;
        weights.get(idx).copied().ok_or_else(|| {
            SimmError::configuration(format!(
                "Could not find curvature weight for risk type {} and label1 {}",
                risk_type, label1
            ))
        })
    }

    fn historical_volatility_ratio(&self, risk_type: RiskType) -> f64 {
        self.historical_volatility_ratios
            .get(&risk_type)
            .copied()
            .unwrap_or(1.0)
    }

    fn sigma(
        &self,
        risk_type: RiskType,
        qualifier: &str,
        label1: &str,
        calculation_currency: &str,
    ) -> Result<f64> {
        let delta_weight = match risk_type {
            RiskType::CommodityVol => {
                self.weight(RiskType::Commodity, qualifier, label1, calculation_currency)?
            }
            RiskType::EquityVol => {
                self.weight(RiskType::Equity, qualifier, label1, calculation_currency)?
            }
            RiskType::FXVol => {
                let (ccy1, ccy2) = match (qualifier.get(..3), qualifier.get(3..)) {
                    (Some(a), Some(b)) if is_currency(a) && is_currency(b) => (a, b),
                    _ => {
                        return Err(SimmError::configuration(format!(
                            "TabulatedSimmConfiguration::sigma(): FX vol qualifier {} must be a currency pair",
                            qualifier
                        )))
                    }
                };
                self.weight(RiskType::FX, ccy1, label1, ccy2)?
            }
            _ => return Ok(1.0),
        };
        Ok(self.sigma_multiplier * delta_weight)
    }

    fn concentration_threshold(&self, risk_type: RiskType, _qualifier: &str) -> Result<f64> {
        Ok(self
            .concentration_thresholds
            .get(&risk_type)
            .copied()
            .unwrap_or(f64::MAX))
    }

    fn correlation(
        &self,
        first: &RiskFactor<'_>,
        second: &RiskFactor<'_>,
        _calculation_currency: &str,
    ) -> Result<f64> {
        use RiskType::*;

        self.check_risk_type(first.risk_type)?;
        self.check_risk_type(second.risk_type)?;

        if first == second {
            return Ok(1.0);
        }

        let s = &self.scalars;
        let same_qualifier = first.qualifier == second.qualifier;

        if both(first, second, Equity, EquityVol) {
            let (b1, b2) = self.buckets_of(first, second)?;
            if b1 == "Residual" || b2 == "Residual" {
                return Ok(if same_qualifier { 1.0 } else { 0.0 });
            }
            if b1 == b2 {
                return if same_qualifier {
                    Ok(1.0)
                } else {
                    self.intra_bucket(Equity, &b1)
                };
            }
            return self.inter_bucket(Equity, &b1, &b2);
        }

        if both(first, second, CreditQ, CreditVol) {
            return self.credit_correlation(first, second, true);
        }

        if both(first, second, CreditNonQ, CreditVolNonQ) {
            return self.credit_correlation(first, second, false);
        }

        if both(first, second, Commodity, CommodityVol) {
            let (b1, b2) = self.buckets_of(first, second)?;
            if b1 == b2 {
                return if same_qualifier {
                    Ok(1.0)
                } else {
                    self.intra_bucket(Commodity, &b1)
                };
            }
            return self.inter_bucket(Commodity, &b1, &b2);
        }

        if first.risk_type != second.risk_type && same_qualifier {
            let pair = (first.risk_type, second.risk_type);
            match pair {
                (IRCurve | Inflation, XCcyBasis) | (XCcyBasis, IRCurve | Inflation) => {
                    return Ok(s.xccy)
                }
                (IRCurve, Inflation) | (Inflation, IRCurve) => return Ok(s.inflation),
                (IRVol, InflationVol) | (InflationVol, IRVol) => return Ok(s.inflation_vol),
                _ => {}
            }
        }

        if both(first, second, IRCurve, IRVol) {
            if !same_qualifier {
                return Ok(s.ir_inter_currency);
            }
            if first.label2 != second.label2 {
                if !first.label1.is_empty() || !second.label1.is_empty() {
                    return Err(SimmError::configuration(
                        "Sub-curve correlations require both label1 values to be empty",
                    ));
                }
                if first.risk_type == IRVol {
                    return Err(SimmError::configuration(
                        "There is no correlation at the label2 level for Risk_IRVol",
                    ));
                }
                return Ok(s.ir_sub_curve);
            }
            return self
                .ir_tenor_correlation
                .get(first.label1, second.label1)
                .ok_or_else(|| {
                    SimmError::configuration(format!(
                        "Could not find tenor correlation between {} and {}",
                        first.label1, second.label1
                    ))
                });
        }

        if first.risk_type == InflationVol && second.risk_type == InflationVol {
            return Ok(1.0);
        }

        if both(first, second, FX, FXVol) {
            return Ok(if same_qualifier { 1.0 } else { s.fx });
        }

        if first.risk_type == BaseCorr && second.risk_type == BaseCorr {
            return Ok(s.base_corr);
        }

        Ok(0.0)
    }

    fn correlation_risk_classes(&self, first: RiskClass, second: RiskClass) -> Result<f64> {
        if first == second {
            return Ok(1.0);
        }
        let n = RiskClass::AGGREGATED.len();
        match (first.index(), second.index()) {
            (Some(i), Some(j)) => self
                .risk_class_correlation
                .get(i * n + j)
                .copied()
                .ok_or_else(|| {
                    SimmError::configuration(format!(
                        "Could not find risk class correlation between {} and {}",
                        first, second
                    ))
                }),
            _ => Err(SimmError::configuration(format!(
                "Could not find risk class correlation between {} and {}",
                first, second
            ))),
        }
    }

    fn curvature_margin_scaling(&self) -> f64 {
        self.curvature_margin_scaling
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn config() -> TabulatedSimmConfiguration {
        let mut mapper = SimmBucketMapper::new();
        mapper.add_mapping(RiskType::Equity, "A", "1").unwrap();
        mapper.add_mapping(RiskType::Equity, "B", "1").unwrap();
        mapper.add_mapping(RiskType::Equity, "C", "5").unwrap();
        mapper.add_mapping(RiskType::CreditQ, "I1", "2").unwrap();
        mapper.add_mapping(RiskType::CreditQ, "I2", "3").unwrap();
        mapper.add_mapping(RiskType::Commodity, "Coal", "1").unwrap();
        TabulatedSimmConfiguration::isda_v1_0(mapper).unwrap()
    }

    fn f(rt: RiskType, q: &'static str) -> RiskFactor<'static> {
        RiskFactor::qualifier_only(rt, q)
    }

    #[test]
    fn test_labelled_matrix_rejects_wrong_size() {
        assert!(LabelledMatrix::new(&["a", "b"], &[1.0, 0.5, 0.5]).is_err());
        let m = LabelledMatrix::new(&["a", "b"], &[1.0, 0.3, 0.3, 1.0]).unwrap();
        assert_eq!(m.get("b", "a"), Some(0.3));
        assert_eq!(m.get("c", "a"), None);
    }

    #[test]
    fn test_sigma_multiplier() {
        let m = TabulatedSimmConfiguration::sigma_multiplier_for(10).unwrap();
        assert_relative_eq!(m, 2.194_864_712_328_15, epsilon = 1e-9);
        assert!(TabulatedSimmConfiguration::sigma_multiplier_for(0).is_err());
    }

    #[test]
    fn test_weights() {
        let c = config();
        assert_eq!(c.weight(RiskType::Equity, "C", "", "USD").unwrap(), 18.0);
        assert_eq!(c.weight(RiskType::Equity, "unmapped", "", "USD").unwrap(), 28.0);
        assert_eq!(c.weight(RiskType::IRCurve, "JPY", "1y", "USD").unwrap(), 13.0);
        assert_eq!(c.weight(RiskType::CommodityVol, "Coal", "1y", "USD").unwrap(), 0.36);
        assert!(c.weight(RiskType::IRCurve, "USD", "7y", "USD").is_err());
        assert!(c.weight(RiskType::XCcyBasis, "USD", "", "USD").is_err());
    }

    #[test]
    fn test_sigma() {
        let c = config();
        let m = c.sigma_multiplier;
        assert_relative_eq!(c.sigma(RiskType::EquityVol, "A", "1y", "USD").unwrap(), 22.0 * m);
        assert_relative_eq!(c.sigma(RiskType::FXVol, "EURUSD", "1y", "USD").unwrap(), 7.9 * m);
        assert_eq!(c.sigma(RiskType::IRVol, "USD", "1y", "USD").unwrap(), 1.0);
        assert!(c.sigma(RiskType::FXVol, "EUR", "1y", "USD").is_err());
    }

    #[test]
    fn test_curvature_weight() {
        let c = config();
        assert_eq!(c.curvature_weight(RiskType::IRVol, "2w").unwrap(), 0.5);
        assert_relative_eq!(
            c.curvature_weight(RiskType::CreditVol, "2y").unwrap(),
            0.5 * 14.0 / 730.0
        );
        assert!(c.curvature_weight(RiskType::FX, "1y").is_err());
    }

    #[test]
    fn test_equity_correlations() {
        let c = config();
        let ccy = "USD";
        assert_eq!(c.correlation(&f(RiskType::Equity, "A"), &f(RiskType::Equity, "B"), ccy).unwrap(), 0.14);
        assert_eq!(c.correlation(&f(RiskType::Equity, "A"), &f(RiskType::Equity, "C"), ccy).unwrap(), 0.08);
        assert_eq!(c.correlation(&f(RiskType::Equity, "A"), &f(RiskType::Equity, "Z"), ccy).unwrap(), 0.0);
        assert_eq!(c.correlation(&f(RiskType::Equity, "Z"), &f(RiskType::Equity, "Z"), ccy).unwrap(), 1.0);
    }

    #[test]
    fn test_credit_correlations() {
        let c = config();
        let ccy = "USD";
        let same = RiskFactor::new(RiskType::CreditQ, "I1", "1y", "");
        let other_tenor = RiskFactor::new(RiskType::CreditQ, "I1", "5y", "");
        assert_eq!(c.correlation(&same, &other_tenor, ccy).unwrap(), 0.98);
        assert_eq!(c.correlation(&f(RiskType::CreditQ, "I1"), &f(RiskType::CreditQ, "I2"), ccy).unwrap(), 0.52);
        assert_eq!(c.correlation(&f(RiskType::CreditQ, "X"), &f(RiskType::CreditQ, "Y"), ccy).unwrap(), 0.5);
        assert_eq!(c.correlation(&f(RiskType::CreditQ, "X"), &f(RiskType::CreditQ, "I1"), ccy).unwrap(), 0.0);
        assert_eq!(c.correlation(&f(RiskType::CreditNonQ, "X"), &f(RiskType::CreditNonQ, "Y"), ccy).unwrap(), 0.5);
    }

    #[test]
    fn test_ir_correlations() {
        let c = config();
        let ccy = "USD";
        let a = RiskFactor::new(RiskType::IRCurve, "USD", "", "Libor3m");
        let b = RiskFactor::new(RiskType::IRCurve, "USD", "", "Libor6m");
        assert_eq!(c.correlation(&a, &b, ccy).unwrap(), 0.982);
        let a = RiskFactor::new(RiskType::IRCurve, "USD", "1y", "");
        let b = RiskFactor::new(RiskType::IRCurve, "USD", "2y", "");
        assert_eq!(c.correlation(&a, &b, ccy).unwrap(), 0.917);
        assert_eq!(c.correlation(&f(RiskType::IRCurve, "USD"), &f(RiskType::IRCurve, "EUR"), ccy).unwrap(), 0.27);
        assert_eq!(c.correlation(&f(RiskType::IRCurve, "USD"), &f(RiskType::Inflation, "USD"), ccy).unwrap(), 0.33);
        let bad = RiskFactor::new(RiskType::IRVol, "USD", "1y", "x");
        assert!(c.correlation(&bad, &RiskFactor::new(RiskType::IRVol, "USD", "1y", "y"), ccy).is_err());
    }

    #[test]
    fn test_fx_and_commodity_correlations() {
        let c = config();
        let ccy = "USD";
        assert_eq!(c.correlation(&f(RiskType::FX, "EUR"), &f(RiskType::FX, "JPY"), ccy).unwrap(), 0.5);
        assert_eq!(c.correlation(&f(RiskType::Commodity, "Coal"), &f(RiskType::Commodity, "Gas"), ccy).unwrap(), 0.0);
        assert_eq!(c.correlation(&f(RiskType::Commodity, "Gas"), &f(RiskType::Commodity, "Oil"), ccy).unwrap(), 0.0);
        assert_eq!(c.correlation(&f(RiskType::FX, "EUR"), &f(RiskType::Equity, "EUR"), ccy).unwrap(), 0.0);
    }

    #[test]
    fn test_risk_class_correlation() {
        let c = config();
        assert_eq!(c.correlation_risk_classes(RiskClass::Equity, RiskClass::Equity).unwrap(), 1.0);
        assert_eq!(
            c.correlation_risk_classes(RiskClass::InterestRate, RiskClass::FX).unwrap(),
            0.27
        );
        assert_eq!(
            c.correlation_risk_classes(RiskClass::CreditQualifying, RiskClass::Equity).unwrap(),
            0.58
        );
        assert!(c.correlation_risk_classes(RiskClass::All, RiskClass::FX).is_err());
    }
}
