//! SIMM calibration parameters.
//!
//! The calculator never hard-codes a risk weight or correlation: every
//! number it needs is requested through the [`SimmConfiguration`] trait.
//! [`TabulatedSimmConfiguration`] is the table-driven implementation and
//! [`TabulatedSimmConfiguration::isda_v1_0`] builds the ISDA SIMM v1.0
//! calibration.
//!
//! Qualifiers are mapped to buckets by a [`SimmBucketMapper`].

mod bucket_mapper;
mod isda_v1_0;
mod tabulated;

pub use bucket_mapper::SimmBucketMapper;
pub use tabulated::TabulatedSimmConfiguration;

use crate::error::Result;
use crate::types::{MarginType, ProductClass, RiskClass, RiskType, SimmVersion};

/// Identifies one side of a correlation lookup.
///
/// # Examples
///
/// ```
/// use pricer_simm::{RiskFactor, RiskType};
///
/// let f = RiskFactor::new(RiskType::IRCurve, "USD", "5y", "Libor3m");
/// assert_eq!(f.qualifier, "USD");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RiskFactor<'a> {
    /// Risk type.
    pub risk_type: RiskType,
    /// Qualifier.
    pub qualifier: &'a str,
    /// First label.
    pub label1: &'a str,
    /// Second label.
    pub label2: &'a str,
}

impl<'a> RiskFactor<'a> {
    /// Creates a risk factor.
    pub fn new(risk_type: RiskType, qualifier: &'a str, label1: &'a str, label2: &'a str) -> Self {
        Self {
            risk_type,
            qualifier,
            label1,
            label2,
        }
    }

    /// Risk factor identified by risk type and qualifier only.
    pub fn qualifier_only(risk_type: RiskType, qualifier: &'a str) -> Self {
        Self::new(risk_type, qualifier, "", "")
    }
}

/// Source of SIMM risk weights, correlations and thresholds.
///
/// Implementations must be thread-safe: the calculator evaluates
/// regulation keys in parallel against a shared configuration.
pub trait SimmConfiguration: Send + Sync {
    /// Configuration name, used in log and error messages.
    fn name(&self) -> &str;

    /// Calibration version.
    fn version(&self) -> SimmVersion;

    /// Whether this configuration was built from a calibration file rather
    /// than a fixed published version.
    fn is_simm_config_calibration(&self) -> bool {
        false
    }

    /// Whether the risk type is part of this calibration.
    fn is_valid_risk_type(&self, risk_type: RiskType) -> bool;

    /// Bucket mapper used for qualifier lookups.
    fn bucket_mapper(&self) -> &SimmBucketMapper;

    /// Delta or vega risk weight.
    fn weight(
        &self,
        risk_type: RiskType,
        qualifier: &str,
        label1: &str,
        calculation_currency: &str,
    ) -> Result<f64>;

    /// Curvature scaling factor for a vol risk type and tenor.
    fn curvature_weight(&self, risk_type: RiskType, label1: &str) -> Result<f64>;

    /// Historical volatility ratio.
    fn historical_volatility_ratio(&self, risk_type: RiskType) -> f64;

    /// Vega to delta scaling; 1 for risk types that do not use it.
    fn sigma(
        &self,
        risk_type: RiskType,
        qualifier: &str,
        label1: &str,
        calculation_currency: &str,
    ) -> Result<f64>;

    /// Concentration threshold, expressed in USD.
    fn concentration_threshold(&self, risk_type: RiskType, qualifier: &str) -> Result<f64>;

    /// Correlation between two risk factors.
    fn correlation(
        &self,
        first: &RiskFactor<'_>,
        second: &RiskFactor<'_>,
        calculation_currency: &str,
    ) -> Result<f64>;

    /// Correlation between two risk classes.
    fn correlation_risk_classes(&self, first: RiskClass, second: RiskClass) -> Result<f64>;

    /// Multiplier applied to the interest rate curvature margin.
    fn curvature_margin_scaling(&self) -> f64;

    /// Product classes, optionally followed by `All`.
    fn product_classes(&self, include_all: bool) -> Vec<ProductClass> {
        let mut out = ProductClass::AGGREGATED.to_vec();
        if include_all {
            out.push(ProductClass::All);
        }
        out
    }

    /// Risk classes, optionally followed by `All`.
    fn risk_classes(&self, include_all: bool) -> Vec<RiskClass> {
        let mut out = RiskClass::AGGREGATED.to_vec();
        if include_all {
            out.push(RiskClass::All);
        }
        out
    }

    /// Margin types, optionally followed by `All`.
    fn margin_types(&self, include_all: bool) -> Vec<MarginType> {
        let mut out = MarginType::AGGREGATED.to_vec();
        if include_all {
            out.push(MarginType::All);
        }
        out
    }
}
