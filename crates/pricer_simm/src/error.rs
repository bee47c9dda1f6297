//! SIMM error types.
//!
//! Every fatal condition raised while cleaning, splitting or aggregating
//! CRIF records surfaces as a [`SimmError`]. Messages are prefixed with the
//! subsystem and operation that raised them, e.g.
//! `SimmCalculator::margin(): ...`.

use thiserror::Error;

/// Convenience alias for results produced by this crate.
pub type Result<T> = std::result::Result<T, SimmError>;

/// Errors that can occur during a SIMM calculation.
#[derive(Debug, Error)]
pub enum SimmError {
    /// The SIMM configuration could not answer a request (unknown label,
    /// bucket, risk weight or unsupported risk type).
    #[error("{0}")]
    Configuration(String),

    /// No FX rate is available for the requested currency pair.
    #[error("{context}: No FX rate available for pair {pair}")]
    MissingFxRate {
        /// Operation that requested the rate.
        context: String,
        /// Requested currency pair, e.g. `EURUSD`.
        pair: String,
    },

    /// More records than allowed were found for a risk type and qualifier.
    #[error(
        "{context}: Expected either 0 or 1 elements for risk type {risk_type} and qualifier {qualifier} but got {count}"
    )]
    Cardinality {
        /// Operation that detected the violation.
        context: String,
        /// Risk type string, e.g. `Risk_XCcyBasis`.
        risk_type: String,
        /// Offending qualifier.
        qualifier: String,
        /// Number of records found.
        count: usize,
    },

    /// A currency code is not a valid ISO code.
    #[error("{context}: The {role} ({code}) must be a valid ISO currency code")]
    InvalidCurrency {
        /// Operation that validated the code.
        context: String,
        /// What the currency is used for, e.g. `result currency`.
        role: String,
        /// Offending code.
        code: String,
    },

    /// A risk type string could not be parsed.
    #[error("Risk type string {0} does not correspond to a valid RiskType")]
    InvalidRiskType(String),

    /// A product class string could not be parsed.
    #[error("Product class string {0} does not correspond to a valid ProductClass")]
    InvalidProductClass(String),

    /// An IM model string could not be parsed.
    #[error("IM model string {0} does not correspond to a valid ImModel")]
    InvalidImModel(String),

    /// A SIMM version string could not be parsed.
    #[error("SIMM version string {0} is not supported")]
    InvalidVersion(String),

    /// A bucket mapping carried an unusable bucket value.
    #[error("SimmBucketMapper::add_mapping(): Invalid bucket '{bucket}' for qualifier {qualifier}")]
    InvalidBucket {
        /// Qualifier being mapped.
        qualifier: String,
        /// Rejected bucket value.
        bucket: String,
    },

    /// A product class multiplier carried a negative factor.
    #[error(
        "SimmCalculator::calc_add_margin(): Amount for risk type {risk_type} must be greater than or equal to 0 but we got {factor}"
    )]
    NegativeMultiplier {
        /// Risk type string of the parameter record.
        risk_type: String,
        /// Offending factor.
        factor: f64,
    },

    /// No winning regulation can be chosen from an empty set.
    #[error("winning_regulation(): Input set is empty")]
    EmptyRegulationSet,

    /// Requested results do not exist.
    #[error("SimmCalculator::{accessor}(): Could not find {what}")]
    ResultsNotFound {
        /// Accessor that failed.
        accessor: &'static str,
        /// Description of the missing key.
        what: String,
    },

    /// Regulation splitting failed.
    #[error(transparent)]
    Aggregation(#[from] AggregationError),
}

/// Errors raised by the regulation splitter.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AggregationError {
    /// Duplicate-regulation cleanup did not reach a fixed point.
    #[error(
        "SimmCalculator::split_by_regulation(): Duplicate regulation cleanup for netting set [{netting_set}] did not converge after {iterations} iterations"
    )]
    CleanupDidNotConverge {
        /// Netting set being processed.
        netting_set: String,
        /// Iteration cap that was hit.
        iterations: usize,
    },
}

impl SimmError {
    /// Builds a configuration error from any displayable message.
    pub fn configuration(msg: impl Into<String>) -> Self {
        SimmError::Configuration(msg.into())
    }

    /// Builds a not-found error for a calculator accessor.
    pub(crate) fn not_found(accessor: &'static str, what: impl Into<String>) -> Self {
        SimmError::ResultsNotFound {
            accessor,
            what: what.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_missing_fx_rate() {
        let err = SimmError::MissingFxRate {
            context: "SimmCalculator::new()".to_string(),
            pair: "EURUSD".to_string(),
        };
        assert_eq!(
            format!("{}", err),
            "SimmCalculator::new(): No FX rate available for pair EURUSD"
        );
    }

    #[test]
    fn test_error_display_cardinality() {
        let err = SimmError::Cardinality {
            context: "SimmCalculator::ir_delta_margin()".to_string(),
            risk_type: "Risk_XCcyBasis".to_string(),
            qualifier: "USD".to_string(),
            count: 2,
        };
        assert_eq!(
            format!("{}", err),
            "SimmCalculator::ir_delta_margin(): Expected either 0 or 1 elements for risk type Risk_XCcyBasis and qualifier USD but got 2"
        );
    }

    #[test]
    fn test_error_display_invalid_currency() {
        let err = SimmError::InvalidCurrency {
            context: "SimmCalculator::new()".to_string(),
            role: "result currency".to_string(),
            code: "usd".to_string(),
        };
        assert_eq!(
            format!("{}", err),
            "SimmCalculator::new(): The result currency (usd) must be a valid ISO currency code"
        );
    }

    #[test]
    fn test_error_display_negative_multiplier() {
        let err = SimmError::NegativeMultiplier {
            risk_type: "Param_ProductClassMultiplier".to_string(),
            factor: -0.5,
        };
        assert!(format!("{}", err).ends_with("but we got -0.5"));
    }

    #[test]
    fn test_error_display_results_not_found() {
        let err = SimmError::not_found("winning_regulation", "netting set [pf]");
        assert_eq!(
            format!("{}", err),
            "SimmCalculator::winning_regulation(): Could not find netting set [pf]"
        );
    }

    #[test]
    fn test_aggregation_error_converts() {
        let err: SimmError = AggregationError::CleanupDidNotConverge {
            netting_set: "pf".to_string(),
            iterations: 1000,
        }
        .into();
        assert!(matches!(err, SimmError::Aggregation(_)));
        assert!(err.to_string().contains("after 1000 iterations"));
    }

    #[test]
    fn test_error_display_parse_failures() {
        assert_eq!(
            SimmError::InvalidRiskType("Risk_Foo".to_string()).to_string(),
            "Risk type string Risk_Foo does not correspond to a valid RiskType"
        );
        assert_eq!(
            SimmError::InvalidProductClass("Foo".to_string()).to_string(),
            "Product class string Foo does not correspond to a valid ProductClass"
        );
        assert_eq!(
            SimmError::InvalidImModel("Foo".to_string()).to_string(),
            "IM model string Foo does not correspond to a valid ImModel"
        );
        assert_eq!(
            SimmError::InvalidVersion("9.9".to_string()).to_string(),
            "SIMM version string 9.9 is not supported"
        );
    }

    #[test]
    fn test_error_display_configuration_and_bucket() {
        assert_eq!(SimmError::configuration("bad label").to_string(), "bad label");
        let err = SimmError::InvalidBucket {
            qualifier: "ACME".to_string(),
            bucket: "0".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "SimmBucketMapper::add_mapping(): Invalid bucket '0' for qualifier ACME"
        );
    }

    #[test]
    fn test_error_is_error_trait() {
        let err: Box<dyn std::error::Error> = Box::new(SimmError::EmptyRegulationSet);
        assert!(err.to_string().contains("empty"));
    }
}
