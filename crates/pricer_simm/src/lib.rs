//! # Pricer SIMM (L4: Application)
//!
//! ISDA SIMM initial margin from CRIF sensitivities.
//!
//! This crate provides:
//! - CRIF records, netting set details and a record store with netting
//! - A pluggable SIMM calibration ([`SimmConfiguration`]) with an ISDA
//!   SIMM v1.0 table
//! - Delta, vega, curvature and base correlation margins per bucket
//! - Hierarchical aggregation and SIMM parameter add-ons
//! - Regulation splitting (including SEC/CFTC handling) and winning
//!   regulation selection
//! - Rayon-based parallelisation over regulation sets
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │            pricer_simm (L4)             │
//! ├─────────────────────────────────────────┤
//! │  types/         - Sides, classes,      │
//! │                   regulations          │
//! │  crif/          - CrifRecord, Crif     │
//! │  configuration/ - Risk weights,        │
//! │                   correlations         │
//! │  market         - FX rates             │
//! │  calculator/    - SimmCalculator       │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use pricer_simm::{
//!     Crif, CrifRecord, FxRateTable, NettingSetDetails, ProductClass, RiskType, SimmBucketMapper,
//!     SimmCalculator, SimmCalculatorConfig, SimmSide, TabulatedSimmConfiguration,
//! };
//!
//! let crif: Crif = vec![
//!     CrifRecord::new("T1", "NS001", ProductClass::RatesFX, RiskType::IRCurve)
//!         .with_qualifier("USD")
//!         .with_bucket("1")
//!         .with_labels("5y", "Libor3m")
//!         .with_amount("USD", 10_000.0),
//!     CrifRecord::new("T1", "NS001", ProductClass::RatesFX, RiskType::FX)
//!         .with_qualifier("EUR")
//!         .with_amount("USD", 5_000.0),
//! ]
//! .into_iter()
//! .collect();
//!
//! let simm_config = TabulatedSimmConfiguration::isda_v1_0(SimmBucketMapper::new()).unwrap();
//! let fx = FxRateTable::new();
//! let calc = SimmCalculator::new(&crif, &simm_config, &fx, SimmCalculatorConfig::default()).unwrap();
//!
//! let ns: NettingSetDetails = "NS001".into();
//! let results = calc.final_simm_results(SimmSide::Call, &ns).unwrap();
//! assert!(results.results.total() > 0.0);
//! assert!(calc.simm_results_for_netting_set(SimmSide::Call, &ns).unwrap().len() == 1);
//! ```

#![warn(missing_docs)]

pub mod calculator;
pub mod configuration;
pub mod crif;
pub mod error;
pub mod market;
pub mod types;

// Re-export commonly used types
pub use calculator::{
    close_enough, FinalSimmResult, MarginEngine, MarginResult, RegulationCrifs, SecNettingSets,
    SimmCalculator, SimmCalculatorConfig, SimmResultKey, SimmResults, SimmResultsMap, TradeIds,
    WinningRegulations,
};
pub use configuration::{RiskFactor, SimmBucketMapper, SimmConfiguration, TabulatedSimmConfiguration};
pub use crif::{Crif, CrifRecord, NettingSetDetails};
pub use error::{AggregationError, Result, SimmError};
pub use market::{FxRateProvider, FxRateTable};
pub use types::{
    parse_regulation_string, winning_regulation, ImModel, MarginType, ProductClass, Regulation,
    RegulationSet, RiskClass, RiskType, SimmSide, SimmVersion,
};
