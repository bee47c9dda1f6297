//! Enumerations shared across the SIMM engine.

mod classes;
mod regulation;
mod version;

pub use classes::{ImModel, MarginType, ProductClass, RiskClass, RiskType, SimmSide};
pub use regulation::{parse_regulation_string, winning_regulation, Regulation, RegulationSet};
pub use version::SimmVersion;
