//! SIMM classification enumerations.
//!
//! Each enumeration carries its canonical CRIF string form via `name()`
//! and parses case-insensitively through [`FromStr`]. Derived orderings
//! follow declaration order, which is the iteration order the aggregator
//! relies on.

use std::fmt;
use std::str::FromStr;

use crate::error::SimmError;

/// Side of the margin calculation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SimmSide {
    /// Margin to be collected from the counterparty.
    Call,
    /// Margin to be posted to the counterparty.
    Post,
}

impl SimmSide {
    /// Both sides in calculation order.
    pub const ALL: [SimmSide; 2] = [SimmSide::Call, SimmSide::Post];

    /// Returns the canonical name.
    pub fn name(&self) -> &'static str {
        match self {
            SimmSide::Call => "Call",
            SimmSide::Post => "Post",
        }
    }

    /// Sign applied to curvature sensitivities on this side.
    #[inline]
    pub fn curvature_multiplier(&self) -> f64 {
        match self {
            SimmSide::Call => 1.0,
            SimmSide::Post => -1.0,
        }
    }
}

impl fmt::Display for SimmSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// CRIF product class.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ProductClass {
    /// Rates and FX.
    RatesFX,
    /// Rates only (SIMM-P).
    Rates,
    /// FX only (SIMM-P).
    FX,
    /// Credit.
    Credit,
    /// Equity.
    Equity,
    /// Commodity.
    Commodity,
    /// Blank product class, used by SIMM parameter records.
    Empty,
    /// Other.
    Other,
    /// Synthetic class holding notional-factor add-ons.
    AddOnNotionalFactor,
    /// Synthetic class holding fixed add-ons.
    AddOnFixedAmount,
    /// Aggregate over product classes.
    All,
}

impl ProductClass {
    /// Product classes aggregated by the calculator (everything except `All`).
    pub const AGGREGATED: [ProductClass; 10] = [
        ProductClass::RatesFX,
        ProductClass::Rates,
        ProductClass::FX,
        ProductClass::Credit,
        ProductClass::Equity,
        ProductClass::Commodity,
        ProductClass::Empty,
        ProductClass::Other,
        ProductClass::AddOnNotionalFactor,
        ProductClass::AddOnFixedAmount,
    ];

    /// Returns the canonical CRIF name.
    pub fn name(&self) -> &'static str {
        match self {
            ProductClass::RatesFX => "RatesFX",
            ProductClass::Rates => "Rates",
            ProductClass::FX => "FX",
            ProductClass::Credit => "Credit",
            ProductClass::Equity => "Equity",
            ProductClass::Commodity => "Commodity",
            ProductClass::Empty => "",
            ProductClass::Other => "Other",
            ProductClass::AddOnNotionalFactor => "AddOnNotionalFactor",
            ProductClass::AddOnFixedAmount => "AddOnFixedAmount",
            ProductClass::All => "All",
        }
    }
}

impl fmt::Display for ProductClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ProductClass {
    type Err = SimmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProductClass::AGGREGATED
            .iter()
            .chain(std::iter::once(&ProductClass::All))
            .find(|pc| pc.name().eq_ignore_ascii_case(s.trim()))
            .copied()
            .ok_or_else(|| SimmError::InvalidProductClass(s.to_string()))
    }
}

/// CRIF risk type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RiskType {
    /// Commodity delta.
    Commodity,
    /// Commodity vega.
    CommodityVol,
    /// Non-qualifying credit delta.
    CreditNonQ,
    /// Qualifying credit delta.
    CreditQ,
    /// Qualifying credit vega.
    CreditVol,
    /// Non-qualifying credit vega.
    CreditVolNonQ,
    /// Equity delta.
    Equity,
    /// Equity vega.
    EquityVol,
    /// FX delta.
    FX,
    /// FX vega.
    FXVol,
    /// Inflation delta.
    Inflation,
    /// Interest rate curve delta.
    IRCurve,
    /// Interest rate vega.
    IRVol,
    /// Inflation vega.
    InflationVol,
    /// Credit base correlation.
    BaseCorr,
    /// Cross currency basis.
    XCcyBasis,
    /// Product class multiplier parameter.
    ProductClassMultiplier,
    /// Notional-factor add-on parameter.
    AddOnNotionalFactor,
    /// Notional referenced by notional-factor add-ons.
    Notional,
    /// Fixed add-on parameter.
    AddOnFixedAmount,
    /// Present value (schedule IM).
    PV,
    /// Blank risk type.
    Empty,
    /// Aggregate over risk types.
    All,
}

impl RiskType {
    const PARSEABLE: [RiskType; 23] = [
        RiskType::Commodity,
        RiskType::CommodityVol,
        RiskType::CreditNonQ,
        RiskType::CreditQ,
        RiskType::CreditVol,
        RiskType::CreditVolNonQ,
        RiskType::Equity,
        RiskType::EquityVol,
        RiskType::FX,
        RiskType::FXVol,
        RiskType::Inflation,
        RiskType::IRCurve,
        RiskType::IRVol,
        RiskType::InflationVol,
        RiskType::BaseCorr,
        RiskType::XCcyBasis,
        RiskType::ProductClassMultiplier,
        RiskType::AddOnNotionalFactor,
        RiskType::Notional,
        RiskType::AddOnFixedAmount,
        RiskType::PV,
        RiskType::Empty,
        RiskType::All,
    ];

    /// Returns the canonical CRIF name.
    pub fn name(&self) -> &'static str {
        match self {
            RiskType::Commodity => "Risk_Commodity",
            RiskType::CommodityVol => "Risk_CommodityVol",
            RiskType::CreditNonQ => "Risk_CreditNonQ",
            RiskType::CreditQ => "Risk_CreditQ",
            RiskType::CreditVol => "Risk_CreditVol",
            RiskType::CreditVolNonQ => "Risk_CreditVolNonQ",
            RiskType::Equity => "Risk_Equity",
            RiskType::EquityVol => "Risk_EquityVol",
            RiskType::FX => "Risk_FX",
            RiskType::FXVol => "Risk_FXVol",
            RiskType::Inflation => "Risk_Inflation",
            RiskType::IRCurve => "Risk_IRCurve",
            RiskType::IRVol => "Risk_IRVol",
            RiskType::InflationVol => "Risk_InflationVol",
            RiskType::BaseCorr => "Risk_BaseCorr",
            RiskType::XCcyBasis => "Risk_XCcyBasis",
            RiskType::ProductClassMultiplier => "Param_ProductClassMultiplier",
            RiskType::AddOnNotionalFactor => "Param_AddOnNotionalFactor",
            RiskType::Notional => "Notional",
            RiskType::AddOnFixedAmount => "Param_AddOnFixedAmount",
            RiskType::PV => "PV",
            RiskType::Empty => "",
            RiskType::All => "All",
        }
    }

    /// Whether records of this type are SIMM parameters (add-on inputs)
    /// rather than sensitivities.
    pub fn is_simm_parameter(&self) -> bool {
        matches!(
            self,
            RiskType::ProductClassMultiplier
                | RiskType::AddOnNotionalFactor
                | RiskType::AddOnFixedAmount
        )
    }

    /// Whether the record amount is a currency amount that must be
    /// converted into the result currency.
    pub fn requires_amount_usd(&self) -> bool {
        !matches!(
            self,
            RiskType::ProductClassMultiplier | RiskType::AddOnNotionalFactor
        )
    }
}

impl fmt::Display for RiskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RiskType {
    type Err = SimmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RiskType::PARSEABLE
            .iter()
            .find(|rt| rt.name().eq_ignore_ascii_case(s.trim()))
            .copied()
            .ok_or_else(|| SimmError::InvalidRiskType(s.to_string()))
    }
}

/// SIMM risk class.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RiskClass {
    /// Interest rate.
    InterestRate,
    /// Qualifying credit.
    CreditQualifying,
    /// Non-qualifying credit.
    CreditNonQualifying,
    /// Equity.
    Equity,
    /// Commodity.
    Commodity,
    /// Foreign exchange.
    FX,
    /// Aggregate over risk classes.
    All,
}

impl RiskClass {
    /// Risk classes in correlation matrix order (excluding `All`).
    pub const AGGREGATED: [RiskClass; 6] = [
        RiskClass::InterestRate,
        RiskClass::CreditQualifying,
        RiskClass::CreditNonQualifying,
        RiskClass::Equity,
        RiskClass::Commodity,
        RiskClass::FX,
    ];

    /// Returns the canonical name.
    pub fn name(&self) -> &'static str {
        match self {
            RiskClass::InterestRate => "InterestRate",
            RiskClass::CreditQualifying => "CreditQualifying",
            RiskClass::CreditNonQualifying => "CreditNonQualifying",
            RiskClass::Equity => "Equity",
            RiskClass::Commodity => "Commodity",
            RiskClass::FX => "FX",
            RiskClass::All => "All",
        }
    }

    /// Position in [`RiskClass::AGGREGATED`], `None` for `All`.
    pub fn index(&self) -> Option<usize> {
        RiskClass::AGGREGATED.iter().position(|rc| rc == self)
    }
}

impl fmt::Display for RiskClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// SIMM margin type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MarginType {
    /// Delta margin.
    Delta,
    /// Vega margin.
    Vega,
    /// Curvature margin.
    Curvature,
    /// Base correlation margin.
    BaseCorr,
    /// Additional (add-on) margin.
    AdditionalIM,
    /// Aggregate over margin types.
    All,
}

impl MarginType {
    /// Margin types aggregated by the calculator (excluding `All`).
    pub const AGGREGATED: [MarginType; 5] = [
        MarginType::Delta,
        MarginType::Vega,
        MarginType::Curvature,
        MarginType::BaseCorr,
        MarginType::AdditionalIM,
    ];

    /// Returns the canonical name.
    pub fn name(&self) -> &'static str {
        match self {
            MarginType::Delta => "Delta",
            MarginType::Vega => "Vega",
            MarginType::Curvature => "Curvature",
            MarginType::BaseCorr => "BaseCorr",
            MarginType::AdditionalIM => "AdditionalIM",
            MarginType::All => "All",
        }
    }
}

impl fmt::Display for MarginType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Initial margin model declared on a CRIF record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ImModel {
    /// Schedule IM; excluded from SIMM.
    Schedule,
    /// SIMM.
    Simm,
    /// SIMM for the receiving party.
    SimmR,
    /// SIMM for the posting party.
    SimmP,
    /// Not specified.
    #[default]
    Empty,
}

impl ImModel {
    const ALL: [ImModel; 5] = [
        ImModel::Schedule,
        ImModel::Simm,
        ImModel::SimmR,
        ImModel::SimmP,
        ImModel::Empty,
    ];

    /// Returns the canonical CRIF name.
    pub fn name(&self) -> &'static str {
        match self {
            ImModel::Schedule => "Schedule",
            ImModel::Simm => "SIMM",
            ImModel::SimmR => "SIMM-R",
            ImModel::SimmP => "SIMM-P",
            ImModel::Empty => "",
        }
    }
}

impl fmt::Display for ImModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ImModel {
    type Err = SimmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ImModel::ALL
            .iter()
            .find(|m| m.name().eq_ignore_ascii_case(s.trim()))
            .copied()
            .ok_or_else(|| SimmError::InvalidImModel(s.to_string()))
    }
}
