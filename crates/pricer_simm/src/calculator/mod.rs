//! The SIMM calculator.
//!
//! [`SimmCalculator::new`] runs the whole pipeline:
//!
//! ```text
//! CRIF ─▶ clean ─▶ split by side / netting set / regulation set
//!                     │
//!                     ▼  (rayon, one task per regulation set)
//!          delta, vega, curvature, base correlation margins
//!                     │
//!                     ▼
//!          hierarchical roll-up ─▶ add-ons
//!                     │
//!                     ▼
//!          winning regulation ─▶ final results
//! ```

mod add_on;
mod aggregation;
mod config;
mod margin;
mod results;
mod splitter;
mod winning;

pub use config::{SecNettingSets, SimmCalculatorConfig};
pub use margin::{close_enough, MarginEngine, MarginResult};
pub use results::{SimmResultKey, SimmResults};
pub use splitter::{RegulationCrifs, TradeIds};
pub use winning::{FinalSimmResult, SimmResultsMap, WinningRegulations};

use std::collections::{BTreeMap, BTreeSet, HashMap};

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::configuration::SimmConfiguration;
use crate::crif::{Crif, CrifRecord, NettingSetDetails};
use crate::error::{Result, SimmError};
use crate::market::FxRateProvider;
use crate::types::{ImModel, MarginType, ProductClass, Regulation, RegulationSet, RiskClass, RiskType, SimmSide};

use splitter::RegulationPresence;

const DELTA: [(RiskClass, RiskType); 5] = [
    (RiskClass::FX, RiskType::FX),
    (RiskClass::CreditQualifying, RiskType::CreditQ),
    (RiskClass::CreditNonQualifying, RiskType::CreditNonQ),
    (RiskClass::Equity, RiskType::Equity),
    (RiskClass::Commodity, RiskType::Commodity),
];

const VEGA: [(RiskClass, RiskType); 5] = [
    (RiskClass::FX, RiskType::FXVol),
    (RiskClass::CreditQualifying, RiskType::CreditVol),
    (RiskClass::CreditNonQualifying, RiskType::CreditVolNonQ),
    (RiskClass::Equity, RiskType::EquityVol),
    (RiskClass::Commodity, RiskType::CommodityVol),
];

/// Risk class, risk type and whether credit style absolute sums are used.
const CURVATURE: [(RiskClass, RiskType, bool); 5] = [
    (RiskClass::FX, RiskType::FXVol, false),
    (RiskClass::CreditQualifying, RiskType::CreditVol, true),
    (RiskClass::CreditNonQualifying, RiskType::CreditVolNonQ, true),
    (RiskClass::Equity, RiskType::EquityVol, false),
    (RiskClass::Commodity, RiskType::CommodityVol, false),
];

type FinalResults = BTreeMap<SimmSide, BTreeMap<NettingSetDetails, FinalSimmResult>>;

/// ISDA SIMM initial margin calculator.
///
/// All work happens in [`SimmCalculator::new`]; the instance afterwards
/// only answers queries, except for
/// [`populate_final_results`](SimmCalculator::populate_final_results)
/// which imposes externally chosen winning regulations.
///
/// # Examples
///
/// ```
/// use pricer_simm::{
///     Crif, CrifRecord, FxRateTable, NettingSetDetails, ProductClass, Regulation, RiskType, SimmBucketMapper,
///     SimmCalculator, SimmCalculatorConfig, SimmSide, TabulatedSimmConfiguration,
/// };
///
/// let crif: Crif = vec![
///     CrifRecord::new("T1", "PF", ProductClass::RatesFX, RiskType::FX)
///         .with_qualifier("EUR")
///         .with_amount("USD", 1_000.0),
/// ]
/// .into_iter()
/// .collect();
///
/// let simm_config = TabulatedSimmConfiguration::isda_v1_0(SimmBucketMapper::new()).unwrap();
/// let fx = FxRateTable::new();
/// let calc = SimmCalculator::new(&crif, &simm_config, &fx, SimmCalculatorConfig::default()).unwrap();
///
/// let pf: NettingSetDetails = "PF".into();
/// assert_eq!(calc.winning_regulation(SimmSide::Call, &pf).unwrap(), Regulation::Unspecified);
/// let im = calc.final_simm_results(SimmSide::Call, &pf).unwrap().results.total();
/// assert!((im - 7_900.0).abs() < 1e-9);
/// ```
#[derive(Debug)]
pub struct SimmCalculator {
    config: SimmCalculatorConfig,
    result_currency: String,
    crif: Crif,
    regulation_crifs: BTreeMap<SimmSide, BTreeMap<NettingSetDetails, RegulationCrifs>>,
    simm_results: SimmResultsMap,
    winning_regulations: WinningRegulations,
    final_results: FinalResults,
    simm_parameters: Crif,
    trade_ids: TradeIds,
    final_trade_ids: BTreeMap<SimmSide, BTreeSet<String>>,
}

impl SimmCalculator {
    /// Cleans `crif`, splits it by regulation and calculates SIMM for every
    /// side, netting set and regulation set.
    ///
    /// # Errors
    ///
    /// Fails on invalid currencies, missing FX rates, configuration lookups
    /// that cannot be answered, cardinality violations in the CRIF and a
    /// duplicate regulation cleanup that does not converge.
    pub fn new(
        crif: &Crif,
        simm_config: &dyn SimmConfiguration,
        fx: &dyn FxRateProvider,
        config: SimmCalculatorConfig,
    ) -> Result<Self> {
        config.validate()?;
        let result_currency = config.result_currency().to_string();

        let mut calc = Self {
            config,
            result_currency,
            crif: Crif::new(),
            regulation_crifs: BTreeMap::new(),
            simm_results: SimmResultsMap::new(),
            winning_regulations: WinningRegulations::new(),
            final_results: FinalResults::new(),
            simm_parameters: Crif::new(),
            trade_ids: TradeIds::new(),
            final_trade_ids: BTreeMap::new(),
        };

        let presence = calc.clean(crif, fx)?;
        if calc.crif.is_empty() {
            return Ok(calc);
        }

        let split = splitter::split_by_regulation(calc.crif.records(), &presence, &calc.config)?;
        calc.regulation_crifs = split.crifs;
        calc.trade_ids = split.trade_ids;

        let tasks: Vec<(SimmSide, &NettingSetDetails, &RegulationSet, &Crif)> = calc
            .regulation_crifs
            .iter()
            .flat_map(|(side, by_nsd)| {
                by_nsd.iter().flat_map(move |(nsd, by_regs)| {
                    by_regs
                        .iter()
                        .map(move |(regs, crif)| (*side, nsd, regs, crif))
                })
            })
            .filter(|(_, _, _, crif)| {
                crif.has_crif_records()
                    || !crif
                        .filter_by(ProductClass::Empty, RiskType::AddOnFixedAmount)
                        .is_empty()
            })
            .collect();

        let computed: Vec<(SimmResults, Vec<CrifRecord>)> = tasks
            .par_iter()
            .map(|&(side, nsd, regs, crif)| {
                calculate_regulation_simm(
                    simm_config,
                    fx,
                    &calc.config,
                    &calc.result_currency,
                    side,
                    nsd,
                    regs,
                    crif,
                )
            })
            .collect::<Result<_>>()?;

        let mut simm_results = SimmResultsMap::new();
        let mut simm_parameters = Crif::new();
        for ((side, nsd, regs, _), (results, parameters)) in tasks.iter().zip(computed) {
            simm_results
                .entry(*side)
                .or_default()
                .entry((*nsd).clone())
                .or_default()
                .insert((*regs).clone(), results);
            simm_parameters.extend(parameters);
        }
        calc.simm_results = simm_results;
        calc.simm_parameters = simm_parameters;

        if calc.config.determine_winning_regulations {
            if !calc.config.quiet {
                info!("Determining winning regulations");
            }
            let winners = winning::determine_winning_regulations(&calc.simm_results, calc.config.quiet)?;
            calc.populate_final_results(winners)?;
        }

        Ok(calc)
    }

    /// Drops empty and Schedule records, converts amounts into the result
    /// currency and notes which netting sets carry regulations.
    fn clean(
        &mut self,
        crif: &Crif,
        fx: &dyn FxRateProvider,
    ) -> Result<HashMap<NettingSetDetails, RegulationPresence>> {
        let mut presence: HashMap<NettingSetDetails, RegulationPresence> = HashMap::new();
        let result_ccy = self.result_currency.as_str();

        for record in crif {
            if record.risk_type == RiskType::Empty {
                continue;
            }
            if record.im_model == ImModel::Schedule {
                if !self.config.quiet && self.config.determine_winning_regulations {
                    warn!(
                        trade_id = %record.trade_id,
                        trade_type = %record.trade_type,
                        "Skipping over Schedule CRIF record"
                    );
                }
                continue;
            }

            presence
                .entry(record.netting_set_details.clone())
                .or_default()
                .observe(record);

            let mut cleaned = record.clone();
            if cleaned.requires_amount_usd() {
                cleaned.amount_result_ccy = match cleaned.amount_usd {
                    Some(usd) if result_ccy == "USD" => usd,
                    _ => fx.fx_rate(&cleaned.amount_currency, result_ccy)? * cleaned.amount,
                };
            }
            cleaned.result_currency = result_ccy.to_string();
            self.crif.add_record(cleaned);
        }

        Ok(presence)
    }

    /// Imposes winning regulations and rebuilds the final results and final
    /// trade IDs.
    ///
    /// Every netting set with results must have a winning regulation.
    pub fn populate_final_results(&mut self, winning: WinningRegulations) -> Result<()> {
        if !self.config.quiet {
            info!("Populating final winning regulations' IM");
        }

        let mut final_trade_ids: BTreeMap<SimmSide, BTreeSet<String>> = BTreeMap::new();
        for (side, by_nsd) in &winning {
            let ids = final_trade_ids.entry(*side).or_default();
            for (nsd, reg) in by_nsd {
                if let Some(tids) = self
                    .trade_ids
                    .get(side)
                    .and_then(|m| m.get(nsd))
                    .and_then(|m| m.get(reg))
                {
                    ids.extend(tids.iter().cloned());
                }
            }
        }

        let config = &self.config;
        let final_results = winning::final_results(
            &self.simm_results,
            &winning,
            |side| config.calculation_currency(side).to_string(),
            &self.result_currency,
        )?;

        self.winning_regulations = winning;
        self.final_trade_ids = final_trade_ids;
        self.final_results = final_results;
        Ok(())
    }

    /// Results for one side, netting set and regulation set.
    pub fn simm_results(
        &self,
        side: SimmSide,
        nsd: &NettingSetDetails,
        regulations: &RegulationSet,
    ) -> Result<&SimmResults> {
        self.simm_results_for_netting_set(side, nsd)?
            .get(regulations)
            .ok_or_else(|| {
                SimmError::not_found(
                    "simm_results",
                    format!("regulations [{}] for netting set [{}] on side {}", regulations, nsd, side),
                )
            })
    }

    /// Results per regulation set for one side and netting set.
    pub fn simm_results_for_netting_set(
        &self,
        side: SimmSide,
        nsd: &NettingSetDetails,
    ) -> Result<&BTreeMap<RegulationSet, SimmResults>> {
        self.simm_results_for_side(side)?.get(nsd).ok_or_else(|| {
            SimmError::not_found(
                "simm_results",
                format!("netting set [{}] on side {}", nsd, side),
            )
        })
    }

    /// Results per netting set and regulation set for one side.
    pub fn simm_results_for_side(
        &self,
        side: SimmSide,
    ) -> Result<&BTreeMap<NettingSetDetails, BTreeMap<RegulationSet, SimmResults>>> {
        self.simm_results
            .get(&side)
            .ok_or_else(|| SimmError::not_found("simm_results", format!("{} side results", side)))
    }

    /// All results.
    pub fn all_simm_results(&self) -> &SimmResultsMap {
        &self.simm_results
    }

    /// Winning regulation of a netting set.
    pub fn winning_regulation(&self, side: SimmSide, nsd: &NettingSetDetails) -> Result<Regulation> {
        self.winning_regulations_for_side(side)?
            .get(nsd)
            .copied()
            .ok_or_else(|| {
                SimmError::not_found(
                    "winning_regulation",
                    format!("netting set [{}] in the list of {} IM winning regulations", nsd, side),
                )
            })
    }

    /// Winning regulations per netting set for one side.
    pub fn winning_regulations_for_side(&self, side: SimmSide) -> Result<&BTreeMap<NettingSetDetails, Regulation>> {
        self.winning_regulations.get(&side).ok_or_else(|| {
            SimmError::not_found(
                "winning_regulation",
                format!("list of {} IM winning regulations", side),
            )
        })
    }

    /// All winning regulations.
    pub fn winning_regulations(&self) -> &WinningRegulations {
        &self.winning_regulations
    }

    /// Final result of a netting set.
    pub fn final_simm_results(&self, side: SimmSide, nsd: &NettingSetDetails) -> Result<&FinalSimmResult> {
        self.final_simm_results_for_side(side)?.get(nsd).ok_or_else(|| {
            SimmError::not_found(
                "final_simm_results",
                format!("final {} IM results for netting set [{}]", side, nsd),
            )
        })
    }

    /// Final results per netting set for one side.
    pub fn final_simm_results_for_side(
        &self,
        side: SimmSide,
    ) -> Result<&BTreeMap<NettingSetDetails, FinalSimmResult>> {
        self.final_results.get(&side).ok_or_else(|| {
            SimmError::not_found("final_simm_results", format!("final {} IM results", side))
        })
    }

    /// All final results.
    pub fn all_final_simm_results(&self) -> &BTreeMap<SimmSide, BTreeMap<NettingSetDetails, FinalSimmResult>> {
        &self.final_results
    }

    /// CRIF of one side, netting set and regulation set as used in the
    /// calculation.
    pub fn regulation_crifs(&self, side: SimmSide, nsd: &NettingSetDetails) -> Result<&RegulationCrifs> {
        self.regulation_crifs
            .get(&side)
            .and_then(|m| m.get(nsd))
            .ok_or_else(|| {
                SimmError::not_found(
                    "regulation_crifs",
                    format!("netting set [{}] on side {}", nsd, side),
                )
            })
    }

    /// Cleaned CRIF records (empty and Schedule records removed).
    pub fn crif(&self) -> &Crif {
        &self.crif
    }

    /// Add-on parameter records applied, tagged with their regulation set.
    pub fn simm_parameters(&self) -> &Crif {
        &self.simm_parameters
    }

    /// Trade IDs per side, netting set and regulation.
    pub fn trade_ids(&self) -> &TradeIds {
        &self.trade_ids
    }

    /// Trade IDs contributing to the winning regulations, per side.
    pub fn final_trade_ids(&self) -> &BTreeMap<SimmSide, BTreeSet<String>> {
        &self.final_trade_ids
    }

    /// Result currency.
    pub fn result_currency(&self) -> &str {
        &self.result_currency
    }

    /// Calculation currency of `side`.
    pub fn calculation_currency(&self, side: SimmSide) -> &str {
        self.config.calculation_currency(side)
    }

    /// Options the calculator was built with.
    pub fn config(&self) -> &SimmCalculatorConfig {
        &self.config
    }
}

fn record_margin(
    results: &mut SimmResults,
    pc: ProductClass,
    rc: RiskClass,
    mt: MarginType,
    margin: MarginResult,
    quiet: bool,
) {
    if !margin.applicable {
        return;
    }
    for (bucket, value) in margin.buckets {
        if !quiet {
            debug!(
                product_class = %pc,
                risk_class = %rc,
                margin_type = %mt,
                bucket = %bucket,
                margin = value,
                "Calculated margin"
            );
        }
        results.add(pc, rc, mt, &bucket, value, false);
    }
}

/// Calculates the full result table of one regulation set.
#[allow(clippy::too_many_arguments)]
fn calculate_regulation_simm(
    simm_config: &dyn SimmConfiguration,
    fx: &dyn FxRateProvider,
    config: &SimmCalculatorConfig,
    result_currency: &str,
    side: SimmSide,
    nsd: &NettingSetDetails,
    regulations: &RegulationSet,
    crif: &Crif,
) -> Result<(SimmResults, Vec<CrifRecord>)> {
    let quiet = config.quiet;
    if !quiet {
        info!(
            side = %side,
            netting_set = %nsd,
            regulations = %regulations,
            "Calculating SIMM"
        );
    }

    let calculation_currency = config.calculation_currency(side);
    let engine =
        MarginEngine::new(simm_config, fx, calculation_currency, result_currency, side)?.quiet(quiet);
    let mut results = SimmResults::new(calculation_currency, result_currency);

    for pc in crif.product_classes() {
        if !quiet {
            debug!(product_class = %pc, "Calculating SIMM for product class");
        }

        let m = engine.ir_delta_margin(pc, crif)?;
        record_margin(&mut results, pc, RiskClass::InterestRate, MarginType::Delta, m, quiet);
        for (rc, rt) in DELTA {
            let m = engine.margin(pc, rt, crif)?;
            record_margin(&mut results, pc, rc, MarginType::Delta, m, quiet);
        }

        let m = engine.ir_vega_margin(pc, crif)?;
        record_margin(&mut results, pc, RiskClass::InterestRate, MarginType::Vega, m, quiet);
        for (rc, rt) in VEGA {
            let m = engine.margin(pc, rt, crif)?;
            record_margin(&mut results, pc, rc, MarginType::Vega, m, quiet);
        }

        let m = engine.ir_curvature_margin(pc, crif)?;
        record_margin(&mut results, pc, RiskClass::InterestRate, MarginType::Curvature, m, quiet);
        for (rc, rt, rf_labels) in CURVATURE {
            let m = engine.curvature_margin(pc, rt, crif, rf_labels)?;
            record_margin(&mut results, pc, rc, MarginType::Curvature, m, quiet);
        }

        if simm_config.is_valid_risk_type(RiskType::BaseCorr) {
            let m = engine.margin(pc, RiskType::BaseCorr, crif)?;
            record_margin(&mut results, pc, RiskClass::CreditQualifying, MarginType::BaseCorr, m, quiet);
        }
    }

    aggregation::populate_results(&mut results, simm_config)?;
    let parameters = add_on::calc_add_margin(&mut results, crif, side, regulations, quiet)?;

    Ok((results, parameters))
}
