//! Winning regulation selection and final results.

use std::collections::BTreeMap;

use tracing::debug;

use super::margin::close_enough;
use super::results::SimmResults;
use crate::crif::NettingSetDetails;
use crate::error::{Result, SimmError};
use crate::types::{winning_regulation, Regulation, RegulationSet, SimmSide};

/// Results per side, netting set and regulation set.
pub type SimmResultsMap = BTreeMap<SimmSide, BTreeMap<NettingSetDetails, BTreeMap<RegulationSet, SimmResults>>>;

/// Winning regulation per side and netting set.
pub type WinningRegulations = BTreeMap<SimmSide, BTreeMap<NettingSetDetails, Regulation>>;

/// Final margin of a netting set under its winning regulation.
#[derive(Clone, Debug, PartialEq)]
pub struct FinalSimmResult {
    /// Winning regulation.
    pub regulation: Regulation,
    /// Results of the first regulation set containing the winning
    /// regulation, or empty results if none does.
    pub results: SimmResults,
}

/// Picks, per side and netting set, the regulation producing the highest
/// total margin. Ties are resolved by [`winning_regulation`].
pub(crate) fn determine_winning_regulations(results: &SimmResultsMap, quiet: bool) -> Result<WinningRegulations> {
    let mut winners = WinningRegulations::new();
    for (&side, by_netting_set) in results {
        for (nsd, by_regs) in by_netting_set {
            if by_regs.is_empty() {
                continue;
            }
            let winning_margin = by_regs
                .values()
                .map(SimmResults::total)
                .fold(f64::MIN, f64::max);
            let regs: RegulationSet = by_regs
                .iter()
                .filter(|(_, r)| close_enough(r.total(), winning_margin))
                .flat_map(|(k, _)| k.iter())
                .collect();
            let winner = winning_regulation(&regs)?;
            if !quiet {
                debug!(
                    side = %side,
                    netting_set = %nsd,
                    regulation = %winner,
                    margin = winning_margin,
                    "Winning regulation"
                );
            }
            winners.entry(side).or_default().insert(nsd.clone(), winner);
        }
    }
    Ok(winners)
}

/// Final results for every netting set with results.
pub(crate) fn final_results(
    results: &SimmResultsMap,
    winners: &WinningRegulations,
    calculation_currency: impl Fn(SimmSide) -> String,
    result_currency: &str,
) -> Result<BTreeMap<SimmSide, BTreeMap<NettingSetDetails, FinalSimmResult>>> {
    let mut out: BTreeMap<SimmSide, BTreeMap<NettingSetDetails, FinalSimmResult>> = BTreeMap::new();
    for (&side, by_netting_set) in results {
        for (nsd, by_regs) in by_netting_set {
            let regulation = winners
                .get(&side)
                .and_then(|m| m.get(nsd))
                .copied()
                .ok_or_else(|| {
                    SimmError::not_found(
                        "populate_final_results",
                        format!("netting set [{}] in the list of {} IM winning regulations", nsd, side),
                    )
                })?;
            let results = by_regs
                .iter()
                .find(|(k, _)| k.contains(regulation))
                .map(|(_, r)| r.clone())
                .unwrap_or_else(|| SimmResults::new(calculation_currency(side), result_currency));
            out.entry(side)
                .or_default()
                .insert(nsd.clone(), FinalSimmResult { regulation, results });
        }
    }
    Ok(out)
}
