//! Partitioning of CRIF records by side, netting set and regulation set.
//!
//! Records are tracked by index while keys are rearranged, so the SEC/CFTC
//! fan-out and the duplicate cleanup never alias a shared record list: each
//! key owns its own index set and the [`Crif`] of every key is built from
//! fresh record copies only once the keys are final.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::{debug, info};

use super::config::SimmCalculatorConfig;
use crate::crif::{Crif, CrifRecord, NettingSetDetails};
use crate::error::{AggregationError, Result};
use crate::types::{Regulation, RegulationSet, SimmSide};

/// Regulation-set keyed CRIFs of one netting set.
pub type RegulationCrifs = BTreeMap<RegulationSet, Crif>;

/// Trade IDs per side, netting set and individual regulation.
pub type TradeIds = BTreeMap<SimmSide, BTreeMap<NettingSetDetails, BTreeMap<Regulation, BTreeSet<String>>>>;

type Keys = BTreeMap<RegulationSet, BTreeSet<usize>>;

/// Whether a netting set carried collect and post regulations at all.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct RegulationPresence {
    pub collect_empty: bool,
    pub post_empty: bool,
}

impl Default for RegulationPresence {
    fn default() -> Self {
        Self {
            collect_empty: true,
            post_empty: true,
        }
    }
}

impl RegulationPresence {
    /// Records the regulations of one record.
    pub fn observe(&mut self, record: &CrifRecord) {
        self.collect_empty &= record.collect_regulations.is_empty();
        self.post_empty &= record.post_regulations.is_empty();
    }

    /// No record of the netting set specified any regulation.
    pub fn none_specified(&self) -> bool {
        self.collect_empty && self.post_empty
    }
}

/// Output of [`split_by_regulation`].
#[derive(Debug, Default)]
pub(crate) struct RegulationSplit {
    pub crifs: BTreeMap<SimmSide, BTreeMap<NettingSetDetails, RegulationCrifs>>,
    pub trade_ids: TradeIds,
}

fn sec_cftc() -> RegulationSet {
    [Regulation::SEC, Regulation::CFTC].into_iter().collect()
}

/// Regulation set of `record` on `side`, or `None` if the record does not
/// take part on that side.
fn applicable_regulations(
    record: &CrifRecord,
    side: SimmSide,
    config: &SimmCalculatorConfig,
    presence: RegulationPresence,
) -> Option<RegulationSet> {
    let mut regs = if config.enforce_im_regulations {
        record.regulations(side).clone()
    } else {
        RegulationSet::new()
    };
    if regs.is_empty() {
        regs.insert(Regulation::Unspecified);
    }
    if regs.contains(Regulation::Excluded) {
        return None;
    }
    if config.enforce_im_regulations && !presence.none_specified() {
        regs.remove(Regulation::Unspecified);
    }
    (!regs.is_empty()).then_some(regs)
}

fn merge_into(keys: &mut Keys, target: RegulationSet, records: &BTreeSet<usize>) {
    keys.entry(target).or_default().extend(records.iter().copied());
}

/// Normalises the `{CFTC}`, `{SEC}` and `{SEC,CFTC}` keys.
fn apply_sec_cftc(keys: &mut Keys, nsd: &NettingSetDetails, quiet: bool) {
    let cftc = RegulationSet::single(Regulation::CFTC);
    let sec = RegulationSet::single(Regulation::SEC);
    let both = sec_cftc();

    let has_cftc = keys.contains_key(&cftc);
    let has_sec = keys.contains_key(&sec);
    let has_both = keys.contains_key(&both);

    let snapshot = |keys: &Keys, k: &RegulationSet| keys.get(k).cloned().unwrap_or_default();

    match (has_cftc, has_sec, has_both) {
        (true, true, true) => {
            let c = snapshot(keys, &cftc);
            let sc = keys.remove(&both).unwrap_or_default();
            merge_into(keys, sec.clone(), &c);
            merge_into(keys, cftc.clone(), &sc);
            merge_into(keys, sec.clone(), &sc);
        }
        (true, true, false) => {
            let c = snapshot(keys, &cftc);
            merge_into(keys, sec.clone(), &c);
        }
        (true, false, _) => {
            // Merged into an existing {SEC,CFTC} key or relabelled as one.
            let c = keys.remove(&cftc).unwrap_or_default();
            merge_into(keys, both.clone(), &c);
        }
        (false, true, true) => {
            let sc = keys.remove(&both).unwrap_or_default();
            merge_into(keys, sec.clone(), &sc);
            merge_into(keys, cftc.clone(), &sc);
        }
        _ => return,
    }
    if !quiet {
        debug!(
            netting_set = %nsd,
            has_cftc,
            has_sec,
            has_sec_cftc = has_both,
            "Normalised SEC and CFTC regulation sets"
        );
    }
}

/// Removes regulations that appear in more than one key.
///
/// Each step replaces two overlapping keys by keys whose total size is
/// strictly smaller, so the loop ends after at most `Σ |key|` steps.
fn remove_duplicate_regulations(
    keys: &mut Keys,
    nsd: &NettingSetDetails,
    max_iterations: usize,
) -> Result<()> {
    let mut iterations = 0;
    loop {
        let mut counts: BTreeMap<Regulation, usize> = BTreeMap::new();
        for regs in keys.keys() {
            for r in regs.iter() {
                *counts.entry(r).or_insert(0) += 1;
            }
        }
        let duplicated: RegulationSet = counts
            .into_iter()
            .filter(|(_, n)| *n > 1)
            .map(|(r, _)| r)
            .collect();
        if duplicated.is_empty() {
            return Ok(());
        }
        if iterations == max_iterations {
            return Err(AggregationError::CleanupDidNotConverge {
                netting_set: nsd.to_string(),
                iterations,
            }
            .into());
        }
        iterations += 1;

        // Largest key holding a duplicated regulation, first in key order on ties.
        let Some(largest) = keys
            .keys()
            .filter(|k| !k.intersection(&duplicated).is_empty())
            .fold(None::<&RegulationSet>, |best, k| match best {
                Some(b) if b.len() >= k.len() => Some(b),
                _ => Some(k),
            })
            .cloned()
        else {
            return Ok(());
        };

        let Some(partner) = keys
            .keys()
            .filter(|k| **k != largest)
            .map(|k| (k.intersection(&largest).len(), k))
            .filter(|(n, _)| *n > 0)
            .fold(None::<(usize, &RegulationSet)>, |best, (n, k)| match best {
                Some((bn, bk)) if bn >= n => Some((bn, bk)),
                _ => Some((n, k)),
            })
            .map(|(_, k)| k.clone())
        else {
            return Ok(());
        };

        let largest_records = keys.remove(&largest).unwrap_or_default();
        if partner.is_subset(&largest) {
            merge_into(keys, partner.clone(), &largest_records);
            let rest = largest.difference(&partner);
            if !rest.is_empty() {
                merge_into(keys, rest, &largest_records);
            }
        } else {
            let partner_records = keys.remove(&partner).unwrap_or_default();
            let overlap = largest.intersection(&partner);
            merge_into(keys, overlap.clone(), &largest_records);
            merge_into(keys, overlap.clone(), &partner_records);
            merge_into(keys, largest.difference(&overlap), &largest_records);
            merge_into(keys, partner.difference(&overlap), &partner_records);
        }
    }
}

/// Splits cleaned records into per side, netting set and regulation set
/// CRIFs and records the contributing trade IDs.
pub(crate) fn split_by_regulation(
    records: &[CrifRecord],
    presence: &HashMap<NettingSetDetails, RegulationPresence>,
    config: &SimmCalculatorConfig,
) -> Result<RegulationSplit> {
    if !config.quiet {
        info!(
            records = records.len(),
            "Splitting CRIF records into their collect and post regulations"
        );
    }

    let filter = sec_cftc();
    let mut split = RegulationSplit::default();

    for side in SimmSide::ALL {
        let mut by_netting_set: BTreeMap<&NettingSetDetails, Keys> = BTreeMap::new();

        for (idx, record) in records.iter().enumerate() {
            let nsd = &record.netting_set_details;
            let seen = presence.get(nsd).copied().unwrap_or_default();
            let Some(regs) = applicable_regulations(record, side, config, seen) else {
                continue;
            };
            let (sec_or_cftc, others) = regs.partition(&filter);
            let keys = by_netting_set.entry(nsd).or_default();
            for key in [others, sec_or_cftc] {
                if !key.is_empty() {
                    keys.entry(key).or_default().insert(idx);
                }
            }
        }

        for (nsd, mut keys) in by_netting_set {
            // The SEC/CFTC rules apply when the netting set is configured as
            // SEC on this side or when any of its keys contains SEC.
            let has_sec = config.sec_netting_sets.contains(side, nsd)
                || keys.keys().any(|k| k.contains(Regulation::SEC));
            if has_sec {
                apply_sec_cftc(&mut keys, nsd, config.quiet);
            }

            remove_duplicate_regulations(&mut keys, nsd, config.max_cleanup_iterations)?;

            let unspecified = RegulationSet::single(Regulation::Unspecified);
            if keys.len() > 1 {
                keys.remove(&unspecified);
            }

            let trade_ids = split
                .trade_ids
                .entry(side)
                .or_default()
                .entry(nsd.clone())
                .or_default();
            let mut crifs = RegulationCrifs::new();
            for (regs, indices) in keys {
                let crif: Crif = indices
                    .iter()
                    .map(|&i| {
                        let mut r = records[i].clone();
                        r.collect_regulations = RegulationSet::new();
                        r.post_regulations = RegulationSet::new();
                        r
                    })
                    .collect();
                for &i in &indices {
                    if records[i].is_simm_parameter() {
                        continue;
                    }
                    for reg in regs.iter() {
                        trade_ids
                            .entry(reg)
                            .or_default()
                            .insert(records[i].trade_id.clone());
                    }
                }
                crifs.insert(regs, crif.aggregate());
            }
            split
                .crifs
                .entry(side)
                .or_default()
                .insert(nsd.clone(), crifs);
        }
    }

    Ok(split)
}
