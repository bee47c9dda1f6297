//! Additional initial margin from SIMM parameter records.
//!
//! Three kinds of parameter records contribute `AdditionalIM`:
//!
//! - `Param_ProductClassMultiplier`: `(factor - 1) * im` for the product
//!   class named by the qualifier, when that product class has a margin
//! - `Param_AddOnFixedAmount`: the amount itself
//! - `Param_AddOnNotionalFactor`: `notional * factor / 100`, matched to the
//!   `Notional` record with the same qualifier
//!
//! Only parameter records with an empty product class are considered.
//! Each contribution is written to the product class, `AdditionalIM`
//! margin type and netting set totals.

use tracing::debug;

use super::margin::ALL;
use super::results::SimmResults;
use crate::crif::{Crif, CrifRecord};
use crate::error::{Result, SimmError};
use crate::types::{MarginType, ProductClass, RegulationSet, RiskClass, RiskType, SimmSide};

fn add_additional(results: &mut SimmResults, pc: ProductClass, margin: f64) {
    results.add(pc, RiskClass::All, MarginType::AdditionalIM, ALL, margin, false);
    results.add(pc, RiskClass::All, MarginType::All, ALL, margin, false);
    results.add(ProductClass::All, RiskClass::All, MarginType::AdditionalIM, ALL, margin, false);
    results.add(ProductClass::All, RiskClass::All, MarginType::All, ALL, margin, false);
}

fn tagged(record: &CrifRecord, side: SimmSide, regulations: &RegulationSet) -> CrifRecord {
    let mut out = record.clone();
    match side {
        SimmSide::Call => out.collect_regulations = regulations.clone(),
        SimmSide::Post => out.post_regulations = regulations.clone(),
    }
    out
}

/// Applies all add-ons in `crif` to `results`.
///
/// Must run after the hierarchical aggregation so that product class
/// multipliers see the final product class margins. Returns the parameter
/// records that were applied, tagged with `regulations` on `side`.
pub(crate) fn calc_add_margin(
    results: &mut SimmResults,
    crif: &Crif,
    side: SimmSide,
    regulations: &RegulationSet,
    quiet: bool,
) -> Result<Vec<CrifRecord>> {
    let mut applied = Vec::new();

    for r in crif.filter_by(ProductClass::Empty, RiskType::ProductClassMultiplier) {
        let pc: ProductClass = r.qualifier.parse()?;
        let Some(im) = results.get_all(pc, RiskClass::All, MarginType::All) else {
            continue;
        };
        let factor = r.amount;
        if factor < 0.0 {
            return Err(SimmError::NegativeMultiplier {
                risk_type: RiskType::ProductClassMultiplier.name().to_string(),
                factor,
            });
        }
        let margin = (factor - 1.0) * im;
        if !quiet {
            debug!(product_class = %pc, factor, margin, "Applying product class multiplier");
        }
        add_additional(results, pc, margin);
        applied.push(tagged(r, side, regulations));
    }

    for r in crif.filter_by(ProductClass::Empty, RiskType::AddOnFixedAmount) {
        let margin = r.amount_result_ccy;
        if !quiet {
            debug!(trade_id = %r.trade_id, margin, "Applying fixed add-on");
        }
        add_additional(results, ProductClass::AddOnFixedAmount, margin);
        applied.push(tagged(r, side, regulations));
    }

    for r in crif.filter_by(ProductClass::Empty, RiskType::AddOnNotionalFactor) {
        let notionals = crif.filter_by_qualifier(ProductClass::Empty, RiskType::Notional, &r.qualifier);
        if notionals.len() > 1 {
            return Err(SimmError::Cardinality {
                context: "SimmCalculator::calc_add_margin()".to_string(),
                risk_type: RiskType::Notional.name().to_string(),
                qualifier: r.qualifier.clone(),
                count: notionals.len(),
            });
        }
        let Some(notional) = notionals.first() else {
            continue;
        };
        let margin = notional.amount_result_ccy * r.amount / 100.0;
        if !quiet {
            debug!(qualifier = %r.qualifier, margin, "Applying notional factor add-on");
        }
        add_additional(results, ProductClass::AddOnNotionalFactor, margin);
        applied.push(tagged(r, side, regulations));
    }

    Ok(applied)
}
