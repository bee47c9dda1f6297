//! Hierarchical roll-up of margin components.
//!
//! ```text
//! (pc, rc, mt)  ──Σ mt──▶  (pc, rc, All)
//! (pc, rc, All) ──ψ_rc──▶  (pc, All, All)
//! (pc, All, All) ──Σ pc──▶ (All, All, All)
//! ```
//!
//! Cross-sections `(pc, All, mt)`, `(All, rc, mt)`, `(All, rc, All)` and
//! `(All, All, mt)` are filled for reporting. An entry is written only when
//! at least one of its components exists.

use super::margin::ALL;
use super::results::SimmResults;
use crate::configuration::SimmConfiguration;
use crate::error::Result;
use crate::types::{MarginType, ProductClass, RiskClass};

/// `sqrt(Σ m_i² + Σ_{i≠j} ψ_ij m_i m_j)` over the present risk classes.
///
/// Returns `None` when no risk class is present.
fn correlate_risk_classes(
    config: &dyn SimmConfiguration,
    rcs: &[RiskClass],
    mut margin_of: impl FnMut(RiskClass) -> Option<f64>,
) -> Result<Option<f64>> {
    let present: Vec<(RiskClass, f64)> = rcs
        .iter()
        .filter_map(|rc| margin_of(*rc).map(|m| (*rc, m)))
        .collect();
    if present.is_empty() {
        return Ok(None);
    }
    let mut total = 0.0;
    for (i, &(rc_o, m_o)) in present.iter().enumerate() {
        total += m_o * m_o;
        for &(rc_i, m_i) in &present[..i] {
            total += 2.0 * config.correlation_risk_classes(rc_o, rc_i)? * m_o * m_i;
        }
    }
    Ok(Some(total.max(0.0).sqrt()))
}

/// Sums the present values, or `None` when there are none.
fn sum_present(values: impl Iterator<Item = Option<f64>>) -> Option<f64> {
    values.flatten().fold(None, |acc, v| Some(acc.unwrap_or(0.0) + v))
}

/// Populates all higher level entries of `results` from the
/// `(product class, risk class, margin type, "All")` margins.
pub(crate) fn populate_results(results: &mut SimmResults, config: &dyn SimmConfiguration) -> Result<()> {
    let pcs = config.product_classes(false);
    let rcs = config.risk_classes(false);
    let mts = config.margin_types(false);

    for &pc in &pcs {
        for &rc in &rcs {
            if let Some(m) = sum_present(mts.iter().map(|mt| results.get_all(pc, rc, *mt))) {
                results.add(pc, rc, MarginType::All, ALL, m, false);
            }
        }
    }

    for &pc in &pcs {
        let margin = correlate_risk_classes(config, &rcs, |rc| {
            results.get_all(pc, rc, MarginType::All)
        })?;
        if let Some(m) = margin {
            results.add(pc, RiskClass::All, MarginType::All, ALL, m, false);
        }
    }

    let im: f64 = pcs
        .iter()
        .filter_map(|pc| results.get_all(*pc, RiskClass::All, MarginType::All))
        .sum();
    results.add(ProductClass::All, RiskClass::All, MarginType::All, ALL, im, false);

    for &pc in &pcs {
        for &mt in &mts {
            let margin = correlate_risk_classes(config, &rcs, |rc| results.get_all(pc, rc, mt))?;
            if let Some(m) = margin {
                results.add(pc, RiskClass::All, mt, ALL, m, false);
            }
        }
    }

    for &rc in &rcs {
        for &mt in &mts {
            if let Some(m) = sum_present(pcs.iter().map(|pc| results.get_all(*pc, rc, mt))) {
                results.add(ProductClass::All, rc, mt, ALL, m, false);
            }
        }
    }

    for &rc in &rcs {
        if let Some(m) = sum_present(pcs.iter().map(|pc| results.get_all(*pc, rc, MarginType::All))) {
            results.add(ProductClass::All, rc, MarginType::All, ALL, m, false);
        }
    }

    for &mt in &mts {
        if let Some(m) = sum_present(pcs.iter().map(|pc| results.get_all(*pc, RiskClass::All, mt))) {
            results.add(ProductClass::All, RiskClass::All, mt, ALL, m, false);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::{SimmBucketMapper, TabulatedSimmConfiguration};
    use approx::assert_relative_eq;

    fn config() -> TabulatedSimmConfiguration {
        TabulatedSimmConfiguration::isda_v1_0(SimmBucketMapper::new()).unwrap()
    }

    #[test]
    fn test_roll_up() {
        let cfg = config();
        let mut r = SimmResults::new("USD", "USD");
        r.add(ProductClass::RatesFX, RiskClass::InterestRate, MarginType::Delta, ALL, 30.0, false);
        r.add(ProductClass::RatesFX, RiskClass::InterestRate, MarginType::Vega, ALL, 10.0, false);
        r.add(ProductClass::RatesFX, RiskClass::FX, MarginType::Delta, ALL, 20.0, false);
        r.add(ProductClass::Equity, RiskClass::Equity, MarginType::Delta, ALL, 5.0, false);
        populate_results(&mut r, &cfg).unwrap();

        let ir = r.get_all(ProductClass::RatesFX, RiskClass::InterestRate, MarginType::All).unwrap();
        assert_relative_eq!(ir, 40.0);

        let psi = cfg
            .correlation_risk_classes(RiskClass::FX, RiskClass::InterestRate)
            .unwrap();
        let rates = r.get_all(ProductClass::RatesFX, RiskClass::All, MarginType::All).unwrap();
        assert_relative_eq!(
            rates,
            (40.0_f64.powi(2) + 20.0_f64.powi(2) + 2.0 * psi * 40.0 * 20.0).sqrt(),
            epsilon = 1e-12
        );
        assert_relative_eq!(r.total(), rates + 5.0, epsilon = 1e-12);

        let delta = r.get_all(ProductClass::All, RiskClass::All, MarginType::Delta).unwrap();
        let rates_delta = r.get_all(ProductClass::RatesFX, RiskClass::All, MarginType::Delta).unwrap();
        assert_relative_eq!(delta, rates_delta + 5.0, epsilon = 1e-12);
        assert_relative_eq!(
            r.get_all(ProductClass::All, RiskClass::InterestRate, MarginType::Vega).unwrap(),
            10.0
        );
        assert_relative_eq!(
            r.get_all(ProductClass::All, RiskClass::Equity, MarginType::All).unwrap(),
            5.0
        );
    }

    #[test]
    fn test_absent_components_are_not_recorded() {
        let cfg = config();
        let mut r = SimmResults::new("USD", "USD");
        r.add(ProductClass::Credit, RiskClass::CreditQualifying, MarginType::Delta, ALL, 1.0, false);
        populate_results(&mut r, &cfg).unwrap();

        assert!(!r.has(ProductClass::Credit, RiskClass::CreditQualifying, MarginType::Vega, ALL));
        assert!(!r.has(ProductClass::RatesFX, RiskClass::All, MarginType::All, ALL));
        assert!(!r.has(ProductClass::All, RiskClass::All, MarginType::Curvature, ALL));
        assert!(r.has(ProductClass::All, RiskClass::All, MarginType::All, ALL));
    }

    #[test]
    fn test_total_is_always_written() {
        let cfg = config();
        let mut r = SimmResults::new("USD", "USD");
        populate_results(&mut r, &cfg).unwrap();
        assert_eq!(r.len(), 1);
        assert_eq!(r.total(), 0.0);
    }
}
