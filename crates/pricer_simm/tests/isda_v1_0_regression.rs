//! ISDA SIMM v1.0 regression tests.
//!
//! Each scenario loads a single risk type portfolio for netting set `pf`,
//! runs the full calculator with USD as calculation currency and compares
//! the final Call side margin with published reference values.
//!
//! # Test Categories
//!
//! 1. **Delta**: IR, FX and qualifying credit
//! 2. **Vega**: equity
//! 3. **Curvature**: IR (including the 2.3 scaling)
//! 4. **Aggregation**: roll-up consistency on a mixed portfolio

mod common;

use approx::assert_abs_diff_eq;
use common::{crif, Row, CRQ_DELTA, EQ_VEGA, FX_DELTA, IR_CURVATURE, IR_DELTA, MIXED};
use pricer_simm::{
    Crif, FxRateTable, MarginType, NettingSetDetails, ProductClass, RiskClass, RiskType,
    SimmBucketMapper, SimmCalculator, SimmCalculatorConfig, SimmConfiguration, SimmResults,
    SimmSide, TabulatedSimmConfiguration,
};

const TOLERANCE: f64 = 1.0e-6;

fn config_for(crif: &Crif) -> TabulatedSimmConfiguration {
    let mapper = SimmBucketMapper::from_records(crif.iter()).unwrap();
    TabulatedSimmConfiguration::isda_v1_0(mapper).unwrap()
}

fn final_call_results(crif: &Crif, config: &TabulatedSimmConfiguration) -> SimmResults {
    let calc = SimmCalculator::new(
        crif,
        config,
        &FxRateTable::new(),
        SimmCalculatorConfig {
            quiet: true,
            ..Default::default()
        },
    )
    .unwrap();
    calc.final_simm_results(SimmSide::Call, &NettingSetDetails::from("pf"))
        .unwrap()
        .results
        .clone()
}

fn check_margin(
    name: &str,
    pc: ProductClass,
    rt: RiskType,
    rows: &[Row],
    rc: RiskClass,
    mt: MarginType,
    expected: f64,
) {
    let crif = crif(pc, rt, rows);
    let config = config_for(&crif);
    let results = final_call_results(&crif, &config);
    let margin = results.get(pc, rc, mt, "All").unwrap();

    assert_abs_diff_eq!(margin, expected, epsilon = TOLERANCE);
    assert!(margin > 0.0, "{}: margin must be positive", name);
}

// ============================================================================
// Single risk type scenarios
// ============================================================================

#[test]
fn test_ir_delta_margin() {
    check_margin(
        "IR Delta",
        ProductClass::RatesFX,
        RiskType::IRCurve,
        IR_DELTA,
        RiskClass::InterestRate,
        MarginType::Delta,
        491_936.667_626_566,
    );
}

#[test]
fn test_fx_delta_margin() {
    check_margin(
        "FX Delta",
        ProductClass::RatesFX,
        RiskType::FX,
        FX_DELTA,
        RiskClass::FX,
        MarginType::Delta,
        253_059.867_316_875,
    );
}

#[test]
fn test_credit_qualifying_delta_margin() {
    check_margin(
        "CRQ Delta",
        ProductClass::Credit,
        RiskType::CreditQ,
        CRQ_DELTA,
        RiskClass::CreditQualifying,
        MarginType::Delta,
        2_079_261.791_598_740,
    );
}

#[test]
fn test_equity_vega_margin() {
    check_margin(
        "EQ Vega",
        ProductClass::Equity,
        RiskType::EquityVol,
        EQ_VEGA,
        RiskClass::Equity,
        MarginType::Vega,
        4_389_093.666_018,
    );
}

#[test]
fn test_ir_curvature_margin() {
    check_margin(
        "IR Curvature",
        ProductClass::RatesFX,
        RiskType::IRVol,
        IR_CURVATURE,
        RiskClass::InterestRate,
        MarginType::Curvature,
        1_525.938_767,
    );
}

#[test]
fn test_single_risk_type_totals_match_component() {
    let crif = crif(ProductClass::RatesFX, RiskType::FX, FX_DELTA);
    let config = config_for(&crif);
    let results = final_call_results(&crif, &config);
    let component = results
        .get(ProductClass::RatesFX, RiskClass::FX, MarginType::Delta, "All")
        .unwrap();
    assert_abs_diff_eq!(results.total(), component, epsilon = TOLERANCE);
}

// ============================================================================
// Aggregation
// ============================================================================

#[test]
fn test_margin_aggregation() {
    let crif: Crif = MIXED
        .iter()
        .flat_map(|&(pc, rt, row)| crif(pc, rt, &[row]))
        .collect();
    let config = config_for(&crif);
    let results = final_call_results(&crif, &config);
    let get = |pc, rc, mt| results.get(pc, rc, mt, "All").unwrap_or(0.0);

    let mut total_expected = 0.0;
    for pc in config.product_classes(false) {
        let mut by_risk_class = Vec::new();
        for rc in config.risk_classes(false) {
            let summed: f64 = config.margin_types(false).into_iter().map(|mt| get(pc, rc, mt)).sum();
            let aggregated = get(pc, rc, MarginType::All);
            assert!(
                (aggregated - summed).abs() <= TOLERANCE,
                "{}/{}: margin types sum to {}, aggregate is {}",
                pc,
                rc,
                summed,
                aggregated
            );
            by_risk_class.push((rc, summed));
        }

        let mut squared = 0.0;
        for &(rc_o, m_o) in &by_risk_class {
            for &(rc_i, m_i) in &by_risk_class {
                let corr = if rc_o == rc_i {
                    1.0
                } else {
                    config.correlation_risk_classes(rc_o, rc_i).unwrap()
                };
                squared += corr * m_o * m_i;
            }
        }
        let pc_expected = squared.sqrt();
        let pc_margin = get(pc, RiskClass::All, MarginType::All);
        assert!(
            (pc_margin - pc_expected).abs() <= TOLERANCE,
            "{}: expected {}, computed {}",
            pc,
            pc_expected,
            pc_margin
        );
        total_expected += pc_expected;
    }

    assert!(total_expected > 0.0);
    assert_abs_diff_eq!(results.total(), total_expected, epsilon = TOLERANCE);
}
