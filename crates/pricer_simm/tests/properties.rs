//! Property-based tests of the calculator on random portfolios.

use std::collections::BTreeSet;

use proptest::prelude::*;

use pricer_simm::{
    Crif, CrifRecord, FxRateTable, MarginType, NettingSetDetails, ProductClass, Regulation,
    RegulationSet, RiskClass, RiskType, SimmBucketMapper, SimmCalculator, SimmCalculatorConfig,
    SimmSide, TabulatedSimmConfiguration,
};

const CURRENCIES: [&str; 5] = ["EUR", "GBP", "JPY", "BRL", "CHF"];
const REGULATIONS: [&str; 5] = ["", "ESA", "UK,ESA", "SEC", "CFTC,JFSA"];

fn record_strategy() -> impl Strategy<Value = CrifRecord> {
    (
        0..CURRENCIES.len(),
        -1.0e6..1.0e6f64,
        0..REGULATIONS.len(),
        0..REGULATIONS.len(),
        prop::bool::ANY,
    )
        .prop_map(|(ccy, amount, collect, post, equity)| {
            let collect = pricer_simm::parse_regulation_string(REGULATIONS[collect], &RegulationSet::new());
            let post = pricer_simm::parse_regulation_string(REGULATIONS[post], &RegulationSet::new());
            let record = if equity {
                CrifRecord::new("T", "PF", ProductClass::Equity, RiskType::Equity)
                    .with_qualifier(format!("Issuer {}", ccy))
            } else {
                CrifRecord::new("T", "PF", ProductClass::RatesFX, RiskType::FX)
                    .with_qualifier(CURRENCIES[ccy])
            };
            record
                .with_amount("USD", amount)
                .with_regulations(collect, post)
        })
}

fn portfolio_strategy() -> impl Strategy<Value = Vec<CrifRecord>> {
    prop::collection::vec(record_strategy(), 1..12).prop_map(|records| {
        records
            .into_iter()
            .enumerate()
            .map(|(i, mut r)| {
                r.trade_id = format!("T{}", i);
                r
            })
            .collect()
    })
}

fn calculate(records: Vec<CrifRecord>) -> SimmCalculator {
    let crif: Crif = records.into_iter().collect();
    let simm_config = TabulatedSimmConfiguration::isda_v1_0(SimmBucketMapper::new()).unwrap();
    let config = SimmCalculatorConfig {
        enforce_im_regulations: true,
        quiet: true,
        ..Default::default()
    };
    SimmCalculator::new(&crif, &simm_config, &FxRateTable::new(), config).unwrap()
}

const SPLIT_REGULATIONS: [&str; 9] = [
    "",
    "ESA",
    "UK,ESA",
    "SEC",
    "CFTC",
    "CFTC,JFSA",
    "Excluded",
    "ESA,Excluded",
    "Unspecified",
];
const NETTING_SETS: [&str; 2] = ["NS0", "NS1"];

/// Equity records with distinct risk factors, so netting never merges two
/// trades. Records of `NS1` lose their regulations when `blank_ns1` is set.
fn split_portfolio_strategy() -> impl Strategy<Value = Vec<CrifRecord>> {
    (
        prop::collection::vec(
            (
                0..NETTING_SETS.len(),
                1.0e3..1.0e6f64,
                0..SPLIT_REGULATIONS.len(),
                0..SPLIT_REGULATIONS.len(),
            ),
            1..16,
        ),
        prop::bool::ANY,
    )
        .prop_map(|(rows, blank_ns1)| {
            rows.into_iter()
                .enumerate()
                .map(|(i, (ns, amount, collect, post))| {
                    let (collect, post) = if blank_ns1 && ns == 1 {
                        ("", "")
                    } else {
                        (SPLIT_REGULATIONS[collect], SPLIT_REGULATIONS[post])
                    };
                    CrifRecord::new(format!("T{}", i), NETTING_SETS[ns], ProductClass::Equity, RiskType::Equity)
                        .with_qualifier(format!("ISSUER{}", i))
                        .with_amount("USD", amount)
                        .with_regulations(
                            pricer_simm::parse_regulation_string(collect, &RegulationSet::new()),
                            pricer_simm::parse_regulation_string(post, &RegulationSet::new()),
                        )
                })
                .collect()
        })
}

type RiskFactorKey = (String, RiskType, String);

fn risk_factor_key(r: &CrifRecord) -> RiskFactorKey {
    (r.trade_id.clone(), r.risk_type, r.qualifier.clone())
}

/// Records of `nsd` expected in some regulation set on `side`.
fn expected_on_side(records: &[CrifRecord], side: SimmSide, nsd: &str, enforce: bool) -> BTreeSet<RiskFactorKey> {
    let in_netting_set: Vec<&CrifRecord> = records
        .iter()
        .filter(|r| r.netting_set_details == NettingSetDetails::from(nsd))
        .collect();
    let none_specified = in_netting_set
        .iter()
        .all(|r| r.collect_regulations.is_empty() && r.post_regulations.is_empty());

    in_netting_set
        .into_iter()
        .filter(|r| {
            if !enforce || none_specified {
                return true;
            }
            let regs = r.regulations(side);
            !regs.contains(Regulation::Excluded) && regs.iter().any(|reg| reg != Regulation::Unspecified)
        })
        .map(risk_factor_key)
        .collect()
}

fn split_on_side(calc: &SimmCalculator, side: SimmSide, nsd: &str) -> BTreeSet<RiskFactorKey> {
    calc.regulation_crifs(side, &NettingSetDetails::from(nsd))
        .map(|crifs| {
            crifs
                .values()
                .flat_map(|crif| crif.iter())
                .filter(|r| !r.is_simm_parameter())
                .map(risk_factor_key)
                .collect()
        })
        .unwrap_or_default()
}

fn fx_table() -> FxRateTable {
    let mut fx = FxRateTable::new();
    fx.add_pair("EURUSD", 1.10).unwrap();
    fx.add_pair("GBPUSD", 1.30).unwrap();
    fx.add_pair("USDJPY", 150.0).unwrap();
    fx
}

const AMOUNT_CURRENCIES: [&str; 4] = ["USD", "EUR", "GBP", "JPY"];

fn multi_currency_strategy() -> impl Strategy<Value = Vec<CrifRecord>> {
    prop::collection::vec(
        (
            record_strategy(),
            0..AMOUNT_CURRENCIES.len(),
            prop::option::of(-1.0e6..1.0e6f64),
        ),
        1..12,
    )
    .prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (mut r, ccy, amount_usd))| {
                r.trade_id = format!("T{}", i);
                r.amount_currency = AMOUNT_CURRENCIES[ccy].to_string();
                r.amount_usd = amount_usd;
                r
            })
            .collect()
    })
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9 * (1.0 + a.abs().max(b.abs()))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_regulation_split_covers_every_applicable_record(
        records in split_portfolio_strategy(),
        enforce in prop::bool::ANY,
    ) {
        let crif: Crif = records.iter().cloned().collect();
        let simm_config = TabulatedSimmConfiguration::isda_v1_0(SimmBucketMapper::new()).unwrap();
        let config = SimmCalculatorConfig {
            enforce_im_regulations: enforce,
            quiet: true,
            ..Default::default()
        };
        let calc = SimmCalculator::new(&crif, &simm_config, &FxRateTable::new(), config).unwrap();

        for side in SimmSide::ALL {
            for nsd in NETTING_SETS {
                let expected = expected_on_side(&records, side, nsd, enforce);
                let actual = split_on_side(&calc, side, nsd);
                prop_assert_eq!(actual, expected, "{} side, netting set {}", side, nsd);
            }
        }
    }

    #[test]
    fn test_cleaning_is_idempotent(
        records in multi_currency_strategy(),
        result_in_eur in prop::bool::ANY,
    ) {
        let crif: Crif = records.into_iter().collect();
        let simm_config = TabulatedSimmConfiguration::isda_v1_0(SimmBucketMapper::new()).unwrap();
        let fx = fx_table();
        let config = SimmCalculatorConfig {
            result_currency: result_in_eur.then(|| "EUR".to_string()),
            enforce_im_regulations: true,
            quiet: true,
            ..Default::default()
        };

        let first = SimmCalculator::new(&crif, &simm_config, &fx, config.clone()).unwrap();
        let second = SimmCalculator::new(first.crif(), &simm_config, &fx, config).unwrap();

        prop_assert_eq!(first.result_currency(), second.result_currency());
        prop_assert_eq!(first.crif().len(), second.crif().len());
        for (a, b) in first.crif().iter().zip(second.crif().iter()) {
            prop_assert!(
                close(a.amount_result_ccy, b.amount_result_ccy),
                "{}: {} then {}",
                a.trade_id,
                a.amount_result_ccy,
                b.amount_result_ccy
            );
        }

        for (side, by_nsd) in first.all_simm_results() {
            for (nsd, by_regs) in by_nsd {
                for (regs, results) in by_regs {
                    let again = second.simm_results(*side, nsd, regs).unwrap();
                    prop_assert!(close(results.total(), again.total()), "{} {} {}", side, nsd, regs);
                }
                let winner = first.final_simm_results(*side, nsd).unwrap();
                let again = second.final_simm_results(*side, nsd).unwrap();
                prop_assert_eq!(winner.regulation, again.regulation);
                prop_assert!(close(winner.results.total(), again.results.total()));
            }
        }
    }

    #[test]
    fn test_margins_are_non_negative_and_roll_up(records in portfolio_strategy()) {
        let calc = calculate(records);
        for by_nsd in calc.all_simm_results().values() {
            for by_regs in by_nsd.values() {
                for results in by_regs.values() {
                    for (key, value) in results.iter() {
                        prop_assert!(value >= 0.0, "{:?} = {}", key, value);
                    }
                    let by_product_class: f64 = ProductClass::AGGREGATED
                        .iter()
                        .filter_map(|pc| results.get(*pc, RiskClass::All, MarginType::All, "All"))
                        .sum();
                    prop_assert!((results.total() - by_product_class).abs() < 1e-6);
                }
            }
        }
    }

    #[test]
    fn test_regulations_are_disjoint_and_winner_is_largest(records in portfolio_strategy()) {
        let calc = calculate(records);
        let nsd = NettingSetDetails::from("PF");
        for side in SimmSide::ALL {
            let Ok(crifs) = calc.regulation_crifs(side, &nsd) else {
                continue;
            };
            let mut seen = RegulationSet::new();
            for regs in crifs.keys() {
                for r in regs.iter() {
                    prop_assert!(!seen.contains(r), "{} appears in two keys", r);
                    seen.insert(r);
                }
            }

            let Ok(by_regs) = calc.simm_results_for_netting_set(side, &nsd) else {
                continue;
            };
            let winner = calc.final_simm_results(side, &nsd).unwrap();
            for results in by_regs.values() {
                prop_assert!(winner.results.total() >= results.total() - 1e-6);
            }
        }
    }

    #[test]
    fn test_record_order_does_not_matter(records in portfolio_strategy()) {
        let mut reversed = records.clone();
        reversed.reverse();
        let a = calculate(records);
        let b = calculate(reversed);
        let nsd = NettingSetDetails::from("PF");
        for side in SimmSide::ALL {
            match (a.final_simm_results(side, &nsd), b.final_simm_results(side, &nsd)) {
                (Ok(x), Ok(y)) => {
                    prop_assert_eq!(x.regulation, y.regulation);
                    prop_assert!((x.results.total() - y.results.total()).abs() <= 1e-9 * (1.0 + x.results.total()));
                }
                (Err(_), Err(_)) => {}
                _ => prop_assert!(false, "final results differ in presence"),
            }
        }
    }
}
