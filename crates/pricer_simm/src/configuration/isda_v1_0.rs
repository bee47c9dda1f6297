//! ISDA SIMM v1.0 (R1.0) calibration.

use std::collections::{BTreeSet, HashMap};

use super::tabulated::{CorrelationScalars, LabelledMatrix, TabulatedSimmConfiguration};
use super::SimmBucketMapper;
use crate::error::Result;
use crate::types::{RiskType, SimmVersion};

const IR_TENORS: [&str; 12] = [
    "2w", "1m", "3m", "6m", "1y", "2y", "3y", "5y", "10y", "15y", "20y", "30y",
];

const CREDIT_TENORS: [&str; 5] = ["1y", "2y", "3y", "5y", "10y"];

const MPOR_DAYS: u32 = 10;

#[rustfmt::skip]
const IR_TENOR_CORRELATION: [f64; 144] = [
    1.000, 1.000, 1.000, 0.782, 0.618, 0.498, 0.438, 0.361, 0.270, 0.196, 0.174, 0.129,
    1.000, 1.000, 1.000, 0.782, 0.618, 0.498, 0.438, 0.361, 0.270, 0.196, 0.174, 0.129,
    1.000, 1.000, 1.000, 0.782, 0.618, 0.498, 0.438, 0.361, 0.270, 0.196, 0.174, 0.129,
    0.782, 0.782, 0.782, 1.000, 0.840, 0.739, 0.667, 0.569, 0.444, 0.375, 0.349, 0.296,
    0.618, 0.618, 0.618, 0.840, 1.000, 0.917, 0.859, 0.757, 0.626, 0.555, 0.526, 0.471,
    0.498, 0.498, 0.498, 0.739, 0.917, 1.000, 0.976, 0.895, 0.749, 0.690, 0.660, 0.602,
    0.438, 0.438, 0.438, 0.667, 0.859, 0.976, 1.000, 0.958, 0.831, 0.779, 0.746, 0.690,
    0.361, 0.361, 0.361, 0.569, 0.757, 0.895, 0.958, 1.000, 0.925, 0.893, 0.859, 0.812,
    0.270, 0.270, 0.270, 0.444, 0.626, 0.749, 0.831, 0.925, 1.000, 0.980, 0.961, 0.931,
    0.196, 0.196, 0.196, 0.375, 0.555, 0.690, 0.779, 0.893, 0.980, 1.000, 0.989, 0.970,
    0.174, 0.174, 0.174, 0.349, 0.526, 0.660, 0.746, 0.859, 0.961, 0.989, 1.000, 0.988,
    0.129, 0.129, 0.129, 0.296, 0.471, 0.602, 0.690, 0.812, 0.931, 0.970, 0.988, 1.000,
];

// Order: InterestRate, CreditQualifying, CreditNonQualifying, Equity, Commodity, FX.
#[rustfmt::skip]
const RISK_CLASS_CORRELATION: [f64; 36] = [
    1.00, 0.09, 0.10, 0.18, 0.32, 0.27,
    0.09, 1.00, 0.24, 0.58, 0.34, 0.29,
    0.10, 0.24, 1.00, 0.23, 0.24, 0.12,
    0.18, 0.58, 0.23, 1.00, 0.26, 0.31,
    0.32, 0.34, 0.24, 0.26, 1.00, 0.37,
    0.27, 0.29, 0.12, 0.31, 0.37, 1.00,
];

#[rustfmt::skip]
const CREDIT_Q_INTER_BUCKET: [f64; 144] = [
    1.00, 0.51, 0.47, 0.49, 0.46, 0.47, 0.41, 0.36, 0.45, 0.47, 0.47, 0.43,
    0.51, 1.00, 0.52, 0.52, 0.49, 0.52, 0.37, 0.41, 0.51, 0.50, 0.51, 0.46,
    0.47, 0.52, 1.00, 0.54, 0.51, 0.55, 0.37, 0.37, 0.51, 0.49, 0.50, 0.47,
    0.49, 0.52, 0.54, 1.00, 0.53, 0.56, 0.36, 0.37, 0.52, 0.51, 0.51, 0.46,
    0.46, 0.49, 0.51, 0.53, 1.00, 0.54, 0.35, 0.35, 0.49, 0.48, 0.50, 0.44,
    0.47, 0.52, 0.55, 0.56, 0.54, 1.00, 0.37, 0.37, 0.52, 0.49, 0.51, 0.48,
    0.41, 0.37, 0.37, 0.36, 0.35, 0.37, 1.00, 0.29, 0.36, 0.34, 0.36, 0.36,
    0.36, 0.41, 0.37, 0.37, 0.35, 0.37, 0.29, 1.00, 0.37, 0.36, 0.37, 0.33,
    0.45, 0.51, 0.51, 0.52, 0.49, 0.52, 0.36, 0.37, 1.00, 0.49, 0.50, 0.46,
    0.47, 0.50, 0.49, 0.51, 0.48, 0.49, 0.34, 0.36, 0.49, 1.00, 0.49, 0.46,
    0.47, 0.51, 0.50, 0.51, 0.50, 0.51, 0.36, 0.37, 0.50, 0.49, 1.00, 0.46,
    0.43, 0.46, 0.47, 0.46, 0.44, 0.48, 0.36, 0.33, 0.46, 0.46, 0.46, 1.00,
];

#[rustfmt::skip]
const EQUITY_INTER_BUCKET: [f64; 121] = [
    1.00, 0.17, 0.18, 0.16, 0.08, 0.10, 0.10, 0.11, 0.16, 0.08, 0.18,
    0.17, 1.00, 0.24, 0.19, 0.07, 0.10, 0.09, 0.10, 0.19, 0.07, 0.18,
    0.18, 0.24, 1.00, 0.21, 0.09, 0.12, 0.13, 0.13, 0.20, 0.10, 0.24,
    0.16, 0.19, 0.21, 1.00, 0.13, 0.17, 0.16, 0.17, 0.20, 0.13, 0.30,
    0.08, 0.07, 0.09, 0.13, 1.00, 0.28, 0.24, 0.28, 0.10, 0.23, 0.38,
    0.10, 0.10, 0.12, 0.17, 0.28, 1.00, 0.30, 0.33, 0.13, 0.26, 0.45,
    0.10, 0.09, 0.13, 0.16, 0.24, 0.30, 1.00, 0.29, 0.13, 0.25, 0.42,
    0.11, 0.10, 0.13, 0.17, 0.28, 0.33, 0.29, 1.00, 0.14, 0.27, 0.45,
    0.16, 0.19, 0.20, 0.20, 0.10, 0.13, 0.13, 0.14, 1.00, 0.11, 0.25,
    0.08, 0.07, 0.10, 0.13, 0.23, 0.26, 0.25, 0.27, 0.11, 1.00, 0.34,
    0.18, 0.18, 0.24, 0.30, 0.38, 0.45, 0.42, 0.45, 0.25, 0.34, 1.00,
];

#[rustfmt::skip]
const COMMODITY_INTER_BUCKET: [f64; 256] = [
    1.00, 0.11, 0.16, 0.13, 0.10, 0.06, 0.20, 0.05, 0.17, 0.03, 0.18, 0.09, 0.10, 0.05, 0.04, 0.00,
    0.11, 1.00, 0.95, 0.95, 0.93, 0.15, 0.27, 0.19, 0.20, 0.14, 0.30, 0.31, 0.26, 0.26, 0.12, 0.00,
    0.16, 0.95, 1.00, 0.92, 0.90, 0.17, 0.24, 0.14, 0.17, 0.12, 0.32, 0.26, 0.16, 0.22, 0.12, 0.00,
    0.13, 0.95, 0.92, 1.00, 0.90, 0.18, 0.26, 0.08, 0.17, 0.08, 0.31, 0.25, 0.15, 0.20, 0.09, 0.00,
    0.10, 0.93, 0.90, 0.90, 1.00, 0.18, 0.37, 0.13, 0.30, 0.21, 0.34, 0.32, 0.27, 0.29, 0.12, 0.00,
    0.06, 0.15, 0.17, 0.18, 0.18, 1.00, 0.07, 0.62, 0.03, 0.15, 0.00, 0.00, 0.23, 0.15, 0.07, 0.00,
    0.20, 0.27, 0.24, 0.26, 0.37, 0.07, 1.00, 0.07, 0.66, 0.20, 0.06, 0.06, 0.12, 0.09, 0.09, 0.00,
    0.05, 0.19, 0.14, 0.08, 0.13, 0.62, 0.07, 1.00, 0.09, 0.12, -0.01, 0.00, 0.18, 0.11, 0.04, 0.00,
    0.17, 0.20, 0.17, 0.17, 0.30, 0.03, 0.66, 0.09, 1.00, 0.12, 0.10, 0.06, 0.12, 0.10, 0.10, 0.00,
    0.03, 0.14, 0.12, 0.08, 0.21, 0.15, 0.20, 0.12, 0.12, 1.00, 0.10, 0.07, 0.09, 0.10, 0.16, 0.00,
    0.18, 0.30, 0.32, 0.31, 0.34, 0.00, 0.06, -0.01, 0.10, 0.10, 1.00, 0.46, 0.20, 0.26, 0.18, 0.00,
    0.09, 0.31, 0.26, 0.25, 0.32, 0.00, 0.06, 0.00, 0.06, 0.07, 0.46, 1.00, 0.25, 0.23, 0.14, 0.00,
    0.10, 0.26, 0.16, 0.15, 0.27, 0.23, 0.12, 0.18, 0.12, 0.09, 0.20, 0.25, 1.00, 0.29, 0.06, 0.00,
    0.05, 0.26, 0.22, 0.20, 0.29, 0.15, 0.09, 0.11, 0.10, 0.10, 0.26, 0.23, 0.29, 1.00, 0.15, 0.00,
    0.04, 0.12, 0.12, 0.09, 0.12, 0.07, 0.09, 0.04, 0.10, 0.16, 0.18, 0.14, 0.06, 0.15, 1.00, 0.00,
    0.00, 0.00, 0.00, 0.00, 0.00, 0.00, 0.00, 0.00, 0.00, 0.00, 0.00, 0.00, 0.00, 0.00, 0.00, 1.00,
];

fn numbered(n: usize) -> Vec<String> {
    (1..=n).map(|b| b.to_string()).collect()
}

fn with_residual(n: usize) -> Vec<String> {
    let mut out = numbered(n);
    out.push("Residual".to_string());
    out
}

fn strings(labels: &[&str]) -> Vec<String> {
    labels.iter().map(|l| l.to_string()).collect()
}

fn as_refs(labels: &[String]) -> Vec<&str> {
    labels.iter().map(String::as_str).collect()
}

/// Curvature scaling `0.5 * min(1, 14 / days)` for each tenor.
fn curvature_weights(tenor_days: &[f64]) -> Vec<f64> {
    tenor_days.iter().map(|d| 0.5 * (14.0 / d).min(1.0)).collect()
}

impl TabulatedSimmConfiguration {
    /// ISDA SIMM v1.0 calibration using the given bucket mapper.
    pub fn isda_v1_0(mapper: SimmBucketMapper) -> Result<Self> {
        use RiskType::*;

        let valid_risk_types: BTreeSet<RiskType> = [
            Commodity,
            CommodityVol,
            CreditNonQ,
            CreditQ,
            CreditVol,
            CreditVolNonQ,
            Equity,
            EquityVol,
            FX,
            FXVol,
            Inflation,
            IRCurve,
            IRVol,
        ]
        .into_iter()
        .collect();

        let mut buckets = HashMap::new();
        buckets.insert(IRCurve, numbered(3));
        buckets.insert(CreditQ, with_residual(12));
        buckets.insert(CreditVol, with_residual(12));
        buckets.insert(CreditNonQ, with_residual(2));
        buckets.insert(CreditVolNonQ, with_residual(2));
        buckets.insert(Equity, with_residual(11));
        buckets.insert(EquityVol, with_residual(11));
        buckets.insert(Commodity, numbered(16));
        buckets.insert(CommodityVol, numbered(16));

        let mut labels1 = HashMap::new();
        for rt in [IRCurve, IRVol, EquityVol, CommodityVol, FXVol] {
            labels1.insert(rt, strings(&IR_TENORS));
        }
        for rt in [CreditQ, CreditNonQ, CreditVol, CreditVolNonQ] {
            labels1.insert(rt, strings(&CREDIT_TENORS));
        }

        let mut labels2 = HashMap::new();
        labels2.insert(
            IRCurve,
            strings(&["OIS", "Libor1m", "Libor3m", "Libor6m", "Libor12m", "Prime"]),
        );
        labels2.insert(CreditQ, strings(&["", "Sec"]));

        let rw_risk_type: HashMap<RiskType, f64> = [
            (Inflation, 32.0),
            (IRVol, 0.21),
            (CreditVol, 0.35),
            (CreditVolNonQ, 0.35),
            (EquityVol, 0.21),
            (CommodityVol, 0.36),
            (FX, 7.9),
            (FXVol, 0.21),
            (BaseCorr, 18.0),
        ]
        .into_iter()
        .collect();

        let mut rw_bucket = HashMap::new();
        rw_bucket.insert(
            CreditQ,
            vec![97.0, 110.0, 73.0, 65.0, 52.0, 39.0, 198.0, 638.0, 210.0, 375.0, 240.0, 152.0, 638.0],
        );
        rw_bucket.insert(CreditNonQ, vec![169.0, 1646.0, 1646.0]);
        rw_bucket.insert(
            Equity,
            vec![22.0, 28.0, 28.0, 25.0, 18.0, 20.0, 24.0, 23.0, 26.0, 27.0, 15.0, 28.0],
        );
        rw_bucket.insert(
            Commodity,
            vec![
                9.0, 19.0, 18.0, 13.0, 24.0, 17.0, 21.0, 35.0, 20.0, 50.0, 21.0, 19.0, 17.0, 15.0,
                8.0, 50.0,
            ],
        );

        let mut rw_label1 = HashMap::new();
        rw_label1.insert(
            (IRCurve, "1".to_string()),
            vec![77.0, 77.0, 77.0, 64.0, 58.0, 49.0, 47.0, 47.0, 45.0, 45.0, 48.0, 56.0],
        );
        rw_label1.insert(
            (IRCurve, "2".to_string()),
            vec![10.0, 10.0, 10.0, 10.0, 13.0, 16.0, 18.0, 20.0, 25.0, 22.0, 22.0, 23.0],
        );
        rw_label1.insert(
            (IRCurve, "3".to_string()),
            vec![89.0, 89.0, 89.0, 94.0, 104.0, 99.0, 96.0, 99.0, 87.0, 97.0, 97.0, 98.0],
        );

        let month = 365.0 / 12.0;
        let ir_days = [
            14.0,
            month,
            3.0 * month,
            6.0 * month,
            365.0,
            2.0 * 365.0,
            3.0 * 365.0,
            5.0 * 365.0,
            10.0 * 365.0,
            15.0 * 365.0,
            20.0 * 365.0,
            30.0 * 365.0,
        ];
        let credit_days = [365.0, 2.0 * 365.0, 3.0 * 365.0, 5.0 * 365.0, 10.0 * 365.0];
        let mut curvature = HashMap::new();
        for rt in [IRVol, EquityVol, CommodityVol, FXVol] {
            curvature.insert(rt, curvature_weights(&ir_days));
        }
        for rt in [CreditVol, CreditVolNonQ] {
            curvature.insert(rt, curvature_weights(&credit_days));
        }

        let equity_buckets = numbered(11);
        let credit_buckets = numbered(12);
        let commodity_buckets = numbered(16);
        let mut inter_bucket_correlation = HashMap::new();
        inter_bucket_correlation.insert(
            CreditQ,
            LabelledMatrix::new(&as_refs(&credit_buckets), &CREDIT_Q_INTER_BUCKET)?,
        );
        inter_bucket_correlation.insert(
            Equity,
            LabelledMatrix::new(&as_refs(&equity_buckets), &EQUITY_INTER_BUCKET)?,
        );
        inter_bucket_correlation.insert(
            Commodity,
            LabelledMatrix::new(&as_refs(&commodity_buckets), &COMMODITY_INTER_BUCKET)?,
        );

        let mut intra_bucket_correlation = HashMap::new();
        intra_bucket_correlation.insert(
            Equity,
            vec![0.14, 0.24, 0.25, 0.20, 0.26, 0.34, 0.33, 0.34, 0.21, 0.24, 0.63],
        );
        intra_bucket_correlation.insert(
            Commodity,
            vec![
                0.71, 0.92, 0.97, 0.97, 0.99, 0.98, 1.00, 0.69, 0.47, 0.01, 0.67, 0.70, 0.68, 0.22,
                0.50, 0.00,
            ],
        );

        let scalars = CorrelationScalars {
            xccy: 0.0,
            inflation: 0.33,
            inflation_vol: 0.0,
            ir_sub_curve: 0.982,
            ir_inter_currency: 0.27,
            crq_residual_intra: 0.5,
            crq_same_intra: 0.98,
            crq_diff_intra: 0.55,
            crnq_residual_intra: 0.5,
            crnq_same_intra: 0.60,
            crnq_diff_intra: 0.21,
            crnq_inter: 0.05,
            fx: 0.5,
            base_corr: 0.0,
        };

        Ok(Self {
            name: "SIMM ISDA 1.0 (3 April 2016)".to_string(),
            version: SimmVersion::V1_0,
            calibration: false,
            mpor_days: MPOR_DAYS,
            mapper,
            valid_risk_types,
            buckets,
            labels1,
            labels2,
            rw_risk_type,
            rw_bucket,
            rw_label1,
            curvature_weights: curvature,
            historical_volatility_ratios: HashMap::new(),
            risk_class_correlation: RISK_CLASS_CORRELATION.to_vec(),
            ir_tenor_correlation: LabelledMatrix::new(&IR_TENORS, &IR_TENOR_CORRELATION)?,
            inter_bucket_correlation,
            intra_bucket_correlation,
            scalars,
            // v1.0 has no concentration thresholds
            concentration_thresholds: HashMap::new(),
            curvature_margin_scaling: 2.3,
            sigma_multiplier: Self::sigma_multiplier_for(MPOR_DAYS)?,
        })
    }
}
