//! Delta, vega and curvature margin formulas.
//!
//! Every formula works on the records of one product class inside one
//! regulation-set [`Crif`]:
//!
//! ```text
//! CR_q   = max(1, sqrt(|Σ amount · σ · hvr| / threshold_q))
//! WS_k   = RW_k · amount_k · σ_k · hvr · CR_q
//! K_b    = sqrt(Σ WS² + Σ_{k≠l} ρ_kl · f_kl · WS_k · WS_l)
//! margin = sqrt(Σ K_b² + Σ_{b≠c} γ_bc · S_b · S_c) + K_residual
//! ```
//!
//! with `S_b = clamp(Σ WS, -K_b, K_b)` and `f_kl = min(CR)/max(CR)`.
//! Interest rate risk is aggregated per currency with dedicated cross terms
//! for inflation and cross-currency basis, and curvature adds the
//! `λ(θ)` skew adjustment.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use statrs::distribution::{ContinuousCDF, Normal};
use tracing::debug;

use crate::configuration::{RiskFactor, SimmConfiguration};
use crate::crif::{Crif, CrifRecord};
use crate::error::{Result, SimmError};
use crate::market::FxRateProvider;
use crate::types::{ProductClass, RiskType, SimmSide, SimmVersion};

/// Bucket label of the residual bucket.
pub(crate) const RESIDUAL: &str = "Residual";

/// Bucket label of the aggregated value.
pub(crate) const ALL: &str = "All";

/// Outcome of one margin formula.
///
/// `buckets` always holds an `"All"` entry. When `applicable` is false no
/// records fed the formula and the result must not be recorded.
#[derive(Clone, Debug, PartialEq)]
pub struct MarginResult {
    /// Margin per bucket (or per currency for IR and FX) plus `"All"`.
    pub buckets: BTreeMap<String, f64>,
    /// Whether any record fed the formula.
    pub applicable: bool,
}

impl MarginResult {
    fn not_applicable() -> Self {
        Self::with_total(0.0, false)
    }

    fn with_total(total: f64, applicable: bool) -> Self {
        let mut buckets = BTreeMap::new();
        buckets.insert(ALL.to_string(), total);
        Self {
            buckets,
            applicable,
        }
    }

    /// The aggregated `"All"` value.
    pub fn total(&self) -> f64 {
        self.buckets.get(ALL).copied().unwrap_or(0.0)
    }
}

/// Compares two floats with a relative tolerance of 42 machine epsilons.
pub fn close_enough(x: f64, y: f64) -> bool {
    if x == y {
        return true;
    }
    let diff = (x - y).abs();
    let tolerance = 42.0 * f64::EPSILON;
    if x * y == 0.0 {
        return diff < tolerance * tolerance;
    }
    diff <= tolerance * x.abs() || diff <= tolerance * y.abs()
}

#[inline]
fn clamp_by(sum: f64, bound: f64) -> f64 {
    sum.min(bound).max(-bound)
}

#[inline]
fn dampening(a: f64, b: f64) -> f64 {
    a.min(b) / a.max(b)
}

/// Evaluates the SIMM margin formulas for one side.
///
/// The engine borrows the configuration and FX provider so that a single
/// instance can be shared by all product classes of a regulation set.
///
/// # Examples
///
/// ```
/// use pricer_simm::{
///     Crif, CrifRecord, FxRateTable, MarginEngine, ProductClass, RiskType, SimmBucketMapper,
///     SimmSide, TabulatedSimmConfiguration,
/// };
///
/// let config = TabulatedSimmConfiguration::isda_v1_0(SimmBucketMapper::new()).unwrap();
/// let fx = FxRateTable::new();
/// let engine = MarginEngine::new(&config, &fx, "USD", "USD", SimmSide::Call).unwrap();
///
/// let mut record = CrifRecord::new("T1", "PF", ProductClass::RatesFX, RiskType::FX)
///     .with_qualifier("EUR")
///     .with_amount("USD", 1_000.0);
/// record.amount_result_ccy = 1_000.0;
/// let crif: Crif = vec![record].into_iter().collect();
///
/// let fx_delta = engine.margin(ProductClass::RatesFX, RiskType::FX, &crif).unwrap();
/// assert!(fx_delta.applicable);
/// assert!((fx_delta.total() - 7_900.0).abs() < 1e-9);
/// ```
pub struct MarginEngine<'a> {
    config: &'a dyn SimmConfiguration,
    fx: &'a dyn FxRateProvider,
    calculation_currency: &'a str,
    result_currency: &'a str,
    side: SimmSide,
    quantile_sq: f64,
    quiet: bool,
}

impl<'a> MarginEngine<'a> {
    /// Creates an engine for `side`.
    pub fn new(
        config: &'a dyn SimmConfiguration,
        fx: &'a dyn FxRateProvider,
        calculation_currency: &'a str,
        result_currency: &'a str,
        side: SimmSide,
    ) -> Result<Self> {
        let normal = Normal::new(0.0, 1.0).map_err(|e| SimmError::configuration(e.to_string()))?;
        let q = normal.inverse_cdf(0.995);
        Ok(Self {
            config,
            fx,
            calculation_currency,
            result_currency,
            side,
            quantile_sq: q * q,
            quiet: false,
        })
    }

    /// Suppresses debug logging.
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Curvature skew adjustment `λ(θ) = (q² - 1)(1 + θ) - θ` with `q` the
    /// 99.5% standard normal quantile.
    #[inline]
    pub fn lambda(&self, theta: f64) -> f64 {
        (self.quantile_sq - 1.0) * (1.0 + theta) - theta
    }

    fn weight(&self, rt: RiskType, r: &CrifRecord) -> Result<f64> {
        self.config
            .weight(rt, &r.qualifier, &r.label1, self.calculation_currency)
    }

    fn sigma(&self, rt: RiskType, r: &CrifRecord) -> Result<f64> {
        self.config
            .sigma(rt, &r.qualifier, &r.label1, self.calculation_currency)
    }

    fn correlation(&self, first: &RiskFactor<'_>, second: &RiskFactor<'_>) -> Result<f64> {
        self.config
            .correlation(first, second, self.calculation_currency)
    }

    /// `max(1, sqrt(|sum| / threshold))` with the USD threshold rebased into
    /// the result currency.
    fn concentration_risk(&self, rt: RiskType, qualifier: &str, sum: f64) -> Result<f64> {
        let mut threshold = self.config.concentration_threshold(rt, qualifier)?;
        if self.result_currency != "USD" {
            threshold *= self.fx.fx_rate("USD", self.result_currency)?;
        }
        Ok((sum / threshold).abs().sqrt().max(1.0))
    }

    fn is_calculation_currency_fx(&self, rt: RiskType, r: &CrifRecord) -> bool {
        rt == RiskType::FX && r.qualifier == self.calculation_currency
    }

    /// Generic bucketed delta or vega margin.
    ///
    /// Buckets are the CRIF bucket values. FX results are broken down per
    /// currency as absolute weighted sensitivities, and FX delta records on
    /// the calculation currency are ignored.
    pub fn margin(&self, pc: ProductClass, rt: RiskType, crif: &Crif) -> Result<MarginResult> {
        let is_fx = matches!(rt, RiskType::FX | RiskType::FXVol);

        let mut buckets: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        let mut by_bucket: BTreeMap<&str, Vec<&CrifRecord>> = BTreeMap::new();
        for r in crif.filter_by(pc, rt) {
            buckets
                .entry(r.bucket.as_str())
                .or_default()
                .insert(r.qualifier.as_str());
            by_bucket.entry(r.bucket.as_str()).or_default().push(r);
        }
        if buckets.is_empty() {
            return Ok(MarginResult::not_applicable());
        }

        let hvr = self.config.historical_volatility_ratio(rt);
        let mut out: BTreeMap<String, f64> = BTreeMap::new();
        let mut bucket_margin: BTreeMap<&str, f64> = BTreeMap::new();
        let mut sum_ws: BTreeMap<&str, f64> = BTreeMap::new();

        for (&bucket, records) in &by_bucket {
            let mut cr_sums: HashMap<&str, f64> = HashMap::new();
            for r in records.iter().filter(|r| !self.is_calculation_currency_fx(rt, r)) {
                *cr_sums.entry(r.qualifier.as_str()).or_insert(0.0) +=
                    r.amount_result_ccy * self.sigma(rt, r)? * hvr;
            }
            let mut cr: HashMap<&str, f64> = HashMap::with_capacity(cr_sums.len());
            for (q, sum) in cr_sums {
                cr.insert(q, self.concentration_risk(rt, q, sum)?);
            }

            let mut weighted: Vec<(&CrifRecord, f64, f64)> = Vec::with_capacity(records.len());
            for &r in records {
                if self.is_calculation_currency_fx(rt, r) {
                    if !self.quiet {
                        debug!(
                            qualifier = %r.qualifier,
                            risk_type = %rt,
                            "Skipping qualifier equal to the calculation currency"
                        );
                    }
                    continue;
                }
                let cr_q = cr.get(r.qualifier.as_str()).copied().unwrap_or(1.0);
                let ws = self.weight(rt, r)? * (r.amount_result_ccy * self.sigma(rt, r)? * hvr) * cr_q;
                weighted.push((r, ws, cr_q));
            }

            let mut sum = 0.0;
            let mut k2 = 0.0;
            for (i, &(outer, ws_o, cr_o)) in weighted.iter().enumerate() {
                sum += ws_o;
                k2 += ws_o * ws_o;
                let f_outer = RiskFactor::new(rt, &outer.qualifier, &outer.label1, &outer.label2);
                for &(inner, ws_i, cr_i) in &weighted[..i] {
                    let f_inner = RiskFactor::new(rt, &inner.qualifier, &inner.label1, &inner.label2);
                    let corr = self.correlation(&f_outer, &f_inner)?;
                    k2 += 2.0 * corr * dampening(cr_o, cr_i) * ws_o * ws_i;
                }
                if is_fx {
                    *out.entry(outer.qualifier.clone()).or_insert(0.0) += ws_o;
                }
            }
            sum_ws.insert(bucket, sum);
            bucket_margin.insert(bucket, k2.max(0.0).sqrt());
        }

        let residual = bucket_margin.remove(RESIDUAL).unwrap_or(0.0);

        let mut total = 0.0;
        let entries: Vec<(&str, f64)> = bucket_margin.iter().map(|(b, k)| (*b, *k)).collect();
        for (i, &(outer, k_o)) in entries.iter().enumerate() {
            total += k_o * k_o;
            let s_o = clamp_by(sum_ws[outer], k_o);
            let q_o = first_qualifier(&buckets, outer)?;
            for &(inner, k_i) in &entries[..i] {
                let s_i = clamp_by(sum_ws[inner], k_i);
                let q_i = first_qualifier(&buckets, inner)?;
                let corr = self.correlation(
                    &RiskFactor::qualifier_only(rt, q_o),
                    &RiskFactor::qualifier_only(rt, q_i),
                )?;
                total += 2.0 * s_o * s_i * corr;
            }
        }
        let total = total.max(0.0).sqrt() + residual;

        if !close_enough(residual, 0.0) {
            out.insert(RESIDUAL.to_string(), residual);
        }
        if is_fx {
            for v in out.values_mut() {
                *v = v.abs();
            }
        } else {
            for (b, k) in bucket_margin {
                out.insert(b.to_string(), k);
            }
        }
        out.insert(ALL.to_string(), total);

        Ok(MarginResult {
            buckets: out,
            applicable: true,
        })
    }

    /// Interest rate delta margin, aggregated per currency.
    ///
    /// Each currency folds its IRCurve tenors with at most one Inflation and
    /// one XCcyBasis record.
    pub fn ir_delta_margin(&self, pc: ProductClass, crif: &Crif) -> Result<MarginResult> {
        const CONTEXT: &str = "SimmCalculator::ir_delta_margin()";

        let qualifiers: BTreeSet<String> = [RiskType::IRCurve, RiskType::XCcyBasis, RiskType::Inflation]
            .into_iter()
            .flat_map(|rt| crif.qualifiers_by(pc, rt))
            .collect();
        if qualifiers.is_empty() {
            return Ok(MarginResult::not_applicable());
        }

        let mut k = Vec::with_capacity(qualifiers.len());
        let mut sums = Vec::with_capacity(qualifiers.len());
        let mut crs = Vec::with_capacity(qualifiers.len());

        for q in &qualifiers {
            let curve = crif.filter_by_qualifier(pc, RiskType::IRCurve, q);
            let xccy = single_record(crif, pc, RiskType::XCcyBasis, q, CONTEXT)?;
            let inflation = single_record(crif, pc, RiskType::Inflation, q, CONTEXT)?;

            // XCcyBasis does not count towards concentration.
            let mut cr_sum: f64 = curve.iter().map(|r| r.amount_result_ccy).sum();
            if let Some(r) = inflation {
                cr_sum += r.amount_result_ccy;
            }
            let cr = self.concentration_risk(RiskType::IRCurve, q, cr_sum)?;

            let mut ws_curve = Vec::with_capacity(curve.len());
            for r in &curve {
                ws_curve.push(self.weight(RiskType::IRCurve, r)? * r.amount_result_ccy * cr);
            }

            let mut sum = 0.0;
            let mut k2 = 0.0;
            for (i, outer) in curve.iter().enumerate() {
                let ws_o = ws_curve[i];
                sum += ws_o;
                k2 += ws_o * ws_o;
                for (j, inner) in curve[..i].iter().enumerate() {
                    let sub_curve = self.correlation(
                        &RiskFactor::new(RiskType::IRCurve, q, "", &outer.label2),
                        &RiskFactor::new(RiskType::IRCurve, q, "", &inner.label2),
                    )?;
                    let tenor = self.correlation(
                        &RiskFactor::new(RiskType::IRCurve, q, &outer.label1, ""),
                        &RiskFactor::new(RiskType::IRCurve, q, &inner.label1, ""),
                    )?;
                    k2 += 2.0 * sub_curve * tenor * ws_o * ws_curve[j];
                }
            }
            let curve_total: f64 = ws_curve.iter().sum();

            let mut ws_inflation = 0.0;
            if let Some(r) = inflation {
                ws_inflation = self.weight(RiskType::Inflation, r)? * r.amount_result_ccy * cr;
                sum += ws_inflation;
                k2 += ws_inflation * ws_inflation;
                let corr = self.correlation(
                    &RiskFactor::qualifier_only(RiskType::IRCurve, q),
                    &RiskFactor::qualifier_only(RiskType::Inflation, q),
                )?;
                k2 += 2.0 * corr * curve_total * ws_inflation;
            }

            if let Some(r) = xccy {
                // No concentration scaling for cross currency basis.
                let ws_xccy = self.weight(RiskType::XCcyBasis, r)? * r.amount_result_ccy;
                sum += ws_xccy;
                k2 += ws_xccy * ws_xccy;
                let corr = self.correlation(
                    &RiskFactor::qualifier_only(RiskType::IRCurve, q),
                    &RiskFactor::qualifier_only(RiskType::XCcyBasis, q),
                )?;
                k2 += 2.0 * corr * curve_total * ws_xccy;
                if inflation.is_some() {
                    let corr = self.correlation(
                        &RiskFactor::qualifier_only(RiskType::Inflation, q),
                        &RiskFactor::qualifier_only(RiskType::XCcyBasis, q),
                    )?;
                    k2 += 2.0 * corr * ws_inflation * ws_xccy;
                }
            }

            k.push(k2.max(0.0).sqrt());
            sums.push(sum);
            crs.push(cr);
        }

        self.aggregate_currencies(RiskType::IRCurve, &qualifiers, &k, &sums, &crs)
    }

    /// Interest rate vega margin, aggregated per currency.
    pub fn ir_vega_margin(&self, pc: ProductClass, crif: &Crif) -> Result<MarginResult> {
        let qualifiers: BTreeSet<String> = [RiskType::IRVol, RiskType::InflationVol]
            .into_iter()
            .flat_map(|rt| crif.qualifiers_by(pc, rt))
            .collect();
        if qualifiers.is_empty() {
            return Ok(MarginResult::not_applicable());
        }

        let mut k = Vec::with_capacity(qualifiers.len());
        let mut sums = Vec::with_capacity(qualifiers.len());
        let mut crs = Vec::with_capacity(qualifiers.len());

        for q in &qualifiers {
            let ir = crif.filter_by_qualifier(pc, RiskType::IRVol, q);
            let inf = crif.filter_by_qualifier(pc, RiskType::InflationVol, q);

            let cr_sum: f64 = ir
                .iter()
                .chain(inf.iter())
                .map(|r| r.amount_result_ccy)
                .sum();
            let cr = self.concentration_risk(RiskType::IRVol, q, cr_sum)?;

            let mut ws_ir = Vec::with_capacity(ir.len());
            for r in &ir {
                ws_ir.push(self.weight(RiskType::IRVol, r)? * r.amount_result_ccy * cr);
            }
            let mut ws_inf = Vec::with_capacity(inf.len());
            for r in &inf {
                ws_inf.push(self.weight(RiskType::InflationVol, r)? * r.amount_result_ccy * cr);
            }

            let mut sum = 0.0;
            let mut k2 = 0.0;
            for (i, outer) in ir.iter().enumerate() {
                sum += ws_ir[i];
                k2 += ws_ir[i] * ws_ir[i];
                for (j, inner) in ir[..i].iter().enumerate() {
                    let corr = self.correlation(
                        &RiskFactor::new(RiskType::IRVol, q, &outer.label1, ""),
                        &RiskFactor::new(RiskType::IRVol, q, &inner.label1, ""),
                    )?;
                    k2 += 2.0 * corr * ws_ir[i] * ws_ir[j];
                }
            }
            for (i, outer) in inf.iter().enumerate() {
                let ws_o = ws_inf[i];
                sum += ws_o;
                k2 += ws_o * ws_o;
                let f_outer = RiskFactor::new(RiskType::InflationVol, q, &outer.label1, "");
                for (j, inner) in ir.iter().enumerate() {
                    let corr = self.correlation(
                        &f_outer,
                        &RiskFactor::new(RiskType::IRVol, q, &inner.label1, ""),
                    )?;
                    k2 += 2.0 * corr * ws_o * ws_ir[j];
                }
                for (j, inner) in inf[..i].iter().enumerate() {
                    let corr = self.correlation(
                        &f_outer,
                        &RiskFactor::new(RiskType::InflationVol, q, &inner.label1, ""),
                    )?;
                    k2 += 2.0 * corr * ws_o * ws_inf[j];
                }
            }

            k.push(k2.max(0.0).sqrt());
            sums.push(sum);
            crs.push(cr);
        }

        self.aggregate_currencies(RiskType::IRVol, &qualifiers, &k, &sums, &crs)
    }

    fn aggregate_currencies(
        &self,
        rt: RiskType,
        qualifiers: &BTreeSet<String>,
        k: &[f64],
        sums: &[f64],
        crs: &[f64],
    ) -> Result<MarginResult> {
        let qs: Vec<&str> = qualifiers.iter().map(String::as_str).collect();
        let mut total = 0.0;
        for (o, q_o) in qs.iter().enumerate() {
            total += k[o] * k[o];
            let s_o = clamp_by(sums[o], k[o]);
            for (i, q_i) in qs[..o].iter().enumerate() {
                let s_i = clamp_by(sums[i], k[i]);
                let corr = self.correlation(
                    &RiskFactor::qualifier_only(rt, q_o),
                    &RiskFactor::qualifier_only(rt, q_i),
                )?;
                total += 2.0 * s_o * s_i * corr * dampening(crs[o], crs[i]);
            }
        }

        let mut buckets: BTreeMap<String, f64> = qs
            .iter()
            .zip(k)
            .map(|(q, v)| (q.to_string(), *v))
            .collect();
        buckets.insert(ALL.to_string(), total.max(0.0).sqrt());
        Ok(MarginResult {
            buckets,
            applicable: true,
        })
    }

    /// Interest rate curvature margin, scaled by the configuration's
    /// curvature margin scaling.
    ///
    /// Inflation vol curvature only contributes after SIMM 1.0.
    pub fn ir_curvature_margin(&self, pc: ProductClass, crif: &Crif) -> Result<MarginResult> {
        let qualifiers: BTreeSet<String> = [RiskType::IRVol, RiskType::InflationVol]
            .into_iter()
            .flat_map(|rt| crif.qualifiers_by(pc, rt))
            .collect();
        if qualifiers.is_empty() {
            return Ok(MarginResult::not_applicable());
        }

        let multiplier = self.side.curvature_multiplier();
        let with_inflation =
            self.config.is_simm_config_calibration() || self.config.version() > SimmVersion::V1_0;

        let mut k = Vec::with_capacity(qualifiers.len());
        let mut sums = Vec::with_capacity(qualifiers.len());
        let mut sum_ws = 0.0;
        let mut sum_abs_ws = 0.0;

        for q in &qualifiers {
            let ir = crif.filter_by_qualifier(pc, RiskType::IRVol, q);

            let mut ws_ir = Vec::with_capacity(ir.len());
            for r in &ir {
                let sf = self.config.curvature_weight(RiskType::IRVol, &r.label1)?;
                ws_ir.push(sf * (r.amount_result_ccy * multiplier));
            }

            let mut sum = 0.0;
            let mut k2 = 0.0;
            for (i, outer) in ir.iter().enumerate() {
                let ws_o = ws_ir[i];
                sum += ws_o;
                sum_ws += ws_o;
                sum_abs_ws += ws_o.abs();
                k2 += ws_o * ws_o;
                for (j, inner) in ir[..i].iter().enumerate() {
                    let corr = self.correlation(
                        &RiskFactor::new(RiskType::IRVol, q, &outer.label1, ""),
                        &RiskFactor::new(RiskType::IRVol, q, &inner.label1, ""),
                    )?;
                    k2 += 2.0 * corr * corr * ws_o * ws_ir[j];
                }
            }

            if with_inflation {
                let mut ws_inf = 0.0;
                for r in crif.filter_by_qualifier(pc, RiskType::InflationVol, q) {
                    let sf = self.config.curvature_weight(RiskType::InflationVol, &r.label1)?;
                    ws_inf += sf * (r.amount_result_ccy * multiplier);
                }
                sum += ws_inf;
                sum_ws += ws_inf;
                sum_abs_ws += ws_inf.abs();
                k2 += ws_inf * ws_inf;
                let f_inf = RiskFactor::qualifier_only(RiskType::InflationVol, q);
                for (j, r) in ir.iter().enumerate() {
                    let corr = self.correlation(
                        &f_inf,
                        &RiskFactor::new(RiskType::IRVol, q, &r.label1, ""),
                    )?;
                    k2 += 2.0 * corr * corr * ws_inf * ws_ir[j];
                }
            }

            k.push(k2.max(0.0).sqrt());
            sums.push(sum);
        }

        if close_enough(sum_abs_ws, 0.0) {
            return Ok(MarginResult::with_total(0.0, true));
        }

        let theta = (sum_ws / sum_abs_ws).min(0.0);
        let qs: Vec<&str> = qualifiers.iter().map(String::as_str).collect();
        let mut total = 0.0;
        for (o, q_o) in qs.iter().enumerate() {
            total += k[o] * k[o];
            let s_o = clamp_by(sums[o], k[o]);
            for (i, q_i) in qs[..o].iter().enumerate() {
                let s_i = clamp_by(sums[i], k[i]);
                let corr = self.correlation(
                    &RiskFactor::qualifier_only(RiskType::IRVol, q_o),
                    &RiskFactor::qualifier_only(RiskType::IRVol, q_i),
                )?;
                total += 2.0 * s_o * s_i * corr * corr;
            }
        }
        let margin = sum_ws + self.lambda(theta) * total.max(0.0).sqrt();

        let mut buckets: BTreeMap<String, f64> = qs
            .iter()
            .zip(&k)
            .map(|(q, v)| (q.to_string(), *v))
            .collect();
        buckets.insert(
            ALL.to_string(),
            self.config.curvature_margin_scaling() * margin.max(0.0),
        );
        Ok(MarginResult {
            buckets,
            applicable: true,
        })
    }

    /// Curvature margin for a non-IR vol risk type.
    ///
    /// With `rf_labels` set, the absolute weighted sensitivity sum used for
    /// `θ` nets per record before taking absolute values per qualifier; it is
    /// used for the credit risk classes.
    pub fn curvature_margin(
        &self,
        pc: ProductClass,
        rt: RiskType,
        crif: &Crif,
        rf_labels: bool,
    ) -> Result<MarginResult> {
        let is_fx = matches!(rt, RiskType::FX | RiskType::FXVol);
        let multiplier = self.side.curvature_multiplier();
        let zero_equity_12 = rt == RiskType::EquityVol
            && (self.config.is_simm_config_calibration() || self.config.version() >= SimmVersion::V2_2);

        let mut buckets: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        let mut by_bucket: BTreeMap<&str, Vec<&CrifRecord>> = BTreeMap::new();
        for r in crif.filter_by(pc, rt) {
            buckets
                .entry(r.bucket.as_str())
                .or_default()
                .insert(r.qualifier.as_str());
            by_bucket.entry(r.bucket.as_str()).or_default().push(r);
        }
        if buckets.is_empty() {
            return Ok(MarginResult::not_applicable());
        }

        let mut out: BTreeMap<String, f64> = BTreeMap::new();
        let mut curvature: BTreeMap<&str, f64> = BTreeMap::new();
        let mut sum_ws: BTreeMap<&str, f64> = BTreeMap::new();
        let mut sum_abs_ws: BTreeMap<&str, f64> = BTreeMap::new();

        for (&bucket, records) in &by_bucket {
            let mut ws = Vec::with_capacity(records.len());
            for r in records {
                let sf = self.config.curvature_weight(rt, &r.label1)?;
                let value = if zero_equity_12 && bucket == "12" {
                    0.0
                } else {
                    sf * ((r.amount_result_ccy * multiplier) * self.sigma(rt, r)?)
                };
                ws.push(value);
            }

            let mut sum = 0.0;
            let mut k2 = 0.0;
            let mut per_qualifier: BTreeMap<&str, f64> = BTreeMap::new();
            for (i, outer) in records.iter().enumerate() {
                let ws_o = ws[i];
                sum += ws_o;
                *per_qualifier.entry(outer.qualifier.as_str()).or_insert(0.0) +=
                    if rf_labels { ws_o.abs() } else { ws_o };
                k2 += ws_o * ws_o;
                let f_outer = RiskFactor::new(rt, &outer.qualifier, &outer.label1, &outer.label2);
                for (j, inner) in records[..i].iter().enumerate() {
                    let corr = self.correlation(
                        &f_outer,
                        &RiskFactor::new(rt, &inner.qualifier, &inner.label1, &inner.label2),
                    )?;
                    k2 += 2.0 * corr * corr * ws_o * ws[j];
                }
                if is_fx {
                    *out.entry(outer.qualifier.clone()).or_insert(0.0) += ws_o;
                }
            }

            sum_ws.insert(bucket, sum);
            curvature.insert(bucket, k2.max(0.0).sqrt());
            sum_abs_ws.insert(bucket, per_qualifier.values().map(|v| v.abs()).sum());
        }

        let residual_k = curvature.remove(RESIDUAL);
        let residual_sum = sum_ws.remove(RESIDUAL).unwrap_or(0.0);
        let residual_abs = sum_abs_ws.remove(RESIDUAL).unwrap_or(0.0);

        let total_sum: f64 = sum_ws.values().sum();
        let total_abs: f64 = sum_abs_ws.values().sum();

        let mut margin = 0.0;
        if !close_enough(total_abs, 0.0) {
            let theta = (total_sum / total_abs).min(0.0);
            let entries: Vec<(&str, f64)> = curvature.iter().map(|(b, k)| (*b, *k)).collect();
            let mut agg = 0.0;
            for (i, &(outer, k_o)) in entries.iter().enumerate() {
                agg += k_o * k_o;
                let s_o = clamp_by(sum_ws[outer], k_o);
                let q_o = first_qualifier(&buckets, outer)?;
                for &(inner, k_i) in &entries[..i] {
                    let s_i = clamp_by(sum_ws[inner], k_i);
                    let q_i = first_qualifier(&buckets, inner)?;
                    let corr = self.correlation(
                        &RiskFactor::qualifier_only(rt, q_o),
                        &RiskFactor::qualifier_only(rt, q_i),
                    )?;
                    agg += 2.0 * s_o * s_i * corr * corr;
                }
            }
            margin = (total_sum + self.lambda(theta) * agg.max(0.0).sqrt()).max(0.0);
        }

        let mut residual = None;
        if !close_enough(residual_abs, 0.0) {
            let theta = (residual_sum / residual_abs).min(0.0);
            let value =
                (residual_sum + self.lambda(theta) * residual_k.unwrap_or(0.0)).max(0.0);
            margin += value;
            residual = Some(value);
        }

        if is_fx {
            for v in out.values_mut() {
                *v = v.abs();
            }
        } else {
            for (b, k) in curvature {
                out.insert(b.to_string(), k);
            }
            if let Some(value) = residual {
                out.insert(RESIDUAL.to_string(), value);
            }
        }
        out.insert(ALL.to_string(), margin);

        Ok(MarginResult {
            buckets: out,
            applicable: true,
        })
    }
}

fn first_qualifier<'b>(buckets: &BTreeMap<&str, BTreeSet<&'b str>>, bucket: &str) -> Result<&'b str> {
    buckets
        .get(bucket)
        .and_then(|qs| qs.iter().next().copied())
        .ok_or_else(|| {
            SimmError::configuration(format!(
                "SimmCalculator::margin(): No qualifier found for bucket {}",
                bucket
            ))
        })
}

fn single_record<'c>(
    crif: &'c Crif,
    pc: ProductClass,
    rt: RiskType,
    qualifier: &str,
    context: &str,
) -> Result<Option<&'c CrifRecord>> {
    let count = crif.count_matching(pc, rt, qualifier);
    if count > 1 {
        return Err(SimmError::Cardinality {
            context: context.to_string(),
            risk_type: rt.name().to_string(),
            qualifier: qualifier.to_string(),
            count,
        });
    }
    Ok(crif.find_by(pc, rt, qualifier))
}
