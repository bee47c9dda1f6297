//! CRIF sensitivity records and netting set keys.

use std::fmt;

use crate::types::{ImModel, ProductClass, RegulationSet, RiskType, SimmSide};

/// Identifies a netting set.
///
/// The netting set ID is mandatory; the remaining discriminators are
/// optional and empty when not supplied.
///
/// # Examples
///
/// ```
/// use pricer_simm::NettingSetDetails;
///
/// let nsd = NettingSetDetails::from("PF001");
/// assert_eq!(nsd.netting_set_id(), "PF001");
/// assert_eq!(nsd.to_string(), "PF001");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct NettingSetDetails {
    netting_set_id: String,
    agreement_type: String,
    call_type: String,
    initial_margin_type: String,
    legal_entity_id: String,
}

impl NettingSetDetails {
    /// Creates details holding only a netting set ID.
    pub fn new(netting_set_id: impl Into<String>) -> Self {
        Self {
            netting_set_id: netting_set_id.into(),
            ..Self::default()
        }
    }

    /// Creates fully specified details.
    pub fn with_discriminators(
        netting_set_id: impl Into<String>,
        agreement_type: impl Into<String>,
        call_type: impl Into<String>,
        initial_margin_type: impl Into<String>,
        legal_entity_id: impl Into<String>,
    ) -> Self {
        Self {
            netting_set_id: netting_set_id.into(),
            agreement_type: agreement_type.into(),
            call_type: call_type.into(),
            initial_margin_type: initial_margin_type.into(),
            legal_entity_id: legal_entity_id.into(),
        }
    }

    /// Netting set ID.
    pub fn netting_set_id(&self) -> &str {
        &self.netting_set_id
    }

    /// Agreement type, empty if not supplied.
    pub fn agreement_type(&self) -> &str {
        &self.agreement_type
    }

    /// Call type, empty if not supplied.
    pub fn call_type(&self) -> &str {
        &self.call_type
    }

    /// Initial margin type, empty if not supplied.
    pub fn initial_margin_type(&self) -> &str {
        &self.initial_margin_type
    }

    /// Legal entity ID, empty if not supplied.
    pub fn legal_entity_id(&self) -> &str {
        &self.legal_entity_id
    }

    /// Whether only the netting set ID is populated.
    pub fn is_id_only(&self) -> bool {
        self.agreement_type.is_empty()
            && self.call_type.is_empty()
            && self.initial_margin_type.is_empty()
            && self.legal_entity_id.is_empty()
    }
}

impl fmt::Display for NettingSetDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_id_only() {
            return f.write_str(&self.netting_set_id);
        }
        write!(
            f,
            "NettingSetId={}, AgreementType={}, CallType={}, InitialMarginType={}, LegalEntityId={}",
            self.netting_set_id,
            self.agreement_type,
            self.call_type,
            self.initial_margin_type,
            self.legal_entity_id
        )
    }
}

impl From<&str> for NettingSetDetails {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for NettingSetDetails {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// A single CRIF sensitivity (or SIMM parameter) record.
///
/// Records are created by a loader, cleaned once by the calculator
/// (`amount_result_ccy` and `result_currency` populated) and immutable
/// thereafter.
///
/// # Examples
///
/// ```
/// use pricer_simm::{CrifRecord, ProductClass, RiskType};
///
/// let record = CrifRecord::new("T1", "PF001", ProductClass::RatesFX, RiskType::IRCurve)
///     .with_qualifier("USD")
///     .with_bucket("1")
///     .with_labels("5y", "Libor3m")
///     .with_amount("USD", 1_000.0);
/// assert!(!record.is_simm_parameter());
/// assert!(record.requires_amount_usd());
/// ```
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CrifRecord {
    /// Trade identifier.
    pub trade_id: String,
    /// Trade type, informational only.
    pub trade_type: String,
    /// Netting set the record belongs to.
    pub netting_set_details: NettingSetDetails,
    /// Product class.
    pub product_class: ProductClass,
    /// Risk type.
    pub risk_type: RiskType,
    /// Risk factor qualifier.
    pub qualifier: String,
    /// SIMM bucket.
    pub bucket: String,
    /// First label (usually a tenor).
    pub label1: String,
    /// Second label (usually a sub-curve).
    pub label2: String,
    /// Currency of `amount`.
    pub amount_currency: String,
    /// Amount in `amount_currency`.
    pub amount: f64,
    /// Amount in USD, if supplied.
    pub amount_usd: Option<f64>,
    /// Amount in the result currency, populated by cleaning.
    pub amount_result_ccy: f64,
    /// Result currency, populated by cleaning.
    pub result_currency: String,
    /// Regulations applicable on the collect (Call) side.
    pub collect_regulations: RegulationSet,
    /// Regulations applicable on the post side.
    pub post_regulations: RegulationSet,
    /// Declared IM model.
    pub im_model: ImModel,
}

impl CrifRecord {
    /// Creates a record with blank qualifier, bucket, labels and amounts.
    pub fn new(
        trade_id: impl Into<String>,
        netting_set_details: impl Into<NettingSetDetails>,
        product_class: ProductClass,
        risk_type: RiskType,
    ) -> Self {
        Self {
            trade_id: trade_id.into(),
            trade_type: String::new(),
            netting_set_details: netting_set_details.into(),
            product_class,
            risk_type,
            qualifier: String::new(),
            bucket: String::new(),
            label1: String::new(),
            label2: String::new(),
            amount_currency: String::new(),
            amount: 0.0,
            amount_usd: None,
            amount_result_ccy: 0.0,
            result_currency: String::new(),
            collect_regulations: RegulationSet::new(),
            post_regulations: RegulationSet::new(),
            im_model: ImModel::Empty,
        }
    }

    /// Sets the qualifier.
    pub fn with_qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.qualifier = qualifier.into();
        self
    }

    /// Sets the bucket.
    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = bucket.into();
        self
    }

    /// Sets both labels.
    pub fn with_labels(mut self, label1: impl Into<String>, label2: impl Into<String>) -> Self {
        self.label1 = label1.into();
        self.label2 = label2.into();
        self
    }

    /// Sets the amount and its currency.
    pub fn with_amount(mut self, currency: impl Into<String>, amount: f64) -> Self {
        self.amount_currency = currency.into();
        self.amount = amount;
        self
    }

    /// Sets the USD amount.
    pub fn with_amount_usd(mut self, amount_usd: f64) -> Self {
        self.amount_usd = Some(amount_usd);
        self
    }

    /// Sets collect and post regulations.
    pub fn with_regulations(mut self, collect: RegulationSet, post: RegulationSet) -> Self {
        self.collect_regulations = collect;
        self.post_regulations = post;
        self
    }

    /// Sets the IM model.
    pub fn with_im_model(mut self, im_model: ImModel) -> Self {
        self.im_model = im_model;
        self
    }

    /// Sets the trade type.
    pub fn with_trade_type(mut self, trade_type: impl Into<String>) -> Self {
        self.trade_type = trade_type.into();
        self
    }

    /// Whether this record is a SIMM parameter rather than a sensitivity.
    #[inline]
    pub fn is_simm_parameter(&self) -> bool {
        self.risk_type.is_simm_parameter()
    }

    /// Whether the amount must be converted into the result currency.
    #[inline]
    pub fn requires_amount_usd(&self) -> bool {
        self.risk_type.requires_amount_usd()
    }

    /// Whether a USD amount was supplied.
    #[inline]
    pub fn has_amount_usd(&self) -> bool {
        self.amount_usd.is_some()
    }

    /// Regulations applicable on `side`.
    pub fn regulations(&self, side: SimmSide) -> &RegulationSet {
        match side {
            SimmSide::Call => &self.collect_regulations,
            SimmSide::Post => &self.post_regulations,
        }
    }
}

impl fmt::Display for CrifRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {}, {}, {}, {}, {}, {}, {}, {}, {}",
            self.trade_id,
            self.netting_set_details,
            self.product_class,
            self.risk_type,
            self.qualifier,
            self.bucket,
            self.label1,
            self.label2,
            self.amount_currency,
            self.amount
        )?;
        if let Some(usd) = self.amount_usd {
            write!(f, ", {}", usd)?;
        }
        if !self.collect_regulations.is_empty() {
            write!(f, ", collect_regulations={}", self.collect_regulations)?;
        }
        if !self.post_regulations.is_empty() {
            write!(f, ", post_regulations={}", self.post_regulations)?;
        }
        f.write_str("]")
    }
}
