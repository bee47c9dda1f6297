//! Calculator run options.

use crate::crif::NettingSetDetails;
use crate::error::{Result, SimmError};
use crate::types::SimmSide;

/// Netting sets that globally declare the SEC regulation, per side.
///
/// When a netting set is listed here the SEC/CFTC normalisation is applied
/// even if no record of the netting set carries SEC itself.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SecNettingSets {
    /// Call side netting sets.
    pub call: Vec<NettingSetDetails>,
    /// Post side netting sets.
    pub post: Vec<NettingSetDetails>,
}

impl SecNettingSets {
    /// Whether `nsd` declares SEC on `side`.
    pub fn contains(&self, side: SimmSide, nsd: &NettingSetDetails) -> bool {
        match side {
            SimmSide::Call => self.call.contains(nsd),
            SimmSide::Post => self.post.contains(nsd),
        }
    }

    /// Adds a netting set for `side`.
    pub fn insert(&mut self, side: SimmSide, nsd: NettingSetDetails) {
        let list = match side {
            SimmSide::Call => &mut self.call,
            SimmSide::Post => &mut self.post,
        };
        if !list.contains(&nsd) {
            list.push(nsd);
        }
    }
}

/// Options controlling a [`SimmCalculator`](super::SimmCalculator) run.
///
/// # Examples
///
/// ```
/// use pricer_simm::SimmCalculatorConfig;
///
/// let config = SimmCalculatorConfig {
///     result_currency: Some("EUR".to_string()),
///     enforce_im_regulations: true,
///     ..Default::default()
/// };
/// assert!(config.validate().is_ok());
/// assert_eq!(config.result_currency(), "EUR");
/// ```
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SimmCalculatorConfig {
    /// Calculation currency for the Call side.
    pub calculation_currency_call: String,
    /// Calculation currency for the Post side.
    pub calculation_currency_post: String,
    /// Result currency. Defaults to the Call side calculation currency.
    pub result_currency: Option<String>,
    /// Whether to select winning regulations and populate final results.
    pub determine_winning_regulations: bool,
    /// Whether record regulations are honoured. When false every record
    /// is treated as `Unspecified`.
    pub enforce_im_regulations: bool,
    /// Suppresses all calculator logging.
    pub quiet: bool,
    /// Netting sets that globally declare SEC.
    pub sec_netting_sets: SecNettingSets,
    /// Iteration cap of the duplicate regulation cleanup.
    pub max_cleanup_iterations: usize,
}

impl Default for SimmCalculatorConfig {
    fn default() -> Self {
        Self {
            calculation_currency_call: "USD".to_string(),
            calculation_currency_post: "USD".to_string(),
            result_currency: None,
            determine_winning_regulations: true,
            enforce_im_regulations: false,
            quiet: false,
            sec_netting_sets: SecNettingSets::default(),
            max_cleanup_iterations: 1000,
        }
    }
}

impl SimmCalculatorConfig {
    /// Result currency, falling back to the Call side calculation currency.
    pub fn result_currency(&self) -> &str {
        self.result_currency
            .as_deref()
            .unwrap_or(&self.calculation_currency_call)
    }

    /// Calculation currency for `side`.
    pub fn calculation_currency(&self, side: SimmSide) -> &str {
        match side {
            SimmSide::Call => &self.calculation_currency_call,
            SimmSide::Post => &self.calculation_currency_post,
        }
    }

    /// Checks the currency codes and the cleanup iteration cap.
    pub fn validate(&self) -> Result<()> {
        check_currency("Call side calculation currency", &self.calculation_currency_call)?;
        check_currency("Post side calculation currency", &self.calculation_currency_post)?;
        check_currency("result currency", self.result_currency())?;
        if self.max_cleanup_iterations == 0 {
            return Err(SimmError::configuration(
                "SimmCalculatorConfig::validate(): max_cleanup_iterations must be positive",
            ));
        }
        Ok(())
    }
}

/// Whether `code` looks like an ISO 4217 code.
pub(crate) fn is_currency_code(code: &str) -> bool {
    code.len() == 3 && code.bytes().all(|b| b.is_ascii_uppercase())
}

fn check_currency(role: &str, code: &str) -> Result<()> {
    if is_currency_code(code) {
        Ok(())
    } else {
        Err(SimmError::InvalidCurrency {
            context: "SimmCalculator::new()".to_string(),
            role: role.to_string(),
            code: code.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = SimmCalculatorConfig::default();
        assert_eq!(c.result_currency(), "USD");
        assert_eq!(c.calculation_currency(SimmSide::Post), "USD");
        assert!(c.determine_winning_regulations);
        assert!(!c.enforce_im_regulations);
        assert_eq!(c.max_cleanup_iterations, 1000);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_result_currency_falls_back_to_call() {
        let c = SimmCalculatorConfig {
            calculation_currency_call: "EUR".to_string(),
            ..Default::default()
        };
        assert_eq!(c.result_currency(), "EUR");
    }

    #[test]
    fn test_validate_rejects_bad_codes() {
        let c = SimmCalculatorConfig {
            calculation_currency_post: "usd".to_string(),
            ..Default::default()
        };
        let err = c.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "SimmCalculator::new(): The Post side calculation currency (usd) must be a valid ISO currency code"
        );

        let c = SimmCalculatorConfig {
            result_currency: Some("EURO".to_string()),
            ..Default::default()
        };
        assert!(matches!(c.validate(), Err(SimmError::InvalidCurrency { .. })));
    }

    #[test]
    fn test_sec_netting_sets() {
        let mut sec = SecNettingSets::default();
        sec.insert(SimmSide::Post, NettingSetDetails::from("PF"));
        sec.insert(SimmSide::Post, NettingSetDetails::from("PF"));
        assert_eq!(sec.post.len(), 1);
        assert!(sec.contains(SimmSide::Post, &NettingSetDetails::from("PF")));
        assert!(!sec.contains(SimmSide::Call, &NettingSetDetails::from("PF")));
    }
}
