//! Engine configuration

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use crate::types::*;

/// Tuning for the automatic matcher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Largest allowed gap in days between statement date and journal date
    pub date_window_days: i64,
    /// Largest allowed amount difference after rounding to `currency_scale`
    pub amount_tolerance: BigDecimal,
    /// Decimal places of the currency's minor unit
    pub currency_scale: i64,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            date_window_days: 3,
            amount_tolerance: BigDecimal::from(0),
            currency_scale: 2,
        }
    }
}

impl MatchingConfig {
    pub fn with_date_window(mut self, days: i64) -> Self {
        self.date_window_days = days;
        self
    }

    pub fn validate(&self) -> ReconciliationResult<()> {
        if self.date_window_days < 0 {
            return Err(ReconciliationError::Validation(
                "date_window_days cannot be negative".to_string(),
            ));
        }

        if self.amount_tolerance < BigDecimal::from(0) {
            return Err(ReconciliationError::Validation(
                "amount_tolerance cannot be negative".to_string(),
            ));
        }

        if self.currency_scale < 0 {
            return Err(ReconciliationError::Validation(
                "currency_scale cannot be negative".to_string(),
            ));
        }

        Ok(())
    }
}

/// Configuration for one reconciliation engine instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Cash GL account whose splits are reconciled
    pub cash_account_id: String,
    #[serde(default)]
    pub matching: MatchingConfig,
}

impl EngineConfig {
    pub fn new(cash_account_id: &str) -> Self {
        Self {
            cash_account_id: cash_account_id.to_string(),
            matching: MatchingConfig::default(),
        }
    }

    pub fn with_matching(mut self, matching: MatchingConfig) -> Self {
        self.matching = matching;
        self
    }

    /// Parse and validate a TOML document
    ///
    /// ```toml
    /// cash_account_id = "1000-cash"
    ///
    /// [matching]
    /// date_window_days = 5
    /// amount_tolerance = "0.00"
    /// ```
    pub fn from_toml_str(content: &str) -> ReconciliationResult<Self> {
        let config: EngineConfig = toml::from_str(content).map_err(|e| {
            ReconciliationError::Validation(format!("Failed to parse TOML: {e}"))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ReconciliationResult<()> {
        if self.cash_account_id.trim().is_empty() {
            return Err(ReconciliationError::Validation(
                "cash_account_id cannot be empty".to_string(),
            ));
        }

        self.matching.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_defaults_when_matching_omitted() {
        let config = EngineConfig::from_toml_str(r#"cash_account_id = "cash""#).unwrap();
        assert_eq!(config.matching, MatchingConfig::default());
        assert_eq!(config.matching.date_window_days, 3);
    }

    #[test]
    fn test_partial_matching_section() {
        let config = EngineConfig::from_toml_str(
            r#"
            cash_account_id = "cash"

            [matching]
            date_window_days = 5
            amount_tolerance = "0.01"
            "#,
        )
        .unwrap();
        assert_eq!(config.matching.date_window_days, 5);
        assert_eq!(
            config.matching.amount_tolerance,
            BigDecimal::from_str("0.01").unwrap()
        );
        assert_eq!(config.matching.currency_scale, 2);
    }

    #[test]
    fn test_rejects_invalid_values() {
        assert!(EngineConfig::from_toml_str(r#"cash_account_id = " ""#).is_err());
        assert!(EngineConfig::from_toml_str(
            r#"
            cash_account_id = "cash"
            [matching]
            date_window_days = -1
            "#
        )
        .is_err());
        assert!(EngineConfig::from_toml_str("not toml at all =").is_err());
    }
}
