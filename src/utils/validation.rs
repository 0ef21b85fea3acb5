//! Validation utilities

use crate::traits::*;
use crate::types::*;
use bigdecimal::BigDecimal;
use std::str::FromStr;

/// Largest number of decimal places, or trailing zeros, an amount may carry
pub const MAX_AMOUNT_SCALE: i64 = 18;

/// Largest number of significant digits in an amount
pub const MAX_AMOUNT_DIGITS: usize = 38;

/// Parse a decimal amount from text
///
/// Exponent notation is accepted only while the result stays within
/// [`MAX_AMOUNT_SCALE`] and [`MAX_AMOUNT_DIGITS`].
pub fn parse_amount(raw: &str) -> ReconciliationResult<BigDecimal> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ReconciliationError::Validation(
            "amount is required".to_string(),
        ));
    }

    let amount = BigDecimal::from_str(trimmed).map_err(|_| {
        ReconciliationError::Validation(format!("amount '{}' is not a valid decimal", trimmed))
    })?;
    validate_amount_bounds(&amount)?;

    Ok(amount)
}

/// Validate that an amount's scale and digit count stay within fixed limits
pub fn validate_amount_bounds(amount: &BigDecimal) -> ReconciliationResult<()> {
    let (digits, scale) = amount.as_bigint_and_exponent();
    if scale.abs() > MAX_AMOUNT_SCALE {
        return Err(ReconciliationError::Validation(format!(
            "amount exponent is out of range (at most {} places either side of the point)",
            MAX_AMOUNT_SCALE
        )));
    }

    let digit_count = digits.to_string().trim_start_matches('-').len();
    if digit_count > MAX_AMOUNT_DIGITS {
        return Err(ReconciliationError::Validation(format!(
            "amount cannot exceed {} digits",
            MAX_AMOUNT_DIGITS
        )));
    }

    Ok(())
}

/// Validate that a statement description is valid
pub fn validate_description(description: &str) -> ReconciliationResult<()> {
    if description.trim().is_empty() {
        return Err(ReconciliationError::Validation(
            "description cannot be empty".to_string(),
        ));
    }

    if description.len() > 500 {
        return Err(ReconciliationError::Validation(
            "description cannot exceed 500 characters".to_string(),
        ));
    }

    Ok(())
}

/// Validate an optional bank reference
pub fn validate_reference(reference: Option<&str>) -> ReconciliationResult<()> {
    if let Some(reference) = reference {
        if reference.len() > 100 {
            return Err(ReconciliationError::Validation(
                "reference cannot exceed 100 characters".to_string(),
            ));
        }
    }

    Ok(())
}

/// Validate that an amount has no more decimal places than the currency allows
pub fn validate_amount_scale(amount: &BigDecimal, currency_scale: i64) -> ReconciliationResult<()> {
    let (_, scale) = amount.normalized().as_bigint_and_exponent();
    if scale > currency_scale {
        return Err(ReconciliationError::Validation(format!(
            "amount {} has more than {} decimal places",
            amount, currency_scale
        )));
    }

    Ok(())
}

/// Line validator with length, sign and precision checks
pub struct StrictLineValidator {
    pub currency_scale: i64,
}

impl Default for StrictLineValidator {
    fn default() -> Self {
        Self { currency_scale: 2 }
    }
}

impl LineValidator for StrictLineValidator {
    fn validate_line(&self, line: &StatementLine) -> ReconciliationResult<()> {
        validate_description(&line.description)?;
        validate_reference(line.reference.as_deref())?;

        if line.amount == BigDecimal::from(0) {
            return Err(ReconciliationError::Validation(
                "amount cannot be zero".to_string(),
            ));
        }

        validate_amount_scale(&line.amount, self.currency_scale)
    }
}
