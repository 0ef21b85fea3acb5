//! Traits for storage abstraction and extensibility

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::NaiveDateTime;
use std::collections::HashMap;

use crate::types::*;

/// Storage abstraction for statement lines and their split claims
///
/// Each method is individually atomic. `claim_split`, `release_split` and
/// `mark_reconciled` are conditional writes: the precondition check and the
/// write happen as one step, so concurrent callers cannot both observe the
/// same precondition as satisfied. Implementations may back this with a
/// database transaction, a conditional UPDATE, or a lock.
#[async_trait]
pub trait StatementStore: Send + Sync {
    /// Insert a batch of new lines; either all are stored or none are
    async fn insert_lines(&self, lines: &[StatementLine]) -> ReconciliationResult<()>;

    /// Get a line by ID
    async fn get_line(&self, line_id: LineId) -> ReconciliationResult<Option<StatementLine>>;

    /// All lines, in insertion order
    async fn all_lines(&self) -> ReconciliationResult<Vec<StatementLine>>;

    /// Split IDs currently claimed, mapped to the claiming line.
    ///
    /// Includes claims held by both matched and reconciled lines.
    async fn claimed_splits(&self) -> ReconciliationResult<HashMap<String, LineId>>;

    /// Link an unmatched line to an unclaimed split.
    ///
    /// Fails with `LineNotFound` for an unknown line and `AlreadyMatched` if
    /// the line is not unmatched or the split is claimed by any line.
    async fn claim_split(&self, line_id: LineId, split_id: &str)
        -> ReconciliationResult<StatementLine>;

    /// Return a matched line to unmatched and free its split.
    ///
    /// Fails with `LineNotFound` or `InvalidState` if the line is not matched.
    async fn release_split(&self, line_id: LineId) -> ReconciliationResult<StatementLine>;

    /// Move every listed line from matched to reconciled.
    ///
    /// Fails with `InvalidState` without writing anything if any ID is
    /// unknown or not matched.
    async fn mark_reconciled(
        &self,
        line_ids: &[LineId],
        actor: &str,
        reconciled_at: NaiveDateTime,
    ) -> ReconciliationResult<Vec<StatementLine>>;
}

/// Read-only view of the general ledger used by the engine
#[async_trait]
pub trait LedgerGateway: Send + Sync {
    /// Splits posted to the cash account that the ledger considers open
    async fn list_unreconciled_splits(
        &self,
        cash_account_id: &str,
    ) -> ReconciliationResult<Vec<GlSplit>>;

    /// Current balance of the cash account
    async fn cash_account_balance(&self, cash_account_id: &str)
        -> ReconciliationResult<BigDecimal>;
}

/// Trait for implementing custom ingestion rules for statement lines
pub trait LineValidator: Send + Sync {
    /// Validate a line before it is stored
    fn validate_line(&self, line: &StatementLine) -> ReconciliationResult<()>;
}

/// Default line validator with basic rules
pub struct DefaultLineValidator;

impl LineValidator for DefaultLineValidator {
    fn validate_line(&self, line: &StatementLine) -> ReconciliationResult<()> {
        if line.description.trim().is_empty() {
            return Err(ReconciliationError::Validation(
                "description cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}
