//! Core types and data structures for the reconciliation engine

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Identifier of a statement line
pub type LineId = Uuid;

/// Lifecycle status of a statement line, carrying the data each state owns.
///
/// A matched or reconciled line always knows its split, and only a reconciled
/// line carries the audit fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LineStatus {
    /// Not yet tied to any GL split
    Unmatched,
    /// Linked to a split, not yet confirmed
    Matched { matched_split_id: String },
    /// Linked and confirmed as settled
    Reconciled {
        matched_split_id: String,
        reconciled_by: String,
        reconciled_at: NaiveDateTime,
    },
}

impl LineStatus {
    /// The fieldless kind of this status
    pub fn kind(&self) -> LineStatusKind {
        match self {
            LineStatus::Unmatched => LineStatusKind::Unmatched,
            LineStatus::Matched { .. } => LineStatusKind::Matched,
            LineStatus::Reconciled { .. } => LineStatusKind::Reconciled,
        }
    }
}

/// Status without its payload, used for filtering and counting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LineStatusKind {
    Unmatched,
    Matched,
    Reconciled,
}

impl LineStatusKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineStatusKind::Unmatched => "UNMATCHED",
            LineStatusKind::Matched => "MATCHED",
            LineStatusKind::Reconciled => "RECONCILED",
        }
    }
}

impl fmt::Display for LineStatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status filter for listing statement lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StatusFilter {
    #[default]
    All,
    Only(LineStatusKind),
}

impl StatusFilter {
    /// Whether a line with the given status passes the filter
    pub fn accepts(&self, kind: LineStatusKind) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => *wanted == kind,
        }
    }
}

impl From<LineStatusKind> for StatusFilter {
    fn from(kind: LineStatusKind) -> Self {
        StatusFilter::Only(kind)
    }
}

impl FromStr for StatusFilter {
    type Err = ReconciliationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ALL" => Ok(StatusFilter::All),
            "UNMATCHED" => Ok(StatusFilter::Only(LineStatusKind::Unmatched)),
            "MATCHED" => Ok(StatusFilter::Only(LineStatusKind::Matched)),
            "RECONCILED" => Ok(StatusFilter::Only(LineStatusKind::Reconciled)),
            other => Err(ReconciliationError::Validation(format!(
                "Unknown status filter '{}'",
                other
            ))),
        }
    }
}

/// A transaction as reported by the bank
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementLine {
    /// Unique identifier for the line
    pub id: LineId,
    /// Date the bank reported the transaction
    pub statement_date: NaiveDate,
    /// Bank-provided narrative
    pub description: String,
    /// Signed amount, positive for deposits
    pub amount: BigDecimal,
    /// Optional bank reference (cheque number, transfer id, etc.)
    pub reference: Option<String>,
    /// Lifecycle status and the data attached to it
    #[serde(flatten)]
    pub status: LineStatus,
    /// When the line was ingested
    pub created_at: NaiveDateTime,
}

impl StatementLine {
    /// Create a new unmatched statement line
    pub fn new(
        statement_date: NaiveDate,
        description: String,
        amount: BigDecimal,
        reference: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            statement_date,
            description,
            amount,
            reference,
            status: LineStatus::Unmatched,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }

    pub fn status_kind(&self) -> LineStatusKind {
        self.status.kind()
    }

    pub fn is_unmatched(&self) -> bool {
        matches!(self.status, LineStatus::Unmatched)
    }

    /// The split this line is linked to, if any
    pub fn matched_split_id(&self) -> Option<&str> {
        match &self.status {
            LineStatus::Unmatched => None,
            LineStatus::Matched { matched_split_id }
            | LineStatus::Reconciled {
                matched_split_id, ..
            } => Some(matched_split_id),
        }
    }

    pub fn reconciled_by(&self) -> Option<&str> {
        match &self.status {
            LineStatus::Reconciled { reconciled_by, .. } => Some(reconciled_by),
            _ => None,
        }
    }

    pub fn reconciled_at(&self) -> Option<NaiveDateTime> {
        match &self.status {
            LineStatus::Reconciled { reconciled_at, .. } => Some(*reconciled_at),
            _ => None,
        }
    }
}

/// Raw statement line as submitted for ingestion.
///
/// Every field is optional so that incomplete rows reach validation instead of
/// failing deserialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatementLineInput {
    pub statement_date: Option<NaiveDate>,
    pub description: Option<String>,
    /// Decimal amount as text
    pub amount: Option<String>,
    pub reference: Option<String>,
}

impl StatementLineInput {
    /// Create a complete input row
    pub fn new(statement_date: NaiveDate, description: &str, amount: &str) -> Self {
        Self {
            statement_date: Some(statement_date),
            description: Some(description.to_string()),
            amount: Some(amount.to_string()),
            reference: None,
        }
    }

    pub fn with_reference(mut self, reference: &str) -> Self {
        self.reference = Some(reference.to_string());
        self
    }
}

impl TryFrom<&StatementLineInput> for StatementLine {
    type Error = ReconciliationError;

    fn try_from(input: &StatementLineInput) -> Result<Self, Self::Error> {
        let statement_date = input.statement_date.ok_or_else(|| {
            ReconciliationError::Validation("statement_date is required".to_string())
        })?;

        let description = input
            .description
            .as_deref()
            .ok_or_else(|| ReconciliationError::Validation("description is required".to_string()))?;

        let raw_amount = input
            .amount
            .as_deref()
            .ok_or_else(|| ReconciliationError::Validation("amount is required".to_string()))?;
        let amount = crate::utils::parse_amount(raw_amount)?;

        let reference = input
            .reference
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string);

        Ok(StatementLine::new(
            statement_date,
            description.trim().to_string(),
            amount,
            reference,
        ))
    }
}

/// One leg of a posted journal entry affecting the cash account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlSplit {
    /// Ledger identifier of the split
    pub split_id: String,
    /// Journal entry owning this split
    pub journal_entry_id: String,
    /// Optional journal reference number
    pub journal_ref: Option<String>,
    /// Posting date of the journal entry
    pub journal_date: NaiveDate,
    pub description: String,
    pub debit_amount: BigDecimal,
    pub credit_amount: BigDecimal,
}

impl GlSplit {
    /// Create a debit split (money into the cash account)
    pub fn debit(
        split_id: &str,
        journal_entry_id: &str,
        journal_date: NaiveDate,
        description: &str,
        amount: BigDecimal,
    ) -> Self {
        Self {
            split_id: split_id.to_string(),
            journal_entry_id: journal_entry_id.to_string(),
            journal_ref: None,
            journal_date,
            description: description.to_string(),
            debit_amount: amount,
            credit_amount: BigDecimal::from(0),
        }
    }

    /// Create a credit split (money out of the cash account)
    pub fn credit(
        split_id: &str,
        journal_entry_id: &str,
        journal_date: NaiveDate,
        description: &str,
        amount: BigDecimal,
    ) -> Self {
        Self {
            split_id: split_id.to_string(),
            journal_entry_id: journal_entry_id.to_string(),
            journal_ref: None,
            journal_date,
            description: description.to_string(),
            debit_amount: BigDecimal::from(0),
            credit_amount: amount,
        }
    }

    pub fn with_journal_ref(mut self, journal_ref: &str) -> Self {
        self.journal_ref = Some(journal_ref.to_string());
        self
    }

    /// Debit minus credit, in the bank's sign convention
    pub fn net_amount(&self) -> BigDecimal {
        &self.debit_amount - &self.credit_amount
    }
}

/// Balances and counts surfaced to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationSummary {
    /// Running balance of the cash GL account, read from the ledger
    pub gl_balance: BigDecimal,
    /// Sum of all ingested statement line amounts
    pub statement_balance: BigDecimal,
    /// Sum of reconciled statement line amounts
    pub reconciled_balance: BigDecimal,
    pub unmatched_count: usize,
    pub matched_count: usize,
    pub reconciled_count: usize,
    pub total_count: usize,
    /// statement_balance - gl_balance
    pub difference: BigDecimal,
}

/// Auditable record of a committed reconciliation batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationBatch {
    pub batch_id: Uuid,
    pub actor: String,
    pub reconciled_at: NaiveDateTime,
    pub line_ids: Vec<LineId>,
    /// Sum of the amounts of the reconciled lines
    pub total_amount: BigDecimal,
}

/// Result of a reconcile call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconcileOutcome {
    pub reconciled: usize,
    pub batch: ReconciliationBatch,
}

/// Result of an auto-match run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoMatchOutcome {
    pub matched: usize,
}

/// A statement line to split pairing chosen by the matcher
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposedMatch {
    pub statement_line_id: LineId,
    pub split_id: String,
    /// Absolute days between statement date and journal date
    pub date_gap_days: i64,
}

/// Stable error classes exposed to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    Validation,
    NotFound,
    AlreadyMatched,
    InvalidState,
    /// Backend or ledger failure
    Unavailable,
}

impl ErrorKind {
    /// Whether the caller should refresh its view of the lines and retry
    pub fn requires_refresh(&self) -> bool {
        matches!(self, ErrorKind::AlreadyMatched | ErrorKind::InvalidState)
    }
}

/// Errors that can occur in the reconciliation engine
#[derive(Debug, thiserror::Error)]
pub enum ReconciliationError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Statement line not found: {0}")]
    LineNotFound(LineId),
    #[error("GL split not found: {0}")]
    SplitNotFound(String),
    #[error("Already matched: {0}")]
    AlreadyMatched(String),
    #[error("Invalid state: {0}")]
    InvalidState(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Ledger error: {0}")]
    Ledger(String),
}

impl ReconciliationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ReconciliationError::Validation(_) => ErrorKind::Validation,
            ReconciliationError::LineNotFound(_) | ReconciliationError::SplitNotFound(_) => {
                ErrorKind::NotFound
            }
            ReconciliationError::AlreadyMatched(_) => ErrorKind::AlreadyMatched,
            ReconciliationError::InvalidState(_) => ErrorKind::InvalidState,
            ReconciliationError::Storage(_) | ReconciliationError::Ledger(_) => {
                ErrorKind::Unavailable
            }
        }
    }
}

/// Result type for reconciliation operations
pub type ReconciliationResult<T> = Result<T, ReconciliationError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_status_accessors_follow_state() {
        let mut line = StatementLine::new(date(2024, 1, 5), "Deposit".into(), BigDecimal::from(100), None);
        assert_eq!(line.matched_split_id(), None);
        assert_eq!(line.reconciled_by(), None);

        line.status = LineStatus::Matched {
            matched_split_id: "s1".into(),
        };
        assert_eq!(line.matched_split_id(), Some("s1"));
        assert_eq!(line.reconciled_at(), None);

        let at = date(2024, 1, 8).and_hms_opt(9, 0, 0).unwrap();
        line.status = LineStatus::Reconciled {
            matched_split_id: "s1".into(),
            reconciled_by: "alice".into(),
            reconciled_at: at,
        };
        assert_eq!(line.matched_split_id(), Some("s1"));
        assert_eq!(line.reconciled_by(), Some("alice"));
        assert_eq!(line.reconciled_at(), Some(at));
        assert_eq!(line.status_kind(), LineStatusKind::Reconciled);
    }

    #[test]
    fn test_status_serializes_flat() {
        let mut line = StatementLine::new(date(2024, 1, 5), "Deposit".into(), BigDecimal::from(100), None);
        line.status = LineStatus::Matched {
            matched_split_id: "s1".into(),
        };
        let json = serde_json::to_value(&line).unwrap();
        assert_eq!(json["status"], "MATCHED");
        assert_eq!(json["matched_split_id"], "s1");

        let back: StatementLine = serde_json::from_value(json).unwrap();
        assert_eq!(back, line);
    }

    #[test]
    fn test_status_filter_parsing() {
        assert_eq!("all".parse::<StatusFilter>().unwrap(), StatusFilter::All);
        assert_eq!(
            "Matched".parse::<StatusFilter>().unwrap(),
            StatusFilter::Only(LineStatusKind::Matched)
        );
        let err = "pending".parse::<StatusFilter>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_input_conversion_requires_fields() {
        let mut input = StatementLineInput::new(date(2024, 1, 5), "Deposit", "1000.00");
        let line = StatementLine::try_from(&input).unwrap();
        assert_eq!(line.amount, "1000.00".parse::<BigDecimal>().unwrap());
        assert!(line.is_unmatched());

        input.amount = None;
        assert!(matches!(
            StatementLine::try_from(&input),
            Err(ReconciliationError::Validation(_))
        ));

        input.amount = Some("12abc".into());
        assert!(matches!(
            StatementLine::try_from(&input),
            Err(ReconciliationError::Validation(_))
        ));
    }

    #[test]
    fn test_net_amount_sign() {
        let d = GlSplit::debit("s1", "je1", date(2024, 1, 5), "Deposit", BigDecimal::from(1000));
        let c = GlSplit::credit("s2", "je2", date(2024, 1, 5), "Fee", BigDecimal::from(25));
        assert_eq!(d.net_amount(), BigDecimal::from(1000));
        assert_eq!(c.net_amount(), BigDecimal::from(-25));
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            ReconciliationError::AlreadyMatched("x".into()).kind(),
            ErrorKind::AlreadyMatched
        );
        assert!(ErrorKind::InvalidState.requires_refresh());
        assert!(!ErrorKind::NotFound.requires_refresh());
        assert_eq!(
            ReconciliationError::SplitNotFound("s".into()).kind(),
            ErrorKind::NotFound
        );
    }
}
