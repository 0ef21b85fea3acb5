//! Statement line listing and ingestion

use std::cmp::Ordering;
use tracing::{info, instrument};

use crate::traits::*;
use crate::types::*;

/// Front for the statement line storage: ordering, filtering and validated
/// bulk ingestion
pub struct StatementLineStore<S: StatementStore> {
    pub(crate) storage: S,
    validator: Box<dyn LineValidator>,
}

impl<S: StatementStore> StatementLineStore<S> {
    /// Create a new statement line store
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            validator: Box::new(DefaultLineValidator),
        }
    }

    /// Create a new statement line store with custom validator
    pub fn with_validator(storage: S, validator: Box<dyn LineValidator>) -> Self {
        Self { storage, validator }
    }

    /// List lines newest first: statement_date descending, then created_at
    /// descending, then most recently inserted first
    pub async fn list(&self, filter: StatusFilter) -> ReconciliationResult<Vec<StatementLine>> {
        let mut lines: Vec<StatementLine> = self
            .storage
            .all_lines()
            .await?
            .into_iter()
            .rev()
            .filter(|line| filter.accepts(line.status_kind()))
            .collect();

        // Stable sort keeps reverse insertion order among equal keys
        lines.sort_by(newest_first);
        Ok(lines)
    }

    /// Get a line by ID, returning an error if not found
    pub async fn get(&self, line_id: LineId) -> ReconciliationResult<StatementLine> {
        self.storage
            .get_line(line_id)
            .await?
            .ok_or(ReconciliationError::LineNotFound(line_id))
    }

    /// Validate and insert a batch of lines
    ///
    /// A single invalid row rejects the whole batch; nothing is written.
    #[instrument(skip(self, inputs), fields(count = inputs.len()))]
    pub async fn bulk_insert(
        &self,
        inputs: &[StatementLineInput],
    ) -> ReconciliationResult<Vec<StatementLine>> {
        let mut lines = Vec::with_capacity(inputs.len());
        for (index, input) in inputs.iter().enumerate() {
            let line = StatementLine::try_from(input)
                .and_then(|line| self.validator.validate_line(&line).map(|_| line))
                .map_err(|e| match e {
                    ReconciliationError::Validation(msg) => {
                        ReconciliationError::Validation(format!("row {}: {}", index + 1, msg))
                    }
                    other => other,
                })?;
            lines.push(line);
        }

        self.storage.insert_lines(&lines).await?;

        info!(inserted = lines.len(), "Statement lines ingested");
        Ok(lines)
    }
}

fn newest_first(a: &StatementLine, b: &StatementLine) -> Ordering {
    b.statement_date
        .cmp(&a.statement_date)
        .then_with(|| b.created_at.cmp(&a.created_at))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::{MemoryStatementStore, StrictLineValidator};
    use chrono::NaiveDate;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[tokio::test]
    async fn test_list_orders_newest_first() {
        let store = StatementLineStore::new(MemoryStatementStore::new());
        store
            .bulk_insert(&[
                StatementLineInput::new(date(5), "first", "10"),
                StatementLineInput::new(date(7), "second", "20"),
                StatementLineInput::new(date(5), "third", "30"),
            ])
            .await
            .unwrap();

        let lines = store.list(StatusFilter::All).await.unwrap();
        let descriptions: Vec<&str> = lines.iter().map(|l| l.description.as_str()).collect();
        assert_eq!(descriptions, vec!["second", "third", "first"]);
    }

    #[tokio::test]
    async fn test_filter_by_status() {
        let storage = MemoryStatementStore::new();
        let store = StatementLineStore::new(storage.clone());
        let inserted = store
            .bulk_insert(&[
                StatementLineInput::new(date(5), "a", "10"),
                StatementLineInput::new(date(6), "b", "20"),
            ])
            .await
            .unwrap();
        storage.claim_split(inserted[0].id, "s1").await.unwrap();

        let matched = store
            .list(StatusFilter::Only(LineStatusKind::Matched))
            .await
            .unwrap();
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].id, inserted[0].id);

        let unmatched = store
            .list(LineStatusKind::Unmatched.into())
            .await
            .unwrap();
        assert_eq!(unmatched.len(), 1);
        assert_eq!(unmatched[0].id, inserted[1].id);
    }

    #[tokio::test]
    async fn test_one_bad_row_rejects_batch() {
        let store = StatementLineStore::new(MemoryStatementStore::new());
        let mut missing_date = StatementLineInput::new(date(6), "Fee", "-25.00");
        missing_date.statement_date = None;

        let err = store
            .bulk_insert(&[
                StatementLineInput::new(date(5), "Deposit", "1000.00"),
                missing_date,
            ])
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.to_string().contains("row 2"));
        assert!(store.list(StatusFilter::All).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_out_of_range_amount_rejects_batch() {
        let store = StatementLineStore::new(MemoryStatementStore::new());
        let err = store
            .bulk_insert(&[
                StatementLineInput::new(date(5), "a", "1e9223372036854775807"),
                StatementLineInput::new(date(5), "b", "10.00"),
            ])
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.to_string().contains("row 1"));
        assert!(store.list(StatusFilter::All).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_custom_validator_applies() {
        let store = StatementLineStore::with_validator(
            MemoryStatementStore::new(),
            Box::new(StrictLineValidator::default()),
        );
        let err = store
            .bulk_insert(&[StatementLineInput::new(date(5), "Deposit", "0")])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_get_unknown_line() {
        let store = StatementLineStore::new(MemoryStatementStore::new());
        let err = store.get(uuid::Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, ReconciliationError::LineNotFound(_)));
    }
}
