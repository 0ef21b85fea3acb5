//! In-memory statement store for testing

use async_trait::async_trait;
use chrono::NaiveDateTime;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::traits::*;
use crate::types::*;

#[derive(Debug, Default)]
struct Inner {
    /// Lines in insertion order
    lines: Vec<StatementLine>,
    index: HashMap<LineId, usize>,
    /// split_id -> claiming line
    claims: HashMap<String, LineId>,
}

impl Inner {
    fn line_mut(&mut self, line_id: LineId) -> ReconciliationResult<&mut StatementLine> {
        let position = *self
            .index
            .get(&line_id)
            .ok_or(ReconciliationError::LineNotFound(line_id))?;
        Ok(&mut self.lines[position])
    }
}

/// In-memory statement store for testing and development
///
/// All state sits behind one lock, so every conditional write is checked and
/// applied inside a single critical section.
#[derive(Debug, Clone, Default)]
pub struct MemoryStatementStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryStatementStore {
    /// Create a new memory store instance
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> ReconciliationResult<RwLockReadGuard<'_, Inner>> {
        self.inner
            .read()
            .map_err(|_| ReconciliationError::Storage("statement store lock poisoned".to_string()))
    }

    fn write(&self) -> ReconciliationResult<RwLockWriteGuard<'_, Inner>> {
        self.inner
            .write()
            .map_err(|_| ReconciliationError::Storage("statement store lock poisoned".to_string()))
    }
}

#[async_trait]
impl StatementStore for MemoryStatementStore {
    async fn insert_lines(&self, lines: &[StatementLine]) -> ReconciliationResult<()> {
        let mut inner = self.write()?;

        let mut incoming = HashSet::new();
        for line in lines {
            if inner.index.contains_key(&line.id) || !incoming.insert(line.id) {
                return Err(ReconciliationError::Storage(format!(
                    "duplicate statement line id {}",
                    line.id
                )));
            }
        }

        for line in lines {
            let position = inner.lines.len();
            inner.index.insert(line.id, position);
            if let Some(split_id) = line.matched_split_id() {
                inner.claims.insert(split_id.to_string(), line.id);
            }
            inner.lines.push(line.clone());
        }
        Ok(())
    }

    async fn get_line(&self, line_id: LineId) -> ReconciliationResult<Option<StatementLine>> {
        let inner = self.read()?;
        Ok(inner
            .index
            .get(&line_id)
            .map(|&position| inner.lines[position].clone()))
    }

    async fn all_lines(&self) -> ReconciliationResult<Vec<StatementLine>> {
        Ok(self.read()?.lines.clone())
    }

    async fn claimed_splits(&self) -> ReconciliationResult<HashMap<String, LineId>> {
        Ok(self.read()?.claims.clone())
    }

    async fn claim_split(
        &self,
        line_id: LineId,
        split_id: &str,
    ) -> ReconciliationResult<StatementLine> {
        let mut inner = self.write()?;

        if let Some(holder) = inner.claims.get(split_id) {
            return Err(ReconciliationError::AlreadyMatched(format!(
                "split {} is already claimed by line {}",
                split_id, holder
            )));
        }

        let line = inner.line_mut(line_id)?;
        if !line.is_unmatched() {
            return Err(ReconciliationError::AlreadyMatched(format!(
                "line {} is {}, expected UNMATCHED",
                line_id,
                line.status_kind()
            )));
        }

        line.status = LineStatus::Matched {
            matched_split_id: split_id.to_string(),
        };
        let updated = line.clone();
        inner.claims.insert(split_id.to_string(), line_id);
        Ok(updated)
    }

    async fn release_split(&self, line_id: LineId) -> ReconciliationResult<StatementLine> {
        let mut inner = self.write()?;

        let line = inner.line_mut(line_id)?;
        let split_id = match &line.status {
            LineStatus::Matched { matched_split_id } => matched_split_id.clone(),
            other => {
                return Err(ReconciliationError::InvalidState(format!(
                    "line {} is {}, only MATCHED lines can be unmatched",
                    line_id,
                    other.kind()
                )))
            }
        };

        line.status = LineStatus::Unmatched;
        let updated = line.clone();
        inner.claims.remove(&split_id);
        Ok(updated)
    }

    async fn mark_reconciled(
        &self,
        line_ids: &[LineId],
        actor: &str,
        reconciled_at: NaiveDateTime,
    ) -> ReconciliationResult<Vec<StatementLine>> {
        let mut inner = self.write()?;

        let mut rejected = Vec::new();
        for line_id in line_ids {
            match inner.index.get(line_id) {
                None => rejected.push(format!("{} (not found)", line_id)),
                Some(&position) => {
                    let kind = inner.lines[position].status_kind();
                    if kind != LineStatusKind::Matched {
                        rejected.push(format!("{} ({})", line_id, kind));
                    }
                }
            }
        }
        if !rejected.is_empty() {
            return Err(ReconciliationError::InvalidState(format!(
                "every line in a reconcile batch must be MATCHED: {}",
                rejected.join(", ")
            )));
        }

        let mut updated = Vec::with_capacity(line_ids.len());
        for &line_id in line_ids {
            let line = inner.line_mut(line_id)?;
            if let Some(matched_split_id) = line.matched_split_id().map(str::to_string) {
                line.status = LineStatus::Reconciled {
                    matched_split_id,
                    reconciled_by: actor.to_string(),
                    reconciled_at,
                };
            }
            updated.push(line.clone());
        }
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;
    use chrono::NaiveDate;

    fn line(amount: i64) -> StatementLine {
        StatementLine::new(
            NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            "Deposit".to_string(),
            BigDecimal::from(amount),
            None,
        )
    }

    #[tokio::test]
    async fn test_claim_is_exclusive() {
        let store = MemoryStatementStore::new();
        let (a, b) = (line(100), line(100));
        store.insert_lines(&[a.clone(), b.clone()]).await.unwrap();

        store.claim_split(a.id, "s1").await.unwrap();
        let err = store.claim_split(b.id, "s1").await.unwrap_err();
        assert!(matches!(err, ReconciliationError::AlreadyMatched(_)));

        let claims = store.claimed_splits().await.unwrap();
        assert_eq!(claims.get("s1"), Some(&a.id));
    }

    #[tokio::test]
    async fn test_release_frees_split() {
        let store = MemoryStatementStore::new();
        let (a, b) = (line(100), line(100));
        store.insert_lines(&[a.clone(), b.clone()]).await.unwrap();

        store.claim_split(a.id, "s1").await.unwrap();
        let released = store.release_split(a.id).await.unwrap();
        assert!(released.is_unmatched());
        assert!(store.claimed_splits().await.unwrap().is_empty());

        store.claim_split(b.id, "s1").await.unwrap();
    }

    #[tokio::test]
    async fn test_mark_reconciled_is_all_or_nothing() {
        let store = MemoryStatementStore::new();
        let (a, b) = (line(100), line(200));
        store.insert_lines(&[a.clone(), b.clone()]).await.unwrap();
        store.claim_split(a.id, "s1").await.unwrap();

        let at = chrono::Utc::now().naive_utc();
        let err = store
            .mark_reconciled(&[a.id, b.id], "alice", at)
            .await
            .unwrap_err();
        assert!(matches!(err, ReconciliationError::InvalidState(_)));

        let a_now = store.get_line(a.id).await.unwrap().unwrap();
        assert_eq!(a_now.status_kind(), LineStatusKind::Matched);
    }

    #[tokio::test]
    async fn test_duplicate_insert_rejected_without_partial_write() {
        let store = MemoryStatementStore::new();
        let a = line(100);
        store.insert_lines(&[a.clone()]).await.unwrap();

        let err = store.insert_lines(&[line(5), a.clone()]).await.unwrap_err();
        assert!(matches!(err, ReconciliationError::Storage(_)));
        assert_eq!(store.all_lines().await.unwrap().len(), 1);
    }
}
