//! View over the ledger's cash-account splits that are still open

use std::collections::HashSet;

use crate::traits::*;
use crate::types::*;

/// Read-only pool of GL splits for one cash account
///
/// The pool never writes to the ledger. Which splits are spoken for is read
/// from the claims recorded on statement lines.
#[derive(Clone)]
pub struct SplitPool<L: LedgerGateway, S: StatementStore> {
    ledger: L,
    storage: S,
    cash_account_id: String,
}

impl<L: LedgerGateway, S: StatementStore> SplitPool<L, S> {
    pub fn new(ledger: L, storage: S, cash_account_id: String) -> Self {
        Self {
            ledger,
            storage,
            cash_account_id,
        }
    }

    pub fn cash_account_id(&self) -> &str {
        &self.cash_account_id
    }

    pub(crate) fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Splits with no reconciled statement line attached, oldest first
    pub async fn list_unreconciled(&self) -> ReconciliationResult<Vec<GlSplit>> {
        let reconciled: HashSet<String> = self
            .storage
            .all_lines()
            .await?
            .into_iter()
            .filter_map(|line| match line.status {
                LineStatus::Reconciled {
                    matched_split_id, ..
                } => Some(matched_split_id),
                _ => None,
            })
            .collect();

        let mut splits: Vec<GlSplit> = self
            .ledger
            .list_unreconciled_splits(&self.cash_account_id)
            .await?
            .into_iter()
            .filter(|split| !reconciled.contains(&split.split_id))
            .collect();
        sort_oldest_first(&mut splits);
        Ok(splits)
    }

    /// Splits not claimed by any statement line, oldest first
    pub async fn list_unclaimed(&self) -> ReconciliationResult<Vec<GlSplit>> {
        let claims = self.storage.claimed_splits().await?;

        let mut splits: Vec<GlSplit> = self
            .ledger
            .list_unreconciled_splits(&self.cash_account_id)
            .await?
            .into_iter()
            .filter(|split| !claims.contains_key(&split.split_id))
            .collect();
        sort_oldest_first(&mut splits);
        Ok(splits)
    }

    /// Get an unreconciled split by ID
    pub async fn get(&self, split_id: &str) -> ReconciliationResult<GlSplit> {
        self.list_unreconciled()
            .await?
            .into_iter()
            .find(|split| split.split_id == split_id)
            .ok_or_else(|| ReconciliationError::SplitNotFound(split_id.to_string()))
    }
}

fn sort_oldest_first(splits: &mut [GlSplit]) {
    splits.sort_by(|a, b| {
        a.journal_date
            .cmp(&b.journal_date)
            .then_with(|| a.split_id.cmp(&b.split_id))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::{MemoryLedger, MemoryStatementStore};
    use bigdecimal::BigDecimal;
    use chrono::NaiveDate;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn setup() -> (MemoryLedger, MemoryStatementStore, SplitPool<MemoryLedger, MemoryStatementStore>) {
        let ledger = MemoryLedger::new();
        let storage = MemoryStatementStore::new();
        ledger.open_account("cash", BigDecimal::from(0));
        ledger.post_split("cash", GlSplit::debit("s-b", "je1", date(9), "b", BigDecimal::from(10)));
        ledger.post_split("cash", GlSplit::debit("s-a", "je2", date(9), "a", BigDecimal::from(10)));
        ledger.post_split("cash", GlSplit::debit("s-c", "je3", date(2), "c", BigDecimal::from(10)));
        let pool = SplitPool::new(ledger.clone(), storage.clone(), "cash".to_string());
        (ledger, storage, pool)
    }

    #[tokio::test]
    async fn test_sorted_by_journal_date_then_id() {
        let (_, _, pool) = setup();
        let ids: Vec<String> = pool
            .list_unreconciled()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.split_id)
            .collect();
        assert_eq!(ids, vec!["s-c", "s-a", "s-b"]);
    }

    #[tokio::test]
    async fn test_reconciled_splits_leave_the_pool() {
        let (_, storage, pool) = setup();
        let line = StatementLine::new(date(9), "a".into(), BigDecimal::from(10), None);
        let other = StatementLine::new(date(9), "b".into(), BigDecimal::from(10), None);
        storage.insert_lines(&[line.clone(), other.clone()]).await.unwrap();
        storage.claim_split(line.id, "s-a").await.unwrap();
        storage.claim_split(other.id, "s-b").await.unwrap();

        // Matched but not reconciled: still in the pool, not unclaimed
        assert_eq!(pool.list_unreconciled().await.unwrap().len(), 3);
        assert_eq!(pool.list_unclaimed().await.unwrap().len(), 1);

        storage
            .mark_reconciled(&[line.id], "alice", chrono::Utc::now().naive_utc())
            .await
            .unwrap();
        assert_eq!(pool.list_unreconciled().await.unwrap().len(), 2);
        assert!(matches!(
            pool.get("s-a").await,
            Err(ReconciliationError::SplitNotFound(_))
        ));
        assert_eq!(pool.get("s-b").await.unwrap().split_id, "s-b");
    }
}
