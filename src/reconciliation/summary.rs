//! Balance and count aggregation

use bigdecimal::BigDecimal;

use crate::reconciliation::SplitPool;
use crate::traits::*;
use crate::types::*;

/// Computes the reconciliation summary from current state on every call
pub struct SummaryAggregator<S: StatementStore, L: LedgerGateway> {
    storage: S,
    pool: SplitPool<L, S>,
}

impl<S: StatementStore, L: LedgerGateway> SummaryAggregator<S, L> {
    pub fn new(storage: S, pool: SplitPool<L, S>) -> Self {
        Self { storage, pool }
    }

    pub async fn summary(&self) -> ReconciliationResult<ReconciliationSummary> {
        let lines = self.storage.all_lines().await?;
        let gl_balance = self
            .pool
            .ledger()
            .cash_account_balance(self.pool.cash_account_id())
            .await?;

        Ok(summarize(&lines, gl_balance))
    }
}

/// Fold a snapshot of lines into a summary
pub fn summarize(lines: &[StatementLine], gl_balance: BigDecimal) -> ReconciliationSummary {
    let mut statement_balance = BigDecimal::from(0);
    let mut reconciled_balance = BigDecimal::from(0);
    let (mut unmatched_count, mut matched_count, mut reconciled_count) = (0, 0, 0);

    for line in lines {
        statement_balance += &line.amount;
        match line.status_kind() {
            LineStatusKind::Unmatched => unmatched_count += 1,
            LineStatusKind::Matched => matched_count += 1,
            LineStatusKind::Reconciled => {
                reconciled_count += 1;
                reconciled_balance += &line.amount;
            }
        }
    }

    let difference = &statement_balance - &gl_balance;

    ReconciliationSummary {
        gl_balance,
        statement_balance,
        reconciled_balance,
        unmatched_count,
        matched_count,
        reconciled_count,
        total_count: lines.len(),
        difference,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::str::FromStr;

    #[test]
    fn test_summarize_counts_and_balances() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        let mut lines = vec![
            StatementLine::new(date, "a".into(), BigDecimal::from_str("1000.00").unwrap(), None),
            StatementLine::new(date, "b".into(), BigDecimal::from_str("-25.00").unwrap(), None),
            StatementLine::new(date, "c".into(), BigDecimal::from_str("40.50").unwrap(), None),
        ];
        lines[0].status = LineStatus::Reconciled {
            matched_split_id: "s1".into(),
            reconciled_by: "alice".into(),
            reconciled_at: date.and_hms_opt(12, 0, 0).unwrap(),
        };
        lines[1].status = LineStatus::Matched {
            matched_split_id: "s2".into(),
        };

        let summary = summarize(&lines, BigDecimal::from(1000));
        assert_eq!(summary.statement_balance, BigDecimal::from_str("1015.50").unwrap());
        assert_eq!(summary.reconciled_balance, BigDecimal::from(1000));
        assert_eq!(summary.difference, BigDecimal::from_str("15.50").unwrap());
        assert_eq!(
            (summary.unmatched_count, summary.matched_count, summary.reconciled_count),
            (1, 1, 1)
        );
        assert_eq!(summary.total_count, 3);
    }

    #[test]
    fn test_empty_summary() {
        let summary = summarize(&[], BigDecimal::from(0));
        assert_eq!(summary.total_count, 0);
        assert_eq!(summary.statement_balance, BigDecimal::from(0));
    }
}
