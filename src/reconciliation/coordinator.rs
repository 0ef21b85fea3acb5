//! Applies matches and unmatches to statement lines

use tracing::{info, instrument};

use crate::reconciliation::SplitPool;
use crate::traits::*;
use crate::types::*;

/// Match coordinator for linking statement lines to GL splits
///
/// Every write goes through the store's conditional `claim_split` /
/// `release_split`, so a split can be held by at most one line even when
/// manual matches and auto-match runs interleave.
pub struct MatchCoordinator<S: StatementStore, L: LedgerGateway> {
    storage: S,
    pool: SplitPool<L, S>,
}

impl<S: StatementStore, L: LedgerGateway> MatchCoordinator<S, L> {
    pub fn new(storage: S, pool: SplitPool<L, S>) -> Self {
        Self { storage, pool }
    }

    /// Manually link a line to a split
    ///
    /// A split held by any line, reconciled or not, fails with
    /// `AlreadyMatched`. `SplitNotFound` means the ledger has no such split.
    #[instrument(skip(self))]
    pub async fn match_line(
        &self,
        line_id: LineId,
        split_id: &str,
    ) -> ReconciliationResult<StatementLine> {
        if self.storage.get_line(line_id).await?.is_none() {
            return Err(ReconciliationError::LineNotFound(line_id));
        }
        if !self.storage.claimed_splits().await?.contains_key(split_id) {
            self.pool.get(split_id).await?;
        }

        self.claim(line_id, split_id).await
    }

    /// Link a line to a split already known to be in the pool
    pub(crate) async fn claim(
        &self,
        line_id: LineId,
        split_id: &str,
    ) -> ReconciliationResult<StatementLine> {
        let line = self.storage.claim_split(line_id, split_id).await?;
        info!(line_id = %line_id, split_id, "Statement line matched");
        Ok(line)
    }

    /// Return a matched line to unmatched, freeing its split
    #[instrument(skip(self))]
    pub async fn unmatch(&self, line_id: LineId) -> ReconciliationResult<StatementLine> {
        let line = self.storage.release_split(line_id).await?;
        info!(line_id = %line_id, "Statement line unmatched");
        Ok(line)
    }
}
