//! Main reconciliation engine that coordinates the statement store, the split
//! pool, matching and reconciliation for one cash account

use std::collections::HashSet;
use tracing::{debug, info, instrument};

use crate::config::EngineConfig;
use crate::reconciliation::{
    MatchCoordinator, Matcher, ReconciliationCommitter, SplitPool, StatementLineStore,
    SummaryAggregator,
};
use crate::traits::*;
use crate::types::*;

/// Reconciliation engine for one cash account
pub struct ReconciliationEngine<S: StatementStore, L: LedgerGateway> {
    lines: StatementLineStore<S>,
    pool: SplitPool<L, S>,
    matcher: Matcher,
    coordinator: MatchCoordinator<S, L>,
    committer: ReconciliationCommitter<S>,
    aggregator: SummaryAggregator<S, L>,
    config: EngineConfig,
}

impl<S, L> ReconciliationEngine<S, L>
where
    S: StatementStore + Clone,
    L: LedgerGateway + Clone,
{
    /// Create a new engine with the given storage backend and ledger
    pub fn new(storage: S, ledger: L, config: EngineConfig) -> ReconciliationResult<Self> {
        Self::with_validator(storage, ledger, config, Box::new(DefaultLineValidator))
    }

    /// Create a new engine with a custom ingestion validator
    pub fn with_validator(
        storage: S,
        ledger: L,
        config: EngineConfig,
        validator: Box<dyn LineValidator>,
    ) -> ReconciliationResult<Self> {
        config.validate()?;

        let pool = SplitPool::new(ledger, storage.clone(), config.cash_account_id.clone());
        Ok(Self {
            lines: StatementLineStore::with_validator(storage.clone(), validator),
            matcher: Matcher::new(config.matching.clone()),
            coordinator: MatchCoordinator::new(storage.clone(), pool.clone()),
            committer: ReconciliationCommitter::new(storage.clone()),
            aggregator: SummaryAggregator::new(storage, pool.clone()),
            pool,
            config,
        })
    }
}

impl<S: StatementStore, L: LedgerGateway> ReconciliationEngine<S, L> {
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // Statement line operations
    /// List statement lines, newest first
    pub async fn list_lines(&self, filter: StatusFilter) -> ReconciliationResult<Vec<StatementLine>> {
        self.lines.list(filter).await
    }

    /// Get a statement line by ID
    pub async fn get_line(&self, line_id: LineId) -> ReconciliationResult<StatementLine> {
        self.lines.get(line_id).await
    }

    /// Ingest a batch of statement lines, all or nothing
    pub async fn bulk_insert(
        &self,
        inputs: &[StatementLineInput],
    ) -> ReconciliationResult<Vec<StatementLine>> {
        self.lines.bulk_insert(inputs).await
    }

    // Split pool operations
    /// GL splits with no reconciled line attached, oldest first
    pub async fn list_unreconciled_splits(&self) -> ReconciliationResult<Vec<GlSplit>> {
        self.pool.list_unreconciled().await
    }

    /// Get an unreconciled GL split by ID
    pub async fn get_split(&self, split_id: &str) -> ReconciliationResult<GlSplit> {
        self.pool.get(split_id).await
    }

    // Matching operations
    /// Manually link a line to a split
    pub async fn match_line(
        &self,
        line_id: LineId,
        split_id: &str,
    ) -> ReconciliationResult<StatementLine> {
        self.coordinator.match_line(line_id, split_id).await
    }

    /// Return a matched line to unmatched
    pub async fn unmatch(&self, line_id: LineId) -> ReconciliationResult<StatementLine> {
        self.coordinator.unmatch(line_id).await
    }

    /// Ranked unclaimed splits a line could be matched to
    ///
    /// Empty for a line that is not unmatched.
    pub async fn suggest_matches(&self, line_id: LineId) -> ReconciliationResult<Vec<GlSplit>> {
        let line = self.lines.get(line_id).await?;
        if !line.is_unmatched() {
            return Ok(Vec::new());
        }

        let splits = self.pool.list_unclaimed().await?;
        Ok(self
            .matcher
            .rank_candidates(&line, &splits)
            .into_iter()
            .map(|candidate| candidate.split.clone())
            .collect())
    }

    /// Pairings an auto-match run would make right now, without applying them
    pub async fn preview_auto_match(&self) -> ReconciliationResult<Vec<ProposedMatch>> {
        let lines = self.lines.storage.all_lines().await?;
        let splits = self.pool.list_unclaimed().await?;
        Ok(self.matcher.propose(&lines, &splits))
    }

    /// Match every unmatched line that has an eligible split
    ///
    /// Pairings are claimed one at a time as they are chosen. If another
    /// writer claims a chosen split first, the line falls through to its next
    /// candidate; if the line itself was matched meanwhile, it is skipped.
    #[instrument(skip(self), fields(cash_account_id = %self.config.cash_account_id))]
    pub async fn auto_match(&self) -> ReconciliationResult<AutoMatchOutcome> {
        let lines = self.lines.storage.all_lines().await?;
        let splits = self.pool.list_unclaimed().await?;

        let mut taken: HashSet<String> = HashSet::new();
        let mut matched = 0;

        for line in self.matcher.pending_lines(&lines) {
            while let Some(candidate) = self.matcher.next_candidate(line, &splits, &taken) {
                let split_id = &candidate.split.split_id;
                match self.coordinator.claim(line.id, split_id).await {
                    Ok(_) => {
                        taken.insert(split_id.clone());
                        matched += 1;
                        break;
                    }
                    Err(ReconciliationError::AlreadyMatched(reason)) => {
                        debug!(line_id = %line.id, split_id = %split_id, %reason, "Lost claim race");
                        let still_unmatched = self
                            .lines
                            .storage
                            .get_line(line.id)
                            .await?
                            .is_some_and(|current| current.is_unmatched());
                        if !still_unmatched {
                            break;
                        }
                        taken.insert(split_id.clone());
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        info!(matched, "Auto-match finished");
        Ok(AutoMatchOutcome { matched })
    }

    // Reconciliation operations
    /// Reconcile a batch of matched lines, all or nothing
    pub async fn reconcile(
        &self,
        line_ids: &[LineId],
        actor: &str,
    ) -> ReconciliationResult<ReconcileOutcome> {
        self.committer.reconcile(line_ids, actor).await
    }

    /// Current balances and per-status counts
    pub async fn summary(&self) -> ReconciliationResult<ReconciliationSummary> {
        self.aggregator.summary().await
    }
}
