//! Promotes matched lines to reconciled in atomic batches

use bigdecimal::BigDecimal;
use std::collections::HashSet;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::traits::*;
use crate::types::*;

/// Commits batches of matched lines as reconciled
pub struct ReconciliationCommitter<S: StatementStore> {
    storage: S,
}

impl<S: StatementStore> ReconciliationCommitter<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Reconcile every line in `line_ids` on behalf of `actor`.
    ///
    /// Every ID must name a MATCHED line. If any does not, nothing changes and
    /// the call fails with `InvalidState`. Repeated IDs count once.
    #[instrument(skip(self, line_ids), fields(batch_size = line_ids.len()))]
    pub async fn reconcile(
        &self,
        line_ids: &[LineId],
        actor: &str,
    ) -> ReconciliationResult<ReconcileOutcome> {
        if actor.trim().is_empty() {
            return Err(ReconciliationError::Validation(
                "actor cannot be empty".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        let unique: Vec<LineId> = line_ids
            .iter()
            .copied()
            .filter(|id| seen.insert(*id))
            .collect();

        if unique.is_empty() {
            return Err(ReconciliationError::Validation(
                "reconcile batch cannot be empty".to_string(),
            ));
        }

        let reconciled_at = chrono::Utc::now().naive_utc();
        let lines = match self
            .storage
            .mark_reconciled(&unique, actor, reconciled_at)
            .await
        {
            Ok(lines) => lines,
            Err(e) => {
                warn!(error = %e, "Reconcile batch rejected");
                return Err(e);
            }
        };

        let total_amount: BigDecimal = lines.iter().map(|line| &line.amount).sum();
        let batch = ReconciliationBatch {
            batch_id: Uuid::new_v4(),
            actor: actor.to_string(),
            reconciled_at,
            line_ids: unique,
            total_amount,
        };

        info!(
            batch_id = %batch.batch_id,
            actor,
            reconciled = lines.len(),
            total = %batch.total_amount,
            "Reconcile batch committed"
        );

        Ok(ReconcileOutcome {
            reconciled: lines.len(),
            batch,
        })
    }
}
