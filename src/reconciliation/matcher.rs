//! Deterministic pairing of statement lines with GL splits
//!
//! A split is eligible for a line when the amounts agree at the currency's
//! minor-unit precision (within `amount_tolerance`, zero by default) and the
//! dates are at most `date_window_days` apart. Among eligible splits the
//! smallest date gap wins, then the oldest journal date, then the lowest
//! split ID. Lines are served in statement date order so an earlier line is
//! never starved by a later line of the same amount.

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use std::collections::HashSet;

use crate::config::MatchingConfig;
use crate::types::*;

/// An eligible split for a given line
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate<'a> {
    pub split: &'a GlSplit,
    pub date_gap_days: i64,
}

impl<'a> Candidate<'a> {
    fn rank_key(&self) -> (i64, NaiveDate, &'a str) {
        (
            self.date_gap_days,
            self.split.journal_date,
            self.split.split_id.as_str(),
        )
    }
}

/// Pure matching policy; holds no state beyond its configuration
#[derive(Debug, Clone, Default)]
pub struct Matcher {
    config: MatchingConfig,
}

impl Matcher {
    pub fn new(config: MatchingConfig) -> Self {
        Self { config }
    }

    /// Whether two amounts are equal at the configured precision
    pub fn amounts_agree(&self, line_amount: &BigDecimal, split_amount: &BigDecimal) -> bool {
        let difference = (line_amount - split_amount)
            .abs()
            .round(self.config.currency_scale);
        difference <= self.config.amount_tolerance
    }

    /// Score a single pairing, returning `None` if the split is ineligible
    pub fn evaluate<'a>(&self, line: &StatementLine, split: &'a GlSplit) -> Option<Candidate<'a>> {
        let date_gap_days = (line.statement_date - split.journal_date).num_days().abs();
        if date_gap_days > self.config.date_window_days {
            return None;
        }

        if !self.amounts_agree(&line.amount, &split.net_amount()) {
            return None;
        }

        Some(Candidate {
            split,
            date_gap_days,
        })
    }

    /// All eligible splits for a line, best first
    pub fn rank_candidates<'a, I>(&self, line: &StatementLine, splits: I) -> Vec<Candidate<'a>>
    where
        I: IntoIterator<Item = &'a GlSplit>,
    {
        let mut candidates: Vec<Candidate<'a>> = splits
            .into_iter()
            .filter_map(|split| self.evaluate(line, split))
            .collect();
        candidates.sort_by(|a, b| a.rank_key().cmp(&b.rank_key()));
        candidates
    }

    /// Unmatched lines in the order they claim splits: oldest statement date
    /// first, then oldest ingestion
    pub fn pending_lines<'a>(&self, lines: &'a [StatementLine]) -> Vec<&'a StatementLine> {
        let mut pending: Vec<&StatementLine> = lines.iter().filter(|l| l.is_unmatched()).collect();
        pending.sort_by(|a, b| {
            a.statement_date
                .cmp(&b.statement_date)
                .then_with(|| a.created_at.cmp(&b.created_at))
        });
        pending
    }

    /// Best eligible split for a line, ignoring any split in `taken`
    pub fn next_candidate<'a>(
        &self,
        line: &StatementLine,
        splits: &'a [GlSplit],
        taken: &HashSet<String>,
    ) -> Option<Candidate<'a>> {
        splits
            .iter()
            .filter(|split| !taken.contains(&split.split_id))
            .filter_map(|split| self.evaluate(line, split))
            .min_by(|a, b| a.rank_key().cmp(&b.rank_key()))
    }

    /// Plan pairings for the unmatched lines against a set of unclaimed splits.
    ///
    /// Each split is used at most once. Lines that are not unmatched are
    /// ignored, as are lines with no eligible split.
    pub fn propose(&self, lines: &[StatementLine], splits: &[GlSplit]) -> Vec<ProposedMatch> {
        let mut taken = HashSet::new();
        let mut proposals = Vec::new();

        for line in self.pending_lines(lines) {
            if let Some(candidate) = self.next_candidate(line, splits, &taken) {
                taken.insert(candidate.split.split_id.clone());
                proposals.push(ProposedMatch {
                    statement_line_id: line.id,
                    split_id: candidate.split.split_id.clone(),
                    date_gap_days: candidate.date_gap_days,
                });
            }
        }

        proposals
    }
}
