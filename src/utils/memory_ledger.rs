//! In-memory ledger gateway for testing

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::traits::*;
use crate::types::*;

#[derive(Debug, Default)]
struct CashAccount {
    balance: BigDecimal,
    splits: Vec<GlSplit>,
}

/// In-memory stand-in for the general ledger
///
/// Holds the open splits and running balance of each cash account. Posting a
/// split moves the balance by its net amount.
#[derive(Debug, Clone, Default)]
pub struct MemoryLedger {
    accounts: Arc<RwLock<HashMap<String, CashAccount>>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the opening balance of a cash account
    pub fn open_account(&self, cash_account_id: &str, opening_balance: BigDecimal) {
        let mut accounts = self.accounts.write().unwrap_or_else(|e| e.into_inner());
        accounts
            .entry(cash_account_id.to_string())
            .or_default()
            .balance = opening_balance;
    }

    /// Post a split to a cash account
    pub fn post_split(&self, cash_account_id: &str, split: GlSplit) {
        let mut accounts = self.accounts.write().unwrap_or_else(|e| e.into_inner());
        let account = accounts.entry(cash_account_id.to_string()).or_default();
        account.balance += split.net_amount();
        account.splits.push(split);
    }
}

#[async_trait]
impl LedgerGateway for MemoryLedger {
    async fn list_unreconciled_splits(
        &self,
        cash_account_id: &str,
    ) -> ReconciliationResult<Vec<GlSplit>> {
        let accounts = self
            .accounts
            .read()
            .map_err(|_| ReconciliationError::Ledger("ledger lock poisoned".to_string()))?;
        Ok(accounts
            .get(cash_account_id)
            .map(|account| account.splits.clone())
            .unwrap_or_default())
    }

    async fn cash_account_balance(
        &self,
        cash_account_id: &str,
    ) -> ReconciliationResult<BigDecimal> {
        let accounts = self
            .accounts
            .read()
            .map_err(|_| ReconciliationError::Ledger("ledger lock poisoned".to_string()))?;
        accounts
            .get(cash_account_id)
            .map(|account| account.balance.clone())
            .ok_or_else(|| {
                ReconciliationError::Ledger(format!("unknown cash account '{}'", cash_account_id))
            })
    }
}
