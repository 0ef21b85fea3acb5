//! # Reconciliation Core
//!
//! A bank statement reconciliation engine: matches bank-reported statement
//! lines against the cash account's general-ledger splits, tracks each line
//! through its lifecycle, and reports balances that tie back to both the
//! bank and the books.
//!
//! ## Features
//!
//! - **Statement lines**: validated, all-or-nothing bulk ingestion with an
//!   `UNMATCHED -> MATCHED -> RECONCILED` lifecycle
//! - **Auto-matching**: deterministic, re-runnable pairing on exact amount and
//!   a configurable date window
//! - **Manual matching**: match/unmatch with a split held by at most one line
//! - **Batch reconciliation**: atomic promotion of matched lines with an audit record
//! - **Summary**: GL, statement and reconciled balances plus per-status counts
//! - **Storage abstraction**: backend-agnostic design via the `StatementStore`
//!   and `LedgerGateway` traits
//!
//! ## Quick Start
//!
//! ```rust
//! use reconciliation_core::utils::{MemoryLedger, MemoryStatementStore};
//! use reconciliation_core::{EngineConfig, ReconciliationEngine, StatementLineInput};
//! use chrono::NaiveDate;
//!
//! # async fn run() -> reconciliation_core::ReconciliationResult<()> {
//! let engine = ReconciliationEngine::new(
//!     MemoryStatementStore::new(),
//!     MemoryLedger::new(),
//!     EngineConfig::new("cash"),
//! )?;
//!
//! let date = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
//! engine
//!     .bulk_insert(&[StatementLineInput::new(date, "Deposit", "1000.00")])
//!     .await?;
//! let outcome = engine.auto_match().await?;
//! println!("matched {}", outcome.matched);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod reconciliation;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use config::*;
pub use reconciliation::*;
pub use traits::*;
pub use types::*;
