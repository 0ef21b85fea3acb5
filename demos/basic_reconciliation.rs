//! Basic reconciliation example
//!
//! Run with `RUST_LOG=info cargo run --example basic_reconciliation` to see the
//! engine's structured logs.

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use reconciliation_core::utils::{MemoryLedger, MemoryStatementStore};
use reconciliation_core::{
    EngineConfig, GlSplit, LineStatusKind, ReconciliationEngine, StatementLineInput, StatusFilter,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("🏦 Reconciliation Core - Basic Reconciliation Example\n");

    // 1. The ledger side: cash account with a few posted splits
    let ledger = MemoryLedger::new();
    ledger.open_account("1000-cash", BigDecimal::from(0));
    ledger.post_split(
        "1000-cash",
        GlSplit::debit(
            "split-001",
            "je-001",
            NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            "Customer payment INV-17",
            "1000.00".parse()?,
        )
        .with_journal_ref("INV-17"),
    );
    ledger.post_split(
        "1000-cash",
        GlSplit::credit(
            "split-002",
            "je-002",
            NaiveDate::from_ymd_opt(2024, 1, 7).unwrap(),
            "Bank service fee",
            "25.00".parse()?,
        ),
    );
    ledger.post_split(
        "1000-cash",
        GlSplit::credit(
            "split-003",
            "je-003",
            NaiveDate::from_ymd_opt(2024, 1, 9).unwrap(),
            "Supplier payment",
            "310.40".parse()?,
        ),
    );

    let config = EngineConfig::from_toml_str(
        r#"
        cash_account_id = "1000-cash"

        [matching]
        date_window_days = 3
        "#,
    )?;
    let engine = ReconciliationEngine::new(MemoryStatementStore::new(), ledger, config)?;

    // 2. Ingest the bank statement
    println!("📥 Ingesting statement lines...");
    let lines = engine
        .bulk_insert(&[
            StatementLineInput::new(
                NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
                "DEPOSIT ACME LTD",
                "1000.00",
            ),
            StatementLineInput::new(
                NaiveDate::from_ymd_opt(2024, 1, 6).unwrap(),
                "MONTHLY FEE",
                "-25.00",
            ),
            StatementLineInput::new(
                NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
                "CHQ 000123",
                "-310.40",
            )
            .with_reference("000123"),
        ])
        .await?;
    println!("  ✓ {} lines ingested\n", lines.len());

    // 3. Preview and run auto-match
    println!("🔗 Auto-matching...");
    for proposal in engine.preview_auto_match().await? {
        println!(
            "  → line {} ↔ {} ({} day gap)",
            proposal.statement_line_id, proposal.split_id, proposal.date_gap_days
        );
    }
    let outcome = engine.auto_match().await?;
    println!("  ✓ {} lines matched\n", outcome.matched);

    // 4. The cheque cleared late; match it by hand
    let cheque = &lines[2];
    println!("✋ Manual match for '{}'...", cheque.description);
    let suggestions = engine.suggest_matches(cheque.id).await?;
    println!("  {} suggestion(s) inside the date window", suggestions.len());
    engine.match_line(cheque.id, "split-003").await?;
    println!("  ✓ Matched to split-003\n");

    // 5. Reconcile everything that is matched
    let matched: Vec<_> = engine
        .list_lines(StatusFilter::Only(LineStatusKind::Matched))
        .await?
        .into_iter()
        .map(|line| line.id)
        .collect();
    let result = engine.reconcile(&matched, "controller@example.com").await?;
    println!(
        "✅ Batch {} reconciled {} lines totalling {}\n",
        result.batch.batch_id, result.reconciled, result.batch.total_amount
    );

    // 6. Summary
    let summary = engine.summary().await?;
    println!("📊 Summary");
    println!("  GL balance:         {}", summary.gl_balance);
    println!("  Statement balance:  {}", summary.statement_balance);
    println!("  Reconciled balance: {}", summary.reconciled_balance);
    println!("  Difference:         {}", summary.difference);
    println!(
        "  Unmatched/Matched/Reconciled: {}/{}/{}",
        summary.unmatched_count, summary.matched_count, summary.reconciled_count
    );

    Ok(())
}
