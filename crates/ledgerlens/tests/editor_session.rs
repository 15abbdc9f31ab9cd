//! Simulates an editing session: repeated analyze calls over one URI with
//! incremental edits, the way a host editor drives the crate.

use ledgerlens::{analyze_document, NumberFormatContext, TransactionCache};

const JOURNAL: &str = "2024-01-01 Opening
    Assets:Checking  $1000.00
    Equity:Opening

2024-01-05 * (42) Groceries ; weekly
    Expenses:Food:Groceries  $86.40
    Assets:Checking  $-86.40

; a comment between transactions
account Expenses:Food:Groceries

2024-01-07 Broker
    Assets:Broker  2 VTI @ $250.00
    Assets:Checking  $-500.00
";

#[test]
fn clean_journal_stays_clean_across_reanalysis() {
    let mut cache = TransactionCache::new();
    let ctx = NumberFormatContext::new();
    assert!(analyze_document(&mut cache, "file:///j", JOURNAL, &ctx).is_empty());
    // Second pass hits the cache and reports the same thing.
    assert!(analyze_document(&mut cache, "file:///j", JOURNAL, &ctx).is_empty());
    assert_eq!(cache.len(), 1);
}

#[test]
fn breaking_one_amount_produces_one_diagnostic() {
    let mut cache = TransactionCache::new();
    let ctx = NumberFormatContext::new();
    assert!(analyze_document(&mut cache, "file:///j", JOURNAL, &ctx).is_empty());

    let edited = JOURNAL.replace("$-86.40", "$-86.00");
    let diagnostics = analyze_document(&mut cache, "file:///j", &edited, &ctx);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].line, 4);

    // Reverting the edit clears the diagnostic again.
    assert!(analyze_document(&mut cache, "file:///j", JOURNAL, &ctx).is_empty());
}

#[test]
fn half_typed_posting_does_not_flag_the_transaction() {
    let mut cache = TransactionCache::new();
    let ctx = NumberFormatContext::new();
    // The user is mid-keystroke on the second posting: no amount yet.
    let text = "2024-01-05 Groceries\n    Expenses:Food  $86.40\n    Assets:Che\n";
    assert!(analyze_document(&mut cache, "file:///j", text, &ctx).is_empty());
}
