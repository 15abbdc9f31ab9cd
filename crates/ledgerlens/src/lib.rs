//! Ledger parsing, balance checking, and tabular import for plain-text
//! accounting editors.
//!
//! This crate is the umbrella over the focused member crates and provides
//! [`analyze_document`], the synchronous entry point an editor host calls
//! on every change: text in, balance diagnostics out, with reparse
//! avoidance handled by the shared [`TransactionCache`].
//!
//! ```
//! use ledgerlens::{analyze_document, NumberFormatContext, TransactionCache};
//!
//! let mut cache = TransactionCache::new();
//! let ctx = NumberFormatContext::new();
//! let text = "2024-01-01 Lunch\n    Expenses:Food  $12.50\n    Assets:Cash  $-12.00\n";
//! let diagnostics = analyze_document(&mut cache, "file:///j.journal", text, &ctx);
//! assert_eq!(diagnostics.len(), 1);
//! assert_eq!(diagnostics[0].line, 0);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub use ledgerlens_cache::{diff_lines, ChangedRange, TransactionCache};
pub use ledgerlens_core::{
    format_amount, CommodityFormat, CostBasis, Decimal, NumberFormatContext, Posting,
    PostingAmount, PostingKind, Transaction,
};
pub use ledgerlens_importer as importer;
pub use ledgerlens_parser::{extract_transactions, parse_posting_amount, parse_posting_line};
pub use ledgerlens_validate::{check_balance, BalanceError, BalanceReport, PostingGroup};

use serde::Serialize;
use tracing::debug;

/// One editor diagnostic: a balance problem anchored to a transaction's
/// header line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// Zero-based line of the offending transaction's header.
    pub line: usize,
    /// The violation.
    pub error: BalanceError,
    /// Rendered message for display.
    pub message: String,
}

/// Analyze one document snapshot and report every balance violation.
///
/// Line endings are normalized to `\n` first, so hosts may pass text
/// straight from the editor buffer. Unchanged content reuses the cached
/// parse (see [`TransactionCache::get`]).
pub fn analyze_document(
    cache: &mut TransactionCache,
    uri: &str,
    text: &str,
    ctx: &NumberFormatContext,
) -> Vec<Diagnostic> {
    let normalized;
    let text = if text.contains('\r') {
        normalized = text.replace("\r\n", "\n").replace('\r', "\n");
        normalized.as_str()
    } else {
        text
    };

    let transactions = cache.get(uri, text, ctx);
    let mut diagnostics = Vec::new();
    for txn in transactions.iter() {
        if let BalanceReport::Unbalanced(errors) = check_balance(txn, ctx) {
            for error in errors {
                diagnostics.push(Diagnostic {
                    line: txn.header_line,
                    message: error.to_string(),
                    error,
                });
            }
        }
    }
    debug!(
        uri,
        transactions = transactions.len(),
        diagnostics = diagnostics.len(),
        "analyzed document"
    );
    diagnostics
}
