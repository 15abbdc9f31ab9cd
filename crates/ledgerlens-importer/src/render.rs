//! Ledger-text rendering of imported transactions.

use crate::ImportedTransaction;

/// Layout knobs for the generated text.
#[derive(Debug, Clone, Copy)]
pub struct FormatConfig {
    /// Column at which amounts start (account names are padded up to it).
    pub amount_column: usize,
    /// Append `; matched: <source description>` to the source posting.
    pub include_matched_comment: bool,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            amount_column: 44,
            include_matched_comment: true,
        }
    }
}

/// Indent of every posting line.
const INDENT: &str = "    ";

/// Render transactions as blank-line-separated two-posting blocks:
///
/// ```text
/// 2024-01-15 (123) AMAZON.COM
///     ; order 112-99
///     expenses:shopping:amazon              $50.00  ; matched: AMAZON.COM
///     assets:bank:checking
/// ```
///
/// The balancing posting's amount is elided; the block balances by
/// inference. The reference becomes the header code, the memo a comment
/// line under the header.
#[must_use]
pub fn format_transactions(transactions: &[ImportedTransaction], config: &FormatConfig) -> String {
    let mut out = String::new();
    for (i, txn) in transactions.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        render_block(&mut out, txn, config);
    }
    out
}

fn render_block(out: &mut String, txn: &ImportedTransaction, config: &FormatConfig) {
    out.push_str(&txn.date);
    if let Some(reference) = &txn.reference {
        out.push_str(&format!(" ({reference})"));
    }
    if !txn.description.is_empty() {
        out.push(' ');
        out.push_str(&txn.description);
    }
    out.push('\n');

    if let Some(memo) = &txn.memo {
        out.push_str(&format!("{INDENT}; {memo}\n"));
    }

    // Indent + padded account + two-space gap lands the amount at the
    // configured column (long account names push it right).
    let pad = config.amount_column.saturating_sub(INDENT.len() + 2);
    out.push_str(&format!(
        "{INDENT}{:<pad$}  {}",
        txn.source_account, txn.formatted_amount
    ));
    if config.include_matched_comment && !txn.description.is_empty() {
        out.push_str(&format!("  ; matched: {}", txn.description));
    }
    out.push('\n');

    out.push_str(&format!("{INDENT}{}\n", txn.target_account));
}
