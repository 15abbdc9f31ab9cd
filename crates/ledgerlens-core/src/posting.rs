//! Posting types.

use crate::PostingAmount;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of a posting by its account syntax.
///
/// - `Assets:Cash` is a real posting and must balance within its
///   transaction.
/// - `(Assets:Cash)` is an unbalanced virtual posting, excluded from all
///   balance checks.
/// - `[Assets:Cash]` is a balanced virtual posting; these must balance to
///   zero among themselves, separately from the real postings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PostingKind {
    /// Ordinary posting, participates in the real balance group.
    Real,
    /// `(account)` syntax, excluded from balancing.
    UnbalancedVirtual,
    /// `[account]` syntax, balances within its own group.
    BalancedVirtual,
}

/// One account + amount line within a transaction.
///
/// `amount` is `None` when the posting was written without an amount; its
/// value is implicitly "whatever makes the group balance".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    /// The account text as written, including any virtual-posting brackets.
    pub raw_account: String,
    /// The account with virtual-posting brackets stripped and trimmed.
    pub account: String,
    /// Real / virtual classification derived from `raw_account`.
    pub kind: PostingKind,
    /// The parsed amount, or `None` when elided.
    pub amount: Option<PostingAmount>,
    /// Zero-based line number within the source document.
    pub line: usize,
}

impl Posting {
    /// Create a posting with an explicit amount.
    #[must_use]
    pub fn new(
        raw_account: impl Into<String>,
        account: impl Into<String>,
        kind: PostingKind,
        amount: PostingAmount,
        line: usize,
    ) -> Self {
        Self {
            raw_account: raw_account.into(),
            account: account.into(),
            kind,
            amount: Some(amount),
            line,
        }
    }

    /// Create a posting with an elided amount.
    #[must_use]
    pub fn elided(
        raw_account: impl Into<String>,
        account: impl Into<String>,
        kind: PostingKind,
        line: usize,
    ) -> Self {
        Self {
            raw_account: raw_account.into(),
            account: account.into(),
            kind,
            amount: None,
            line,
        }
    }

    /// Whether this posting's amount is elided (to be inferred).
    #[must_use]
    pub const fn is_elided(&self) -> bool {
        self.amount.is_none()
    }
}

impl fmt::Display for Posting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "    {}", self.raw_account)?;
        if let Some(amount) = &self.amount {
            write!(f, "  {amount}")?;
        }
        Ok(())
    }
}
