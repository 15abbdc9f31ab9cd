//! Posting-line parsing.
//!
//! A posting line is an indented `account  amount` pair separated by two or
//! more spaces or a tab. `(account)` and `[account]` mark virtual postings.

use crate::amount::parse_posting_amount;
use ledgerlens_core::{NumberFormatContext, Posting, PostingKind};

/// Classify an account by its virtual-posting brackets and return the
/// cleaned name.
///
/// Only a fully wrapped account is virtual; parentheses elsewhere in the
/// name (a trailing note, say) leave the posting real.
#[must_use]
pub fn posting_kind(raw_account: &str) -> (PostingKind, String) {
    let trimmed = raw_account.trim();
    if trimmed.len() >= 2 && trimmed.starts_with('(') && trimmed.ends_with(')') {
        return (
            PostingKind::UnbalancedVirtual,
            trimmed[1..trimmed.len() - 1].trim().to_string(),
        );
    }
    if trimmed.len() >= 2 && trimmed.starts_with('[') && trimmed.ends_with(']') {
        return (
            PostingKind::BalancedVirtual,
            trimmed[1..trimmed.len() - 1].trim().to_string(),
        );
    }
    (PostingKind::Real, trimmed.to_string())
}

/// Parse one raw posting line into a [`Posting`].
///
/// Returns `None` when the line holds no account (blank or comment-only).
/// An unparseable or absent amount yields a posting with an elided amount.
#[must_use]
pub fn parse_posting_line(
    line: &str,
    line_number: usize,
    ctx: &NumberFormatContext,
) -> Option<Posting> {
    // Trailing `;` comments never interfere with the posting itself.
    let content = match line.find(';') {
        Some(i) => &line[..i],
        None => line,
    };
    let content = content.trim();
    if content.is_empty() {
        return None;
    }

    let (raw_account, amount_text) = match split_account_amount(content) {
        Some((account, amount)) => (account, Some(amount)),
        None => (content, None),
    };

    let raw_account = raw_account.trim();
    if raw_account.is_empty() {
        return None;
    }
    let (kind, account) = posting_kind(raw_account);

    let amount = amount_text.and_then(|text| parse_posting_amount(text, ctx));
    Some(match amount {
        Some(amount) => Posting::new(raw_account, account, kind, amount, line_number),
        None => Posting::elided(raw_account, account, kind, line_number),
    })
}

/// Split on the first run of two-or-more spaces or a tab.
fn split_account_amount(content: &str) -> Option<(&str, &str)> {
    let bytes = content.as_bytes();
    for (i, c) in content.char_indices() {
        if c == '\t' {
            return Some((&content[..i], &content[i + 1..]));
        }
        if c == ' ' && bytes.get(i + 1) == Some(&b' ') {
            return Some((&content[..i], &content[i..]));
        }
    }
    None
}
