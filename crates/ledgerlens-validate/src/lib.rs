//! Transaction balance checking.
//!
//! Verifies the double-entry invariant per commodity and per posting
//! group:
//!
//! - Real postings must sum to zero for every commodity.
//! - Balanced-virtual (`[account]`) postings must sum to zero among
//!   themselves, independently of the real group.
//! - Unbalanced-virtual (`(account)`) postings are excluded entirely.
//!
//! Amounts with cost notation contribute in their cost commodity (a unit
//! price converts `|n| * price` with `n`'s sign; a total price contributes
//! the price with `n`'s sign), so `10 AAPL @ $150` against `$-1500`
//! balances. One elided posting per group absorbs every residual of that
//! group; two or more make inference ambiguous and are reported instead of
//! guessed at.
//!
//! Per-commodity sums are rounded to the maximum precision written in the
//! contributing postings before comparing against a `1e-10` tolerance.
//! The rounding absorbs float-style notation noise, not genuine small
//! imbalances.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use ledgerlens_core::{format_amount, NumberFormatContext, Posting, PostingKind, Transaction};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Which balance group a diagnostic refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PostingGroup {
    /// Ordinary postings.
    Real,
    /// `[account]` postings.
    BalancedVirtual,
}

impl fmt::Display for PostingGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Real => write!(f, "real"),
            Self::BalancedVirtual => write!(f, "balanced virtual"),
        }
    }
}

/// A balance violation within one transaction.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum BalanceError {
    /// A commodity's postings do not sum to zero.
    #[error("{group} postings do not balance: off by {formatted}")]
    Imbalanced {
        /// The commodity whose sum is non-zero.
        commodity: String,
        /// The signed residual.
        difference: Decimal,
        /// Human-readable residual (symbol placement per format heuristic).
        formatted: String,
        /// The group the residual belongs to.
        group: PostingGroup,
    },

    /// More than one posting in the group has an elided amount, so no
    /// amount can be inferred unambiguously.
    #[error("more than one {group} posting without an amount")]
    MultipleInferred {
        /// The group containing the ambiguous postings.
        group: PostingGroup,
    },
}

/// Outcome of checking one transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BalanceReport {
    /// All groups sum to zero (or are resolved by inference).
    Balanced,
    /// One or more violations, across both groups.
    Unbalanced(Vec<BalanceError>),
}

impl BalanceReport {
    /// Whether the transaction balances.
    #[must_use]
    pub const fn is_balanced(&self) -> bool {
        matches!(self, Self::Balanced)
    }

    /// The violations, empty when balanced.
    #[must_use]
    pub fn errors(&self) -> &[BalanceError] {
        match self {
            Self::Balanced => &[],
            Self::Unbalanced(errors) => errors,
        }
    }
}

/// Comparison tolerance after precision rounding.
const TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 10);

/// Check the double-entry balance of one transaction.
///
/// ```
/// use ledgerlens_core::NumberFormatContext;
/// use ledgerlens_parser::extract_transactions;
/// use ledgerlens_validate::check_balance;
///
/// let ctx = NumberFormatContext::new();
/// let text = "2024-01-01 Lunch\n    Expenses:Food  $12.50\n    Assets:Cash  $-12.50\n";
/// let txns = extract_transactions(text, &ctx);
/// assert!(check_balance(&txns[0], &ctx).is_balanced());
/// ```
#[must_use]
pub fn check_balance(txn: &Transaction, ctx: &NumberFormatContext) -> BalanceReport {
    if txn.postings.is_empty() {
        return BalanceReport::Balanced;
    }

    let mut errors = Vec::new();
    check_group(txn, PostingGroup::Real, ctx, &mut errors);
    check_group(txn, PostingGroup::BalancedVirtual, ctx, &mut errors);

    if errors.is_empty() {
        BalanceReport::Balanced
    } else {
        BalanceReport::Unbalanced(errors)
    }
}

fn in_group(posting: &Posting, group: PostingGroup) -> bool {
    match group {
        PostingGroup::Real => posting.kind == PostingKind::Real,
        PostingGroup::BalancedVirtual => posting.kind == PostingKind::BalancedVirtual,
    }
}

struct CommoditySum {
    total: Decimal,
    precision: u32,
}

fn check_group(
    txn: &Transaction,
    group: PostingGroup,
    ctx: &NumberFormatContext,
    errors: &mut Vec<BalanceError>,
) {
    let postings: Vec<&Posting> = txn
        .postings
        .iter()
        .filter(|p| in_group(p, group))
        .collect();
    if postings.is_empty() {
        return;
    }

    let elided = postings.iter().filter(|p| p.is_elided()).count();
    if elided > 1 {
        // Ambiguous; the commodity sums are meaningless without knowing
        // which posting absorbs what.
        errors.push(BalanceError::MultipleInferred { group });
        return;
    }

    // BTreeMap keeps diagnostic order deterministic.
    let mut sums: BTreeMap<String, CommoditySum> = BTreeMap::new();
    for posting in &postings {
        let Some(amount) = &posting.amount else {
            continue;
        };
        let Some((commodity, value, precision)) = amount.balance_contribution() else {
            continue; // assertion-only
        };
        let entry = sums.entry(commodity.to_string()).or_insert(CommoditySum {
            total: Decimal::ZERO,
            precision: 0,
        });
        entry.total += value;
        entry.precision = entry.precision.max(precision);
    }

    for (commodity, sum) in sums {
        let rounded = sum.total.round_dp(sum.precision);
        if rounded.abs() <= TOLERANCE {
            continue;
        }
        if elided == 1 {
            // The single elided posting is presumed to supply the make-up
            // amount for every commodity in this group.
            continue;
        }
        let formatted = format_amount(rounded, &commodity, sum.precision, ctx);
        errors.push(BalanceError::Imbalanced {
            commodity,
            difference: rounded,
            formatted,
            group,
        });
    }
}
