//! Posting amount types.
//!
//! A [`PostingAmount`] is the parsed form of one posting-amount expression,
//! e.g. `$-1,234.56`, `10 AAPL @ $150`, or a bare balance assertion `= $0`.
//! Besides the decimal value it records the commodity, the number of
//! fractional digits as literally written (which drives balance tolerance
//! and display rounding), and the optional cost notation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Cost notation attached to a posting amount (`@` unit price or `@@` total
/// price).
///
/// The cost number is always non-negative; the sign of the conversion is
/// carried by the main amount and reapplied during balance checking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostBasis {
    /// The non-negative price.
    pub number: Decimal,
    /// The price commodity (e.g. `$` for `10 AAPL @ $150`).
    pub commodity: String,
    /// `true` for `@@` (total price), `false` for `@` (per-unit price).
    pub total: bool,
    /// Fractional digits of the price as written.
    pub precision: u32,
}

impl CostBasis {
    /// Create a unit-price cost (`@`).
    #[must_use]
    pub fn unit(number: Decimal, commodity: impl Into<String>, precision: u32) -> Self {
        Self {
            number: number.abs(),
            commodity: commodity.into(),
            total: false,
            precision,
        }
    }

    /// Create a total-price cost (`@@`).
    #[must_use]
    pub fn total(number: Decimal, commodity: impl Into<String>, precision: u32) -> Self {
        Self {
            number: number.abs(),
            commodity: commodity.into(),
            total: true,
            precision,
        }
    }
}

impl fmt::Display for CostBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = if self.total { "@@" } else { "@" };
        write!(f, "{} {} {}", op, self.number, self.commodity)
    }
}

/// A parsed posting amount.
///
/// # Examples
///
/// ```
/// use ledgerlens_core::PostingAmount;
/// use rust_decimal_macros::dec;
///
/// let amount = PostingAmount::new(dec!(-1234.56), "$", 2);
/// assert_eq!(amount.number, dec!(-1234.56));
/// assert_eq!(amount.commodity, "$");
/// assert_eq!(amount.precision, 2);
/// assert!(!amount.assertion_only);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostingAmount {
    /// The signed decimal quantity.
    pub number: Decimal,
    /// The commodity symbol or code. Empty when the amount had none.
    pub commodity: String,
    /// Fractional digits as literally written in the source text.
    ///
    /// This is not the mathematical precision of `number`: `1,000.50` has
    /// precision 2, `1e3` has precision 0. It bounds rounding during
    /// balance comparison and display.
    pub precision: u32,
    /// Cost notation, if the amount carried an `@` / `@@` clause.
    pub cost: Option<CostBasis>,
    /// `true` when the posting consisted of a balance assertion only
    /// (e.g. `= $100`). Such postings contribute nothing to balance sums.
    pub assertion_only: bool,
}

impl PostingAmount {
    /// Create a plain amount without cost.
    #[must_use]
    pub fn new(number: Decimal, commodity: impl Into<String>, precision: u32) -> Self {
        Self {
            number,
            commodity: commodity.into(),
            precision,
            cost: None,
            assertion_only: false,
        }
    }

    /// Create a balance-assertion-only amount.
    ///
    /// Invariant: the value is zero and the commodity empty; the posting is
    /// skipped entirely by the balance checker.
    #[must_use]
    pub fn assertion_only() -> Self {
        Self {
            number: Decimal::ZERO,
            commodity: String::new(),
            precision: 0,
            cost: None,
            assertion_only: true,
        }
    }

    /// Attach a cost basis.
    #[must_use]
    pub fn with_cost(mut self, cost: CostBasis) -> Self {
        self.cost = Some(cost);
        self
    }

    /// The contribution of this amount to its transaction's per-commodity
    /// sums, as a `(commodity, value, precision)` triple.
    ///
    /// Amounts with a cost contribute in the *cost* commodity: a unit price
    /// converts `|number| * price` with the sign of `number`, a total price
    /// contributes the price itself with the sign of `number`. Assertion-only
    /// amounts contribute nothing.
    #[must_use]
    pub fn balance_contribution(&self) -> Option<(&str, Decimal, u32)> {
        if self.assertion_only {
            return None;
        }
        match &self.cost {
            Some(cost) => {
                let sign = if self.number.is_sign_negative() {
                    -Decimal::ONE
                } else {
                    Decimal::ONE
                };
                let magnitude = if cost.total {
                    cost.number
                } else {
                    self.number.abs() * cost.number
                };
                Some((&cost.commodity, sign * magnitude, cost.precision))
            }
            None => Some((&self.commodity, self.number, self.precision)),
        }
    }

    /// Check if the quantity is zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.number.is_zero()
    }
}

impl fmt::Display for PostingAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.assertion_only {
            return write!(f, "=");
        }
        if self.commodity.is_empty() {
            write!(f, "{}", self.number)?;
        } else {
            write!(f, "{} {}", self.number, self.commodity)?;
        }
        if let Some(cost) = &self.cost {
            write!(f, " {cost}")?;
        }
        Ok(())
    }
}
