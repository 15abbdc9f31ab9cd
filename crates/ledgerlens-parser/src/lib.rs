//! Ledger text parsing for ledgerlens.
//!
//! This crate turns free-form hledger-style text into the structured types
//! of `ledgerlens-core`:
//!
//! - [`parse_posting_amount`] - one posting-amount expression (value,
//!   commodity, precision, cost, balance assertion)
//! - [`parse_posting_line`] - one indented posting line (account + amount)
//! - [`extract_transactions`] - a whole document's transactions
//!
//! The parsers are written for live editor buffers: they run synchronously
//! on every keystroke, never panic, and signal all malformed input by
//! returning `None` or skipping the offending line. There is no rejecting
//! grammar here on purpose - half-typed postings are the common case, not
//! the exception.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod amount;
pub mod extract;
pub mod posting;

pub use amount::parse_posting_amount;
pub use extract::extract_transactions;
pub use posting::{parse_posting_line, posting_kind};
