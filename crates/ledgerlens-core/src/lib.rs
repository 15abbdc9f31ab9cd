//! Core types for ledgerlens
//!
//! This crate provides the data model shared by the ledgerlens analysis
//! pipeline:
//!
//! - [`PostingAmount`] - A parsed posting amount with commodity, written
//!   precision, and optional cost notation
//! - [`CostBasis`] - The `@` / `@@` conversion price attached to an amount
//! - [`Posting`] - One account + amount line of a transaction
//! - [`PostingKind`] - Real vs. virtual posting classification
//! - [`Transaction`] - A blank-line-delimited transaction block with its
//!   line span in the source document
//! - [`NumberFormatContext`] - Per-commodity display and parse formats
//!
//! Transactions here are deliberately lightweight and positional: they are
//! rebuilt from document text on every parse pass and carry no identity
//! beyond their line numbers.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod amount;
pub mod format;
pub mod posting;
pub mod transaction;

pub use amount::{CostBasis, PostingAmount};
pub use format::{format_amount, CommodityFormat, NumberFormatContext};
pub use posting::{Posting, PostingKind};
pub use transaction::Transaction;

// Re-export the decimal type used throughout.
pub use rust_decimal::Decimal;
