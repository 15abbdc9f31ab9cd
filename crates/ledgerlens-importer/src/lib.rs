//! Tabular bank-export import.
//!
//! Turns arbitrary CSV/TSV exports into ledger transactions:
//!
//! 1. [`TabularData::parse`] detects the delimiter and tokenizes cells.
//! 2. [`ColumnMap`] locates the date/description/amount columns.
//! 3. [`TransactionGenerator`] walks the rows, parsing dates and amounts
//!    and resolving an account for each row through the layered
//!    [`AccountResolver`] pipeline (history, category, merchant patterns,
//!    amount sign, default).
//! 4. [`format_transactions`] renders the result as ledger text.
//!
//! Row-level problems (bad date, no usable amount) become warnings and skip
//! the row. Only missing required columns abort the whole import, since
//! nothing can be inferred without them. User-supplied merchant patterns go
//! through [`pattern_safety`] before compilation; structurally dangerous
//! patterns are dropped with a warning rather than compiled.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod amounts;
mod columns;
mod config;
mod dates;
mod generate;
mod history;
pub mod pattern_safety;
mod render;
mod resolver;
mod table;

pub use amounts::{parse_amount_string, DecimalSeparatorHint};
pub use columns::ColumnMap;
pub use config::ImportOptions;
pub use dates::{DateFormat, DateParser};
pub use generate::{
    ImportResult, ImportStatistics, ImportedTransaction, TransactionGenerator,
};
pub use history::PayeeAccountHistory;
pub use render::{format_transactions, FormatConfig};
pub use resolver::{AccountResolution, AccountResolver, FuzzyMatch, Source};
pub use table::{TableError, TableRow, TabularData};

use thiserror::Error;

/// A fatal import error. Anything recoverable per-row is a warning instead.
#[derive(Debug, Error)]
pub enum ImportError {
    /// A column the generator cannot work without was not found.
    #[error("required column missing: {0}")]
    MissingColumn(&'static str),

    /// The input could not be tokenized into rows at all.
    #[error(transparent)]
    Table(#[from] TableError),
}
