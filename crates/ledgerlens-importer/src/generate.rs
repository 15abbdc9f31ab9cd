//! Row-to-transaction generation.

use crate::{
    parse_amount_string, AccountResolution, AccountResolver, ColumnMap, DateParser, ImportError,
    ImportOptions, TabularData,
};
use ledgerlens_core::{format_amount, NumberFormatContext};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

/// One transaction inferred from a tabular row. Created once per
/// successfully processed row, never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportedTransaction {
    /// ISO `YYYY-MM-DD`.
    pub date: String,
    /// The row's description text.
    pub description: String,
    /// Signed amount booked to the resolved source account. Positive for
    /// money out of the balancing account (the usual expense case).
    pub amount: Decimal,
    /// `amount` rendered with its commodity.
    pub formatted_amount: String,
    /// Currency column value, if any.
    pub currency: Option<String>,
    /// Memo column value, if any.
    pub memo: Option<String>,
    /// Reference / check number column value, if any.
    pub reference: Option<String>,
    /// How the source account was chosen.
    pub source: AccountResolution,
    /// The account the amount is booked to.
    pub source_account: String,
    /// The asset account the transaction balances against.
    pub target_account: String,
    /// Whether the resolution should be reviewed by a human.
    pub needs_review: bool,
    /// One-based source line of the row.
    pub line: usize,
}

/// Counters for the end-of-import summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportStatistics {
    /// Rows turned into transactions.
    pub processed: usize,
    /// Rows skipped with a warning.
    pub skipped: usize,
    /// Transactions flagged for review.
    pub needs_review: usize,
    /// Resolutions from payee history.
    pub from_history: usize,
    /// Resolutions from the category mapping.
    pub from_category: usize,
    /// Resolutions from merchant patterns.
    pub from_pattern: usize,
    /// Resolutions from the amount sign.
    pub from_sign: usize,
    /// Resolutions that fell through to the default.
    pub from_default: usize,
}

impl ImportStatistics {
    fn count(&mut self, source: crate::Source) {
        match source {
            crate::Source::History => self.from_history += 1,
            crate::Source::Category => self.from_category += 1,
            crate::Source::Pattern => self.from_pattern += 1,
            crate::Source::Sign => self.from_sign += 1,
            crate::Source::Default => self.from_default += 1,
        }
    }

    /// One human-readable line for the host's notification.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "Imported {} transaction{} ({} skipped, {} need review)",
            self.processed,
            if self.processed == 1 { "" } else { "s" },
            self.skipped,
            self.needs_review,
        )
    }
}

/// Outcome of one generation run.
#[derive(Debug, Default)]
pub struct ImportResult {
    /// Successfully generated transactions, in row order.
    pub transactions: Vec<ImportedTransaction>,
    /// Per-row problems; the rows were skipped.
    pub warnings: Vec<String>,
    /// Fatal problems; when non-empty, `transactions` is empty.
    pub errors: Vec<ImportError>,
    /// Run counters.
    pub statistics: ImportStatistics,
}

/// Walks tabular rows and emits [`ImportedTransaction`]s.
#[derive(Debug)]
pub struct TransactionGenerator {
    options: ImportOptions,
    dates: DateParser,
}

impl TransactionGenerator {
    /// Create a generator for one set of options.
    #[must_use]
    pub fn new(options: ImportOptions) -> Self {
        let dates = DateParser::new(options.date_format);
        Self { options, dates }
    }

    /// Generate transactions for every row of `table`.
    ///
    /// Missing required columns abort immediately with zero transactions.
    /// Everything else is per-row: a bad date or an unusable amount skips
    /// the row with a warning and processing continues.
    pub fn generate(
        &self,
        table: &TabularData,
        columns: &ColumnMap,
        resolver: &mut AccountResolver,
    ) -> ImportResult {
        let mut result = ImportResult {
            warnings: resolver.take_warnings(),
            ..ImportResult::default()
        };

        if let Err(error) = columns.validate() {
            result.errors.push(error);
            return result;
        }

        for row in &table.rows {
            match self.process_row(row, columns, resolver) {
                Ok(txn) => {
                    result.statistics.processed += 1;
                    result.statistics.count(txn.source.source);
                    if txn.needs_review {
                        result.statistics.needs_review += 1;
                    }
                    result.transactions.push(txn);
                }
                Err(reason) => {
                    debug!(line = row.line, reason, "skipping row");
                    result.statistics.skipped += 1;
                    result.warnings.push(format!("line {}: {reason}", row.line));
                }
            }
        }
        result
    }

    fn process_row(
        &self,
        row: &crate::TableRow,
        columns: &ColumnMap,
        resolver: &mut AccountResolver,
    ) -> Result<ImportedTransaction, &'static str> {
        let date_cell = row.cell(columns.date).ok_or("empty date cell")?;
        let date = self.dates.parse(date_cell).ok_or("unparseable date")?;

        let movement = self.row_amount(row, columns)?;
        let description = row
            .cell(columns.description)
            .unwrap_or_default()
            .to_string();
        let category = row.cell(columns.category);
        let currency = row.cell(columns.currency).map(str::to_string);
        let memo = row.cell(columns.memo).map(str::to_string);
        let reference = row.cell(columns.reference).map(str::to_string);

        let source = resolver.resolve(&description, category, Some(movement));
        let needs_review = resolver.needs_review(&source);

        // The movement is the balancing account's change; the source
        // posting carries the opposite sign (money out books a positive
        // expense).
        let amount = -movement;
        let commodity = currency.as_deref().unwrap_or("$");
        let formatted_amount =
            format_amount(amount, commodity, 2, &NumberFormatContext::default());

        Ok(ImportedTransaction {
            date,
            description,
            amount,
            formatted_amount,
            currency,
            memo,
            reference,
            source_account: source.account.clone(),
            source,
            target_account: self.options.default_balancing_account.clone(),
            needs_review,
            line: row.line,
        })
    }

    /// The signed change to the balancing account: the amount column as
    /// written, or `credit − debit` when the export splits directions into
    /// two columns. Zero or absent rejects the row.
    fn row_amount(
        &self,
        row: &crate::TableRow,
        columns: &ColumnMap,
    ) -> Result<Decimal, &'static str> {
        let hint = self.options.decimal_separator_hint;
        let from_amount = row
            .cell(columns.amount)
            .and_then(|cell| parse_amount_string(cell, hint));

        let movement = match from_amount {
            Some(value) => value,
            None => {
                let debit = row
                    .cell(columns.debit)
                    .and_then(|cell| parse_amount_string(cell, hint));
                let credit = row
                    .cell(columns.credit)
                    .and_then(|cell| parse_amount_string(cell, hint));
                match (debit, credit) {
                    (None, None) => return Err("no valid amount found"),
                    (debit, credit) => {
                        credit.unwrap_or_default().abs() - debit.unwrap_or_default().abs()
                    }
                }
            }
        };

        if movement.is_zero() {
            return Err("no valid amount found");
        }
        Ok(if self.options.invert_amounts {
            -movement
        } else {
            movement
        })
    }
}
