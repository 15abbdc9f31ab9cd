//! Column layout of a tabular export.

use crate::ImportError;

/// Indices of the columns the generator reads from each row.
///
/// Only `date` and at least one of `amount`/`debit`/`credit` are required;
/// everything else is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMap {
    /// Transaction date.
    pub date: Option<usize>,
    /// Payee / description text.
    pub description: Option<usize>,
    /// Single signed amount column.
    pub amount: Option<usize>,
    /// Separate debit (money out) column.
    pub debit: Option<usize>,
    /// Separate credit (money in) column.
    pub credit: Option<usize>,
    /// Bank-assigned category.
    pub category: Option<usize>,
    /// Currency code.
    pub currency: Option<usize>,
    /// Free-form memo.
    pub memo: Option<usize>,
    /// Bank reference / check number.
    pub reference: Option<usize>,
}

/// Header-name synonyms, matched case-insensitively by containment.
const DATE_NAMES: &[&str] = &["date", "posted", "booking"];
const DESCRIPTION_NAMES: &[&str] = &["description", "payee", "merchant", "narrative", "details"];
const AMOUNT_NAMES: &[&str] = &["amount", "value", "sum"];
const DEBIT_NAMES: &[&str] = &["debit", "withdrawal", "money out", "paid out"];
const CREDIT_NAMES: &[&str] = &["credit", "deposit", "money in", "paid in"];
const CATEGORY_NAMES: &[&str] = &["category", "type"];
const CURRENCY_NAMES: &[&str] = &["currency", "ccy"];
const MEMO_NAMES: &[&str] = &["memo", "note", "notes"];
const REFERENCE_NAMES: &[&str] = &["reference", "ref", "check", "cheque"];

impl ColumnMap {
    /// Guess the layout from a header row.
    ///
    /// Each column is assigned to the first unclaimed header whose
    /// lowercased text contains one of its synonyms; more specific roles
    /// (debit/credit before amount, memo before description) claim their
    /// headers first so "Debit Amount" lands on `debit`.
    #[must_use]
    pub fn detect(headers: &[String]) -> Self {
        let lower: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();
        let mut claimed = vec![false; lower.len()];
        let mut find = |names: &[&str]| -> Option<usize> {
            let idx = lower
                .iter()
                .enumerate()
                .position(|(i, h)| !claimed[i] && names.iter().any(|n| h.contains(n)))?;
            claimed[idx] = true;
            Some(idx)
        };

        let date = find(DATE_NAMES);
        let debit = find(DEBIT_NAMES);
        let credit = find(CREDIT_NAMES);
        let amount = find(AMOUNT_NAMES);
        let memo = find(MEMO_NAMES);
        let description = find(DESCRIPTION_NAMES);
        let category = find(CATEGORY_NAMES);
        let currency = find(CURRENCY_NAMES);
        let reference = find(REFERENCE_NAMES);

        Self {
            date,
            description,
            amount,
            debit,
            credit,
            category,
            currency,
            memo,
            reference,
        }
    }

    /// Check that the columns the generator cannot work without are present.
    ///
    /// # Errors
    ///
    /// [`ImportError::MissingColumn`] naming the first missing requirement.
    pub fn validate(&self) -> Result<(), ImportError> {
        if self.date.is_none() {
            return Err(ImportError::MissingColumn("date"));
        }
        if self.amount.is_none() && self.debit.is_none() && self.credit.is_none() {
            return Err(ImportError::MissingColumn("amount (or debit/credit)"));
        }
        Ok(())
    }
}
