//! Import configuration.

use crate::{DateFormat, DecimalSeparatorHint};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};

/// User-facing import settings, deserialized from the host's configuration
/// store. Every field has a default so a partial object works.
///
/// `merchant_patterns` is a `BTreeMap` so pattern trial order is
/// deterministic (alphabetical by pattern) even though the configuration
/// format carries an unordered map.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImportOptions {
    /// Date layout of the export.
    pub date_format: DateFormat,
    /// Account for negative amounts with no better match.
    pub default_debit_account: String,
    /// Account for positive amounts with no better match.
    pub default_credit_account: String,
    /// The asset account every imported transaction balances against.
    pub default_balancing_account: String,
    /// Flip the sign of every amount (for banks that export money-out as
    /// positive).
    pub invert_amounts: bool,
    /// Consult payee history before other strategies.
    pub use_journal_history: bool,
    /// User merchant patterns: regex (matched against the uppercased
    /// description) to account.
    pub merchant_patterns: BTreeMap<String, String>,
    /// Bank category to account.
    pub category_mapping: HashMap<String, String>,
    /// How to read ambiguous decimal separators in amount cells.
    pub decimal_separator_hint: DecimalSeparatorHint,
    /// Accounts starting with this prefix are flagged for review.
    pub account_todo_prefix: String,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            date_format: DateFormat::Auto,
            default_debit_account: "expenses:unknown".to_string(),
            default_credit_account: "income:unknown".to_string(),
            default_balancing_account: "assets:bank:checking".to_string(),
            invert_amounts: false,
            use_journal_history: true,
            merchant_patterns: BTreeMap::new(),
            category_mapping: HashMap::new(),
            decimal_separator_hint: DecimalSeparatorHint::Auto,
            account_todo_prefix: "todo:".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_fills_defaults() {
        let options: ImportOptions = serde_json::from_str(
            r#"{"dateFormat": "DD/MM/YYYY", "invertAmounts": true}"#,
        )
        .unwrap();
        assert_eq!(options.date_format, DateFormat::DayMonthYearSlash);
        assert!(options.invert_amounts);
        assert!(options.use_journal_history);
        assert_eq!(options.default_balancing_account, "assets:bank:checking");
    }

    #[test]
    fn test_maps_deserialize() {
        let options: ImportOptions = serde_json::from_str(
            r#"{
                "merchantPatterns": {"NETFLIX": "expenses:subscriptions"},
                "categoryMapping": {"Groceries": "expenses:food:groceries"},
                "decimalSeparatorHint": "comma"
            }"#,
        )
        .unwrap();
        assert_eq!(
            options.merchant_patterns.get("NETFLIX").map(String::as_str),
            Some("expenses:subscriptions")
        );
        assert_eq!(options.decimal_separator_hint, DecimalSeparatorHint::Comma);
    }
}
