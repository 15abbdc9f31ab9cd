//! Commodity number formats and amount rendering.
//!
//! A [`NumberFormatContext`] is supplied by the host's format-detection
//! collaborator and records, per commodity, which character is the decimal
//! mark, which is the group separator, and whether the symbol is written
//! before the number. The parser consults it to disambiguate `.` vs `,`
//! and the renderers use it to produce human-readable amounts.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Display/parse format for one commodity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommodityFormat {
    /// The decimal mark character (`.` or `,`).
    pub decimal_mark: char,
    /// The group separator character, if amounts are grouped.
    pub group_separator: Option<char>,
    /// Whether the commodity symbol is written before the number (`$100`)
    /// rather than after (`100 EUR`).
    pub symbol_before: bool,
}

impl Default for CommodityFormat {
    fn default() -> Self {
        Self {
            decimal_mark: '.',
            group_separator: None,
            symbol_before: false,
        }
    }
}

/// Per-commodity number formats plus the document's default commodity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberFormatContext {
    /// Formats keyed by commodity symbol or code.
    pub commodity_formats: HashMap<String, CommodityFormat>,
    /// The document's default commodity, if one was declared.
    pub default_commodity: Option<String>,
}

impl NumberFormatContext {
    /// Create an empty context (heuristics only).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a format for a commodity.
    pub fn insert(&mut self, commodity: impl Into<String>, format: CommodityFormat) {
        self.commodity_formats.insert(commodity.into(), format);
    }

    /// Look up the format for a commodity.
    #[must_use]
    pub fn format_for(&self, commodity: &str) -> Option<&CommodityFormat> {
        self.commodity_formats.get(commodity)
    }
}

/// Heuristic: a commodity written as a single non-alphanumeric character
/// (`$`, `€`, `£`, `¥`) goes before the number; alphabetic codes go after.
#[must_use]
pub fn symbol_goes_before(commodity: &str) -> bool {
    let mut chars = commodity.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if !c.is_alphanumeric())
}

/// Render an amount for human-readable output (diagnostics, generated
/// ledger text).
///
/// The number is rendered to exactly `precision` fractional digits. When
/// the context carries a format for the commodity, its decimal mark and
/// symbol placement are honored; otherwise the single-symbol heuristic
/// decides placement and `.` is the decimal mark.
///
/// ```
/// use ledgerlens_core::{format_amount, NumberFormatContext};
/// use rust_decimal_macros::dec;
///
/// let ctx = NumberFormatContext::new();
/// assert_eq!(format_amount(dec!(-1234.5), "$", 2, &ctx), "$-1234.50");
/// assert_eq!(format_amount(dec!(10), "AAPL", 0, &ctx), "10 AAPL");
/// ```
#[must_use]
pub fn format_amount(
    number: Decimal,
    commodity: &str,
    precision: u32,
    ctx: &NumberFormatContext,
) -> String {
    let format = ctx.format_for(commodity);
    let mut digits = format!("{:.*}", precision as usize, number);

    if let Some(f) = format {
        if f.decimal_mark != '.' {
            digits = digits.replace('.', &f.decimal_mark.to_string());
        }
    }

    if commodity.is_empty() {
        return digits;
    }

    let before = format.map_or_else(|| symbol_goes_before(commodity), |f| f.symbol_before);
    if before {
        format!("{commodity}{digits}")
    } else {
        format!("{digits} {commodity}")
    }
}
