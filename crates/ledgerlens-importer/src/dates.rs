//! Date parsing for tabular rows.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The date layout of the export, as configured by the user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateFormat {
    /// Try the known layouts in a fixed order.
    #[default]
    #[serde(rename = "auto")]
    Auto,
    /// ISO, e.g. `2024-01-15`.
    #[serde(rename = "YYYY-MM-DD")]
    YearMonthDayDash,
    /// e.g. `2024/01/15`.
    #[serde(rename = "YYYY/MM/DD")]
    YearMonthDaySlash,
    /// e.g. `15/01/2024`.
    #[serde(rename = "DD/MM/YYYY")]
    DayMonthYearSlash,
    /// e.g. `01/15/2024`.
    #[serde(rename = "MM/DD/YYYY")]
    MonthDayYearSlash,
    /// e.g. `15.01.2024`.
    #[serde(rename = "DD.MM.YYYY")]
    DayMonthYearDot,
    /// e.g. `15-01-2024`.
    #[serde(rename = "DD-MM-YYYY")]
    DayMonthYearDash,
}

impl DateFormat {
    const fn chrono_format(self) -> Option<&'static str> {
        match self {
            Self::Auto => None,
            Self::YearMonthDayDash => Some("%Y-%m-%d"),
            Self::YearMonthDaySlash => Some("%Y/%m/%d"),
            Self::DayMonthYearSlash => Some("%d/%m/%Y"),
            Self::MonthDayYearSlash => Some("%m/%d/%Y"),
            Self::DayMonthYearDot => Some("%d.%m.%Y"),
            Self::DayMonthYearDash => Some("%d-%m-%Y"),
        }
    }
}

/// Under `Auto`, candidate layouts in trial order. ISO first; US month-first
/// before day-first, so ambiguous slash dates resolve the same way every
/// time rather than depending on the row at hand.
const AUTO_CANDIDATES: [&str; 6] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%d.%m.%Y",
    "%d-%m-%Y",
];

/// Parses date cells according to one configured [`DateFormat`].
#[derive(Debug, Clone, Copy)]
pub struct DateParser {
    format: DateFormat,
}

impl DateParser {
    /// Create a parser for the configured format.
    #[must_use]
    pub const fn new(format: DateFormat) -> Self {
        Self { format }
    }

    /// Parse one date cell into ISO `YYYY-MM-DD`, or `None` when the cell
    /// does not match the configured layout (any known layout under `Auto`).
    #[must_use]
    pub fn parse(&self, cell: &str) -> Option<String> {
        let cell = cell.trim();
        let date = match self.format.chrono_format() {
            Some(fmt) => NaiveDate::parse_from_str(cell, fmt).ok()?,
            None => AUTO_CANDIDATES
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(cell, fmt).ok())?,
        };
        Some(date.format("%Y-%m-%d").to_string())
    }
}
