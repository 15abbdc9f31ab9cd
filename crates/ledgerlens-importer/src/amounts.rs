//! Numeric-string parsing for tabular amount cells.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Longest accepted amount cell.
const MAX_AMOUNT_LEN: usize = 100;

/// How to read a lone `.`/`,` separator in an amount cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecimalSeparatorHint {
    /// Last-separator heuristic; a lone separator with at most two trailing
    /// digits reads as the decimal mark, otherwise as grouping.
    #[default]
    Auto,
    /// `,` is always the decimal mark, `.` always grouping.
    Comma,
    /// `.` is always the decimal mark, `,` always grouping.
    Period,
}

/// Parse one amount cell into a signed decimal.
///
/// Handles currency symbols and codes (`$`, `EUR 1.234,56`), accounting
/// negatives (`(123.45)`), explicit signs, and both `1,234.56` and
/// `1.234,56` notations. Cells over 100 characters and anything that does
/// not reduce to a single well-formed number read as `None`.
///
/// ```
/// use ledgerlens_importer::{parse_amount_string, DecimalSeparatorHint};
/// use rust_decimal_macros::dec;
///
/// let hint = DecimalSeparatorHint::Auto;
/// assert_eq!(parse_amount_string("$1,234.56", hint), Some(dec!(1234.56)));
/// assert_eq!(parse_amount_string("(50.00)", hint), Some(dec!(-50.00)));
/// assert_eq!(parse_amount_string("1.234,56", hint), Some(dec!(1234.56)));
/// ```
#[must_use]
pub fn parse_amount_string(cell: &str, hint: DecimalSeparatorHint) -> Option<Decimal> {
    if cell.chars().count() > MAX_AMOUNT_LEN {
        return None;
    }
    let mut text = cell.trim();
    if text.is_empty() {
        return None;
    }

    // Accounting notation: (123.45) is negative.
    let mut negative = false;
    if text.starts_with('(') && text.ends_with(')') {
        negative = true;
        text = text[1..text.len() - 1].trim();
    }

    // Everything that is not a digit, separator, or sign is symbol noise.
    let stripped: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '+' | '-'))
        .collect();
    if stripped.is_empty() {
        return None;
    }

    let body = match stripped.strip_prefix('-') {
        Some(rest) => {
            negative = !negative;
            rest
        }
        None => stripped.strip_prefix('+').unwrap_or(&stripped),
    };
    // A sign anywhere else means the cell held more than one number.
    if body.contains(['+', '-']) || body.is_empty() {
        return None;
    }

    let normalized = normalize_separators(body, hint)?;
    let value = Decimal::from_str(&normalized).ok()?;
    Some(if negative { -value } else { value })
}

/// Reduce a digits-and-separators body to a plain `123.45` form.
fn normalize_separators(body: &str, hint: DecimalSeparatorHint) -> Option<String> {
    let decimal_mark = match hint {
        DecimalSeparatorHint::Comma => ',',
        DecimalSeparatorHint::Period => '.',
        DecimalSeparatorHint::Auto => infer_decimal_mark(body)?,
    };
    let group_separator = if decimal_mark == '.' { ',' } else { '.' };

    let mut seen_mark = false;
    let mut out = String::with_capacity(body.len());
    for c in body.chars() {
        if c == group_separator {
            // Grouping after the decimal mark is malformed.
            if seen_mark {
                return None;
            }
        } else if c == decimal_mark {
            if seen_mark {
                return None;
            }
            seen_mark = true;
            out.push('.');
        } else {
            out.push(c);
        }
    }
    Some(out)
}

/// Last-separator heuristic over a body that may contain `.` and `,`.
///
/// Both present: the later one is the decimal mark. One present once with
/// at most two trailing digits: decimal mark. Otherwise: grouping (the
/// other character becomes the nominal mark). Returns `None` only for the
/// degenerate all-separator case.
fn infer_decimal_mark(body: &str) -> Option<char> {
    let last_dot = body.rfind('.');
    let last_comma = body.rfind(',');
    match (last_dot, last_comma) {
        (Some(d), Some(c)) => Some(if d > c { '.' } else { ',' }),
        (Some(_), None) => Some(lone_separator_role(body, '.')),
        (None, Some(_)) => Some(lone_separator_role(body, ',')),
        (None, None) => {
            if body.chars().all(|c| c.is_ascii_digit()) {
                Some('.')
            } else {
                None
            }
        }
    }
}

fn lone_separator_role(body: &str, sep: char) -> char {
    let other = if sep == '.' { ',' } else { '.' };
    let occurrences = body.matches(sep).count();
    let trailing = body.rsplit(sep).next().map_or(0, str::len);
    if occurrences == 1 && trailing <= 2 {
        sep
    } else {
        // Repeated, or followed by 3+ digits: grouping.
        other
    }
}
