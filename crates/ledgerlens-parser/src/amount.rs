//! Posting-amount expression parsing.
//!
//! Grammar handled here, loosely:
//!
//! ```text
//! [sign] [commodity] number [commodity] [@|@@ cost-amount] [=|==|:= assertion-amount]
//! ```
//!
//! with quoted commodities (`100 "FOO BAR"`), locale-dependent `.`/`,`
//! notation, scientific notation, and bare balance assertions (`= $100`).
//! All failure is signaled by `None`; nothing in this module panics on any
//! input.

use ledgerlens_core::{CostBasis, NumberFormatContext, PostingAmount};
use rust_decimal::Decimal;
use std::str::FromStr;

/// Parse one posting-amount expression.
///
/// Returns `None` for empty/whitespace-only or malformed input.
///
/// ```
/// use ledgerlens_core::NumberFormatContext;
/// use ledgerlens_parser::parse_posting_amount;
/// use rust_decimal_macros::dec;
///
/// let ctx = NumberFormatContext::new();
/// let amount = parse_posting_amount("$-1,234.56", &ctx).unwrap();
/// assert_eq!(amount.number, dec!(-1234.56));
/// assert_eq!(amount.commodity, "$");
/// assert_eq!(amount.precision, 2);
/// ```
#[must_use]
pub fn parse_posting_amount(text: &str, ctx: &NumberFormatContext) -> Option<PostingAmount> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    // A posting that is nothing but a balance assertion (`= $100`, `:= 0`)
    // pins a running balance; it carries no value of its own.
    if trimmed.starts_with('=') || trimmed.starts_with(":=") {
        return Some(PostingAmount::assertion_only());
    }

    // A trailing assertion clause matters only for its presence; its amount
    // plays no part in cost or value extraction.
    let remainder = split_off_assertion(trimmed);

    let (main_text, cost_clause) = split_cost(remainder);
    let (number, commodity, precision) = parse_simple_amount(main_text, ctx)?;

    let mut amount = PostingAmount::new(number, commodity, precision);
    if let Some((cost_text, total)) = cost_clause {
        // Half-typed cost clauses (`10 AAPL @`) are routine in a live
        // buffer; keep the main amount and drop the cost.
        if let Some((cost_number, cost_commodity, cost_precision)) =
            parse_simple_amount(cost_text, ctx)
        {
            let basis = if total {
                CostBasis::total(cost_number, cost_commodity, cost_precision)
            } else {
                CostBasis::unit(cost_number, cost_commodity, cost_precision)
            };
            amount = amount.with_cost(basis);
        }
    }
    Some(amount)
}

/// Truncate `text` before a trailing balance-assertion clause:
/// whitespace, then `=`, `==`, `=*`, `==*` or `:=`, then whitespace.
fn split_off_assertion(text: &str) -> &str {
    let mut prev_ws = false;
    for (i, c) in text.char_indices() {
        if prev_ws && (c == '=' || c == ':') {
            if let Some(op_len) = assertion_op_len(&text[i..]) {
                if text[i + op_len..]
                    .chars()
                    .next()
                    .is_some_and(char::is_whitespace)
                {
                    return text[..i].trim_end();
                }
            }
        }
        prev_ws = c.is_whitespace();
    }
    text
}

/// Length of an assertion operator at the start of `s`, if one is there.
fn assertion_op_len(s: &str) -> Option<usize> {
    let after_colon = s.strip_prefix(':').unwrap_or(s);
    let colon = s.len() - after_colon.len();
    let after_eq = after_colon
        .strip_prefix("==")
        .or_else(|| after_colon.strip_prefix('='))?;
    let eq = after_colon.len() - after_eq.len();
    let star = usize::from(after_eq.starts_with('*'));
    Some(colon + eq + star)
}

/// Split on the first cost operator. `@@` is a total price, `@` a unit
/// price.
fn split_cost(text: &str) -> (&str, Option<(&str, bool)>) {
    match text.find('@') {
        Some(i) => {
            let total = text[i..].starts_with("@@");
            let cost_text = &text[i + if total { 2 } else { 1 }..];
            (text[..i].trim_end(), Some((cost_text, total)))
        }
        None => (text, None),
    }
}

/// Parse a sign + commodity + number expression into
/// `(value, commodity, precision)`. Shared by the main amount and the cost
/// amount.
fn parse_simple_amount(
    text: &str,
    ctx: &NumberFormatContext,
) -> Option<(Decimal, String, u32)> {
    let mut s = text.trim();
    if s.is_empty() {
        return None;
    }

    let mut negative = false;
    if let Some(rest) = s.strip_prefix('-') {
        negative = true;
        s = rest.trim_start();
    } else if let Some(rest) = s.strip_prefix('+') {
        s = rest.trim_start();
    }

    // A quoted commodity overrides bare prefix/suffix symbol detection.
    let mut commodity: Option<String> = None;
    let without_quotes;
    if let Some(open) = s.find('"') {
        let close = s[open + 1..].find('"')?;
        commodity = Some(s[open + 1..open + 1 + close].to_string());
        without_quotes = format!("{} {}", &s[..open], &s[open + close + 2..]);
    } else {
        without_quotes = s.to_string();
    }
    let mut body = without_quotes.trim().to_string();

    if commodity.is_none() {
        if let Some((sym, rest)) = split_prefix_commodity(&body) {
            commodity = Some(sym);
            body = rest.trim_start().to_string();
        }
    }

    // The sign may sit between a prefix symbol and the digits (`$-100`).
    if let Some(rest) = body.strip_prefix('-') {
        negative = !negative;
        body = rest.trim_start().to_string();
    } else if let Some(rest) = body.strip_prefix('+') {
        body = rest.trim_start().to_string();
    }

    let split = numeric_end(&body);
    let (num_text, rest) = body.split_at(split);
    let num_text = num_text.trim_end();
    let suffix = rest.trim();

    if !suffix.is_empty() {
        if commodity.is_some() {
            // Prefix (or quoted) commodity wins on conflict; trailing text
            // is ignored.
        } else {
            commodity = Some(suffix_commodity(suffix)?);
        }
    }

    let (value, precision) = parse_number(num_text, commodity.as_deref(), ctx)?;
    let value = if negative { -value } else { value };
    Some((value, commodity.unwrap_or_default(), precision))
}

/// Split a leading commodity (single symbol char or alphabetic run) off the
/// numeric body. Runs that are really a scientific-notation exponent marker
/// are not commodities.
fn split_prefix_commodity(s: &str) -> Option<(String, &str)> {
    let first = s.chars().next()?;
    if is_symbol_char(first) {
        let end = first.len_utf8();
        return Some((s[..end].to_string(), &s[end..]));
    }
    if first.is_alphabetic() {
        let end = s
            .char_indices()
            .find(|(_, c)| !c.is_alphabetic())
            .map_or(s.len(), |(i, _)| i);
        if end == s.len() {
            return None;
        }
        let run = &s[..end];
        if looks_like_exponent(run, &s[end..]) {
            return None;
        }
        return Some((run.to_string(), &s[end..]));
    }
    None
}

fn looks_like_exponent(run: &str, rest: &str) -> bool {
    (run == "e" || run == "E") && rest.chars().next().is_some_and(|c| c.is_ascii_digit())
}

/// A trailing commodity: an alphabetic run or one symbol char, consuming
/// the whole remainder.
fn suffix_commodity(s: &str) -> Option<String> {
    if !s.is_empty() && s.chars().all(char::is_alphabetic) {
        return Some(s.to_string());
    }
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if is_symbol_char(c) => Some(c.to_string()),
        _ => None,
    }
}

/// Characters that can stand alone as a currency symbol.
fn is_symbol_char(c: char) -> bool {
    !c.is_alphanumeric()
        && !c.is_whitespace()
        && !matches!(
            c,
            '+' | '-' | '.' | ',' | '"' | ';' | '@' | '=' | ':' | '(' | ')' | '[' | ']' | '*'
                | '!' | '#'
        )
}

/// Byte index where the numeric body (digits, separators, one trailing
/// exponent) ends.
fn numeric_end(s: &str) -> usize {
    let mut end = 0;
    let mut seen_digit = false;
    let mut iter = s.char_indices().peekable();
    while let Some(&(i, c)) = iter.peek() {
        if c.is_ascii_digit() || c == '.' || c == ',' {
            seen_digit |= c.is_ascii_digit();
            iter.next();
            end = i + c.len_utf8();
        } else if (c == 'e' || c == 'E') && seen_digit && exponent_follows(&s[i + 1..]) {
            iter.next();
            end = i + 1;
            if let Some(&(j, sc)) = iter.peek() {
                if sc == '+' || sc == '-' {
                    iter.next();
                    end = j + 1;
                }
            }
            while let Some(&(j, d)) = iter.peek() {
                if d.is_ascii_digit() {
                    iter.next();
                    end = j + 1;
                } else {
                    break;
                }
            }
            break;
        } else {
            break;
        }
    }
    end
}

fn exponent_follows(rest: &str) -> bool {
    let rest = rest.strip_prefix(['+', '-']).unwrap_or(rest);
    rest.chars().next().is_some_and(|c| c.is_ascii_digit())
}

/// Parse the numeric body into `(value, literal fractional-digit count)`.
fn parse_number(
    text: &str,
    commodity: Option<&str>,
    ctx: &NumberFormatContext,
) -> Option<(Decimal, u32)> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    // Split off a scientific-notation exponent.
    let (mantissa, exponent) = match text.rfind(['e', 'E']) {
        Some(i) if i > 0 => {
            let exp_text = &text[i + 1..];
            let digits = exp_text.strip_prefix(['+', '-']).unwrap_or(exp_text);
            if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
                let exp: i64 = exp_text.parse().ok()?;
                (&text[..i], exp)
            } else {
                (text, 0)
            }
        }
        _ => (text, 0),
    };
    // Decimal can only shift 28 places; anything beyond is unrepresentable.
    if exponent.unsigned_abs() > 28 {
        return None;
    }

    let (decimal_mark, group_separator) = separators_for(mantissa, commodity, ctx);

    let mut normalized = String::with_capacity(mantissa.len() + 1);
    let mut precision = 0u32;
    let mut past_mark = false;
    for c in mantissa.chars() {
        if Some(c) == group_separator && c != decimal_mark {
            if past_mark {
                return None;
            }
            continue;
        }
        if c == decimal_mark {
            if past_mark {
                return None;
            }
            past_mark = true;
            normalized.push('.');
        } else if c.is_ascii_digit() {
            if past_mark {
                precision += 1;
            }
            normalized.push(c);
        } else {
            return None;
        }
    }
    if normalized.is_empty() || normalized == "." {
        return None;
    }

    let value = if exponent == 0 {
        Decimal::from_str(&normalized).ok()?
    } else {
        Decimal::from_scientific(&format!("{normalized}e{exponent}")).ok()?
    };
    Some((value, precision))
}

/// Decide which of `.`/`,` is the decimal mark.
///
/// A configured commodity format wins. Otherwise: when both appear, the one
/// occurring last is the decimal mark. A lone separator appearing once is
/// taken as the decimal mark (the comma-as-decimal defensive default);
/// appearing more than once it can only be a group separator.
fn separators_for(
    mantissa: &str,
    commodity: Option<&str>,
    ctx: &NumberFormatContext,
) -> (char, Option<char>) {
    if let Some(format) = commodity.and_then(|c| ctx.format_for(c)) {
        return (format.decimal_mark, format.group_separator);
    }
    match (mantissa.rfind('.'), mantissa.rfind(',')) {
        (Some(dot), Some(comma)) => {
            if dot > comma {
                ('.', Some(','))
            } else {
                (',', Some('.'))
            }
        }
        (Some(_), None) => {
            if mantissa.matches('.').count() > 1 {
                (',', Some('.'))
            } else {
                ('.', Some(','))
            }
        }
        (None, Some(_)) => {
            if mantissa.matches(',').count() > 1 {
                ('.', Some(','))
            } else {
                (',', Some('.'))
            }
        }
        (None, None) => ('.', Some(',')),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerlens_core::CommodityFormat;
    use rust_decimal_macros::dec;

    fn parse(text: &str) -> Option<PostingAmount> {
        parse_posting_amount(text, &NumberFormatContext::new())
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(parse(""), None);
        assert_eq!(parse("   "), None);
    }

    #[test]
    fn test_plain_amounts() {
        let a = parse("100").unwrap();
        assert_eq!((a.number, a.commodity.as_str(), a.precision), (dec!(100), "", 0));

        let a = parse("-42.50").unwrap();
        assert_eq!((a.number, a.precision), (dec!(-42.50), 2));
    }

    #[test]
    fn test_prefix_symbol() {
        let a = parse("$100").unwrap();
        assert_eq!((a.number, a.commodity.as_str()), (dec!(100), "$"));

        let a = parse("-$100").unwrap();
        assert_eq!(a.number, dec!(-100));

        let a = parse("$-100").unwrap();
        assert_eq!(a.number, dec!(-100));
        assert_eq!(a.commodity, "$");
    }

    #[test]
    fn test_suffix_commodity() {
        let a = parse("100 USD").unwrap();
        assert_eq!(a.commodity, "USD");

        let a = parse("1.5 AAPL").unwrap();
        assert_eq!((a.number, a.precision), (dec!(1.5), 1));
    }

    #[test]
    fn test_prefix_wins_over_suffix() {
        let a = parse("$100 USD").unwrap();
        assert_eq!(a.commodity, "$");
    }

    #[test]
    fn test_quoted_commodity() {
        let a = parse("100 \"Vanguard 500\"").unwrap();
        assert_eq!(a.commodity, "Vanguard 500");
        assert_eq!(a.number, dec!(100));
    }

    #[test]
    fn test_unclosed_quote_rejected() {
        assert_eq!(parse("100 \"Vanguard"), None);
    }

    #[test]
    fn test_group_separators() {
        let a = parse("1,234.56").unwrap();
        assert_eq!((a.number, a.precision), (dec!(1234.56), 2));

        let a = parse("1.234,56").unwrap();
        assert_eq!((a.number, a.precision), (dec!(1234.56), 2));

        let a = parse("1,234,567").unwrap();
        assert_eq!((a.number, a.precision), (dec!(1234567), 0));
    }

    #[test]
    fn test_lone_comma_is_decimal_mark() {
        // Defensive default for a single ambiguous separator.
        let a = parse("1,5").unwrap();
        assert_eq!((a.number, a.precision), (dec!(1.5), 1));

        let a = parse("1,234").unwrap();
        assert_eq!((a.number, a.precision), (dec!(1.234), 3));
    }

    #[test]
    fn test_commodity_format_overrides_heuristic() {
        let mut ctx = NumberFormatContext::new();
        ctx.insert(
            "EUR",
            CommodityFormat {
                decimal_mark: ',',
                group_separator: Some('.'),
                symbol_before: false,
            },
        );
        let a = parse_posting_amount("1.234,50 EUR", &ctx).unwrap();
        assert_eq!((a.number, a.precision), (dec!(1234.50), 2));
    }

    #[test]
    fn test_scientific_notation() {
        let a = parse("1e3").unwrap();
        assert_eq!((a.number, a.precision), (dec!(1000), 0));

        let a = parse("1.5e2 USD").unwrap();
        assert_eq!(a.number, dec!(150));
        assert_eq!(a.precision, 1); // digits as written in the mantissa
        assert_eq!(a.commodity, "USD");

        let a = parse("2E-2").unwrap();
        assert_eq!(a.number, dec!(0.02));
    }

    #[test]
    fn test_exponent_overflow_guard() {
        assert_eq!(parse("1e400"), None);
        assert_eq!(parse("1e-400"), None);
        assert_eq!(parse("1e29"), None);
    }

    #[test]
    fn test_unit_cost() {
        let a = parse("10 AAPL @ $150").unwrap();
        assert_eq!(a.number, dec!(10));
        assert_eq!(a.commodity, "AAPL");
        let cost = a.cost.unwrap();
        assert_eq!(cost.number, dec!(150));
        assert_eq!(cost.commodity, "$");
        assert!(!cost.total);
        // Precision is the fractional-digit count as written: `$150` has
        // none, `$150.00` has two.
        assert_eq!(cost.precision, 0);
        assert_eq!(parse("1 AAPL @ $150.00").unwrap().cost.unwrap().precision, 2);
    }

    #[test]
    fn test_total_cost() {
        let a = parse("-2 BTC @@ 90000 USD").unwrap();
        assert_eq!(a.number, dec!(-2));
        let cost = a.cost.unwrap();
        assert!(cost.total);
        assert_eq!(cost.number, dec!(90000));
        assert_eq!(cost.commodity, "USD");
    }

    #[test]
    fn test_cost_sign_discarded() {
        let a = parse("10 AAPL @ $-150").unwrap();
        assert_eq!(a.cost.unwrap().number, dec!(150));
    }

    #[test]
    fn test_half_typed_cost_keeps_main_amount() {
        let a = parse("10 AAPL @").unwrap();
        assert_eq!(a.number, dec!(10));
        assert!(a.cost.is_none());
    }

    #[test]
    fn test_assertion_only() {
        for text in ["= $100", "== 0", "=* $5", "==* $5", ":= 100", "="] {
            let a = parse(text).unwrap();
            assert!(a.assertion_only, "{text}");
            assert!(a.number.is_zero());
            assert!(a.commodity.is_empty());
        }
    }

    #[test]
    fn test_trailing_assertion_stripped() {
        let a = parse("$100 = $500").unwrap();
        assert!(!a.assertion_only);
        assert_eq!(a.number, dec!(100));

        let a = parse("100 USD == 500 USD").unwrap();
        assert_eq!(a.number, dec!(100));
        assert_eq!(a.commodity, "USD");
    }

    #[test]
    fn test_amount_with_cost_and_assertion() {
        let a = parse("10 AAPL @ $150 = 20 AAPL").unwrap();
        assert_eq!(a.number, dec!(10));
        assert_eq!(a.cost.unwrap().number, dec!(150));
    }

    #[test]
    fn test_garbage_rejected() {
        assert_eq!(parse("abc"), None);
        assert_eq!(parse("$"), None);
        assert_eq!(parse("."), None);
        assert_eq!(parse("1,2.3,4"), None);
        assert_eq!(parse("100 !!"), None);
    }
}
