//! Property tests for tabular amount-cell parsing.

use ledgerlens_importer::{parse_amount_string, DecimalSeparatorHint};
use proptest::prelude::*;
use rust_decimal::Decimal;

const HINTS: [DecimalSeparatorHint; 3] = [
    DecimalSeparatorHint::Auto,
    DecimalSeparatorHint::Comma,
    DecimalSeparatorHint::Period,
];

proptest! {
    /// The cell parser never panics, whatever the input or hint.
    #[test]
    fn never_panics(cell in "\\PC{0,60}") {
        for hint in HINTS {
            let _ = parse_amount_string(&cell, hint);
        }
    }

    /// A plainly formatted decimal with at most two fractional digits
    /// parses back to itself, in both period and comma notation under the
    /// matching hint, and in either notation under `Auto` (two trailing
    /// digits resolve the lone separator as the decimal mark).
    #[test]
    fn plain_decimal_round_trips(mantissa in -1_000_000_000_i64..1_000_000_000, scale in 0u32..=2) {
        let value = Decimal::new(mantissa, scale);
        let dotted = format!("{value:.prec$}", prec = scale as usize);
        let commaed = dotted.replace('.', ",");

        prop_assert_eq!(parse_amount_string(&dotted, DecimalSeparatorHint::Auto), Some(value));
        prop_assert_eq!(parse_amount_string(&dotted, DecimalSeparatorHint::Period), Some(value));
        prop_assert_eq!(parse_amount_string(&commaed, DecimalSeparatorHint::Auto), Some(value));
        prop_assert_eq!(parse_amount_string(&commaed, DecimalSeparatorHint::Comma), Some(value));
    }

    /// Wrapping a positive cell in accounting parentheses negates it.
    #[test]
    fn parentheses_negate(mantissa in 1_i64..1_000_000_000, scale in 0u32..=2) {
        let value = Decimal::new(mantissa, scale);
        let plain = format!("{value:.prec$}", prec = scale as usize);
        let wrapped = format!("({plain})");
        prop_assert_eq!(
            parse_amount_string(&wrapped, DecimalSeparatorHint::Auto),
            Some(-value)
        );
    }

    /// Currency symbols and codes around the number never change the value.
    #[test]
    fn symbol_noise_is_ignored(mantissa in -1_000_000_i64..1_000_000, scale in 0u32..=2) {
        let value = Decimal::new(mantissa, scale);
        let plain = format!("{value:.prec$}", prec = scale as usize);
        let bare = parse_amount_string(&plain, DecimalSeparatorHint::Auto);
        prop_assert_eq!(parse_amount_string(&format!("${plain}"), DecimalSeparatorHint::Auto), bare);
        prop_assert_eq!(parse_amount_string(&format!("{plain} kr"), DecimalSeparatorHint::Auto), bare);
    }
}
