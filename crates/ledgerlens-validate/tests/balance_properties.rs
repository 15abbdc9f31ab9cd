//! End-to-end balance checks over parsed document text, plus property
//! tests for the balancing rules.

use ledgerlens_core::NumberFormatContext;
use ledgerlens_parser::extract_transactions;
use ledgerlens_validate::{check_balance, BalanceError, PostingGroup};
use proptest::prelude::*;
use rust_decimal::Decimal;

fn check(text: &str) -> ledgerlens_validate::BalanceReport {
    let ctx = NumberFormatContext::new();
    let txns = extract_transactions(text, &ctx);
    assert_eq!(txns.len(), 1, "expected exactly one transaction in {text:?}");
    check_balance(&txns[0], &ctx)
}

#[test]
fn explicit_zero_sum_balances() {
    let report = check(
        "2024-03-01 Groceries\n    Expenses:Food  $42.17\n    Assets:Checking  $-42.17\n",
    );
    assert!(report.is_balanced());
}

#[test]
fn off_by_one_cent_reported() {
    let report = check(
        "2024-03-01 Groceries\n    Expenses:Food  $42.17\n    Assets:Checking  $-42.16\n",
    );
    let errors = report.errors();
    assert_eq!(errors.len(), 1);
    match &errors[0] {
        BalanceError::Imbalanced {
            formatted, group, ..
        } => {
            assert_eq!(formatted, "$0.01");
            assert_eq!(*group, PostingGroup::Real);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn elided_posting_always_balances() {
    let report = check("2024-03-01 Rent\n    Expenses:Rent  $1200.00\n    Assets:Checking\n");
    assert!(report.is_balanced());
}

#[test]
fn two_elided_postings_are_ambiguous() {
    let report = check(
        "2024-03-01 Split\n    Expenses:Rent  $1200.00\n    Assets:Checking\n    Liabilities:Loan\n",
    );
    assert_eq!(
        report.errors(),
        &[BalanceError::MultipleInferred {
            group: PostingGroup::Real
        }]
    );
}

#[test]
fn cost_notation_balances_across_commodities() {
    let report = check(
        "2024-03-01 Buy shares\n    Assets:Broker  10 AAPL @ $150\n    Assets:Checking  $-1500\n",
    );
    assert!(report.is_balanced());
}

#[test]
fn total_cost_notation_balances() {
    let report = check(
        "2024-03-01 Buy crypto\n    Assets:Wallet  0.5 BTC @@ 45000 USD\n    Assets:Checking  -45000 USD\n",
    );
    assert!(report.is_balanced());
}

#[test]
fn unbalanced_virtual_postings_never_change_the_outcome() {
    let balanced = check(
        "2024-03-01 Budget\n    Expenses:Food  $50\n    Assets:Cash  $-50\n    (Budget:Food)  $-50\n",
    );
    assert!(balanced.is_balanced());

    let unbalanced = check(
        "2024-03-01 Budget\n    Expenses:Food  $50\n    Assets:Cash  $-40\n    (Budget:Food)  $-10\n",
    );
    assert!(!unbalanced.is_balanced());
}

#[test]
fn balanced_virtual_group_is_independent() {
    let report = check(
        "2024-03-01 Save\n    Expenses:Food  $50\n    Assets:Cash  $-50\n    [Goals:Vacation]  $25\n    [Assets:Earmarked]  $-25\n",
    );
    assert!(report.is_balanced());
}

#[test]
fn one_elided_posting_absorbs_all_commodities() {
    let report = check(
        "2024-03-01 Mixed\n    Expenses:Food  $50\n    Expenses:Travel  100 EUR\n    Assets:Cash\n",
    );
    assert!(report.is_balanced());
}

#[test]
fn balance_assertion_only_posting_is_ignored() {
    let report = check(
        "2024-03-01 Check\n    Expenses:Food  $50\n    Assets:Cash  $-50\n    Assets:Cash  = $950\n",
    );
    assert!(report.is_balanced());
}

#[test]
fn both_groups_can_fail_at_once() {
    let report = check(
        "2024-03-01 Doubly wrong\n    Expenses:Food  $50\n    Assets:Cash  $-40\n    [Goals:A]  $5\n",
    );
    let groups: Vec<PostingGroup> = report
        .errors()
        .iter()
        .map(|e| match e {
            BalanceError::Imbalanced { group, .. }
            | BalanceError::MultipleInferred { group } => *group,
        })
        .collect();
    assert_eq!(groups, vec![PostingGroup::Real, PostingGroup::BalancedVirtual]);
}

proptest! {
    /// Any amount paired with its negation balances.
    #[test]
    fn amount_and_negation_balance(mantissa in -1_000_000_000_i64..1_000_000_000, precision in 0u32..=4) {
        let value = Decimal::new(mantissa, precision);
        let text = format!(
            "2024-01-01 Pair\n    A:One  {v:.p$} USD\n    A:Two  {n:.p$} USD\n",
            v = value,
            n = -value,
            p = precision as usize,
        );
        prop_assert!(check(&text).is_balanced());
    }

    /// Splitting an amount across two postings against its negation balances.
    #[test]
    fn three_way_split_balances(total in -100_000_i64..100_000, cut in 0i64..100_000) {
        let total = Decimal::new(total, 2);
        let part = Decimal::new(cut, 2).min(total.abs());
        let text = format!(
            "2024-01-01 Split\n    A:One  {a:.2} USD\n    A:Two  {b:.2} USD\n    A:Three  {c:.2} USD\n",
            a = part,
            b = total - part,
            c = -total,
        );
        prop_assert!(check(&text).is_balanced());
    }

    /// A transaction whose single elided posting closes the group balances
    /// regardless of the explicit amounts.
    #[test]
    fn elided_closure_is_unconditional(mantissa in -1_000_000_i64..1_000_000, precision in 0u32..=3) {
        let value = Decimal::new(mantissa, precision);
        let text = format!(
            "2024-01-01 Open\n    A:One  {v:.p$} USD\n    A:Rest\n",
            v = value,
            p = precision as usize,
        );
        prop_assert!(check(&text).is_balanced());
    }
}
