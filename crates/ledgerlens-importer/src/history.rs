//! Payee-to-account usage history.
//!
//! Supplied by the host's journal-index collaborator as plain maps; the
//! resolver only ever reads it. [`PayeeAccountHistory::from_raw`] is the
//! defensive conversion boundary: host-supplied data may contain empty
//! keys, empty account sets, or nonsense usage counts, and none of that may
//! reach the resolver.

use std::collections::{BTreeSet, HashMap};
use tracing::warn;

/// Read-only snapshot of which accounts past transactions with a given
/// payee were booked to, and how often each pairing occurred.
///
/// Payee keys are stored lowercased; lookups are case-insensitive.
#[derive(Debug, Clone, Default)]
pub struct PayeeAccountHistory {
    payee_accounts: HashMap<String, BTreeSet<String>>,
    pair_usage: HashMap<(String, String), u64>,
}

impl PayeeAccountHistory {
    /// Convert host-supplied raw maps, dropping malformed entries.
    ///
    /// `raw_usage` is keyed `"payee::account"`. Dropped: empty payee or
    /// account strings, payees with no accounts, usage keys without the
    /// `::` separator, and usage counts that are negative or not finite.
    #[must_use]
    pub fn from_raw(
        raw_accounts: HashMap<String, Vec<String>>,
        raw_usage: HashMap<String, f64>,
    ) -> Self {
        let mut payee_accounts: HashMap<String, BTreeSet<String>> = HashMap::new();
        for (payee, accounts) in raw_accounts {
            let payee = payee.trim().to_lowercase();
            if payee.is_empty() {
                continue;
            }
            let accounts: BTreeSet<String> = accounts
                .into_iter()
                .map(|a| a.trim().to_string())
                .filter(|a| !a.is_empty())
                .collect();
            if accounts.is_empty() {
                continue;
            }
            payee_accounts.entry(payee).or_default().extend(accounts);
        }

        let mut pair_usage = HashMap::new();
        for (key, count) in raw_usage {
            if !count.is_finite() || count < 0.0 {
                warn!(key, count, "dropping malformed usage count");
                continue;
            }
            let Some((payee, account)) = key.split_once("::") else {
                warn!(key, "dropping usage entry without payee::account key");
                continue;
            };
            let payee = payee.trim().to_lowercase();
            let account = account.trim().to_string();
            if payee.is_empty() || account.is_empty() {
                continue;
            }
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            pair_usage.insert((payee, account), count as u64);
        }

        Self {
            payee_accounts,
            pair_usage,
        }
    }

    /// The accounts recorded for `payee` (already-lowercased key),
    /// alphabetically ordered.
    #[must_use]
    pub fn accounts_for(&self, payee: &str) -> Option<&BTreeSet<String>> {
        self.payee_accounts.get(payee)
    }

    /// How often `payee` was booked to `account`.
    #[must_use]
    pub fn usage(&self, payee: &str, account: &str) -> u64 {
        self.pair_usage
            .get(&(payee.to_string(), account.to_string()))
            .copied()
            .unwrap_or(0)
    }

    /// All known payees (lowercased), for containment and fuzzy matching.
    pub fn payees(&self) -> impl Iterator<Item = &str> {
        self.payee_accounts.keys().map(String::as_str)
    }

    /// Whether any history was recorded at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.payee_accounts.is_empty()
    }
}
