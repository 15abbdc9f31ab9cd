//! Layered account resolution.
//!
//! Maps a row's `(description, category, amount)` to a ledger account by
//! trying strategies in strict priority order, first confident match wins:
//! payee history, category mapping, merchant regex patterns, amount sign,
//! configured default. Each strategy stamps its [`Source`] and a confidence
//! in `0..=1` on the result so the caller can decide what needs review.

use crate::pattern_safety;
use crate::{ImportOptions, PayeeAccountHistory};
use regex::{Regex, RegexBuilder};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::warn;

/// Which strategy produced a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// Payee history lookup.
    History,
    /// Bank-category mapping.
    Category,
    /// Merchant regex pattern.
    Pattern,
    /// Amount-sign fallback.
    Sign,
    /// Configured default, nothing matched.
    Default,
}

/// One resolved account with its provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountResolution {
    /// The resolved ledger account.
    pub account: String,
    /// Strategy confidence in `0..=1`.
    pub confidence: f64,
    /// The strategy that matched.
    pub source: Source,
}

/// Fuzzy payee matching, injected by the host (the core ships none).
pub trait FuzzyMatch {
    /// Similarity of `candidate` to `query` in `0..=1`; `0` means no match.
    fn score(&self, candidate: &str, query: &str) -> f64;
}

/// Built-in merchant patterns, tried after user patterns. Matched against
/// the uppercased description.
const BUILTIN_PATTERNS: &[(&str, &str)] = &[
    ("AMAZON", "expenses:shopping:amazon"),
    ("WALMART|TARGET|COSTCO", "expenses:shopping"),
    ("WHOLE ?FOODS|TRADER JOE|SAFEWAY|KROGER|ALDI|GROCER", "expenses:food:groceries"),
    ("STARBUCKS|DUNKIN|COFFEE", "expenses:food:coffee"),
    ("MCDONALD|BURGER|CHIPOTLE|RESTAURANT|PIZZA", "expenses:food:restaurants"),
    ("UBER|LYFT|TAXI", "expenses:transport:rideshare"),
    ("SHELL|EXXON|CHEVRON|FUEL|GAS STATION", "expenses:transport:fuel"),
    ("NETFLIX|SPOTIFY|HULU|DISNEY\\+", "expenses:subscriptions"),
    ("PAYROLL|SALARY|DIRECT DEP", "income:salary"),
    ("INTEREST", "income:interest"),
    ("ATM|CASH WITHDRAWAL", "assets:cash"),
];

const CONFIDENCE_HISTORY_EXACT: f64 = 0.95;
const CONFIDENCE_HISTORY_PARTIAL: f64 = 0.85;
const CONFIDENCE_CATEGORY_DIRECT: f64 = 0.9;
const CONFIDENCE_CATEGORY_PARTIAL: f64 = 0.75;
const CONFIDENCE_PATTERN_USER: f64 = 0.85;
const CONFIDENCE_PATTERN_BUILTIN: f64 = 0.75;
const CONFIDENCE_SIGN: f64 = 0.5;

/// Resolutions below this confidence are flagged for review.
const REVIEW_THRESHOLD: f64 = 0.7;

/// Bound on the category partial-match cache.
const CATEGORY_CACHE_CAPACITY: usize = 100;

/// Bounded LRU over normalized category keys. Negative results are cached
/// too; repeated unknown categories would otherwise rescan the whole
/// mapping per row.
#[derive(Debug, Default)]
struct CategoryCache {
    entries: VecDeque<(String, Option<String>)>,
}

impl CategoryCache {
    fn get(&mut self, key: &str) -> Option<Option<String>> {
        let pos = self.entries.iter().position(|(k, _)| k == key)?;
        let entry = self.entries.remove(pos)?;
        let value = entry.1.clone();
        self.entries.push_front(entry);
        Some(value)
    }

    fn put(&mut self, key: String, value: Option<String>) {
        if self.entries.len() >= CATEGORY_CACHE_CAPACITY {
            self.entries.pop_back();
        }
        self.entries.push_front((key, value));
    }
}

/// The strategy pipeline. Construct once per import run.
pub struct AccountResolver {
    options: ImportOptions,
    history: Option<PayeeAccountHistory>,
    fuzzy: Option<Box<dyn FuzzyMatch>>,
    patterns: Vec<(Regex, String, f64)>,
    rejected_warnings: Vec<String>,
    category_cache: CategoryCache,
}

impl AccountResolver {
    /// Build the pipeline: validate and compile user patterns, then append
    /// the built-ins. Unsafe or uncompilable user patterns are dropped with
    /// a warning; they never abort the import.
    #[must_use]
    pub fn new(
        options: ImportOptions,
        history: Option<PayeeAccountHistory>,
        fuzzy: Option<Box<dyn FuzzyMatch>>,
    ) -> Self {
        let mut patterns = Vec::new();
        let mut rejected_warnings = Vec::new();

        for (pattern, account) in &options.merchant_patterns {
            if let Err(rejection) = pattern_safety::validate(pattern) {
                warn!(pattern, %rejection, "skipping unsafe merchant pattern");
                rejected_warnings.push(format!("pattern '{pattern}' skipped: {rejection}"));
                continue;
            }
            match compile(pattern) {
                Ok(regex) => patterns.push((regex, account.clone(), CONFIDENCE_PATTERN_USER)),
                Err(err) => {
                    warn!(pattern, %err, "merchant pattern does not compile");
                    rejected_warnings.push(format!("pattern '{pattern}' skipped: {err}"));
                }
            }
        }
        for (pattern, account) in BUILTIN_PATTERNS {
            match compile(pattern) {
                Ok(regex) => {
                    patterns.push((regex, (*account).to_string(), CONFIDENCE_PATTERN_BUILTIN));
                }
                Err(err) => warn!(pattern, %err, "built-in pattern does not compile"),
            }
        }

        Self {
            options,
            history,
            fuzzy,
            patterns,
            rejected_warnings,
            category_cache: CategoryCache::default(),
        }
    }

    /// Warnings accumulated during construction, drained.
    pub fn take_warnings(&mut self) -> Vec<String> {
        std::mem::take(&mut self.rejected_warnings)
    }

    /// Resolve one row. Never fails; the worst case is the configured
    /// default at confidence zero.
    pub fn resolve(
        &mut self,
        description: &str,
        category: Option<&str>,
        amount: Option<Decimal>,
    ) -> AccountResolution {
        if let Some(resolution) = self.from_history(description) {
            return resolution;
        }
        if let Some(resolution) = self.from_category(category) {
            return resolution;
        }
        if let Some(resolution) = self.from_patterns(description) {
            return resolution;
        }
        if let Some(resolution) = self.from_sign(amount) {
            return resolution;
        }
        AccountResolution {
            account: self.options.default_debit_account.clone(),
            confidence: 0.0,
            source: Source::Default,
        }
    }

    /// Whether a resolution should be double-checked by a human before the
    /// generated text is committed.
    #[must_use]
    pub fn needs_review(&self, resolution: &AccountResolution) -> bool {
        resolution.confidence < REVIEW_THRESHOLD
            || resolution.source == Source::Default
            || resolution
                .account
                .starts_with(&self.options.account_todo_prefix)
            || resolution.account.to_lowercase().contains("unknown")
    }

    fn from_history(&self, description: &str) -> Option<AccountResolution> {
        if !self.options.use_journal_history {
            return None;
        }
        let history = self.history.as_ref()?;
        let payee = description.trim().to_lowercase();
        if payee.is_empty() || history.is_empty() {
            return None;
        }

        if let Some(accounts) = history.accounts_for(&payee) {
            return Some(self.pick_account(history, &payee, accounts, CONFIDENCE_HISTORY_EXACT));
        }

        // Containment, either direction.
        let contained = history
            .payees()
            .filter(|p| p.contains(&payee) || payee.contains(*p))
            .min_by_key(|p| (p.len(), p.to_string()));
        if let Some(candidate) = contained {
            let accounts = history.accounts_for(candidate)?;
            return Some(self.pick_account(
                history,
                candidate,
                accounts,
                CONFIDENCE_HISTORY_PARTIAL,
            ));
        }

        let fuzzy = self.fuzzy.as_ref()?;
        let best = history
            .payees()
            .map(|p| (p, fuzzy.score(p, &payee)))
            .filter(|(_, score)| *score > 0.0)
            .max_by(|a, b| a.1.total_cmp(&b.1))?;
        let accounts = history.accounts_for(best.0)?;
        Some(self.pick_account(history, best.0, accounts, CONFIDENCE_HISTORY_PARTIAL))
    }

    /// Highest usage count wins; the set's alphabetical order breaks ties.
    fn pick_account(
        &self,
        history: &PayeeAccountHistory,
        payee: &str,
        accounts: &std::collections::BTreeSet<String>,
        confidence: f64,
    ) -> AccountResolution {
        let account = accounts
            .iter()
            .max_by_key(|account| {
                (
                    history.usage(payee, account),
                    std::cmp::Reverse((*account).clone()),
                )
            })
            .cloned()
            .unwrap_or_else(|| self.options.default_debit_account.clone());
        AccountResolution {
            account,
            confidence,
            source: Source::History,
        }
    }

    fn from_category(&mut self, category: Option<&str>) -> Option<AccountResolution> {
        let normalized = category?.trim().to_lowercase();
        if normalized.is_empty() || self.options.category_mapping.is_empty() {
            return None;
        }

        if let Some((_, account)) = self
            .options
            .category_mapping
            .iter()
            .find(|(key, _)| key.trim().to_lowercase() == normalized)
        {
            return Some(AccountResolution {
                account: account.clone(),
                confidence: CONFIDENCE_CATEGORY_DIRECT,
                source: Source::Category,
            });
        }

        if let Some(cached) = self.category_cache.get(&normalized) {
            return cached.map(|account| AccountResolution {
                account,
                confidence: CONFIDENCE_CATEGORY_PARTIAL,
                source: Source::Category,
            });
        }

        let found = self
            .options
            .category_mapping
            .iter()
            .find(|(key, _)| {
                let key = key.trim().to_lowercase();
                key.contains(&normalized) || normalized.contains(&key)
            })
            .map(|(_, account)| account.clone());
        self.category_cache.put(normalized, found.clone());
        found.map(|account| AccountResolution {
            account,
            confidence: CONFIDENCE_CATEGORY_PARTIAL,
            source: Source::Category,
        })
    }

    fn from_patterns(&self, description: &str) -> Option<AccountResolution> {
        let upper = description.to_uppercase();
        if upper.trim().is_empty() {
            return None;
        }
        self.patterns
            .iter()
            .find(|(regex, _, _)| regex.is_match(&upper))
            .map(|(_, account, confidence)| AccountResolution {
                account: account.clone(),
                confidence: *confidence,
                source: Source::Pattern,
            })
    }

    fn from_sign(&self, amount: Option<Decimal>) -> Option<AccountResolution> {
        let amount = amount?;
        let (account, confidence) = if amount.is_zero() {
            (self.options.default_debit_account.clone(), 0.0)
        } else if amount.is_sign_negative() {
            (self.options.default_debit_account.clone(), CONFIDENCE_SIGN)
        } else {
            (self.options.default_credit_account.clone(), CONFIDENCE_SIGN)
        };
        Some(AccountResolution {
            account,
            confidence,
            source: Source::Sign,
        })
    }
}

impl std::fmt::Debug for AccountResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountResolver")
            .field("patterns", &self.patterns.len())
            .field("has_history", &self.history.is_some())
            .field("has_fuzzy", &self.fuzzy.is_some())
            .finish_non_exhaustive()
    }
}

fn compile(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern).case_insensitive(true).build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    fn resolver(options: ImportOptions) -> AccountResolver {
        AccountResolver::new(options, None, None)
    }

    fn history() -> PayeeAccountHistory {
        PayeeAccountHistory::from_raw(
            HashMap::from([
                (
                    "whole foods".to_string(),
                    vec![
                        "expenses:food:groceries".to_string(),
                        "expenses:household".to_string(),
                    ],
                ),
                ("acme corp".to_string(), vec!["income:salary".to_string()]),
            ]),
            HashMap::from([
                ("whole foods::expenses:food:groceries".to_string(), 12.0),
                ("whole foods::expenses:household".to_string(), 2.0),
            ]),
        )
    }

    #[test]
    fn test_history_exact_match_wins_over_everything() {
        let options = ImportOptions {
            category_mapping: HashMap::from([(
                "groceries".to_string(),
                "expenses:other".to_string(),
            )]),
            ..ImportOptions::default()
        };
        let mut r = AccountResolver::new(options, Some(history()), None);
        let res = r.resolve("Whole Foods", Some("groceries"), Some(dec!(-50)));
        assert_eq!(res.source, Source::History);
        assert!(res.confidence >= 0.9);
        assert_eq!(res.account, "expenses:food:groceries");
        assert!(!r.needs_review(&res));
    }

    #[test]
    fn test_history_containment() {
        let mut r = AccountResolver::new(ImportOptions::default(), Some(history()), None);
        let res = r.resolve("WHOLE FOODS MARKET #123", None, None);
        // Cached payee "whole foods" is contained in the description.
        assert_eq!(res.source, Source::History);
        assert_eq!(res.confidence, 0.85);
    }

    #[test]
    fn test_history_disabled_falls_through() {
        let options = ImportOptions {
            use_journal_history: false,
            ..ImportOptions::default()
        };
        let mut r = AccountResolver::new(options, Some(history()), None);
        let res = r.resolve("Whole Foods", None, Some(dec!(-50)));
        assert_ne!(res.source, Source::History);
    }

    #[test]
    fn test_fuzzy_matcher_consulted_last_within_history() {
        struct Always;
        impl FuzzyMatch for Always {
            fn score(&self, candidate: &str, _query: &str) -> f64 {
                if candidate == "acme corp" {
                    0.9
                } else {
                    0.0
                }
            }
        }
        let mut r =
            AccountResolver::new(ImportOptions::default(), Some(history()), Some(Box::new(Always)));
        let res = r.resolve("ACM CRP PAYROLL DEP", None, None);
        assert_eq!(res.source, Source::History);
        assert_eq!(res.account, "income:salary");
    }

    #[test]
    fn test_category_direct_and_partial() {
        let options = ImportOptions {
            use_journal_history: false,
            category_mapping: HashMap::from([(
                "Groceries".to_string(),
                "expenses:food:groceries".to_string(),
            )]),
            ..ImportOptions::default()
        };
        let mut r = resolver(options);

        let direct = r.resolve("xyz", Some("groceries"), None);
        assert_eq!(direct.source, Source::Category);
        assert_eq!(direct.confidence, 0.9);

        let partial = r.resolve("xyz", Some("online groceries"), None);
        assert_eq!(partial.source, Source::Category);
        assert_eq!(partial.confidence, 0.75);

        // Second lookup of the same key is served from the cache.
        let again = r.resolve("xyz", Some("online groceries"), None);
        assert_eq!(again, partial);
    }

    #[test]
    fn test_builtin_amazon_pattern() {
        let mut r = resolver(ImportOptions::default());
        let res = r.resolve("AMAZON.COM*123", None, Some(dec!(-50.00)));
        assert_eq!(res.source, Source::Pattern);
        assert_eq!(res.account, "expenses:shopping:amazon");
    }

    #[test]
    fn test_user_pattern_precedes_builtin() {
        let options = ImportOptions {
            merchant_patterns: std::collections::BTreeMap::from([(
                "AMAZON PRIME".to_string(),
                "expenses:subscriptions".to_string(),
            )]),
            ..ImportOptions::default()
        };
        let mut r = resolver(options);
        let res = r.resolve("AMAZON PRIME*9Y2", None, None);
        assert_eq!(res.account, "expenses:subscriptions");
        assert_eq!(res.confidence, 0.85);
    }

    #[test]
    fn test_unsafe_pattern_never_compiled() {
        let options = ImportOptions {
            merchant_patterns: std::collections::BTreeMap::from([(
                "(A+)+".to_string(),
                "expenses:trap".to_string(),
            )]),
            ..ImportOptions::default()
        };
        let mut r = resolver(options);
        let warnings = r.take_warnings();
        assert_eq!(warnings.len(), 1);
        // The input the pattern would have matched falls through to sign.
        let res = r.resolve("AAAA", None, Some(dec!(-5)));
        assert_ne!(res.account, "expenses:trap");
    }

    #[test]
    fn test_sign_fallback() {
        let mut r = resolver(ImportOptions::default());
        let debit = r.resolve("zzz qqq", None, Some(dec!(-9.99)));
        assert_eq!(debit.source, Source::Sign);
        assert_eq!(debit.account, "expenses:unknown");
        assert_eq!(debit.confidence, 0.5);

        let credit = r.resolve("zzz qqq", None, Some(dec!(9.99)));
        assert_eq!(credit.account, "income:unknown");

        let zero = r.resolve("zzz qqq", None, Some(Decimal::ZERO));
        assert_eq!(zero.confidence, 0.0);
    }

    #[test]
    fn test_default_when_nothing_matches() {
        let mut r = resolver(ImportOptions::default());
        let res = r.resolve("zzz qqq", None, None);
        assert_eq!(res.source, Source::Default);
        assert_eq!(res.confidence, 0.0);
        assert!(r.needs_review(&res));
    }

    #[test]
    fn test_needs_review_rules() {
        let r = resolver(ImportOptions::default());
        let low = AccountResolution {
            account: "expenses:food".to_string(),
            confidence: 0.5,
            source: Source::Sign,
        };
        assert!(r.needs_review(&low));

        let todo = AccountResolution {
            account: "todo:sort-me".to_string(),
            confidence: 0.95,
            source: Source::History,
        };
        assert!(r.needs_review(&todo));

        let unknown = AccountResolution {
            account: "expenses:Unknown:stuff".to_string(),
            confidence: 0.95,
            source: Source::History,
        };
        assert!(r.needs_review(&unknown));

        let fine = AccountResolution {
            account: "expenses:food".to_string(),
            confidence: 0.9,
            source: Source::Category,
        };
        assert!(!r.needs_review(&fine));
    }

    #[test]
    fn test_category_cache_is_bounded() {
        let options = ImportOptions {
            use_journal_history: false,
            category_mapping: HashMap::from([(
                "base".to_string(),
                "expenses:base".to_string(),
            )]),
            ..ImportOptions::default()
        };
        let mut r = resolver(options);
        for i in 0..250 {
            let _ = r.resolve("x", Some(&format!("nonexistent-{i}")), None);
        }
        assert!(r.category_cache.entries.len() <= 100);
    }
}
