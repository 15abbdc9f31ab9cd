//! Per-document transaction cache.
//!
//! The editor host re-analyzes a document on every keystroke. This cache
//! avoids redundant work in the common cases: unchanged content returns the
//! previous parse by reference (`Arc` identity), and small edits are
//! classified through a positional line diff before the extractor runs.
//!
//! The diff deliberately stops short of partial-AST merging: whenever
//! content changed at all, the whole document is re-extracted, so the
//! returned transactions are always fully consistent with the current text.
//! The incremental machinery only decides whether a merge *would have been*
//! possible, which keeps the inputs for that future optimization exercised
//! and observable in the logs.
//!
//! Entries are owned exclusively by the cache and swapped wholesale, never
//! partially mutated. The map is unbounded by document count; the expected
//! population is the host's set of open editors. Single-threaded use (or an
//! external per-URI lock) is assumed.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use ledgerlens_core::{NumberFormatContext, Transaction};
use ledgerlens_parser::extract_transactions;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// A contiguous run of lines that differ between two document snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangedRange {
    /// First differing line (zero-based, inclusive).
    pub start: usize,
    /// Last differing line (inclusive).
    pub end: usize,
}

/// One cached document snapshot.
#[derive(Debug)]
struct CachedDocument {
    lines: Vec<String>,
    transactions: Arc<Vec<Transaction>>,
}

/// Per-URI transaction cache with diff-based reparse avoidance.
#[derive(Debug, Default)]
pub struct TransactionCache {
    documents: HashMap<String, CachedDocument>,
}

/// More changed ranges than this fraction of cached transactions means the
/// diff is an unreliable signal.
const MAX_RANGES_PER_TRANSACTION: usize = 2; // ranges > transactions / 2

/// A line-count delta larger than this forces a full reparse.
const MAX_LINE_DELTA: usize = 50;

/// When at least this fraction of transactions is affected, merging would
/// not amortize.
const AFFECTED_FRACTION_LIMIT: f64 = 0.7;

impl TransactionCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the transactions for `uri` at `content`, reusing the cached
    /// parse when the content is line-for-line identical.
    ///
    /// Callers may rely on `Arc` identity: byte-identical content returns
    /// the same allocation, so downstream recomputation can be skipped.
    pub fn get(
        &mut self,
        uri: &str,
        content: &str,
        ctx: &NumberFormatContext,
    ) -> Arc<Vec<Transaction>> {
        let new_lines: Vec<String> = content.split('\n').map(str::to_string).collect();

        let Some(cached) = self.documents.get(uri) else {
            debug!(uri, "cache miss, full parse");
            return self.store(uri, new_lines, content, ctx);
        };

        if cached.lines == new_lines {
            debug!(uri, "cache hit");
            return Arc::clone(&cached.transactions);
        }

        let ranges = diff_lines(&cached.lines, &new_lines);
        let reusable = incremental_signal_reliable(cached, new_lines.len(), &ranges);
        debug!(
            uri,
            changed_ranges = ranges.len(),
            avoidable = reusable,
            "content changed, re-extracting"
        );
        // Correctness over cleverness: re-extract the whole document either
        // way; `reusable` records whether a partial merge could have been
        // attempted instead.
        self.store(uri, new_lines, content, ctx)
    }

    /// Remove the entry for one document.
    pub fn invalidate(&mut self, uri: &str) {
        self.documents.remove(uri);
    }

    /// Drop every cached document.
    pub fn clear(&mut self) {
        self.documents.clear();
    }

    /// Number of cached documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    fn store(
        &mut self,
        uri: &str,
        lines: Vec<String>,
        content: &str,
        ctx: &NumberFormatContext,
    ) -> Arc<Vec<Transaction>> {
        let transactions = Arc::new(extract_transactions(content, ctx));
        self.documents.insert(
            uri.to_string(),
            CachedDocument {
                lines,
                transactions: Arc::clone(&transactions),
            },
        );
        transactions
    }
}

/// Whether the diff is a trustworthy basis for incremental reuse.
fn incremental_signal_reliable(
    cached: &CachedDocument,
    new_line_count: usize,
    ranges: &[ChangedRange],
) -> bool {
    let txn_count = cached.transactions.len();
    if ranges.len() > txn_count / MAX_RANGES_PER_TRANSACTION {
        return false;
    }
    if cached.lines.len().abs_diff(new_line_count) > MAX_LINE_DELTA {
        return false;
    }

    let affected = cached
        .transactions
        .iter()
        .filter(|txn| is_affected(txn, ranges))
        .count();
    if txn_count > 0 {
        let fraction = affected as f64 / txn_count as f64;
        if fraction >= AFFECTED_FRACTION_LIMIT {
            return false;
        }
    }
    true
}

/// A transaction is affected when its span overlaps a changed range, or
/// when any changed range lies entirely above it (its line numbers have
/// shifted even if its content has not).
fn is_affected(txn: &Transaction, ranges: &[ChangedRange]) -> bool {
    ranges
        .iter()
        .any(|r| txn.overlaps(r.start, r.end) || r.end < txn.start_line)
}

/// Position-aligned line diff: maximal runs of lines differing at the same
/// index, with the shorter side padded by empty-string sentinels. Not an
/// LCS - an insertion shifts everything below it into one long range,
/// which the reliability thresholds then catch.
#[must_use]
pub fn diff_lines(old: &[String], new: &[String]) -> Vec<ChangedRange> {
    let len = old.len().max(new.len());
    let mut ranges = Vec::new();
    let mut open: Option<usize> = None;

    for i in 0..len {
        let old_line = old.get(i).map_or("", String::as_str);
        let new_line = new.get(i).map_or("", String::as_str);
        if old_line == new_line {
            if let Some(start) = open.take() {
                ranges.push(ChangedRange { start, end: i - 1 });
            }
        } else if open.is_none() {
            open = Some(i);
        }
    }
    if let Some(start) = open {
        ranges.push(ChangedRange {
            start,
            end: len - 1,
        });
    }
    ranges
}
