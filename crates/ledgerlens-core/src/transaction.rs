//! Transaction type.

use crate::Posting;
use serde::{Deserialize, Serialize};

/// A transaction block extracted from document text.
///
/// Identity is positional: transactions are destroyed and rebuilt on every
/// parse pass, and the line fields locate them in the document snapshot
/// they were parsed from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// The date token exactly as written in the header.
    pub date: String,
    /// The `*` (cleared) or `!` (pending) status mark, if present.
    pub status: Option<char>,
    /// The `(code)` token after the status mark, if present, parens stripped.
    pub code: Option<String>,
    /// Header description, up to the first comment marker, trimmed.
    pub description: String,
    /// Zero-based line number of the header line.
    pub header_line: usize,
    /// First line of the block (same as `header_line`).
    pub start_line: usize,
    /// Last line of the block, including trailing indented lines.
    pub end_line: usize,
    /// The postings of this transaction, in source order.
    pub postings: Vec<Posting>,
}

impl Transaction {
    /// Create a transaction with an empty posting list.
    #[must_use]
    pub fn new(date: impl Into<String>, description: impl Into<String>, header_line: usize) -> Self {
        Self {
            date: date.into(),
            status: None,
            code: None,
            description: description.into(),
            header_line,
            start_line: header_line,
            end_line: header_line,
            postings: Vec::new(),
        }
    }

    /// Set the status mark.
    #[must_use]
    pub const fn with_status(mut self, status: char) -> Self {
        self.status = Some(status);
        self
    }

    /// Set the transaction code.
    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Append a posting.
    #[must_use]
    pub fn with_posting(mut self, posting: Posting) -> Self {
        self.postings.push(posting);
        self
    }

    /// Whether the block's line span overlaps `[start, end]` (inclusive).
    #[must_use]
    pub const fn overlaps(&self, start: usize, end: usize) -> bool {
        self.start_line <= end && start <= self.end_line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PostingKind;

    #[test]
    fn test_overlaps() {
        let mut txn = Transaction::new("2024-01-01", "Test", 4);
        txn.end_line = 6;
        assert!(txn.overlaps(0, 4));
        assert!(txn.overlaps(5, 5));
        assert!(txn.overlaps(6, 10));
        assert!(!txn.overlaps(7, 10));
        assert!(!txn.overlaps(0, 3));
    }

    #[test]
    fn test_builders() {
        let txn = Transaction::new("2024-01-01", "Grocery run", 0)
            .with_status('*')
            .with_code("1234")
            .with_posting(Posting::elided(
                "Assets:Cash",
                "Assets:Cash",
                PostingKind::Real,
                1,
            ));
        assert_eq!(txn.status, Some('*'));
        assert_eq!(txn.code.as_deref(), Some("1234"));
        assert_eq!(txn.postings.len(), 1);
    }
}
