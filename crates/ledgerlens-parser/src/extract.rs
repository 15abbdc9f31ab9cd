//! Document-level transaction extraction.
//!
//! One pass over the document's lines with a single open-transaction
//! accumulator. Directives, comments, and periodic/auto-posting rules are
//! recognized only far enough to know they terminate the current block;
//! their own contents are not modeled.

use crate::posting::parse_posting_line;
use ledgerlens_core::{NumberFormatContext, Posting, Transaction};
use tracing::trace;

/// Directive keywords that end any open transaction block.
const DIRECTIVE_PREFIXES: &[&str] = &[
    "account ",
    "commodity ",
    "payee ",
    "tag ",
    "alias ",
    "include ",
    "decimal-mark ",
    "default commodity ",
    "Y ",
    "P ",
    "apply account",
    "end apply account",
    "comment",
    "end comment",
];

/// Extract all transactions from document text.
///
/// The text must be `\n`-normalized by the caller. Transactions with zero
/// postings are dropped.
///
/// ```
/// use ledgerlens_core::NumberFormatContext;
/// use ledgerlens_parser::extract_transactions;
///
/// let text = "2024-01-01 Test\n    Expenses:Food  $50\n    Assets:Cash\n";
/// let txns = extract_transactions(text, &NumberFormatContext::new());
/// assert_eq!(txns.len(), 1);
/// assert_eq!(txns[0].postings.len(), 2);
/// assert!(txns[0].postings[1].is_elided());
/// ```
#[must_use]
pub fn extract_transactions(text: &str, ctx: &NumberFormatContext) -> Vec<Transaction> {
    let lines: Vec<&str> = text.split('\n').collect();
    let mut out = Vec::new();
    let mut open: Option<OpenTransaction> = None;

    for (line_no, &line) in lines.iter().enumerate() {
        let trimmed = line.trim();
        let indented = line.starts_with(' ') || line.starts_with('\t');

        if trimmed.is_empty() {
            flush(&mut open, &lines, &mut out);
            continue;
        }

        if !indented {
            if trimmed.starts_with(';') || trimmed.starts_with('#') {
                // Comments do not terminate a block.
                continue;
            }
            if trimmed.starts_with('~') || trimmed.starts_with('=') {
                // Periodic rules and auto-posting rules are out of scope;
                // their bodies fall through as unmatched lines.
                trace!(line_no, "skipping periodic/auto-posting rule");
                flush(&mut open, &lines, &mut out);
                continue;
            }
            if is_directive(trimmed) {
                flush(&mut open, &lines, &mut out);
                continue;
            }
            if let Some(header) = parse_header(trimmed, line_no) {
                flush(&mut open, &lines, &mut out);
                open = Some(header);
                continue;
            }
            // Any other unindented line terminates the block.
            flush(&mut open, &lines, &mut out);
            continue;
        }

        // Indented line: a posting candidate while a transaction is open.
        if let Some(txn) = open.as_mut() {
            if trimmed.starts_with(';') || trimmed.starts_with('#') {
                continue;
            }
            if let Some(posting) = parse_posting_line(line, line_no, ctx) {
                txn.postings.push(posting);
            }
        }
    }

    flush(&mut open, &lines, &mut out);
    out
}

struct OpenTransaction {
    header: Transaction,
    postings: Vec<Posting>,
}

fn flush(open: &mut Option<OpenTransaction>, lines: &[&str], out: &mut Vec<Transaction>) {
    let Some(OpenTransaction {
        mut header,
        postings,
    }) = open.take()
    else {
        return;
    };
    // Dropped silently: a header with no postings is not a transaction.
    if postings.is_empty() {
        return;
    }
    let last_posting_line = postings.last().map_or(header.header_line, |p| p.line);
    header.postings = postings;
    header.end_line = block_end(lines, last_posting_line);
    out.push(header);
}

/// Scan forward from the last posting while lines stay non-empty and
/// indented; the block ends at the last such line.
fn block_end(lines: &[&str], from: usize) -> usize {
    let mut end = from;
    let mut next = from + 1;
    while let Some(line) = lines.get(next) {
        let indented = line.starts_with(' ') || line.starts_with('\t');
        if line.trim().is_empty() || !indented {
            break;
        }
        end = next;
        next += 1;
    }
    end
}

fn is_directive(trimmed: &str) -> bool {
    DIRECTIVE_PREFIXES
        .iter()
        .any(|prefix| trimmed == prefix.trim_end() || trimmed.starts_with(prefix))
}

/// Parse a transaction-header line: date token, optional `*`/`!` status,
/// optional `(code)`, then the description up to the first comment marker.
fn parse_header(trimmed: &str, line_no: usize) -> Option<OpenTransaction> {
    let mut tokens = trimmed.split_whitespace();
    let date = tokens.next()?;
    if !is_date_token(date) {
        return None;
    }

    let mut txn = Transaction::new(date, "", line_no);
    let mut rest: Vec<&str> = tokens.collect();

    if let Some(&first) = rest.first() {
        if first == "*" || first == "!" {
            txn.status = first.chars().next();
            rest.remove(0);
        }
    }
    if let Some(&first) = rest.first() {
        if first.len() >= 2 && first.starts_with('(') && first.ends_with(')') {
            txn.code = Some(first[1..first.len() - 1].to_string());
            rest.remove(0);
        }
    }

    let joined = rest.join(" ");
    let description = match joined.find([';', '#']) {
        Some(i) => joined[..i].trim(),
        None => joined.trim(),
    };
    txn.description = description.to_string();
    Some(OpenTransaction {
        header: txn,
        postings: Vec::new(),
    })
}

/// A recognizable date token: starts with a digit and consists of digits
/// and `-`/`/`/`.` separators.
fn is_date_token(token: &str) -> bool {
    token.chars().next().is_some_and(|c| c.is_ascii_digit())
        && token
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '-' | '/' | '.'))
}
