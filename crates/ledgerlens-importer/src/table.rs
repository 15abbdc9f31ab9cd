//! Delimiter detection and cell tokenization.

use thiserror::Error;
use tracing::debug;

/// Candidate delimiters, tried in this order.
const DELIMITERS: [u8; 4] = [b',', b';', b'\t', b'|'];

/// Lines sampled for delimiter detection.
const SAMPLE_LINES: usize = 10;

/// Failure to tokenize the input into rows.
#[derive(Debug, Error)]
pub enum TableError {
    /// The input contained no rows at all.
    #[error("input contains no rows")]
    Empty,

    /// A cell could not be tokenized (e.g. an unclosed quote).
    #[error("malformed row: {0}")]
    Csv(#[from] csv::Error),
}

/// One data row with its position in the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    /// Cell values, quotes resolved.
    pub cells: Vec<String>,
    /// One-based source line of the row's first record line.
    pub line: usize,
}

impl TableRow {
    /// The cell at `index`, trimmed, or `None` when absent or blank.
    #[must_use]
    pub fn cell(&self, index: Option<usize>) -> Option<&str> {
        let text = self.cells.get(index?)?.trim();
        (!text.is_empty()).then_some(text)
    }
}

/// A tokenized tabular document: one header row plus data rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabularData {
    /// The first row, assumed to carry column names.
    pub headers: Vec<String>,
    /// All remaining rows.
    pub rows: Vec<TableRow>,
    /// The delimiter that was detected.
    pub delimiter: u8,
}

impl TabularData {
    /// Detect the delimiter and tokenize `text` into rows.
    ///
    /// The delimiter is whichever of `,` `;` tab `|` occurs a consistent,
    /// non-zero number of times across the first sampled lines (quoted
    /// occurrences are counted too; consistency across lines is what
    /// separates the real delimiter from punctuation inside cells). Cells
    /// are then read with an RFC 4180 tokenizer accepting ragged record
    /// lengths.
    ///
    /// # Errors
    ///
    /// [`TableError::Empty`] when no rows exist, [`TableError::Csv`] when a
    /// record cannot be tokenized.
    pub fn parse(text: &str) -> Result<Self, TableError> {
        let delimiter = detect_delimiter(text);
        debug!(delimiter = %(delimiter as char), "tokenizing tabular input");

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(false)
            .flexible(true)
            .from_reader(text.as_bytes());

        let mut records = Vec::new();
        for record in reader.records() {
            let record = record?;
            let line = record.position().map_or(1, |p| p.line() as usize);
            let cells: Vec<String> = record.iter().map(str::to_string).collect();
            if cells.iter().all(|c| c.trim().is_empty()) {
                continue;
            }
            records.push(TableRow { cells, line });
        }

        let mut iter = records.into_iter();
        let header_row = iter.next().ok_or(TableError::Empty)?;
        Ok(Self {
            headers: header_row.cells,
            rows: iter.collect(),
            delimiter,
        })
    }
}

/// Score each candidate delimiter over the first sampled non-empty lines;
/// the winner has the same non-zero count on every line, highest count
/// breaking ties. Falls back to `,`.
fn detect_delimiter(text: &str) -> u8 {
    let lines: Vec<&str> = text
        .lines()
        .filter(|l| !l.trim().is_empty())
        .take(SAMPLE_LINES)
        .collect();

    let mut best = (b',', 0usize);
    for delim in DELIMITERS {
        let counts: Vec<usize> = lines
            .iter()
            .map(|l| l.bytes().filter(|&b| b == delim).count())
            .collect();
        let Some(&first) = counts.first() else {
            continue;
        };
        if first > 0 && counts.iter().all(|&c| c == first) && first > best.1 {
            best = (delim, first);
        }
    }
    best.0
}
