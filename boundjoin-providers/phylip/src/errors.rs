use thiserror::Error;

/// Errors raised while reading a PHYLIP distance matrix.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PhylipError {
    /// The input contained no non-blank lines.
    #[error("PHYLIP input is empty")]
    EmptyInput,
    /// The first line was not a positive taxon count.
    #[error("invalid PHYLIP header `{header}`: expected a positive taxon count")]
    InvalidHeader {
        /// The offending header line, trimmed.
        header: String,
    },
    /// A distance token could not be parsed as a finite number.
    #[error("row {row} contains invalid distance `{token}`")]
    InvalidValue {
        /// Zero-based taxon row.
        row: usize,
        /// The token that failed to parse.
        token: String,
    },
    /// The input ended before every taxon row was read.
    #[error("expected {expected} taxon rows but found {found}")]
    MissingRow {
        /// Taxon count from the header.
        expected: usize,
        /// Complete rows read before the input ended.
        found: usize,
    },
    /// A row carried more values than its shape allows.
    #[error("row {row} has {found} values but expected {expected}")]
    RowLength {
        /// Zero-based taxon row.
        row: usize,
        /// Values required by the detected shape.
        expected: usize,
        /// Values seen before the row overflowed.
        found: usize,
    },
    /// Non-blank content followed the last taxon row.
    #[error("unexpected data after the last taxon row at line {line}")]
    TrailingData {
        /// One-based line number of the first trailing line.
        line: usize,
    },
    /// Reading the underlying input failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
