//! Line-oriented PHYLIP distance-matrix parsing.

use std::{io::BufRead, ops::Range};

use crate::errors::PhylipError;

/// Layout of the matrix body.
///
/// Detected from the number of values on the first taxon line: none means
/// lower-triangular, `n - 1` means upper-triangular, anything else is read as
/// a square row that may wrap onto continuation lines.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PhylipShape {
    /// Every row lists all `n` distances, diagonal included.
    Square,
    /// Row `i` lists the distances to taxa `0..i`.
    Lower,
    /// Row `i` lists the distances to taxa `i + 1..n`.
    Upper,
}

impl PhylipShape {
    fn detect(taxa: usize, first_line_values: usize) -> Self {
        match first_line_values {
            0 => Self::Lower,
            values if taxa > 1 && values == taxa - 1 => Self::Upper,
            _ => Self::Square,
        }
    }

    fn columns(self, row: usize, taxa: usize) -> Range<usize> {
        match self {
            Self::Square => 0..taxa,
            Self::Lower => 0..row,
            Self::Upper => row + 1..taxa,
        }
    }
}

/// A parsed matrix body with a row-major `taxa × taxa` distance buffer.
pub(crate) struct ParsedMatrix {
    pub(crate) labels: Vec<String>,
    pub(crate) distances: Vec<f64>,
    pub(crate) shape: PhylipShape,
}

type NumberedLine = (usize, String);

pub(crate) fn parse<R: BufRead>(reader: R) -> Result<ParsedMatrix, PhylipError> {
    let mut lines = reader
        .lines()
        .enumerate()
        .map(|(index, line)| line.map(|text| (index + 1, text)));
    let (_, header) = next_content(&mut lines)?.ok_or(PhylipError::EmptyInput)?;
    let taxa = parse_header(&header)?;

    let mut labels = Vec::with_capacity(taxa);
    let mut distances = vec![0.0; taxa * taxa];
    let mut detected = None;
    for row in 0..taxa {
        let missing = PhylipError::MissingRow {
            expected: taxa,
            found: row,
        };
        let (_, line) = next_content(&mut lines)?.ok_or(missing)?;
        let mut tokens = line.split_whitespace();
        let label = tokens.next().unwrap_or_default().to_owned();
        let first: Vec<&str> = tokens.collect();
        let shape = *detected.get_or_insert_with(|| PhylipShape::detect(taxa, first.len()));
        let columns = shape.columns(row, taxa);

        let mut values = Vec::with_capacity(columns.len());
        push_values(row, &first, columns.len(), &mut values)?;
        while values.len() < columns.len() {
            let (_, continuation) =
                next_content(&mut lines)?.ok_or(PhylipError::MissingRow {
                    expected: taxa,
                    found: row,
                })?;
            let tokens: Vec<&str> = continuation.split_whitespace().collect();
            push_values(row, &tokens, columns.len(), &mut values)?;
        }

        for (column, value) in columns.zip(values) {
            distances[row * taxa + column] = value;
            if shape != PhylipShape::Square {
                distances[column * taxa + row] = value;
            }
        }
        labels.push(label);
    }

    if let Some((line, _)) = next_content(&mut lines)? {
        return Err(PhylipError::TrailingData { line });
    }
    Ok(ParsedMatrix {
        labels,
        distances,
        shape: detected.unwrap_or(PhylipShape::Square),
    })
}

fn next_content<I>(lines: &mut I) -> Result<Option<NumberedLine>, PhylipError>
where
    I: Iterator<Item = std::io::Result<NumberedLine>>,
{
    for line in lines {
        let (number, text) = line?;
        if !text.trim().is_empty() {
            return Ok(Some((number, text)));
        }
    }
    Ok(None)
}

fn parse_header(header: &str) -> Result<usize, PhylipError> {
    let invalid = || PhylipError::InvalidHeader {
        header: header.trim().to_owned(),
    };
    let mut tokens = header.split_whitespace();
    let taxa = tokens
        .next()
        .and_then(|token| token.parse::<usize>().ok())
        .filter(|&taxa| taxa > 0)
        .ok_or_else(invalid)?;
    if tokens.next().is_some() {
        return Err(invalid());
    }
    Ok(taxa)
}

fn push_values(
    row: usize,
    tokens: &[&str],
    expected: usize,
    values: &mut Vec<f64>,
) -> Result<(), PhylipError> {
    let found = values.len() + tokens.len();
    if found > expected {
        return Err(PhylipError::RowLength {
            row,
            expected,
            found,
        });
    }
    for token in tokens {
        let value = token
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .ok_or_else(|| PhylipError::InvalidValue {
                row,
                token: (*token).to_owned(),
            })?;
        values.push(value);
    }
    Ok(())
}
