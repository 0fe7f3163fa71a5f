//! Loading distance matrices from [`DistanceSource`] implementations.

mod common;

use boundjoin_core::{
    DistanceMatrix, DistanceSource, JoinErrorCode, MatrixErrorCode, SourceError, SourceErrorCode,
};
use common::Points;
use rstest::rstest;

/// An in-memory source whose entries can be individually broken.
struct Table {
    rows: Vec<Vec<f64>>,
    variances: Option<Vec<Vec<f64>>>,
    missing_label: Option<usize>,
}

impl Table {
    fn new(rows: Vec<Vec<f64>>) -> Self {
        Self {
            rows,
            variances: None,
            missing_label: None,
        }
    }
}

impl DistanceSource for Table {
    fn len(&self) -> usize {
        self.rows.len()
    }

    fn name(&self) -> &str {
        "table"
    }

    fn label(&self, index: usize) -> Result<String, SourceError> {
        if self.missing_label == Some(index) {
            return Err(SourceError::OutOfBounds { index });
        }
        Ok(format!("row{index}"))
    }

    fn distance(&self, i: usize, j: usize) -> Result<f64, SourceError> {
        let value = self
            .rows
            .get(i)
            .and_then(|row| row.get(j))
            .copied()
            .ok_or(SourceError::OutOfBounds { index: i.max(j) })?;
        if value.is_finite() {
            Ok(value)
        } else {
            Err(SourceError::NonFinite { row: i, column: j })
        }
    }

    fn variance(&self, i: usize, j: usize) -> Result<Option<f64>, SourceError> {
        Ok(self
            .variances
            .as_ref()
            .and_then(|rows| rows.get(i))
            .and_then(|row| row.get(j))
            .copied())
    }
}

fn triangle() -> Vec<Vec<f64>> {
    vec![
        vec![0.0, 3.0, 4.0],
        vec![3.0, 0.0, 5.0],
        vec![4.0, 5.0, 0.0],
    ]
}

#[rstest]
fn points_load_into_a_symmetric_matrix() {
    let source = Points::new(vec![(0.0, 0.0), (3.0, 0.0), (0.0, 4.0)]);
    let matrix = DistanceMatrix::<f64>::from_source(&source).expect("source must load");
    assert_eq!(matrix.labels(), ["taxon_0", "taxon_1", "taxon_2"]);
    assert_eq!(matrix.distance(1, 2), Some(5.0));
    assert_eq!(matrix.distance(2, 1), Some(5.0));
    assert!(!matrix.has_variances());
    assert_eq!(matrix.variance(0, 1), None);
}

#[rstest]
fn reported_variances_are_attached() {
    let mut source = Table::new(triangle());
    source.variances = Some(vec![
        vec![0.0, 0.5, 0.25],
        vec![0.5, 0.0, 1.5],
        vec![0.25, 1.5, 0.0],
    ]);
    let matrix = DistanceMatrix::<f64>::from_source(&source).expect("source must load");
    assert!(matrix.has_variances());
    assert_eq!(matrix.variance(1, 2), Some(1.5));
}

#[rstest]
fn partial_variances_fall_back_to_distances() {
    let mut source = Table::new(triangle());
    source.variances = Some(vec![vec![0.0, 0.5]]);
    let matrix = DistanceMatrix::<f64>::from_source(&source).expect("source must load");
    assert_eq!(matrix.variance(0, 1), Some(0.5));
    assert_eq!(matrix.variance(1, 2), Some(5.0));
}

#[rstest]
fn one_sided_variances_cover_both_directions() {
    let mut source = Table::new(triangle());
    source.variances = Some(vec![vec![], vec![], vec![2.5, 0.75]]);
    let matrix = DistanceMatrix::<f64>::from_source(&source).expect("source must load");
    assert_eq!(matrix.variance(2, 1), Some(0.75));
    assert_eq!(matrix.variance(1, 2), Some(0.75));
    assert_eq!(matrix.variance(0, 2), Some(2.5));
    assert_eq!(matrix.variance(0, 1), Some(3.0));
    assert_eq!(matrix.variance(2, 2), Some(0.0));
}

#[rstest]
fn single_precision_matrices_narrow_each_entry() {
    let source = Points::new(vec![(0.0, 0.0), (1.0, 1.0), (4.0, 5.0)]);
    let matrix = DistanceMatrix::<f32>::from_source(&source).expect("source must load");
    assert_eq!(matrix.distance(0, 1), Some(2.0_f64.sqrt() as f32));
}

#[rstest]
fn label_failures_name_the_source() {
    let mut source = Table::new(triangle());
    source.missing_label = Some(2);
    let err = DistanceMatrix::<f64>::from_source(&source).expect_err("labels must fail");
    assert_eq!(err.code(), JoinErrorCode::SourceFailure);
    assert_eq!(err.source_code(), Some(SourceErrorCode::OutOfBounds));
    assert!(err.to_string().contains("`table`"));
}

#[rstest]
fn distance_failures_are_wrapped() {
    let mut rows = triangle();
    rows[1][2] = f64::NAN;
    let err = DistanceMatrix::<f64>::from_source(&Table::new(rows))
        .expect_err("non-finite entries must fail");
    assert_eq!(err.source_code(), Some(SourceErrorCode::NonFinite));
}

#[rstest]
fn non_zero_diagonals_are_matrix_errors() {
    let mut rows = triangle();
    rows[1][1] = 0.5;
    let err = DistanceMatrix::<f64>::from_source(&Table::new(rows))
        .expect_err("invalid matrices must fail");
    assert_eq!(err.code(), JoinErrorCode::Matrix);
    assert_eq!(err.matrix_code(), Some(MatrixErrorCode::NonZeroDiagonal));
}
